use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use url::Url;

pub const MEMORY_DSN: &str = "sqlite::memory:";

const DEFAULT_MAX_CONNS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

/// Detect DB backend from URL scheme.
pub fn detect_from_dsn(dsn: &str) -> Result<Backend> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as `sqlite::memory:`.
/// - Normalizes backslashes into forward slashes.
/// - Adds `mode=rwc` so the file is created on first start.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }

    let mut params: Vec<&str> = query
        .map(|q| q.split('&').filter(|kv| !kv.is_empty()).collect())
        .unwrap_or_default();
    if !params.iter().any(|kv| kv.starts_with("mode=")) {
        params.push("mode=rwc");
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(&params.join("&"));
    Ok(out)
}

/// Open the application database. `mock` forces a private in-memory SQLite.
pub async fn connect(
    cfg: Option<&DatabaseConfig>,
    base_dir: &Path,
    mock: bool,
) -> Result<DatabaseConnection> {
    if mock {
        tracing::info!("Using in-memory SQLite database (--mock)");
        return connect_sqlite(MEMORY_DSN, 1, DEFAULT_BUSY_TIMEOUT_MS).await;
    }

    let cfg = cfg.ok_or_else(|| anyhow!("database section is required (or pass --mock)"))?;
    let max_conns = cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS);

    match detect_from_dsn(&cfg.url)? {
        Backend::Sqlite => {
            let dsn = absolutize_sqlite_dsn(cfg.url.trim(), base_dir, true)?;
            let busy = cfg.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
            let max_conns = if dsn == MEMORY_DSN { 1 } else { max_conns };
            connect_sqlite(&dsn, max_conns, busy).await
        }
        Backend::Postgres => {
            let mut opts = ConnectOptions::new(cfg.url.trim().to_owned());
            opts.max_connections(max_conns)
                .acquire_timeout(Duration::from_secs(5))
                .sqlx_logging(false);
            tracing::info!("Connecting to database: postgres");
            Database::connect(opts)
                .await
                .context("failed to connect to postgres")
        }
    }
}

async fn connect_sqlite(dsn: &str, max_conns: u32, busy_timeout_ms: u32) -> Result<DatabaseConnection> {
    tracing::info!("Connecting to database: {}", dsn);
    let opts = SqliteConnectOptions::from_str(dsn)
        .with_context(|| format!("invalid sqlite DSN '{dsn}'"))?
        .busy_timeout(Duration::from_millis(u64::from(busy_timeout_ms)));

    let mut pool = SqlitePoolOptions::new()
        .max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5));
    if dsn == MEMORY_DSN {
        // Every connection is its own database; keep the single one alive.
        pool = pool.min_connections(1).idle_timeout(None).max_lifetime(None);
    }

    let sqlx_pool = pool
        .connect_with(opts)
        .await
        .with_context(|| format!("failed to open sqlite database '{dsn}'"))?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(sqlx_pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sqlite_path_is_anchored_at_home() {
        let tmp = tempfile::tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://database/careflow.db", tmp.path(), true).unwrap();
        let expected = tmp
            .path()
            .join("database/careflow.db")
            .to_string_lossy()
            .replace('\\', "/");
        assert_eq!(dsn, format!("sqlite://{expected}?mode=rwc"));
        assert!(tmp.path().join("database").is_dir());
    }

    #[test]
    fn existing_query_is_kept() {
        let dsn = absolutize_sqlite_dsn(
            "sqlite:///tmp/x.db?cache=shared&mode=ro",
            Path::new("/unused"),
            false,
        )
        .unwrap();
        assert_eq!(dsn, "sqlite:///tmp/x.db?cache=shared&mode=ro");
    }

    #[test]
    fn memory_dsn_is_canonical() {
        let base = Path::new("/unused");
        assert_eq!(absolutize_sqlite_dsn("sqlite://:memory:", base, false).unwrap(), MEMORY_DSN);
        assert_eq!(absolutize_sqlite_dsn("SQLITE::MEMORY:", base, false).unwrap(), MEMORY_DSN);
    }

    #[test]
    fn bad_dsns_are_rejected() {
        assert!(absolutize_sqlite_dsn("postgres://x", Path::new("/"), false).is_err());
        assert!(absolutize_sqlite_dsn("sqlite://", Path::new("/"), false).is_err());
        assert!(detect_from_dsn("").is_err());
        assert!(detect_from_dsn("mysql://localhost/db").is_err());
        assert_eq!(detect_from_dsn("postgresql://h/db").unwrap(), Backend::Postgres);
        assert_eq!(detect_from_dsn("sqlite://a.db").unwrap(), Backend::Sqlite);
    }

    #[tokio::test]
    async fn mock_database_accepts_queries() {
        use sea_orm::{ConnectionTrait, Statement};

        let db = connect(None, Path::new("/unused"), true).await.unwrap();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "CREATE TABLE t (x INTEGER)",
        ))
        .await
        .unwrap();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "INSERT INTO t VALUES (1)",
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = DatabaseConfig {
            url: "sqlite://db/app.db".into(),
            max_conns: Some(2),
            busy_timeout_ms: None,
        };
        let _db = connect(Some(&cfg), tmp.path(), false).await.unwrap();
        assert!(tmp.path().join("db/app.db").exists());
    }
}
