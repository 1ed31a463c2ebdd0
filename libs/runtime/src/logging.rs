//! Subscriber setup for the CareFlow binaries.
//!
//! Every log record belongs to one subsystem: the first configured section
//! whose name is the record's crate (`accounts` owns `accounts::gate`),
//! otherwise `default`. The owning section decides the console level, the
//! file level and which rotating JSON file receives the record.

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::{level_filters::LevelFilter, Metadata};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::config::{LogSection, LoggingConfig};
use crate::paths::home_dir::resolve_under;

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// Unknown names log at info rather than failing startup.
fn parse_level(raw: &str) -> LevelFilter {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" | "" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// `accounts` owns `accounts` and `accounts::*`, not `accounts_extra`.
fn owns(subsystem: &str, target: &str) -> bool {
    target
        .strip_prefix(subsystem)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Size-rotated log file shared by every handle that writes to it.
#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotatingFile {
    fn open(path: &Path, max_bytes: usize, max_files: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rotate = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
            ContentLimit::BytesSurpassed(max_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rotate))))
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Writer for one record; records without a file are swallowed.
struct FileHandle(Option<RotatingFile>);

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

struct Route {
    console: LevelFilter,
    file_level: LevelFilter,
    file: Option<RotatingFile>,
}

impl Route {
    const SILENT: Route = Route {
        console: LevelFilter::OFF,
        file_level: LevelFilter::OFF,
        file: None,
    };

    fn from_section(name: &str, section: &LogSection, base_dir: &Path) -> Self {
        let file = open_section_file(name, section, base_dir);
        Self {
            console: parse_level(&section.console_level),
            file_level: if file.is_some() {
                parse_level(&section.file_level)
            } else {
                LevelFilter::OFF
            },
            file,
        }
    }
}

fn open_section_file(name: &str, section: &LogSection, base_dir: &Path) -> Option<RotatingFile> {
    let file = section.file.trim();
    if file.is_empty() {
        return None;
    }
    let path = resolve_under(file, base_dir);
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_files = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    match RotatingFile::open(&path, usize::try_from(max_bytes).unwrap_or(usize::MAX), max_files) {
        Ok(file) => Some(file),
        Err(e) => {
            // No subscriber exists yet, so stderr is the only channel.
            eprintln!("log file for '{name}' disabled: {}: {e}", path.display());
            None
        }
    }
}

/// Subsystem routing table built from the logging config.
#[derive(Clone)]
struct Routes(Arc<RoutesInner>);

struct RoutesInner {
    named: Vec<(String, Route)>,
    fallback: Route,
}

impl Routes {
    fn build(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let named = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| (name.clone(), Route::from_section(name, section, base_dir)))
            .collect();
        let fallback = cfg
            .get(DEFAULT_SECTION)
            .map(|section| Route::from_section(DEFAULT_SECTION, section, base_dir))
            .unwrap_or(Route::SILENT);
        Self(Arc::new(RoutesInner { named, fallback }))
    }

    fn route(&self, target: &str) -> &Route {
        self.0
            .named
            .iter()
            .find(|(name, _)| owns(name, target))
            .map(|(_, route)| route)
            .unwrap_or(&self.0.fallback)
    }

    fn to_console(&self, meta: &Metadata<'_>) -> bool {
        *meta.level() <= self.route(meta.target()).console
    }

    fn to_file(&self, meta: &Metadata<'_>) -> bool {
        *meta.level() <= self.route(meta.target()).file_level
    }

    fn has_files(&self) -> bool {
        self.0.fallback.file.is_some() || self.0.named.iter().any(|(_, r)| r.file.is_some())
    }
}

impl<'a> MakeWriter<'a> for Routes {
    type Writer = FileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        FileHandle(self.0.fallback.file.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        FileHandle(self.route(meta.target()).file.clone())
    }
}

/// Install the global subscriber: console on stderr plus JSON files.
///
/// Relative file paths resolve under `base_dir` (the server home).
/// Only the first call in a process takes effect.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // `log` records (sqlx) must be bridged before the subscriber exists.
    let _ = tracing_log::LogTracer::init();

    let mut cfg = cfg.clone();
    if cfg.is_empty() {
        cfg.insert(DEFAULT_SECTION.to_owned(), LogSection::console_only("info"));
    }
    let routes = Routes::build(&cfg, base_dir);

    let console_routes = routes.clone();
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(filter_fn(move |meta| console_routes.to_console(meta)));

    let files = routes.has_files().then(|| {
        let file_routes = routes.clone();
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(routes.clone())
            .with_filter(filter_fn(move |meta| file_routes.to_file(meta)))
    });

    let _ = Registry::default().with(console).with(files).try_init();
}

/// Console-only logging at one level, for the command-line client.
pub fn init_console_logging(level: &str) {
    let cfg = LoggingConfig::from([(DEFAULT_SECTION.to_owned(), LogSection::console_only(level))]);
    init_logging_from_config(&cfg, Path::new("."));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;
    use tracing::Level;

    fn section(console: &str, file: &str, file_level: &str) -> LogSection {
        LogSection {
            console_level: console.to_owned(),
            file: file.to_owned(),
            file_level: file_level.to_owned(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("TRACE"), LevelFilter::TRACE);
        assert_eq!(parse_level(" warn "), LevelFilter::WARN);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level(""), LevelFilter::OFF);
        assert_eq!(parse_level("loud"), LevelFilter::INFO);
    }

    #[test]
    fn subsystem_owns_its_crate_and_modules_only() {
        assert!(owns("accounts", "accounts"));
        assert!(owns("accounts", "accounts::domain::service"));
        assert!(owns("sqlx", "sqlx::query"));
        assert!(!owns("accounts", "accounts_extra"));
        assert!(!owns("accounts", "appointments::domain"));
    }

    #[test]
    fn records_follow_their_subsystem_levels() {
        let tmp = tempdir().unwrap();
        let cfg = LoggingConfig::from([
            ("default".to_owned(), section("info", "", "")),
            ("sqlx".to_owned(), section("warn", "logs/sql.log", "info")),
        ]);
        let routes = Routes::build(&cfg, tmp.path());

        let sql = routes.route("sqlx::query");
        assert_eq!(sql.console, LevelFilter::WARN);
        assert_eq!(sql.file_level, LevelFilter::INFO);
        assert!(sql.file.is_some());
        assert!(tmp.path().join("logs").is_dir());

        let other = routes.route("appointments::domain::service");
        assert_eq!(other.console, LevelFilter::INFO);
        // No default file, so nothing goes to disk for unclaimed targets.
        assert_eq!(other.file_level, LevelFilter::OFF);
        assert!(Level::DEBUG > other.console);
    }

    #[test]
    fn without_default_section_unclaimed_records_are_dropped() {
        let tmp = tempdir().unwrap();
        let cfg = LoggingConfig::from([("accounts".to_owned(), section("debug", "", ""))]);
        let routes = Routes::build(&cfg, tmp.path());
        assert_eq!(routes.route("api_ingress").console, LevelFilter::OFF);
        assert_eq!(routes.route("accounts::gate").console, LevelFilter::DEBUG);
        assert!(!routes.has_files());
    }

    #[test]
    fn default_config_writes_under_home() {
        let tmp = tempdir().unwrap();
        let routes = Routes::build(&default_logging_config(), tmp.path());
        assert!(routes.has_files());

        let mut handle = routes.make_writer();
        handle.write_all(b"{}\n").unwrap();
        handle.flush().unwrap();
        assert!(tmp.path().join("logs/careflow.log").exists());
    }
}
