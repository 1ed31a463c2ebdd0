use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use careflow_cli::forms::{BookingForm, LoginForm, RegisterForm};
use careflow_cli::model::{Role, Status};
use careflow_cli::render::DoctorFilter;
use careflow_cli::{ApiClient, App, SessionStore};
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// CareFlow - book and manage clinic appointments
#[derive(Parser)]
#[command(name = "careflow")]
#[command(version)]
struct Cli {
    /// API base URL (default http://localhost:5000/api, or $CAREFLOW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (default ~/.careflow/session.json)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Log verbosity on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = Role::Patient)]
        role: Role,
        /// Required for doctors
        #[arg(long)]
        department: Option<String>,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = Role::Patient)]
        role: Role,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List doctors
    Doctors {
        #[arg(long)]
        department: Option<String>,
    },
    /// Book an appointment (patients)
    Book {
        #[arg(long)]
        department: String,
        #[arg(long)]
        doctor: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// One of the clinic's time slots, e.g. "09:00 AM"
        #[arg(long)]
        time: String,
    },
    /// List your appointments (patients)
    MyAppointments,
    /// List appointment requests (doctors)
    Requests {
        #[arg(long, value_enum, default_value_t = DoctorFilter::All)]
        filter: DoctorFilter,
    },
    /// Accept a pending request (doctors)
    Accept { id: Uuid },
    /// Reject a pending request (doctors)
    Reject { id: Uuid },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    runtime::logging::init_console_logging(level);

    match run(cli).await {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let api_url = cli
        .api_url
        .or_else(|| std::env::var("CAREFLOW_API_URL").ok());
    let sessions = match cli.session_file {
        Some(path) => SessionStore::new(path),
        None => {
            let home = runtime::paths::home_dir::resolve_home_dir(None, ".careflow", true)?;
            SessionStore::in_home_dir(&home)
        }
    };
    let app = App::new(ApiClient::new(api_url.as_deref()), sessions);

    let out = match cli.command {
        Command::Register {
            name,
            email,
            password,
            role,
            department,
        } => {
            app.register(RegisterForm {
                name,
                email,
                password,
                role: Some(role),
                department,
            })
            .await?
        }
        Command::Login {
            email,
            password,
            role,
        } => {
            app.login(LoginForm {
                email,
                password,
                role: Some(role),
            })
            .await?
        }
        Command::Logout => app.logout()?,
        Command::Whoami => app.whoami()?,
        Command::Doctors { department } => app.doctors(department.as_deref()).await?,
        Command::Book {
            department,
            doctor,
            date,
            time,
        } => {
            app.book(BookingForm {
                department,
                doctor_name: doctor,
                date,
                time,
            })
            .await?
        }
        Command::MyAppointments => app.my_appointments().await?,
        Command::Requests { filter } => app.requests(filter).await?,
        Command::Accept { id } => app.decide(id, Status::Accepted).await?,
        Command::Reject { id } => app.decide(id, Status::Rejected).await?,
    };
    Ok(out)
}
