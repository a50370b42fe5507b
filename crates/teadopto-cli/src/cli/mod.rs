//! CLI entry and dispatch.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use teadopto_core::config::{self, paths};
use teadopto_core::resources::adoptions::AdoptionStatus;
use teadopto_core::resources::pets::{AgeUnit, PetForm, PetStatus, PetType};
use teadopto_core::resources::registration::RegistrationForm;
use teadopto_core::session::Role;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "TEADOPTO_LOG";

#[derive(Parser)]
#[command(name = "teadopto")]
#[command(version)]
#[command(about = "Browse pets and shelters and manage adoptions on TeAdopto")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(short, long, env = "TEADOPTO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        /// client or shelter
        #[arg(long, default_value = "client")]
        role: Role,
        /// Required for shelter accounts
        #[arg(long)]
        shelter_name: Option<String>,
        /// Required for shelter accounts
        #[arg(long)]
        shelter_address: Option<String>,
    },
    /// Browse and manage pets
    Pets {
        #[command(subcommand)]
        command: PetCommands,
    },
    /// Browse and manage shelters
    Shelters {
        #[command(subcommand)]
        command: ShelterCommands,
    },
    /// Manage adoption requests
    Adoptions {
        #[command(subcommand)]
        command: AdoptionCommands,
    },
    /// Manage user accounts (admin)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Show the marketplace figures
    Stats,
    /// Administration panel
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Resolve a media path into a full URL
    Media {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum PetCommands {
    /// Lists pets
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Shows a pet
    Show {
        #[arg(value_name = "PET_ID")]
        id: u64,
    },
    /// Publishes a pet (shelter or admin)
    Create(NewPetArgs),
    /// Deletes a pet (shelter or admin)
    Delete {
        #[arg(value_name = "PET_ID")]
        id: u64,
    },
    /// Asks to adopt a pet
    Adopt {
        #[arg(value_name = "PET_ID")]
        id: u64,
        /// Note for the shelter
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(clap::Args)]
struct NewPetArgs {
    #[arg(long)]
    name: String,
    /// dog or cat
    #[arg(long = "type")]
    pet_type: PetType,
    #[arg(long)]
    breed: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    /// months or years
    #[arg(long)]
    age_unit: Option<AgeUnit>,
    #[arg(long)]
    size: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// available, adopted or pending
    #[arg(long, default_value = "available")]
    status: PetStatus,
    /// Image file to upload (repeatable, at least one)
    #[arg(long = "photo", value_name = "FILE")]
    photos: Vec<PathBuf>,
}

#[derive(clap::Subcommand)]
enum ShelterCommands {
    /// Lists shelters
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Deletes a shelter (admin)
    Delete {
        #[arg(value_name = "SHELTER_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum AdoptionCommands {
    /// Lists your adoption requests (all of them for staff)
    List,
    /// Changes the note of a pending request
    Update {
        #[arg(value_name = "REQUEST_ID")]
        id: u64,
        #[arg(short, long)]
        message: String,
    },
    /// Reviews a request (shelter or admin)
    Status {
        #[arg(value_name = "REQUEST_ID")]
        id: u64,
        /// pending, approved, rejected or completed
        #[arg(value_name = "STATUS")]
        status: AdoptionStatus,
    },
    /// Withdraws a request
    Delete {
        #[arg(value_name = "REQUEST_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum UserCommands {
    /// Lists accounts
    List,
    /// Deletes an account
    Delete {
        #[arg(value_name = "USER_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Shows user, pet, shelter and adoption totals
    Overview,
    /// Prints the backend admin console URL
    Url,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Show the effective settings
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Installs a file logger under `$TEADOPTO_HOME/logs` so stdout stays clean.
fn init_logging() -> Result<WorkerGuard> {
    let dir = paths::logs_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("build log filter")?;
    let appender = tracing_appender::rolling::daily(&dir, "teadopto.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
    Ok(guard)
}

async fn dispatch(cli: Cli) -> Result<()> {
    // These must keep working when the current config is broken.
    let command = match cli.command {
        Commands::Config {
            command: ConfigCommands::Path,
        } => {
            commands::config::path();
            return Ok(());
        }
        Commands::Config {
            command: ConfigCommands::Init,
        } => return commands::config::init(),
        command => command,
    };

    let config = config::Config::load().context("load config")?;

    let ctx = commands::Context::open(config)?;

    match command {
        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &username, password).await
        }
        Commands::Logout => {
            commands::auth::logout(&ctx);
            Ok(())
        }
        Commands::Whoami => {
            commands::auth::whoami(&ctx);
            Ok(())
        }
        Commands::Register {
            username,
            email,
            password,
            phone,
            role,
            shelter_name,
            shelter_address,
        } => {
            let form = RegistrationForm {
                phone,
                role,
                shelter_name,
                shelter_address,
                ..RegistrationForm::client(username, email, password)
            };
            commands::auth::register(&ctx, &form).await
        }

        Commands::Pets { command } => match command {
            PetCommands::List { page } => commands::pets::list(&ctx, page).await,
            PetCommands::Show { id } => commands::pets::show(&ctx, id).await,
            PetCommands::Create(args) => {
                let form = PetForm {
                    breed: args.breed,
                    age: args.age,
                    age_unit: args.age_unit,
                    size: args.size,
                    description: args.description,
                    status: args.status,
                    ..PetForm::new(args.name, args.pet_type)
                };
                commands::pets::create(&ctx, form, &args.photos).await
            }
            PetCommands::Delete { id } => commands::pets::delete(&ctx, id).await,
            PetCommands::Adopt { id, message } => {
                commands::pets::adopt(&ctx, id, message.as_deref()).await
            }
        },

        Commands::Shelters { command } => match command {
            ShelterCommands::List { page } => commands::shelters::list(&ctx, page).await,
            ShelterCommands::Delete { id } => commands::shelters::delete(&ctx, id).await,
        },

        Commands::Adoptions { command } => match command {
            AdoptionCommands::List => commands::adoptions::list(&ctx).await,
            AdoptionCommands::Update { id, message } => {
                commands::adoptions::update(&ctx, id, &message).await
            }
            AdoptionCommands::Status { id, status } => {
                commands::adoptions::set_status(&ctx, id, status).await
            }
            AdoptionCommands::Delete { id } => commands::adoptions::delete(&ctx, id).await,
        },

        Commands::Users { command } => match command {
            UserCommands::List => commands::users::list(&ctx).await,
            UserCommands::Delete { id } => commands::users::delete(&ctx, id).await,
        },

        Commands::Stats => commands::dashboard::stats(&ctx).await,
        Commands::Admin { command } => match command {
            AdminCommands::Overview => commands::dashboard::overview(&ctx).await,
            AdminCommands::Url => commands::dashboard::admin_url(ctx.config()),
        },
        Commands::Media { path } => commands::media::resolve(ctx.config(), &path),

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Show => commands::config::show(ctx.config()),
        },
    }
}
