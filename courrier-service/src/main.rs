//! courrier - Gestion du Courrier command line
//!
//! Every invocation opens the store, signs in with the given credentials,
//! runs one command and exits.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use courrier_core::{Category, CourierType, RefState};
use courrier_service::{BackendKind, Config};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

/// courrier - internal mail tracking
#[derive(Parser, Debug)]
#[command(name = "courrier")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Snapshot file (json) or database (sqlite)
    #[arg(long, env = "COURRIER_DATA")]
    data: Option<PathBuf>,

    /// Storage backend (memory, json, sqlite)
    #[arg(long, env = "COURRIER_BACKEND")]
    backend: Option<BackendKind>,

    /// Email to sign in with
    #[arg(long, env = "COURRIER_EMAIL")]
    email: Option<String>,

    /// Password to sign in with
    #[arg(long, env = "COURRIER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Only allow the standard workflow transitions
    #[arg(long)]
    strict: bool,

    /// Log filter, e.g. `info` or `courrier_service=debug`
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Selectors shared by `list` and `export`; `all` means no restriction
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Search reference, subject and description
    #[arg(short, long)]
    query: Option<String>,

    #[arg(long, default_value = "all")]
    state: String,

    #[arg(long = "type", default_value = "all")]
    courier_type: String,

    #[arg(long, default_value = "all")]
    category: String,

    #[arg(long, default_value = "all")]
    priority: String,

    /// Destination entity id
    #[arg(long, default_value = "all")]
    entity: String,

    /// date_desc, date_asc or priority
    #[arg(long, default_value = "date_desc")]
    sort: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    subject: String,

    /// Courier type id
    #[arg(long = "type")]
    courier_type: String,

    /// Category id
    #[arg(long)]
    category: String,

    /// Destination entity id
    #[arg(long)]
    to: String,

    /// Sending entity id
    #[arg(long)]
    from: Option<String>,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "normal")]
    priority: String,

    /// User id to assign
    #[arg(long)]
    assign: Option<String>,

    /// Files to attach
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    id: String,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    priority: Option<String>,

    /// Destination entity id
    #[arg(long)]
    to: Option<String>,

    /// User id to assign, or `none` to clear
    #[arg(long)]
    assign: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the store with default data if it does not exist
    Init {
        /// Replace existing data with the defaults (super admin only)
        #[arg(long)]
        reset: bool,
    },

    /// List courriers visible to the signed-in user
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Show one courrier with its history
    Show { id: String },

    /// Register a new courrier
    Create(CreateArgs),

    /// Edit descriptive fields of a courrier
    Update(UpdateArgs),

    /// Move a courrier to another state
    Transition {
        id: String,

        /// new, in_progress, treated, rejected or archived
        state: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a courrier
    Delete { id: String },

    /// Dashboard statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the list view as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (defaults to courriers_<date>.csv, `-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the signed-in user's password
    Passwd {
        #[arg(long)]
        new_password: String,
    },

    /// Manage users
    #[command(subcommand)]
    Users(UserCommands),

    /// Manage entities
    #[command(subcommand)]
    Entities(EntityCommands),

    /// Manage courier types
    #[command(subcommand)]
    Types(LookupCommands),

    /// Manage categories
    #[command(subcommand)]
    Categories(LookupCommands),

    /// Manage reference states
    #[command(subcommand)]
    States(LookupCommands),
}

impl Commands {
    /// Commands that never write, so the stored document is left as found
    fn is_read_only(&self) -> bool {
        match self {
            Commands::Init { reset } => !reset,
            Commands::List(_) | Commands::Show { .. } | Commands::Stats { .. } => true,
            Commands::Export { .. } => true,
            Commands::Users(cmd) => matches!(cmd, UserCommands::List),
            Commands::Entities(cmd) => matches!(cmd, EntityCommands::List),
            Commands::Types(cmd) | Commands::Categories(cmd) | Commands::States(cmd) => {
                matches!(cmd, LookupCommands::List)
            }
            _ => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    List,
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// super_admin, admin, chef, agent or auditor
        #[arg(long)]
        role: String,
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// Entity id, or `none` to clear
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    List,
    Add {
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        chef: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        code: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Parent entity id, or `none` to clear
        #[arg(long)]
        parent: Option<String>,
        /// Chef user id, or `none` to clear
        #[arg(long)]
        chef: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LookupCommands {
    List,
    Add {
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Display color (reference states only)
        #[arg(long)]
        color: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "courrier_service=info,courrier_core=info".into()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration, flags override the environment
    let mut config = Config::from_env();
    if let Some(data) = cli.data.clone() {
        config.data_path = data;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if cli.strict {
        config.strict_transitions = true;
    }
    tracing::debug!(?config, "Loaded configuration");

    let credentials = commands::Credentials {
        email: cli.email,
        password: cli.password,
    };
    let mut app = commands::open(config)?;
    let read_only = cli.command.is_read_only();

    match cli.command {
        Commands::Init { reset } => commands::init(&mut app, &credentials, reset),
        Commands::List(filter) => commands::list(&app, &credentials, &filter),
        Commands::Show { id } => commands::show(&app, &credentials, &id),
        Commands::Create(args) => commands::create(&mut app, &credentials, args),
        Commands::Update(args) => commands::update(&mut app, &credentials, args),
        Commands::Transition { id, state, notes } => {
            commands::transition(&mut app, &credentials, &id, &state, notes)
        }
        Commands::Delete { id } => commands::delete(&mut app, &credentials, &id),
        Commands::Stats { json } => commands::stats(&app, &credentials, json),
        Commands::Export { filter, output } => {
            commands::export(&app, &credentials, &filter, output)
        }
        Commands::Passwd { new_password } => {
            commands::passwd(&mut app, &credentials, &new_password)
        }
        Commands::Users(cmd) => commands::users(&mut app, &credentials, cmd),
        Commands::Entities(cmd) => commands::entities(&mut app, &credentials, cmd),
        Commands::Types(cmd) => commands::lookups::<CourierType>(&mut app, &credentials, cmd),
        Commands::Categories(cmd) => commands::lookups::<Category>(&mut app, &credentials, cmd),
        Commands::States(cmd) => commands::lookups::<RefState>(&mut app, &credentials, cmd),
    }?;

    if read_only {
        return Ok(());
    }
    commands::close(app)
}
