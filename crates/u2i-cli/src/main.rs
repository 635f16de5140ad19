mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "u2i")]
#[command(about = "Role-based access control administration")]
#[command(version)]
struct Cli {
    /// Path to the U2I config directory (default: ~/.u2i)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Password for commands that need one (or set U2I_PASSWORD env var).
    /// If not provided, will prompt interactively.
    #[arg(long, global = true, env = "U2I_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file and database, then seed defaults
    Init,

    /// Seed default permissions, roles, admin account and settings
    Seed,

    /// Sign in and print a bearer token
    Login {
        /// Username or email
        login: String,
    },

    /// Show the principal behind a token
    Whoami {
        #[arg(long, env = "U2I_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Evaluate a permission requirement for a token
    Check {
        #[arg(long, env = "U2I_TOKEN", hide_env_values = true)]
        token: String,
        /// Required permission names
        #[arg(required = true)]
        permissions: Vec<String>,
    },

    /// Inspect and toggle permissions
    #[command(subcommand)]
    Permissions(PermissionCommands),

    /// Inspect roles and edit their permission sets
    #[command(subcommand)]
    Roles(RoleCommands),

    /// Manage user accounts
    #[command(subcommand)]
    Users(UserCommands),
}

#[derive(Subcommand)]
enum PermissionCommands {
    /// List permissions grouped by category
    List,
    /// Flip a permission between active and inactive
    Toggle { name: String },
}

#[derive(Subcommand)]
enum RoleCommands {
    /// List roles, highest level first
    List,
    /// Replace the permission set of a role
    SetPermissions {
        /// Role name
        role: String,
        /// Complete new set of permission names
        permissions: Vec<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        /// Match on username, email, first or last name
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a user account
    Create {
        username: String,
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Role name (default: utilisateur)
        #[arg(long)]
        role: Option<String>,
    },
    /// Reset the password of a user
    Passwd {
        /// Username or email
        login: String,
    },
}

/// Get a password from CLI arg, env var, or interactive prompt.
pub fn get_password(cli_password: &Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(p) = cli_password {
        return Ok(p.clone());
    }
    Ok(rpassword::prompt_password_stderr(prompt)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("u2i_auth=info".parse()?)
                .add_directive("u2i=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => u2i_auth::U2iConfig::default_base_dir()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => rt.block_on(commands::init::run(&base_dir)),
        Commands::Seed => rt.block_on(commands::seed::run(&base_dir)),
        Commands::Login { ref login } => {
            rt.block_on(commands::session::login(&base_dir, login, &cli.password))
        }
        Commands::Whoami { ref token } => rt.block_on(commands::session::whoami(&base_dir, token)),
        Commands::Check {
            ref token,
            ref permissions,
        } => rt.block_on(commands::session::check(&base_dir, token, permissions)),
        Commands::Permissions(ref cmd) => match cmd {
            PermissionCommands::List => rt.block_on(commands::permissions::list(&base_dir)),
            PermissionCommands::Toggle { name } => {
                rt.block_on(commands::permissions::toggle(&base_dir, name))
            }
        },
        Commands::Roles(ref cmd) => match cmd {
            RoleCommands::List => rt.block_on(commands::roles::list(&base_dir)),
            RoleCommands::SetPermissions { role, permissions } => rt.block_on(
                commands::roles::set_permissions(&base_dir, role, permissions),
            ),
        },
        Commands::Users(ref cmd) => match cmd {
            UserCommands::List { search } => {
                rt.block_on(commands::users::list(&base_dir, search.clone()))
            }
            UserCommands::Create {
                username,
                email,
                first_name,
                last_name,
                role,
            } => rt.block_on(commands::users::create(
                &base_dir,
                commands::users::NewAccount {
                    username,
                    email,
                    first_name,
                    last_name,
                    role: role.as_deref(),
                },
                &cli.password,
            )),
            UserCommands::Passwd { login } => {
                rt.block_on(commands::users::passwd(&base_dir, login, &cli.password))
            }
        },
    }
}
