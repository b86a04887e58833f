//! Portgate CLI - establish port forwards to cluster resources
//!
//! A command-line tool for establishing local port forwards, probing local
//! ports, and managing stored forward profiles.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::forward::{CommonArgs, ForwardArgs};

#[derive(Parser)]
#[command(name = "portgate")]
#[command(author, version, about = "Establish port forwards to cluster resources")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Establish a port forward and hold it until Ctrl-C
    #[command(alias = "fwd")]
    Forward(ForwardArgs),

    /// Establish a stored profile and hold it until Ctrl-C
    Up {
        /// Profile name
        name: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Check whether a local port currently accepts connections
    Check {
        /// Port number to probe
        port: u16,
    },

    /// Manage stored forward profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Add a profile
    Add {
        /// Profile name
        name: String,
        /// Namespace of the target resource
        namespace: String,
        /// Resource kind (deployment, pod, service, statefulset)
        kind: String,
        /// Resource name
        resource: String,
        /// Local port to bind
        local_port: u16,
        /// Remote port (numeric or named)
        remote_port: String,
    },
    /// Remove a profile
    #[command(alias = "rm")]
    Remove { name: String },
    /// List all profiles
    #[command(alias = "ls")]
    List,
    /// Remove all profiles
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forward(args) => {
            commands::forward::run(args).await?;
        }
        Commands::Up { name, common } => {
            commands::forward::up(name, common).await?;
        }
        Commands::Check { port } => {
            commands::check::run(port, cli.json)?;
        }
        Commands::Profile { action } => match action {
            ProfileAction::Add {
                name,
                namespace,
                kind,
                resource,
                local_port,
                remote_port,
            } => {
                commands::profile::add(name, namespace, kind, resource, local_port, remote_port)
                    .await?
            }
            ProfileAction::Remove { name } => commands::profile::remove(name).await?,
            ProfileAction::List => commands::profile::list(cli.json).await?,
            ProfileAction::Clear => commands::profile::clear().await?,
        },
    }

    Ok(())
}
