//! boxgate - Authenticated Container Gateway CLI

mod commands;

use clap::{Parser, Subcommand};
use commands::ClientOpts;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "boxgate")]
#[command(author, version, about = "Authenticated container gateway", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the gateway config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway server
    Serve,

    /// Drive a remote gateway
    Client {
        #[command(flatten)]
        conn: ClientOpts,

        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Create a container
    Create {
        /// Image to run
        #[arg(long)]
        image: String,
        /// Memory limit in megabytes (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        memory_mb: u64,
        /// CPU share (0 = unlimited)
        #[arg(long, default_value_t = 0.0)]
        cpu: f64,
        /// Environment variable as KEY=VALUE (repeatable)
        #[arg(long = "env")]
        env: Vec<String>,
        /// Label as KEY=VALUE (repeatable)
        #[arg(long = "label")]
        label: Vec<String>,
        /// Attach to the engine's bridge network
        #[arg(long)]
        bridge: bool,
        /// Command to run in the container
        #[arg(trailing_var_arg = true)]
        cmd: Vec<String>,
    },

    /// Start a container
    Start {
        /// Container id from a previous create
        id: String,
    },

    /// Suspend a running container
    Suspend {
        /// Container id
        id: String,
    },

    /// Stop a container
    Stop {
        /// Container id
        id: String,
    },

    /// Close a container, freeing its resources
    Close {
        /// Container id
        id: String,
    },

    /// Show a container's current state
    Info {
        /// Container id
        id: String,
    },

    /// Walk a container through create, start and close
    Demo {
        /// Image to use for the walkthrough
        #[arg(long, default_value = "busybox:latest")]
        image: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match &cli.config {
        Some(path) => boxgate_config::GatewayConfig::load_from(path)?,
        None => boxgate_config::GatewayConfig::load()?,
    };

    match cli.command {
        Commands::Serve => commands::serve(config).await?,
        Commands::Client { conn, command } => {
            let mut client = commands::connect(&conn, &config).await?;
            match command {
                ClientCommands::Create {
                    image,
                    memory_mb,
                    cpu,
                    env,
                    label,
                    bridge,
                    cmd,
                } => {
                    commands::create(&mut client, image, memory_mb, cpu, env, label, bridge, cmd)
                        .await?;
                }
                ClientCommands::Start { id } => commands::start(&mut client, id).await?,
                ClientCommands::Suspend { id } => commands::suspend(&mut client, id).await?,
                ClientCommands::Stop { id } => commands::stop(&mut client, id).await?,
                ClientCommands::Close { id } => commands::close(&mut client, id).await?,
                ClientCommands::Info { id } => commands::info(&mut client, id).await?,
                ClientCommands::Demo { image } => commands::demo(&mut client, image).await?,
            }
        }
    }

    Ok(())
}
