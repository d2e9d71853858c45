//! essaymark CLI: serve the evaluator or use it from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "essaymark",
    version,
    about = "Essay scoring proxy with CEFR vocabulary annotation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Evaluate one essay
    Evaluate {
        /// Text file containing the essay
        #[arg(long)]
        essay: PathBuf,

        /// Store the review under this user id
        #[arg(long)]
        user: Option<String>,

        /// Also write the annotated page to this file
        #[arg(long)]
        html: Option<PathBuf>,

        /// Print the result document as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a saved agent reply as an annotated page
    Render {
        /// Agent reply (raw content, fenced or not)
        #[arg(long)]
        result: PathBuf,

        /// Text file containing the essay
        #[arg(long)]
        essay: PathBuf,

        /// Output HTML file
        #[arg(long, default_value = "essay.html")]
        output: PathBuf,
    },

    /// List stored reviews for a user
    History {
        /// User id
        #[arg(long)]
        user: String,

        /// Maximum number of reviews to list
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter essaymark.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("essaymark=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, bind } => commands::serve::execute(config, bind).await,
        Commands::Evaluate {
            essay,
            user,
            html,
            json,
            config,
        } => commands::evaluate::execute(essay, user, html, json, config).await,
        Commands::Render {
            result,
            essay,
            output,
        } => commands::render::execute(result, essay, output),
        Commands::History {
            user,
            limit,
            config,
        } => commands::history::execute(user, limit, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
