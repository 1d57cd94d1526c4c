mod commands;
mod logging;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "site-kit")]
#[command(version, about = "Content and sitemap service for the company website", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize a new site directory with sample content
    Init {
        /// Path to create site directory
        path: PathBuf,
    },

    /// Check stored documents and the blog lists inside them
    Check {
        /// Content directory (file store root)
        path: PathBuf,
    },

    /// Serve the sitemap routes over HTTP
    Serve {
        /// Path to site.toml
        #[arg(short, long, default_value = "site.toml")]
        config: PathBuf,

        /// Address to bind, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Render one sitemap route to a file
    Render {
        /// Path to site.toml
        #[arg(short, long, default_value = "site.toml")]
        config: PathBuf,

        /// Route path to render (defaults to the first configured route)
        #[arg(short, long)]
        route: Option<String>,

        /// Output file for the generated XML
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Check { path } => commands::check::run(path).await,
        Command::Serve { config, bind } => commands::serve::run(config, bind).await,
        Command::Render {
            config,
            route,
            output,
        } => commands::render::run(config, route, output).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "site-kit", &mut io::stdout());
            Ok(())
        }
    }
}
