//! CLI entry point for microcms-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use microcms_blog::config::ExecutionContext;

#[derive(Parser)]
#[command(name = "microcms-blog")]
#[command(version)]
#[command(about = "Content layer and API-key proxy for a microCMS-backed blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List content from microCMS
    List {
        /// Type of content to list (post, category, tag)
        #[arg(default_value = "post")]
        r#type: String,

        /// Maximum number of items (defaults to per_page)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Read through the proxy with the public credentials
        #[arg(long)]
        proxy: bool,
    },

    /// Show which CMS settings are configured
    Check,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "microcms_blog=debug,info"
    } else {
        "microcms_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Server { port, ip } => {
            let blog = microcms_blog::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            microcms_blog::server::start(&blog, &ip, port).await?;
        }

        Commands::List {
            r#type,
            limit,
            proxy,
        } => {
            let blog = microcms_blog::Blog::new(&base_dir)?;
            let context = if proxy {
                ExecutionContext::Untrusted
            } else {
                ExecutionContext::Trusted
            };
            let limit = limit.unwrap_or(blog.config.per_page);
            blog.list(&r#type, limit, context).await?;
        }

        Commands::Check => {
            let blog = microcms_blog::Blog::new(&base_dir)?;
            blog.check();
        }

        Commands::Version => {
            println!("microcms-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
