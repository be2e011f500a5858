use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wikicheck::Result;
use wikicheck::commands::{
    assemble_context, build_projection, compare_texts, embed_text, import_documents,
    list_documents, show_dimension,
};
use wikicheck::config::{get_config_dir, init_config, show_config};

#[derive(Parser)]
#[command(name = "wikicheck")]
#[command(about = "Embeddings and budgeted document context for retrieval-augmented fact-checking")]
#[command(version)]
struct Cli {
    /// Use this configuration directory instead of ~/.wikicheck
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file, or show the current one
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Generate and persist a random projection matrix
    BuildProjection {
        /// Output dimension of the encoder
        #[arg(long)]
        source_dim: usize,
        /// Reduced embedding dimension
        #[arg(long)]
        target_dim: usize,
        /// Random seed; the same seed always yields the same matrix
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the embedding of a text as JSON
    Embed {
        text: String,
    },
    /// Print the embedding dimension as JSON
    Dimension,
    /// Print the cosine similarity and cosine distance of two texts' embeddings as JSON
    Similarity {
        first: String,
        second: String,
    },
    /// Import documents from a JSONL file of {"title", "text"} objects
    Import {
        file: PathBuf,
    },
    /// List documents in the store
    Documents {
        /// Maximum number of documents to list
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Assemble the fact-check context for the given document ids
    Assemble {
        /// Document ids (0-based dataset positions) in rank order
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<i64>,
        /// Total character budget (defaults to the configured budget)
        #[arg(long)]
        budget: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else if init_config(&config_dir)? {
                eprintln!(
                    "Wrote default configuration to {}",
                    config_dir.join("config.toml").display()
                );
            } else {
                show_config(&config_dir)?;
            }
        }
        Commands::BuildProjection {
            source_dim,
            target_dim,
            seed,
        } => {
            build_projection(&config_dir, source_dim, target_dim, seed)?;
        }
        Commands::Embed { text } => {
            embed_text(&config_dir, &text)?;
        }
        Commands::Dimension => {
            show_dimension(&config_dir)?;
        }
        Commands::Similarity { first, second } => {
            compare_texts(&config_dir, &first, &second)?;
        }
        Commands::Import { file } => {
            import_documents(&config_dir, &file).await?;
        }
        Commands::Documents { limit } => {
            list_documents(&config_dir, limit).await?;
        }
        Commands::Assemble { ids, budget } => {
            assemble_context(&config_dir, &ids, budget).await?;
        }
    }

    Ok(())
}
