//! Prodscout CLI — research products from the command line.
//!
//! Wraps the core research orchestrator and the single-shot wizard
//! operations (info, compare, recommend).

mod render;

use anyhow::Context;
use clap::Parser;
use prodscout_core::{FeatureSet, LanguageModel, Product, Researcher, load_config};
use tracing_subscriber::EnvFilter;

/// Prodscout: aggregate video, web, and forum evidence into product reports
#[derive(Parser, Debug)]
#[command(name = "prodscout", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Research one or more products against a weighted feature list
    Research {
        /// Product names to research
        #[arg(required = true)]
        products: Vec<String>,

        /// Feature that matters a lot (repeatable)
        #[arg(long = "very-important", value_name = "FEATURE")]
        very_important: Vec<String>,

        /// Feature that matters somewhat (repeatable)
        #[arg(long = "important", value_name = "FEATURE")]
        important: Vec<String>,
    },
    /// Show key considerations for a known product
    Info {
        /// Product name
        product: String,
    },
    /// Suggest the closest alternatives to a product
    Compare {
        /// Product name
        product: String,
    },
    /// Recommend products from a description of your needs
    Recommend {
        /// Free-form description of what you need
        description: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prodscout={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config().context("failed to load configuration")?;
    let researcher = Researcher::from_config(&config)?;

    match cli.command {
        Commands::Research {
            products,
            very_important,
            important,
        } => {
            let features = FeatureSet {
                very_important,
                important,
            };
            let products: Vec<Product> = products.into_iter().map(Product::new).collect();
            match researcher.run(&products, &features).await {
                Ok(results) => render::results(&results, cli.json)?,
                Err(failure) => {
                    render::failure(&failure, cli.json)?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Info { product } => {
            let info = researcher.llm().product_info(&product).await?;
            render::info(&info, cli.json)?;
        }
        Commands::Compare { product } => {
            let comparison = researcher.llm().product_comparisons(&product).await?;
            render::comparison(&comparison, cli.json)?;
        }
        Commands::Recommend { description } => {
            let recommendations = researcher.llm().product_recommendations(&description).await?;
            render::recommendations(&recommendations, cli.json)?;
        }
    }

    Ok(())
}
