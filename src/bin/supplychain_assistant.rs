//! supplychain-assistant: reorder plans and inventory Q&A from the command line.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use supplychain_assistant::{AssistantConfig, DemandDataset, SupplyChainAssistant};

/// Supply chain planning assistant backed by Gemini.
#[derive(Parser, Debug)]
#[command(name = "supplychain-assistant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Demand history CSV (overrides the config's data_path).
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Print the performance summary to stderr when done.
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a free-form inventory question.
    Ask {
        question: String,
    },

    /// Reorder plan for one product.
    Plan {
        product_id: String,
    },

    /// Reorder plans for several products.
    Batch {
        #[arg(required = true)]
        product_ids: Vec<String>,
    },

    /// Best-selling products by units.
    Top {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Demand summary for one product.
    Summary {
        product_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AssistantConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AssistantConfig::from_env()?,
    };
    if let Some(data) = &cli.data {
        config.data_path = Some(data.clone());
    }

    match cli.command {
        Commands::Top { limit } => {
            let dataset = load_dataset(&config)?;
            for (rank, (code, units)) in dataset.top_products(limit).iter().enumerate() {
                println!("{:>3}. {:<10} {:>8}", rank + 1, code, units);
            }
        }
        Commands::Summary { product_id } => {
            let dataset = load_dataset(&config)?;
            match dataset.summarize(&product_id) {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => bail!("unknown product '{}'", product_id),
            }
        }
        Commands::Ask { question } => {
            let assistant = SupplyChainAssistant::builder().config(config).build()?;
            let answer = assistant.ask(&question).await?;
            println!("{}", answer.text);
            if !answer.sources.is_empty() {
                println!("\nSources: {}", answer.sources.join(", "));
            }
            report(&assistant, cli.stats);
        }
        Commands::Plan { product_id } => {
            let assistant = SupplyChainAssistant::builder().config(config).build()?;
            let plan = assistant.plan_reorder(&product_id).await?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            report(&assistant, cli.stats);
        }
        Commands::Batch { product_ids } => {
            let assistant = SupplyChainAssistant::builder().config(config).build()?;
            let batch = assistant.plan_batch(&product_ids).await;
            let out = serde_json::json!({
                "plans": batch.plans,
                "failures": batch.failures,
                "elapsed_ms": batch.elapsed.as_millis() as u64,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            report(&assistant, cli.stats);
            if !batch.is_complete() {
                bail!("{} of {} products failed", batch.failures.len(), product_ids.len());
            }
        }
    }
    Ok(())
}

fn load_dataset(config: &AssistantConfig) -> anyhow::Result<DemandDataset> {
    let path = config
        .data_path
        .as_ref()
        .context("no demand data: pass --data or set data_path in the config")?;
    Ok(DemandDataset::from_path(path)?)
}

fn report(assistant: &SupplyChainAssistant, enabled: bool) {
    if enabled {
        eprintln!("{}", assistant.performance_summary());
    }
}
