use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rsltr::evaluate::evaluate;
use rsltr::loader::{load_corpus, load_idf, load_labels};
use rsltr::ranking::rank_by_relevance;
use rsltr::{FeatureExtractionStrategy, Pairwise, Pointwise, RankingConfig, Rankings};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Learning-to-rank feature extraction in Rust", long_about = None)]
struct Args {
    /// JSON file overriding weights and smoothing constants
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the feature matrix and row index as JSON
    Extract {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        idf: PathBuf,

        /// Relevance file; when given, training rows are produced
        #[arg(short, long)]
        labels: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Mode::Pointwise)]
        mode: Mode,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank candidates by field-weighted TF-IDF relevance
    Rank {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        idf: PathBuf,

        /// Relevance file; when given, NDCG is reported
        #[arg(short, long)]
        labels: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Pointwise,
    Pairwise,
}

#[derive(Serialize)]
struct FeatureDump<'a> {
    matrix: &'a rsltr::FeatureMatrix,
    index: &'a rsltr::RowIndex,
}

fn load_config(path: Option<&Path>) -> Result<RankingConfig> {
    match path {
        Some(path) => RankingConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RankingConfig::default()),
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn extract<S: FeatureExtractionStrategy>(
    strategy: S,
    data: &Path,
    idf: &Path,
    labels: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let corpus = load_corpus(data).context("Failed to load signal file")?;
    let idf = load_idf(idf, &strategy.config().idf).context("Failed to load DF file")?;

    match labels {
        Some(labels) => {
            let labels = load_labels(labels).context("Failed to load relevance file")?;
            let set = strategy.extract_train_features(&corpus, &labels, &idf)?;
            write_json(&FeatureDump { matrix: &set.matrix, index: &set.index }, output)
        }
        None => {
            let features = strategy.extract_test_features(&corpus, &idf)?;
            write_json(
                &FeatureDump {
                    matrix: &features.matrix,
                    index: &features.index,
                },
                output,
            )
        }
    }
}

fn print_rankings(rankings: &Rankings) {
    for (query, urls) in rankings {
        println!("query: {}", query);
        for url in urls {
            println!("  url: {}", url);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Extract {
            data,
            idf,
            labels,
            mode,
            output,
        } => {
            let start = Instant::now();
            match mode {
                Mode::Pointwise => extract(Pointwise::new(config), &data, &idf, labels.as_deref(), output.as_deref())?,
                Mode::Pairwise => extract(Pairwise::new(config), &data, &idf, labels.as_deref(), output.as_deref())?,
            }
            info!("Extraction finished in {:?}", start.elapsed());
        }
        Command::Rank {
            data,
            idf,
            labels,
            output,
        } => {
            let corpus = load_corpus(&data).context("Failed to load signal file")?;
            let idf = load_idf(&idf, &config.idf).context("Failed to load DF file")?;

            let start = Instant::now();
            let rankings = rank_by_relevance(&corpus, &idf, &config);
            info!("Ranked {} queries in {:?}", rankings.len(), start.elapsed());

            match output.as_deref() {
                Some(path) => write_json(&rankings, Some(path))?,
                None => print_rankings(&rankings),
            }

            if let Some(labels) = labels {
                let labels = load_labels(&labels).context("Failed to load relevance file")?;
                let result = evaluate(&rankings, &labels);
                println!("NDCG over {} queries: {:.4}", result.queries, result.mean_ndcg);
            }
        }
    }

    Ok(())
}
