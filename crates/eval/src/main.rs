//! Command-line front end for the name-pair engine.
//!
//! Usage:
//!     nimipari pair aino korhonen
//!     nimipari best --top-first 500 --top-last 500 -k 100
//!     nimipari first aino --limit 20 --weight rhythm=0.3
//!     nimipari hints salo --role last

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nimipari_explain::{explain_pair, name_hints, Role};
use nimipari_model::{Dataset, ScoredPair, StatisticalModel, WeightError, WeightVector, WeightVectorBuilder};
use nimipari_rank::{EngineConfig, EngineError, EngineSession, ScanError, ScanProgress, ScanRequest};

#[derive(Parser)]
#[command(name = "nimipari")]
#[command(about = "Score how well first names and last names sound together")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Statistical model artifact
    #[arg(long, default_value = "data/model.json")]
    model: PathBuf,

    /// First-name dataset
    #[arg(long, default_value = "data/first_names.json")]
    first_names: PathBuf,

    /// Last-name dataset
    #[arg(long, default_value = "data/last_names.json")]
    last_names: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weight override, e.g. `rhythm=0.3` (repeatable)
    #[arg(short, long = "weight", global = true)]
    weights: Vec<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one pair with its component breakdown
    Pair {
        first: String,
        last: String,
    },

    /// Best pairs across the popularity-capped pools
    Best {
        /// First names entering the scan
        #[arg(long)]
        top_first: Option<usize>,

        /// Last names entering the scan
        #[arg(long)]
        top_last: Option<usize>,

        /// Pairs to keep
        #[arg(short)]
        k: Option<usize>,

        /// Pairs to print in text output
        #[arg(long, default_value = "20")]
        show: usize,
    },

    /// Best last names for one first name
    First {
        name: String,

        /// Maximum partners
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Partner guidance for one name
    Hints {
        name: String,

        #[arg(long, value_enum, default_value = "first")]
        role: RoleArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    First,
    Last,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::First => Role::First,
            RoleArg::Last => Role::Last,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("nimipari=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let model = StatisticalModel::load(&cli.model)
        .with_context(|| format!("loading model {}", cli.model.display()))?;
    let dataset = Dataset::load(&cli.first_names, &cli.last_names)?;
    let session = Arc::new(EngineSession::new(model, dataset, config));
    let weights = resolve_weights(&session, &cli.weights)?;

    match cli.command {
        Commands::Pair { first, last } => {
            run_pair(&session, &first, &last, &weights, &cli.format)?;
        }
        Commands::Best {
            top_first,
            top_last,
            k,
            show,
        } => {
            let defaults = session.default_request();
            let request = ScanRequest {
                top_first: top_first.unwrap_or(defaults.top_first),
                top_last: top_last.unwrap_or(defaults.top_last),
                k: k.unwrap_or(defaults.k),
            };
            run_best(session, weights, request, show, &cli.format).await?;
        }
        Commands::First { name, limit } => {
            run_first(&session, &name, &weights, limit, &cli.format)?;
        }
        Commands::Hints { name, role } => {
            run_hints(&session, &name, role.into(), &cli.format)?;
        }
    }

    Ok(())
}

/// Model defaults with the command-line overrides applied, scaled onto
/// the weight budget.
fn resolve_weights(session: &EngineSession, overrides: &[String]) -> Result<WeightVector> {
    let mut builder = WeightVectorBuilder::from_vector(session.default_weights());
    for assignment in overrides {
        builder = builder.assign(assignment)?;
    }
    match builder.normalized() {
        Ok(weights) => Ok(weights),
        Err(WeightError::AllZero) => Ok(WeightVector::neutral()),
        Err(e) => Err(e.into()),
    }
}

fn display_pair(session: &EngineSession, pair: &ScoredPair) -> String {
    let first = session.first(&pair.first_key).map_or(pair.first_key.as_str(), |p| p.display.as_str());
    let last = session.last(&pair.last_key).map_or(pair.last_key.as_str(), |p| p.display.as_str());
    format!("{first} {last}")
}

fn run_pair(session: &EngineSession, first: &str, last: &str, weights: &WeightVector, format: &str) -> Result<()> {
    let pair = session.score_pair(first, last, weights)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&pair)?);
        return Ok(());
    }

    let explanation = explain_pair(&pair, weights);
    println!("{}", display_pair(session, &pair));
    println!("   Score: {:.3} | Weighted sum: {:+.3}", pair.normalized, pair.weighted_sum);
    println!("   {}", explanation.summary);
    println!("   {}", explanation.detail);
    for item in &explanation.evidence {
        println!(
            "   {:<24} {:>7}   {}",
            item.kind,
            item.value,
            item.context.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

async fn run_best(
    session: Arc<EngineSession>,
    weights: WeightVector,
    request: ScanRequest,
    show: usize,
    format: &str,
) -> Result<()> {
    let scan_session = Arc::clone(&session);
    let mut scan = tokio::task::spawn_blocking(move || {
        let report = |p: ScanProgress| {
            tracing::info!(processed = p.processed, total = p.total, "Scanning");
        };
        scan_session.best_pairs(&weights, request, Some(&report))
    });

    let result = tokio::select! {
        joined = &mut scan => joined?,
        _ = tokio::signal::ctrl_c() => {
            session.cancel_active();
            scan.await?
        }
    };
    let pairs = match result {
        Ok(pairs) => pairs,
        Err(EngineError::Scan(ScanError::Cancelled)) => {
            eprintln!("Scan cancelled");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    println!(
        "Best pairs of {} first x {} last names",
        request.top_first, request.top_last
    );
    println!("---");
    for (i, pair) in pairs.iter().take(show).enumerate() {
        println!("{:>4}. {:<32} {:.3}", i + 1, display_pair(&session, pair), pair.normalized);
    }
    println!("\n---");
    println!("Total: {} pairs", pairs.len());
    Ok(())
}

fn run_first(session: &EngineSession, name: &str, weights: &WeightVector, limit: usize, format: &str) -> Result<()> {
    let pairs = session.best_for_first(name, weights, limit)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    for (i, pair) in pairs.iter().enumerate() {
        println!("{:>4}. {:<32} {:.3}", i + 1, display_pair(session, pair), pair.normalized);
    }
    println!("\n---");
    println!("Total: {} partners", pairs.len());
    Ok(())
}

fn run_hints(session: &EngineSession, name: &str, role: Role, format: &str) -> Result<()> {
    let profile = match role {
        Role::First => session.first(name)?,
        Role::Last => session.last(name)?,
    };
    let hints = name_hints(profile, role, session.model());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&hints)?);
        return Ok(());
    }

    println!("{}", profile.display);
    for hint in &hints {
        println!("\n{} [{}]", hint.label, hint.own_bucket);
        println!("   {}", hint.text);
    }
    Ok(())
}
