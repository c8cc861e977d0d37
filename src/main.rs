use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use garble::lab_results::{self, LabResultGenerator};
use garble::output::{write_variants, write_variants_file};
use garble::reader::{ReaderConfig, TermReader};
use garble::{
    handle, parse_term_bytes, AugmentationConfig, Augmenter, EnhancementTable, LocalObjectStore,
    RunStats, TermRecord, VariantRow,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "garble")]
#[command(about = "Synthetic training-data augmentation for clinical terminology strings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate augmented variants for every term in a terms file
    Augment(AugmentArgs),
    /// Generate labeled synthetic lab result words as CSV
    LabResults(LabResultsArgs),
    /// Fetch the objects referenced by a queue event and augment their terms
    Event(EventArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Augmentation config JSON (seed, variants_per_term, steps)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enhancement table JSON (term -> abbreviation/acronym/replacement lists)
    #[arg(long)]
    enhancements: Option<PathBuf>,

    /// Seed for the random source, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Variants generated per term, overrides the config file
    #[arg(long)]
    variants: Option<usize>,
}

#[derive(Args, Debug)]
struct AugmentArgs {
    /// Terms file: one term per line, optionally followed by TAB and ';'-separated related names
    input: PathBuf,

    /// Output TSV path (default: STDOUT)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Abort on first read error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct LabResultsArgs {
    /// Number of rows to generate
    num_rows: usize,

    /// Output CSV path (default: STDOUT)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Probability of changing case
    #[arg(long, default_value_t = 0.5, value_parser = lab_results::parse_probability)]
    change_case: f64,

    /// Probability of introducing a typo
    #[arg(long, default_value_t = 0.1, value_parser = lab_results::parse_probability)]
    introduce_typo: f64,

    /// Seed for the random source
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct EventArgs {
    /// Queue event JSON file
    event: PathBuf,

    /// Directory holding one sub-directory per bucket
    #[arg(long)]
    store_root: PathBuf,

    /// Output TSV path (default: STDOUT)
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: data goes to STDOUT, so structured logs go to STDERR
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    match cli.command {
        Command::Augment(args) => run_augment(args).await,
        Command::LabResults(args) => run_lab_results(args),
        Command::Event(args) => run_event(args).await,
    }
}

async fn build_augmenter(engine: &EngineArgs) -> Result<Augmenter> {
    let mut config = match &engine.config {
        Some(path) => AugmentationConfig::load(path).await?,
        None => AugmentationConfig::default(),
    };
    if let Some(seed) = engine.seed {
        config.seed = Some(seed);
    }
    if let Some(variants) = engine.variants {
        config.variants_per_term = variants;
    }

    // WHY: an invalid table must stop the run before any term is processed
    let table = match &engine.enhancements {
        Some(path) => EnhancementTable::load(path).await?,
        None => {
            info!("No enhancement table supplied, enhance steps will leave terms unchanged");
            EnhancementTable::default()
        }
    };
    info!(entries = table.len(), steps = config.steps.len(), "Augmentation engine ready");

    Ok(Augmenter::new(config, Arc::new(table)))
}

fn augment_records(
    augmenter: &mut Augmenter,
    records: &[TermRecord],
    first_index: usize,
    progress: Option<&ProgressBar>,
) -> Vec<VariantRow> {
    let mut rows = Vec::with_capacity(records.len() * augmenter.config().variants_per_term);

    for (offset, record) in records.iter().enumerate() {
        let variants = augmenter.variants(&record.term, &record.related_terms);
        rows.extend(variants.into_iter().enumerate().map(|(variant_index, variant)| VariantRow {
            term_index: first_index + offset,
            variant_index,
            variant,
            original: record.term.clone(),
        }));
        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    rows
}

async fn emit_rows(output: Option<&Path>, rows: &[VariantRow]) -> Result<()> {
    match output {
        Some(path) => write_variants_file(path, rows).await,
        None => write_variants(tokio::io::stdout(), rows).await,
    }
}

async fn run_augment(args: AugmentArgs) -> Result<()> {
    // WHY: validate input early to fail fast with clear error
    if !args.input.is_file() {
        anyhow::bail!("Terms file does not exist: {}", args.input.display());
    }

    let start = Instant::now();
    let mut augmenter = build_augmenter(&args.engine).await?;
    let mut stats = RunStats::new(&args.input);
    stats.steps = augmenter.config().steps.iter().map(|s| s.name().to_string()).collect();

    let reader = TermReader::new(ReaderConfig {
        fail_fast: args.fail_fast,
        ..ReaderConfig::default()
    });
    let (records, read_stats) = reader.read_terms(&args.input).await?;
    stats.terms_read = read_stats.terms_read;
    if let Some(ref error) = read_stats.read_error {
        warn!("Continuing with partial terms: {}", error);
        stats.read_error = Some(error.clone());
    }

    let progress = if args.no_progress {
        None
    } else {
        let bar = ProgressBar::new(records.len() as u64);
        bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} terms ({elapsed})")?);
        Some(bar)
    };

    let rows = augment_records(&mut augmenter, &records, 0, progress.as_ref());
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    emit_rows(args.output.as_deref(), &rows).await?;

    stats.record_rows(&rows);
    stats.finish(start.elapsed());
    stats.write_json(&args.stats_out).await?;

    info!(
        terms = stats.terms_read,
        variants = stats.variants_written,
        unchanged = stats.unchanged_variants,
        elapsed_ms = stats.processing_time_ms,
        "Augmentation complete"
    );
    Ok(())
}

fn run_lab_results(args: LabResultsArgs) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let generator = LabResultGenerator {
        change_case: args.change_case,
        introduce_typo: args.introduce_typo,
    };
    let rows = generator.generate(args.num_rows, &mut rng);

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            lab_results::write_csv(&rows, file)?;
        }
        None => lab_results::write_csv(&rows, std::io::stdout().lock())?,
    }

    info!(rows = rows.len(), "Lab result generation complete");
    Ok(())
}

async fn run_event(args: EventArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.event)
        .await
        .with_context(|| format!("Failed to read event file {}", args.event.display()))?;
    let event: serde_json::Value = serde_json::from_str(&content).context("Event file is not valid JSON")?;

    let store = LocalObjectStore::new(&args.store_root);
    let response = handle(&event, &store)?;
    let mut augmenter = build_augmenter(&args.engine).await?;

    let mut rows = Vec::new();
    let mut next_index = 0;
    let mut skipped = 0;
    for (file_index, contents) in response.file_contents.iter().enumerate() {
        let records = match parse_term_bytes(contents) {
            Ok(records) => records,
            Err(e) => {
                warn!(file_index, "Skipping fetched object: {}", e);
                skipped += 1;
                continue;
            }
        };
        rows.extend(augment_records(&mut augmenter, &records, next_index, None));
        next_index += records.len();
    }

    emit_rows(args.output.as_deref(), &rows).await?;
    info!(
        files = response.file_contents.len(),
        skipped,
        terms = next_index,
        variants = rows.len(),
        "{}",
        response.message
    );
    Ok(())
}
