//! The `prism search` command.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use prism_core::config::DecodeErrorPolicy;
use prism_core::{
    Config, OutputFormat as CoreOutputFormat, OutputWriter, SearchEngine, SearchRequest,
    SearchResponse,
};

/// Arguments for the `search` command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Folder of images to search (non-recursive)
    #[arg(required = true)]
    pub folder: String,

    /// Free-text query, e.g. "a snowy mountain at sunset"
    #[arg(required = true)]
    pub query: String,

    /// Minimum similarity score for a match (inclusive)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,

    /// Refine ranking with the auxiliary ImageNet classifier
    #[arg(long, conflicts_with = "no_classifier")]
    pub classifier: bool,

    /// Force classifier off even if enabled in config
    #[arg(long)]
    pub no_classifier: bool,

    /// Blend between visual and label score (0 = visual only, 1 = labels only)
    #[arg(long)]
    pub fusion_weight: Option<f64>,

    /// Labels requested from the classifier per image
    #[arg(long)]
    pub top_k: Option<usize>,

    /// What to do when an image fails to decode
    #[arg(long, value_enum)]
    pub on_decode_error: Option<DecodePolicy>,

    /// Write results to a file instead of printing a table
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format for --output (falls back to the config default)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Output format flag.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Json,
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Decode failure policy flag.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DecodePolicy {
    /// Fail the whole search
    Abort,
    /// Drop the image with a warning and keep going
    Skip,
}

impl From<DecodePolicy> for DecodeErrorPolicy {
    fn from(value: DecodePolicy) -> Self {
        match value {
            DecodePolicy::Abort => DecodeErrorPolicy::Abort,
            DecodePolicy::Skip => DecodeErrorPolicy::Skip,
        }
    }
}

/// Execute the search command.
pub async fn execute(args: SearchArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &args);

    let folder = PathBuf::from(shellexpand::tilde(&args.folder).into_owned());

    let request = SearchRequest {
        image_folder: folder,
        query: args.query.clone(),
        threshold: args.threshold.unwrap_or(config.search.threshold),
        max_results: args.max_results.unwrap_or(config.search.max_results),
        use_classifier: config.search.use_classifier,
        fusion_weight: args.fusion_weight.unwrap_or(config.search.fusion_weight),
    };

    let spinner = create_spinner("Loading models...");
    let engine = SearchEngine::load(&config).await?;
    if let Some(info) = prism_core::engine_info() {
        tracing::debug!(
            "Engine ready: {} ({}d, {}px input)",
            info.model,
            info.embedding_dim,
            info.image_size
        );
    }
    spinner.set_message(format!("Searching for \"{}\"...", request.query));
    let response = engine.search(&request).await?;
    spinner.finish_and_clear();

    match &args.output {
        Some(path) => {
            let format = resolve_format(args.format, &config);
            let file = File::create(path)?;
            let mut writer =
                OutputWriter::new(BufWriter::new(file), format, config.output.pretty);
            match format {
                CoreOutputFormat::Json => writer.write(&response)?,
                CoreOutputFormat::JsonLines => writer.write_all(&response.results)?,
            }
            writer.flush()?;
            tracing::info!("Results written to {:?}", path);
        }
        None => print_table(&response),
    }

    Ok(())
}

/// Pick the output format: CLI flag, then config, then JSON.
fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> CoreOutputFormat {
    match flag {
        Some(f) => f.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Json),
    }
}

/// Fold CLI flags into the loaded config.
fn apply_overrides(config: &mut Config, args: &SearchArgs) {
    if args.classifier {
        config.search.use_classifier = true;
    }
    if args.no_classifier {
        config.search.use_classifier = false;
    }
    if let Some(top_k) = args.top_k {
        config.search.top_k = top_k;
    }
    if let Some(policy) = args.on_decode_error {
        config.search.on_decode_error = policy.into();
    }
}

/// Print a human-readable ranked table to stdout.
fn print_table(response: &SearchResponse) {
    let stats = &response.stats;

    if response.results.is_empty() {
        println!(
            "No matches for \"{}\" ({} image(s) scanned in {:.0}ms).",
            stats.query, stats.total_images, stats.processing_time_ms
        );
        println!("Try lowering --threshold or rephrasing the query.");
        return;
    }

    println!();
    println!("  {}", style(format!("Results for \"{}\"", stats.query)).bold());
    println!("  {}", style("─".repeat(64)).dim());
    println!(
        "  {:>4}  {:>7}  {}",
        style("Rank").bold(),
        style("Score").bold(),
        style("File").bold()
    );

    for hit in &response.results {
        println!("  {:>4}  {:>7.3}  {}", hit.rank, hit.similarity, hit.file_name);
        if let Some(labels) = &hit.predicted_labels {
            if !labels.is_empty() {
                let aux = hit
                    .aux_score
                    .map(|s| format!(" ({s:.3})"))
                    .unwrap_or_default();
                println!(
                    "  {:>4}  {:>7}  {}",
                    "",
                    "",
                    style(format!("labels{}: {}", aux, labels.join(", "))).dim()
                );
            }
        }
    }

    println!("  {}", style("─".repeat(64)).dim());
    println!(
        "  {} of {} image(s) matched in {:.0}ms",
        stats.matching_images, stats.total_images, stats.processing_time_ms
    );
    println!();
}

/// Spinner shown while models load and the search runs.
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
