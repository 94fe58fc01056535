use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use diasem::assoc::Measure;
use diasem::config::Config;
use diasem::corpus::fnames::FileLists;
use diasem::corpus::reader::CorpusReader;
use diasem::matrix::TypeTokenMatrix;
use diasem::pipeline::model::ModelOptions;
use diasem::token_level::distance::Metric;
use diasem::token_level::vectors::Composition;
use diasem::variants::{LemmaMarginal, VariantSet};
use diasem::vocab::Vocab;

/// diasem: token-level distributional models of spelling variants.
///
/// Builds frequency lists and co-occurrence matrices per historical
/// subcorpus, then token vectors and token distances for the variants of
/// the lemmas under study.
#[derive(Parser)]
#[command(name = "diasem", version, about)]
struct Cli {
    /// Settings file (dotenv format). Defaults to ./.env when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the frequency list of every period
    Freq,

    /// Build co-occurrence matrices for every modelled period and window
    Colloc,

    /// List candidate spellings of the lemmas for manual checking
    Candidates {
        /// Period whose frequency list is searched (default: DIASEM_MODEL_PERIOD)
        #[arg(long)]
        period: Option<String>,
    },

    /// Build the token-level model of one period
    Model(ModelArgs),

    /// Run every stage in order: freq, colloc, candidates, model
    Run(ModelArgs),

    /// Summarize a saved frequency list (.freq) or matrix (.pac)
    Inspect {
        path: PathBuf,

        /// Number of rows to preview
        #[arg(long, default_value = "10")]
        rows: usize,
    },

    /// Show which pipeline outputs exist
    Status,
}

#[derive(Args)]
struct ModelArgs {
    /// Period to model (default: DIASEM_MODEL_PERIOD)
    #[arg(long)]
    period: Option<String>,

    /// Number of tokens to sample (default: DIASEM_SAMPLE_SIZE)
    #[arg(long)]
    sample_size: Option<usize>,

    /// Random seed for the sample (default: DIASEM_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Association measure (default: DIASEM_MEASURE)
    #[arg(long, value_enum)]
    measure: Option<Measure>,

    /// Distance metric (default: DIASEM_METRIC)
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Row marginal for lemma rows (default: DIASEM_LEMMA_MARGINAL)
    #[arg(long, value_enum)]
    lemma_marginal: Option<LemmaMarginal>,

    /// How weighted second-order vectors are combined
    #[arg(long, value_enum, default_value = "sum")]
    composition: Composition,
}

impl ModelArgs {
    fn options(&self, config: &Config) -> ModelOptions {
        let mut options = ModelOptions::from_config(config);
        if let Some(period) = &self.period {
            options.period = period.clone();
        }
        if let Some(size) = self.sample_size {
            options.sample_size = size;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(measure) = self.measure {
            options.measure = measure;
        }
        if let Some(mode) = self.lemma_marginal {
            options.lemma_marginal = mode;
        }
        if let Some(metric) = self.metric {
            options.metric = metric;
        }
        options.composition = self.composition;
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("diasem=info")),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Freq => {
            let (reader, lists) = open_corpus(&config)?;
            let vocabs = diasem::pipeline::freq::run(&config, &reader, &lists)?;
            for (period, vocab) in &vocabs {
                diasem::output::terminal::display_vocab(&format!("Period {period}"), vocab, 5);
            }
            println!("\n{}", "Frequency lists saved.".bold());
        }

        Commands::Colloc => {
            let (reader, lists) = open_corpus(&config)?;
            let written = diasem::pipeline::colloc::run(&config, &reader, &lists)?;
            println!("\n{}", "Co-occurrence matrices saved.".bold());
            for path in &written {
                println!("  {}", path.display().to_string().dimmed());
            }
        }

        Commands::Candidates { period } => {
            let set = VariantSet::load_or_default(config.variants_path.as_deref())?;
            let period = period.unwrap_or_else(|| config.model_period.clone());
            let candidates = diasem::pipeline::candidates::run(&config, &set, &period)?;
            diasem::output::terminal::display_candidates(&candidates);
            println!(
                "\nWorklist saved to: {}",
                config.candidates_path().display().to_string().bold()
            );
        }

        Commands::Model(args) => {
            let options = args.options(&config);
            run_model(&config, &options)?;
        }

        Commands::Run(args) => {
            let options = args.options(&config);
            let (reader, lists) = open_corpus(&config)?;

            println!("{}", "[1/4] Frequency lists".bold());
            diasem::pipeline::freq::run(&config, &reader, &lists)?;

            println!("{}", "[2/4] Co-occurrence matrices".bold());
            diasem::pipeline::colloc::run(&config, &reader, &lists)?;

            println!("{}", "[3/4] Candidate spellings".bold());
            let set = VariantSet::load_or_default(config.variants_path.as_deref())?;
            diasem::pipeline::candidates::run(&config, &set, &options.period)?;

            println!("{}", "[4/4] Token-level model".bold());
            run_model(&config, &options)?;
        }

        Commands::Inspect { path, rows } => inspect(&path, rows)?,

        Commands::Status => diasem::status::show(&config),
    }

    Ok(())
}

/// Validate the corpus settings and load the filename lists.
fn open_corpus(config: &Config) -> Result<(CorpusReader, FileLists)> {
    config.require_corpus()?;
    let reader = CorpusReader::from_config(config)?;
    let lists = FileLists::load(config)?;
    Ok((reader, lists))
}

fn run_model(config: &Config, options: &ModelOptions) -> Result<()> {
    let (reader, lists) = open_corpus(config)?;
    let set = VariantSet::load_or_default(config.variants_path.as_deref())?;
    info!(
        period = options.period.as_str(),
        lemmas = set.lemmas.len(),
        "Building token-level model"
    );

    println!("Building token-level model for period {}...", options.period);
    let summary = diasem::pipeline::model::run(
        config,
        &reader,
        lists.get(&options.period)?,
        &set,
        options,
    )?;
    diasem::output::terminal::display_model_summary(&summary);
    Ok(())
}

fn inspect(path: &Path, rows: usize) -> Result<()> {
    let name = path.display().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("freq") => {
            let vocab = Vocab::load(path)?;
            diasem::output::terminal::display_vocab(&name, &vocab, rows);
        }
        Some("pac") => {
            let matrix = TypeTokenMatrix::load(path)?;
            diasem::output::terminal::display_matrix(&name, &matrix, rows);
        }
        _ => anyhow::bail!("Don't know how to inspect {name}: expected a .freq or .pac file"),
    }
    Ok(())
}
