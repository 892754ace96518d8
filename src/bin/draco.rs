//! DRACO command line: designs the coding sequence of a TAL effector whose
//! repeat array binds a given DNA target.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use draco::{
    DMEL_CODON_USAGE, Design, Draco, NoProgress, OptimizationConfig, Outcome, Progress, about,
    codon_usage::CodonUsage,
    output::{self, NamedDesign},
    report,
    tale::Tale,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    fs::File,
    io::{BufWriter, Write},
    process::ExitCode,
};
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Fasta,
    Genbank,
    Json,
}

#[derive(Parser)]
#[command(name = "draco")]
#[command(about = "Direct Repeat Aware Codon Optimizer for TAL effector repeat arrays")]
#[command(disable_version_flag = true)]
struct Cli {
    /// DNA target bound by the repeat array, one repeat per nucleotide
    target: Option<String>,

    /// Protein sequence placed before the repeat array
    #[arg(long)]
    upstream: Option<String>,

    /// Protein sequence placed after the repeat array
    #[arg(long)]
    downstream: Option<String>,

    /// Codon usage table (CSV: codon,residue,fraction,frequency[,count]);
    /// D. melanogaster if not given
    #[arg(long)]
    codons: Option<String>,

    /// Optimization parameters as JSON (FILE or @FILE)
    #[arg(long)]
    config: Option<String>,

    /// Write the effective parameters as JSON and continue
    #[arg(long)]
    save_config: Option<String>,

    /// Do not check for direct repeats
    #[arg(long)]
    no_repeats: bool,

    /// Direct repeat lengths to check, MIN..MAX or N
    #[arg(long, value_parser = parse_length_range)]
    repeat_len: Option<(usize, usize)>,

    /// Do not check for inverted repeats
    #[arg(long)]
    no_inverted_repeats: bool,

    /// Inverted repeat lengths to check, MIN..MAX or N
    #[arg(long, value_parser = parse_length_range)]
    inv_repeat_len: Option<(usize, usize)>,

    /// Do not check for homopolymer stretches
    #[arg(long)]
    no_stretch: bool,

    /// Shortest homopolymer stretch that is rejected
    #[arg(long)]
    max_stretch: Option<usize>,

    /// Do not check the GC content
    #[arg(long)]
    no_gc: bool,

    /// GC percentage at which a window is rejected
    #[arg(long)]
    max_gc: Option<f64>,

    /// Width of the GC window
    #[arg(long)]
    gc_window: Option<usize>,

    /// Motif that must not occur (repeatable)
    #[arg(long)]
    avoid: Vec<String>,

    /// Tries per fragment before an attempt is given up
    #[arg(long)]
    max_repeat_attempts: Option<usize>,

    /// Attempts before the search is given up
    #[arg(long)]
    max_sequence_attempts: Option<usize>,

    /// Highest handicap added to the codon allowances
    #[arg(long)]
    max_handicap: Option<usize>,

    /// Random seed; random if not given
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent designs (seeds SEED, SEED+1, ...)
    #[arg(long, default_value_t = 1)]
    designs: usize,

    /// Write the sequence as RNA
    #[arg(long)]
    rna: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Output file; standard output if not given
    #[arg(short, long)]
    output: Option<String>,

    #[arg(long)]
    no_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the codon usage table and exit
    #[arg(long)]
    show_codons: bool,

    /// Print version information and exit
    #[arg(short = 'V', long)]
    version: bool,
}

fn parse_length_range(value: &str) -> Result<(usize, usize), String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("'{s}' is not a length: {e}"))
    };
    match value.split_once("..") {
        Some((min, max)) => Ok((parse(min)?, parse(max)?)),
        None => {
            let n = parse(value)?;
            Ok((n, n))
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

    let filter =
        EnvFilter::try_new(level).map_err(|e| anyhow!("Invalid log level '{level}': {e}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<OptimizationConfig> {
    let mut config = match &cli.config {
        Some(value) => {
            let path = value.strip_prefix('@').unwrap_or(value);
            OptimizationConfig::load_from_path(path)?
        }
        None => OptimizationConfig::default(),
    };

    if cli.no_repeats {
        config.check_repeats = false;
    }
    if let Some((min, max)) = cli.repeat_len {
        config.min_repeat_len = min;
        config.max_repeat_len = max;
    }
    if cli.no_inverted_repeats {
        config.check_inverted_repeats = false;
    }
    if let Some((min, max)) = cli.inv_repeat_len {
        config.min_inv_rep_len = min;
        config.max_inv_rep_len = max;
    }
    if cli.no_stretch {
        config.check_stretch = false;
    }
    if let Some(max_stretch) = cli.max_stretch {
        config.max_stretch = max_stretch;
    }
    if cli.no_gc {
        config.check_gc = false;
    }
    if let Some(max_gc) = cli.max_gc {
        config.max_gc = max_gc;
    }
    if let Some(gc_window) = cli.gc_window {
        config.gc_window = gc_window;
    }
    config.forbidden_motifs.extend(cli.avoid.iter().cloned());
    if let Some(n) = cli.max_repeat_attempts {
        config.max_repeat_attempts = n;
    }
    if let Some(n) = cli.max_sequence_attempts {
        config.max_sequence_attempts = n;
    }
    if let Some(n) = cli.max_handicap {
        config.max_handicap = n;
    }

    config.validate()?;
    Ok(config)
}

fn load_codons(cli: &Cli) -> Result<CodonUsage> {
    match &cli.codons {
        Some(path) => CodonUsage::from_csv_path(path)
            .with_context(|| format!("Could not read codon usage table '{path}'")),
        None => Ok(DMEL_CODON_USAGE.clone()),
    }
}

/// Shows the attempts of a single optimization run.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(max_attempts: usize) -> Result<Self> {
        let bar = ProgressBar::new(max_attempts as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
                .progress_chars("##-"),
        );
        Ok(Self { bar })
    }
}

impl Progress for BarProgress {
    fn attempt_started(&mut self, attempt: usize, handicap: usize) {
        self.bar.set_position(attempt.saturating_sub(1) as u64);
        self.bar.set_message(format!("handicap {handicap}"));
    }

    fn fragment_accepted(&mut self, fragment: usize, total: usize) {
        self.bar.set_message(format!("fragment {fragment}/{total}"));
    }

    fn finished(&mut self, _outcome: &Outcome) {
        self.bar.finish_and_clear();
    }
}

fn optimize(cli: &Cli, draco: &Draco, seed: u64) -> Result<Vec<(u64, Outcome)>> {
    if cli.designs > 1 {
        let seeds: Vec<u64> = (0..cli.designs as u64)
            .map(|i| seed.wrapping_add(i))
            .collect();
        return Ok(draco.optimize_seeds(&seeds)?);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let outcome = if cli.no_progress {
        draco.optimize_with_progress(&mut rng, &mut NoProgress)?
    } else {
        let mut progress = BarProgress::new(draco.config().max_sequence_attempts)?;
        draco.optimize_with_progress(&mut rng, &mut progress)?
    };
    Ok(vec![(seed, outcome)])
}

fn write_designs(
    cli: &Cli,
    designs: &[(u64, &Design)],
    config: &OptimizationConfig,
    codons: &CodonUsage,
) -> Result<()> {
    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Could not create output file '{path}'"))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    let names: Vec<String> = (1..=designs.len()).map(|i| format!("draco_{i}")).collect();
    let named: Vec<NamedDesign> = designs
        .iter()
        .zip(&names)
        .map(|((seed, design), name)| NamedDesign::new(name, Some(*seed), design))
        .collect();

    match cli.format {
        Format::Text => output::write_text(&mut writer, &named, codons, cli.rna)?,
        Format::Fasta => output::write_fasta(&mut writer, &named, cli.rna)?,
        Format::Genbank => output::write_genbank(&mut writer, &named, codons)?,
        Format::Json => {
            let reports: Vec<_> = designs
                .iter()
                .map(|(seed, design)| report::design_report(design, Some(*seed), config, codons))
                .collect();
            output::write_json(&mut writer, &reports)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Returns whether at least one design was found.
fn run(cli: &Cli) -> Result<bool> {
    if cli.version {
        println!("{}", about::version_cli_text());
        return Ok(true);
    }

    let codons = load_codons(cli)?;
    if cli.show_codons {
        println!("{codons}");
        return Ok(true);
    }

    let config = load_config(cli)?;
    if let Some(path) = &cli.save_config {
        config
            .save_to_path(path)
            .with_context(|| format!("Could not save configuration to '{path}'"))?;
    }

    let target = cli
        .target
        .as_deref()
        .context("No target given; pass the DNA sequence the repeat array should bind")?;
    let tale = Tale::new(target, cli.upstream.as_deref(), cli.downstream.as_deref())
        .context("Could not build the repeat array")?;
    tracing::info!("Target {} gives {} repeats", tale.target(), tale.n_repeats());

    let profile = tale.profile();
    let draco = Draco::new(&profile, &codons, &config)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let outcomes = optimize(cli, &draco, seed)?;

    let found: Vec<(u64, &Design)> = outcomes
        .iter()
        .filter_map(|(seed, outcome)| outcome.design().map(|d| (*seed, d)))
        .collect();
    for (seed, outcome) in &outcomes {
        if let Outcome::NotFound { attempts, handicap } = outcome {
            eprintln!(
                "No design found for seed {seed} after {attempts} attempts (handicap {handicap})"
            );
        }
    }
    if found.is_empty() {
        return Ok(false);
    }

    write_designs(cli, &found, &config, &codons)?;
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
