use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};

use cooker::{batch, verify, CookerConfig, SizeRange};

#[derive(Parser, Debug)]
#[command(name = "cooker")]
#[command(about = "Synthetic fixture generator for string-search engines")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate testN.in / testN.ref fixture pairs
    Generate(GenerateArgs),
    /// Re-check every fixture in a directory against a fresh scan of its text
    Verify {
        /// Directory holding testN.in / testN.ref pairs
        dir: PathBuf,
    },
    /// Compare a matcher's output file against a reference file
    Check {
        /// Reference file (testN.ref)
        reference: PathBuf,
        /// Output produced by the matcher under test, same format
        candidate: PathBuf,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory receiving the fixtures (created if missing)
    #[arg(long, default_value = "tests")]
    output_dir: PathBuf,

    /// Number of test cases to generate
    #[arg(long, default_value_t = 10)]
    num_tests: usize,

    #[arg(long, default_value_t = 1)]
    min_patterns: usize,

    #[arg(long, default_value_t = 10)]
    max_patterns: usize,

    #[arg(long, default_value_t = 1000)]
    min_text_len: usize,

    #[arg(long, default_value_t = 100_000)]
    max_text_len: usize,

    #[arg(long, default_value_t = 10)]
    min_pattern_len: usize,

    #[arg(long, default_value_t = 80)]
    max_pattern_len: usize,

    /// Minimum requested insertions per pattern
    #[arg(long, default_value_t = 0)]
    min_insertions: usize,

    /// Maximum requested insertions per pattern
    #[arg(long, default_value_t = 10)]
    max_insertions: usize,

    /// Placement deadline per test case, in seconds
    #[arg(long, default_value_t = 10.0)]
    timeout_secs: f64,

    /// Abort on the first abandoned test case
    #[arg(long)]
    fail_fast: bool,

    /// Suppress the console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

impl GenerateArgs {
    fn to_config(&self) -> Result<CookerConfig> {
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .map_err(|e| anyhow::anyhow!("Invalid timeout {}: {}", self.timeout_secs, e))?;

        Ok(CookerConfig {
            output_dir: self.output_dir.clone(),
            num_tests: self.num_tests,
            patterns_per_test: SizeRange::new("patterns per test", self.min_patterns, self.max_patterns)?,
            text_len: SizeRange::new("text length", self.min_text_len, self.max_text_len)?,
            pattern_len: SizeRange::new("pattern length", self.min_pattern_len, self.max_pattern_len)?,
            insertions: SizeRange::new("insertions", self.min_insertions, self.max_insertions)?,
            timeout,
            fail_fast: self.fail_fast,
            show_progress: !self.no_progress,
        })
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = args.to_config()?;
    info!(?config, "Resolved configuration");

    let stats = batch::run_batch(&config).await?;

    if let Some(ref stats_path) = args.stats_out {
        stats.save(stats_path).await?;
        info!("Run statistics written to {}", stats_path.display());
    }

    println!("cooker v{} - fixture generation complete", env!("CARGO_PKG_VERSION"));
    println!("  Output directory: {}", config.output_dir.display());
    println!("  Generated: {} test cases", stats.tests_generated);
    if stats.tests_failed > 0 {
        println!("  Abandoned: {} test cases", stats.tests_failed);
    }
    println!("  Total occurrences: {}", stats.total_occurrences);
    Ok(())
}

async fn verify_fixtures(dir: PathBuf) -> Result<()> {
    let report = verify::verify_directory(&dir).await?;

    for check in report.checks.iter().filter(|c| !c.passed()) {
        println!(
            "FAILED {}: {}",
            check.input_path.display(),
            check.error.as_deref().unwrap_or_default()
        );
    }
    println!("Verified {} fixtures: {} passed, {} failed", report.checks.len(), report.passed(), report.failed());

    if !report.all_passed() {
        anyhow::bail!("{} fixtures failed verification", report.failed());
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // JSON logs go to stderr so stdout keeps only the human summary
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting cooker");
    info!(?cli, "Parsed CLI arguments");

    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Verify { dir } => verify_fixtures(dir).await,
        Command::Check { reference, candidate } => {
            verify::check_result_files(&reference, &candidate).await?;
            println!("PASSED {} matches {}", candidate.display(), reference.display());
            Ok(())
        }
    }
}
