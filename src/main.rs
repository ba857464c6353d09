//! PromptOptimizer CLI - Shorten prompts and report the token savings

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use prompt_optimizer::{
    config::Config,
    metrics::{MetricsTracker, ModelPricing, SavingsReport},
    nlp::PosTagger,
    optimization::{OptimizationResult, PromptOptimizer, DEFAULT_AGGRESSIVENESS},
    tokenizer::CountingMethod,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prompt-optimizer")]
#[command(about = "Shorten LLM prompts and estimate the token and cost savings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Config file to use instead of the default location (must exist)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a single prompt
    Optimize {
        /// Prompt text (reads stdin when neither --input nor --file is given)
        #[arg(short, long, conflicts_with = "file")]
        input: Option<String>,

        /// Read the prompt from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Aggressiveness 0.0 - 1.0 (default from config)
        #[arg(short, long)]
        aggressiveness: Option<f32>,

        /// Model used for the cost report
        #[arg(short, long)]
        model: Option<String>,

        /// Custom input cost per 1000 tokens
        #[arg(long, requires = "output_cost")]
        input_cost: Option<f64>,

        /// Custom output cost per 1000 tokens
        #[arg(long, requires = "input_cost")]
        output_cost: Option<f64>,

        /// Write the optimized prompt to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result and report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Optimize several prompt files
    Batch {
        /// Prompt files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Aggressiveness 0.0 - 1.0 (default from config)
        #[arg(short, long)]
        aggressiveness: Option<f32>,

        /// Model used for the cost estimate
        #[arg(short, long)]
        model: Option<String>,

        /// Directory for optimized files (default: only print the summary)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the part-of-speech tags the reducer sees
    Tag {
        /// Text to tag
        #[arg(short, long)]
        input: String,
    },

    /// List the model price table
    Models,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// JSON form of `optimize --json`
#[derive(Serialize)]
struct OptimizeOutput<'a> {
    #[serde(flatten)]
    result: &'a OptimizationResult,
    aggressiveness: f32,
    model: &'a str,
    rules_applied: &'a [String],
    report: &'a SavingsReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the optimized prompt, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_file = cli.config_file.as_deref();

    match cli.command {
        Commands::Optimize {
            input,
            file,
            aggressiveness,
            model,
            input_cost,
            output_cost,
            output,
            json,
        } => {
            let custom = input_cost.zip(output_cost).map(|(i, o)| ModelPricing::new(i, o));
            run_optimize(config_file, input, file, aggressiveness, model, custom, output, json)
                .await?;
        }
        Commands::Batch {
            files,
            aggressiveness,
            model,
            output_dir,
        } => {
            run_batch(config_file, files, aggressiveness, model, output_dir).await?;
        }
        Commands::Tag { input } => {
            run_tag(config_file, &input)?;
        }
        Commands::Models => {
            show_models(config_file)?;
        }
        Commands::Config(cmd) => {
            run_config_command(config_file, cmd).await?;
        }
    }

    Ok(())
}

/// An explicit `--config` file must exist; otherwise the default location is
/// optional
fn load_config(config_file: Option<&Path>) -> Result<Config> {
    let config = match config_file {
        Some(path) => Config::load_required(path.to_path_buf())?,
        None => Config::load()?,
    };
    Ok(config)
}

fn config_location(config_file: Option<&Path>) -> PathBuf {
    config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Out-of-range values are clamped, NaN falls back to the default
fn clamp_aggressiveness(value: f32) -> f32 {
    if value.is_nan() {
        warn!("Aggressiveness is not a number, using {}", DEFAULT_AGGRESSIVENESS);
        return DEFAULT_AGGRESSIVENESS;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!("Aggressiveness {} clamped to {}", value, clamped);
    }
    clamped
}

/// Custom prices win over the named model, which wins over the config default
fn resolve_pricing(
    config: &Config,
    model: Option<&str>,
    custom: Option<ModelPricing>,
) -> Result<(String, ModelPricing)> {
    if let Some(pricing) = custom {
        return Ok(("Custom".to_string(), pricing));
    }

    let name = model.unwrap_or(&config.pricing.default_model);
    match config.pricing.get(name) {
        Some(pricing) => Ok((name.to_string(), pricing)),
        None => bail!(
            "Unknown model: {} (run 'prompt-optimizer models' to list known models)",
            name
        ),
    }
}

async fn read_prompt(input: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = input {
        return Ok(text);
    }
    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

#[allow(clippy::too_many_arguments)]
async fn run_optimize(
    config_file: Option<&Path>,
    input: Option<String>,
    file: Option<PathBuf>,
    aggressiveness: Option<f32>,
    model: Option<String>,
    custom: Option<ModelPricing>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_file)?;
    let (model_name, pricing) = resolve_pricing(&config, model.as_deref(), custom)?;
    let settings = config.optimization();
    let aggressiveness = clamp_aggressiveness(aggressiveness.unwrap_or(settings.aggressiveness));

    let prompt = read_prompt(input, file).await?;
    info!("Optimizing prompt at aggressiveness {:.2}", aggressiveness);

    let optimizer = PromptOptimizer::new(&settings)?;
    let (result, stats) = optimizer.optimize_with_report(&prompt, aggressiveness);
    let report = SavingsReport::new(result.original_tokens, result.optimized_tokens, pricing);

    if json {
        let out = OptimizeOutput {
            result: &result,
            aggressiveness,
            model: &model_name,
            rules_applied: &stats.rules_applied,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(path) = output {
        tokio::fs::write(&path, &result.optimized).await?;
        println!("Optimized prompt written to: {}", path.display());
    } else {
        println!("{}", result.optimized);
    }

    println!("\n--- Optimization Stats ---");
    println!("Original tokens: {}", result.original_tokens);
    println!("Optimized tokens: {}", result.optimized_tokens);
    if result.counting == CountingMethod::WhitespaceFallback {
        println!("(counted as whitespace-separated words)");
    }
    println!("Rules applied: {:?}", stats.rules_applied);
    println!(
        "Words kept/substituted/dropped: {}/{}/{}",
        stats.words_kept, stats.words_substituted, stats.words_dropped
    );
    println!("Model: {}", model_name);
    println!();
    print!("{}", report);
    println!();
    println!("{}", report.share_line(aggressiveness));

    Ok(())
}

async fn run_batch(
    config_file: Option<&Path>,
    files: Vec<PathBuf>,
    aggressiveness: Option<f32>,
    model: Option<String>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_file)?;
    let (model_name, pricing) = resolve_pricing(&config, model.as_deref(), None)?;
    let settings = config.optimization();
    let aggressiveness = clamp_aggressiveness(aggressiveness.unwrap_or(settings.aggressiveness));

    if let Some(dir) = &output_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    info!(
        "Optimizing {} files at aggressiveness {:.2} ({})",
        files.len(),
        aggressiveness,
        model_name
    );

    let optimizer = Arc::new(PromptOptimizer::new(&settings)?);
    let tracker = MetricsTracker::new();

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let prompt = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let optimizer = Arc::clone(&optimizer);
        let handle =
            tokio::task::spawn_blocking(move || optimizer.optimize(&prompt, aggressiveness));
        handles.push((path, handle));
    }

    for (path, handle) in handles {
        let result = handle.await?;
        let report = SavingsReport::new(result.original_tokens, result.optimized_tokens, pricing);
        tracker.record(
            result.original_tokens,
            result.optimized_tokens,
            result.counting == CountingMethod::WhitespaceFallback,
            Some(report.total_cost_saved),
        );

        if let Some(dir) = &output_dir {
            let name = path
                .file_name()
                .context("Batch input has no file name")?;
            tokio::fs::write(dir.join(name), &result.optimized).await?;
        }

        bar.set_message(path.display().to_string());
        bar.println(format!(
            "{}: {} -> {} tokens ({:.1}% saved)",
            path.display(),
            result.original_tokens,
            result.optimized_tokens,
            report.percent_saved
        ));
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!("{}", tracker.summary());
    if let Some(dir) = output_dir {
        println!("Optimized files written to: {}", dir.display());
    }

    Ok(())
}

fn run_tag(config_file: Option<&Path>, input: &str) -> Result<()> {
    let config = load_config(config_file)?;
    let optimizer = PromptOptimizer::new(&config.optimization())?;
    for line in tag_lines(optimizer.reducer().tagger(), input) {
        println!("{}", line);
    }
    Ok(())
}

/// One "offset TAG text" line per token
fn tag_lines(tagger: &dyn PosTagger, input: &str) -> Vec<String> {
    tagger
        .tag(input)
        .into_iter()
        .map(|token| format!("{:>5} {:<6} {}", token.offset, token.tag.as_str(), token.text))
        .collect()
}

fn show_models(config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file)?;

    println!("{:<12} {:>12} {:>12}", "Model", "Input/1K", "Output/1K");
    for (name, pricing) in &config.pricing.models {
        let marker = if name.eq_ignore_ascii_case(&config.pricing.default_model) {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<12} {:>12} {:>12}{}",
            name,
            format!("${:.4}", pricing.input_per_1k),
            format!("${:.4}", pricing.output_per_1k),
            marker
        );
    }

    Ok(())
}

async fn run_config_command(config_file: Option<&Path>, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            config_init(config_file, force).await?;
        }
        ConfigCommands::Show => {
            config_show(config_file)?;
        }
        ConfigCommands::Path => {
            config_path(config_file);
        }
        ConfigCommands::Validate => {
            config_validate(config_file)?;
        }
    }
    Ok(())
}

async fn config_init(config_file: Option<&Path>, force: bool) -> Result<()> {
    let path = config_location(config_file);

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    config.save_to(path.clone())?;

    println!("Configuration file created at: {}", path.display());
    println!();
    println!("Settings can also come from environment variables:");
    println!("  export PROMPT_OPTIMIZER_AGGRESSIVENESS=0.8");
    println!("  export PROMPT_OPTIMIZER_ENCODING=cl100k_base");
    println!("  export PROMPT_OPTIMIZER_LEXICON=/path/to/nouns.txt");
    println!("  export PROMPT_OPTIMIZER_MODEL=Claude");

    Ok(())
}

fn config_show(config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file)?;
    println!("{}", toml::to_string_pretty(&config)?);

    println!("--- Environment Variables ---");
    for var in [
        "PROMPT_OPTIMIZER_AGGRESSIVENESS",
        "PROMPT_OPTIMIZER_ENCODING",
        "PROMPT_OPTIMIZER_LEXICON",
        "PROMPT_OPTIMIZER_MODEL",
    ] {
        println!(
            "{}: {}",
            var,
            std::env::var(var).unwrap_or_else(|_| "not set".to_string())
        );
    }

    Ok(())
}

fn config_path(config_file: Option<&Path>) {
    let path = config_location(config_file);
    println!("{}", path.display());

    if path.exists() {
        println!("(file exists)");
    } else {
        println!("(file does not exist - run 'config init' to create)");
    }
}

fn config_validate(config_file: Option<&Path>) -> Result<()> {
    let config = load_config(config_file)?;

    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid!");
            println!();
            println!("Aggressiveness: {}", config.optimizer.aggressiveness);
            println!("Encoding: {}", config.optimizer.encoding);
            match &config.optimizer.lexicon_path {
                Some(path) => println!("Extra lexicon: {}", path.display()),
                None => println!("Extra lexicon: none"),
            }
            println!(
                "Default model: {} ({} models priced)",
                config.pricing.default_model,
                config.pricing.models.len()
            );
        }
        Err(e) => {
            println!("Configuration validation failed:");
            println!("  {}", e);
            println!();
            println!(
                "Edit {} or run 'config init --force'",
                config_location(config_file).display()
            );
        }
    }

    Ok(())
}
