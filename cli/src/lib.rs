use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use slidegen_common::Config;
use slidegen_core::{safety, sanitize, PipelineError, SlidePipeline};
use slidegen_protocol::envelope::GenerateRequest;

#[derive(Parser)]
#[command(name = "slidegen")]
#[command(about = "AI-assisted slide specification generation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Override model (e.g., gpt-4o, gpt-4o-mini)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a slide specification from a prompt
    Generate {
        /// Slide request prompt
        prompt: String,
        /// Write the specification to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run only the sanitizer and safety gate and report the verdict
    Check {
        /// Slide request prompt
        prompt: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        std::env::set_var("RUST_LOG", "debug");
    }
    if let Some(model) = &cli.model {
        std::env::set_var("SLIDEGEN_MODEL", model);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    match cli.command {
        Commands::Generate { prompt, out } => {
            let pipeline = SlidePipeline::new(config);
            let response = pipeline.generate(GenerateRequest::new(prompt)).await?;
            let rendered = serde_json::to_string_pretty(&response.spec)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, rendered).await?;
                    println!(
                        "Specification written to {} ({} ms, model {})",
                        path.display(),
                        response.processing_time_ms,
                        response.model
                    );
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Check { prompt } => {
            let sanitized = sanitize::sanitize(&prompt, config.max_prompt_len)?;
            match safety::check(&sanitized) {
                Ok(verdict) => {
                    println!("safe (score {})", verdict.score);
                }
                Err(PipelineError::Moderation { categories, score }) => {
                    println!("blocked (score {score}): {}", categories.join(", "));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
