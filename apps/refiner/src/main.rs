mod cli;
mod config;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod pipeline;
mod refinement;
mod routes;
mod state;

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppError;
use crate::ingest::InputProcessor;
use crate::llm_client::LlmClient;
use crate::models::InputType;
use crate::pipeline::batch::{run_batch, write_sample_config};
use crate::pipeline::output::OutputWriter;
use crate::pipeline::{RefinementPipeline, RunOutcome};
use crate::refinement::engine::{LlmRefiner, Refiner, RuleBasedRefiner};
use crate::refinement::relevance;
use crate::refinement::rules::RuleSet;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(path) = &cli.rules {
        config.rules_path = Some(path.clone());
    }

    // Logs go to stderr so command output on stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let rules = Arc::new(load_rules(&config)?);

    match cli.command_or_default() {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config, rules).await
        }
        Commands::Refine { inputs, name } => {
            let pipeline = build_pipeline(&config, rules)?;
            let outcome = pipeline.process_and_refine(&inputs, name.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            exit_status(outcome)
        }
        Commands::Batch { config: path } => {
            let pipeline = build_pipeline(&config, rules)?;
            let report = run_batch(&pipeline, &path).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.succeeded < report.total {
                anyhow::bail!(
                    "{} of {} projects did not succeed",
                    report.total - report.succeeded,
                    report.total
                );
            }
            Ok(())
        }
        Commands::Validate { text, input_type } => {
            let input_type: InputType = input_type.parse()?;
            let verdict = relevance::validate(&text, input_type, &rules);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            if !verdict.is_relevant {
                return Err(AppError::Rejected(verdict.reason).into());
            }
            Ok(())
        }
        Commands::SampleConfig { path } => {
            let written = write_sample_config(&path)?;
            info!(path = %written.display(), "Sample config written");
            println!("{}", written.display());
            Ok(())
        }
    }
}

async fn serve(config: Config, rules: Arc<RuleSet>) -> Result<()> {
    info!("Starting prompt refiner v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = Arc::new(build_pipeline(&config, rules.clone())?);
    let state = AppState {
        rules,
        pipeline,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_rules(config: &Config) -> Result<RuleSet> {
    match &config.rules_path {
        Some(path) => {
            let rules = RuleSet::load(path)?;
            info!(path = %path.display(), "Loaded rule table");
            Ok(rules)
        }
        None => Ok(RuleSet::default()),
    }
}

/// Rule-based by default; the remote backend only when enabled and keyed.
fn build_refiner(config: &Config, rules: Arc<RuleSet>) -> Result<Arc<dyn Refiner>> {
    match (&config.anthropic_api_key, config.use_llm_backend()) {
        (Some(key), true) => {
            let llm = LlmClient::new(key.clone()).map_err(AppError::from)?;
            info!("Refiner backend: llm (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmRefiner::new(llm, rules)))
        }
        _ => {
            if config.enable_llm_refinement {
                warn!("ENABLE_LLM_REFINEMENT is set but ANTHROPIC_API_KEY is missing; using rule-based refiner");
            }
            info!("Refiner backend: rule_based");
            Ok(Arc::new(RuleBasedRefiner::new(rules)))
        }
    }
}

fn build_pipeline(config: &Config, rules: Arc<RuleSet>) -> Result<RefinementPipeline> {
    Ok(RefinementPipeline::new(
        InputProcessor::from_config(config),
        build_refiner(config, rules.clone())?,
        rules,
        OutputWriter::new(config.output_dir.clone()),
    ))
}

fn exit_status(outcome: RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Success { .. } => Ok(()),
        RunOutcome::Rejected { reason, .. } => Err(AppError::Rejected(reason).into()),
        RunOutcome::Failed { stage, error } => Err(anyhow::anyhow!("{stage} failed: {error}")),
    }
}
