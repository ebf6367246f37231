//! `ohp-orchestrator`: loads configuration, wires HTTP provider adapters and
//! stage workers, and drives the scheduler against a durable Store until
//! cancelled or a fatal error occurs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;

use config::{CliOverrides, Config};
use error::CliError;
use ohp_pipeline::{EvaluationWorker, Scheduler, SchedulerConfig, StageConfig, StageWorker, TranscriptionWorker, TranslationWorker};
use ohp_providers::adapters::http::{HttpEvaluationProvider, HttpTranscriptionProvider, HttpTranslationProvider};
use ohp_providers::{ProviderRouting, RetryPolicy};
use ohp_segments::NonVerbalLexicon;
use ohp_store::{SqliteStore, Stage, Store};

#[derive(Parser, Debug)]
#[command(name = "ohp-orchestrator")]
#[command(about = "Oral-history pipeline orchestrator: transcription, translation, and QA evaluation")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ohp-orchestrator.toml")]
    config: PathBuf,

    /// Artifact output root (overrides config file)
    #[arg(short, long)]
    output_root: Option<PathBuf>,

    /// Store database path (overrides config file)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ohp_orchestrator=info,ohp_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "orchestrator terminated");
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<(), CliError> {
    let args = Args::parse();
    info!(config = %args.config.display(), "loading configuration");

    let config = Config::load(
        &args.config,
        CliOverrides { output_root: args.output_root, database_path: args.database },
    )
    .await?;

    tokio::fs::create_dir_all(&config.output_root)
        .await
        .map_err(|e| CliError::Fatal(ohp_pipeline::FatalError::Io(format!("failed to create output root: {e}"))))?;

    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::connect(&config.database_path.display().to_string())
            .await
            .map_err(CliError::Store)?,
    );
    info!(db = %config.database_path.display(), "store ready");

    let retry_policy = RetryPolicy {
        base: std::time::Duration::from_millis(config.retry_base_ms),
        cap: std::time::Duration::from_millis(config.retry_cap_ms),
        max_attempts: config.max_attempts,
    };

    let workers = build_workers(&config, store.clone(), retry_policy)?;

    let mut scheduler_config = SchedulerConfig::defaults();
    scheduler_config.stages = config
        .concurrency
        .iter()
        .map(|(&stage, &concurrency)| (stage, StageConfig { concurrency, lease_ttl: config.lease_ttl[&stage] }))
        .collect();

    let scheduler = Scheduler::new(store, workers, scheduler_config);
    let cancel = scheduler.cancellation_token();

    let signal_task = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        warn!("received interrupt, starting graceful drain");
        cancel.cancel();
        let _ = tokio::signal::ctrl_c().await;
        warn!("received second interrupt, aborting immediately");
        std::process::exit(130);
    });

    info!("scheduler starting");
    let result = scheduler.run().await;
    signal_task.abort();

    result.map_err(CliError::Fatal)
}

fn build_workers(
    config: &Config,
    store: Arc<dyn Store>,
    retry_policy: RetryPolicy,
) -> Result<HashMap<Stage, Arc<dyn StageWorker>>, CliError> {
    let mut workers: HashMap<Stage, Arc<dyn StageWorker>> = HashMap::new();

    let (transcription_primary, _) = config.provider_route("transcription")?;
    let transcription_provider = Arc::new(HttpTranscriptionProvider::new("transcription-primary", transcription_primary));
    workers.insert(
        Stage::Transcription,
        Arc::new(TranscriptionWorker {
            store: store.clone(),
            provider: transcription_provider,
            output_root: config.output_root.clone(),
            lexicon: NonVerbalLexicon::default(),
        }),
    );

    for (stage, capability) in [
        (Stage::TranslationEn, "translation_en"),
        (Stage::TranslationDe, "translation_de"),
        (Stage::TranslationHe, "translation_he"),
    ] {
        let target_lang = stage.target_language().expect("translation stage always has a target language");
        let (primary_url, fallback_url) = config.provider_route(capability)?;
        let fallback_url = fallback_url.ok_or_else(|| {
            CliError::Config(config::ConfigError::MissingProviderRoute(format!("{capability}.fallback")))
        })?;

        let primary = Arc::new(HttpTranslationProvider::new(format!("{capability}-primary"), primary_url));
        let fallback = Arc::new(HttpTranslationProvider::new(format!("{capability}-fallback"), fallback_url));
        let routing = Arc::new(ProviderRouting::new(retry_policy).with_route(target_lang, primary, fallback));

        workers.insert(
            stage,
            Arc::new(TranslationWorker {
                store: store.clone(),
                output_root: config.output_root.clone(),
                stage,
                routing,
                batch_max_segments: config.batch_max_segments,
            }),
        );
    }

    for (stage, capability) in [
        (Stage::EvaluationEn, "evaluation_en"),
        (Stage::EvaluationDe, "evaluation_de"),
        (Stage::EvaluationHe, "evaluation_he"),
    ] {
        let target_lang = stage.target_language().expect("evaluation stage always has a target language");
        let (primary_url, _) = config.provider_route(capability)?;
        let provider = Arc::new(HttpEvaluationProvider::new(format!("{capability}-primary"), primary_url));

        workers.insert(
            stage,
            Arc::new(EvaluationWorker {
                store: store.clone(),
                output_root: config.output_root.clone(),
                stage,
                provider,
                qa_threshold: config.qa_threshold_for(target_lang),
            }),
        );
    }

    Ok(workers)
}
