use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use huddle_agents::{GeminiClient, GeminiPipelineFactory, LocalRoomFactory, PipelineFactory, ScriptedPipelineFactory};
use huddle_api::{serve, ApiConfig, AppState, Cli};
use huddle_core::{load_env_files, Settings};
use huddle_orchestrator::{ScenarioKind, SessionOrchestrator};
use huddle_runtime::RuntimeConfig;

#[tokio::main]
async fn main() {
    let env_file = load_env_files();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Some(path) = env_file {
        info!(path = %path.display(), "environment file loaded");
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::from_env()?;
    cli.apply(&mut settings);

    let kind: ScenarioKind = settings.scenario.parse()?;
    let scenario = kind.build(settings.knowledge_file.as_deref())?;

    let pipelines: Arc<dyn PipelineFactory> = if cli.offline {
        warn!("offline mode: scripted pipelines, no model calls");
        Arc::new(ScriptedPipelineFactory::new())
    } else {
        let mut client = GeminiClient::new(settings.google_api_key.clone().unwrap_or_default());
        if let Some(url) = &settings.gemini_api_url {
            client = client.with_base_url(url.clone());
        }
        Arc::new(GeminiPipelineFactory::new(client))
    };

    let mut orchestrator = SessionOrchestrator::new(
        scenario,
        pipelines,
        Arc::new(LocalRoomFactory::new()),
        RuntimeConfig::from_settings(&settings),
    );
    if !cli.offline {
        let missing = settings.missing_credentials();
        if !missing.is_empty() {
            warn!(missing = ?missing, "credentials missing; join requests will be rejected");
        }
        orchestrator = orchestrator.with_settings(&settings);
    }

    info!(scenario = %kind, offline = cli.offline, "starting huddle server");
    let config = ApiConfig::from_settings(&settings);
    serve(config.clone(), AppState::new(config, orchestrator)).await?;
    Ok(())
}
