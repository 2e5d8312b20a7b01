use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mind_companion::agent::{Agent, CompanionAgent};
use mind_companion::channels::{ChannelManager, CliChannel};
use mind_companion::config::AppConfig;
use mind_companion::llm::create_provider;
use mind_companion::prediction::{HttpPredictionClient, PredictionClient};
use mind_companion::server;
use mind_companion::survey::{SessionStore, SurveyDeps, spawn_pruner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🧠 MIND Companion v{}", env!("CARGO_PKG_VERSION"));

    // ── Services ─────────────────────────────────────────────────────────
    let prediction: Option<Arc<dyn PredictionClient>> = match &config.prediction {
        Some(prediction_config) => {
            eprintln!("   Prediction: {}", prediction_config.endpoint);
            Some(Arc::new(HttpPredictionClient::new(prediction_config.clone())?))
        }
        None => {
            eprintln!("   Prediction: not configured (set MIND_PREDICTION_URL)");
            None
        }
    };

    let llm = match &config.llm {
        Some(llm_config) => {
            eprintln!("   Companion model: {}", llm_config.model);
            Some(create_provider(llm_config)?)
        }
        None => {
            eprintln!("   Companion: disabled (set OPENAI_API_KEY)");
            None
        }
    };

    let deps = SurveyDeps {
        prediction,
        companion: Arc::new(CompanionAgent::new(llm)),
    };

    // ── HTTP API ─────────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new(deps.clone()));
    let _pruner = spawn_pruner(Arc::clone(&sessions), config.server.session_idle_timeout);

    if !config.dashboards.any_configured() {
        eprintln!("   Dashboards: not configured (set MIND_DASHBOARD_URL_1..3)");
    }

    let router = server::build_router(sessions, config.dashboards.clone());
    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind HTTP port {port}"))?;
    let _server = server::spawn(listener, router);

    eprintln!("   HTTP API: http://0.0.0.0:{}/api/sessions", port);
    eprintln!("   Dashboards: http://0.0.0.0:{}/dashboards", port);

    // ── Terminal REPL ────────────────────────────────────────────────────
    if config.cli_enabled {
        eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

        let mut channels = ChannelManager::new();
        let cli = CliChannel::new();
        let user_id = cli.user_id().to_string();
        channels.add(Arc::new(cli));

        Agent::new(channels, deps)
            .with_greeting("cli", user_id)
            .run()
            .await?;
    } else {
        eprintln!("   REPL disabled; press Ctrl+C to stop.\n");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl+C received, shutting down...");
    }

    Ok(())
}

/// Log to stderr, or to a daily rolling file when `log_dir` is set.
fn init_tracing(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mind-companion.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
