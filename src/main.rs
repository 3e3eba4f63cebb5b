//! Wiring & DI. Entry point: bootstrap adapters, inject into the planner, run UI.
//! No business logic here; adapters are selected once from configuration and
//! passed by reference, never looked up through globals.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use cal_sync::adapters::ai::{MockSuggestionAdapter, OfflineSuggestionAdapter, OpenAiAdapter};
use cal_sync::adapters::calendar::{GoogleCalendarAdapter, GoogleOAuthManager};
use cal_sync::adapters::persistence::SqliteStore;
use cal_sync::adapters::ui::tui::TuiInputPort;
use cal_sync::ports::{CalendarPort, EventStorePort, InputPort, SuggestionPort};
use cal_sync::shared::config::AppConfig;
use cal_sync::usecases::PlannerService;
use chrono_tz::Tz;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    cal_sync::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_default();

    let tz_name = cfg.timezone_or_default();
    let default_tz = Tz::from_str(&tz_name)
        .map_err(|_| anyhow::anyhow!("CAL_SYNC_TIMEZONE is not a valid IANA zone: {}", tz_name))?;
    info!(zone = %default_tz, "default timezone");

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let store = Arc::new(
        SqliteStore::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("store connect failed: {}", e))?,
    );
    let store_port: Arc<dyn EventStorePort> = store;

    // --- Suggestion provider (OpenAI-compatible, mock, or offline) ---
    let provider = cfg.llm_provider_or_default();
    let suggester: Arc<dyn SuggestionPort> = if provider == "mock" {
        warn!("mock suggestion provider selected; drafts are canned");
        Arc::new(MockSuggestionAdapter::new())
    } else if cfg.is_ai_configured() {
        info!(
            provider = %provider,
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "LLM suggestions enabled"
        );
        let adapter = if provider == "openrouter" {
            OpenAiAdapter::for_openrouter(
                cfg.ai_api_url_or_default(),
                cfg.ai_api_key().unwrap_or_default(),
                cfg.ai_model_or_default(),
                cfg.ai_temperature_or_default(),
            )
        } else {
            OpenAiAdapter::new(
                cfg.ai_api_url_or_default(),
                cfg.ai_api_key().unwrap_or_default(),
                cfg.ai_model_or_default(),
                cfg.ai_temperature_or_default(),
            )
        };
        Arc::new(adapter)
    } else {
        warn!("CAL_SYNC_AI_API_KEY not set, suggestions run offline (empty candidates)");
        Arc::new(OfflineSuggestionAdapter::new())
    };

    // --- Calendar (Google REST; dry-run against the local store without credentials) ---
    if !cfg.is_google_configured() {
        info!(
            path = %data_path.display(),
            "Google credentials missing; calendar runs dry against the local store"
        );
    }
    let auth = GoogleOAuthManager::new(
        Arc::clone(&store_port),
        cfg.google_client_id(),
        cfg.google_client_secret(),
        cfg.google_token_json(),
    );
    let calendar: Arc<dyn CalendarPort> = Arc::new(GoogleCalendarAdapter::new(
        auth,
        Arc::clone(&store_port),
        cfg.google_calendar_id_or_default(),
    ));

    // --- Planner ---
    let planner = Arc::new(PlannerService::new(suggester, calendar, default_tz));

    // --- Run (main menu -> plan / inspect store) ---
    let input_port: Arc<dyn InputPort> =
        Arc::new(TuiInputPort::new(planner, Arc::clone(&store_port)));
    input_port.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
