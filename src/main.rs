use outreach_engine::config::{load_config, Config, ConfigStore};
use outreach_engine::database::create_db_pool;
use outreach_engine::discovery::providers::{
    DirectoryProvider, FoursquareProvider, GooglePlacesProvider,
};
use outreach_engine::discovery::BusinessDiscovery;
use outreach_engine::eligibility::CooldownFilter;
use outreach_engine::email_sender::{
    composer::EmailComposer, DeliverySender, DisabledSender, MailgunConfig, MailgunSender,
};
use outreach_engine::models::Result;
use outreach_engine::outreach::OutreachLog;
use outreach_engine::scheduler::CampaignScheduler;
use outreach_engine::server::{build_rocket, ServerState};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    std::env::set_var("RUST_LOG", "outreach_engine=info,hyper=warn,rocket=warn");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("outreach_engine=info".parse().unwrap()),
        )
        .with_max_level(tracing::Level::INFO)
        .init();

    // Initialize database
    info!("Initializing database...");
    let db_pool = create_db_pool(&config.database.path).await?;

    // Directory providers come from the environment; the engine still
    // serves its API without them, but campaign runs will fail fast.
    let mut providers: Vec<Box<dyn DirectoryProvider>> = Vec::new();
    if let Some(provider) = GooglePlacesProvider::from_env() {
        info!("Primary directory provider: {}", provider.name());
        providers.push(Box::new(provider));
    }
    if let Some(provider) = FoursquareProvider::from_env() {
        info!("Fallback directory provider: {}", provider.name());
        providers.push(Box::new(provider));
    }
    if providers.is_empty() {
        warn!(
            "No directory provider configured; campaign runs will fail until \
             GOOGLE_PLACES_API_KEY or FOURSQUARE_API_KEY is set"
        );
    }

    let sender: Box<dyn DeliverySender> = match MailgunConfig::from_env() {
        Ok(mailgun_config) => {
            let sender = MailgunSender::new(mailgun_config);
            if let Err(e) = sender.test_connection().await {
                warn!("Mailgun connection check failed: {}", e);
            }
            Box::new(sender)
        }
        Err(e) => {
            warn!("{}; outreach emails will be recorded as failed", e);
            Box::new(DisabledSender)
        }
    };

    let config_store = Arc::new(ConfigStore::new(config.campaign)?);
    let discovery = BusinessDiscovery::new(providers, config.discovery.results_per_pair);
    let composer = EmailComposer::new(config.discovery.site_base_url.clone());
    let log = OutreachLog::new(db_pool.clone());
    let eligibility = CooldownFilter::new(db_pool.clone());

    let scheduler = Arc::new(CampaignScheduler::new(
        config_store.clone(),
        discovery,
        composer,
        sender,
        log.clone(),
        eligibility,
        config.categories.clone(),
        config.locations.clone(),
    ));

    if config.schedule.enabled {
        let daily = scheduler.clone();
        let run_hour = config.schedule.run_hour;
        tokio::spawn(async move { daily.run_daily(run_hour).await });
    }

    let state = ServerState {
        config_store,
        db_pool,
        log,
        scheduler: scheduler.clone(),
    };

    // Add graceful shutdown
    tokio::select! {
        result = build_rocket(state).launch() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            scheduler.request_stop();
        }
    }

    Ok(())
}
