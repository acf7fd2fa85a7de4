// src/server/mod.rs
use crate::api::*;
use crate::config::ConfigStore;
use crate::database::DbPool;
use crate::outreach::OutreachLog;
use crate::scheduler::CampaignScheduler;
use rocket::{routes, Build, Rocket};
use std::sync::Arc;

pub mod routes;

pub struct ServerState {
    pub config_store: Arc<ConfigStore>,
    pub db_pool: DbPool,
    pub log: OutreachLog,
    pub scheduler: Arc<CampaignScheduler>,
}

pub fn build_rocket(state: ServerState) -> Rocket<Build> {
    rocket::build().manage(state).mount(
        "/api",
        routes![
            // Health and info endpoints
            routes::health::health_check,
            routes::health::index,
            // Campaign control
            run_campaign,
            get_campaign_config,
            update_campaign_config,
            apply_campaign_preset,
            // Outreach audit view
            get_outreach_stats,
            get_outreach_records,
            export_outreach_records,
            mark_record_responded,
            mark_record_converted,
            // Delivery provider webhook
            receive_delivery_event,
        ],
    )
}
