// src/server/routes.rs

pub mod health {
    use rocket::{get, serde::json::Json};
    use serde_json::{json, Value};

    #[get("/health")]
    pub async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "outreach-engine-api"
        }))
    }

    #[get("/")]
    pub async fn index() -> Json<Value> {
        Json(json!({
            "name": "Outreach Engine API",
            "version": "0.1.0",
            "description": "Business outreach campaign engine: discovery, delivery and engagement tracking",
            "endpoints": {
                "health": "/api/health",
                "run_campaign": "/api/campaign/run",
                "config": "/api/campaign/config",
                "records": "/api/outreach/records",
                "export": "/api/outreach/export",
                "stats": "/api/outreach/stats",
                "events_webhook": "/api/outreach/events"
            }
        }))
    }
}
