// src/api/outreach.rs
use crate::api::stats::ApiResponse;
use crate::models::{fmt_ts, EmailStatus, OutreachRecord};
use crate::outreach::{RecordFilter, RecordPage};
use crate::server::ServerState;
use rocket::http::ContentType;
use rocket::{get, post, serde::json::Json, State};

#[get("/outreach/records?<status>&<search>&<limit>&<offset>")]
pub async fn get_outreach_records(
    state: &State<ServerState>,
    status: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Json<ApiResponse<RecordPage>> {
    let status = match status.as_deref() {
        None => None,
        Some(raw) => match EmailStatus::parse(raw) {
            Some(parsed) => Some(parsed),
            None => return Json(ApiResponse::error(format!("unknown status: {}", raw))),
        },
    };

    let filter = RecordFilter {
        status,
        search,
        limit: limit.unwrap_or(50).min(1000),
        offset: offset.unwrap_or(0),
    };

    match state.log.query(&filter).await {
        Ok(page) => Json(ApiResponse::success(page)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

/// Full audit export for reporting, CSV by default or JSON on request.
/// `limit: 0` means the whole filtered set.
#[get("/outreach/export?<format>&<status>&<search>")]
pub async fn export_outreach_records(
    state: &State<ServerState>,
    format: Option<String>,
    status: Option<String>,
    search: Option<String>,
) -> (ContentType, String) {
    let status = match status.as_deref() {
        None => None,
        Some(raw) => match EmailStatus::parse(raw) {
            Some(parsed) => Some(parsed),
            None => {
                return (
                    ContentType::JSON,
                    format!("{{\"success\":false,\"error\":\"unknown status: {}\"}}", raw),
                )
            }
        },
    };

    let filter = RecordFilter {
        status,
        search,
        limit: 0,
        offset: 0,
    };

    let page = match state.log.query(&filter).await {
        Ok(page) => page,
        Err(e) => {
            return (
                ContentType::JSON,
                format!("{{\"success\":false,\"error\":\"{}\"}}", e),
            )
        }
    };

    match format.as_deref().unwrap_or("csv") {
        "json" => match serde_json::to_string_pretty(&page.records) {
            Ok(body) => (ContentType::JSON, body),
            Err(e) => (
                ContentType::JSON,
                format!("{{\"success\":false,\"error\":\"{}\"}}", e),
            ),
        },
        _ => (ContentType::CSV, records_to_csv(&page.records)),
    }
}

#[post("/outreach/records/<id>/responded")]
pub async fn mark_record_responded(
    state: &State<ServerState>,
    id: String,
) -> Json<ApiResponse<serde_json::Value>> {
    match state.log.mark_responded(&id).await {
        Ok(true) => Json(ApiResponse::success(serde_json::json!({ "id": id }))),
        Ok(false) => Json(ApiResponse::error(format!("record not found: {}", id))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[post("/outreach/records/<id>/converted")]
pub async fn mark_record_converted(
    state: &State<ServerState>,
    id: String,
) -> Json<ApiResponse<serde_json::Value>> {
    match state.log.mark_converted(&id).await {
        Ok(true) => Json(ApiResponse::success(serde_json::json!({ "id": id }))),
        Ok(false) => Json(ApiResponse::error(format!("record not found: {}", id))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

fn records_to_csv(records: &[OutreachRecord]) -> String {
    let mut out = String::new();
    out.push_str(
        "id,business_name,business_email,location,outreach_type,search_query,\
         date_contacted,email_status,tracking_id,provider_message_id,delivered_at,\
         opened_at,clicked_at,responded_at,converted_at,bounce_reason,cooldown_until,\
         click_count,visited_site\n",
    );

    for record in records {
        let opt_ts = |ts: &Option<chrono::DateTime<chrono::Utc>>| {
            ts.map(fmt_ts).unwrap_or_default()
        };
        let row = [
            record.id.clone(),
            csv_field(&record.business_name),
            record.business_email.clone(),
            csv_field(&record.location),
            record.outreach_type.as_str().to_string(),
            csv_field(&record.search_query),
            fmt_ts(record.date_contacted),
            record.email_status.as_str().to_string(),
            record.tracking_id.clone(),
            record.provider_message_id.clone().unwrap_or_default(),
            opt_ts(&record.delivered_at),
            opt_ts(&record.opened_at),
            opt_ts(&record.clicked_at),
            opt_ts(&record.responded_at),
            opt_ts(&record.converted_at),
            csv_field(record.bounce_reason.as_deref().unwrap_or("")),
            fmt_ts(record.cooldown_until),
            record.click_count.to_string(),
            record.visited_site.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

// Business names can contain commas and quotes; quote only when needed.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
