use actix_web::{get, web, HttpResponse};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::services::ProfileBuilder;

#[get("/healthz")]
pub async fn healthz(builder: web::Data<ProfileBuilder>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "summarizer_configured": builder.summarizer_configured(),
        "search_configured": builder.search_configured(),
    }))
}
