pub mod bulk_route;
pub mod default_route;
pub mod export_route;
pub mod health_route;
pub mod lookup_route;

use std::fmt::Display;

use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;

use crate::configuration::ApplicationSettings;

pub(crate) fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message }))
}

/// The error detail is only exposed when `application.debug` is set.
pub(crate) fn error_with_detail(
    status: StatusCode,
    settings: &ApplicationSettings,
    generic: &str,
    detail: &dyn Display,
) -> HttpResponse {
    match settings.debug {
        true => json_error(status, &format!("{}: {}", generic, detail)),
        false => json_error(status, generic),
    }
}
