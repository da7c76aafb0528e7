use actix_web::{http::StatusCode, post, web, Either, HttpResponse};
use serde::Deserialize;

use crate::{domain::organization::Organization, services::ProfileBuilder};

use super::json_error;

#[derive(Deserialize)]
pub struct LookupBody {
    #[serde(default)]
    company: String,
    #[serde(default)]
    domain: String,
}

/// Accepts either a JSON body or a url-encoded form.
#[post("/lookup")]
pub async fn lookup(
    builder: web::Data<ProfileBuilder>,
    body: Either<web::Json<LookupBody>, web::Form<LookupBody>>,
) -> HttpResponse {
    let body = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    let organization = Organization::new(&body.company, &body.domain);
    if organization.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Provide at least a company or a domain.",
        );
    }

    let report = builder.build_report(organization).await;
    HttpResponse::Ok().json(report)
}
