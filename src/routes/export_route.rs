use actix_web::{
    get,
    http::{header::ContentDisposition, StatusCode},
    web, HttpResponse,
};
use serde::Deserialize;

use crate::{
    configuration::ApplicationSettings,
    domain::organization::Organization,
    services::{export, ExportFormat, ProfileBuilder},
};

use super::{error_with_detail, json_error};

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    domain: String,
}

fn default_format() -> String {
    "csv".to_string()
}

#[get("/export")]
pub async fn export_profile(
    builder: web::Data<ProfileBuilder>,
    settings: web::Data<ApplicationSettings>,
    query: web::Query<ExportQuery>,
) -> HttpResponse {
    let Some(format) = ExportFormat::parse(&query.format) else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Unsupported export format. Use csv or pdf.",
        );
    };

    let organization = Organization::new(&query.company, &query.domain);
    if organization.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Provide at least a company or a domain.",
        );
    }

    let report = builder.build_report(organization).await;
    let filename = format!("profile_{}.{}", report.file_stem(), format.extension());

    match export(std::slice::from_ref(&report), format) {
        Ok(file) => {
            log::info!("Exported {} with {} records", filename, file.records);
            HttpResponse::Ok()
                .content_type(format.content_type())
                .insert_header(ContentDisposition::attachment(filename))
                .body(file.bytes)
        }
        Err(e) => {
            log::error!("Failed to export {}: {}", filename, e);
            error_with_detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                &settings,
                "Internal error during export.",
                &e,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        test, App,
    };

    use super::*;
    use crate::test_support::offline_builder;

    async fn get(uri: &str) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(offline_builder(10)))
                .app_data(web::Data::new(ApplicationSettings::default()))
                .service(export_profile),
        )
        .await;

        test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await
    }

    #[actix_web::test]
    async fn csv_export_is_an_attachment() {
        let res = get("/export?company=Acme%20Corp&domain=acme.com").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
        let disposition = res.headers().get(CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("profile_acme.com.csv"));

        let body = test::read_body(res).await;
        assert!(body.starts_with("\u{feff}".as_bytes()));
    }

    #[actix_web::test]
    async fn pdf_export_uses_pdf_content_type() {
        let res = get("/export?format=PDF&company=Acme%20Corp").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "application/pdf");

        let body = test::read_body(res).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn bad_format_and_empty_input_are_rejected() {
        let res = get("/export?format=xlsx&company=Acme").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = get("/export?format=csv").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
