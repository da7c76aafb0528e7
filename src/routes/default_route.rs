use actix_web::{get, web, HttpResponse};
use askama::Template;

use crate::services::ProfileBuilder;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    bulk_limit: usize,
    search_configured: bool,
    summarizer_configured: bool,
}

#[get("/")]
pub async fn default(builder: web::Data<ProfileBuilder>) -> HttpResponse {
    let template = IndexTemplate {
        bulk_limit: builder.bulk_limit(),
        search_configured: builder.search_configured(),
        summarizer_configured: builder.summarizer_configured(),
    };

    match template.render() {
        Ok(body) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body),
        Err(e) => {
            log::error!("Failed to render index page: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};

    use super::*;
    use crate::test_support::offline_builder;

    #[actix_web::test]
    async fn index_renders_lookup_form() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(offline_builder(25)))
                .service(default),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
        assert!(body.contains("action=\"/lookup\""));
        assert!(body.contains("up to 25 rows"));
    }
}
