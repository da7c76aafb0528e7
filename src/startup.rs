use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::ApplicationSettings,
    routes::{bulk_route, default_route, export_route, health_route, lookup_route},
    services::ProfileBuilder,
};

pub fn run(
    listener: TcpListener,
    builder: ProfileBuilder,
    application: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let builder = web::Data::new(builder);
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(lookup_route::lookup)
            .service(bulk_route::bulk)
            .service(export_route::export_profile)
            .service(health_route::healthz)
            .app_data(builder.clone())
            .app_data(application.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
