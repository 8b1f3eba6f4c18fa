//! instagram-style backend service

pub mod account_manager;
pub mod post;
pub mod utils;

use std::fmt::Display;
use std::io;

use actix_cors::Cors;
use actix_web::{http, middleware, web, App, HttpServer};
use models::general::{init_schema, DbSource};
use tracing::{error, info};

use crate::utils::respond::configure_extractors;
use crate::utils::AppContext;

fn startup_err<E: Display>(err: E) -> io::Error {
    error!("service startup failed: {}", err);
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    common::log::init_logger();
    let conf = &*common::env::CONF;
    let ctx = AppContext::from_conf(conf).map_err(startup_err)?;
    if let DbSource::Postgres(_) = ctx.db {
        let mut cli = ctx.db.get_cli().await.map_err(startup_err)?;
        init_schema(&mut cli).await.map_err(startup_err)?;
    }
    let service: String = format!("0.0.0.0:{}", conf.api_port);
    info!("{} mode, listening on {}", conf.service_mode, service);

    let ctx = web::Data::new(ctx);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
                    .allowed_header(http::header::CONTENT_TYPE)
                    .max_age(3600),
            )
            .app_data(ctx.clone())
            .configure(configure_extractors)
            .configure(account_manager::configure_routes)
            .configure(post::configure_routes)
    })
    .bind(service)?
    .run()
    .await
}
