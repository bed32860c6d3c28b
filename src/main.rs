#[cfg(test)]
#[macro_use]
mod test_support;

mod auth;
mod config;
mod db;
mod entity;
mod error;
mod helpers;
mod password;
mod repo;
mod response;
mod routes;
mod validate;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use db::connect_db;
use log::{error, info};
use response::json_error_handler;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("db connect failed: {}", e)))?;
    let server_port = config.server_port;

    let app_db = db.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(app_db.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(middleware::Logger::default())
            .configure(routes::config)
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await?;

    info!("server stopped, closing database pool");
    if let Err(e) = db.close().await {
        error!("database close failed: {}", e);
    }
    Ok(())
}
