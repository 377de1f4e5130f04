//! main file for the server

mod controller;
mod database;
pub mod model;
mod service;
mod state;
mod util;

use crate::server::controller::configure;
use crate::server::database::pool::Pool;
use crate::server::database::postgres::PgDocumentStore;
use crate::server::database::store::{Backend, Store};
use crate::server::model::config::{ServerConfig, StoreBackend, StoreConfig};
use crate::server::state::AppState;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::io;

async fn open_store(config: &StoreConfig) -> io::Result<Store> {
    match config.backend {
        StoreBackend::Memory => Ok(Store::memory(config.timeout)),
        StoreBackend::Postgres => {
            let pool = Pool::connect("document", &config.conn_str, config.pool_size)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, format!("{:#}", e)))?;
            let backend = Backend::Postgres(PgDocumentStore::new(pool, config.timeout));
            Ok(Store::new(backend, config.timeout))
        }
    }
}

/// Run the server
pub async fn run(ServerConfig { addr, store, pricing }: ServerConfig) -> io::Result<()> {
    let store = open_store(&store).await?;
    info!("serving on {} with pricing={}", addr, pricing);
    let state = web::Data::new(AppState::new(store, pricing));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}
