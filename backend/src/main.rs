mod config;
mod services;
mod sheets;
mod state;
mod storage;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use crate::config::Environment;
use crate::services::generator::render::TemplateRenderer;
use crate::sheets::SheetsClient;
use crate::state::AppState;
use crate::storage::BlobStorage;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // All configuration is loaded once; a missing variable fails startup.
    let env = match Environment::from_env() {
        Ok(env) => Arc::new(env),
        Err(err) => {
            error!("configuration error: {}", err);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err.to_string()));
        }
    };

    let sheets = match SheetsClient::new(&env) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!("configuration error: {}", err);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err.to_string()));
        }
    };

    let storage = Arc::new(BlobStorage::connect(&env.storage, &env.container_name).await);
    let renderer = Arc::new(TemplateRenderer::new(&env));

    let app_state = AppState {
        env: env.clone(),
        sheets,
        storage,
        renderer,
    };

    // Optional built-in scheduler: run the same pipeline on a fixed cadence
    // in addition to the HTTP trigger.
    if let Some(minutes) = env.generation_interval_minutes {
        let interval_state = app_state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
            // The first tick fires immediately; skip it so startup stays quiet.
            interval.tick().await;
            loop {
                interval.tick().await;
                info!("scheduled generation run starting");
                if let Err(err) = interval_state.generator().run().await {
                    error!("scheduled generation run failed: {}", err);
                }
            }
        });
    }

    let bind = (env.host.clone(), env.port);
    info!("Server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(services::certificates::configure_routes())
            .service(services::generator::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
