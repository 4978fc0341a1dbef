use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use trip_discovery::config::DiscoveryConfig;
use trip_discovery::db::gateway::MongoCatalogGateway;
use trip_discovery::db::mongo::create_mongo_client;
use trip_discovery::db::saved_store::MongoSavedItemStore;
use trip_discovery::db::trip_writer::MongoTripWriter;
use trip_discovery::routes;
use trip_discovery::services::completion_client::GeminiCompletionClient;
use trip_discovery::services::trip_plan_generator::TripPlanRequester;
use trip_discovery::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = DiscoveryConfig::from_env();

    let mongo_uri = std::env::var("MONGODB_URI")
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "MONGODB_URI must be set"))?;
    let client = create_mongo_client(&mongo_uri, &config.catalog_database)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let requester = match GeminiCompletionClient::from_config(&config) {
        Ok(completion) => TripPlanRequester::new(Arc::new(completion)),
        Err(e) => {
            warn!("Trip plan generation disabled: {}", e);
            TripPlanRequester::offline()
        }
    };

    let database = config.catalog_database.clone();
    let saved_store =
        MongoSavedItemStore::new(client.clone(), &database, &config.saved_collection);
    if let Err(e) = saved_store.ensure_indexes().await {
        warn!("Could not ensure saved item index: {}", e);
    }

    let state = web::Data::new(AppState::new(
        config.clone(),
        Arc::new(MongoCatalogGateway::new(client.clone(), &database)),
        Arc::new(saved_store),
        Arc::new(MongoTripWriter::new(
            client,
            &database,
            &config.trips_collection,
        )),
        requester,
    ));

    state.hub.load().await;
    if state.hub.is_degraded().await {
        warn!("Catalog unavailable at startup, serving demo trips");
    }

    info!("Starting HTTP server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
