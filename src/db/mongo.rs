use log::{info, warn};
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client,
};
use std::sync::Arc;
use std::time::Duration;

pub async fn create_mongo_client(uri: &str, database: &str) -> mongodb::error::Result<Arc<Client>> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    // An unreachable store is not fatal: the views degrade to the fallback corpus.
    match client
        .database(database)
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
    {
        Ok(_) => info!("Connected to MongoDB and verified with ping command"),
        Err(e) => {
            warn!("Connected to MongoDB but ping test failed: {}", e);
            warn!("Trip views will serve the fallback corpus until the store responds");
        }
    }

    Ok(Arc::new(client))
}
