use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::env;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    degraded: bool,
    environment: String,
    version: String,
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "OK".to_string(),
        degraded: state.hub.is_degraded().await,
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
