use actix_web::{web, HttpResponse, Responder};
use log::warn;

use crate::models::trip::TripListing;
use crate::state::AppState;

/*
    /api/users/{user_id}/saved
*/
pub async fn get_saved(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    let reconciler = state.reconciler_for(&user_id).await;

    if let Err(err) = reconciler.seed().await {
        warn!("Failed to load saved items for {}: {}", user_id, err);
        return HttpResponse::BadGateway().body("Failed to load saved items");
    }

    let mut saved_ids: Vec<String> = reconciler.saved_ids().await.into_iter().collect();
    saved_ids.sort();
    HttpResponse::Ok().json(serde_json::json!({ "savedIds": saved_ids }))
}

/*
    /api/users/{user_id}/saved/toggle
*/
pub async fn toggle(
    state: web::Data<AppState>,
    path: web::Path<String>,
    input: web::Json<TripListing>,
) -> impl Responder {
    let user_id = path.into_inner();
    let reconciler = state.reconciler_for(&user_id).await;

    // Toggling against an unseeded set would misread saved items as absent.
    if let Err(err) = reconciler.seed().await {
        warn!("Failed to load saved items for {}: {}", user_id, err);
        return HttpResponse::BadGateway().body("Failed to load saved items");
    }

    let outcome = reconciler.toggle(&input.into_inner()).await;
    HttpResponse::Ok().json(outcome)
}
