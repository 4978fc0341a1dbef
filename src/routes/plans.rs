use actix_web::{web, HttpResponse, Responder};

use crate::models::plan::TripPreferences;
use crate::state::AppState;

/*
    /api/plans/generate
*/
pub async fn generate(
    state: web::Data<AppState>,
    input: web::Json<TripPreferences>,
) -> impl Responder {
    let plan = state.requester.generate(&input.into_inner()).await;
    HttpResponse::Ok().json(plan)
}
