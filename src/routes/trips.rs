use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::filter::FilterCriteria;
use crate::services::trip_views::ViewKind;
use crate::state::AppState;

/*
    /api/trips
*/
pub async fn get_all(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.hub.all.state().await)
}

/*
    /api/trips/popular
*/
pub async fn get_popular(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.hub.popular.state().await)
}

/*
    /api/trips/trending
*/
pub async fn get_trending(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.hub.trending.state().await)
}

/*
    /api/trips/refetch
*/
pub async fn refetch(state: web::Data<AppState>) -> impl Responder {
    state.hub.load().await;
    HttpResponse::Ok().json(serde_json::json!({
        "degraded": state.hub.is_degraded().await,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
}

/*
    /api/trips/search?q=&category=
*/
pub async fn search(state: web::Data<AppState>, params: web::Query<SearchParams>) -> impl Responder {
    let params = params.into_inner();
    let view = state
        .hub
        .search
        .perform_search(&params.q, params.category.as_deref())
        .await;
    HttpResponse::Ok().json(view)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseRequest {
    pub view: ViewKind,
    #[serde(default)]
    pub criteria: FilterCriteria,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/*
    /api/trips/browse
*/
pub async fn browse(state: web::Data<AppState>, input: web::Json<BrowseRequest>) -> impl Responder {
    let request = input.into_inner();
    let page = request.page.unwrap_or(1);
    let page_size = request
        .page_size
        .filter(|size| *size > 0)
        .unwrap_or(state.config.default_page_size);

    let result = state
        .hub
        .browse(request.view, &request.criteria, page, page_size)
        .await;
    HttpResponse::Ok().json(result)
}

/*
    /api/trips/{id}/use
*/
pub async fn use_plan(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let trip_id = path.into_inner();
    let outcome = state.actions.use_plan(&trip_id).await;
    if outcome.success {
        HttpResponse::Ok().json(outcome)
    } else {
        HttpResponse::BadGateway().json(outcome)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub user_id: String,
    pub value: u8,
    #[serde(default)]
    pub comment: String,
}

/*
    /api/trips/{id}/ratings
*/
pub async fn rate(
    state: web::Data<AppState>,
    path: web::Path<String>,
    input: web::Json<RateRequest>,
) -> impl Responder {
    let trip_id = path.into_inner();
    let request = input.into_inner();

    if !(1..=5).contains(&request.value) {
        return HttpResponse::BadRequest().body("Rating must be between 1 and 5");
    }

    let outcome = state
        .actions
        .rate(&trip_id, &request.user_id, request.value, &request.comment)
        .await;
    if outcome.success {
        HttpResponse::Ok().json(outcome)
    } else {
        HttpResponse::BadGateway().json(outcome)
    }
}
