use actix_web::web;

pub mod health;
pub mod plans;
pub mod saved;
pub mod trips;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/trips")
                        .route("", web::get().to(trips::get_all))
                        .route("/popular", web::get().to(trips::get_popular))
                        .route("/trending", web::get().to(trips::get_trending))
                        .route("/refetch", web::post().to(trips::refetch))
                        .route("/search", web::get().to(trips::search))
                        .route("/browse", web::post().to(trips::browse))
                        .route("/{id}/use", web::post().to(trips::use_plan))
                        .route("/{id}/ratings", web::post().to(trips::rate)),
                )
                .service(
                    web::scope("/users/{user_id}")
                        .route("/saved", web::get().to(saved::get_saved))
                        .route("/saved/toggle", web::post().to(saved::toggle)),
                )
                .route("/plans/generate", web::post().to(plans::generate)),
        );
}
