use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod events;
pub mod notifications;
pub mod rides;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/rides/estimate", post(rides::estimate))
        .route("/v1/rides", post(rides::create_ride).get(rides::list_rides))
        .route("/v1/rides/stats", get(rides::driver_stats))
        .route("/v1/rides/events", get(events::stream_ride_events))
        .route(
            "/v1/rides/{id}",
            get(rides::get_ride).delete(rides::delete_ride),
        )
        .route("/v1/rides/{id}/join", post(rides::join_ride))
        .route("/v1/rides/{id}/respond", post(rides::respond_to_request))
        .route("/v1/rides/{id}/verify-otp", post(rides::verify_otp))
        .route("/v1/notifications", get(notifications::list_notifications))
        .route(
            "/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
