use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::State,
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::jwt::jwt_middleware;
use crate::routes::{bookings, matches, tournaments};
use crate::state::AppState;

/// Build the Axum router: health probe, booking and tournament endpoints.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let mut booking_routes = Router::new()
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route("/bookings/availability", get(bookings::availability))
        .route("/bookings/batch", post(bookings::create_batch))
        .route("/bookings/{id}/confirm", put(bookings::confirm))
        .route("/bookings/{id}/cancel", put(bookings::cancel))
        .route("/courts/blocks", post(bookings::create_court_block));

    if state.config().rate_limit_enabled {
        // ~10 requests per minute per client IP
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .finish()
            .ok_or_else(|| anyhow!("invalid rate limiter configuration"))?;
        booking_routes = booking_routes.layer(GovernorLayer::new(Arc::new(governor_conf)));
    }

    let tournament_routes = Router::new()
        .route("/tournaments", post(tournaments::create))
        .route("/tournaments/{id}", get(tournaments::get))
        .route("/tournaments/{id}/phase", post(tournaments::advance_phase))
        .route(
            "/tournaments/{id}/participants",
            get(tournaments::list_participants).post(tournaments::register_participant),
        )
        .route(
            "/tournaments/participants/{participant_id}",
            put(tournaments::update_participant),
        )
        .route(
            "/tournaments/{id}/groups",
            get(tournaments::list_groups).post(tournaments::draw_groups),
        )
        .route(
            "/tournaments/groups/{group_id}/standings",
            get(tournaments::standings),
        )
        .route(
            "/tournaments/{id}/groups/matches",
            post(matches::generate_fixtures),
        )
        .route(
            "/tournaments/{id}/matches",
            get(matches::list).post(matches::create),
        )
        .route("/tournaments/matches/{match_id}", put(matches::update));

    let origins: Vec<HeaderValue> = state
        .config()
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let router = Router::new()
        // Liveness check; also proves DB connectivity.
        .route("/health", get(health))
        .merge(booking_routes)
        .merge(tournament_routes)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        );

    Ok(router)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&state.db).await?;
    Ok("ok")
}
