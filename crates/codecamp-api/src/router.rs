//! Axum router construction for the Code Camp API.
//!
//! Speaker and talk routes form the versioned group: they read the `ver`
//! header and advertise `api-supported-versions` on every response. Any
//! origin may issue cross-origin `GET` requests; other verbs are left to
//! same-origin callers. The operations route sits outside the CORS layer so
//! its `OPTIONS` verb reaches the handler.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, options, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use codecamp_core::versioning::{SUPPORTED_VERSIONS, SUPPORTED_VERSIONS_HEADER};

use crate::handlers::{auth, camps, operations, speakers, talks};
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let versioned = Router::new()
        .route(
            "/api/camps/{moniker}/speakers",
            get(speakers::list_speakers).post(speakers::create_speaker),
        )
        .route(
            "/api/camps/{moniker}/speakers/{speaker_id}",
            get(speakers::get_speaker)
                .put(speakers::update_speaker)
                .delete(speakers::delete_speaker),
        )
        .route(
            "/api/camps/{moniker}/speakers/{speaker_id}/talks",
            get(talks::list_talks).post(talks::create_talk),
        )
        .route(
            "/api/camps/{moniker}/speakers/{speaker_id}/talks/{talk_id}",
            get(talks::get_talk)
                .put(talks::update_talk)
                .delete(talks::delete_talk),
        )
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(SUPPORTED_VERSIONS_HEADER),
            HeaderValue::from_static(SUPPORTED_VERSIONS),
        ));

    let public = Router::new()
        .route("/api/camps", get(camps::list_camps).post(camps::create_camp))
        .route(
            "/api/camps/{moniker}",
            get(camps::get_camp)
                .put(camps::update_camp)
                .delete(camps::delete_camp),
        )
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/token", post(auth::create_token))
        .merge(versioned)
        .layer(cors);

    // Outside the CORS layer, which would answer OPTIONS on its own.
    let ops = Router::new().route(
        "/api/operations/reloadConfig",
        options(operations::reload_config),
    );

    public
        .merge(ops)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
