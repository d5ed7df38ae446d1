use axum::{
    extract::Request,
    middleware,
    routing::{get, patch, post},
    Router,
};
use evite_shared::auth::auth_middleware;
use evite_shared::config::EviteConfig;
use evite_shared::store::dynamo::DynamoEviteStore;
use evite_shared::store::{EviteStorage, RemoteEviteStore, SlotStorage};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    evite_handlers::{
        create_evite, delete_evite, get_evite, get_rsvp_summary, list_evites, update_evite,
    },
    guest_handlers::{add_guest, remove_guest, update_guest},
    public_handlers::{get_public_evite, submit_rsvp},
    SharedStorage,
};

/// Creates a router backed by DynamoDB and the on-disk evite cache
pub async fn create_router() -> Router {
    info!("Creating router with DynamoDB store");

    let config = EviteConfig::from_env();
    let remote = Arc::new(DynamoEviteStore::from_config(&config).await);
    let storage = Arc::new(EviteStorage::from_config(remote, &config));

    // Check if we should remove the base path prefix
    let remove_base_path = std::env::var("REMOVE_BASE_PATH")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    // If REMOVE_BASE_PATH is set to true, don't add the /Prod prefix
    let prefix = if remove_base_path { "" } else { "/Prod" };
    info!("Using API route prefix: {}", prefix);

    create_router_with_storage(storage, prefix)
}

/// Creates a router over the given storage
pub fn create_router_with_storage<R, S>(storage: SharedStorage<R, S>, prefix: &str) -> Router
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    // Host routes, authenticated
    let host_routes = Router::new()
        .route(
            "/evites",
            get(list_evites::<R, S>).post(create_evite::<R, S>),
        )
        .route(
            "/evites/:id",
            get(get_evite::<R, S>)
                .put(update_evite::<R, S>)
                .delete(delete_evite::<R, S>),
        )
        .route("/evites/:id/summary", get(get_rsvp_summary::<R, S>))
        .route("/evites/:id/guests", post(add_guest::<R, S>))
        .route(
            "/evites/:id/guests/:guest_id",
            patch(update_guest::<R, S>).delete(remove_guest::<R, S>),
        )
        .layer(middleware::from_fn(auth_middleware))
        .with_state(storage.clone());

    // Share-link routes, no auth
    let public_routes = Router::new()
        .route("/public/evites/:id", get(get_public_evite::<R, S>))
        .route("/public/evites/:id/rsvp", post(submit_rsvp::<R, S>))
        .with_state(storage);

    let api_routes = host_routes.merge(public_routes);

    let router = if prefix.is_empty() {
        api_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, api_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
