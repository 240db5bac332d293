use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::configs::Settings;
use crate::devices::DeviceRegistry;
use crate::handles::*;
use crate::middlewares::{TokenState, auth};
use crate::services::{CallbackService, TokenService};

pub async fn create_app(settings: &Arc<Settings>, registry: Arc<DeviceRegistry>) -> Router {
    let token_service = Arc::new(TokenService::new(&settings.server.token));
    let callback_service = Arc::new(CallbackService::new());

    tokio::spawn(registry.clone().listen());

    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    let bridge = Router::new()
        .route("/info", get(bridge_info))
        .route("/list", get(list_devices))
        .route_layer(middleware::from_fn_with_state(token_state.clone(), auth))
        .with_state(BridgeState {
            server: settings.server.clone(),
            registry: registry.clone(),
            started_at: Instant::now(),
        });

    let lock = Router::new()
        .route("/lockState", get(lock_state))
        .route("/lock", get(lock_device))
        .route("/unlock", get(unlock_device))
        .route("/lockAction", get(lock_action))
        .route("/verify_security_pin", get(verify_security_pin))
        .route("/request_log_entries", get(request_log_entries))
        .route_layer(middleware::from_fn_with_state(token_state.clone(), auth))
        .with_state(DeviceState {
            registry: registry.clone(),
        });

    let callbacks = Router::new()
        .route("/callback/add", get(add_callback))
        .route("/callback/list", get(list_callbacks))
        .route("/callback/remove", get(remove_callback))
        .route_layer(middleware::from_fn_with_state(token_state.clone(), auth))
        .with_state(CallbackState {
            callbacks: callback_service.clone(),
            registry: registry.clone(),
        });

    Router::new()
        .merge(bridge)
        .merge(lock)
        .merge(callbacks)
        .layer(TraceLayer::new_for_http())
}
