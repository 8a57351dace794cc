//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_actor;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: AuthStore,
{
    auth_router_with_state(AuthAppState::new(repo, config))
}

/// Build the router around existing state, so the same state can also guard
/// other routers through [`require_actor`].
pub fn auth_router_with_state<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let protected = Router::new()
        .route("/totp/setup", post(handlers::totp_setup::<R>))
        .route("/totp/confirm", post(handlers::totp_confirm::<R>))
        .route("/users", get(handlers::list_users::<R>))
        .route("/users/{user_id}/role", put(handlers::set_role::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_actor::<R>,
        ));

    Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/signin", post(handlers::sign_in::<R>))
        .route("/2fa/verify", post(handlers::verify_two_factor::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/status", get(handlers::session_status::<R>))
        .merge(protected)
        .with_state(state)
}
