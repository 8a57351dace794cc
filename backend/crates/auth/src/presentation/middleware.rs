//! Auth Middleware
//!
//! Resolves the session cookie into an [`Actor`] for protected routes. Other
//! crates mount their routers behind [`require_actor`] and read the actor
//! with `Extension<Actor>`.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::access::Actor;
use platform::client::{ClientFingerprint, extract_client_ip, extract_fingerprint};

use crate::application::CheckSessionUseCase;
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Fingerprint of the calling client. Rejects requests without a User-Agent.
#[derive(Debug, Clone)]
pub struct RequestFingerprint(pub ClientFingerprint);

impl<S> FromRequestParts<S> for RequestFingerprint
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer_ip = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());
        let client_ip = extract_client_ip(&parts.headers, peer_ip);

        Ok(Self(extract_fingerprint(&parts.headers, client_ip)?))
    }
}

/// Middleware that requires a fully authenticated session
pub async fn require_actor<R>(
    State(state): State<AuthAppState<R>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name)
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );
    let actor: Actor = use_case.actor(&token, &fingerprint.hash).await?;

    tracing::debug!(user_id = %actor.user_id, role = %actor.role, "Request authenticated");

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
