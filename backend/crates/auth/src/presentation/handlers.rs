//! HTTP Handlers

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use kernel::access::Actor;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    AuthOutcome, CheckSessionUseCase, ManageRolesUseCase, SignInInput, SignInUseCase,
    SignOutUseCase, SignUpInput, SignUpUseCase, TotpSetupUseCase, VerifyTwoFactorUseCase,
};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    SessionStatusResponse, SetRoleRequest, SetRoleResponse, SignInRequest, SignInResponse,
    SignUpRequest, SignUpResponse, TotpConfirmRequest, TotpSetupResponse, TwoFactorVerifyRequest,
    UserListResponse, UserSummary,
};
use crate::presentation::middleware::RequestFingerprint;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignUpInput {
            user_name: req.user_name,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: output.user_id,
            user_name: output.user_name,
            user_role: output.user_role,
        }),
    ))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        user_name: req.user_name,
        password: req.password,
    };

    match use_case.execute(input, &fingerprint).await? {
        AuthOutcome::Authenticated(session) => {
            let cookie =
                cookie_header(state.config.session_cookie().set_header(&session.session_token))?;

            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(SignInResponse {
                    user_id: session.user_id,
                    requires_2fa: false,
                    user_role: Some(session.user_role),
                    expires_at_ms: session.expires_at_ms,
                }),
            ))
        }
        AuthOutcome::PendingTwoFactor {
            pending_token,
            user_id,
            expires_at_ms,
        } => {
            // No session cookie until the one-time code is verified
            let cookie = cookie_header(state.config.pending_cookie().set_header(&pending_token))?;

            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(SignInResponse {
                    user_id,
                    requires_2fa: true,
                    user_role: None,
                    expires_at_ms,
                }),
            ))
        }
    }
}

/// POST /api/auth/2fa/verify
pub async fn verify_two_factor<R>(
    State(state): State<AuthAppState<R>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    headers: HeaderMap,
    Json(req): Json<TwoFactorVerifyRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let pending_token =
        platform::cookie::extract_cookie(&headers, &state.config.pending_cookie_name)
            .ok_or(AuthError::SessionInvalid)?;

    let use_case = VerifyTwoFactorUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let session = use_case
        .execute(&pending_token, &req.code, &fingerprint)
        .await?;

    let session_cookie =
        cookie_header(state.config.session_cookie().set_header(&session.session_token))?;
    let clear_pending = cookie_header(state.config.pending_cookie().delete_header())?;

    Ok((
        StatusCode::OK,
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, clear_pending),
        ]),
        Json(SignInResponse {
            user_id: session.user_id,
            requires_2fa: false,
            user_role: Some(session.user_role),
            expires_at_ms: session.expires_at_ms,
        }),
    ))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    if let Some(token) =
        platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name)
    {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // The cookie is cleared either way
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign-out with unusable session token");
        }
    }

    let cookie = cookie_header(state.config.session_cookie().delete_header())?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    headers: HeaderMap,
) -> AuthResult<Json<SessionStatusResponse>>
where
    R: AuthStore,
{
    let Some(token) = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name)
    else {
        return Ok(Json(SessionStatusResponse::anonymous()));
    };

    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    match use_case.resolve(&token, &fingerprint.hash).await {
        Ok((session, user)) => Ok(Json(SessionStatusResponse {
            authenticated: true,
            user_id: Some(user.user_id),
            user_name: Some(user.user_name.to_string()),
            user_role: Some(user.user_role),
            expires_at_ms: Some(session.expires_at_ms),
        })),
        Err(AuthError::SessionInvalid) => Ok(Json(SessionStatusResponse::anonymous())),
        Err(e) => Err(e),
    }
}

// ============================================================================
// TOTP Setup (requires authentication)
// ============================================================================

/// POST /api/auth/totp/setup
pub async fn totp_setup<R>(
    State(state): State<AuthAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> AuthResult<Json<TotpSetupResponse>>
where
    R: AuthStore,
{
    let use_case = TotpSetupUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let output = use_case.begin(&actor.user_id).await?;
    let qr_code = output.secret.qr_code_base64(&output.account_name)?;

    Ok(Json(TotpSetupResponse {
        qr_code,
        secret: output.secret.as_base32().to_string(),
        otpauth_url: output.otpauth_url,
        expires_at: output.expires_at,
    }))
}

/// POST /api/auth/totp/confirm
pub async fn totp_confirm<R>(
    State(state): State<AuthAppState<R>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<TotpConfirmRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
{
    let use_case = TotpSetupUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    use_case.confirm(&actor.user_id, &req.code).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Identity Management (admin)
// ============================================================================

/// GET /api/auth/users
pub async fn list_users<R>(
    State(state): State<AuthAppState<R>>,
    Extension(actor): Extension<Actor>,
) -> AuthResult<Json<UserListResponse>>
where
    R: AuthStore,
{
    let use_case = ManageRolesUseCase::new(state.repo.clone());
    let users = use_case.list_users(&actor).await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserSummary::from).collect(),
    }))
}

/// PUT /api/auth/users/{user_id}/role
pub async fn set_role<R>(
    State(state): State<AuthAppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<UserId>,
    Json(req): Json<SetRoleRequest>,
) -> AuthResult<Json<SetRoleResponse>>
where
    R: AuthStore,
{
    let use_case = ManageRolesUseCase::new(state.repo.clone());
    let output = use_case.set_role(&actor, &user_id, req.role).await?;

    Ok(Json(SetRoleResponse {
        user_id: output.user_id,
        user_role: output.user_role,
        changed: output.changed,
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn cookie_header(value: Option<HeaderValue>) -> AuthResult<HeaderValue> {
    value.ok_or_else(|| {
        AuthError::Internal("Cookie contains invalid header characters".to_string())
    })
}
