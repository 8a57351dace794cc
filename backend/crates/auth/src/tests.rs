//! Use-case and router tests for the auth crate, run against the in-memory store.

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use platform::client::ClientFingerprint;

    use crate::application::*;
    use crate::domain::value_object::{UserId, totp_secret::TotpSecret};
    use crate::error::AuthResult;
    use crate::infra::memory::MemoryAuthRepository;

    pub const PASSWORD: &str = "konter-hp-2026";
    pub const USER_AGENT: &str = "KasirApp/1.0";

    pub struct Harness {
        pub repo: Arc<MemoryAuthRepository>,
        pub config: Arc<AuthConfig>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                repo: Arc::new(MemoryAuthRepository::new()),
                config: Arc::new(AuthConfig::development()),
            }
        }

        pub fn fingerprint(&self) -> ClientFingerprint {
            ClientFingerprint::from_user_agent(USER_AGENT, None)
        }

        pub async fn sign_up(&self, user_name: &str) -> AuthResult<SignUpOutput> {
            SignUpUseCase::new(self.repo.clone(), self.config.clone())
                .execute(SignUpInput {
                    user_name: user_name.to_string(),
                    password: PASSWORD.to_string(),
                })
                .await
        }

        pub async fn sign_in(&self, user_name: &str, password: &str) -> AuthResult<AuthOutcome> {
            SignInUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.config.clone(),
            )
            .execute(
                SignInInput {
                    user_name: user_name.to_string(),
                    password: password.to_string(),
                },
                &self.fingerprint(),
            )
            .await
        }

        pub async fn verify(
            &self,
            pending_token: &str,
            code: &str,
        ) -> AuthResult<EstablishedSession> {
            VerifyTwoFactorUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.config.clone(),
            )
            .execute(pending_token, code, &self.fingerprint())
            .await
        }

        pub fn totp(
            &self,
        ) -> TotpSetupUseCase<MemoryAuthRepository, MemoryAuthRepository, MemoryAuthRepository> {
            TotpSetupUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.config.clone(),
            )
        }

        pub fn check(&self) -> CheckSessionUseCase<MemoryAuthRepository, MemoryAuthRepository> {
            CheckSessionUseCase::new(self.repo.clone(), self.repo.clone(), self.config.clone())
        }

        /// Enroll and confirm TOTP for `user_id`, returning the committed secret.
        pub async fn enable_totp(&self, user_id: &UserId, user_name: &str) -> TotpSecret {
            let setup = self.totp().begin(user_id).await.unwrap();
            let code = setup.secret.generate_current(user_name).unwrap();
            self.totp().confirm(user_id, &code).await.unwrap();
            setup.secret
        }
    }

    /// A six-digit code that differs from `code` in its last digit.
    pub fn wrong_code(code: &str) -> String {
        let (head, last) = code.split_at(5);
        let digit = last.parse::<u8>().unwrap();
        format!("{head}{}", (digit + 5) % 10)
    }
}

#[cfg(test)]
mod sign_up_tests {
    use super::support::*;
    use crate::application::{SeedOutcome, SignUpInput, SignUpUseCase};
    use crate::domain::value_object::user_role::UserRole;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_bootstrap_roles_follow_registration_order() {
        let h = Harness::new();

        assert_eq!(h.sign_up("pemilik").await.unwrap().user_role, UserRole::SuperAdmin);
        assert_eq!(h.sign_up("kasir1").await.unwrap().user_role, UserRole::Staf);
        assert_eq!(h.sign_up("kasir2").await.unwrap().user_role, UserRole::Pending);
        assert_eq!(h.sign_up("kasir3").await.unwrap().user_role, UserRole::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_rejected_without_mutation() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        assert!(matches!(h.sign_up("pemilik").await, Err(AuthError::UserNameTaken)));

        // The failed attempt did not consume the `staf` slot
        assert_eq!(h.sign_up("kasir1").await.unwrap().user_role, UserRole::Staf);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let h = Harness::new();
        let use_case = SignUpUseCase::new(h.repo.clone(), h.config.clone());

        let short_name = use_case
            .execute(SignUpInput {
                user_name: "ab".to_string(),
                password: PASSWORD.to_string(),
            })
            .await;
        assert!(matches!(short_name, Err(AuthError::UserNameValidation(_))));

        let short_password = use_case
            .execute(SignUpInput {
                user_name: "pemilik".to_string(),
                password: "pendek".to_string(),
            })
            .await;
        assert!(matches!(short_password, Err(AuthError::PasswordValidation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_assign_each_bootstrap_role_once() {
        let h = Harness::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = h.repo.clone();
            let config = h.config.clone();
            handles.push(tokio::spawn(async move {
                SignUpUseCase::new(repo, config)
                    .execute(SignUpInput {
                        user_name: format!("kasir{i}"),
                        password: PASSWORD.to_string(),
                    })
                    .await
                    .unwrap()
                    .user_role
            }));
        }

        let mut roles = Vec::new();
        for handle in handles {
            roles.push(handle.await.unwrap());
        }

        assert_eq!(roles.iter().filter(|r| **r == UserRole::SuperAdmin).count(), 1);
        assert_eq!(roles.iter().filter(|r| **r == UserRole::Staf).count(), 1);
        assert_eq!(roles.iter().filter(|r| **r == UserRole::Pending).count(), 6);
    }

    #[tokio::test]
    async fn test_seed_super_admin_is_idempotent() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        let use_case = SignUpUseCase::new(h.repo.clone(), h.config.clone());
        let input = || SignUpInput {
            user_name: "operator".to_string(),
            password: PASSWORD.to_string(),
        };

        assert!(matches!(
            use_case.seed_super_admin(input()).await.unwrap(),
            SeedOutcome::Created(_)
        ));
        assert_eq!(
            use_case.seed_super_admin(input()).await.unwrap(),
            SeedOutcome::AlreadyExists
        );

        // Seeded identities count toward the bootstrap ladder
        assert_eq!(h.sign_up("kasir1").await.unwrap().user_role, UserRole::Pending);
    }
}

#[cfg(test)]
mod sign_in_tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::support::*;
    use crate::application::AuthOutcome;
    use crate::domain::repository::{AuthRepository, UserRepository};
    use crate::domain::value_object::user_name::UserName;
    use crate::error::{AuthError, AuthResult};

    /// Fire `attempts` concurrent sign-ins for "pemilik"; index `correct_at`
    /// (if any) uses the right password.
    async fn sign_in_burst(
        h: &Arc<Harness>,
        attempts: usize,
        correct_at: Option<usize>,
    ) -> Vec<AuthResult<AuthOutcome>> {
        let mut handles = Vec::new();
        for i in 0..attempts {
            let h = h.clone();
            let password = if Some(i) == correct_at {
                PASSWORD
            } else {
                "salah-sandi"
            };
            handles.push(tokio::spawn(async move { h.sign_in("pemilik", password).await }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test]
    async fn test_sign_in_opens_session() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();

        let AuthOutcome::Authenticated(session) = h.sign_in("pemilik", PASSWORD).await.unwrap()
        else {
            panic!("expected a full session");
        };
        assert_eq!(session.user_id, user.user_id);

        let actor = h
            .check()
            .actor(&session.session_token, &h.fingerprint().hash)
            .await
            .unwrap();
        assert_eq!(actor.user_id, user.user_id);

        let stored = h
            .repo
            .find_by_user_name(&UserName::new("pemilik").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        let unknown = h.sign_in("siapa", PASSWORD).await.unwrap_err();
        let wrong = h.sign_in("pemilik", "salah-sandi").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_fifth_failure_locks_and_correct_password_is_refused() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        for _ in 0..4 {
            assert!(matches!(
                h.sign_in("pemilik", "salah-sandi").await,
                Err(AuthError::InvalidCredentials)
            ));
        }

        let locked = h.sign_in("pemilik", "salah-sandi").await.unwrap_err();
        let AuthError::AccountLocked { retry_after_secs } = locked else {
            panic!("expected lockout, got {locked:?}");
        };
        assert!(retry_after_secs > 29 * 60 && retry_after_secs <= 30 * 60);

        assert!(matches!(
            h.sign_in("pemilik", PASSWORD).await,
            Err(AuthError::AccountLocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        for _ in 0..4 {
            let _ = h.sign_in("pemilik", "salah-sandi").await;
        }
        assert!(h.sign_in("pemilik", PASSWORD).await.is_ok());

        // Four more failures stay below the threshold again
        for _ in 0..4 {
            assert!(matches!(
                h.sign_in("pemilik", "salah-sandi").await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_check_at_most_threshold_passwords() {
        let h = Arc::new(Harness::new());
        let user = h.sign_up("pemilik").await.unwrap();

        let results = sign_in_burst(&h, 24, None).await;

        let invalid = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::InvalidCredentials)))
            .count();
        let locked = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::AccountLocked { .. })))
            .count();
        assert_eq!(invalid, 4);
        assert_eq!(locked, 20);

        // Only the five attempts before the lock were charged
        let auth = h.repo.find_credentials(&user.user_id).await.unwrap().unwrap();
        assert_eq!(auth.failed_login_count, h.config.lockout.max_failures);

        assert!(matches!(
            h.sign_in("pemilik", PASSWORD).await,
            Err(AuthError::AccountLocked { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_correct_password_in_a_failure_burst_never_bypasses_the_lock() {
        let h = Arc::new(Harness::new());
        h.sign_up("pemilik").await.unwrap();

        let results = sign_in_burst(&h, 24, Some(12)).await;

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let invalid = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::InvalidCredentials)))
            .count();
        assert!(ok <= 1);
        assert!(invalid <= 2 * (h.config.lockout.max_failures as usize - 1));

        if ok == 0 {
            // The right password lost the race to the lock, and the lock stays
            assert_eq!(invalid, 4);
            assert!(matches!(
                h.sign_in("pemilik", PASSWORD).await,
                Err(AuthError::AccountLocked { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_lock_set_during_a_check_is_not_lifted_by_it() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();
        let policy = h.config.lockout;
        let now = Utc::now();

        // The right password is being checked while four failures land
        let in_flight = h
            .repo
            .begin_login_attempt(&user.user_id, &policy, now)
            .await
            .unwrap();
        for _ in 0..4 {
            h.repo
                .begin_login_attempt(&user.user_id, &policy, now)
                .await
                .unwrap();
        }

        assert!(matches!(
            h.repo
                .complete_login_attempt(&user.user_id, &in_flight, now)
                .await,
            Err(AuthError::AccountLocked { .. })
        ));
        assert!(matches!(
            h.repo.begin_login_attempt(&user.user_id, &policy, now).await,
            Err(AuthError::AccountLocked { .. })
        ));
        assert!(matches!(
            h.sign_in("pemilik", PASSWORD).await,
            Err(AuthError::AccountLocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_session_is_bound_to_fingerprint() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();

        let AuthOutcome::Authenticated(session) = h.sign_in("pemilik", PASSWORD).await.unwrap()
        else {
            panic!("expected a full session");
        };

        let other = platform::client::ClientFingerprint::from_user_agent("curl/8.0", None);
        assert!(matches!(
            h.check().actor(&session.session_token, &other.hash).await,
            Err(AuthError::SessionInvalid)
        ));
    }
}

#[cfg(test)]
mod two_factor_tests {
    use super::support::*;
    use crate::application::AuthOutcome;
    use crate::domain::repository::{AuthRepository, TotpEnrollmentRepository};
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_enrollment_requires_valid_code() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();

        let setup = h.totp().begin(&user.user_id).await.unwrap();
        assert!(setup.otpauth_url.starts_with("otpauth://totp/"));
        assert!(setup.otpauth_url.contains("issuer=KonterHP"));

        let code = setup.secret.generate_current("pemilik").unwrap();
        assert!(matches!(
            h.totp().confirm(&user.user_id, &wrong_code(&code)).await,
            Err(AuthError::InvalidTwoFactorCode)
        ));

        // Still pending and not enabled
        let auth = h.repo.find_credentials(&user.user_id).await.unwrap().unwrap();
        assert!(!auth.totp_enabled);
        assert!(h.repo.find_enrollment(&user.user_id).await.unwrap().is_some());

        h.totp().confirm(&user.user_id, &code).await.unwrap();

        let auth = h.repo.find_credentials(&user.user_id).await.unwrap().unwrap();
        assert!(auth.totp_enabled);
        assert_eq!(auth.totp_secret.unwrap().as_base32(), setup.secret.as_base32());
        assert!(h.repo.find_enrollment(&user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_enrollment_fails() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();

        assert!(matches!(
            h.totp().confirm(&user.user_id, "123456").await,
            Err(AuthError::EnrollmentNotPending)
        ));
    }

    #[tokio::test]
    async fn test_secret_is_never_regenerated_while_enabled() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();
        h.enable_totp(&user.user_id, "pemilik").await;

        assert!(matches!(
            h.totp().begin(&user.user_id).await,
            Err(AuthError::TwoFactorAlreadyEnabled)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_with_second_factor() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();
        let secret = h.enable_totp(&user.user_id, "pemilik").await;

        let AuthOutcome::PendingTwoFactor { pending_token, .. } =
            h.sign_in("pemilik", PASSWORD).await.unwrap()
        else {
            panic!("expected a pending second factor");
        };

        // The pending token is not a session
        assert!(matches!(
            h.check().actor(&pending_token, &h.fingerprint().hash).await,
            Err(AuthError::SessionInvalid)
        ));

        let code = secret.generate_current("pemilik").unwrap();
        assert!(matches!(
            h.verify(&pending_token, &wrong_code(&code)).await,
            Err(AuthError::InvalidTwoFactorCode)
        ));
        assert!(matches!(
            h.verify(&pending_token, "12ab56").await,
            Err(AuthError::InvalidTwoFactorCode)
        ));

        let session = h.verify(&pending_token, &code).await.unwrap();
        assert_eq!(session.user_id, user.user_id);
        assert!(
            h.check()
                .actor(&session.session_token, &h.fingerprint().hash)
                .await
                .is_ok()
        );

        // The pending session was consumed
        assert!(matches!(
            h.verify(&pending_token, &code).await,
            Err(AuthError::SessionInvalid)
        ));

        // Both wrong codes were forgiven by the successful verification
        let auth = h.repo.find_credentials(&user.user_id).await.unwrap().unwrap();
        assert_eq!(auth.failed_login_count, 0);
    }

    #[tokio::test]
    async fn test_new_pending_session_replaces_the_previous_one() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();
        let secret = h.enable_totp(&user.user_id, "pemilik").await;

        let mut pending_tokens = Vec::new();
        for _ in 0..3 {
            let AuthOutcome::PendingTwoFactor { pending_token, .. } =
                h.sign_in("pemilik", PASSWORD).await.unwrap()
            else {
                panic!("expected a pending second factor");
            };
            pending_tokens.push(pending_token);
        }

        let code = secret.generate_current("pemilik").unwrap();
        for stale in &pending_tokens[..2] {
            assert!(matches!(
                h.verify(stale, &code).await,
                Err(AuthError::SessionInvalid)
            ));
        }
        assert!(h.verify(&pending_tokens[2], &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_codes_share_the_lockout_counter() {
        let h = Harness::new();
        let user = h.sign_up("pemilik").await.unwrap();
        let secret = h.enable_totp(&user.user_id, "pemilik").await;

        let AuthOutcome::PendingTwoFactor { pending_token, .. } =
            h.sign_in("pemilik", PASSWORD).await.unwrap()
        else {
            panic!("expected a pending second factor");
        };

        let code = secret.generate_current("pemilik").unwrap();
        let bad = wrong_code(&code);
        for _ in 0..4 {
            assert!(matches!(
                h.verify(&pending_token, &bad).await,
                Err(AuthError::InvalidTwoFactorCode)
            ));
        }
        assert!(matches!(
            h.verify(&pending_token, &bad).await,
            Err(AuthError::AccountLocked { .. })
        ));

        // Locked out: the pending session is gone and the password is refused
        assert!(matches!(
            h.verify(&pending_token, &code).await,
            Err(AuthError::SessionInvalid)
        ));
        assert!(matches!(
            h.sign_in("pemilik", PASSWORD).await,
            Err(AuthError::AccountLocked { .. })
        ));
    }
}

#[cfg(test)]
mod role_tests {
    use super::support::*;
    use crate::application::ManageRolesUseCase;
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::services::RoleChangeDenied;
    use crate::domain::value_object::{UserId, user_role::UserRole};
    use crate::error::AuthError;
    use kernel::access::Actor;

    async fn actor(h: &Harness, user_id: &UserId) -> Actor {
        let user: User = h.repo.find_by_id(user_id).await.unwrap().unwrap();
        user.to_actor()
    }

    #[tokio::test]
    async fn test_role_changes() {
        let h = Harness::new();
        let owner = h.sign_up("pemilik").await.unwrap();
        let staf = h.sign_up("kasir1").await.unwrap();
        let pending = h.sign_up("kasir2").await.unwrap();
        let roles = ManageRolesUseCase::new(h.repo.clone());

        let owner_actor = actor(&h, &owner.user_id).await;
        let output = roles
            .set_role(&owner_actor, &staf.user_id, UserRole::Admin)
            .await
            .unwrap();
        assert!(output.changed);
        assert_eq!(output.user_role, UserRole::Admin);

        // An admin may promote to staf but not to superadmin
        let admin_actor = actor(&h, &staf.user_id).await;
        roles
            .set_role(&admin_actor, &pending.user_id, UserRole::Staf)
            .await
            .unwrap();
        assert!(matches!(
            roles
                .set_role(&admin_actor, &pending.user_id, UserRole::SuperAdmin)
                .await,
            Err(AuthError::RoleChangeForbidden(
                RoleChangeDenied::PromotionRequiresSuperAdmin
            ))
        ));

        // Nobody else may touch the superadmin, and it cannot demote itself
        assert!(matches!(
            roles
                .set_role(&admin_actor, &owner.user_id, UserRole::Staf)
                .await,
            Err(AuthError::RoleChangeForbidden(RoleChangeDenied::OtherSuperAdmin))
        ));
        assert!(matches!(
            roles
                .set_role(&owner_actor, &owner.user_id, UserRole::Admin)
                .await,
            Err(AuthError::RoleChangeForbidden(RoleChangeDenied::SelfDemotion))
        ));

        let unchanged = roles
            .set_role(&owner_actor, &pending.user_id, UserRole::Staf)
            .await
            .unwrap();
        assert!(!unchanged.changed);
    }

    #[tokio::test]
    async fn test_non_admins_cannot_manage_roles() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();
        let staf = h.sign_up("kasir1").await.unwrap();
        let roles = ManageRolesUseCase::new(h.repo.clone());

        let staf_actor = actor(&h, &staf.user_id).await;
        assert!(matches!(
            roles.list_users(&staf_actor).await,
            Err(AuthError::Forbidden(_))
        ));
        assert!(matches!(
            roles
                .set_role(&staf_actor, &staf.user_id, UserRole::Admin)
                .await,
            Err(AuthError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_set_role_on_missing_user() {
        let h = Harness::new();
        let owner = h.sign_up("pemilik").await.unwrap();
        let roles = ManageRolesUseCase::new(h.repo.clone());

        assert!(matches!(
            roles
                .set_role(&actor(&h, &owner.user_id).await, &UserId::new(), UserRole::Staf)
                .await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_stale_role_is_a_conflict() {
        let h = Harness::new();
        h.sign_up("pemilik").await.unwrap();
        let staf = h.sign_up("kasir1").await.unwrap();

        assert!(
            h.repo
                .update_role(&staf.user_id, UserRole::Staf, UserRole::Admin)
                .await
                .unwrap()
        );
        assert!(
            !h.repo
                .update_role(&staf.user_id, UserRole::Staf, UserRole::Pending)
                .await
                .unwrap()
        );
    }
}

#[cfg(test)]
mod router_tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::AuthConfig;
    use crate::domain::value_object::totp_secret::TotpSecret;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::router::auth_router_generic;

    fn app() -> Router {
        auth_router_generic(MemoryAuthRepository::new(), AuthConfig::development())
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40922))))
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// `name=value` pairs from every Set-Cookie header.
    fn cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect()
    }

    async fn sign_up_and_in(app: &Router, user_name: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/signup",
                None,
                json!({ "userName": user_name, "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/signin",
                None,
                json!({ "userName": user_name, "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        cookies(&response).remove(0)
    }

    #[tokio::test]
    async fn test_sign_up_reports_bootstrap_role() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/signup",
                None,
                json!({ "userName": "pemilik", "password": PASSWORD }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["userRole"], "superadmin");
        assert_eq!(body["userName"], "pemilik");
    }

    #[tokio::test]
    async fn test_session_cookie_grants_access() {
        let app = app();
        let cookie = sign_up_and_in(&app, "pemilik").await;
        assert!(cookie.starts_with("konterhp_session="));

        let response = app.clone().oneshot(get("/users", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get("/users", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["users"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(get("/status", Some(&cookie)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["userRole"], "superadmin");
    }

    #[tokio::test]
    async fn test_lockout_returns_423_with_retry_after() {
        let app = app();
        sign_up_and_in(&app, "pemilik").await;

        let mut last = None;
        for _ in 0..5 {
            last = Some(
                app.clone()
                    .oneshot(json_request(
                        "POST",
                        "/signin",
                        None,
                        json!({ "userName": "pemilik", "password": "salah-sandi" }),
                    ))
                    .await
                    .unwrap(),
            );
        }

        let response = last.unwrap();
        assert_eq!(response.status(), StatusCode::LOCKED);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let body = body_json(response).await;
        assert_eq!(body["status"], 423);
    }

    #[tokio::test]
    async fn test_staf_cannot_list_users() {
        let app = app();
        sign_up_and_in(&app, "pemilik").await;
        let staf_cookie = sign_up_and_in(&app, "kasir1").await;

        let response = app
            .clone()
            .oneshot(get("/users", Some(&staf_cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_two_factor_flow_over_http() {
        let app = app();
        let cookie = sign_up_and_in(&app, "pemilik").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/totp/setup", Some(&cookie), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(!body["qrCode"].as_str().unwrap().is_empty());
        let secret = TotpSecret::from_base32(body["secret"].as_str().unwrap()).unwrap();

        let code = secret.generate_current("pemilik").unwrap();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/totp/confirm",
                Some(&cookie),
                json!({ "code": code }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/signin",
                None,
                json!({ "userName": "pemilik", "password": PASSWORD }),
            ))
            .await
            .unwrap();
        let pending_cookie = cookies(&response).remove(0);
        assert!(pending_cookie.starts_with("konterhp_2fa="));
        let body = body_json(response).await;
        assert_eq!(body["requires2fa"], true);

        // The pending cookie does not open protected routes
        let pending_as_session = pending_cookie.replacen("konterhp_2fa", "konterhp_session", 1);
        let response = app
            .clone()
            .oneshot(get("/users", Some(&pending_as_session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/2fa/verify",
                Some(&pending_cookie),
                json!({ "code": code }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set = cookies(&response);
        assert!(set.iter().any(|c| c.starts_with("konterhp_session=") && c.len() > 20));
        assert!(set.iter().any(|c| c == "konterhp_2fa="));
    }

    #[tokio::test]
    async fn test_missing_user_agent_is_rejected() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/signin")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "userName": "pemilik", "password": PASSWORD }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
