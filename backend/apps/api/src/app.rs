//! Router assembly
//!
//! Mounts the auth and inventory routers and the shared HTTP layers. The
//! inventory routes reuse the auth state to resolve the session cookie into
//! an `Actor`.

use auth::domain::AuthStore;
use auth::middleware::require_actor;
use auth::presentation::{AuthAppState, auth_router_with_state};
use auth::AuthConfig;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use inventory::domain::repository::InventoryStore;
use inventory::inventory_router_generic;
use kernel::error::app_error::AppError;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router<A, I>(
    auth_repo: A,
    inventory_repo: I,
    auth_config: AuthConfig,
    allowed_origins: Vec<HeaderValue>,
) -> Router
where
    A: AuthStore,
    I: InventoryStore,
{
    let auth_state = AuthAppState::new(auth_repo, auth_config);

    let inventory = inventory_router_generic(inventory_repo).route_layer(
        middleware::from_fn_with_state(auth_state.clone(), require_actor::<A>),
    );

    Router::new()
        .nest("/api/auth", auth_router_with_state(auth_state))
        .nest("/api/inventory", inventory)
        .fallback(|| async { AppError::not_found("Route not found") })
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use auth::MemoryAuthRepository;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use inventory::MemoryInventoryRepository;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const USER_AGENT: &str = "KasirApp/1.0";
    const PASSWORD: &str = "konter-hp-2026";

    fn app() -> Router {
        build_router(
            MemoryAuthRepository::new(),
            MemoryInventoryRepository::new(),
            AuthConfig::development(),
            vec![HeaderValue::from_static("http://localhost:40922")],
        )
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40922))))
    }

    fn request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn session_for(app: &Router, user_name: &str) -> String {
        let credentials = json!({ "userName": user_name, "password": PASSWORD });

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/signup", None, Some(credentials.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/signin", None, Some(credentials)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_inventory_requires_session() {
        let response = app()
            .oneshot(request("GET", "/api/inventory/products", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_reaches_inventory_with_current_role() {
        let app = app();
        let owner = session_for(&app, "owner").await;
        let kasir = session_for(&app, "kasir").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/inventory/products",
                Some(&owner),
                Some(json!({ "name": "Casan 20W", "price": 85000, "initialStock": 10 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let product_id = body_json(response).await["productId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/inventory/stock/outgoing",
                Some(&kasir),
                Some(json!({ "productId": product_id, "quantity": 3 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/inventory/activity", Some(&kasir), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/inventory/activity", Some(&owner), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["entries"][0]["userName"], "kasir");
        assert_eq!(
            body["entries"][0]["description"],
            "[Staf] Recorded outgoing stock: 3 unit(s) of Casan 20W"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_problem_json() {
        let response = app()
            .oneshot(request("GET", "/api/nope", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["status"], 404);
    }
}
