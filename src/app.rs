/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (PgPool, token service, password hasher) → Router 組み立て
 * - Middleware の適用順 (HTTP, CORS, security headers, authentication gate)
 * - axum::serve() で起動 (graceful shutdown)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::user_repo::PgUserRepo,
    services::auth::{PasswordHasher, build_token_service},
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,user_service=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // development: crash so it gets noticed; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connecting to DATABASE_URL")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("running migrations")?;

    let tokens = build_token_service(config).context("building token service")?;
    let users = Arc::new(PgUserRepo::new(pool));

    Ok(AppState::new(
        users,
        tokens,
        PasswordHasher::new(config.password_hash_cost),
        config.app_env.is_production(),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .nest("/actuator", api::v1::actuator_routes())
        .merge(api::v1::openapi::router());

    // The gate sits on the top-level router so it sees full paths (public prefixes).
    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppEnv;
    use crate::repos::memory_user_repo::MemoryUserRepo;
    use crate::repos::user_repo::NewUser;
    use crate::services::auth::credentials::{MIN_COST, hash_password};
    use crate::services::auth::jwt::{TEST_PRIVATE_KEY_PEM, TEST_PUBLIC_KEY_PEM};
    use crate::services::auth::token::AccessTokenClaims;
    use crate::services::auth::{JwtTokenService, Role};

    const ADMIN_PASSWORD: &str = "alice-password";

    fn test_config() -> Config {
        Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: String::new(),
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(5),
            request_body_limit_bytes: 64 * 1024,
            auth_issuer: "user-service-test".to_string(),
            auth_audience: "user-service-api".to_string(),
            access_token_ttl_seconds: 600,
            access_token_leeway_seconds: 0,
            access_jwt_private_key_pem: TEST_PRIVATE_KEY_PEM.to_string(),
            access_jwt_public_key_pem: TEST_PUBLIC_KEY_PEM.to_string(),
            password_hash_cost: MIN_COST,
        }
    }

    struct TestApp {
        router: Router,
        state: AppState,
        tokens: Arc<JwtTokenService>,
    }

    impl TestApp {
        async fn new() -> Self {
            let config = test_config();
            let tokens = build_token_service(&config).unwrap();
            let state = AppState::new(
                Arc::new(MemoryUserRepo::new()),
                tokens.clone(),
                PasswordHasher::new(config.password_hash_cost),
                false,
            );

            state
                .users
                .create(NewUser {
                    user_name: "alice".to_string(),
                    password_hash: hash_password(ADMIN_PASSWORD, MIN_COST).await.unwrap(),
                    role: "ADMIN".to_string(),
                    address: None,
                    gender: None,
                    birth_date: None,
                })
                .await
                .unwrap();

            Self {
                router: build_router(state.clone(), &config),
                state,
                tokens,
            }
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let headers = resp.headers().clone();
            let bytes = resp.into_body().collect().await.unwrap().to_bytes();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, headers, body)
        }

        async fn sign_up(&self, user_name: &str, password: &str) -> Value {
            let (status, _, body) = self
                .send(json_request(
                    "POST",
                    "/api/v1/authentications/signup",
                    None,
                    json!({ "user_name": user_name, "password": password }),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body
        }

        async fn sign_in(&self, user_name: &str, password: &str) -> String {
            let (status, _, body) = self
                .send(json_request(
                    "POST",
                    "/api/v1/authentications/signin",
                    None,
                    json!({ "user_name": user_name, "password": password }),
                ))
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["token"].as_str().unwrap().to_string()
        }

        async fn admin_token(&self) -> String {
            self.sign_in("alice", ADMIN_PASSWORD).await
        }
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn actuator_is_public_and_hardened() {
        let app = TestApp::new().await;

        let (status, headers, body) = app.send(get("/actuator/health", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");

        let (status, _, body) = app.send(get("/actuator/info", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "user-service");
    }

    #[tokio::test]
    async fn openapi_docs_are_public() {
        let app = TestApp::new().await;

        let (status, _, body) = app.send(get("/api/v1/authentications/docs", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["openapi"].as_str().unwrap().starts_with("3."));
        assert!(body["paths"]["/api/v1/users/{user_id}"]["delete"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn swagger_ui_is_public() {
        let app = TestApp::new().await;

        let resp = app
            .router
            .clone()
            .oneshot(get("/api/v1/authentications/swagger-ui/", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"), "{content_type}");
    }

    #[tokio::test]
    async fn sign_up_creates_plain_users_once() {
        let app = TestApp::new().await;

        let body = app.sign_up("bob", "bob-password").await;
        assert_eq!(body["user_name"], "bob");
        assert_eq!(body["role"], "USER");
        assert!(body.get("password_hash").is_none());

        let stored = app.state.users.find_by_user_name("bob").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$2"), "{}", stored.password_hash);
        assert!(!stored.password_hash.contains("bob-password"));

        let (status, _, body) = app
            .send(json_request(
                "POST",
                "/api/v1/authentications/signup",
                None,
                json!({ "user_name": "bob", "password": "another-password" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn sign_up_validates_input() {
        let app = TestApp::new().await;
        let (status, _, body) = app
            .send(json_request(
                "POST",
                "/api/v1/authentications/signup",
                None,
                json!({ "user_name": "bob", "password": "short" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SIGNUP");
    }

    #[tokio::test]
    async fn sign_in_issues_token_and_cookie() {
        let app = TestApp::new().await;

        let (status, headers, body) = app
            .send(json_request(
                "POST",
                "/api/v1/authentications/signin",
                None,
                json!({ "user_name": "alice", "password": ADMIN_PASSWORD }),
            ))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 600);

        let token = body["token"].as_str().unwrap();
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("Authorization={token}")));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials_uniformly() {
        let app = TestApp::new().await;

        for (user, password) in [("alice", "wrong-password"), ("nobody", ADMIN_PASSWORD)] {
            let (status, headers, body) = app
                .send(json_request(
                    "POST",
                    "/api/v1/authentications/signin",
                    None,
                    json!({ "user_name": user, "password": password }),
                ))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
            assert!(!headers.contains_key(header::SET_COOKIE));
        }
    }

    #[tokio::test]
    async fn protected_routes_need_a_bound_identity() {
        let app = TestApp::new().await;

        let (status, _, _) = app.send(get("/api/v1/users", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = app.send(get("/api/v1/users/5", Some("Basic xyz"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = app
            .send(get("/api/v1/users/5", Some("Bearer not-a-jwt")))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_header_binds_the_caller() {
        let app = TestApp::new().await;
        let token = app.admin_token().await;

        let (status, _, body) = app
            .send(get("/api/v1/authentications/me", Some(&bearer(&token))))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_name"], "alice");
        assert_eq!(body["role"], "ADMIN");
    }

    #[tokio::test]
    async fn cookie_binds_the_caller_like_the_header() {
        let app = TestApp::new().await;
        let token = app.admin_token().await;

        let req = Request::builder()
            .uri("/api/v1/authentications/me")
            .header(header::COOKIE, format!("Authorization={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = app.send(req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_name"], "alice");
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated_not_an_error() {
        let app = TestApp::new().await;
        let now = chrono::Utc::now().timestamp();
        let expired = app
            .tokens
            .sign(&AccessTokenClaims {
                iss: "user-service-test".to_string(),
                aud: "user-service-api".to_string(),
                sub: "alice".to_string(),
                role: Role::Admin,
                iat: now - 7200,
                exp: now - 3600,
                jti: "old".to_string(),
            })
            .unwrap();

        let (status, _, _) = app
            .send(get("/api/v1/users", Some(&bearer(&expired))))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_a_deleted_user_stops_working() {
        let app = TestApp::new().await;
        let admin = bearer(&app.admin_token().await);
        let bob = app.sign_up("bob", "bob-password").await;
        let bob_token = bearer(&app.sign_in("bob", "bob-password").await);

        let uri = format!("/api/v1/users/{}", bob["id"]);
        let req = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, &admin)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = app.send(req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = app
            .send(get("/api/v1/authentications/me", Some(&bob_token)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let app = TestApp::new().await;
        let admin = bearer(&app.admin_token().await);

        let (status, _, created) = app
            .send(json_request(
                "POST",
                "/api/v1/users",
                Some(&admin),
                json!({
                    "user_name": "carol",
                    "password": "carol-password",
                    "role": "ADMIN",
                    "address": "Da Nang",
                    "birth_date": "1990-05-01"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "ADMIN");
        assert_eq!(created["birth_date"], "1990-05-01");
        let id = created["id"].as_i64().unwrap();

        let (status, _, list) = app.send(get("/api/v1/users", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 2);

        let (status, _, one) = app
            .send(get(&format!("/api/v1/users/{id}"), Some(&admin)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["address"], "Da Nang");

        let (status, _, found) = app
            .send(get("/api/v1/users/search?name=aro", Some(&admin)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, json!([{ "user_id": id, "user_name": "carol" }]));

        for uri in ["/api/v1/users/search", "/api/v1/users/search?name=%20"] {
            let (status, _, body) = app.send(get(uri, Some(&admin))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "INVALID_QUERY");
        }

        let (status, _, by_name) = app
            .send(get("/api/v1/users/by-name/carol", Some(&admin)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_name, json!({ "user_id": id }));

        let (status, _, _) = app
            .send(get("/api/v1/users/by-name/nobody", Some(&admin)))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let delete = |uri: String| {
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::AUTHORIZATION, &admin)
                .body(Body::empty())
                .unwrap()
        };
        let (status, _, _) = app.send(delete(format!("/api/v1/users/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = app.send(delete(format!("/api/v1/users/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plain_users_may_only_touch_themselves() {
        let app = TestApp::new().await;
        let bob = app.sign_up("bob", "bob-password").await;
        let bob_id = bob["id"].as_i64().unwrap();
        let token = bearer(&app.sign_in("bob", "bob-password").await);
        let alice_id = app
            .state
            .users
            .find_by_user_name("alice")
            .await
            .unwrap()
            .unwrap()
            .id;

        // own profile: set, then clear with null
        let (status, _, body) = app
            .send(json_request(
                "PUT",
                &format!("/api/v1/users/{bob_id}"),
                Some(&token),
                json!({ "address": "Hue", "gender": "M" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], "Hue");

        let (status, _, body) = app
            .send(json_request(
                "PUT",
                &format!("/api/v1/users/{bob_id}"),
                Some(&token),
                json!({ "address": null }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], Value::Null);
        assert_eq!(body["gender"], "M");

        // someone else's profile
        let (status, _, _) = app
            .send(json_request(
                "PUT",
                &format!("/api/v1/users/{alice_id}"),
                Some(&token),
                json!({ "address": "nope" }),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // admin-only operations
        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/users/{alice_id}"))
            .header(header::AUTHORIZATION, &token)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = app.send(req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app
            .send(json_request(
                "POST",
                "/api/v1/users",
                Some(&token),
                json!({ "user_name": "eve", "password": "eve-password" }),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
