use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use std::sync::Arc;

use birdquiz_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    services::AppState,
};

pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test if present
    dotenvy::from_filename(".env.test").ok();

    // Record writes must be synchronous here, or tests would race their own reads
    std::env::set_var("RECORDS_SAVE_ASYNC", "0");

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let app_state = Arc::new(
        AppState::new(config, mongo_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    create_router(app_state)
}

/// Mint a bearer header the way the identity provider would.
pub fn bearer_token(user_id: &str) -> String {
    dotenvy::from_filename(".env.test").ok();
    let config = Config::load().expect("Failed to load test configuration");
    let service = JwtService::new(&config.jwt_secret);

    let claims = JwtClaims {
        sub: user_id.to_string(),
        email: None,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iat: chrono::Utc::now().timestamp() as usize,
    };

    format!(
        "Bearer {}",
        service.generate_token(claims).expect("Failed to mint token")
    )
}

pub fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", token)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", token)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
