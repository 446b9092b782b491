//! Helpers shared by the service tests

use axum::Router;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Secret the fake shop backend signs tokens with
pub const TOKEN_SECRET: &str = "backend-secret";

/// Token for `user_id` signed with the shop backend's secret
pub fn token_for(user_id: i64, role: &str, expires_in: i64) -> String {
    signed_token(user_id, role, expires_in, TOKEN_SECRET)
}

/// Token for `user_id` expiring `expires_in` seconds from now, signed with `secret`
pub fn signed_token(user_id: i64, role: &str, expires_in: i64, secret: &str) -> String {
    let claims = json!({
        "sub": format!("user{}", user_id),
        "userId": user_id,
        "role": role,
        "exp": Utc::now().timestamp() + expires_in,
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
