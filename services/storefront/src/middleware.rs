//! Authentication and authorization middleware

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use tracing::{info, warn};

use common::models::Role;

use crate::{
    error::{self, ApiError, NotFoundMessage},
    state::AppState,
};

/// Response header carrying a token renewed during the request
pub const REFRESHED_TOKEN_HEADER: &str = "x-refreshed-token";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub user_name: String,
    pub role: Role,
    /// Token to forward to the shop backend
    pub token: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Storage owner key for this user's cart and form submissions
    pub fn owner(&self) -> String {
        self.id.to_string()
    }
}

/// Authentication middleware
///
/// Resolves the bearer token into a [`CurrentUser`], renewing it when it is
/// about to expire.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let fresh = state.sessions.ensure_fresh(bearer.token(), Utc::now()).await?;

    let id = match fresh.claims.user_id {
        Some(id) => id,
        None => state.backend.profile(&fresh.token).await?.id,
    };

    let user = CurrentUser {
        id,
        user_name: fresh.claims.sub.clone(),
        role: fresh.claims.role(),
        token: fresh.token.clone(),
    };
    req.extensions_mut().insert(user);

    let mut response = next.run(req).await;

    if fresh.refreshed {
        match HeaderValue::from_str(&fresh.token) {
            Ok(value) => {
                response.headers_mut().insert(REFRESHED_TOKEN_HEADER, value);
            }
            Err(e) => warn!("Refreshed token is not a valid header value: {}", e),
        }
    }

    Ok(response)
}

/// Admin guard; must run after [`auth_middleware`]
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !user.is_admin() {
        info!(user_id = user.id, path = %req.uri().path(), "Rejected non-admin request");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// List view a client returns to when an item under `path` is missing
pub fn list_view_for(path: &str) -> Option<&'static str> {
    let mut segments = path.trim_start_matches("/api/").split('/');
    match (segments.next()?, segments.next()) {
        ("admin", Some("products")) => Some("/admin/products"),
        ("admin", Some("deals")) => Some("/admin/deals"),
        ("admin", Some("orders")) => Some("/admin/orders"),
        ("admin", Some("users")) => Some("/admin/users"),
        ("products", _) => Some("/products"),
        ("deals", _) => Some("/deals"),
        ("orders", _) => Some("/orders"),
        ("addresses", _) => Some("/addresses"),
        ("cart", _) | ("checkout", _) => Some("/cart"),
        _ => None,
    }
}

/// Adds the list view to return to on not-found errors
pub async fn not_found_redirect(req: Request, next: Next) -> Response {
    let list = list_view_for(req.uri().path());
    let response = next.run(req).await;

    let message = response
        .extensions()
        .get::<NotFoundMessage>()
        .map(|m| m.0.clone());
    match (list, message) {
        (Some(list), Some(message)) => error::not_found_response(&message, list),
        _ => response,
    }
}
