//! Sign-in, profile and address book

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use common::{
    models::{Address, AddressInput, Credentials, Registration},
    validation,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{RefreshRequest, RefreshResponse},
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_credentials(&credentials)?;

    let auth = state.backend.login(&credentials).await.map_err(|e| match ApiError::from(e) {
        // The backend answers bad credentials with 401
        ApiError::Unauthorized => ApiError::BadRequest("Invalid username or password".to_string()),
        other => other,
    })?;

    info!(user_id = auth.user.id, "User logged in");
    Ok(Json(auth))
}

pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_registration(&registration)?;

    let auth = state.backend.register(&registration).await?;
    info!(user_id = auth.user.id, "User registered");
    Ok((StatusCode::CREATED, Json(auth)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = state.backend.refresh_token(&payload.token).await?;
    Ok(Json(RefreshResponse { token }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.backend.profile(&user.token).await?))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.backend.user_addresses(&user.token, user.id).await?))
}

pub async fn create_address(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<AddressInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_address(&input)?;
    let submission = state.forms.begin(user.owner(), "address")?;

    let created = state
        .backend
        .create_address(&user.token, &Address::from(input))
        .await?;
    submission.succeed();

    Ok((StatusCode::CREATED, Json(created)))
}

/// Reject ids outside the caller's address book
async fn ensure_owned(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<()> {
    let addresses = state.backend.user_addresses(&user.token, user.id).await?;
    if addresses.iter().any(|a| a.id == Some(id)) {
        Ok(())
    } else {
        Err(ApiError::NotFound("Address not found".to_string()))
    }
}

pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<AddressInput>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_address(&input)?;
    let submission = state.forms.begin(user.owner(), "address")?;
    ensure_owned(&state, &user, id).await?;

    let mut address = Address::from(input);
    address.id = Some(id);
    let updated = state.backend.update_address(&user.token, id, &address).await?;
    submission.succeed();

    Ok(Json(updated))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    ensure_owned(&state, &user, id).await?;
    state.backend.delete_address(&user.token, id).await?;
    info!(user_id = user.id, address_id = id, "Address deleted");

    Ok(StatusCode::NO_CONTENT)
}
