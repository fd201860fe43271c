use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::UserResponse,
        repo::is_unique_violation,
        repo_types::{User, ROLE_ADMIN, ROLE_USER},
    },
    validate::{is_valid_email, MIN_PASSWORD_LEN},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::BadRequest(
            "The user with this email already exists in the system".into(),
        ));
    }

    let role = elevation_role(
        payload.admin_token.as_deref(),
        &state.config.admin_registration_token,
    )?;
    let hash = hash_password(&payload.password)?;

    let user = match User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.full_name.as_deref(),
        role,
    )
    .await
    {
        Ok(u) => u,
        // Lost the race against a concurrent registration for the same email.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "duplicate email on insert");
            return Err(ApiError::BadRequest(
                "The user with this email already exists in the system".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, email = %user.email, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Elevation rule: absent or empty tokens always register a normal user;
/// only a non-empty, non-matching token is rejected.
fn elevation_role(admin_token: Option<&str>, secret: &str) -> Result<&'static str, ApiError> {
    match admin_token {
        None => Ok(ROLE_USER),
        Some("") => Ok(ROLE_USER),
        Some(t) if t == secret => Ok(ROLE_ADMIN),
        Some(_) => Err(ApiError::BadRequest(
            "Invalid admin registration token".into(),
        )),
    }
}

#[instrument(skip(state, form))]
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let email = form
        .identifier()
        .ok_or(ApiError::Unauthenticated)?
        .trim()
        .to_lowercase();

    // Unknown email and wrong password are indistinguishable in the response.
    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) if verify_password(&form.password, &u.password_hash) => u,
        _ => {
            warn!(email = %email, "login rejected");
            return Err(ApiError::Unauthenticated);
        }
    };

    if !user.is_active {
        return Err(ApiError::InactiveAccount);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user.email)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access_token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_empty_elevation_token_registers_normal_user() {
        assert_eq!(elevation_role(None, "SECRET").unwrap(), ROLE_USER);
        assert_eq!(elevation_role(Some(""), "SECRET").unwrap(), ROLE_USER);
    }

    #[test]
    fn matching_elevation_token_registers_admin() {
        assert_eq!(elevation_role(Some("SECRET"), "SECRET").unwrap(), ROLE_ADMIN);
    }

    #[test]
    fn non_matching_elevation_token_is_rejected() {
        assert!(matches!(
            elevation_role(Some("invalid_token"), "SECRET"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn empty_token_never_elevates_even_with_empty_secret() {
        assert_eq!(elevation_role(Some(""), "").unwrap(), ROLE_USER);
        assert_eq!(elevation_role(None, "").unwrap(), ROLE_USER);
    }
}
