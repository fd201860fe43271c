use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::User;

/// Resolves the bearer token to an active user. Token decode failures,
/// unknown subjects and missing headers all surface as a generic 401; an
/// unknown subject mid-session is deliberately not a 404, so responses never
/// reveal whether an account exists.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthenticated
        })?;

        let user = User::find_by_email(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                warn!("token subject no longer exists");
                ApiError::Unauthenticated
            })?;

        require_active(user).map(CurrentUser)
    }
}

/// Second-stage check after resolution; terminal for the request.
pub fn require_active(user: User) -> Result<User, ApiError> {
    if user.is_active {
        Ok(user)
    } else {
        Err(ApiError::InactiveAccount)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::ROLE_USER;
    use axum::http::Request;
    use time::OffsetDateTime;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_extraction() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let parts = parts_with_auth(Some("bearer abc"));
        assert_eq!(bearer_token(&parts), Some("abc"));

        let parts = parts_with_auth(Some("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&parts), None);

        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    fn user(active: bool) -> User {
        User {
            id: 1,
            email: "test@example.com".into(),
            password_hash: String::new(),
            full_name: None,
            role: ROLE_USER.into(),
            is_active: active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn require_active_passes_active_user() {
        assert!(require_active(user(true)).is_ok());
    }

    #[test]
    fn require_active_rejects_inactive_user() {
        assert!(matches!(
            require_active(user(false)),
            Err(ApiError::InactiveAccount)
        ));
    }
}
