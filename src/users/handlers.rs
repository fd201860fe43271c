use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::CurrentUser, password::hash_password},
    error::{ApiError, ApiResult},
    policy::{ensure, Action, Target},
    state::AppState,
    users::{
        dto::{DeletedResponse, UpdateUserRequest, UserResponse},
        repo::{is_unique_violation, UserChanges},
        repo_types::User,
    },
    validate::{is_valid_email, MIN_PASSWORD_LEN},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(read_me).patch(update_me).delete(delete_me),
        )
        .route("/users/:id", get(read_user_by_id))
        .route("/users", get(list_users))
        .route("/users/", get(list_users))
}

#[instrument(skip_all)]
async fn read_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip_all, fields(user_id))]
async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    tracing::Span::current().record("user_id", user.id);

    let mut changes = UserChanges {
        full_name: payload.full_name,
        is_active: payload.is_active,
        ..Default::default()
    };

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::BadRequest("Invalid email".into()));
        }
        if email != user.email && User::email_taken_by_other(&state.db, &email, user.id).await? {
            warn!("email already registered");
            return Err(ApiError::BadRequest("Email already registered".into()));
        }
        changes.email = Some(email);
    }

    if let Some(password) = payload.password {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::BadRequest("Password too short".into()));
        }
        changes.password_hash = Some(hash_password(&password)?);
    }

    let updated = match User::apply_update(&state.db, user.id, changes).await {
        Ok(u) => u,
        // Concurrent update can still hit the unique constraint on email.
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Email already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!("profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip_all)]
async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<DeletedResponse>> {
    User::delete(&state.db, user.id).await?;
    info!(user_id = user.id, "user deleted");
    Ok(Json(DeletedResponse {
        message: "User deleted successfully".into(),
    }))
}

#[instrument(skip(state, actor))]
async fn read_user_by_id(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    ensure(&actor, Action::Read, Target::User(user.id))?;
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    ensure(&actor, Action::List, Target::UsersCollection)?;

    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
