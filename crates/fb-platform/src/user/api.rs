//! Users API
//!
//! Registration, login, and account management endpoints. Admin-only
//! routes gate on the role stored in the user document, never on the
//! token claim alone.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::{AuthService, PasswordService};
use crate::shared::api_common::SuccessResponse;
use crate::shared::authorization::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::tsid::TsidGenerator;
use crate::shared::validate;
use crate::user::entity::{Role, User};
use crate::user::repository::UserRepository;

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Change password request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Profile update request; only supplied fields change
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Public user representation. The password hash never leaves the store
/// layer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            profile: u.profile,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Token + user payload returned by register and login
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Users list response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub user_repo: Arc<UserRepository>,
    pub password_service: Arc<PasswordService>,
    pub auth_service: Arc<AuthService>,
}

/// Duplicate-account decision over the two uniqueness lookups. Username
/// collisions win when both fields collide, so the reported field is
/// deterministic.
fn check_unique_credentials(
    username: &str,
    email: &str,
    existing_username: Option<&User>,
    existing_email: Option<&User>,
) -> Result<(), PlatformError> {
    if existing_username.is_some() {
        return Err(PlatformError::duplicate("username", username));
    }
    if existing_email.is_some() {
        return Err(PlatformError::duplicate("email", email));
    }
    Ok(())
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate username/email")
    )
)]
pub async fn register(
    State(state): State<UsersState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), PlatformError> {
    validate::validate_registration(&req.username, &req.email, &req.password)?;

    let by_username = state.user_repo.find_by_username(&req.username).await?;
    let by_email = state.user_repo.find_by_email(&req.email).await?;
    check_unique_credentials(&req.username, &req.email, by_username.as_ref(), by_email.as_ref())?;

    let password_hash = state.password_service.hash_password(&req.password)?;
    let user = User::new(&req.username, &req.email, password_hash);
    state.user_repo.insert(&user).await?;

    let token = state.auth_service.generate_token(&user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No account for that email")
    )
)]
pub async fn login(
    State(state): State<UsersState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), PlatformError> {
    validate::validate_login(&req.email, &req.password)?;

    // An unknown email is reported distinctly from a wrong password.
    let user = state
        .user_repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &req.email))?;

    if !state
        .password_service
        .verify_password(&req.password, &user.password)?
    {
        tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(PlatformError::InvalidCredentials);
    }

    let token = state.auth_service.generate_token(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Details of the authenticated user
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn current_user(
    State(state): State<UsersState>,
    auth: Authenticated,
) -> Result<Json<UserResponse>, PlatformError> {
    let user = state
        .user_repo
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &auth.user_id))?;

    Ok(Json(user.into()))
}

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/allusers",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = UserListResponse),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    auth: Authenticated,
) -> Result<Json<UserListResponse>, PlatformError> {
    checks::require_admin(&auth)?;

    let users: Vec<UserResponse> = state
        .user_repo
        .find_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    let total = users.len();
    Ok(Json(UserListResponse { users, total }))
}

/// Delete a user (admin). Votes and comments authored by the user stay
/// in place; their username reads back as null afterwards.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = SuccessResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    checks::require_admin(&auth)?;

    if !TsidGenerator::is_valid(&id) {
        return Err(PlatformError::invalid_identifier(&id));
    }

    if !state.user_repo.delete(&id).await? {
        return Err(PlatformError::not_found("User", &id));
    }

    tracing::info!(user_id = %id, admin_id = %auth.user_id, "User deleted");
    Ok(Json(SuccessResponse::with_message("User deleted")))
}

/// Promote a user to admin (admin)
#[utoipa::path(
    put,
    path = "/makeAdmin/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn make_admin(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, PlatformError> {
    checks::require_admin(&auth)?;

    if !TsidGenerator::is_valid(&id) {
        return Err(PlatformError::invalid_identifier(&id));
    }

    let user = state
        .user_repo
        .set_role(&id, Role::Admin)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &id))?;

    tracing::info!(user_id = %id, admin_id = %auth.user_id, "User promoted to admin");
    Ok(Json(user.into()))
}

/// Change the authenticated user's password
#[utoipa::path(
    put,
    path = "/change-password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 401, description = "Current password wrong or not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<UsersState>,
    auth: Authenticated,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let user = state
        .user_repo
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &auth.user_id))?;

    if !state
        .password_service
        .verify_password(&req.current_password, &user.password)?
    {
        return Err(PlatformError::InvalidCredentials);
    }

    let password_hash = state.password_service.hash_password(&req.new_password)?;
    state.user_repo.update_password(&user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(SuccessResponse::with_message("Password changed")))
}

/// Update the authenticated user's username and/or email
#[utoipa::path(
    put,
    path = "/update-profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or duplicate username/email"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<UsersState>,
    auth: Authenticated,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, PlatformError> {
    if let Some(ref username) = req.username {
        validate::validate_username(username)?;
        if username != &auth.username
            && state.user_repo.find_by_username(username).await?.is_some()
        {
            return Err(PlatformError::duplicate("username", username));
        }
    }
    if let Some(ref email) = req.email {
        validate::validate_email(email)?;
        if email != &auth.email && state.user_repo.find_by_email(email).await?.is_some() {
            return Err(PlatformError::duplicate("email", email));
        }
    }

    let user = state
        .user_repo
        .update_profile(&auth.user_id, req.username.as_deref(), req.email.as_deref())
        .await?
        .ok_or_else(|| PlatformError::not_found("User", &auth.user_id))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> User {
        User::new("alice", "alice@example.com", "$argon2id$stub")
    }

    #[test]
    fn second_registration_with_same_username_is_a_duplicate() {
        let taken = existing();
        let err = check_unique_credentials("alice", "other@example.com", Some(&taken), None)
            .unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { ref field, .. } if field == "username"));
    }

    #[test]
    fn second_registration_with_same_email_is_a_duplicate() {
        let taken = existing();
        let err = check_unique_credentials("someoneelse", "alice@example.com", None, Some(&taken))
            .unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { ref field, .. } if field == "email"));
    }

    #[test]
    fn username_collision_is_reported_when_both_fields_collide() {
        let taken = existing();
        let err =
            check_unique_credentials("alice", "alice@example.com", Some(&taken), Some(&taken))
                .unwrap_err();
        assert!(matches!(err, PlatformError::Duplicate { ref field, .. } if field == "username"));
    }

    #[test]
    fn fresh_credentials_pass() {
        assert!(check_unique_credentials("newuser", "new@example.com", None, None).is_ok());
    }
}

/// Create users router
pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(current_user))
        .routes(routes!(list_users))
        .routes(routes!(delete_user))
        .routes(routes!(make_admin))
        .routes(routes!(change_password))
        .routes(routes!(update_profile))
        .with_state(state)
}
