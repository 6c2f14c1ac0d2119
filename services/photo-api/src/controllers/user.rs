//! Account operations: registration, login, profile update and removal

use std::sync::Arc;

use auth::{
    JwtService,
    password::{hash_password, verify_password},
    validation::{validate_email, validate_password, validate_username},
};
use common::error::DatabaseError;
use tracing::{info, warn};
use uuid::Uuid;

use super::internal;
use crate::{
    error::{ApiError, ApiResult},
    identity::RequestIdentity,
    models::{
        LoginRequest, RegisterRequest, UpdateUserRequest, non_blank,
        user::{NewUser, UserChanges},
    },
    repositories::UserRepository,
    storage::PhotoStorage,
};

const DUPLICATE_USER: &str = "user with provided username/email already exists";
const BAD_CREDENTIALS: &str = "incorrect email/password";

fn translate_write(operation: &str, err: DatabaseError) -> ApiError {
    if err.is_conflict() {
        ApiError::Conflict(DUPLICATE_USER.to_string())
    } else {
        internal(operation, err)
    }
}

fn required(value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err("can't be empty".to_string())
    } else {
        Ok(())
    }
}

/// User controller
#[derive(Clone)]
pub struct UserController {
    users: Arc<dyn UserRepository>,
    storage: PhotoStorage,
    jwt: Arc<JwtService>,
}

impl UserController {
    pub fn new(users: Arc<dyn UserRepository>, storage: PhotoStorage, jwt: Arc<JwtService>) -> Self {
        Self {
            users,
            storage,
            jwt,
        }
    }

    /// Create an account and return its id
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<Uuid> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        ApiError::from_checks(vec![
            ("username", validate_username(&username)),
            ("email", validate_email(&email)),
            ("password", validate_password(&request.password)),
        ])?;

        let password_hash =
            hash_password(&request.password).map_err(|e| internal("Users [REGISTER]", e))?;

        let user = self
            .users
            .create(&NewUser {
                id: Uuid::new_v4(),
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| translate_write("Users [REGISTER]", e))?;

        info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Check credentials and issue a session token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<String> {
        let email = request.email.trim().to_lowercase();

        ApiError::from_checks(vec![
            ("email", validate_email(&email)),
            ("password", required(&request.password)),
        ])?;

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| internal("Users [LOGIN]", e))?
            .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        let valid = verify_password(&user.password_hash, &request.password)
            .map_err(|e| internal("Users [LOGIN]", e))?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let token = self
            .jwt
            .issue_token(user.id)
            .map_err(|e| internal("Users [LOGIN]", e))?;

        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Update the caller's profile
    ///
    /// The old/new password equality check runs on the plaintext values before
    /// the current password is verified against the stored hash.
    pub async fn update(&self, requester: &RequestIdentity, request: UpdateUserRequest) -> ApiResult<()> {
        let user_id = requester.require()?;

        let username = non_blank(request.username);
        let email = non_blank(request.email).map(|e| e.to_lowercase());
        let new_password = request.new_password.filter(|p| !p.is_empty());

        let mut checks = vec![("password", required(&request.password))];
        if let Some(username) = &username {
            checks.push(("username", validate_username(username)));
        }
        if let Some(email) = &email {
            checks.push(("email", validate_email(email)));
        }
        if let Some(new_password) = &new_password {
            checks.push(("new_password", validate_password(new_password)));
        }
        ApiError::from_checks(checks)?;

        if new_password.as_deref() == Some(request.password.as_str()) {
            return Err(ApiError::BadRequest(
                "old and new password can't be the same".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| internal("Users [UPDATE]", e))?
            .ok_or(ApiError::NotAllowed)?;

        let valid = verify_password(&user.password_hash, &request.password)
            .map_err(|e| internal("Users [UPDATE]", e))?;
        if !valid {
            return Err(ApiError::Unauthorized("invalid password".to_string()));
        }

        let password_hash = match &new_password {
            Some(password) => {
                Some(hash_password(password).map_err(|e| internal("Users [UPDATE]", e))?)
            }
            None => None,
        };

        let changes = UserChanges {
            username,
            email,
            password_hash,
        };

        let updated = self
            .users
            .update(user_id, &changes)
            .await
            .map_err(|e| translate_write("Users [UPDATE]", e))?;
        if !updated {
            return Err(ApiError::NotAllowed);
        }

        info!(user_id = %user_id, "User updated");
        Ok(())
    }

    /// Remove the caller's files, then the account and its photo rows
    pub async fn delete(&self, requester: &RequestIdentity) -> ApiResult<()> {
        let user_id = requester.require()?;

        self.storage
            .remove_owner(user_id)
            .await
            .map_err(|e| internal("Users [DELETE]", e))?;

        let deleted = self
            .users
            .delete(user_id)
            .await
            .map_err(|e| internal("Users [DELETE]", e))?;
        if !deleted {
            return Err(ApiError::NotAllowed);
        }

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
