//! User API management

use std::ops::Deref;

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::client_ip::ClientIp;
use crate::password::hash;
use crate::password::verify;
use crate::storage::AuditEntry;
use crate::storage::ChangePasswordValues;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::users::User;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;
use super::request::parse_email;
use super::request::parse_password;
use super::request::parse_username;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user ID
    pub id: i64,

    /// The username
    pub username: String,

    /// The email address
    pub email: String,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Register form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Username of the new user
    username: String,
    /// Email address of the new user
    email: String,
    /// Password of the new user
    password: String,
}

/// Register a new user
///
/// Open to the outside world, no token needed
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "ada", "email": "ada@example.com", "password": "Verysecret1" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": 1, "username": "ada", "email": "ada@example.com" } }
/// ```
pub async fn register<S: Storage>(
    Extension(storage): Extension<S>,
    client_ip: Option<ClientIp>,
    Form(form): Form<RegisterForm>,
) -> Result<Success<UserResponse>, Error> {
    let username = parse_username(&form.username)?;
    let email = parse_email(&form.email)?;
    let password = parse_password(&form.password)?;

    let user = storage
        .find_single_user_by_username(&username)
        .await
        .map_err(Error::internal_server_error)?;

    if user.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let hashed_password = hash(&password);

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        username: &username,
        email: &email,
        hashed_password: &hashed_password,
    };

    let user = storage
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    // there is no current user yet, the new user is its own audit actor
    let audit_result = storage
        .register_audit_trail(
            &user,
            &AuditEntry::CreateUser(&user),
            client_ip.map(|client_ip| client_ip.ip_address).as_ref(),
        )
        .await;

    if let Err(err) = audit_result {
        tracing::error!("Could register audit trail entry: {err}");
    }

    Ok(Success::created(UserResponse::from_user(user)))
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "ada", "password": "Verysecret1" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "type": "Bearer", "access_token": "some token" } }
/// ```
pub async fn token<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    if let Some(user) = user {
        if verify(&user.hashed_password, &form.password) {
            let token = generate_token(&jwt_keys, &user)?;

            Ok(Success::ok(token))
        } else {
            Err(Error::bad_request("Invalid user"))
        }
    } else {
        Err(Error::bad_request("Invalid user"))
    }
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": 1, "username": "ada", "email": "ada@example.com" } }
/// ```
pub async fn me<S: Storage>(
    current_user: CurrentUser<S>,
) -> Result<Success<UserResponse>, Error> {
    let user = current_user.deref().clone();

    Ok(Success::ok(UserResponse::from_user(user)))
}

/// Change password form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    /// Current password for verification
    current_password: String,
    /// New password
    password: String,
}

/// Change the password of the current user
///
/// Changing your password will invalidate your current access token, the response carries a fresh
/// one
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "currentPassword": "Verysecret1", "password": "Veryverysecret1" }' \
///     http://localhost:6000/api/users/me/password
/// ```
///
/// Response
/// ```json
/// { "data": { "type": "Bearer", "access_token": "some token" } }
/// ```
pub async fn change_password<S: Storage>(
    audit_trail: AuditTrail<S>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Success<Token>, Error> {
    let user = current_user.deref().clone();

    if !verify(&user.hashed_password, &form.current_password) {
        return Err(Error::bad_request("Invalid password"));
    }

    let password = parse_password(&form.password)?;
    let hashed_password = hash(&password);

    let values = ChangePasswordValues {
        session_id: &Uuid::new_v4(),
        hashed_password: &hashed_password,
    };

    let updated_user = storage
        .change_password(&user, &values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail
        .register(AuditEntry::ChangePassword(&user))
        .await;

    let token = generate_token(&jwt_keys, &updated_user)?;

    Ok(Success::ok(token))
}
