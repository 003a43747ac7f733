//! API request helpers

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::Error;

/// Parse and validate a username
///
/// ```rust
/// let username = "some_user";
/// assert!(parse_username(username).is_ok())
/// ```
pub fn parse_username(username: &str) -> Result<String, Error> {
    if username.is_empty() {
        return Err(Error::bad_request("Username is required"));
    }

    for ch in username.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(Error::bad_request(
                "Username can only contain letters, numbers and underscores",
            ));
        }
    }

    Ok(username.to_string())
}

/// Parse and validate a password
///
/// Needs some length and variation, nothing fancy
pub fn parse_password(password: &str) -> Result<String, Error> {
    if password.chars().count() < 8 {
        return Err(Error::bad_request("Password needs at least 8 characters"));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(Error::bad_request("Password needs an uppercase letter"));
    }

    if !password.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(Error::bad_request("Password needs a number"));
    }

    Ok(password.to_string())
}

/// Parse and validate an email address
///
/// Only checks the rough shape, delivery is the real validation
pub fn parse_email(email: &str) -> Result<String, Error> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(Error::bad_request("Invalid email address"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(Error::bad_request("Invalid email address"));
    }

    Ok(email.to_string())
}

fn parse_json<J>(json: Result<Json<J>, JsonRejection>) -> Result<J, Error> {
    match json {
        Ok(Json(json)) => Ok(json),
        Err(err) => match err {
            JsonRejection::JsonDataError(err) => {
                Err(Error::bad_request("Data error").with_description(err))
            }
            JsonRejection::JsonSyntaxError(err) => Err(Error::bad_request("JSON syntax error")
                .with_description(std::error::Error::source(&err).expect("A valid source"))),
            JsonRejection::MissingJsonContentType(_err) => Err(Error::bad_request(
                "Missing `application/json` content type",
            )),
            JsonRejection::BytesRejection(err) => {
                Err(Error::bad_request("Invalid characters in JSON").with_description(err))
            }
            err => Err(Error::bad_request("Unknown JSON error").with_description(err)),
        },
    }
}

/// Wrapper for the JSON extractor
pub struct Form<F>(pub F);

impl<S, F> FromRequest<S> for Form<F>
where
    S: Send + Sync,
    F: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = Json::<F>::from_request(req, state).await;

        parse_json(json).map(Form)
    }
}

fn parse_path<P>(path: Result<Path<P>, PathRejection>) -> Result<P, Error> {
    match path {
        Ok(Path(path)) => Ok(path),
        Err(err) => match err {
            PathRejection::FailedToDeserializePathParams(err) => {
                Err(Error::bad_request("Invalid path parameter").with_description(err))
            }
            PathRejection::MissingPathParams(err) => {
                Err(Error::bad_request("Missing path parameter").with_description(err))
            }
            err => Err(Error::bad_request("Unknown path error").with_description(err)),
        },
    }
}

pub struct PathParameters<P>(pub P);

impl<S, P> FromRequestParts<S> for PathParameters<P>
where
    S: Send + Sync,
    P: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path = Path::<P>::from_request_parts(parts, state).await;

        parse_path(path).map(PathParameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_username() {
        let username = "some_user";
        assert_eq!(parse_username(username).unwrap(), username.to_string());

        let username = "Other1";
        assert_eq!(parse_username(username).unwrap(), username.to_string());

        let username = "";
        assert!(parse_username(username).is_err());

        let username = "some user";
        assert!(parse_username(username).is_err());

        let username = "some-user!";
        assert!(parse_username(username).is_err());
    }

    #[test]
    fn test_parse_password() {
        let password = "Verysecret1";
        assert!(parse_password(password).is_ok());

        let password = "Short1";
        assert!(parse_password(password).is_err());

        let password = "verysecret1";
        assert!(parse_password(password).is_err());

        let password = "Verysecret";
        assert!(parse_password(password).is_err());
    }

    #[test]
    fn test_parse_email() {
        let email = "someone@example.com";
        assert!(parse_email(email).is_ok());

        let email = "someone";
        assert!(parse_email(email).is_err());

        let email = "@example.com";
        assert!(parse_email(email).is_err());

        let email = "someone@example";
        assert!(parse_email(email).is_err());
    }
}
