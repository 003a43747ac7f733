use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_users() {
    let mut app = helper::setup_test_app().await;

    // register a user
    let (status_code, user, _) = helper::maybe_register(&mut app, "ada", "Verysecret1").await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert!(user.is_some());
    let user = user.unwrap();
    assert_eq!("ada".to_string(), user.username);
    assert_eq!("ada@example.com".to_string(), user.email);

    // register the same username again
    let (status_code, _, error) = helper::maybe_register(&mut app, "ada", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("User already exists".to_string()), error);

    // login
    let access_token = helper::login_with_password(&mut app, "ada", "Verysecret1").await;

    // fetch current user
    let (status_code, current_user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(current_user.is_some());
    let current_user = current_user.unwrap();
    assert_eq!(user.id, current_user.id);
    assert_eq!("ada".to_string(), current_user.username);
}

#[tokio::test]
async fn test_register_validation() {
    let mut app = helper::setup_test_app().await;

    // empty username
    let (status_code, _, error) = helper::maybe_register(&mut app, "", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Username is required".to_string()), error);

    // username with strange characters
    let (status_code, _, error) = helper::maybe_register(&mut app, "ada?!", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Username can only contain letters, numbers and underscores".to_string()),
        error
    );

    // short password
    let (status_code, _, error) = helper::maybe_register(&mut app, "ada", "Short1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Password needs at least 8 characters".to_string()),
        error
    );

    // password without an uppercase letter
    let (status_code, _, error) = helper::maybe_register(&mut app, "ada", "verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Password needs an uppercase letter".to_string()),
        error
    );

    // password without a number
    let (status_code, _, error) = helper::maybe_register(&mut app, "ada", "Verysecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Password needs a number".to_string()), error);

    // email without a domain
    let (status_code, _, error) =
        helper::maybe_register_with_email(&mut app, "ada", "nodomain", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid email address".to_string()), error);

    // email without a dot in the domain
    let (status_code, _, error) =
        helper::maybe_register_with_email(&mut app, "ada", "ada@example", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid email address".to_string()), error);

    // email without a local part
    let (status_code, _, error) =
        helper::maybe_register_with_email(&mut app, "ada", "@example.com", "Verysecret1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid email address".to_string()), error);

    // nothing was registered along the way
    let (status_code, user, _) = helper::maybe_register(&mut app, "ada", "Verysecret1").await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert!(user.is_some());
}
