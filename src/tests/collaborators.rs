use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_collaborators() {
    let mut app = helper::setup_test_app().await;

    // setup
    let user_ada = helper::register(&mut app, "ada").await;
    let token_ada = helper::login_with_password(&mut app, "ada", "Verysecret1").await;

    let user_grace = helper::register(&mut app, "grace").await;
    let token_grace = helper::login_with_password(&mut app, "grace", "Verysecret1").await;

    let (_, note, _) =
        helper::maybe_create_note(&mut app, &token_ada, "Groceries", "Apples", "Green").await;
    let note = note.unwrap();

    // grace has no notes
    let (status_code, notes) = helper::list_notes(&mut app, &token_grace).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Vec::<helper::Note>::new(), notes.unwrap());

    // share the note with grace
    let (status_code, collaborator, _) =
        helper::maybe_create_collaborator(&mut app, &token_ada, note.id, user_grace.id, "read_only")
            .await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert!(collaborator.is_some());
    let collaborator = collaborator.unwrap();
    assert_eq!(note.id, collaborator.note);
    assert_eq!(user_grace.id, collaborator.collaborator);
    assert_eq!("read_only".to_string(), collaborator.access_type);

    // the note shows up in the list of grace
    let (status_code, notes) = helper::list_notes(&mut app, &token_grace).await;
    assert_eq!(StatusCode::OK, status_code);
    let notes = notes.unwrap();
    assert_eq!(1, notes.len());
    assert_eq!(note.id, notes[0].id);
    assert_eq!(user_ada.id, notes[0].user_id);

    // share the note with grace again
    let (status_code, _, error) =
        helper::maybe_create_collaborator(&mut app, &token_ada, note.id, user_grace.id, "read_only")
            .await;
    assert_eq!(StatusCode::CONFLICT, status_code);
    assert_eq!(Some("User is already a collaborator".to_string()), error);

    // share the note with its owner
    let (status_code, _, error) =
        helper::maybe_create_collaborator(&mut app, &token_ada, note.id, user_ada.id, "read_only")
            .await;
    assert_eq!(StatusCode::CONFLICT, status_code);
    assert_eq!(Some("Can not share a note with yourself".to_string()), error);

    // share the note with an unknown user
    let (status_code, _, error) =
        helper::maybe_create_collaborator(&mut app, &token_ada, note.id, 4242, "read_only").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("User not found".to_string()), error);

    // only the owner can share a note
    let (status_code, _, error) =
        helper::maybe_create_collaborator(&mut app, &token_grace, note.id, user_grace.id, "read_only")
            .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);

    // stop sharing the note
    let (status_code, _) =
        helper::myabe_delete_collaborator(&mut app, &token_ada, note.id, user_grace.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    // the note is gone from the list of grace
    let (status_code, notes) = helper::list_notes(&mut app, &token_grace).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Vec::<helper::Note>::new(), notes.unwrap());

    // stop sharing the note again, a no-op
    let (status_code, _) =
        helper::myabe_delete_collaborator(&mut app, &token_ada, note.id, user_grace.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);
}

#[tokio::test]
async fn test_collaborator_access_types() {
    let mut app = helper::setup_test_app().await;

    // setup
    let token_ada = helper::register_and_login(&mut app, "ada").await;
    let user_grace = helper::register(&mut app, "grace").await;

    let (_, note, _) =
        helper::maybe_create_note(&mut app, &token_ada, "Groceries", "Apples", "Green").await;
    let note = note.unwrap();

    // grant write access
    let (status_code, collaborator, _) = helper::maybe_create_collaborator(
        &mut app,
        &token_ada,
        note.id,
        user_grace.id,
        "read_write",
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(
        "read_write".to_string(),
        collaborator.unwrap().access_type
    );

    // an unknown access type is rejected
    let (status_code, _, error) =
        helper::maybe_create_collaborator(&mut app, &token_ada, note.id, user_grace.id, "owner")
            .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Data error".to_string()), error);
}
