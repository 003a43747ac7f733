//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;

pub use audit_trail::AuditTrail;
pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

use crate::cache::Cache;
use crate::storage::Storage;

mod audit_trail;
mod collaborators;
mod current_user;
mod labels;
mod notes;
mod request;
mod response;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage, C: Cache>() -> Router {
    let users = Router::new()
        .route("/token", post(users::token::<S>))
        .route("/", post(users::register::<S>))
        .route("/me", get(users::me::<S>))
        .route("/me/password", put(users::change_password::<S>));

    let notes = Router::new()
        .route("/", get(notes::list::<S, C>))
        .route("/", post(notes::create::<S, C>))
        .route("/archived", get(notes::list_archived::<S, C>))
        .route("/trashed", get(notes::list_trashed::<S, C>))
        .route("/{note}", get(notes::single::<S, C>))
        .route("/{note}", patch(notes::update::<S, C>))
        .route("/{note}", delete(notes::delete::<S, C>))
        .route("/{note}/archive", patch(notes::toggle_archive::<S, C>))
        .route("/{note}/trash", patch(notes::toggle_trash::<S, C>))
        .route("/{note}/collaborators", post(collaborators::create::<S, C>))
        .route(
            "/{note}/collaborators/{user}",
            delete(collaborators::delete::<S, C>),
        );

    let labels = Router::new()
        .route("/", get(labels::list::<S>))
        .route("/", post(labels::create::<S>))
        .route("/{label}", patch(labels::update::<S>))
        .route("/{label}", delete(labels::delete::<S>));

    Router::new()
        .nest("/users", users)
        .nest("/notes", notes)
        .nest("/labels", labels)
}
