mod collaborators;
mod users;
