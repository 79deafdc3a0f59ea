use actix_session::Session;

use super::guard::Actor;
use super::roles::Roles;
use crate::errors::AppError;

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn get_username(session: &Session) -> Result<String, String> {
    match session.get::<String>("username") {
        Ok(Some(username)) => Ok(username),
        Ok(None) => Err("No username in session".to_string()),
        Err(e) => Err(format!("Session error: {}", e)),
    }
}

pub fn get_roles(session: &Session) -> Result<Roles, String> {
    match session.get::<String>("roles") {
        Ok(Some(csv)) => Ok(Roles::from_csv(&csv)),
        Ok(None) => Err("No roles in session".to_string()),
        Err(e) => Err(format!("Session error: {}", e)),
    }
}

/// Store the authenticated identity after a successful login.
pub fn sign_in(session: &Session, user_id: i64, username: &str, roles: &Roles) -> Result<(), AppError> {
    session.renew();
    session
        .insert("user_id", user_id)
        .and_then(|_| session.insert("username", username))
        .and_then(|_| session.insert("roles", roles.to_csv()))
        .map_err(|e| AppError::Session(e.to_string()))
}

/// Build the acting user from the session; `Unauthenticated` if absent.
pub fn require_actor(session: &Session) -> Result<Actor, AppError> {
    let user_id = get_user_id(session).ok_or(AppError::Unauthenticated)?;
    let username = get_username(session).map_err(AppError::Session)?;
    let roles = get_roles(session).map_err(AppError::Session)?;
    Ok(Actor {
        user_id,
        username,
        roles,
    })
}
