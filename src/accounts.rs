//! Staff accounts: login verification, admin-created users and first-run
//! seeding.

use crate::auth::guard::{Action, Actor};
use crate::auth::password;
use crate::auth::roles::{Role, Roles};
use crate::auth::validate::{validate_password, validate_required, validate_username};
use crate::errors::AppError;
use crate::models::user::{NewUser, User, UserForm};
use crate::store::WorkflowStore;
use crate::workflow::Workflow;

/// Look up and verify credentials. `Ok(None)` for an unknown user or a
/// wrong password; the two are not distinguished.
pub async fn authenticate(
    store: &dyn WorkflowStore,
    username: &str,
    plain_password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = store.find_user_by_username(username.trim()).await? else {
        return Ok(None);
    };
    if password::verify_password(plain_password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Admin-only account creation.
pub async fn create_user(workflow: &Workflow, actor: &Actor, form: UserForm) -> Result<User, AppError> {
    workflow.authorize(actor, Action::ManageUsers, None).await?;

    let problem = validate_username(&form.username)
        .or_else(|| validate_password(&form.password))
        .or_else(|| validate_required(&form.display_name, "Display name", 100));
    if let Some(msg) = problem {
        return Err(AppError::Validation(msg));
    }
    if form.roles.is_empty() {
        return Err(AppError::Validation("At least one role is required".to_string()));
    }

    let new = NewUser {
        username: form.username.clone(),
        password_hash: password::hash_password(&form.password)?,
        display_name: form.display_name,
        roles: Roles(form.roles),
    };
    let user = workflow
        .store()
        .create_user(new)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Username '{}' is already taken", form.username.trim())))?;
    log::info!("User {} ({}) created by user {}", user.id, user.username, actor.user_id);
    Ok(user)
}

/// Demo accounts, one per workflow role.
const DEMO_USERS: [(&str, &str, Role); 6] = [
    ("budget", "Budget Officer", Role::Budget),
    ("accounting", "Accounting Officer", Role::Accounting),
    ("cashier", "Cashier", Role::Cashier),
    ("chief", "Division Chief", Role::Chief),
    ("rd", "Regional Director", Role::RegionalDirector),
    ("staff", "Scholarship Staff", Role::Staff),
];

/// Create the `admin` account on an empty user table, plus one account per
/// role when `demo` is set. Existing data is left alone.
pub async fn seed_users(store: &dyn WorkflowStore, admin_password: &str, demo: bool) -> Result<(), AppError> {
    if !store.list_users().await?.is_empty() {
        log::info!("Users already present, skipping seed");
        return Ok(());
    }

    let hash = password::hash_password(admin_password)?;
    store
        .create_user(NewUser {
            username: "admin".to_string(),
            password_hash: hash.clone(),
            display_name: "Administrator".to_string(),
            roles: Roles(vec![Role::Admin]),
        })
        .await?;

    if demo {
        for (username, display_name, role) in DEMO_USERS {
            store
                .create_user(NewUser {
                    username: username.to_string(),
                    password_hash: hash.clone(),
                    display_name: display_name.to_string(),
                    roles: Roles(vec![role]),
                })
                .await?;
        }
    }
    log::info!("Seeded users (demo accounts: {demo})");
    Ok(())
}
