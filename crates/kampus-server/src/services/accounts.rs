//! Accounts (register, login, own profile) and public user profiles.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{
    MAX_BIO_CHARS, MAX_NAME_CHARS, MAX_PHONE_CHARS, MAX_SHORT_TEXT_CHARS,
};
use kampus_shared::error::{optional_text, require_text};
use kampus_shared::trust::trust_score;
use kampus_shared::types::{ProductStatus, Role};
use kampus_store::columns::now;
use kampus_store::{Database, NewUser, Product, ProfileUpdate, StoreError, User};

use crate::auth::verify_password;
use crate::error::{or_not_found, ServerError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "University is required"))]
    pub university: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[validate(length(max = 15, message = "Phone must be at most 15 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Login {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[validate(length(max = 50, message = "Name must be at most 50 characters"))]
    pub name: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    #[validate(length(max = 15, message = "Phone must be at most 15 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 300, message = "Bio must be at most 300 characters"))]
    pub bio: Option<String>,
}

/// What another user sees on a profile page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(flatten)]
    pub user: User,
    pub trust_score: u8,
    pub active_products_count: u64,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account. `password_hash` is computed by the caller so that
/// hashing happens outside the database lock.
pub fn register(db: &Database, input: &Register, password_hash: String) -> Result<User, ServerError> {
    let email = normalize_email(&input.email);
    let new = NewUser {
        name: require_text("name", &input.name, MAX_NAME_CHARS)?,
        email: email.clone(),
        password_hash,
        phone: optional_text("phone", input.phone.as_deref(), MAX_PHONE_CHARS)?,
        university: require_text("university", &input.university, MAX_SHORT_TEXT_CHARS)?,
        department: require_text("department", &input.department, MAX_SHORT_TEXT_CHARS)?,
        role: Role::User,
    };

    if db.find_user_by_email(&email)?.is_some() {
        return Err(duplicate_email());
    }
    let user = db.create_user(&new).map_err(|e| match e {
        StoreError::Conflict => duplicate_email(),
        other => other.into(),
    })?;

    tracing::info!(user = %user.id, "Account registered");
    Ok(user)
}

fn duplicate_email() -> ServerError {
    ServerError::BadRequest("User already exists with this email".into())
}

/// Check credentials and record the login. Unknown email and wrong password
/// are indistinguishable to the caller.
pub fn login(db: &Database, input: &Login) -> Result<User, ServerError> {
    let invalid = || ServerError::Unauthorized("Invalid email or password".into());

    let user = db
        .find_user_by_email(&normalize_email(&input.email))?
        .ok_or_else(invalid)?;
    if !verify_password(&input.password, &user.password_hash) {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(ServerError::Unauthorized("Account has been deactivated".into()));
    }

    let at = now();
    db.touch_last_active(user.id, at)?;
    tracing::debug!(user = %user.id, "Login");
    Ok(User { last_active: at, ..user })
}

pub fn profile(db: &Database, caller: Uuid) -> Result<User, ServerError> {
    db.get_user(caller).map_err(or_not_found("User"))
}

/// Apply the supplied fields; blank or missing fields are left unchanged.
pub fn update_profile(db: &Database, caller: Uuid, input: &UpdateProfile) -> Result<User, ServerError> {
    let update = ProfileUpdate {
        name: optional_text("name", input.name.as_deref(), MAX_NAME_CHARS)?,
        university: optional_text("university", input.university.as_deref(), MAX_SHORT_TEXT_CHARS)?,
        department: optional_text("department", input.department.as_deref(), MAX_SHORT_TEXT_CHARS)?,
        phone: optional_text("phone", input.phone.as_deref(), MAX_PHONE_CHARS)?,
        bio: optional_text("bio", input.bio.as_deref(), MAX_BIO_CHARS)?,
    };
    db.update_user_profile(caller, &update)
        .map_err(or_not_found("User"))
}

pub fn public_profile(db: &Database, user_id: Uuid) -> Result<PublicProfile, ServerError> {
    let user = db.get_user(user_id).map_err(or_not_found("User"))?;
    let active_products_count =
        db.count_products_by_seller(user_id, Some(ProductStatus::Active))?;
    Ok(PublicProfile {
        trust_score: trust_score(&user.trust_inputs(), Utc::now()),
        active_products_count,
        user,
    })
}

/// A user's active listings, newest first.
pub fn user_products(db: &Database, user_id: Uuid) -> Result<Vec<Product>, ServerError> {
    if !db.user_exists(user_id)? {
        return Err(ServerError::NotFound("User not found".into()));
    }
    Ok(db.products_by_seller(user_id, Some(ProductStatus::Active))?)
}
