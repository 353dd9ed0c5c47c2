use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;

use kampus_store::User;

use super::{created, ok, ok_with, ApiResult, AppState, Created, Payload};
use crate::auth::{hash_password, AuthUser};
use crate::error::ServerError;
use crate::services::accounts::{self, Login, Register, UpdateProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/logout", post(logout))
}

#[derive(Serialize)]
struct Session {
    token: String,
    user: User,
}

async fn register(State(state): State<AppState>, Payload(input): Payload<Register>) -> Created<Session> {
    if !state.config.registration_open {
        return Err(ServerError::Forbidden("Registration is closed on this instance".into()));
    }

    let password = input.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServerError::Internal(format!("hashing task failed: {e}")))??;

    let user = {
        let db = state.db.lock().await;
        accounts::register(&db, &input, password_hash)?
    };
    let token = state.tokens.issue(user.id)?;
    created("Registration successful", Session { token, user })
}

async fn login(State(state): State<AppState>, Payload(input): Payload<Login>) -> ApiResult<Session> {
    let user = {
        let db = state.db.lock().await;
        accounts::login(&db, &input)?
    };
    let token = state.tokens.issue(user.id)?;
    ok_with("Login successful", Session { token, user })
}

async fn me(State(state): State<AppState>, caller: AuthUser) -> ApiResult<User> {
    let db = state.db.lock().await;
    ok(accounts::profile(&db, caller.id)?)
}

async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(input): Payload<UpdateProfile>,
) -> ApiResult<User> {
    let db = state.db.lock().await;
    ok_with("Profile updated", accounts::update_profile(&db, caller.id, &input)?)
}

/// Tokens are stateless; the client discards its copy.
async fn logout(caller: AuthUser) -> ApiResult<()> {
    tracing::debug!(user = %caller.id, "Logout");
    ok_with("Logged out", ())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::testing::TestApp;
    use crate::config::ServerConfig;

    fn registration(email: &str) -> serde_json::Value {
        json!({
            "name": "Deniz Kaya",
            "email": email,
            "password": "secret1",
            "university": "ODTU",
            "department": "Physics",
        })
    }

    #[tokio::test]
    async fn register_login_me() {
        let app = TestApp::new();

        let (status, body) = app.post("/api/auth/register", None, registration("Deniz@Uni.edu")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["email"], "deniz@uni.edu");
        assert!(body["data"]["user"].get("passwordHash").is_none());

        let (status, _) = app.post("/api/auth/register", None, registration("DENIZ@uni.edu")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post(
                "/api/auth/login",
                None,
                json!({ "email": "deniz@uni.edu", "password": "secret1" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = app.get("/api/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Deniz Kaya");

        let (status, body) = app
            .post(
                "/api/auth/login",
                None,
                json!({ "email": "deniz@uni.edu", "password": "wrong!" }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected() {
        let app = TestApp::new();
        let mut bad = registration("nope");
        bad["password"] = json!("123");
        let (status, body) = app.post("/api/auth/register", None, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = app.post("/api/auth/login", None, json!({ "email": 5 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn closed_registration() {
        let app = TestApp::with_config(ServerConfig {
            registration_open: false,
            ..ServerConfig::default()
        });
        let (status, _) = app.post("/api/auth/register", None, registration("a@uni.edu")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn token_rules() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, _) = app.get("/api/auth/me", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (user, token) = app.user("Ayse", kampus_shared::types::Role::User).await;
        app.state.db.lock().await.set_user_active(user.id, false).unwrap();
        let (status, body) = app.get("/api/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Account has been deactivated");
    }

    #[tokio::test]
    async fn profile_update() {
        let app = TestApp::new();
        let (_, token) = app.user("Ayse", kampus_shared::types::Role::User).await;
        let (status, body) = app
            .put(
                "/api/auth/profile",
                Some(&token),
                Some(json!({ "bio": "Math student", "phone": "05551234567" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bio"], "Math student");
        assert_eq!(body["message"], "Profile updated");

        let (status, body) = app.post("/api/auth/logout", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::Value::Null);
    }
}
