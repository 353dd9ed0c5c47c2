use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use kampus_store::Product;

use super::{ok, parse_id, ApiResult, AppState};
use crate::services::accounts::{self, PublicProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(profile))
        .route("/:id/products", get(products))
}

async fn profile(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PublicProfile> {
    let id = parse_id(&id, "user")?;
    let db = state.db.lock().await;
    ok(accounts::public_profile(&db, id)?)
}

async fn products(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Product>> {
    let id = parse_id(&id, "user")?;
    let db = state.db.lock().await;
    ok(accounts::user_products(&db, id)?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::testing::TestApp;
    use kampus_shared::types::Role;

    #[tokio::test]
    async fn public_profile_has_trust_score() {
        let app = TestApp::new();
        let (user, _) = app.user("Ayse", Role::User).await;

        let (status, body) = app.get(&format!("/api/users/{}", user.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["trustScore"], 50);
        assert_eq!(body["data"]["activeProductsCount"], 0);

        let (status, body) = app.get(&format!("/api/users/{}/products", user.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/users/undefined", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid user id");

        let (status, _) = app.get(&format!("/api/users/{}", uuid::Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
