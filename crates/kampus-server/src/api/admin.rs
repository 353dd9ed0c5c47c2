//! `/api/admin`. Report review is open to moderators; everything else is
//! admin only.

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Router,
};

use kampus_store::{ReportView, User};

use super::{ok, ok_with, parse_id, ApiResult, AppState, Params, Payload};
use crate::auth::{AdminUser, StaffUser};
use crate::services::admin::{
    self, Dashboard, ProductListPage, ProductListQuery, ReasonQuery, ReportListQuery, ReviewReport,
    SetUserStatus, SystemStats, UserListQuery, UserPage,
};
use crate::services::reports::ReportPage;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/stats", get(stats))
        .route("/users", get(users))
        .route("/users/:id/status", put(set_user_status))
        .route("/products", get(products))
        .route("/products/:id", delete(delete_product))
        .route("/reports", get(reports))
        .route("/reports/:id", put(review_report))
}

async fn dashboard(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Dashboard> {
    let db = state.db.lock().await;
    ok(admin::dashboard(&db)?)
}

async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<SystemStats> {
    let db = state.db.lock().await;
    ok(admin::stats(&db)?)
}

async fn users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Params(query): Params<UserListQuery>,
) -> ApiResult<UserPage> {
    let db = state.db.lock().await;
    ok(admin::list_users(&db, query)?)
}

async fn set_user_status(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(id): Path<String>,
    Payload(input): Payload<SetUserStatus>,
) -> ApiResult<User> {
    let id = parse_id(&id, "user")?;
    let db = state.db.lock().await;
    let user = admin::set_user_status(&db, &caller, id, &input)?;
    let message = if user.is_active {
        "User activated"
    } else {
        "User deactivated"
    };
    ok_with(message, user)
}

async fn products(
    State(state): State<AppState>,
    _admin: AdminUser,
    Params(query): Params<ProductListQuery>,
) -> ApiResult<ProductListPage> {
    let db = state.db.lock().await;
    ok(admin::list_products(&db, query)?)
}

async fn delete_product(
    State(state): State<AppState>,
    AdminUser(caller): AdminUser,
    Path(id): Path<String>,
    Params(query): Params<ReasonQuery>,
) -> ApiResult<()> {
    let id = parse_id(&id, "product")?;
    let db = state.db.lock().await;
    admin::delete_product(&db, &caller, id, query.reason.as_deref())?;
    ok_with("Listing removed", ())
}

async fn reports(
    State(state): State<AppState>,
    _staff: StaffUser,
    Params(query): Params<ReportListQuery>,
) -> ApiResult<ReportPage> {
    let db = state.db.lock().await;
    ok(admin::list_reports(&db, query)?)
}

async fn review_report(
    State(state): State<AppState>,
    StaffUser(caller): StaffUser,
    Path(id): Path<String>,
    Payload(input): Payload<ReviewReport>,
) -> ApiResult<ReportView> {
    let id = parse_id(&id, "report")?;
    let db = state.db.lock().await;
    ok_with("Report updated", admin::review_report(&db, &caller, id, &input)?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::testing::TestApp;
    use crate::services::testing::product;
    use kampus_shared::types::Role;

    const ADMIN_ONLY: [&str; 4] = [
        "/api/admin/dashboard",
        "/api/admin/stats",
        "/api/admin/users",
        "/api/admin/products",
    ];

    #[tokio::test]
    async fn regular_users_are_turned_away() {
        let app = TestApp::new();
        let (_, token) = app.user("Ayse", Role::User).await;

        for uri in ADMIN_ONLY.iter().chain(["/api/admin/reports"].iter()) {
            let (status, body) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body["success"], false);
        }
        let (status, _) = app.get("/api/admin/dashboard", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn moderators_only_review_reports() {
        let app = TestApp::new();
        let (_, token) = app.user("Mod", Role::Moderator).await;

        for uri in ADMIN_ONLY {
            let (status, body) = app.get(uri, Some(&token)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body["message"], "Admin access required");
        }
        let (status, _) = app.get("/api/admin/reports", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_counts() {
        let app = TestApp::new();
        let (seller, _) = app.user("Selin", Role::User).await;
        let (_, token) = app.user("Root", Role::Admin).await;
        product(&*app.state.db.lock().await, seller.id, "Statics");

        let (status, body) = app.get("/api/admin/dashboard", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stats"]["totalUsers"], 2);
        assert_eq!(body["data"]["stats"]["totalProducts"], 1);
        assert_eq!(body["data"]["stats"]["pendingReports"], 0);
        assert_eq!(body["data"]["recentProducts"][0]["title"], "Statics");

        let (status, body) = app.get("/api/admin/stats", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"]["total"], 2);
        assert_eq!(body["data"]["users"]["admins"], 1);
    }

    #[tokio::test]
    async fn deactivation_locks_the_user_out() {
        let app = TestApp::new();
        let (admin, admin_token) = app.user("Root", Role::Admin).await;
        let (user, user_token) = app.user("Ayse", Role::User).await;

        let (status, body) = app
            .put(
                &format!("/api/admin/users/{}/status", user.id),
                Some(&admin_token),
                Some(json!({ "isActive": false, "reason": "spam" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deactivated");

        let (status, _) = app.get("/api/auth/me", Some(&user_token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .put(
                &format!("/api/admin/users/{}/status", admin.id),
                Some(&admin_token),
                Some(json!({ "isActive": false })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = app.get("/api/admin/users?status=inactive", Some(&admin_token)).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn admin_removes_a_listing() {
        let app = TestApp::new();
        let (seller, _) = app.user("Selin", Role::User).await;
        let (_, token) = app.user("Root", Role::Admin).await;
        let listing = product(&*app.state.db.lock().await, seller.id, "Copied notes");

        let (status, _) = app
            .delete(&format!("/api/admin/products/{}?reason=copyright", listing.id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .delete(&format!("/api/admin/products/{}", listing.id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn moderator_reviews_a_report() {
        let app = TestApp::new();
        let (target, _) = app.user("Selin", Role::User).await;
        let (_, reporter) = app.user("Ayse", Role::User).await;
        let (moderator, mod_token) = app.user("Mod", Role::Moderator).await;

        let (_, body) = app
            .post(
                "/api/reports",
                Some(&reporter),
                json!({ "reportedUser": target.id, "reportType": "spam", "category": "user", "reason": "Ads" }),
            )
            .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .put(
                &format!("/api/admin/reports/{id}"),
                Some(&mod_token),
                Some(json!({ "status": "resolved", "adminNote": "Warned the user" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "resolved");
        assert_eq!(body["data"]["reviewedBy"], moderator.id.to_string());
        assert_eq!(body["data"]["reviewer"]["name"], "Mod");

        let (_, body) = app.get("/api/admin/reports?status=pending", Some(&mod_token)).await;
        assert_eq!(body["data"]["pagination"]["total"], 0);
    }
}
