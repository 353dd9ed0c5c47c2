use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

use kampus_store::ReportView;

use super::{created, ok, parse_id, ApiResult, AppState, Created, Params, Payload};
use crate::auth::AuthUser;
use crate::services::reports::{self, CreateReport, MyReportsQuery, ReportMeta, ReportPage};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/mine", get(mine))
        .route("/meta", get(meta))
        .route("/:id", get(show))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(input): Payload<CreateReport>,
) -> Created<ReportView> {
    let db = state.db.lock().await;
    created(
        "Report submitted, our team will review it",
        reports::create(&db, caller.id, &input)?,
    )
}

async fn mine(
    State(state): State<AppState>,
    caller: AuthUser,
    Params(query): Params<MyReportsQuery>,
) -> ApiResult<ReportPage> {
    let db = state.db.lock().await;
    ok(reports::mine(&db, caller.id, query)?)
}

async fn meta(_caller: AuthUser) -> ApiResult<ReportMeta> {
    ok(reports::meta())
}

async fn show(State(state): State<AppState>, caller: AuthUser, Path(id): Path<String>) -> ApiResult<ReportView> {
    let id = parse_id(&id, "report")?;
    let db = state.db.lock().await;
    ok(reports::get(&db, id, &caller)?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::testing::TestApp;
    use crate::services::testing::product;
    use kampus_shared::types::Role;

    #[tokio::test]
    async fn file_and_read_back_a_report() {
        let app = TestApp::new();
        let (seller, _) = app.user("Selin", Role::User).await;
        let (_, token) = app.user("Ayse", Role::User).await;
        let (_, other) = app.user("Burak", Role::User).await;
        let listing = product(&*app.state.db.lock().await, seller.id, "Fake edition");

        let report = json!({
            "reportedProduct": listing.id,
            "reportType": "fraud",
            "category": "product",
            "reason": "Photos are from another listing",
        });
        let (status, body) = app.post("/api/reports", Some(&token), report.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["priority"], "high");
        assert_eq!(body["data"]["status"], "pending");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app.post("/api/reports", Some(&token), report).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You have already reported this");

        let (_, body) = app.get("/api/reports/mine", Some(&token)).await;
        assert_eq!(body["data"]["reports"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["pagination"]["total"], 1);

        let (status, _) = app.get(&format!("/api/reports/{id}"), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get(&format!("/api/reports/{id}"), Some(&other)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn user_report_needs_a_user() {
        let app = TestApp::new();
        let (me, token) = app.user("Ayse", Role::User).await;

        let (status, _) = app
            .post(
                "/api/reports",
                Some(&token),
                json!({ "reportType": "spam", "category": "user", "reason": "spam" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post(
                "/api/reports",
                Some(&token),
                json!({ "reportedUser": me.id, "reportType": "spam", "category": "user", "reason": "x" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You cannot report yourself");
    }

    #[tokio::test]
    async fn meta_lists_every_choice() {
        let app = TestApp::new();
        let (_, token) = app.user("Ayse", Role::User).await;
        let (status, body) = app.get("/api/reports/meta", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reportTypes"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"]["statuses"][0]["color"], "orange");
    }
}
