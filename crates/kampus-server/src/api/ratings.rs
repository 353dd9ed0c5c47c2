use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};

use kampus_store::RatingView;

use super::{created, ok, ok_with, parse_id, ApiResult, AppState, Created, Params, Payload};
use crate::auth::AuthUser;
use crate::services::ratings::{self, CreateRating, PageQuery, RatingPage, ReceivedRatings, UpdateRating};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/:user_id", get(received))
        .route("/given/:user_id", get(given))
        .route("/:id", put(update).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(input): Payload<CreateRating>,
) -> Created<RatingView> {
    let db = state.db.lock().await;
    created("Rating submitted", ratings::create(&db, caller.id, &input)?)
}

async fn received(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Params(query): Params<PageQuery>,
) -> ApiResult<ReceivedRatings> {
    let user_id = parse_id(&user_id, "user")?;
    let db = state.db.lock().await;
    ok(ratings::received(&db, user_id, query)?)
}

async fn given(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    Params(query): Params<PageQuery>,
) -> ApiResult<RatingPage> {
    let user_id = parse_id(&user_id, "user")?;
    let db = state.db.lock().await;
    ok(ratings::given(&db, caller.id, user_id, query)?)
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Payload(input): Payload<UpdateRating>,
) -> ApiResult<RatingView> {
    let id = parse_id(&id, "rating")?;
    let db = state.db.lock().await;
    ok_with("Rating updated", ratings::update(&db, id, caller.id, &input)?)
}

async fn remove(State(state): State<AppState>, caller: AuthUser, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id, "rating")?;
    let db = state.db.lock().await;
    ratings::delete(&db, id, &caller)?;
    ok_with("Rating deleted", ())
}
