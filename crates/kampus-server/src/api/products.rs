use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use kampus_store::{Product, ProductWithSeller};

use super::{created, ok, ok_with, parse_id, ApiResult, AppState, Created, Params, Payload};
use crate::auth::AuthUser;
use crate::services::products::{self, BrowseQuery, CreateProduct, ProductPage, UpdateProduct};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(browse).post(create))
        .route("/mine", get(mine))
        .route("/:id", get(view).put(update).delete(remove))
}

async fn browse(State(state): State<AppState>, Params(query): Params<BrowseQuery>) -> ApiResult<ProductPage> {
    let db = state.db.lock().await;
    ok(products::browse(&db, query)?)
}

async fn view(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ProductWithSeller> {
    let id = parse_id(&id, "product")?;
    let db = state.db.lock().await;
    ok(products::view(&db, id)?)
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(input): Payload<CreateProduct>,
) -> Created<Product> {
    let db = state.db.lock().await;
    created("Listing created", products::create(&db, caller.id, input)?)
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Payload(input): Payload<UpdateProduct>,
) -> ApiResult<Product> {
    let id = parse_id(&id, "product")?;
    let db = state.db.lock().await;
    ok_with("Listing updated", products::update(&db, id, caller.id, &input)?)
}

async fn remove(State(state): State<AppState>, caller: AuthUser, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id, "product")?;
    let db = state.db.lock().await;
    products::delete(&db, id, caller.id)?;
    ok_with("Listing deleted", ())
}

async fn mine(State(state): State<AppState>, caller: AuthUser) -> ApiResult<Vec<Product>> {
    let db = state.db.lock().await;
    ok(products::mine(&db, caller.id)?)
}
