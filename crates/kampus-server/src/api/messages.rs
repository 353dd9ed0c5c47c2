use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use kampus_store::{Conversation, MessageView};

use super::{created, ok, ok_with, parse_id, ApiResult, AppState, Created, Params, Payload};
use crate::auth::AuthUser;
use crate::services::messaging::{self, SendMessage, Thread};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(send))
        .route("/conversations", get(conversations))
        .route("/conversation/:user_id", get(conversation))
        .route("/conversation/:user_id/read-all", put(read_all))
        .route("/unread-count", get(unread_count))
        .route("/:id/read", put(read_one))
}

#[derive(Debug, Default, Deserialize)]
struct ThreadQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnreadCount {
    unread_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkedRead {
    updated_count: usize,
}

async fn send(
    State(state): State<AppState>,
    caller: AuthUser,
    Payload(input): Payload<SendMessage>,
) -> Created<MessageView> {
    let db = state.db.lock().await;
    created("Message sent", messaging::send(&db, caller.id, input)?)
}

async fn conversations(State(state): State<AppState>, caller: AuthUser) -> ApiResult<Vec<Conversation>> {
    let db = state.db.lock().await;
    ok(messaging::list_conversations(&db, caller.id)?)
}

/// Reading a conversation marks the partner's messages as read.
async fn conversation(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    Params(query): Params<ThreadQuery>,
) -> ApiResult<Thread> {
    let partner = parse_id(&user_id, "user")?;
    let db = state.db.lock().await;
    ok(messaging::open_thread(&db, caller.id, partner, query.limit)?)
}

async fn read_all(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<MarkedRead> {
    let partner = parse_id(&user_id, "user")?;
    let db = state.db.lock().await;
    let updated_count = messaging::mark_conversation_read(&db, caller.id, partner)?;
    ok_with("Conversation marked as read", MarkedRead { updated_count })
}

async fn read_one(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<MessageView> {
    let id = parse_id(&id, "message")?;
    let db = state.db.lock().await;
    ok_with("Message marked as read", messaging::mark_read(&db, id, caller.id)?)
}

async fn unread_count(State(state): State<AppState>, caller: AuthUser) -> ApiResult<UnreadCount> {
    let db = state.db.lock().await;
    ok(UnreadCount {
        unread_count: messaging::unread_count(&db, caller.id)?,
    })
}
