//! Message Service and conversation views.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{DEFAULT_THREAD_LIMIT, MAX_MESSAGE_CHARS, MAX_THREAD_LIMIT};
use kampus_shared::error::require_text;
use kampus_shared::types::MessageType;
use kampus_store::columns::now;
use kampus_store::{Conversation, Database, Message, MessageView, UserSummary};

use crate::error::{or_not_found, ServerError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub receiver_id: Uuid,
    /// Checked by [`send`] so that a self-message is reported first.
    pub content: String,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub messages: Vec<MessageView>,
    pub target_user: UserSummary,
}

/// Validate and store a new message from `sender`.
pub fn send(db: &Database, sender: Uuid, input: SendMessage) -> Result<MessageView, ServerError> {
    if input.receiver_id == sender {
        return Err(ServerError::BadRequest("You cannot send a message to yourself".into()));
    }
    let content = require_text("content", &input.content, MAX_MESSAGE_CHARS)?;

    if !db.user_exists(input.receiver_id)? {
        return Err(ServerError::NotFound("Receiver not found".into()));
    }
    if let Some(product_id) = input.product_id {
        if !db.product_exists(product_id)? {
            return Err(ServerError::NotFound("Product not found".into()));
        }
    }

    let message = Message {
        id: Uuid::new_v4(),
        sender_id: sender,
        receiver_id: input.receiver_id,
        product_id: input.product_id,
        content,
        is_read: false,
        message_type: MessageType::for_product(input.product_id.is_some()),
        created_at: now(),
    };
    db.insert_message(&message)?;

    tracing::debug!(
        message = %message.id,
        from = %sender,
        to = %message.receiver_id,
        kind = %message.message_type,
        "Message sent"
    );
    Ok(db.get_message_view(message.id)?)
}

/// Mark one message read and return it. Only its receiver may do this;
/// repeating it is a successful no-op.
pub fn mark_read(db: &Database, message_id: Uuid, caller: Uuid) -> Result<MessageView, ServerError> {
    let message = db.get_message(message_id).map_err(or_not_found("Message"))?;
    if message.receiver_id != caller {
        return Err(ServerError::Forbidden(
            "You can only mark messages sent to you as read".into(),
        ));
    }
    db.mark_message_read(message_id)?;
    Ok(db.get_message_view(message_id)?)
}

/// Mark everything `partner` sent to `caller` as read.
pub fn mark_conversation_read(db: &Database, caller: Uuid, partner: Uuid) -> Result<usize, ServerError> {
    let updated = db.mark_conversation_read(caller, partner)?;
    tracing::debug!(user = %caller, partner = %partner, updated, "Conversation marked read");
    Ok(updated)
}

pub fn unread_count(db: &Database, caller: Uuid) -> Result<u64, ServerError> {
    Ok(db.count_unread(caller)?)
}

pub fn list_conversations(db: &Database, caller: Uuid) -> Result<Vec<Conversation>, ServerError> {
    Ok(db.list_conversations(caller)?)
}

/// Clamp a requested thread size to `1..=MAX_THREAD_LIMIT`.
pub fn thread_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_THREAD_LIMIT)
        .clamp(1, MAX_THREAD_LIMIT)
}

/// The latest messages between `caller` and `partner`, oldest first. Pure
/// read; see [`open_thread`] for the variant that also marks them read.
pub fn thread(
    db: &Database,
    caller: Uuid,
    partner: Uuid,
    limit: Option<u32>,
) -> Result<Thread, ServerError> {
    let target_user = db
        .user_summary(partner)?
        .ok_or_else(|| ServerError::NotFound("User not found".into()))?;
    let messages = db.thread_between(caller, target_user.id, thread_limit(limit))?;
    Ok(Thread {
        messages,
        target_user,
    })
}

/// Open a conversation as its reader: mark the partner's unread messages
/// read, then return the thread so it reflects the new state.
pub fn open_thread(
    db: &Database,
    caller: Uuid,
    partner: Uuid,
    limit: Option<u32>,
) -> Result<Thread, ServerError> {
    if !db.user_exists(partner)? {
        return Err(ServerError::NotFound("User not found".into()));
    }
    db.mark_conversation_read(caller, partner)?;
    thread(db, caller, partner, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{db, product, user};

    fn send_text(db: &Database, from: Uuid, to: Uuid, content: &str) -> Result<MessageView, ServerError> {
        send(
            db,
            from,
            SendMessage {
                receiver_id: to,
                content: content.to_string(),
                product_id: None,
            },
        )
    }

    #[test]
    fn send_sets_type_and_unread() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");
        let p = product(&db, b.id, "Linear Algebra");

        let plain = send_text(&db, a.id, b.id, "  hi  ").unwrap();
        assert_eq!(plain.content, "hi");
        assert!(!plain.is_read);
        assert_eq!(plain.message_type, MessageType::Text);

        let inquiry = send(
            &db,
            a.id,
            SendMessage {
                receiver_id: b.id,
                content: "Still available?".into(),
                product_id: Some(p.id),
            },
        )
        .unwrap();
        assert_eq!(inquiry.message_type, MessageType::ProductInquiry);
        assert_eq!(inquiry.product.map(|p| p.id), Some(p.id));
    }

    #[test]
    fn self_message_wins_over_other_errors() {
        let db = db();
        let a = user(&db, "Ayse");
        let err = send(
            &db,
            a.id,
            SendMessage {
                receiver_id: a.id,
                content: "   ".into(),
                product_id: Some(Uuid::new_v4()),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "You cannot send a message to yourself");
    }

    #[test]
    fn content_rules() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");

        assert!(matches!(send_text(&db, a.id, b.id, " \n\t "), Err(ServerError::BadRequest(_))));
        let too_long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(send_text(&db, a.id, b.id, &too_long), Err(ServerError::BadRequest(_))));
        assert!(send_text(&db, a.id, b.id, &"x".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[test]
    fn unknown_receiver_or_product_is_not_found() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");

        assert!(matches!(
            send_text(&db, a.id, Uuid::new_v4(), "hello"),
            Err(ServerError::NotFound(_))
        ));
        let err = send(
            &db,
            a.id,
            SendMessage {
                receiver_id: b.id,
                content: "hello".into(),
                product_id: Some(Uuid::new_v4()),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn mark_read_is_receiver_only_and_idempotent() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");
        let msg = send_text(&db, a.id, b.id, "hello").unwrap();

        assert!(matches!(mark_read(&db, msg.id, a.id), Err(ServerError::Forbidden(_))));
        assert!(mark_read(&db, msg.id, b.id).unwrap().is_read);
        let again = mark_read(&db, msg.id, b.id).unwrap();
        assert!(again.is_read);
        assert_eq!(again.content, "hello");
        assert!(matches!(mark_read(&db, Uuid::new_v4(), b.id), Err(ServerError::NotFound(_))));
    }

    #[test]
    fn unread_count_follows_read_all() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");
        for i in 0..3 {
            send_text(&db, a.id, b.id, &format!("msg {i}")).unwrap();
        }
        assert_eq!(unread_count(&db, b.id).unwrap(), 3);
        assert_eq!(mark_conversation_read(&db, b.id, a.id).unwrap(), 3);
        assert_eq!(unread_count(&db, b.id).unwrap(), 0);
    }

    #[test]
    fn thread_read_is_pure_and_open_thread_marks_read() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");
        send_text(&db, a.id, b.id, "one").unwrap();
        send_text(&db, b.id, a.id, "two").unwrap();

        let peek = thread(&db, b.id, a.id, None).unwrap();
        assert_eq!(peek.messages.len(), 2);
        assert_eq!(unread_count(&db, b.id).unwrap(), 1);

        let opened = open_thread(&db, b.id, a.id, None).unwrap();
        assert_eq!(opened.target_user.id, a.id);
        assert_eq!(opened.messages[0].content, "one");
        assert!(opened.messages[0].is_read);
        // Messages the caller sent stay unread for the partner.
        assert!(!opened.messages[1].is_read);
        assert_eq!(unread_count(&db, b.id).unwrap(), 0);
        assert_eq!(unread_count(&db, a.id).unwrap(), 1);

        assert!(matches!(
            open_thread(&db, b.id, Uuid::new_v4(), None),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn thread_limit_is_clamped() {
        assert_eq!(thread_limit(None), DEFAULT_THREAD_LIMIT);
        assert_eq!(thread_limit(Some(0)), 1);
        assert_eq!(thread_limit(Some(10_000)), MAX_THREAD_LIMIT);
    }

    #[test]
    fn inbox_lists_partners() {
        let db = db();
        let a = user(&db, "Ayse");
        let b = user(&db, "Burak");
        let c = user(&db, "Cem");
        send_text(&db, b.id, a.id, "from b").unwrap();
        send_text(&db, c.id, a.id, "from c").unwrap();

        let inbox = list_conversations(&db, a.id).unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|c| c.unread_count == 1));
    }
}
