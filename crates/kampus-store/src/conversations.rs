//! Conversation Aggregator: a read-side projection of the `messages` table.
//!
//! A conversation is keyed by the unordered pair of participants and is
//! recomputed from a single fetch on every request; nothing is cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::MessageView;

/// One inbox entry per distinct partner.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub partner_email: String,
    pub last_message: LastMessage,
    /// Messages from the partner to the owner of the inbox not yet read.
    pub unread_count: u32,
}

/// Snapshot of the most recent message in a conversation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub sender: Uuid,
}

impl Database {
    /// The user's inbox, most recently active conversation first.
    pub fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let messages = self.messages_involving(user_id)?;
        Ok(group_by_partner(user_id, &messages))
    }
}

/// Group `messages` (all involving `user_id`, newest first) by the other
/// participant. The first message seen per partner is the latest one.
pub fn group_by_partner(user_id: Uuid, messages: &[MessageView]) -> Vec<Conversation> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();

    for message in messages {
        let partner = if message.sender.id == user_id {
            &message.receiver
        } else {
            &message.sender
        };

        let slot = *index.entry(partner.id).or_insert_with(|| {
            conversations.push(Conversation {
                partner_id: partner.id,
                partner_name: partner.name.clone(),
                partner_email: partner.email.clone(),
                last_message: LastMessage {
                    id: message.id,
                    content: message.content.clone(),
                    created_at: message.created_at,
                    is_read: message.is_read,
                    sender: message.sender.id,
                },
                unread_count: 0,
            });
            conversations.len() - 1
        });

        if message.sender.id == partner.id && message.receiver.id == user_id && !message.is_read {
            conversations[slot].unread_count += 1;
        }
    }

    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::tests::message;
    use crate::users::tests::new_user;
    use chrono::Duration;

    #[test]
    fn one_entry_per_partner_with_latest_message() {
        let db = Database::open_in_memory().unwrap();
        let me = db.create_user(&new_user("Ayse")).unwrap();
        let b = db.create_user(&new_user("Burak")).unwrap();
        let c = db.create_user(&new_user("Cem")).unwrap();

        let base = crate::columns::now() - Duration::minutes(10);
        let mut seq = Vec::new();
        for (i, (from, to, text)) in [
            (b.id, me.id, "b1"),
            (me.id, b.id, "me->b"),
            (c.id, me.id, "c1"),
            (b.id, me.id, "b2"),
            (c.id, me.id, "c2"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut m = message(from, to, text);
            m.created_at = base + Duration::seconds(i as i64);
            db.insert_message(&m).unwrap();
            seq.push(m);
        }

        let inbox = db.list_conversations(me.id).unwrap();
        assert_eq!(inbox.len(), 2);

        assert_eq!(inbox[0].partner_id, c.id);
        assert_eq!(inbox[0].last_message.content, "c2");
        assert_eq!(inbox[0].unread_count, 2);

        assert_eq!(inbox[1].partner_id, b.id);
        assert_eq!(inbox[1].partner_name, "Burak");
        assert_eq!(inbox[1].last_message.content, "b2");
        assert_eq!(inbox[1].last_message.created_at, seq[3].created_at);
        assert_eq!(inbox[1].unread_count, 2);
    }

    #[test]
    fn own_messages_never_count_as_unread() {
        let db = Database::open_in_memory().unwrap();
        let me = db.create_user(&new_user("Ayse")).unwrap();
        let b = db.create_user(&new_user("Burak")).unwrap();
        db.insert_message(&message(me.id, b.id, "hello")).unwrap();

        let mine = db.list_conversations(me.id).unwrap();
        assert_eq!(mine[0].unread_count, 0);
        assert_eq!(mine[0].last_message.sender, me.id);

        let theirs = db.list_conversations(b.id).unwrap();
        assert_eq!(theirs[0].partner_id, me.id);
        assert_eq!(theirs[0].unread_count, 1);
    }

    #[test]
    fn read_messages_drop_out_of_unread_count() {
        let db = Database::open_in_memory().unwrap();
        let me = db.create_user(&new_user("Ayse")).unwrap();
        let b = db.create_user(&new_user("Burak")).unwrap();
        db.insert_message(&message(b.id, me.id, "1")).unwrap();
        db.insert_message(&message(b.id, me.id, "2")).unwrap();
        db.mark_conversation_read(me.id, b.id).unwrap();

        let inbox = db.list_conversations(me.id).unwrap();
        assert_eq!(inbox[0].unread_count, 0);
        assert!(inbox[0].last_message.is_read);
    }

    #[test]
    fn empty_inbox() {
        let db = Database::open_in_memory().unwrap();
        let me = db.create_user(&new_user("Ayse")).unwrap();
        assert!(db.list_conversations(me.id).unwrap().is_empty());
    }
}
