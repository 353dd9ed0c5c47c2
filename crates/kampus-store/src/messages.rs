//! CRUD operations for direct [`Message`]s.
//!
//! Reads that feed the UI return [`MessageView`]s with sender, receiver and
//! the referenced listing resolved in the same query.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::columns::{enum_at, images_at, opt_uuid_at, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, MessageView, ProductSummary, UserSummary};

const VIEW_SELECT: &str = "SELECT m.id, m.content, m.is_read, m.message_type, m.created_at,
            s.id, s.name, s.email,
            r.id, r.name, r.email,
            p.id, p.title, p.price, p.category, p.images
     FROM messages m
     JOIN users s ON s.id = m.sender_id
     JOIN users r ON r.id = m.receiver_id
     LEFT JOIN products p ON p.id = m.product_id";

/// Newest first; rowid breaks ties between identical timestamps.
const NEWEST_FIRST: &str = "ORDER BY m.created_at DESC, m.rowid DESC";

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO messages (id, sender_id, receiver_id, product_id, content,
                                       is_read, message_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.id.to_string(),
                    message.sender_id.to_string(),
                    message.receiver_id.to_string(),
                    message.product_id.map(|p| p.to_string()),
                    message.content,
                    message.is_read,
                    message.message_type.as_str(),
                    ts(&message.created_at),
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(())
    }

    pub fn get_message(&self, id: Uuid) -> Result<Message> {
        self.conn()
            .query_row(
                "SELECT id, sender_id, receiver_id, product_id, content, is_read,
                        message_type, created_at
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map_err(StoreError::from_read)
    }

    pub fn get_message_view(&self, id: Uuid) -> Result<MessageView> {
        self.conn()
            .query_row(
                &format!("{VIEW_SELECT} WHERE m.id = ?1"),
                params![id.to_string()],
                row_to_message_view,
            )
            .map_err(StoreError::from_read)
    }

    /// Every message the user sent or received, newest first.
    pub fn messages_involving(&self, user_id: Uuid) -> Result<Vec<MessageView>> {
        let mut stmt = self.conn().prepare(&format!(
            "{VIEW_SELECT} WHERE m.sender_id = ?1 OR m.receiver_id = ?1 {NEWEST_FIRST}"
        ))?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_message_view)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// The most recent `limit` messages exchanged by the pair, returned in
    /// chronological order (oldest first) for display.
    pub fn thread_between(&self, a: Uuid, b: Uuid, limit: u32) -> Result<Vec<MessageView>> {
        let mut stmt = self.conn().prepare(&format!(
            "{VIEW_SELECT}
             WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                OR (m.sender_id = ?2 AND m.receiver_id = ?1)
             {NEWEST_FIRST}
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![a.to_string(), b.to_string(), limit],
            row_to_message_view,
        )?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        messages.reverse();
        Ok(messages)
    }

    /// Flip one message to read. Returns `false` when it was already read;
    /// read messages never go back to unread.
    pub fn mark_message_read(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET is_read = 1 WHERE id = ?1 AND is_read = 0",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Mark everything `sender_id` sent to `receiver_id` as read. Returns the
    /// number of messages that changed state.
    pub fn mark_conversation_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE messages SET is_read = 1
             WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
            params![receiver_id.to_string(), sender_id.to_string()],
        )?;
        Ok(affected)
    }

    pub fn count_unread(&self, receiver_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND is_read = 0",
            params![receiver_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_messages_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE created_at >= ?1",
            params![ts(&since)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_at(row, 0)?,
        sender_id: uuid_at(row, 1)?,
        receiver_id: uuid_at(row, 2)?,
        product_id: opt_uuid_at(row, 3)?,
        content: row.get(4)?,
        is_read: row.get(5)?,
        message_type: enum_at(row, 6)?,
        created_at: ts_at(row, 7)?,
    })
}

fn row_to_message_view(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageView> {
    let product_id: Option<String> = row.get(11)?;
    let product = match product_id {
        Some(_) => Some(ProductSummary {
            id: uuid_at(row, 11)?,
            title: row.get(12)?,
            price: row.get(13)?,
            category: enum_at(row, 14)?,
            images: images_at(row, 15)?,
        }),
        None => None,
    };

    Ok(MessageView {
        id: uuid_at(row, 0)?,
        content: row.get(1)?,
        is_read: row.get(2)?,
        message_type: enum_at(row, 3)?,
        created_at: ts_at(row, 4)?,
        sender: UserSummary {
            id: uuid_at(row, 5)?,
            name: row.get(6)?,
            email: row.get(7)?,
        },
        receiver: UserSummary {
            id: uuid_at(row, 8)?,
            name: row.get(9)?,
            email: row.get(10)?,
        },
        product,
    })
}
