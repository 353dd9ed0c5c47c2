//! v002 -- Record when a listing was first sold.
//!
//! `sold_at` is set once and never cleared, so a listing credits its seller
//! with at most one sale however often its status changes.

use rusqlite::Connection;

const UP_SQL: &str = r#"
ALTER TABLE products ADD COLUMN sold_at TEXT;   -- RFC 3339, NULL until first sold

UPDATE products SET sold_at = updated_at WHERE status = 'sold';
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
