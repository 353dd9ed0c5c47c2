//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `products`, `messages`, `ratings`
//! and `reports`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id                TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name              TEXT NOT NULL,
    email             TEXT NOT NULL UNIQUE,        -- stored lowercased
    password_hash     TEXT NOT NULL,               -- argon2 PHC string
    phone             TEXT,
    university        TEXT NOT NULL,
    department        TEXT NOT NULL,
    profile_photo     TEXT,
    bio               TEXT,
    average_rating    REAL NOT NULL DEFAULT 0,
    total_ratings     INTEGER NOT NULL DEFAULT 0,
    total_sales       INTEGER NOT NULL DEFAULT 0,
    total_purchases   INTEGER NOT NULL DEFAULT 0,
    role              TEXT NOT NULL DEFAULT 'user',
    is_active         INTEGER NOT NULL DEFAULT 1,  -- boolean 0/1
    is_email_verified INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    last_active       TEXT NOT NULL,               -- RFC-3339, UTC, micros
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at DESC);

-- ----------------------------------------------------------------
-- Products (listings)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id           TEXT PRIMARY KEY NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    author       TEXT NOT NULL,
    category     TEXT NOT NULL,
    condition    TEXT NOT NULL,
    price        REAL NOT NULL CHECK (price >= 0),
    publish_year INTEGER,
    university   TEXT NOT NULL,
    department   TEXT NOT NULL,
    images       TEXT NOT NULL DEFAULT '[]',       -- JSON array of URLs
    seller_id    TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'active',
    view_count   INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,

    FOREIGN KEY (seller_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_products_seller ON products(seller_id);
CREATE INDEX IF NOT EXISTS idx_products_status_created ON products(status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_products_category_price ON products(category, price);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id           TEXT PRIMARY KEY NOT NULL,
    sender_id    TEXT NOT NULL,
    receiver_id  TEXT NOT NULL,
    product_id   TEXT,                             -- optional listing reference
    content      TEXT NOT NULL,
    is_read      INTEGER NOT NULL DEFAULT 0,
    message_type TEXT NOT NULL DEFAULT 'text',
    created_at   TEXT NOT NULL,

    CHECK (sender_id <> receiver_id),
    FOREIGN KEY (sender_id) REFERENCES users(id),
    FOREIGN KEY (receiver_id) REFERENCES users(id),
    FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id);
CREATE INDEX IF NOT EXISTS idx_messages_unread ON messages(receiver_id, is_read);
CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at DESC);

-- ----------------------------------------------------------------
-- Ratings
-- ----------------------------------------------------------------
-- product_id carries no foreign key: a rating outlives a removed listing.
CREATE TABLE IF NOT EXISTS ratings (
    id            TEXT PRIMARY KEY NOT NULL,
    rater_id      TEXT NOT NULL,
    rated_user_id TEXT NOT NULL,
    product_id    TEXT NOT NULL,
    rating        INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment       TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,

    FOREIGN KEY (rater_id) REFERENCES users(id),
    FOREIGN KEY (rated_user_id) REFERENCES users(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_unique
    ON ratings(rater_id, rated_user_id, product_id);
CREATE INDEX IF NOT EXISTS idx_ratings_rated ON ratings(rated_user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_ratings_rater ON ratings(rater_id, created_at DESC);

-- ----------------------------------------------------------------
-- Reports
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS reports (
    id                  TEXT PRIMARY KEY NOT NULL,
    reporter_id         TEXT NOT NULL,
    reported_user_id    TEXT,
    reported_product_id TEXT,
    report_type         TEXT NOT NULL,
    category            TEXT NOT NULL,
    reason              TEXT NOT NULL,
    status              TEXT NOT NULL DEFAULT 'pending',
    admin_note          TEXT,
    reviewed_by         TEXT,
    reviewed_at         TEXT,
    priority            TEXT NOT NULL DEFAULT 'medium',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,

    FOREIGN KEY (reporter_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_reports_reporter ON reports(reporter_id);
CREATE INDEX IF NOT EXISTS idx_reports_reported_user ON reports(reported_user_id);
CREATE INDEX IF NOT EXISTS idx_reports_reported_product ON reports(reported_product_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
