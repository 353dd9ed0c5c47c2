//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

use kampus_shared::pagination::PageRequest;
use kampus_shared::rating::RatingSummary;

use crate::columns::{enum_at, now, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, ProfileUpdate, User, UserFilter, UserSummary};
use crate::query::Filter;

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, university, department,
     profile_photo, bio, average_rating, total_ratings, total_sales, total_purchases,
     role, is_active, is_email_verified, last_active, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new account. A duplicate email yields [`StoreError::Conflict`].
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let id = Uuid::new_v4();
        let now = now();

        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, phone, university,
                                    department, role, last_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?9)",
                params![
                    id.to_string(),
                    new.name,
                    new.email,
                    new.password_hash,
                    new.phone,
                    new.university,
                    new.department,
                    new.role.as_str(),
                    ts(&now),
                ],
            )
            .map_err(StoreError::from_write)?;

        self.get_user(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(StoreError::from_read)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn user_exists(&self, id: Uuid) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Display details for a user, or `None` if the id is unknown.
    pub fn user_summary(&self, id: Uuid) -> Result<Option<UserSummary>> {
        let summary = self
            .conn()
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(UserSummary {
                        id: uuid_at(row, 0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }

    /// Admin search, newest accounts first. Returns the page and the total
    /// number of matching users.
    pub fn search_users(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, u64)> {
        let mut f = Filter::new();
        if let Some(search) = &filter.search {
            f.search(&["name", "email", "university"], search);
        }
        if let Some(active) = filter.is_active {
            f.push("is_active = ?", active);
        }
        if let Some(role) = filter.role {
            f.push("role = ?", role.as_str().to_string());
        }

        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM users{}", f.where_sql()),
            params_from_iter(f.params()),
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            f.where_sql()
        ))?;
        let rows = stmt.query_map(
            params_from_iter(f.params_with_page(page.limit, page.offset())),
            row_to_user,
        )?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok((users, total as u64))
    }

    pub fn recent_users(&self, limit: u32) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    pub fn update_user_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET
                 name       = COALESCE(?2, name),
                 university = COALESCE(?3, university),
                 department = COALESCE(?4, department),
                 phone      = COALESCE(?5, phone),
                 bio        = COALESCE(?6, bio),
                 updated_at = ?7
             WHERE id = ?1",
            params![
                id.to_string(),
                update.name,
                update.university,
                update.department,
                update.phone,
                update.bio,
                ts(&now()),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }

    pub fn touch_last_active(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET last_active = ?2 WHERE id = ?1",
            params![id.to_string(), ts(&at)],
        )?;
        Ok(())
    }

    pub fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), is_active, ts(&now())],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }

    pub fn set_user_email_verified(&self, id: Uuid, verified: bool) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET is_email_verified = ?2 WHERE id = ?1",
            params![id.to_string(), verified],
        )?;
        Ok(())
    }

    /// Overwrite the cached rating aggregate on the user row.
    pub fn set_user_rating_summary(&self, id: Uuid, summary: RatingSummary) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET average_rating = ?2, total_ratings = ?3 WHERE id = ?1",
            params![id.to_string(), summary.average_rating, summary.total_ratings],
        )?;
        Ok(())
    }

    pub fn increment_total_sales(&self, id: Uuid) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET total_sales = total_sales + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }
}

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        university: row.get(5)?,
        department: row.get(6)?,
        profile_photo: row.get(7)?,
        bio: row.get(8)?,
        average_rating: row.get(9)?,
        total_ratings: row.get(10)?,
        total_sales: row.get(11)?,
        total_purchases: row.get(12)?,
        role: enum_at(row, 13)?,
        is_active: row.get(14)?,
        is_email_verified: row.get(15)?,
        last_active: ts_at(row, 16)?,
        created_at: ts_at(row, 17)?,
        updated_at: ts_at(row, 18)?,
    })
}
