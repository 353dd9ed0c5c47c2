//! Aggregate counts for the admin dashboard and statistics views.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use kampus_shared::rating::round_one_decimal;
use kampus_shared::types::{ReportStatus, Role};

use crate::columns::ts;
use crate::database::Database;
use crate::error::Result;

/// One bucket of a `GROUP BY` count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    pub total: u64,
    pub average_rating: f64,
}

impl Database {
    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
        let n: i64 = self.conn().query_row(sql, params, |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn count_users(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM users", [])
    }

    pub fn count_products(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM products", [])
    }

    /// Active accounts created at or after `since`.
    pub fn count_active_users_since(&self, since: DateTime<Utc>) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM users WHERE is_active = 1 AND created_at >= ?1",
            params![ts(&since)],
        )
    }

    /// Reports in total, or only those with `status`.
    pub fn count_reports(&self, status: Option<ReportStatus>) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM reports WHERE (?1 IS NULL OR status = ?1)",
            params![status.map(|s| s.as_str())],
        )
    }

    pub fn user_stats(&self) -> Result<UserStats> {
        let total = self.count_users()?;
        let active = self.count("SELECT COUNT(*) FROM users WHERE is_active = 1", [])?;
        let admins = self.count(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![Role::Admin.as_str()],
        )?;
        Ok(UserStats {
            total,
            active,
            inactive: total - active,
            admins,
        })
    }

    pub fn products_by_status(&self) -> Result<Vec<GroupCount>> {
        self.group_count("SELECT status, COUNT(*) AS n FROM products GROUP BY status ORDER BY n DESC, status")
    }

    pub fn products_by_category(&self) -> Result<Vec<GroupCount>> {
        self.group_count(
            "SELECT category, COUNT(*) AS n FROM products GROUP BY category ORDER BY n DESC, category",
        )
    }

    pub fn reports_by_status(&self) -> Result<Vec<GroupCount>> {
        self.group_count("SELECT status, COUNT(*) AS n FROM reports GROUP BY status ORDER BY n DESC, status")
    }

    pub fn rating_stats(&self) -> Result<RatingStats> {
        let (total, average): (i64, Option<f64>) = self.conn().query_row(
            "SELECT COUNT(*), AVG(rating) FROM ratings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(RatingStats {
            total: total as u64,
            average_rating: average.map(round_one_decimal).unwrap_or(0.0),
        })
    }

    fn group_count(&self, sql: &str) -> Result<Vec<GroupCount>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(GroupCount {
                value: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }
}
