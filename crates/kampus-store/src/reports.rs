//! CRUD operations for abuse [`Report`]s.

use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use kampus_shared::pagination::PageRequest;
use kampus_shared::types::ReportCategory;

use crate::columns::{enum_at, now, opt_ts_at, opt_uuid_at, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Report, ReportFilter, ReportReview, ReportView};
use crate::query::Filter;

const REPORT_COLUMNS: &str = "id, reporter_id, reported_user_id, reported_product_id,
     report_type, category, reason, status, admin_note, reviewed_by, reviewed_at, priority,
     created_at, updated_at";

impl Database {
    pub fn insert_report(&self, report: &Report) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO reports (id, reporter_id, reported_user_id, reported_product_id,
                                      report_type, category, reason, status, admin_note,
                                      reviewed_by, reviewed_at, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    report.id.to_string(),
                    report.reporter_id.to_string(),
                    report.reported_user_id.map(|u| u.to_string()),
                    report.reported_product_id.map(|p| p.to_string()),
                    report.report_type.as_str(),
                    report.category.as_str(),
                    report.reason,
                    report.status.as_str(),
                    report.admin_note,
                    report.reviewed_by.map(|u| u.to_string()),
                    report.reviewed_at.as_ref().map(ts),
                    report.priority.as_str(),
                    ts(&report.created_at),
                    ts(&report.updated_at),
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(())
    }

    pub fn get_report(&self, id: Uuid) -> Result<Report> {
        self.conn()
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                params![id.to_string()],
                row_to_report,
            )
            .map_err(StoreError::from_read)
    }

    pub fn get_report_view(&self, id: Uuid) -> Result<ReportView> {
        let report = self.get_report(id)?;
        self.resolve_report(report)
    }

    /// Whether `reporter` already filed a report of this category against the
    /// same targets. Absent targets compare equal to absent targets.
    pub fn has_duplicate_report(
        &self,
        reporter: Uuid,
        reported_user: Option<Uuid>,
        reported_product: Option<Uuid>,
        category: ReportCategory,
    ) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM reports
             WHERE reporter_id = ?1
               AND reported_user_id IS ?2
               AND reported_product_id IS ?3
               AND category = ?4",
            params![
                reporter.to_string(),
                reported_user.map(|u| u.to_string()),
                reported_product.map(|p| p.to_string()),
                category.as_str(),
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Filtered report listing, newest first, with the total match count.
    pub fn search_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> Result<(Vec<ReportView>, u64)> {
        let mut f = Filter::new();
        if let Some(reporter) = filter.reporter_id {
            f.push("reporter_id = ?", reporter.to_string());
        }
        if let Some(status) = filter.status {
            f.push("status = ?", status.as_str().to_string());
        }
        if let Some(category) = filter.category {
            f.push("category = ?", category.as_str().to_string());
        }
        if let Some(priority) = filter.priority {
            f.push("priority = ?", priority.as_str().to_string());
        }

        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM reports{}", f.where_sql()),
            params_from_iter(f.params()),
            |row| row.get(0),
        )?;

        let reports = {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports{}
                 ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
                f.where_sql()
            ))?;
            let rows = stmt.query_map(
                params_from_iter(f.params_with_page(page.limit, page.offset())),
                row_to_report,
            )?;
            let mut reports = Vec::new();
            for row in rows {
                reports.push(row?);
            }
            reports
        };

        let mut views = Vec::with_capacity(reports.len());
        for report in reports {
            views.push(self.resolve_report(report)?);
        }
        Ok((views, total as u64))
    }

    /// Apply a staff review. Setting a status stamps the reviewer and the
    /// review time; fields left `None` keep their stored value.
    pub fn review_report(&self, id: Uuid, reviewer: Uuid, review: &ReportReview) -> Result<Report> {
        let at = ts(&now());
        let affected = self.conn().execute(
            "UPDATE reports SET
                status      = COALESCE(?2, status),
                admin_note  = COALESCE(?3, admin_note),
                priority    = COALESCE(?4, priority),
                reviewed_by = CASE WHEN ?2 IS NULL THEN reviewed_by ELSE ?5 END,
                reviewed_at = CASE WHEN ?2 IS NULL THEN reviewed_at ELSE ?6 END,
                updated_at  = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                review.status.map(|s| s.as_str()),
                review.admin_note,
                review.priority.map(|p| p.as_str()),
                reviewer.to_string(),
                at,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_report(id)
    }

    fn resolve_report(&self, report: Report) -> Result<ReportView> {
        let reporter = self
            .user_summary(report.reporter_id)?
            .ok_or(StoreError::NotFound)?;
        let reported_user = match report.reported_user_id {
            Some(id) => self.user_summary(id)?,
            None => None,
        };
        let reported_product = match report.reported_product_id {
            Some(id) => self.product_summary(id)?,
            None => None,
        };
        let reviewer = match report.reviewed_by {
            Some(id) => self.user_summary(id)?,
            None => None,
        };
        Ok(ReportView {
            report,
            reporter,
            reported_user,
            reported_product,
            reviewer,
        })
    }
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: uuid_at(row, 0)?,
        reporter_id: uuid_at(row, 1)?,
        reported_user_id: opt_uuid_at(row, 2)?,
        reported_product_id: opt_uuid_at(row, 3)?,
        report_type: enum_at(row, 4)?,
        category: enum_at(row, 5)?,
        reason: row.get(6)?,
        status: enum_at(row, 7)?,
        admin_note: row.get(8)?,
        reviewed_by: opt_uuid_at(row, 9)?,
        reviewed_at: opt_ts_at(row, 10)?,
        priority: enum_at(row, 11)?,
        created_at: ts_at(row, 12)?,
        updated_at: ts_at(row, 13)?,
    })
}
