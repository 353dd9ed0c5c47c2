//! Abuse reports filed by users.
//!
//! Category and target must agree: a `user` or `message` report names the
//! reported user, a `product` report names the listing. Extra targets are
//! allowed but must exist.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{DEFAULT_PAGE_SIZE, MAX_REPORT_REASON_CHARS};
use kampus_shared::error::require_text;
use kampus_shared::pagination::{PageRequest, Pagination};
use kampus_shared::types::{ReportCategory, ReportStatus, ReportType};
use kampus_store::columns::now;
use kampus_store::{Database, Report, ReportFilter, ReportView};

use crate::auth::AuthUser;
use crate::error::{or_not_found, ServerError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub reported_user: Option<Uuid>,
    pub reported_product: Option<Uuid>,
    pub report_type: ReportType,
    pub category: ReportCategory,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyReportsQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub reports: Vec<ReportView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub report_types: Vec<Choice>,
    pub categories: Vec<Choice>,
    pub statuses: Vec<Choice>,
}

/// Check that the targets a report names fit its category.
pub fn check_targets(
    category: ReportCategory,
    reported_user: Option<Uuid>,
    reported_product: Option<Uuid>,
) -> Result<(), ServerError> {
    match category {
        ReportCategory::User | ReportCategory::Message if reported_user.is_none() => Err(
            ServerError::BadRequest(format!("A {category} report must name the reported user")),
        ),
        ReportCategory::Product if reported_product.is_none() => Err(ServerError::BadRequest(
            "A product report must name the reported listing".into(),
        )),
        _ => Ok(()),
    }
}

pub fn create(db: &Database, reporter: Uuid, input: &CreateReport) -> Result<ReportView, ServerError> {
    if input.reported_user == Some(reporter) {
        return Err(ServerError::BadRequest("You cannot report yourself".into()));
    }
    check_targets(input.category, input.reported_user, input.reported_product)?;
    let reason = require_text("reason", &input.reason, MAX_REPORT_REASON_CHARS)?;

    if let Some(user) = input.reported_user {
        if !db.user_exists(user)? {
            return Err(ServerError::NotFound("Reported user not found".into()));
        }
    }
    if let Some(product) = input.reported_product {
        if !db.product_exists(product)? {
            return Err(ServerError::NotFound("Reported product not found".into()));
        }
    }
    if db.has_duplicate_report(
        reporter,
        input.reported_user,
        input.reported_product,
        input.category,
    )? {
        return Err(ServerError::BadRequest("You have already reported this".into()));
    }

    let at = now();
    let report = Report {
        id: Uuid::new_v4(),
        reporter_id: reporter,
        reported_user_id: input.reported_user,
        reported_product_id: input.reported_product,
        report_type: input.report_type,
        category: input.category,
        reason,
        status: ReportStatus::Pending,
        admin_note: None,
        reviewed_by: None,
        reviewed_at: None,
        priority: input.report_type.initial_priority(),
        created_at: at,
        updated_at: at,
    };
    db.insert_report(&report)?;

    tracing::info!(
        report = %report.id,
        reporter = %reporter,
        category = %report.category,
        kind = %report.report_type,
        priority = %report.priority,
        "Report filed"
    );
    Ok(db.get_report_view(report.id)?)
}

pub fn mine(db: &Database, caller: Uuid, query: MyReportsQuery) -> Result<ReportPage, ServerError> {
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = ReportFilter {
        reporter_id: Some(caller),
        status: query.status,
        ..Default::default()
    };
    let (reports, total) = db.search_reports(&filter, request)?;
    Ok(ReportPage {
        reports,
        pagination: Pagination::new(request, total),
    })
}

/// A single report, visible to its reporter and to admins.
pub fn get(db: &Database, id: Uuid, caller: &AuthUser) -> Result<ReportView, ServerError> {
    let view = db.get_report_view(id).map_err(or_not_found("Report"))?;
    if view.report.reporter_id != caller.id && !caller.is_admin() {
        return Err(ServerError::Forbidden("You can only view your own reports".into()));
    }
    Ok(view)
}

pub fn meta() -> ReportMeta {
    ReportMeta {
        report_types: ReportType::ALL
            .iter()
            .map(|t| Choice {
                value: t.as_str(),
                label: t.label(),
                color: None,
            })
            .collect(),
        categories: ReportCategory::ALL
            .iter()
            .map(|c| Choice {
                value: c.as_str(),
                label: c.label(),
                color: None,
            })
            .collect(),
        statuses: ReportStatus::ALL
            .iter()
            .map(|s| Choice {
                value: s.as_str(),
                label: s.label(),
                color: Some(s.color()),
            })
            .collect(),
    }
}
