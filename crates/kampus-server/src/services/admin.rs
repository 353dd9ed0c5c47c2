//! Admin panel: dashboard, moderation of users and listings, report review.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{DEFAULT_PAGE_SIZE, MAX_ADMIN_NOTE_CHARS, RECENT_ACTIVITY_DAYS};
use kampus_shared::error::optional_text;
use kampus_shared::pagination::{PageRequest, Pagination};
use kampus_shared::types::{
    ProductCategory, ProductStatus, ReportCategory, ReportPriority, ReportStatus, Role,
};
use kampus_store::{
    Database, GroupCount, ProductFilter, ProductWithSeller, RatingStats, ReportFilter,
    ReportReview, ReportView, User, UserFilter, UserStats,
};

use crate::auth::AuthUser;
use crate::error::{or_not_found, ServerError};
use crate::services::reports::ReportPage;

/// Number of users and listings shown in the dashboard's "recent" panels.
const RECENT_ITEMS: u32 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub total_users: u64,
    pub total_products: u64,
    pub total_reports: u64,
    pub active_users: u64,
    pub pending_reports: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardTotals,
    pub recent_users: Vec<User>,
    pub recent_products: Vec<ProductWithSeller>,
    pub category_stats: Vec<GroupCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub users: UserStats,
    pub products: Vec<GroupCount>,
    pub reports: Vec<GroupCount>,
    pub ratings: RatingStats,
    pub recent_messages: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub status: Option<AccountStatus>,
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub category: Option<ProductCategory>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub priority: Option<ReportPriority>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetUserStatus {
    pub is_active: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub status: Option<ReportStatus>,
    #[validate(length(max = 1000, message = "Admin note must be at most 1000 characters"))]
    pub admin_note: Option<String>,
    pub priority: Option<ReportPriority>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductListPage {
    pub products: Vec<ProductWithSeller>,
    pub pagination: Pagination,
}

pub fn dashboard(db: &Database) -> Result<Dashboard, ServerError> {
    let since = Utc::now() - Duration::days(RECENT_ACTIVITY_DAYS);
    Ok(Dashboard {
        stats: DashboardTotals {
            total_users: db.count_users()?,
            total_products: db.count_products()?,
            total_reports: db.count_reports(None)?,
            active_users: db.count_active_users_since(since)?,
            pending_reports: db.count_reports(Some(ReportStatus::Pending))?,
        },
        recent_users: db.recent_users(RECENT_ITEMS)?,
        recent_products: db.recent_products(RECENT_ITEMS)?,
        category_stats: db.products_by_category()?,
    })
}

pub fn stats(db: &Database) -> Result<SystemStats, ServerError> {
    let since = Utc::now() - Duration::days(RECENT_ACTIVITY_DAYS);
    Ok(SystemStats {
        users: db.user_stats()?,
        products: db.products_by_status()?,
        reports: db.reports_by_status()?,
        ratings: db.rating_stats()?,
        recent_messages: db.count_messages_since(since)?,
    })
}

pub fn list_users(db: &Database, query: UserListQuery) -> Result<UserPage, ServerError> {
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = UserFilter {
        search: query.search,
        is_active: query.status.map(|s| s == AccountStatus::Active),
        role: query.role,
    };
    let (users, total) = db.search_users(&filter, request)?;
    Ok(UserPage {
        users,
        pagination: Pagination::new(request, total),
    })
}

/// Activate or deactivate an account. Admins cannot deactivate themselves.
pub fn set_user_status(
    db: &Database,
    admin: &AuthUser,
    user_id: Uuid,
    input: &SetUserStatus,
) -> Result<User, ServerError> {
    if user_id == admin.id && !input.is_active {
        return Err(ServerError::BadRequest("You cannot deactivate your own account".into()));
    }
    let user = db
        .set_user_active(user_id, input.is_active)
        .map_err(or_not_found("User"))?;

    tracing::info!(
        admin = %admin.id,
        user = %user.id,
        is_active = user.is_active,
        reason = input.reason.as_deref().unwrap_or("-"),
        "User status changed"
    );
    Ok(user)
}

/// Listings in every status.
pub fn list_products(db: &Database, query: ProductListQuery) -> Result<ProductListPage, ServerError> {
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = ProductFilter {
        search: query.search,
        status: query.status,
        category: query.category,
        ..Default::default()
    };
    let (products, total) = db.search_products(&filter, request)?;
    Ok(ProductListPage {
        products,
        pagination: Pagination::new(request, total),
    })
}

pub fn delete_product(
    db: &Database,
    admin: &AuthUser,
    product_id: Uuid,
    reason: Option<&str>,
) -> Result<(), ServerError> {
    let product = db.get_product(product_id).map_err(or_not_found("Product"))?;
    db.delete_product(product_id)?;
    tracing::info!(
        admin = %admin.id,
        product = %product.id,
        seller = %product.seller_id,
        reason = reason.unwrap_or("-"),
        "Listing removed by admin"
    );
    Ok(())
}

pub fn list_reports(db: &Database, query: ReportListQuery) -> Result<ReportPage, ServerError> {
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = ReportFilter {
        reporter_id: None,
        status: query.status,
        category: query.category,
        priority: query.priority,
    };
    let (reports, total) = db.search_reports(&filter, request)?;
    Ok(ReportPage {
        reports,
        pagination: Pagination::new(request, total),
    })
}

/// Staff review. Setting a status records who reviewed the report and when.
pub fn review_report(
    db: &Database,
    reviewer: &AuthUser,
    report_id: Uuid,
    input: &ReviewReport,
) -> Result<ReportView, ServerError> {
    let review = ReportReview {
        status: input.status,
        admin_note: optional_text("adminNote", input.admin_note.as_deref(), MAX_ADMIN_NOTE_CHARS)?,
        priority: input.priority,
    };
    db.review_report(report_id, reviewer.id, &review)
        .map_err(or_not_found("Report"))?;

    tracing::info!(
        reviewer = %reviewer.id,
        report = %report_id,
        status = ?input.status,
        priority = ?input.priority,
        "Report reviewed"
    );
    Ok(db.get_report_view(report_id)?)
}
