//! Domain model structs persisted in the marketplace database.
//!
//! Every struct serializes with camelCase field names so it can be handed
//! directly to the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kampus_shared::trust::TrustInputs;
use kampus_shared::types::{
    MessageType, ProductCategory, ProductCondition, ProductStatus, ReportCategory,
    ReportPriority, ReportStatus, ReportType, Role,
};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub university: String,
    pub department: String,
    pub profile_photo: Option<String>,
    pub bio: Option<String>,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub total_sales: u32,
    pub total_purchases: u32,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn trust_inputs(&self) -> TrustInputs {
        TrustInputs {
            average_rating: self.average_rating,
            total_ratings: self.total_ratings,
            total_sales: self.total_sales,
            is_email_verified: self.is_email_verified,
            created_at: self.created_at,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub university: String,
    pub department: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// Display projection of a user embedded in other records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Admin user search.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A listing offered for sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: String,
    pub category: ProductCategory,
    pub condition: ProductCondition,
    pub price: f64,
    pub publish_year: Option<i32>,
    pub university: String,
    pub department: String,
    pub images: Vec<String>,
    pub seller_id: Uuid,
    pub status: ProductStatus,
    pub view_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub author: String,
    pub category: ProductCategory,
    pub condition: ProductCondition,
    pub price: f64,
    pub publish_year: Option<i32>,
    pub university: String,
    pub department: String,
    pub images: Vec<String>,
    pub seller_id: Uuid,
}

/// Owner-editable listing fields; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<ProductCondition>,
    pub status: Option<ProductStatus>,
}

/// A listing together with its seller's display details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithSeller {
    #[serde(flatten)]
    pub product: Product,
    pub seller: UserSummary,
}

/// Display projection of a listing embedded in other records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub category: ProductCategory,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    pub condition: Option<ProductCondition>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub university: Option<String>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single direct message between two users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub product_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

/// A message with participants and the referenced listing resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub product: Option<ProductSummary>,
    pub content: String,
    pub is_read: bool,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// One rating per (rater, rated user, product) triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub rated_user_id: Uuid,
    pub product_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: Uuid,
    pub rater: UserSummary,
    pub rated_user: UserSummary,
    /// `None` once the listing has been removed.
    pub product: Option<ProductSummary>,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// An abuse report against a user, listing or message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Option<Uuid>,
    pub reported_product_id: Option<Uuid>,
    pub report_type: ReportType,
    pub category: ReportCategory,
    pub reason: String,
    pub status: ReportStatus,
    pub admin_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub priority: ReportPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub reporter: UserSummary,
    pub reported_user: Option<UserSummary>,
    pub reported_product: Option<ProductSummary>,
    pub reviewer: Option<UserSummary>,
}

/// Staff review of a report; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ReportReview {
    pub status: Option<ReportStatus>,
    pub admin_note: Option<String>,
    pub priority: Option<ReportPriority>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub reporter_id: Option<Uuid>,
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub priority: Option<ReportPriority>,
}
