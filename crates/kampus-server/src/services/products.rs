//! Listings: browse, view, create, owner edits.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{
    DEFAULT_PRODUCT_PAGE_SIZE, MAX_DESCRIPTION_CHARS, MAX_PRODUCT_IMAGES, MAX_SHORT_TEXT_CHARS,
    MIN_PUBLISH_YEAR,
};
use kampus_shared::error::{optional_text, require_text};
use kampus_shared::pagination::{PageRequest, Pagination};
use kampus_shared::types::{ProductCategory, ProductCondition, ProductStatus};
use kampus_shared::ValidationError;
use kampus_store::{
    Database, NewProduct, Product, ProductFilter, ProductUpdate, ProductWithSeller,
};

use crate::error::{or_not_found, ServerError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub title: String,
    pub description: String,
    pub author: String,
    pub category: ProductCategory,
    pub condition: ProductCondition,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    pub publish_year: Option<i32>,
    pub university: String,
    pub department: String,
    #[serde(default)]
    #[validate(length(max = 5, message = "At most 5 images per listing"))]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub condition: Option<ProductCondition>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    pub condition: Option<ProductCondition>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub university: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<ProductWithSeller>,
    pub pagination: BrowsePagination,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowsePagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
}

impl From<Pagination> for BrowsePagination {
    fn from(p: Pagination) -> Self {
        Self {
            current_page: p.current,
            total_pages: p.pages,
            total_products: p.total,
        }
    }
}

/// Active listings only, newest first.
pub fn browse(db: &Database, query: BrowseQuery) -> Result<ProductPage, ServerError> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PRODUCT_PAGE_SIZE);
    let filter = ProductFilter {
        search: query.search,
        category: query.category,
        condition: query.condition,
        status: Some(ProductStatus::Active),
        min_price: query.min_price,
        max_price: query.max_price,
        university: query.university,
    };
    let (products, total) = db.search_products(&filter, page)?;
    Ok(ProductPage {
        products,
        pagination: Pagination::new(page, total).into(),
    })
}

/// Fetch a listing for display and count the view.
pub fn view(db: &Database, id: Uuid) -> Result<ProductWithSeller, ServerError> {
    let mut listing = db.get_product_with_seller(id).map_err(or_not_found("Product"))?;
    db.increment_view_count(id)?;
    listing.product.view_count += 1;
    Ok(listing)
}

pub fn create(db: &Database, seller: Uuid, input: CreateProduct) -> Result<Product, ServerError> {
    if let Some(year) = input.publish_year {
        check_publish_year(year)?;
    }
    if input.images.len() > MAX_PRODUCT_IMAGES {
        return Err(ServerError::BadRequest(format!(
            "At most {MAX_PRODUCT_IMAGES} images per listing"
        )));
    }

    let new = NewProduct {
        title: require_text("title", &input.title, MAX_SHORT_TEXT_CHARS)?,
        description: require_text("description", &input.description, MAX_DESCRIPTION_CHARS)?,
        author: require_text("author", &input.author, MAX_SHORT_TEXT_CHARS)?,
        category: input.category,
        condition: input.condition,
        price: input.price,
        publish_year: input.publish_year,
        university: require_text("university", &input.university, MAX_SHORT_TEXT_CHARS)?,
        department: require_text("department", &input.department, MAX_SHORT_TEXT_CHARS)?,
        images: input
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        seller_id: seller,
    };
    let product = db.create_product(&new)?;
    tracing::info!(product = %product.id, seller = %seller, "Listing created");
    Ok(product)
}

fn check_publish_year(year: i32) -> Result<(), ValidationError> {
    if (MIN_PUBLISH_YEAR..=Utc::now().year()).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: "publishYear",
        })
    }
}

fn owned_by(db: &Database, id: Uuid, caller: Uuid) -> Result<Product, ServerError> {
    let product = db.get_product(id).map_err(or_not_found("Product"))?;
    if product.seller_id != caller {
        return Err(ServerError::Forbidden("You can only modify your own listings".into()));
    }
    Ok(product)
}

/// Owner edit. The first move of a listing into `sold` credits the seller
/// with a sale; later round trips through `active` do not.
pub fn update(
    db: &Database,
    id: Uuid,
    caller: Uuid,
    input: &UpdateProduct,
) -> Result<Product, ServerError> {
    owned_by(db, id, caller)?;
    let update = ProductUpdate {
        title: optional_text("title", input.title.as_deref(), MAX_SHORT_TEXT_CHARS)?,
        description: optional_text(
            "description",
            input.description.as_deref(),
            MAX_DESCRIPTION_CHARS,
        )?,
        price: input.price,
        condition: input.condition,
        status: input.status,
    };
    let after = db.update_product(id, &update).map_err(or_not_found("Product"))?;

    if after.status == ProductStatus::Sold && db.mark_product_first_sold(id)? {
        db.increment_total_sales(after.seller_id)?;
        tracing::info!(product = %id, seller = %after.seller_id, "Listing sold");
    }
    Ok(after)
}

pub fn delete(db: &Database, id: Uuid, caller: Uuid) -> Result<(), ServerError> {
    owned_by(db, id, caller)?;
    db.delete_product(id)?;
    tracing::info!(product = %id, seller = %caller, "Listing deleted");
    Ok(())
}

/// The caller's listings in every status.
pub fn mine(db: &Database, caller: Uuid) -> Result<Vec<Product>, ServerError> {
    Ok(db.products_by_seller(caller, None)?)
}
