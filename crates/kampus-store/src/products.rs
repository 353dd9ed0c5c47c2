//! CRUD operations for [`Product`] listings.

use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

use kampus_shared::pagination::PageRequest;
use kampus_shared::types::ProductStatus;

use crate::columns::{enum_at, images_at, now, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    NewProduct, Product, ProductFilter, ProductSummary, ProductUpdate, ProductWithSeller,
    UserSummary,
};
use crate::query::Filter;

const PRODUCT_COLUMNS: &str = "p.id, p.title, p.description, p.author, p.category, p.condition,
     p.price, p.publish_year, p.university, p.department, p.images, p.seller_id, p.status,
     p.view_count, p.created_at, p.updated_at";

/// Columns 16..=18 after [`PRODUCT_COLUMNS`].
const SELLER_COLUMNS: &str = "u.id, u.name, u.email";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create_product(&self, new: &NewProduct) -> Result<Product> {
        let id = Uuid::new_v4();
        let now = ts(&now());

        self.conn()
            .execute(
                "INSERT INTO products (id, title, description, author, category, condition,
                                       price, publish_year, university, department, images,
                                       seller_id, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
                params![
                    id.to_string(),
                    new.title,
                    new.description,
                    new.author,
                    new.category.as_str(),
                    new.condition.as_str(),
                    new.price,
                    new.publish_year,
                    new.university,
                    new.department,
                    serde_json::to_string(&new.images)?,
                    new.seller_id.to_string(),
                    ProductStatus::Active.as_str(),
                    now,
                ],
            )
            .map_err(StoreError::from_write)?;

        self.get_product(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_product(&self, id: Uuid) -> Result<Product> {
        self.conn()
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"),
                params![id.to_string()],
                row_to_product,
            )
            .map_err(StoreError::from_read)
    }

    pub fn get_product_with_seller(&self, id: Uuid) -> Result<ProductWithSeller> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {PRODUCT_COLUMNS}, {SELLER_COLUMNS}
                     FROM products p JOIN users u ON u.id = p.seller_id
                     WHERE p.id = ?1"
                ),
                params![id.to_string()],
                row_to_product_with_seller,
            )
            .map_err(StoreError::from_read)
    }

    pub fn product_exists(&self, id: Uuid) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM products WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Display details for a listing, or `None` if it no longer exists.
    pub fn product_summary(&self, id: Uuid) -> Result<Option<ProductSummary>> {
        let summary = self
            .conn()
            .query_row(
                "SELECT id, title, price, category, images FROM products WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(ProductSummary {
                        id: uuid_at(row, 0)?,
                        title: row.get(1)?,
                        price: row.get(2)?,
                        category: enum_at(row, 3)?,
                        images: images_at(row, 4)?,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }

    /// Filtered, paginated listing search, newest first. Returns the page and
    /// the total number of matches.
    pub fn search_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProductWithSeller>, u64)> {
        let mut f = Filter::new();
        if let Some(status) = filter.status {
            f.push("p.status = ?", status.as_str().to_string());
        }
        if let Some(search) = &filter.search {
            f.search(&["p.title", "p.description", "p.author"], search);
        }
        if let Some(category) = filter.category {
            f.push("p.category = ?", category.as_str().to_string());
        }
        if let Some(condition) = filter.condition {
            f.push("p.condition = ?", condition.as_str().to_string());
        }
        if let Some(min) = filter.min_price {
            f.push("p.price >= ?", min);
        }
        if let Some(max) = filter.max_price {
            f.push("p.price <= ?", max);
        }
        if let Some(university) = &filter.university {
            f.search(&["p.university"], university);
        }

        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM products p{}", f.where_sql()),
            params_from_iter(f.params()),
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRODUCT_COLUMNS}, {SELLER_COLUMNS}
             FROM products p JOIN users u ON u.id = p.seller_id{}
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ? OFFSET ?",
            f.where_sql()
        ))?;
        let rows = stmt.query_map(
            params_from_iter(f.params_with_page(page.limit, page.offset())),
            row_to_product_with_seller,
        )?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok((products, total as u64))
    }

    /// A seller's listings, newest first, optionally restricted to one status.
    pub fn products_by_seller(
        &self,
        seller_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE p.seller_id = ?1 AND (?2 IS NULL OR p.status = ?2)
             ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let rows = stmt.query_map(
            params![seller_id.to_string(), status.map(|s| s.as_str())],
            row_to_product,
        )?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    pub fn count_products_by_seller(
        &self,
        seller_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM products WHERE seller_id = ?1 AND (?2 IS NULL OR status = ?2)",
            params![seller_id.to_string(), status.map(|s| s.as_str())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn recent_products(&self, limit: u32) -> Result<Vec<ProductWithSeller>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRODUCT_COLUMNS}, {SELLER_COLUMNS}
             FROM products p JOIN users u ON u.id = p.seller_id
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], row_to_product_with_seller)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    pub fn increment_view_count(&self, id: Uuid) -> Result<()> {
        self.conn().execute(
            "UPDATE products SET view_count = view_count + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    pub fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Product> {
        let affected = self.conn().execute(
            "UPDATE products SET
                 title       = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 price       = COALESCE(?4, price),
                 condition   = COALESCE(?5, condition),
                 status      = COALESCE(?6, status),
                 updated_at  = ?7
             WHERE id = ?1",
            params![
                id.to_string(),
                update.title,
                update.description,
                update.price,
                update.condition.map(|c| c.as_str()),
                update.status.map(|s| s.as_str()),
                ts(&now()),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_product(id)
    }

    /// Stamp the first sale of a listing. Returns `false` when the listing
    /// was already sold once, so callers credit the seller only on `true`.
    pub fn mark_product_first_sold(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE products SET sold_at = ?2 WHERE id = ?1 AND sold_at IS NULL",
            params![id.to_string(), ts(&now())],
        )?;
        Ok(affected == 1)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_product(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM products WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

pub(crate) fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author: row.get(3)?,
        category: enum_at(row, 4)?,
        condition: enum_at(row, 5)?,
        price: row.get(6)?,
        publish_year: row.get(7)?,
        university: row.get(8)?,
        department: row.get(9)?,
        images: images_at(row, 10)?,
        seller_id: uuid_at(row, 11)?,
        status: enum_at(row, 12)?,
        view_count: row.get(13)?,
        created_at: ts_at(row, 14)?,
        updated_at: ts_at(row, 15)?,
    })
}

fn row_to_product_with_seller(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductWithSeller> {
    Ok(ProductWithSeller {
        product: row_to_product(row)?,
        seller: UserSummary {
            id: uuid_at(row, 16)?,
            name: row.get(17)?,
            email: row.get(18)?,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::users::tests::new_user;
    use kampus_shared::types::{ProductCategory, ProductCondition};

    pub(crate) fn new_product(seller_id: Uuid, title: &str) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            description: "Clean copy, no highlighting".to_string(),
            author: "Stewart".to_string(),
            category: ProductCategory::Textbook,
            condition: ProductCondition::LikeNew,
            price: 150.0,
            publish_year: Some(2019),
            university: "Ege University".to_string(),
            department: "Mathematics".to_string(),
            images: vec!["/uploads/products/calc.jpg".to_string()],
            seller_id,
        }
    }

    #[test]
    fn create_and_fetch_with_seller() {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Ayse")).unwrap();
        let product = db.create_product(&new_product(seller.id, "Calculus")).unwrap();

        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.images, vec!["/uploads/products/calc.jpg".to_string()]);

        let with_seller = db.get_product_with_seller(product.id).unwrap();
        assert_eq!(with_seller.product, product);
        assert_eq!(with_seller.seller.name, "Ayse");
    }

    #[test]
    fn search_filters_status_text_and_price() {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Ayse")).unwrap();
        let calc = db.create_product(&new_product(seller.id, "Calculus")).unwrap();
        let mut physics = new_product(seller.id, "Physics");
        physics.price = 40.0;
        let physics = db.create_product(&physics).unwrap();
        let sold = db.create_product(&new_product(seller.id, "Calculus II")).unwrap();
        db.update_product(
            sold.id,
            &ProductUpdate {
                status: Some(ProductStatus::Sold),
                ..Default::default()
            },
        )
        .unwrap();

        let page = PageRequest::new(None, None, 12);
        let active = ProductFilter {
            status: Some(ProductStatus::Active),
            ..Default::default()
        };

        let (all, total) = db.search_products(&active, page).unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (found, _) = db
            .search_products(
                &ProductFilter {
                    search: Some("CALC".into()),
                    ..active.clone()
                },
                page,
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product.id, calc.id);

        let (cheap, _) = db
            .search_products(
                &ProductFilter {
                    max_price: Some(50.0),
                    ..active.clone()
                },
                page,
            )
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].product.id, physics.id);
    }

    #[test]
    fn seller_listing_and_counts() {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Ayse")).unwrap();
        let a = db.create_product(&new_product(seller.id, "A")).unwrap();
        db.create_product(&new_product(seller.id, "B")).unwrap();
        db.update_product(
            a.id,
            &ProductUpdate {
                status: Some(ProductStatus::Inactive),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(db.products_by_seller(seller.id, None).unwrap().len(), 2);
        assert_eq!(
            db.count_products_by_seller(seller.id, Some(ProductStatus::Active))
                .unwrap(),
            1
        );
    }

    #[test]
    fn view_count_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Ayse")).unwrap();
        let product = db.create_product(&new_product(seller.id, "A")).unwrap();

        db.increment_view_count(product.id).unwrap();
        assert_eq!(db.get_product(product.id).unwrap().view_count, 1);

        assert!(db.delete_product(product.id).unwrap());
        assert!(!db.delete_product(product.id).unwrap());
        assert!(matches!(db.get_product(product.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn first_sale_is_stamped_once() {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Ayse")).unwrap();
        let product = db.create_product(&new_product(seller.id, "Calculus")).unwrap();

        assert!(db.mark_product_first_sold(product.id).unwrap());
        assert!(!db.mark_product_first_sold(product.id).unwrap());
        assert!(!db.mark_product_first_sold(Uuid::new_v4()).unwrap());
    }
}
