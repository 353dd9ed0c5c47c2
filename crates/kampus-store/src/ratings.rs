//! CRUD operations for [`Rating`]s and the recompute-on-write aggregate.
//!
//! The per-user summary is rebuilt from a full scan after every write. The
//! scan and the `users` update are separate statements with no transaction:
//! two overlapping writers can leave a stale summary until the next write,
//! which recomputes from scratch and corrects it.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use kampus_shared::pagination::PageRequest;
use kampus_shared::rating::{summarize, RatingSummary};

use crate::columns::{enum_at, images_at, now, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ProductSummary, Rating, RatingView, UserSummary};

const RATING_COLUMNS: &str =
    "id, rater_id, rated_user_id, product_id, rating, comment, created_at, updated_at";

const VIEW_SELECT: &str = "SELECT g.id, g.rating, g.comment, g.created_at, g.updated_at,
            r.id, r.name, r.email,
            u.id, u.name, u.email,
            p.id, p.title, p.price, p.category, p.images
     FROM ratings g
     JOIN users r ON r.id = g.rater_id
     JOIN users u ON u.id = g.rated_user_id
     LEFT JOIN products p ON p.id = g.product_id";

impl Database {
    pub fn insert_rating(&self, rating: &Rating) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO ratings (id, rater_id, rated_user_id, product_id, rating, comment,
                                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    rating.id.to_string(),
                    rating.rater_id.to_string(),
                    rating.rated_user_id.to_string(),
                    rating.product_id.to_string(),
                    rating.rating,
                    rating.comment,
                    ts(&rating.created_at),
                    ts(&rating.updated_at),
                ],
            )
            .map_err(StoreError::from_write)?;
        Ok(())
    }

    pub fn get_rating(&self, id: Uuid) -> Result<Rating> {
        self.conn()
            .query_row(
                &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = ?1"),
                params![id.to_string()],
                row_to_rating,
            )
            .map_err(StoreError::from_read)
    }

    pub fn get_rating_view(&self, id: Uuid) -> Result<RatingView> {
        self.conn()
            .query_row(
                &format!("{VIEW_SELECT} WHERE g.id = ?1"),
                params![id.to_string()],
                row_to_rating_view,
            )
            .map_err(StoreError::from_read)
    }

    /// The rating `rater` left for `rated` on `product`, if any.
    pub fn find_rating(&self, rater: Uuid, rated: Uuid, product: Uuid) -> Result<Option<Rating>> {
        let rating = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {RATING_COLUMNS} FROM ratings
                     WHERE rater_id = ?1 AND rated_user_id = ?2 AND product_id = ?3"
                ),
                params![rater.to_string(), rated.to_string(), product.to_string()],
                row_to_rating,
            )
            .optional()?;
        Ok(rating)
    }

    pub fn update_rating(&self, id: Uuid, stars: u8, comment: Option<&str>) -> Result<Rating> {
        let affected = self.conn().execute(
            "UPDATE ratings SET rating = ?2, comment = ?3, updated_at = ?4 WHERE id = ?1",
            params![id.to_string(), stars, comment, ts(&now())],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_rating(id)
    }

    pub fn delete_rating(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM ratings WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Every star value the user has received.
    pub fn rating_values_for(&self, user_id: Uuid) -> Result<Vec<u8>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT rating FROM ratings WHERE rated_user_id = ?1")?;
        let rows = stmt.query_map(params![user_id.to_string()], |row| row.get::<_, u8>(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    /// Rescan all ratings of `user_id` and store the fresh summary on the
    /// user row.
    pub fn recompute_user_rating(&self, user_id: Uuid) -> Result<RatingSummary> {
        let summary = summarize(&self.rating_values_for(user_id)?);
        self.set_user_rating_summary(user_id, summary)?;
        tracing::debug!(
            user = %user_id,
            average = summary.average_rating,
            total = summary.total_ratings,
            "recomputed rating summary"
        );
        Ok(summary)
    }

    /// Ratings the user received, newest first, with the total count.
    pub fn ratings_received(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<RatingView>, u64)> {
        self.rating_page("g.rated_user_id", user_id, page)
    }

    /// Ratings the user gave, newest first, with the total count.
    pub fn ratings_given(&self, user_id: Uuid, page: PageRequest) -> Result<(Vec<RatingView>, u64)> {
        self.rating_page("g.rater_id", user_id, page)
    }

    fn rating_page(
        &self,
        column: &str,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<RatingView>, u64)> {
        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM ratings g WHERE {column} = ?1"),
            params![user_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "{VIEW_SELECT} WHERE {column} = ?1
             ORDER BY g.created_at DESC, g.rowid DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(
            params![user_id.to_string(), page.limit, page.offset()],
            row_to_rating_view,
        )?;

        let mut ratings = Vec::new();
        for row in rows {
            ratings.push(row?);
        }
        Ok((ratings, total as u64))
    }
}

fn row_to_rating(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: uuid_at(row, 0)?,
        rater_id: uuid_at(row, 1)?,
        rated_user_id: uuid_at(row, 2)?,
        product_id: uuid_at(row, 3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: ts_at(row, 6)?,
        updated_at: ts_at(row, 7)?,
    })
}

fn row_to_rating_view(row: &rusqlite::Row<'_>) -> rusqlite::Result<RatingView> {
    let product_id: Option<String> = row.get(11)?;
    let product = match product_id {
        Some(_) => Some(ProductSummary {
            id: uuid_at(row, 11)?,
            title: row.get(12)?,
            price: row.get(13)?,
            category: enum_at(row, 14)?,
            images: images_at(row, 15)?,
        }),
        None => None,
    };

    Ok(RatingView {
        id: uuid_at(row, 0)?,
        rating: row.get(1)?,
        comment: row.get(2)?,
        created_at: ts_at(row, 3)?,
        updated_at: ts_at(row, 4)?,
        rater: UserSummary {
            id: uuid_at(row, 5)?,
            name: row.get(6)?,
            email: row.get(7)?,
        },
        rated_user: UserSummary {
            id: uuid_at(row, 8)?,
            name: row.get(9)?,
            email: row.get(10)?,
        },
        product,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::tests::new_product;
    use crate::users::tests::new_user;

    fn rating(rater: Uuid, rated: Uuid, product: Uuid, stars: u8) -> Rating {
        let at = now();
        Rating {
            id: Uuid::new_v4(),
            rater_id: rater,
            rated_user_id: rated,
            product_id: product,
            rating: stars,
            comment: None,
            created_at: at,
            updated_at: at,
        }
    }

    struct Fixture {
        db: Database,
        seller: Uuid,
        buyers: Vec<Uuid>,
        product: Uuid,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let seller = db.create_user(&new_user("Selin")).unwrap().id;
        let buyers = ["Ayse", "Burak", "Cem"]
            .iter()
            .map(|n| db.create_user(&new_user(n)).unwrap().id)
            .collect();
        let product = db.create_product(&new_product(seller, "Physics I")).unwrap().id;
        Fixture {
            db,
            seller,
            buyers,
            product,
        }
    }

    #[test]
    fn recompute_averages_all_ratings() {
        let f = fixture();
        for (buyer, stars) in f.buyers.iter().zip([5, 3, 4]) {
            f.db.insert_rating(&rating(*buyer, f.seller, f.product, stars)).unwrap();
        }

        let summary = f.db.recompute_user_rating(f.seller).unwrap();
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.total_ratings, 3);

        let user = f.db.get_user(f.seller).unwrap();
        assert_eq!(user.average_rating, 4.0);
        assert_eq!(user.total_ratings, 3);
    }

    #[test]
    fn duplicate_triple_conflicts() {
        let f = fixture();
        f.db.insert_rating(&rating(f.buyers[0], f.seller, f.product, 5)).unwrap();
        let err = f
            .db
            .insert_rating(&rating(f.buyers[0], f.seller, f.product, 2))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert!(f.db.find_rating(f.buyers[0], f.seller, f.product).unwrap().is_some());
    }

    #[test]
    fn delete_last_rating_resets_summary() {
        let f = fixture();
        let r = rating(f.buyers[0], f.seller, f.product, 2);
        f.db.insert_rating(&r).unwrap();
        f.db.recompute_user_rating(f.seller).unwrap();

        assert!(f.db.delete_rating(r.id).unwrap());
        let summary = f.db.recompute_user_rating(f.seller).unwrap();
        assert_eq!(summary, RatingSummary::EMPTY);
        assert!(!f.db.delete_rating(r.id).unwrap());
    }

    #[test]
    fn stale_summary_is_corrected_by_next_recompute() {
        let f = fixture();
        f.db.insert_rating(&rating(f.buyers[0], f.seller, f.product, 5)).unwrap();

        // Writer one scans before writer two inserts, then writes last.
        let stale = summarize(&f.db.rating_values_for(f.seller).unwrap());
        f.db.insert_rating(&rating(f.buyers[1], f.seller, f.product, 1)).unwrap();
        f.db.recompute_user_rating(f.seller).unwrap();
        f.db.set_user_rating_summary(f.seller, stale).unwrap();
        assert_eq!(f.db.get_user(f.seller).unwrap().total_ratings, 1);

        f.db.insert_rating(&rating(f.buyers[2], f.seller, f.product, 3)).unwrap();
        f.db.recompute_user_rating(f.seller).unwrap();
        let user = f.db.get_user(f.seller).unwrap();
        assert_eq!(user.total_ratings, 3);
        assert_eq!(user.average_rating, 3.0);
    }

    #[test]
    fn received_and_given_pages() {
        let f = fixture();
        for (buyer, stars) in f.buyers.iter().zip([5, 4, 3]) {
            f.db.insert_rating(&rating(*buyer, f.seller, f.product, stars)).unwrap();
        }
        let page = PageRequest::new(Some(1), Some(2), 10);

        let (received, total) = f.db.ratings_received(f.seller, page).unwrap();
        assert_eq!(total, 3);
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].rater.name, "Cem");
        assert_eq!(received[0].product.as_ref().map(|p| p.id), Some(f.product));

        let (given, total) = f.db.ratings_given(f.buyers[0], page).unwrap();
        assert_eq!(total, 1);
        assert_eq!(given[0].rated_user.id, f.seller);
    }

    #[test]
    fn rating_survives_listing_removal() {
        let f = fixture();
        let r = rating(f.buyers[0], f.seller, f.product, 4);
        f.db.insert_rating(&r).unwrap();
        f.db.delete_product(f.product).unwrap();

        let view = f.db.get_rating_view(r.id).unwrap();
        assert!(view.product.is_none());
        assert_eq!(view.rating, 4);
    }

    #[test]
    fn update_changes_stars_and_comment() {
        let f = fixture();
        let r = rating(f.buyers[0], f.seller, f.product, 2);
        f.db.insert_rating(&r).unwrap();

        let updated = f.db.update_rating(r.id, 5, Some("great seller")).unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.comment.as_deref(), Some("great seller"));
        assert!(updated.updated_at >= r.updated_at);
        assert!(matches!(
            f.db.update_rating(Uuid::new_v4(), 3, None),
            Err(StoreError::NotFound)
        ));
    }
}
