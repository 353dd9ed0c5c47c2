//! Ratings around the recompute-on-write aggregate.
//!
//! Every write is followed by a full recompute of the rated user's summary.
//! Within one process the database lock serializes writers; across
//! processes the summary may be briefly stale until the next write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kampus_shared::constants::{DEFAULT_PAGE_SIZE, MAX_RATING_COMMENT_CHARS};
use kampus_shared::error::optional_text;
use kampus_shared::pagination::{PageRequest, Pagination};
use kampus_shared::rating::{distribution, summarize};
use kampus_store::columns::now;
use kampus_store::{Database, Rating, RatingView, StoreError};

use crate::auth::AuthUser;
use crate::error::{or_not_found, ServerError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRating {
    pub rated_user: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRating {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPage {
    pub ratings: Vec<RatingView>,
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRatings {
    #[serde(flatten)]
    pub page: RatingPage,
    /// Over every rating the user received, not only this page.
    pub average_rating: f64,
    /// Count per star value, keyed `"1"` through `"5"`.
    pub rating_stats: BTreeMap<u8, u32>,
}

impl RatingPage {
    fn new(ratings: Vec<RatingView>, request: PageRequest, total: u64) -> Self {
        let pagination = Pagination::new(request, total);
        Self {
            ratings,
            total,
            total_pages: pagination.pages,
            current_page: pagination.current,
        }
    }
}

pub fn create(db: &Database, rater: Uuid, input: &CreateRating) -> Result<RatingView, ServerError> {
    if input.rated_user == rater {
        return Err(ServerError::BadRequest("You cannot rate yourself".into()));
    }
    let comment = optional_text("comment", input.comment.as_deref(), MAX_RATING_COMMENT_CHARS)?;

    if !db.user_exists(input.rated_user)? {
        return Err(ServerError::NotFound("User not found".into()));
    }
    if !db.product_exists(input.product_id)? {
        return Err(ServerError::NotFound("Product not found".into()));
    }
    if db
        .find_rating(rater, input.rated_user, input.product_id)?
        .is_some()
    {
        return Err(already_rated());
    }

    let at = now();
    let rating = Rating {
        id: Uuid::new_v4(),
        rater_id: rater,
        rated_user_id: input.rated_user,
        product_id: input.product_id,
        rating: input.rating,
        comment,
        created_at: at,
        updated_at: at,
    };
    db.insert_rating(&rating).map_err(|e| match e {
        StoreError::Conflict => already_rated(),
        other => other.into(),
    })?;
    db.recompute_user_rating(rating.rated_user_id)?;

    Ok(db.get_rating_view(rating.id)?)
}

fn already_rated() -> ServerError {
    ServerError::BadRequest("You have already rated this user for this product".into())
}

/// Public list of ratings a user received, with aggregate figures.
pub fn received(db: &Database, user_id: Uuid, query: PageQuery) -> Result<ReceivedRatings, ServerError> {
    if !db.user_exists(user_id)? {
        return Err(ServerError::NotFound("User not found".into()));
    }
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let (ratings, total) = db.ratings_received(user_id, request)?;

    let stars = db.rating_values_for(user_id)?;
    let rating_stats = distribution(&stars)
        .iter()
        .enumerate()
        .map(|(i, count)| (i as u8 + 1, *count))
        .collect();

    Ok(ReceivedRatings {
        page: RatingPage::new(ratings, request, total),
        average_rating: summarize(&stars).average_rating,
        rating_stats,
    })
}

/// Ratings a user gave. Visible to that user only.
pub fn given(
    db: &Database,
    caller: Uuid,
    user_id: Uuid,
    query: PageQuery,
) -> Result<RatingPage, ServerError> {
    if caller != user_id {
        return Err(ServerError::Forbidden("You can only view ratings you gave".into()));
    }
    let request = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let (ratings, total) = db.ratings_given(user_id, request)?;
    Ok(RatingPage::new(ratings, request, total))
}

pub fn update(
    db: &Database,
    id: Uuid,
    caller: Uuid,
    input: &UpdateRating,
) -> Result<RatingView, ServerError> {
    let existing = db.get_rating(id).map_err(or_not_found("Rating"))?;
    if existing.rater_id != caller {
        return Err(ServerError::Forbidden("You can only edit your own ratings".into()));
    }
    let comment = optional_text("comment", input.comment.as_deref(), MAX_RATING_COMMENT_CHARS)?;

    db.update_rating(id, input.rating, comment.as_deref())
        .map_err(or_not_found("Rating"))?;
    db.recompute_user_rating(existing.rated_user_id)?;
    Ok(db.get_rating_view(id)?)
}

/// Remove a rating. The rater or an admin may do this.
pub fn delete(db: &Database, id: Uuid, caller: &AuthUser) -> Result<(), ServerError> {
    let existing = db.get_rating(id).map_err(or_not_found("Rating"))?;
    if existing.rater_id != caller.id && !caller.is_admin() {
        return Err(ServerError::Forbidden("You can only delete your own ratings".into()));
    }
    db.delete_rating(id)?;
    db.recompute_user_rating(existing.rated_user_id)?;
    if caller.id != existing.rater_id {
        tracing::info!(rating = %id, admin = %caller.id, "Rating removed by admin");
    }
    Ok(())
}
