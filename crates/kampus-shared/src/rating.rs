//! Rating aggregate: recomputed from the full set of a user's ratings on every
//! write, never maintained incrementally.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_RATING, MIN_RATING};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean star value rounded to one decimal; 0 when there are no ratings.
    pub average_rating: f64,
    pub total_ratings: u32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        average_rating: 0.0,
        total_ratings: 0,
    };
}

pub fn summarize(stars: &[u8]) -> RatingSummary {
    if stars.is_empty() {
        return RatingSummary::EMPTY;
    }
    let sum: u32 = stars.iter().map(|s| u32::from(*s)).sum();
    let mean = f64::from(sum) / stars.len() as f64;
    RatingSummary {
        average_rating: round_one_decimal(mean),
        total_ratings: stars.len() as u32,
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Count of ratings per star value, index 0 = one star.
pub fn distribution(stars: &[u8]) -> [u32; MAX_RATING as usize] {
    let mut counts = [0u32; MAX_RATING as usize];
    for star in stars {
        if (MIN_RATING..=MAX_RATING).contains(star) {
            counts[usize::from(*star - MIN_RATING)] += 1;
        }
    }
    counts
}
