//! Trust score: a bounded [0, 100] reputation number derived on demand from
//! rating history, sales, verification and account age.

use chrono::{DateTime, Duration, Utc};

pub const BASE_SCORE: i32 = 50;

/// Accounts at least this old earn the seniority bonus (six 30-day months).
pub const SENIORITY_DAYS: i64 = 6 * 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustInputs {
    pub average_rating: f64,
    pub total_ratings: u32,
    pub total_sales: u32,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

pub fn trust_score(inputs: &TrustInputs, now: DateTime<Utc>) -> u8 {
    let mut score = BASE_SCORE;

    // An unrated account has no average to reward or penalise.
    if inputs.total_ratings > 0 {
        score += rating_adjustment(inputs.average_rating);
    }

    score += match inputs.total_ratings {
        n if n >= 50 => 15,
        n if n >= 20 => 10,
        n if n >= 10 => 5,
        _ => 0,
    };

    score += match inputs.total_sales {
        n if n >= 20 => 10,
        n if n >= 10 => 5,
        _ => 0,
    };

    if inputs.is_email_verified {
        score += 5;
    }

    if now - inputs.created_at >= Duration::days(SENIORITY_DAYS) {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

fn rating_adjustment(average: f64) -> i32 {
    if average >= 4.5 {
        20
    } else if average >= 4.0 {
        15
    } else if average >= 3.5 {
        10
    } else if average >= 3.0 {
        5
    } else if average < 2.5 {
        -15
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(now: DateTime<Utc>) -> TrustInputs {
        TrustInputs {
            average_rating: 0.0,
            total_ratings: 0,
            total_sales: 0,
            is_email_verified: false,
            created_at: now,
        }
    }

    #[test]
    fn brand_new_account_scores_fifty() {
        let now = Utc::now();
        assert_eq!(trust_score(&fresh(now), now), 50);
    }

    #[test]
    fn rating_tiers() {
        let now = Utc::now();
        let with_avg = |avg| TrustInputs {
            average_rating: avg,
            total_ratings: 1,
            ..fresh(now)
        };
        assert_eq!(trust_score(&with_avg(4.5), now), 70);
        assert_eq!(trust_score(&with_avg(4.0), now), 65);
        assert_eq!(trust_score(&with_avg(3.5), now), 60);
        assert_eq!(trust_score(&with_avg(3.0), now), 55);
        assert_eq!(trust_score(&with_avg(2.7), now), 50);
        assert_eq!(trust_score(&with_avg(1.0), now), 35);
    }

    #[test]
    fn seasoned_seller_is_capped_at_hundred() {
        let now = Utc::now();
        let inputs = TrustInputs {
            average_rating: 4.9,
            total_ratings: 60,
            total_sales: 25,
            is_email_verified: true,
            created_at: now - Duration::days(400),
        };
        // 50 + 20 + 15 + 10 + 5 + 5 = 105
        assert_eq!(trust_score(&inputs, now), 100);
    }

    #[test]
    fn seniority_starts_at_six_months() {
        let now = Utc::now();
        let young = TrustInputs {
            created_at: now - Duration::days(SENIORITY_DAYS - 1),
            ..fresh(now)
        };
        let old = TrustInputs {
            created_at: now - Duration::days(SENIORITY_DAYS),
            ..fresh(now)
        };
        assert_eq!(trust_score(&young, now), 50);
        assert_eq!(trust_score(&old, now), 55);
    }

    #[test]
    fn count_and_sales_tiers() {
        let now = Utc::now();
        let inputs = TrustInputs {
            average_rating: 2.6,
            total_ratings: 20,
            total_sales: 10,
            ..fresh(now)
        };
        assert_eq!(trust_score(&inputs, now), 65);
    }
}
