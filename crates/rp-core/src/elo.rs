//! Elo rating arithmetic for pairwise comparisons.
//!
//! Pure functions, no state. Ratings are unbounded `f64`s; every update is
//! a zero-sum transfer between the two participants.

/// Standard K-factor: how much a single comparison can move a rating.
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Expected score for A against B: the probability, under the Elo model,
/// that A beats B. Symmetric: `expected_score(a, b) + expected_score(b, a) == 1`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// Update both ratings after a resolved comparison.
///
/// Returns `(new_rating_a, new_rating_b)`. The gain of one side equals the
/// loss of the other exactly. No clamping.
pub fn update_ratings(rating_a: f64, rating_b: f64, a_won: bool, k: f64) -> (f64, f64) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;

    let score_a = if a_won { 1.0 } else { 0.0 };
    let score_b = 1.0 - score_a;

    (
        rating_a + k * (score_a - expected_a),
        rating_b + k * (score_b - expected_b),
    )
}

/// Convert a rating difference (A minus B) to P(A beats B).
pub fn win_probability(rating_diff: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-rating_diff / 400.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_give_even_odds() {
        assert_eq!(expected_score(1500.0, 1500.0), 0.5);
        assert_eq!(expected_score(987.6, 987.6), 0.5);
    }

    #[test]
    fn expected_scores_are_complementary() {
        for (a, b) in [(1500.0, 1600.0), (1200.0, 1800.0), (1500.0, 1501.5)] {
            let sum = expected_score(a, b) + expected_score(b, a);
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn updates_are_zero_sum() {
        for (a, b, a_won) in [
            (1500.0, 1600.0, true),
            (1500.0, 1600.0, false),
            (1234.5, 1987.6, true),
        ] {
            let (new_a, new_b) = update_ratings(a, b, a_won, DEFAULT_K_FACTOR);
            let transfer = (new_a - a) + (new_b - b);
            assert!(transfer.abs() < 1e-12);
        }
    }

    #[test]
    fn even_match_moves_exactly_half_k() {
        // Both at 1500, K=32, A wins: expected score is exactly 0.5,
        // so A gains exactly 16 points and B loses exactly 16.
        let (new_a, new_b) = update_ratings(1500.0, 1500.0, true, 32.0);
        assert_eq!(new_a, 1516.0);
        assert_eq!(new_b, 1484.0);
    }

    #[test]
    fn upset_moves_more_than_expected_win() {
        let (favorite_wins, _) = update_ratings(1700.0, 1500.0, true, 32.0);
        let (_, upset_wins) = update_ratings(1700.0, 1500.0, false, 32.0);
        assert!(favorite_wins - 1700.0 < upset_wins - 1500.0);
    }

    #[test]
    fn win_probability_matches_expected_score() {
        let p = win_probability(1600.0 - 1500.0);
        assert!((p - expected_score(1600.0, 1500.0)).abs() < 1e-12);
    }
}
