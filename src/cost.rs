//! Gas-cost estimate for one commute, penalized by the misery tier.
//!
//! Misery degrades effective fuel economy (stop-and-go, detours, AC load):
//! Rage → 60% of base mpg, Medium → 80%, Chill → no penalty. Config values
//! are validated strictly positive at startup, so the division is safe.

use crate::config::CommuteConfig;
use crate::score::Tier;

/// Estimated fuel cost in dollars, rounded half-away-from-zero to 2 decimals.
pub fn estimate_gas_cost(score: u32, commute: &CommuteConfig) -> f64 {
    let factor = match Tier::from_score(score) {
        Tier::Rage => 0.6,
        Tier::Medium => 0.8,
        Tier::Chill => 1.0,
    };
    let effective_mpg = commute.base_mpg * factor;
    let gallons = commute.distance_miles / effective_mpg;
    round2(gallons * commute.gas_price)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commute() -> CommuteConfig {
        CommuteConfig {
            distance_miles: 56.0,
            base_mpg: 24.0,
            gas_price: 4.75,
        }
    }

    #[test]
    fn reference_vector_at_score_25() {
        // effective mpg = 24 * 0.6 = 14.4; 56 / 14.4 * 4.75 = 18.4722…
        let cost = estimate_gas_cost(25, &commute());
        assert_eq!(cost, 18.47);
    }

    #[test]
    fn no_penalty_below_ten() {
        // 56 / 24 * 4.75 = 11.0833…
        assert_eq!(estimate_gas_cost(0, &commute()), 11.08);
        assert_eq!(estimate_gas_cost(9, &commute()), 11.08);
    }

    #[test]
    fn medium_penalty_from_ten() {
        // 56 / 19.2 * 4.75 = 13.8541…
        assert_eq!(estimate_gas_cost(10, &commute()), 13.85);
        assert_eq!(estimate_gas_cost(19, &commute()), 13.85);
    }

    #[test]
    fn worst_penalty_from_twenty() {
        assert_eq!(estimate_gas_cost(20, &commute()), 18.47);
    }

    #[test]
    fn cost_never_decreases_as_score_rises() {
        let c = commute();
        let mut prev = 0.0;
        for score in 0..=50 {
            let cost = estimate_gas_cost(score, &c);
            assert!(
                cost >= prev,
                "cost dropped from {prev} to {cost} at score {score}"
            );
            prev = cost;
        }
    }
}
