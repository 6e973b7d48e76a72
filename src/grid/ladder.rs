//! Ladder construction and price-to-level matching.
//!
//! Building the ladder is a pure function of the resolved configuration and
//! the venue's market rules: identical inputs always produce the identical
//! sequence of levels. Prices are rounded to the venue tick here, once, so
//! every later comparison works on the prices actually sent to the venue.

use super::config::{GridConfig, GridForm};
use super::types::GridLevel;
use crate::errors::{BotError, BotResult};
use crate::venue::types::MarketRules;

/// The ordered sequence of grid levels plus the quantities derived alongside
/// it: the matching tolerance base and the clamped per-level order size.
#[derive(Debug, Clone)]
pub struct Ladder {
    levels: Vec<GridLevel>,
    grid_space: f64,
    position_size: f64,
}

impl Ladder {
    /// Build the ladder for a validated configuration.
    ///
    /// Bounded configurations produce `num_grids` arithmetic rungs starting
    /// at `price_down`; the upper bound itself is not a rung. Ratio
    /// configurations produce `num_levels` geometric rungs on each side of
    /// the center plus the center itself. Fails if the configuration is
    /// invalid or if tick rounding collapses two adjacent rungs onto the
    /// same price.
    pub fn build(config: &GridConfig, rules: &MarketRules) -> BotResult<Self> {
        config.validate()?;

        let raw: Vec<f64> = match config.form {
            GridForm::Bounded {
                price_down,
                num_grids,
                ..
            } => {
                let space = config.grid_space();
                (0..num_grids)
                    .map(|i| price_down + space * i as f64)
                    .collect()
            }
            GridForm::Ratio { ratio, num_levels } => {
                let mut prices = Vec::with_capacity(num_levels as usize * 2 + 1);
                for k in (1..=num_levels).rev() {
                    prices.push(config.center / (1.0 + ratio).powi(k as i32));
                }
                prices.push(config.center);
                for k in 1..=num_levels {
                    prices.push(config.center * (1.0 + ratio).powi(k as i32));
                }
                prices
            }
        };

        let levels: Vec<GridLevel> = raw
            .iter()
            .enumerate()
            .map(|(i, price)| GridLevel::new(i, rules.round_price(*price)))
            .collect();

        for pair in levels.windows(2) {
            if pair[1].price <= pair[0].price {
                return Err(BotError::Configuration(format!(
                    "tick rounding collapsed adjacent rungs near {}; \
                     widen the spacing or the price range",
                    pair[0].price
                )));
            }
        }

        let position_size = rules.clamp_size(config.position_size_per_level());
        if position_size <= 0.0 {
            return Err(BotError::Configuration(
                "derived per-level order size is non-positive".into(),
            ));
        }

        Ok(Self {
            levels,
            grid_space: config.grid_space(),
            position_size,
        })
    }

    /// Number of rungs.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True when the ladder has no rungs.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// All rungs, ascending by price.
    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    /// Rung at `index`, if within bounds.
    pub fn get(&self, index: usize) -> Option<&GridLevel> {
        self.levels.get(index)
    }

    /// Mutable rung at `index`, if within bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut GridLevel> {
        self.levels.get_mut(index)
    }

    /// Price distance between adjacent rungs near the center.
    pub fn grid_space(&self) -> f64 {
        self.grid_space
    }

    /// Order size used at every rung, already clamped to the venue minimum.
    pub fn position_size(&self) -> f64 {
        self.position_size
    }

    /// Match an observed order price to a rung.
    ///
    /// Returns the first level in ascending index order whose price is
    /// within half a grid-spacing of `price`, or `None` when no rung
    /// qualifies. A midpoint tie therefore resolves to the lower rung. This
    /// is deliberately a heuristic: the venue reports order prices, not
    /// level indices, and a config or precision mismatch shows up here as a
    /// `None` rather than a wrong match.
    pub fn level_for_price(&self, price: f64) -> Option<usize> {
        let tolerance = self.grid_space / 2.0;
        self.levels
            .iter()
            .position(|level| (level.price - price).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::config::GridParams;
    use crate::grid::types::LevelStatus;

    fn bounded_config(center: f64) -> GridConfig {
        GridParams {
            capital: 2_100.0,
            leverage: 10,
            price_down: Some(93_000.0),
            price_up: Some(114_000.0),
            num_grids: Some(21),
            ratio: None,
            num_levels: None,
        }
        .resolve(center)
        .unwrap()
    }

    fn btc_rules() -> MarketRules {
        MarketRules::new(1.0, 0.001)
    }

    #[test]
    fn test_arithmetic_ladder_prices() {
        let ladder = Ladder::build(&bounded_config(107_000.0), &btc_rules()).unwrap();

        assert_eq!(ladder.len(), 21);
        assert!((ladder.get(0).unwrap().price - 93_000.0).abs() < 1e-9);
        assert!((ladder.get(20).unwrap().price - 113_000.0).abs() < 1e-9);
        // The upper bound is not a rung.
        assert!(ladder.levels().iter().all(|l| l.price < 114_000.0));
        assert!(ladder
            .levels()
            .iter()
            .all(|l| l.status == LevelStatus::Idle));
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = bounded_config(107_000.0);
        let a = Ladder::build(&config, &btc_rules()).unwrap();
        let b = Ladder::build(&config, &btc_rules()).unwrap();

        let prices_a: Vec<f64> = a.levels().iter().map(|l| l.price).collect();
        let prices_b: Vec<f64> = b.levels().iter().map(|l| l.price).collect();
        assert_eq!(prices_a, prices_b);
    }

    #[test]
    fn test_geometric_ladder_monotone() {
        let config = GridParams {
            capital: 500.0,
            leverage: 4,
            price_down: None,
            price_up: None,
            num_grids: None,
            ratio: Some(0.1),
            num_levels: Some(3),
        }
        .resolve(100.0)
        .unwrap();
        let ladder = Ladder::build(&config, &MarketRules::new(0.01, 0.001)).unwrap();

        assert_eq!(ladder.len(), 7);
        assert!((ladder.get(3).unwrap().price - 100.0).abs() < 1e-9);
        for pair in ladder.levels().windows(2) {
            assert!(pair[1].price > pair[0].price);
        }
    }

    #[test]
    fn test_prices_rounded_to_tick() {
        let config = GridParams {
            capital: 1_000.0,
            leverage: 1,
            price_down: Some(100.1),
            price_up: Some(110.1),
            num_grids: Some(10),
            ratio: None,
            num_levels: None,
        }
        .resolve(105.0)
        .unwrap();
        let ladder = Ladder::build(&config, &MarketRules::new(1.0, 0.001)).unwrap();

        assert!((ladder.get(0).unwrap().price - 100.0).abs() < 1e-9);
        assert!(ladder.levels().iter().all(|l| l.price.fract() == 0.0));
    }

    #[test]
    fn test_rounding_collision_rejected() {
        let config = GridParams {
            capital: 1_000.0,
            leverage: 1,
            price_down: Some(100.0),
            price_up: Some(102.0),
            num_grids: Some(2),
            ratio: None,
            num_levels: None,
        }
        .resolve(101.0)
        .unwrap();

        // Tick of 10 maps both rungs (100, 101) onto 100.
        let result = Ladder::build(&config, &MarketRules::new(10.0, 0.001));
        assert!(matches!(result, Err(BotError::Configuration(_))));
    }

    #[test]
    fn test_level_for_price_matching() {
        let ladder = Ladder::build(&bounded_config(107_000.0), &btc_rules()).unwrap();

        assert_eq!(ladder.level_for_price(93_000.0), Some(0));
        assert_eq!(ladder.level_for_price(113_000.0), Some(20));
        assert_eq!(ladder.level_for_price(107_400.0), Some(14));
        assert_eq!(ladder.level_for_price(107_600.0), Some(15));

        // Beyond half a spacing from any rung.
        assert_eq!(ladder.level_for_price(113_501.0), None);
        assert_eq!(ladder.level_for_price(92_499.0), None);

        // Midpoint tie resolves to the lower rung.
        assert_eq!(ladder.level_for_price(107_500.0), Some(14));
    }

    #[test]
    fn test_size_clamped_to_venue_minimum() {
        let config = GridParams {
            capital: 1.0,
            leverage: 1,
            price_down: Some(100.0),
            price_up: Some(110.0),
            num_grids: Some(10),
            ratio: None,
            num_levels: None,
        }
        .resolve(105.0)
        .unwrap();
        let ladder = Ladder::build(&config, &MarketRules::new(1.0, 0.5)).unwrap();
        assert!((ladder.position_size() - 0.5).abs() < 1e-9);
    }
}
