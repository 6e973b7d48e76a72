//! Grid strategy parameters.
//!
//! Two equivalent parameterizations are accepted: a bounded form (an explicit
//! price range split into `num_grids` arithmetic steps) and a ratio form
//! (geometric rungs around the center). Raw [`GridParams`] come straight from
//! the settings file; [`GridParams::resolve`] pins them to the center price
//! sampled at startup and produces an immutable, validated [`GridConfig`].

use serde::{Deserialize, Serialize};

use crate::errors::{BotError, BotResult};

/// Raw strategy parameters as they appear in the settings file.
///
/// Exactly one parameterization must be supplied: either
/// `price_down`/`price_up`/`num_grids` (bounded) or `ratio`/`num_levels`
/// (geometric around the center). Supplying a mix or neither is rejected at
/// resolution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    /// Capital committed to the grid, in quote currency.
    #[serde(default = "default_capital")]
    pub capital: f64,

    /// Leverage multiplier applied to the capital.
    #[serde(default = "default_leverage")]
    pub leverage: u32,

    /// Lower price boundary (bounded form).
    #[serde(default)]
    pub price_down: Option<f64>,

    /// Upper price boundary (bounded form).
    #[serde(default)]
    pub price_up: Option<f64>,

    /// Number of arithmetic steps between the boundaries (bounded form).
    #[serde(default)]
    pub num_grids: Option<u32>,

    /// Per-rung price ratio, `0 < ratio < 1` (ratio form).
    #[serde(default)]
    pub ratio: Option<f64>,

    /// Rung count on each side of the center (ratio form).
    #[serde(default)]
    pub num_levels: Option<u32>,
}

fn default_capital() -> f64 {
    1_000.0
}

fn default_leverage() -> u32 {
    1
}

impl GridParams {
    /// Pin the parameters to the center price sampled at startup.
    ///
    /// Picks the parameterization from the fields that are present and
    /// validates the result.
    pub fn resolve(&self, center: f64) -> BotResult<GridConfig> {
        let bounded = (self.price_down, self.price_up, self.num_grids);
        let form = match (bounded, self.ratio, self.num_levels) {
            ((Some(price_down), Some(price_up), Some(num_grids)), None, None) => {
                GridForm::Bounded {
                    price_down,
                    price_up,
                    num_grids,
                }
            }
            ((None, None, None), Some(ratio), Some(num_levels)) => {
                GridForm::Ratio { ratio, num_levels }
            }
            ((None, None, None), None, None) => {
                return Err(BotError::Configuration(
                    "grid parameters missing: supply price_down/price_up/num_grids \
                     or ratio/num_levels"
                        .into(),
                ))
            }
            _ => {
                return Err(BotError::Configuration(
                    "grid parameters incomplete or mixed: supply either \
                     price_down/price_up/num_grids or ratio/num_levels"
                        .into(),
                ))
            }
        };

        let config = GridConfig {
            center,
            capital: self.capital,
            leverage: self.leverage,
            form,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Ladder geometry described by the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridForm {
    /// Arithmetic rungs at `price_down + i * grid_space`.
    Bounded {
        price_down: f64,
        price_up: f64,
        num_grids: u32,
    },
    /// Geometric rungs at `center / (1+ratio)^k` below and
    /// `center * (1+ratio)^k` above, plus the center itself.
    Ratio { ratio: f64, num_levels: u32 },
}

/// Resolved, validated strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Center price the grid is built around, sampled at startup.
    pub center: f64,
    /// Capital committed to the grid, in quote currency.
    pub capital: f64,
    /// Leverage multiplier.
    pub leverage: u32,
    /// Ladder geometry.
    pub form: GridForm,
}

impl GridConfig {
    /// Validate the configuration.
    ///
    /// Called by [`GridParams::resolve`]; exposed for configs constructed
    /// directly in code.
    pub fn validate(&self) -> BotResult<()> {
        if self.capital <= 0.0 {
            return Err(BotError::Configuration("capital must be positive".into()));
        }
        if self.leverage == 0 {
            return Err(BotError::Configuration(
                "leverage must be at least 1".into(),
            ));
        }
        if self.center <= 0.0 {
            return Err(BotError::Configuration(
                "center price must be positive".into(),
            ));
        }

        match self.form {
            GridForm::Bounded {
                price_down,
                price_up,
                num_grids,
            } => {
                if price_down <= 0.0 {
                    return Err(BotError::Configuration(
                        "price_down must be positive".into(),
                    ));
                }
                if price_down >= price_up {
                    return Err(BotError::Configuration(
                        "price_down must be less than price_up".into(),
                    ));
                }
                if num_grids == 0 {
                    return Err(BotError::Configuration(
                        "num_grids must be at least 1".into(),
                    ));
                }
                if self.center <= price_down || self.center >= price_up {
                    return Err(BotError::Configuration(format!(
                        "center price {} must lie strictly inside ({}, {})",
                        self.center, price_down, price_up
                    )));
                }
            }
            GridForm::Ratio { ratio, num_levels } => {
                if !(ratio > 0.0 && ratio < 1.0) {
                    return Err(BotError::Configuration(
                        "ratio must be strictly between 0 and 1".into(),
                    ));
                }
                if num_levels == 0 {
                    return Err(BotError::Configuration(
                        "num_levels must be at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Price distance between adjacent rungs near the center.
    ///
    /// Exact everywhere for the bounded form; for the ratio form this is the
    /// first geometric offset (`center * ratio`), which is what the matching
    /// tolerance is based on.
    pub fn grid_space(&self) -> f64 {
        match self.form {
            GridForm::Bounded {
                price_down,
                price_up,
                num_grids,
            } => (price_up - price_down) / num_grids as f64,
            GridForm::Ratio { ratio, .. } => self.center * ratio,
        }
    }

    /// Base size of each grid order, before venue minimum clamping.
    pub fn position_size_per_level(&self) -> f64 {
        let notional = self.capital * self.leverage as f64;
        match self.form {
            GridForm::Bounded { num_grids, .. } => notional / num_grids as f64,
            GridForm::Ratio { num_levels, .. } => notional / (num_levels as f64 * 2.0),
        }
    }

    /// Number of rungs the entry position must cover below the center.
    pub fn down_levels(&self) -> u32 {
        match self.form {
            GridForm::Bounded { price_down, .. } => {
                ((self.center - price_down) / self.grid_space()).floor() as u32
            }
            GridForm::Ratio { num_levels, .. } => num_levels,
        }
    }

    /// Number of rungs available above the center for take-profits.
    pub fn up_levels(&self) -> u32 {
        match self.form {
            GridForm::Bounded { price_up, .. } => {
                ((price_up - self.center) / self.grid_space()).floor() as u32
            }
            GridForm::Ratio { num_levels, .. } => num_levels,
        }
    }
}
