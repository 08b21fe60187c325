//! Root priors: how the conditional likelihoods at the root are weighted.

use crate::likelihood::error::ConfigError;
use crate::likelihood::transition::Rates;
use crate::likelihood::NUM_STATES;
use std::str::FromStr;

/// Weighting of the root states before summing to the total likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RootPrior {
    /// Stationary distribution of the chain under the evaluated rates
    Stationary,
    /// Equal weight for every state
    #[default]
    Uniform,
    /// The root's own normalized conditional likelihoods
    CondLike,
    /// Explicit weights, used as given
    Fixed([f64; NUM_STATES]),
}

impl RootPrior {
    /// Creates a prior with explicit weights, one per state.
    ///
    /// # Errors
    /// [ConfigError::InvalidRootWeights] if not exactly two weights are given.
    pub fn from_weights(weights: &[f64]) -> Result<Self, ConfigError> {
        let weights: [f64; NUM_STATES] = weights
            .try_into()
            .map_err(|_| ConfigError::InvalidRootWeights(weights.len()))?;
        Ok(RootPrior::Fixed(weights))
    }

    /// Returns the weight of each root state.
    ///
    /// For [RootPrior::CondLike] all weights are zero if `root_cl` sums to zero,
    /// which makes the likelihood zero.
    pub fn weights(&self, root_cl: &[f64; NUM_STATES], rates: &Rates) -> [f64; NUM_STATES] {
        match self {
            RootPrior::Stationary => rates.stationary(),
            RootPrior::Uniform => [1.0 / NUM_STATES as f64; NUM_STATES],
            RootPrior::CondLike => {
                let sum: f64 = root_cl.iter().sum();
                if sum == 0.0 {
                    [0.0; NUM_STATES]
                } else {
                    root_cl.map(|cl| cl / sum)
                }
            }
            RootPrior::Fixed(weights) => *weights,
        }
    }
}

impl FromStr for RootPrior {
    type Err = ConfigError;

    /// Parses `stationary`, `uniform` or `condlike`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stationary" => Ok(RootPrior::Stationary),
            "uniform" => Ok(RootPrior::Uniform),
            "condlike" => Ok(RootPrior::CondLike),
            other => Err(ConfigError::UnknownRootPrior(other.to_string())),
        }
    }
}
