//! Closed-form transition probabilities of the two-state Markov chain.

use crate::likelihood::NUM_STATES;

/// Instantaneous rates of leaving each state.
///
/// `Rates([r0, r1])`: `r0` is the rate of leaving state 0 (0 → 1), `r1` the
/// rate of leaving state 1 (1 → 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates(pub [f64; NUM_STATES]);

impl Rates {
    /// Both rates zero; the chain never moves.
    pub const FROZEN: Rates = Rates([0.0, 0.0]);

    pub fn new(rate_0: f64, rate_1: f64) -> Self {
        Rates([rate_0, rate_1])
    }

    /// Sum of both rates.
    pub fn total(&self) -> f64 {
        self.0[0] + self.0[1]
    }

    /// Returns whether both rates are zero.
    pub fn is_frozen(&self) -> bool {
        self.0[0] == 0.0 && self.0[1] == 0.0
    }

    /// Returns whether any rate is negative.
    pub fn has_negative(&self) -> bool {
        self.0.iter().any(|&rate| rate < 0.0)
    }

    /// Stationary distribution `[r1 / (r0 + r1), r0 / (r0 + r1)]`.
    ///
    /// Not finite for frozen rates.
    pub fn stationary(&self) -> [f64; NUM_STATES] {
        let total = self.total();
        [self.0[1] / total, self.0[0] / total]
    }
}

/// Probability of ending in state `to` after time `length`, starting in `from`.
///
/// With `s = r0 + r1` and `e = exp(-s * length)`:
/// ```text
/// P(0 -> 0) = (r1 + r0 e) / s     P(0 -> 1) = r0 (1 - e) / s
/// P(1 -> 0) = r1 (1 - e) / s      P(1 -> 1) = (r0 + r1 e) / s
/// ```
/// For frozen rates or zero length the chain stays where it is.
///
/// # Panics
/// Panics if a state is not 0 or 1.
pub fn transition_probability(from: usize, to: usize, length: f64, rates: &Rates) -> f64 {
    assert!(from < NUM_STATES && to < NUM_STATES, "Mk2 states are 0 and 1");

    if rates.is_frozen() || length == 0.0 {
        return if from == to { 1.0 } else { 0.0 };
    }

    let total = rates.total();
    let decay = (-total * length).exp();
    let stay = rates.0[(to + 1) % NUM_STATES];
    let sign = if from == to { 1.0 } else { -1.0 };
    (stay + sign * rates.0[from] * decay) / total
}

/// Transition matrix `m[from][to]` for a branch of the given length.
pub fn transition_matrix(length: f64, rates: &Rates) -> [[f64; NUM_STATES]; NUM_STATES] {
    let mut matrix = [[0.0; NUM_STATES]; NUM_STATES];
    for (from, row) in matrix.iter_mut().enumerate() {
        for (to, entry) in row.iter_mut().enumerate() {
            *entry = transition_probability(from, to, length, rates);
        }
    }
    matrix
}
