//! Mk2 likelihood of binary tip states on a tree.
//!
//! The likelihood is computed with Felsenstein's pruning algorithm in a single
//! post-order pass. Conditional likelihoods are rescaled at every vertex with
//! more than one child and the scaling factors are kept on log scale, so the
//! true likelihood mass of a vertex is `cl * exp(lq)`. Scratch values live in
//! per-call buffers indexed by [VertexIndex]; the tree itself is only read.
//!
//! # Usage
//! ```
//! use mk2fit::likelihood::{Mk2Config, Mk2Model, RootPrior};
//! use mk2fit::model::{BranchLength, CharacterState, Tree};
//!
//! let mut tree = Tree::new();
//! let a = tree.add_tip(Some("A"), Some(CharacterState::Discrete(0)), Some(BranchLength::new(1.0)));
//! let b = tree.add_tip(Some("B"), Some(CharacterState::Discrete(1)), Some(BranchLength::new(1.0)));
//! tree.add_root(vec![a, b], None);
//!
//! let model = Mk2Model::new(Mk2Config::new().with_root_prior(RootPrior::Uniform));
//! let nll = model.neg_log_likelihood(&[0.5, 0.5], &tree).unwrap();
//! assert!((nll + (0.25 * (1.0 - (-2.0f64).exp())).ln()).abs() < 1e-12);
//! ```

pub mod error;
pub mod root_prior;
pub mod transition;

pub use self::error::{ConfigError, LikelihoodError};
pub use self::root_prior::RootPrior;
pub use self::transition::{Rates, transition_matrix, transition_probability};

use crate::model::{CharacterState, Tree, Vertex, VertexIndex, VertexKind};
use crate::time::TimeWindow;

/// Number of character states of the Mk2 model.
pub const NUM_STATES: usize = 2;

// =#========================================================================#=
// CONFIGURATION
// =#========================================================================#=
/// How the free parameters map to the two rates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RateMode {
    /// Two free parameters: rate out of state 0, rate out of state 1
    #[default]
    Free,
    /// One free parameter used for both directions
    Equal,
    /// One free parameter; `rate` is inserted at `index` (0 or 1)
    Fix { rate: f64, index: usize },
}

impl RateMode {
    /// Maps a mode name to a [RateMode]: `"fix"`, `"equal"`, anything else is [RateMode::Free].
    pub fn parse(name: &str, fixed_rate: f64, fixed_index: usize) -> Self {
        match name {
            "fix" => RateMode::Fix {
                rate: fixed_rate,
                index: fixed_index,
            },
            "equal" => RateMode::Equal,
            _ => RateMode::Free,
        }
    }

    /// Number of free parameters this mode expects.
    pub fn num_parameters(&self) -> usize {
        match self {
            RateMode::Free => NUM_STATES,
            RateMode::Equal | RateMode::Fix { .. } => 1,
        }
    }

    /// Builds the full rate vector from the free parameters.
    ///
    /// # Errors
    /// [LikelihoodError::InvalidParameterCount] if `params` has the wrong length,
    /// [LikelihoodError::InvalidFixedRateIndex] if a fixed rate index is not 0 or 1.
    pub fn assemble(&self, params: &[f64]) -> Result<Rates, LikelihoodError> {
        let expected = self.num_parameters();
        if params.len() != expected {
            return Err(LikelihoodError::InvalidParameterCount {
                expected,
                got: params.len(),
            });
        }

        match *self {
            RateMode::Free => Ok(Rates::new(params[0], params[1])),
            RateMode::Equal => Ok(Rates::new(params[0], params[0])),
            RateMode::Fix { rate, index: 0 } => Ok(Rates::new(rate, params[0])),
            RateMode::Fix { rate, index: 1 } => Ok(Rates::new(params[0], rate)),
            RateMode::Fix { index, .. } => Err(LikelihoodError::InvalidFixedRateIndex(index)),
        }
    }
}

/// Configuration of an [Mk2Model].
///
/// Defaults: [RootPrior::Uniform], [RateMode::Free], no time window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mk2Config {
    root_prior: RootPrior,
    rate_mode: RateMode,
    time_window: Option<TimeWindow>,
}

impl Mk2Config {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root prior.
    pub fn with_root_prior(mut self, root_prior: RootPrior) -> Self {
        self.root_prior = root_prior;
        self
    }

    /// Sets how free parameters map to rates.
    pub fn with_rate_mode(mut self, rate_mode: RateMode) -> Self {
        self.rate_mode = rate_mode;
        self
    }

    /// Restricts transitions to branches below vertices with a time in `window`.
    ///
    /// Vertex times must be assigned, see [crate::time].
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn root_prior(&self) -> RootPrior {
        self.root_prior
    }

    pub fn rate_mode(&self) -> RateMode {
        self.rate_mode
    }

    pub fn time_window(&self) -> Option<TimeWindow> {
        self.time_window
    }
}

// =#========================================================================#=
// MODEL
// =#========================================================================#=
/// Conditional likelihoods and log scaling factors of one pruning pass.
///
/// Both vectors are indexed by [VertexIndex].
#[derive(Debug, Clone, PartialEq)]
pub struct PruningResult {
    /// Rescaled conditional likelihood per vertex and state
    pub cl: Vec<[f64; NUM_STATES]>,
    /// Accumulated log scaling factor per vertex
    pub lq: Vec<f64>,
    root: VertexIndex,
}

impl PruningResult {
    /// Index of the root the pass started from.
    pub fn root(&self) -> VertexIndex {
        self.root
    }

    /// Unscaled likelihood mass `cl * exp(lq)` of a vertex.
    ///
    /// May underflow to zero on large trees; use for checks on small trees.
    pub fn mass(&self, index: VertexIndex) -> [f64; NUM_STATES] {
        let scale = self.lq[index].exp();
        self.cl[index].map(|cl| cl * scale)
    }
}

/// The Mk2 model with a fixed configuration, evaluated for varying rates.
///
/// Evaluation does not mutate the tree, so one tree can be evaluated
/// repeatedly (and from several threads) with different parameters.
#[derive(Debug, Clone, Default)]
pub struct Mk2Model {
    config: Mk2Config,
}

impl Mk2Model {
    pub fn new(config: Mk2Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Mk2Config {
        &self.config
    }

    /// Returns the negative log-likelihood of the tip states for the given parameters.
    ///
    /// Returns `+inf` if any parameter (or the fixed rate) is negative.
    ///
    /// # Errors
    /// [LikelihoodError] if the parameters do not fit the rate mode, or the
    /// tree lacks tip states, branch lengths or (with a time window) times.
    pub fn neg_log_likelihood(&self, params: &[f64], tree: &Tree) -> Result<f64, LikelihoodError> {
        Ok(-self.log_likelihood(params, tree)?)
    }

    /// Returns the log-likelihood of the tip states for the given parameters.
    ///
    /// Returns `-inf` if any parameter is negative or the data are impossible
    /// under the parameters.
    pub fn log_likelihood(&self, params: &[f64], tree: &Tree) -> Result<f64, LikelihoodError> {
        let Some(rates) = self.rates(params)? else {
            return Ok(f64::NEG_INFINITY);
        };
        let pruning = self.prune(&rates, tree)?;
        let root_cl = pruning.cl[pruning.root];
        let weights = self.config.root_prior.weights(&root_cl, &rates);

        let mass: f64 = weights.iter().zip(root_cl).map(|(w, cl)| w * cl).sum();
        Ok(scaled_log(mass, pruning.lq[pruning.root]))
    }

    /// Returns the log-likelihood for each root state, weighted by the root prior.
    ///
    /// States with zero (or non-finite) weighted mass give `-inf`.
    pub fn log_likelihood_per_state(
        &self,
        params: &[f64],
        tree: &Tree,
    ) -> Result<[f64; NUM_STATES], LikelihoodError> {
        let Some(rates) = self.rates(params)? else {
            return Ok([f64::NEG_INFINITY; NUM_STATES]);
        };
        let pruning = self.prune(&rates, tree)?;
        let root_cl = pruning.cl[pruning.root];
        let root_lq = pruning.lq[pruning.root];
        let weights = self.config.root_prior.weights(&root_cl, &rates);

        let mut per_state = [f64::NEG_INFINITY; NUM_STATES];
        for (state, entry) in per_state.iter_mut().enumerate() {
            *entry = scaled_log(weights[state] * root_cl[state], root_lq);
        }
        Ok(per_state)
    }

    /// Assembles rates from the free parameters; `None` if any is negative.
    pub fn rates(&self, params: &[f64]) -> Result<Option<Rates>, LikelihoodError> {
        if params.iter().any(|&p| p < 0.0) {
            return Ok(None);
        }
        let rates = self.config.rate_mode.assemble(params)?;
        Ok((!rates.has_negative()).then_some(rates))
    }

    /// Runs the pruning pass for the given rates.
    ///
    /// With a time window, branches below a vertex whose time lies outside
    /// the window use frozen rates.
    ///
    /// # Errors
    /// [LikelihoodError] if a tip has no (binary, discrete) state, a non-root
    /// vertex has no branch length, or a time needed for the window is missing.
    pub fn prune(&self, rates: &Rates, tree: &Tree) -> Result<PruningResult, LikelihoodError> {
        let root = tree.root_index().ok_or(LikelihoodError::EmptyTree)?;
        let mut cl = vec![[0.0; NUM_STATES]; tree.num_vertices()];
        let mut lq = vec![0.0; tree.num_vertices()];

        for vertex in tree.post_order_iter() {
            let index = vertex.index();
            match vertex.kind() {
                VertexKind::Tip { state } => {
                    cl[index] = tip_indicator(vertex, *state)?;
                }
                VertexKind::Internal { children } => {
                    let rates = self.rates_below(vertex, rates)?;
                    let (vertex_cl, vertex_lq) = combine_children(tree, children, &rates, &cl, &lq)?;
                    cl[index] = vertex_cl;
                    lq[index] = vertex_lq;
                }
            }
        }

        Ok(PruningResult { cl, lq, root })
    }

    /// Rates for the branches leading to the children of `vertex`.
    fn rates_below(&self, vertex: &Vertex, rates: &Rates) -> Result<Rates, LikelihoodError> {
        let Some(window) = self.config.time_window else {
            return Ok(*rates);
        };
        let time = vertex.time().ok_or(LikelihoodError::MissingTime {
            vertex: vertex.index(),
        })?;
        Ok(if window.contains(time) { *rates } else { Rates::FROZEN })
    }
}

/// Evaluates the negative log-likelihood with a one-off [Mk2Model].
///
/// # Example
/// ```
/// use mk2fit::likelihood::{RateMode, RootPrior, neg_log_likelihood};
///
/// let tree = mk2fit::newick::parse_str("(A:1,B:1);").unwrap();
/// // Negative rates are rejected without error
/// let nll = neg_log_likelihood(&[-1.0, 0.5], &tree, RootPrior::Uniform, RateMode::Free, None).unwrap();
/// assert_eq!(nll, f64::INFINITY);
/// ```
pub fn neg_log_likelihood(
    params: &[f64],
    tree: &Tree,
    root_prior: RootPrior,
    rate_mode: RateMode,
    time_window: Option<TimeWindow>,
) -> Result<f64, LikelihoodError> {
    let mut config = Mk2Config::new()
        .with_root_prior(root_prior)
        .with_rate_mode(rate_mode);
    if let Some(window) = time_window {
        config = config.with_time_window(window);
    }
    Mk2Model::new(config).neg_log_likelihood(params, tree)
}

// ============================================================================
// Pruning steps (private)
// ============================================================================
fn tip_indicator(
    vertex: &Vertex,
    state: Option<CharacterState>,
) -> Result<[f64; NUM_STATES], LikelihoodError> {
    let index = vertex.index();
    let state = match state {
        Some(CharacterState::Discrete(state)) => state,
        Some(CharacterState::Continuous(_)) => {
            return Err(LikelihoodError::NonDiscreteTipState { vertex: index });
        }
        None => {
            return Err(LikelihoodError::MissingTipState {
                vertex: index,
                label: vertex.label().unwrap_or("-").to_string(),
            });
        }
    };
    if state >= NUM_STATES {
        return Err(LikelihoodError::TipStateOutOfRange { vertex: index, state });
    }

    let mut indicator = [0.0; NUM_STATES];
    indicator[state] = 1.0;
    Ok(indicator)
}

/// Conditional likelihood and log scaling factor of an internal vertex.
///
/// Each child contributes the probability of its subtree given each parent
/// state. With several children these vectors are normalized before they are
/// multiplied, and the logs of the normalizers are added to the scaling factor;
/// a single child is passed through unscaled. A child with zero mass gives
/// non-finite values, which propagate to a likelihood of zero.
fn combine_children(
    tree: &Tree,
    children: &[VertexIndex],
    rates: &Rates,
    cl: &[[f64; NUM_STATES]],
    lq: &[f64],
) -> Result<([f64; NUM_STATES], f64), LikelihoodError> {
    let mut product = [1.0; NUM_STATES];
    let mut log_scale = 0.0;
    let rescale = children.len() > 1;

    for &child in children {
        let length = tree[child]
            .branch_length()
            .ok_or(LikelihoodError::MissingBranchLength { vertex: child })?;
        let matrix = transition_matrix(*length, rates);

        let mut partial = [0.0; NUM_STATES];
        for (parent_state, entry) in partial.iter_mut().enumerate() {
            *entry = (0..NUM_STATES)
                .map(|child_state| matrix[parent_state][child_state] * cl[child][child_state])
                .sum();
        }

        if rescale {
            let norm: f64 = partial.iter().sum();
            partial = partial.map(|p| p / norm);
            log_scale += norm.ln();
        }
        log_scale += lq[child];

        for (acc, p) in product.iter_mut().zip(partial) {
            *acc *= p;
        }
    }

    Ok((product, log_scale))
}

/// `ln(mass) + lq`, or `-inf` if `mass` is zero, negative or NaN.
fn scaled_log(mass: f64, lq: f64) -> f64 {
    if mass > 0.0 { mass.ln() + lq } else { f64::NEG_INFINITY }
}
