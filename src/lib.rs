//! Mk2fit computes the likelihood of binary traits observed at the tips of a
//! phylogenetic tree under a two-state continuous-time Markov model (Mk2).
//!
//! Core functionality provided:
//! - Tree model: arena of vertices, each a tip (with optional observed state)
//!   or an internal vertex with one or more children. See [crate::model].
//! - Newick: parse and write single Newick strings, load the first tree of a
//!   file. See [crate::newick].
//! - Tip states: load a tree together with `label state` lines from a
//!   relaxed tree file. See [crate::states].
//! - Time: convert between vertex times and branch lengths, split branches at
//!   a given time. See [crate::time].
//! - Likelihood: Felsenstein pruning with log-scale compensation, closed-form
//!   transition probabilities, several root priors, and rates restricted to
//!   a time window. See [crate::likelihood].
//!
//! The negative log-likelihood is meant as objective for an external optimizer
//! or integrator: invalid (negative) rates evaluate to `+inf` instead of
//! failing.
//!
//! # Example
//! ```
//! use mk2fit::likelihood::{Mk2Config, Mk2Model, RootPrior};
//! use mk2fit::states::TipStateLoader;
//!
//! let text = "((Kakapo:1,Kea:1):1,Takahe:2);\nKakapo 0\nKea 0\nTakahe 1\n";
//! let loaded = TipStateLoader::new().load_str(text)?.expect("file has a tree");
//!
//! let model = Mk2Model::new(Mk2Config::new().with_root_prior(RootPrior::Stationary));
//! let nll = model.neg_log_likelihood(&[0.3, 0.6], &loaded.tree)?;
//! assert!(nll.is_finite() && nll > 0.0);
//! # Ok::<(), mk2fit::Error>(())
//! ```
//!
//! ## Time-windowed rates
//! ```
//! use mk2fit::likelihood::{Mk2Config, Mk2Model};
//! use mk2fit::time::{NodeLabeler, TimeWindow, assign_times, insert_window_boundaries};
//!
//! let mut tree = mk2fit::parse_newick_str("((A:1,B:1):1,C:2);")?;
//! assign_times(&mut tree, 0.0)?;
//!
//! let window = TimeWindow::new(0.5, 1.5);
//! let mut labeler = NodeLabeler::default();
//! let inserted = insert_window_boundaries(&mut tree, window, &mut labeler)?;
//! assert_eq!(inserted.len(), 5);
//!
//! let model = Mk2Model::new(Mk2Config::new().with_time_window(window));
//! # let _ = model;
//! # Ok::<(), mk2fit::Error>(())
//! ```

pub mod likelihood;
pub mod model;
pub mod newick;
pub mod parser;
pub mod states;
pub mod time;

use crate::likelihood::{ConfigError, LikelihoodError};
use crate::model::Tree;
use crate::parser::ParsingError;
use crate::states::TipStateTree;
use crate::time::TimeError;
use std::path::Path;

pub use crate::likelihood::neg_log_likelihood;

// =#========================================================================#=
// ERROR
// =#========================================================================#=
/// Any error of this crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    Likelihood(#[from] LikelihoodError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result with the crate-wide [Error].
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Quick API
// ============================================================================
/// Parses a Newick string using default settings, returning a [Tree].
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> std::result::Result<Tree, ParsingError> {
    newick::parse_str(newick)
}

/// Loads the first tree of a file, or `None` if it has no valid tree.
///
/// See [`newick::load_file`] for full documentation of this convenience function.
pub fn load_newick_file<P: AsRef<Path>>(path: P) -> std::result::Result<Option<Tree>, ParsingError> {
    newick::load_file(path)
}

/// Loads a tree with integer tip states from a file.
///
/// See [`states::load_tip_state_file`] for full documentation of this convenience function.
pub fn load_tip_state_file<P: AsRef<Path>>(
    path: P,
) -> std::result::Result<Option<TipStateTree>, ParsingError> {
    states::load_tip_state_file(path)
}
