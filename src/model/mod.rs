//! Data model for rooted phylogenetic trees.
//!
//! # Tree representation
//! Trees are represented by [Tree], which uses the arena pattern to store
//! [Vertex] nodes referenced by [VertexIndex]. Each vertex is either a tip
//! (with an optional observed [CharacterState]) or an internal vertex owning
//! an ordered, non-empty list of children, see [VertexKind].
//!
//! Per-vertex data:
//! - label, time (absolute position on the time axis) and [BranchLength]
//! - parent index (`None` only for the root)
//! - a `fixed` marker, reserved for pinned states
//!
//! Scratch data of computations (e.g. conditional likelihoods) is not stored
//! on vertices but in vectors indexed by [VertexIndex].

pub mod tree;
pub mod vertex;

pub use tree::AgeMode;
pub use tree::Tree;
pub use tree::VertexIndex;
pub use vertex::BranchLength;
pub use vertex::CharacterState;
pub use vertex::Vertex;
pub use vertex::VertexKind;
