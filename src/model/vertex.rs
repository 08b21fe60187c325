//! Vertex types for phylogenetic tree representation.
//!
//! Provides [Vertex] (a node in the tree arena), [VertexKind] (tip or
//! internal), [BranchLength] and [CharacterState].

use crate::model::tree::VertexIndex;
use std::fmt;
use std::ops::Deref;

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// Represents a vertex (node) in a phylogenetic tree.
///
/// Whether a vertex is a tip or an internal vertex is encoded in its
/// [VertexKind]; all other per-vertex data lives directly in the struct.
///
/// # Invariants
/// - `index` is the position of this vertex in the tree arena
/// - `parent` is `None` only for the root (and during construction)
/// - `branch_length`, if set, is non-negative and finite
/// - An internal vertex has at least one child once construction finished
#[derive(PartialEq, Debug, Clone)]
pub struct Vertex {
    /// Index of this vertex in the tree arena
    index: VertexIndex,
    /// Index of the parent vertex; `None` for the root
    parent: Option<VertexIndex>,
    /// Optional name of this vertex
    label: Option<String>,
    /// Optional absolute position on the time axis
    time: Option<f64>,
    /// Distance to parent vertex (optional)
    branch_length: Option<BranchLength>,
    /// Whether the state of this vertex is pinned (not used in computations yet)
    fixed: bool,
    /// Tip with observed state, or internal vertex with owned children
    kind: VertexKind,
}

/// Distinguishes tips from internal vertices.
#[derive(PartialEq, Debug, Clone)]
pub enum VertexKind {
    /// Leaf of the tree, possibly carrying an observed character state
    Tip {
        /// Observed state; `None` if no observation was assigned
        state: Option<CharacterState>,
    },
    /// Vertex with one or more children, in left-to-right order
    Internal {
        /// Indices of the child vertices
        children: Vec<VertexIndex>,
    },
}

impl Vertex {
    /// Creates a new tip vertex without parent.
    ///
    /// # Arguments
    /// * `index` - The unique index of this vertex in the tree (arena)
    /// * `label` - Optional label of the tip
    /// * `state` - Optional observed character state
    /// * `branch_length` - Distance to parent vertex
    pub fn new_tip(
        index: VertexIndex,
        label: Option<String>,
        state: Option<CharacterState>,
        branch_length: Option<BranchLength>,
    ) -> Self {
        Vertex {
            index,
            parent: None,
            label,
            time: None,
            branch_length,
            fixed: false,
            kind: VertexKind::Tip { state },
        }
    }

    /// Creates a new internal vertex without parent.
    ///
    /// # Arguments
    /// * `index` - The unique index of this vertex in the tree (arena)
    /// * `children` - Child indices in left-to-right order
    /// * `label` - Optional label of the vertex
    /// * `branch_length` - Distance to parent vertex
    pub fn new_internal(
        index: VertexIndex,
        children: Vec<VertexIndex>,
        label: Option<String>,
        branch_length: Option<BranchLength>,
    ) -> Self {
        Vertex {
            index,
            parent: None,
            label,
            time: None,
            branch_length,
            fixed: false,
            kind: VertexKind::Internal { children },
        }
    }

    /// Returns the index of this vertex.
    pub fn index(&self) -> VertexIndex {
        self.index
    }

    /// Returns the [VertexKind] of this vertex.
    pub fn kind(&self) -> &VertexKind {
        &self.kind
    }

    /// Returns the index of the parent, or `None` for the root.
    pub fn parent(&self) -> Option<VertexIndex> {
        self.parent
    }

    /// Returns `true` if this vertex has a parent set.
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<VertexIndex>) {
        self.parent = parent;
    }

    /// Returns the label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the label of this vertex.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Returns the time of this vertex, if assigned.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Sets the time of this vertex.
    ///
    /// Note that this does not update any branch lengths,
    /// see [crate::time::assign_lengths].
    pub fn set_time(&mut self, time: Option<f64>) {
        self.time = time;
    }

    /// Returns the branch length, if set.
    pub fn branch_length(&self) -> Option<BranchLength> {
        self.branch_length
    }

    /// Returns whether this vertex has a [BranchLength].
    pub fn has_branch_length(&self) -> bool {
        self.branch_length.is_some()
    }

    /// Sets the branch length of this vertex.
    pub fn set_branch_length(&mut self, branch_length: Option<BranchLength>) {
        self.branch_length = branch_length;
    }

    /// Returns whether the state of this vertex is marked as fixed.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Marks the state of this vertex as fixed or not.
    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    /// Returns `true` if this vertex is a tip.
    pub fn is_tip(&self) -> bool {
        matches!(self.kind, VertexKind::Tip { .. })
    }

    /// Returns `true` if this vertex is an internal vertex (root included).
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, VertexKind::Internal { .. })
    }

    /// Returns `true` if this vertex has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the observed state if this is a tip with a state, else `None`.
    pub fn state(&self) -> Option<CharacterState> {
        match &self.kind {
            VertexKind::Tip { state } => *state,
            VertexKind::Internal { .. } => None,
        }
    }

    /// Sets the observed state of a tip.
    ///
    /// # Returns
    /// `false` if this is an internal vertex, for which states are ignored.
    pub fn set_state(&mut self, new_state: Option<CharacterState>) -> bool {
        match &mut self.kind {
            VertexKind::Tip { state } => {
                *state = new_state;
                true
            }
            VertexKind::Internal { .. } => false,
        }
    }

    /// Returns the children of this vertex; empty slice for a tip.
    pub fn children(&self) -> &[VertexIndex] {
        match &self.kind {
            VertexKind::Tip { .. } => &[],
            VertexKind::Internal { children } => children,
        }
    }

    /// Appends a child; a stateless tip turns into an internal vertex.
    ///
    /// # Panics
    /// Panics if this is a tip that carries an observed state.
    pub(crate) fn push_child(&mut self, child: VertexIndex) {
        match &mut self.kind {
            VertexKind::Internal { children } => children.push(child),
            VertexKind::Tip { state: None } => {
                self.kind = VertexKind::Internal {
                    children: vec![child],
                };
            }
            VertexKind::Tip { state: Some(_) } => {
                panic!("Cannot attach a child to tip {} with observed state", self.index)
            }
        }
    }

    /// Returns a copy of this vertex moved to another arena, with all
    /// indices translated through `new_index_of`.
    pub(crate) fn remapped(&self, new_index_of: &[Option<VertexIndex>]) -> Vertex {
        let translate = |index: VertexIndex| {
            new_index_of[index].expect("Vertex of subtree must have been assigned a new index")
        };
        let kind = match &self.kind {
            VertexKind::Tip { state } => VertexKind::Tip { state: *state },
            VertexKind::Internal { children } => VertexKind::Internal {
                children: children.iter().map(|&c| translate(c)).collect(),
            },
        };
        Vertex {
            index: translate(self.index),
            parent: self.parent.and_then(|p| new_index_of[p]),
            label: self.label.clone(),
            time: self.time,
            branch_length: self.branch_length,
            fixed: self.fixed,
            kind,
        }
    }

    /// Replaces `old` by `new` in the list of children, keeping its position.
    ///
    /// # Returns
    /// `false` if `old` is not a child of this vertex.
    pub(crate) fn replace_child(&mut self, old: VertexIndex, new: VertexIndex) -> bool {
        match &mut self.kind {
            VertexKind::Internal { children } => match children.iter().position(|&c| c == old) {
                Some(position) => {
                    children[position] = new;
                    true
                }
                None => false,
            },
            VertexKind::Tip { .. } => false,
        }
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Branch length in a phylogenetic tree, enforced non-negative.
///
/// Represents the distance between a vertex and its parent.
/// The value is guaranteed to be non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Branch length of zero.
    pub const ZERO: BranchLength = BranchLength(0.0);

    /// Creates a new branch length.
    ///
    /// # Arguments
    /// * `length` - The branch length value (must be non-negative)
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn new(length: f64) -> Self {
        assert!(length >= 0.0, "Branch length must be non-negative, got {}", length);
        assert!(length.is_finite(), "Branch length must be finite, got {}", length);
        BranchLength(length)
    }

    /// Creates a new branch length, or `None` if `length` is negative or not finite.
    pub fn try_new(length: f64) -> Option<Self> {
        if length >= 0.0 && length.is_finite() {
            Some(BranchLength(length))
        } else {
            None
        }
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl fmt::Display for BranchLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =#========================================================================#=
// CHARACTER STATE
// =#========================================================================#=
/// Observed character state of a tip.
///
/// The Mk2 likelihood needs [CharacterState::Discrete] states; continuous
/// values can be loaded from state files but are rejected by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CharacterState {
    /// State index in `0..num_states`
    Discrete(usize),
    /// Floating-point trait value
    Continuous(f64),
}

impl CharacterState {
    /// Returns the state index if this is a discrete state.
    pub fn as_discrete(&self) -> Option<usize> {
        match self {
            CharacterState::Discrete(state) => Some(*state),
            CharacterState::Continuous(_) => None,
        }
    }
}

impl fmt::Display for CharacterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterState::Discrete(state) => write!(f, "{state}"),
            CharacterState::Continuous(value) => write!(f, "{value}"),
        }
    }
}
