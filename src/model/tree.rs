//! Provides the tree representation.
//!
//! Provides core data structures for representing phylogenetic trees:
//! * [Tree] - Main tree structure using the arena pattern,
//!   with vertices of arbitrary out-degree
//! * [VertexIndex] as type used to index vertices in tree
//! * [PostOrderIter] and [PreOrderIter] for stack-based traversals

use crate::model::vertex::{BranchLength, CharacterState, Vertex, VertexKind};
use crate::time::{self, TimeError};
use std::fmt;

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A rooted phylogenetic tree represented using the arena pattern
/// on [Vertex].
///
/// Vertices are stored in a contiguous vector and referenced by
/// [VertexIndex]. Parent links are indices as well, so there are no
/// reference cycles and per-vertex scratch data can be kept in plain vectors
/// indexed by [VertexIndex].
///
/// # Structure
/// - All vertices are stored in the arena; index of root is maintained.
/// - No assumption on order of indices is maintained.
/// - Internal vertices may have any positive number of children;
///   a single child occurs for redundant parentheses and time slices.
/// - Branch lengths are optional, but if provided must be non-negative.
///
/// # Construction
/// Bottom-up with [Tree::add_tip], [Tree::add_internal] and [Tree::add_root],
/// or top-down with [Tree::add_child] after setting a root.
/// Test validity with [`Tree::is_valid()`].
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex>,

    /// Index of the root of this tree; `None` until set
    root_index: Option<VertexIndex>,
}

/// How [Tree::age] determines the largest root-to-tip distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeMode {
    /// All tips are equidistant from the root; follow the first child only
    Ultrametric,
    /// Sum branch lengths for every tip and take the maximum
    General,
}

// ============================================================================
// New, Construction (pub)
// ============================================================================
impl Tree {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty tree with capacity for `num_vertices` vertices.
    pub fn with_capacity(num_vertices: usize) -> Self {
        Tree {
            vertices: Vec::with_capacity(num_vertices),
            root_index: None,
        }
    }

    /// Adds a tip to the tree, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `label` - Optional label of the tip
    /// * `state` - Optional observed character state
    /// * `branch_length` - Length of incoming branch
    pub fn add_tip(
        &mut self,
        label: Option<&str>,
        state: Option<CharacterState>,
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_tip(
            index,
            label.map(str::to_string),
            state,
            branch_length,
        ));
        index
    }

    /// Adds an internal vertex above the given children and returns its index.
    ///
    /// # Arguments
    /// * `children` - Child indices in left-to-right order (non-empty)
    /// * `label` - Optional label of the vertex
    /// * `branch_length` - Length of incoming branch
    ///
    /// # Panics
    /// Panics if `children` is empty or a child index is out of bounds.
    pub fn add_internal(
        &mut self,
        children: Vec<VertexIndex>,
        label: Option<&str>,
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        assert!(!children.is_empty(), "Internal vertex needs at least one child");
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_internal(
            index,
            children.clone(),
            label.map(str::to_string),
            branch_length,
        ));
        for child in children {
            self.link_parent(child, index);
        }
        index
    }

    /// Adds an internal vertex above the given children and makes it the root.
    ///
    /// The root gets branch length zero.
    ///
    /// # Panics
    /// Panics if `children` is empty or a child index is out of bounds.
    pub fn add_root(&mut self, children: Vec<VertexIndex>, label: Option<&str>) -> VertexIndex {
        let index = self.add_internal(children, label, Some(BranchLength::ZERO));
        self.root_index = Some(index);
        index
    }

    /// Makes the given vertex the root, clearing its parent link.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn set_root(&mut self, index: VertexIndex) {
        self.vertices[index].set_parent(None);
        self.root_index = Some(index);
    }

    /// Adds a new vertex below `parent` (top-down construction).
    ///
    /// The new vertex starts as a stateless tip and turns into an internal
    /// vertex as soon as a child is attached to it. If both the new vertex
    /// and its parent have a time, the branch length is derived from them,
    /// otherwise the supplied `branch_length` is kept.
    ///
    /// # Panics
    /// Panics if `parent` is out of bounds or a tip with an observed state.
    pub fn add_child(
        &mut self,
        parent: VertexIndex,
        label: Option<&str>,
        time: Option<f64>,
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.add_tip(label, None, branch_length);
        self.vertices[index].set_time(time);
        self.vertices[parent].push_child(index);
        self.link_parent(index, parent);
        index
    }

    /// Sets parent of `child`; derives branch length from times if both are known.
    fn link_parent(&mut self, child: VertexIndex, parent: VertexIndex) {
        let parent_time = self.vertices[parent].time();
        let vertex = &mut self.vertices[child];
        vertex.set_parent(Some(parent));

        if let (Some(time), Some(parent_time)) = (vertex.time(), parent_time) {
            match BranchLength::try_new(time - parent_time) {
                Some(length) => vertex.set_branch_length(Some(length)),
                None => log::warn!(
                    "Times of vertex {child} ({time}) and parent {parent} ({parent_time}) \
                     give a negative branch length; keeping supplied length"
                ),
            }
        }
    }

    /// Returns a copy of the subtree rooted at `index` as a tree of its own.
    ///
    /// Vertices are renumbered in pre-order; the new root has no parent but
    /// keeps its branch length, label and time.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn subtree(&self, index: VertexIndex) -> Tree {
        let mut new_index_of = vec![None; self.vertices.len()];
        let mut order = Vec::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            new_index_of[current] = Some(order.len());
            order.push(current);
            stack.extend(self.vertices[current].children().iter().rev());
        }

        let vertices = order
            .iter()
            .map(|&old| self.vertices[old].remapped(&new_index_of))
            .collect();

        Tree {
            vertices,
            root_index: Some(0),
        }
    }

    /// Pushes a fully formed vertex (used by time-slice insertion).
    pub(crate) fn push_vertex(&mut self, vertex: Vertex) -> VertexIndex {
        debug_assert_eq!(vertex.index(), self.vertices.len());
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl Tree {
    /// Returns whether root of tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index.is_some()
    }

    /// Returns a reference to the root vertex.
    ///
    /// # Panics
    /// Panics if the root hasn't been set and thus tree hasn't been fully constructed yet.
    pub fn root(&self) -> &Vertex {
        &self[self.root_index.expect("Root of tree has not been set")]
    }

    /// Returns the index of the root, or `None` if not set.
    pub fn root_index(&self) -> Option<VertexIndex> {
        self.root_index
    }

    /// Returns a reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self[index]
    }

    /// Returns a mutable reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex_mut(&mut self, index: VertexIndex) -> &mut Vertex {
        &mut self.vertices[index]
    }

    /// Returns all vertices in arena order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of vertices in this tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of tips in this tree.
    pub fn num_tips(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_tip()).count()
    }

    /// Returns the number of internal vertices (root included) in this tree.
    pub fn num_internal(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_internal()).count()
    }

    /// Returns the index of the first tip with the given label.
    pub fn find_tip(&self, label: &str) -> Option<VertexIndex> {
        self.pre_order_iter()
            .find(|v| v.is_tip() && v.label() == Some(label))
            .map(Vertex::index)
    }

    /// Returns `(label, state)` of all tips in left-to-right order.
    pub fn tip_states(&self) -> Vec<(Option<&str>, Option<CharacterState>)> {
        self.pre_order_iter()
            .filter(|v| v.is_tip())
            .map(|v| (v.label(), v.state()))
            .collect()
    }

    /// Returns whether every vertex carries a time.
    pub fn vertices_have_times(&self) -> bool {
        self.vertices.iter().all(|v| v.time().is_some())
    }

    /// Checks if all non-root vertices have branch lengths set.
    pub fn vertices_have_branch_lengths(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.is_root() || v.has_branch_length())
    }

    /// Returns the greatest distance between the root and any tip.
    ///
    /// With [AgeMode::Ultrametric] only the path following the first child
    /// is walked, which is exact if all tips are equidistant from the root.
    /// [AgeMode::General] takes the maximum over [time::tip_distances].
    ///
    /// # Errors
    /// [TimeError] if the tree has no root or a branch length is missing.
    pub fn age(&self, mode: AgeMode) -> Result<f64, TimeError> {
        let root_index = self.root_index.ok_or(TimeError::EmptyTree)?;

        match mode {
            AgeMode::Ultrametric => {
                let mut age = 0.0;
                let mut current = &self.vertices[root_index];
                while let Some(&first) = current.children().first() {
                    current = &self.vertices[first];
                    let length = current
                        .branch_length()
                        .ok_or(TimeError::MissingBranchLength { vertex: first })?;
                    age += *length;
                }
                Ok(age)
            }
            AgeMode::General => Ok(time::tip_distances(self)?
                .into_iter()
                .fold(0.0, f64::max)),
        }
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root is set, within bounds, and has no parent
    /// - All vertex indices match their position in the arena
    /// - Internal vertices have children, which point back to them as parent
    /// - Non-root vertices have a parent listing them as child
    /// - Every vertex is reached exactly once from the root (no cycles, no orphans)
    ///
    /// # Returns
    /// `true` if tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        let Some(root_index) = self.root_index else {
            return false;
        };
        if root_index >= self.vertices.len() || self.vertices[root_index].has_parent() {
            return false;
        }

        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }

            if let VertexKind::Internal { children } = vertex.kind() {
                if children.is_empty() {
                    return false;
                }
                for &child in children {
                    if child >= self.vertices.len() || self.vertices[child].parent() != Some(index) {
                        return false;
                    }
                }
            }

            if index != root_index {
                match vertex.parent() {
                    None => return false,
                    Some(parent) => {
                        if parent >= self.vertices.len()
                            || !self.vertices[parent].children().contains(&index)
                        {
                            return false;
                        }
                    }
                }
            }
        }

        // Reachability; visiting a vertex twice means a cycle or shared child
        let mut visited = vec![false; self.vertices.len()];
        let mut stack = vec![root_index];
        while let Some(index) = stack.pop() {
            if visited[index] {
                return false;
            }
            visited[index] = true;
            stack.extend_from_slice(self.vertices[index].children());
        }

        visited.into_iter().all(|v| v)
    }

    /// Prints a visual representation of the tree to the console.
    ///
    /// See the [fmt::Display] implementation for the format.
    pub fn print_tree(&self) {
        print!("{self}");
    }
}

impl std::ops::Index<VertexIndex> for Tree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

impl std::ops::IndexMut<VertexIndex> for Tree {
    fn index_mut(&mut self, index: VertexIndex) -> &mut Self::Output {
        &mut self.vertices[index]
    }
}

// ============================================================================
// Printing (pub)
// ============================================================================
/// Visual representation of the tree.
///
/// # Example Output
/// ```text
/// Tree with 3 tips (5 vertices total):
/// [4] root t=0.0000 l=0.0000
///   ├─ [2] - t=1.0000 l=1.0000
///   │   ├─ [0] A t=2.0000 l=1.0000 s=0
///   │   └─ [1] B t=2.0000 l=1.0000 s=1
///   └─ [3] C t=2.0000 l=2.0000 s=1
/// ```
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Tree with {} tips ({} vertices total):",
            self.num_tips(),
            self.num_vertices()
        )?;

        let Some(root_index) = self.root_index else {
            return writeln!(f, "(No root set)");
        };

        // (index, prefix for its children, connector)
        let mut stack: Vec<(VertexIndex, String, &str)> = vec![(root_index, String::new(), "")];
        while let Some((index, prefix, connector)) = stack.pop() {
            let vertex = &self.vertices[index];

            write!(f, "{prefix}{connector}[{index}] {}", vertex.label().unwrap_or("-"))?;
            if let Some(time) = vertex.time() {
                write!(f, " t={time:.4}")?;
            }
            if let Some(length) = vertex.branch_length() {
                write!(f, " l={:.4}", *length)?;
            }
            if let Some(state) = vertex.state() {
                write!(f, " s={state}")?;
            }
            writeln!(f)?;

            let child_prefix = match connector {
                "" if prefix.is_empty() => "  ".to_string(),
                "└─ " => format!("{prefix}    "),
                _ => format!("{prefix}│   "),
            };
            let children = vertex.children();
            for (position, &child) in children.iter().enumerate().rev() {
                let connector = if position + 1 == children.len() { "└─ " } else { "├─ " };
                stack.push((child, child_prefix.clone(), connector));
            }
        }

        Ok(())
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl Tree {
    /// Returns an iterator over the tree in post-order (children before parents).
    ///
    /// Children are visited left to right. Uses an explicit stack, so the
    /// depth of the tree is not limited by the call stack.
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children).
    ///
    /// Children are visited left to right, so tips appear in the order they
    /// are written in a Newick string.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

/// Iterator for post-order traversal (children before parents).
///
/// Each vertex is visited after all its descendants have been visited.
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let stack = tree.root_index.map(|root| (root, false)).into_iter().collect();
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];

            if children_visited || vertex.is_tip() {
                return Some(vertex);
            }

            self.stack.push((index, true));
            // Push children in reverse, so leftmost is processed first
            for &child in vertex.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// Each vertex is visited before any of its descendants.
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        PreOrderIter {
            tree,
            stack: tree.root_index.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];
        self.stack.extend(vertex.children().iter().rev());
        Some(vertex)
    }
}
