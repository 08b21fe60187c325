//! Time and branch-length bookkeeping, and time-slice insertion.
//!
//! Times increase from the root towards the tips (unless stated otherwise
//! via [TimeDirection::Backward]). The utilities here convert between
//! vertex times and branch lengths, measure root-to-tip distances, and split
//! branches at a given time so a rate regime can be keyed to absolute time:
//! * [assign_times] / [assign_lengths] - derive one from the other
//! * [tip_distances] - root-to-tip distance of every tip
//! * [insert_time_slice] - split every branch spanning a time
//! * [TimeWindow] - half-open time interval, see [TimeWindow::schedule]

use crate::model::{BranchLength, Tree, Vertex, VertexIndex};
use std::fmt;

// =#========================================================================#=
// TIME ERROR
// =#========================================================================#=
/// Errors of the time/length utilities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    #[error("Vertex {vertex} has no time assigned")]
    MissingTime { vertex: VertexIndex },
    #[error("Vertex {vertex} has no branch length")]
    MissingBranchLength { vertex: VertexIndex },
    #[error("Times give negative branch length {length} for vertex {vertex}")]
    NegativeBranchLength { vertex: VertexIndex, length: f64 },
    #[error("Tree has no root")]
    EmptyTree,
}

/// Direction of the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDirection {
    /// Times increase from root to tips (branch length = time - parent time)
    #[default]
    Forward,
    /// Times increase from tips to root (branch length = parent time - time)
    Backward,
}

// ============================================================================
// Times <-> Lengths (pub)
// ============================================================================
/// Assigns vertex times from branch lengths.
///
/// The root gets `root_time`, every other vertex the time of its parent
/// plus its own branch length.
///
/// # Errors
/// [TimeError::MissingBranchLength] if a non-root vertex has no branch length,
/// [TimeError::EmptyTree] if no root is set.
pub fn assign_times(tree: &mut Tree, root_time: f64) -> Result<(), TimeError> {
    let root = tree.root_index().ok_or(TimeError::EmptyTree)?;
    tree[root].set_time(Some(root_time));

    for index in pre_order_indices(tree) {
        let Some(parent) = tree[index].parent() else {
            continue;
        };
        let length = tree[index]
            .branch_length()
            .ok_or(TimeError::MissingBranchLength { vertex: index })?;
        let parent_time = tree[parent]
            .time()
            .ok_or(TimeError::MissingTime { vertex: parent })?;
        tree.vertex_mut(index).set_time(Some(parent_time + *length));
    }
    Ok(())
}

/// Assigns branch lengths from vertex times; the root gets length zero.
///
/// # Errors
/// [TimeError::MissingTime] if a vertex has no time,
/// [TimeError::NegativeBranchLength] if times run against `direction`.
pub fn assign_lengths(tree: &mut Tree, direction: TimeDirection) -> Result<(), TimeError> {
    let root = tree.root_index().ok_or(TimeError::EmptyTree)?;
    tree[root].set_branch_length(Some(BranchLength::ZERO));

    for index in pre_order_indices(tree) {
        let Some(parent) = tree[index].parent() else {
            continue;
        };
        let time = require_time(tree, index)?;
        let parent_time = require_time(tree, parent)?;
        let length = match direction {
            TimeDirection::Forward => time - parent_time,
            TimeDirection::Backward => parent_time - time,
        };
        let length = BranchLength::try_new(length)
            .ok_or(TimeError::NegativeBranchLength { vertex: index, length })?;
        tree[index].set_branch_length(Some(length));
    }
    Ok(())
}

/// Returns the distance from the root to every tip, tips in left-to-right order.
///
/// Distances are the sums of branch lengths on the path from a tip up to
/// the root. The root's own branch length (e.g. `:5` in `(A:1,B:1):5;`) is
/// not included. Useful to check whether a tree is ultrametric.
///
/// # Errors
/// [TimeError::MissingBranchLength] if a vertex below the root has no branch length.
pub fn tip_distances(tree: &Tree) -> Result<Vec<f64>, TimeError> {
    let root = tree.root_index().ok_or(TimeError::EmptyTree)?;

    // Depth of each vertex, filled top-down
    let mut depth = vec![0.0; tree.num_vertices()];
    let mut distances = Vec::new();
    for vertex in tree.pre_order_iter() {
        let index = vertex.index();
        if index != root {
            let length = vertex
                .branch_length()
                .ok_or(TimeError::MissingBranchLength { vertex: index })?;
            let parent = vertex.parent().ok_or(TimeError::EmptyTree)?;
            depth[index] = depth[parent] + *length;
        }
        if vertex.is_tip() {
            distances.push(depth[index]);
        }
    }
    Ok(distances)
}

// ============================================================================
// Time slices (pub)
// ============================================================================
/// Generates labels for vertices inserted by [insert_time_slice].
///
/// Labels are the prefix followed by a running number starting at 1
/// (`n1`, `n2`, ...). Keep one labeler per tree to get unique labels.
#[derive(Debug, Clone)]
pub struct NodeLabeler {
    prefix: String,
    counter: usize,
}

impl NodeLabeler {
    /// Creates a labeler producing `{prefix}1`, `{prefix}2`, ...
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
        }
    }

    /// Returns the next label.
    pub fn next_label(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }

    /// Returns how many labels have been handed out.
    pub fn count(&self) -> usize {
        self.counter
    }
}

impl Default for NodeLabeler {
    fn default() -> Self {
        Self::new("n")
    }
}

/// Splits every branch spanning time `t` by inserting a new vertex at `t`.
///
/// A branch spans `t` if the time of its child vertex is strictly greater
/// and the time of its parent vertex strictly less than `t`. A boundary equal
/// to an existing vertex time therefore inserts nothing on the branches
/// touching that vertex. The new vertex becomes the single child of the
/// original parent (at the position of the original child) and the sole
/// parent of the original child. Afterwards all branch lengths are
/// recomputed from the times.
///
/// # Returns
/// Indices of the inserted vertices, in pre-order of the branches they split.
///
/// # Errors
/// [TimeError::MissingTime] if any vertex has no time,
/// [TimeError::NegativeBranchLength] if a vertex is older than its parent.
/// The tree is left unchanged in both cases.
pub fn insert_time_slice(
    tree: &mut Tree,
    t: f64,
    labeler: &mut NodeLabeler,
) -> Result<Vec<VertexIndex>, TimeError> {
    tree.root_index().ok_or(TimeError::EmptyTree)?;

    // Collect first, splicing during traversal would invalidate it
    let mut spanning = Vec::new();
    for vertex in tree.pre_order_iter() {
        let time = vertex
            .time()
            .ok_or(TimeError::MissingTime { vertex: vertex.index() })?;
        if let Some(parent) = vertex.parent() {
            let parent_time = require_time(tree, parent)?;
            let length = time - parent_time;
            if BranchLength::try_new(length).is_none() {
                return Err(TimeError::NegativeBranchLength {
                    vertex: vertex.index(),
                    length,
                });
            }
            if time > t && parent_time < t {
                spanning.push((vertex.index(), parent));
            }
        }
    }

    let mut inserted = Vec::with_capacity(spanning.len());
    for (child, parent) in spanning {
        let index = tree.num_vertices();
        let mut vertex = Vertex::new_internal(index, vec![child], Some(labeler.next_label()), None);
        vertex.set_time(Some(t));
        vertex.set_parent(Some(parent));
        tree.push_vertex(vertex);

        tree[parent].replace_child(child, index);
        tree[child].set_parent(Some(index));
        inserted.push(index);
    }

    assign_lengths(tree, TimeDirection::Forward)?;
    log::debug!("Inserted {} vertices at time {t}", inserted.len());
    Ok(inserted)
}

/// Inserts time slices at both edges of `window`, start first.
///
/// # Returns
/// Indices of all inserted vertices.
pub fn insert_window_boundaries(
    tree: &mut Tree,
    window: TimeWindow,
    labeler: &mut NodeLabeler,
) -> Result<Vec<VertexIndex>, TimeError> {
    let mut inserted = insert_time_slice(tree, window.start, labeler)?;
    inserted.extend(insert_time_slice(tree, window.end, labeler)?);
    Ok(inserted)
}

// =#========================================================================#=
// TIME WINDOW
// =#========================================================================#=
/// Half-open time interval `[start, end)` in which transitions are allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Creates a new window `[start, end)`.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Returns whether `time` lies in `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Returns consecutive windows of `width` covering `[root_time, tip_time]`.
    ///
    /// Windows start at the latest tip and work back towards the root, so the
    /// first window is `[tip_time - width, tip_time]`. The oldest window is cut
    /// short at `root_time`.
    ///
    /// # Example
    /// ```
    /// use mk2fit::time::TimeWindow;
    ///
    /// let windows = TimeWindow::schedule(0.0, 2.5, 1.0);
    /// assert_eq!(windows, vec![
    ///     TimeWindow::new(1.5, 2.5),
    ///     TimeWindow::new(0.5, 1.5),
    ///     TimeWindow::new(0.0, 0.5),
    /// ]);
    /// ```
    ///
    /// Returns no windows if `width` is not positive or `tip_time <= root_time`.
    pub fn schedule(root_time: f64, tip_time: f64, width: f64) -> Vec<TimeWindow> {
        if !(width > 0.0) || !(tip_time > root_time) {
            return Vec::new();
        }

        let mut boundaries = Vec::new();
        let mut k = 0.0;
        loop {
            let boundary = tip_time - k * width;
            if boundary <= root_time {
                break;
            }
            boundaries.push(boundary);
            k += 1.0;
        }
        boundaries.push(root_time);

        boundaries
            .windows(2)
            .map(|pair| TimeWindow::new(pair[1], pair[0]))
            .collect()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
fn require_time(tree: &Tree, index: VertexIndex) -> Result<f64, TimeError> {
    tree[index]
        .time()
        .ok_or(TimeError::MissingTime { vertex: index })
}

fn pre_order_indices(tree: &Tree) -> Vec<VertexIndex> {
    tree.pre_order_iter().map(Vertex::index).collect()
}
