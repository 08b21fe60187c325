//! Constants for the Newick parser and writer.

/// Structural characters of a Newick string; they end labels and branch lengths
pub(crate) const NEWICK_STRUCTURAL: &[u8] = b"(),:;";

/// Characters that force a label to be quoted when writing
pub(crate) const NEWICK_QUOTE_TRIGGERS: &[char] = &['(', ')', ',', ':', ';', '\''];

/// Prefixes of lines in tree files that are skipped as comments
pub(crate) const COMMENT_LINE_PREFIXES: &[char] = &['#', '['];

/// Default guess for number of vertices, when unknown
pub(crate) const DEFAULT_NUM_VERTICES_GUESS: usize = 20;
