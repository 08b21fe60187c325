//! Newick format writing of trees and subtrees.

use crate::model::{Tree, VertexIndex};
use crate::newick::defs::NEWICK_QUOTE_TRIGGERS;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Extra characters per vertex in Newick string capacity estimate
const CHARS_PER_VERTEX: usize = 12;

/// Style for serializing a tree to Newick format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewickStyle {
    /// `(A:1,B:1)root:0;` - the subtree as is
    #[default]
    Plain,
    /// `((A:1,B:1)root:0);` - wrapped in an extra pair of parentheses,
    /// which tree files commonly use so the root label and length read
    /// like those of any other clade
    Wrapped,
}

/// Returns the Newick representation of the whole tree with closing semicolon.
///
/// Every vertex is written with its label (if any) and branch length
/// (if any); children are written left to right. Labels containing
/// structural characters are single-quoted.
///
/// Returns `";"` for a tree without root.
///
/// # Example
/// ```
/// use mk2fit::model::{BranchLength, Tree};
/// use mk2fit::newick::{NewickStyle, to_newick};
///
/// let mut tree = Tree::new();
/// let a = tree.add_tip(Some("A"), None, Some(BranchLength::new(1.0)));
/// let b = tree.add_tip(Some("B"), None, Some(BranchLength::new(2.5)));
/// tree.add_root(vec![a, b], None);
///
/// assert_eq!(to_newick(&tree, NewickStyle::Plain), "(A:1,B:2.5):0;");
/// ```
pub fn to_newick(tree: &Tree, style: NewickStyle) -> String {
    match tree.root_index() {
        Some(root) => subtree_to_newick(tree, root, style),
        None => ";".to_string(),
    }
}

/// Returns the Newick representation of the subtree rooted at `index`.
///
/// # Panics
/// Panics if `index` is out of bounds.
pub fn subtree_to_newick(tree: &Tree, index: VertexIndex, style: NewickStyle) -> String {
    enum Step {
        Enter(VertexIndex),
        Separator,
        Close(VertexIndex),
    }

    let mut newick = String::with_capacity(tree.num_vertices() * CHARS_PER_VERTEX);
    if style == NewickStyle::Wrapped {
        newick.push('(');
    }

    // Explicit stack, so deep trees do not exhaust the call stack
    let mut steps = vec![Step::Enter(index)];
    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(current) => {
                let children = tree[current].children();
                if children.is_empty() {
                    push_label_and_length(tree, current, &mut newick);
                } else {
                    newick.push('(');
                    steps.push(Step::Close(current));
                    for (position, &child) in children.iter().enumerate().rev() {
                        steps.push(Step::Enter(child));
                        if position > 0 {
                            steps.push(Step::Separator);
                        }
                    }
                }
            }
            Step::Separator => newick.push(','),
            Step::Close(current) => {
                newick.push(')');
                push_label_and_length(tree, current, &mut newick);
            }
        }
    }

    if style == NewickStyle::Wrapped {
        newick.push(')');
    }
    newick.push(';');
    newick
}

/// Writes the given trees to a file in Newick format, one tree per line.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick_file(file: File, trees: &[Tree], style: NewickStyle) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    for tree in trees {
        writer.write_all(to_newick(tree, style).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn push_label_and_length(tree: &Tree, index: VertexIndex, newick: &mut String) {
    let vertex = &tree[index];
    if let Some(label) = vertex.label() {
        newick.push_str(&escape_label(label));
    }
    if let Some(length) = vertex.branch_length() {
        newick.push(':');
        newick.push_str(&length.to_string());
    }
}

/// Quotes a label if it would otherwise be split or altered by the parser.
///
/// # Examples
/// ```
/// # use mk2fit::newick::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Australasian Swamphen"), "Australasian Swamphen");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// assert_eq!(escape_label("Kiwi:North"), "'Kiwi:North'");
/// ```
pub fn escape_label(label: &str) -> String {
    let needs_quotes = label.is_empty()
        || label.contains(NEWICK_QUOTE_TRIGGERS)
        || label.trim() != label;

    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
