//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [`NewickParser`] to parse a single Newick string
//! into a [`Tree`], and [`to_newick`] to write one back.
//!
//! # Quick API
//! For simple use cases with default settings:
//! * [`parse_str`] - parses a single string, returns a [`Tree`]
//! * [`load_file`] - parses the first tree line of a file, tolerating a
//!   missing or malformed tree
//!
//! # Full API
//! For more control, configure a [`NewickParser`] and provide a [`ByteParser`]:
//! * [`NewickParser::parse_str`] - parse a single tree
//! * [`validate`] - only check a string for gross malformations
//!
//! # Format
//! The Newick format has the following grammar:
//! * `tree ::= vertex ';'`
//! * `vertex ::= tip | internal_vertex`
//! * `internal_vertex ::= '(' vertex {',' vertex} ')' [label] [branch_length]`
//! * `tip ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace can occur between elements and is ignored
//! * Unquoted labels end at any of `(),:;`; trailing whitespace is trimmed
//! * Quoted labels are enclosed in single quotes, `''` is an escaped quote
//! * Internal vertices may have a single child (`((A:1):2,B:3);`)

pub(crate) mod defs;
pub mod parser;
pub mod writer;

pub use self::parser::{NewickParser, validate};
pub use self::writer::{NewickStyle, escape_label, subtree_to_newick, to_newick, write_newick_file};

use crate::model::Tree;
use crate::newick::defs::COMMENT_LINE_PREFIXES;
use crate::parser::{ByteParser, ParsingError};
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick string to obtain a [`Tree`].
///
/// This is a convenience function for quick parsing of a single Newick string
/// using default settings and thus not requiring configuration of a parser.
///
/// # Arguments
/// * `newick` - The Newick format string to parse
///
/// # Returns
/// * [`Tree`] - Tree parsed from the string
/// * [`ParsingError`] - If the string is not valid Newick format
///
/// # Example
/// ```
/// use mk2fit::newick::parse_str;
///
/// let tree = parse_str("(Porphyrio_hochstetteri:2,(Gallirallus_australis:1,Hypotaenidia_muelleri:1):1);").unwrap();
/// assert_eq!(tree.num_tips(), 3);
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<Tree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new().parse_str(&mut byte_parser)
}

/// Loads the tree from the first suitable line of a file.
///
/// Leading blank lines and lines starting with `#` or `[` are skipped; the
/// first remaining line is parsed as Newick string.
///
/// # Returns
/// * `Ok(Some(Tree))` - The parsed tree
/// * `Ok(None)` - If the file has no suitable line, or the line is not a
///   valid Newick string (logged as warning)
/// * `Err(ParsingError)` - If the file cannot be read
///
/// # Example
/// ```no_run
/// use mk2fit::newick::load_file;
///
/// match load_file("rallidae.tree")? {
///     Some(tree) => println!("{} tips", tree.num_tips()),
///     None => println!("no tree"),
/// }
/// # Ok::<(), mk2fit::parser::ParsingError>(())
/// ```
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Option<Tree>, ParsingError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    Ok(parse_first_tree(&text, &path.display().to_string()).map(|(tree, _)| tree))
}

/// Parses the first tree line of `text`.
///
/// Returns the tree together with the index of the line it was read from,
/// or `None` (with a warning naming `source`) if there is no tree.
pub(crate) fn parse_first_tree(text: &str, source: &str) -> Option<(Tree, usize)> {
    let Some((line_index, line)) = first_tree_line(text) else {
        log::warn!("No tree line found in {source}");
        return None;
    };

    match parse_str(line) {
        Ok(tree) => Some((tree, line_index)),
        Err(err) => {
            log::warn!("Could not parse tree in {source}: {err}");
            None
        }
    }
}

/// Returns index and content of the first non-blank, non-comment line.
fn first_tree_line(text: &str) -> Option<(usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index, line.trim()))
        .find(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_LINE_PREFIXES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tree_line_skips_comments_and_blanks() {
        let text = "\n# tree of rails\n[annotation]\n  (A:1,B:1);\nA 0\n";
        assert_eq!(first_tree_line(text), Some((3, "(A:1,B:1);")));
    }

    #[test]
    fn test_first_tree_line_none() {
        assert_eq!(first_tree_line("\n#only comments\n\n"), None);
    }

    #[test]
    fn test_parse_first_tree_swallows_parse_error() {
        assert!(parse_first_tree("(A:1,B:1\n", "test").is_none());
    }
}
