//! Loader for tree files with tip states (relaxed `.ttn` format).
//!
//! # Format
//! ```text
//! # comment lines and blank lines are skipped
//! ((Kakapo:1,Kea:1):1,Takahe:2);
//! Kakapo  0
//! Kea     1   # text after '#' is ignored
//! Takahe  1
//! ```
//! * The first non-blank line not starting with `#` or `[` is the Newick string
//! * Every later non-blank line is `label<whitespace>state`
//! * A state is a single character, read as integer (default) or float
//!
//! The number of states is the number of distinct state tokens in the file.
//! Tips whose label has no line are left without state and listed in the
//! [TipStateReport]; a repeated label is a warning and the last line wins.

use crate::model::{CharacterState, Tree, VertexIndex};
use crate::newick;
use crate::newick::defs::COMMENT_LINE_PREFIXES;
use crate::parser::{ParsingError, ParsingErrorType};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Marks the start of a trailing comment on a state line
const COMMENT_MARKER: char = '#';

// =#========================================================================#=
// TIP STATE LOADER
// =#========================================================================#=
/// Loader (configuration) for tree files with tip states.
///
/// # Example
/// ```
/// use mk2fit::model::CharacterState;
/// use mk2fit::states::TipStateLoader;
///
/// let text = "(Kakapo:1,Kea:1);\nKakapo 0\nKea 1\n";
/// let loaded = TipStateLoader::new().load_str(text).unwrap().unwrap();
///
/// let kea = loaded.tree.find_tip("Kea").unwrap();
/// assert_eq!(loaded.tree[kea].state(), Some(CharacterState::Discrete(1)));
/// assert_eq!(loaded.report.num_states, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TipStateLoader {
    float_states: bool,
}

/// A tree with tip states assigned, together with what the loader noticed.
#[derive(Debug, Clone)]
pub struct TipStateTree {
    pub tree: Tree,
    pub report: TipStateReport,
}

/// Summary of assigning tip states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipStateReport {
    /// Number of distinct state tokens in the file
    pub num_states: usize,
    /// Labels listed more than once (one entry per repetition)
    pub duplicate_labels: Vec<String>,
    /// Tips left without state, in left-to-right order
    pub unmapped_tips: Vec<VertexIndex>,
}

/// State token and the (1-based) line it was read from
struct StateEntry<'a> {
    token: &'a str,
    line_number: usize,
    line: &'a str,
}

impl TipStateLoader {
    /// Creates a new loader reading integer states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads states as floating-point values ([CharacterState::Continuous]).
    pub fn with_float_states(mut self) -> Self {
        self.float_states = true;
        self
    }

    /// Loads tree and tip states from a file.
    ///
    /// # Returns
    /// * `Ok(Some(TipStateTree))` - Tree with states assigned
    /// * `Ok(None)` - If the file holds no (valid) tree, see [newick::load_file]
    /// * `Err(ParsingError)` - If the file cannot be read, a state line is
    ///   malformed, or a state is invalid or out of range
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Option<TipStateTree>, ParsingError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.load_from(&text, &path.display().to_string())
    }

    /// Loads tree and tip states from the content of a file.
    ///
    /// See [TipStateLoader::load].
    pub fn load_str(&self, text: &str) -> Result<Option<TipStateTree>, ParsingError> {
        self.load_from(text, "tip-state text")
    }

    fn load_from(&self, text: &str, source: &str) -> Result<Option<TipStateTree>, ParsingError> {
        let Some((mut tree, tree_line)) = newick::parse_first_tree(text, source) else {
            return Ok(None);
        };

        let mut report = TipStateReport::default();
        let entries = read_state_lines(text, tree_line, &mut report)?;
        report.num_states = entries
            .values()
            .map(|entry| entry.token)
            .collect::<HashSet<_>>()
            .len();

        self.assign_states(&mut tree, &entries, &mut report)?;
        if !report.unmapped_tips.is_empty() {
            log::debug!(
                "{} tips in {source} have no state",
                report.unmapped_tips.len()
            );
        }

        Ok(Some(TipStateTree { tree, report }))
    }

    /// Assigns states depth-first to all tips whose label has an entry.
    fn assign_states(
        &self,
        tree: &mut Tree,
        entries: &HashMap<&str, StateEntry>,
        report: &mut TipStateReport,
    ) -> Result<(), ParsingError> {
        let tips: Vec<VertexIndex> = tree
            .pre_order_iter()
            .filter(|v| v.is_tip())
            .map(|v| v.index())
            .collect();

        for index in tips {
            let entry = tree[index].label().and_then(|label| entries.get(label));
            let Some(entry) = entry else {
                report.unmapped_tips.push(index);
                continue;
            };
            let state = self.parse_state(entry, report.num_states)?;
            tree[index].set_state(Some(state));
        }
        Ok(())
    }

    fn parse_state(&self, entry: &StateEntry, num_states: usize) -> Result<CharacterState, ParsingError> {
        let label = entry
            .line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        let invalid = || {
            ParsingError::at_line(
                ParsingErrorType::InvalidTipState {
                    label: label.clone(),
                    state: entry.token.to_string(),
                },
                entry.line_number,
                entry.line,
            )
        };

        if entry.token.chars().count() != 1 {
            return Err(invalid());
        }

        if self.float_states {
            let value: f64 = entry.token.parse().map_err(|_| invalid())?;
            return Ok(CharacterState::Continuous(value));
        }

        let state: usize = entry.token.parse().map_err(|_| invalid())?;
        if state >= num_states {
            return Err(ParsingError::at_line(
                ParsingErrorType::TipStateOutOfRange {
                    label,
                    state,
                    num_states,
                },
                entry.line_number,
                entry.line,
            ));
        }
        Ok(CharacterState::Discrete(state))
    }
}

/// Loads tree and integer tip states from a file using default settings.
///
/// See [TipStateLoader::load] for full documentation.
pub fn load_tip_state_file<P: AsRef<Path>>(path: P) -> Result<Option<TipStateTree>, ParsingError> {
    TipStateLoader::new().load(path)
}

// ============================================================================
// Helpers (private)
// ============================================================================
/// Reads `label state` lines after the tree line into a map; last entry wins.
fn read_state_lines<'a>(
    text: &'a str,
    tree_line: usize,
    report: &mut TipStateReport,
) -> Result<HashMap<&'a str, StateEntry<'a>>, ParsingError> {
    let mut entries: HashMap<&str, StateEntry> = HashMap::new();

    for (index, raw_line) in text.lines().enumerate().skip(tree_line + 1) {
        let line = raw_line
            .split_once(COMMENT_MARKER)
            .map_or(raw_line, |(content, _)| content)
            .trim();
        if line.is_empty() || line.starts_with(COMMENT_LINE_PREFIXES) {
            continue;
        }

        let line_number = index + 1;
        let Some((label, token)) = line.split_once(char::is_whitespace) else {
            return Err(ParsingError::at_line(
                ParsingErrorType::MalformedStateLine(line.to_string()),
                line_number,
                line,
            ));
        };

        if entries.contains_key(label) {
            log::warn!("Label {label} is used more than once (line {line_number})");
            report.duplicate_labels.push(label.to_string());
        }
        entries.insert(
            label,
            StateEntry {
                token: token.trim(),
                line_number,
                line,
            },
        );
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_state_lines_strips_comments() {
        let text = "(A,B);\nA 0 # first\n\n# whole line\nB 1\n";
        let mut report = TipStateReport::default();
        let entries = read_state_lines(text, 0, &mut report).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["A"].token, "0");
        assert_eq!(entries["B"].line_number, 5);
        assert!(report.duplicate_labels.is_empty());
    }

    #[test]
    fn test_read_state_lines_label_only_is_malformed() {
        let text = "(A,B);\nA 0\nB\n";
        let mut report = TipStateReport::default();
        let err = read_state_lines(text, 0, &mut report).err().unwrap();
        assert_eq!(err.kind(), &ParsingErrorType::MalformedStateLine("B".to_string()));
        assert_eq!(err.position(), 3);
    }
}
