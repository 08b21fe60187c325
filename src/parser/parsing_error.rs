//! Error types for the Newick parser and the tip-state loader.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for representing
//! and reporting errors that occur while reading trees and tip states.

use crate::parser::byte_parser::ByteParser;

/// Default length of context provided by error from parser
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================#=
/// Error types that can occur while parsing Newick strings and tip-state files.
#[derive(PartialEq, Debug, Clone, thiserror::Error)]
pub enum ParsingErrorType {
    #[error("IO error - {0}")]
    Io(String),
    #[error("Newick strings must end with a ;")]
    MissingTerminator,
    #[error("Too many ; in Newick string")]
    MultipleTerminators,
    #[error("Mismatched ( ) in Newick string")]
    UnbalancedParentheses,
    #[error("Empty clade () in Newick string")]
    EmptyClade,
    #[error("Adjacent clades )( without separator in Newick string")]
    AdjacentClades,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Invalid branch length: {0}")]
    InvalidBranchLength(String),
    #[error("Problem reading character states, something is wrong with `{0}`; proper format is `label state`")]
    MalformedStateLine(String),
    #[error("Invalid state `{state}` for tip `{label}`")]
    InvalidTipState { label: String, state: String },
    #[error("State {state} for tip `{label}` out of range (number of states: {num_states})")]
    TipStateOutOfRange {
        label: String,
        state: usize,
        num_states: usize,
    },
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Parsing error with contextual information (position and surrounding bytes).
///
/// For tip-state files, `position` is the 1-based line number and
/// `context` the offending line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at position {position}{}", format_context(.context))]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

fn format_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context (next {} bytes): {}", context.len(), context)
    }
}

impl ParsingError {
    /// Create a ParsingError from an error type and parser state
    pub fn from_parser(kind: ParsingErrorType, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Create a ParsingError at a byte offset of the given text
    pub fn at_offset(kind: ParsingErrorType, text: &str, offset: usize) -> Self {
        let tail = text.as_bytes().get(offset..).unwrap_or(&[]);
        let end = tail.len().min(DEFAULT_CONTEXT_LENGTH);
        Self {
            kind,
            position: offset,
            context: String::from_utf8_lossy(&tail[..end]).into_owned(),
        }
    }

    /// Create a ParsingError for a line of a text file
    pub fn at_line(kind: ParsingErrorType, line_number: usize, line: &str) -> Self {
        Self {
            kind,
            position: line_number,
            context: line.to_string(),
        }
    }

    /// Create a ParsingError without parser context
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            position: 0,
            context: String::new(),
        }
    }

    /// Convenience constructor for InvalidNewickString
    pub fn invalid_newick_string(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg), parser)
    }

    /// Convenience constructor for InvalidBranchLength
    pub fn invalid_branch_length(parser: &ByteParser, value: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidBranchLength(value), parser)
    }

    /// Convenience constructor for EmptyClade
    pub fn empty_clade(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::EmptyClade, parser)
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the context recorded with the error
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError::without_context(ParsingErrorType::Io(err.to_string()))
    }
}
