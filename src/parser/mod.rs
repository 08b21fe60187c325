//! Basic low-level parsing functionality.
//!
//! This module provides the [ByteParser] cursor used by the Newick parser,
//! along with [ParsingError] shared by the Newick parser and the
//! tip-state loader.

pub mod byte_parser;
pub mod parsing_error;

pub use byte_parser::ByteParser;
pub use parsing_error::{ParsingError, ParsingErrorType};
