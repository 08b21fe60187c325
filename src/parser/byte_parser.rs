//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser] for parsing text-based formats with support
//! for peeking, consuming, whitespace skipping and label parsing. Used as
//! the foundation of the Newick parser.

use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser over in-memory ASCII text.
///
/// # Features
/// - Peek and consume single bytes
/// - Whitespace skipping
/// - Quote-aware label parsing (single quotes with escaping)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use mk2fit::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  (A:1.0,B:1.0);");
/// parser.skip_whitespace();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.peek(), Some(b'A'));
/// ```
pub struct ByteParser {
    /// The owned byte data being parsed
    input: Vec<u8>,
    /// Current position in the input
    pos: usize,
}

impl ByteParser {
    /// Creates a new `ByteParser` from a byte slice by copying it into a Vec.
    pub fn from_bytes(input: &[u8]) -> Self {
        Self::from_vec(input.to_vec())
    }

    /// Creates a new `ByteParser` owning the given bytes.
    pub fn from_vec(input: Vec<u8>) -> Self {
        Self { input, pos: 0 }
    }

    /// Creates a new `ByteParser` from a string slice by copying it into a Vec.
    pub fn for_str(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips (consumes) all consecutive whitespace characters.
    ///
    /// Whitespace includes: space (' '), tab ('\t'), newline ('\n'), and carriage return ('\r').
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Checks if the current byte matches the target byte.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it matches the target byte.
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current parser position in the input.
    ///
    /// Useful for error messages and tracking parser state.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns up to `k` bytes from the current position for error context.
    pub fn get_context(&self, k: usize) -> &[u8] {
        let start = self.pos.min(self.input.len());
        let end = self.pos.saturating_add(k).min(self.input.len());
        &self.input[start..end]
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(self.get_context(k)).into_owned()
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// Leading whitespace is skipped; trailing whitespace of an unquoted
    /// label is trimmed, while whitespace within it is kept.
    ///
    /// # Arguments
    /// * `delimiters` - Byte array of characters that end an unquoted label
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_whitespace();

        if self.peek_is(b'\'') {
            let label = self.parse_quoted_label()?;
            self.skip_whitespace();
            Ok(label)
        } else {
            Ok(self.parse_unquoted_label(delimiters).trim_end().to_string())
        }
    }

    /// Parses a quoted label enclosed in single quotes with escape support.
    ///
    /// Assumes the opening quote has not been consumed yet. Single quotes within
    /// the label are escaped by doubling them (e.g., `'Wilson''s'` becomes `Wilson's`).
    ///
    /// # Errors
    /// Returns an error if the quoted label is not properly closed
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // consume opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                Some(b'\'') => {
                    // Doubled quote is an escaped quote, otherwise end of label
                    if self.consume_if(b'\'') {
                        label.push(b'\'');
                    } else {
                        break;
                    }
                }
                Some(b) => label.push(b),
                None => {
                    return Err(ParsingError::invalid_newick_string(
                        self,
                        "Unclosed quoted label".to_string(),
                    ));
                }
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label until any of the given delimiters (or EOF) is encountered.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            self.next_byte();
        }

        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}
