//! Newick parser building a [Tree] from a single Newick string.

use crate::model::{BranchLength, Tree, VertexIndex};
use crate::newick::defs::{DEFAULT_NUM_VERTICES_GUESS, NEWICK_STRUCTURAL};
use crate::parser::{ByteParser, ParsingError, ParsingErrorType};

/// Parser (configuration) for Newick format phylogenetic [Tree]s.
///
/// Parsing happens in two steps:
/// 1. [validate] checks the string for gross malformations
///    (terminator, parentheses, empty or adjacent clades).
/// 2. A single left-to-right scan moves a cursor through the tree:
///    `(` opens a child clade and descends into it, `,` returns to the
///    enclosing clade, `)` closes the clade (optionally followed by its label),
///    `:` attaches a branch length, and any other run of characters is the
///    label of a new tip.
///
/// Internal vertices may have any number of children. Exactly one level of
/// redundant outer parentheses (unlabelled, without branch length) is
/// removed, and a root without branch length gets length zero.
///
/// # Example
/// ```
/// use mk2fit::newick::NewickParser;
/// use mk2fit::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((A:1,B:1)AB:2,C:3);");
/// let tree = NewickParser::new().parse_str(&mut byte_parser).unwrap();
/// assert_eq!(tree.num_tips(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    num_vertices: usize,
}

/// What the scan expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Start of a vertex: `(` or a label
    Vertex,
    /// A vertex is complete: `:`, `,`, `)` or `;`
    AfterVertex,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a new `NewickParser` with default settings.
    pub fn new() -> Self {
        Self {
            num_vertices: DEFAULT_NUM_VERTICES_GUESS,
        }
    }

    /// Sets the expected number of vertices, used to pre-allocate the arena.
    pub fn with_num_vertices(mut self, num_vertices: usize) -> Self {
        self.num_vertices = num_vertices;
        self
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// The parser is expected to hold exactly one Newick string
    /// (surrounding whitespace allowed).
    ///
    /// # Returns
    /// * `Ok(Tree)` - The parsed phylogenetic tree
    /// * `Err(ParsingError)` - If the Newick string is malformed
    pub fn parse_str(&self, parser: &mut ByteParser) -> Result<Tree, ParsingError> {
        let text = parser.get_context_as_string(usize::MAX);
        validate(&text)?;

        // The nominal root collects the top-level clade(s)
        let mut tree = Tree::with_capacity(self.num_vertices + 1);
        let nominal_root = tree.add_tip(None, None, None);
        tree.set_root(nominal_root);

        let mut current = nominal_root;
        let mut expect = Expect::Vertex;

        loop {
            parser.skip_whitespace();
            let Some(byte) = parser.peek() else {
                return Err(ParsingError::invalid_newick_string(
                    parser,
                    "Unexpected end of Newick string".to_string(),
                ));
            };

            match (byte, expect) {
                (b'(', Expect::Vertex) => {
                    parser.next_byte();
                    current = tree.add_child(current, None, None, None);
                }
                (b',', Expect::AfterVertex) => {
                    parser.next_byte();
                    current = self.enclosing(&tree, current, nominal_root, parser)?;
                    expect = Expect::Vertex;
                }
                (b')', Expect::AfterVertex) => {
                    parser.next_byte();
                    current = self.enclosing(&tree, current, nominal_root, parser)?;
                    parser.skip_whitespace();
                    if parser.peek().is_some_and(|b| !NEWICK_STRUCTURAL.contains(&b)) {
                        let label = parser.parse_label(NEWICK_STRUCTURAL)?;
                        tree[current].set_label(Some(label));
                    }
                }
                (b':', Expect::AfterVertex) => {
                    parser.next_byte();
                    if tree[current].has_branch_length() {
                        return Err(ParsingError::invalid_newick_string(
                            parser,
                            "Vertex has more than one branch length".to_string(),
                        ));
                    }
                    let branch_length = self.parse_branch_length(parser)?;
                    tree[current].set_branch_length(Some(branch_length));
                }
                (b';', Expect::AfterVertex) => {
                    parser.next_byte();
                    if tree[current].parent() != Some(nominal_root) {
                        return Err(ParsingError::invalid_newick_string(
                            parser,
                            "Reached ';' inside an open clade".to_string(),
                        ));
                    }
                    break;
                }
                (b'(', Expect::AfterVertex) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        "Expected ',' or ')' before '('".to_string(),
                    ));
                }
                (b')', Expect::Vertex) | (b',', Expect::Vertex) => {
                    return Err(ParsingError::empty_clade(parser));
                }
                (b':', Expect::Vertex) | (b';', Expect::Vertex) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Expected '(' or label but found {:?}", byte as char),
                    ));
                }
                (_, Expect::Vertex) => {
                    let label = parser.parse_label(NEWICK_STRUCTURAL)?;
                    current = tree.add_child(current, Some(&label), None, None);
                    expect = Expect::AfterVertex;
                }
                (_, Expect::AfterVertex) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Unexpected {:?} after complete vertex", byte as char),
                    ));
                }
            }
        }

        parser.skip_whitespace();
        if !parser.is_eof() {
            return Err(ParsingError::invalid_newick_string(
                parser,
                "Trailing characters after ';'".to_string(),
            ));
        }

        Ok(Self::finalize(tree, nominal_root))
    }

    /// Returns the clade enclosing `current`; the nominal root is never left.
    fn enclosing(
        &self,
        tree: &Tree,
        current: VertexIndex,
        nominal_root: VertexIndex,
        parser: &ByteParser,
    ) -> Result<VertexIndex, ParsingError> {
        match tree[current].parent() {
            Some(parent) if current != nominal_root => Ok(parent),
            _ => Err(ParsingError::from_parser(
                ParsingErrorType::UnbalancedParentheses,
                parser,
            )),
        }
    }

    /// Parses the value of a branch length after `:` up to the next structural character.
    fn parse_branch_length(&self, parser: &mut ByteParser) -> Result<BranchLength, ParsingError> {
        parser.skip_whitespace();
        let token = parser.parse_unquoted_label(NEWICK_STRUCTURAL);
        let token = token.trim();

        token
            .parse::<f64>()
            .ok()
            .and_then(BranchLength::try_new)
            .ok_or_else(|| ParsingError::invalid_branch_length(parser, token.to_string()))
    }

    /// Picks the real root and drops the nominal root from the arena.
    fn finalize(tree: Tree, nominal_root: VertexIndex) -> Tree {
        let mut root = nominal_root;
        if let [only_child] = tree[nominal_root].children() {
            root = *only_child;
        }

        // Redundant outer parentheses around the whole tree
        let vertex = &tree[root];
        if let [only_child] = vertex.children() {
            if vertex.label().is_none() && !vertex.has_branch_length() {
                root = *only_child;
            }
        }

        let mut tree = tree.subtree(root);
        if let Some(root_index) = tree.root_index() {
            if !tree[root_index].has_branch_length() {
                tree[root_index].set_branch_length(Some(BranchLength::ZERO));
            }
        }
        tree
    }
}

/// Checks a Newick string for malformations before it is scanned.
///
/// The string (surrounding whitespace ignored) must end with `;`, contain
/// exactly one `;`, have balanced parentheses, and contain neither `()`
/// nor `)(`. Characters inside single-quoted labels are not counted.
///
/// # Errors
/// [ParsingError] naming the first malformation found.
pub fn validate(newick: &str) -> Result<(), ParsingError> {
    let offset = newick.len() - newick.trim_start().len();
    let trimmed = newick.trim();
    let error = |kind, position: usize| Err(ParsingError::at_offset(kind, newick, offset + position));

    if !trimmed.ends_with(';') {
        return error(ParsingErrorType::MissingTerminator, trimmed.len());
    }
    let masked = match mask_quoted(trimmed) {
        Ok(masked) => masked,
        Err(position) => {
            let kind = ParsingErrorType::InvalidNewickString("Unclosed quoted label".to_string());
            return error(kind, position);
        }
    };

    if let Some(position) = masked.iter().position(|&b| b == b';').filter(|&p| p + 1 != masked.len()) {
        return error(ParsingErrorType::MultipleTerminators, position);
    }

    let mut depth: usize = 0;
    for (position, byte) in masked.iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return error(ParsingErrorType::UnbalancedParentheses, position),
            },
            _ => {}
        }
    }
    if depth != 0 {
        return error(ParsingErrorType::UnbalancedParentheses, trimmed.len());
    }

    if let Some(position) = masked.windows(2).position(|pair| pair == b")(") {
        return error(ParsingErrorType::AdjacentClades, position);
    }
    if let Some(position) = masked.windows(2).position(|pair| pair == b"()") {
        return error(ParsingErrorType::EmptyClade, position);
    }

    Ok(())
}

/// Copy of `text` with every quoted label, quotes included, blanked out.
///
/// A doubled quote inside a label closes and reopens it, so it stays blanked.
/// Returns the position of the opening quote if a label is never closed.
fn mask_quoted(text: &str) -> Result<Vec<u8>, usize> {
    let mut masked = text.as_bytes().to_vec();
    let mut opened_at = None;
    for (position, byte) in masked.iter_mut().enumerate() {
        if *byte == b'\'' {
            opened_at = match opened_at {
                Some(_) => None,
                None => Some(position),
            };
            *byte = b'_';
        } else if opened_at.is_some() {
            *byte = b'_';
        }
    }
    match opened_at {
        Some(position) => Err(position),
        None => Ok(masked),
    }
}
