/// Error produced when the token stream does not match the grammar.
///
/// Positions are 1-based and taken from the offending token's span. When
/// the input ends early there is no offending token, so the parser reports
/// the span of the token it consumed last instead.
#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for ParserError {
    /// Renders as `line:col: message`, matching the lexer's error format.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}
