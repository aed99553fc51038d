use crate::token::Token;

#[derive(Debug, Clone)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

/// Lexer for cinder source text.
///
/// Matching order is load-bearing: two-character operators are tried before
/// their one-character prefixes, and keywords are only recognized on the
/// full identifier text, so `doer` lexes as a single identifier and never as
/// a truncated `do`.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let start_line = self.line;
        let start_col = self.col;

        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value: i64 = digits.parse().map_err(|_| LexerError {
            message: format!("invalid number: {}", digits),
            line: start_line,
            col: start_col,
        })?;

        Ok(Token::Number(value))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Keywords match only on the whole word; anything longer stays an
        // identifier (`doer`, `writer`, ...).
        match ident.as_str() {
            "program" => Token::Program,
            "begin" => Token::Begin,
            "end" => Token::End,
            "var" => Token::Var,
            "read" => Token::Read,
            "write" => Token::Write,
            "do" => Token::Do,
            "while" => Token::While,
            _ => Token::Ident(ident),
        }
    }

    fn read_operator(&mut self) -> Result<Token, LexerError> {
        let ch = self.current().ok_or_else(|| {
            // read_operator is only called with a current char; keep the
            // error structured anyway.
            self.error("unexpected end of input".to_string())
        })?;
        let next = self.peek();

        // Two-character operators first.
        let token = match (ch, next) {
            (':', Some('=')) => {
                self.advance();
                self.advance();
                Token::Assign
            }
            ('!', Some('=')) => {
                self.advance();
                self.advance();
                Token::NotEq
            }
            ('<', Some('=')) => {
                self.advance();
                self.advance();
                Token::LtEq
            }
            ('>', Some('=')) => {
                self.advance();
                self.advance();
                Token::GtEq
            }
            ('+', _) => {
                self.advance();
                Token::Plus
            }
            ('-', _) => {
                self.advance();
                Token::Minus
            }
            ('*', _) => {
                self.advance();
                Token::Star
            }
            ('/', _) => {
                self.advance();
                Token::Slash
            }
            ('=', _) => {
                self.advance();
                Token::Eq
            }
            ('<', _) => {
                self.advance();
                Token::Lt
            }
            ('>', _) => {
                self.advance();
                Token::Gt
            }
            _ => {
                return Err(self.error(format!("unexpected character: '{}'", ch)));
            }
        };

        Ok(token)
    }

    /// Lexes the whole source into spanned tokens, ending with `Token::Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let span = self.span();

            match self.current() {
                None => {
                    tokens.push(Spanned {
                        token: Token::Eof,
                        span,
                    });
                    break;
                }
                Some(';') => {
                    self.advance();
                    tokens.push(Spanned {
                        token: Token::Semicolon,
                        span,
                    });
                }
                Some(',') => {
                    self.advance();
                    tokens.push(Spanned {
                        token: Token::Comma,
                        span,
                    });
                }
                Some('(') => {
                    self.advance();
                    tokens.push(Spanned {
                        token: Token::LParen,
                        span,
                    });
                }
                Some(')') => {
                    self.advance();
                    tokens.push(Spanned {
                        token: Token::RParen,
                        span,
                    });
                }
                Some(ch) if ch.is_ascii_digit() => {
                    let token = self.read_number()?;
                    tokens.push(Spanned { token, span });
                }
                Some(ch) if ch.is_alphabetic() || ch == '_' => {
                    let token = self.read_identifier();
                    tokens.push(Spanned { token, span });
                }
                Some(ch) if ":+-*/=<>!".contains(ch) => {
                    let token = self.read_operator()?;
                    tokens.push(Spanned { token, span });
                }
                Some(ch) => {
                    return Err(self.error(format!("unexpected character: '{}'", ch)));
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .filter(|t| !matches!(t, Token::Eof))
            .collect()
    }

    #[test]
    fn test_keywords() {
        let t = tokens("program begin end var read write do while");
        assert_eq!(
            t,
            vec![
                Token::Program,
                Token::Begin,
                Token::End,
                Token::Var,
                Token::Read,
                Token::Write,
                Token::Do,
                Token::While
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        // `doer` must never lex as `do` + `er`.
        let t = tokens("doer writer variable ending");
        assert_eq!(
            t,
            vec![
                Token::Ident("doer".to_string()),
                Token::Ident("writer".to_string()),
                Token::Ident("variable".to_string()),
                Token::Ident("ending".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let t = tokens(":= + - * / = != < <= > >=");
        assert_eq!(
            t,
            vec![
                Token::Assign,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Eq,
                Token::NotEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq
            ]
        );
    }

    #[test]
    fn test_two_char_operators_without_spaces() {
        let t = tokens("a<=b a!=0 a>=b");
        assert_eq!(
            t,
            vec![
                Token::Ident("a".to_string()),
                Token::LtEq,
                Token::Ident("b".to_string()),
                Token::Ident("a".to_string()),
                Token::NotEq,
                Token::Number(0),
                Token::Ident("a".to_string()),
                Token::GtEq,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_assignment_statement() {
        let t = tokens("b := a + 1;");
        assert_eq!(
            t,
            vec![
                Token::Ident("b".to_string()),
                Token::Assign,
                Token::Ident("a".to_string()),
                Token::Plus,
                Token::Number(1),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        let t = tokens("read(a); var a, b;");
        assert_eq!(
            t,
            vec![
                Token::Read,
                Token::LParen,
                Token::Ident("a".to_string()),
                Token::RParen,
                Token::Semicolon,
                Token::Var,
                Token::Ident("a".to_string()),
                Token::Comma,
                Token::Ident("b".to_string()),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn test_eof_token() {
        let mut lexer = Lexer::new("end");
        let sp = lexer.tokenize().unwrap();
        assert_eq!(sp.len(), 2);
        assert_eq!(sp[1].token, Token::Eof);
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("var a;\nb := 1;");
        let sp = lexer.tokenize().unwrap();

        assert_eq!(sp[0].token, Token::Var);
        assert_eq!((sp[0].span.line, sp[0].span.col), (1, 1));

        assert_eq!(sp[1].token, Token::Ident("a".to_string()));
        assert_eq!((sp[1].span.line, sp[1].span.col), (1, 5));

        assert_eq!(sp[3].token, Token::Ident("b".to_string()));
        assert_eq!((sp[3].span.line, sp[3].span.col), (2, 1));

        assert_eq!(sp[4].token, Token::Assign);
        assert_eq!((sp[4].span.line, sp[4].span.col), (2, 3));
    }

    #[test]
    fn test_unexpected_character_error() {
        let mut lexer = Lexer::new("a @ b");
        let err = lexer.tokenize().unwrap_err();
        assert!(
            err.message.contains("unexpected character: '@'"),
            "msg was: {}",
            err.message
        );
        assert_eq!((err.line, err.col), (1, 3));
    }

    #[test]
    fn test_bare_colon_error() {
        // ':' is only valid as the start of ':='.
        let mut lexer = Lexer::new("a : b");
        let err = lexer.tokenize().unwrap_err();
        assert!(
            err.message.contains("unexpected character: ':'"),
            "msg was: {}",
            err.message
        );
    }

    #[test]
    fn test_bare_bang_error() {
        let mut lexer = Lexer::new("a ! b");
        let err = lexer.tokenize().unwrap_err();
        assert!(
            err.message.contains("unexpected character: '!'"),
            "msg was: {}",
            err.message
        );
    }

    #[test]
    fn test_number_overflow_error() {
        let mut lexer = Lexer::new("99999999999999999999");
        let err = lexer.tokenize().unwrap_err();
        assert!(
            err.message.contains("invalid number"),
            "msg was: {}",
            err.message
        );
    }
}
