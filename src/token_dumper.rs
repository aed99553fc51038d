use crate::lexer::Spanned;
use crate::token::Token;

/// Renders the token stream for `--tokens`, one token per line with its
/// source span and a kind column.
pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, tokens: &[Spanned]) {
        for s in tokens {
            self.print_one(s);
        }
    }

    fn print_one(&self, s: &Spanned) {
        let kind = self.kind(&s.token);
        let colr = if self.color { self.color(&s.token) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        println!(
            "[{:02}:{:02}] {}{:<8} {}{}",
            s.span.line, s.span.col, colr, kind, s.token, reset
        );
    }

    fn kind(&self, t: &Token) -> &'static str {
        use Token::*;
        match t {
            Eof => "EOF",
            Number(_) => "NUMBER",
            Ident(_) => "IDENT",
            Assign | Plus | Minus | Star | Slash => "OP",
            Eq | NotEq | Lt | LtEq | Gt | GtEq => "CMP",
            Semicolon | Comma | LParen | RParen => "PUNCT",
            _ => "KEYWORD",
        }
    }

    fn color(&self, t: &Token) -> &'static str {
        use Token::*;
        match t {
            Eof => Self::DIM,
            Number(_) => Self::CYN,
            Ident(_) => Self::YEL,
            Assign | Plus | Minus | Star | Slash => Self::MAG,
            Eq | NotEq | Lt | LtEq | Gt | GtEq => Self::MAG,
            _ => Self::RESET,
        }
    }
}
