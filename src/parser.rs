use crate::ast::{BinOp, Expr, Program, Stmt, VarDecl};
use crate::lexer::{Span, Spanned};
use crate::parser_error::ParserError;
use crate::token::Token;

/// Recursive-descent parser for cinder, one token of lookahead.
///
/// Grammar (all binary operators share one precedence level and associate
/// to the left):
///
/// ```text
/// Program        := 'program' Identifier ';' VariableStatement* StatementList
/// StatementList  := 'begin' Statement* 'end'
/// Statement      := VariableStatement | ReadStatement | WriteStatement
///                  | DoWhileStatement | AssignmentStatement
/// VariableStatement := 'var' Identifier (',' Identifier)* ';'
/// ReadStatement  := 'read' '(' Identifier ')' ';'
/// WriteStatement := 'write' '(' Expression ')' ';'
/// DoWhileStatement := 'do' StatementList 'while' '(' Expression ')' ';'
/// AssignmentStatement := Identifier ':=' Expression ';'
/// Expression     := Operand (Operator Operand)*
/// Operand        := Identifier | NumericLiteral
/// ```
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Span of the most recently consumed token, used so end-of-input
    /// errors still carry a useful location.
    last_span: Option<Span>,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            last_span: None,
        }
    }

    /// Returns the current token without consuming it.
    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    /// Peeks the current token kind without consuming anything.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    /// Advances the token stream by one and returns the consumed token.
    fn advance(&mut self) -> Option<&Spanned> {
        let token = self.tokens.get(self.pos);
        if let Some(s) = token {
            self.last_span = Some(s.span.clone());
        }
        self.pos += 1;
        token
    }

    fn error(&self, message: String) -> ParserError {
        if let Some(spanned) = self.current() {
            ParserError {
                message,
                line: spanned.span.line,
                col: spanned.span.col,
            }
        } else if let Some(span) = &self.last_span {
            ParserError {
                message,
                line: span.line,
                col: span.col,
            }
        } else {
            // Empty input case
            ParserError {
                message,
                line: 1,
                col: 1,
            }
        }
    }

    /// Consumes the current token if its kind matches `expected`, otherwise
    /// fails naming the offending token and its position.
    fn eat(&mut self, expected: &Token) -> Result<(), ParserError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.advance();
                Ok(())
            }
            Some(Token::Eof) | None => Err(self.error(format!(
                "unexpected end of input, expected `{}`",
                expected
            ))),
            Some(token) => Err(self.error(format!(
                "unexpected token `{}`, expected `{}`",
                token, expected
            ))),
        }
    }

    /// Consumes an identifier token and returns its name.
    fn eat_identifier(&mut self) -> Result<String, ParserError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(Token::Eof) | None => {
                Err(self.error("unexpected end of input, expected identifier".to_string()))
            }
            Some(token) => Err(self.error(format!(
                "unexpected token `{}`, expected identifier",
                token
            ))),
        }
    }

    /// Parses a complete program. Deterministic: the same token stream
    /// always yields a structurally identical AST.
    ///
    /// `var` sections may sit between the program header and `begin` as
    /// well as inside the statement list; header declarations become
    /// leading body statements, so the later stages see one form.
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        self.eat(&Token::Program)?;
        let name = self.eat_identifier()?;
        self.eat(&Token::Semicolon)?;

        let mut body = Vec::new();
        while self.peek() == Some(&Token::Var) {
            body.push(self.parse_variable_statement()?);
        }
        body.extend(self.parse_statement_list()?);

        self.eat(&Token::Eof)?;
        Ok(Program { name, body })
    }

    /// `'begin' Statement* 'end'`
    fn parse_statement_list(&mut self) -> Result<Vec<Stmt>, ParserError> {
        self.eat(&Token::Begin)?;

        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::End) => {
                    self.advance();
                    break;
                }
                Some(Token::Eof) | None => {
                    return Err(
                        self.error("unexpected end of input, expected `end`".to_string())
                    );
                }
                Some(_) => {
                    let statement = self.parse_statement()?;
                    statements.push(statement);
                }
            }
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParserError> {
        match self.peek() {
            Some(Token::Var) => self.parse_variable_statement(),
            Some(Token::Read) => self.parse_read_statement(),
            Some(Token::Write) => self.parse_write_statement(),
            Some(Token::Do) => self.parse_do_while_statement(),
            Some(Token::Ident(_)) => self.parse_assignment_statement(),
            Some(token) => Err(self.error(format!("unexpected statement start `{}`", token))),
            None => Err(self.error("unexpected end of input, expected statement".to_string())),
        }
    }

    /// `'var' Identifier (',' Identifier)* ';'`
    fn parse_variable_statement(&mut self) -> Result<Stmt, ParserError> {
        self.eat(&Token::Var)?;

        let mut declarations = Vec::new();
        declarations.push(VarDecl {
            name: self.eat_identifier()?,
        });
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            declarations.push(VarDecl {
                name: self.eat_identifier()?,
            });
        }
        self.eat(&Token::Semicolon)?;

        Ok(Stmt::Variable { declarations })
    }

    /// `'read' '(' Identifier ')' ';'`
    fn parse_read_statement(&mut self) -> Result<Stmt, ParserError> {
        self.eat(&Token::Read)?;
        self.eat(&Token::LParen)?;
        let target = self.eat_identifier()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;

        Ok(Stmt::Read { target })
    }

    /// `'write' '(' Expression ')' ';'`
    fn parse_write_statement(&mut self) -> Result<Stmt, ParserError> {
        self.eat(&Token::Write)?;
        self.eat(&Token::LParen)?;
        let value = self.parse_expression()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;

        Ok(Stmt::Write { value })
    }

    /// `'do' StatementList 'while' '(' Expression ')' ';'`
    fn parse_do_while_statement(&mut self) -> Result<Stmt, ParserError> {
        self.eat(&Token::Do)?;
        let body = self.parse_statement_list()?;
        self.eat(&Token::While)?;
        self.eat(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.eat(&Token::RParen)?;
        self.eat(&Token::Semicolon)?;

        Ok(Stmt::DoWhile { body, condition })
    }

    /// `Identifier ':=' Expression ';'`
    fn parse_assignment_statement(&mut self) -> Result<Stmt, ParserError> {
        let target = self.eat_identifier()?;
        self.eat(&Token::Assign)?;
        let value = self.parse_expression()?;
        self.eat(&Token::Semicolon)?;

        Ok(Stmt::Assignment { target, value })
    }

    /// `Operand (Operator Operand)*`, left-associative.
    fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_operand()?;

        while self.peek().is_some_and(|t| t.is_operator()) {
            // is_operator guards the loop, so the mapping always succeeds.
            let operator = self
                .advance()
                .and_then(|s| binop_for(&s.token))
                .ok_or_else(|| self.error("expected binary operator".to_string()))?;
            let right = self.parse_operand()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// `Identifier | NumericLiteral`
    fn parse_operand(&mut self) -> Result<Expr, ParserError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::Identifier(name))
            }
            Some(Token::Number(value)) => {
                let value = *value;
                self.advance();
                Ok(Expr::Number(value))
            }
            Some(Token::Eof) | None => {
                Err(self.error("unexpected end of input, expected operand".to_string()))
            }
            Some(token) => Err(self.error(format!(
                "unexpected token `{}`, expected identifier or number",
                token
            ))),
        }
    }
}

fn binop_for(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Eq => BinOp::Eq,
        Token::NotEq => BinOp::NotEq,
        Token::Gt => BinOp::Gt,
        Token::Lt => BinOp::Lt,
        Token::GtEq => BinOp::GtEq,
        Token::LtEq => BinOp::LtEq,
        _ => return None,
    };
    Some(op)
}
