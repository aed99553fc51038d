use crate::ast::{Expr, Program, Stmt};

/// One declared variable and its memory slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub address: usize,
}

/// Ordered symbol table: addresses are first-declaration order, zero-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Builds a table from a statement body, keeping the first address when
    /// a name is declared twice. Used by the translator when the analyser
    /// was skipped; the analyser itself rejects duplicates.
    pub fn from_body(body: &[Stmt]) -> Self {
        let mut table = SymbolTable::default();
        for name in declaration_names(body) {
            if table.address_of(&name).is_none() {
                table.declare(name);
            }
        }
        table
    }

    fn declare(&mut self, name: String) {
        let address = self.symbols.len();
        self.symbols.push(Symbol { name, address });
    }

    pub fn address_of(&self, name: &str) -> Option<usize> {
        self.symbols
            .iter()
            .find(|symbol| symbol.name == name)
            .map(|symbol| symbol.address)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    /// An identifier was referenced but never declared.
    Undeclared { name: String },
    /// The same name was declared more than once in the single flat scope.
    Duplicate { name: String },
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticError::Undeclared { name } => {
                write!(f, "semantic error: variable `{}` is not declared", name)
            }
            SemanticError::Duplicate { name } => {
                write!(f, "semantic error: variable `{}` is declared twice", name)
            }
        }
    }
}

/// Two-pass declaration check.
///
/// Pass 1 collects every `var` declaration in encounter order and assigns
/// addresses 0..N-1. Pass 2 collects every identifier reference and fails
/// on the first one absent from the table. Pass 1 always runs to completion
/// first, so a reference may legally precede its declaration in the text.
pub struct Analyser;

impl Analyser {
    pub fn analyse(program: &Program) -> Result<SymbolTable, SemanticError> {
        let mut table = SymbolTable::default();
        for name in declaration_names(&program.body) {
            if table.address_of(&name).is_some() {
                return Err(SemanticError::Duplicate { name });
            }
            table.declare(name);
        }

        for name in reference_names(&program.body) {
            if table.address_of(&name).is_none() {
                return Err(SemanticError::Undeclared { name });
            }
        }

        Ok(table)
    }
}

/// All declared names in encounter order, including declarations nested in
/// loop bodies. Pure walk, no shared accumulator.
pub fn declaration_names(body: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for statement in body {
        match statement {
            Stmt::Variable { declarations } => {
                names.extend(declarations.iter().map(|d| d.name.clone()));
            }
            Stmt::DoWhile { body, .. } => {
                names.extend(declaration_names(body));
            }
            Stmt::Read { .. } | Stmt::Write { .. } | Stmt::Assignment { .. } => {}
        }
    }
    names
}

/// All identifier references in encounter order: read targets, assignment
/// targets, and every identifier operand in expressions.
pub fn reference_names(body: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for statement in body {
        match statement {
            Stmt::Variable { .. } => {}
            Stmt::Read { target } => names.push(target.clone()),
            Stmt::Write { value } => collect_expr_identifiers(value, &mut names),
            Stmt::DoWhile { body, condition } => {
                names.extend(reference_names(body));
                collect_expr_identifiers(condition, &mut names);
            }
            Stmt::Assignment { target, value } => {
                names.push(target.clone());
                collect_expr_identifiers(value, &mut names);
            }
        }
    }
    names
}

fn collect_expr_identifiers(expr: &Expr, names: &mut Vec<String>) {
    match expr {
        Expr::Binary { left, right, .. } => {
            collect_expr_identifiers(left, names);
            collect_expr_identifiers(right, names);
        }
        Expr::Identifier(name) => names.push(name.clone()),
        Expr::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyse(source: &str) -> Result<SymbolTable, SemanticError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        Analyser::analyse(&program)
    }

    #[test]
    fn test_addresses_follow_declaration_order() {
        let table = analyse("program p; begin var a, b; var c; end").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.address_of("a"), Some(0));
        assert_eq!(table.address_of("b"), Some(1));
        assert_eq!(table.address_of("c"), Some(2));
    }

    #[test]
    fn test_declarations_inside_loops_are_collected() {
        let table = analyse(
            "program p; begin var a; do begin var b; b := 1; end while (a != 0); end",
        )
        .unwrap();
        assert_eq!(table.address_of("b"), Some(1));
    }

    #[test]
    fn test_undeclared_write_operand() {
        let err = analyse("program p; begin write(c); end").unwrap_err();
        assert_eq!(
            err,
            SemanticError::Undeclared {
                name: "c".to_string()
            }
        );
    }

    #[test]
    fn test_undeclared_read_target() {
        let err = analyse("program p; begin read(a); end").unwrap_err();
        assert_eq!(
            err,
            SemanticError::Undeclared {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_undeclared_assignment_target() {
        let err = analyse("program p; begin var a; b := a; end").unwrap_err();
        assert_eq!(
            err,
            SemanticError::Undeclared {
                name: "b".to_string()
            }
        );
    }

    #[test]
    fn test_reference_may_precede_declaration() {
        // Declarations are collected over the whole tree before any
        // reference is validated.
        let result = analyse("program p; begin a := 1; var a; end");
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = analyse("program p; begin var a, a; end").unwrap_err();
        assert_eq!(
            err,
            SemanticError::Duplicate {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_from_body_keeps_first_address() {
        let tokens = Lexer::new("program p; begin var a; var b; var a; end")
            .tokenize()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let table = SymbolTable::from_body(&program.body);
        assert_eq!(table.len(), 2);
        assert_eq!(table.address_of("a"), Some(0));
        assert_eq!(table.address_of("b"), Some(1));
    }
}
