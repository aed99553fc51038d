use crate::analyser::SymbolTable;
use crate::ast::{BinOp, Expr, Program, Stmt};
use crate::bytecode::{Op, Pcode, compile_error::CodegenError};

/// Code generator: walks the AST and emits pcode.
///
/// The instruction buffer and symbol table live only for one `translate`
/// call; the translator is consumed, so no compiler state can leak between
/// runs. Variable addresses come from the analyser's table when one is
/// supplied, otherwise they are derived here from first-declaration order.
pub struct Translator {
    code: Vec<Op>,
    symbols: SymbolTable,
}

impl Translator {
    pub fn new() -> Self {
        Translator {
            code: Vec::new(),
            symbols: SymbolTable::default(),
        }
    }

    /// Uses the analyser's symbol table instead of deriving one.
    pub fn with_symbols(symbols: SymbolTable) -> Self {
        Translator {
            code: Vec::new(),
            symbols,
        }
    }

    /// Translates a program into pcode.
    ///
    /// Emits the `INT n` prologue (n = declared-variable count), the body
    /// statements in order, and the `HLT` epilogue. Every branch operand is
    /// an absolute instruction index, resolved at emission time; the grammar
    /// only produces backward branches, so no patching pass exists.
    pub fn translate(mut self, program: &Program) -> Result<Pcode, CodegenError> {
        if self.symbols.is_empty() {
            self.symbols = SymbolTable::from_body(&program.body);
        }

        self.code.push(Op::Int(self.symbols.len()));
        for statement in &program.body {
            self.translate_statement(statement)?;
        }
        self.code.push(Op::Hlt);

        Ok(Pcode { ops: self.code })
    }

    fn translate_statement(&mut self, statement: &Stmt) -> Result<(), CodegenError> {
        match statement {
            // Slots were already reserved by the INT prologue.
            Stmt::Variable { .. } => {}

            Stmt::Read { target } => {
                let address = self.address_of(target)?;
                self.code.push(Op::Lda(address));
                self.code.push(Op::Inn);
            }

            Stmt::Write { value } => {
                self.translate_expression(value)?;
                self.code.push(Op::Prn);
            }

            Stmt::Assignment { target, value } => {
                let address = self.address_of(target)?;
                self.code.push(Op::Lda(address));
                self.translate_expression(value)?;
                self.code.push(Op::Sto);
            }

            Stmt::DoWhile { body, condition } => {
                // The body start is known before anything is emitted, so the
                // backward branch target needs no patching.
                let head = self.code.len();
                for inner in body {
                    self.translate_statement(inner)?;
                }
                self.translate_expression(condition)?;
                // BZE branches when the popped value is zero, so test the
                // complement of the condition: the loop then repeats exactly
                // while the condition itself is non-zero.
                self.code.push(Op::Ldi(0));
                self.code.push(Op::Eql);
                self.code.push(Op::Bze(head));
            }
        }

        Ok(())
    }

    /// Post-order: operands first, then the operator.
    fn translate_expression(&mut self, expression: &Expr) -> Result<(), CodegenError> {
        match expression {
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                self.translate_expression(left)?;
                self.translate_expression(right)?;
                self.code.push(opcode_for(*operator));
            }
            Expr::Identifier(name) => {
                let address = self.address_of(name)?;
                self.code.push(Op::Lda(address));
                self.code.push(Op::Ldv);
            }
            Expr::Number(value) => {
                self.code.push(Op::Ldi(*value));
            }
        }

        Ok(())
    }

    fn address_of(&self, name: &str) -> Result<usize, CodegenError> {
        self.symbols
            .address_of(name)
            .ok_or_else(|| CodegenError::UnknownVariable {
                name: name.to_string(),
            })
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

fn opcode_for(operator: BinOp) -> Op {
    match operator {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Div => Op::Div,
        BinOp::Eq => Op::Eql,
        BinOp::NotEq => Op::Neq,
        BinOp::Gt => Op::Gtr,
        BinOp::Lt => Op::Lss,
        BinOp::GtEq => Op::Geq,
        BinOp::LtEq => Op::Leq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(source: &str) -> Pcode {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        Translator::new().translate(&program).unwrap()
    }

    #[test]
    fn test_int_prologue_matches_variable_count() {
        let pcode = compile("program p; begin var a, b; var c; end");
        assert_eq!(pcode.ops[0], Op::Int(3));
    }

    #[test]
    fn test_empty_program_is_int_hlt() {
        let pcode = compile("program p; begin end");
        assert_eq!(pcode.ops, vec![Op::Int(0), Op::Hlt]);
    }

    #[test]
    fn test_read_statement() {
        let pcode = compile("program p; begin var a; read(a); end");
        assert_eq!(
            pcode.ops,
            vec![Op::Int(1), Op::Lda(0), Op::Inn, Op::Hlt]
        );
    }

    #[test]
    fn test_write_literal() {
        let pcode = compile("program p; begin write(7); end");
        assert_eq!(pcode.ops, vec![Op::Int(0), Op::Ldi(7), Op::Prn, Op::Hlt]);
    }

    #[test]
    fn test_assignment_order() {
        // Address first, then the value, then the store.
        let pcode = compile("program p; begin var a; a := 3; end");
        assert_eq!(
            pcode.ops,
            vec![Op::Int(1), Op::Lda(0), Op::Ldi(3), Op::Sto, Op::Hlt]
        );
    }

    #[test]
    fn test_identifier_operand_pushes_address_then_dereferences() {
        let pcode = compile("program p; begin var a, b; b := a; end");
        assert_eq!(
            pcode.ops,
            vec![
                Op::Int(2),
                Op::Lda(1),
                Op::Lda(0),
                Op::Ldv,
                Op::Sto,
                Op::Hlt
            ]
        );
    }

    #[test]
    fn test_binary_expression_is_post_order() {
        let pcode = compile("program p; begin var a; a := 1 + 2; end");
        assert_eq!(
            pcode.ops,
            vec![
                Op::Int(1),
                Op::Lda(0),
                Op::Ldi(1),
                Op::Ldi(2),
                Op::Add,
                Op::Sto,
                Op::Hlt
            ]
        );
    }

    #[test]
    fn test_neq_and_eql_compile_to_distinct_opcodes() {
        let neq = compile("program p; begin var a; write(a != 0); end");
        let eql = compile("program p; begin var a; write(a = 0); end");
        assert!(neq.ops.contains(&Op::Neq));
        assert!(!neq.ops.contains(&Op::Eql));
        assert!(eql.ops.contains(&Op::Eql));
        assert!(!eql.ops.contains(&Op::Neq));
        assert_ne!(neq.ops, eql.ops);
    }

    #[test]
    fn test_comparison_opcodes() {
        let pcode = compile("program p; begin var a; write(a >= 1); write(a <= 1); write(a > 1); write(a < 1); end");
        assert!(pcode.ops.contains(&Op::Geq));
        assert!(pcode.ops.contains(&Op::Leq));
        assert!(pcode.ops.contains(&Op::Gtr));
        assert!(pcode.ops.contains(&Op::Lss));
    }

    #[test]
    fn test_do_while_branches_back_to_body_start() {
        let pcode = compile(
            "program p; begin var a; do begin a := a - 1; end while (a != 0); end",
        );
        // 0: INT 1
        // 1: LDA 0      <- head
        // 2: LDA 0
        // 3: LDV
        // 4: LDI 1
        // 5: SUB
        // 6: STO
        // 7: LDA 0      condition
        // 8: LDV
        // 9: LDI 0
        // 10: NEQ
        // 11: LDI 0     complement
        // 12: EQL
        // 13: BZE 1
        // 14: HLT
        assert_eq!(pcode.ops[0], Op::Int(1));
        assert_eq!(pcode.ops[13], Op::Bze(1));
        assert_eq!(pcode.ops[14], Op::Hlt);
        // The complement pair sits between the condition and the branch.
        assert_eq!(&pcode.ops[11..13], &[Op::Ldi(0), Op::Eql]);
        assert_eq!(pcode.ops[10], Op::Neq);
    }

    #[test]
    fn test_only_backward_branches() {
        let pcode = compile(
            "program p; begin var a; \
             do begin do begin a := a - 1; end while (a > 3); end while (a != 0); end",
        );
        for (index, op) in pcode.ops.iter().enumerate() {
            if let Some(target) = op.branch_target() {
                assert!(target < index, "branch at {} goes forward to {}", index, target);
            }
        }
    }

    #[test]
    fn test_translator_derives_addresses_without_analyser() {
        let pcode = compile("program p; begin var b; var a; write(a); end");
        // `b` declared first gets slot 0, `a` gets slot 1.
        assert_eq!(
            pcode.ops,
            vec![Op::Int(2), Op::Lda(1), Op::Ldv, Op::Prn, Op::Hlt]
        );
    }

    #[test]
    fn test_analyser_table_is_honored() {
        use crate::analyser::Analyser;

        let tokens = Lexer::new("program p; begin var a, b; write(b); end")
            .tokenize()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let table = Analyser::analyse(&program).unwrap();
        let pcode = Translator::with_symbols(table).translate(&program).unwrap();
        assert_eq!(
            pcode.ops,
            vec![Op::Int(2), Op::Lda(1), Op::Ldv, Op::Prn, Op::Hlt]
        );
    }

    #[test]
    fn test_unknown_variable_fails_codegen() {
        let tokens = Lexer::new("program p; begin write(c); end")
            .tokenize()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let err = Translator::new().translate(&program).unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnknownVariable {
                name: "c".to_string()
            }
        );
    }
}
