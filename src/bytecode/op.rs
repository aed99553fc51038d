use serde::{Deserialize, Serialize};

// =============================================================================
// OP - pcode instructions
// =============================================================================

/// One pcode instruction. Operands live inside the variants, so a decoded
/// program can never carry an unknown opcode or a missing operand; those
/// failures belong to the text decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Reserve n zero-initialized variable slots. Always emitted first,
    /// with n equal to the declared-variable count.
    Int(usize),

    /// Push a literal value.
    Ldi(i64),
    /// Push an address literal.
    Lda(usize),
    /// Pop an address, push the value stored there.
    Ldv,
    /// Pop a value, pop an address, store the value at the address.
    Sto,

    // arithmetic: pop b, pop a, push a OP b
    Add,
    Sub,
    Mul,
    Div,

    // comparison: pop b, pop a, push 1 if the comparison holds else 0
    Eql,
    Neq,
    Gtr,
    Lss,
    Geq,
    Leq,

    /// Pop a value and emit it to the output sink.
    Prn,
    /// Pop an address, block for one input integer, store it there.
    Inn,

    /// Unconditional jump to an absolute instruction index.
    Brn(usize),
    /// Pop a value; jump to the absolute index if it is zero.
    Bze(usize),

    /// Halt normally.
    Hlt,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Int(_) => "INT",
            Op::Ldi(_) => "LDI",
            Op::Lda(_) => "LDA",
            Op::Ldv => "LDV",
            Op::Sto => "STO",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Eql => "EQL",
            Op::Neq => "NEQ",
            Op::Gtr => "GTR",
            Op::Lss => "LSS",
            Op::Geq => "GEQ",
            Op::Leq => "LEQ",
            Op::Prn => "PRN",
            Op::Inn => "INN",
            Op::Brn(_) => "BRN",
            Op::Bze(_) => "BZE",
            Op::Hlt => "HLT",
        }
    }

    pub fn operand(&self) -> Option<i64> {
        match self {
            Op::Int(n) => Some(*n as i64),
            Op::Ldi(v) => Some(*v),
            Op::Lda(a) => Some(*a as i64),
            Op::Brn(t) => Some(*t as i64),
            Op::Bze(t) => Some(*t as i64),
            _ => None,
        }
    }

    /// Branch target, if this instruction is a branch.
    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Op::Brn(t) | Op::Bze(t) => Some(*t),
            _ => None,
        }
    }
}

impl std::fmt::Display for Op {
    /// The persisted text form: mnemonic, then one space-separated decimal
    /// operand when the opcode carries one.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operand() {
            Some(operand) => write!(f, "{} {}", self.mnemonic(), operand),
            None => write!(f, "{}", self.mnemonic()),
        }
    }
}
