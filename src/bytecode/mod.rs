pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod op;

pub use op::Op;

use serde::{Deserialize, Serialize};

/// A compiled pcode program: an ordered instruction sequence. Branch
/// operands are absolute indices into this same sequence and are fully
/// resolved before the program leaves the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pcode {
    pub ops: Vec<Op>,
}

/// A failure while decoding persisted bytecode. `line` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum PcodeError {
    UnknownOpcode { line: usize, mnemonic: String },
    MissingOperand { line: usize, mnemonic: String },
    UnexpectedOperand { line: usize, mnemonic: String },
    InvalidOperand { line: usize, text: String },
    Codec(String),
}

impl std::fmt::Display for PcodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PcodeError::UnknownOpcode { line, mnemonic } => {
                write!(f, "pcode error: line {}: unknown opcode `{}`", line, mnemonic)
            }
            PcodeError::MissingOperand { line, mnemonic } => {
                write!(
                    f,
                    "pcode error: line {}: `{}` requires an operand",
                    line, mnemonic
                )
            }
            PcodeError::UnexpectedOperand { line, mnemonic } => {
                write!(
                    f,
                    "pcode error: line {}: `{}` takes at most one operand",
                    line, mnemonic
                )
            }
            PcodeError::InvalidOperand { line, text } => {
                write!(f, "pcode error: line {}: invalid operand `{}`", line, text)
            }
            PcodeError::Codec(message) => write!(f, "pcode error: {}", message),
        }
    }
}

impl Pcode {
    /// Renders the line-oriented text form: one instruction per line, the
    /// mnemonic optionally followed by one space-separated decimal operand.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out
    }

    /// Decodes the text form. Blank lines are ignored; anything else must
    /// be a known mnemonic with exactly the operand count it requires.
    pub fn parse_text(text: &str) -> Result<Pcode, PcodeError> {
        let mut ops = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let mut fields = line.split_whitespace();

            let Some(mnemonic) = fields.next() else {
                continue;
            };

            let operand = fields.next();
            if fields.next().is_some() {
                return Err(PcodeError::UnexpectedOperand {
                    line: line_no,
                    mnemonic: mnemonic.to_string(),
                });
            }

            ops.push(decode_instruction(line_no, mnemonic, operand)?);
        }

        Ok(Pcode { ops })
    }

    /// Compact binary form of the same program.
    pub fn to_binary(&self) -> Result<Vec<u8>, PcodeError> {
        postcard::to_allocvec(self).map_err(|e| PcodeError::Codec(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Pcode, PcodeError> {
        postcard::from_bytes(bytes).map_err(|e| PcodeError::Codec(e.to_string()))
    }
}

fn decode_instruction(
    line: usize,
    mnemonic: &str,
    operand: Option<&str>,
) -> Result<Op, PcodeError> {
    // Bare opcodes first; they must not carry an operand.
    let bare = match mnemonic {
        "LDV" => Some(Op::Ldv),
        "STO" => Some(Op::Sto),
        "ADD" => Some(Op::Add),
        "SUB" => Some(Op::Sub),
        "MUL" => Some(Op::Mul),
        "DIV" => Some(Op::Div),
        "EQL" => Some(Op::Eql),
        "NEQ" => Some(Op::Neq),
        "GTR" => Some(Op::Gtr),
        "LSS" => Some(Op::Lss),
        "GEQ" => Some(Op::Geq),
        "LEQ" => Some(Op::Leq),
        "PRN" => Some(Op::Prn),
        "INN" => Some(Op::Inn),
        "HLT" => Some(Op::Hlt),
        _ => None,
    };

    if let Some(op) = bare {
        return match operand {
            None => Ok(op),
            Some(_) => Err(PcodeError::UnexpectedOperand {
                line,
                mnemonic: mnemonic.to_string(),
            }),
        };
    }

    let takes_operand = matches!(mnemonic, "INT" | "LDI" | "LDA" | "BRN" | "BZE");
    if !takes_operand {
        return Err(PcodeError::UnknownOpcode {
            line,
            mnemonic: mnemonic.to_string(),
        });
    }

    let text = operand.ok_or_else(|| PcodeError::MissingOperand {
        line,
        mnemonic: mnemonic.to_string(),
    })?;

    let value: i64 = text.parse().map_err(|_| PcodeError::InvalidOperand {
        line,
        text: text.to_string(),
    })?;

    let unsigned = |value: i64| -> Result<usize, PcodeError> {
        usize::try_from(value).map_err(|_| PcodeError::InvalidOperand {
            line,
            text: text.to_string(),
        })
    };

    match mnemonic {
        "INT" => Ok(Op::Int(unsigned(value)?)),
        "LDI" => Ok(Op::Ldi(value)),
        "LDA" => Ok(Op::Lda(unsigned(value)?)),
        "BRN" => Ok(Op::Brn(unsigned(value)?)),
        "BZE" => Ok(Op::Bze(unsigned(value)?)),
        _ => unreachable!("takes_operand covers exactly these mnemonics"),
    }
}
