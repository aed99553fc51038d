/// A fatal execution failure. `pc` is the index of the offending
/// instruction, not the already-incremented program counter.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A pop was attempted on an empty stack.
    StackUnderflow { pc: usize, opcode: &'static str },
    /// A load or store addressed a cell outside the current stack.
    InvalidAddress { pc: usize, address: i64 },
    /// Division by zero. Policy: fatal, never a sentinel value.
    DivisionByZero { pc: usize },
    /// The program counter ran past the end without reaching HLT.
    TruncatedProgram { pc: usize },
    /// The input collaborator could not supply an integer.
    Input { pc: usize, message: String },
    /// Step limit from the VM configuration was exceeded.
    StepLimit { limit: usize },
    /// Stack size limit from the VM configuration was exceeded.
    StackLimit { limit: usize },
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::StackUnderflow { pc, opcode } => {
                write!(f, "runtime error: stack underflow in `{}` at {}", opcode, pc)
            }
            RuntimeError::InvalidAddress { pc, address } => {
                write!(f, "runtime error: invalid address {} at {}", address, pc)
            }
            RuntimeError::DivisionByZero { pc } => {
                write!(f, "runtime error: division by zero at {}", pc)
            }
            RuntimeError::TruncatedProgram { pc } => {
                write!(
                    f,
                    "runtime error: program counter ran past the end at {} (missing HLT?)",
                    pc
                )
            }
            RuntimeError::Input { pc, message } => {
                write!(f, "runtime error: input failed at {}: {}", pc, message)
            }
            RuntimeError::StepLimit { limit } => {
                write!(f, "runtime error: execution step limit exceeded ({})", limit)
            }
            RuntimeError::StackLimit { limit } => {
                write!(f, "runtime error: stack size limit exceeded ({})", limit)
            }
        }
    }
}
