use crate::bytecode::{Op, Pcode};
use crate::runtime_error::RuntimeError;
use std::io::{self, BufRead, Write};

/// Supplies one integer per `INN`, synchronously. This is the VM's only
/// suspension point: the single thread blocks here until a value arrives.
pub trait InputSource {
    fn next_int(&mut self) -> Result<i64, String>;
}

/// Receives one integer per `PRN`, in execution order.
pub trait OutputSink {
    fn emit(&mut self, value: i64);
}

/// Interactive stdin input: prompts and re-prompts until a line parses as
/// an integer. End of input is an error, not a hang.
pub struct StdinSource;

impl InputSource for StdinSource {
    fn next_int(&mut self) -> Result<i64, String> {
        let stdin = io::stdin();
        loop {
            print!("Enter a number: ");
            io::stdout().flush().map_err(|e| e.to_string())?;

            let mut line = String::new();
            let read = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| e.to_string())?;
            if read == 0 {
                return Err("end of input".to_string());
            }

            if let Ok(value) = line.trim().parse::<i64>() {
                return Ok(value);
            }
        }
    }
}

/// One integer per line on stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, value: i64) {
        println!("{}", value);
    }
}

// Vec-backed collaborators, used by tests and batch drivers.

impl InputSource for std::vec::IntoIter<i64> {
    fn next_int(&mut self) -> Result<i64, String> {
        self.next().ok_or_else(|| "input exhausted".to_string())
    }
}

impl OutputSink for Vec<i64> {
    fn emit(&mut self, value: i64) {
        self.push(value);
    }
}

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Echo each instruction and a stack snapshot while executing.
    pub trace: bool,
    pub max_steps: Option<usize>,
    pub max_stack_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            trace: false,
            max_steps: None,
            max_stack_size: 10_000,
        }
    }
}

/// Stack machine over pcode.
///
/// The stack doubles as the flat memory map: the `INT n` prologue reserves
/// cells 0..n-1 as zero-initialized variable slots, and everything pushed
/// afterwards follows stack discipline above them.
pub struct Vm {
    stack: Vec<i64>,
    pc: usize,
    steps: usize,
    config: VmConfig,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Vm {
            stack: Vec::new(),
            pc: 0,
            steps: 0,
            config,
        }
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    /// Fetch–decode–execute until `HLT`, an error, or the counter running
    /// past the end (a fatal truncated-program error, never a silent stop).
    pub fn run(
        &mut self,
        pcode: &Pcode,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> Result<(), RuntimeError> {
        self.stack.clear();
        self.pc = 0;
        self.steps = 0;

        loop {
            let at = self.pc;
            let Some(op) = pcode.ops.get(at).copied() else {
                return Err(RuntimeError::TruncatedProgram { pc: at });
            };
            self.pc += 1;
            self.check_limits()?;

            if self.config.trace {
                println!("{:04} {}", at, op);
            }

            match op {
                Op::Int(n) => {
                    let reserved = self.stack.len() + n;
                    self.stack.resize(reserved, 0);
                }

                Op::Ldi(value) => self.stack.push(value),
                Op::Lda(address) => self.stack.push(address as i64),

                Op::Ldv => {
                    let address = self.pop_address(at, "LDV")?;
                    let value = self.load(at, address)?;
                    self.stack.push(value);
                }

                Op::Sto => {
                    let value = self.pop(at, "STO")?;
                    let address = self.pop_address(at, "STO")?;
                    self.store(at, address, value)?;
                }

                Op::Add => self.binary(at, "ADD", |a, b| a.wrapping_add(b))?,
                Op::Sub => self.binary(at, "SUB", |a, b| a.wrapping_sub(b))?,
                Op::Mul => self.binary(at, "MUL", |a, b| a.wrapping_mul(b))?,
                Op::Div => {
                    let b = self.pop(at, "DIV")?;
                    let a = self.pop(at, "DIV")?;
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero { pc: at });
                    }
                    self.stack.push(a.wrapping_div(b));
                }

                Op::Eql => self.binary(at, "EQL", |a, b| (a == b) as i64)?,
                Op::Neq => self.binary(at, "NEQ", |a, b| (a != b) as i64)?,
                Op::Gtr => self.binary(at, "GTR", |a, b| (a > b) as i64)?,
                Op::Lss => self.binary(at, "LSS", |a, b| (a < b) as i64)?,
                Op::Geq => self.binary(at, "GEQ", |a, b| (a >= b) as i64)?,
                Op::Leq => self.binary(at, "LEQ", |a, b| (a <= b) as i64)?,

                Op::Prn => {
                    let value = self.pop(at, "PRN")?;
                    output.emit(value);
                }

                Op::Inn => {
                    let address = self.pop_address(at, "INN")?;
                    let value = input
                        .next_int()
                        .map_err(|message| RuntimeError::Input { pc: at, message })?;
                    self.store(at, address, value)?;
                }

                Op::Brn(target) => self.pc = target,
                Op::Bze(target) => {
                    let value = self.pop(at, "BZE")?;
                    if value == 0 {
                        self.pc = target;
                    }
                }

                Op::Hlt => return Ok(()),
            }

            if self.config.trace {
                println!("     stack: {:?}", self.stack);
            }
        }
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::StepLimit { limit: max });
            }
        }

        if self.stack.len() > self.config.max_stack_size {
            return Err(RuntimeError::StackLimit {
                limit: self.config.max_stack_size,
            });
        }

        Ok(())
    }

    fn pop(&mut self, at: usize, opcode: &'static str) -> Result<i64, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { pc: at, opcode })
    }

    fn pop_address(&mut self, at: usize, opcode: &'static str) -> Result<usize, RuntimeError> {
        let raw = self.pop(at, opcode)?;
        usize::try_from(raw).map_err(|_| RuntimeError::InvalidAddress {
            pc: at,
            address: raw,
        })
    }

    fn load(&self, at: usize, address: usize) -> Result<i64, RuntimeError> {
        self.stack
            .get(address)
            .copied()
            .ok_or(RuntimeError::InvalidAddress {
                pc: at,
                address: address as i64,
            })
    }

    fn store(&mut self, at: usize, address: usize, value: i64) -> Result<(), RuntimeError> {
        // Never grows memory: a store outside the live stack is fatal.
        match self.stack.get_mut(address) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(RuntimeError::InvalidAddress {
                pc: at,
                address: address as i64,
            }),
        }
    }

    fn binary(
        &mut self,
        at: usize,
        opcode: &'static str,
        apply: fn(i64, i64) -> i64,
    ) -> Result<(), RuntimeError> {
        let b = self.pop(at, opcode)?;
        let a = self.pop(at, opcode)?;
        self.stack.push(apply(a, b));
        Ok(())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
