#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// An arithmetic instruction needed more operands than the stack held
    StackUnderflow { offset: usize, line: usize },
    /// A byte in instruction position that decodes to no opcode
    UnknownOpcode {
        opcode: u8,
        offset: usize,
        line: usize,
    },
    /// A constant load whose operand bytes run past the end of the code
    TruncatedOperand { offset: usize, line: usize },
    /// A constant load whose index points past the end of the pool
    ConstantOutOfRange {
        index: usize,
        offset: usize,
        line: usize,
    },
    /// Execution fell off the end of the chunk without hitting a return
    MissingReturn { offset: usize },
}

impl RuntimeError {
    pub fn stack_underflow(offset: usize, line: usize) -> Self {
        RuntimeError::StackUnderflow { offset, line }
    }

    pub fn unknown_opcode(opcode: u8, offset: usize, line: usize) -> Self {
        RuntimeError::UnknownOpcode {
            opcode,
            offset,
            line,
        }
    }

    pub fn truncated_operand(offset: usize, line: usize) -> Self {
        RuntimeError::TruncatedOperand { offset, line }
    }

    pub fn constant_out_of_range(index: usize, offset: usize, line: usize) -> Self {
        RuntimeError::ConstantOutOfRange {
            index,
            offset,
            line,
        }
    }

    pub fn missing_return(offset: usize) -> Self {
        RuntimeError::MissingReturn { offset }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: ")?;
        match self {
            RuntimeError::StackUnderflow { offset, line } => {
                write!(f, "stack underflow at offset {:04} (line {})", offset, line)
            }
            RuntimeError::UnknownOpcode {
                opcode,
                offset,
                line,
            } => {
                write!(
                    f,
                    "unknown opcode {} at offset {:04} (line {})",
                    opcode, offset, line
                )
            }
            RuntimeError::TruncatedOperand { offset, line } => {
                write!(
                    f,
                    "truncated operand at offset {:04} (line {})",
                    offset, line
                )
            }
            RuntimeError::ConstantOutOfRange {
                index,
                offset,
                line,
            } => {
                write!(
                    f,
                    "constant index {} out of range at offset {:04} (line {})",
                    index, offset, line
                )
            }
            RuntimeError::MissingReturn { offset } => {
                write!(f, "no return before offset {:04}", offset)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
