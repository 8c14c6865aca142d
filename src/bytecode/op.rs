// =============================================================================
// OPCODE - Bytecode instructions
// =============================================================================

/// One byte of the instruction stream. Discriminants are pinned: they
/// are the wire format, both in memory and in serialized chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Pop the final value and end the program.
    Return = 0,

    /// Push a pool constant. One operand byte: pool index 0-255.
    Constant = 1,

    /// Push a pool constant. Two operand bytes, little-endian, for pool
    /// indices 256-65535.
    Constant16 = 2,

    // arithmetic
    Negate = 3,
    Add = 4,
    Subtract = 5,
    Multiply = 6,
    Divide = 7,
}

impl OpCode {
    /// Decode a raw instruction byte. Bytes outside the opcode set stay
    /// undecoded (`None`).
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        match byte {
            0 => Some(OpCode::Return),
            1 => Some(OpCode::Constant),
            2 => Some(OpCode::Constant16),
            3 => Some(OpCode::Negate),
            4 => Some(OpCode::Add),
            5 => Some(OpCode::Subtract),
            6 => Some(OpCode::Multiply),
            7 => Some(OpCode::Divide),
            _ => None,
        }
    }

    /// Mnemonic used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Return => "RETURN",
            OpCode::Constant => "CONSTANT",
            OpCode::Constant16 => "CONSTANT_16",
            OpCode::Negate => "NEGATE",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Divide => "DIVIDE",
        }
    }
}
