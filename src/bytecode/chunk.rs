use serde::{Deserialize, Serialize};

use crate::bytecode::op::OpCode;

/// The single runtime value kind.
pub type Value = f64;

/// A compiled program: instruction bytes, a parallel source-line table,
/// and the constant pool.
///
/// `lines[i]` is the source line that produced `code[i]`; the two stay
/// the same length at all times. Constants are append-only and never
/// deduplicated, so an index names one insertion forever.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub lines: Vec<usize>,
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instruction byte tagged with its source line.
    pub fn write(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.write(op as u8, line);
    }

    /// Append a constant and return its pool index. The pool itself
    /// never rejects; the compiler checks the 16-bit index cap first.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Source line for the byte at `offset`, or 0 when the offset has
    /// no line entry (only possible for hand-built chunks).
    pub fn line_at(&self, offset: usize) -> usize {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    /// Serialize into the compact on-disk form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserialize a chunk written by [`Chunk::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Chunk, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

/// Split a pool index into the CONSTANT_16 operand bytes, low byte
/// first. Indices above 16 bits are masked, so callers bound-check.
pub fn encode_constant16(index: usize) -> [u8; 2] {
    (index as u16).to_le_bytes()
}

/// Rebuild a pool index from the CONSTANT_16 operand bytes.
pub fn decode_constant16(lo: u8, hi: u8) -> usize {
    u16::from_le_bytes([lo, hi]) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_keeps_code_and_lines_parallel() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(0, 1);
        chunk.write_op(OpCode::Return, 2);

        assert_eq!(chunk.code, vec![OpCode::Constant as u8, 0, OpCode::Return as u8]);
        assert_eq!(chunk.lines, vec![1, 1, 2]);
        assert_eq!(chunk.code.len(), chunk.lines.len());
    }

    #[test]
    fn test_add_constant_appends_without_dedup() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_constant(1.5), 0);
        assert_eq!(chunk.add_constant(2.0), 1);
        assert_eq!(chunk.add_constant(1.5), 2);
        assert_eq!(chunk.constants, vec![1.5, 2.0, 1.5]);
    }

    #[test]
    fn test_line_at_is_total() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Return, 7);
        assert_eq!(chunk.line_at(0), 7);
        assert_eq!(chunk.line_at(99), 0);
    }

    #[test]
    fn test_constant16_codec_is_little_endian() {
        assert_eq!(encode_constant16(256), [0, 1]);
        assert_eq!(encode_constant16(258), [2, 1]);
        assert_eq!(encode_constant16(65535), [255, 255]);

        let [lo, hi] = encode_constant16(300);
        assert_eq!(decode_constant16(lo, hi), 300);
        assert_eq!(decode_constant16(0xFF, 0xFF), 65535);
    }

    #[test]
    fn test_postcard_round_trip() {
        let mut chunk = Chunk::new();
        let index = chunk.add_constant(3.25);
        chunk.write_op(OpCode::Constant, 4);
        chunk.write(index as u8, 4);
        chunk.write_op(OpCode::Return, 4);

        let bytes = chunk.to_bytes().unwrap();
        let back = Chunk::from_bytes(&bytes).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Chunk::from_bytes(&[0xFF, 0xFF, 0xFF]).is_err());
    }
}
