use crate::bytecode::chunk::{Chunk, decode_constant16};
use crate::bytecode::op::OpCode;

/// Print disassembly of a whole chunk
pub fn print_chunk(chunk: &Chunk, name: &str) {
    print!("{}", disassemble_chunk(chunk, name));
}

/// Return disassembly as a String (for testing/logging)
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("=== {} ===\n", name));

    let mut offset = 0;
    while offset < chunk.code.len() {
        let (text, next) = disassemble_instruction(chunk, offset);
        output.push_str(&text);
        output.push('\n');
        offset = next;
    }

    output
}

/// Render the instruction at `offset` and report where the next one
/// starts. The line column repeats `   | ` while consecutive
/// instructions come from the same source line. Bytes that decode to
/// no opcode, or constant loads with a short or dangling operand, are
/// rendered with a marker instead of derailing the walk.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut text = format!("{:04} ", offset);
    if offset > 0 && chunk.lines.get(offset) == chunk.lines.get(offset - 1) {
        text.push_str("   | ");
    } else {
        text.push_str(&format!("{:4} ", chunk.line_at(offset)));
    }

    let byte = match chunk.code.get(offset) {
        Some(&byte) => byte,
        None => return (text, chunk.code.len()),
    };

    match OpCode::from_byte(byte) {
        Some(OpCode::Constant) => match chunk.code.get(offset + 1) {
            Some(&index) => {
                let rendered = pool_value(chunk, index as usize);
                text.push_str(&format!(
                    "{:<16} {:4} '{}'",
                    OpCode::Constant.name(),
                    index,
                    rendered
                ));
                (text, offset + 2)
            }
            None => {
                text.push_str(&format!("{:<16} <truncated>", OpCode::Constant.name()));
                (text, chunk.code.len())
            }
        },
        Some(OpCode::Constant16) => {
            match (chunk.code.get(offset + 1), chunk.code.get(offset + 2)) {
                (Some(&lo), Some(&hi)) => {
                    let index = decode_constant16(lo, hi);
                    let rendered = pool_value(chunk, index);
                    text.push_str(&format!(
                        "{:<16} {:4} '{}'",
                        OpCode::Constant16.name(),
                        index,
                        rendered
                    ));
                    (text, offset + 3)
                }
                _ => {
                    text.push_str(&format!("{:<16} <truncated>", OpCode::Constant16.name()));
                    (text, chunk.code.len())
                }
            }
        }
        Some(op) => {
            text.push_str(op.name());
            (text, offset + 1)
        }
        None => {
            text.push_str(&format!("Unknown opcode {}", byte));
            (text, offset + 1)
        }
    }
}

fn pool_value(chunk: &Chunk, index: usize) -> String {
    match chunk.constants.get(index) {
        Some(value) => format!("{}", value),
        None => "<out of range>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::chunk::encode_constant16;
    use crate::bytecode::compile::compile;

    fn compiled(source: &str) -> Chunk {
        let mut chunk = Chunk::new();
        let report = compile(source, &mut chunk);
        assert!(!report.had_error, "unexpected errors: {:?}", report.errors);
        chunk
    }

    #[test]
    fn test_full_listing_layout() {
        let listing = disassemble_chunk(&compiled("1 + 2 * 3"), "expr");
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines[0], "=== expr ===");
        assert_eq!(lines[1], "0000    1 CONSTANT            0 '1'");
        assert_eq!(lines[2], "0002    | CONSTANT            1 '2'");
        assert_eq!(lines[3], "0004    | CONSTANT            2 '3'");
        assert_eq!(lines[4], "0006    | MULTIPLY");
        assert_eq!(lines[5], "0007    | ADD");
        assert_eq!(lines[6], "0008    | RETURN");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_line_column_restarts_on_new_source_line() {
        let listing = disassemble_chunk(&compiled("1 +\n2"), "expr");
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines[1], "0000    1 CONSTANT            0 '1'");
        assert_eq!(lines[2], "0002    2 CONSTANT            1 '2'");
        assert_eq!(lines[3], "0004    | ADD");
        assert_eq!(lines[4], "0005    | RETURN");
    }

    #[test]
    fn test_wide_constant_load_renders_index_and_value() {
        let mut chunk = Chunk::new();
        for i in 0..300 {
            chunk.add_constant(f64::from(i));
        }
        chunk.write_op(OpCode::Constant16, 7);
        let [lo, hi] = encode_constant16(260);
        chunk.write(lo, 7);
        chunk.write(hi, 7);

        let (text, next) = disassemble_instruction(&chunk, 0);
        assert_eq!(text, "0000    7 CONSTANT_16       260 '260'");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_unknown_byte_is_reported_and_skipped() {
        let mut chunk = Chunk::new();
        chunk.write(0xFF, 3);
        chunk.write_op(OpCode::Return, 3);

        let listing = disassemble_chunk(&chunk, "bad");
        assert!(listing.contains("Unknown opcode 255"));
        assert!(listing.contains("RETURN"));
    }

    #[test]
    fn test_dangling_operand_is_marked() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);

        let (text, next) = disassemble_instruction(&chunk, 0);
        assert!(text.contains("<truncated>"));
        assert_eq!(next, chunk.code.len());
    }

    #[test]
    fn test_missing_pool_entry_is_marked() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(9, 1);

        let (text, _) = disassemble_instruction(&chunk, 0);
        assert!(text.contains("<out of range>"));
    }

    #[test]
    fn test_empty_chunk_is_header_only() {
        let listing = disassemble_chunk(&Chunk::new(), "empty");
        assert_eq!(listing, "=== empty ===\n");
    }
}
