use crate::bytecode::chunk::{Chunk, Value, decode_constant16};
use crate::bytecode::disasm::disassemble_instruction;
use crate::bytecode::op::OpCode;
use crate::runtime::runtime_error::RuntimeError;

/// Operand stacks for expression chunks stay tiny; one up-front
/// allocation covers anything realistic.
const STACK_RESERVE: usize = 256;

/// Stack machine for compiled chunks. One instance can run any number
/// of chunks in sequence; `interpret` starts from a clean slate each
/// time.
pub struct Vm {
    stack: Vec<Value>,
    ip: usize,
    trace: bool,
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            stack: Vec::with_capacity(STACK_RESERVE),
            ip: 0,
            trace: false,
        }
    }

    /// Echo the stack and each instruction to stderr before executing it.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Execute `chunk` from its first byte and return the value its
    /// return instruction pops. The stack and cursor are reset first,
    /// so leftovers from an earlier run (including a faulted one)
    /// never leak in.
    pub fn interpret(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.stack.clear();
        self.ip = 0;
        self.run(chunk)
    }

    fn run(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        while self.ip < chunk.code.len() {
            if self.trace {
                self.trace_step(chunk);
            }

            let at = self.ip;
            let line = chunk.line_at(at);
            let byte = chunk.code[at];
            self.ip += 1;

            let op = match OpCode::from_byte(byte) {
                Some(op) => op,
                None => return Err(RuntimeError::unknown_opcode(byte, at, line)),
            };

            match op {
                OpCode::Return => return self.pop(at, line),
                OpCode::Constant => {
                    let index = self.read_operand(chunk, at, line)? as usize;
                    let value = constant(chunk, index, at, line)?;
                    self.stack.push(value);
                }
                OpCode::Constant16 => {
                    let lo = self.read_operand(chunk, at, line)?;
                    let hi = self.read_operand(chunk, at, line)?;
                    let index = decode_constant16(lo, hi);
                    let value = constant(chunk, index, at, line)?;
                    self.stack.push(value);
                }
                OpCode::Negate => {
                    let top = self.top_mut(at, line)?;
                    *top = -*top;
                }
                OpCode::Add => self.binary(at, line, |a, b| a + b)?,
                OpCode::Subtract => self.binary(at, line, |a, b| a - b)?,
                OpCode::Multiply => self.binary(at, line, |a, b| a * b)?,
                OpCode::Divide => self.binary(at, line, |a, b| a / b)?,
            }
        }

        Err(RuntimeError::missing_return(chunk.code.len()))
    }

    /// Pop the right operand and fold it into the new top in place.
    fn binary(
        &mut self,
        at: usize,
        line: usize,
        f: impl Fn(Value, Value) -> Value,
    ) -> Result<(), RuntimeError> {
        let right = self.pop(at, line)?;
        let left = self.top_mut(at, line)?;
        *left = f(*left, right);
        Ok(())
    }

    fn pop(&mut self, at: usize, line: usize) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::stack_underflow(at, line))
    }

    fn top_mut(&mut self, at: usize, line: usize) -> Result<&mut Value, RuntimeError> {
        self.stack
            .last_mut()
            .ok_or(RuntimeError::stack_underflow(at, line))
    }

    fn read_operand(&mut self, chunk: &Chunk, at: usize, line: usize) -> Result<u8, RuntimeError> {
        let byte = chunk
            .code
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::truncated_operand(at, line))?;
        self.ip += 1;
        Ok(byte)
    }

    fn trace_step(&self, chunk: &Chunk) {
        let mut depiction = String::from("          ");
        for value in &self.stack {
            depiction.push_str(&format!("[ {} ]", value));
        }
        eprintln!("{}", depiction);

        let (text, _) = disassemble_instruction(chunk, self.ip);
        eprintln!("{}", text);
    }
}

fn constant(chunk: &Chunk, index: usize, at: usize, line: usize) -> Result<Value, RuntimeError> {
    chunk
        .constants
        .get(index)
        .copied()
        .ok_or(RuntimeError::constant_out_of_range(index, at, line))
}
