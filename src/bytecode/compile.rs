use crate::bytecode::chunk::{Chunk, Value, encode_constant16};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::op::OpCode;
use crate::frontend::lexer::{Lexer, Token, TokenKind};

/// Everything one [`compile`] call produced besides the bytecode.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompileReport {
    pub had_error: bool,
    pub errors: Vec<CompileError>,
}

/// Binding strength, weakest to strongest. `Ord` follows declaration
/// order, which is what `parse_precedence` compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One level stronger; binaries parse their right operand here to
    /// stay left-associative.
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Prefix forms the grammar knows. A plain identifier enum dispatched
/// by `match`, so the rule table holds no function pointers.
#[derive(Debug, Clone, Copy)]
enum PrefixRule {
    Grouping,
    Unary,
    Number,
}

/// Infix forms. Arithmetic binaries are the only ones so far.
#[derive(Debug, Clone, Copy)]
enum InfixRule {
    Binary,
}

#[derive(Debug, Clone, Copy)]
struct ParseRule {
    prefix: Option<PrefixRule>,
    infix: Option<InfixRule>,
    precedence: Precedence,
}

impl ParseRule {
    const NONE: ParseRule = ParseRule {
        prefix: None,
        infix: None,
        precedence: Precedence::None,
    };

    const fn prefix(rule: PrefixRule) -> ParseRule {
        ParseRule {
            prefix: Some(rule),
            infix: None,
            precedence: Precedence::None,
        }
    }

    const fn infix(rule: InfixRule, precedence: Precedence) -> ParseRule {
        ParseRule {
            prefix: None,
            infix: Some(rule),
            precedence,
        }
    }

    const fn both(prefix: PrefixRule, infix: InfixRule, precedence: Precedence) -> ParseRule {
        ParseRule {
            prefix: Some(prefix),
            infix: Some(infix),
            precedence,
        }
    }
}

/// The fixed token-kind table driving the Pratt parser. Every kind
/// without an entry here can neither start nor continue an expression.
fn rule_for(kind: TokenKind) -> ParseRule {
    match kind {
        TokenKind::LeftParen => ParseRule::prefix(PrefixRule::Grouping),
        TokenKind::Minus => ParseRule::both(PrefixRule::Unary, InfixRule::Binary, Precedence::Term),
        TokenKind::Plus => ParseRule::infix(InfixRule::Binary, Precedence::Term),
        TokenKind::Star => ParseRule::infix(InfixRule::Binary, Precedence::Factor),
        TokenKind::Slash => ParseRule::infix(InfixRule::Binary, Precedence::Factor),
        TokenKind::Number => ParseRule::prefix(PrefixRule::Number),
        _ => ParseRule::NONE,
    }
}

/// Token window and error latches for one compilation.
struct Parser<'src> {
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
}

/// Single-pass expression compiler: drives the lexer and emits into
/// the caller's chunk while parsing. No syntax tree in between.
struct Compiler<'src, 'c> {
    lexer: Lexer<'src>,
    parser: Parser<'src>,
    chunk: &'c mut Chunk,
    errors: Vec<CompileError>,
}

/// Compile one expression into `chunk`. Always returns a report;
/// diagnostics are collected in source order, never printed or
/// panicked. On a clean report the chunk ends in a `Return`.
pub fn compile(source: &str, chunk: &mut Chunk) -> CompileReport {
    Compiler::new(source, chunk).compile()
}

impl<'src, 'c> Compiler<'src, 'c> {
    fn new(source: &'src str, chunk: &'c mut Chunk) -> Self {
        let placeholder = Token {
            kind: TokenKind::Error,
            lexeme: "",
            line: 0,
        };
        Compiler {
            lexer: Lexer::new(source),
            parser: Parser {
                previous: placeholder,
                current: placeholder,
                had_error: false,
                panic_mode: false,
            },
            chunk,
            errors: Vec::new(),
        }
    }

    fn compile(mut self) -> CompileReport {
        self.advance();
        self.expression();
        self.consume(TokenKind::Eof);
        self.emit_op(OpCode::Return);

        CompileReport {
            had_error: self.parser.had_error,
            errors: self.errors,
        }
    }

    // ----- token plumbing -----

    /// Pull the next real token into `current`. Every failed scan
    /// attempt becomes one ScanFailure diagnostic; the lexer consumes
    /// the offending input itself, so the loop always terminates.
    fn advance(&mut self) {
        self.parser.previous = self.parser.current;
        loop {
            match self.lexer.scan_token() {
                Ok(token) => {
                    self.parser.current = token;
                    break;
                }
                Err(error) => self.add_error(CompileError::scan_failure(error)),
            }
        }
    }

    fn consume(&mut self, expected: TokenKind) {
        if self.parser.current.kind == expected {
            self.advance();
        } else {
            self.add_error(CompileError::expected_token(expected, self.parser.current));
        }
    }

    /// First error wins: while the panic latch is set, further
    /// diagnostics are dropped. The latch holds until the compilation
    /// ends; there is no statement boundary to resynchronize at.
    fn add_error(&mut self, error: CompileError) {
        if self.parser.panic_mode {
            return;
        }
        self.parser.panic_mode = true;
        self.parser.had_error = true;
        self.errors.push(error);
    }

    // ----- precedence climbing -----

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, min: Precedence) {
        self.advance();
        let prefix = match rule_for(self.parser.previous.kind).prefix {
            Some(rule) => rule,
            None => {
                self.add_error(CompileError::expected_expression(self.parser.previous));
                return;
            }
        };
        self.run_prefix(prefix);

        while rule_for(self.parser.current.kind).precedence >= min {
            self.advance();
            if let Some(infix) = rule_for(self.parser.previous.kind).infix {
                self.run_infix(infix);
            }
        }
    }

    fn run_prefix(&mut self, rule: PrefixRule) {
        match rule {
            PrefixRule::Grouping => self.grouping(),
            PrefixRule::Unary => self.unary(),
            PrefixRule::Number => self.number(),
        }
    }

    fn run_infix(&mut self, rule: InfixRule) {
        match rule {
            InfixRule::Binary => self.binary(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen);
    }

    fn unary(&mut self) {
        // The operand compiles first; Negate then acts on its result.
        self.parse_precedence(Precedence::Unary);
        self.emit_op(OpCode::Negate);
    }

    fn binary(&mut self) {
        let operator = self.parser.previous.kind;
        let rule = rule_for(operator);
        self.parse_precedence(rule.precedence.next());

        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            // unreachable: only the four kinds above carry InfixRule::Binary
            _ => {}
        }
    }

    fn number(&mut self) {
        let token = self.parser.previous;
        // The scanner only hands over [0-9]+(.[0-9]+)? lexemes; parsing
        // one as f64 cannot fail.
        let value: Value = token.lexeme.parse().unwrap_or_default();
        self.emit_constant(value, token);
    }

    // ----- emission -----

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.parser.previous.line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.parser.previous.line);
    }

    /// Emit the narrowest load for a fresh pool entry: one operand byte
    /// for indices up to 255, two little-endian bytes up to 65535. A
    /// full pool raises ConstantPoolExhausted and appends nothing, so
    /// the chunk stays intact.
    fn emit_constant(&mut self, value: Value, at: Token<'src>) {
        if self.chunk.constants.len() > u16::MAX as usize {
            self.add_error(CompileError::constant_pool_exhausted(at));
            return;
        }
        let index = self.chunk.add_constant(value);
        if index <= u8::MAX as usize {
            self.emit_op(OpCode::Constant);
            self.emit_byte(index as u8);
        } else {
            self.emit_op(OpCode::Constant16);
            let [lo, hi] = encode_constant16(index);
            self.emit_byte(lo);
            self.emit_byte(hi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(source: &str) -> Chunk {
        let mut chunk = Chunk::new();
        let report = compile(source, &mut chunk);
        assert!(!report.had_error, "unexpected errors: {:?}", report.errors);
        chunk
    }

    fn errors_of(source: &str) -> Vec<CompileError> {
        let mut chunk = Chunk::new();
        compile(source, &mut chunk).errors
    }

    // ----- instruction shapes -----

    #[test]
    fn test_product_binds_tighter_than_sum() {
        let chunk = compiled("1 + 2 * 3");
        assert_eq!(
            chunk.code,
            vec![
                OpCode::Constant as u8,
                0,
                OpCode::Constant as u8,
                1,
                OpCode::Constant as u8,
                2,
                OpCode::Multiply as u8,
                OpCode::Add as u8,
                OpCode::Return as u8,
            ]
        );
        assert_eq!(chunk.constants, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_grouping_reorders_evaluation() {
        let chunk = compiled("(1 + 2) * 3");
        assert_eq!(
            chunk.code,
            vec![
                OpCode::Constant as u8,
                0,
                OpCode::Constant as u8,
                1,
                OpCode::Add as u8,
                OpCode::Constant as u8,
                2,
                OpCode::Multiply as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_unary_negate() {
        let chunk = compiled("-5");
        assert_eq!(
            chunk.code,
            vec![
                OpCode::Constant as u8,
                0,
                OpCode::Negate as u8,
                OpCode::Return as u8,
            ]
        );
        assert_eq!(chunk.constants, vec![5.0]);
    }

    #[test]
    fn test_double_negation_nests() {
        let chunk = compiled("--5");
        assert_eq!(
            chunk.code,
            vec![
                OpCode::Constant as u8,
                0,
                OpCode::Negate as u8,
                OpCode::Negate as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let chunk = compiled("1 - 2 - 3");
        assert_eq!(
            chunk.code,
            vec![
                OpCode::Constant as u8,
                0,
                OpCode::Constant as u8,
                1,
                OpCode::Subtract as u8,
                OpCode::Constant as u8,
                2,
                OpCode::Subtract as u8,
                OpCode::Return as u8,
            ]
        );
    }

    #[test]
    fn test_fractional_literal_value() {
        let chunk = compiled("3.25");
        assert_eq!(chunk.constants, vec![3.25]);
    }

    // ----- line tagging and determinism -----

    #[test]
    fn test_every_byte_is_line_tagged() {
        let chunk = compiled("1 +\n2 * 3");
        assert_eq!(chunk.code.len(), chunk.lines.len());
        assert_eq!(chunk.lines, vec![1, 1, 2, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_identical_source_compiles_identically() {
        let first = compiled("3.5 * (2 - 1)");
        let second = compiled("3.5 * (2 - 1)");
        assert_eq!(first, second);
    }

    // ----- diagnostics -----

    #[test]
    fn test_missing_operand_reports_expected_expression() {
        let errors = errors_of("1 +");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompileError::ExpectedExpression { found } if found.kind == TokenKind::Eof
        ));
    }

    #[test]
    fn test_unclosed_group_reports_expected_token() {
        let errors = errors_of("(1");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompileError::ExpectedToken {
                expected: TokenKind::RightParen,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_source_reports_expected_expression() {
        let mut chunk = Chunk::new();
        let report = compile("", &mut chunk);
        assert!(report.had_error);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            CompileError::ExpectedExpression { found } if found.kind == TokenKind::Eof && found.line == 1
        ));
    }

    #[test]
    fn test_trailing_tokens_report_expected_end() {
        let errors = errors_of("1 2");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompileError::ExpectedToken {
                expected: TokenKind::Eof,
                found,
            } if found.lexeme == "2"
        ));
    }

    #[test]
    fn test_scan_failure_is_collected() {
        let errors = errors_of("@");
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], CompileError::ScanFailure(_)));
    }

    #[test]
    fn test_keywords_cannot_start_an_expression() {
        let errors = errors_of("print");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompileError::ExpectedExpression { found } if found.lexeme == "print"
        ));
    }

    #[test]
    fn test_panic_mode_collapses_cascading_errors() {
        // Two bad constructs back to back, one diagnostic.
        let errors = errors_of("@ #");
        assert_eq!(errors.len(), 1);

        let mut chunk = Chunk::new();
        let report = compile("@ #", &mut chunk);
        assert!(report.had_error);
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;
    use crate::bytecode::chunk::decode_constant16;

    /// Decode every constant load in emission order.
    fn constant_loads(chunk: &Chunk) -> Vec<(OpCode, usize)> {
        let mut loads = Vec::new();
        let mut offset = 0;
        while offset < chunk.code.len() {
            match OpCode::from_byte(chunk.code[offset]) {
                Some(OpCode::Constant) => {
                    loads.push((OpCode::Constant, chunk.code[offset + 1] as usize));
                    offset += 2;
                }
                Some(OpCode::Constant16) => {
                    let index = decode_constant16(chunk.code[offset + 1], chunk.code[offset + 2]);
                    loads.push((OpCode::Constant16, index));
                    offset += 3;
                }
                _ => offset += 1,
            }
        }
        loads
    }

    fn sum_of_literals(count: usize) -> String {
        (0..count)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    #[test]
    fn test_narrow_encoding_switches_at_index_256() {
        let chunk = compiled_big(&sum_of_literals(257));
        let loads = constant_loads(&chunk);

        assert_eq!(loads.len(), 257);
        assert_eq!(loads[255], (OpCode::Constant, 255));
        assert_eq!(loads[256], (OpCode::Constant16, 256));
    }

    #[test]
    fn test_pool_exhaustion_reports_without_corrupting() {
        let mut chunk = Chunk::new();
        let report = compile(&sum_of_literals(65537), &mut chunk);

        assert!(report.had_error);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            CompileError::ConstantPoolExhausted { .. }
        ));

        // The overflowing literal appended nothing anywhere.
        assert_eq!(chunk.constants.len(), 65536);
        assert_eq!(chunk.code.len(), chunk.lines.len());

        let loads = constant_loads(&chunk);
        assert_eq!(loads.len(), 65536);
        assert!(loads.iter().all(|&(_, index)| index <= u16::MAX as usize));
    }

    fn compiled_big(source: &str) -> Chunk {
        let mut chunk = Chunk::new();
        let report = compile(source, &mut chunk);
        assert!(!report.had_error, "unexpected errors: {:?}", report.errors);
        chunk
    }
}
