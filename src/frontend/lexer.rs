use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character punctuators
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One- or two-character operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // Sentinels
    Error,
    Eof,
}

impl TokenKind {
    /// Name used when a diagnostic has to talk about a token kind.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Semicolon => "';'",
            TokenKind::Slash => "'/'",
            TokenKind::Star => "'*'",
            TokenKind::Bang => "'!'",
            TokenKind::BangEqual => "'!='",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Identifier => "an identifier",
            TokenKind::String => "a string",
            TokenKind::Number => "a number",
            TokenKind::And => "'and'",
            TokenKind::Class => "'class'",
            TokenKind::Else => "'else'",
            TokenKind::False => "'false'",
            TokenKind::For => "'for'",
            TokenKind::Fun => "'fun'",
            TokenKind::If => "'if'",
            TokenKind::Nil => "'nil'",
            TokenKind::Or => "'or'",
            TokenKind::Print => "'print'",
            TokenKind::Return => "'return'",
            TokenKind::Super => "'super'",
            TokenKind::This => "'this'",
            TokenKind::True => "'true'",
            TokenKind::Var => "'var'",
            TokenKind::While => "'while'",
            TokenKind::Error => "an invalid token",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A single lexical token. The lexeme borrows the source buffer, so a
/// token never outlives the text it was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub line: usize,
}

/// An owned snapshot of a token, for diagnostics that must outlive the
/// source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedToken {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl From<Token<'_>> for OwnedToken {
    fn from(token: Token<'_>) -> Self {
        OwnedToken {
            kind: token.kind,
            lexeme: token.lexeme.to_string(),
            line: token.line,
        }
    }
}

impl fmt::Display for OwnedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eof {
            write!(f, "end of input")
        } else {
            write!(f, "'{}'", self.lexeme)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnterminatedString,
    UnknownCharacter(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: usize,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ScanErrorKind::UnknownCharacter(ch) => write!(f, "unknown character '{}'", ch),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for ScanError {}

/// On-demand scanner: tokens are handed out one at a time, no
/// buffering. Trivia (whitespace, `//` comments) is consumed on
/// construction and after every scan, so `is_done` turns true as soon
/// as no real token remains.
pub struct Lexer<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer {
            source,
            start: 0,
            current: 0,
            line: 1,
        };
        lexer.to_token_start();
        lexer
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Scan the next token. A scan error consumes exactly the offending
    /// input, so calling again continues from the character after it.
    /// Once the input is exhausted every call returns an `Eof` token
    /// with an empty lexeme.
    pub fn scan_token(&mut self) -> Result<Token<'src>, ScanError> {
        if self.is_done() {
            return Ok(self.make_token(TokenKind::Eof));
        }
        let result = self.scan_once();
        self.to_token_start();
        result
    }

    fn scan_once(&mut self) -> Result<Token<'src>, ScanError> {
        let ch = self.advance();
        if ch.is_ascii_digit() {
            return Ok(self.number());
        }
        if ch.is_ascii_alphabetic() || ch == b'_' {
            return Ok(self.identifier());
        }
        match ch {
            b'(' => Ok(self.make_token(TokenKind::LeftParen)),
            b')' => Ok(self.make_token(TokenKind::RightParen)),
            b'{' => Ok(self.make_token(TokenKind::LeftBrace)),
            b'}' => Ok(self.make_token(TokenKind::RightBrace)),
            b',' => Ok(self.make_token(TokenKind::Comma)),
            b'.' => Ok(self.make_token(TokenKind::Dot)),
            b'-' => Ok(self.make_token(TokenKind::Minus)),
            b'+' => Ok(self.make_token(TokenKind::Plus)),
            b';' => Ok(self.make_token(TokenKind::Semicolon)),
            b'/' => Ok(self.make_token(TokenKind::Slash)),
            b'*' => Ok(self.make_token(TokenKind::Star)),
            b'!' => {
                let kind = if self.matches(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                Ok(self.make_token(kind))
            }
            b'=' => {
                let kind = if self.matches(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                Ok(self.make_token(kind))
            }
            b'<' => {
                let kind = if self.matches(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                Ok(self.make_token(kind))
            }
            b'>' => {
                let kind = if self.matches(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                Ok(self.make_token(kind))
            }
            b'"' => self.string(),
            _ => Err(self.scan_error(ScanErrorKind::UnknownCharacter(ch as char))),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current + 1).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source.as_bytes()[self.current];
        self.current += 1;
        ch
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }
        // A dot only belongs to the number when a digit follows it:
        // "123." scans as the number 123 and a separate Dot token.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                self.advance();
            }
        }
        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'src> {
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == b'_')
        {
            self.advance();
        }
        self.make_token(self.identifier_kind())
    }

    /// Keyword lookup without a hash map: the first character selects a
    /// candidate, the remaining bytes are compared as a suffix.
    fn identifier_kind(&self) -> TokenKind {
        let lexeme = &self.source[self.start..self.current];
        match lexeme.as_bytes()[0] {
            b'a' => keyword_at(lexeme, 1, "nd", TokenKind::And),
            b'c' => keyword_at(lexeme, 1, "lass", TokenKind::Class),
            b'e' => keyword_at(lexeme, 1, "lse", TokenKind::Else),
            b'f' => match lexeme.as_bytes().get(1) {
                Some(b'a') => keyword_at(lexeme, 2, "lse", TokenKind::False),
                Some(b'o') => keyword_at(lexeme, 2, "r", TokenKind::For),
                Some(b'u') => keyword_at(lexeme, 2, "n", TokenKind::Fun),
                _ => TokenKind::Identifier,
            },
            b'i' => keyword_at(lexeme, 1, "f", TokenKind::If),
            b'n' => keyword_at(lexeme, 1, "il", TokenKind::Nil),
            b'o' => keyword_at(lexeme, 1, "r", TokenKind::Or),
            b'p' => keyword_at(lexeme, 1, "rint", TokenKind::Print),
            b'r' => keyword_at(lexeme, 1, "eturn", TokenKind::Return),
            b's' => keyword_at(lexeme, 1, "uper", TokenKind::Super),
            b't' => match lexeme.as_bytes().get(1) {
                Some(b'h') => keyword_at(lexeme, 2, "is", TokenKind::This),
                Some(b'r') => keyword_at(lexeme, 2, "ue", TokenKind::True),
                _ => TokenKind::Identifier,
            },
            b'v' => keyword_at(lexeme, 1, "ar", TokenKind::Var),
            b'w' => keyword_at(lexeme, 1, "hile", TokenKind::While),
            _ => TokenKind::Identifier,
        }
    }

    fn string(&mut self) -> Result<Token<'src>, ScanError> {
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return Ok(self.make_token(TokenKind::String));
                }
                Some(ch) => {
                    if ch == b'\n' {
                        self.line += 1;
                    }
                    self.advance();
                }
                None => return Err(self.scan_error(ScanErrorKind::UnterminatedString)),
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            lexeme: &self.source[self.start..self.current],
            line: self.line,
        }
    }

    fn scan_error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError {
            kind,
            line: self.line,
        }
    }

    fn to_token_start(&mut self) {
        self.skip_trivia();
        self.start = self.current;
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r') => {
                    self.advance();
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    // Leave the newline itself for the arm above so the
                    // line count stays right.
                    while self.peek().is_some_and(|ch| ch != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }
}

/// Compare `lexeme[from..]` against a keyword suffix.
fn keyword_at(lexeme: &str, from: usize, suffix: &str, kind: TokenKind) -> TokenKind {
    if lexeme.len() == from + suffix.len() && &lexeme[from..] == suffix {
        kind
    } else {
        TokenKind::Identifier
    }
}
