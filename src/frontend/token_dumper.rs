use crate::frontend::lexer::{Lexer, ScanError, Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const MAG: &'static str = "\x1b[35m";
    const CYN: &'static str = "\x1b[36m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Scan the whole source, one row per token and per scan error.
    /// Returns true when any scan error turned up.
    pub fn dump(&self, source: &str) -> bool {
        let mut lexer = Lexer::new(source);
        let mut had_error = false;

        while !lexer.is_done() {
            match lexer.scan_token() {
                Ok(token) => self.print_token(&token),
                Err(err) => {
                    had_error = true;
                    self.print_error(&err);
                }
            }
        }
        had_error
    }

    fn print_token(&self, token: &Token<'_>) {
        let colr = if self.color {
            Self::color_for(token.kind)
        } else {
            ""
        };
        let reset = if self.color { Self::RESET } else { "" };

        println!(
            "[{:03}] {}{:<8} {}{}",
            token.line,
            colr,
            Self::tag(token.kind),
            token.lexeme,
            reset
        );
    }

    fn print_error(&self, err: &ScanError) {
        let colr = if self.color { Self::RED } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        println!(
            "[{:03}] {}{:<8} {}{}",
            err.line, colr, "ERROR", err.kind, reset
        );
    }

    fn tag(kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Number => "NUMBER",
            String => "STRING",
            Identifier => "IDENT",

            LeftParen | RightParen | LeftBrace | RightBrace | Comma | Dot | Semicolon => "PUNCT",

            Minus | Plus | Slash | Star | Bang | BangEqual | Equal | EqualEqual | Greater
            | GreaterEqual | Less | LessEqual => "OP",

            Error => "ERROR",
            Eof => "EOF",

            // everything else is a reserved word
            _ => "KEYWORD",
        }
    }

    fn color_for(kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Number => Self::CYN,
            String => Self::GRN,
            Identifier => Self::YEL,
            Minus | Plus | Slash | Star | Bang | BangEqual | Equal | EqualEqual | Greater
            | GreaterEqual | Less | LessEqual => Self::MAG,
            Error | Eof => Self::DIM,
            _ => Self::RESET,
        }
    }
}
