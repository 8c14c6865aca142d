pub mod lexer;
pub mod token_dumper;
