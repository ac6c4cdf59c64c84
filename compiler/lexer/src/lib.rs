pub use lex::*;

pub mod lex;
