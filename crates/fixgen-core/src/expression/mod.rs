//! Fixture expression language: tokens, lexer chain, parser, expression tree
//!
//! Raw field values such as `"<firstName()> <lastName()>"`, `"@user*"` or
//! `"80%? <word()> : @user0"` are lexed into tokens and parsed into a
//! `ValueNode` tree that the resolver chain evaluates.

pub mod ast;
pub mod lexer;
pub mod parser;
mod scan;
pub mod token;

pub use ast::{NodeKind, ValueNode};
pub use lexer::{EmptyValueLexer, GlobalPatternsLexer, Lexer, LexerRegistry, SubPatternsLexer};
pub use parser::ExpressionParser;
pub use token::{Token, TokenType};
