pub mod ast;
pub mod cst;
pub mod errors;
pub mod lower;
pub mod parser;
pub mod resolve;
pub mod span;
