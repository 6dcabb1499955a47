pub mod builtins;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod keyword;
pub mod signal;
pub mod table;
pub mod value;

pub use interpreter::{Evaluation, Interpreter};
