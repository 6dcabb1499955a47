pub mod config;
pub mod diagnostics;
pub mod frontend;
pub mod interpreter;
pub mod language;
pub mod runtime;
pub mod stack;

#[cfg(test)]
mod tests;
