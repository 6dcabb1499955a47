use std::env;
use tracing::warn;

pub const DEFAULT_CALL_STACK_LIMIT: usize = 3000;
pub const CALL_STACK_LIMIT_VAR: &str = "COGNATE_CALL_STACK_LIMIT";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested block invocations allowed before the run fails with
    /// "call stack overflowed!".
    pub call_stack_limit: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            call_stack_limit: DEFAULT_CALL_STACK_LIMIT,
        }
    }
}

impl InterpreterConfig {
    /// Defaults, overridden by `COGNATE_CALL_STACK_LIMIT` when it holds a
    /// positive integer.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(CALL_STACK_LIMIT_VAR) {
            match parse_limit(&raw) {
                Some(limit) => config.call_stack_limit = limit,
                None => warn!(value = %raw, "ignoring invalid {CALL_STACK_LIMIT_VAR}"),
            }
        }
        config
    }

    pub fn with_call_stack_limit(mut self, limit: usize) -> Self {
        self.call_stack_limit = limit;
        self
    }
}

fn parse_limit(raw: &str) -> Option<usize> {
    raw.trim().parse().ok().filter(|limit| *limit > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_must_be_positive_integers() {
        assert_eq!(parse_limit(" 500 "), Some(500));
        assert_eq!(parse_limit("0"), None);
        assert_eq!(parse_limit("lots"), None);
    }
}
