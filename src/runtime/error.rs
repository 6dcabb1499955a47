use crate::runtime::value::ValueKind;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuntimeError {
    #[error("expected {expected}")]
    StackUnderflow { expected: String },
    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: ValueKind },
    #[error("expected one of [{expected}]")]
    MissingOverloadOperand { expected: String },
    #[error("expected one of [{expected}], got {actual}")]
    NoOverload { expected: String, actual: ValueKind },
    #[error("undefined symbol {name}")]
    UnknownSymbol { name: String },
    #[error("{name} used before declaration")]
    UsedBeforeDeclaration { name: String },
    #[error("call stack overflowed!")]
    CallStackOverflow,
    #[error("cannot exit 'Begin' from outside the 'Begin' block")]
    EscapedBegin,
    #[error("{kind} assertion failed")]
    AssertionFailed { kind: ValueKind },
    /// Raised by a builtin's own logic, e.g. a math domain error.
    #[error("{0}")]
    Failed(String),
    /// Raised by the program itself through `Error`.
    #[error("{0}")]
    User(String),
    /// `cause` wrapped by every construct it escaped from, innermost first.
    /// Kept flat so a failure deep in recursion renders and drops without
    /// recursing once per level.
    #[error("{}", render_trail(.trail, .cause))]
    Context {
        trail: Vec<String>,
        cause: Box<RuntimeError>,
    },
}

fn render_trail(trail: &[String], cause: &RuntimeError) -> String {
    let mut message = String::new();
    for context in trail.iter().rev() {
        message.push_str("in ");
        message.push_str(context);
        message.push_str(": ");
    }
    message.push_str(&cause.to_string());
    message
}

impl RuntimeError {
    pub fn underflow(expected: impl Into<String>) -> Self {
        RuntimeError::StackUnderflow {
            expected: expected.into(),
        }
    }

    pub fn mismatch(expected: impl Into<String>, actual: ValueKind) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.into(),
            actual,
        }
    }

    /// Prefixes the message with the construct it escaped from.
    pub fn within(self, context: impl Into<String>) -> Self {
        match self {
            RuntimeError::Context { mut trail, cause } => {
                trail.push(context.into());
                RuntimeError::Context { trail, cause }
            }
            cause => RuntimeError::Context {
                trail: vec![context.into()],
                cause: Box::new(cause),
            },
        }
    }

    /// The innermost error, without context prefixes.
    pub fn root_cause(&self) -> &RuntimeError {
        match self {
            RuntimeError::Context { cause, .. } => cause,
            other => other,
        }
    }
}
