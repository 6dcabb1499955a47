use crate::config::InterpreterConfig;
use crate::frontend::{Diagnostic, Frontend, Severity};
use crate::language::ast::{BlockSpec, Ident, Item};
use crate::runtime::{
    builtins::{self, Builtin},
    environment::{Binding, Env, Environments, Matcher},
    error::{RuntimeError, RuntimeResult},
    keyword::Keyword,
    signal::{Signal, SignalToken, TokenSource},
    table::Table,
    value::{render, BoxValue, Closure, Text, Value, ValueKind},
};
use crate::stack::ensure_sufficient_stack;
use regex::Regex;
use std::rc::Rc;
use tracing::trace;

const EXIT_BEGIN: &str = "#exit-begin";
const APPLY_REGEX: &str = "#apply-regex";

/// Why a block stopped before reaching its end.
enum Unwind {
    Error(RuntimeError),
    Signal(Signal),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

type Flow<T> = Result<T, Unwind>;

/// Outcome of [`Interpreter::evaluate`].
#[derive(Debug)]
pub struct Evaluation {
    pub stack: Vec<Value>,
    pub error: Option<RuntimeError>,
    /// The frame the block ran in; `None` when it did not finish.
    pub env: Option<Env>,
    /// `Stop` was called. Not an error.
    pub stopped: bool,
}

/// The stack machine. Owns the environment arena and the frontend that output
/// and runtime diagnostics are reported to.
pub struct Interpreter {
    config: InterpreterConfig,
    frontend: Frontend,
    envs: Environments,
    tokens: TokenSource,
    depth: usize,
    escape_body: Rc<BlockSpec>,
    regex_body: Rc<BlockSpec>,
}

/// A one-item block calling `name`, used for blocks the engine makes itself.
fn synthetic_body(name: &str) -> Rc<BlockSpec> {
    Rc::new(BlockSpec {
        body: vec![Item::Identifier(Ident {
            name: Rc::from(name),
            span: Default::default(),
            position: Default::default(),
        })],
        ..Default::default()
    })
}

impl Interpreter {
    pub fn new(config: InterpreterConfig, frontend: Frontend) -> Self {
        Self {
            config,
            frontend,
            envs: Environments::new(),
            tokens: TokenSource::default(),
            depth: 0,
            escape_body: synthetic_body(EXIT_BEGIN),
            regex_body: synthetic_body(APPLY_REGEX),
        }
    }

    pub fn frontend(&self) -> &Frontend {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut Frontend {
        &mut self.frontend
    }

    /// Environment frames still referenced by a closure or a running block.
    pub fn live_frames(&self) -> usize {
        self.envs.live()
    }

    /// Keeps every frame made so far, e.g. the prelude's, across
    /// [`Interpreter::release_frames`].
    pub fn keep_frames(&mut self) {
        self.envs.keep();
    }

    /// Frees what the last run left behind, including frames that only
    /// reference themselves.
    pub fn release_frames(&mut self) {
        self.envs.release();
    }

    /// Runs `closure` on `stack`. `active` lists the `Begin` escapes the caller
    /// is inside of; signals for them pass through untouched.
    pub fn evaluate(
        &mut self,
        closure: &Closure,
        mut stack: Vec<Value>,
        active: &[SignalToken],
    ) -> Evaluation {
        self.depth = 0;
        let outcome = self.process(closure, &mut stack, active);
        let (error, env, stopped) = match outcome {
            Ok(env) => (None, Some(env), false),
            Err(Unwind::Signal(Signal::Stop)) => (None, None, true),
            Err(Unwind::Signal(Signal::Begin(_))) => (Some(RuntimeError::EscapedBegin), None, false),
            Err(Unwind::Error(error)) => (Some(error), None, false),
        };
        Evaluation {
            stack,
            error,
            env,
            stopped,
        }
    }

    fn process(
        &mut self,
        closure: &Closure,
        stack: &mut Vec<Value>,
        active: &[SignalToken],
    ) -> Flow<Env> {
        self.depth += 1;
        let result = if self.depth >= self.config.call_stack_limit {
            Err(RuntimeError::CallStackOverflow.into())
        } else {
            ensure_sufficient_stack(|| self.run_body(closure, stack, active))
        };
        self.depth -= 1;
        result
    }

    fn run_body(
        &mut self,
        closure: &Closure,
        stack: &mut Vec<Value>,
        active: &[SignalToken],
    ) -> Flow<Env> {
        let spec = &closure.spec;
        let env = self.envs.materialize(spec, closure.env.clone());
        for (idx, item) in spec.body.iter().enumerate() {
            match item {
                Item::Literal(value) => stack.push(value.clone()),
                Item::Block(block) => {
                    stack.push(Value::Block(Closure::new(block.clone(), Some(env.clone()))));
                }
                Item::Identifier(ident) => {
                    if names_next(&spec.body, idx) {
                        stack.push(Value::Identifier(ident.name.clone()));
                        continue;
                    }
                    self.identifier(ident, spec.user_code, &env, stack, active)?;
                }
            }
        }
        Ok(env)
    }

    fn identifier(
        &mut self,
        ident: &Ident,
        user_code: bool,
        env: &Env,
        stack: &mut Vec<Value>,
        active: &[SignalToken],
    ) -> Flow<()> {
        let name = &ident.name;
        let bound = match env.lookup(name) {
            Some(Binding::Predeclared(_)) => {
                if user_code {
                    self.frontend.diagnostics.add(Diagnostic {
                        span: ident.span,
                        position: ident.position,
                        severity: Severity::Error,
                        message: "variable used before declaration".into(),
                    });
                }
                return Err(RuntimeError::UsedBeforeDeclaration {
                    name: self.frontend.marked(name),
                }
                .into());
            }
            Some(Binding::Function(function)) => return self.call(name, &function, stack, active),
            Some(Binding::Escape(token)) => return Err(Unwind::Signal(Signal::Begin(token))),
            Some(Binding::Matcher(matcher)) => {
                let context = if matcher.captures {
                    "matching regex"
                } else {
                    "applying regex"
                };
                return apply_matcher(&matcher, stack).map_err(|error| error.within(context).into());
            }
            Some(Binding::Value(value)) => Some(value),
            None => None,
        };

        if let Some(keyword) = Keyword::from_name(name) {
            return self.keyword(keyword, env, stack, active);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return self.dispatch(name, builtin, stack).map_err(Unwind::from);
        }
        match bound {
            Some(value) => {
                stack.push(value);
                Ok(())
            }
            None => Err(RuntimeError::UnknownSymbol {
                name: self.frontend.marked(name),
            }
            .into()),
        }
    }

    /// Runs a nested block on `stack`, naming it in any error that escapes.
    fn call(
        &mut self,
        name: &str,
        closure: &Closure,
        stack: &mut Vec<Value>,
        active: &[SignalToken],
    ) -> Flow<()> {
        match self.process(closure, stack, active) {
            Ok(_) => Ok(()),
            Err(unwind) => Err(self.escaping(name, unwind, active)),
        }
    }

    /// Stop and the caller's own `Begin` signals keep unwinding; a `Begin` signal
    /// nobody above is waiting for becomes an error.
    fn escaping(&self, context: &str, unwind: Unwind, active: &[SignalToken]) -> Unwind {
        let context = self.frontend.marked(context);
        match unwind {
            Unwind::Signal(Signal::Begin(token)) if !active.contains(&token) => {
                Unwind::Error(RuntimeError::EscapedBegin.within(context))
            }
            Unwind::Signal(signal) => Unwind::Signal(signal),
            Unwind::Error(error) => Unwind::Error(error.within(context)),
        }
    }

    fn dispatch(
        &mut self,
        name: &str,
        builtin: &Builtin,
        stack: &mut Vec<Value>,
    ) -> RuntimeResult<()> {
        trace!(builtin = name, depth = self.depth, "dispatch");
        let (signature, mut args) = match builtin {
            Builtin::Single(signature) => (signature, Vec::with_capacity(signature.params.len())),
            Builtin::Overloaded(overloads) => {
                let expected = builtin.first_param_names().join(", ");
                let Some(first) = stack.pop() else {
                    return Err(RuntimeError::MissingOverloadOperand { expected });
                };
                let chosen = overloads.iter().find(|signature| {
                    signature
                        .params
                        .first()
                        .is_some_and(|param| param.ty.accepts(&first))
                });
                match chosen {
                    Some(signature) => (signature, vec![first]),
                    None => {
                        return Err(RuntimeError::NoOverload {
                            expected,
                            actual: first.kind(),
                        })
                    }
                }
            }
        };
        for param in &signature.params[args.len()..] {
            let value = stack
                .pop()
                .ok_or_else(|| RuntimeError::underflow(param.name))?;
            if !param.ty.accepts(&value) {
                return Err(RuntimeError::mismatch(param.ty.name(), value.kind()));
            }
            args.push(value);
        }
        let result = (signature.func)(&args)
            .map_err(|message| RuntimeError::Failed(message).within(self.frontend.marked(name)))?;
        if signature.returns.is_some() {
            stack.push(result);
        }
        Ok(())
    }

    fn keyword(
        &mut self,
        keyword: Keyword,
        env: &Env,
        stack: &mut Vec<Value>,
        active: &[SignalToken],
    ) -> Flow<()> {
        let context = keyword.to_string();
        let result = match keyword {
            Keyword::Begin => return self.begin(stack, active),
            Keyword::List => return self.collect_list(stack, active),
            Keyword::Table => return self.collect_table(stack, active),
            Keyword::Stop => return Err(Unwind::Signal(Signal::Stop)),
            Keyword::Error => match pop_kind(stack, "error message", ValueKind::String) {
                Ok(Value::String(message)) => {
                    return Err(RuntimeError::User(message.to_string_lossy()).into())
                }
                Ok(other) => Err(RuntimeError::mismatch("string", other.kind())),
                Err(error) => Err(error),
            },
            other => self.simple_keyword(other, env, stack),
        };
        result.map_err(|error| error.within(self.frontend.marked(&context)).into())
    }

    /// Keywords that never run a block.
    fn simple_keyword(
        &mut self,
        keyword: Keyword,
        env: &Env,
        stack: &mut Vec<Value>,
    ) -> RuntimeResult<()> {
        match keyword {
            Keyword::Def => {
                let name = pop_name(stack)?;
                let body = match pop_kind(stack, "function body", ValueKind::Block)? {
                    Value::Block(body) => body,
                    other => return Err(RuntimeError::mismatch("block", other.kind())),
                };
                env.bind(name, Binding::Function(body));
            }
            Keyword::Let => {
                let name = pop_name(stack)?;
                let value = pop(stack, "value to set")?;
                env.bind(name, Binding::Value(value));
            }
            Keyword::Set => {
                let target = match pop(stack, "box")? {
                    Value::Identifier(name) => self.resolve_box(env, &name)?,
                    Value::Boxed(cell) => cell,
                    other => return Err(RuntimeError::mismatch("box", other.kind())),
                };
                let value = pop(stack, "value to set")?;
                target.replace(value);
            }
            Keyword::Box => {
                let value = pop(stack, "value")?;
                stack.push(Value::Boxed(BoxValue::new(value)));
            }
            Keyword::Unbox => match pop_kind(stack, "box", ValueKind::Box)? {
                Value::Boxed(cell) => stack.push(cell.get()),
                other => return Err(RuntimeError::mismatch("box", other.kind())),
            },
            Keyword::Stack => stack.push(Value::list(stack.clone())),
            Keyword::Clear => stack.clear(),
            Keyword::Show => {
                let rendered = render(&pop(stack, "value")?);
                stack.push(Value::String(Text::new(&rendered.text).styled(rendered.style)));
            }
            Keyword::Print | Keyword::Put => {
                let rendered = render(&pop(stack, "value")?);
                self.frontend.output.add(rendered);
                if keyword == Keyword::Print {
                    self.frontend.output.newline();
                }
            }
            Keyword::Regex | Keyword::RegexMatch => {
                let pattern = match pop_kind(stack, "regex string", ValueKind::String)? {
                    Value::String(pattern) => pattern.to_string_lossy(),
                    other => return Err(RuntimeError::mismatch("string", other.kind())),
                };
                if pattern.is_empty() {
                    return Err(RuntimeError::Failed("empty regex is invalid".into()));
                }
                let regex = Regex::new(&pattern)
                    .map_err(|error| RuntimeError::Failed(format!("regex compile error: {error}")))?;
                let matcher = Matcher {
                    regex,
                    captures: keyword == Keyword::RegexMatch,
                };
                let frame = self
                    .envs
                    .frame(None, [(Rc::from(APPLY_REGEX), Binding::Matcher(matcher))]);
                stack.push(Value::Block(Closure::new(self.regex_body.clone(), Some(frame))));
            }
            Keyword::Is(kind) => {
                let value = pop(stack, "value")?;
                stack.push(Value::Boolean(value.kind() == kind));
            }
            Keyword::Assert(kind) => match stack.last() {
                None => return Err(RuntimeError::underflow("value")),
                Some(value) if value.kind() != kind => {
                    return Err(RuntimeError::AssertionFailed { kind })
                }
                Some(_) => {}
            },
            Keyword::Begin | Keyword::List | Keyword::Table | Keyword::Stop | Keyword::Error => {
                return Err(RuntimeError::Failed(format!("{keyword} cannot run here")));
            }
        }
        Ok(())
    }

    fn resolve_box(&self, env: &Env, name: &str) -> RuntimeResult<BoxValue> {
        match env.lookup(name) {
            Some(Binding::Value(Value::Boxed(cell))) => Ok(cell),
            Some(Binding::Value(other)) => Err(RuntimeError::mismatch("box", other.kind())),
            Some(Binding::Predeclared(_)) => Err(RuntimeError::UsedBeforeDeclaration {
                name: self.frontend.marked(name),
            }),
            Some(_) => Err(RuntimeError::mismatch("box", ValueKind::Block)),
            None => Err(RuntimeError::UnknownSymbol {
                name: self.frontend.marked(name),
            }),
        }
    }

    fn pop_block(&self, stack: &mut Vec<Value>, context: &str) -> Flow<Closure> {
        match pop_kind(stack, "block", ValueKind::Block) {
            Ok(Value::Block(block)) => Ok(block),
            Ok(other) => Err(RuntimeError::mismatch("block", other.kind())
                .within(self.frontend.marked(context))
                .into()),
            Err(error) => Err(error.within(self.frontend.marked(context)).into()),
        }
    }

    fn collect_list(&mut self, stack: &mut Vec<Value>, active: &[SignalToken]) -> Flow<()> {
        let block = self.pop_block(stack, "List")?;
        let mut items = Vec::new();
        self.call("List", &block, &mut items, active)?;
        stack.push(Value::list(items));
        Ok(())
    }

    fn collect_table(&mut self, stack: &mut Vec<Value>, active: &[SignalToken]) -> Flow<()> {
        let block = self.pop_block(stack, "Table")?;
        let mut pairs = Vec::new();
        self.call("Table", &block, &mut pairs, active)?;
        let context = self.frontend.marked("Table");
        if pairs.len() % 2 != 0 {
            return Err(RuntimeError::Failed(
                "Table initializer must be key-value pairs".into(),
            )
            .within(context)
            .into());
        }
        let mut table = Table::new();
        for pair in pairs.chunks(2) {
            let key = builtins::table_key(&pair[1])
                .map_err(|message| RuntimeError::Failed(message).within(context.clone()))?;
            table = table.insert(key, pair[0].clone());
        }
        stack.push(Value::Table(table));
        Ok(())
    }

    /// Pushes an escape block, then runs the body with that escape active. Calling
    /// the escape inside the body returns from `Begin` with the stack as it is.
    fn begin(&mut self, stack: &mut Vec<Value>, active: &[SignalToken]) -> Flow<()> {
        let block = self.pop_block(stack, "Begin")?;
        let token = self.tokens.mint();
        let frame = self
            .envs
            .frame(None, [(Rc::from(EXIT_BEGIN), Binding::Escape(token))]);
        stack.push(Value::Block(Closure::new(self.escape_body.clone(), Some(frame))));

        let mut inner = active.to_vec();
        inner.push(token);
        match self.process(&block, stack, &inner) {
            Ok(_) => Ok(()),
            Err(Unwind::Signal(Signal::Begin(caught))) if caught == token => {
                trace!("begin block exited early");
                Ok(())
            }
            Err(unwind) => Err(self.escaping("Begin", unwind, active)),
        }
    }
}

/// True when the identifier at `idx` is the name operand of `Def`/`Let`/`Set`.
fn names_next(body: &[Item], idx: usize) -> bool {
    match body.get(idx + 1) {
        Some(Item::Identifier(next)) => {
            Keyword::from_name(&next.name).is_some_and(Keyword::takes_name)
        }
        _ => false,
    }
}

fn pop(stack: &mut Vec<Value>, expected: &str) -> RuntimeResult<Value> {
    stack.pop().ok_or_else(|| RuntimeError::underflow(expected))
}

fn pop_kind(stack: &mut Vec<Value>, expected: &str, kind: ValueKind) -> RuntimeResult<Value> {
    let value = pop(stack, expected)?;
    if value.kind() == kind {
        Ok(value)
    } else {
        Err(RuntimeError::mismatch(kind.name(), value.kind()))
    }
}

fn pop_name(stack: &mut Vec<Value>) -> RuntimeResult<Rc<str>> {
    match pop_kind(stack, "identifier", ValueKind::Identifier)? {
        Value::Identifier(name) => Ok(name),
        other => Err(RuntimeError::mismatch("identifier", other.kind())),
    }
}

fn apply_matcher(matcher: &Matcher, stack: &mut Vec<Value>) -> RuntimeResult<()> {
    let subject = match pop_kind(stack, "string", ValueKind::String)? {
        Value::String(subject) => subject.to_string_lossy(),
        other => return Err(RuntimeError::mismatch("string", other.kind())),
    };
    if !matcher.captures {
        stack.push(Value::Boolean(matcher.regex.is_match(&subject)));
        return Ok(());
    }
    match matcher.regex.captures(&subject) {
        Some(groups) => {
            for group in groups.iter().skip(1).collect::<Vec<_>>().into_iter().rev() {
                let text = group.map_or("", |found| found.as_str());
                stack.push(Value::string(text));
            }
            stack.push(Value::Boolean(true));
        }
        None => stack.push(Value::Boolean(false)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Capture;
    use crate::language::{lower::lower, parser::parse_source};
    use pretty_assertions::assert_eq;

    /// Runs `source` without a prelude.
    fn eval(source: &str) -> (Evaluation, Capture) {
        eval_with(InterpreterConfig::default(), source)
    }

    fn eval_with(config: InterpreterConfig, source: &str) -> (Evaluation, Capture) {
        let capture = Capture::new();
        let mut interpreter = Interpreter::new(config, capture.frontend());
        let lowered = lower(
            &parse_source(source),
            None,
            true,
            interpreter.frontend_mut(),
        );
        assert!(!lowered.bail, "{source}");
        let evaluation = interpreter.evaluate(&Closure::new(lowered.root, None), Vec::new(), &[]);
        (evaluation, capture)
    }

    fn error_of(source: &str) -> String {
        eval(source).0.error.map(|error| error.to_string()).unwrap_or_default()
    }

    #[test]
    fn operands_are_popped_in_written_order() {
        let (evaluation, _) = eval("- 1 2; / 2 10");
        assert_eq!(evaluation.stack, vec![Value::Number(1.0), Value::Number(5.0)]);
    }

    #[test]
    fn functions_share_the_callers_stack() {
        let (evaluation, capture) = eval("Def Twice (Let X; + X X); Print Twice 4;");
        assert_eq!(evaluation.error, None);
        assert_eq!(capture.output(), "8\n");
    }

    #[test]
    fn use_before_declaration_is_a_runtime_error() {
        let (evaluation, capture) = eval("Print X; Let X 1;");
        assert_eq!(
            evaluation.error.map(|error| error.to_string()),
            Some("X used before declaration".to_string())
        );
        assert_eq!(capture.diagnostics()[0].message, "variable used before declaration");
    }

    #[test]
    fn errors_name_every_enclosing_call() {
        assert_eq!(
            error_of("Def Inner (Sqrt -1); Def Outer (Inner); Outer;"),
            "in Outer: in Inner: in Sqrt: sqrt of a negative number"
        );
        assert_eq!(error_of("+ 1"), "expected operand");
        assert_eq!(error_of("+ 1 \"a\""), "expected number, got string");
    }

    #[test]
    fn overloads_pick_by_first_operand() {
        assert_eq!(error_of("First 1"), "expected one of [list, string], got number");
        assert_eq!(error_of("First"), "expected one of [list, string]");
    }

    #[test]
    fn boxes_are_shared_and_plain_values_are_copied() {
        let (evaluation, _) = eval("Let A Box 1; Let B A; Set A 2; Unbox B");
        assert_eq!(evaluation.stack, vec![Value::Number(2.0)]);
        let (evaluation, _) = eval("Let A 1; Let B A; B");
        assert_eq!(evaluation.stack, vec![Value::Number(1.0)]);
    }

    #[test]
    fn set_needs_a_box() {
        assert_eq!(error_of("Let A 1; Set A 2;"), "in Set: expected box, got number");
    }

    #[test]
    fn list_and_table_run_on_a_fresh_stack() {
        let (evaluation, _) = eval("9; Let T Table (\\a 1 \\b 2); . \\b T; List (1 2 3)");
        assert_eq!(evaluation.stack[0], Value::Number(9.0));
        assert_eq!(evaluation.stack[1], Value::Number(2.0));
        assert_eq!(evaluation.stack[2].to_string(), "(1 2 3)");
        assert_eq!(
            error_of("Table (\\a 1 \\b)"),
            "in Table: Table initializer must be key-value pairs"
        );
    }

    #[test]
    fn stop_halts_without_an_error() {
        let (evaluation, capture) = eval("Print 1; Stop; Print 2;");
        assert!(evaluation.stopped);
        assert_eq!(evaluation.error, None);
        assert_eq!(capture.output(), "1\n");
    }

    #[test]
    fn user_errors_carry_no_prefix() {
        assert_eq!(error_of("Error \"boom\""), "boom");
        assert_eq!(error_of("Def F (Error \"boom\"); F"), "in F: boom");
    }

    #[test]
    fn unbounded_recursion_hits_the_default_limit() {
        let (evaluation, _) = eval("Def F (F); F;");
        let error = evaluation.error.expect("recursion must fail");
        assert_eq!(error.root_cause(), &RuntimeError::CallStackOverflow);
        let message = error.to_string();
        assert!(message.starts_with("in F: "), "{message}");
        assert!(message.matches("in F: ").count() > 2900);
    }

    #[test]
    fn lower_limits_stop_recursion_sooner() {
        let config = InterpreterConfig::default().with_call_stack_limit(200);
        let (evaluation, _) = eval_with(config, "Def F (F); F;");
        let message = evaluation.error.map(|error| error.to_string()).unwrap_or_default();
        assert!(message.ends_with("call stack overflowed!"), "{message}");
        assert!(message.matches("in F: ").count() < 200);
    }

    #[test]
    fn finished_calls_free_their_frames() {
        let source = "Def Do (Def F; F);\
             Def Fib (Let N; Do If < 2 N (N) (+ Fib - 1 N Fib - 2 N));\
             Def Local (Def Helper (Let N; N); Helper);\
             Fib 15; Local 4;";
        let capture = Capture::new();
        let mut interpreter = Interpreter::new(InterpreterConfig::default(), capture.frontend());
        let lowered = lower(&parse_source(source), None, true, interpreter.frontend_mut());
        assert!(!lowered.bail);
        let evaluation = interpreter.evaluate(&Closure::new(lowered.root, None), Vec::new(), &[]);
        assert_eq!(evaluation.error, None);
        assert_eq!(
            evaluation.stack,
            vec![Value::Number(610.0), Value::Number(4.0)]
        );
        // The root frame, plus the `Local` frame its own `Helper` keeps alive.
        assert_eq!(interpreter.live_frames(), 2);

        drop(evaluation);
        interpreter.release_frames();
        assert_eq!(interpreter.live_frames(), 0);
    }

    #[test]
    fn type_predicates_pop_and_assertions_peek() {
        let (evaluation, _) = eval("Number? 1; String! \"x\"");
        assert_eq!(
            evaluation.stack,
            vec![Value::Boolean(true), Value::string("x")]
        );
        assert_eq!(error_of("Number! \"x\""), "in Number!: number assertion failed");
    }

    #[test]
    fn regex_blocks_match_strings() {
        let (evaluation, _) = eval(
            "Def Digits (Regex \"^[0-9]+$\"); Def Pair (Regex-match \"(a+)(b+)\");\
             Digits; Def D; D \"123\"; Pair; Def P; P \"xaabbb\"",
        );
        assert_eq!(evaluation.error, None);
        assert_eq!(
            evaluation.stack,
            vec![
                Value::Boolean(true),
                Value::string("bbb"),
                Value::string("aa"),
                Value::Boolean(true),
            ]
        );
        assert_eq!(error_of("Regex \"\""), "in Regex: empty regex is invalid");
    }

    #[test]
    fn show_renders_without_printing() {
        let (evaluation, capture) = eval("Show List (1 \"a\")");
        assert_eq!(evaluation.stack, vec![Value::string("(1 \"a\")")]);
        assert_eq!(capture.output(), "");
    }
}
