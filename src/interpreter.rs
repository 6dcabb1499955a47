//! Top-level runner: source text in, final stack and error out.
//!
//! A [`Runner`] owns the engine and the syntax frontend. The prelude is lowered,
//! resolved and evaluated once at construction; its root block is the lowering
//! parent of every program, and its frame is the parent of every program's root
//! frame, so user code sees prelude definitions both statically and at runtime.

use crate::config::InterpreterConfig;
use crate::frontend::Frontend;
use crate::language::{
    ast::BlockSpec,
    lower::lower,
    parser::{CognateSyntax, SyntaxFrontend},
    resolve::resolve,
};
use crate::runtime::{
    environment::Env,
    error::RuntimeError,
    value::{Closure, Value},
    Interpreter,
};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// The prelude shipped with the crate.
pub const PRELUDE: &str = include_str!("prelude.cog");

const REJECTED: &str = "error during parsing";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PreludeError {
    #[error("failed to parse prelude")]
    Parse,
    #[error("prelude refers to undefined symbols: {0}")]
    Undefined(String),
    #[error("failed to execute prelude: {0}")]
    Execute(RuntimeError),
    #[error("prelude called Stop")]
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The program ran to its end.
    Completed,
    /// The program called `Stop`.
    Stopped,
    /// Syntax or resolution errors; nothing ran.
    Rejected,
    /// A runtime error escaped the program.
    Failed,
}

#[derive(Debug)]
pub struct RunResult {
    pub stack: Vec<Value>,
    /// Empty unless `outcome` is `Rejected` or `Failed`.
    pub error: String,
    pub outcome: Outcome,
}

impl RunResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Completed | Outcome::Stopped)
    }
}

struct Prelude {
    root: Rc<BlockSpec>,
    env: Env,
}

pub struct Runner {
    syntax: Box<dyn SyntaxFrontend>,
    interpreter: Interpreter,
    prelude: Option<Prelude>,
}

impl Runner {
    /// A runner with the default configuration and the built-in prelude.
    pub fn new(frontend: Frontend) -> Result<Self, PreludeError> {
        Self::with_prelude(InterpreterConfig::default(), PRELUDE, frontend)
    }

    pub fn with_prelude(
        config: InterpreterConfig,
        prelude: &str,
        frontend: Frontend,
    ) -> Result<Self, PreludeError> {
        let mut runner = Self::without_prelude(config, frontend);
        runner.prelude = Some(runner.load_prelude(prelude)?);
        Ok(runner)
    }

    /// A runner whose programs can only use builtins and keywords.
    pub fn without_prelude(config: InterpreterConfig, frontend: Frontend) -> Self {
        Self {
            syntax: Box::new(CognateSyntax),
            interpreter: Interpreter::new(config, frontend),
            prelude: None,
        }
    }

    /// Parses programs run from now on with `syntax`.
    pub fn with_syntax(mut self, syntax: impl SyntaxFrontend + 'static) -> Self {
        self.syntax = Box::new(syntax);
        self
    }

    pub fn frontend(&self) -> &Frontend {
        self.interpreter.frontend()
    }

    pub fn frontend_mut(&mut self) -> &mut Frontend {
        self.interpreter.frontend_mut()
    }

    fn load_prelude(&mut self, text: &str) -> Result<Prelude, PreludeError> {
        let tree = self.syntax.parse(text);
        let lowered = lower(&tree, None, false, self.interpreter.frontend_mut());
        if lowered.bail {
            return Err(PreludeError::Parse);
        }
        let resolution = resolve(&lowered.root, self.interpreter.frontend_mut());
        if !resolution.is_clean() {
            let names: Vec<&str> = resolution
                .undefined
                .iter()
                .map(|ident| ident.name.as_ref())
                .collect();
            return Err(PreludeError::Undefined(names.join(", ")));
        }

        let closure = Closure::new(lowered.root.clone(), None);
        let evaluation = self.interpreter.evaluate(&closure, Vec::new(), &[]);
        if let Some(error) = evaluation.error {
            return Err(PreludeError::Execute(error));
        }
        let env = evaluation.env.ok_or(PreludeError::Stopped)?;
        self.interpreter.keep_frames();
        debug!(
            definitions = lowered.root.predeclared.len(),
            "prelude loaded"
        );
        Ok(Prelude {
            root: lowered.root,
            env,
        })
    }

    /// Parses, lowers and resolves `source` without running it. Problems go to
    /// the frontend's diagnostics and error sinks.
    pub fn check(&mut self, source: &str) -> bool {
        self.interpreter.frontend_mut().clear();
        self.prepare(source).is_some()
    }

    pub fn run(&mut self, source: &str) -> RunResult {
        self.interpreter.frontend_mut().clear();
        let Some(root) = self.prepare(source) else {
            debug!("program rejected");
            return RunResult {
                stack: Vec::new(),
                error: REJECTED.to_string(),
                outcome: Outcome::Rejected,
            };
        };

        self.interpreter.release_frames();
        let parent = self.prelude.as_ref().map(|prelude| prelude.env.clone());

        debug!("evaluating");
        let evaluation = self
            .interpreter
            .evaluate(&Closure::new(root, parent), Vec::new(), &[]);
        let (error, outcome) = match evaluation.error {
            Some(error) => {
                let message = error.to_string();
                self.interpreter.frontend_mut().errors.add(message.clone());
                (message, Outcome::Failed)
            }
            None if evaluation.stopped => (String::new(), Outcome::Stopped),
            None => (String::new(), Outcome::Completed),
        };
        debug!(
            ?outcome,
            stack = evaluation.stack.len(),
            frames = self.interpreter.live_frames(),
            "finished"
        );
        RunResult {
            stack: evaluation.stack,
            error,
            outcome,
        }
    }

    /// The lowered program, or `None` when it must not run.
    fn prepare(&mut self, source: &str) -> Option<Rc<BlockSpec>> {
        let tree = self.syntax.parse(source);
        debug!(statements = tree.children.len(), "parsed");

        let parent = self.prelude.as_ref().map(|prelude| &prelude.root);
        let lowered = lower(&tree, parent, true, self.interpreter.frontend_mut());
        debug!(bail = lowered.bail, "lowered");

        let resolution = resolve(&lowered.root, self.interpreter.frontend_mut());
        debug!(
            undefined = resolution.undefined.len(),
            call_sites = resolution.call_sites.len(),
            "resolved"
        );

        (!lowered.bail && resolution.is_clean()).then_some(lowered.root)
    }
}
