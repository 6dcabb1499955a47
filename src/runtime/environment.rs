use crate::language::ast::{BlockSpec, DeclKind};
use crate::runtime::{
    signal::SignalToken,
    value::{Closure, Value},
};
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Clone, Debug)]
pub enum Binding {
    /// Declared by a `Def`/`Let` in this block that has not run yet.
    Predeclared(DeclKind),
    Function(Closure),
    Value(Value),
    /// The body of a `Begin` escape block.
    Escape(SignalToken),
    /// The body of a block made by `Regex` or `Regex-match`.
    Matcher(Matcher),
}

#[derive(Clone, Debug)]
pub struct Matcher {
    pub regex: Regex,
    /// Push capture groups on success (`Regex-match`) rather than just a boolean.
    pub captures: bool,
}

struct Frame {
    bindings: RefCell<HashMap<Rc<str>, Binding>>,
    parent: Option<Env>,
}

/// Shared handle to one frame. Closures hold one of these, so a frame can be
/// captured while it is still being filled in, and is freed once the last
/// closure and callee referring to it is gone.
#[derive(Clone)]
pub struct Env(Rc<Frame>);

impl Env {
    pub fn parent(&self) -> Option<&Env> {
        self.0.parent.as_ref()
    }

    /// Innermost binding of `name`, walking outward from this frame.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        let mut current = Some(self);
        while let Some(env) = current {
            if let Some(binding) = env.0.bindings.borrow().get(name) {
                return Some(binding.clone());
            }
            current = env.parent();
        }
        None
    }

    /// Binds in this frame itself, replacing its pending declaration if any.
    pub fn bind(&self, name: Rc<str>, binding: Binding) {
        self.0.bindings.borrow_mut().insert(name, binding);
    }

    fn address(&self) -> *const Frame {
        Rc::as_ptr(&self.0)
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Env {}

impl PartialOrd for Env {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Env {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address().cmp(&other.address())
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env({:p})", self.address())
    }
}

/// Every frame made since the interpreter started. A frame that binds a
/// closure over itself (a local `Def`) keeps itself alive; [`Environments::release`]
/// clears such frames once a run is over.
#[derive(Default)]
pub struct Environments {
    frames: Vec<Weak<Frame>>,
    /// Leading frames that outlive every run, i.e. the prelude's.
    kept: usize,
}

impl Environments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames still referenced by something.
    pub fn live(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.strong_count() > 0)
            .count()
    }

    /// Keeps every frame made so far across later [`Environments::release`] calls.
    pub fn keep(&mut self) {
        self.prune();
        self.kept = self.frames.len();
    }

    /// Empties the frames made since the last [`Environments::keep`], so
    /// self-referencing ones are freed too.
    pub fn release(&mut self) {
        for frame in self.frames.drain(self.kept..) {
            if let Some(frame) = frame.upgrade() {
                frame.bindings.borrow_mut().clear();
            }
        }
    }

    pub fn frame(
        &mut self,
        parent: Option<Env>,
        bindings: impl IntoIterator<Item = (Rc<str>, Binding)>,
    ) -> Env {
        let frame = Rc::new(Frame {
            bindings: RefCell::new(bindings.into_iter().collect()),
            parent,
        });
        if self.frames.len() == self.frames.capacity() {
            self.prune();
        }
        self.frames.push(Rc::downgrade(&frame));
        Env(frame)
    }

    /// Fresh frame for one invocation of `spec`, with its declarations pending.
    pub fn materialize(&mut self, spec: &BlockSpec, parent: Option<Env>) -> Env {
        let pending = spec
            .predeclared
            .iter()
            .map(|(name, kind)| (name.clone(), Binding::Predeclared(*kind)));
        self.frame(parent, pending)
    }

    /// Forgets frames that were already freed, so the registry tracks live
    /// frames rather than every call ever made.
    fn prune(&mut self) {
        let kept = self.kept;
        let mut idx = 0;
        self.frames.retain(|frame| {
            idx += 1;
            idx <= kept || frame.strong_count() > 0
        });
    }
}

impl Drop for Environments {
    fn drop(&mut self) {
        self.kept = 0;
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_the_root() {
        let mut envs = Environments::new();
        let root = envs.frame(None, [(Rc::from("X"), Binding::Value(Value::Number(1.0)))]);
        let child = envs.frame(Some(root.clone()), []);
        assert!(matches!(
            child.lookup("X"),
            Some(Binding::Value(Value::Number(n))) if n == 1.0
        ));
        assert!(child.lookup("Y").is_none());
        assert_eq!(child.parent(), Some(&root));
    }

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let mut envs = Environments::new();
        let root = envs.frame(None, [(Rc::from("X"), Binding::Value(Value::Number(1.0)))]);
        let child = envs.frame(Some(root.clone()), []);
        child.bind(Rc::from("X"), Binding::Predeclared(DeclKind::Let));
        assert!(matches!(
            child.lookup("X"),
            Some(Binding::Predeclared(DeclKind::Let))
        ));
        assert!(matches!(root.lookup("X"), Some(Binding::Value(_))));
    }

    #[test]
    fn frames_are_freed_with_their_last_handle() {
        let mut envs = Environments::new();
        let root = envs.frame(None, []);
        for _ in 0..1000 {
            let child = envs.frame(Some(root.clone()), []);
            drop(child);
        }
        assert_eq!(envs.live(), 1);
        assert!(envs.frames.len() < 1000);
    }

    #[test]
    fn release_clears_self_referencing_frames_but_keeps_older_ones() {
        let mut envs = Environments::new();
        let root = envs.frame(None, []);
        envs.keep();
        let local = envs.frame(Some(root.clone()), []);
        let own = Closure::new(Rc::new(BlockSpec::default()), Some(local.clone()));
        local.bind(Rc::from("F"), Binding::Function(own));
        let weak = Rc::downgrade(&local.0);
        drop(local);
        assert_eq!(envs.live(), 2);

        envs.release();
        assert!(weak.upgrade().is_none());
        assert_eq!(envs.live(), 1);
        root.bind(Rc::from("X"), Binding::Value(Value::Number(1.0)));
        assert!(root.lookup("X").is_some());
    }
}
