//! Persistent ordered map backing the `Table` value.
//!
//! An AA tree: every node carries a level, left children sit strictly below their
//! parent, right children at most level with it, and no two consecutive right links
//! stay at the same level. Updates copy the search path and share everything else,
//! so older tables keep seeing their old contents.

use crate::runtime::value::{compare, Value};
use std::cmp::Ordering;
use std::rc::Rc;

type Link = Option<Rc<Node>>;

#[derive(Debug)]
struct Node {
    key: Value,
    value: Value,
    level: usize,
    left: Link,
    right: Link,
}

fn level(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.level)
}

fn node(key: Value, value: Value, level: usize, left: Link, right: Link) -> Rc<Node> {
    Rc::new(Node {
        key,
        value,
        level,
        left,
        right,
    })
}

fn with_children(from: &Node, level: usize, left: Link, right: Link) -> Rc<Node> {
    node(from.key.clone(), from.value.clone(), level, left, right)
}

/// Rotates right when the left child is level with `t`.
fn skew(t: Rc<Node>) -> Rc<Node> {
    match &t.left {
        Some(l) if l.level == t.level => {
            let lowered = with_children(&t, t.level, l.right.clone(), t.right.clone());
            with_children(l, l.level, l.left.clone(), Some(lowered))
        }
        _ => t,
    }
}

/// Rotates left and promotes when two right links in a row are level with `t`.
fn split(t: Rc<Node>) -> Rc<Node> {
    match &t.right {
        Some(r) if level(&r.right) == t.level => {
            let lowered = with_children(&t, t.level, t.left.clone(), r.left.clone());
            with_children(r, r.level + 1, Some(lowered), r.right.clone())
        }
        _ => t,
    }
}

fn insert(link: &Link, key: Value, value: Value) -> Rc<Node> {
    let Some(t) = link else {
        return node(key, value, 1, None, None);
    };
    let updated = match compare(&key, &t.key) {
        Ordering::Less => {
            let left = insert(&t.left, key, value);
            with_children(t, t.level, Some(left), t.right.clone())
        }
        Ordering::Greater => {
            let right = insert(&t.right, key, value);
            with_children(t, t.level, t.left.clone(), Some(right))
        }
        Ordering::Equal => {
            node(t.key.clone(), value, t.level, t.left.clone(), t.right.clone())
        }
    };
    split(skew(updated))
}

fn rightmost(t: &Rc<Node>) -> &Rc<Node> {
    let mut current = t;
    while let Some(right) = &current.right {
        current = right;
    }
    current
}

fn leftmost(t: &Rc<Node>) -> &Rc<Node> {
    let mut current = t;
    while let Some(left) = &current.left {
        current = left;
    }
    current
}

/// Returns `None` when `key` is absent, so callers can keep the old root.
fn remove(link: &Link, key: &Value) -> Option<Link> {
    let t = link.as_ref()?;
    let updated = match compare(key, &t.key) {
        Ordering::Less => with_children(t, t.level, remove(&t.left, key)?, t.right.clone()),
        Ordering::Greater => with_children(t, t.level, t.left.clone(), remove(&t.right, key)?),
        Ordering::Equal => match (&t.left, &t.right) {
            (None, None) => return Some(None),
            (Some(left), _) => {
                let predecessor = rightmost(left);
                let left = remove(&t.left, &predecessor.key)?;
                node(
                    predecessor.key.clone(),
                    predecessor.value.clone(),
                    t.level,
                    left,
                    t.right.clone(),
                )
            }
            (None, Some(right)) => {
                let successor = leftmost(right);
                let right = remove(&t.right, &successor.key)?;
                node(
                    successor.key.clone(),
                    successor.value.clone(),
                    t.level,
                    None,
                    right,
                )
            }
        },
    };
    Some(Some(rebalance(updated)))
}

fn decrease_level(t: Rc<Node>) -> Rc<Node> {
    let expected = level(&t.left).min(level(&t.right)) + 1;
    if expected >= t.level {
        return t;
    }
    let right = match &t.right {
        Some(r) if r.level > expected => {
            Some(with_children(r, expected, r.left.clone(), r.right.clone()))
        }
        other => other.clone(),
    };
    with_children(&t, expected, t.left.clone(), right)
}

fn map_right(t: Rc<Node>, f: impl FnOnce(Rc<Node>) -> Rc<Node>) -> Rc<Node> {
    match &t.right {
        Some(r) => with_children(&t, t.level, t.left.clone(), Some(f(r.clone()))),
        None => t,
    }
}

/// Restores the invariants after a removal below `t`: drop levels, then skew
/// along the right spine three deep and split two deep.
fn rebalance(t: Rc<Node>) -> Rc<Node> {
    let t = skew(decrease_level(t));
    let t = map_right(t, |r| map_right(skew(r), skew));
    let t = split(t);
    map_right(t, split)
}

/// An immutable ordered map from values to values.
#[derive(Clone, Debug, Default)]
pub struct Table {
    root: Link,
    len: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let mut current = self.root.as_ref();
        while let Some(t) = current {
            current = match compare(key, &t.key) {
                Ordering::Less => t.left.as_ref(),
                Ordering::Greater => t.right.as_ref(),
                Ordering::Equal => return Some(&t.value),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&self, key: Value, value: Value) -> Table {
        let len = if self.contains_key(&key) {
            self.len
        } else {
            self.len + 1
        };
        Table {
            root: Some(insert(&self.root, key, value)),
            len,
        }
    }

    pub fn remove(&self, key: &Value) -> Table {
        match remove(&self.root, key) {
            Some(root) => Table {
                root,
                len: self.len - 1,
            },
            None => self.clone(),
        }
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { pending: Vec::new() };
        iter.descend(self.root.as_ref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(_, value)| value)
    }

    /// Orders tables by their entries in key order, keys before values, then by size.
    pub fn compare(&self, other: &Table) -> Ordering {
        for ((ka, va), (kb, vb)) in self.iter().zip(other.iter()) {
            let ordering = compare(ka, kb).then_with(|| compare(va, vb));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.len.cmp(&other.len)
    }
}

pub struct Iter<'a> {
    pending: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn descend(&mut self, mut link: Option<&'a Rc<Node>>) {
        while let Some(node) = link {
            self.pending.push(node);
            link = node.left.as_ref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop()?;
        self.descend(node.right.as_ref());
        Some((&node.key, &node.value))
    }
}
