use crate::frontend::{Style, StyledText};
use crate::language::ast::BlockSpec;
use crate::runtime::environment::Env;
use crate::runtime::table::Table;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Relative tolerance under which two numbers compare equal. Keeps results of
/// transcendental builtins comparable, e.g. `== 3 Sqrt 9`.
pub const NUMBER_TOLERANCE: f64 = 5e-15;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(Text),
    Boolean(bool),
    Symbol(Rc<str>),
    /// A bare name, pushed in place of a variable right before `Def`/`Let`/`Set`.
    Identifier(Rc<str>),
    /// Newest-pushed item last; `First` reads the last element.
    List(Rc<Vec<Value>>),
    Boxed(BoxValue),
    Table(Table),
    Block(Closure),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Number,
    Symbol,
    Boolean,
    String,
    Box,
    List,
    Table,
    Block,
    Identifier,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Symbol => "symbol",
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Box => "box",
            ValueKind::List => "list",
            ValueKind::Table => "table",
            ValueKind::Block => "block",
            ValueKind::Identifier => "identifier",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Identifier(_) => ValueKind::Identifier,
            Value::List(_) => ValueKind::List,
            Value::Boxed(_) => ValueKind::Box,
            Value::Table(_) => ValueKind::Table,
            Value::Block(_) => ValueKind::Block,
        }
    }

    pub fn string(text: &str) -> Self {
        Value::String(Text::new(text))
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Rc::from(name))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<Vec<Value>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_value(&mut out, self, true, &mut Vec::new());
        write!(f, "{}({out})", self.kind())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self).text)
    }
}

/// A string as a sequence of UTF-16 code units, plus an optional presentation style.
#[derive(Clone, Debug)]
pub struct Text {
    pub units: Rc<[u16]>,
    pub style: Option<Style>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        Self::from_units(text.encode_utf16().collect())
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        Self {
            units: units.into(),
            style: None,
        }
    }

    pub fn styled(mut self, style: Option<Style>) -> Self {
        self.style = style;
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

#[derive(Clone, Debug)]
pub struct BoxValue {
    pub cell: Rc<RefCell<Value>>,
}

impl BoxValue {
    pub fn new(value: Value) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
        }
    }

    pub fn get(&self) -> Value {
        self.cell.borrow().clone()
    }

    pub fn replace(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.cell.borrow_mut(), value)
    }

    fn identity(&self) -> *const RefCell<Value> {
        Rc::as_ptr(&self.cell)
    }
}

/// A block value: the lowered body plus the frame it was pushed in.
#[derive(Clone, Debug)]
pub struct Closure {
    pub spec: Rc<BlockSpec>,
    pub env: Option<Env>,
}

impl Closure {
    pub fn new(spec: Rc<BlockSpec>, env: Option<Env>) -> Self {
        Self { spec, env }
    }

    fn identity(&self) -> (*const BlockSpec, Option<&Env>) {
        (Rc::as_ptr(&self.spec), self.env.as_ref())
    }
}

pub fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= NUMBER_TOLERANCE * a.abs().max(b.abs())
}

/// Total order over all values. Values of different kinds order by kind
/// (number < symbol < boolean < string < box < list < table < block); boxes and
/// blocks of the same kind order by identity.
pub fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if numbers_equal(*a, *b) {
                Ordering::Equal
            } else {
                a.total_cmp(b)
            }
        }
        (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
        (Value::Identifier(a), Value::Identifier(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.units.cmp(&b.units),
        (Value::Boxed(a), Value::Boxed(b)) => a.identity().cmp(&b.identity()),
        (Value::List(a), Value::List(b)) => compare_sequences(a.iter(), b.iter()),
        (Value::Table(a), Value::Table(b)) => a.compare(b),
        (Value::Block(a), Value::Block(b)) => a.identity().cmp(&b.identity()),
        _ => left.kind().cmp(&right.kind()),
    }
}

/// Element-wise, then shorter first.
pub fn compare_sequences<'a>(
    left: impl ExactSizeIterator<Item = &'a Value>,
    right: impl ExactSizeIterator<Item = &'a Value>,
) -> Ordering {
    let lengths = left.len().cmp(&right.len());
    for (a, b) in left.zip(right) {
        match compare(a, b) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    lengths
}

const ESCAPES: [(char, char); 8] = [
    ('b', '\u{8}'),
    ('t', '\t'),
    ('n', '\n'),
    ('v', '\u{b}'),
    ('f', '\u{c}'),
    ('r', '\r'),
    ('"', '"'),
    ('\\', '\\'),
];

/// Resolves a backslash escape letter to the character it stands for.
pub fn unescape_char(letter: char) -> Option<char> {
    ESCAPES
        .iter()
        .find(|(escape, _)| *escape == letter)
        .map(|(_, resolved)| *resolved)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ESCAPES.iter().find(|(_, resolved)| *resolved == ch) {
            Some((letter, _)) => {
                out.push('\\');
                out.push(*letter);
            }
            None => out.push(ch),
        }
    }
    out
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".into()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.into()
    } else if value == 0.0 {
        "0".into()
    } else {
        value.to_string()
    }
}

/// Converts a value to the text `Print`, `Put` and `Show` produce. Strings print
/// raw at the top level and quoted inside containers; booleans carry the marked style.
pub fn render(value: &Value) -> StyledText {
    match value {
        Value::String(text) => StyledText {
            text: text.to_string_lossy(),
            style: text.style,
        },
        Value::Boolean(_) => {
            let mut text = String::new();
            write_value(&mut text, value, false, &mut Vec::new());
            StyledText {
                text,
                style: Some(Style::Marked),
            }
        }
        _ => {
            let mut text = String::new();
            write_value(&mut text, value, false, &mut Vec::new());
            StyledText { text, style: None }
        }
    }
}

/// The stack as the CLI shows it, bottom first, with containers' rendering for
/// every entry: `[1, "a", (2 3)]`.
pub fn render_stack(stack: &[Value]) -> String {
    let mut out = String::from("[");
    for (idx, value) in stack.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_value(&mut out, value, true, &mut Vec::new());
    }
    out.push(']');
    out
}

fn write_value(
    out: &mut String,
    value: &Value,
    nested: bool,
    visiting: &mut Vec<*const RefCell<Value>>,
) {
    match value {
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::String(text) if nested => {
            out.push('"');
            out.push_str(&escape(&text.to_string_lossy()));
            out.push('"');
        }
        Value::String(text) => out.push_str(&text.to_string_lossy()),
        Value::Boolean(b) => out.push_str(if *b { "True" } else { "False" }),
        Value::Symbol(name) if nested => {
            out.push('\\');
            out.push_str(name);
        }
        Value::Symbol(name) | Value::Identifier(name) => out.push_str(name),
        Value::List(items) => {
            out.push('(');
            for (idx, item) in items.iter().rev().enumerate() {
                if idx > 0 {
                    out.push(' ');
                }
                write_value(out, item, true, visiting);
            }
            out.push(')');
        }
        Value::Boxed(boxed) => {
            let id = boxed.identity();
            if visiting.contains(&id) {
                out.push_str("...");
                return;
            }
            visiting.push(id);
            out.push('[');
            write_value(out, &boxed.cell.borrow(), true, visiting);
            out.push(']');
            visiting.pop();
        }
        Value::Table(table) => {
            out.push('{');
            for (key, value) in table.iter() {
                out.push(' ');
                write_value(out, key, true, visiting);
                out.push(':');
                write_value(out, value, true, visiting);
            }
            out.push_str(" }");
        }
        Value::Block(_) => out.push_str("(block)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_order_across_types() {
        let pool = [
            Value::Number(10.0),
            Value::symbol("a"),
            Value::Boolean(false),
            Value::string("a"),
            Value::Boxed(BoxValue::new(Value::Number(1.0))),
            Value::list(vec![]),
            Value::Table(Table::new()),
        ];
        for pair in pool.windows(2) {
            assert_eq!(compare(&pair[0], &pair[1]), Ordering::Less, "{pair:?}");
        }
    }

    #[test]
    fn numbers_within_tolerance_are_equal() {
        assert_eq!(Value::Number(3.0), Value::Number(9.0f64.sqrt()));
        assert_eq!(Value::Number(0.1 + 0.2), Value::Number(0.3));
        assert_ne!(Value::Number(1.0), Value::Number(1.0 + 1e-12));
    }

    #[test]
    fn lists_compare_elementwise_then_by_length() {
        let short = Value::list(vec![Value::Number(1.0)]);
        let long = Value::list(vec![Value::Number(1.0), Value::Number(0.0)]);
        let bigger = Value::list(vec![Value::Number(2.0)]);
        assert_eq!(compare(&short, &long), Ordering::Less);
        assert_eq!(compare(&long, &bigger), Ordering::Less);
    }

    #[test]
    fn boxes_compare_by_identity() {
        let a = BoxValue::new(Value::Number(1.0));
        let b = BoxValue::new(Value::Number(1.0));
        assert_eq!(Value::Boxed(a.clone()), Value::Boxed(a.clone()));
        assert_ne!(Value::Boxed(a), Value::Boxed(b));
    }

    #[test]
    fn lists_render_first_item_first() {
        let list = Value::list(vec![
            Value::Number(3.0),
            Value::string("two\n"),
            Value::Boolean(true),
        ]);
        assert_eq!(render(&list).text, "(True \"two\\n\" 3)");
    }

    #[test]
    fn self_referencing_box_renders_with_ellipsis() {
        let cell = BoxValue::new(Value::Number(0.0));
        cell.replace(Value::list(vec![Value::Boxed(cell.clone())]));
        assert_eq!(render(&Value::Boxed(cell.clone())).text, "[(...)]");
        // Break the cycle so the test does not leak.
        cell.replace(Value::Number(0.0));
    }

    #[test]
    fn numbers_render_like_integers_when_whole() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn escape_round_trips_the_table() {
        assert_eq!(escape("a\"b\\c\td"), "a\\\"b\\\\c\\td");
        assert_eq!(unescape_char('n'), Some('\n'));
        assert_eq!(unescape_char('a'), None);
    }

    #[test]
    fn stack_renders_bottom_first_with_quoted_strings() {
        let stack = vec![
            Value::Number(1.0),
            Value::string("a"),
            Value::list(vec![Value::Number(3.0), Value::Number(2.0)]),
        ];
        assert_eq!(render_stack(&stack), "[1, \"a\", (2 3)]");
        assert_eq!(render_stack(&[]), "[]");
    }
}
