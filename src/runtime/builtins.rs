//! The builtin registry: every word that pops typed operands, computes, and
//! pushes one result.
//!
//! Operands are popped in declared order, so `args[0]` is the operand written
//! first in source (`- 1 2` calls `-` with `args == [1, 2]` and yields `1`).
//! Words that bind names, run blocks or produce output live in the engine.

use crate::runtime::table::Table;
use crate::runtime::value::{compare, format_number, Text, Value, ValueKind};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Any,
    Kind(ValueKind),
}

impl ParamType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Kind(kind) => value.kind() == kind,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Kind(kind) => kind.name(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
}

pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Clone, Debug)]
pub struct Signature {
    pub params: Vec<Param>,
    /// `None` for words that push nothing.
    pub returns: Option<ParamType>,
    pub func: BuiltinFn,
}

#[derive(Clone, Debug)]
pub enum Builtin {
    Single(Signature),
    /// Chosen by the kind of the first popped operand.
    Overloaded(Vec<Signature>),
}

impl Builtin {
    /// The kinds the first operand may have, as listed in overload errors.
    pub fn first_param_names(&self) -> Vec<&'static str> {
        match self {
            Builtin::Single(signature) => signature
                .params
                .first()
                .map(|param| vec![param.ty.name()])
                .unwrap_or_default(),
            Builtin::Overloaded(overloads) => overloads
                .iter()
                .filter_map(|signature| signature.params.first())
                .map(|param| param.ty.name())
                .collect(),
        }
    }
}

struct Entry {
    name: &'static str,
    builtin: Builtin,
}

const NUMBER: ParamType = ParamType::Kind(ValueKind::Number);
const STRING: ParamType = ParamType::Kind(ValueKind::String);
const BOOLEAN: ParamType = ParamType::Kind(ValueKind::Boolean);
const LIST: ParamType = ParamType::Kind(ValueKind::List);
const TABLE: ParamType = ParamType::Kind(ValueKind::Table);
const ANY: ParamType = ParamType::Any;

/// Longest list `Range` builds.
const MAX_RANGE_LENGTH: f64 = 16_777_216.0;

fn param(name: &'static str, ty: ParamType) -> Param {
    Param { name, ty }
}

fn sig(params: &[(&'static str, ParamType)], returns: ParamType, func: BuiltinFn) -> Signature {
    Signature {
        params: params.iter().map(|(name, ty)| param(name, *ty)).collect(),
        returns: Some(returns),
        func,
    }
}

fn single(
    name: &'static str,
    params: &[(&'static str, ParamType)],
    returns: ParamType,
    func: BuiltinFn,
) -> Entry {
    Entry {
        name,
        builtin: Builtin::Single(sig(params, returns, func)),
    }
}

fn overloaded(name: &'static str, overloads: Vec<Signature>) -> Entry {
    Entry {
        name,
        builtin: Builtin::Overloaded(overloads),
    }
}

fn unary_math(name: &'static str, func: BuiltinFn) -> Entry {
    single(name, &[("operand", NUMBER)], NUMBER, func)
}

fn binary_math(name: &'static str, func: BuiltinFn) -> Entry {
    single(name, &[("operand", NUMBER), ("operand", NUMBER)], NUMBER, func)
}

fn comparison(name: &'static str, func: BuiltinFn) -> Entry {
    single(name, &[("operand", ANY), ("operand", ANY)], BOOLEAN, func)
}

fn logic(name: &'static str, func: BuiltinFn) -> Entry {
    single(name, &[("operand", BOOLEAN), ("operand", BOOLEAN)], BOOLEAN, func)
}

static BUILTINS: LazyLock<Vec<Entry>> = LazyLock::new(|| {
    vec![
        // Value checks
        single("Zero?", &[("value", ANY)], BOOLEAN, |args| {
            Ok(Value::Boolean(args[0].as_number() == Some(0.0)))
        }),
        single("Zero!", &[("zero", NUMBER)], NUMBER, |args| {
            match number(args, 0)? {
                n if n == 0.0 => Ok(Value::Number(n)),
                _ => Err("zero assertion failed".into()),
            }
        }),
        single("Integer?", &[("value", ANY)], BOOLEAN, |args| {
            Ok(Value::Boolean(args[0].as_number().is_some_and(is_integer)))
        }),
        single("Integer!", &[("integer", NUMBER)], NUMBER, |args| {
            match number(args, 0)? {
                n if is_integer(n) => Ok(Value::Number(n)),
                _ => Err("integer assertion failed".into()),
            }
        }),
        // Meta
        single(
            "If",
            &[
                ("condition", BOOLEAN),
                ("'then' clause", ANY),
                ("'else' clause", ANY),
            ],
            ANY,
            |args| Ok(if boolean(args, 0)? { args[1].clone() } else { args[2].clone() }),
        ),
        // Arithmetic
        binary_math("+", |args| finite(number(args, 0)? + number(args, 1)?)),
        binary_math("-", |args| finite(number(args, 1)? - number(args, 0)?)),
        binary_math("*", |args| finite(number(args, 0)? * number(args, 1)?)),
        binary_math("/", |args| match number(args, 0)? {
            divisor if divisor == 0.0 => Err("division by zero".into()),
            divisor => finite(number(args, 1)? / divisor),
        }),
        binary_math("Modulo", |args| match number(args, 0)? {
            divisor if divisor == 0.0 => Err("modulo by zero".into()),
            divisor => finite(number(args, 1)? % divisor),
        }),
        unary_math("Sqrt", |args| match number(args, 0)? {
            n if n < 0.0 => Err("sqrt of a negative number".into()),
            n => finite(n.sqrt()),
        }),
        unary_math("Ln", |args| match number(args, 0)? {
            n if n <= 0.0 => Err("log of a non-positive number".into()),
            n => finite(n.ln()),
        }),
        single("Log", &[("base", NUMBER), ("operand", NUMBER)], NUMBER, |args| {
            let base = number(args, 0)?;
            let n = number(args, 1)?;
            if base <= 0.0 || base == 1.0 {
                Err("invalid logarithm base".into())
            } else if n <= 0.0 {
                Err("log of a non-positive number".into())
            } else {
                finite(n.log(base))
            }
        }),
        unary_math("Exp", |args| finite(number(args, 0)?.exp())),
        unary_math("Sin", |args| finite(number(args, 0)?.sin())),
        unary_math("Cos", |args| finite(number(args, 0)?.cos())),
        unary_math("Tan", |args| finite(number(args, 0)?.tan())),
        unary_math("Asin", |args| match number(args, 0)? {
            n if !(-1.0..=1.0).contains(&n) => Err("asin argument out of range".into()),
            n => finite(n.asin()),
        }),
        unary_math("Acos", |args| match number(args, 0)? {
            n if !(-1.0..=1.0).contains(&n) => Err("acos argument out of range".into()),
            n => finite(n.acos()),
        }),
        unary_math("Atan", |args| finite(number(args, 0)?.atan())),
        unary_math("Floor", |args| finite(number(args, 0)?.floor())),
        unary_math("Ceiling", |args| finite(number(args, 0)?.ceil())),
        unary_math("Round", |args| finite(number(args, 0)?.round())),
        unary_math("Abs", |args| finite(number(args, 0)?.abs())),
        // Comparison; `< 3 X` asks whether X is below 3.
        comparison("==", |args| Ok(ordered(args, Ordering::is_eq))),
        comparison("!=", |args| Ok(ordered(args, Ordering::is_ne))),
        comparison("<", |args| Ok(ordered(args, Ordering::is_lt))),
        comparison(">", |args| Ok(ordered(args, Ordering::is_gt))),
        comparison("<=", |args| Ok(ordered(args, Ordering::is_le))),
        comparison(">=", |args| Ok(ordered(args, Ordering::is_ge))),
        // Logic
        single("Not", &[("operand", BOOLEAN)], BOOLEAN, |args| {
            Ok(Value::Boolean(!boolean(args, 0)?))
        }),
        logic("And", |args| Ok(Value::Boolean(boolean(args, 0)? && boolean(args, 1)?))),
        logic("Or", |args| Ok(Value::Boolean(boolean(args, 0)? || boolean(args, 1)?))),
        logic("Xor", |args| Ok(Value::Boolean(boolean(args, 0)? != boolean(args, 1)?))),
        // Lists
        single(
            "Push",
            &[("item to push", ANY), ("list to push to", LIST)],
            LIST,
            |args| {
                let mut items = list(args, 1)?.to_vec();
                items.push(args[0].clone());
                Ok(Value::list(items))
            },
        ),
        single("Empty", &[], LIST, |_| Ok(Value::list(Vec::new()))),
        single(
            "Range",
            &[("start", NUMBER), ("end", NUMBER)],
            LIST,
            |args| {
                let start = number(args, 0)?;
                let end = number(args, 1)?;
                let count = (end - start).ceil();
                if count.is_nan() || count > MAX_RANGE_LENGTH {
                    return Err(format!(
                        "range from {} to {} is too long",
                        format_number(start),
                        format_number(end)
                    ));
                }
                let count = count.max(0.0) as u64;
                let items = (0..count)
                    .rev()
                    .map(|idx| Value::Number(start + idx as f64))
                    .collect();
                Ok(Value::list(items))
            },
        ),
        single("Reverse", &[("list", LIST)], LIST, |args| {
            let mut items = list(args, 0)?.to_vec();
            items.reverse();
            Ok(Value::list(items))
        }),
        overloaded(
            "First",
            vec![
                sig(&[("list", LIST)], ANY, |args| {
                    list(args, 0)?
                        .last()
                        .cloned()
                        .ok_or_else(|| "attempt to get first item of empty list".into())
                }),
                sig(&[("string", STRING)], STRING, |args| {
                    let text = text(args, 0)?;
                    match text.units.first() {
                        Some(unit) => Ok(Value::String(Text::from_units(vec![*unit]))),
                        None => Err("attempt to get first character of empty string".into()),
                    }
                }),
            ],
        ),
        overloaded(
            "Rest",
            vec![
                sig(&[("list", LIST)], LIST, |args| {
                    let items = list(args, 0)?;
                    match items.split_last() {
                        Some((_, rest)) => Ok(Value::list(rest.to_vec())),
                        None => Err("attempt to get rest of empty list".into()),
                    }
                }),
                sig(&[("string", STRING)], STRING, |args| {
                    let text = text(args, 0)?;
                    match text.units.split_first() {
                        Some((_, rest)) => Ok(Value::String(Text::from_units(rest.to_vec()))),
                        None => Err("attempt to get rest of empty string".into()),
                    }
                }),
            ],
        ),
        overloaded(
            "Length",
            vec![
                sig(&[("list", LIST)], NUMBER, |args| {
                    Ok(Value::Number(list(args, 0)?.len() as f64))
                }),
                sig(&[("string", STRING)], NUMBER, |args| {
                    Ok(Value::Number(text(args, 0)?.len() as f64))
                }),
            ],
        ),
        overloaded(
            "Empty?",
            vec![
                sig(&[("list", LIST)], BOOLEAN, |args| {
                    Ok(Value::Boolean(list(args, 0)?.is_empty()))
                }),
                sig(&[("string", STRING)], BOOLEAN, |args| {
                    Ok(Value::Boolean(text(args, 0)?.is_empty()))
                }),
            ],
        ),
        // Strings
        single(
            "Join",
            &[("string", STRING), ("string", STRING)],
            STRING,
            |args| {
                let mut units = text(args, 0)?.units.to_vec();
                units.extend_from_slice(&text(args, 1)?.units);
                Ok(Value::String(Text::from_units(units)))
            },
        ),
        single(
            "Substring",
            &[("start", NUMBER), ("end", NUMBER), ("string", STRING)],
            STRING,
            |args| {
                let units = &text(args, 2)?.units;
                let start = index(number(args, 0)?)?;
                let end = index(number(args, 1)?)?;
                if start > end || end >= units.len() {
                    return Err(format!(
                        "range {start}..{end} out of bounds for string of length {}",
                        units.len()
                    ));
                }
                Ok(Value::String(Text::from_units(units[start..=end].to_vec())))
            },
        ),
        single(
            "Split",
            &[("separator", STRING), ("string", STRING)],
            LIST,
            |args| {
                let separator = &text(args, 0)?.units;
                let units = &text(args, 1)?.units;
                let mut pieces: Vec<Value> = split_units(units, separator)
                    .into_iter()
                    .map(|piece| Value::String(Text::from_units(piece.to_vec())))
                    .collect();
                pieces.reverse();
                Ok(Value::list(pieces))
            },
        ),
        single("Uppercase", &[("string", STRING)], STRING, |args| {
            Ok(Value::string(&text(args, 0)?.to_string_lossy().to_uppercase()))
        }),
        single("Lowercase", &[("string", STRING)], STRING, |args| {
            Ok(Value::string(&text(args, 0)?.to_string_lossy().to_lowercase()))
        }),
        single("Ordinal", &[("character", STRING)], NUMBER, |args| {
            match &*text(args, 0)?.units {
                [unit] => Ok(Value::Number(f64::from(*unit))),
                _ => Err("expected a string of exactly one character".into()),
            }
        }),
        single("Character", &[("ordinal", NUMBER)], STRING, |args| {
            let n = number(args, 0)?;
            if !is_integer(n) || !(0.0..=f64::from(u16::MAX)).contains(&n) {
                return Err(format!("{n} is not a valid character code"));
            }
            Ok(Value::String(Text::from_units(vec![n as u16])))
        }),
        single("Number", &[("string", STRING)], NUMBER, |args| {
            let source = text(args, 0)?.to_string_lossy();
            match source.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(format!("cannot parse \"{source}\" as a number")),
            }
        }),
        // Tables
        single(
            "Insert",
            &[("key", ANY), ("value", ANY), ("table", TABLE)],
            TABLE,
            |args| {
                let key = table_key(&args[0])?;
                Ok(Value::Table(table(args, 2)?.insert(key, args[1].clone())))
            },
        ),
        single("Remove", &[("key", ANY), ("table", TABLE)], TABLE, |args| {
            let key = table_key(&args[0])?;
            Ok(Value::Table(table(args, 1)?.remove(&key)))
        }),
        single("Has", &[("key", ANY), ("table", TABLE)], BOOLEAN, |args| {
            let key = table_key(&args[0])?;
            Ok(Value::Boolean(table(args, 1)?.contains_key(&key)))
        }),
        single(".", &[("key", ANY), ("table", TABLE)], ANY, |args| {
            let key = table_key(&args[0])?;
            table(args, 1)?
                .get(&key)
                .cloned()
                .ok_or_else(|| format!("key {key} not found in table"))
        }),
        single("Keys", &[("table", TABLE)], LIST, |args| {
            let mut keys: Vec<Value> = table(args, 0)?.keys().cloned().collect();
            keys.reverse();
            Ok(Value::list(keys))
        }),
        single("Values", &[("table", TABLE)], LIST, |args| {
            let mut values: Vec<Value> = table(args, 0)?.values().cloned().collect();
            values.reverse();
            Ok(Value::list(values))
        }),
    ]
});

static BY_NAME: LazyLock<HashMap<&'static str, &'static Builtin>> = LazyLock::new(|| {
    let entries: &'static [Entry] = BUILTINS.as_slice();
    entries
        .iter()
        .map(|entry| (entry.name, &entry.builtin))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BY_NAME.get(name).copied()
}

fn is_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

fn finite(n: f64) -> Result<Value, String> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err("result is not a finite number".into())
    }
}

fn ordered(args: &[Value], test: fn(Ordering) -> bool) -> Value {
    Value::Boolean(test(compare(&args[1], &args[0])))
}

fn operand_error(idx: usize, kind: &str) -> String {
    format!("operand {idx} is not a {kind}")
}

fn number(args: &[Value], idx: usize) -> Result<f64, String> {
    args.get(idx)
        .and_then(Value::as_number)
        .ok_or_else(|| operand_error(idx, "number"))
}

fn boolean(args: &[Value], idx: usize) -> Result<bool, String> {
    args.get(idx)
        .and_then(Value::as_bool)
        .ok_or_else(|| operand_error(idx, "boolean"))
}

fn text(args: &[Value], idx: usize) -> Result<&Text, String> {
    args.get(idx)
        .and_then(Value::as_text)
        .ok_or_else(|| operand_error(idx, "string"))
}

fn list(args: &[Value], idx: usize) -> Result<&[Value], String> {
    args.get(idx)
        .and_then(Value::as_list)
        .map(|items| items.as_slice())
        .ok_or_else(|| operand_error(idx, "list"))
}

fn table(args: &[Value], idx: usize) -> Result<&Table, String> {
    args.get(idx)
        .and_then(Value::as_table)
        .ok_or_else(|| operand_error(idx, "table"))
}

fn index(n: f64) -> Result<usize, String> {
    if is_integer(n) && n >= 0.0 {
        Ok(n as usize)
    } else {
        Err(format!("{n} is not a valid index"))
    }
}

/// Boxes and blocks only order by identity, so they cannot key a table.
pub(crate) fn table_key(key: &Value) -> Result<Value, String> {
    match key.kind() {
        ValueKind::Box | ValueKind::Block => {
            Err(format!("cannot use a {} as a table key", key.kind()))
        }
        _ => Ok(key.clone()),
    }
}

/// Splits on every occurrence of `separator`; an empty separator splits into
/// single code units.
fn split_units<'a>(units: &'a [u16], separator: &[u16]) -> Vec<&'a [u16]> {
    if separator.is_empty() {
        return units.chunks(1).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx + separator.len() <= units.len() {
        if units[idx..].starts_with(separator) {
            pieces.push(&units[start..idx]);
            idx += separator.len();
            start = idx;
        } else {
            idx += 1;
        }
    }
    pieces.push(&units[start..]);
    pieces
}
