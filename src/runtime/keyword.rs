use crate::runtime::value::ValueKind;
use std::fmt;

/// Words the engine implements itself rather than through the builtin registry,
/// because they bind names, run blocks, touch the whole stack or report output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Def,
    Let,
    Set,
    List,
    Table,
    Box,
    Unbox,
    Stack,
    Clear,
    Error,
    Stop,
    Begin,
    Show,
    Print,
    Put,
    Regex,
    RegexMatch,
    /// `Number?` and friends: pop a value, push whether it has the kind.
    Is(ValueKind),
    /// `Number!` and friends: fail unless the top of the stack has the kind.
    Assert(ValueKind),
}

fn kind_named(name: &str) -> Option<ValueKind> {
    Some(match name {
        "Number" => ValueKind::Number,
        "String" => ValueKind::String,
        "Symbol" => ValueKind::Symbol,
        "Boolean" => ValueKind::Boolean,
        "List" => ValueKind::List,
        "Box" => ValueKind::Box,
        "Table" => ValueKind::Table,
        "Block" => ValueKind::Block,
        _ => return None,
    })
}

impl Keyword {
    pub fn from_name(name: &str) -> Option<Self> {
        let keyword = match name {
            "Def" => Keyword::Def,
            "Let" => Keyword::Let,
            "Set" => Keyword::Set,
            "List" => Keyword::List,
            "Table" => Keyword::Table,
            "Box" => Keyword::Box,
            "Unbox" => Keyword::Unbox,
            "Stack" => Keyword::Stack,
            "Clear" => Keyword::Clear,
            "Error" => Keyword::Error,
            "Stop" => Keyword::Stop,
            "Begin" => Keyword::Begin,
            "Show" => Keyword::Show,
            "Print" => Keyword::Print,
            "Put" => Keyword::Put,
            "Regex" => Keyword::Regex,
            "Regex-match" => Keyword::RegexMatch,
            _ => {
                if let Some(base) = name.strip_suffix('?') {
                    return kind_named(base).map(Keyword::Is);
                }
                return name
                    .strip_suffix('!')
                    .and_then(kind_named)
                    .map(Keyword::Assert);
            }
        };
        Some(keyword)
    }

    /// Keywords that take the name right before them as a raw identifier.
    pub fn takes_name(self) -> bool {
        matches!(self, Keyword::Def | Keyword::Let | Keyword::Set)
    }
}

fn kind_title(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Number => "Number",
        ValueKind::String => "String",
        ValueKind::Symbol => "Symbol",
        ValueKind::Boolean => "Boolean",
        ValueKind::List => "List",
        ValueKind::Box => "Box",
        ValueKind::Table => "Table",
        ValueKind::Block => "Block",
        ValueKind::Identifier => "Identifier",
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Keyword::Def => "Def",
            Keyword::Let => "Let",
            Keyword::Set => "Set",
            Keyword::List => "List",
            Keyword::Table => "Table",
            Keyword::Box => "Box",
            Keyword::Unbox => "Unbox",
            Keyword::Stack => "Stack",
            Keyword::Clear => "Clear",
            Keyword::Error => "Error",
            Keyword::Stop => "Stop",
            Keyword::Begin => "Begin",
            Keyword::Show => "Show",
            Keyword::Print => "Print",
            Keyword::Put => "Put",
            Keyword::Regex => "Regex",
            Keyword::RegexMatch => "Regex-match",
            Keyword::Is(kind) => return write!(f, "{}?", kind_title(*kind)),
            Keyword::Assert(kind) => return write!(f, "{}!", kind_title(*kind)),
        };
        f.write_str(name)
    }
}
