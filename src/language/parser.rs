//! Reference syntax frontend: source text to concrete syntax tree.
//!
//! The interpreter core only needs something implementing [`SyntaxFrontend`]; this
//! module provides the default one so programs can be run straight from text.

use crate::language::{
    cst::{Node, NodeKind},
    span::{LineIndex, Span},
};
use crate::stack::ensure_sufficient_stack;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace0, satisfy},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, tuple},
    IResult,
};

/// Blocks nested deeper than this are reported as errors instead of parsed.
pub const MAX_BLOCK_DEPTH: usize = 1000;

/// Produces a concrete syntax tree from source text. Never fails: syntax errors are
/// represented as `ERROR` or missing nodes in the returned tree.
pub trait SyntaxFrontend {
    fn parse(&self, source: &str) -> Node;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CognateSyntax;

impl SyntaxFrontend for CognateSyntax {
    fn parse(&self, source: &str) -> Node {
        parse_source(source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Identifier,
    Number,
    String,
    Boolean,
    Symbol,
    Comment,
    Semicolon,
    Open,
    Close,
    Unknown,
}

#[derive(Debug, Clone)]
struct LexToken<'a> {
    lexeme: Lexeme,
    text: &'a str,
    span: Span,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '?' | '!' | '\'' | '_')
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | '.' | '^')
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("~~"), take_while(|c| c != '\n')))(input)
}

fn multiline_comment(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('~'), take_until("~"), char('~')))(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        many0(alt((is_not("\\\""), recognize(pair(char('\\'), anychar))))),
        char('"'),
    ))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

/// Digits run straight into letters, e.g. `1e5` or `3rd`.
fn malformed_number(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        number,
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn symbol(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('\\'), take_while1(is_word_char)))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(is_word_char),
    ))(input)
}

fn operator(input: &str) -> IResult<&str, &str> {
    take_while1(is_operator_char)(input)
}

fn classify_word(text: &str) -> Lexeme {
    if text.starts_with(|c: char| c.is_ascii_lowercase()) {
        // Lowercase words are informal prose, e.g. `Move - 1 N discs from A to B`.
        return Lexeme::Comment;
    }
    if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
        Lexeme::Boolean
    } else {
        Lexeme::Identifier
    }
}

fn lexeme(input: &str) -> IResult<&str, (Lexeme, &str)> {
    alt((
        map(line_comment, |text| (Lexeme::Comment, text)),
        map(multiline_comment, |text| (Lexeme::Comment, text)),
        map(string_literal, |text| (Lexeme::String, text)),
        map(malformed_number, |text| (Lexeme::Unknown, text)),
        map(number, |text| (Lexeme::Number, text)),
        map(symbol, |text| (Lexeme::Symbol, text)),
        map(word, |text| (classify_word(text), text)),
        map(operator, |text| (Lexeme::Identifier, text)),
        map(tag(";"), |text| (Lexeme::Semicolon, text)),
        map(tag("("), |text| (Lexeme::Open, text)),
        map(tag(")"), |text| (Lexeme::Close, text)),
    ))(input)
}

/// Consumes input nothing else accepts. An unterminated string or multiline comment
/// swallows the rest of the source.
fn unknown(input: &str) -> (&str, (Lexeme, &str)) {
    let len = if input.starts_with('"') || input.starts_with('~') {
        input.len()
    } else {
        input.chars().next().map_or(0, char::len_utf8)
    };
    (&input[len..], (Lexeme::Unknown, &input[..len]))
}

fn tokenize(source: &str) -> Vec<LexToken<'_>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    loop {
        let (trimmed, _) = multispace0::<_, nom::error::Error<&str>>(rest).unwrap_or((rest, ""));
        rest = trimmed;
        if rest.is_empty() {
            break;
        }
        let start = source.len() - rest.len();
        let (remaining, (lexeme, text)) = lexeme(rest).unwrap_or_else(|_| unknown(rest));
        tokens.push(LexToken {
            lexeme,
            text,
            span: Span::new(start, start + text.len()),
        });
        rest = remaining;
    }
    tokens
}

pub fn parse_source(source: &str) -> Node {
    let mut builder = TreeBuilder {
        tokens: tokenize(source),
        cursor: 0,
        depth: 0,
        lines: LineIndex::new(source),
        source_len: source.len(),
    };
    let children = builder.statements(false);
    Node::branch(
        NodeKind::SourceFile,
        Span::new(0, source.len()),
        Default::default(),
        children,
    )
}

struct TreeBuilder<'a> {
    tokens: Vec<LexToken<'a>>,
    cursor: usize,
    depth: usize,
    lines: LineIndex,
    source_len: usize,
}

impl<'a> TreeBuilder<'a> {
    fn peek(&self) -> Option<&LexToken<'a>> {
        self.tokens.get(self.cursor)
    }

    fn leaf(&self, kind: NodeKind, token: &LexToken<'_>) -> Node {
        Node::leaf(
            kind,
            token.text,
            token.span,
            self.lines.position(token.span.start),
        )
    }

    /// Parses statements until end of input, or until a `)` when `nested`.
    fn statements(&mut self, nested: bool) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut items = Vec::new();
        while let Some(token) = self.peek().cloned() {
            match token.lexeme {
                Lexeme::Semicolon => {
                    self.cursor += 1;
                    self.flush(&mut items, &mut nodes);
                }
                Lexeme::Close if nested => break,
                Lexeme::Close => {
                    self.cursor += 1;
                    items.push(self.leaf(NodeKind::Error, &token));
                }
                Lexeme::Open if self.depth >= MAX_BLOCK_DEPTH => {
                    items.push(self.too_deep(&token));
                }
                Lexeme::Open => {
                    self.depth += 1;
                    let block = ensure_sufficient_stack(|| self.block());
                    self.depth -= 1;
                    items.push(block);
                }
                lexeme => {
                    self.cursor += 1;
                    let kind = match lexeme {
                        Lexeme::Identifier => NodeKind::Identifier,
                        Lexeme::Number => NodeKind::Number,
                        Lexeme::String => NodeKind::String,
                        Lexeme::Boolean => NodeKind::Boolean,
                        Lexeme::Symbol => NodeKind::Symbol,
                        Lexeme::Comment => NodeKind::Comment,
                        _ => NodeKind::Error,
                    };
                    items.push(self.leaf(kind, &token));
                }
            }
        }
        self.flush(&mut items, &mut nodes);
        nodes
    }

    fn flush(&self, items: &mut Vec<Node>, nodes: &mut Vec<Node>) {
        if items.iter().all(|item| item.kind == NodeKind::Comment) {
            nodes.append(items);
            return;
        }
        let children = std::mem::take(items);
        let start = children.first().map_or(0, |node| node.span.start);
        let end = children.last().map_or(start, |node| node.span.end);
        let position = children.first().map(|node| node.position).unwrap_or_default();
        nodes.push(Node::branch(
            NodeKind::Statement,
            Span::new(start, end),
            position,
            children,
        ));
    }

    /// Skips a block at `open` and everything inside it, leaving an error node.
    fn too_deep(&mut self, open: &LexToken<'_>) -> Node {
        let mut nesting = 0usize;
        let mut end = open.span.end;
        while let Some(token) = self.peek() {
            end = token.span.end;
            match token.lexeme {
                Lexeme::Open => nesting += 1,
                Lexeme::Close => nesting -= 1,
                _ => {}
            }
            self.cursor += 1;
            if nesting == 0 {
                break;
            }
        }
        let mut node = self.leaf(NodeKind::Error, open);
        node.span = Span::new(open.span.start, end);
        node
    }

    fn block(&mut self) -> Node {
        let open = self.tokens[self.cursor].span;
        self.cursor += 1;
        let mut children = self.statements(true);
        let end = match self.peek() {
            Some(token) if token.lexeme == Lexeme::Close => {
                let end = token.span.end;
                self.cursor += 1;
                end
            }
            _ => {
                children.push(Node::missing(
                    ")",
                    self.source_len,
                    self.lines.position(self.source_len),
                ));
                self.source_len
            }
        };
        Node::branch(
            NodeKind::Block,
            Span::new(open.start, end),
            self.lines.position(open.start),
            children,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(node: &Node) -> Vec<NodeKind> {
        node.children.iter().map(|child| child.kind).collect()
    }

    #[test]
    fn statements_split_on_semicolons() {
        let tree = parse_source("Print \"hello world\";\nPrint + 1 2");
        assert_eq!(kinds(&tree), vec![NodeKind::Statement, NodeKind::Statement]);
        assert_eq!(
            kinds(&tree.children[1]),
            vec![
                NodeKind::Identifier,
                NodeKind::Identifier,
                NodeKind::Number,
                NodeKind::Number
            ]
        );
        assert_eq!(tree.children[1].children[1].text, "+");
        assert_eq!(tree.children[1].position.row, 1);
    }

    #[test]
    fn lowercase_words_and_tildes_are_comments() {
        let tree = parse_source("~~ heading\nLet N be the Number! of discs; ~ note ~");
        let statement = tree
            .children
            .iter()
            .find(|node| node.kind == NodeKind::Statement)
            .expect("statement");
        let words: Vec<_> = statement
            .children
            .iter()
            .filter(|node| node.kind != NodeKind::Comment)
            .map(|node| node.text.as_str())
            .collect();
        assert_eq!(words, vec!["Let", "N", "Number!"]);
        assert!(!tree.has_errors());
    }

    #[test]
    fn literals_are_classified() {
        let tree = parse_source(r#"True \Sym -2.5 "a\"b" Regex-match"#);
        assert_eq!(
            kinds(&tree.children[0]),
            vec![
                NodeKind::Boolean,
                NodeKind::Symbol,
                NodeKind::Number,
                NodeKind::String,
                NodeKind::Identifier
            ]
        );
        assert_eq!(tree.children[0].children[3].text, r#""a\"b""#);
    }

    #[test]
    fn blocks_nest_statements() {
        let tree = parse_source("Def Foo (Let X; + X 1);");
        let block = &tree.children[0].children[2];
        assert_eq!(block.kind, NodeKind::Block);
        assert_eq!(kinds(block), vec![NodeKind::Statement, NodeKind::Statement]);
    }

    #[test]
    fn unclosed_block_gets_missing_node() {
        let tree = parse_source("Print (1 2");
        let block = &tree.children[0].children[1];
        let missing = block.children.last().expect("missing node");
        assert!(missing.missing);
        assert_eq!(missing.text, ")");
    }

    #[test]
    fn stray_characters_become_error_nodes() {
        let tree = parse_source("Print 1 @; )");
        assert!(tree.has_errors());
        let errors: Vec<_> = tree
            .walk()
            .filter(|node| node.kind == NodeKind::Error)
            .map(|node| node.text.as_str())
            .collect();
        assert_eq!(errors, vec!["@", ")"]);
    }

    #[test]
    fn numbers_glued_to_letters_are_errors() {
        let tree = parse_source("Print 1e5; Print 2");
        assert_eq!(tree.children[0].children[1].kind, NodeKind::Error);
        assert_eq!(tree.children[0].children[1].text, "1e5");
        assert_eq!(kinds(&tree.children[1]), vec![NodeKind::Identifier, NodeKind::Number]);
    }

    #[test]
    fn blocks_past_the_depth_limit_are_skipped() {
        let depth = MAX_BLOCK_DEPTH * 5;
        let source = format!("{}1{}; Print 2", "(".repeat(depth), ")".repeat(depth));
        let tree = parse_source(&source);
        let errors: Vec<_> = tree
            .walk()
            .filter(|node| node.kind == NodeKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "(");
        assert_eq!(errors[0].span.start, MAX_BLOCK_DEPTH);
        assert_eq!(errors[0].span.end, 2 * depth + 1 - MAX_BLOCK_DEPTH);
        assert_eq!(tree.children.len(), 2);
    }
}
