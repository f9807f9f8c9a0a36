// ABOUTME: The L0 reader collaborator: `parse_string_all(arena, bytes)` returning a
// ABOUTME: proper list of top-level forms, built with `nom` combinators.
// ABOUTME: Out of the core's 70-80% difficulty share, but the core has nothing to
// ABOUTME: evaluate without it.

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{opt, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::value::{Arena, Value};

/// Parse-status kinds: `OK` is represented by `Result::Ok`, the remaining
/// four are carried by `ParseStatus::kind` on the error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatusKind {
    UnexpectedEof,
    InvalidSyntax,
    Memory,
    Runtime,
}

/// The shared parse-status record a failed read produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatus {
    pub kind: ParseStatusKind,
    pub message: String,
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}): {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParseStatus {}

/// 1-based line/column of `needle` (a suffix of `haystack`) within `haystack`.
fn line_col(haystack: &str, needle: &str) -> (u32, u32) {
    let consumed = haystack.len() - needle.len();
    let prefix = &haystack[..consumed];
    let line = 1 + prefix.matches('\n').count() as u32;
    let col = match prefix.rfind('\n') {
        Some(idx) => (prefix.len() - idx) as u32,
        None => prefix.len() as u32 + 1,
    };
    (line, col)
}

fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((
        value((), multispace1),
        value((), comment),
    )))
    .map(|_| ())
    .parse(input)
}

/// A `;`-prefixed comment running to end of line (no distinction between `;`, `;;`,
/// `;;;` at this layer — doc-comment extraction is a CLI/help-system concern the core
/// does not carry).
fn comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = nom::bytes::complete::take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        alt((
            recognize((digit1, opt((char('.'), opt(digit1))))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(input)?;

    if text.contains('.') {
        let n: f64 = text.parse().map_err(|_| {
            nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((rest, Value::Float(n)))
    } else {
        let n: i64 = text.parse().map_err(|_| {
            nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((rest, Value::Int(n)))
    }
}

fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)
}

const SYMBOL_START: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/%<>=!?";

fn parse_symbol_str(input: &str) -> IResult<&str, String> {
    let (input, first) = one_of(SYMBOL_START)(input)?;
    let (input, rest) = take_while1::<_, _, nom::error::Error<_>>(|c: char| {
        c.is_alphanumeric() || "-_?!<>=+*/%".contains(c)
    })(input)
    .unwrap_or((input, ""));
    let mut s = String::new();
    s.push(first);
    s.push_str(rest);
    Ok((input, s))
}

fn parse_string<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = char('"')(input)?;
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, arena.string("")));
    }
    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nt"))(input)?;
    let (input, _) = char('"')(input)?;

    let mut result = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => {}
            }
        } else {
            result.push(c);
        }
    }
    Ok((input, arena.string(&result)))
}

fn wrap2<'a>(arena: &Arena, head: &str, inner: Value) -> Value {
    arena.list(&[arena.symbol(head), inner])
}

fn parse_quote<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = char('\'')(input)?;
    let (input, expr) = parse_expr(arena, input)?;
    Ok((input, wrap2(arena, "quote", expr)))
}

fn parse_quasiquote<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = char('`')(input)?;
    let (input, expr) = parse_expr(arena, input)?;
    Ok((input, wrap2(arena, "quasiquote", expr)))
}

fn parse_unquote<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = char(',')(input)?;
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('@')(input) {
        let (input, expr) = parse_expr(arena, input)?;
        return Ok((input, wrap2(arena, "unquote-splicing", expr)));
    }
    let (input, expr) = parse_expr(arena, input)?;
    Ok((input, wrap2(arena, "unquote", expr)))
}

fn parse_list<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = char('(')(input)?;
    let (mut remaining, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(remaining) {
            return Ok((rest, arena.list(&items)));
        }
        // A dotted tail: (a b . c)
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('.')(remaining) {
            if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
                let (rest, _) = ws_and_comments(rest)?;
                let (rest, tail) = parse_expr(arena, rest)?;
                let (rest, _) = ws_and_comments(rest)?;
                let (rest, _) = char(')')(rest)?;
                let mut acc = tail;
                for item in items.into_iter().rev() {
                    acc = arena.cons(item, acc);
                }
                return Ok((rest, acc));
            }
        }
        let (rest, expr) = parse_expr(arena, remaining)?;
        items.push(expr);
        let (rest, _) = ws_and_comments(rest)?;
        remaining = rest;
    }
}

fn parse_expr<'a>(arena: &'a Arena, input: &'a str) -> IResult<&'a str, Value> {
    let (input, _) = ws_and_comments(input)?;
    alt((
        |i| parse_quote(arena, i),
        |i| parse_quasiquote(arena, i),
        |i| parse_unquote(arena, i),
        |i| parse_list(arena, i),
        parse_bool,
        parse_number,
        |i| parse_string(arena, i),
        |i| parse_symbol_str(i).map(|(i, s)| (i, arena.symbol(&s))),
    ))
    .parse(input)
}

/// Parse every top-level form in `source`, returning them as a proper list.
pub fn parse_string_all(arena: &Arena, source: &str) -> Result<Value, ParseStatus> {
    let mut remaining = source;
    let mut forms = Vec::new();
    loop {
        let (rest, _) = ws_and_comments(remaining).unwrap_or((remaining, ()));
        if rest.is_empty() {
            return Ok(arena.list(&forms));
        }
        match parse_expr(arena, rest) {
            Ok((after, value)) => {
                forms.push(value);
                remaining = after;
            }
            Err(nom::Err::Incomplete(_)) => {
                let (line, col) = line_col(source, rest);
                return Err(ParseStatus {
                    kind: ParseStatusKind::UnexpectedEof,
                    message: "unexpected end of input".to_string(),
                    line,
                    col,
                });
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let (line, col) = line_col(source, e.input);
                return Err(ParseStatus {
                    kind: ParseStatusKind::InvalidSyntax,
                    message: format!("invalid syntax near '{}'", first_token(e.input)),
                    line,
                    col,
                });
            }
        }
    }
}

fn first_token(s: &str) -> &str {
    let end = s.find(char::is_whitespace).unwrap_or_else(|| s.len().min(20));
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(src: &str) -> Vec<Value> {
        let arena = Arena::new();
        parse_string_all(&arena, src).unwrap().list_to_vec().unwrap()
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(forms("42")[0], Value::Int(42));
        assert_eq!(forms("-42")[0], Value::Int(-42));
        assert_eq!(forms("2.5")[0], Value::Float(2.5));
        assert_eq!(forms(".5")[0], Value::Float(0.5));
    }

    #[test]
    fn parses_bool_and_symbol() {
        assert_eq!(forms("#t")[0], Value::Bool(true));
        assert_eq!(forms("#f")[0], Value::Bool(false));
        assert_eq!(forms("foo-bar?")[0].as_symbol(), Some("foo-bar?"));
    }

    #[test]
    fn parses_nested_lists_and_quote_sugar() {
        let arena = Arena::new();
        let parsed = parse_string_all(&arena, "'(1 (2 3))").unwrap();
        let top = parsed.list_to_vec().unwrap();
        assert_eq!(top[0].to_string(), "(quote (1 (2 3)))");
    }

    #[test]
    fn parses_dotted_pair() {
        let arena = Arena::new();
        let parsed = parse_string_all(&arena, "(1 . 2)").unwrap();
        let top = parsed.list_to_vec().unwrap();
        assert_eq!(top[0].to_string(), "(1 . 2)");
    }

    #[test]
    fn multiple_top_level_forms() {
        assert_eq!(forms("1 2 3").len(), 3);
    }

    #[test]
    fn reports_line_and_column_on_bad_syntax() {
        let arena = Arena::new();
        let status = parse_string_all(&arena, "(foo)\n(bar ,)").unwrap_err();
        assert_eq!(status.kind, ParseStatusKind::InvalidSyntax);
        assert_eq!(status.line, 2);
    }
}
