//! Parser for the serialized domain syntax.
//!
//! Two stages: nom combinators turn the text into a flat prefix token list,
//! then [`reduce`] resolves connective arity into a single [`Expr`].
//! Every failure is reported as [`DomainError::Unsupported`].

use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag};
use nom::character::complete::{char, digit0, digit1, multispace0, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::error::{ErrorKind, ParseError};
use nom::multi::separated_list0;
use nom::sequence::{delimited, pair, terminated, tuple};
use nom::{IResult, Parser};
use tracing::{debug, instrument};

use crate::domain::ast::{Condition, Connective, Domain, Expr, FieldPath, Token};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::Value;

/// Parser behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Join several complete top-level expressions with an implicit AND
    /// instead of rejecting them as trailing tokens.
    pub implicit_and: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { implicit_and: true }
    }
}

/// Parse domain text with default options.
pub fn parse_domain(text: &str) -> DomainResult<Domain> {
    parse_domain_with(text, ParseOptions::default())
}

#[instrument(level = "debug", skip(text))]
pub fn parse_domain_with(text: &str, options: ParseOptions) -> DomainResult<Domain> {
    if text.trim().is_empty() {
        return Ok(Domain::empty());
    }
    let tokens = tokenize(text)?;
    debug!("tokenized {} tokens", tokens.len());
    reduce(tokens, options)
}

/// Lex and parse the list syntax into prefix tokens.
pub fn tokenize(text: &str) -> DomainResult<Vec<Token>> {
    match all_consuming(ws(domain_list))(text) {
        Ok((_, tokens)) => Ok(tokens),
        Err(e) => Err(DomainError::unsupported(format!("syntax error: {e}"))),
    }
}

/// Deepest accepted nesting, for connectives and for list values alike.
///
/// A chain of the same AND/OR connective counts as one level.
pub const MAX_DEPTH: usize = 64;

/// Connective still waiting for operands.
struct Pending {
    connective: Connective,
    received: usize,
    operands: Vec<Expr>,
    depth: usize,
}

impl Pending {
    fn new(connective: Connective) -> Self {
        Self {
            connective,
            received: 0,
            operands: Vec::with_capacity(connective.arity()),
            depth: 0,
        }
    }

    fn is_complete(&self) -> bool {
        self.received == self.connective.arity()
    }

    /// Take an operand; an AND inside AND (OR inside OR) is merged.
    fn push(&mut self, expr: Expr, depth: usize) {
        self.received += 1;
        match expr {
            Expr::Branch {
                connective,
                operands,
            } if connective == self.connective && connective != Connective::Not => {
                self.operands.extend(operands);
                self.depth = self.depth.max(depth);
            }
            other => {
                self.operands.push(other);
                self.depth = self.depth.max(depth + 1);
            }
        }
    }
}

/// Resolve connective arity over the token sequence.
///
/// Fails on missing operands and on nesting deeper than [`MAX_DEPTH`];
/// several complete expressions at top level are joined by an implicit AND
/// when `options.implicit_and` is set.
pub fn reduce(tokens: Vec<Token>, options: ParseOptions) -> DomainResult<Domain> {
    let mut pending: Vec<Pending> = Vec::new();
    let mut top = Vec::new();
    for token in tokens {
        if pending.is_empty() && !top.is_empty() && !options.implicit_and {
            return Err(DomainError::unsupported(format!(
                "trailing token after complete expression: {token}"
            )));
        }
        let (mut expr, mut depth) = match token {
            Token::Connective(connective) => {
                pending.push(Pending::new(connective));
                continue;
            }
            Token::Condition(cond) => (Expr::Condition(cond), 1),
        };

        // hand finished expressions up until a connective still lacks operands
        loop {
            let Some(parent) = pending.last_mut() else {
                top.push(expr);
                break;
            };
            parent.push(expr, depth);
            if !parent.is_complete() {
                break;
            }
            let Some(done) = pending.pop() else { break };
            if done.depth > MAX_DEPTH {
                return Err(DomainError::unsupported(format!(
                    "connectives nested deeper than {MAX_DEPTH} levels"
                )));
            }
            depth = done.depth;
            expr = Expr::Branch {
                connective: done.connective,
                operands: done.operands,
            };
        }
    }

    if let Some(open) = pending.last() {
        return Err(DomainError::unsupported(format!(
            "connective \"{}\" expects {} operands, found {}",
            open.connective.symbol(),
            open.connective.arity(),
            open.received
        )));
    }

    let root = match top.len() {
        0 => None,
        1 => top.pop(),
        _ => Some(Expr::and(top)),
    };
    Ok(Domain::new(root))
}

/// A combinator that takes a parser `inner` and produces a parser that also consumes both leading and
/// trailing whitespace, returning the output of `inner`.
fn ws<'a, F, O, E: ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: Parser<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

/// `[` items `]` with an optional trailing comma.
fn list_of<'a, O, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>>
where
    F: Parser<&'a str, O, nom::error::Error<&'a str>>,
{
    delimited(
        ws(char('[')),
        terminated(separated_list0(ws(char(',')), item), opt(ws(char(',')))),
        ws(char(']')),
    )
}

fn domain_list(input: &str) -> IResult<&str, Vec<Token>> {
    list_of(token)(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        map(condition, Token::Condition),
        map(map_res(string, connective), Token::Connective),
    ))(input)
}

fn connective(symbol: String) -> Result<Connective, String> {
    Connective::from_symbol(&symbol).ok_or(symbol)
}

/// Leaf triple written as a tuple or a list.
fn condition(input: &str) -> IResult<&str, Condition> {
    alt((
        delimited(ws(char('(')), condition_body, ws(char(')'))),
        delimited(ws(char('[')), condition_body, ws(char(']'))),
    ))(input)
}

fn condition_body(input: &str) -> IResult<&str, Condition> {
    map(
        tuple((
            ws(field_path),
            char(','),
            ws(string),
            char(','),
            ws(literal),
            opt(ws(char(','))),
        )),
        |(path, _, operator, _, value, _)| Condition {
            path,
            operator,
            value,
        },
    )(input)
}

fn field_path(input: &str) -> IResult<&str, FieldPath> {
    alt((
        map(string, FieldPath::Path),
        map(map_res(digit1, |s: &str| s.parse::<i64>()), FieldPath::Constant),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    literal_at(input, 0)
}

fn literal_at<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Value> {
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let nested = move |i: &'a str| literal_at(i, depth + 1);
    alt((
        value(Value::None, tag("None")),
        value(Value::Bool(true), tag("True")),
        value(Value::Bool(false), tag("False")),
        map(string, Value::Str),
        number,
        map(list_of(ws(nested)), Value::List),
        map(tuple_of(ws(nested)), Value::List),
    ))(input)
}

/// `(` items `)` with an optional trailing comma.
fn tuple_of<'a, O, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>>
where
    F: Parser<&'a str, O, nom::error::Error<&'a str>>,
{
    delimited(
        ws(char('(')),
        terminated(separated_list0(ws(char(',')), item), opt(ws(char(',')))),
        ws(char(')')),
    )
}

fn number(input: &str) -> IResult<&str, Value> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit0)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |text: &str| {
            if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
                text.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
            } else {
                text.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
            }
        },
    )(input)
}

fn string(input: &str) -> IResult<&str, String> {
    alt((quoted('"', "\\\""), quoted('\'', "\\'")))(input)
}

fn quoted<'a>(quote: char, stop: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    map(
        delimited(
            char(quote),
            opt(escaped_transform(
                is_not(stop),
                '\\',
                alt((
                    value("\\", char('\\')),
                    value("\"", char('"')),
                    value("'", char('\'')),
                    value("\n", char('n')),
                    value("\t", char('t')),
                    value("\r", char('r')),
                )),
            )),
            char(quote),
        ),
        Option::unwrap_or_default,
    )
}
