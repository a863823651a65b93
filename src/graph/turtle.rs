//! Turtle parser with statement-level error recovery.
//!
//! Parsing happens in two passes per statement:
//!
//! ```text
//! source ─▶ nom parser ─▶ Statement (raw, prefixed names unresolved)
//!                              │
//!                              ▼
//!                     Emitter (prefixes, base, blank nodes) ─▶ triples
//! ```
//!
//! A statement that fails either pass is recorded as a [`SyntaxError`] and
//! skipped up to the next top-level `.`; the statements around it still
//! produce their triples. Supported: `@prefix`/`@base` and their SPARQL
//! forms, IRIs, prefixed names, `a`, blank node labels, `[ ]` property lists,
//! `( )` collections, all four string forms with escapes, language tags,
//! datatypes, numbers and booleans.

use crate::core::types::{is_absolute_iri, Identifier, Literal, Term};
use crate::graph::store::Triple;
use crate::graph::vocab;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace1, one_of, satisfy},
    combinator::{cut, map, not, opt, recognize, value},
    error::{context, ErrorKind, ParseError, VerboseError, VerboseErrorKind},
    multi::{many0, many0_count, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use url::Url;

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

// ============================================================================
// Public API
// ============================================================================

/// A statement that could not be parsed or resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    /// 1-based line of the failure.
    pub line: usize,
    /// 1-based column (in characters) of the failure.
    pub column: usize,
    pub message: String,
    /// Subject of the failing statement when it could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Identifier>,
}

impl SyntaxError {
    fn at(source: &str, position: &str, message: String, subject: Option<Identifier>) -> Self {
        let offset = source.len().saturating_sub(position.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;
        Self {
            line,
            column,
            message,
            subject,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

/// Result of parsing one document.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// IRI of the document (the initial base).
    pub document: Option<Identifier>,
    /// Triples of every well-formed statement, in document order.
    pub triples: Vec<Triple>,
    pub errors: Vec<SyntaxError>,
}

/// Parse a Turtle document. Relative IRIs resolve against `base`.
///
/// Never fails: malformed statements end up in [`ParseOutcome::errors`].
pub fn parse(source: &str, base: Option<&str>) -> ParseOutcome {
    let mut emitter = Emitter::new(base);
    let mut errors = Vec::new();
    let mut rest = source;

    loop {
        let input = ws(rest).map(|(input, _)| input).unwrap_or(rest);
        if input.is_empty() {
            break;
        }
        match statement(input) {
            Ok((next, parsed)) => {
                if let Err(message) = emitter.apply(parsed) {
                    let subject = emitter.subject_hint(input);
                    errors.push(SyntaxError::at(source, input, message, subject));
                }
                rest = next;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let (position, message) = describe(input, &e);
                let subject = emitter.subject_hint(input);
                errors.push(SyntaxError::at(source, position, message, subject));
                rest = skip_statement(input);
            }
            Err(nom::Err::Incomplete(_)) => {
                let subject = emitter.subject_hint(input);
                errors.push(SyntaxError::at(
                    source,
                    input,
                    "unexpected end of input".to_string(),
                    subject,
                ));
                break;
            }
        }
    }

    log::debug!(
        "parsed {} triple(s), {} syntax error(s)",
        emitter.triples.len(),
        errors.len()
    );
    ParseOutcome {
        document: emitter.document,
        triples: emitter.triples,
        errors,
    }
}

fn describe<'a>(input: &'a str, error: &VerboseError<&'a str>) -> (&'a str, String) {
    let position = error.errors.first().map(|(at, _)| *at).unwrap_or(input);
    let snippet: String = position
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(24)
        .collect();
    let near = if snippet.is_empty() {
        "at end of input".to_string()
    } else {
        format!("near `{}`", snippet)
    };
    let label = error.errors.iter().find_map(|(_, kind)| match kind {
        VerboseErrorKind::Context(label) => Some(*label),
        _ => None,
    });
    let message = match label {
        Some(label) => format!("{} {}", label, near),
        None => format!("unexpected input {}", near),
    };
    (position, message)
}

/// Skip past the next top-level statement terminator.
///
/// Dots inside IRIs, strings and comments do not count; a dot counts only when
/// followed by whitespace, a comment or the end of input.
fn skip_statement(input: &str) -> &str {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Iri,
        Comment,
        Short(char),
        Long(char),
    }

    let mut state = State::Code;
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match state {
            State::Code => match c {
                '#' => state = State::Comment,
                '<' => state = State::Iri,
                '"' | '\'' => {
                    let triple: String = std::iter::repeat(c).take(3).collect();
                    if input[i..].starts_with(&triple) {
                        chars.next();
                        chars.next();
                        state = State::Long(c);
                    } else {
                        state = State::Short(c);
                    }
                }
                '.' => {
                    let terminates = chars
                        .peek()
                        .map(|(_, next)| next.is_whitespace() || *next == '#')
                        .unwrap_or(true);
                    if terminates {
                        return &input[i + 1..];
                    }
                }
                _ => {}
            },
            State::Iri => {
                if c == '>' || c.is_whitespace() {
                    state = State::Code;
                }
            }
            State::Comment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::Short(quote) => match c {
                '\\' => {
                    chars.next();
                }
                '\n' | '\r' => state = State::Code,
                _ if c == quote => state = State::Code,
                _ => {}
            },
            State::Long(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    let triple: String = std::iter::repeat(quote).take(3).collect();
                    if input[i..].starts_with(&triple) {
                        chars.next();
                        chars.next();
                        state = State::Code;
                    }
                }
            }
        }
    }
    ""
}

// ============================================================================
// Raw syntax tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum IriRef<'a> {
    Full(&'a str),
    Prefixed(&'a str, &'a str),
}

#[derive(Debug, Clone, PartialEq)]
enum LiteralSuffix<'a> {
    Plain,
    Lang(&'a str),
    Datatype(IriRef<'a>),
    Fixed(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
enum Verb<'a> {
    Type,
    Iri(IriRef<'a>),
}

type PredicateObjects<'a> = (Verb<'a>, Vec<Node<'a>>);

#[derive(Debug, Clone, PartialEq)]
enum Node<'a> {
    Iri(IriRef<'a>),
    Blank(&'a str),
    Literal {
        lexical: String,
        suffix: LiteralSuffix<'a>,
    },
    PropertyList(Vec<PredicateObjects<'a>>),
    Collection(Vec<Node<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
enum Statement<'a> {
    Prefix(&'a str, &'a str),
    Base(&'a str),
    Triples(Node<'a>, Vec<PredicateObjects<'a>>),
}

// ============================================================================
// Lexical parsers
// ============================================================================

fn comment(input: &str) -> PResult<&str> {
    recognize(pair(char('#'), take_while(|c| c != '\n' && c != '\r')))(input)
}

fn ws(input: &str) -> PResult<()> {
    value((), many0_count(alt((multispace1, comment))))(input)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ':' | '_' | '-')
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn keyword_no_case<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(tag_no_case(word), not(satisfy(is_name_char)))
}

/// Longest run of `accept` characters, without trailing dots (those end the statement).
fn trailing_name(input: &str, accept: impl Fn(char) -> bool) -> (&str, &str) {
    let end = input.find(|c: char| !accept(c)).unwrap_or(input.len());
    let name = input[..end].trim_end_matches('.');
    (&input[name.len()..], name)
}

fn iri_ref(input: &str) -> PResult<&str> {
    let (input, _) = char('<')(input)?;
    let (input, iri) = take_while(|c: char| {
        !c.is_whitespace() && !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    })(input)?;
    let (input, _) = cut(context("expected closing '>' of IRI", char('>')))(input)?;
    Ok((input, iri))
}

fn pn_prefix(input: &str) -> PResult<&str> {
    recognize(opt(pair(
        satisfy(char::is_alphabetic),
        take_while(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    )))(input)
}

fn pname_ns(input: &str) -> PResult<&str> {
    terminated(pn_prefix, char(':'))(input)
}

fn prefixed_name(input: &str) -> PResult<IriRef<'_>> {
    let (input, prefix) = pname_ns(input)?;
    let (input, local) = trailing_name(input, |c| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '%')
    });
    Ok((input, IriRef::Prefixed(prefix, local)))
}

fn iri(input: &str) -> PResult<IriRef<'_>> {
    alt((map(iri_ref, IriRef::Full), prefixed_name))(input)
}

fn blank_label(input: &str) -> PResult<&str> {
    let (input, _) = tag("_:")(input)?;
    let (rest, label) = trailing_name(input, |c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if label.is_empty() {
        return Err(failure(input, "expected a blank node label"));
    }
    Ok((rest, label))
}

fn failure<'a>(input: &'a str, message: &'static str) -> nom::Err<VerboseError<&'a str>> {
    nom::Err::Failure(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(message))],
    })
}

fn string(input: &str) -> PResult<String> {
    for delimiter in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(body) = input.strip_prefix(delimiter) {
            return string_body(input, body, delimiter);
        }
    }
    Err(nom::Err::Error(VerboseError::from_error_kind(input, ErrorKind::Char)))
}

fn string_body<'a>(start: &'a str, body: &'a str, delimiter: &str) -> PResult<'a, String> {
    let long = delimiter.len() == 3;
    let mut out = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        if body[i..].starts_with(delimiter) {
            return Ok((&body[i + delimiter.len()..], out));
        }
        match c {
            '\\' => {
                let Some((j, escape)) = chars.next() else {
                    break;
                };
                match escape {
                    't' => out.push('\t'),
                    'b' => out.push('\u{8}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    'f' => out.push('\u{c}'),
                    '"' | '\'' | '\\' => out.push(escape),
                    'u' | 'U' => {
                        let len = if escape == 'u' { 4 } else { 8 };
                        let decoded = body
                            .get(j + 1..j + 1 + len)
                            .filter(|hex| hex.chars().all(|h| h.is_ascii_hexdigit()))
                            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                            .and_then(char::from_u32);
                        match decoded {
                            Some(ch) => {
                                out.push(ch);
                                for _ in 0..len {
                                    chars.next();
                                }
                            }
                            None => return Err(failure(&body[i..], "invalid unicode escape")),
                        }
                    }
                    _ => return Err(failure(&body[i..], "invalid escape sequence")),
                }
            }
            '\n' | '\r' if !long => return Err(failure(start, "unterminated string")),
            _ => out.push(c),
        }
    }
    Err(failure(start, "unterminated string"))
}

fn exponent(input: &str) -> PResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn numeric(input: &str) -> PResult<(&str, &'static str)> {
    let (input, text) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, opt(pair(char('.'), digit1)), opt(exponent)))),
            recognize(tuple((char('.'), digit1, opt(exponent)))),
        )),
    ))(input)?;
    let datatype = if text.contains(['e', 'E']) {
        vocab::XSD_DOUBLE
    } else if text.contains('.') {
        vocab::XSD_DECIMAL
    } else {
        vocab::XSD_INTEGER
    };
    Ok((input, (text, datatype)))
}

fn language_tag(input: &str) -> PResult<&str> {
    recognize(pair(alpha1, many0_count(pair(char('-'), alphanumeric1))))(input)
}

// ============================================================================
// Grammar
// ============================================================================

fn rdf_literal(input: &str) -> PResult<Node<'_>> {
    let (input, lexical) = string(input)?;
    let (input, suffix) = opt(alt((
        map(preceded(char('@'), cut(language_tag)), LiteralSuffix::Lang),
        map(
            preceded(tag("^^"), cut(context("expected a datatype IRI", iri))),
            LiteralSuffix::Datatype,
        ),
    )))(input)?;
    Ok((
        input,
        Node::Literal {
            lexical,
            suffix: suffix.unwrap_or(LiteralSuffix::Plain),
        },
    ))
}

fn fixed_literal(lexical: &str, datatype: &'static str) -> Node<'static> {
    Node::Literal {
        lexical: lexical.to_string(),
        suffix: LiteralSuffix::Fixed(datatype),
    }
}

fn literal(input: &str) -> PResult<Node<'_>> {
    alt((
        rdf_literal,
        map(numeric, |(text, datatype)| fixed_literal(text, datatype)),
        map(keyword("true"), |_| fixed_literal("true", vocab::XSD_BOOLEAN)),
        map(keyword("false"), |_| fixed_literal("false", vocab::XSD_BOOLEAN)),
    ))(input)
}

fn collection(input: &str) -> PResult<Node<'_>> {
    let (input, _) = char('(')(input)?;
    let (input, items) = many0(preceded(ws, object))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("expected closing ')' of collection", char(')')))(input)?;
    Ok((input, Node::Collection(items)))
}

fn blank_property_list(input: &str) -> PResult<Node<'_>> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, list) = opt(predicate_object_list)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("expected closing ']'", char(']')))(input)?;
    Ok((input, Node::PropertyList(list.unwrap_or_default())))
}

fn object(input: &str) -> PResult<Node<'_>> {
    alt((
        map(iri, Node::Iri),
        map(blank_label, Node::Blank),
        collection,
        blank_property_list,
        literal,
    ))(input)
}

fn verb(input: &str) -> PResult<Verb<'_>> {
    alt((value(Verb::Type, keyword("a")), map(iri, Verb::Iri)))(input)
}

fn predicate_objects(input: &str) -> PResult<PredicateObjects<'_>> {
    let (input, verb) = verb(input)?;
    let (input, _) = ws(input)?;
    let (input, objects) = cut(context(
        "expected an object",
        separated_list1(delimited(ws, char(','), ws), object),
    ))(input)?;
    Ok((input, (verb, objects)))
}

fn predicate_object_list(input: &str) -> PResult<Vec<PredicateObjects<'_>>> {
    let (mut input, first) = predicate_objects(input)?;
    let mut list = vec![first];
    loop {
        let (rest, _) = ws(input)?;
        let Ok((rest, _)) = char::<_, VerboseError<&str>>(';')(rest) else {
            break;
        };
        let (rest, _) = ws(rest)?;
        input = rest;
        // `;` may be repeated or trail before `.` and `]`
        match predicate_objects(input) {
            Ok((rest, entry)) => {
                list.push(entry);
                input = rest;
            }
            Err(nom::Err::Error(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok((input, list))
}

fn subject(input: &str) -> PResult<Node<'_>> {
    alt((map(iri, Node::Iri), map(blank_label, Node::Blank), collection))(input)
}

fn triples(input: &str) -> PResult<Statement<'_>> {
    let (input, (subject, list)) = alt((
        pair(
            subject,
            preceded(ws, cut(context("expected a predicate", predicate_object_list))),
        ),
        pair(
            blank_property_list,
            map(opt(preceded(ws, predicate_object_list)), Option::unwrap_or_default),
        ),
    ))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("expected '.' at end of statement", char('.')))(input)?;
    Ok((input, Statement::Triples(subject, list)))
}

fn directive(input: &str) -> PResult<Statement<'_>> {
    alt((
        map(
            tuple((
                tag("@prefix"),
                ws,
                cut(context("expected a prefix name", pname_ns)),
                ws,
                cut(iri_ref),
                ws,
                cut(context("expected '.' after @prefix", char('.'))),
            )),
            |(_, _, prefix, _, iri, _, _)| Statement::Prefix(prefix, iri),
        ),
        map(
            tuple((
                tag("@base"),
                ws,
                cut(iri_ref),
                ws,
                cut(context("expected '.' after @base", char('.'))),
            )),
            |(_, _, iri, _, _)| Statement::Base(iri),
        ),
        map(
            tuple((
                keyword_no_case("PREFIX"),
                ws,
                cut(context("expected a prefix name", pname_ns)),
                ws,
                cut(iri_ref),
            )),
            |(_, _, prefix, _, iri)| Statement::Prefix(prefix, iri),
        ),
        map(
            tuple((keyword_no_case("BASE"), ws, cut(iri_ref))),
            |(_, _, iri)| Statement::Base(iri),
        ),
    ))(input)
}

fn statement(input: &str) -> PResult<Statement<'_>> {
    alt((directive, triples))(input)
}

// ============================================================================
// Emitter
// ============================================================================

/// Turns raw statements into triples, tracking prefixes, base and blank nodes.
struct Emitter {
    document: Option<Identifier>,
    base: Option<Url>,
    prefixes: HashMap<String, String>,
    labels: HashMap<String, Identifier>,
    used_blanks: HashSet<Identifier>,
    next_blank: usize,
    triples: Vec<Triple>,
}

impl Emitter {
    fn new(base: Option<&str>) -> Self {
        let base = base.and_then(|b| Url::parse(b).ok());
        Self {
            document: base.as_ref().map(|b| Identifier::new(b.as_str())),
            base,
            prefixes: HashMap::new(),
            labels: HashMap::new(),
            used_blanks: HashSet::new(),
            next_blank: 0,
            triples: Vec::new(),
        }
    }

    fn apply(&mut self, statement: Statement<'_>) -> Result<(), String> {
        match statement {
            Statement::Prefix(prefix, iri) => {
                let namespace = self.resolve(iri)?;
                self.prefixes.insert(prefix.to_string(), namespace.to_string());
            }
            Statement::Base(iri) => {
                let resolved = self.resolve(iri)?;
                let base = Url::parse(resolved.as_str())
                    .map_err(|e| format!("invalid base <{}>: {}", iri, e))?;
                self.base = Some(base);
            }
            Statement::Triples(subject, list) => {
                let mut out = Vec::new();
                let subject = self.term(subject, &mut out)?;
                let Some(subject) = subject.as_identifier().cloned() else {
                    return Err("a literal cannot be a subject".to_string());
                };
                self.predicate_objects(&subject, list, &mut out)?;
                self.triples.extend(out);
            }
        }
        Ok(())
    }

    /// Best-effort subject of a statement that failed.
    fn subject_hint(&mut self, input: &str) -> Option<Identifier> {
        match subject(input).ok()?.1 {
            Node::Iri(iri) => self.iri(&iri).ok(),
            Node::Blank(label) => Some(self.user_blank(label)),
            _ => None,
        }
    }

    fn resolve(&self, raw: &str) -> Result<Identifier, String> {
        if is_absolute_iri(raw) {
            return Ok(Identifier::new(raw));
        }
        match &self.base {
            Some(base) => base
                .join(raw)
                .map(|url| Identifier::new(url.as_str()))
                .map_err(|e| format!("cannot resolve <{}>: {}", raw, e)),
            None => Ok(Identifier::new(raw)),
        }
    }

    fn iri(&self, iri: &IriRef<'_>) -> Result<Identifier, String> {
        match iri {
            IriRef::Full(raw) => self.resolve(raw),
            IriRef::Prefixed(prefix, local) => self
                .prefixes
                .get(*prefix)
                .map(|namespace| Identifier::new(format!("{}{}", namespace, local)))
                .ok_or_else(|| format!("undefined prefix '{}:'", prefix)),
        }
    }

    fn mint(&mut self) -> Identifier {
        loop {
            let candidate = Identifier::new(format!("_:b{}", self.next_blank));
            self.next_blank += 1;
            if self.used_blanks.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn user_blank(&mut self, label: &str) -> Identifier {
        if let Some(id) = self.labels.get(label) {
            return id.clone();
        }
        let mut candidate = Identifier::new(format!("_:{}", label));
        let mut suffix = 1;
        while !self.used_blanks.insert(candidate.clone()) {
            candidate = Identifier::new(format!("_:{}_{}", label, suffix));
            suffix += 1;
        }
        self.labels.insert(label.to_string(), candidate.clone());
        candidate
    }

    fn literal(&self, lexical: String, suffix: LiteralSuffix<'_>) -> Result<Literal, String> {
        Ok(match suffix {
            LiteralSuffix::Plain => Literal::string(lexical),
            LiteralSuffix::Lang(lang) => Literal::lang(lexical, lang),
            LiteralSuffix::Datatype(iri) => Literal::typed(lexical, self.iri(&iri)?),
            LiteralSuffix::Fixed(datatype) => Literal::typed(lexical, datatype),
        })
    }

    fn term(&mut self, node: Node<'_>, out: &mut Vec<Triple>) -> Result<Term, String> {
        match node {
            Node::Iri(iri) => Ok(Term::Iri(self.iri(&iri)?)),
            Node::Blank(label) => Ok(Term::Blank(self.user_blank(label))),
            Node::Literal { lexical, suffix } => Ok(Term::Literal(self.literal(lexical, suffix)?)),
            Node::PropertyList(list) => {
                let node = self.mint();
                self.predicate_objects(&node, list, out)?;
                Ok(Term::Blank(node))
            }
            Node::Collection(items) => {
                let cells: Vec<Identifier> = items.iter().map(|_| self.mint()).collect();
                for (i, item) in items.into_iter().enumerate() {
                    let first = self.term(item, out)?;
                    let rest = cells
                        .get(i + 1)
                        .map(|next| Term::Blank(next.clone()))
                        .unwrap_or_else(|| Term::iri(vocab::RDF_NIL));
                    out.push(Triple::new(cells[i].clone(), vocab::RDF_FIRST, first));
                    out.push(Triple::new(cells[i].clone(), vocab::RDF_REST, rest));
                }
                Ok(cells
                    .first()
                    .map(|head| Term::Blank(head.clone()))
                    .unwrap_or_else(|| Term::iri(vocab::RDF_NIL)))
            }
        }
    }

    fn predicate_objects(
        &mut self,
        subject: &Identifier,
        list: Vec<PredicateObjects<'_>>,
        out: &mut Vec<Triple>,
    ) -> Result<(), String> {
        for (verb, objects) in list {
            let predicate = match verb {
                Verb::Type => Identifier::new(vocab::RDF_TYPE),
                Verb::Iri(iri) => self.iri(&iri)?,
            };
            for object in objects {
                let object = self.term(object, out)?;
                out.push(Triple::new(subject.clone(), predicate.clone(), object));
            }
        }
        Ok(())
    }
}
