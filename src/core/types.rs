//! Core value types shared by every validation stage.
//!
//! The loaded document is a set of RDF terms. Three shapes matter here:
//! - `Identifier`: an opaque name for anything (IRI or blank node label)
//! - `Term`: a node of the graph (identifier or literal)
//! - `BoundValue`: what a step binds to one of its parameters

use crate::graph::vocab;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Opaque, globally unique name of an entity in the document.
///
/// Blank node identifiers keep their `_:` prefix so they can never collide
/// with an IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Create an identifier from any string.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names a document-scoped blank node.
    pub fn is_blank(&self) -> bool {
        self.0.starts_with("_:")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// A literal value with its datatype and optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form as written in the document.
    pub lexical: Arc<str>,
    /// Datatype IRI (`xsd:string` for plain literals).
    pub datatype: Identifier,
    /// Language tag, only set for `rdf:langString`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Arc<str>>,
}

impl Literal {
    /// Plain string literal.
    pub fn string(lexical: impl AsRef<str>) -> Self {
        Self::typed(lexical, vocab::XSD_STRING)
    }

    /// Literal with an explicit datatype.
    pub fn typed(lexical: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Identifier::new(datatype),
            language: None,
        }
    }

    /// Language-tagged string literal.
    pub fn lang(lexical: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Identifier::new(vocab::RDF_LANG_STRING),
            language: Some(Arc::from(language.as_ref().to_ascii_lowercase())),
        }
    }

    /// Whether the literal has the given datatype.
    pub fn has_datatype(&self, datatype: &str) -> bool {
        self.datatype.as_str() == datatype
    }

    /// Read the literal as a non-negative count (`xsd:integer` family or a numeric string).
    pub fn as_count(&self) -> Option<usize> {
        if !is_valid_lexical(self.datatype.as_str(), &self.lexical) {
            return None;
        }
        self.lexical.trim_start_matches('+').parse::<usize>().ok()
    }

    /// Read the literal as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match &*self.lexical {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Short label of the datatype for messages (`xsd:integer` rather than the full IRI).
    pub fn datatype_label(&self) -> String {
        vocab::compact(self.datatype.as_str())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.lexical)?;
        match &self.language {
            Some(lang) => write!(f, "@{}", lang),
            None if self.has_datatype(vocab::XSD_STRING) => Ok(()),
            None => write!(f, "^^{}", self.datatype_label()),
        }
    }
}

/// A node of the loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Term {
    /// Named node.
    Iri(Identifier),
    /// Blank node (label includes `_:`).
    Blank(Identifier),
    /// Literal value.
    Literal(Literal),
}

impl Term {
    /// Named node from an IRI string.
    pub fn iri(value: impl AsRef<str>) -> Self {
        Term::Iri(Identifier::new(value))
    }

    /// The identifier of an IRI or blank node, `None` for literals.
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Term::Iri(id) | Term::Blank(id) => Some(id),
            Term::Literal(_) => None,
        }
    }

    /// Try to get this term as a literal.
    pub fn as_literal(&self) -> Option<&Literal> {
        if let Term::Literal(lit) = self {
            Some(lit)
        } else {
            None
        }
    }

    /// Whether this term is the named node `iri`.
    pub fn is_iri(&self, iri: &str) -> bool {
        matches!(self, Term::Iri(id) if id.as_str() == iri)
    }

    /// Whether this term is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl From<Identifier> for Term {
    fn from(id: Identifier) -> Self {
        if id.is_blank() {
            Term::Blank(id)
        } else {
            Term::Iri(id)
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(id) => write!(f, "<{}>", id),
            Term::Blank(id) => write!(f, "{}", id),
            Term::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

/// A value bound by a step to one of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum BoundValue {
    /// Literal value.
    Literal(Literal),
    /// Reference to another node of the graph.
    Reference(Identifier),
    /// Ordered list of values (an RDF collection).
    List(Vec<BoundValue>),
}

impl BoundValue {
    /// Flatten nested lists into the individual values they carry.
    pub fn flatten(&self) -> Vec<&BoundValue> {
        match self {
            BoundValue::List(items) => items.iter().flat_map(BoundValue::flatten).collect(),
            other => vec![other],
        }
    }

    /// Short description of the value's kind for messages.
    pub fn kind_label(&self) -> String {
        match self {
            BoundValue::Literal(lit) => lit.datatype_label(),
            BoundValue::Reference(_) => "reference".to_string(),
            BoundValue::List(items) => format!("list of {}", items.len()),
        }
    }
}

impl From<Term> for BoundValue {
    fn from(term: Term) -> Self {
        match term {
            Term::Iri(id) | Term::Blank(id) => BoundValue::Reference(id),
            Term::Literal(lit) => BoundValue::Literal(lit),
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Literal(lit) => write!(f, "{}", lit),
            BoundValue::Reference(id) => write!(f, "<{}>", id),
            BoundValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ============================================================================
// Lexical forms
// ============================================================================

/// Check that `lexical` is a valid lexical form of `datatype`.
///
/// Datatypes this validator does not know accept any lexical form.
pub fn is_valid_lexical(datatype: &str, lexical: &str) -> bool {
    match datatype {
        vocab::XSD_INTEGER => integer_parts(lexical).is_some(),
        vocab::XSD_NON_NEGATIVE_INTEGER => integer_parts(lexical).is_some_and(|(negative, magnitude)| {
            !negative || magnitude.is_empty()
        }),
        vocab::XSD_POSITIVE_INTEGER => {
            integer_parts(lexical).is_some_and(|(negative, magnitude)| !negative && !magnitude.is_empty())
        }
        vocab::XSD_LONG => integer_parts(lexical).is_some() && lexical.parse::<i64>().is_ok(),
        vocab::XSD_INT => integer_parts(lexical).is_some() && lexical.parse::<i32>().is_ok(),
        vocab::XSD_DECIMAL => is_decimal(lexical),
        vocab::XSD_DOUBLE | vocab::XSD_FLOAT => is_double(lexical),
        vocab::XSD_BOOLEAN => matches!(lexical, "true" | "false" | "1" | "0"),
        vocab::XSD_ANY_URI => !lexical.chars().any(char::is_whitespace),
        _ => true,
    }
}

/// Whether `value` starts with a URI scheme (`http:`, `node:`, `urn:`...).
pub fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
        && !value.chars().any(char::is_whitespace)
}

/// Sign and magnitude of an integer lexical form, leading zeros stripped
/// (an empty magnitude is zero). No range limit.
fn integer_parts(lexical: &str) -> Option<(bool, &str)> {
    let (negative, digits) = match lexical.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, lexical.strip_prefix('+').unwrap_or(lexical)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((negative, digits.trim_start_matches('0')))
}

fn is_decimal(lexical: &str) -> bool {
    let body = lexical.strip_prefix(['+', '-']).unwrap_or(lexical);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    !(int.is_empty() && frac.is_empty())
        && int.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

fn is_double(lexical: &str) -> bool {
    matches!(lexical, "INF" | "-INF" | "+INF" | "NaN")
        || (lexical.chars().any(|c| c.is_ascii_digit())
            && lexical
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
            && lexical.parse::<f64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_blank() {
        assert!(Identifier::new("_:b0").is_blank());
        assert!(!Identifier::new("http://example.org/a").is_blank());
    }

    #[test]
    fn test_term_from_identifier() {
        assert!(matches!(Term::from(Identifier::new("_:x")), Term::Blank(_)));
        assert!(Term::from(Identifier::new("urn:x")).is_iri("urn:x"));
    }

    #[test]
    fn test_lexical_forms() {
        assert!(is_valid_lexical(vocab::XSD_INTEGER, "-42"));
        assert!(!is_valid_lexical(vocab::XSD_INTEGER, "4.2"));
        assert!(is_valid_lexical(vocab::XSD_DECIMAL, "4.2"));
        assert!(is_valid_lexical(vocab::XSD_DECIMAL, ".5"));
        assert!(!is_valid_lexical(vocab::XSD_DECIMAL, "."));
        assert!(is_valid_lexical(vocab::XSD_DOUBLE, "1.5e3"));
        assert!(is_valid_lexical(vocab::XSD_BOOLEAN, "true"));
        assert!(!is_valid_lexical(vocab::XSD_BOOLEAN, "yes"));
        assert!(!is_valid_lexical(vocab::XSD_NON_NEGATIVE_INTEGER, "-1"));
        assert!(is_valid_lexical(vocab::XSD_NON_NEGATIVE_INTEGER, "-0"));
        assert!(!is_valid_lexical(vocab::XSD_POSITIVE_INTEGER, "+000"));
        assert!(!is_valid_lexical(vocab::XSD_INTEGER, "+"));
        assert!(!is_valid_lexical(vocab::XSD_INTEGER, "--1"));
        assert!(is_valid_lexical("http://example.org/custom", "anything"));
    }

    #[test]
    fn test_unbounded_integers() {
        let huge = "123456789012345678901234";
        assert!(is_valid_lexical(vocab::XSD_INTEGER, huge));
        assert!(is_valid_lexical(vocab::XSD_INTEGER, &format!("-{}", huge)));
        assert!(is_valid_lexical(vocab::XSD_NON_NEGATIVE_INTEGER, huge));
        assert!(is_valid_lexical(vocab::XSD_POSITIVE_INTEGER, &format!("+{}", huge)));
        assert!(!is_valid_lexical(vocab::XSD_LONG, huge));
        assert!(is_valid_lexical(vocab::XSD_LONG, "9223372036854775807"));
        assert!(!is_valid_lexical(vocab::XSD_INT, "2147483648"));
        assert!(is_valid_lexical(vocab::XSD_INT, "-2147483648"));
        assert_eq!(Literal::typed(huge, vocab::XSD_INTEGER).as_count(), None);
    }

    #[test]
    fn test_absolute_iri() {
        assert!(is_absolute_iri("http://example.org/a"));
        assert!(is_absolute_iri("node:fs#createReadStream"));
        assert!(!is_absolute_iri("#main"));
        assert!(!is_absolute_iri("_:b0"));
        assert!(!is_absolute_iri("a b:c"));
        assert!(!is_absolute_iri("C:"));
    }

    #[test]
    fn test_literal_count() {
        assert_eq!(Literal::typed("3", vocab::XSD_INTEGER).as_count(), Some(3));
        assert_eq!(Literal::typed("-3", vocab::XSD_INTEGER).as_count(), None);
        assert_eq!(Literal::string("2").as_count(), Some(2));
    }

    #[test]
    fn test_bound_value_flatten() {
        let value = BoundValue::List(vec![
            BoundValue::Literal(Literal::string("a")),
            BoundValue::List(vec![BoundValue::Reference(Identifier::new("urn:b"))]),
        ]);
        assert_eq!(value.flatten().len(), 2);
        assert_eq!(value.to_string(), "(\"a\" (<urn:b>))");
    }
}
