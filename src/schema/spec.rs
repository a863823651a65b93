//! Operation schemas and parameter specifications.
//!
//! An operation declares its parameters with `p:parameter` nodes. Each
//! parameter has a name, an occurrence range and the kind of value it
//! accepts. Values are checked against the kind with a small set of
//! coercions, so a plain `"42"` bound to an `xsd:integer` parameter is a
//! soft finding rather than a hard error.

use crate::core::error::SchemaError;
use crate::core::types::{is_absolute_iri, is_valid_lexical, BoundValue, Identifier, Literal, Term};
use crate::graph::store::GraphStore;
use crate::graph::vocab;
use crate::pipeline::model::StreamInterface;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of value a parameter accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "datatype", rename_all = "lowercase")]
pub enum ExpectedKind {
    /// A literal of the given datatype.
    Literal(Identifier),
    /// A node reference (IRI or blank node).
    Reference,
    /// Anything.
    Any,
}

/// Result of checking one value against an [`ExpectedKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindCheck {
    Match,
    /// Not the declared kind, but convertible to it.
    Coercible(String),
    Mismatch(String),
}

const INTEGERS: &[&str] = &[
    vocab::XSD_INTEGER,
    vocab::XSD_INT,
    vocab::XSD_LONG,
    vocab::XSD_NON_NEGATIVE_INTEGER,
    vocab::XSD_POSITIVE_INTEGER,
];

const FLOATS: &[&str] = &[vocab::XSD_DOUBLE, vocab::XSD_FLOAT];

impl ExpectedKind {
    /// Kind named by a `p:kind` value.
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            vocab::P_ANY => ExpectedKind::Any,
            vocab::P_REFERENCE => ExpectedKind::Reference,
            datatype => ExpectedKind::Literal(Identifier::new(datatype)),
        }
    }

    pub fn literal(datatype: impl AsRef<str>) -> Self {
        ExpectedKind::Literal(Identifier::new(datatype))
    }

    /// Check a single (already flattened) value.
    pub fn check(&self, value: &BoundValue) -> KindCheck {
        match (self, value) {
            (ExpectedKind::Any, _) => KindCheck::Match,
            (_, BoundValue::List(_)) => KindCheck::Mismatch(format!("expected {}, got a list", self)),

            (ExpectedKind::Reference, BoundValue::Reference(_)) => KindCheck::Match,
            (ExpectedKind::Reference, BoundValue::Literal(lit)) => {
                let textual = lit.has_datatype(vocab::XSD_STRING) || lit.has_datatype(vocab::XSD_ANY_URI);
                if textual && is_absolute_iri(&lit.lexical) {
                    KindCheck::Coercible(format!("{} can be read as an IRI reference", lit))
                } else {
                    KindCheck::Mismatch(format!("expected a reference, got {}", lit))
                }
            }

            (ExpectedKind::Literal(datatype), BoundValue::Reference(id)) => {
                let dt = datatype.as_str();
                if dt == vocab::XSD_STRING || dt == vocab::XSD_ANY_URI {
                    KindCheck::Coercible(format!("reference <{}> can be read as {}", id, self))
                } else {
                    KindCheck::Mismatch(format!("expected {}, got reference <{}>", self, id))
                }
            }
            (ExpectedKind::Literal(datatype), BoundValue::Literal(lit)) => check_literal(datatype.as_str(), lit),
        }
    }
}

fn check_literal(expected: &str, lit: &Literal) -> KindCheck {
    let actual = lit.datatype.as_str();
    let label = vocab::compact(expected);

    if actual == expected {
        return if is_valid_lexical(expected, &lit.lexical) {
            KindCheck::Match
        } else {
            KindCheck::Mismatch(format!("{} is not a valid {}", lit, label))
        };
    }

    // Derived integer types accept any integer within their range
    if INTEGERS.contains(&actual) && INTEGERS.contains(&expected) {
        return if is_valid_lexical(expected, &lit.lexical) {
            KindCheck::Match
        } else {
            KindCheck::Mismatch(format!("{} is out of range for {}", lit, label))
        };
    }

    let widening = (INTEGERS.contains(&actual) && (expected == vocab::XSD_DECIMAL || FLOATS.contains(&expected)))
        || (actual == vocab::XSD_DECIMAL && FLOATS.contains(&expected))
        || (FLOATS.contains(&actual) && FLOATS.contains(&expected));
    if widening {
        return KindCheck::Coercible(format!("{} widens to {}", lit, label));
    }

    if actual == vocab::RDF_LANG_STRING && expected == vocab::XSD_STRING {
        return KindCheck::Coercible(format!("{} drops its language tag as {}", lit, label));
    }

    if actual == vocab::XSD_STRING && is_valid_lexical(expected, &lit.lexical) && known_datatype(expected) {
        return KindCheck::Coercible(format!("string {} parses as {}", lit, label));
    }

    KindCheck::Mismatch(format!("expected {}, got {}", label, lit))
}

fn known_datatype(datatype: &str) -> bool {
    INTEGERS.contains(&datatype)
        || FLOATS.contains(&datatype)
        || matches!(datatype, vocab::XSD_DECIMAL | vocab::XSD_BOOLEAN | vocab::XSD_ANY_URI)
}

impl fmt::Display for ExpectedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedKind::Literal(datatype) => f.write_str(&vocab::compact(datatype.as_str())),
            ExpectedKind::Reference => f.write_str("a reference"),
            ExpectedKind::Any => f.write_str("any value"),
        }
    }
}

/// Declaration of one operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// Minimum number of values (0 = optional).
    pub min_occurs: usize,
    /// Maximum number of values (`None` = unbounded).
    pub max_occurs: Option<usize>,
    pub kind: ExpectedKind,
}

impl ParameterSpec {
    /// Optional, unbounded parameter accepting anything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: 0,
            max_occurs: None,
            kind: ExpectedKind::Any,
        }
    }

    /// Exactly one value is required.
    pub fn required(mut self) -> Self {
        self.min_occurs = self.min_occurs.max(1);
        self.max_occurs = Some(1);
        self
    }

    pub fn with_min(mut self, min: usize) -> Self {
        self.min_occurs = min;
        self
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max_occurs = Some(max);
        self
    }

    pub fn with_kind(mut self, kind: ExpectedKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs > 0
    }

    /// Whether `count` values satisfy the occurrence range.
    pub fn accepts_count(&self, count: usize) -> bool {
        count >= self.min_occurs && self.max_occurs.map_or(true, |max| count <= max)
    }

    /// Human-readable occurrence range, e.g. `1..3` or `0..*`.
    pub fn range_label(&self) -> String {
        match self.max_occurs {
            Some(max) => format!("{}..{}", self.min_occurs, max),
            None => format!("{}..*", self.min_occurs),
        }
    }
}

/// Parameters and stream interface declared by one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchema {
    pub operation: Identifier,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
    pub interface: Option<StreamInterface>,
}

impl OperationSchema {
    pub fn new(operation: impl Into<Identifier>) -> Self {
        Self {
            operation: operation.into(),
            parameters: Vec::new(),
            interface: None,
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_interface(mut self, interface: StreamInterface) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Reject schemas that no binding could ever satisfy.
    pub fn validate_consistency(&self) -> Result<(), SchemaError> {
        let contradictory = |reason: String| SchemaError::Contradictory {
            operation: self.operation.clone(),
            reason,
        };

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if parameter.name.trim().is_empty() {
                return Err(contradictory("a parameter has an empty name".to_string()));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(contradictory(format!("parameter '{}' is declared twice", parameter.name)));
            }
            if let Some(max) = parameter.max_occurs {
                if parameter.min_occurs > max {
                    return Err(contradictory(format!(
                        "parameter '{}' has minCount {} above maxCount {}",
                        parameter.name, parameter.min_occurs, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// Read the schema of `operation` from a graph.
    ///
    /// `Ok(None)` when the graph does not describe the operation, that is when
    /// it is neither typed `p:Operation` nor declares any `p:parameter`.
    pub fn from_graph(graph: &GraphStore, operation: &Identifier) -> Result<Option<Self>, SchemaError> {
        let op = operation.as_str();
        let declared: Vec<&Term> = graph.objects(op, vocab::P_PARAMETER).collect();
        if declared.is_empty() && !graph.has_type(op, vocab::P_OPERATION) {
            return Ok(None);
        }

        let contradictory = |reason: String| SchemaError::Contradictory {
            operation: operation.clone(),
            reason,
        };

        let mut nodes = Vec::new();
        for term in declared {
            if graph.is_list(term) {
                let items = graph.list(term).map_err(|e| contradictory(e.to_string()))?;
                nodes.extend(items);
            } else {
                nodes.push(term);
            }
        }

        let mut schema = Self::new(operation.clone());
        schema.interface = StreamInterface::from_graph(graph, op);
        for node in nodes {
            let node = node
                .as_identifier()
                .ok_or_else(|| contradictory(format!("p:parameter value {} is a literal", node)))?;
            schema.parameters.push(parameter(graph, node).map_err(contradictory)?);
        }
        Ok(Some(schema))
    }
}

fn parameter(graph: &GraphStore, node: &Identifier) -> Result<ParameterSpec, String> {
    let subject = node.as_str();
    let name = match graph.object(subject, vocab::P_NAME) {
        Some(Term::Literal(lit)) => lit.lexical.to_string(),
        Some(other) => return Err(format!("parameter name {} is not a literal", other)),
        None => return Err(format!("parameter {} has no p:name", node)),
    };

    let count = |predicate: &str, label: &str| -> Result<Option<usize>, String> {
        match graph.object(subject, predicate) {
            None => Ok(None),
            Some(term) => term
                .as_literal()
                .and_then(Literal::as_count)
                .map(Some)
                .ok_or_else(|| format!("p:{} of '{}' is not a count: {}", label, name, term)),
        }
    };
    let min_occurs = count(vocab::P_MIN_COUNT, "minCount")?.unwrap_or(0);
    let max_occurs = count(vocab::P_MAX_COUNT, "maxCount")?;

    let kind = match graph.object(subject, vocab::P_KIND) {
        None => ExpectedKind::Any,
        Some(Term::Iri(iri)) => ExpectedKind::from_iri(iri.as_str()),
        Some(other) => return Err(format!("p:kind of '{}' is not an IRI: {}", name, other)),
    };

    Ok(ParameterSpec {
        name,
        min_occurs,
        max_occurs,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ValidationContext;
    use crate::graph::loader::load_str;
    use crate::pipeline::model::StreamMode;

    fn lit(lexical: &str, datatype: &str) -> BoundValue {
        BoundValue::Literal(Literal::typed(lexical, datatype))
    }

    #[test]
    fn test_kind_exact_matches() {
        let integer = ExpectedKind::literal(vocab::XSD_INTEGER);
        assert_eq!(integer.check(&lit("42", vocab::XSD_INTEGER)), KindCheck::Match);
        assert!(matches!(integer.check(&lit("4.2", vocab::XSD_INTEGER)), KindCheck::Mismatch(_)));
        assert_eq!(
            ExpectedKind::literal(vocab::XSD_NON_NEGATIVE_INTEGER).check(&lit("3", vocab::XSD_INTEGER)),
            KindCheck::Match
        );
        assert!(matches!(
            ExpectedKind::literal(vocab::XSD_POSITIVE_INTEGER).check(&lit("0", vocab::XSD_INTEGER)),
            KindCheck::Mismatch(_)
        ));
        assert_eq!(ExpectedKind::Any.check(&BoundValue::Reference(Identifier::new("urn:x"))), KindCheck::Match);
    }

    #[test]
    fn test_integer_beyond_machine_width() {
        let huge = lit("123456789012345678901234", vocab::XSD_INTEGER);
        assert_eq!(ExpectedKind::literal(vocab::XSD_INTEGER).check(&huge), KindCheck::Match);
        assert_eq!(
            ExpectedKind::literal(vocab::XSD_NON_NEGATIVE_INTEGER).check(&huge),
            KindCheck::Match
        );
        assert!(matches!(
            ExpectedKind::literal(vocab::XSD_LONG).check(&huge),
            KindCheck::Mismatch(reason) if reason.contains("out of range")
        ));
    }

    #[test]
    fn test_kind_coercions() {
        let integer = ExpectedKind::literal(vocab::XSD_INTEGER);
        assert!(matches!(integer.check(&lit("42", vocab::XSD_STRING)), KindCheck::Coercible(_)));
        assert!(matches!(integer.check(&lit("forty", vocab::XSD_STRING)), KindCheck::Mismatch(_)));

        let double = ExpectedKind::literal(vocab::XSD_DOUBLE);
        assert!(matches!(double.check(&lit("1", vocab::XSD_INTEGER)), KindCheck::Coercible(_)));
        assert!(matches!(double.check(&lit("1.5", vocab::XSD_DECIMAL)), KindCheck::Coercible(_)));
        assert!(matches!(
            ExpectedKind::literal(vocab::XSD_INTEGER).check(&lit("1.5", vocab::XSD_DECIMAL)),
            KindCheck::Mismatch(_)
        ));

        let string = ExpectedKind::literal(vocab::XSD_STRING);
        assert!(matches!(string.check(&BoundValue::Literal(Literal::lang("hi", "en"))), KindCheck::Coercible(_)));
        assert!(matches!(
            string.check(&BoundValue::Reference(Identifier::new("urn:x"))),
            KindCheck::Coercible(_)
        ));
        assert!(matches!(string.check(&lit("true", vocab::XSD_BOOLEAN)), KindCheck::Mismatch(_)));

        let reference = ExpectedKind::Reference;
        assert!(matches!(reference.check(&lit("http://x.org/a", vocab::XSD_STRING)), KindCheck::Coercible(_)));
        assert!(matches!(reference.check(&lit("not an iri", vocab::XSD_STRING)), KindCheck::Mismatch(_)));
        assert!(matches!(
            reference.check(&BoundValue::List(vec![])),
            KindCheck::Mismatch(_)
        ));
    }

    #[test]
    fn test_parameter_spec_builder() {
        let spec = ParameterSpec::new("delimiter")
            .required()
            .with_kind(ExpectedKind::literal(vocab::XSD_STRING));
        assert!(spec.is_required());
        assert!(spec.accepts_count(1));
        assert!(!spec.accepts_count(0));
        assert!(!spec.accepts_count(2));
        assert_eq!(spec.range_label(), "1..1");
        assert_eq!(ParameterSpec::new("x").range_label(), "0..*");
    }

    #[test]
    fn test_consistency() {
        let ok = OperationSchema::new("urn:op").with_parameter(ParameterSpec::new("a").with_min(1).with_max(2));
        assert!(ok.validate_consistency().is_ok());

        let inverted = OperationSchema::new("urn:op").with_parameter(ParameterSpec::new("a").with_min(3).with_max(1));
        assert_eq!(inverted.validate_consistency().unwrap_err().kind(), "contradictory");

        let twice = OperationSchema::new("urn:op")
            .with_parameter(ParameterSpec::new("a"))
            .with_parameter(ParameterSpec::new("a"));
        assert!(twice.validate_consistency().is_err());
    }

    #[test]
    fn test_from_graph() {
        let ctx = ValidationContext::with_defaults();
        let graph = load_str(
            r#"
            @prefix p: <https://pipeline.described.at/> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

            <node:csv-tools#parse> a p:Operation, p:Writable, p:ReadableObjectMode ;
                p:parameter [ p:name "delimiter" ; p:minCount 1 ; p:maxCount 1 ; p:kind xsd:string ] ,
                            [ p:name "columns" ; p:kind p:Any ] .
            <node:x#bad> p:parameter [ p:minCount 1 ] .
            <node:x#typo> p:parameter [ p:name "n" ; p:maxCount "many" ] .
            "#,
            Some("urn:manifest"),
            &ctx,
        );
        assert!(ctx.issues().is_empty());

        let schema = OperationSchema::from_graph(&graph, &Identifier::new("node:csv-tools#parse"))
            .unwrap()
            .unwrap();
        assert_eq!(schema.parameters.len(), 2);
        let delimiter = schema.parameter("delimiter").unwrap();
        assert_eq!(delimiter.min_occurs, 1);
        assert_eq!(delimiter.max_occurs, Some(1));
        assert_eq!(delimiter.kind, ExpectedKind::literal(vocab::XSD_STRING));
        assert_eq!(schema.parameter("columns").unwrap().kind, ExpectedKind::Any);
        let interface = schema.interface.unwrap();
        assert_eq!(interface.readable, Some(StreamMode::Object));
        assert_eq!(interface.writable, Some(StreamMode::Bytes));

        assert!(OperationSchema::from_graph(&graph, &Identifier::new("node:x#unknown")).unwrap().is_none());
        assert!(OperationSchema::from_graph(&graph, &Identifier::new("node:x#bad")).is_err());
        let typo = OperationSchema::from_graph(&graph, &Identifier::new("node:x#typo")).unwrap_err();
        assert!(typo.to_string().contains("not a count"));
    }
}
