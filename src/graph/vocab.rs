//! IRIs of the vocabularies pipeline documents are written in.

/// Pipeline vocabulary namespace.
pub const P: &str = "https://pipeline.described.at/";
/// Code vocabulary namespace.
pub const CODE: &str = "https://code.described.at/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
pub const XSD_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";

// Pipeline vocabulary
pub const P_PIPELINE: &str = "https://pipeline.described.at/Pipeline";
pub const P_OPERATION: &str = "https://pipeline.described.at/Operation";
pub const P_STEPS: &str = "https://pipeline.described.at/steps";
pub const P_STEP_LIST: &str = "https://pipeline.described.at/stepList";
pub const P_ENTRY: &str = "https://pipeline.described.at/entry";
pub const P_EXIT: &str = "https://pipeline.described.at/exit";
pub const P_WIRING: &str = "https://pipeline.described.at/wiring";
pub const P_FROM: &str = "https://pipeline.described.at/from";
pub const P_TO: &str = "https://pipeline.described.at/to";
pub const P_FEEDBACK: &str = "https://pipeline.described.at/feedback";
pub const P_PARAMETER: &str = "https://pipeline.described.at/parameter";
pub const P_NAME: &str = "https://pipeline.described.at/name";
pub const P_MIN_COUNT: &str = "https://pipeline.described.at/minCount";
pub const P_MAX_COUNT: &str = "https://pipeline.described.at/maxCount";
pub const P_KIND: &str = "https://pipeline.described.at/kind";
pub const P_REFERENCE: &str = "https://pipeline.described.at/Reference";
pub const P_ANY: &str = "https://pipeline.described.at/Any";
pub const P_READABLE: &str = "https://pipeline.described.at/Readable";
pub const P_WRITABLE: &str = "https://pipeline.described.at/Writable";
pub const P_READABLE_OBJECT_MODE: &str = "https://pipeline.described.at/ReadableObjectMode";
pub const P_WRITABLE_OBJECT_MODE: &str = "https://pipeline.described.at/WritableObjectMode";

// Code vocabulary
pub const CODE_IMPLEMENTED_BY: &str = "https://code.described.at/implementedBy";
pub const CODE_LINK: &str = "https://code.described.at/link";
pub const CODE_ARGUMENTS: &str = "https://code.described.at/arguments";
pub const CODE_NAME: &str = "https://code.described.at/name";
pub const CODE_VALUE: &str = "https://code.described.at/value";

const PREFIXES: [(&str, &str); 4] = [("p", P), ("code", CODE), ("rdf", RDF), ("xsd", XSD)];

/// Shorten an IRI with the well-known prefixes, for messages.
pub fn compact(iri: &str) -> String {
    PREFIXES
        .iter()
        .find_map(|(prefix, ns)| {
            iri.strip_prefix(ns)
                .filter(|local| !local.is_empty())
                .map(|local| format!("{}:{}", prefix, local))
        })
        .unwrap_or_else(|| iri.to_string())
}
