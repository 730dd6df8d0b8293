// Codec tree as reported by the query analyzer. Closed set: every shape the
// walker can meet is a variant here, so dispatch is an exhaustive match.

use std::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    One,
    AtMostOne,
    Many,
    AtLeastOne,
}

impl Cardinality {
    /// MANY and AT_LEAST_ONE: the only cardinalities allowed to hold a set.
    pub fn is_multi(self) -> bool {
        matches!(self, Cardinality::Many | Cardinality::AtLeastOne)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::One => "ONE",
            Cardinality::AtMostOne => "AT_MOST_ONE",
            Cardinality::Many => "MANY",
            Cardinality::AtLeastOne => "AT_LEAST_ONE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Codec {
    Null,
    Scalar(Scalar),
    Object {
        fields: Vec<Field>,
        subcodecs: Vec<Codec>,   // positional, same length as `fields`
    },
    NamedTuple {
        names: Vec<String>,
        subcodecs: Vec<Codec>,
    },
    Array { subcodec: Box<Codec> },
    Tuple { subcodecs: Vec<Codec> },
    Set { subcodec: Box<Codec> },   // only valid directly under a multi field
    Range { subcodec: Box<Codec> }, // subcodec must be a scalar
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub name: String,        // database type name, e.g. `std::str`
    pub primitive: String,   // driver-side primitive, e.g. `string`, `number`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement: Option<Refinement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Refinement {
    Enum { values: Vec<String> },
    Numeric { width: NumericWidth },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericWidth {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bigint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub cardinality: Cardinality,
}

impl Codec {
    pub fn kind(&self) -> &'static str {
        match self {
            Codec::Null => "null",
            Codec::Scalar(_) => "scalar",
            Codec::Object { .. } => "object",
            Codec::NamedTuple { .. } => "named_tuple",
            Codec::Array { .. } => "array",
            Codec::Tuple { .. } => "tuple",
            Codec::Set { .. } => "set",
            Codec::Range { .. } => "range",
        }
    }

    pub fn scalar(name: &str, primitive: &str) -> Self {
        Codec::Scalar(Scalar {
            name: name.to_string(),
            primitive: primitive.to_string(),
            refinement: None,
        })
    }

    pub fn numeric(name: &str, primitive: &str, width: NumericWidth) -> Self {
        Codec::Scalar(Scalar {
            name: name.to_string(),
            primitive: primitive.to_string(),
            refinement: Some(Refinement::Numeric { width }),
        })
    }

    pub fn enumeration<S: Into<String>>(name: &str, values: impl IntoIterator<Item = S>) -> Self {
        Codec::Scalar(Scalar {
            name: name.to_string(),
            primitive: "string".to_string(),
            refinement: Some(Refinement::Enum {
                values: values.into_iter().map(Into::into).collect(),
            }),
        })
    }

    /// Object from `(field name, cardinality, subcodec)` triples.
    pub fn object<S: Into<String>>(fields: impl IntoIterator<Item = (S, Cardinality, Codec)>) -> Self {
        let (fields, subcodecs) = fields
            .into_iter()
            .map(|(name, cardinality, codec)| (Field { name: name.into(), cardinality }, codec))
            .unzip();
        Codec::Object { fields, subcodecs }
    }

    pub fn array(item: Codec) -> Self {
        Codec::Array { subcodec: Box::new(item) }
    }

    pub fn set(item: Codec) -> Self {
        Codec::Set { subcodec: Box::new(item) }
    }

    pub fn range(item: Codec) -> Self {
        Codec::Range { subcodec: Box::new(item) }
    }
}

/// Analyzer output for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTypes {
    pub cardinality: Cardinality,
    /// ReScript type reference for the arguments, absent (or `"null"`) when
    /// the query takes none.
    #[serde(default)]
    pub args: Option<String>,
    pub result_codec: Codec,
    /// Definitions the analyzer already rendered; emitted ahead of walked records.
    #[serde(default)]
    pub distinct_types: Vec<String>,
}

impl QueryTypes {
    pub fn has_args(&self) -> bool {
        self.args.as_deref().is_some_and(|a| a != "null")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub binding_name: String,
    pub query: String,
    pub types: QueryTypes,
}
