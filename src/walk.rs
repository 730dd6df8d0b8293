//! Codec tree → ReScript type references.
//!
//! The walker is pure apart from one caller-owned accumulator,
//! [`DistinctTypes`], which collects every record definition discovered while
//! walking a single query. Records are named from the field path that reached
//! them, never from their structure, so two different shapes reached through
//! the same path get the same name (see `same_path_different_shape_collides`).
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::{Cardinality, Codec, Field, NumericWidth, Refinement, Scalar};
use crate::error::{GenError, Result};

/// Name of the record reached through the empty path: the query result itself.
pub const ROOT_TYPE_NAME: &str = "response";

/// Root record name when the result wraps its records (`array<…>`, tuples),
/// leaving `response` free to alias the whole result type.
pub const ROOT_ITEM_TYPE_NAME: &str = "responseItem";

const NULL_TYPE: &str = "Js.Nullable.null";

static BARE_VARIANT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static RECORD_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-zA-Z0-9_]*$").unwrap());

const RESERVED_WORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "constraint", "else", "exception", "external",
    "false", "for", "if", "in", "include", "lazy", "let", "module", "mutable", "of", "open",
    "private", "rec", "switch", "true", "try", "type", "when", "while", "with",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Render AT_MOST_ONE fields as omittable (`name?: T`) instead of
    /// required-but-nullable (`name: Js.Nullable.t<T>`).
    pub optional_nulls: bool,
}

/// Insertion-ordered, text-deduplicated record definitions of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctTypes {
    defs: IndexSet<String>,
}

impl DistinctTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an identical definition was already present.
    pub fn insert(&mut self, def: String) -> bool {
        self.defs.insert(def)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(String::as_str)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.defs.iter().any(|d| declared_name(d) == Some(name))
    }

    /// Names declared by more than one (textually different) definition.
    pub fn colliding_names(&self) -> Vec<&str> {
        let mut seen = IndexSet::new();
        let mut dups = IndexSet::new();
        for name in self.defs.iter().filter_map(|d| declared_name(d)) {
            if !seen.insert(name) {
                dups.insert(name);
            }
        }
        dups.into_iter().collect()
    }
}

fn declared_name(def: &str) -> Option<&str> {
    let rest = def.trim_start().strip_prefix("type ")?;
    let end = rest.find(|c: char| c == ' ' || c == '=')?;
    Some(&rest[..end])
}

/// Record name for a field path: segments joined by `_`, first character
/// lower-cased. The empty path names the query result. Characters a ReScript
/// type name cannot hold become `_` (`@rank` → `_rank`), reserved words get a
/// trailing `_`.
pub fn path_to_name(path: &[String]) -> String {
    if path.is_empty() {
        return ROOT_TYPE_NAME.to_string();
    }
    sanitize_ident(&path.join("_"))
}

/// Root record name for a result codec; see [`ROOT_ITEM_TYPE_NAME`].
pub fn root_name_for(codec: &Codec) -> &'static str {
    match codec {
        Codec::Object { .. } | Codec::NamedTuple { .. } => ROOT_TYPE_NAME,
        _ => ROOT_ITEM_TYPE_NAME,
    }
}

fn sanitize_ident(raw: &str) -> String {
    let mut ident = lower_first(raw)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RESERVED_WORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Container for a value of the given cardinality.
pub fn wrap_cardinality(ty: &str, cardinality: Cardinality) -> String {
    match cardinality {
        Cardinality::One => ty.to_string(),
        Cardinality::Many | Cardinality::AtLeastOne => format!("array<{ty}>"),
        Cardinality::AtMostOne => format!("Js.Nullable.t<{ty}>"),
    }
}

/// Driver primitive → ReScript type. Unknown primitives pass through.
pub fn primitive_type(primitive: &str) -> &str {
    match primitive {
        "number" => "float",
        "boolean" => "bool",
        "string" => "string",
        other => other,
    }
}

pub fn scalar_type(scalar: &Scalar) -> String {
    match &scalar.refinement {
        Some(Refinement::Enum { values }) => poly_variant(values),
        Some(Refinement::Numeric { width: NumericWidth::Int16 | NumericWidth::Int32 }) => "int".to_string(),
        Some(Refinement::Numeric { width: NumericWidth::Bigint }) => "bigint".to_string(),
        Some(Refinement::Numeric { .. }) | None => primitive_type(&scalar.primitive).to_string(),
    }
}

fn poly_variant(values: &[String]) -> String {
    let tags = values
        .iter()
        .map(|v| {
            if BARE_VARIANT_TAG.is_match(v) {
                format!("#{v}")
            } else {
                format!("#\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect::<Vec<_>>();
    format!("[{}]", tags.join(" | "))
}

/// Record label for a field; keys that are not valid labels keep their wire
/// name through `@as`.
fn record_label(name: &str) -> String {
    if RECORD_LABEL.is_match(name) && !RESERVED_WORDS.contains(&name) {
        return name.to_string();
    }
    let wire = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("@as(\"{wire}\") {}", sanitize_ident(name))
}

pub struct Walker<'a> {
    options: GenerationOptions,
    types: &'a mut DistinctTypes,
    root_name: &'static str,
}

impl<'a> Walker<'a> {
    pub fn new(options: GenerationOptions, types: &'a mut DistinctTypes) -> Self {
        Self { options, types, root_name: ROOT_TYPE_NAME }
    }

    /// Name used for a record reached through the empty path.
    pub fn with_root_name(mut self, root_name: &'static str) -> Self {
        self.root_name = root_name;
        self
    }

    /// Type reference for `codec` reached through `path`.
    pub fn walk(&mut self, codec: &Codec, path: &[String]) -> Result<String> {
        match codec {
            Codec::Null => Ok(NULL_TYPE.to_string()),
            Codec::Scalar(scalar) => Ok(scalar_type(scalar)),
            Codec::Object { fields, subcodecs } => self.record(codec.kind(), fields, subcodecs, path),
            Codec::NamedTuple { names, subcodecs } => {
                let fields = names
                    .iter()
                    .map(|name| Field { name: name.clone(), cardinality: Cardinality::One })
                    .collect::<Vec<_>>();
                self.record(codec.kind(), &fields, subcodecs, path)
            }
            Codec::Array { subcodec } => Ok(format!("array<{}>", self.walk(subcodec, path)?)),
            Codec::Tuple { subcodecs } => {
                let elems = subcodecs
                    .iter()
                    .map(|c| self.walk(c, path))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", elems.join(", ")))
            }
            Codec::Range { subcodec } => match subcodec.as_ref() {
                Codec::Scalar(scalar) => Ok(format!("Range.t<{}>", scalar_type(scalar))),
                other => Err(GenError::InvalidRangeSubtype { found: other.kind() }),
            },
            // Sets are unwrapped by the owning field; anywhere else they are
            // a shape the analyzer should not produce.
            Codec::Set { .. } => Err(GenError::UnsupportedCodecKind { kind: codec.kind() }),
        }
    }

    fn record(
        &mut self,
        kind: &'static str,
        fields: &[Field],
        subcodecs: &[Codec],
        path: &[String],
    ) -> Result<String> {
        if fields.len() != subcodecs.len() {
            return Err(GenError::MismatchedSubcodecs {
                kind,
                names: fields.len(),
                subcodecs: subcodecs.len(),
            });
        }
        let name = if path.is_empty() {
            self.root_name.to_string()
        } else {
            path_to_name(path)
        };

        let mut lines = Vec::with_capacity(fields.len());
        for (field, subcodec) in fields.iter().zip(subcodecs) {
            let subcodec = match subcodec {
                Codec::Set { subcodec } if field.cardinality.is_multi() => subcodec.as_ref(),
                Codec::Set { .. } => {
                    return Err(GenError::InvalidSetCardinality {
                        field: field.name.clone(),
                        cardinality: field.cardinality,
                    });
                }
                other => other,
            };
            let mut field_path = path.to_vec();
            field_path.push(field.name.clone());
            let elem = self.walk(subcodec, &field_path)?;
            lines.push(self.render_field(field, &elem));
        }

        self.types.insert(format!("  type {name} = {{\n{}\n  }}", lines.join("\n")));
        Ok(name)
    }

    fn render_field(&self, field: &Field, elem: &str) -> String {
        let label = record_label(&field.name);
        if self.options.optional_nulls && field.cardinality == Cardinality::AtMostOne {
            format!("    {label}?: {elem},")
        } else {
            format!("    {label}: {},", wrap_cardinality(elem, field.cardinality))
        }
    }
}

/// Walk `codec` from the root path into a fresh accumulator.
pub fn walk_root(codec: &Codec, options: GenerationOptions) -> Result<(String, DistinctTypes)> {
    let mut types = DistinctTypes::new();
    let ty = Walker::new(options, &mut types)
        .with_root_name(root_name_for(codec))
        .walk(codec, &[])?;
    Ok((ty, types))
}
