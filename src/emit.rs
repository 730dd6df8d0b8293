//! Query descriptor → self-contained ReScript module.
use std::path::{Path, PathBuf};

use crate::codec::{Cardinality, QueryDescriptor};
use crate::error::Result;
use crate::walk::{DistinctTypes, GenerationOptions, ROOT_TYPE_NAME, Walker, root_name_for};

/// Suffix appended to a source file's base name to name its generated module file.
pub const OUTPUT_SUFFIX: &str = "__edgeDbQueries.res";

const ARGS_TYPE_NAME: &str = "args";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedModule {
    /// Relative to the output directory.
    pub output_path: PathBuf,
    pub text: String,
}

pub fn output_path_for(source: &Path) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = base.strip_suffix(".res").unwrap_or(&base);
    PathBuf::from(format!("{base}{OUTPUT_SUFFIX}"))
}

pub fn module_name(binding_name: &str) -> String {
    let mut chars = binding_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Executor method for the query's overall cardinality.
pub fn call_variant(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::One => "queryRequiredSingle",
        Cardinality::AtMostOne => "querySingle",
        Cardinality::Many | Cardinality::AtLeastOne => "query",
    }
}

/// Trimmed query text, safe inside a ReScript template literal.
pub fn escape_query(query: &str) -> String {
    query.trim().replace('\\', "\\\\").replace('`', "\\`")
}

/// Render the module for one query.
pub fn render_query_module(query: &QueryDescriptor, options: GenerationOptions) -> Result<String> {
    let mut types = DistinctTypes::new();
    for def in &query.types.distinct_types {
        types.insert(def.clone());
    }
    let codec = &query.types.result_codec;
    let result_ty = Walker::new(options, &mut types)
        .with_root_name(root_name_for(codec))
        .walk(codec, &[])?;

    for name in types.colliding_names() {
        tracing::warn!(
            binding = %query.binding_name,
            name,
            "several record shapes share the same name; the generated module will not compile"
        );
    }

    let mut blocks = types.iter().map(str::to_string).collect::<Vec<_>>();
    if result_ty != ROOT_TYPE_NAME && !types.declares(ROOT_TYPE_NAME) {
        blocks.push(format!("  type {ROOT_TYPE_NAME} = {result_ty}"));
    }

    let args = query.types.args.as_deref().filter(|_| query.types.has_args());
    if let Some(args_ty) = args {
        if args_ty != ARGS_TYPE_NAME && !types.declares(ARGS_TYPE_NAME) {
            blocks.push(format!("  type {ARGS_TYPE_NAME} = {args_ty}"));
        }
    }

    let (args_param, args_arg) = match args {
        Some(_) => (format!(", args: {ARGS_TYPE_NAME}"), ", ~args"),
        None => (String::new(), ""),
    };

    let mut out = String::new();
    out.push_str(&format!("module {} = {{\n", module_name(&query.binding_name)));
    out.push_str(&blocks.join("\n\n"));
    out.push_str("\n\n");
    out.push_str(&format!(
        "  let query = (client: EdgeDB.Executor.t{args_param}): promise<{ROOT_TYPE_NAME}> => {{\n"
    ));
    out.push_str(&format!(
        "    client->EdgeDB.Executor.{}(`\\\n    {}`{args_arg})\n",
        call_variant(query.types.cardinality),
        escape_query(&query.query),
    ));
    out.push_str("  }\n}\n");
    Ok(out)
}

/// Render a single query into its own module file.
pub fn emit(source: &Path, query: &QueryDescriptor, options: GenerationOptions) -> Result<EmittedModule> {
    emit_file(source, std::slice::from_ref(query), options)
}

/// Render every query extracted from one source file into one module file.
/// The first failing query fails the whole file.
pub fn emit_file(
    source: &Path,
    queries: &[QueryDescriptor],
    options: GenerationOptions,
) -> Result<EmittedModule> {
    let modules = queries
        .iter()
        .map(|q| render_query_module(q, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(EmittedModule {
        output_path: output_path_for(source),
        text: modules.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Cardinality::*, Codec, QueryTypes};
    use crate::error::GenError;

    fn descriptor(binding: &str, query: &str, cardinality: Cardinality, codec: Codec) -> QueryDescriptor {
        QueryDescriptor {
            binding_name: binding.into(),
            query: query.into(),
            types: QueryTypes {
                cardinality,
                args: None,
                result_codec: codec,
                distinct_types: vec![],
            },
        }
    }

    #[test]
    fn required_single_record() {
        let codec = Codec::object([("id", One, Codec::scalar("std::uuid", "string"))]);
        let q = descriptor("findUser", "select User { id } limit 1", One, codec);
        let out = emit(Path::new("src/Users.res"), &q, GenerationOptions::default()).unwrap();
        assert_eq!(out.output_path, PathBuf::from("Users__edgeDbQueries.res"));
        assert_eq!(
            out.text,
            "module FindUser = {\n\
             \x20 type response = {\n\
             \x20   id: string,\n\
             \x20 }\n\
             \n\
             \x20 let query = (client: EdgeDB.Executor.t): promise<response> => {\n\
             \x20   client->EdgeDB.Executor.queryRequiredSingle(`\\\n\
             \x20   select User { id } limit 1`)\n\
             \x20 }\n\
             }\n"
        );
        assert_eq!(out.text.matches("type ").count(), 1);
    }

    #[test]
    fn optional_enum_result_gets_alias() {
        let codec = Codec::enumeration("default::Status", ["Open", "Closed", "in-progress"]);
        let q = descriptor("status", "select <Status>'Open'", AtMostOne, codec);
        let text = render_query_module(&q, GenerationOptions::default()).unwrap();
        assert!(text.contains(r##"  type response = [#Open | #Closed | #"in-progress"]"##));
        assert!(text.contains("EdgeDB.Executor.querySingle("));
    }

    #[test]
    fn multi_cardinality_uses_query() {
        for cardinality in [Many, AtLeastOne] {
            let q = descriptor("names", "select User.name", cardinality, Codec::scalar("std::str", "string"));
            let text = render_query_module(&q, GenerationOptions::default()).unwrap();
            assert!(text.contains("client->EdgeDB.Executor.query(`"));
            assert!(text.contains("  type response = string"));
        }
    }

    #[test]
    fn arguments_are_threaded_through() {
        let mut q = descriptor(
            "byId",
            "select User filter .id = <uuid>$id",
            Many,
            Codec::object([("id", One, Codec::scalar("std::uuid", "string"))]),
        );
        q.types.args = Some("{\"id\": string}".into());
        let text = render_query_module(&q, GenerationOptions::default()).unwrap();
        assert!(text.contains("  type args = {\"id\": string}"));
        assert!(text.contains("(client: EdgeDB.Executor.t, args: args): promise<response>"));
        assert!(text.contains("<uuid>$id`, ~args)"));
    }

    #[test]
    fn predeclared_args_are_not_aliased() {
        let mut q = descriptor("byId", "select 1", One, Codec::scalar("std::int64", "number"));
        q.types.args = Some("args".into());
        q.types.distinct_types = vec!["  type args = {\n    id: string,\n  }".into()];
        let text = render_query_module(&q, GenerationOptions::default()).unwrap();
        assert_eq!(text.matches("type args").count(), 1);
        assert!(text.starts_with("module ById = {\n  type args = {"));
    }

    #[test]
    fn array_of_records_result_is_aliased() {
        let codec = Codec::array(Codec::object([("id", One, Codec::scalar("std::uuid", "string"))]));
        let q = descriptor("ids", "select [User { id }]", One, codec);
        let text = render_query_module(&q, GenerationOptions::default()).unwrap();
        assert!(text.contains("  type responseItem = {\n    id: string,\n  }"));
        assert!(text.contains("  type response = array<responseItem>"));
        assert!(text.contains("promise<response>"));
        assert_eq!(text.matches("type response ").count(), 1);
    }

    #[test]
    fn tuple_with_record_result_is_aliased() {
        let codec = Codec::Tuple {
            subcodecs: vec![
                Codec::object([("id", One, Codec::scalar("std::uuid", "string"))]),
                Codec::scalar("std::str", "string"),
            ],
        };
        let q = descriptor("pair", "select (User { id }, 'x')", AtMostOne, codec);
        let text = render_query_module(&q, GenerationOptions::default()).unwrap();
        assert!(text.contains("  type responseItem = {"));
        assert!(text.contains("  type response = (responseItem, string)"));
        assert_eq!(text.matches("type response ").count(), 1);
    }

    #[test]
    fn query_text_is_escaped() {
        assert_eq!(escape_query("  select `a\\b`  \n"), "select \\`a\\\\b\\`");
    }

    #[test]
    fn one_output_file_per_source() {
        let a = descriptor("first", "select 1", One, Codec::scalar("std::int64", "number"));
        let b = descriptor("second", "select 'x'", One, Codec::scalar("std::str", "string"));
        let out = emit_file(Path::new("/abs/Queries.res"), &[a, b], GenerationOptions::default()).unwrap();
        assert_eq!(out.output_path, PathBuf::from("Queries__edgeDbQueries.res"));
        let first = out.text.find("module First = {").unwrap();
        let second = out.text.find("module Second = {").unwrap();
        assert!(first < second);
    }

    #[test]
    fn failing_query_fails_the_file() {
        let good = descriptor("good", "select 1", One, Codec::scalar("std::int64", "number"));
        let bad = descriptor(
            "bad",
            "select range(1, 2)",
            One,
            Codec::range(Codec::object([("x", One, Codec::Null)])),
        );
        let err = emit_file(Path::new("A.res"), &[good, bad], GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, GenError::InvalidRangeSubtype { .. }));
    }

    #[test]
    fn module_names_are_capitalized() {
        assert_eq!(module_name("getMovies"), "GetMovies");
        assert_eq!(module_name("X"), "X");
    }
}
