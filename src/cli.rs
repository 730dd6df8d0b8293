//! Minimal CLI: (generate | render) ReScript query modules
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;

use crate::analysis::AnalysisCatalog;
use crate::codec::QueryDescriptor;
use crate::discover;
use crate::emit;
use crate::generate::{self, GenerateConfig};
use crate::walk::GenerationOptions;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate typed ReScript modules for `%edgedb(...)` queries from analyzed codec trees
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// scan a project for `%edgedb(...)` extension points and write one module per source file
    Generate(GenerateOut),
    /// render query descriptor(s) from a JSON file
    Render(RenderOut),
}

#[derive(Args, Debug, Clone, Copy)]
struct TypeSettings {
    /// represent AT_MOST_ONE fields as omittable (`field?: t`) instead of `Js.Nullable.t<t>`
    #[arg(long, default_value_t = false)]
    optional_nulls: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    type_settings: TypeSettings,

    /// analyzer output: JSON object mapping query text to its analyzed types
    #[arg(long)]
    analysis: PathBuf,

    /// project root (default: nearest ancestor with an `edgedb.toml`, else the working directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// output directory (default: `<root>/__generated__`)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// only these sources; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    file: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct RenderOut {
    #[command(flatten)]
    type_settings: TypeSettings,

    /// JSON file holding one query descriptor or an array of them
    #[arg(long)]
    descriptor: PathBuf,

    /// source file the queries belong to; names the output module file
    #[arg(long, default_value = "Queries.res")]
    source: PathBuf,

    /// output .res file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(QueryDescriptor),
    Many(Vec<QueryDescriptor>),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeSettings {
    fn options(&self) -> GenerationOptions {
        GenerationOptions { optional_nulls: self.optional_nulls }
    }
}

impl GenerateOut {
    fn config(&self) -> Result<GenerateConfig> {
        let root = match self.root.as_ref() {
            Some(root) => root.clone(),
            None => {
                let cwd = std::env::current_dir().context("failed to read working directory")?;
                match discover::find_project_root(&cwd) {
                    Some(root) => {
                        tracing::info!(root = %root.display(), "detected project root via {}", discover::PROJECT_MANIFEST);
                        root
                    }
                    None => {
                        tracing::warn!(
                            root = %cwd.display(),
                            "no `{}` found, using the working directory as root",
                            discover::PROJECT_MANIFEST
                        );
                        cwd
                    }
                }
            }
        };
        let files = resolve_source_patterns(&self.file).context("failed to resolve --file paths")?;
        let mut config = GenerateConfig::new(root);
        if let Some(out_dir) = self.out_dir.as_ref() {
            config.out_dir = out_dir.clone();
        }
        config.files = files;
        config.options = self.type_settings.options();
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Generate(target) => {
                let config = target.config()?;
                let catalog = AnalysisCatalog::load(&target.analysis)?;
                if catalog.is_empty() {
                    tracing::warn!(path = %target.analysis.display(), "analysis catalog is empty");
                }

                let report = generate::generate(&config, &catalog)?;
                if report.written.is_empty() && report.failed.is_empty() {
                    println!("No queries found in project");
                    return Ok(ExitCode::SUCCESS);
                }

                println!("Generated files for the following sources:");
                for (source, output) in &report.written {
                    println!(
                        "   {} {} {}",
                        generate::display_relative(&config.root, source),
                        "→".dimmed(),
                        generate::display_relative(&config.root, output).green()
                    );
                }
                for (source, error) in &report.failed {
                    eprintln!(
                        "{} './{}': {error}",
                        "Error in file".red().bold(),
                        source.strip_prefix(&config.root).unwrap_or(source).display()
                    );
                }
                Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
            Command::Render(target) => {
                let descriptors = match crate::path_de::read_json::<OneOrMany>(&target.descriptor)? {
                    OneOrMany::One(d) => vec![d],
                    OneOrMany::Many(ds) => ds,
                };
                let module = emit::emit_file(&target.source, &descriptors, target.type_settings.options())?;

                if let Some(out) = target.out.as_ref() {
                    write_with_parents(out, &module.text)?;
                } else {
                    println!("{}", module.text);
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_with_parents(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

/// `--file` values: literal paths pass through, anything with glob syntax
/// must match at least one file.
fn resolve_source_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for pattern in patterns.iter().map(AsRef::as_ref) {
        if !pattern.contains(['*', '?', '[', '{']) {
            sources.push(PathBuf::from(pattern));
            continue;
        }
        let before = sources.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern `{pattern}`"))? {
            sources.push(entry.with_context(|| format!("failed to read a match of `{pattern}`"))?);
        }
        if sources.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(sources)
}
