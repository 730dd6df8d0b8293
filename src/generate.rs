//! Per-file generation: read → extract → analyze → emit → write.
//!
//! Files are processed in parallel and independently; a failure in one file
//! is recorded in the report and never stops the others.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::analysis::AnalysisCatalog;
use crate::discover;
use crate::emit::{emit_file, output_path_for};
use crate::error::{GenError, Result};
use crate::extract::extract_queries;
use crate::walk::GenerationOptions;

pub const HEADER_COMMENT: &str =
    "// GENERATED by rescript-querygen. Do not edit; run `rescript-querygen generate` to re-generate.\n\n";

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    /// Restrict generation to these sources; empty means discover under `root`.
    pub files: Vec<PathBuf>,
    pub options: GenerationOptions,
}

impl GenerateConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            out_dir: root.join(discover::GENERATED_DIR),
            root,
            files: Vec::new(),
            options: GenerationOptions::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// `(source, written output)` pairs.
    pub written: Vec<(PathBuf, PathBuf)>,
    /// Sources without any extension point.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, GenError)>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Written(PathBuf),
    Skipped,
}

pub fn generate(config: &GenerateConfig, catalog: &AnalysisCatalog) -> Result<GenerationReport> {
    let sources = if config.files.is_empty() {
        discover::find_sources(&config.root, &config.out_dir)?
    } else {
        config.files.clone()
    };
    tracing::info!(count = sources.len(), root = %config.root.display(), "generating query modules");

    let mut report = GenerationReport::default();

    // Outputs are named after the source's base name only, so two sources in
    // different directories can map to the same file.
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut runnable = Vec::with_capacity(sources.len());
    for source in sources {
        let output = output_path_for(&source);
        match claimed.get(&output) {
            Some(first) => {
                let error = GenError::OutputCollision { output, first: first.clone() };
                tracing::error!(source = %source.display(), %error, "skipping file");
                report.failed.push((source, error));
            }
            None => {
                claimed.insert(output, source.clone());
                runnable.push(source);
            }
        }
    }

    let outcomes = runnable
        .par_iter()
        .map(|source| (source.clone(), process_file(source, config, catalog)))
        .collect::<Vec<_>>();

    for (source, outcome) in outcomes {
        match outcome {
            Ok(Outcome::Written(output)) => report.written.push((source, output)),
            Ok(Outcome::Skipped) => report.skipped.push(source),
            Err(error) => {
                tracing::error!(source = %display_relative(&config.root, &source), %error, "error in file");
                report.failed.push((source, error));
            }
        }
    }
    Ok(report)
}

fn process_file(source: &Path, config: &GenerateConfig, catalog: &AnalysisCatalog) -> Result<Outcome> {
    let text = std::fs::read_to_string(source).map_err(|e| GenError::io(source, e))?;
    let queries = extract_queries(&text);
    if queries.is_empty() {
        tracing::trace!(source = %source.display(), "no extension points");
        return Ok(Outcome::Skipped);
    }
    tracing::debug!(source = %source.display(), queries = queries.len(), "analyzing");

    let descriptors = queries
        .iter()
        .map(|q| catalog.analyze(q))
        .collect::<Result<Vec<_>>>()?;
    let module = emit_file(source, &descriptors, config.options)?;

    std::fs::create_dir_all(&config.out_dir).map_err(|e| GenError::io(&config.out_dir, e))?;
    let output = config.out_dir.join(&module.output_path);
    std::fs::write(&output, format!("{HEADER_COMMENT}{}", module.text))
        .map_err(|e| GenError::io(&output, e))?;
    Ok(Outcome::Written(output))
}

pub fn display_relative(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}
