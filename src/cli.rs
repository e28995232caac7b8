//! Minimal CLI: (json-schema | model) → rendered schema text
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::Value;

use crate::render::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// render a nested type definition (JSON Schema or model file) as an indented, prompt-ready schema
#[derive(Parser, Debug)]
#[command(name = "shape-schema", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v debug, -vv trace of every rendered field); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// render JSON Schema documents (tool parameters, schemars output, ...)
    JsonSchema(JsonSchemaOut),
    /// render model definition files ({"root": .., "records": {..}})
    Model(ModelOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON), one document per line
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /tools/0/parameters)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every result is rendered
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct JsonSchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// render non-object root schemas as a bare type instead of failing
    #[arg(long)]
    lenient: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root record name (defaults to the model's `root`, then its first record)
    #[arg(long)]
    root: Option<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document and where it came from.
#[derive(Debug, Clone)]
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut docs = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            for (label, value) in parse_source(&source, &source_path_str, self.ndjson)? {
                match self.jq_expr.as_ref() {
                    None => docs.push(Document { label, value }),
                    Some(jq_expr) => {
                        let results = crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                            format!("failed to apply jq expression to source file ({label})")
                        })?;
                        for (i, value) in results.into_iter().enumerate() {
                            docs.push(Document { label: format!("{label} | jq #{i}"), value });
                        }
                    }
                }
            }
        }
        tracing::debug!(documents = docs.len(), "loaded input documents");
        Ok(docs)
    }

    fn pointer(&self) -> &str {
        self.json_pointer.as_deref().unwrap_or("")
    }
}

impl JsonSchemaOut {
    fn render(&self, doc: &Document) -> Result<String> {
        let schema = crate::json_schema::lower_schema_at(&doc.value, self.input_settings.pointer())
            .with_context(|| format!("invalid JSON schema ({})", doc.label))?;
        self.finish(schema, &doc.label)
    }

    fn finish(&self, schema: Schema, label: &str) -> Result<String> {
        if self.lenient {
            return Ok(schema.render_type());
        }
        schema.render().with_context(|| format!("cannot render ({label}); pass --lenient to render non-object roots"))
    }
}

impl ModelOut {
    fn render(&self, doc: &Document) -> Result<String> {
        let pointer = self.input_settings.pointer();
        let node = doc
            .value
            .pointer(pointer)
            .ok_or_else(|| anyhow!("no value at JSON pointer `{pointer}` ({})", doc.label))?;
        let model = crate::model::model_from_value(node.clone())
            .with_context(|| format!("invalid model file ({})", doc.label))?;
        let schema = model
            .schema(self.root.as_deref())
            .with_context(|| format!("invalid model file ({})", doc.label))?;
        schema.render().with_context(|| format!("cannot render ({})", doc.label))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        let (rendered, out) = match &self.cmd {
            Command::JsonSchema(target) => {
                let docs = target.input_settings.load_documents()?;
                (render_all(&docs, |doc| target.render(doc))?, target.out.as_ref())
            }
            Command::Model(target) => {
                let docs = target.input_settings.load_documents()?;
                (render_all(&docs, |doc| target.render(doc))?, target.out.as_ref())
            }
        };
        let text = rendered.join("\n\n");
        match out {
            Some(out) => write_output(out, &text),
            None => {
                println!("{text}");
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Render every document independently; output order follows input order.
fn render_all<F>(docs: &[Document], render: F) -> Result<Vec<String>>
where
    F: Fn(&Document) -> Result<String> + Sync + Send,
{
    if docs.is_empty() {
        bail!("no input documents");
    }
    docs.par_iter().map(render).collect()
}

fn parse_source(source: &str, source_path_str: &str, ndjson: bool) -> Result<Vec<(String, Value)>> {
    if !ndjson {
        let value = serde_json::from_str::<Value>(source)
            .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
        return Ok(vec![(source_path_str.to_string(), value)]);
    }
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let label = format!("{source_path_str}:{}", i + 1);
            let value = serde_json::from_str::<Value>(line)
                .with_context(|| format!("failed to parse NDJSON line ({label})"))?;
            Ok((label, value))
        })
        .collect()
}

fn write_output(out: &Path, text: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory ({})", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write output ({})", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.append(&mut matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
