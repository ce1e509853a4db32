//! Minimal CLI: schemas → (codec module | cycle report)
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use crate::schema::{SchemaNode, sanitize};
use crate::store::SchemaStore;
use crate::synth::{Compiler, Options};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile Avro-style schemas into ready-made serialize/deserialize codec modules
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile a root schema into a loadable Rust codec module
    Codec(CodecOut),
    /// print the flattened namespace and its cycle set as JSON
    Cycles(CyclesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// disable logical type support (decimal, uuid, date, ...)
    #[arg(long, default_value_t = false)]
    no_logical: bool,
}

#[derive(Args, Debug)]
struct CodecOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root type full name (defaults to the first document's name)
    #[arg(long)]
    root: Option<String>,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// compile every named type in the namespace, one module per type
    #[arg(long, default_value_t = false)]
    all: bool,

    /// output directory for --all
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CyclesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CycleReport {
    types: Vec<String>,
    cycles: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Load every input document as a `(name, schema)` pair. Anonymous
    /// top-level schemas are named after their file stem.
    fn load_documents(&self) -> anyhow::Result<Vec<(String, SchemaNode)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut docs = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read schema file {source_path_str}"))?;
            let json_value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON schema file {source_path_str}"))?;
            let schema = SchemaNode::parse(&json_value)
                .with_context(|| format!("invalid schema in {source_path_str}"))?;
            let name = schema
                .name()
                .map(str::to_string)
                .or_else(|| {
                    source_path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().to_string())
                })
                .with_context(|| format!("cannot derive a name for {source_path_str}"))?;
            docs.push((name, schema));
        }
        Ok(docs)
    }

    fn options(&self) -> Options {
        Options { logical_types: !self.no_logical }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Codec(target) => run_codec(target),
            Command::Cycles(target) => run_cycles(target),
        }
    }
}

fn run_codec(target: &CodecOut) -> anyhow::Result<()> {
    let docs = target.input_settings.load_documents()?;
    anyhow::ensure!(!docs.is_empty(), "no input schemas");
    let first_name = docs[0].0.clone();
    let store = SchemaStore::build(docs);
    let compiler = Compiler::new(store, target.input_settings.options());

    if target.all {
        let out_dir = target
            .out_dir
            .as_ref()
            .context("--all requires --out-dir")?;
        std::fs::create_dir_all(out_dir)?;
        // Independent roots: each compile owns its session, the compiler is
        // a shared immutable snapshot.
        let roots: Vec<String> = compiler.store().names().map(str::to_string).collect();
        let results: Vec<anyhow::Result<PathBuf>> = roots
            .par_iter()
            .map(|root| {
                let artifact = compiler.compile(root)?;
                let module_src = crate::codec_module_source(&artifact, root);
                let path = out_dir.join(format!("{}.rs", sanitize(root)));
                std::fs::write(&path, module_src)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                Ok(path)
            })
            .collect();
        for (root, result) in roots.iter().zip(results) {
            match result {
                Ok(path) => eprintln!("{} {root} -> {}", "compiled".green(), path.display()),
                Err(error) => anyhow::bail!("{root}: {error:#}"),
            }
        }
        return Ok(());
    }

    let root = target.root.clone().unwrap_or(first_name);
    let artifact = compiler
        .compile(&root)
        .with_context(|| format!("failed to compile `{root}`"))?;
    let module_src = crate::codec_module_source(&artifact, &root);
    write_or_print(target.out.as_deref(), &module_src)
}

fn run_cycles(target: &CyclesOut) -> anyhow::Result<()> {
    let docs = target.input_settings.load_documents()?;
    let store = SchemaStore::build(docs);
    let compiler = Compiler::new(store, target.input_settings.options());
    let report = CycleReport {
        types: compiler.store().names().map(str::to_string).collect(),
        cycles: compiler.cycles().iter().cloned().collect(),
    };
    let report_src = serde_json::to_string_pretty(&report)?;
    write_or_print(target.out.as_deref(), &report_src)
}

fn write_or_print(out: Option<&std::path::Path>, content: &str) -> anyhow::Result<()> {
    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, content)
            .with_context(|| format!("failed to write {}", out.display()))?;
    } else {
        println!("{content}");
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
