//! fbxattr CLI
//!
//! Imports the FBX models of a project directory and generates their
//! attribute containers. Also inspects FBX scenes and lists filter rules.

mod schemas;

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use fbxattr_core::path::{file_stem, has_extension, normalize_path};
use fbxattr_parsers::logging::{self, TracingConfig};
use fbxattr_parsers::fbx::{self, FbxVersion};
use fbxattr_parsers::{FbxSceneReader, HumanReadable, Scene};
use fbxattr_pipeline::{
    FsAssetDatabase, ImportContext, ImportTrigger, MaterializeOutcome, PipelineConfig,
    GLOBAL_REGISTRY,
};

/// fbxattr - generate typed attribute assets from FBX custom properties
#[derive(Parser)]
#[command(name = "fbxattr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project root; model and asset paths are relative to it
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Configuration file (defaults to fbxattr.yaml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for structured data
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import models and generate their attribute containers
    Import(ImportArgs),

    /// Show the scene graph of an FBX file
    Inspect(InspectArgs),

    /// List registered filter rules
    Rules,
}

#[derive(Args)]
struct ImportArgs {
    /// Models to import; every model under the project when omitted
    paths: Vec<PathBuf>,

    /// Only show which containers would be generated
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Path to the FBX file
    path: PathBuf,

    /// Show the raw node records instead of the scene graph
    #[arg(long)]
    raw: bool,
}

fn setup_logging(verbosity: u8, config: &PipelineConfig) {
    let mut tracing_config = TracingConfig {
        show_target: verbosity >= 1,
        ..TracingConfig::default()
    };
    if let Some(level) = &config.log_level {
        tracing_config.default_level = level.clone();
    }

    logging::init_with_config(tracing_config.with_verbosity(verbosity));
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration: {:?}", path)),
        None => PipelineConfig::load_from_project(&cli.project)
            .with_context(|| format!("Failed to load configuration from {:?}", cli.project)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    setup_logging(cli.verbose, &config);

    let registered = schemas::register_all(&GLOBAL_REGISTRY);
    debug!(registered, "Registered container types");

    match cli.command {
        Commands::Import(ref args) => cmd_import(args, &cli.project, config, cli.format),
        Commands::Inspect(ref args) => cmd_inspect(args, cli.format),
        Commands::Rules => cmd_rules(cli.format),
    }
}

fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

// ============================================================================
// Import
// ============================================================================

#[derive(Serialize)]
struct OutcomeSummary {
    model: String,
    target: String,
    container: &'static str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&MaterializeOutcome> for OutcomeSummary {
    fn from(outcome: &MaterializeOutcome) -> Self {
        let request = &outcome.request;
        let (records, created, error) = match &outcome.result {
            Ok(report) => (Some(report.records), Some(report.created), None),
            Err(e) => (None, None, Some(e.to_string())),
        };

        Self {
            model: request.model_path.clone(),
            target: request.target_path.clone(),
            container: request.kind.type_name(),
            ok: outcome.is_ok(),
            records,
            created,
            error,
        }
    }
}

fn cmd_import(args: &ImportArgs, project: &Path, config: PipelineConfig, format: OutputFormat) -> Result<()> {
    if !project.is_dir() {
        bail!("Project directory not found: {:?}", project);
    }

    let models = if args.paths.is_empty() {
        let mut found = Vec::new();
        find_models(project, project, &config.model_extension, &mut found)?;
        found.sort();
        found
    } else {
        args.paths
            .iter()
            .map(|path| project_relative(project, path))
            .collect::<Result<Vec<_>>>()?
    };

    if models.is_empty() {
        warn!(project = %project.display(), "No models found");
        return Ok(());
    }

    let pretty_json = config.pretty_json;
    let mut trigger = ImportTrigger::new(&GLOBAL_REGISTRY, config);

    for model in &models {
        let scheduled = trigger.on_postprocess_model(file_stem(model), model);
        debug!(model = %model, scheduled, "Imported model");
    }

    if args.dry_run {
        for request in trigger.pending() {
            println!("{} -> {} ({})", request.model_path, request.target_path, request.kind.type_name());
        }
        return Ok(());
    }

    info!(models = models.len(), pending = trigger.pending_len(), "Generating containers");

    let mut database = FsAssetDatabase::new(project).with_pretty_json(pretty_json);
    let scenes = FbxSceneReader::new(project);
    let mut ctx = ImportContext::new(&mut database, &scenes);
    let outcomes = trigger.run_deferred(&mut ctx);

    let summaries: Vec<OutcomeSummary> = outcomes.iter().map(OutcomeSummary::from).collect();
    match format {
        OutputFormat::Text => {
            for summary in &summaries {
                match (&summary.error, summary.created) {
                    (Some(error), _) => println!("FAILED  {}: {}", summary.target, error),
                    (None, Some(true)) => println!(
                        "created {} ({} records)",
                        summary.target,
                        summary.records.unwrap_or(0)
                    ),
                    (None, _) => println!(
                        "updated {} ({} records)",
                        summary.target,
                        summary.records.unwrap_or(0)
                    ),
                }
            }
        }
        _ => print_structured(&summaries, format)?,
    }

    let failed = summaries.iter().filter(|s| !s.ok).count();
    if failed > 0 {
        bail!("{} of {} containers failed", failed, summaries.len());
    }
    Ok(())
}

/// Collect model files below `dir` as project-relative paths
fn find_models(root: &Path, dir: &Path, extension: &str, found: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            find_models(root, &path, extension, found)?;
            continue;
        }

        let relative = project_relative(root, &path)?;
        if has_extension(&relative, extension) {
            found.push(relative);
        }
    }
    Ok(())
}

fn project_relative(project: &Path, path: &Path) -> Result<String> {
    let relative = if path.is_absolute() {
        let project = project
            .canonicalize()
            .with_context(|| format!("Failed to resolve project: {:?}", project))?;
        let path = path
            .canonicalize()
            .with_context(|| format!("File not found: {:?}", path))?;
        path.strip_prefix(&project)
            .with_context(|| format!("{:?} is outside the project", path))?
            .to_path_buf()
    } else {
        let stripped = path.strip_prefix(project).unwrap_or(path);
        resolve_inside(stripped).with_context(|| format!("{:?} is outside the project", path))?
    };

    Ok(normalize_path(&relative.to_string_lossy()))
}

/// Resolve `.` and `..` without leaving the directory `path` is relative to
fn resolve_inside(path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

// ============================================================================
// Inspect
// ============================================================================

fn cmd_inspect(args: &InspectArgs, format: OutputFormat) -> Result<()> {
    let path = &args.path;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }
    if !has_extension(&path.to_string_lossy(), fbx::FBX_EXTENSION) {
        warn!(path = %path.display(), "File does not have the .fbx extension");
    }

    let file = fbx::open(path).with_context(|| format!("Failed to load FBX file: {:?}", path))?;

    if args.raw {
        return match format {
            OutputFormat::Text => {
                println!("FBX {}", fbx::raw_version(file.version));
                print!("{}", fbx::dump_records(&file.document));
                Ok(())
            }
            _ => print_structured(&fbx::records(&file.document), format),
        };
    }

    let scene = Scene::from_document(&file.document);

    match format {
        OutputFormat::Text => {
            print_document_summary(file.version, &scene);
            print!("{}", scene.to_readable_string());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scene.to_json())?),
        OutputFormat::Yaml => print!("{}", scene.to_yaml()),
    }
    Ok(())
}

fn print_document_summary(version: FbxVersion, scene: &Scene) {
    let meshes = scene
        .pre_order()
        .into_iter()
        .filter(|&id| scene.node(id).mesh.is_some())
        .count();

    println!("FBX Version: {}", fbx::raw_version(version));
    println!("Nodes:       {}", scene.len());
    println!("Meshes:      {}", meshes);
    println!();
}

// ============================================================================
// Rules
// ============================================================================

fn cmd_rules(format: OutputFormat) -> Result<()> {
    let rules = GLOBAL_REGISTRY.list();

    match format {
        OutputFormat::Text => {
            if rules.is_empty() {
                println!("No filter rules registered");
                return Ok(());
            }
            println!("{:<24} {:<16} {:<28} {}", "PATTERN", "SUFFIX", "CONTAINER", "RECORD");
            for rule in &rules {
                let marker = if rule.active { "" } else { "  (inactive)" };
                println!(
                    "{:<24} {:<16} {:<28} {}{}",
                    rule.pattern, rule.suffix, rule.container, rule.record, marker
                );
            }
        }
        _ => print_structured(&rules, format)?,
    }
    Ok(())
}
