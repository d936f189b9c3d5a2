//! Shared pipeline helpers for CLI commands.
//!
//! Contains the steps every command runs: project root resolution, input
//! selection, loading the tracer output, the compile passes and diagnostic
//! rendering.

use std::path::{Path, PathBuf};

use weft_common::Interner;
use weft_config::{ProjectConfig, CONFIG_FILE_NAME};
use weft_diagnostics::{
    code, Diagnostic, DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer,
};
use weft_ir::Design;
use weft_lower::LoweredDesign;
use weft_source::{SourceDb, Span};

use crate::{GlobalArgs, ReportFormat};

/// A `weft.toml` and the directory it lives in.
#[derive(Debug)]
pub struct Project {
    /// Directory containing the configuration file.
    pub dir: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
}

/// Everything one run of the passes produced.
pub struct Compilation {
    /// Host files referenced by the input tree.
    pub source_db: SourceDb,
    /// Interner shared by all passes.
    pub interner: Interner,
    /// Collected diagnostics.
    pub sink: DiagnosticSink,
    /// The synthesized design, absent when the input could not be loaded.
    pub design: Option<Design>,
    /// The lowered design, absent when the input could not be loaded.
    pub lowered: Option<LoweredDesign>,
}

/// Walks up from `start` looking for the nearest directory containing `weft.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project named by `--config`, or the nearest `weft.toml` above
/// the current directory.
///
/// Without `--config`, a missing project file is not an error: commands can
/// still run on an explicit input with default settings.
pub fn load_project(global: &GlobalArgs) -> Result<Option<Project>, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let path = PathBuf::from(config_path);
        let (dir, file) = if path.is_dir() {
            (path.clone(), path.join(CONFIG_FILE_NAME))
        } else {
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (dir, path)
        };
        let config = weft_config::load_config_file(&file)?;
        return Ok(Some(Project { dir, config }));
    }
    match find_project_root(&std::env::current_dir()?) {
        Ok(dir) => {
            let config = weft_config::load_config(&dir)?;
            Ok(Some(Project { dir, config }))
        }
        Err(_) => Ok(None),
    }
}

/// Picks the input tree: the command-line argument, else `project.input`.
pub fn resolve_input(
    input: Option<&str>,
    project: Option<&Project>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match (input, project) {
        (Some(path), _) => Ok(PathBuf::from(path)),
        (None, Some(project)) => Ok(project.dir.join(&project.config.project.input)),
        (None, None) => {
            Err(format!("no input given and no {CONFIG_FILE_NAME} found to name one").into())
        }
    }
}

/// Loads `input` and runs elaboration, state synthesis and lowering.
///
/// A file that cannot be read or decoded becomes an `E100` diagnostic. Only
/// configuration problems and internal compiler errors return `Err`.
pub fn compile(
    input: &Path,
    project: Option<&Project>,
) -> Result<Compilation, Box<dyn std::error::Error>> {
    let compile_config = project
        .map(|p| p.config.compile.clone())
        .unwrap_or_default();
    let clocks = match project {
        Some(p) => weft_config::resolve_clocks(&p.config)?,
        None => Vec::new(),
    };

    let mut compilation = Compilation {
        source_db: SourceDb::new(),
        interner: Interner::new(),
        sink: DiagnosticSink::new(),
        design: None,
        lowered: None,
    };

    let (mut source, hash) = match weft_ast::load_design(input) {
        Ok(loaded) => loaded,
        Err(err) => {
            compilation.sink.emit(
                Diagnostic::error(code::E100, err.to_string(), Span::DUMMY)
                    .with_note(format!("while reading {}", input.display())),
            );
            return Ok(compilation);
        }
    };
    log::info!("loaded {} ({})", input.display(), hash.short());

    let base = input.parent().unwrap_or_else(|| Path::new("."));
    for file in &source.files {
        let path = Path::new(file);
        if path.is_relative() {
            compilation.source_db.register_path(&base.join(path));
        } else {
            compilation.source_db.register_path(path);
        }
    }
    if let Some(top) = project.and_then(|p| p.config.project.top.clone()) {
        source.name = top;
    }

    let interner = &compilation.interner;
    let sink = &compilation.sink;
    let mut design =
        weft_elaborate::elaborate(&source, &compile_config, &clocks, interner, sink)?;
    weft_fsm::synthesize_all(&mut design, &compile_config, interner, sink)?;
    let lowered = weft_lower::lower(&design, &compile_config, interner, sink)?;

    compilation.design = Some(design);
    compilation.lowered = Some(lowered);
    Ok(compilation)
}

/// Renders all diagnostics in the requested format.
///
/// Text goes to stderr, JSON lines to stdout. Returns the number rendered.
pub fn render_diagnostics(compilation: &Compilation, global: &GlobalArgs) -> usize {
    let diagnostics = compilation.sink.diagnostics();
    match global.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                eprintln!("{}", renderer.render(diag, &compilation.source_db));
            }
            if !global.quiet {
                eprintln!(
                    "   Result: {} error(s), {} warning(s)",
                    compilation.sink.error_count(),
                    compilation.sink.warning_count()
                );
            }
        }
        ReportFormat::Json => {
            print!(
                "{}",
                JsonRenderer.render_all(&diagnostics, &compilation.source_db)
            );
        }
    }
    diagnostics.len()
}

/// Process exit code for a finished compilation.
pub fn exit_code(compilation: &Compilation) -> i32 {
    if compilation.sink.has_errors() {
        1
    } else {
        0
    }
}
