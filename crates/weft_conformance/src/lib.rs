//! Conformance test helpers for the weft compiler.
//!
//! Provides shared pipeline functions that run a [`SourceDesign`] through
//! every pass (elaborate → synthesize → lower) and return structured results
//! for assertion in integration tests.

#![warn(missing_docs)]

use weft_ast::SourceDesign;
use weft_common::{Interner, WeftResult};
use weft_config::{CompileConfig, ConfigError, ProjectConfig, ResolvedClock};
use weft_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use weft_ir::{Context, Design, ObjectId, StateGraph};
use weft_lower::LoweredDesign;

/// Result of running the full pipeline.
pub struct PipelineResult {
    /// The synthesized design.
    pub design: Design,
    /// The lowered design.
    pub lowered: LoweredDesign,
    /// Interner that resolves names in `design`.
    pub interner: Interner,
    /// All diagnostics emitted during the pipeline.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl PipelineResult {
    /// Looks up a context by name.
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.design
            .contexts
            .values()
            .find(|c| self.interner.resolve(c.name) == name)
    }

    /// Looks up a storage object by name.
    pub fn object(&self, name: &str) -> Option<ObjectId> {
        self.design
            .objects
            .values()
            .find(|o| self.interner.resolve(o.name) == name)
            .map(|o| o.id)
    }

    /// The state graph of a sequential context.
    pub fn fsm(&self, context: &str) -> Option<&StateGraph> {
        self.context(context)?.fsm.as_ref()
    }

    /// The state graph of `context` as text with resolved names.
    pub fn dump(&self, context: &str) -> Option<String> {
        let ctx = self.context(context)?;
        let fsm = ctx.fsm.as_ref()?;
        Some(fsm.dump(&self.design.names(&self.interner, ctx)))
    }

    /// Whether any diagnostic carries `code`.
    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Diagnostic codes in emission order, e.g. `["E302", "W300"]`.
    pub fn codes(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.code.to_string()).collect()
    }
}

/// Parses a `weft.toml` from text.
pub fn config_from_toml(text: &str) -> Result<ProjectConfig, ConfigError> {
    weft_config::load_config_from_str(text)
}

/// Runs the full pipeline with default limits and no clock metadata.
pub fn full_pipeline(source: &SourceDesign) -> WeftResult<PipelineResult> {
    run_pipeline(source, &CompileConfig::default(), &[])
}

/// Runs the full pipeline with the settings of a project file.
pub fn project_pipeline(
    source: &SourceDesign,
    project: &ProjectConfig,
) -> Result<WeftResult<PipelineResult>, ConfigError> {
    let clocks = weft_config::resolve_clocks(project)?;
    Ok(run_pipeline(source, &project.compile, &clocks))
}

/// Runs elaboration, state synthesis and lowering on `source`.
pub fn run_pipeline(
    source: &SourceDesign,
    config: &CompileConfig,
    clocks: &[ResolvedClock],
) -> WeftResult<PipelineResult> {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();

    let mut design = weft_elaborate::elaborate(source, config, clocks, &interner, &sink)?;
    weft_fsm::synthesize_all(&mut design, config, &interner, &sink)?;
    let lowered = weft_lower::lower(&design, config, &interner, &sink)?;

    let diagnostics = sink.take_all();
    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    Ok(PipelineResult {
        design,
        lowered,
        interner,
        has_errors: error_count > 0,
        diagnostics,
        error_count,
        warning_count,
    })
}
