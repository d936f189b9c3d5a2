//! `weft check`: run every pass and report diagnostics without writing output.

use crate::pipeline::{compile, exit_code, load_project, render_diagnostics, resolve_input};
use crate::GlobalArgs;

/// Runs the `weft check` command.
///
/// Returns exit code 0 if no errors, 1 if there are errors.
pub fn run(input: Option<&str>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let input = resolve_input(input, project.as_ref())?;

    if !global.quiet {
        eprintln!("   Checking {}", input.display());
    }

    let compilation = compile(&input, project.as_ref())?;
    render_diagnostics(&compilation, global);
    Ok(exit_code(&compilation))
}
