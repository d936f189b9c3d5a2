//! `weft build`: compile and write the lowered design.
//!
//! The design is written to `<dir>/<entity>.txt` or `<dir>/<entity>.json`.
//! Nothing is written when any context failed.

use std::path::{Path, PathBuf};

use weft_config::EmitFormat;
use weft_lower::LoweredDesign;

use crate::pipeline::{compile, exit_code, load_project, render_diagnostics, resolve_input};
use crate::{BuildArgs, EmitChoice, GlobalArgs};

/// Runs the `weft build` command.
///
/// Returns exit code 0 if the design was written, 1 if there are errors.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let input = resolve_input(args.input.as_deref(), project.as_ref())?;

    let out_dir = match (&args.output, &project) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(p)) => p.dir.join(&p.config.output.dir),
        (None, None) => PathBuf::from("out"),
    };
    let format = match args.emit {
        Some(EmitChoice::Text) => EmitFormat::Text,
        Some(EmitChoice::Json) => EmitFormat::Json,
        None => project
            .as_ref()
            .map(|p| p.config.output.format)
            .unwrap_or_default(),
    };

    if !global.quiet {
        eprintln!("   Compiling {}", input.display());
    }

    let compilation = compile(&input, project.as_ref())?;
    render_diagnostics(&compilation, global);
    let code = exit_code(&compilation);
    if code != 0 {
        return Ok(code);
    }

    if let Some(lowered) = &compilation.lowered {
        let path = write_design(lowered, &out_dir, format)?;
        if !global.quiet {
            eprintln!("     Wrote {}", path.display());
        }
    }
    Ok(code)
}

/// Writes `design` into `dir`, creating the directory if needed.
pub fn write_design(
    design: &LoweredDesign,
    dir: &Path,
    format: EmitFormat,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let (path, contents) = match format {
        EmitFormat::Text => (
            dir.join(format!("{}.txt", design.name)),
            weft_lower::to_text(design),
        ),
        EmitFormat::Json => (
            dir.join(format!("{}.json", design.name)),
            weft_lower::to_json(design)?,
        ),
    };
    std::fs::write(&path, contents)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty(name: &str) -> LoweredDesign {
        LoweredDesign {
            name: name.into(),
            ports: vec![],
            signals: vec![],
            blocks: vec![],
            mirrors: vec![],
        }
    }

    #[test]
    fn writes_text_listing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("gen");
        let path = write_design(&empty("top"), &dir, EmitFormat::Text).unwrap();
        assert_eq!(path, dir.join("top.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "entity top\n");
    }

    #[test]
    fn writes_json_model() {
        let tmp = TempDir::new().unwrap();
        let path = write_design(&empty("top"), tmp.path(), EmitFormat::Json).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let back: LoweredDesign = serde_json::from_str(&text).unwrap();
        assert_eq!(back, empty("top"));
    }
}
