//! Whole projects: `weft.toml` plus a tracer output file on disk.

use std::fs;

use tempfile::TempDir;
use weft_ast::{ContextDecl, DeclClass, Expr, PortDirection, SourceDesign, Stmt, TypeSpec};
use weft_conformance::{config_from_toml, project_pipeline};
use weft_lower::Block;

fn blink() -> SourceDesign {
    SourceDesign::new("blink")
        .global(Stmt::let_(
            "clk",
            Expr::declare(DeclClass::Port(PortDirection::In), TypeSpec::Bit, None),
        ))
        .global(Stmt::let_(
            "led",
            Expr::declare(
                DeclClass::Port(PortDirection::Out),
                TypeSpec::Bit,
                Some(Expr::int(0)),
            ),
        ))
        .context(ContextDecl::sequential(
            "toggle",
            "clk",
            vec![
                Stmt::await_(Expr::bool(true)),
                Stmt::next("led", Expr::not(Expr::name("led"))),
            ],
        ))
}

const PROJECT: &str = r#"
[project]
name = "blink"
input = "trace/blink.json"

[compile]
max_states = 16

[clocks.clk]
frequency = "50MHz"
"#;

#[test]
fn project_on_disk_compiles() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("weft.toml"), PROJECT).unwrap();
    fs::create_dir_all(tmp.path().join("trace")).unwrap();
    fs::write(tmp.path().join("trace/blink.json"), blink().to_json()).unwrap();

    let config = weft_config::load_config(tmp.path()).unwrap();
    assert_eq!(config.compile.max_states, 16);
    let (source, hash) = weft_ast::load_design(&tmp.path().join(&config.project.input)).unwrap();
    assert_eq!(source, blink());
    assert_eq!(
        hash,
        weft_common::ContentHash::from_str_content(&blink().to_json())
    );

    let result = project_pipeline(&source, &config).unwrap().unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    let Some(Block::Process(p)) = result.lowered.block("toggle") else {
        panic!("expected process");
    };
    let clock = p.clock.as_ref().unwrap();
    assert_eq!(clock.signal, "clk");
    assert_eq!(clock.frequency, Some("50MHz".parse().unwrap()));
    assert_eq!(result.lowered.mirrors.len(), 1);
}

#[test]
fn tighter_limits_from_the_project_apply() {
    let config = config_from_toml(&PROJECT.replace("max_states = 16", "max_states = 1")).unwrap();
    let result = project_pipeline(&blink(), &config).unwrap().unwrap();
    assert_eq!(result.codes(), vec!["E303"]);
}

#[test]
fn bad_clock_frequency_is_rejected_on_load() {
    let err = config_from_toml(&PROJECT.replace("50MHz", "fast")).unwrap_err();
    assert!(err.to_string().contains("clocks.clk"), "{err}");
}

#[test]
fn malformed_input_reports_position() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{\"name\": \"top\",\n \"contexts\": [}").unwrap();
    let err = weft_ast::load_design(&path).unwrap_err();
    assert!(matches!(err, weft_ast::LoadError::Json { line: 2, .. }), "{err}");
}
