//! `weft dump-fsm`: print the state graph of each sequential context.

use weft_common::Interner;
use weft_ir::Design;

use crate::pipeline::{compile, exit_code, load_project, render_diagnostics, resolve_input};
use crate::GlobalArgs;

/// Runs the `weft dump-fsm` command.
///
/// Graphs go to stdout in context order. Returns exit code 1 if there are
/// errors or `context` names no synthesized context.
pub fn run(
    input: Option<&str>,
    context: Option<&str>,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let input = resolve_input(input, project.as_ref())?;
    let compilation = compile(&input, project.as_ref())?;
    render_diagnostics(&compilation, global);

    let Some(design) = &compilation.design else {
        return Ok(exit_code(&compilation));
    };
    let text = dump_graphs(design, &compilation.interner, context);
    if text.is_empty() {
        if let Some(name) = context {
            eprintln!("error: no state graph for context `{name}`");
            return Ok(1);
        }
    }
    print!("{text}");
    Ok(exit_code(&compilation))
}

/// Lists the graphs of all sequential contexts, or only of `only`.
pub fn dump_graphs(design: &Design, interner: &Interner, only: Option<&str>) -> String {
    let mut out = String::new();
    for context in design.contexts.values() {
        let name = interner.resolve(context.name);
        if only.is_some_and(|o| o != name) {
            continue;
        }
        let Some(fsm) = &context.fsm else {
            continue;
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("context {name} ({} states):\n", fsm.states.len()));
        out.push_str(&fsm.dump(&design.names(interner, context)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::{ContextDecl, Expr, SourceDesign, Stmt, TypeSpec};
    use weft_config::CompileConfig;
    use weft_diagnostics::DiagnosticSink;

    fn design(interner: &Interner) -> Design {
        let source = SourceDesign::new("top")
            .global(Stmt::let_("clk", Expr::signal(TypeSpec::Bit, None)))
            .global(Stmt::let_("go", Expr::signal(TypeSpec::Bit, None)))
            .global(Stmt::let_("y", Expr::signal(TypeSpec::Bit, None)))
            .context(ContextDecl::sequential(
                "wait",
                "clk",
                vec![
                    Stmt::await_(Expr::name("go")),
                    Stmt::next("y", Expr::int(1)),
                ],
            ))
            .context(ContextDecl::concurrent(
                "comb",
                vec![Stmt::next("go", Expr::int(0))],
            ));
        let sink = DiagnosticSink::new();
        let config = CompileConfig::default();
        let mut design = weft_elaborate::elaborate(&source, &config, &[], interner, &sink).unwrap();
        weft_fsm::synthesize_all(&mut design, &config, interner, &sink).unwrap();
        assert!(!sink.has_errors());
        design
    }

    #[test]
    fn dumps_sequential_contexts_only() {
        let interner = Interner::new();
        let design = design(&interner);
        let text = dump_graphs(&design, &interner, None);
        assert!(text.starts_with("context wait (2 states):\n"));
        assert!(text.contains("S1 (await):"));
        assert!(!text.contains("comb"));
    }

    #[test]
    fn filters_by_name() {
        let interner = Interner::new();
        let design = design(&interner);
        assert!(dump_graphs(&design, &interner, Some("comb")).is_empty());
        assert!(!dump_graphs(&design, &interner, Some("wait")).is_empty());
    }
}
