//! Compile-time evaluation: constant branches, unrolling, inlining and
//! assertions.

use weft_ast::{
    Arg, BinaryOp, ContextDecl, DeclClass, Expr, FunctionDef, Param, PortDirection, SourceDesign, Stmt,
    TypeSpec,
};
use weft_conformance::full_pipeline;
use weft_diagnostics::code;
use weft_ir::{ConstValue, Expr as IrExpr, Stmt as IrStmt};

fn base() -> SourceDesign {
    SourceDesign::new("top")
        .global(Stmt::let_(
            "clk",
            Expr::declare(DeclClass::Port(PortDirection::In), TypeSpec::Bit, None),
        ))
        .global(Stmt::let_("a", Expr::signal(TypeSpec::Bit, None)))
        .global(Stmt::let_("b", Expr::signal(TypeSpec::Bit, None)))
        .global(Stmt::let_("y", Expr::signal(TypeSpec::Unsigned { width: 8 }, None)))
        .global(Stmt::let_("mode", Expr::int(3)))
}

fn seq(body: Vec<Stmt>) -> SourceDesign {
    base().context(ContextDecl::sequential("main", "clk", body))
}

/// The constant assigned by an `Assign` statement, if any.
fn assigned_int(stmt: &IrStmt) -> Option<i64> {
    match stmt {
        IrStmt::Assign {
            value: IrExpr::Const(ConstValue::Int(v)),
            ..
        } => Some(*v),
        _ => None,
    }
}

#[test]
fn constant_if_keeps_exactly_one_branch() {
    let source = seq(vec![Stmt::if_(
        Expr::binary(BinaryOp::Eq, Expr::name("mode"), Expr::int(3)),
        vec![Stmt::next("y", Expr::int(1))],
        vec![Stmt::next("y", Expr::int(2))],
    )]);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    let body = &result.context("main").unwrap().body;
    assert_eq!(body.len(), 1);
    assert_eq!(assigned_int(&body[0]), Some(1));
}

#[test]
fn untaken_constant_branch_is_never_checked() {
    let source = seq(vec![Stmt::if_(
        Expr::bool(false),
        vec![Stmt::next("nowhere", Expr::int(1))],
        vec![],
    )]);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    assert!(result.context("main").unwrap().body.is_empty());
}

#[test]
fn for_loop_yields_one_copy_per_element_in_order() {
    let source = seq(vec![Stmt::for_(
        "v",
        Expr::tuple(vec![Expr::int(3), Expr::int(5), Expr::int(7), Expr::int(9)]),
        vec![Stmt::next("y", Expr::name("v"))],
    )]);
    let result = full_pipeline(&source).unwrap();
    let body = &result.context("main").unwrap().body;
    let values: Vec<_> = body.iter().filter_map(assigned_int).collect();
    assert_eq!(values, vec![3, 5, 7, 9]);
}

#[test]
fn for_over_range_unrolls() {
    let source = seq(vec![Stmt::for_(
        "i",
        Expr::call("range", vec![Expr::int(6)]),
        vec![Stmt::next("y", Expr::name("i"))],
    )]);
    let result = full_pipeline(&source).unwrap();
    assert_eq!(result.context("main").unwrap().body.len(), 6);
}

#[test]
fn single_if_break_loop_is_a_first_match_chain() {
    // for s, v in ((a, 1), (b, 2)): if s: y <= v; break
    // else: y <= 0
    let source = seq(vec![Stmt::for_else(
        vec!["s", "v"],
        Expr::tuple(vec![
            Expr::tuple(vec![Expr::name("a"), Expr::int(1)]),
            Expr::tuple(vec![Expr::name("b"), Expr::int(2)]),
        ]),
        vec![Stmt::if_(
            Expr::name("s"),
            vec![Stmt::next("y", Expr::name("v")), Stmt::break_()],
            vec![],
        )],
        vec![Stmt::next("y", Expr::int(0))],
    )]);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    let body = &result.context("main").unwrap().body;
    let [IrStmt::If {
        then_body,
        else_body,
        ..
    }] = body.as_slice()
    else {
        panic!("expected a chain, got {body:?}");
    };
    assert_eq!(assigned_int(&then_body[0]), Some(1));
    let [IrStmt::If {
        then_body: second,
        else_body: fallback,
        ..
    }] = else_body.as_slice()
    else {
        panic!("expected a nested test");
    };
    assert_eq!(assigned_int(&second[0]), Some(2));
    assert_eq!(fallback.iter().filter_map(assigned_int).collect::<Vec<_>>(), vec![0]);
}

#[test]
fn functions_are_inlined_at_the_call_site() {
    let drive = FunctionDef::new(
        "drive",
        vec![Param::required("v")],
        vec![Stmt::next("y", Expr::binary(BinaryOp::Add, Expr::name("v"), Expr::int(1)))],
    );
    let source = seq(vec![Stmt::expr(Expr::call("drive", vec![Expr::int(4)]))]).function(drive);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    let body = &result.context("main").unwrap().body;
    assert_eq!(body.iter().filter_map(assigned_int).collect::<Vec<_>>(), vec![5]);
}

#[test]
fn non_terminating_inlining_is_unbounded_recursion() {
    let spin = FunctionDef::new(
        "spin",
        vec![Param::required("n")],
        vec![Stmt::return_(Some(Expr::call("spin", vec![Expr::name("n")])))],
    );
    let source = seq(vec![Stmt::expr(Expr::call("spin", vec![Expr::int(0)]))]).function(spin);
    let result = full_pipeline(&source).unwrap();
    assert_eq!(result.codes(), vec!["E304"]);
    assert!(result.context("main").unwrap().failed);
}

#[test]
fn false_compile_time_assertion_fails_the_context() {
    let source = seq(vec![Stmt::assert(
        Expr::binary(BinaryOp::Eq, Expr::name("mode"), Expr::int(4)),
        Some("mode must be 4"),
    )]);
    let result = full_pipeline(&source).unwrap();
    assert!(result.has_code(code::E307));
    assert!(result.diagnostics[0].message.contains("mode must be 4"));
}

#[test]
fn runtime_assertion_is_kept_for_lowering() {
    let source = seq(vec![Stmt::assert(Expr::name("a"), None)]);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors);
    assert!(matches!(
        result.context("main").unwrap().body.as_slice(),
        [IrStmt::Assert { .. }]
    ));
}

#[test]
fn runtime_branch_in_concurrent_context_is_unsupported() {
    let source = base().context(ContextDecl::concurrent(
        "comb",
        vec![Stmt::if_(
            Expr::name("a"),
            vec![Stmt::next("y", Expr::int(1))],
            vec![],
        )],
    ));
    let result = full_pipeline(&source).unwrap();
    assert_eq!(result.codes(), vec!["E303"]);
}

#[test]
fn runtime_let_becomes_a_temporary() {
    let source = seq(vec![
        Stmt::let_("t", Expr::binary(BinaryOp::BitAnd, Expr::name("a"), Expr::name("b"))),
        Stmt::next("y", Expr::name("t")),
    ]);
    let result = full_pipeline(&source).unwrap();
    let ctx = result.context("main").unwrap();
    assert_eq!(ctx.temps.len(), 1);
    assert!(matches!(ctx.body[0], IrStmt::Temp { .. }));
}

#[test]
fn unroll_limit_is_enforced() {
    let source = seq(vec![Stmt::for_(
        "i",
        Expr::call("range", vec![Expr::int(100_000)]),
        vec![Stmt::pass()],
    )]);
    let result = full_pipeline(&source).unwrap();
    assert!(result.has_errors);
    assert!(result.context("main").unwrap().failed);
}

#[test]
fn huge_range_fails_only_its_context() {
    // for i in range(1 << 40): pass
    let huge = Expr::call(
        "range",
        vec![Expr::binary(BinaryOp::Shl, Expr::int(1), Expr::int(40))],
    );
    let source = seq(vec![Stmt::for_("i", huge, vec![Stmt::pass()])]).context(
        ContextDecl::sequential("other", "clk", vec![Stmt::next("a", Expr::int(1))]),
    );
    let result = full_pipeline(&source).unwrap();
    assert_eq!(result.codes(), ["E303"]);
    assert!(result.diagnostics[0].message.contains("1099511627776"));
    assert!(result.context("main").unwrap().failed);
    assert!(!result.context("other").unwrap().failed);
    assert!(result.lowered.block("other").is_some());
}

#[test]
fn huge_range_expansions_are_bounded() {
    let huge = || {
        Expr::call(
            "range",
            vec![Expr::binary(BinaryOp::Shl, Expr::int(1), Expr::int(40))],
        )
    };
    // Indexing, slicing and zipping a long range need no expansion.
    let source = seq(vec![
        Stmt::next("y", Expr::index(huge(), Expr::int(-1))),
        Stmt::for_else(
            vec!["i", "j"],
            Expr::call_with(
                Expr::name("zip"),
                vec![Arg::Positional(huge()), Arg::Positional(Expr::tuple(vec![Expr::int(4)]))],
            ),
            vec![Stmt::next("y", Expr::name("j"))],
            vec![],
        ),
    ]);
    let result = full_pipeline(&source).unwrap();
    assert!(!result.has_errors, "{:?}", result.codes());
    let body = &result.context("main").unwrap().body;
    assert_eq!(assigned_int(&body[0]), Some((1 << 40) - 1));
    assert_eq!(assigned_int(&body[1]), Some(4));

    for expansion in [
        Expr::call("enumerate", vec![huge()]),
        Expr::call("max", vec![huge()]),
        Expr::binary(BinaryOp::Mul, Expr::tuple(vec![Expr::int(0)]), Expr::int(1 << 40)),
    ] {
        let source = seq(vec![Stmt::let_("t", expansion)]);
        let result = full_pipeline(&source).unwrap();
        assert_eq!(result.codes(), ["E303"]);
    }
}
