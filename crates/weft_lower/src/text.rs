//! A neutral, indented text listing of a lowered design.
//!
//! The format is meant for inspection and golden tests, not for a downstream
//! tool. `NEXT` and `PUSH` assignments print as `<=`, `VALUE` assignments as
//! `:=`.

use crate::backend::{emit_stmts, Backend};
use crate::model::{
    ConcurrentBlock, LExpr, LSignal, LStmt, LTarget, LoweredDesign, Mirror, Process, ProcessBody,
};
use std::io::{self, Write};
use weft_ir::{AssignMode, Edge};

/// Writes the listing to any [`Write`].
pub struct TextBackend<W: Write> {
    writer: W,
    depth: usize,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, depth: 0 }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}{text}", "  ".repeat(self.depth))
    }

    fn nested(&mut self, stmts: &[LStmt]) -> io::Result<()> {
        self.depth += 1;
        let result = emit_stmts(self, stmts);
        self.depth -= 1;
        result
    }

    fn declare(&mut self, keyword: &str, signal: &LSignal) -> io::Result<()> {
        let ty = signal
            .ty
            .map(|t| t.to_string())
            .unwrap_or_else(|| "auto".to_string());
        match &signal.default {
            Some(d) => self.line(&format!("{keyword} {} : {ty} := {d}", signal.name)),
            None => self.line(&format!("{keyword} {} : {ty}", signal.name)),
        }
    }

    fn section(&mut self, title: &str, stmts: &[LStmt]) -> io::Result<()> {
        if stmts.is_empty() {
            return Ok(());
        }
        self.line(title)?;
        self.nested(stmts)
    }
}

/// Renders `design` into a string.
pub fn to_text(design: &LoweredDesign) -> String {
    let mut backend = TextBackend::new(Vec::new());
    // Writing into a Vec cannot fail.
    let _ = crate::backend::drive(design, &mut backend);
    String::from_utf8_lossy(&backend.into_inner()).into_owned()
}

impl<W: Write> Backend for TextBackend<W> {
    type Error = io::Error;

    fn emit_entity_boundary(&mut self, design: &LoweredDesign) -> io::Result<()> {
        self.line(&format!("entity {}", design.name))?;
        self.depth += 1;
        for port in &design.ports {
            let decl = format!("port {} {} : {}", port.direction, port.name, port.ty);
            match &port.default {
                Some(d) => self.line(&format!("{decl} := {d}"))?,
                None => self.line(&decl)?,
            }
        }
        for signal in &design.signals {
            self.declare("signal", signal)?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn emit_concurrent(&mut self, block: &ConcurrentBlock) -> io::Result<()> {
        self.line("")?;
        self.line(&format!("concurrent {}:", block.context))?;
        self.nested(&block.body)
    }

    fn emit_process(&mut self, process: &Process) -> io::Result<()> {
        self.line("")?;
        let mut header = format!("process {}", process.context);
        if let Some(clock) = &process.clock {
            let edge = match clock.edge {
                Edge::Rising => "rising",
                Edge::Falling => "falling",
            };
            header.push_str(&format!(" ({edge} {}", clock.signal));
            if let Some(f) = clock.frequency {
                header.push_str(&format!(" @ {f}"));
            }
            if let Some(reset) = &process.reset {
                header.push_str(&format!(
                    ", reset {} {} {}",
                    reset.signal,
                    if reset.active_high { "high" } else { "low" },
                    if reset.asynchronous { "async" } else { "sync" }
                ));
            }
            header.push(')');
        }
        self.line(&format!("{header}:"))?;
        self.depth += 1;
        for var in &process.variables {
            self.declare("variable", var)?;
        }
        if let Some(reg) = &process.state {
            self.line(&format!("state {} : {} states", reg.name, reg.states.len()))?;
        }
        self.section("reset:", &process.reset_body)?;
        self.section("defaults:", &process.defaults)?;
        match &process.body {
            ProcessBody::Single(body) => self.section("body:", body)?,
            ProcessBody::Dispatch(arms) => {
                let register = process.state.as_ref().map_or("state", |r| r.name.as_str());
                self.line(&format!("case {register}:"))?;
                self.depth += 1;
                for arm in arms {
                    self.line(&format!("S{} ({}):", arm.state, arm.label))?;
                    self.nested(&arm.body)?;
                }
                self.depth -= 1;
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn emit_assignment(
        &mut self,
        target: &LTarget,
        value: &LExpr,
        mode: AssignMode,
    ) -> io::Result<()> {
        let op = match mode {
            AssignMode::Next | AssignMode::Push => "<=",
            AssignMode::Value => ":=",
        };
        self.line(&format!("{target} {op} {value}"))
    }

    fn emit_conditional(
        &mut self,
        cond: &LExpr,
        then_body: &[LStmt],
        else_body: &[LStmt],
    ) -> io::Result<()> {
        self.line(&format!("if {cond}:"))?;
        self.nested(then_body)?;
        if !else_body.is_empty() {
            self.line("else:")?;
            self.nested(else_body)?;
        }
        Ok(())
    }

    fn emit_assert(&mut self, cond: &LExpr, message: Option<&str>) -> io::Result<()> {
        match message {
            Some(m) => self.line(&format!("assert {cond}, {m:?}")),
            None => self.line(&format!("assert {cond}")),
        }
    }

    fn emit_next_state(&mut self, state: u32) -> io::Result<()> {
        self.line(&format!("-> S{state}"))
    }

    fn emit_mirror(&mut self, mirror: &Mirror) -> io::Result<()> {
        self.line("")?;
        self.line(&format!("{} <= {}", mirror.port, mirror.buffer))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
