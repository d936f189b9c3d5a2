//! The seam between lowering and concrete output formats.
//!
//! A [`Backend`] receives a lowered design one construct at a time. [`drive`]
//! walks the design in a fixed order: the entity boundary, each block in
//! context order, then the buffer mirrors. Backends call [`emit_stmts`] to
//! walk nested statement lists, e.g. the branches handed to
//! [`Backend::emit_conditional`].

use crate::model::{
    Block, ConcurrentBlock, LExpr, LStmt, LTarget, LoweredDesign, Mirror, Process,
};
use weft_ir::AssignMode;

/// An output format for lowered designs.
pub trait Backend {
    /// Error raised while writing.
    type Error;

    /// Declares the entity: name, ports and internal signals.
    fn emit_entity_boundary(&mut self, design: &LoweredDesign) -> Result<(), Self::Error>;

    /// Emits a concurrent block.
    fn emit_concurrent(&mut self, block: &ConcurrentBlock) -> Result<(), Self::Error>;

    /// Emits a clocked process.
    fn emit_process(&mut self, process: &Process) -> Result<(), Self::Error>;

    /// Emits one assignment.
    fn emit_assignment(
        &mut self,
        target: &LTarget,
        value: &LExpr,
        mode: AssignMode,
    ) -> Result<(), Self::Error>;

    /// Emits a two-way conditional.
    fn emit_conditional(
        &mut self,
        cond: &LExpr,
        then_body: &[LStmt],
        else_body: &[LStmt],
    ) -> Result<(), Self::Error>;

    /// Emits a runtime assertion.
    fn emit_assert(&mut self, cond: &LExpr, message: Option<&str>) -> Result<(), Self::Error>;

    /// Emits the assignment of the next state.
    fn emit_next_state(&mut self, state: u32) -> Result<(), Self::Error>;

    /// Emits `port <= buffer`.
    fn emit_mirror(&mut self, mirror: &Mirror) -> Result<(), Self::Error> {
        self.emit_assignment(
            &LTarget::whole(mirror.port.clone()),
            &LExpr::Name(mirror.buffer.clone()),
            AssignMode::Next,
        )
    }

    /// Called once after everything was emitted.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Dispatches each statement of `stmts` to `backend`.
pub fn emit_stmts<B: Backend + ?Sized>(backend: &mut B, stmts: &[LStmt]) -> Result<(), B::Error> {
    for stmt in stmts {
        match stmt {
            LStmt::Assign {
                target,
                value,
                mode,
            } => backend.emit_assignment(target, value, *mode)?,
            LStmt::If {
                cond,
                then_body,
                else_body,
            } => backend.emit_conditional(cond, then_body, else_body)?,
            LStmt::Assert { cond, message } => backend.emit_assert(cond, message.as_deref())?,
            LStmt::NextState(state) => backend.emit_next_state(*state)?,
        }
    }
    Ok(())
}

/// Walks `design` through `backend`.
pub fn drive<B: Backend + ?Sized>(design: &LoweredDesign, backend: &mut B) -> Result<(), B::Error> {
    backend.emit_entity_boundary(design)?;
    for block in &design.blocks {
        match block {
            Block::Concurrent(c) => backend.emit_concurrent(c)?,
            Block::Process(p) => backend.emit_process(p)?,
        }
    }
    for mirror in &design.mirrors {
        backend.emit_mirror(mirror)?;
    }
    backend.finish()
}
