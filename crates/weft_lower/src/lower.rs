//! Translation of compiled contexts into blocks.
//!
//! Concurrent contexts keep their statement order with temporaries replaced
//! by their defining expressions. Sequential contexts become one clocked
//! process: temporaries turn into process variables, `PUSH` targets get their
//! default first, and a state register plus a dispatch appears once the state
//! graph has more than one state. Assignments to a buffered output port are
//! redirected to its buffer.

use crate::model::{
    ConcurrentBlock, LClock, LExpr, LPort, LReset, LSelect, LSignal, LStmt, LTarget, Mirror,
    Process, ProcessBody, StateArm, StateRegister,
};
use std::collections::{HashMap, HashSet};
use weft_common::{InternalError, Interner, WeftResult};
use weft_ir::{
    Arena, AssignMode, BinaryOp, ConstValue, Context, Design, Expr, ObjectId, ObjectKind, Select,
    StateStmt, Stmt, Target, TempId, Temporary, Type, UnaryOp,
};

/// How reads of temporaries are lowered.
enum Temps<'c> {
    /// Substitute the defining expression.
    Inline(&'c Arena<TempId, Temporary>),
    /// Read the process variable holding the value.
    Variables(&'c HashMap<TempId, String>),
}

/// Name-resolving lowering of one design.
pub struct Lowerer<'a> {
    design: &'a Design,
    interner: &'a Interner,
    names: Vec<String>,
}

impl<'a> Lowerer<'a> {
    /// Resolves every object name of `design` once.
    pub fn new(design: &'a Design, interner: &'a Interner) -> Self {
        let names = design
            .objects
            .values()
            .map(|o| interner.resolve(o.name).to_string())
            .collect();
        Self {
            design,
            interner,
            names,
        }
    }

    fn name(&self, id: ObjectId) -> &str {
        &self.names[id.as_raw() as usize]
    }

    /// The object an assignment to `id` actually writes.
    fn written(&self, id: ObjectId) -> ObjectId {
        self.design.object(id).buffer.unwrap_or(id)
    }

    /// Entity ports in declaration order.
    pub fn ports(&self) -> Vec<LPort> {
        self.design
            .objects
            .values()
            .filter_map(|o| {
                o.port_direction().map(|direction| LPort {
                    name: self.name(o.id).to_string(),
                    direction,
                    ty: self.design.object_type(o.id),
                    default: o.default.clone(),
                })
            })
            .collect()
    }

    /// Internal signals; variables are declared by their process.
    pub fn signals(&self) -> Vec<LSignal> {
        self.design
            .objects
            .values()
            .filter(|o| o.kind == ObjectKind::Signal)
            .map(|o| LSignal {
                name: self.name(o.id).to_string(),
                ty: Some(self.design.object_type(o.id)),
                default: o.default.clone(),
            })
            .collect()
    }

    /// One mirror per buffered output port.
    pub fn mirrors(&self) -> Vec<Mirror> {
        self.design
            .objects
            .values()
            .filter_map(|o| {
                o.buffer.map(|buf| Mirror {
                    port: self.name(o.id).to_string(),
                    buffer: self.name(buf).to_string(),
                })
            })
            .collect()
    }

    /// Lowers a concurrent context.
    pub fn concurrent(&self, context: &Context) -> ConcurrentBlock {
        let temps = Temps::Inline(&context.temps);
        let mut body = Vec::new();
        for stmt in &context.body {
            self.stmt(stmt, &temps, &mut body);
        }
        ConcurrentBlock {
            context: self.interner.resolve(context.name).to_string(),
            body,
        }
    }

    /// Lowers a sequential context with a synthesized state graph.
    pub fn process(&self, context: &Context) -> WeftResult<Process> {
        let name = self.interner.resolve(context.name).to_string();
        let fsm = context.fsm.as_ref().ok_or_else(|| {
            InternalError::new(format!("sequential context `{name}` has no state graph"))
        })?;

        let mut taken: HashSet<String> = self.names.iter().cloned().collect();
        let mut temp_vars = HashMap::new();
        let mut variables: Vec<LSignal> = self
            .owned(context)
            .filter(|&id| self.design.object(id).is_variable())
            .map(|id| LSignal {
                name: self.name(id).to_string(),
                ty: Some(self.design.object_type(id)),
                default: self.design.object(id).default.clone(),
            })
            .collect();
        for (id, temp) in context.temps.iter() {
            let var = fresh(self.interner.resolve(temp.name), &mut taken);
            variables.push(LSignal {
                name: var.clone(),
                ty: self.infer(&temp.value, &context.temps),
                default: None,
            });
            temp_vars.insert(id, var);
        }
        let temps = Temps::Variables(&temp_vars);

        let state = (!fsm.is_single_state()).then(|| StateRegister {
            name: fresh(&format!("{name}_state"), &mut taken),
            states: fsm.states.values().map(|s| s.label.clone()).collect(),
        });

        let body = if fsm.is_single_state() {
            let mut out = Vec::new();
            for s in fsm.states.values().flat_map(|s| &s.body) {
                self.state_stmt(s, context, &temps, false, &mut out);
            }
            ProcessBody::Single(out)
        } else {
            let arms = fsm
                .states
                .values()
                .map(|s| {
                    let mut out = Vec::new();
                    for stmt in &s.body {
                        self.state_stmt(stmt, context, &temps, true, &mut out);
                    }
                    StateArm {
                        state: s.id.as_raw(),
                        label: s.label.clone(),
                        body: out,
                    }
                })
                .collect();
            ProcessBody::Dispatch(arms)
        };

        let reset_body = match context.reset() {
            Some(_) => {
                let mut out: Vec<LStmt> = self
                    .owned(context)
                    .filter_map(|id| {
                        let o = self.design.object(id);
                        o.default.clone().map(|value| LStmt::Assign {
                            target: LTarget::whole(self.name(id)),
                            value: LExpr::Const(value),
                            mode: if o.is_variable() {
                                AssignMode::Value
                            } else {
                                AssignMode::Next
                            },
                        })
                    })
                    .collect();
                if state.is_some() {
                    out.push(LStmt::NextState(0));
                }
                out
            }
            None => Vec::new(),
        };

        let defaults = self
            .owned(context)
            .filter(|&id| self.design.object(id).mode == Some(AssignMode::Push))
            .map(|id| {
                let o = self.design.object(id);
                let value = o
                    .default
                    .clone()
                    .unwrap_or_else(|| zero(self.design.object_type(id)));
                LStmt::Assign {
                    target: LTarget::whole(self.name(id)),
                    value: LExpr::Const(value),
                    mode: AssignMode::Push,
                }
            })
            .collect();

        Ok(Process {
            context: name,
            clock: context.clock().map(|c| LClock {
                signal: self.name(c.signal).to_string(),
                edge: c.edge,
                frequency: c.frequency,
            }),
            reset: context.reset().map(|r| LReset {
                signal: self.name(r.signal).to_string(),
                active_high: r.active_high,
                asynchronous: r.asynchronous,
            }),
            variables,
            state,
            reset_body,
            defaults,
            body,
        })
    }

    /// Objects written by `context`, buffered ports replaced by their buffer.
    fn owned<'c>(&'c self, context: &'c Context) -> impl Iterator<Item = ObjectId> + 'c {
        self.design
            .objects
            .values()
            .filter(move |o| o.driver == Some(context.id) && o.buffer.is_none())
            .map(|o| o.id)
    }

    fn stmt(&self, stmt: &Stmt, temps: &Temps<'_>, out: &mut Vec<LStmt>) {
        match stmt {
            Stmt::Assign {
                target,
                value,
                mode,
                ..
            } => out.push(LStmt::Assign {
                target: self.target(target, temps),
                value: self.expr(value, temps),
                mode: *mode,
            }),
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                let mut then_out = Vec::new();
                let mut else_out = Vec::new();
                then_body.iter().for_each(|s| self.stmt(s, temps, &mut then_out));
                else_body.iter().for_each(|s| self.stmt(s, temps, &mut else_out));
                out.push(LStmt::If {
                    cond: self.expr(cond, temps),
                    then_body: then_out,
                    else_body: else_out,
                });
            }
            Stmt::Assert { cond, message, .. } => out.push(LStmt::Assert {
                cond: self.expr(cond, temps),
                message: message.clone(),
            }),
            Stmt::Coroutine { body, .. } => body.iter().for_each(|s| self.stmt(s, temps, out)),
            // Suspension never reaches a concurrent block.
            Stmt::Temp { .. }
            | Stmt::While { .. }
            | Stmt::Await { .. }
            | Stmt::Break { .. }
            | Stmt::Continue { .. } => {}
        }
    }

    fn state_stmt(
        &self,
        stmt: &StateStmt,
        context: &Context,
        temps: &Temps<'_>,
        transitions: bool,
        out: &mut Vec<LStmt>,
    ) {
        match stmt {
            StateStmt::Assign {
                target,
                value,
                mode,
                ..
            } => out.push(LStmt::Assign {
                target: self.target(target, temps),
                value: self.expr(value, temps),
                mode: *mode,
            }),
            StateStmt::Temp { id, .. } => {
                if let (Some(temp), Temps::Variables(vars)) = (context.temps.try_get(*id), temps) {
                    let name = vars.get(id).cloned().unwrap_or_else(|| id.to_string());
                    out.push(LStmt::Assign {
                        target: LTarget::whole(name),
                        value: self.expr(&temp.value, temps),
                        mode: AssignMode::Value,
                    });
                }
            }
            StateStmt::Assert { cond, message, .. } => out.push(LStmt::Assert {
                cond: self.expr(cond, temps),
                message: message.clone(),
            }),
            StateStmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                let mut then_out = Vec::new();
                let mut else_out = Vec::new();
                for s in then_body {
                    self.state_stmt(s, context, temps, transitions, &mut then_out);
                }
                for s in else_body {
                    self.state_stmt(s, context, temps, transitions, &mut else_out);
                }
                if then_out.is_empty() && else_out.is_empty() {
                    return;
                }
                out.push(LStmt::If {
                    cond: self.expr(cond, temps),
                    then_body: then_out,
                    else_body: else_out,
                });
            }
            StateStmt::Goto(target) => {
                if transitions {
                    out.push(LStmt::NextState(target.as_raw()));
                }
            }
        }
    }

    fn target(&self, target: &Target, temps: &Temps<'_>) -> LTarget {
        LTarget {
            name: self.name(self.written(target.object)).to_string(),
            select: target.select.as_ref().map(|s| match s {
                Select::Bit(index) => LSelect::Bit(self.expr(index, temps)),
                Select::Range { start, stop } => LSelect::Range {
                    start: *start,
                    stop: *stop,
                },
            }),
        }
    }

    fn expr(&self, expr: &Expr, temps: &Temps<'_>) -> LExpr {
        match expr {
            Expr::Const(c) => LExpr::Const(c.clone()),
            Expr::Object(id) => LExpr::Name(self.name(*id).to_string()),
            Expr::Temp(id) => match temps {
                Temps::Inline(arena) => match arena.try_get(*id) {
                    Some(temp) => self.expr(&temp.value, temps),
                    None => LExpr::Name(id.to_string()),
                },
                Temps::Variables(vars) => {
                    LExpr::Name(vars.get(id).cloned().unwrap_or_else(|| id.to_string()))
                }
            },
            Expr::Unary { op, operand } => LExpr::Unary {
                op: *op,
                operand: Box::new(self.expr(operand, temps)),
            },
            Expr::Binary { op, lhs, rhs } => LExpr::Binary {
                op: *op,
                lhs: Box::new(self.expr(lhs, temps)),
                rhs: Box::new(self.expr(rhs, temps)),
            },
            Expr::Index { base, index } => LExpr::Index {
                base: Box::new(self.expr(base, temps)),
                index: Box::new(self.expr(index, temps)),
            },
            Expr::Slice { base, start, stop } => LExpr::Slice {
                base: Box::new(self.expr(base, temps)),
                start: *start,
                stop: *stop,
            },
            Expr::Concat(items) => LExpr::Concat(items.iter().map(|e| self.expr(e, temps)).collect()),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => LExpr::Select {
                cond: Box::new(self.expr(cond, temps)),
                then: Box::new(self.expr(then, temps)),
                otherwise: Box::new(self.expr(otherwise, temps)),
            },
        }
    }

    /// Best-effort type of a temporary's value.
    fn infer(&self, expr: &Expr, temps: &Arena<TempId, Temporary>) -> Option<Type> {
        match expr {
            Expr::Const(ConstValue::Bool(_)) => Some(Type::Bool),
            Expr::Const(ConstValue::Bits(bits)) => Some(Type::Bits {
                width: bits.len() as u32,
            }),
            Expr::Const(_) => None,
            Expr::Object(id) => Some(self.design.object_type(*id)),
            Expr::Temp(id) => temps.try_get(*id).and_then(|t| self.infer(&t.value, temps)),
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => Some(Type::Bool),
            Expr::Unary { operand, .. } => self.infer(operand, temps),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge => Some(Type::Bool),
                _ => self.infer(lhs, temps).or_else(|| self.infer(rhs, temps)),
            },
            Expr::Index { .. } => Some(Type::Bit),
            Expr::Slice { start, stop, .. } => Some(Type::Bits {
                width: stop.saturating_sub(*start),
            }),
            Expr::Concat(items) => items
                .iter()
                .map(|e| self.infer(e, temps).map(Type::width))
                .sum::<Option<u32>>()
                .map(|width| Type::Bits { width }),
            Expr::Select {
                then, otherwise, ..
            } => self
                .infer(then, temps)
                .or_else(|| self.infer(otherwise, temps)),
        }
    }
}

/// `base`, or `base_1`, `base_2`, ... if taken. Records the result.
fn fresh(base: &str, taken: &mut HashSet<String>) -> String {
    let name = if taken.contains(base) {
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|n| !taken.contains(n))
            .unwrap_or_else(|| base.to_string())
    } else {
        base.to_string()
    };
    taken.insert(name.clone());
    name
}

/// Value a `PUSH` target without a declared default returns to.
fn zero(ty: Type) -> ConstValue {
    match ty {
        Type::Bool => ConstValue::Bool(false),
        Type::Bit => ConstValue::Bits("0".into()),
        Type::Bits { width } => ConstValue::Bits("0".repeat(width as usize)),
        Type::Unsigned { .. } | Type::Signed { .. } => ConstValue::Int(0),
    }
}
