//! Synthesized state machines.
//!
//! A [`StateGraph`] is the automaton of one sequential context. Each
//! [`State`] is a statement tree executed within one clock edge; its
//! [`StateStmt::Goto`] leaves select the state of the next edge. State 0 is
//! the initial state and states are numbered in discovery order.

use crate::arena::Arena;
use crate::expr::{Expr, NameSource};
use crate::ids::{StateId, TempId};
use crate::object::AssignMode;
use crate::stmt::{Select, Target};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use weft_source::Span;

/// A statement inside a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStmt {
    /// Assigns a storage object.
    Assign {
        /// Target.
        target: Target,
        /// Value.
        value: Expr,
        /// Operator.
        mode: AssignMode,
        /// Host location.
        span: Span,
    },
    /// Defines a temporary.
    Temp {
        /// The temporary.
        id: TempId,
        /// Host location.
        span: Span,
    },
    /// A runtime assertion.
    Assert {
        /// Asserted condition.
        cond: Expr,
        /// Failure message.
        message: Option<String>,
        /// Host location.
        span: Span,
    },
    /// A runtime conditional.
    If {
        /// Condition.
        cond: Expr,
        /// Taken when true.
        then_body: Vec<StateStmt>,
        /// Taken when false.
        else_body: Vec<StateStmt>,
        /// Host location.
        span: Span,
    },
    /// Selects the state of the next clock edge.
    Goto(StateId),
}

/// One conjunct of a transition guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guard {
    /// Condition.
    pub cond: Expr,
    /// Whether the condition holds (then-branch) or not (else-branch).
    pub holds: bool,
}

/// An outgoing edge of a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Destination.
    pub target: StateId,
    /// Conditions on the path to the `Goto`, outermost first.
    pub guard: Vec<Guard>,
}

/// A node of the automaton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// This state's ID.
    pub id: StateId,
    /// Why the state exists, e.g. `entry`, `await`, `while`.
    pub label: String,
    /// Statements executed in this state.
    pub body: Vec<StateStmt>,
    /// Host location of the suspension point that opened the state.
    pub span: Span,
}

impl State {
    /// Outgoing transitions in declaration order.
    pub fn transitions(&self) -> Vec<Transition> {
        let mut out = Vec::new();
        let mut guard = Vec::new();
        collect_transitions(&self.body, &mut guard, &mut out);
        out
    }

    /// Temporaries read by this state that it does not define itself.
    pub fn foreign_temps(&self, temp_value: &impl Fn(TempId) -> Option<Expr>) -> BTreeSet<TempId> {
        let mut defined = BTreeSet::new();
        let mut used = BTreeSet::new();
        walk_temps(&self.body, temp_value, &mut defined, &mut used);
        used.difference(&defined).copied().collect()
    }
}

fn collect_transitions(body: &[StateStmt], guard: &mut Vec<Guard>, out: &mut Vec<Transition>) {
    for stmt in body {
        match stmt {
            StateStmt::Goto(target) => out.push(Transition {
                target: *target,
                guard: guard.clone(),
            }),
            StateStmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                for (branch, holds) in [(then_body, true), (else_body, false)] {
                    guard.push(Guard {
                        cond: cond.clone(),
                        holds,
                    });
                    collect_transitions(branch, guard, out);
                    guard.pop();
                }
            }
            _ => {}
        }
    }
}

fn walk_temps(
    body: &[StateStmt],
    temp_value: &impl Fn(TempId) -> Option<Expr>,
    defined: &mut BTreeSet<TempId>,
    used: &mut BTreeSet<TempId>,
) {
    for stmt in body {
        match stmt {
            StateStmt::Assign { target, value, .. } => {
                if let Some(Select::Bit(index)) = &target.select {
                    index.collect_temps(used);
                }
                value.collect_temps(used);
            }
            StateStmt::Temp { id, .. } => {
                defined.insert(*id);
                if let Some(value) = temp_value(*id) {
                    value.collect_temps(used);
                }
            }
            StateStmt::Assert { cond, .. } => cond.collect_temps(used),
            StateStmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                cond.collect_temps(used);
                walk_temps(then_body, temp_value, defined, used);
                walk_temps(else_body, temp_value, defined, used);
            }
            StateStmt::Goto(_) => {}
        }
    }
}

/// The automaton of one sequential context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateGraph {
    /// States in discovery order.
    pub states: Arena<StateId, State>,
}

impl StateGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an empty state.
    pub fn add_state(&mut self, label: impl Into<String>, span: Span) -> StateId {
        let label = label.into();
        self.states.alloc_with(|id| State {
            id,
            label,
            body: Vec::new(),
            span,
        })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no state was allocated.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns `true` for a single state looping on itself.
    pub fn is_single_state(&self) -> bool {
        self.states.len() == 1
    }

    /// The graph as a `petgraph` digraph whose node `i` is state `i`.
    pub fn to_digraph(&self) -> DiGraph<StateId, ()> {
        let mut graph = DiGraph::with_capacity(self.states.len(), 0);
        for id in self.states.ids() {
            graph.add_node(id);
        }
        for (id, state) in self.states.iter() {
            for t in state.transitions() {
                graph.add_edge(
                    NodeIndex::new(id.as_raw() as usize),
                    NodeIndex::new(t.target.as_raw() as usize),
                    (),
                );
            }
        }
        graph
    }

    /// States not reachable from the initial state.
    pub fn unreachable(&self) -> Vec<StateId> {
        if self.states.is_empty() {
            return Vec::new();
        }
        let graph = self.to_digraph();
        let mut seen = vec![false; self.states.len()];
        let mut dfs = Dfs::new(&graph, NodeIndex::new(0));
        while let Some(node) = dfs.next(&graph) {
            seen[node.index()] = true;
        }
        self.states.ids().filter(|id| !seen[id.as_raw() as usize]).collect()
    }

    /// Human-readable listing of all states.
    pub fn dump(&self, names: &impl NameSource) -> String {
        let mut out = String::new();
        for state in self.states.values() {
            let _ = writeln!(out, "{} ({}):", state.id, state.label);
            dump_body(&mut out, &state.body, names, 1);
        }
        out
    }
}

fn dump_target(target: &Target, names: &impl NameSource) -> String {
    let name = names.object_name(target.object);
    match &target.select {
        None => name,
        Some(Select::Bit(index)) => format!("{name}[{}]", index.display(names)),
        Some(Select::Range { start, stop }) => format!("{name}[{start}:{stop}]"),
    }
}

fn dump_body(out: &mut String, body: &[StateStmt], names: &impl NameSource, depth: usize) {
    let pad = "  ".repeat(depth);
    for stmt in body {
        match stmt {
            StateStmt::Assign {
                target,
                value,
                mode,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "{pad}{mode} {} = {}",
                    dump_target(target, names),
                    value.display(names)
                );
            }
            StateStmt::Temp { id, .. } => match names.temp_value(*id) {
                Some(value) => {
                    let _ = writeln!(
                        out,
                        "{pad}let {} = {}",
                        names.temp_name(*id),
                        value.display(names)
                    );
                }
                None => {
                    let _ = writeln!(out, "{pad}let {}", names.temp_name(*id));
                }
            },
            StateStmt::Assert { cond, message, .. } => {
                let _ = match message {
                    Some(m) => writeln!(out, "{pad}assert {}, {m:?}", cond.display(names)),
                    None => writeln!(out, "{pad}assert {}", cond.display(names)),
                };
            }
            StateStmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                let _ = writeln!(out, "{pad}if {}:", cond.display(names));
                dump_body(out, then_body, names, depth + 1);
                if !else_body.is_empty() {
                    let _ = writeln!(out, "{pad}else:");
                    dump_body(out, else_body, names, depth + 1);
                }
            }
            StateStmt::Goto(target) => {
                let _ = writeln!(out, "{pad}goto {target}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RawNames;
    use crate::ids::ObjectId;

    fn cond(i: u32) -> Expr {
        Expr::Object(ObjectId::from_raw(i))
    }

    fn two_state_graph() -> StateGraph {
        let mut g = StateGraph::new();
        let s0 = g.add_state("entry", Span::DUMMY);
        let s1 = g.add_state("await", Span::DUMMY);
        g.states[s0].body = vec![StateStmt::Goto(s1)];
        g.states[s1].body = vec![StateStmt::If {
            cond: cond(0),
            then_body: vec![StateStmt::Goto(s0)],
            else_body: vec![StateStmt::Goto(s1)],
            span: Span::DUMMY,
        }];
        g
    }

    #[test]
    fn transitions_in_declaration_order() {
        let g = two_state_graph();
        let ts = g.states[StateId::from_raw(1)].transitions();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts[0].target, StateId::from_raw(0));
        assert!(ts[0].guard[0].holds);
        assert_eq!(ts[1].target, StateId::from_raw(1));
        assert!(!ts[1].guard[0].holds);
    }

    #[test]
    fn all_reachable() {
        let g = two_state_graph();
        assert!(g.unreachable().is_empty());
        assert_eq!(g.to_digraph().edge_count(), 3);
    }

    #[test]
    fn detects_unreachable_state() {
        let mut g = two_state_graph();
        let orphan = g.add_state("orphan", Span::DUMMY);
        g.states[orphan].body = vec![StateStmt::Goto(StateId::INITIAL)];
        assert_eq!(g.unreachable(), vec![orphan]);
    }

    #[test]
    fn foreign_temps() {
        let mut g = StateGraph::new();
        let s0 = g.add_state("entry", Span::DUMMY);
        let t0 = TempId::from_raw(0);
        let t1 = TempId::from_raw(1);
        g.states[s0].body = vec![
            StateStmt::Temp {
                id: t1,
                span: Span::DUMMY,
            },
            StateStmt::Assign {
                target: Target::whole(ObjectId::from_raw(0)),
                value: Expr::binary(crate::expr::BinaryOp::Add, Expr::Temp(t0), Expr::Temp(t1)),
                mode: AssignMode::Next,
                span: Span::DUMMY,
            },
        ];
        let foreign = g.states[s0].foreign_temps(&|_| None);
        assert_eq!(foreign.into_iter().collect::<Vec<_>>(), vec![t0]);
    }

    #[test]
    fn dump_lists_states() {
        let text = two_state_graph().dump(&RawNames);
        assert!(text.contains("S0 (entry):"));
        assert!(text.contains("  goto S1"));
        assert!(text.contains("  if obj0:"));
        assert!(text.contains("  else:"));
    }
}
