//! The top-level [`Design`] container.

use crate::arena::Arena;
use crate::context::Context;
use crate::expr::{Expr, NameSource};
use crate::ids::{ContextId, ObjectId, TempId};
use crate::object::{ObjectKind, StorageObject};
use crate::types::{Type, TypeDb};
use crate::value::ConstValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use weft_common::{Ident, Interner};
use weft_source::Span;

/// One compiled entity: its storage objects and contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// Entity name.
    pub name: Ident,
    /// All storage objects, in creation order.
    pub objects: Arena<ObjectId, StorageObject>,
    /// Element types.
    pub types: TypeDb,
    /// Contexts in declaration order.
    pub contexts: Arena<ContextId, Context>,
    #[serde(skip)]
    taken: HashSet<Ident>,
}

impl Design {
    /// Creates an empty design.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            objects: Arena::new(),
            types: TypeDb::new(),
            contexts: Arena::new(),
            taken: HashSet::new(),
        }
    }

    /// Returns `base`, or `base_N` for the first `N` not yet used by an
    /// object of this design.
    pub fn unique_name(&self, base: &str, interner: &Interner) -> Ident {
        let candidate = interner.get_or_intern(base);
        if !self.taken.contains(&candidate) {
            return candidate;
        }
        (1..)
            .map(|n| interner.get_or_intern(&format!("{base}_{n}")))
            .find(|id| !self.taken.contains(id))
            .unwrap_or(candidate)
    }

    /// Creates a storage object. `name` must come from
    /// [`unique_name`](Self::unique_name).
    pub fn add_object(
        &mut self,
        name: Ident,
        kind: ObjectKind,
        ty: Type,
        default: Option<ConstValue>,
        span: Span,
    ) -> ObjectId {
        let ty = self.types.intern(ty);
        self.taken.insert(name);
        self.objects.alloc_with(|id| StorageObject {
            id,
            name,
            kind,
            ty,
            default,
            mode: None,
            driver: None,
            buffer: None,
            buffer_of: None,
            span,
        })
    }

    /// Returns an object.
    pub fn object(&self, id: ObjectId) -> &StorageObject {
        &self.objects[id]
    }

    /// Element type of an object.
    pub fn object_type(&self, id: ObjectId) -> Type {
        self.types.get(self.objects[id].ty)
    }

    /// Ports in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = &StorageObject> {
        self.objects
            .values()
            .filter(|o| matches!(o.kind, ObjectKind::Port(_)))
    }

    /// Finds a context by name.
    pub fn context_named(&self, name: Ident) -> Option<&Context> {
        self.contexts.values().find(|c| c.name == name)
    }

    /// Returns `true` if any context failed.
    pub fn has_failures(&self) -> bool {
        self.contexts.values().any(|c| c.failed)
    }

    /// Printable names for expressions of `context`.
    pub fn names<'a>(&'a self, interner: &'a Interner, context: &'a Context) -> DesignNames<'a> {
        DesignNames {
            design: self,
            interner,
            context,
        }
    }
}

/// Resolves object and temporary IDs of one context to their names.
pub struct DesignNames<'a> {
    design: &'a Design,
    interner: &'a Interner,
    context: &'a Context,
}

impl NameSource for DesignNames<'_> {
    fn object_name(&self, id: ObjectId) -> String {
        self.interner
            .resolve(self.design.objects[id].name)
            .to_string()
    }

    fn temp_name(&self, id: TempId) -> String {
        match self.context.temps.try_get(id) {
            Some(temp) => self.interner.resolve(temp.name).to_string(),
            None => id.to_string(),
        }
    }

    fn temp_value(&self, id: TempId) -> Option<&Expr> {
        self.context.temps.try_get(id).map(|t| &t.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextKind, Temporary};
    use crate::object::PortDirection;

    #[test]
    fn unique_names() {
        let interner = Interner::new();
        let mut design = Design::new(interner.get_or_intern("top"));
        let first = design.unique_name("count", &interner);
        design.add_object(first, ObjectKind::Signal, Type::Bit, None, Span::DUMMY);
        let second = design.unique_name("count", &interner);
        assert_eq!(interner.resolve(second), "count_1");
        design.add_object(second, ObjectKind::Signal, Type::Bit, None, Span::DUMMY);
        assert_eq!(interner.resolve(design.unique_name("count", &interner)), "count_2");
    }

    #[test]
    fn ports_filter() {
        let interner = Interner::new();
        let mut design = Design::new(interner.get_or_intern("top"));
        design.add_object(
            interner.get_or_intern("a"),
            ObjectKind::Port(PortDirection::In),
            Type::Bit,
            None,
            Span::DUMMY,
        );
        design.add_object(
            interner.get_or_intern("s"),
            ObjectKind::Signal,
            Type::Unsigned { width: 4 },
            Some(ConstValue::Int(0)),
            Span::DUMMY,
        );
        assert_eq!(design.ports().count(), 1);
        assert_eq!(design.object_type(ObjectId::from_raw(1)).width(), 4);
    }

    #[test]
    fn names_resolve_temps() {
        let interner = Interner::new();
        let mut design = Design::new(interner.get_or_intern("top"));
        let obj = design.add_object(
            interner.get_or_intern("x"),
            ObjectKind::Signal,
            Type::Bit,
            None,
            Span::DUMMY,
        );
        let mut ctx = Context::new(
            ContextId::from_raw(0),
            interner.get_or_intern("main"),
            ContextKind::Concurrent,
            Span::DUMMY,
        );
        let t = ctx.temps.alloc(Temporary {
            name: interner.get_or_intern("y"),
            value: Expr::Object(obj),
            span: Span::DUMMY,
        });
        let names = design.names(&interner, &ctx);
        assert_eq!(names.object_name(obj), "x");
        assert_eq!(names.temp_name(t), "y");
        assert_eq!(names.temp_value(t), Some(&Expr::Object(obj)));
    }
}
