//! Scope storage for execution.
//!
//! All scopes live in one arena and are addressed by integer handles, so no
//! scope ever borrows another: parent links are plain `ScopeId`s and the
//! evaluator walks them explicitly. Scopes have strict LIFO lifetime tied to
//! AST traversal (per call, per loop iteration, per branch), so released
//! slots go on a free list and are reused by the next child scope.
//!
//! Functions do not capture the scope of their definition; the parent link
//! is always the call-site scope.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// Handle of a scope stored in [`Scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeId(u32);

/// The root (program-level) scope, created up front and never released.
pub(crate) const ROOT_SCOPE: ScopeId = ScopeId(0);

/// One scope: an ordered map of bindings plus the enclosing scope.
///
/// Bindings are append-mostly — `var` refuses redefinition — so an insertion
/// ordered map keeps `list()` output in declaration order.
#[derive(Debug, Default)]
struct Scope {
    bindings: IndexMap<Rc<str>, Value>,
    parent: Option<ScopeId>,
}

/// The arena owning every scope alive during execution.
#[derive(Debug)]
pub(crate) struct Scopes {
    arena: Vec<Scope>,
    /// Released slots available for reuse.
    free: Vec<ScopeId>,
}

impl Scopes {
    /// Creates the arena with the root scope at index 0.
    pub fn new() -> Self {
        Self {
            arena: vec![Scope::default()],
            free: vec![],
        }
    }

    /// Opens a fresh child scope of `parent`.
    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        if let Some(id) = self.free.pop() {
            self.arena[id.0 as usize].parent = Some(parent);
            return id;
        }
        let id = ScopeId(u32::try_from(self.arena.len()).expect("scope arena overflow"));
        self.arena.push(Scope {
            bindings: IndexMap::new(),
            parent: Some(parent),
        });
        id
    }

    /// Releases a scope opened with [`push`](Self::push); its slot is reused
    /// by the next child scope.
    pub fn pop(&mut self, id: ScopeId) {
        debug_assert_ne!(id, ROOT_SCOPE);
        let scope = &mut self.arena[id.0 as usize];
        scope.bindings.clear();
        scope.parent = None;
        self.free.push(id);
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.arena[id.0 as usize].parent
    }

    /// Looks a name up along the scope chain, innermost first.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<Value> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = &self.arena[id.0 as usize];
            if let Some(value) = scope.bindings.get(name) {
                return Some(value.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// The scope along the chain that owns a binding for `name`.
    pub fn owner(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = &self.arena[id.0 as usize];
            if scope.bindings.contains_key(name) {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    /// Overwrites an existing binding in the scope that owns it. Returns
    /// false if no scope along the chain binds `name`.
    pub fn assign(&mut self, from: ScopeId, name: &str, value: Value) -> bool {
        let Some(owner) = self.owner(from, name) else {
            return false;
        };
        if let Some(slot) = self.arena[owner.0 as usize].bindings.get_mut(name) {
            *slot = value;
        }
        true
    }

    /// Introduces a binding in `scope` itself. Returns false (leaving the
    /// prior value standing) if the name is already bound there; shadowing
    /// an outer scope is fine.
    pub fn declare(&mut self, scope: ScopeId, name: Rc<str>, value: Value) -> bool {
        let bindings = &mut self.arena[scope.0 as usize].bindings;
        if bindings.contains_key(&*name) {
            return false;
        }
        bindings.insert(name, value);
        true
    }

    /// The bindings of one scope, in declaration order.
    pub fn bindings(&self, id: ScopeId) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.arena[id.0 as usize].bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{ROOT_SCOPE, Scopes};
    use crate::value::Value;

    fn name(text: &str) -> Rc<str> {
        Rc::from(text)
    }

    #[test]
    fn lookup_walks_the_chain() {
        let mut scopes = Scopes::new();
        assert!(scopes.declare(ROOT_SCOPE, name("x"), Value::Int(1)));
        let inner = scopes.push(ROOT_SCOPE);
        assert!(matches!(scopes.lookup(inner, "x"), Some(Value::Int(1))));
        assert!(scopes.lookup(inner, "y").is_none());
    }

    #[test]
    fn redefinition_is_refused_but_shadowing_works() {
        let mut scopes = Scopes::new();
        assert!(scopes.declare(ROOT_SCOPE, name("x"), Value::Int(1)));
        assert!(!scopes.declare(ROOT_SCOPE, name("x"), Value::Int(2)));
        assert!(matches!(scopes.lookup(ROOT_SCOPE, "x"), Some(Value::Int(1))));

        let inner = scopes.push(ROOT_SCOPE);
        assert!(scopes.declare(inner, name("x"), Value::Int(3)));
        assert!(matches!(scopes.lookup(inner, "x"), Some(Value::Int(3))));
        assert!(matches!(scopes.lookup(ROOT_SCOPE, "x"), Some(Value::Int(1))));
    }

    #[test]
    fn assignment_mutates_the_owning_scope() {
        let mut scopes = Scopes::new();
        scopes.declare(ROOT_SCOPE, name("x"), Value::Int(1));
        let inner = scopes.push(ROOT_SCOPE);
        assert!(scopes.assign(inner, "x", Value::Int(5)));
        assert!(matches!(scopes.lookup(ROOT_SCOPE, "x"), Some(Value::Int(5))));
        assert!(!scopes.assign(inner, "missing", Value::Null));
    }

    #[test]
    fn released_slots_are_reused() {
        let mut scopes = Scopes::new();
        let a = scopes.push(ROOT_SCOPE);
        scopes.pop(a);
        let b = scopes.push(ROOT_SCOPE);
        assert_eq!(a, b);
    }
}
