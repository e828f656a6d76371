//! Lexical scopes for variables and named types.
//!
//! Scopes form a chain from the innermost block up to the global scope.
//! Variables are stored in one session-wide table and addressed by
//! [`VarId`]; a scope only records which of them it declares, in order.
//!
//! A function body is two scopes deep: the parameter scope directly below
//! the globals, then the body scope. Locals declared in the body scope may
//! not shadow parameters.

use std::fmt;
use std::ops::Index;

use hlslc_core::{CompilationError, Span};
use rustc_hash::FxHashMap;

use crate::types::{Modifiers, TypeId};

// ============================================================================
// Variables
// ============================================================================

/// Handle to a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) u32);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var#{}", self.0)
    }
}

/// A declared variable or function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub data_type: TypeId,
    pub semantic: Option<String>,
    pub modifiers: Modifiers,
    /// Source location of the declaration
    pub span: Span,
}

impl Var {
    pub fn new(name: impl Into<String>, data_type: TypeId, span: Span) -> Self {
        Self {
            name: name.into(),
            data_type,
            semantic: None,
            modifiers: Modifiers::empty(),
            span,
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

// ============================================================================
// Scopes
// ============================================================================

/// Handle to a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Default)]
struct Scope {
    vars: Vec<VarId>,
    types: FxHashMap<String, TypeId>,
    upper: Option<ScopeId>,
}

/// The scope chain of a compile session.
#[derive(Debug, Clone)]
pub struct Scopes {
    vars: Vec<Var>,
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    const GLOBALS: ScopeId = ScopeId(0);

    /// A chain holding only the global scope.
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            scopes: vec![Scope::default()],
            current: Self::GLOBALS,
        }
    }

    pub fn globals(&self) -> ScopeId {
        Self::GLOBALS
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn is_global(&self) -> bool {
        self.current == Self::GLOBALS
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enters a new scope nested in the current one.
    pub fn push_scope(&mut self) -> Result<ScopeId, CompilationError> {
        self.scopes
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory {
                span: Span::default(),
            })?;
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            upper: Some(self.current),
            ..Scope::default()
        });
        tracing::debug!(depth = self.depth() + 1, "pushing a new scope");
        self.current = id;
        Ok(id)
    }

    /// Returns to the enclosing scope. The global scope cannot be popped.
    pub fn pop_scope(&mut self) -> bool {
        match self.scope(self.current).upper {
            Some(upper) => {
                tracing::debug!(depth = self.depth(), "popping current scope");
                self.current = upper;
                true
            }
            None => false,
        }
    }

    /// Nesting depth of the current scope; the globals are depth 0.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.scope(self.current).upper, |&s| self.scope(s).upper).count()
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    /// Declares `var` in the current scope.
    ///
    /// Fails if the scope already declares the name. For a local in a
    /// function's body scope, the name also may not redefine a parameter.
    pub fn add_declaration(&mut self, var: Var, local: bool) -> Result<VarId, CompilationError> {
        let scope = self.scope(self.current);
        let mut taken = self.declares(scope, &var.name);

        if !taken && local {
            if let Some(params) = scope.upper {
                if self.scope(params).upper == Some(Self::GLOBALS) {
                    taken = self.declares(self.scope(params), &var.name);
                }
            }
        }
        if taken {
            return Err(CompilationError::Redefinition {
                name: var.name,
                span: var.span,
            });
        }

        self.vars
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory { span: var.span })?;
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        self.scopes[self.current.0 as usize].vars.push(id);
        Ok(id)
    }

    /// Looks a variable up from the current scope outwards.
    pub fn get_variable(&self, name: &str) -> Option<VarId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let s = self.scope(id);
            if let Some(&var) = s.vars.iter().find(|&&v| self.vars[v.index()].name == name) {
                return Some(var);
            }
            scope = s.upper;
        }
        None
    }

    pub fn var(&self, id: VarId) -> Option<&Var> {
        self.vars.get(id.index())
    }

    /// Variables declared in the current scope, in declaration order.
    pub fn current_vars(&self) -> &[VarId] {
        &self.scope(self.current).vars
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Names a type in the current scope. Returns `false` if the name is
    /// already taken there.
    pub fn add_type(&mut self, name: impl Into<String>, ty: TypeId) -> bool {
        let types = &mut self.scopes[self.current.0 as usize].types;
        let name = name.into();
        if types.contains_key(&name) {
            return false;
        }
        types.insert(name, ty);
        true
    }

    /// Looks a type name up in the current scope and, if `recursive`, in
    /// every enclosing scope.
    pub fn get_type(&self, name: &str, recursive: bool) -> Option<TypeId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let s = self.scope(id);
            if let Some(&ty) = s.types.get(name) {
                return Some(ty);
            }
            if !recursive {
                break;
            }
            scope = s.upper;
        }
        None
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn declares(&self, scope: &Scope, name: &str) -> bool {
        scope.vars.iter().any(|&v| self.vars[v.index()].name == name)
    }
}

impl Index<VarId> for Scopes {
    type Output = Var;

    fn index(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseType, TypeRegistry};

    fn float() -> TypeId {
        TypeRegistry::new().scalar(BaseType::Float).unwrap()
    }

    fn var(name: &str) -> Var {
        Var::new(name, float(), Span::new(1, 1, 1))
    }

    #[test]
    fn global_scope_cannot_be_popped() {
        let mut scopes = Scopes::new();
        assert!(scopes.is_global());
        assert!(!scopes.pop_scope());

        scopes.push_scope().unwrap();
        assert_eq!(scopes.depth(), 1);
        assert!(scopes.pop_scope());
        assert!(scopes.is_global());
    }

    #[test]
    fn duplicate_in_same_scope() {
        let mut scopes = Scopes::new();
        scopes.add_declaration(var("x"), false).unwrap();
        let err = scopes.add_declaration(var("x"), false).unwrap_err();
        assert!(matches!(err, CompilationError::Redefinition { ref name, .. } if name == "x"));
    }

    #[test]
    fn shadowing_across_blocks() {
        let mut scopes = Scopes::new();
        let outer = scopes.add_declaration(var("x"), false).unwrap();
        scopes.push_scope().unwrap();
        scopes.push_scope().unwrap();
        scopes.push_scope().unwrap();
        let inner = scopes.add_declaration(var("x"), true).unwrap();
        assert_eq!(scopes.get_variable("x"), Some(inner));
        scopes.pop_scope();
        assert_eq!(scopes.get_variable("x"), Some(outer));
    }

    #[test]
    fn locals_cannot_redefine_parameters() {
        let mut scopes = Scopes::new();
        scopes.push_scope().unwrap();
        scopes.add_declaration(var("p"), false).unwrap();
        scopes.push_scope().unwrap();
        assert!(scopes.add_declaration(var("p"), true).is_err());
        // Non-locals and nested blocks are not checked against parameters.
        assert!(scopes.add_declaration(var("p"), false).is_ok());
        scopes.push_scope().unwrap();
        assert!(scopes.add_declaration(var("p"), true).is_ok());
    }

    #[test]
    fn lookup_walks_outwards() {
        let mut scopes = Scopes::new();
        let g = scopes.add_declaration(var("g"), false).unwrap();
        scopes.push_scope().unwrap();
        assert_eq!(scopes.get_variable("g"), Some(g));
        assert_eq!(scopes.get_variable("missing"), None);
        assert_eq!(scopes[g].name, "g");
    }

    #[test]
    fn type_lookup_recursion() {
        let mut scopes = Scopes::new();
        let ty = float();
        assert!(scopes.add_type("real", ty));
        assert!(!scopes.add_type("real", ty));
        scopes.push_scope().unwrap();
        assert_eq!(scopes.get_type("real", true), Some(ty));
        assert_eq!(scopes.get_type("real", false), None);
    }
}
