//! Compile session context.
//!
//! A [`Context`] owns everything that outlives a single statement: the type
//! registry, the scope chain, the function table and the collected
//! diagnostics. The builtin types are named in the global scope when the
//! context is created.

use hlslc_core::{CompilationError, DiagnosticSink, Diagnostics, Severity, Span};

use crate::functions::{DeclOutcome, FunctionDecl, FunctionTable, Signature};
use crate::options::CompilerOptions;
use crate::scope::{Scopes, Var, VarId};
use crate::types::{BaseType, Majority, TypeId, TypeRegistry};

/// Type names that alias a builtin.
const ALIASES: [(&str, BaseType, u32, u32); 6] = [
    ("DWORD", BaseType::Uint, 1, 1),
    ("dword", BaseType::Uint, 1, 1),
    ("FLOAT", BaseType::Float, 1, 1),
    ("VECTOR", BaseType::Float, 4, 1),
    ("vector", BaseType::Float, 4, 1),
    ("matrix", BaseType::Float, 4, 4),
];

/// State of one compile session.
#[derive(Debug, Clone)]
pub struct Context {
    pub types: TypeRegistry,
    pub scopes: Scopes,
    pub functions: FunctionTable,
    pub diagnostics: Diagnostics,
    options: CompilerOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context with default options (column-major packing).
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        let types = TypeRegistry::new();
        let mut scopes = Scopes::new();

        for (id, ty) in types.iter() {
            if let Some(name) = &ty.name {
                scopes.add_type(name.as_str(), id);
            }
        }
        for (name, base, dimx, dimy) in ALIASES {
            let id = if dimy > 1 {
                types.matrix(base, dimx, dimy)
            } else if dimx > 1 {
                types.vector(base, dimx)
            } else {
                types.scalar(base)
            };
            if let Some(id) = id {
                scopes.add_type(name, id);
            }
        }

        Self {
            types,
            scopes,
            functions: FunctionTable::new(),
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn default_majority(&self) -> Majority {
        self.options.default_majority
    }

    /// Deep copy of a declared type with the session's default majority
    /// applied where the declaration names none.
    pub fn resolve_type(&mut self, ty: TypeId) -> Result<TypeId, CompilationError> {
        let majority = self.options.default_majority;
        self.types
            .clone_type(ty, majority)
            .map_err(|err| self.report(err))
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Declares a variable in the current scope, reporting redefinitions.
    pub fn declare_variable(&mut self, var: Var, local: bool) -> Result<VarId, CompilationError> {
        self.scopes
            .add_declaration(var, local)
            .map_err(|err| self.report(err))
    }

    /// Registers a function overload, keyed by its parameter types.
    ///
    /// Every parameter must already be declared.
    pub fn add_function_decl(
        &mut self,
        name: &str,
        decl: FunctionDecl,
        intrinsic: bool,
    ) -> Result<DeclOutcome, CompilationError> {
        let mut params = Vec::with_capacity(decl.parameters.len());
        for &param in &decl.parameters {
            let Some(data_type) = self.scopes.var(param).map(|v| v.data_type) else {
                return Err(self.report(CompilationError::Internal {
                    message: format!("function {name} has an undeclared parameter"),
                    span: decl.span,
                }));
            };
            params.push(data_type);
        }
        let signature = Signature::from_params(&self.types, &params);
        Ok(self
            .functions
            .add_function_decl(name, signature, decl, intrinsic))
    }

    // ==========================================================================
    // Diagnostics
    // ==========================================================================

    /// Records an error and hands it back for propagation.
    pub fn report(&mut self, err: CompilationError) -> CompilationError {
        self.diagnostics.report_error(&err);
        err
    }

    pub fn warn(&mut self, span: Span, message: &str) {
        self.diagnostics.report(span, Severity::Warning, message);
    }
}
