//! HLSL Type Engine
//!
//! Types, conversions and IR construction for an HLSL front end. A parser
//! drives a [`Context`] and an [`ExprBuilder`]: declarations go into the
//! scope chain and function table, and expressions and assignments are
//! lowered into an [`InstrList`](ir::InstrList) with the needed casts
//! inserted.
//!
//! ## Modules
//!
//! - [`types`]: type descriptors, the builtin table and type names
//! - [`conversion`]: explicit, implicit and expression compatibility
//! - [`ir`]: IR nodes, the instruction list and its text dump
//! - [`expr`]: expression and assignment construction
//! - [`scope`]: variables and the scope chain
//! - [`functions`]: functions and their overloads
//! - [`context`]: per-session state
//! - [`options`]: compile flags

pub mod context;
pub mod conversion;
pub mod expr;
pub mod functions;
pub mod ir;
pub mod options;
pub mod scope;
pub mod types;

pub use context::Context;
pub use conversion::{compatible, expr_common_type, expr_compatible, implicit_compatible};
pub use expr::{AssignOp, ExprBuilder, InvertedSwizzle, invert_swizzle};
pub use functions::{
    DeclOutcome, Function, FunctionDecl, FunctionTable, ParamLayout, ParamShape, Signature,
};
pub use ir::{InstrList, IrDump, NodeId};
pub use options::{CompileFlags, CompilerOptions};
pub use scope::{Scopes, Var, VarId};
pub use types::{BaseType, HlslType, Majority, Modifiers, TypeClass, TypeId, TypeRegistry};

// Re-export CompilationError from core for convenience
pub use hlslc_core::CompilationError;
