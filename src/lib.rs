//! HLSL toolchain building blocks.
//!
//! - [`container`]: reading and writing DXBC shader containers
//! - [`compiler`]: the HLSL type engine and IR construction
//! - [`core`]: spans, diagnostics and the shared error types
//!
//! ```
//! use hlslc::prelude::*;
//!
//! let mut ctx = Context::new();
//! let float2 = ctx.types.vector(BaseType::Float, 2).unwrap();
//! let float1 = ctx.types.scalar(BaseType::Float).unwrap();
//! let a = ctx.declare_variable(Var::new("a", float2, Span::default()), false)?;
//! let b = ctx.declare_variable(Var::new("b", float1, Span::default()), false)?;
//!
//! let mut body = InstrList::new();
//! let mut builder = ExprBuilder::new(&mut ctx, &mut body);
//! let la = builder.new_load(a, None, Span::default())?;
//! builder.append(la)?;
//! let lb = builder.new_load(b, None, Span::default())?;
//! builder.append(lb)?;
//! builder.add_expr(ExprOp::Add, [Some(la), Some(lb), None], Span::default())?;
//!
//! assert_eq!(body.len(), 4);
//! # Ok::<(), hlslc::core::CompilationError>(())
//! ```

pub use hlslc_compiler as compiler;
pub use hlslc_container as container;
pub use hlslc_core as core;

pub use hlslc_core::{HlslError, Result};

pub mod prelude {
    pub use hlslc_compiler::expr::{AssignOp, ExprBuilder};
    pub use hlslc_compiler::ir::{ExprOp, InstrList, IrDump, NodeId};
    pub use hlslc_compiler::scope::Var;
    pub use hlslc_compiler::types::{BaseType, TypeId};
    pub use hlslc_compiler::{CompileFlags, CompilerOptions, Context};
    pub use hlslc_container::{Container, FourCC, Section};
    pub use hlslc_core::{CompilationError, ContainerError, Diagnostics, HlslError, Span};
}
