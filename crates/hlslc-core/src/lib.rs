//! Shared building blocks for the HLSL toolchain crates.
//!
//! - [`Span`]: source locations attached to IR nodes and diagnostics
//! - [`error`]: the error hierarchy for every phase
//! - [`diagnostics`]: the warning/error sink the compiler reports into

pub mod diagnostics;
pub mod error;
mod span;

pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, Severity};
pub use error::{CompilationError, ContainerError, HlslError, Result};
pub use span::Span;
