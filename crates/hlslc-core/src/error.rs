//! Unified error types for the HLSL toolchain.
//!
//! ## Error Hierarchy
//!
//! ```text
//! HlslError (top-level wrapper)
//! ├── ContainerError    - DXBC container parse/serialize failures
//! └── CompilationError  - type checking, expression and assignment construction
//! ```
//!
//! Container errors are fatal to the call that produced them. Compilation
//! errors abort only the construction call (cast, expression, assignment)
//! that raised them; the driver reports them and moves on to the next
//! statement.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Container Errors
// ============================================================================

/// Errors raised while reading or writing a DXBC container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// The buffer does not start with the `DXBC` tag.
    #[error("malformed container: bad magic {found:#010x}")]
    BadMagic { found: u32 },

    /// The header's total-size field does not match the buffer length.
    #[error("malformed container: declared size {declared} but buffer is {actual} bytes")]
    SizeMismatch { declared: u32, actual: usize },

    /// A read ran past the end of the buffer.
    #[error("malformed container: need {needed} bytes at offset {offset}, buffer is {len} bytes")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A chunk's offset or payload lies outside the buffer.
    #[error("malformed container: chunk {index} at offset {offset} with size {size} is out of bounds")]
    ChunkOutOfBounds { index: u32, offset: u32, size: u32 },

    /// The serialized container would not fit the 32-bit size field.
    #[error("container too large to serialize")]
    SizeOverflow,

    /// Growing the section list or the output buffer failed.
    #[error("out of memory")]
    OutOfMemory,
}

impl ContainerError {
    /// Whether this error means the input was not a well-formed container.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ContainerError::BadMagic { .. }
                | ContainerError::SizeMismatch { .. }
                | ContainerError::Truncated { .. }
                | ContainerError::ChunkOutOfBounds { .. }
        )
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors raised by the type engine while building IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// An operand of an expression is not a scalar, vector or matrix.
    #[error("at {span}: non scalar/vector/matrix data type in expression")]
    NonNumericExpression { span: Span },

    /// Two operands cannot be unified to a common type.
    #[error("at {span}: expression data types are incompatible")]
    IncompatibleTypes { span: Span },

    /// No implicit conversion exists between the two types.
    #[error("at {span}: can't implicitly convert {from} to {to}")]
    InvalidImplicitConversion {
        /// Source type name.
        from: String,
        /// Target type name.
        to: String,
        span: Span,
    },

    /// The left-hand side of an assignment does not resolve to a variable.
    #[error("at {span}: {message}")]
    InvalidLvalue {
        /// `invalid lvalue` or `invalid writemask`.
        message: String,
        span: Span,
    },

    /// A cast appears on the left-hand side of an assignment.
    #[error("at {span}: casts on the left-hand side of an assignment are not supported")]
    UnsupportedCastOnLvalue { span: Span },

    /// A swizzle writemask is applied to a matrix on the left-hand side.
    #[error("at {span}: assignments with writemasks and matrices on lhs are not supported")]
    UnsupportedMatrixWritemask { span: Span },

    /// A declaration reuses a name already visible in the same scope.
    #[error("at {span}: redefinition of '{name}'")]
    Redefinition { name: String, span: Span },

    /// Dimensions or sizes a type cannot have.
    #[error("at {span}: {message}")]
    TypeOutOfRange { message: String, span: Span },

    /// A violated internal invariant.
    #[error("at {span}: internal error: {message}")]
    Internal { message: String, span: Span },

    /// An arena or list could not grow.
    #[error("at {span}: out of memory")]
    OutOfMemory { span: Span },
}

impl CompilationError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::NonNumericExpression { span } => *span,
            CompilationError::IncompatibleTypes { span } => *span,
            CompilationError::InvalidImplicitConversion { span, .. } => *span,
            CompilationError::InvalidLvalue { span, .. } => *span,
            CompilationError::UnsupportedCastOnLvalue { span } => *span,
            CompilationError::UnsupportedMatrixWritemask { span } => *span,
            CompilationError::Redefinition { span, .. } => *span,
            CompilationError::TypeOutOfRange { span, .. } => *span,
            CompilationError::Internal { span, .. } => *span,
            CompilationError::OutOfMemory { span } => *span,
        }
    }

    /// The diagnostic text, without the location prefix.
    pub fn message(&self) -> String {
        let full = self.to_string();
        let prefix = format!("at {}: ", self.span());
        match full.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None => full,
        }
    }

    /// Whether this is a recoverable type error (as opposed to an
    /// internal failure or allocation failure).
    pub fn is_type_error(&self) -> bool {
        !matches!(
            self,
            CompilationError::Internal { .. } | CompilationError::OutOfMemory { .. }
        )
    }

    /// Shorthand for an `invalid lvalue` error.
    pub fn invalid_lvalue(span: Span) -> Self {
        CompilationError::InvalidLvalue {
            message: "invalid lvalue".to_string(),
            span,
        }
    }

    /// Shorthand for an `invalid writemask` error.
    pub fn invalid_writemask(span: Span) -> Self {
        CompilationError::InvalidLvalue {
            message: "invalid writemask".to_string(),
            span,
        }
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error produced by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HlslError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

impl HlslError {
    /// Check if this is a container error.
    pub fn is_container(&self) -> bool {
        matches!(self, HlslError::Container(_))
    }

    /// Check if this is a compilation error.
    pub fn is_compilation(&self) -> bool {
        matches!(self, HlslError::Compilation(_))
    }

    /// Whether the failure was an allocation failure, in either phase.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(
            self,
            HlslError::Container(ContainerError::OutOfMemory)
                | HlslError::Compilation(CompilationError::OutOfMemory { .. })
        )
    }
}

/// Result alias over [`HlslError`].
pub type Result<T> = std::result::Result<T, HlslError>;
