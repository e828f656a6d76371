//! HLSL type model.
//!
//! Types live in a session-scoped arena ([`TypeRegistry`]) and are addressed
//! by [`TypeId`]. Two types are the same type when they compare equal
//! structurally ([`TypeRegistry::compare_types`]); handle identity is only a
//! fast path.
//!
//! ## Classes
//!
//! The order of [`TypeClass`] is significant: everything up to and including
//! [`TypeClass::LAST_NUMERIC`] is a plain numeric shape (`dimx` columns by
//! `dimy` rows) and takes part in arithmetic.
//!
//! ## Register size
//!
//! | class  | register size                         |
//! |--------|---------------------------------------|
//! | matrix | `dimy` if row-major, otherwise `dimx` |
//! | array  | element register size × count         |
//! | struct | sum of field register sizes           |
//! | other  | 1                                     |

use std::fmt;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

mod format;
mod registry;

pub use format::{base_type_name, modifiers_string, swizzle_string, writemask_string};
pub use registry::TypeRegistry;

// ============================================================================
// Handles and enums
// ============================================================================

/// Handle to a type in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Shape category of a type, in significant order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum TypeClass {
    Scalar = 0,
    Vector,
    Matrix,
    Struct,
    Array,
    Object,
}

impl TypeClass {
    /// Last class that is a plain numeric shape.
    pub const LAST_NUMERIC: TypeClass = TypeClass::Matrix;

    #[inline]
    pub fn is_numeric(self) -> bool {
        self <= Self::LAST_NUMERIC
    }

    /// Whether this is a scalar or vector class.
    #[inline]
    pub fn is_scalar_or_vector(self) -> bool {
        self <= TypeClass::Vector
    }
}

/// Base component kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum BaseType {
    Float = 0,
    Half,
    Double,
    Int,
    Uint,
    Bool,
    Sampler,
    Texture,
    PixelShader,
    VertexShader,
    String,
    Void,
}

impl BaseType {
    /// Last base kind that is a numeric scalar.
    pub const LAST_SCALAR: BaseType = BaseType::Bool;

    /// Every numeric scalar kind, in declaration order.
    pub const NUMERIC: [BaseType; 6] = [
        BaseType::Float,
        BaseType::Half,
        BaseType::Double,
        BaseType::Int,
        BaseType::Uint,
        BaseType::Bool,
    ];

    #[inline]
    pub fn is_numeric(self) -> bool {
        self <= Self::LAST_SCALAR
    }
}

/// Dimensionality of a sampler type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum SamplerDim {
    #[default]
    Generic = 0,
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
}

impl SamplerDim {
    pub const ALL: [SamplerDim; 5] = [
        SamplerDim::Generic,
        SamplerDim::Dim1D,
        SamplerDim::Dim2D,
        SamplerDim::Dim3D,
        SamplerDim::Cube,
    ];
}

bitflags! {
    /// Type and storage modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const CONST = 1 << 0;
        const ROW_MAJOR = 1 << 1;
        const COLUMN_MAJOR = 1 << 2;
        const PRECISE = 1 << 3;
        const EXTERN = 1 << 4;
        const NOINTERPOLATION = 1 << 5;
        const SHARED = 1 << 6;
        const GROUPSHARED = 1 << 7;
        const STATIC = 1 << 8;
        const UNIFORM = 1 << 9;
        const VOLATILE = 1 << 10;
        const IN = 1 << 11;
        const OUT = 1 << 12;

        const MAJORITY_MASK = Self::ROW_MAJOR.bits() | Self::COLUMN_MAJOR.bits();
        const INOUT = Self::IN.bits() | Self::OUT.bits();
    }
}

/// Matrix packing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Majority {
    Row,
    #[default]
    Column,
}

impl Majority {
    pub fn modifier(self) -> Modifiers {
        match self {
            Majority::Row => Modifiers::ROW_MAJOR,
            Majority::Column => Modifiers::COLUMN_MAJOR,
        }
    }
}

// ============================================================================
// Type
// ============================================================================

/// A named member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub semantic: Option<String>,
    pub ty: TypeId,
    pub modifiers: Modifiers,
    /// Register offset from the start of the struct.
    pub reg_offset: u32,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            semantic: None,
            ty,
            modifiers: Modifiers::empty(),
            reg_offset: 0,
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

/// Class-specific payload of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Vector,
    Matrix,
    Struct { fields: Vec<StructField> },
    Array { element: TypeId, count: u32 },
    Object,
}

impl TypeKind {
    pub fn class(&self) -> TypeClass {
        match self {
            TypeKind::Scalar => TypeClass::Scalar,
            TypeKind::Vector => TypeClass::Vector,
            TypeKind::Matrix => TypeClass::Matrix,
            TypeKind::Struct { .. } => TypeClass::Struct,
            TypeKind::Array { .. } => TypeClass::Array,
            TypeKind::Object => TypeClass::Object,
        }
    }
}

/// A type in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlslType {
    /// Declared or builtin name; `None` for derived types.
    pub name: Option<String>,
    pub kind: TypeKind,
    pub base: BaseType,
    /// Only meaningful when `base` is [`BaseType::Sampler`].
    pub sampler_dim: SamplerDim,
    /// Columns.
    pub dimx: u32,
    /// Rows.
    pub dimy: u32,
    pub modifiers: Modifiers,
    pub reg_size: u32,
}

impl HlslType {
    #[inline]
    pub fn class(&self) -> TypeClass {
        self.kind.class()
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.class().is_numeric()
    }

    /// A 1×1 shape (scalar, `float1`, `float1x1`, ...).
    #[inline]
    pub fn is_single_component(&self) -> bool {
        self.dimx == 1 && self.dimy == 1
    }

    /// `dimx × dimy`, the component count of a numeric shape.
    #[inline]
    pub fn shape_count(&self) -> u32 {
        self.dimx * self.dimy
    }

    #[inline]
    pub fn is_row_major(&self) -> bool {
        self.modifiers.contains(Modifiers::ROW_MAJOR)
    }

    pub fn fields(&self) -> &[StructField] {
        match &self.kind {
            TypeKind::Struct { fields } => fields,
            _ => &[],
        }
    }

    /// Element type and count when this is an array.
    pub fn array(&self) -> Option<(TypeId, u32)> {
        match self.kind {
            TypeKind::Array { element, count } => Some((element, count)),
            _ => None,
        }
    }

    /// Register size a matrix of this shape occupies under its own majority.
    pub(crate) fn matrix_reg_size(&self) -> u32 {
        if self.is_row_major() { self.dimy } else { self.dimx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_order() {
        assert!(TypeClass::Scalar < TypeClass::Vector);
        assert!(TypeClass::Vector < TypeClass::Matrix);
        assert!(TypeClass::Matrix < TypeClass::Struct);
        assert!(TypeClass::Struct < TypeClass::Array);
        assert!(TypeClass::Array < TypeClass::Object);
        assert!(TypeClass::Matrix.is_numeric());
        assert!(!TypeClass::Struct.is_numeric());
    }

    #[test]
    fn base_type_numeric_range() {
        for base in BaseType::NUMERIC {
            assert!(base.is_numeric());
        }
        assert!(!BaseType::Sampler.is_numeric());
        assert!(!BaseType::Void.is_numeric());
        assert_eq!(BaseType::try_from(5u8), Ok(BaseType::Bool));
        assert_eq!(u8::from(BaseType::Sampler), 6);
    }

    #[test]
    fn majority_mask_covers_both() {
        assert!(Modifiers::MAJORITY_MASK.contains(Modifiers::ROW_MAJOR));
        assert!(Modifiers::MAJORITY_MASK.contains(Modifiers::COLUMN_MAJOR));
        assert_eq!(Majority::default().modifier(), Modifiers::COLUMN_MAJOR);
    }
}
