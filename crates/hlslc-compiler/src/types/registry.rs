//! Session-scoped type arena.
//!
//! Every type created during a compile session lives here until the session
//! is dropped. Types are never freed individually; a failed deep clone rolls
//! the arena back to where it started instead.

use std::ops::Index;

use hlslc_core::{CompilationError, Span};

use super::{
    BaseType, HlslType, Majority, Modifiers, SamplerDim, StructField, TypeClass, TypeId, TypeKind,
};

// ============================================================================
// Builtin table
// ============================================================================

/// Pre-built scalar, vector, matrix and sampler types.
#[derive(Debug, Clone)]
struct Builtins {
    /// Indexed by numeric base.
    scalar: [TypeId; 6],
    /// Indexed by numeric base, then `dimx - 1`.
    vector: [[TypeId; 4]; 6],
    /// Indexed by numeric base, then `dimx - 1`, then `dimy - 1`.
    matrix: [[[TypeId; 4]; 4]; 6],
    /// Indexed by sampler dimension.
    sampler: [TypeId; 5],
    void: TypeId,
}

fn numeric_index(base: BaseType) -> Option<usize> {
    base.is_numeric().then(|| u8::from(base) as usize)
}

// ============================================================================
// TypeRegistry
// ============================================================================

/// Arena of every type known to a compile session.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<HlslType>,
    builtins: Builtins,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry pre-populated with the builtin types.
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(6 * (1 + 4 + 16) + SamplerDim::ALL.len() + 1);
        let mut push = |ty: HlslType| {
            types.push(ty);
            TypeId(types.len() as u32 - 1)
        };

        let scalar = BaseType::NUMERIC.map(|base| {
            push(numeric(Some(base_type_name(base)), TypeKind::Scalar, base, 1, 1))
        });
        let vector = BaseType::NUMERIC.map(|base| {
            std::array::from_fn(|x| {
                let dimx = x as u32 + 1;
                let name = format!("{}{}", base_type_name(base), dimx);
                push(numeric(Some(&name), TypeKind::Vector, base, dimx, 1))
            })
        });
        let matrix = BaseType::NUMERIC.map(|base| {
            std::array::from_fn(|x| {
                std::array::from_fn(|y| {
                    let (dimx, dimy) = (x as u32 + 1, y as u32 + 1);
                    let name = format!("{}{}x{}", base_type_name(base), dimy, dimx);
                    push(numeric(Some(&name), TypeKind::Matrix, base, dimx, dimy))
                })
            })
        });
        let sampler = SamplerDim::ALL.map(|dim| {
            push(HlslType {
                name: Some(sampler_name(dim).to_string()),
                kind: TypeKind::Object,
                base: BaseType::Sampler,
                sampler_dim: dim,
                dimx: 1,
                dimy: 1,
                modifiers: Modifiers::empty(),
                reg_size: 1,
            })
        });
        let void = push(numeric(Some("void"), TypeKind::Object, BaseType::Void, 1, 1));

        Self {
            types,
            builtins: Builtins {
                scalar,
                vector,
                matrix,
                sampler,
                void,
            },
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get(&self, id: TypeId) -> Option<&HlslType> {
        self.types.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &HlslType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId(i as u32), ty))
    }

    /// Builtin scalar of a numeric base kind.
    pub fn scalar(&self, base: BaseType) -> Option<TypeId> {
        numeric_index(base).map(|b| self.builtins.scalar[b])
    }

    /// Builtin vector `<base><dimx>`, for `dimx` in 1..=4.
    pub fn vector(&self, base: BaseType, dimx: u32) -> Option<TypeId> {
        let b = numeric_index(base)?;
        let x = dim_index(dimx)?;
        Some(self.builtins.vector[b][x])
    }

    /// Builtin matrix with `dimx` columns and `dimy` rows.
    pub fn matrix(&self, base: BaseType, dimx: u32, dimy: u32) -> Option<TypeId> {
        let b = numeric_index(base)?;
        Some(self.builtins.matrix[b][dim_index(dimx)?][dim_index(dimy)?])
    }

    pub fn sampler(&self, dim: SamplerDim) -> TypeId {
        self.builtins.sampler[u8::from(dim) as usize]
    }

    pub fn void(&self) -> TypeId {
        self.builtins.void
    }

    // ========================================================================
    // Construction
    // ========================================================================

    fn alloc(&mut self, ty: HlslType) -> Result<TypeId, CompilationError> {
        self.types
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory {
                span: Span::default(),
            })?;
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        Ok(id)
    }

    /// Creates a scalar, vector, matrix or object type.
    ///
    /// Struct and array types carry a payload and are built with
    /// [`new_struct_type`](Self::new_struct_type) and
    /// [`new_array_type`](Self::new_array_type).
    pub fn new_type(
        &mut self,
        name: Option<&str>,
        class: TypeClass,
        base: BaseType,
        dimx: u32,
        dimy: u32,
    ) -> Result<TypeId, CompilationError> {
        let kind = match class {
            TypeClass::Scalar => TypeKind::Scalar,
            TypeClass::Vector => TypeKind::Vector,
            TypeClass::Matrix => TypeKind::Matrix,
            TypeClass::Object => TypeKind::Object,
            TypeClass::Struct | TypeClass::Array => {
                return Err(CompilationError::Internal {
                    message: format!("{class:?} types need a payload"),
                    span: Span::default(),
                });
            }
        };
        let in_range = (1..=4).contains(&dimx) && (1..=4).contains(&dimy);
        if kind != TypeKind::Object && !in_range {
            return Err(out_of_range(format!(
                "{class:?} dimensions {dimx}x{dimy} are out of range"
            )));
        }
        self.alloc(numeric(name, kind, base, dimx, dimy))
    }

    /// `element[count]`, inheriting the element's modifiers and dimensions.
    pub fn new_array_type(&mut self, element: TypeId, count: u32) -> Result<TypeId, CompilationError> {
        let too_large = || out_of_range(format!("array of {count} elements is too large"));
        let elem = &self[element];
        let reg_size = elem.reg_size.checked_mul(count).ok_or_else(too_large)?;
        self.checked_components(element)
            .and_then(|c| c.checked_mul(count))
            .ok_or_else(too_large)?;
        let ty = HlslType {
            name: None,
            kind: TypeKind::Array { element, count },
            base: BaseType::Float,
            sampler_dim: SamplerDim::Generic,
            dimx: elem.dimx,
            dimy: elem.dimy,
            modifiers: elem.modifiers,
            reg_size,
        };
        self.alloc(ty)
    }

    /// A struct type; field register offsets are assigned here.
    pub fn new_struct_type(
        &mut self,
        name: Option<&str>,
        mut fields: Vec<StructField>,
    ) -> Result<TypeId, CompilationError> {
        let too_large = || out_of_range("struct is too large".to_string());
        let mut reg_size = 0u32;
        let mut components = 0u32;
        for field in &mut fields {
            field.reg_offset = reg_size;
            reg_size = reg_size
                .checked_add(self[field.ty].reg_size)
                .ok_or_else(too_large)?;
            components = self
                .checked_components(field.ty)
                .and_then(|c| c.checked_add(components))
                .ok_or_else(too_large)?;
        }
        self.alloc(HlslType {
            name: name.map(str::to_string),
            kind: TypeKind::Struct { fields },
            base: BaseType::Float,
            sampler_dim: SamplerDim::Generic,
            dimx: 1,
            dimy: 1,
            modifiers: Modifiers::empty(),
            reg_size,
        })
    }

    /// A shallow copy of `id` with `modifiers` added; the register size of
    /// matrices follows the resulting majority.
    pub fn new_modified_type(
        &mut self,
        id: TypeId,
        modifiers: Modifiers,
    ) -> Result<TypeId, CompilationError> {
        let mut ty = self[id].clone();
        ty.modifiers |= modifiers;
        if ty.class() == TypeClass::Matrix {
            ty.reg_size = ty.matrix_reg_size();
        }
        self.alloc(ty)
    }

    /// Deep copy of `old`.
    ///
    /// Array elements and struct fields are cloned recursively and register
    /// sizes recomputed. `default_majority` is applied to every cloned type
    /// that has no majority modifier of its own. If any allocation fails, the
    /// arena is restored to its previous length before the error is returned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn clone_type(
        &mut self,
        old: TypeId,
        default_majority: Majority,
    ) -> Result<TypeId, CompilationError> {
        let mark = self.types.len();
        let result = self.clone_type_inner(old, default_majority.modifier());
        if result.is_err() {
            self.types.truncate(mark);
        }
        result
    }

    fn clone_type_inner(
        &mut self,
        old: TypeId,
        default_majority: Modifiers,
    ) -> Result<TypeId, CompilationError> {
        let source = self[old].clone();
        let mut modifiers = source.modifiers;
        if !modifiers.intersects(Modifiers::MAJORITY_MASK) {
            modifiers |= default_majority;
        }

        let (kind, reg_size) = match source.kind {
            TypeKind::Array { element, count } => {
                let element = self.clone_type_inner(element, default_majority)?;
                let reg_size = count.checked_mul(self[element].reg_size).ok_or_else(|| {
                    out_of_range(format!("array of {count} elements is too large"))
                })?;
                (TypeKind::Array { element, count }, reg_size)
            }
            TypeKind::Struct { fields } => {
                let mut cloned = Vec::new();
                cloned
                    .try_reserve_exact(fields.len())
                    .map_err(|_| CompilationError::OutOfMemory {
                        span: Span::default(),
                    })?;
                let mut reg_size = 0;
                for field in fields {
                    let ty = self.clone_type_inner(field.ty, default_majority)?;
                    cloned.push(StructField {
                        ty,
                        reg_offset: reg_size,
                        ..field
                    });
                    reg_size = self[ty]
                        .reg_size
                        .checked_add(reg_size)
                        .ok_or_else(|| out_of_range("struct is too large".to_string()))?;
                }
                (TypeKind::Struct { fields: cloned }, reg_size)
            }
            TypeKind::Matrix => {
                let size = if modifiers.contains(Modifiers::ROW_MAJOR) {
                    source.dimy
                } else {
                    source.dimx
                };
                (TypeKind::Matrix, size)
            }
            other => (other, 1),
        };

        self.alloc(HlslType {
            kind,
            modifiers,
            reg_size,
            ..source
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Structural type equality.
    pub fn compare_types(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let (t1, t2) = (&self[a], &self[b]);

        if t1.class() != t2.class() || t1.base != t2.base {
            return false;
        }
        if t1.base == BaseType::Sampler && t1.sampler_dim != t2.sampler_dim {
            return false;
        }
        if (t1.modifiers & Modifiers::MAJORITY_MASK) != (t2.modifiers & Modifiers::MAJORITY_MASK) {
            return false;
        }
        if t1.dimx != t2.dimx || t1.dimy != t2.dimy {
            return false;
        }

        match (&t1.kind, &t2.kind) {
            (TypeKind::Struct { fields: f1 }, TypeKind::Struct { fields: f2 }) => {
                f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2)
                        .all(|(a, b)| self.compare_types(a.ty, b.ty) && a.name == b.name)
            }
            (
                TypeKind::Array {
                    element: e1,
                    count: c1,
                },
                TypeKind::Array {
                    element: e2,
                    count: c2,
                },
            ) => c1 == c2 && self.compare_types(*e1, *e2),
            _ => true,
        }
    }

    /// Number of scalar components in a value of this type.
    ///
    /// Object types have no components; asking is an internal error, logged
    /// and answered with 0.
    pub fn components_count(&self, id: TypeId) -> u32 {
        let ty = &self[id];
        match &ty.kind {
            TypeKind::Scalar | TypeKind::Vector | TypeKind::Matrix => ty.shape_count(),
            TypeKind::Array { element, count } => {
                count.saturating_mul(self.components_count(*element))
            }
            TypeKind::Struct { fields } => fields
                .iter()
                .fold(0u32, |acc, f| acc.saturating_add(self.components_count(f.ty))),
            TypeKind::Object => {
                tracing::error!(ty = %self.type_name(id), "unexpected data type in component count");
                0
            }
        }
    }

    /// Component count that fails on overflow; objects count as zero.
    fn checked_components(&self, id: TypeId) -> Option<u32> {
        let ty = &self[id];
        match &ty.kind {
            TypeKind::Scalar | TypeKind::Vector | TypeKind::Matrix => Some(ty.shape_count()),
            TypeKind::Array { element, count } => self.checked_components(*element)?.checked_mul(*count),
            TypeKind::Struct { fields } => fields.iter().try_fold(0u32, |acc, f| {
                acc.checked_add(self.checked_components(f.ty)?)
            }),
            TypeKind::Object => Some(0),
        }
    }
}

impl Index<TypeId> for TypeRegistry {
    type Output = HlslType;

    fn index(&self, id: TypeId) -> &HlslType {
        &self.types[id.index()]
    }
}

fn dim_index(dim: u32) -> Option<usize> {
    (1..=4).contains(&dim).then(|| dim as usize - 1)
}

fn out_of_range(message: String) -> CompilationError {
    CompilationError::TypeOutOfRange {
        message,
        span: Span::default(),
    }
}

fn numeric(name: Option<&str>, kind: TypeKind, base: BaseType, dimx: u32, dimy: u32) -> HlslType {
    let mut ty = HlslType {
        name: name.map(str::to_string),
        kind,
        base,
        sampler_dim: SamplerDim::Generic,
        dimx,
        dimy,
        modifiers: Modifiers::empty(),
        reg_size: 1,
    };
    if ty.class() == TypeClass::Matrix {
        ty.reg_size = ty.matrix_reg_size();
    }
    ty
}

fn base_type_name(base: BaseType) -> &'static str {
    super::base_type_name(base, SamplerDim::Generic)
}

fn sampler_name(dim: SamplerDim) -> &'static str {
    super::base_type_name(BaseType::Sampler, dim)
}
