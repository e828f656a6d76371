use hlslc_core::{CompilationError, Span};

use crate::types::{BaseType, TypeClass, TypeId, TypeRegistry};

/// Whether two operand types can be unified for an arithmetic operator.
pub fn expr_compatible(types: &TypeRegistry, a: TypeId, b: TypeId) -> bool {
    let (t1, t2) = (&types[a], &types[b]);
    if !t1.base.is_numeric() || !t2.base.is_numeric() {
        return false;
    }

    // A scalar combines with anything.
    if t1.is_single_component() || t2.is_single_component() {
        return true;
    }

    let (c1, c2) = (t1.class(), t2.class());
    if c1 == TypeClass::Vector && c2 == TypeClass::Vector {
        return true;
    }

    if c1 == TypeClass::Matrix || c2 == TypeClass::Matrix {
        if c1 == TypeClass::Vector || c2 == TypeClass::Vector {
            if types.components_count(a) == types.components_count(b) {
                return true;
            }
            let vector_shaped = |c: TypeClass, dimx: u32, dimy: u32| {
                c == TypeClass::Matrix && (dimx == 1 || dimy == 1)
            };
            return vector_shaped(c1, t1.dimx, t1.dimy) || vector_shaped(c2, t2.dimx, t2.dimy);
        }

        // One matrix must contain the other.
        return (t1.dimx >= t2.dimx && t1.dimy >= t2.dimy)
            || (t1.dimx <= t2.dimx && t1.dimy <= t2.dimy);
    }

    false
}

/// The component kind two different numeric kinds promote to.
///
/// `half` is ranked level with `float`; ties go to `a`.
pub fn common_base_type(a: BaseType, b: BaseType) -> BaseType {
    const RANKING: [BaseType; 6] = [
        BaseType::Bool,
        BaseType::Int,
        BaseType::Uint,
        BaseType::Half,
        BaseType::Float,
        BaseType::Double,
    ];

    let rank = |base: BaseType| {
        RANKING
            .iter()
            .position(|&r| r == base)
            .map(|i| if base == BaseType::Half { i + 1 } else { i })
    };

    match (rank(a), rank(b)) {
        (Some(ra), Some(rb)) => {
            if ra >= rb {
                a
            } else {
                b
            }
        }
        _ => {
            tracing::warn!(?a, ?b, "unexpected base type in promotion");
            BaseType::Float
        }
    }
}

/// The type both operands of a binary operator are converted to.
///
/// Scalar and vector results come from the builtin table; matrix results are
/// new types appended to the registry.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn expr_common_type(
    types: &mut TypeRegistry,
    a: TypeId,
    b: TypeId,
    span: Span,
) -> Result<TypeId, CompilationError> {
    let (t1, t2) = (&types[a], &types[b]);
    if !t1.is_numeric() || !t2.is_numeric() {
        return Err(CompilationError::NonNumericExpression { span });
    }

    if types.compare_types(a, b) {
        return Ok(a);
    }

    if !expr_compatible(types, a, b) {
        return Err(CompilationError::IncompatibleTypes { span });
    }

    let base = if t1.base == t2.base {
        t1.base
    } else {
        common_base_type(t1.base, t2.base)
    };

    let (class, dimx, dimy) = if t1.is_single_component() {
        (t2.class(), t2.dimx, t2.dimy)
    } else if t2.is_single_component() {
        (t1.class(), t1.dimx, t1.dimy)
    } else if t1.class() == TypeClass::Matrix && t2.class() == TypeClass::Matrix {
        (TypeClass::Matrix, t1.dimx.min(t2.dimx), t1.dimy.min(t2.dimy))
    } else {
        // Two vectors, or a vector and an Nx1/1xN matrix.
        let max1 = t1.dimx.max(t1.dimy);
        let max2 = t2.dimx.max(t2.dimy);
        if t1.shape_count() == t2.shape_count() {
            (TypeClass::Vector, t1.dimx.max(t2.dimx), 1)
        } else {
            let (smaller, max_dim) = if max1 <= max2 { (t1, max1) } else { (t2, max2) };
            if smaller.class() == TypeClass::Vector {
                (TypeClass::Vector, max_dim, 1)
            } else {
                (smaller.class(), smaller.dimx, smaller.dimy)
            }
        }
    };

    let builtin = match class {
        TypeClass::Scalar => types.scalar(base),
        TypeClass::Vector => types.vector(base, dimx),
        _ => return types.new_type(None, TypeClass::Matrix, base, dimx, dimy),
    };
    builtin.ok_or_else(|| CompilationError::Internal {
        message: format!("no builtin {class:?} of {base:?} with {dimx} components"),
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SamplerDim;

    fn s(reg: &TypeRegistry, base: BaseType) -> TypeId {
        reg.scalar(base).unwrap()
    }

    #[test]
    fn promotion_order() {
        use BaseType::*;
        assert_eq!(common_base_type(Float, Int), Float);
        assert_eq!(common_base_type(Int, Float), Float);
        assert_eq!(common_base_type(Bool, Int), Int);
        assert_eq!(common_base_type(Uint, Int), Uint);
        assert_eq!(common_base_type(Double, Float), Double);
    }

    #[test]
    fn half_never_loses_to_integers_and_never_beats_float() {
        use BaseType::*;
        assert_eq!(common_base_type(Half, Int), Half);
        assert_eq!(common_base_type(Uint, Half), Half);
        assert_eq!(common_base_type(Half, Double), Double);
        // Ties with float: the first operand wins.
        assert_eq!(common_base_type(Half, Float), Half);
        assert_eq!(common_base_type(Float, Half), Float);
    }

    #[test]
    fn scalar_combinations() {
        let mut reg = TypeRegistry::new();
        let f = s(&reg, BaseType::Float);
        let i = s(&reg, BaseType::Int);
        let h = s(&reg, BaseType::Half);
        assert_eq!(expr_common_type(&mut reg, f, i, Span::default()).unwrap(), f);
        assert_eq!(expr_common_type(&mut reg, h, i, Span::default()).unwrap(), h);
    }

    #[test]
    fn scalar_takes_other_shape() {
        let mut reg = TypeRegistry::new();
        let f4 = reg.vector(BaseType::Float, 4).unwrap();
        let i = s(&reg, BaseType::Int);
        assert_eq!(expr_common_type(&mut reg, f4, i, Span::default()).unwrap(), f4);
        assert_eq!(expr_common_type(&mut reg, i, f4, Span::default()).unwrap(), f4);

        let m = reg.matrix(BaseType::Int, 3, 2).unwrap();
        let f = s(&reg, BaseType::Float);
        let result = expr_common_type(&mut reg, m, f, Span::default()).unwrap();
        assert_eq!(reg[result].class(), TypeClass::Matrix);
        assert_eq!(reg[result].base, BaseType::Float);
        assert_eq!((reg[result].dimx, reg[result].dimy), (3, 2));
    }

    #[test]
    fn vectors_take_smaller_width() {
        let mut reg = TypeRegistry::new();
        let f4 = reg.vector(BaseType::Float, 4).unwrap();
        let i2 = reg.vector(BaseType::Int, 2).unwrap();
        let f2 = reg.vector(BaseType::Float, 2).unwrap();
        assert_eq!(expr_common_type(&mut reg, f4, i2, Span::default()).unwrap(), f2);
        assert_eq!(expr_common_type(&mut reg, i2, f4, Span::default()).unwrap(), f2);
    }

    #[test]
    fn matrices_take_min_dims() {
        let mut reg = TypeRegistry::new();
        let a = reg.matrix(BaseType::Float, 4, 4).unwrap();
        let b = reg.matrix(BaseType::Float, 3, 2).unwrap();
        let result = expr_common_type(&mut reg, a, b, Span::default()).unwrap();
        assert!(reg.compare_types(result, b));
    }

    #[test]
    fn vector_and_matrix_with_equal_count() {
        let mut reg = TypeRegistry::new();
        let f4 = reg.vector(BaseType::Float, 4).unwrap();
        let m = reg.matrix(BaseType::Float, 2, 2).unwrap();
        assert!(expr_compatible(&reg, f4, m));
        assert_eq!(expr_common_type(&mut reg, m, f4, Span::default()).unwrap(), f4);
    }

    #[test]
    fn vector_shaped_matrix() {
        let mut reg = TypeRegistry::new();
        let f2 = reg.vector(BaseType::Float, 2).unwrap();
        let column = reg.matrix(BaseType::Float, 1, 3).unwrap();
        assert!(expr_compatible(&reg, f2, column));
        // The vector has the smaller extent and decides the shape.
        assert_eq!(expr_common_type(&mut reg, column, f2, Span::default()).unwrap(), f2);

        let f4 = reg.vector(BaseType::Float, 4).unwrap();
        let result = expr_common_type(&mut reg, f4, column, Span::default()).unwrap();
        assert_eq!(reg[result].class(), TypeClass::Matrix);
        assert_eq!((reg[result].dimx, reg[result].dimy), (1, 3));
    }

    #[test]
    fn incompatible_shapes() {
        let mut reg = TypeRegistry::new();
        let f3 = reg.vector(BaseType::Float, 3).unwrap();
        let m = reg.matrix(BaseType::Float, 2, 2).unwrap();
        assert!(!expr_compatible(&reg, f3, m));
        assert!(matches!(
            expr_common_type(&mut reg, f3, m, Span::new(1, 2, 0)),
            Err(CompilationError::IncompatibleTypes { .. })
        ));

        let a = reg.matrix(BaseType::Float, 3, 2).unwrap();
        let b = reg.matrix(BaseType::Float, 2, 3).unwrap();
        assert!(!expr_compatible(&reg, a, b));
    }

    #[test]
    fn non_numeric_operands() {
        let mut reg = TypeRegistry::new();
        let f = s(&reg, BaseType::Float);
        let sampler = reg.sampler(SamplerDim::Dim2D);
        assert!(matches!(
            expr_common_type(&mut reg, f, sampler, Span::default()),
            Err(CompilationError::NonNumericExpression { .. })
        ));
        let arr = reg.new_array_type(f, 2).unwrap();
        assert!(matches!(
            expr_common_type(&mut reg, arr, f, Span::default()),
            Err(CompilationError::NonNumericExpression { .. })
        ));
    }

    #[test]
    fn identical_types_short_circuit() {
        let mut reg = TypeRegistry::new();
        let a = reg
            .new_type(None, TypeClass::Vector, BaseType::Int, 3, 1)
            .unwrap();
        let b = reg.vector(BaseType::Int, 3).unwrap();
        let before = reg.len();
        assert_eq!(expr_common_type(&mut reg, a, b, Span::default()).unwrap(), a);
        assert_eq!(reg.len(), before);
    }
}
