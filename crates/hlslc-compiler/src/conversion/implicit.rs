use crate::types::{TypeClass, TypeId, TypeRegistry};

use super::convertible;

/// Whether the compiler may convert `from` to `to` without an explicit cast.
///
/// Strictly narrower than [`compatible`](super::compatible): structs only
/// convert to structurally identical structs, and arrays only to shapes with
/// the same component count.
pub fn implicit_compatible(types: &TypeRegistry, from: TypeId, to: TypeId) -> bool {
    let (t1, t2) = (&types[from], &types[to]);
    if !convertible(t1) || !convertible(t2) {
        return false;
    }
    let (c1, c2) = (t1.class(), t2.class());
    let count = |id| types.components_count(id);

    if c1.is_numeric() && c2.is_numeric() && (t1.is_single_component() || t2.is_single_component())
    {
        return true;
    }

    if c1 == TypeClass::Array && c2 == TypeClass::Array {
        return count(from) == count(to);
    }

    if (c1 == TypeClass::Array && c2.is_numeric()) || (c1.is_numeric() && c2 == TypeClass::Array) {
        // float4[3] to float4
        if t1.array().is_some_and(|(element, _)| types.compare_types(element, to)) {
            return true;
        }
        return count(from) == count(to);
    }

    if c1.is_scalar_or_vector() && c2.is_scalar_or_vector() {
        return t1.dimx >= t2.dimx;
    }

    if c1 == TypeClass::Matrix || c2 == TypeClass::Matrix {
        if c1 == TypeClass::Matrix
            && c2 == TypeClass::Matrix
            && t1.dimx >= t2.dimx
            && t1.dimy >= t2.dimy
        {
            return true;
        }
        return (c1 == TypeClass::Vector || c2 == TypeClass::Vector) && count(from) == count(to);
    }

    if c1 == TypeClass::Struct && c2 == TypeClass::Struct {
        return types.compare_types(from, to);
    }

    false
}
