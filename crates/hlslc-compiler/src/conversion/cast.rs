use crate::types::{TypeClass, TypeId, TypeRegistry};

use super::convertible;

/// Whether an explicit cast from `from` to `to` is legal.
pub fn compatible(types: &TypeRegistry, from: TypeId, to: TypeId) -> bool {
    let (t1, t2) = (&types[from], &types[to]);
    if !convertible(t1) || !convertible(t2) {
        return false;
    }
    let (c1, c2) = (t1.class(), t2.class());
    let count = |id| types.components_count(id);

    if c1.is_numeric() {
        // A scalar can be cast to pretty much everything.
        if t1.is_single_component() {
            return true;
        }
        if c1 == TypeClass::Vector && c2 == TypeClass::Vector {
            return t1.dimx >= t2.dimx;
        }
    }

    // And everything can be cast to a scalar.
    if c2.is_numeric() && t2.is_single_component() {
        return true;
    }

    if let Some((element, _)) = t1.array() {
        // float4[3] to float4
        if types.compare_types(element, to) {
            return true;
        }
        return if matches!(c2, TypeClass::Array | TypeClass::Struct) {
            count(from) >= count(to)
        } else {
            count(from) == count(to)
        };
    }

    if c1 == TypeClass::Struct {
        return count(from) >= count(to);
    }

    if matches!(c2, TypeClass::Array | TypeClass::Struct) {
        return count(from) == count(to);
    }

    if c1 == TypeClass::Matrix || c2 == TypeClass::Matrix {
        if c1 == TypeClass::Matrix
            && c2 == TypeClass::Matrix
            && t1.dimx >= t2.dimx
            && t1.dimy >= t2.dimy
        {
            return true;
        }
        // Matrix and vector convert when the component counts agree.
        return (c1 == TypeClass::Vector || c2 == TypeClass::Vector) && count(from) == count(to);
    }

    count(from) >= count(to)
}
