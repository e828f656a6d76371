//! Type compatibility engine.
//!
//! Three graduated predicates decide whether a value of one type may become
//! another:
//!
//! 1. [`compatible`]: an explicit cast `(T)x` is legal
//! 2. [`implicit_compatible`]: the compiler may insert the cast on its own
//!    (assignments, arguments)
//! 3. [`expr_compatible`]: two operands of an arithmetic operator can be
//!    unified to a common type
//!
//! [`expr_common_type`] computes that common type, using
//! [`common_base_type`] for the component kind.
//!
//! ## Promotion
//!
//! Base kinds rank `bool < int < uint < half < float < double`, except that
//! `half` is ranked as if it were `float`. On a tie the first operand wins,
//! so `half + float` is `half` and `float + half` is `float`.

mod cast;
mod expr;
mod implicit;

pub use cast::compatible;
pub use expr::{common_base_type, expr_common_type, expr_compatible};
pub use implicit::implicit_compatible;

use crate::types::{HlslType, TypeClass};

/// Object types (samplers, textures, ...) never convert.
fn convertible(ty: &HlslType) -> bool {
    ty.class() != TypeClass::Object
}
