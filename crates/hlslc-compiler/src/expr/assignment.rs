//! Assignment lowering.
//!
//! An lvalue arrives as the expression that would read it: a load of the
//! variable, possibly wrapped in swizzles. Assigning through a swizzle
//! means writing only some components, so each swizzle is turned inside
//! out. Its selectors become the writemask of the store, and the swizzle
//! itself is re-pointed at the value being stored:
//!
//! ```text
//! v.yw = a;          =>     a.xy stored with writemask .yw
//! ```
//!
//! Casts on the left-hand side and writemasks on matrices are rejected.

use hlslc_core::{CompilationError, Span};

use super::{ExprBuilder, Result};
use crate::ir::{Deref, ExprOp, Node, NodeId, NodeKind};
use crate::types::{TypeClass, TypeId};

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
    /// `<<=`
    LShift,
    /// `>>=`
    RShift,
    /// `&=`
    BitAnd,
    /// `|=`
    BitOr,
    /// `^=`
    BitXor,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, `None` for `=`.
    pub fn binary_op(self) -> Option<ExprOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(ExprOp::Add),
            AssignOp::Sub => Some(ExprOp::Sub),
            AssignOp::Mul => Some(ExprOp::Mul),
            AssignOp::Div => Some(ExprOp::Div),
            AssignOp::Mod => Some(ExprOp::Mod),
            AssignOp::LShift => Some(ExprOp::LShift),
            AssignOp::RShift => Some(ExprOp::RShift),
            AssignOp::BitAnd => Some(ExprOp::BitAnd),
            AssignOp::BitOr => Some(ExprOp::BitOr),
            AssignOp::BitXor => Some(ExprOp::BitXor),
        }
    }
}

/// Result of [`invert_swizzle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvertedSwizzle {
    /// Selectors reading the stored value, one per written component
    pub swizzle: u32,
    /// Components of the destination that are written
    pub writemask: u32,
    /// Number of written components
    pub width: u32,
}

/// Turns a swizzled lvalue inside out.
///
/// `writemask` selects the components of the swizzle's result being
/// written. Returns `None` when two written components select the same
/// source component.
pub fn invert_swizzle(swizzle: u32, writemask: u32) -> Option<InvertedSwizzle> {
    let mut selected = [0u32; 4];
    let mut width = 0;
    let mut new_writemask = 0;

    for slot in 0..4 {
        if writemask & (1 << slot) == 0 {
            continue;
        }
        let component = (swizzle >> (slot * 2)) & 3;
        if new_writemask & (1 << component) != 0 {
            return None;
        }
        new_writemask |= 1 << component;
        selected[width] = component;
        width += 1;
    }

    let mut inverted = 0;
    let mut field = 0;
    for component in 0..4 {
        for (position, _) in selected[..width]
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == component)
        {
            inverted |= (position as u32) << (field * 2);
            field += 1;
        }
    }

    Some(InvertedSwizzle {
        swizzle: inverted,
        writemask: new_writemask,
        width: width as u32,
    })
}

/// A swizzle on the lvalue chain, ready to be re-pointed at the rhs.
struct SwizzleStep {
    node: NodeId,
    val: NodeId,
    inverted: InvertedSwizzle,
}

impl ExprBuilder<'_> {
    /// Appends a store of `rhs` into the lvalue `lhs`.
    ///
    /// The lvalue chain is checked before anything is modified. Compound
    /// operators read the root variable, combine it with the converted rhs
    /// and store the result.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_assignment(&mut self, lhs: NodeId, op: AssignOp, rhs: NodeId) -> Result<NodeId> {
        let lhs_type = self.type_of(lhs)?;
        let ty = &self.ctx.types[lhs_type];
        let numeric = ty.is_numeric();
        let mut writemask = if numeric {
            1u32.checked_shl(ty.dimx)
                .map(|bit| bit - 1)
                .ok_or_else(|| CompilationError::Internal {
                    message: format!("lvalue width {} has no writemask", ty.dimx),
                    span: Span::default(),
                })?
        } else {
            0
        };

        let mut steps = Vec::new();
        let mut current = lhs;
        let (root, root_node, root_span) = loop {
            let node = self.instrs.get(current).ok_or_else(|| CompilationError::Internal {
                message: format!("lvalue {current} was released"),
                span: Span::default(),
            })?;
            let span = node.span;
            match node.kind.clone() {
                NodeKind::Expr {
                    op: ExprOp::Cast, ..
                } => {
                    tracing::warn!(%span, "cast on the left-hand side of an assignment");
                    let err = CompilationError::UnsupportedCastOnLvalue { span };
                    return Err(self.ctx.report(err));
                }
                NodeKind::Swizzle { val, swizzle } => {
                    let Some(inverted) = invert_swizzle(swizzle, writemask) else {
                        let err = CompilationError::invalid_writemask(span);
                        return Err(self.ctx.report(err));
                    };
                    if self.ctx.types[self.type_of(val)?].class() == TypeClass::Matrix {
                        tracing::warn!(%span, "writemask on a matrix lvalue");
                        let err = CompilationError::UnsupportedMatrixWritemask { span };
                        return Err(self.ctx.report(err));
                    }
                    writemask = inverted.writemask;
                    steps.push(SwizzleStep {
                        node: current,
                        val,
                        inverted,
                    });
                    current = val;
                }
                NodeKind::Load { src } => break (src, current, span),
                _ => {
                    let err = CompilationError::invalid_lvalue(span);
                    return Err(self.ctx.report(err));
                }
            }
        };

        let mut rhs = rhs;
        if numeric {
            let span = self.span_of(rhs);
            rhs = self.add_implicit_conversion(rhs, lhs_type, span)?;
        }

        for step in steps {
            rhs = self.splice_swizzle(step, rhs)?;
        }

        if let Some(expr_op) = op.binary_op() {
            tracing::debug!(op = expr_op.name(), "adding an expression for the compound assignment");
            let root_type = self.type_of(root_node)?;
            let expr =
                self.new_expr(expr_op, [Some(root_node), Some(rhs), None], root_type, root_span)?;
            self.instrs.insert_after(rhs, expr)?;
            rhs = expr;
        }

        self.store(root, writemask, rhs, lhs_type, root_span)
    }

    /// Moves a swizzle after `rhs` and makes it read `rhs`.
    fn splice_swizzle(&mut self, step: SwizzleStep, rhs: NodeId) -> Result<NodeId> {
        let SwizzleStep {
            node,
            val,
            inverted,
        } = step;

        self.instrs.unlink(node);
        self.instrs.insert_after(rhs, node)?;
        self.instrs.replace_source(node, val, rhs)?;

        let ty = self.type_of(node)?;
        let narrowed = if self.ctx.types[ty].dimx != inverted.width {
            let base = self.ctx.types[ty].base;
            let span = self.span_of(node);
            let vector = self.ctx.types.vector(base, inverted.width).ok_or_else(|| {
                CompilationError::Internal {
                    message: format!("swizzle narrowed to {} components", inverted.width),
                    span,
                }
            })?;
            Some(vector)
        } else {
            None
        };

        if let Some(n) = self.instrs.get_mut(node) {
            if let NodeKind::Swizzle { swizzle, .. } = &mut n.kind {
                *swizzle = inverted.swizzle;
            }
            if narrowed.is_some() {
                n.data_type = narrowed;
            }
        }
        Ok(node)
    }

    fn store(
        &mut self,
        lhs: Deref,
        writemask: u32,
        rhs: NodeId,
        data_type: TypeId,
        span: Span,
    ) -> Result<NodeId> {
        let assign = self.instrs.create(Node::new(
            NodeKind::Assignment {
                lhs,
                writemask,
                rhs,
            },
            Some(data_type),
            span,
        ))?;
        self.append(assign)
    }
}
