//! Expression construction with implicit conversions.
//!
//! The [`ExprBuilder`] appends IR to one block of an [`InstrList`] while
//! type checking against the session [`Context`]. Operands of an
//! expression are unified to a common type, and every operand that needs
//! it gets a cast spliced in directly after its own node:
//!
//! ```text
//!    0:     float2 | a
//!    1:      float | b
//!    2:     float2 | float2 (@1 )
//!    3:     float2 | + (@0 @2 )
//! ```
//!
//! The `new_*` constructors allocate unlinked nodes; [`ExprBuilder::append`]
//! links them. The `add_*` operations link what they build.

mod assignment;

pub use assignment::{AssignOp, InvertedSwizzle, invert_swizzle};

use hlslc_core::{CompilationError, Span};

use crate::context::Context;
use crate::conversion::{expr_common_type, implicit_compatible};
use crate::ir::{
    BlockId, ConstantValue, Deref, ExprOp, InstrList, JumpKind, Node, NodeId, NodeKind,
};
use crate::scope::VarId;
use crate::types::{TypeClass, TypeId};

type Result<T> = std::result::Result<T, CompilationError>;

/// Builds type checked IR into an instruction list.
pub struct ExprBuilder<'a> {
    ctx: &'a mut Context,
    instrs: &'a mut InstrList,
    /// Block new nodes are appended to
    block: BlockId,
}

impl<'a> ExprBuilder<'a> {
    /// A builder appending to the root block of `instrs`.
    pub fn new(ctx: &'a mut Context, instrs: &'a mut InstrList) -> Self {
        Self {
            ctx,
            instrs,
            block: BlockId::ROOT,
        }
    }

    pub fn in_block(mut self, block: BlockId) -> Self {
        self.block = block;
        self
    }

    /// Redirects appends to another block, e.g. the body of an `if`.
    pub fn set_block(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn ctx(&mut self) -> &mut Context {
        &mut *self.ctx
    }

    pub fn instrs(&self) -> &InstrList {
        &*self.instrs
    }

    /// Data type of a value-producing node.
    pub fn type_of(&self, node: NodeId) -> Result<TypeId> {
        let n = self.instrs.get(node).ok_or_else(|| CompilationError::Internal {
            message: format!("node {node} was released"),
            span: Span::default(),
        })?;
        n.data_type.ok_or_else(|| CompilationError::Internal {
            message: format!("{} node {node} has no value", n.kind.name()),
            span: n.span,
        })
    }

    fn span_of(&self, node: NodeId) -> Span {
        self.instrs.get(node).map(|n| n.span).unwrap_or_default()
    }

    /// Links an unlinked node at the end of the current block.
    pub fn append(&mut self, node: NodeId) -> Result<NodeId> {
        self.instrs.append(self.block, node)?;
        Ok(node)
    }

    // ========================================================================
    // Node constructors
    // ========================================================================

    pub fn new_load(&mut self, var: VarId, offset: Option<NodeId>, span: Span) -> Result<NodeId> {
        let data_type = self
            .ctx
            .scopes
            .var(var)
            .map(|v| v.data_type)
            .ok_or_else(|| CompilationError::Internal {
                message: format!("load of undeclared {var}"),
                span,
            })?;
        let src = Deref { var, offset };
        self.instrs
            .create(Node::new(NodeKind::Load { src }, Some(data_type), span))
    }

    /// A swizzle selecting `components` components of `val`.
    ///
    /// The result is a vector of the value's base kind, even when one
    /// component is selected.
    pub fn new_swizzle(
        &mut self,
        swizzle: u32,
        components: u32,
        val: NodeId,
        span: Span,
    ) -> Result<NodeId> {
        let base = self.ctx.types[self.type_of(val)?].base;
        let data_type =
            self.ctx
                .types
                .vector(base, components)
                .ok_or_else(|| CompilationError::Internal {
                    message: format!("swizzle of {components} components"),
                    span,
                })?;
        self.instrs.create(Node::new(
            NodeKind::Swizzle { val, swizzle },
            Some(data_type),
            span,
        ))
    }

    pub fn new_constant(
        &mut self,
        data_type: TypeId,
        values: Vec<ConstantValue>,
        span: Span,
    ) -> Result<NodeId> {
        self.instrs
            .create(Node::new(NodeKind::Constant { values }, Some(data_type), span))
    }

    /// A unary expression typed as its operand.
    pub fn new_unary_expr(&mut self, op: ExprOp, operand: NodeId, span: Span) -> Result<NodeId> {
        let data_type = self.type_of(operand)?;
        self.new_expr(op, [Some(operand), None, None], data_type, span)
    }

    /// A binary expression typed as its first operand.
    pub fn new_binary_expr(
        &mut self,
        op: ExprOp,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
    ) -> Result<NodeId> {
        let data_type = self.type_of(lhs)?;
        self.new_expr(op, [Some(lhs), Some(rhs), None], data_type, span)
    }

    pub fn new_cast(&mut self, node: NodeId, data_type: TypeId, span: Span) -> Result<NodeId> {
        self.new_expr(ExprOp::Cast, [Some(node), None, None], data_type, span)
    }

    fn new_expr(
        &mut self,
        op: ExprOp,
        operands: [Option<NodeId>; 3],
        data_type: TypeId,
        span: Span,
    ) -> Result<NodeId> {
        self.instrs
            .create(Node::new(NodeKind::Expr { op, operands }, Some(data_type), span))
    }

    /// An `if` with fresh, empty then and else blocks.
    pub fn new_if(&mut self, condition: NodeId, span: Span) -> Result<(NodeId, BlockId, BlockId)> {
        let then_block = self.instrs.new_block()?;
        let else_block = self.instrs.new_block()?;
        let node = self.instrs.create(Node::new(
            NodeKind::If {
                condition,
                then_block,
                else_block,
            },
            None,
            span,
        ))?;
        Ok((node, then_block, else_block))
    }

    /// An unconditional loop with a fresh, empty body.
    pub fn new_loop(&mut self, span: Span) -> Result<(NodeId, BlockId)> {
        let body = self.instrs.new_block()?;
        let node = self
            .instrs
            .create(Node::new(NodeKind::Loop { body }, None, span))?;
        Ok((node, body))
    }

    pub fn new_jump(&mut self, kind: JumpKind, span: Span) -> Result<NodeId> {
        self.instrs
            .create(Node::new(NodeKind::Jump { kind }, None, span))
    }

    // ========================================================================
    // Conversions and expressions
    // ========================================================================

    /// Converts `node` to `dst`, appending a cast when the types differ.
    ///
    /// Returns `node` itself when the types are equal. Nothing is appended
    /// when the conversion is not allowed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_implicit_conversion(
        &mut self,
        node: NodeId,
        dst: TypeId,
        span: Span,
    ) -> Result<NodeId> {
        let src = self.type_of(node)?;
        let types = &self.ctx.types;
        if types.compare_types(src, dst) {
            return Ok(node);
        }

        if !implicit_compatible(types, src, dst) {
            let err = CompilationError::InvalidImplicitConversion {
                from: types.type_name(src),
                to: types.type_name(dst),
                span,
            };
            return Err(self.ctx.report(err));
        }

        if types.components_count(dst) < types.components_count(src) {
            self.ctx.warn(span, "implicit truncation of vector type");
        }

        tracing::trace!(
            from = %self.ctx.types.type_name(src),
            to = %self.ctx.types.type_name(dst),
            "implicit conversion"
        );
        let cast = self.new_cast(node, dst, span)?;
        self.append(cast)
    }

    /// Appends `op` applied to `operands`, unifying them to a common type.
    ///
    /// Operands after the first `None` are ignored. An operand whose type
    /// differs from the common type is cast right after its own node.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_expr(
        &mut self,
        op: ExprOp,
        operands: [Option<NodeId>; 3],
        span: Span,
    ) -> Result<NodeId> {
        let present: Vec<NodeId> = operands.iter().map_while(|o| *o).collect();
        let Some((&first, rest)) = present.split_first() else {
            return Err(CompilationError::Internal {
                message: format!("'{}' expression without operands", op.name()),
                span,
            });
        };

        let mut data_type = self.type_of(first)?;
        for &operand in rest {
            let ty = self.type_of(operand)?;
            data_type = expr_common_type(&mut self.ctx.types, data_type, ty, span)
                .map_err(|err| self.ctx.report(err))?;
        }

        let mut converted = [None; 3];
        for (slot, &operand) in converted.iter_mut().zip(&present) {
            *slot = Some(self.convert_operand(operand, data_type)?);
        }

        let node = self.new_expr(op, converted, data_type, span)?;
        self.append(node)
    }

    fn convert_operand(&mut self, operand: NodeId, data_type: TypeId) -> Result<NodeId> {
        let ty = self.type_of(operand)?;
        let types = &self.ctx.types;
        if types.compare_types(ty, data_type) {
            return Ok(operand);
        }

        let span = self.span_of(operand);
        let count = types.components_count(ty);
        if count != 1 && count != types.components_count(data_type) {
            let what = match types[ty].class() {
                TypeClass::Matrix => "implicit truncation of matrix type",
                _ => "implicit truncation of vector type",
            };
            self.ctx.warn(span, what);
        }

        let cast = self.new_cast(operand, data_type, span)?;
        self.instrs.insert_after(operand, cast)?;
        Ok(cast)
    }
}
