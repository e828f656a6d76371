//! Intermediate representation.
//!
//! IR nodes live in an [`InstrList`] arena and refer to each other through
//! [`NodeId`] handles. Every node records the nodes that use it, so a node
//! can be detached from its users before it is released.
//!
//! A cast is an [`ExprOp::Cast`] expression whose data type is the cast
//! target.

use std::fmt;

use ordered_float::OrderedFloat;

use hlslc_core::Span;

use crate::scope::VarId;
use crate::types::TypeId;

mod dump;
mod list;

pub use dump::{IrDump, format_function, format_var};
pub use list::InstrList;

// ============================================================================
// Handles
// ============================================================================

/// Handle to a node in an [`InstrList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Handle to an ordered block of nodes in an [`InstrList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// The top-level block of every list.
    pub const ROOT: BlockId = BlockId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprOp {
    // Unary
    BitNot,
    LogicNot,
    Neg,
    Abs,
    Sign,
    Rcp,
    Rsq,
    Sqrt,
    Nrm,
    Exp2,
    Log2,
    Cast,
    Fract,
    Sin,
    Cos,
    SinReduced,
    CosReduced,
    Dsx,
    Dsy,
    Sat,
    PreInc,
    PreDec,
    PostInc,
    PostDec,

    // Binary
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    LogicAnd,
    LogicOr,
    LShift,
    RShift,
    BitAnd,
    BitOr,
    BitXor,
    Dot,
    Crs,
    Min,
    Max,
    Pow,

    // Ternary
    Lerp,
    Sequence,
}

impl ExprOp {
    /// Operator symbol or intrinsic name as printed in IR dumps.
    pub fn name(self) -> &'static str {
        use ExprOp::*;
        match self {
            BitNot => "~",
            LogicNot => "!",
            Neg => "-",
            Abs => "abs",
            Sign => "sign",
            Rcp => "rcp",
            Rsq => "rsq",
            Sqrt => "sqrt",
            Nrm => "nrm",
            Exp2 => "exp2",
            Log2 => "log2",
            Cast => "cast",
            Fract => "fract",
            Sin => "sin",
            Cos => "cos",
            SinReduced => "sin_reduced",
            CosReduced => "cos_reduced",
            Dsx => "dsx",
            Dsy => "dsy",
            Sat => "sat",
            PreInc => "pre++",
            PreDec => "pre--",
            PostInc => "post++",
            PostDec => "post--",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            LogicAnd => "&&",
            LogicOr => "||",
            LShift => "<<",
            RShift => ">>",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Dot => "dot",
            Crs => "crs",
            Min => "min",
            Max => "max",
            Pow => "pow",
            Lerp => "lerp",
            Sequence => ",",
        }
    }

    /// Number of operands the operator takes.
    pub fn arity(self) -> usize {
        use ExprOp::*;
        match self {
            BitNot | LogicNot | Neg | Abs | Sign | Rcp | Rsq | Sqrt | Nrm | Exp2 | Log2 | Cast
            | Fract | Sin | Cos | SinReduced | CosReduced | Dsx | Dsy | Sat | PreInc | PreDec
            | PostInc | PostDec => 1,
            Lerp | Sequence => 3,
            _ => 2,
        }
    }
}

/// Control transfer performed by a jump node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Break,
    Continue,
    Discard,
    Return,
}

impl JumpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JumpKind::Break => "break",
            JumpKind::Continue => "continue",
            JumpKind::Discard => "discard",
            JumpKind::Return => "return",
        }
    }
}

/// One component of a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    /// Also used for `half` constants.
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Int(i32),
    Uint(u32),
    Bool(bool),
}

impl From<f32> for ConstantValue {
    fn from(value: f32) -> Self {
        ConstantValue::Float(OrderedFloat(value))
    }
}

impl From<f64> for ConstantValue {
    fn from(value: f64) -> Self {
        ConstantValue::Double(OrderedFloat(value))
    }
}

impl From<i32> for ConstantValue {
    fn from(value: i32) -> Self {
        ConstantValue::Int(value)
    }
}

impl From<u32> for ConstantValue {
    fn from(value: u32) -> Self {
        ConstantValue::Uint(value)
    }
}

impl From<bool> for ConstantValue {
    fn from(value: bool) -> Self {
        ConstantValue::Bool(value)
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A variable reference with an optional dynamic offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Deref {
    pub var: VarId,
    pub offset: Option<NodeId>,
}

impl Deref {
    pub fn new(var: VarId) -> Self {
        Self { var, offset: None }
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Expr {
        op: ExprOp,
        operands: [Option<NodeId>; 3],
    },
    Load {
        src: Deref,
    },
    /// Component selection; for vectors each selector is two bits, for
    /// matrices one byte holding row and column nibbles.
    Swizzle {
        val: NodeId,
        swizzle: u32,
    },
    Assignment {
        lhs: Deref,
        writemask: u32,
        rhs: NodeId,
    },
    Constant {
        values: Vec<ConstantValue>,
    },
    If {
        condition: NodeId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Loop {
        body: BlockId,
    },
    Jump {
        kind: JumpKind,
    },
}

impl NodeKind {
    /// Nodes this payload reads from.
    pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        let (fixed, operands): ([Option<NodeId>; 2], &[Option<NodeId>]) = match self {
            NodeKind::Expr { operands, .. } => ([None, None], operands.as_slice()),
            NodeKind::Load { src } => ([src.offset, None], &[][..]),
            NodeKind::Swizzle { val, .. } => ([Some(*val), None], &[][..]),
            NodeKind::Assignment { lhs, rhs, .. } => ([Some(*rhs), lhs.offset], &[][..]),
            NodeKind::If { condition, .. } => ([Some(*condition), None], &[][..]),
            NodeKind::Constant { .. } | NodeKind::Loop { .. } | NodeKind::Jump { .. } => {
                ([None, None], &[][..])
            }
        };
        fixed.into_iter().chain(operands.iter().copied()).flatten()
    }

    /// Short name of the node variant.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Expr { .. } => "expr",
            NodeKind::Load { .. } => "load",
            NodeKind::Swizzle { .. } => "swizzle",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Constant { .. } => "constant",
            NodeKind::If { .. } => "if",
            NodeKind::Loop { .. } => "loop",
            NodeKind::Jump { .. } => "jump",
        }
    }
}

/// An IR node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// `None` for nodes that produce no value.
    pub data_type: Option<TypeId>,
    pub span: Span,
    /// Nodes reading this node's value.
    pub(crate) uses: Vec<NodeId>,
    /// Block the node is linked into, if any.
    pub(crate) block: Option<BlockId>,
}

impl Node {
    pub fn new(kind: NodeKind, data_type: Option<TypeId>, span: Span) -> Self {
        Self {
            kind,
            data_type,
            span,
            uses: Vec::new(),
            block: None,
        }
    }

    pub fn uses(&self) -> &[NodeId] {
        &self.uses
    }

    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Whether this is a cast expression.
    pub fn is_cast(&self) -> bool {
        matches!(self.kind, NodeKind::Expr { op: ExprOp::Cast, .. })
    }
}
