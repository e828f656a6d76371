//! Textual IR dumps.
//!
//! One line per instruction: the node index, the data type right-aligned
//! in ten columns, then the node in prefix form. Operands are printed as
//! `@<index>`.
//!
//! ```text
//!    0:     float2 | a
//!    1:      float | b
//!    2:     float2 | float2 (@1 )
//!    3:     float2 | + (@0 @2 )
//! ```

use std::fmt::{self, Write};

use crate::functions::FunctionDecl;
use crate::scope::{Scopes, Var};
use crate::types::{TypeRegistry, modifiers_string, writemask_string};

use super::{BlockId, ConstantValue, Deref, ExprOp, InstrList, Node, NodeId, NodeKind};

const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Display adapter printing one block of an [`InstrList`].
pub struct IrDump<'a> {
    list: &'a InstrList,
    types: &'a TypeRegistry,
    scopes: &'a Scopes,
    block: BlockId,
}

impl<'a> IrDump<'a> {
    pub fn new(list: &'a InstrList, types: &'a TypeRegistry, scopes: &'a Scopes) -> Self {
        Self {
            list,
            types,
            scopes,
            block: BlockId::ROOT,
        }
    }

    /// Dump a nested block instead of the root.
    pub fn block(mut self, block: BlockId) -> Self {
        self.block = block;
        self
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, block: BlockId) -> fmt::Result {
        for &id in self.list.block_nodes(block) {
            if let Some(node) = self.list.get(id) {
                self.write_instr(f, id, node)?;
                f.write_char('\n')?;
            }
        }
        Ok(())
    }

    fn write_instr(&self, f: &mut fmt::Formatter<'_>, id: NodeId, node: &Node) -> fmt::Result {
        let type_name = node
            .data_type
            .map(|t| self.types.type_name(t))
            .unwrap_or_default();
        write!(f, "{:4}: {:>10} | ", id.0, type_name)?;

        match &node.kind {
            NodeKind::Expr { op, operands } => {
                let name = match (op, node.data_type) {
                    (ExprOp::Cast, Some(ty)) => self.types.type_name(ty),
                    _ => op.name().to_string(),
                };
                write!(f, "{name} (")?;
                for operand in operands.iter().map_while(|o| *o) {
                    write!(f, "{operand} ")?;
                }
                f.write_char(')')
            }
            NodeKind::Load { src } => self.write_deref(f, src),
            NodeKind::Constant { values } => {
                let dimx = node
                    .data_type
                    .map_or(values.len() as u32, |t| self.types[t].dimx);
                if dimx != 1 {
                    f.write_char('{')?;
                }
                for value in values {
                    write_constant(f, *value)?;
                    f.write_char(' ')?;
                }
                if dimx != 1 {
                    f.write_char('}')?;
                }
                Ok(())
            }
            NodeKind::Assignment {
                lhs,
                writemask,
                rhs,
            } => {
                f.write_str("= (")?;
                self.write_deref(f, lhs)?;
                if *writemask != 0xf {
                    f.write_str(&writemask_string(*writemask))?;
                }
                write!(f, " {rhs})")
            }
            NodeKind::Swizzle { val, swizzle } => {
                write!(f, "{val}.")?;
                let width = node.data_type.map_or(0, |t| self.types[t].dimx);
                let matrix = self
                    .list
                    .get(*val)
                    .and_then(|n| n.data_type)
                    .is_some_and(|t| self.types[t].dimy > 1);
                for i in 0..width {
                    if matrix {
                        let entry = swizzle >> (i * 8);
                        write!(f, "_m{}{}", entry & 0xf, (entry >> 4) & 0xf)?;
                    } else {
                        f.write_char(COMPONENTS[((swizzle >> (i * 2)) & 3) as usize])?;
                    }
                }
                Ok(())
            }
            NodeKind::Jump { kind } => f.write_str(kind.as_str()),
            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                write!(f, "if ({condition})\n{{\n")?;
                self.write_block(f, *then_block)?;
                f.write_str("}\nelse\n{\n")?;
                self.write_block(f, *else_block)?;
                f.write_str("}\n")
            }
            NodeKind::Loop { body } => {
                f.write_str("for (;;)\n{\n")?;
                self.write_block(f, *body)?;
                f.write_str("}\n")
            }
        }
    }

    fn write_deref(&self, f: &mut fmt::Formatter<'_>, deref: &Deref) -> fmt::Result {
        let Some(var) = self.scopes.var(deref.var) else {
            return write!(f, "<{}>", deref.var);
        };
        match deref.offset {
            Some(offset) => write!(
                f,
                "({} {})[{offset}]",
                self.types.type_name(var.data_type),
                var.name
            ),
            None => f.write_str(&var.name),
        }
    }
}

impl fmt::Display for IrDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_block(f, self.block)
    }
}

/// `modifiers type name : "semantic"`
pub fn format_var(types: &TypeRegistry, var: &Var) -> String {
    let mut out = String::new();
    if !var.modifiers.is_empty() {
        out.push_str(&modifiers_string(var.modifiers));
        out.push(' ');
    }
    out.push_str(&types.type_name(var.data_type));
    out.push(' ');
    out.push_str(&var.name);
    if let Some(semantic) = &var.semantic {
        out.push_str(&format!(" : \"{semantic}\""));
    }
    out
}

/// Parameters one per line, then the body if there is one.
pub fn format_function(types: &TypeRegistry, scopes: &Scopes, decl: &FunctionDecl) -> String {
    let mut out = String::new();
    for &param in &decl.parameters {
        if let Some(var) = scopes.var(param) {
            out.push_str(&format_var(types, var));
            out.push('\n');
        }
    }
    if let Some(body) = &decl.body {
        out.push_str(&IrDump::new(body, types, scopes).to_string());
    }
    out
}

/// Exponent notation with a signed, at least two digit exponent.
fn write_exp(f: &mut impl Write, formatted: String) -> fmt::Result {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            write!(f, "{mantissa}e{sign}{digits:0>2}")
        }
        None => f.write_str(&formatted.to_lowercase()),
    }
}

fn write_constant(f: &mut impl Write, value: ConstantValue) -> fmt::Result {
    match value {
        ConstantValue::Float(v) => write_exp(f, format!("{:.8e}", v.0)),
        ConstantValue::Double(v) => write_exp(f, format!("{:.16e}", v.0)),
        ConstantValue::Int(v) => write!(f, "{v}"),
        ConstantValue::Uint(v) => write!(f, "{v}"),
        ConstantValue::Bool(v) => f.write_str(if v { "true" } else { "false" }),
    }
}
