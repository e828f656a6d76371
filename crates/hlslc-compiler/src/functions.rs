//! Function table.
//!
//! Functions are stored by name; each holds its overloads keyed by a
//! [`Signature`] built from the parameter types. Signatures compare
//! structurally: a scalar and a vector of the same base kind and width are
//! the same parameter type, and the row count of matrices is ignored. An
//! xxh64 digest of the same shape only picks the hash bucket.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::xxh64;

use hlslc_core::Span;

use crate::ir::InstrList;
use crate::scope::VarId;
use crate::types::{BaseType, SamplerDim, TypeClass, TypeId, TypeKind, TypeRegistry};

/// Mixing constants for signature digests.
mod hash_constants {
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
    pub const SIGNATURE: u64 = 0x6c8e9cf570932bd5;
    pub const PARAM: u64 = 0x2f4a7c15e3b9d801;
    pub const STRUCT: u64 = 0x51d7348b2e0a9c63;
    pub const ARRAY: u64 = 0x0b9e27f4c6a1d3e5;
}

/// Normalized shape of one parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamShape {
    /// Scalars are folded into vectors.
    pub class: TypeClass,
    pub base: BaseType,
    /// Only set for samplers.
    pub sampler_dim: Option<SamplerDim>,
    pub dimx: u32,
    pub layout: ParamLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamLayout {
    Plain,
    Struct(Vec<(String, ParamShape)>),
    Array { count: u32, element: Box<ParamShape> },
}

impl ParamShape {
    pub fn of(types: &TypeRegistry, id: TypeId) -> Self {
        let ty = &types[id];
        let class = match ty.class() {
            TypeClass::Scalar => TypeClass::Vector,
            other => other,
        };
        let layout = match &ty.kind {
            TypeKind::Struct { fields } => ParamLayout::Struct(
                fields
                    .iter()
                    .map(|field| (field.name.clone(), ParamShape::of(types, field.ty)))
                    .collect(),
            ),
            TypeKind::Array { element, count } => ParamLayout::Array {
                count: *count,
                element: Box::new(ParamShape::of(types, *element)),
            },
            _ => ParamLayout::Plain,
        };
        Self {
            class,
            base: ty.base,
            sampler_dim: (ty.base == BaseType::Sampler).then_some(ty.sampler_dim),
            dimx: ty.dimx,
            layout,
        }
    }

    fn digest(&self) -> u64 {
        let mut hash = mix(u8::from(self.class) as u64, u8::from(self.base) as u64);
        if let Some(dim) = self.sampler_dim {
            hash = mix(hash, u8::from(dim) as u64);
        }
        hash = mix(hash, self.dimx as u64);

        match &self.layout {
            ParamLayout::Struct(fields) => {
                hash ^= hash_constants::STRUCT;
                for (name, field) in fields {
                    hash = mix(hash, field.digest());
                    hash = mix(hash, xxh64(name.as_bytes(), 0));
                }
                mix(hash, fields.len() as u64)
            }
            ParamLayout::Array { count, element } => {
                hash ^= hash_constants::ARRAY;
                hash = mix(hash, *count as u64);
                mix(hash, element.digest())
            }
            ParamLayout::Plain => hash,
        }
    }
}

#[inline]
fn mix(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(hash_constants::SEP).wrapping_add(value)
}

/// Identity of an overload's parameter list.
///
/// Hashes by digest, compares by shape.
#[derive(Debug, Clone)]
pub struct Signature {
    digest: u64,
    params: Vec<ParamShape>,
}

impl Signature {
    /// Builds the signature of an ordered parameter type list.
    pub fn from_params(types: &TypeRegistry, params: &[TypeId]) -> Self {
        let params: Vec<ParamShape> = params.iter().map(|&p| ParamShape::of(types, p)).collect();
        let mut digest = hash_constants::SIGNATURE ^ params.len() as u64;
        for (i, param) in params.iter().enumerate() {
            let marker = hash_constants::PARAM.wrapping_add(i as u64);
            digest = mix(digest, marker ^ param.digest());
        }
        Self { digest, params }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn params(&self) -> &[ParamShape] {
        &self.params
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.params == other.params
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest);
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// One overload of a function.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub return_type: TypeId,
    pub parameters: Vec<VarId>,
    pub semantic: Option<String>,
    /// `None` for a prototype.
    pub body: Option<InstrList>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(return_type: TypeId, parameters: Vec<VarId>, span: Span) -> Self {
        Self {
            return_type,
            parameters,
            semantic: None,
            body: None,
            span,
        }
    }

    pub fn with_body(mut self, body: InstrList) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    pub fn is_prototype(&self) -> bool {
        self.body.is_none()
    }
}

/// A named function and its overloads.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub intrinsic: bool,
    overloads: FxHashMap<Signature, FunctionDecl>,
}

impl Function {
    pub fn overload(&self, signature: &Signature) -> Option<&FunctionDecl> {
        self.overloads.get(signature)
    }

    pub fn overloads(&self) -> impl Iterator<Item = (&Signature, &FunctionDecl)> {
        self.overloads.iter()
    }

    pub fn overload_count(&self) -> usize {
        self.overloads.len()
    }
}

/// What [`FunctionTable::add_function_decl`] did with a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclOutcome {
    /// A new function or overload was stored.
    Added,
    /// A definition replaced the stored overload with the same signature.
    Replaced,
    /// A prototype for an already stored overload was dropped.
    PrototypeIgnored,
    /// An intrinsic tried to redeclare a user function and was dropped.
    IntrinsicRejected,
}

/// All functions of a compile session, by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: FxHashMap<String, Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a declaration under `name`.
    ///
    /// A user declaration of an intrinsic's name discards every intrinsic
    /// overload first. An existing overload with the same signature is
    /// replaced by a definition but kept when `decl` is only a prototype.
    pub fn add_function_decl(
        &mut self,
        name: &str,
        signature: Signature,
        decl: FunctionDecl,
        intrinsic: bool,
    ) -> DeclOutcome {
        let Some(func) = self.functions.get_mut(name) else {
            let mut overloads = FxHashMap::default();
            overloads.insert(signature, decl);
            self.functions.insert(
                name.to_string(),
                Function {
                    name: name.to_string(),
                    intrinsic,
                    overloads,
                },
            );
            return DeclOutcome::Added;
        };

        if intrinsic != func.intrinsic {
            if intrinsic {
                tracing::error!(function = name, "redeclaring a user defined function as an intrinsic");
                return DeclOutcome::IntrinsicRejected;
            }
            tracing::debug!(function = name, "function redeclared as a user defined function");
            func.intrinsic = false;
            func.overloads.clear();
        }

        let exists = func.overloads.contains_key(&signature);
        if exists && decl.is_prototype() {
            return DeclOutcome::PrototypeIgnored;
        }
        func.overloads.insert(signature, decl);
        if exists {
            DeclOutcome::Replaced
        } else {
            DeclOutcome::Added
        }
    }

    /// Whether any function is declared under `name`.
    pub fn find_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn get_overload(&self, name: &str, signature: &Signature) -> Option<&FunctionDecl> {
        self.functions.get(name)?.overload(signature)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
