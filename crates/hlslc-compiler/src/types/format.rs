//! Human-readable names for types, modifiers, writemasks and swizzles.
//!
//! Used for diagnostics and IR dumps only.

use super::{BaseType, Modifiers, SamplerDim, TypeId, TypeKind, TypeRegistry};

const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Name of a base kind; samplers are named by dimension.
pub fn base_type_name(base: BaseType, sampler_dim: SamplerDim) -> &'static str {
    match base {
        BaseType::Float => "float",
        BaseType::Half => "half",
        BaseType::Double => "double",
        BaseType::Int => "int",
        BaseType::Uint => "uint",
        BaseType::Bool => "bool",
        BaseType::Sampler => match sampler_dim {
            SamplerDim::Generic => "sampler",
            SamplerDim::Dim1D => "sampler1D",
            SamplerDim::Dim2D => "sampler2D",
            SamplerDim::Dim3D => "sampler3D",
            SamplerDim::Cube => "samplerCUBE",
        },
        BaseType::Texture => "texture",
        BaseType::PixelShader => "pixelshader",
        BaseType::VertexShader => "vertexshader",
        BaseType::String => "string",
        BaseType::Void => "void",
    }
}

/// Space-separated modifier keywords, in declaration order.
pub fn modifiers_string(modifiers: Modifiers) -> String {
    const KEYWORDS: [(Modifiers, &str); 11] = [
        (Modifiers::EXTERN, "extern"),
        (Modifiers::NOINTERPOLATION, "nointerpolation"),
        (Modifiers::PRECISE, "precise"),
        (Modifiers::SHARED, "shared"),
        (Modifiers::GROUPSHARED, "groupshared"),
        (Modifiers::STATIC, "static"),
        (Modifiers::UNIFORM, "uniform"),
        (Modifiers::VOLATILE, "volatile"),
        (Modifiers::CONST, "const"),
        (Modifiers::ROW_MAJOR, "row_major"),
        (Modifiers::COLUMN_MAJOR, "column_major"),
    ];

    let mut words: Vec<&str> = KEYWORDS
        .iter()
        .filter(|(flag, _)| modifiers.contains(*flag))
        .map(|(_, word)| *word)
        .collect();

    if modifiers.contains(Modifiers::INOUT) {
        words.push("inout");
    } else if modifiers.contains(Modifiers::IN) {
        words.push("in");
    } else if modifiers.contains(Modifiers::OUT) {
        words.push("out");
    }
    words.join(" ")
}

/// `.xyzw`-style rendering of a writemask.
pub fn writemask_string(writemask: u32) -> String {
    let mut out = String::from(".");
    out.extend(
        COMPONENTS
            .iter()
            .enumerate()
            .filter(|(i, _)| writemask & (1 << i) != 0)
            .map(|(_, c)| *c),
    );
    out
}

/// `xyzw`-style rendering of the first `components` selectors of a swizzle.
pub fn swizzle_string(swizzle: u32, components: u32) -> String {
    (0..components.min(4))
        .map(|i| COMPONENTS[((swizzle >> (i * 2)) & 3) as usize])
        .collect()
}

impl TypeRegistry {
    /// Display name of a type: its declared name, or a derived one such as
    /// `float3`, `int2x4`, `float4[3]` or `<anonymous struct>`.
    pub fn type_name(&self, id: TypeId) -> String {
        let ty = &self[id];
        if let Some(name) = &ty.name {
            return name.clone();
        }

        let base = base_type_name(ty.base, ty.sampler_dim);
        match &ty.kind {
            TypeKind::Scalar | TypeKind::Object => base.to_string(),
            TypeKind::Vector => format!("{base}{}", ty.dimx),
            TypeKind::Matrix => format!("{base}{}x{}", ty.dimy, ty.dimx),
            TypeKind::Struct { .. } => "<anonymous struct>".to_string(),
            TypeKind::Array { element, count } => format!("{}[{count}]", self.type_name(*element)),
        }
    }
}
