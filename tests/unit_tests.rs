//! Integration tests for the HLSL toolchain.
//!
//! These tests drive the public API the way a front end would: containers
//! are parsed and written through `hlslc::container`, and declarations,
//! expressions and assignments are built through a `Context` and an
//! `ExprBuilder`.

use hlslc::compiler::conversion::{common_base_type, expr_common_type};
use hlslc::compiler::ir::NodeKind;
use hlslc::compiler::{DeclOutcome, FunctionDecl, Modifiers, invert_swizzle};
use hlslc::container::test_utils::build_container;
use hlslc::prelude::*;

/// Declares a variable in the current scope of `ctx`.
fn declare(ctx: &mut Context, name: &str, ty: TypeId) -> hlslc::compiler::VarId {
    ctx.declare_variable(Var::new(name, ty, Span::new(1, 1, name.len() as u32)), false)
        .expect("declaration failed")
}

/// Appends a load of `var` and returns it.
fn load(builder: &mut ExprBuilder<'_>, var: hlslc::compiler::VarId, span: Span) -> NodeId {
    let node = builder.new_load(var, None, span).expect("load failed");
    builder.append(node).expect("append failed")
}

// =============================================================================
// Container
// =============================================================================

#[test]
fn test_parse_single_empty_chunk() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"DXBC");
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&44u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&36u32.to_le_bytes());
    bytes.extend_from_slice(b"STAT");
    bytes.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(bytes.len(), 44);

    let container = Container::parse(&bytes).unwrap();
    assert_eq!(container.len(), 1);
    let section = &container.sections()[0];
    assert_eq!(section.tag(), FourCC::STAT);
    assert_eq!(section.size(), 0);
}

#[test]
fn test_serialize_layout() {
    let shader = [0xAAu8, 0xBB, 0xCC, 0xDD];
    let mut container = Container::new();
    container.add_section(FourCC::SHDR, &shader).unwrap();
    let bytes = container.serialize().unwrap();

    assert_eq!(bytes.len(), 48);
    assert_eq!(&bytes[0..4], b"DXBC");
    assert!(bytes[4..20].iter().all(|&b| b == 0));
    assert_eq!(&bytes[20..24], &1u32.to_le_bytes());
    assert_eq!(&bytes[24..28], &48u32.to_le_bytes());
    assert_eq!(&bytes[28..32], &1u32.to_le_bytes());
    assert_eq!(&bytes[32..36], &36u32.to_le_bytes());
    assert_eq!(&bytes[36..40], b"SHDR");
    assert_eq!(&bytes[40..44], &4u32.to_le_bytes());
    assert_eq!(&bytes[44..48], &shader);
}

#[test]
fn test_round_trip_preserves_order_and_duplicates() {
    let rdef: &[u8] = b"resource definitions";
    let isgn: &[u8] = &[1, 2, 3];
    let stat: &[u8] = &[9; 7];
    let chunks = [
        (FourCC::RDEF, rdef),
        (FourCC::ISGN, isgn),
        (FourCC::STAT, stat),
        (FourCC::ISGN, stat),
    ];

    let mut container = Container::new();
    for &(tag, data) in &chunks {
        container.add_section(tag, data).unwrap();
    }
    let bytes = container.serialize().unwrap();
    assert_eq!(bytes, build_container(&chunks));

    let parsed = Container::parse(&bytes).unwrap();
    assert_eq!(parsed, container);
    assert_eq!(parsed.section(FourCC::ISGN).map(|s| s.data()), Some(isgn));
    assert_eq!(parsed.sections_with_tag(FourCC::ISGN).count(), 2);
    assert!(parsed.section(FourCC::SHEX).is_none());
}

#[test]
fn test_parse_rejects_malformed_input() {
    let shader: &[u8] = &[1, 2, 3, 4];
    let good = build_container(&[(FourCC::SHDR, shader)]);

    let mut bad_magic = good.clone();
    bad_magic[0..4].copy_from_slice(b"DXBD");
    assert!(matches!(
        Container::parse(&bad_magic),
        Err(ContainerError::BadMagic { .. })
    ));

    let mut truncated = good.clone();
    truncated.pop();
    assert!(matches!(
        Container::parse(&truncated),
        Err(ContainerError::SizeMismatch { declared: 48, actual: 47 })
    ));

    let mut wild_offset = good.clone();
    wild_offset[32..36].copy_from_slice(&1000u32.to_le_bytes());
    let err = Container::parse(&wild_offset).unwrap_err();
    assert!(err.is_malformed());

    assert!(Container::parse(&[]).unwrap_err().is_malformed());
}

#[test]
fn test_empty_container() {
    let bytes = Container::new().serialize().unwrap();
    assert_eq!(bytes.len(), 32);
    assert!(Container::parse(&bytes).unwrap().is_empty());
}

// =============================================================================
// Type engine
// =============================================================================

#[test]
fn test_half_promotion() {
    assert_eq!(common_base_type(BaseType::Half, BaseType::Int), BaseType::Half);
    assert_eq!(common_base_type(BaseType::Uint, BaseType::Half), BaseType::Half);
    assert_eq!(common_base_type(BaseType::Half, BaseType::Float), BaseType::Half);
    assert_eq!(common_base_type(BaseType::Float, BaseType::Half), BaseType::Float);
    assert_eq!(common_base_type(BaseType::Half, BaseType::Double), BaseType::Double);
}

#[test]
fn test_common_type_shapes() {
    let mut ctx = Context::new();
    let f = ctx.types.scalar(BaseType::Float).unwrap();
    let i = ctx.types.scalar(BaseType::Int).unwrap();
    let f4 = ctx.types.vector(BaseType::Float, 4).unwrap();

    let span = Span::default();
    assert_eq!(expr_common_type(&mut ctx.types, f, i, span).unwrap(), f);
    assert_eq!(expr_common_type(&mut ctx.types, f4, i, span).unwrap(), f4);
    assert_eq!(expr_common_type(&mut ctx.types, i, f4, span).unwrap(), f4);
}

#[test]
fn test_type_names_in_scope() {
    let ctx = Context::new();
    let m = ctx.scopes.get_type("float4x4", true).unwrap();
    assert_eq!(ctx.types.type_name(m), "float4x4");
    assert_eq!(ctx.types.components_count(m), 16);
    let s = ctx.scopes.get_type("samplerCUBE", true).unwrap();
    assert_eq!(ctx.types.type_name(s), "samplerCUBE");
}

#[test]
fn test_row_major_option_changes_layout() {
    let mut ctx = Context::with_options(CompilerOptions::from_flags(
        CompileFlags::PACK_MATRIX_ROW_MAJOR,
    ));
    let m = ctx.scopes.get_type("float3x2", true).unwrap();
    let resolved = ctx.resolve_type(m).unwrap();
    assert!(ctx.types[resolved].modifiers.contains(Modifiers::ROW_MAJOR));
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn test_vector_plus_scalar_inserts_one_cast() {
    let mut ctx = Context::new();
    let f2 = ctx.types.vector(BaseType::Float, 2).unwrap();
    let f = ctx.types.scalar(BaseType::Float).unwrap();
    let a = declare(&mut ctx, "a", f2);
    let b = declare(&mut ctx, "b", f);

    let mut body = InstrList::new();
    let mut builder = ExprBuilder::new(&mut ctx, &mut body);
    let la = load(&mut builder, a, Span::new(3, 5, 1));
    let lb = load(&mut builder, b, Span::new(3, 9, 1));
    let sum = builder
        .add_expr(ExprOp::Add, [Some(la), Some(lb), None], Span::new(3, 5, 5))
        .unwrap();

    let nodes = body.nodes().to_vec();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[1], lb);
    assert!(body[nodes[2]].is_cast());
    assert_eq!(body[sum].data_type, Some(f2));
    assert_eq!(
        body.iter().filter(|(_, node)| node.is_cast()).count(),
        1
    );
    assert!(!ctx.diagnostics.has_warnings());

    let dump = IrDump::new(&body, &ctx.types, &ctx.scopes).to_string();
    assert_eq!(
        dump,
        "   0:     float2 | a\n\
         \x20  1:      float | b\n\
         \x20  2:     float2 | float2 (@1 )\n\
         \x20  3:     float2 | + (@0 @2 )\n"
    );
}

#[test]
fn test_incompatible_expression_reports_error() {
    let mut ctx = Context::new();
    let f3 = ctx.types.vector(BaseType::Float, 3).unwrap();
    let f2x2 = ctx.types.matrix(BaseType::Float, 2, 2).unwrap();
    let a = declare(&mut ctx, "a", f3);
    let m = declare(&mut ctx, "m", f2x2);

    let mut body = InstrList::new();
    let mut builder = ExprBuilder::new(&mut ctx, &mut body);
    let la = load(&mut builder, a, Span::default());
    let lm = load(&mut builder, m, Span::default());
    let result = builder.add_expr(ExprOp::Mul, [Some(la), Some(lm), None], Span::new(9, 3, 5));
    assert!(result.is_err());

    let error = ctx.diagnostics.errors().next().unwrap();
    assert_eq!(error.message, "expression data types are incompatible");
    assert_eq!(error.span, Span::new(9, 3, 5));
}

// =============================================================================
// Assignments
// =============================================================================

#[test]
fn test_invert_swizzle() {
    let yxwz = 0b10_11_00_01;
    let inverted = invert_swizzle(yxwz, 0b0011).unwrap();
    assert_eq!(inverted.width, 2);
    assert_eq!(inverted.writemask.count_ones(), 2);
    assert_eq!(inverted.writemask, 0b0011);

    let xxyz = 0b10_01_00_00;
    assert!(invert_swizzle(xxyz, 0b0011).is_none());
}

#[test]
fn test_swizzled_compound_assignment() {
    let mut ctx = Context::new();
    let f4 = ctx.types.vector(BaseType::Float, 4).unwrap();
    let f2 = ctx.types.vector(BaseType::Float, 2).unwrap();
    let v = declare(&mut ctx, "v", f4);
    let a = declare(&mut ctx, "a", f2);

    let mut body = InstrList::new();
    let mut builder = ExprBuilder::new(&mut ctx, &mut body);
    let lv = load(&mut builder, v, Span::new(2, 1, 1));
    // v.zx
    let swz = builder.new_swizzle(0b00_10, 2, lv, Span::new(2, 2, 3)).unwrap();
    builder.append(swz).unwrap();
    let la = load(&mut builder, a, Span::new(2, 9, 1));
    let assign = builder.add_assignment(swz, AssignOp::Add, la).unwrap();

    match &body[assign].kind {
        NodeKind::Assignment { writemask, rhs, .. } => {
            assert_eq!(*writemask, 0b0101);
            assert!(matches!(
                body[*rhs].kind,
                NodeKind::Expr { op: ExprOp::Add, .. }
            ));
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
    // .zx written from a.xy lands as a.yx in components x and z.
    assert!(matches!(
        body[swz].kind,
        NodeKind::Swizzle { val, swizzle: 0b00_01 } if val == la
    ));
    assert_eq!(ctx.diagnostics.count(), 0);
}

#[test]
fn test_assignment_errors_leave_body_untouched() {
    let mut ctx = Context::new();
    let f4 = ctx.types.vector(BaseType::Float, 4).unwrap();
    let f3 = ctx.types.vector(BaseType::Float, 3).unwrap();
    let v = declare(&mut ctx, "v", f4);
    let a = declare(&mut ctx, "a", f3);

    let mut body = InstrList::new();
    let mut builder = ExprBuilder::new(&mut ctx, &mut body);
    let lv = load(&mut builder, v, Span::default());
    let la = load(&mut builder, a, Span::new(5, 7, 1));
    let err = builder.add_assignment(lv, AssignOp::Assign, la).unwrap_err();
    assert_eq!(err.message(), "can't implicitly convert float3 to float4");
    assert_eq!(body.len(), 2);
    assert_eq!(body.live_count(), 2);
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_function_declarations() {
    let mut ctx = Context::new();
    let f4 = ctx.types.vector(BaseType::Float, 4).unwrap();

    ctx.scopes.push_scope().unwrap();
    let pos = ctx
        .declare_variable(
            Var::new("pos", f4, Span::new(1, 20, 3)).with_semantic("POSITION"),
            false,
        )
        .unwrap();
    ctx.scopes.pop_scope();

    let proto = FunctionDecl::new(f4, vec![pos], Span::new(1, 1, 4));
    assert_eq!(ctx.add_function_decl("main", proto, false).unwrap(), DeclOutcome::Added);

    let def = FunctionDecl::new(f4, vec![pos], Span::new(3, 1, 4))
        .with_semantic("SV_POSITION")
        .with_body(InstrList::new());
    assert_eq!(ctx.add_function_decl("main", def, false).unwrap(), DeclOutcome::Replaced);

    let again = FunctionDecl::new(f4, vec![pos], Span::new(5, 1, 4));
    assert_eq!(
        ctx.add_function_decl("main", again, false).unwrap(),
        DeclOutcome::PrototypeIgnored
    );
    assert!(ctx.functions.find_function("main"));
    assert_eq!(ctx.functions.get("main").unwrap().overload_count(), 1);
}
