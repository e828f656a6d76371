//! Benchmarks for the type engine: common type computation, expression
//! construction and assignment lowering.

use criterion::{Criterion, criterion_group, criterion_main};
use hlslc::compiler::conversion::{expr_common_type, implicit_compatible};
use hlslc::prelude::*;
use std::hint::black_box;

/// Every scalar and vector builtin of the numeric base kinds.
fn numeric_types(ctx: &Context) -> Vec<TypeId> {
    let bases = [
        BaseType::Bool,
        BaseType::Int,
        BaseType::Uint,
        BaseType::Half,
        BaseType::Float,
        BaseType::Double,
    ];
    let mut types = Vec::new();
    for base in bases {
        types.extend(ctx.types.scalar(base));
        for dimx in 1..=4 {
            types.extend(ctx.types.vector(base, dimx));
        }
    }
    types
}

fn common_type_benchmarks(c: &mut Criterion) {
    let mut ctx = Context::new();
    let types = numeric_types(&ctx);

    c.bench_function("types/expr_common_type_all_pairs", |b| {
        b.iter(|| {
            let mut ok = 0usize;
            for &a in &types {
                for &t in &types {
                    if expr_common_type(&mut ctx.types, a, t, Span::default()).is_ok() {
                        ok += 1;
                    }
                }
            }
            black_box(ok)
        });
    });

    c.bench_function("types/implicit_compatible_all_pairs", |b| {
        b.iter(|| {
            types
                .iter()
                .flat_map(|&a| types.iter().map(move |&t| (a, t)))
                .filter(|&(a, t)| implicit_compatible(&ctx.types, a, t))
                .count()
        });
    });
}

fn expression_benchmarks(c: &mut Criterion) {
    let mut ctx = Context::new();
    let f4 = ctx.types.vector(BaseType::Float, 4).unwrap();
    let f = ctx.types.scalar(BaseType::Float).unwrap();
    let v = ctx
        .declare_variable(Var::new("v", f4, Span::default()), false)
        .unwrap();
    let s = ctx
        .declare_variable(Var::new("s", f, Span::default()), false)
        .unwrap();

    c.bench_function("expr/add_expr_chain_100", |b| {
        b.iter(|| {
            let mut body = InstrList::new();
            let mut builder = ExprBuilder::new(&mut ctx, &mut body);
            let mut acc = builder.new_load(v, None, Span::default()).unwrap();
            builder.append(acc).unwrap();
            for _ in 0..100 {
                let rhs = builder.new_load(s, None, Span::default()).unwrap();
                builder.append(rhs).unwrap();
                acc = builder
                    .add_expr(ExprOp::Mul, [Some(acc), Some(rhs), None], Span::default())
                    .unwrap();
            }
            let target = builder.new_load(v, None, Span::default()).unwrap();
            builder.append(target).unwrap();
            builder.add_assignment(target, AssignOp::Add, acc).unwrap();
            black_box(body.len())
        });
    });
}

criterion_group!(benches, common_type_benchmarks, expression_benchmarks);
criterion_main!(benches);
