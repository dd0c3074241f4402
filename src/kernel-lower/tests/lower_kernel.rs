// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use kernel_lower::test_common::{KernelFixture, OUTPUT};
use kernel_lower::{
    ArrayType, BinaryOp, CmpOp, ComputeBlock, DType, Dim, ElementwiseOp, ErrorCode, ErrorKind,
    Expr, IrExpr, LowerConfig, OperatorInstance, PrimVar, Shape, Stmt, UnaryOp,
};
use test_log::test;

fn add(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinaryOp::Add, lhs, rhs)
}

fn read_names(block: &ComputeBlock) -> Vec<&str> {
    block.reads().iter().map(|r| r.buffer.name()).collect()
}

fn iter_var(i: usize) -> IrExpr {
    IrExpr::var(&PrimVar::new(&format!("__iter_{i}"), DType::Int64))
}

#[test]
fn elementwise_add() {
    let block = KernelFixture::new("add")
        .array("x", [4, 4], DType::Float32)
        .array("y", [4, 4], DType::Float32)
        .output([4, 4], DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap();

    assert_eq!("add", block.name());
    assert_eq!(2, block.iter_vars().len());
    for iv in block.iter_vars() {
        assert_eq!(Some(4), iv.range.extent());
        assert_eq!(DType::Int64, iv.var.dtype);
    }

    assert_eq!(vec!["x", "y"], read_names(&block));
    for read in block.reads() {
        assert_eq!(Some(vec![4, 4]), read.extents());
    }

    assert_eq!(1, block.writes().len());
    assert_eq!(OUTPUT, block.writes()[0].buffer.name());
    assert_eq!(Some(vec![4, 4]), block.writes()[0].extents());

    let body = block.body();
    assert_eq!(OUTPUT, body.buffer.name());
    assert_eq!(vec![iter_var(0), iter_var(1)], body.indices);
    assert_eq!(
        "__out[__iter_0, __iter_1] = x[__iter_0, __iter_1] + y[__iter_0, __iter_1]",
        block.to_string().lines().last().unwrap().trim()
    );
}

#[test]
fn annotated_shape_must_match_output() {
    let err = KernelFixture::new("bad")
        .array("x", [4], DType::Float32)
        .array("y", [4], DType::Float32)
        .output([4], DType::Float32)
        .expected_shape([3])
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap_err();

    assert_eq!(ErrorCode::ShapeMismatch, err.code);
    assert_eq!(ErrorKind::Shape, err.kind);
    let details = err.get_details().unwrap();
    assert!(details.contains("in kernel 'bad'"), "{details}");
    assert!(details.contains("(3,)"), "{details}");
    assert!(details.contains("(4,)"), "{details}");
}

#[test]
fn result_shape_must_match_output() {
    let err = KernelFixture::new("bad")
        .array("x", [3], DType::Float32)
        .array("y", [3], DType::Float32)
        .output([4], DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap_err();

    assert_eq!(ErrorCode::ShapeMismatch, err.code);
    let details = err.get_details().unwrap();
    assert!(details.contains("annotated as (4,) but got (3,)"), "{details}");
}

#[test]
fn empty_return() {
    let err = KernelFixture::new("empty")
        .output([4], DType::Float32)
        .lower(Stmt::Return(None))
        .unwrap_err();
    assert_eq!(ErrorCode::EmptyReturn, err.code);
    assert_eq!(ErrorKind::Syntax, err.kind);
}

#[test]
fn conditional_expression_is_unsupported() {
    let expr = Expr::IfExp {
        test: Box::new(Expr::name("x")),
        body: Box::new(Expr::name("x")),
        orelse: Box::new(Expr::name("y")),
    };
    let err = KernelFixture::new("cond")
        .array("x", [4], DType::Float32)
        .array("y", [4], DType::Float32)
        .output([4], DType::Float32)
        .lower_expr(expr)
        .unwrap_err();
    assert_eq!(ErrorCode::UnsupportedSyntax, err.code);
    assert!(err.get_details().unwrap().contains("IfExp"));
}

#[test]
fn reads_follow_left_to_right_materialization() {
    let fixture = KernelFixture::new("order")
        .array("a", [8], DType::Float64)
        .array("b", [8], DType::Float64)
        .array("c", [8], DType::Float64)
        .output([8], DType::Float64);

    // (a + b) + c
    let block = fixture
        .lower_expr(add(add(Expr::name("a"), Expr::name("b")), Expr::name("c")))
        .unwrap();
    assert_eq!(vec!["a", "b", "c"], read_names(&block));

    // a + (b + c): the right subtree's reads are emitted before `a` is
    // materialized by the outer operator
    let block = fixture
        .lower_expr(add(Expr::name("a"), add(Expr::name("b"), Expr::name("c"))))
        .unwrap();
    assert_eq!(vec!["b", "c", "a"], read_names(&block));
}

#[test]
fn repeated_operand_is_read_each_time() {
    let block = KernelFixture::new("square")
        .array("x", [5], DType::Float32)
        .output([5], DType::Float32)
        .lower_expr(Expr::binop(BinaryOp::Mult, Expr::name("x"), Expr::name("x")))
        .unwrap();
    assert_eq!(vec!["x", "x"], read_names(&block));
}

#[test]
fn broadcast_reads_trailing_dimensions() {
    let block = KernelFixture::new("bias")
        .array("x", [2, 3, 4], DType::Float32)
        .array("bias", [4], DType::Float32)
        .output([2, 3, 4], DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("bias")))
        .unwrap();

    assert_eq!(3, block.iter_vars().len());
    assert_eq!(Some(vec![2, 3, 4]), block.reads()[0].extents());
    assert_eq!(Some(vec![4]), block.reads()[1].extents());

    let IrExpr::Binary(_, _, rhs) = &block.body().value else {
        panic!("expected a binary expression");
    };
    let IrExpr::Load(buffer, indices) = rhs.as_ref() else {
        panic!("expected a load");
    };
    assert_eq!("bias", buffer.name());
    assert_eq!(&vec![iter_var(2)], indices);
}

#[test]
fn broadcast_unit_dimension() {
    let block = KernelFixture::new("outer")
        .array("col", [3, 1], DType::Int32)
        .array("row", [1, 5], DType::Int32)
        .output([3, 5], DType::Int32)
        .lower_expr(Expr::binop(BinaryOp::Mult, Expr::name("col"), Expr::name("row")))
        .unwrap();

    assert_eq!(Some(vec![3, 1]), block.reads()[0].extents());
    assert_eq!(Some(vec![1, 5]), block.reads()[1].extents());
    assert_eq!(
        "__out[__iter_0, __iter_1] = col[__iter_0, 0] * row[0, __iter_1]",
        block.to_string().lines().last().unwrap().trim()
    );
}

#[test]
fn symbolic_dimensions() {
    let shape = Shape::new([Dim::symbol("N"), Dim::Const(4)]);
    let block = KernelFixture::new("sym")
        .symbol("N")
        .array("x", shape.clone(), DType::Float32)
        .array("y", shape.clone(), DType::Float32)
        .output(shape, DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap();

    let n = IrExpr::var(&PrimVar::new("N", DType::Int64));
    assert_eq!(n, block.iter_vars()[0].range.end);
    assert_eq!(None, block.iter_vars()[0].range.extent());
    assert_eq!(n, block.reads()[0].region[0].end);
    assert_eq!(n, block.writes()[0].region[0].end);
}

#[test]
fn unbound_symbol() {
    let shape = Shape::new([Dim::symbol("N")]);
    let err = KernelFixture::new("sym")
        .array("x", shape.clone(), DType::Float32)
        .array("y", shape.clone(), DType::Float32)
        .output(shape, DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap_err();
    assert_eq!(ErrorCode::UnboundSymbol, err.code);
}

#[test]
fn elided_dimensions_are_not_iterated() {
    let shape = Shape::new([Dim::Elided, Dim::Const(6)]);
    let block = KernelFixture::new("elided")
        .array("x", shape.clone(), DType::Float32)
        .array("y", shape.clone(), DType::Float32)
        .output(shape, DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap();
    assert_eq!(1, block.iter_vars().len());
    assert_eq!(Some(vec![6]), block.reads()[0].extents());
    assert_eq!(Some(vec![6]), block.writes()[0].extents());
}

#[test]
fn elided_output_accepts_nested_operators() {
    let shape = Shape::new([Dim::Elided, Dim::Const(6)]);
    let expr = Expr::binop(
        BinaryOp::Mult,
        add(Expr::name("x"), Expr::name("y")),
        Expr::name("x"),
    );
    let block = KernelFixture::new("elided")
        .array("x", shape.clone(), DType::Float32)
        .array("y", shape.clone(), DType::Float32)
        .output(shape, DType::Float32)
        .lower_expr(expr)
        .unwrap();

    assert_eq!(vec!["x", "y", "x"], read_names(&block));
    assert_eq!(vec![iter_var(0)], block.body().indices);
    assert_eq!(
        "__out[__iter_0] = (x[__iter_0] + y[__iter_0]) * x[__iter_0]",
        block.to_string().lines().last().unwrap().trim()
    );
}

#[test]
fn custom_registry() {
    // a registry that knows only float32 addition over identical shapes
    let registry = |lhs: &ArrayType, rhs: &ArrayType, op: ElementwiseOp| {
        if op != ElementwiseOp::Binary(BinaryOp::Add) || lhs != rhs || lhs.dtype != DType::Float32 {
            return None;
        }
        Some(OperatorInstance {
            dst: lhs.clone(),
            lhs_broadcast_shape: lhs.shape.clone(),
            rhs_broadcast_shape: rhs.shape.clone(),
        })
    };
    let fixture = KernelFixture::new("custom")
        .registry(registry)
        .array("x", [4], DType::Float32)
        .array("y", [4], DType::Float32)
        .output([4], DType::Float32);

    assert!(fixture.lower_expr(add(Expr::name("x"), Expr::name("y"))).is_ok());

    let err = fixture
        .lower_expr(Expr::binop(BinaryOp::Sub, Expr::name("x"), Expr::name("y")))
        .unwrap_err();
    assert_eq!(ErrorCode::UnsupportedOperand, err.code);
    assert_eq!(ErrorKind::Type, err.kind);
}

#[test]
fn scalar_operands_are_rejected() {
    let err = KernelFixture::new("scale")
        .array("x", [4], DType::Float32)
        .scalar("alpha", DType::Float32)
        .output([4], DType::Float32)
        .lower_expr(Expr::binop(BinaryOp::Mult, Expr::name("x"), Expr::name("alpha")))
        .unwrap_err();
    assert_eq!(ErrorCode::UnsupportedOperand, err.code);
}

#[test]
fn unknown_name() {
    let err = KernelFixture::new("typo")
        .array("x", [4], DType::Float32)
        .output([4], DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("z")))
        .unwrap_err();
    assert_eq!(ErrorCode::UnknownName, err.code);
    assert!(err.get_details().unwrap().contains("'z'"));
}

#[test]
fn unary_and_compare() {
    let fixture = |dtype| {
        KernelFixture::new("mask")
            .array("x", [4], DType::Float32)
            .array("y", [4], DType::Float32)
            .output([4], dtype)
    };

    let block = fixture(DType::Bool)
        .lower_expr(Expr::unary(
            UnaryOp::Not,
            Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::name("y")),
        ))
        .unwrap();
    assert_eq!(vec!["x", "y"], read_names(&block));
    assert_eq!(
        "__out[__iter_0] = not x[__iter_0] > y[__iter_0]",
        block.to_string().lines().last().unwrap().trim()
    );

    let block = fixture(DType::Float32)
        .lower_expr(Expr::unary(UnaryOp::USub, Expr::name("x")))
        .unwrap();
    assert_eq!(vec!["x"], read_names(&block));
}

#[test]
fn chained_comparison_is_unsupported() {
    let expr = Expr::Compare(
        Box::new(Expr::name("x")),
        vec![(CmpOp::Lt, Expr::name("y")), (CmpOp::Lt, Expr::name("x"))],
    );
    let err = KernelFixture::new("chain")
        .array("x", [4], DType::Float32)
        .array("y", [4], DType::Float32)
        .output([4], DType::Bool)
        .lower_expr(expr)
        .unwrap_err();
    assert_eq!(ErrorCode::UnsupportedSyntax, err.code);
}

#[test]
fn bare_return_copies_buffer() {
    let fixture = KernelFixture::new("copy")
        .array("x", [2, 2], DType::Float64)
        .output([2, 2], DType::Float64);

    let block = fixture.lower_expr(Expr::name("x")).unwrap();
    assert_eq!(vec!["x"], read_names(&block));
    assert_eq!(
        "__out[__iter_0, __iter_1] = x[__iter_0, __iter_1]",
        block.to_string().lines().last().unwrap().trim()
    );

    let config = LowerConfig {
        read_bare_outputs: false,
        ..LowerConfig::default()
    };
    let err = fixture.config(config).lower_expr(Expr::name("x")).unwrap_err();
    assert_eq!(ErrorCode::UnsupportedSyntax, err.code);
}

#[test]
fn json_round_trip() {
    let block = KernelFixture::new("add")
        .array("x", [4, 4], DType::Float32)
        .array("y", [4, 4], DType::Float32)
        .output([4, 4], DType::Float32)
        .lower_expr(add(Expr::name("x"), Expr::name("y")))
        .unwrap();

    let json = block.to_json().unwrap();
    assert!(json.contains("\"__iter_0\""));
    assert_eq!(block, ComputeBlock::from_json(&json).unwrap());
}
