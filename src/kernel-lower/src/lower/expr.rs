// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::rc::Rc;

use log::trace;

use crate::ast::{Constant, Expr, UnaryOp};
use crate::common::Result;
use crate::context::{ArrayContext, ArrayType, Buffer, ContextEntry, Operand};
use crate::dispatch::{ElementwiseOp, resolve};
use crate::ir::{BufferRegion, DType, IrExpr, IterVar, PrimVar, RangeExpr};
use crate::lower_err;
use crate::shape::{Dim, Shape, make_ranges};

use super::LowerEnv;

/// The result of lowering one sub-expression.
#[derive(Clone, PartialEq, Debug)]
pub(crate) enum Lowered {
    /// A buffer leaf.  It is read by whoever consumes it, since only the
    /// consumer knows the shape it is accessed at.
    Buffer(Rc<Buffer>),
    /// An operator result that has not been materialized.
    Array(IrExpr, ArrayType),
    Scalar(IrExpr, DType),
}

impl Lowered {
    pub(crate) fn operand(&self) -> Operand {
        match self {
            Lowered::Buffer(buffer) => Operand::Array(ArrayContext::Materialized(buffer.clone())),
            Lowered::Array(_, ty) => Operand::Array(ArrayContext::Abstract(ty.clone())),
            Lowered::Scalar(_, dtype) => Operand::Scalar(*dtype),
        }
    }

    pub(crate) fn shape(&self) -> Shape {
        match self {
            Lowered::Buffer(buffer) => buffer.shape().clone(),
            Lowered::Array(_, ty) => ty.shape.clone(),
            Lowered::Scalar(_, _) => Shape::scalar(),
        }
    }
}

/// Walks a kernel's return expression, collecting buffer reads as it goes.
pub(crate) struct ExprLowerer<'a> {
    env: &'a LowerEnv<'a>,
    iter_vars: &'a [IterVar],
    index_dtype: DType,
    reads: Vec<BufferRegion>,
}

impl<'a> ExprLowerer<'a> {
    pub(crate) fn new(env: &'a LowerEnv<'a>, iter_vars: &'a [IterVar], index_dtype: DType) -> Self {
        ExprLowerer {
            env,
            iter_vars,
            index_dtype,
            reads: Vec::new(),
        }
    }

    /// Read regions in the order the reads were emitted.
    pub(crate) fn into_reads(self) -> Vec<BufferRegion> {
        self.reads
    }

    pub(crate) fn lower(&mut self, expr: &Expr) -> Result<Lowered> {
        match expr {
            Expr::Name(id) => self.lower_name(id),
            Expr::Constant(value) => Ok(lower_constant(value)),
            Expr::BinOp(op, lhs, rhs) => self.lower_elementwise(ElementwiseOp::Binary(*op), lhs, rhs),
            Expr::Compare(lhs, comparators) => match comparators.as_slice() {
                [(op, rhs)] => self.lower_elementwise(ElementwiseOp::Compare(*op), lhs, rhs),
                [] => lower_err!(UnsupportedSyntax, "Compare without a comparator".to_owned()),
                _ => lower_err!(
                    UnsupportedSyntax,
                    format!(
                        "chained Compare with {} operators; split it into separate kernels",
                        comparators.len()
                    )
                ),
            },
            Expr::UnaryOp(op, operand) => self.lower_unary(*op, operand),
            Expr::BoolOp(_)
            | Expr::IfExp { .. }
            | Expr::Call { .. }
            | Expr::Attribute { .. }
            | Expr::Subscript { .. }
            | Expr::Lambda { .. }
            | Expr::Tuple(_)
            | Expr::List(_) => lower_err!(
                UnsupportedSyntax,
                format!("'{}' is not allowed in a kernel expression", expr.kind())
            ),
        }
    }

    fn lower_name(&self, id: &str) -> Result<Lowered> {
        match self.env.contexts.get(id) {
            Some(ContextEntry::Buffer(buffer)) => Ok(Lowered::Buffer(buffer.clone())),
            Some(ContextEntry::Scalar(dtype)) => {
                Ok(Lowered::Scalar(IrExpr::var(&PrimVar::new(id, *dtype)), *dtype))
            }
            None => lower_err!(UnknownName, format!("'{id}' is not defined")),
        }
    }

    fn lower_elementwise(&mut self, op: ElementwiseOp, lhs: &Expr, rhs: &Expr) -> Result<Lowered> {
        // the left side is fully lowered before the right side is visited
        let lhs = self.lower(lhs)?;
        let rhs = self.lower(rhs)?;

        let instance = resolve(self.env.registry, &lhs.operand(), &rhs.operand(), op)?;

        let lhs = self.materialize(lhs, &instance.lhs_broadcast_shape)?;
        let rhs = self.materialize(rhs, &instance.rhs_broadcast_shape)?;
        let expr = match op {
            ElementwiseOp::Binary(op) => IrExpr::Binary(op, Box::new(lhs), Box::new(rhs)),
            ElementwiseOp::Compare(op) => IrExpr::Compare(op, Box::new(lhs), Box::new(rhs)),
        };

        Ok(Lowered::Array(expr, instance.dst))
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Lowered> {
        let lowered = match self.lower(operand)? {
            Lowered::Buffer(buffer) => {
                let value = self.read_buffer(&buffer, buffer.shape())?;
                let ty = ArrayType::new(buffer.shape().clone(), op.result_dtype(buffer.dtype()));
                Lowered::Array(IrExpr::Unary(op, Box::new(value)), ty)
            }
            Lowered::Array(expr, ty) => {
                let ty = ArrayType::new(ty.shape, op.result_dtype(ty.dtype));
                Lowered::Array(IrExpr::Unary(op, Box::new(expr)), ty)
            }
            Lowered::Scalar(expr, dtype) => {
                Lowered::Scalar(IrExpr::Unary(op, Box::new(expr)), op.result_dtype(dtype))
            }
        };
        Ok(lowered)
    }

    /// Turns an operand into an IR value, reading it if it is a buffer.
    fn materialize(&mut self, lowered: Lowered, access: &Shape) -> Result<IrExpr> {
        match lowered {
            Lowered::Buffer(buffer) => self.read_buffer(&buffer, access),
            Lowered::Array(expr, _) | Lowered::Scalar(expr, _) => Ok(expr),
        }
    }

    /// Reads `buffer` at the current iteration point and records the
    /// region covered by `access`.
    ///
    /// A buffer of lower rank than the iteration space is indexed by the
    /// trailing iteration variables.  A dimension accessed with extent 1
    /// against a wider iteration range is indexed at 0.
    pub(crate) fn read_buffer(&mut self, buffer: &Rc<Buffer>, access: &Shape) -> Result<IrExpr> {
        let rank = buffer.rank();
        if rank > self.iter_vars.len() {
            return lower_err!(
                ShapeMismatch,
                format!(
                    "'{}' of shape {} has more dimensions than the {} iteration variables",
                    buffer.name(),
                    buffer.shape(),
                    self.iter_vars.len()
                )
            );
        }
        if access.rank() != rank {
            return lower_err!(
                ShapeMismatch,
                format!(
                    "access shape {} does not match '{}' of shape {}",
                    access,
                    buffer.name(),
                    buffer.shape()
                )
            );
        }

        let trailing = &self.iter_vars[self.iter_vars.len() - rank..];
        let indices = access
            .retained()
            .zip(trailing)
            .map(|(dim, iter_var)| {
                if is_degenerate(dim, &iter_var.range) {
                    IrExpr::int(0, self.index_dtype)
                } else {
                    IrExpr::var(&iter_var.var)
                }
            })
            .collect();
        let value = buffer.read_at(indices)?;

        let region = make_ranges(access, self.env.symbols, self.index_dtype)?;
        trace!("read {} at {}", buffer.name(), access);
        self.reads.push(BufferRegion::new(buffer.clone(), region));

        Ok(value)
    }
}

fn lower_constant(value: &Constant) -> Lowered {
    let expr = match value {
        Constant::Int(n) => IrExpr::int(*n, DType::Int64),
        Constant::Float(n) => IrExpr::FloatImm(*n, DType::Float64),
        Constant::Bool(b) => IrExpr::BoolImm(*b),
    };
    Lowered::Scalar(expr, value.dtype())
}

fn is_degenerate(dim: &Dim, range: &RangeExpr) -> bool {
    matches!(dim, Dim::Const(1)) && range.extent() != Some(1)
}
