// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::ast::{BinaryOp, CmpOp};
use crate::common::Result;
use crate::context::{ArrayContext, ArrayType, Operand};
use crate::lower_err;
use crate::shape::Shape;

/// An element-wise operator the registry can be asked about.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementwiseOp {
    Binary(BinaryOp),
    Compare(CmpOp),
}

impl ElementwiseOp {
    pub fn name(&self) -> &'static str {
        match self {
            ElementwiseOp::Binary(op) => op.name(),
            ElementwiseOp::Compare(op) => op.name(),
        }
    }
}

impl fmt::Display for ElementwiseOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the registry knows about one operator applied to two array types.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OperatorInstance {
    /// Shape and element type of the result.
    pub dst: ArrayType,
    /// The shape the left operand is read at.
    pub lhs_broadcast_shape: Shape,
    /// The shape the right operand is read at.
    pub rhs_broadcast_shape: Shape,
}

impl OperatorInstance {
    /// Operator results stay abstract until written to the output.
    pub fn dst_context(&self) -> ArrayContext {
        ArrayContext::Abstract(self.dst.clone())
    }
}

/// Looks up operator implementations by operand types and operator.
///
/// Broadcast compatibility is the implementation's business; lowering only
/// consumes the shapes it returns.
pub trait OperatorRegistry {
    fn lookup(&self, lhs: &ArrayType, rhs: &ArrayType, op: ElementwiseOp) -> Option<OperatorInstance>;
}

impl<F> OperatorRegistry for F
where
    F: Fn(&ArrayType, &ArrayType, ElementwiseOp) -> Option<OperatorInstance>,
{
    fn lookup(&self, lhs: &ArrayType, rhs: &ArrayType, op: ElementwiseOp) -> Option<OperatorInstance> {
        self(lhs, rhs, op)
    }
}

/// Resolves `lhs op rhs` against `registry`.
///
/// Both operands must be arrays; scalar operands are rejected.
pub fn resolve(
    registry: &dyn OperatorRegistry,
    lhs: &Operand,
    rhs: &Operand,
    op: ElementwiseOp,
) -> Result<OperatorInstance> {
    let (Operand::Array(lhs_ctx), Operand::Array(rhs_ctx)) = (lhs, rhs) else {
        return lower_err!(
            UnsupportedOperand,
            format!("operator '{op}' does not support {lhs} and {rhs}")
        );
    };

    match registry.lookup(lhs_ctx.array_type(), rhs_ctx.array_type(), op) {
        Some(instance) => Ok(instance),
        None => lower_err!(
            UnsupportedOperand,
            format!("no '{op}' operator is registered for {lhs} and {rhs}")
        ),
    }
}
