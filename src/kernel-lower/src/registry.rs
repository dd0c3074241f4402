// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! A small operator registry with right-aligned broadcasting.
//!
//! Front-ends normally supply their own registry; this one covers plain
//! element-wise arithmetic and comparisons over operands of the same
//! element type, which is enough to drive lowering on its own.

use std::collections::HashSet;

use crate::ast::{BinaryOp, CmpOp};
use crate::context::ArrayType;
use crate::dispatch::{ElementwiseOp, OperatorInstance, OperatorRegistry};
use crate::ir::DType;
use crate::shape::{Dim, Shape};

const BINARY_OPS: [BinaryOp; 7] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mult,
    BinaryOp::Div,
    BinaryOp::FloorDiv,
    BinaryOp::Mod,
    BinaryOp::Pow,
];

const CMP_OPS: [CmpOp; 6] = [
    CmpOp::Eq,
    CmpOp::NotEq,
    CmpOp::Lt,
    CmpOp::LtE,
    CmpOp::Gt,
    CmpOp::GtE,
];

#[derive(Clone, Debug)]
pub struct ElementwiseRegistry {
    ops: HashSet<ElementwiseOp>,
}

impl Default for ElementwiseRegistry {
    fn default() -> Self {
        let binary = BINARY_OPS.into_iter().map(ElementwiseOp::Binary);
        let compare = CMP_OPS.into_iter().map(ElementwiseOp::Compare);
        Self::with_ops(binary.chain(compare))
    }
}

impl ElementwiseRegistry {
    /// A registry that only knows the given operators.
    pub fn with_ops(ops: impl IntoIterator<Item = ElementwiseOp>) -> Self {
        ElementwiseRegistry {
            ops: ops.into_iter().collect(),
        }
    }

    pub fn supports(&self, op: ElementwiseOp) -> bool {
        self.ops.contains(&op)
    }
}

impl OperatorRegistry for ElementwiseRegistry {
    fn lookup(&self, lhs: &ArrayType, rhs: &ArrayType, op: ElementwiseOp) -> Option<OperatorInstance> {
        if !self.supports(op) || lhs.dtype != rhs.dtype {
            return None;
        }
        let shape = broadcast_shapes(&lhs.shape, &rhs.shape)?;
        let dtype = match op {
            ElementwiseOp::Binary(_) => lhs.dtype,
            ElementwiseOp::Compare(_) => DType::Bool,
        };

        Some(OperatorInstance {
            dst: ArrayType::new(shape, dtype),
            lhs_broadcast_shape: lhs.shape.clone(),
            rhs_broadcast_shape: rhs.shape.clone(),
        })
    }
}

/// Broadcasts two shapes aligned on their trailing dimensions.
///
/// A missing leading dimension or a constant extent of 1 repeats along
/// the other side; any other pair must be identical.  Elided dimensions
/// are ignored.  Returns None when the shapes are incompatible.
pub fn broadcast_shapes(lhs: &Shape, rhs: &Shape) -> Option<Shape> {
    let lhs: Vec<&Dim> = lhs.retained().collect();
    let rhs: Vec<&Dim> = rhs.retained().collect();
    let rank = lhs.len().max(rhs.len());

    let mut dims = Vec::with_capacity(rank);
    for i in 0..rank {
        let l = (i + lhs.len()).checked_sub(rank).map(|idx| lhs[idx]);
        let r = (i + rhs.len()).checked_sub(rank).map(|idx| rhs[idx]);
        let dim = match (l, r) {
            (Some(l), None) => l,
            (None, Some(r)) => r,
            (Some(l), Some(r)) if l == r => l,
            (Some(Dim::Const(1)), Some(r)) => r,
            (Some(l), Some(Dim::Const(1))) => l,
            _ => return None,
        };
        dims.push(dim.clone());
    }

    Some(Shape::new(dims))
}
