// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Loop-oriented IR consumed by the code generator.
//!
//! A [`ComputeBlock`] describes one element-wise kernel: the iteration
//! space, the exact footprint of every buffer it reads and writes, and a
//! single store of the computed value into the output buffer.

use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, CmpOp, UnaryOp};
use crate::context::Buffer;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        };
        write!(f, "{name}")
    }
}

/// A named scalar variable, e.g. a loop index or a bound shape symbol.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PrimVar {
    pub name: String,
    pub dtype: DType,
}

impl PrimVar {
    pub fn new(name: &str, dtype: DType) -> Self {
        PrimVar {
            name: name.to_owned(),
            dtype,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum IrExpr {
    IntImm(i64, DType),
    FloatImm(OrderedFloat<f64>, DType),
    BoolImm(bool),
    Var(PrimVar),
    /// buffer, one index per retained buffer dimension
    Load(Rc<Buffer>, Vec<IrExpr>),
    Binary(BinaryOp, Box<IrExpr>, Box<IrExpr>),
    Compare(CmpOp, Box<IrExpr>, Box<IrExpr>),
    Unary(UnaryOp, Box<IrExpr>),
}

impl IrExpr {
    pub fn int(value: i64, dtype: DType) -> Self {
        IrExpr::IntImm(value, dtype)
    }

    pub fn var(var: &PrimVar) -> Self {
        IrExpr::Var(var.clone())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            IrExpr::IntImm(value, _) => Some(*value),
            _ => None,
        }
    }
}

/// The half-open range `[start, end)`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RangeExpr {
    pub start: IrExpr,
    pub end: IrExpr,
}

impl RangeExpr {
    pub fn new(start: IrExpr, end: IrExpr) -> Self {
        RangeExpr { start, end }
    }

    /// The number of elements covered, when both bounds are constants.
    pub fn extent(&self) -> Option<i64> {
        Some(self.end.as_int()? - self.start.as_int()?)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct IterVar {
    pub var: PrimVar,
    pub range: RangeExpr,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BufferRegion {
    pub buffer: Rc<Buffer>,
    pub region: Vec<RangeExpr>,
}

impl BufferRegion {
    pub fn new(buffer: Rc<Buffer>, region: Vec<RangeExpr>) -> Self {
        BufferRegion { buffer, region }
    }

    /// The constant extent of each accessed dimension, if all are known.
    pub fn extents(&self) -> Option<Vec<i64>> {
        self.region.iter().map(RangeExpr::extent).collect()
    }
}

/// `buffer[indices] = value`
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BufferStore {
    pub buffer: Rc<Buffer>,
    pub indices: Vec<IrExpr>,
    pub value: IrExpr,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ComputeBlock {
    iter_vars: Vec<IterVar>,
    reads: Vec<BufferRegion>,
    writes: Vec<BufferRegion>,
    name: String,
    body: BufferStore,
}

impl ComputeBlock {
    pub(crate) fn new(
        iter_vars: Vec<IterVar>,
        reads: Vec<BufferRegion>,
        write: BufferRegion,
        name: &str,
        body: BufferStore,
    ) -> Self {
        ComputeBlock {
            iter_vars,
            reads,
            writes: vec![write],
            name: name.to_owned(),
            body,
        }
    }

    pub fn iter_vars(&self) -> &[IterVar] {
        &self.iter_vars
    }

    pub fn reads(&self) -> &[BufferRegion] {
        &self.reads
    }

    /// Always exactly one region: the output buffer at full extent.
    pub fn writes(&self) -> &[BufferRegion] {
        &self.writes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &BufferStore {
        &self.body
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
