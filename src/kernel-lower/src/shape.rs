// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::common::Result;
use crate::ir::{DType, IrExpr, PrimVar, RangeExpr};
use crate::lower_err;

/// A single dimension of an array shape.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Dim {
    /// Extent known at lowering time.
    Const(u64),
    /// Extent bound at kernel-binding time through the [`SymbolTable`].
    Symbol(String),
    /// Placeholder kept for broadcast alignment; never part of the
    /// iteration space.
    Elided,
}

impl Dim {
    pub fn symbol(name: &str) -> Self {
        Dim::Symbol(name.to_owned())
    }

    pub fn is_elided(&self) -> bool {
        matches!(self, Dim::Elided)
    }
}

impl From<u64> for Dim {
    fn from(extent: u64) -> Self {
        Dim::Const(extent)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dim::Const(n) => write!(f, "{n}"),
            Dim::Symbol(name) => write!(f, "{name}"),
            Dim::Elided => write!(f, "None"),
        }
    }
}

/// An ordered sequence of dimensions.  Shapes are built once and never
/// modified afterwards.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Shape(SmallVec<[Dim; 4]>);

impl Shape {
    pub fn new(dims: impl IntoIterator<Item = Dim>) -> Self {
        Shape(dims.into_iter().collect())
    }

    /// The shape of a zero-dimensional value.
    pub fn scalar() -> Self {
        Shape::default()
    }

    pub fn dims(&self) -> &[Dim] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dimensions that take part in iteration, in order.
    pub fn retained(&self) -> impl Iterator<Item = &Dim> {
        self.0.iter().filter(|dim| !dim.is_elided())
    }

    /// The number of retained (non-elided) dimensions.
    pub fn rank(&self) -> usize {
        self.retained().count()
    }

    /// Compares only the retained dimensions, so `(None, 6)` matches `(6,)`.
    pub fn same_retained(&self, other: &Shape) -> bool {
        self.retained().eq(other.retained())
    }
}

impl<const N: usize> From<[u64; N]> for Shape {
    fn from(extents: [u64; N]) -> Self {
        Shape::new(extents.into_iter().map(Dim::Const))
    }
}

impl FromIterator<Dim> for Shape {
    fn from_iter<T: IntoIterator<Item = Dim>>(iter: T) -> Self {
        Shape::new(iter)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|dim| dim.to_string()).collect();
        if dims.len() == 1 {
            write!(f, "({},)", dims[0])
        } else {
            write!(f, "({})", dims.join(", "))
        }
    }
}

/// Maps shape symbols to the expressions holding their runtime extent.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, IrExpr>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bound: IrExpr) {
        self.symbols.insert(name.to_owned(), bound);
    }

    /// Binds `name` to a scalar variable of the same name.
    pub fn bind_var(&mut self, name: &str, dtype: DType) {
        self.insert(name, IrExpr::var(&PrimVar::new(name, dtype)));
    }

    pub fn get(&self, name: &str) -> Option<&IrExpr> {
        self.symbols.get(name)
    }
}

/// Builds one `[0, extent)` range per retained dimension of `shape`.
///
/// Elided dimensions are skipped, so the result may be shorter than the
/// shape itself.
pub fn make_ranges(
    shape: &Shape,
    symbols: &SymbolTable,
    index_dtype: DType,
) -> Result<Vec<RangeExpr>> {
    let mut ranges = Vec::with_capacity(shape.len());
    for dim in shape.dims() {
        let end = match dim {
            Dim::Const(extent) => match i64::try_from(*extent) {
                Ok(extent) => IrExpr::int(extent, index_dtype),
                Err(_) => {
                    return lower_err!(
                        ShapeMismatch,
                        format!("extent {extent} in shape {shape} is not addressable")
                    );
                }
            },
            Dim::Symbol(name) => match symbols.get(name) {
                Some(bound) => bound.clone(),
                None => {
                    return lower_err!(
                        UnboundSymbol,
                        format!("shape symbol '{name}' in {shape} has no binding")
                    );
                }
            },
            Dim::Elided => continue,
        };
        ranges.push(RangeExpr::new(IrExpr::int(0, index_dtype), end));
    }
    trace!("ranges for {shape}: {} retained of {}", ranges.len(), shape.len());
    Ok(ranges)
}
