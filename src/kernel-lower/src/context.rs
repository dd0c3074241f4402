// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::ir::{BufferStore, DType, IrExpr};
use crate::lower_err;
use crate::shape::Shape;

/// The shape and element type of an array value.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ArrayType {
    pub shape: Shape,
    pub dtype: DType,
}

impl ArrayType {
    pub fn new(shape: Shape, dtype: DType) -> Self {
        ArrayType { shape, dtype }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ndarray{}[{}]", self.shape, self.dtype)
    }
}

/// Addressable storage backing a materialized array.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Buffer {
    name: String,
    ty: ArrayType,
}

impl Buffer {
    pub fn new(name: &str, shape: Shape, dtype: DType) -> Self {
        Buffer {
            name: name.to_owned(),
            ty: ArrayType::new(shape, dtype),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.ty.shape
    }

    pub fn dtype(&self) -> DType {
        self.ty.dtype
    }

    pub fn array_type(&self) -> &ArrayType {
        &self.ty
    }

    pub fn rank(&self) -> usize {
        self.ty.shape.rank()
    }

    fn check_indices(&self, indices: &[IrExpr]) -> Result<()> {
        if indices.len() != self.rank() {
            return lower_err!(
                ShapeMismatch,
                format!(
                    "{} indices given for buffer '{}' of shape {}",
                    indices.len(),
                    self.name,
                    self.ty.shape
                )
            );
        }
        Ok(())
    }

    /// `self[indices]`, with one index per retained dimension.
    pub fn read_at(self: &Rc<Self>, indices: Vec<IrExpr>) -> Result<IrExpr> {
        self.check_indices(&indices)?;
        Ok(IrExpr::Load(self.clone(), indices))
    }

    /// `self[indices] = value`
    pub fn write_at(self: &Rc<Self>, indices: Vec<IrExpr>, value: IrExpr) -> Result<BufferStore> {
        self.check_indices(&indices)?;
        Ok(BufferStore {
            buffer: self.clone(),
            indices,
            value,
        })
    }
}

/// An array operand: either backed by a buffer, or the not yet
/// materialized result of an operator.
///
/// Only the materialized variant can be read or written, which is why
/// reads go through [`Buffer`] rather than through this type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ArrayContext {
    Materialized(Rc<Buffer>),
    Abstract(ArrayType),
}

impl ArrayContext {
    pub fn is_materialized(&self) -> bool {
        matches!(self, ArrayContext::Materialized(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, ArrayContext::Abstract(_))
    }

    pub fn array_type(&self) -> &ArrayType {
        match self {
            ArrayContext::Materialized(buffer) => buffer.array_type(),
            ArrayContext::Abstract(ty) => ty,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.array_type().shape
    }

    pub fn buffer(&self) -> Option<&Rc<Buffer>> {
        match self {
            ArrayContext::Materialized(buffer) => Some(buffer),
            ArrayContext::Abstract(_) => None,
        }
    }
}

/// The kind of value a sub-expression produces.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Array(ArrayContext),
    Scalar(DType),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Array(ArrayContext::Materialized(buffer)) => {
                write!(f, "{} '{}'", buffer.array_type(), buffer.name())
            }
            Operand::Array(ArrayContext::Abstract(ty)) => write!(f, "{ty}"),
            Operand::Scalar(dtype) => write!(f, "{dtype}"),
        }
    }
}

/// A name the kernel body may refer to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ContextEntry {
    Buffer(Rc<Buffer>),
    Scalar(DType),
}

/// Names visible to the kernel body: its array parameters and scalars.
#[derive(Clone, Debug, Default)]
pub struct ContextTable {
    entries: HashMap<String, ContextEntry>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `buffer` under its own name.
    pub fn insert_buffer(&mut self, buffer: Buffer) -> Rc<Buffer> {
        let buffer = Rc::new(buffer);
        self.entries
            .insert(buffer.name().to_owned(), ContextEntry::Buffer(buffer.clone()));
        buffer
    }

    pub fn insert_scalar(&mut self, name: &str, dtype: DType) {
        self.entries
            .insert(name.to_owned(), ContextEntry::Scalar(dtype));
    }

    pub fn get(&self, name: &str) -> Option<&ContextEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
