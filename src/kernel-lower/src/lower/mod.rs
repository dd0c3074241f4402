// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Lowering of a single-`return` kernel into a [`ComputeBlock`].
//!
//! The body of a kernel is one `return <expr>` statement.  Lowering builds
//! an iteration space from the output shape, walks the expression once
//! (reading every buffer leaf at the current iteration point) and stores
//! the result into the output buffer.

mod expr;

use std::rc::Rc;

use log::debug;

use crate::ast::{Expr, Stmt};
use crate::common::Result;
use crate::config::LowerConfig;
use crate::context::{Buffer, ContextTable};
use crate::dispatch::OperatorRegistry;
use crate::ir::{BufferRegion, ComputeBlock, IrExpr, IterVar, PrimVar, RangeExpr};
use crate::lower_err;
use crate::shape::{Shape, SymbolTable, make_ranges};

use self::expr::{ExprLowerer, Lowered};

/// A kernel definition as handed over by the front-end.
#[derive(Clone, Debug)]
pub struct KernelDef {
    pub name: String,
    /// The buffer the kernel writes its result into.
    pub output: Rc<Buffer>,
    /// The shape the return annotation declares.
    pub expected_shape: Shape,
    pub body: Stmt,
}

/// Everything lowering looks names and operators up in.
#[derive(Clone, Copy)]
pub struct LowerEnv<'a> {
    pub contexts: &'a ContextTable,
    pub symbols: &'a SymbolTable,
    pub registry: &'a dyn OperatorRegistry,
}

/// Lowers `kernel` into a compute block.
///
/// Errors carry the kernel name in their details.
pub fn lower_kernel(kernel: &KernelDef, env: &LowerEnv, config: &LowerConfig) -> Result<ComputeBlock> {
    KernelLowerer::new(kernel, env, config)
        .lower()
        .map_err(|err| err.with_kernel(&kernel.name))
}

struct KernelLowerer<'a> {
    kernel: &'a KernelDef,
    env: &'a LowerEnv<'a>,
    config: &'a LowerConfig,
}

impl<'a> KernelLowerer<'a> {
    fn new(kernel: &'a KernelDef, env: &'a LowerEnv<'a>, config: &'a LowerConfig) -> Self {
        KernelLowerer {
            kernel,
            env,
            config,
        }
    }

    fn lower(&self) -> Result<ComputeBlock> {
        let value = return_value(&self.kernel.body)?;
        let output = &self.kernel.output;

        if *output.shape() != self.kernel.expected_shape {
            return lower_err!(
                ShapeMismatch,
                format!(
                    "the marked shape {} is not equal to {}",
                    output.shape(),
                    self.kernel.expected_shape
                )
            );
        }

        let ranges = make_ranges(output.shape(), self.env.symbols, self.config.index_dtype)?;
        let iter_vars = self.iteration_space(&ranges);
        debug!(
            "kernel '{}': ranges computed, {} iteration variables over {}",
            self.kernel.name,
            iter_vars.len(),
            output.shape()
        );

        let mut lowerer = ExprLowerer::new(self.env, &iter_vars, self.config.index_dtype);
        let lowered = lowerer.lower(value)?;
        let value = self.result_value(&mut lowerer, lowered)?;
        let reads = lowerer.into_reads();
        debug!("kernel '{}': body lowered with {} read regions", self.kernel.name, reads.len());

        let write = BufferRegion::new(output.clone(), ranges);
        let indices = iter_vars.iter().map(|iv| IrExpr::var(&iv.var)).collect();
        let body = output.write_at(indices, value)?;

        Ok(ComputeBlock::new(iter_vars, reads, write, &self.kernel.name, body))
    }

    /// One iteration variable per retained output dimension, covering it
    /// fully.
    fn iteration_space(&self, ranges: &[RangeExpr]) -> Vec<IterVar> {
        ranges
            .iter()
            .enumerate()
            .map(|(i, range)| IterVar {
                var: PrimVar::new(&self.config.iter_var_name(i), self.config.index_dtype),
                range: range.clone(),
            })
            .collect()
    }

    /// Checks the lowered return value against the output and turns it
    /// into the value to store.
    fn result_value(&self, lowerer: &mut ExprLowerer, lowered: Lowered) -> Result<IrExpr> {
        let output = &self.kernel.output;
        let shape = lowered.shape();
        if !shape.same_retained(output.shape()) {
            return lower_err!(
                ShapeMismatch,
                format!(
                    "the return shape is annotated as {} but got {}",
                    output.shape(),
                    shape
                )
            );
        }

        match lowered {
            Lowered::Array(value, _) => Ok(value),
            Lowered::Buffer(buffer) => {
                if !self.config.read_bare_outputs {
                    return lower_err!(
                        UnsupportedSyntax,
                        format!("returning '{}' without an operator", buffer.name())
                    );
                }
                lowerer.read_buffer(&buffer, buffer.shape())
            }
            Lowered::Scalar(value, _) => Ok(value),
        }
    }
}

/// The expression of the kernel's single `return` statement.
fn return_value(body: &Stmt) -> Result<&Expr> {
    match body {
        Stmt::Return(Some(value)) => Ok(value),
        Stmt::Return(None) => lower_err!(EmptyReturn, "the return value is empty".to_owned()),
        _ => lower_err!(
            UnsupportedSyntax,
            format!("'{}' is not allowed in a single-return kernel", body.kind())
        ),
    }
}
