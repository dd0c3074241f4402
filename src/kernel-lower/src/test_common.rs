// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Builder for lowering kernels in tests without a front-end.

use std::rc::Rc;

use crate::ast::{Expr, Stmt};
use crate::common::Result;
use crate::config::LowerConfig;
use crate::context::{Buffer, ContextTable};
use crate::dispatch::OperatorRegistry;
use crate::ir::{ComputeBlock, DType};
use crate::lower::{KernelDef, LowerEnv, lower_kernel};
use crate::registry::ElementwiseRegistry;
use crate::shape::{Shape, SymbolTable};

/// The name the fixture gives to the kernel's output buffer.
pub const OUTPUT: &str = "__out";

pub struct KernelFixture {
    name: String,
    contexts: ContextTable,
    symbols: SymbolTable,
    registry: Box<dyn OperatorRegistry>,
    config: LowerConfig,
    output: Option<(Shape, DType)>,
    expected_shape: Option<Shape>,
}

impl KernelFixture {
    pub fn new(name: &str) -> Self {
        KernelFixture {
            name: name.to_owned(),
            contexts: ContextTable::new(),
            symbols: SymbolTable::new(),
            registry: Box::new(ElementwiseRegistry::default()),
            config: LowerConfig::default(),
            output: None,
            expected_shape: None,
        }
    }

    /// Adds an array parameter.
    pub fn array(mut self, name: &str, shape: impl Into<Shape>, dtype: DType) -> Self {
        self.contexts.insert_buffer(Buffer::new(name, shape.into(), dtype));
        self
    }

    pub fn scalar(mut self, name: &str, dtype: DType) -> Self {
        self.contexts.insert_scalar(name, dtype);
        self
    }

    /// Binds a shape symbol to a scalar variable of the same name.
    pub fn symbol(mut self, name: &str) -> Self {
        self.symbols.bind_var(name, DType::Int64);
        self
    }

    /// Sets the output buffer.  The annotation matches it unless
    /// [`expected_shape`](Self::expected_shape) says otherwise.
    pub fn output(mut self, shape: impl Into<Shape>, dtype: DType) -> Self {
        self.output = Some((shape.into(), dtype));
        self
    }

    pub fn expected_shape(mut self, shape: impl Into<Shape>) -> Self {
        self.expected_shape = Some(shape.into());
        self
    }

    pub fn registry(mut self, registry: impl OperatorRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn config(mut self, config: LowerConfig) -> Self {
        self.config = config;
        self
    }

    /// Lowers a kernel whose body is `body`.
    ///
    /// Panics if no output was set.
    pub fn lower(&self, body: Stmt) -> Result<ComputeBlock> {
        let (shape, dtype) = self.output.clone().expect("fixture has no output");
        let output = Rc::new(Buffer::new(OUTPUT, shape.clone(), dtype));
        let kernel = KernelDef {
            name: self.name.clone(),
            output,
            expected_shape: self.expected_shape.clone().unwrap_or(shape),
            body,
        };
        let env = LowerEnv {
            contexts: &self.contexts,
            symbols: &self.symbols,
            registry: self.registry.as_ref(),
        };
        lower_kernel(&kernel, &env, &self.config)
    }

    /// Lowers `return expr`.
    pub fn lower_expr(&self, expr: Expr) -> Result<ComputeBlock> {
        self.lower(Stmt::Return(Some(expr)))
    }
}
