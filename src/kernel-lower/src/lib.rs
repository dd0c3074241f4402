// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;

pub mod ast;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod ir;
mod lower;
pub mod pretty;
pub mod registry;
pub mod shape;
#[cfg(any(test, feature = "testing"))]
pub mod test_common;

pub use self::ast::{BinaryOp, CmpOp, Constant, Expr, Stmt, UnaryOp};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::config::LowerConfig;
pub use self::context::{ArrayContext, ArrayType, Buffer, ContextEntry, ContextTable, Operand};
pub use self::dispatch::{ElementwiseOp, OperatorInstance, OperatorRegistry};
pub use self::ir::{BufferRegion, BufferStore, ComputeBlock, DType, IrExpr, IterVar, PrimVar, RangeExpr};
pub use self::lower::{KernelDef, LowerEnv, lower_kernel};
pub use self::registry::ElementwiseRegistry;
pub use self::shape::{Dim, Shape, SymbolTable};
