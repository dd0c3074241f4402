// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::ir::DType;

/// Knobs for lowering a kernel into a compute block.
#[derive(Clone, Debug)]
pub struct LowerConfig {
    /// Iteration variables are named `{prefix}{position}`.
    pub iter_var_prefix: String,
    /// Element type of iteration variables and range bounds.
    pub index_dtype: DType,
    /// Accept `return x` for a buffer `x`, lowering it to a copy.
    pub read_bare_outputs: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            iter_var_prefix: "__iter_".to_owned(),
            index_dtype: DType::Int64,
            read_bare_outputs: true,
        }
    }
}

impl LowerConfig {
    pub(crate) fn iter_var_name(&self, position: usize) -> String {
        format!("{}{}", self.iter_var_prefix, position)
    }
}

#[test]
fn test_iter_var_name() {
    let config = LowerConfig::default();
    assert_eq!("__iter_0", config.iter_var_name(0));
    let config = LowerConfig {
        iter_var_prefix: "i".to_owned(),
        ..LowerConfig::default()
    };
    assert_eq!("i2", config.iter_var_name(2));
}
