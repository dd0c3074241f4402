// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::ast::{BinaryOp, UnaryOp};
use crate::ir::{BufferRegion, BufferStore, ComputeBlock, IrExpr, RangeExpr};

/// Binding strength of the operator at the root of `expr`.  Unary minus
/// sits between `*` and `**`, and `not` binds looser than comparisons.
fn precedence(expr: &IrExpr) -> u8 {
    match expr {
        IrExpr::IntImm(_, _)
        | IrExpr::FloatImm(_, _)
        | IrExpr::BoolImm(_)
        | IrExpr::Var(_)
        | IrExpr::Load(_, _) => u8::MAX,
        IrExpr::Binary(op, _, _) => op.precedence() * 2,
        IrExpr::Compare(_, _, _) => 6,
        IrExpr::Unary(UnaryOp::Not, _) => 4,
        IrExpr::Unary(_, _) => 11,
    }
}

fn paren_if_necessary(needs_parens: bool, eqn: String) -> String {
    if needs_parens { format!("({eqn})") } else { eqn }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
    /// comparisons chain, so neither side may hold another comparison
    Neither,
}

fn pretty_binary(parent: u8, assoc: Assoc, lhs: &IrExpr, rhs: &IrExpr) -> (String, String) {
    // `a - (b - c)` keeps its parens, as does `(a ** b) ** c`
    let (lhs_prec, rhs_prec) = (precedence(lhs), precedence(rhs));
    let lhs_parens = match assoc {
        Assoc::Left => lhs_prec < parent,
        Assoc::Right | Assoc::Neither => lhs_prec <= parent,
    };
    let rhs_parens = match assoc {
        Assoc::Right => rhs_prec < parent,
        Assoc::Left | Assoc::Neither => rhs_prec <= parent,
    };
    (
        paren_if_necessary(lhs_parens, pretty(lhs)),
        paren_if_necessary(rhs_parens, pretty(rhs)),
    )
}

fn pretty_indices(indices: &[IrExpr]) -> String {
    if indices.is_empty() {
        return "()".to_owned();
    }
    let indices: Vec<String> = indices.iter().map(pretty).collect();
    indices.join(", ")
}

pub fn pretty(expr: &IrExpr) -> String {
    match expr {
        IrExpr::IntImm(n, _) => format!("{n}"),
        IrExpr::FloatImm(n, _) => format!("{:?}", n.into_inner()),
        IrExpr::BoolImm(true) => "True".to_owned(),
        IrExpr::BoolImm(false) => "False".to_owned(),
        IrExpr::Var(var) => var.name.clone(),
        IrExpr::Load(buffer, indices) => format!("{}[{}]", buffer.name(), pretty_indices(indices)),
        IrExpr::Binary(op, lhs, rhs) => {
            let assoc = if *op == BinaryOp::Pow { Assoc::Right } else { Assoc::Left };
            let (l, r) = pretty_binary(precedence(expr), assoc, lhs, rhs);
            format!("{} {} {}", l, op.symbol(), r)
        }
        IrExpr::Compare(op, lhs, rhs) => {
            let (l, r) = pretty_binary(precedence(expr), Assoc::Neither, lhs, rhs);
            format!("{} {} {}", l, op.symbol(), r)
        }
        IrExpr::Unary(op, operand) => {
            let operand_str = pretty(operand);
            let needs_parens = precedence(operand) < precedence(expr);
            format!("{}{}", op.symbol(), paren_if_necessary(needs_parens, operand_str))
        }
    }
}

fn pretty_range(range: &RangeExpr) -> String {
    format!("{}:{}", pretty(&range.start), pretty(&range.end))
}

fn pretty_region(region: &BufferRegion) -> String {
    let ranges: Vec<String> = region.region.iter().map(pretty_range).collect();
    format!("{}[{}]", region.buffer.name(), ranges.join(", "))
}

fn pretty_store(store: &BufferStore) -> String {
    format!(
        "{}[{}] = {}",
        store.buffer.name(),
        pretty_indices(&store.indices),
        pretty(&store.value)
    )
}

/// Renders a block as
///
/// ```text
/// block add(__iter_0 in [0, 4))
///   reads: x[0:4], y[0:4]
///   writes: out[0:4]
///   out[__iter_0] = x[__iter_0] + y[__iter_0]
/// ```
pub fn pretty_block(block: &ComputeBlock) -> String {
    let iter_vars: Vec<String> = block
        .iter_vars()
        .iter()
        .map(|iv| {
            format!(
                "{} in [{}, {})",
                iv.var.name,
                pretty(&iv.range.start),
                pretty(&iv.range.end)
            )
        })
        .collect();
    let reads: Vec<String> = block.reads().iter().map(pretty_region).collect();
    let writes: Vec<String> = block.writes().iter().map(pretty_region).collect();

    format!(
        "block {}({})\n  reads: {}\n  writes: {}\n  {}",
        block.name(),
        iter_vars.join(", "),
        reads.join(", "),
        writes.join(", "),
        pretty_store(block.body())
    )
}

impl fmt::Display for IrExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", pretty(self))
    }
}

impl fmt::Display for ComputeBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", pretty_block(self))
    }
}
