// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The expression and statement tree handed to us by the front-end.
//!
//! The tree mirrors the host-language AST closely enough that the front-end
//! can translate node for node, including node kinds kernels may not use.
//! Rejecting those is the lowerer's job, not the parser's.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::ir::DType;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    /// The operator's name as used for registry lookups.
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mult => "Mult",
            BinaryOp::Div => "Div",
            BinaryOp::FloorDiv => "FloorDiv",
            BinaryOp::Mod => "Mod",
            BinaryOp::Pow => "Pow",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mult => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }

    // higher the precedence, the tighter the binding.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mult | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => 5,
            BinaryOp::Pow => 6,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

impl CmpOp {
    pub fn name(&self) -> &'static str {
        match self {
            CmpOp::Eq => "Eq",
            CmpOp::NotEq => "NotEq",
            CmpOp::Lt => "Lt",
            CmpOp::LtE => "LtE",
            CmpOp::Gt => "Gt",
            CmpOp::GtE => "GtE",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum UnaryOp {
    UAdd,
    USub,
    Not,
    Invert,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::UAdd => "+",
            UnaryOp::USub => "-",
            UnaryOp::Not => "not ",
            UnaryOp::Invert => "~",
        }
    }

    /// The element type produced by applying this operator to `dtype`.
    pub fn result_dtype(&self, dtype: DType) -> DType {
        match self {
            UnaryOp::Not => DType::Bool,
            UnaryOp::UAdd | UnaryOp::USub | UnaryOp::Invert => dtype,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
}

impl Constant {
    pub fn dtype(&self) -> DType {
        match self {
            Constant::Int(_) => DType::Int64,
            Constant::Float(_) => DType::Float64,
            Constant::Bool(_) => DType::Bool,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Expr {
    BinOp(BinaryOp, Box<Expr>, Box<Expr>),
    UnaryOp(UnaryOp, Box<Expr>),
    /// `left op0 c0 op1 c1 ...`; kernels only accept a single comparator.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    Name(String),
    Constant(Constant),

    // the remaining node kinds are produced by the front-end but
    // are not part of the kernel grammar.
    BoolOp(Vec<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
}

impl Expr {
    /// The node kind, named the way the host language names it.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::BinOp(_, _, _) => "BinOp",
            Expr::UnaryOp(_, _) => "UnaryOp",
            Expr::Compare(_, _) => "Compare",
            Expr::Name(_) => "Name",
            Expr::Constant(_) => "Constant",
            Expr::BoolOp(_) => "BoolOp",
            Expr::IfExp { .. } => "IfExp",
            Expr::Call { .. } => "Call",
            Expr::Attribute { .. } => "Attribute",
            Expr::Subscript { .. } => "Subscript",
            Expr::Lambda { .. } => "Lambda",
            Expr::Tuple(_) => "Tuple",
            Expr::List(_) => "List",
        }
    }

    pub fn name(id: &str) -> Self {
        Expr::Name(id.to_owned())
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant(Constant::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Constant(Constant::Float(OrderedFloat(value)))
    }

    pub fn binop(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinOp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnaryOp(op, Box::new(operand))
    }

    pub fn compare(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare(Box::new(lhs), vec![(op, rhs)])
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Stmt {
    Return(Option<Expr>),
    Assign {
        target: String,
        value: Expr,
    },
    Expr(Expr),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    Pass,
}

impl Stmt {
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Return(_) => "Return",
            Stmt::Assign { .. } => "Assign",
            Stmt::Expr(_) => "Expr",
            Stmt::If { .. } => "If",
            Stmt::For { .. } => "For",
            Stmt::While { .. } => "While",
            Stmt::Pass => "Pass",
        }
    }
}

#[test]
fn test_expr_kind() {
    let expr = Expr::binop(BinaryOp::Add, Expr::name("x"), Expr::int(1));
    assert_eq!("BinOp", expr.kind());

    let expr = Expr::IfExp {
        test: Box::new(Expr::name("c")),
        body: Box::new(Expr::name("a")),
        orelse: Box::new(Expr::name("b")),
    };
    assert_eq!("IfExp", expr.kind());

    assert_eq!("Return", Stmt::Return(None).kind());
    assert_eq!("Pass", Stmt::Pass.kind());
}

#[test]
fn test_unary_result_dtype() {
    assert_eq!(DType::Bool, UnaryOp::Not.result_dtype(DType::Float32));
    assert_eq!(DType::Float32, UnaryOp::USub.result_dtype(DType::Float32));
    assert_eq!(DType::Int32, UnaryOp::Invert.result_dtype(DType::Int32));
}
