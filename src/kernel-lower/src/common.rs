// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyReturn,
    UnsupportedSyntax,
    UnsupportedOperand,
    ShapeMismatch,
    UnboundSymbol,
    UnknownName,
}

impl ErrorCode {
    pub fn kind(&self) -> ErrorKind {
        use ErrorCode::*;
        match self {
            EmptyReturn | UnsupportedSyntax => ErrorKind::Syntax,
            UnsupportedOperand | UnknownName => ErrorKind::Type,
            ShapeMismatch | UnboundSymbol => ErrorKind::Shape,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            EmptyReturn => "empty_return",
            UnsupportedSyntax => "unsupported_syntax",
            UnsupportedOperand => "unsupported_operand",
            ShapeMismatch => "shape_mismatch",
            UnboundSymbol => "unbound_symbol",
            UnknownName => "unknown_name",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Type,
    Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }

    /// Prefixes the details with the kernel being lowered, so the driver
    /// can report which function definition failed.
    pub fn with_kernel(self, kernel: &str) -> Self {
        let details = match self.details {
            Some(details) => format!("in kernel '{kernel}': {details}"),
            None => format!("in kernel '{kernel}'"),
        };
        Error {
            details: Some(details),
            ..self
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Syntax => "KernelSyntaxError",
            ErrorKind::Type => "KernelTypeError",
            ErrorKind::Shape => "KernelShapeError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! lower_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode};
        Err(Error::new(
            ErrorCode::$code.kind(),
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode};
        Err(Error::new(ErrorCode::$code.kind(), ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err: Result<()> = lower_err!(ShapeMismatch, "(3,) vs (4,)".to_owned());
    let err = err.unwrap_err();
    assert_eq!(ErrorKind::Shape, err.kind);
    assert_eq!(
        "KernelShapeError{shape_mismatch: (3,) vs (4,)}",
        format!("{err}")
    );

    let err: Result<()> = lower_err!(EmptyReturn);
    let err = err.unwrap_err();
    assert_eq!(ErrorKind::Syntax, err.kind);
    assert_eq!("KernelSyntaxError{empty_return}", format!("{err}"));
}

#[test]
fn test_with_kernel() {
    let err: Result<()> = lower_err!(UnknownName, "'z' is not defined".to_owned());
    let err = err.unwrap_err().with_kernel("add");
    assert_eq!(ErrorCode::UnknownName, err.code);
    assert_eq!(
        Some("in kernel 'add': 'z' is not defined".to_owned()),
        err.get_details()
    );

    let err: Result<()> = lower_err!(EmptyReturn);
    let err = err.unwrap_err().with_kernel("add");
    assert_eq!(Some("in kernel 'add'".to_owned()), err.details);
}
