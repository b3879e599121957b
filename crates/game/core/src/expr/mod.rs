//! Sandboxed arithmetic formulas.
//!
//! Formulas drive enemy damage scaling, card magnitudes, effect conditions and
//! strategy rule guards. They are parsed once at setup into an [`Expr`] tree
//! and evaluated against a fresh [`Bindings`] table every time.
//!
//! The grammar is closed: numbers, identifiers, arithmetic, comparisons,
//! boolean connectives, a conditional and a small set of whitelisted
//! functions. Nothing else parses.
//!
//! ## Examples
//!
//! ```
//! use tinydeck_core::expr::{Bindings, Expr, FunctionWhitelist};
//!
//! let whitelist = FunctionWhitelist::from_names(["max"]).unwrap();
//! let expr = Expr::parse("max(turn * 2, 3)", &whitelist).unwrap();
//! let bindings = Bindings::new().with("turn", 1.0);
//! assert_eq!(expr.evaluate(&bindings).unwrap(), 3.0);
//! ```

mod bindings;
mod error;
mod evaluate;
mod lexer;
mod parser;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use bindings::Bindings;
pub use error::{EvalError, EvalErrorKind};

/// Maximum nesting depth accepted by the parser.
///
/// Parentheses, unary operators, function arguments, conditionals and each
/// additional operator in a chain all count one level.
pub const MAX_DEPTH: usize = 64;

// ============================================================================
// Syntax Tree
// ============================================================================

/// A parsed formula together with the text it was parsed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    source: String,
    root: Node,
}

/// Formula syntax tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Number(f64),

    /// Identifier resolved from the binding table at evaluation time.
    Variable(String),

    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    /// `condition ? then : otherwise`; only the chosen branch is evaluated.
    Conditional {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },

    Call {
        function: Function,
        args: Vec<Node>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `//`, rounds the quotient toward negative infinity.
    FloorDiv,
    /// `%`, result carries the divisor's sign.
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

// ============================================================================
// Functions
// ============================================================================

/// Built-in functions a formula may call once whitelisted.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Function {
    Min,
    Max,
    Abs,
    Floor,
    Ceil,
    Round,
    /// `clamp(value, low, high)`
    Clamp,
}

impl Function {
    /// Whether `count` arguments is acceptable for this function.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Function::Min | Function::Max => count >= 1,
            Function::Abs | Function::Floor | Function::Ceil | Function::Round => count == 1,
            Function::Clamp => count == 3,
        }
    }

    /// Arity as shown in error messages.
    pub fn expected_arity(self) -> &'static str {
        match self {
            Function::Min | Function::Max => "at least 1",
            Function::Abs | Function::Floor | Function::Ceil | Function::Round => "1",
            Function::Clamp => "3",
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Set of built-in functions a configuration allows formulas to call.
///
/// The default whitelist is empty: formulas are plain arithmetic unless the
/// configuration opts in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionWhitelist {
    allowed: BTreeSet<Function>,
}

impl FunctionWhitelist {
    /// Whitelist that rejects every call.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whitelist that accepts every built-in.
    pub fn all() -> Self {
        use strum::IntoEnumIterator;
        Self {
            allowed: Function::iter().collect(),
        }
    }

    /// Builds a whitelist from configured names.
    ///
    /// Fails with [`EvalErrorKind::UnknownFunction`] on a name that is not a
    /// built-in.
    pub fn from_names<I, S>(names: I) -> Result<Self, EvalErrorKind>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let function =
                Function::from_str(name).map_err(|_| EvalErrorKind::UnknownFunction {
                    name: name.to_string(),
                })?;
            allowed.insert(function);
        }
        Ok(Self { allowed })
    }

    pub fn allows(&self, function: Function) -> bool {
        self.allowed.contains(&function)
    }

    pub fn iter(&self) -> impl Iterator<Item = Function> + '_ {
        self.allowed.iter().copied()
    }
}

// ============================================================================
// Public API
// ============================================================================

impl Expr {
    /// Parses `source`, rejecting calls outside `whitelist`.
    pub fn parse(source: &str, whitelist: &FunctionWhitelist) -> Result<Self, EvalError> {
        let root = parser::parse(source, whitelist)
            .map_err(|kind| EvalError::new(source, kind))?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluates the formula against `bindings`.
    ///
    /// Fails when an identifier is unbound, on division or modulo by zero,
    /// and when any intermediate result is not finite.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<f64, EvalError> {
        evaluate::eval_node(&self.root, bindings)
            .map_err(|kind| EvalError::new(self.source.as_str(), kind))
    }

    /// Formula text as written in configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and evaluates `expression` in one step with every built-in allowed.
///
/// Configuration formulas go through [`Expr::parse`] instead so the
/// configured whitelist applies and parsing happens once.
pub fn evaluate(expression: &str, bindings: &Bindings) -> Result<f64, EvalError> {
    Expr::parse(expression, &FunctionWhitelist::all())?.evaluate(bindings)
}

/// Interprets a formula value as a boolean.
pub fn truthy(value: f64) -> bool {
    value != 0.0
}
