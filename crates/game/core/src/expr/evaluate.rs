//! Tree-walking evaluation of parsed formulas.

use super::error::EvalErrorKind;
use super::{BinaryOp, Bindings, Function, Node, UnaryOp, truthy};

// ============================================================================
// Node Evaluation
// ============================================================================

/// Evaluates `node` against `bindings`.
///
/// `&&`, `||` and the conditional evaluate their right-hand side only when it
/// decides the result, so an unbound name in an untaken branch is not an
/// error.
pub(crate) fn eval_node(node: &Node, bindings: &Bindings) -> Result<f64, EvalErrorKind> {
    let value = match node {
        Node::Number(value) => *value,

        Node::Variable(name) => bindings
            .get(name)
            .ok_or_else(|| EvalErrorKind::UnknownVariable { name: name.clone() })?,

        Node::Unary { op, operand } => {
            let value = eval_node(operand, bindings)?;
            match op {
                UnaryOp::Neg => -value,
                UnaryOp::Plus => value,
                UnaryOp::Not => from_bool(!truthy(value)),
            }
        }

        Node::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => from_bool(truthy(eval_node(lhs, bindings)?) && truthy(eval_node(rhs, bindings)?)),

        Node::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => from_bool(truthy(eval_node(lhs, bindings)?) || truthy(eval_node(rhs, bindings)?)),

        Node::Binary { op, lhs, rhs } => {
            let lhs = eval_node(lhs, bindings)?;
            let rhs = eval_node(rhs, bindings)?;
            apply_binary(*op, lhs, rhs)?
        }

        Node::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(eval_node(condition, bindings)?) {
                eval_node(then, bindings)?
            } else {
                eval_node(otherwise, bindings)?
            }
        }

        Node::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| eval_node(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            call(*function, &values)
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalErrorKind::NotFinite)
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalErrorKind> {
    let value = match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => lhs / nonzero(rhs)?,
        BinaryOp::FloorDiv => (lhs / nonzero(rhs)?).floor(),
        BinaryOp::Mod => floored_mod(lhs, nonzero(rhs)?),
        BinaryOp::Lt => from_bool(lhs < rhs),
        BinaryOp::Le => from_bool(lhs <= rhs),
        BinaryOp::Gt => from_bool(lhs > rhs),
        BinaryOp::Ge => from_bool(lhs >= rhs),
        BinaryOp::Eq => from_bool(lhs == rhs),
        BinaryOp::Ne => from_bool(lhs != rhs),
        BinaryOp::And => from_bool(truthy(lhs) && truthy(rhs)),
        BinaryOp::Or => from_bool(truthy(lhs) || truthy(rhs)),
    };
    Ok(value)
}

/// Applies a built-in. Arity was checked by the parser.
fn call(function: Function, args: &[f64]) -> f64 {
    match function {
        Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Function::Abs => args[0].abs(),
        Function::Floor => args[0].floor(),
        Function::Ceil => args[0].ceil(),
        Function::Round => args[0].round(),
        // `f64::clamp` panics on low > high; this saturates to `high` instead.
        Function::Clamp => args[0].max(args[1]).min(args[2]),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn nonzero(divisor: f64) -> Result<f64, EvalErrorKind> {
    if divisor == 0.0 {
        Err(EvalErrorKind::DivisionByZero)
    } else {
        Ok(divisor)
    }
}

/// Modulo whose result takes the divisor's sign.
fn floored_mod(lhs: f64, rhs: f64) -> f64 {
    let rem = lhs % rhs;
    if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
        rem + rhs
    } else {
        rem
    }
}

fn from_bool(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
