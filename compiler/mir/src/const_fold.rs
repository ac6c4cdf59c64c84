use ast::{BinaryOp, Expr, UnaryOp};

/// Evaluates a static initializer at compile time over 64-bit two's-complement
/// values. Returns None for anything that is not a constant expression.
///
/// `&&`, `||`, and `?:` are folded strictly (every operand evaluated).
/// Division or remainder by zero folds to zero.
pub fn const_eval(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Constant(c) => Some(c.as_i64()),
        Expr::Unary { op, expr } => {
            let value = const_eval(expr)?;

            Some(match op {
                UnaryOp::Negate => value.wrapping_neg(),
                UnaryOp::Complement => !value,
                UnaryOp::Not => (value == 0) as i64,
            })
        }
        Expr::Binary { op, left, right } => {
            let left = const_eval(left)?;
            let right = const_eval(right)?;

            Some(match op {
                BinaryOp::Add => left.wrapping_add(right),
                BinaryOp::Subtract => left.wrapping_sub(right),
                BinaryOp::Multiply => left.wrapping_mul(right),
                BinaryOp::Divide => {
                    if right == 0 {
                        0
                    } else {
                        left.wrapping_div(right)
                    }
                }
                BinaryOp::Modulo => {
                    if right == 0 {
                        0
                    } else {
                        left.wrapping_rem(right)
                    }
                }

                BinaryOp::And => (left != 0 && right != 0) as i64,
                BinaryOp::Or => (left != 0 || right != 0) as i64,
                BinaryOp::Equal => (left == right) as i64,
                BinaryOp::NotEqual => (left != right) as i64,
                BinaryOp::Less => (left < right) as i64,
                BinaryOp::LessEqual => (left <= right) as i64,
                BinaryOp::Greater => (left > right) as i64,
                BinaryOp::GreaterEqual => (left >= right) as i64,

                BinaryOp::BitwiseAnd => left & right,
                BinaryOp::BitwiseOr => left | right,
                BinaryOp::BitwiseXor => left ^ right,
                BinaryOp::BitshiftLeft => left.wrapping_shl(right as u32),
                BinaryOp::BitshiftRight => left.wrapping_shr(right as u32),
            })
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let condition = const_eval(condition)?;
            let then = const_eval(then)?;
            let otherwise = const_eval(otherwise)?;

            Some(if condition != 0 { then } else { otherwise })
        }
        Expr::Var(_)
        | Expr::Assignment { .. }
        | Expr::FunctionCall { .. }
        | Expr::PostfixInc(_)
        | Expr::PostfixDec(_) => None,
    }
}
