use std::{cmp::Ordering, fmt, sync::Arc};

use crate::{Value, ValueError, value::integral_float};

/// Binary operators over [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    And,
    Or,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    pub fn apply(self, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
        match self {
            BinaryOp::Add => add(lhs, rhs),
            BinaryOp::Sub | BinaryOp::Mul => arithmetic(self, lhs, rhs),
            BinaryOp::Div | BinaryOp::Mod => divide(self, lhs, rhs),
            BinaryOp::Exp => match (lhs.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
                _ => Err(self.type_error(lhs, rhs)),
            },
            BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
                (&Value::Bool(a), &Value::Bool(b)) => {
                    Ok(Value::Bool(if self == BinaryOp::And { a && b } else { a || b }))
                }
                _ => Err(self.type_error(lhs, rhs)),
            },
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = compare(lhs, rhs).ok_or_else(|| self.type_error(lhs, rhs))?;
                Ok(Value::Bool(ordering.is_some_and(match self {
                    BinaryOp::Lt => Ordering::is_lt,
                    BinaryOp::Le => Ordering::is_le,
                    BinaryOp::Gt => Ordering::is_gt,
                    _ => Ordering::is_ge,
                })))
            }
            BinaryOp::Eq => Ok(Value::Bool(lhs.equals(rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!lhs.equals(rhs))),
        }
    }

    fn type_error(self, lhs: &Value, rhs: &Value) -> ValueError {
        ValueError::type_error(self.symbol(), lhs, Some(rhs))
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators over [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }

    pub fn apply(self, operand: &Value) -> Result<Value, ValueError> {
        match (self, operand) {
            (UnaryOp::Neg, &Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
            (UnaryOp::Neg, &Value::Float(x)) => Ok(Value::Float(-x)),
            (UnaryOp::Not, &Value::Bool(b)) => Ok(Value::Bool(!b)),
            _ => Err(ValueError::type_error(self.symbol(), operand, None)),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ── Numeric promotion ──────────────────────────────────────────────

/// Operand pair after promotion: two ints stay ints, anything involving
/// a float becomes a float pair.
enum Numeric {
    Int(i64, i64),
    Float(f64, f64),
}

fn numeric(lhs: &Value, rhs: &Value) -> Option<Numeric> {
    match (lhs, rhs) {
        (&Value::Int(a), &Value::Int(b)) => Some(Numeric::Int(a, b)),
        _ => Some(Numeric::Float(float_operand(lhs)?, float_operand(rhs)?)),
    }
}

fn float_operand(value: &Value) -> Option<f64> {
    match *value {
        Value::Int(n) => Some(n as f64),
        Value::Float(x) => Some(x),
        _ => None,
    }
}

fn is_zero(value: &Value) -> bool {
    match *value {
        Value::Int(n) => n == 0,
        Value::Float(x) => x == 0.0,
        _ => false,
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
    if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
        let mut joined = String::with_capacity(a.len() + b.len());
        joined.push_str(a);
        joined.push_str(b);
        return Ok(Value::String(joined));
    }
    arithmetic(BinaryOp::Add, lhs, rhs)
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
    let result = match numeric(lhs, rhs).ok_or_else(|| op.type_error(lhs, rhs))? {
        Numeric::Int(a, b) => Value::Int(match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            _ => a.wrapping_mul(b),
        }),
        Numeric::Float(a, b) => Value::Float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            _ => a * b,
        }),
    };
    Ok(result)
}

/// `/` and `%`. The zero check runs before any arithmetic.
fn divide(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
    let pair = numeric(lhs, rhs).ok_or_else(|| op.type_error(lhs, rhs))?;
    if is_zero(rhs) {
        return Err(ValueError::DivisionByZero { op: op.symbol() });
    }
    let result = match (op, pair) {
        (BinaryOp::Div, Numeric::Int(a, b)) => Value::Int(a.wrapping_div(b)),
        (BinaryOp::Div, Numeric::Float(a, b)) => Value::Float(a / b),
        (_, Numeric::Int(a, b)) => Value::Int(a.wrapping_rem(b)),
        // f64 `%` truncates toward zero, same as fmod.
        (_, Numeric::Float(a, b)) => Value::Float(a % b),
    };
    Ok(result)
}

/// Ordering for numeric/numeric and string/string pairs. The outer `None`
/// means the pair is not comparable; the inner one means a NaN operand,
/// which makes every ordering comparison false.
fn compare(lhs: &Value, rhs: &Value) -> Option<Option<Ordering>> {
    if let (Value::String(a), Value::String(b)) = (lhs, rhs) {
        return Some(Some(a.cmp(b)));
    }
    match numeric(lhs, rhs)? {
        Numeric::Int(a, b) => Some(Some(a.cmp(&b))),
        Numeric::Float(a, b) => Some(a.partial_cmp(&b)),
    }
}

// ── Equality ───────────────────────────────────────────────────────

impl Value {
    /// `==` semantics. Never fails: values of unrelated variants are simply
    /// unequal. Int and Float compare by exact numeric value and containers
    /// compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (&Value::Int(n), &Value::Float(x)) | (&Value::Float(x), &Value::Int(n)) => {
                integral_float(x) == Some(n)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Container(a), Value::Container(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn binary(&self, op: BinaryOp, rhs: &Value) -> Result<Value, ValueError> {
        op.apply(self, rhs)
    }

    pub fn unary(&self, op: UnaryOp) -> Result<Value, ValueError> {
        op.apply(self)
    }

    pub fn pow(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Exp.apply(self, rhs)
    }

    pub fn lt(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Lt.apply(self, rhs)
    }

    pub fn le(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Le.apply(self, rhs)
    }

    pub fn gt(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Gt.apply(self, rhs)
    }

    pub fn ge(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Ge.apply(self, rhs)
    }

    pub fn and(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::And.apply(self, rhs)
    }

    pub fn or(&self, rhs: &Value) -> Result<Value, ValueError> {
        BinaryOp::Or.apply(self, rhs)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

// NaN floats break reflexivity; the literal pool keys floats by bit pattern
// instead of relying on this impl.
impl Eq for Value {}

macro_rules! value_binop {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl std::ops::$trait<&Value> for &Value {
                type Output = Result<Value, ValueError>;

                fn $method(self, rhs: &Value) -> Self::Output {
                    BinaryOp::$op.apply(self, rhs)
                }
            }
        )*
    };
}

value_binop! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Mod,
}

impl std::ops::Neg for &Value {
    type Output = Result<Value, ValueError>;

    fn neg(self) -> Self::Output {
        UnaryOp::Neg.apply(self)
    }
}

impl std::ops::Not for &Value {
    type Output = Result<Value, ValueError>;

    fn not(self) -> Self::Output {
        UnaryOp::Not.apply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapDescriptor, TypeTag, VectorDescriptor};

    fn map() -> Value {
        Value::from(MapDescriptor::new(TypeTag::Int))
    }

    fn vector() -> Value {
        Value::from(VectorDescriptor::new(TypeTag::Int))
    }

    #[test]
    fn arithmetic_promotes_mixed_numerics() {
        assert_eq!((&Value::Int(2) + &Value::Int(3)).unwrap(), Value::Int(5));
        assert!(matches!(
            &Value::Int(2) + &Value::Float(0.5),
            Ok(Value::Float(x)) if x == 2.5
        ));
        assert!(matches!(
            &Value::Float(1.5) * &Value::Int(2),
            Ok(Value::Float(x)) if x == 3.0
        ));
        assert_eq!((&Value::Int(7) - &Value::Int(10)).unwrap(), Value::Int(-3));
    }

    #[test]
    fn plus_concatenates_strings_only() {
        assert_eq!(
            (&Value::from("ab") + &Value::from("cd")).unwrap(),
            Value::from("abcd")
        );
        assert!(matches!(
            &Value::from("ab") - &Value::from("cd"),
            Err(ValueError::TypeError { op: "-", .. })
        ));
        assert!((&Value::from("ab") + &Value::Int(1)).is_err());
    }

    #[test]
    fn division_by_zero_is_checked_for_every_numeric_mix() {
        let zero_cases = [
            (Value::Int(5), Value::Int(0)),
            (Value::Float(5.0), Value::Int(0)),
            (Value::Int(5), Value::Float(0.0)),
            (Value::Float(5.0), Value::Float(-0.0)),
        ];
        for (lhs, rhs) in &zero_cases {
            assert_eq!(
                (lhs / rhs).unwrap_err(),
                ValueError::DivisionByZero { op: "/" },
                "{lhs} / {rhs}"
            );
            assert_eq!(
                (lhs % rhs).unwrap_err(),
                ValueError::DivisionByZero { op: "%" },
                "{lhs} % {rhs}"
            );
        }
    }

    #[test]
    fn remainder_is_integer_or_fmod() {
        assert_eq!((&Value::Int(7) % &Value::Int(3)).unwrap(), Value::Int(1));
        assert_eq!((&Value::Int(-7) % &Value::Int(3)).unwrap(), Value::Int(-1));
        assert!(matches!(
            &Value::Float(7.5) % &Value::Int(2),
            Ok(Value::Float(x)) if x == 1.5
        ));
        assert_eq!((&Value::Int(7) / &Value::Int(2)).unwrap(), Value::Int(3));
    }

    #[test]
    fn exponent_always_yields_float() {
        assert!(matches!(
            Value::Int(2).pow(&Value::Int(10)),
            Ok(Value::Float(x)) if x == 1024.0
        ));
        assert!(Value::from("2").pow(&Value::Int(1)).is_err());
    }

    #[test]
    fn bool_is_only_accepted_by_logic() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(t.and(&f).unwrap(), Value::Bool(false));
        assert_eq!(t.or(&f).unwrap(), Value::Bool(true));
        assert_eq!((!&t).unwrap(), Value::Bool(false));

        assert!((&t + &Value::Int(1)).is_err());
        assert!(t.lt(&f).is_err());
        assert!(Value::Int(1).and(&t).is_err());
        assert!((-&t).is_err());
        assert!((!&Value::Int(0)).is_err());
    }

    #[test]
    fn ordering_requires_comparable_operands() {
        assert_eq!(Value::Int(1).lt(&Value::Float(1.5)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from("b").ge(&Value::from("a")).unwrap(), Value::Bool(true));
        assert_eq!(Value::Int(2).le(&Value::Int(2)).unwrap(), Value::Bool(true));

        assert!(matches!(
            map().lt(&vector()),
            Err(ValueError::TypeError { op: "<", lhs: TypeTag::Map, rhs: Some(TypeTag::List) })
        ));
        assert!(Value::Int(1).gt(&Value::from("1")).is_err());
    }

    #[test]
    fn nan_orders_as_false_both_ways() {
        let nan = Value::Float(f64::NAN);
        for other in [Value::Float(1.0), Value::Int(1), Value::Float(f64::NAN)] {
            for op in [BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge] {
                assert_eq!(nan.binary(op, &other).unwrap(), Value::Bool(false), "{op:?}");
                assert_eq!(other.binary(op, &nan).unwrap(), Value::Bool(false), "{op:?}");
            }
        }
        assert_eq!(nan.binary(BinaryOp::Ne, &nan).unwrap(), Value::Bool(true));
    }

    #[test]
    fn equality_never_fails() {
        let m = map();
        let v = vector();
        assert_eq!(m.binary(BinaryOp::Eq, &v).unwrap(), Value::Bool(false));
        assert_eq!(m.binary(BinaryOp::Ne, &v).unwrap(), Value::Bool(true));

        assert_eq!(
            Value::Int(1).binary(BinaryOp::Eq, &Value::from("1")).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Value::Bool(true).binary(BinaryOp::Eq, &Value::Int(1)).unwrap(),
            Value::Bool(false)
        );
        assert!(Value::Void.equals(&Value::Void));
    }

    #[test]
    fn numeric_equality_crosses_variants_exactly() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).equals(&Value::Float(2.5)));
        // 2^53 + 1 has no exact f64 twin.
        let big = (1i64 << 53) + 1;
        assert!(!Value::Int(big).equals(&Value::Float(big as f64)));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = vector();
        let b = vector();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn unary_minus_negates_numbers() {
        assert_eq!((-&Value::Int(4)).unwrap(), Value::Int(-4));
        assert!(matches!(-&Value::Float(0.5), Ok(Value::Float(x)) if x == -0.5));
        assert!(matches!(
            Value::from("x").unary(UnaryOp::Neg),
            Err(ValueError::TypeError { op: "-", rhs: None, .. })
        ));
    }
}
