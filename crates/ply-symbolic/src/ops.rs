//! Operator attribute names and the operator overloads that emit them.
//!
//! `a + b` on a symbolic `a` becomes `getattr(a, "add")(b)`; a primitive on
//! the left, as in `2 * a`, becomes `getattr(a, "rmul")(2)`. Hosts answer
//! these names in [`Dynamic::get_attr`](crate::Dynamic::get_attr).

use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub};

use crate::{Expression, Operand};

pub const ADD: &str = "add";
pub const RADD: &str = "radd";
pub const SUB: &str = "sub";
pub const RSUB: &str = "rsub";
pub const MUL: &str = "mul";
pub const RMUL: &str = "rmul";
pub const DIV: &str = "div";
pub const RDIV: &str = "rdiv";
pub const REM: &str = "rem";
pub const RREM: &str = "rrem";
pub const POW: &str = "pow";
pub const RPOW: &str = "rpow";
pub const NEG: &str = "neg";
pub const INVERT: &str = "invert";
pub const ABS: &str = "abs";
pub const AND: &str = "and";
pub const RAND: &str = "rand";
pub const OR: &str = "or";
pub const ROR: &str = "ror";
pub const GT: &str = "gt";
pub const GE: &str = "ge";
pub const LT: &str = "lt";
pub const LE: &str = "le";
pub const EQ: &str = "eq";
pub const NE: &str = "ne";
pub const GETITEM: &str = "getitem";

/// Reflected name of a binary operator, if it has one.
#[must_use]
pub fn reflected(name: &str) -> Option<&'static str> {
    Some(match name {
        ADD => RADD,
        SUB => RSUB,
        MUL => RMUL,
        DIV => RDIV,
        REM => RREM,
        POW => RPOW,
        AND => RAND,
        OR => ROR,
        _ => return None,
    })
}

macro_rules! binary_operator {
    ($($trait:ident :: $method:ident => $name:ident),+ $(,)?) => {$(
        impl<V, R: Into<Operand<V>>> $trait<R> for Expression<V> {
            type Output = Expression<V>;

            fn $method(self, rhs: R) -> Expression<V> {
                self.method($name, vec![rhs.into()])
            }
        }

        impl<V, R: Into<Operand<V>>> $trait<R> for &Expression<V> {
            type Output = Expression<V>;

            fn $method(self, rhs: R) -> Expression<V> {
                self.method($name, vec![rhs.into()])
            }
        }
    )+};
}

binary_operator! {
    Add::add => ADD,
    Sub::sub => SUB,
    Mul::mul => MUL,
    Div::div => DIV,
    Rem::rem => REM,
    BitAnd::bitand => AND,
    BitOr::bitor => OR,
}

macro_rules! reflected_operator {
    ($prim:ty: $($trait:ident :: $method:ident => $name:ident),+ $(,)?) => {$(
        impl<V> $trait<Expression<V>> for $prim
        where
            Operand<V>: From<$prim>,
        {
            type Output = Expression<V>;

            fn $method(self, rhs: Expression<V>) -> Expression<V> {
                rhs.method($name, vec![Operand::from(self)])
            }
        }

        impl<V> $trait<&Expression<V>> for $prim
        where
            Operand<V>: From<$prim>,
        {
            type Output = Expression<V>;

            fn $method(self, rhs: &Expression<V>) -> Expression<V> {
                rhs.method($name, vec![Operand::from(self)])
            }
        }
    )+};
}

reflected_operator!(i32: Add::add => RADD, Sub::sub => RSUB, Mul::mul => RMUL, Div::div => RDIV, Rem::rem => RREM);
reflected_operator!(i64: Add::add => RADD, Sub::sub => RSUB, Mul::mul => RMUL, Div::div => RDIV, Rem::rem => RREM);
reflected_operator!(f64: Add::add => RADD, Sub::sub => RSUB, Mul::mul => RMUL, Div::div => RDIV, Rem::rem => RREM);
reflected_operator!(bool: BitAnd::bitand => RAND, BitOr::bitor => ROR);

impl<V> Neg for Expression<V> {
    type Output = Expression<V>;

    fn neg(self) -> Expression<V> {
        self.method(NEG, Vec::new())
    }
}

impl<V> Neg for &Expression<V> {
    type Output = Expression<V>;

    fn neg(self) -> Expression<V> {
        self.method(NEG, Vec::new())
    }
}

impl<V> Not for Expression<V> {
    type Output = Expression<V>;

    fn not(self) -> Expression<V> {
        self.method(INVERT, Vec::new())
    }
}

impl<V> Not for &Expression<V> {
    type Output = Expression<V>;

    fn not(self) -> Expression<V> {
        self.method(INVERT, Vec::new())
    }
}

/// Builders for operators Rust cannot overload with a non-`bool` result.
impl<V> Expression<V> {
    #[must_use]
    pub fn gt(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(GT, vec![rhs.into()])
    }

    #[must_use]
    pub fn ge(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(GE, vec![rhs.into()])
    }

    #[must_use]
    pub fn lt(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(LT, vec![rhs.into()])
    }

    #[must_use]
    pub fn le(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(LE, vec![rhs.into()])
    }

    #[must_use]
    pub fn eq_to(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(EQ, vec![rhs.into()])
    }

    #[must_use]
    pub fn ne_to(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(NE, vec![rhs.into()])
    }

    #[must_use]
    pub fn pow(&self, rhs: impl Into<Operand<V>>) -> Self {
        self.method(POW, vec![rhs.into()])
    }

    /// `self[key]`.
    #[must_use]
    pub fn item(&self, key: impl Into<Operand<V>>) -> Self {
        self.method(GETITEM, vec![key.into()])
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        self.method(ABS, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::reflected;
    use crate::testing::Probe;
    use crate::{Context, EvalOptions, Expression, Kwargs, Operand, sym_call};

    fn sym(pos: usize) -> Expression<Probe> {
        Expression::symbol(pos)
    }

    #[test]
    fn arithmetic_desugars_to_attribute_call() {
        let x = sym(0);
        assert_eq!((&x + 1_i64).to_string(), "getattr(Symbol(0), \"add\")(1)");
        assert_eq!((&x - &x).to_string(), "getattr(Symbol(0), \"sub\")(Symbol(0))");
        assert_eq!((-&x).to_string(), "getattr(Symbol(0), \"neg\")()");
        assert_eq!((!x).to_string(), "getattr(Symbol(0), \"invert\")()");
    }

    #[test]
    fn primitive_left_operands_use_reflected_names() {
        let x = sym(0);
        assert_eq!((2_i64 * &x).to_string(), "getattr(Symbol(0), \"rmul\")(2)");
        assert_eq!((1.5 - x.clone()).to_string(), "getattr(Symbol(0), \"rsub\")(1.5)");
        assert_eq!((true & x).to_string(), "getattr(Symbol(0), \"rand\")(true)");
    }

    #[test]
    fn comparison_and_item_builders() {
        let x = sym(0);
        assert_eq!(x.attr("x").gt(1_i64).to_string(), "getattr(getattr(Symbol(0), \"x\"), \"gt\")(1)");
        assert_eq!(x.item("col").to_string(), "getattr(Symbol(0), \"getitem\")(\"col\")");
        assert_eq!(x.eq_to(3_i64).to_string(), "getattr(Symbol(0), \"eq\")(3)");
    }

    #[test]
    fn operators_evaluate_through_the_host() {
        let x = sym(0);
        let y = sym(1);
        let expr = (&x * 2_i64 + 1_i64) / (10_i64 - &y);
        let ctx = Context::new()
            .bind(0_usize, Probe::Num(3.0))
            .bind(1_usize, Probe::Num(8.0));
        let out = expr.eval(&ctx, EvalOptions::default()).expect("eval");
        assert_eq!(out.as_num(), Some(3.5));
    }

    #[test]
    fn pythagoras_through_a_deferred_function() {
        let x = sym(0);
        let y = sym(1);
        let expr = sym_call(
            Operand::Literal(Probe::Native("sqrt", f64::sqrt)),
            vec![(x.pow(2_i64) + y.pow(2_i64)).into()],
            Kwargs::new(),
        );
        assert_eq!(
            expr.to_string(),
            "sqrt(getattr(getattr(Symbol(0), \"pow\")(2), \"add\")(getattr(Symbol(1), \"pow\")(2)))"
        );
        let ctx = Context::new()
            .bind(0_usize, Probe::Num(3.0))
            .bind(1_usize, Probe::Num(4.0));
        let out = expr.eval(&ctx, EvalOptions::default()).expect("eval");
        assert_eq!(out.as_num(), Some(5.0));
    }

    #[test]
    fn reflected_names_pair_up() {
        assert_eq!(reflected(super::ADD), Some(super::RADD));
        assert_eq!(reflected(super::OR), Some(super::ROR));
        assert_eq!(reflected(super::GT), None);
    }
}
