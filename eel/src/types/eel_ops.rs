use std::{
    cmp::Ordering,
    ops::{Add, Div, Mul, Not, Rem, Sub},
};

use super::eel_value::EelValue;
use crate::{EelError, EelResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f as i64,
        }
    }

    fn into_value(self) -> EelValue {
        match self {
            Number::Int(i) => EelValue::Int(i),
            Number::Float(f) => EelValue::Float(f),
        }
    }

    fn partial_cmp(self, rhs: Number) -> Option<Ordering> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let t = s.trim();
    if t.is_empty()
        || !t
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }

    if let Ok(i) = t.parse::<i64>() {
        return Some(Number::Int(i));
    }

    t.parse::<f64>().ok().map(Number::Float)
}

impl EelValue {
    fn as_number(&self) -> Option<Number> {
        match self {
            EelValue::Null => Some(Number::Int(0)),
            EelValue::Bool(b) => Some(Number::Int(*b as i64)),
            EelValue::Int(i) => Some(Number::Int(*i)),
            EelValue::Float(f) => Some(Number::Float(*f)),
            EelValue::String(s) => parse_numeric(s),
            _ => None,
        }
    }

    fn to_number(&self, op: &str) -> EelResult<Number> {
        self.as_number().ok_or_else(|| {
            EelError::Evaluation(format!(
                "Unsupported operand type {} for '{}'",
                self.type_name(),
                op
            ))
        })
    }

    /// Numeric value of scalars and numeric strings, as used by the math helpers.
    pub fn to_float(&self) -> EelResult<f64> {
        Ok(self.to_number("float conversion")?.as_f64())
    }

    /// Integer value of scalars and numeric strings; floats are truncated.
    pub fn to_int(&self) -> EelResult<i64> {
        Ok(self.to_number("integer conversion")?.as_i64())
    }

    /// True for ints, floats and strings holding a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, EelValue::Int(_) | EelValue::Float(_))
            || matches!(self, EelValue::String(s) if parse_numeric(s).is_some())
    }

    /// Type-exact equality. `1 == "1"` is false, `1 == 1.0` is false, lists and maps compare
    /// element by element in order, objects and functions by identity.
    pub fn strict_eq(&self, rhs: &EelValue) -> bool {
        match (self, rhs) {
            (EelValue::Null, EelValue::Null) => true,
            (EelValue::Bool(a), EelValue::Bool(b)) => a == b,
            (EelValue::Int(a), EelValue::Int(b)) => a == b,
            (EelValue::Float(a), EelValue::Float(b)) => a == b,
            (EelValue::String(a), EelValue::String(b)) => a == b,
            (EelValue::List(a), EelValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.strict_eq(y))
            }
            (EelValue::Map(a), EelValue::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.strict_eq(vb))
            }
            (EelValue::Object(a), EelValue::Object(b)) => {
                std::ptr::addr_eq(std::sync::Arc::as_ptr(a), std::sync::Arc::as_ptr(b))
            }
            (EelValue::Function(a), EelValue::Function(b)) => a.same_as(b),
            _ => false,
        }
    }

    pub fn eq_(&self, rhs: &EelValue) -> EelValue {
        EelValue::Bool(self.strict_eq(rhs))
    }

    pub fn neq(&self, rhs: &EelValue) -> EelValue {
        EelValue::Bool(!self.strict_eq(rhs))
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`. Numbers (and null/bool) compare numerically,
    /// numeric strings compare as numbers, other strings lexically. `None` means unordered
    /// (NaN involved).
    pub fn compare(&self, rhs: &EelValue) -> EelResult<Option<Ordering>> {
        match (self, rhs) {
            (EelValue::String(a), EelValue::String(b)) => {
                match (parse_numeric(a), parse_numeric(b)) {
                    (Some(x), Some(y)) => Ok(x.partial_cmp(y)),
                    _ => Ok(Some(a.cmp(b))),
                }
            }
            (EelValue::String(s), other) | (other, EelValue::String(s))
                if other.as_number().is_some() =>
            {
                let flipped = !matches!(self, EelValue::String(_));
                let ord = match parse_numeric(s) {
                    Some(n) => other.to_number("<")?.partial_cmp(n),
                    None => Some(other.to_string_value()?.as_str().cmp(s.as_str())),
                };

                // ord is computed as other <=> string
                Ok(if flipped { ord } else { ord.map(Ordering::reverse) })
            }
            (lhs, rhs) => match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => Ok(a.partial_cmp(b)),
                _ => Err(EelError::Evaluation(format!(
                    "Cannot compare {} with {}",
                    lhs.type_name(),
                    rhs.type_name()
                ))),
            },
        }
    }

    pub fn lt(&self, rhs: &EelValue) -> EelResult<EelValue> {
        Ok(EelValue::Bool(self.compare(rhs)? == Some(Ordering::Less)))
    }

    pub fn le(&self, rhs: &EelValue) -> EelResult<EelValue> {
        Ok(EelValue::Bool(matches!(
            self.compare(rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        )))
    }

    pub fn gt(&self, rhs: &EelValue) -> EelResult<EelValue> {
        Ok(EelValue::Bool(self.compare(rhs)? == Some(Ordering::Greater)))
    }

    pub fn ge(&self, rhs: &EelValue) -> EelResult<EelValue> {
        Ok(EelValue::Bool(matches!(
            self.compare(rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        )))
    }
}

impl Add for EelValue {
    type Output = EelResult<EelValue>;

    fn add(self, rhs: Self) -> Self::Output {
        if matches!(self, EelValue::String(_)) || matches!(rhs, EelValue::String(_)) {
            let mut res = self.to_string_value()?;
            res.push_str(&rhs.to_string_value()?);
            return Ok(EelValue::String(res));
        }

        match (self.to_number("+")?, rhs.to_number("+")?) {
            (Number::Int(a), Number::Int(b)) => Ok(a
                .checked_add(b)
                .map_or(EelValue::Float(a as f64 + b as f64), EelValue::Int)),
            (a, b) => Ok(EelValue::Float(a.as_f64() + b.as_f64())),
        }
    }
}

impl Sub for EelValue {
    type Output = EelResult<EelValue>;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self.to_number("-")?, rhs.to_number("-")?) {
            (Number::Int(a), Number::Int(b)) => Ok(a
                .checked_sub(b)
                .map_or(EelValue::Float(a as f64 - b as f64), EelValue::Int)),
            (a, b) => Ok(EelValue::Float(a.as_f64() - b.as_f64())),
        }
    }
}

impl Mul for EelValue {
    type Output = EelResult<EelValue>;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self.to_number("*")?, rhs.to_number("*")?) {
            (Number::Int(a), Number::Int(b)) => Ok(a
                .checked_mul(b)
                .map_or(EelValue::Float(a as f64 * b as f64), EelValue::Int)),
            (a, b) => Ok(EelValue::Float(a.as_f64() * b.as_f64())),
        }
    }
}

impl Div for EelValue {
    type Output = EelResult<EelValue>;

    fn div(self, rhs: Self) -> Self::Output {
        let lhs = self.to_number("/")?;
        let rhs = rhs.to_number("/")?;

        if rhs.as_f64() == 0.0 {
            return Err(EelError::evaluation("Division by zero"));
        }

        match (lhs, rhs) {
            (Number::Int(a), Number::Int(b)) if a.checked_rem(b).map_or(true, |r| r == 0) => Ok(a
                .checked_div(b)
                .map_or(Number::Float(a as f64 / b as f64), Number::Int)
                .into_value()),
            (a, b) => Ok(EelValue::Float(a.as_f64() / b.as_f64())),
        }
    }
}

impl Rem for EelValue {
    type Output = EelResult<EelValue>;

    fn rem(self, rhs: Self) -> Self::Output {
        let lhs = self.to_number("%")?.as_i64();
        let rhs = rhs.to_number("%")?.as_i64();

        if rhs == 0 {
            return Err(EelError::evaluation("Modulo by zero"));
        }

        Ok(EelValue::Int(lhs.wrapping_rem(rhs)))
    }
}

impl Not for EelValue {
    type Output = EelValue;

    fn not(self) -> Self::Output {
        EelValue::Bool(!self.is_truthy())
    }
}

#[cfg(test)]
mod test {
    use crate::EelValue;
    use test_case::test_case;

    #[test_case(1.into(), 2.into(), 3.into(); "int plus int")]
    #[test_case(1.into(), "a".into(), "1a".into(); "int plus string")]
    #[test_case("a".into(), 1.into(), "a1".into(); "string plus int")]
    #[test_case("a".into(), 1.5.into(), "a1.5".into(); "string plus float")]
    #[test_case(1.into(), 0.5.into(), 1.5.into(); "int plus float")]
    #[test_case(i64::MAX.into(), 1.into(), (i64::MAX as f64 + 1.0).into(); "overflow to float")]
    #[test_case("2".into(), "3".into(), "23".into(); "numeric strings concat")]
    fn test_add(lhs: EelValue, rhs: EelValue, expected: EelValue) {
        assert_eq!((lhs + rhs).unwrap(), expected);
    }

    #[test_case(6.into(), 3.into(), 2.into(); "exact int")]
    #[test_case(7.into(), 2.into(), 3.5.into(); "inexact int")]
    #[test_case(1.0.into(), 4.into(), 0.25.into(); "float")]
    fn test_div(lhs: EelValue, rhs: EelValue, expected: EelValue) {
        assert_eq!((lhs / rhs).unwrap(), expected);
    }

    #[test]
    fn test_div_by_zero() {
        let err = (EelValue::from(1) / EelValue::from(0)).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[test]
    fn test_rem() {
        assert_eq!(
            (EelValue::from(7) % EelValue::from(3)).unwrap(),
            EelValue::Int(1)
        );
        assert_eq!(
            (EelValue::from(-7) % EelValue::from(3)).unwrap(),
            EelValue::Int(-1)
        );
        assert!((EelValue::from(7) % EelValue::from(0)).is_err());
    }

    #[test]
    fn test_sub_rejects_lists() {
        assert!((EelValue::empty_list() - EelValue::from(1)).is_err());
    }

    #[test_case(1.into(), 1.into(), true; "same int")]
    #[test_case(1.into(), "1".into(), false; "int and string")]
    #[test_case(1.into(), 1.0.into(), false; "int and float")]
    #[test_case(EelValue::Null, EelValue::Null, true; "nulls")]
    #[test_case(vec![1.into(), "a".into()].into(), vec![1.into(), "a".into()].into(), true; "lists")]
    #[test_case(vec![1.into()].into(), vec!["1".into()].into(), false; "lists strict")]
    fn test_strict_eq(lhs: EelValue, rhs: EelValue, expected: bool) {
        assert_eq!(lhs.strict_eq(&rhs), expected);
    }

    #[test_case(1.into(), 2.into(), true; "ints")]
    #[test_case(2.5.into(), 2.into(), false; "float int")]
    #[test_case("a".into(), "b".into(), true; "strings")]
    #[test_case("10".into(), "9".into(), false; "numeric strings")]
    #[test_case(9.into(), "10".into(), true; "int and numeric string")]
    #[test_case("abc".into(), 1.into(), false; "string and int")]
    fn test_lt(lhs: EelValue, rhs: EelValue, expected: bool) {
        assert_eq!(lhs.lt(&rhs).unwrap(), EelValue::Bool(expected));
    }

    #[test]
    fn test_compare_lists_fails() {
        assert!(EelValue::empty_list().lt(&EelValue::from(1)).is_err());
    }

    #[test]
    fn test_nan_is_unordered() {
        let nan = EelValue::Float(f64::NAN);
        assert_eq!(nan.le(&nan).unwrap(), EelValue::Bool(false));
        assert_eq!(nan.ge(&1.into()).unwrap(), EelValue::Bool(false));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(EelValue::from(" 12 ").to_int().unwrap(), 12);
        assert_eq!(EelValue::from(2.9).to_int().unwrap(), 2);
        assert_eq!(EelValue::from(true).to_float().unwrap(), 1.0);
        assert!(EelValue::from("abc").to_float().is_err());
        assert!(EelValue::from("1e3").is_numeric());
        assert!(!EelValue::from("inf").is_numeric());
    }

    #[test]
    fn test_not() {
        assert_eq!(!EelValue::from("0"), EelValue::Bool(true));
        assert_eq!(!EelValue::from("a"), EelValue::Bool(false));
    }
}
