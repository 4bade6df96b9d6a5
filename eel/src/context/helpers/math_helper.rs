use std::f64::consts;

use super::{arg, float_arg, opt_int_arg, Helper};
use crate::{EelError, EelResult, EelValue};

const METHODS: &[(&str, super::HelperMethod)] = &[
    ("abs", abs_impl),
    ("ceil", ceil_impl),
    ("floor", floor_impl),
    ("round", round_impl),
    ("max", max_impl),
    ("min", min_impl),
    ("sqrt", sqrt_impl),
    ("pow", pow_impl),
    ("isFinite", is_finite_impl),
    ("isNaN", is_nan_impl),
];

const PROPERTIES: &[(&str, f64)] = &[
    ("PI", consts::PI),
    ("E", consts::E),
    ("LN2", consts::LN_2),
    ("LN10", consts::LN_10),
    ("SQRT2", consts::SQRT_2),
];

pub fn helper() -> Helper {
    Helper::new("Math", METHODS, PROPERTIES)
}

fn abs_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(match arg(&args, 0) {
        EelValue::Int(i) => i
            .checked_abs()
            .map_or(EelValue::Float((*i as f64).abs()), EelValue::Int),
        other => EelValue::Float(other.to_float()?.abs()),
    })
}

fn ceil_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(float_arg(&args, 0)?.ceil().into())
}

fn floor_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(float_arg(&args, 0)?.floor().into())
}

/// Rounds half away from zero to `precision` decimal places.
fn round_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let value = float_arg(&args, 0)?;
    let precision = opt_int_arg(&args, 1)?.unwrap_or(0).clamp(-15, 15) as i32;

    let factor = 10f64.powi(precision);
    Ok(((value * factor).round() / factor).into())
}

fn extreme(args: Vec<EelValue>, name: &str, want: std::cmp::Ordering) -> EelResult<EelValue> {
    let values = match args.as_slice() {
        [EelValue::List(list)] => list.clone(),
        _ => args,
    };

    let mut best: Option<EelValue> = None;
    for value in values {
        if !value.is_numeric() {
            return Err(EelError::Evaluation(format!(
                "Math.{}() expects numbers, got {}",
                name,
                value.type_name()
            )));
        }

        best = match best {
            Some(cur) if value.compare(&cur)? != Some(want) => Some(cur),
            _ => Some(value),
        };
    }

    Ok(best.unwrap_or(EelValue::Null))
}

fn max_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    extreme(args, "max", std::cmp::Ordering::Greater)
}

fn min_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    extreme(args, "min", std::cmp::Ordering::Less)
}

fn sqrt_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(float_arg(&args, 0)?.sqrt().into())
}

fn pow_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    match (arg(&args, 0), arg(&args, 1)) {
        (EelValue::Int(base), EelValue::Int(exp)) if *exp >= 0 => Ok(u32::try_from(*exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .map_or(EelValue::Float((*base as f64).powf(*exp as f64)), EelValue::Int)),
        (base, exp) => Ok(base.to_float()?.powf(exp.to_float()?).into()),
    }
}

fn is_finite_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(match arg(&args, 0) {
        EelValue::Int(_) => true,
        EelValue::Float(f) => f.is_finite(),
        other => other.to_float().map_or(false, f64::is_finite),
    }
    .into())
}

fn is_nan_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(match arg(&args, 0) {
        EelValue::Float(f) => f.is_nan(),
        other => other.to_float().is_err(),
    }
    .into())
}
