use super::{arg, int_arg, list_arg, opt_int_arg, resolve_offset, Helper};
use crate::{EelError, EelResult, EelValue};

const METHODS: &[(&str, super::HelperMethod)] = &[
    ("length", length_impl),
    ("isEmpty", is_empty_impl),
    ("first", first_impl),
    ("last", last_impl),
    ("join", join_impl),
    ("slice", slice_impl),
    ("reverse", reverse_impl),
    ("keys", keys_impl),
    ("indexOf", index_of_impl),
    ("concat", concat_impl),
    ("push", push_impl),
    ("range", range_impl),
];

/// Upper bound on the number of elements `range()` produces.
const MAX_RANGE: usize = 100_000;

pub fn helper() -> Helper {
    Helper::new("Array", METHODS, &[])
}

fn length_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(list_arg(&args, 0, "length")?.len().into())
}

fn is_empty_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(list_arg(&args, 0, "isEmpty")?.is_empty().into())
}

fn first_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(list_arg(&args, 0, "first")?
        .into_iter()
        .next()
        .unwrap_or(EelValue::Null))
}

fn last_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(list_arg(&args, 0, "last")?.pop().unwrap_or(EelValue::Null))
}

fn join_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let list = list_arg(&args, 0, "join")?;
    let sep = match arg(&args, 1) {
        EelValue::Null => ",".to_owned(),
        sep => sep.to_string_value()?,
    };

    let parts = list
        .iter()
        .map(EelValue::to_string_value)
        .collect::<EelResult<Vec<_>>>()?;

    Ok(parts.join(&sep).into())
}

fn slice_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let list = list_arg(&args, 0, "slice")?;
    let begin = resolve_offset(int_arg(&args, 1)?, list.len());
    let end = match opt_int_arg(&args, 2)? {
        Some(end) => resolve_offset(end, list.len()).max(begin),
        None => list.len(),
    };

    Ok(list[begin..end].to_vec().into())
}

fn reverse_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let mut list = list_arg(&args, 0, "reverse")?;
    list.reverse();

    Ok(list.into())
}

fn keys_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(match arg(&args, 0) {
        EelValue::Map(map) => map
            .keys()
            .map(|k| EelValue::from(k.as_str()))
            .collect::<Vec<_>>()
            .into(),
        EelValue::List(list) => (0..list.len())
            .map(EelValue::from)
            .collect::<Vec<_>>()
            .into(),
        _ => EelValue::empty_list(),
    })
}

fn index_of_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let list = list_arg(&args, 0, "indexOf")?;
    let needle = arg(&args, 1);

    Ok(list
        .iter()
        .position(|v| v.strict_eq(needle))
        .map_or(EelValue::Int(-1), EelValue::from))
}

fn concat_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let mut res = Vec::new();

    for value in args {
        match value {
            EelValue::List(list) => res.extend(list),
            EelValue::Map(map) => res.extend(map.into_values()),
            other => res.push(other),
        }
    }

    Ok(res.into())
}

fn push_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let mut list = list_arg(&args, 0, "push")?;
    list.extend(args.into_iter().skip(1));

    Ok(list.into())
}

fn range_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let start = int_arg(&args, 0)?;
    let end = int_arg(&args, 1)?;
    let step = opt_int_arg(&args, 2)?.unwrap_or(1);

    if step == 0 {
        return Err(EelError::evaluation("range() step must not be zero"));
    }

    let step = step.unsigned_abs();
    let values: Vec<EelValue> = if start <= end {
        (start..=end)
            .step_by(step as usize)
            .take(MAX_RANGE)
            .map(EelValue::from)
            .collect()
    } else {
        (end..=start)
            .rev()
            .step_by(step as usize)
            .take(MAX_RANGE)
            .map(EelValue::from)
            .collect()
    };

    Ok(values.into())
}
