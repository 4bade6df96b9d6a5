use super::{arg, string_arg, Helper};
use crate::{EelError, EelResult, EelValue};

const METHODS: &[(&str, super::HelperMethod)] =
    &[("stringify", stringify_impl), ("parse", parse_impl)];

pub fn helper() -> Helper {
    Helper::new("Json", METHODS, &[])
}

fn stringify_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let json = arg(&args, 0).to_json()?;

    serde_json::to_string(&json)
        .map(EelValue::from)
        .map_err(|err| EelError::Evaluation(err.to_string()))
}

fn parse_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let text = string_arg(&args, 0)?;

    serde_json::from_str::<serde_json::Value>(&text)
        .map(EelValue::from)
        .map_err(|err| EelError::Evaluation(format!("Invalid JSON: {}", err)))
}
