use crate::{
    Context, DefaultContext, EelError, EelEvaluator, EelResult, EelValue, EelValueMap, Whitelist,
};

/// Returns the expression inside `${...}`, or `None` when `text` is not exactly one
/// wrapped expression. Braces inside quoted strings do not count.
pub fn parse_eel_expression(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("${")?;

    let mut depth: usize = 1;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let expression = &inner[..i];
                    let closes_text = i + c.len_utf8() == inner.len();
                    return (closes_text && !expression.trim().is_empty()).then_some(expression);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn is_eel_expression(text: &str) -> bool {
    parse_eel_expression(text).is_some()
}

/// Evaluates a `${...}` expression in a protected context built from `variables` on top of
/// `default_context`.
///
/// Caller variables shadow default ones. Top level function variables and the functions
/// registered in the default context are callable; helper objects decide for themselves.
pub fn evaluate_eel_expression(
    expression: &str,
    evaluator: &dyn EelEvaluator,
    variables: EelValueMap,
    default_context: &DefaultContext,
) -> EelResult<EelValue> {
    let inner = parse_eel_expression(expression)
        .ok_or_else(|| EelError::NotAnExpression(expression.to_owned()))?;

    let mut merged = default_context.variables().clone();
    let mut allowed: Vec<String> = default_context.function_paths().to_vec();

    for (name, value) in variables {
        if matches!(value, EelValue::Function(_)) {
            allowed.push(name.clone());
        }
        merged.insert(name, value);
    }

    let mut context = Context::protected(EelValue::Map(merged), Whitelist::new());
    for path in allowed.iter() {
        context.allow(path);
    }

    evaluator.evaluate(inner, &context)
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::{is_eel_expression, parse_eel_expression};

    #[test_case("${foo}", Some("foo"); "simple")]
    #[test_case("  ${ a + 1 }\n", Some(" a + 1 "); "surrounding whitespace")]
    #[test_case("${{a: {b: 1}}.a}", Some("{a: {b: 1}}.a"); "nested braces")]
    #[test_case("${'}' + \"{\"}", Some("'}' + \"{\""); "braces in strings")]
    #[test_case("${'it\\'s }'}", Some("'it\\'s }'"); "escaped quote")]
    #[test_case("${a} ${b}", None; "two expressions")]
    #[test_case("${a", None; "unterminated")]
    #[test_case("${}", None; "empty")]
    #[test_case("foo", None; "plain text")]
    #[test_case("x ${a}", None; "prefix text")]
    fn test_parse_eel_expression(text: &str, expected: Option<&str>) {
        assert_eq!(parse_eel_expression(text), expected);
        assert_eq!(is_eel_expression(text), expected.is_some());
    }
}
