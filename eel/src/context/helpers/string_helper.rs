use regex::{Regex, RegexBuilder};

use super::{arg, int_arg, opt_int_arg, resolve_offset, string_arg, Helper};
use crate::{EelError, EelResult, EelValue};

const METHODS: &[(&str, super::HelperMethod)] = &[
    ("length", length_impl),
    ("substr", substr_impl),
    ("charAt", char_at_impl),
    ("indexOf", index_of_impl),
    ("lastIndexOf", last_index_of_impl),
    ("startsWith", starts_with_impl),
    ("endsWith", ends_with_impl),
    ("toUpperCase", to_upper_case_impl),
    ("toLowerCase", to_lower_case_impl),
    ("firstLetterToUpperCase", first_letter_to_upper_case_impl),
    ("trim", trim_impl),
    ("split", split_impl),
    ("replace", replace_impl),
    ("crop", crop_impl),
    ("isBlank", is_blank_impl),
    ("pregMatch", preg_match_impl),
    ("pregReplace", preg_replace_impl),
    ("toString", to_string_impl),
    ("toInteger", to_integer_impl),
    ("toFloat", to_float_impl),
    ("toBoolean", to_boolean_impl),
];

pub fn helper() -> Helper {
    Helper::new("String", METHODS, &[])
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn char_index(haystack: &str, byte_index: usize) -> i64 {
    haystack[..byte_index].chars().count() as i64
}

fn length_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?.chars().count().into())
}

fn substr_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = chars(&string_arg(&args, 0)?);
    let start = resolve_offset(int_arg(&args, 1)?, s.len());
    let end = match opt_int_arg(&args, 2)? {
        Some(len) if len < 0 => resolve_offset(len, s.len()).max(start),
        Some(len) => start.saturating_add(len as usize).min(s.len()),
        None => s.len(),
    };

    Ok(s[start..end].iter().collect::<String>().into())
}

fn char_at_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let index = int_arg(&args, 1)?;

    if index < 0 {
        return Ok("".into());
    }

    Ok(s.chars()
        .nth(index as usize)
        .map(String::from)
        .unwrap_or_default()
        .into())
}

fn index_of_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let search = string_arg(&args, 1)?;
    let from = resolve_offset(opt_int_arg(&args, 2)?.unwrap_or(0), s.chars().count());

    let byte_from = s.char_indices().nth(from).map_or(s.len(), |(i, _)| i);

    Ok(match s[byte_from..].find(&search) {
        Some(i) => char_index(&s, byte_from + i).into(),
        None => EelValue::Int(-1),
    })
}

fn last_index_of_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let search = string_arg(&args, 1)?;

    Ok(match s.rfind(&search) {
        Some(i) => char_index(&s, i).into(),
        None => EelValue::Int(-1),
    })
}

fn starts_with_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?
        .starts_with(&string_arg(&args, 1)?)
        .into())
}

fn ends_with_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?
        .ends_with(&string_arg(&args, 1)?)
        .into())
}

fn to_upper_case_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?.to_uppercase().into())
}

fn to_lower_case_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?.to_lowercase().into())
}

fn first_letter_to_upper_case_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let mut it = s.chars();

    Ok(match it.next() {
        Some(first) => first.to_uppercase().chain(it).collect::<String>().into(),
        None => "".into(),
    })
}

fn trim_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;

    Ok(match arg(&args, 1) {
        EelValue::Null => s.trim().into(),
        charlist => {
            let charlist = chars(&charlist.to_string_value()?);
            s.trim_matches(|c: char| charlist.contains(&c)).into()
        }
    })
}

fn split_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let limit = opt_int_arg(&args, 2)?.map(|l| l.max(0) as usize);

    let parts: Vec<String> = match arg(&args, 1) {
        EelValue::Null => vec![s],
        sep => {
            let sep = sep.to_string_value()?;
            if sep.is_empty() {
                s.chars().map(String::from).collect()
            } else {
                s.split(sep.as_str()).map(str::to_owned).collect()
            }
        }
    };

    Ok(parts
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(EelValue::from)
        .collect::<Vec<_>>()
        .into())
}

fn replace_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let search = string_arg(&args, 1)?;
    let replace = string_arg(&args, 2)?;

    if search.is_empty() {
        return Ok(s.into());
    }

    Ok(s.replace(&search, &replace).into())
}

fn crop_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let max = int_arg(&args, 1)?.max(0) as usize;
    let suffix = string_arg(&args, 2)?;

    if s.chars().count() <= max {
        return Ok(s.into());
    }

    let mut cropped: String = s.chars().take(max).collect();
    cropped.push_str(&suffix);

    Ok(cropped.into())
}

fn is_blank_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?.trim().is_empty().into())
}

/// Compiles a delimited pattern such as `/^a(b)/i` into a regex.
pub(crate) fn compile_pattern(pattern: &str) -> EelResult<Regex> {
    let invalid = || EelError::Evaluation(format!("Invalid regular expression {}", pattern));

    let delimiter = pattern.chars().next().ok_or_else(invalid)?;
    let closing = match delimiter {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        c if c.is_alphanumeric() || c == '\\' || c.is_whitespace() => return Err(invalid()),
        c => c,
    };

    let body_start = delimiter.len_utf8();
    let body_end = pattern.rfind(closing).filter(|i| *i >= body_start).ok_or_else(invalid)?;
    let body = &pattern[body_start..body_end];
    let flags = &pattern[body_end + closing.len_utf8()..];

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            _ => return Err(invalid()),
        };
    }

    builder.build().map_err(|err| EelError::Evaluation(err.to_string()))
}

fn preg_match_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let re = compile_pattern(&string_arg(&args, 1)?)?;

    Ok(match re.captures(&s) {
        Some(caps) => caps
            .iter()
            .map(|m| m.map_or(EelValue::from(""), |m| m.as_str().into()))
            .collect::<Vec<_>>()
            .into(),
        None => EelValue::Null,
    })
}

fn preg_replace_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?;
    let re = compile_pattern(&string_arg(&args, 1)?)?;
    let replace = string_arg(&args, 2)?;

    Ok(re.replace_all(&s, replace.as_str()).into_owned().into())
}

fn to_string_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(string_arg(&args, 0)?.into())
}

fn to_integer_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(EelValue::Int(arg(&args, 0).to_int().unwrap_or(0)))
}

fn to_float_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    Ok(EelValue::Float(arg(&args, 0).to_float().unwrap_or(0.0)))
}

fn to_boolean_impl(args: Vec<EelValue>) -> EelResult<EelValue> {
    let s = string_arg(&args, 0)?.to_lowercase();

    Ok(matches!(s.as_str(), "1" | "true" | "on" | "yes").into())
}
