use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::{fmt, sync::Arc};

use crate::{EelError, EelFunction, EelObject, EelResult};

pub type EelValueVec = Vec<EelValue>;
pub type EelValueMap = IndexMap<String, EelValue>;

/// The runtime value domain of Eel.
///
/// Lists are ordered sequences, maps are insertion ordered keyed collections. Host objects
/// and functions are only ever bound by the embedding application, never produced by
/// literals, so they are not serializable.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum EelValue {
    Null,
    Bool(bool),
    Int(i64),
    #[serde(with = "lossless_float")]
    Float(f64),
    String(String),
    List(EelValueVec),
    Map(EelValueMap),
    #[serde(skip_serializing, skip_deserializing)]
    Object(Arc<dyn EelObject>),
    #[serde(skip_serializing, skip_deserializing)]
    Function(EelFunction),
}

/// Finite floats serialize as JSON numbers, non finite ones as `"NaN"`, `"inf"` or `"-inf"`.
mod lossless_float {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(val: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if val.is_finite() {
            serializer.serialize_f64(*val)
        } else if val.is_nan() {
            serializer.serialize_str("NaN")
        } else if val.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(f) => Ok(f),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                _ => Err(D::Error::custom(format!("Invalid float {}", text))),
            },
        }
    }
}

impl EelValue {
    pub fn from_int(val: i64) -> EelValue {
        EelValue::Int(val)
    }

    pub fn from_float(val: f64) -> EelValue {
        EelValue::Float(val)
    }

    pub fn from_bool(val: bool) -> EelValue {
        EelValue::Bool(val)
    }

    pub fn from_str(val: &str) -> EelValue {
        EelValue::String(val.to_owned())
    }

    pub fn from_list(val: Vec<EelValue>) -> EelValue {
        EelValue::List(val)
    }

    pub fn from_map(val: EelValueMap) -> EelValue {
        EelValue::Map(val)
    }

    pub fn from_object(val: Arc<dyn EelObject>) -> EelValue {
        EelValue::Object(val)
    }

    pub fn from_function(val: EelFunction) -> EelValue {
        EelValue::Function(val)
    }

    pub fn empty_list() -> EelValue {
        EelValue::List(Vec::new())
    }

    pub fn empty_map() -> EelValue {
        EelValue::Map(IndexMap::new())
    }

    pub fn type_name(&self) -> &str {
        match self {
            EelValue::Null => "null",
            EelValue::Bool(_) => "bool",
            EelValue::Int(_) => "int",
            EelValue::Float(_) => "float",
            EelValue::String(_) => "string",
            EelValue::List(_) => "list",
            EelValue::Map(_) => "map",
            EelValue::Object(obj) => obj.type_name(),
            EelValue::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EelValue::Null)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, EelValue::List(_) | EelValue::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EelValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EelValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Truthiness used by `!`, `||`, `&&` and `?:`. Empty strings, `"0"`, zero, empty
    /// collections and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            EelValue::Null => false,
            EelValue::Bool(b) => *b,
            EelValue::Int(i) => *i != 0,
            EelValue::Float(f) => *f != 0.0,
            EelValue::String(s) => !s.is_empty() && s != "0",
            EelValue::List(l) => !l.is_empty(),
            EelValue::Map(m) => !m.is_empty(),
            EelValue::Object(_) => true,
            EelValue::Function(_) => true,
        }
    }

    /// String conversion used by `+` concatenation and the string helpers.
    pub fn to_string_value(&self) -> EelResult<String> {
        match self {
            EelValue::Null => Ok(String::new()),
            EelValue::Bool(true) => Ok("1".to_owned()),
            EelValue::Bool(false) => Ok(String::new()),
            EelValue::Int(i) => Ok(i.to_string()),
            EelValue::Float(f) => Ok(format_float(*f)),
            EelValue::String(s) => Ok(s.clone()),
            other => Err(EelError::Evaluation(format!(
                "Cannot convert {} to string",
                other.type_name()
            ))),
        }
    }

    /// Converts into a JSON value. Host objects and functions have no JSON form.
    pub fn to_json(&self) -> EelResult<Value> {
        match self {
            EelValue::Null => Ok(Value::Null),
            EelValue::Bool(b) => Ok(Value::Bool(*b)),
            EelValue::Int(i) => Ok(Value::Number((*i).into())),
            EelValue::Float(f) => Ok(Number::from_f64(*f).map_or(Value::Null, Value::Number)),
            EelValue::String(s) => Ok(Value::String(s.clone())),
            EelValue::List(l) => Ok(Value::Array(
                l.iter().map(|v| v.to_json()).collect::<EelResult<_>>()?,
            )),
            EelValue::Map(m) => {
                let mut obj = serde_json::Map::new();
                for (key, value) in m.iter() {
                    obj.insert(key.clone(), value.to_json()?);
                }
                Ok(Value::Object(obj))
            }
            other => Err(EelError::Evaluation(format!(
                "Cannot convert {} to JSON",
                other.type_name()
            ))),
        }
    }
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 {
            "INF".to_owned()
        } else {
            "-INF".to_owned()
        }
    } else {
        format!("{}", f)
    }
}

impl PartialEq for EelValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Display for EelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EelValue::Null => write!(f, "null"),
            EelValue::Bool(b) => write!(f, "{}", b),
            EelValue::Int(i) => write!(f, "{}", i),
            EelValue::Float(v) => write!(f, "{}", format_float(*v)),
            EelValue::String(s) => write!(f, "{}", s),
            EelValue::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            EelValue::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            EelValue::Object(obj) => write!(f, "<{}>", obj.type_name()),
            EelValue::Function(func) => write!(f, "<function {}>", func.name()),
        }
    }
}

impl From<&Value> for EelValue {
    fn from(value: &Value) -> EelValue {
        match value {
            Value::Null => EelValue::Null,
            Value::Bool(b) => EelValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    EelValue::Int(i)
                } else {
                    EelValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => EelValue::String(s.clone()),
            Value::Array(a) => EelValue::List(a.iter().map(EelValue::from).collect()),
            Value::Object(o) => EelValue::Map(
                o.iter()
                    .map(|(k, v)| (k.clone(), EelValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for EelValue {
    fn from(value: Value) -> EelValue {
        EelValue::from(&value)
    }
}

impl From<i64> for EelValue {
    fn from(val: i64) -> EelValue {
        EelValue::Int(val)
    }
}

impl From<i32> for EelValue {
    fn from(val: i32) -> EelValue {
        EelValue::Int(val as i64)
    }
}

impl From<usize> for EelValue {
    fn from(val: usize) -> EelValue {
        i64::try_from(val).map_or(EelValue::Float(val as f64), EelValue::Int)
    }
}

impl From<f64> for EelValue {
    fn from(val: f64) -> EelValue {
        EelValue::Float(val)
    }
}

impl From<bool> for EelValue {
    fn from(val: bool) -> EelValue {
        EelValue::Bool(val)
    }
}

impl From<&str> for EelValue {
    fn from(val: &str) -> EelValue {
        EelValue::String(val.to_owned())
    }
}

impl From<String> for EelValue {
    fn from(val: String) -> EelValue {
        EelValue::String(val)
    }
}

impl From<Vec<EelValue>> for EelValue {
    fn from(val: Vec<EelValue>) -> EelValue {
        EelValue::List(val)
    }
}

impl From<EelValueMap> for EelValue {
    fn from(val: EelValueMap) -> EelValue {
        EelValue::Map(val)
    }
}

impl From<Arc<dyn EelObject>> for EelValue {
    fn from(val: Arc<dyn EelObject>) -> EelValue {
        EelValue::Object(val)
    }
}

impl From<EelFunction> for EelValue {
    fn from(val: EelFunction) -> EelValue {
        EelValue::Function(val)
    }
}

impl<T: Into<EelValue>> From<Option<T>> for EelValue {
    fn from(val: Option<T>) -> EelValue {
        match val {
            Some(v) => v.into(),
            None => EelValue::Null,
        }
    }
}

#[cfg(test)]
mod test {
    use super::EelValue;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(EelValue::Null, false; "null")]
    #[test_case(0.into(), false; "zero")]
    #[test_case(1.into(), true; "one")]
    #[test_case(0.0.into(), false; "zero float")]
    #[test_case("".into(), false; "empty string")]
    #[test_case("0".into(), false; "zero string")]
    #[test_case("0.0".into(), true; "zero float string")]
    #[test_case(EelValue::empty_list(), false; "empty list")]
    #[test_case(vec![EelValue::Null].into(), true; "non empty list")]
    #[test_case(EelValue::empty_map(), false; "empty map")]
    fn test_truthiness(value: EelValue, expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[test_case(1.into(), "1")]
    #[test_case(1.5.into(), "1.5")]
    #[test_case(3.0.into(), "3")]
    #[test_case(true.into(), "1")]
    #[test_case(false.into(), "")]
    #[test_case(EelValue::Null, "")]
    fn test_string_conversion(value: EelValue, expected: &str) {
        assert_eq!(value.to_string_value().unwrap(), expected);
    }

    #[test_case(110932.01402194171; "precise")]
    #[test_case(0.1 + 0.2; "inexact sum")]
    #[test_case(f64::INFINITY; "infinity")]
    #[test_case(f64::NEG_INFINITY; "negative infinity")]
    #[test_case(f64::MIN_POSITIVE; "min positive")]
    fn test_float_serde_is_lossless(f: f64) {
        let text = serde_json::to_string(&EelValue::Float(f)).unwrap();
        let back: EelValue = serde_json::from_str(&text).unwrap();

        assert!(matches!(back, EelValue::Float(b) if b.to_bits() == f.to_bits()), "{}", text);
    }

    #[test]
    fn test_nan_serde() {
        let text = serde_json::to_string(&EelValue::Float(f64::NAN)).unwrap();

        assert_eq!(text, r#"{"Float":"NaN"}"#);
        assert!(matches!(serde_json::from_str(&text).unwrap(), EelValue::Float(f) if f.is_nan()));
        assert!(serde_json::from_str::<EelValue>(r#"{"Float":"many"}"#).is_err());
    }

    #[test]
    fn test_list_has_no_string_form() {
        assert!(EelValue::empty_list().to_string_value().is_err());
    }

    #[test]
    fn test_json_conversion_keeps_order() {
        let value: EelValue = json!({"b": 1, "a": [true, null, 2.5], "c": "x"}).into();

        if let EelValue::Map(ref m) = value {
            assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        } else {
            panic!("expected map");
        }

        assert_eq!(
            value.to_json().unwrap(),
            json!({"b": 1, "a": [true, null, 2.5], "c": "x"})
        );
    }
}
