use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::codec::Value;
use crate::error::{CResult, Error};

/// Key under which maps that can't be plain JSON objects hide their pairs.
const MAP_SENTINEL: &str = "%map";

/// Canonical text codec for [`Value`], used everywhere at the storage
/// boundary. The encoding is JSON with one twist: a map whose keys aren't
/// all strings (or whose keys would collide with the sentinel) becomes
/// `{"%map": [[k, v], ...]}`, so that `decode(encode(x)) == x` holds for
/// the whole value domain. Tombstones never pass through here; they are
/// SQL NULL.
#[derive(Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        JsonCodec
    }

    pub fn encode(&self, value: &Value) -> CResult<String> {
        let json = self.to_json(value)?;
        match serde_json::to_string(&json) {
            Ok(s) => Ok(s),
            Err(err) => Err(Error::Internal(err.to_string())),
        }
    }

    pub fn decode(&self, text: &str) -> CResult<Value> {
        let json: Json = serde_json::from_str(text)?;
        self.from_json(&json)
    }

    fn to_json(&self, value: &Value) -> CResult<Json> {
        Ok(match value {
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number(Number::from(*i)),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => Json::Number(n),
                None => {
                    return Err(Error::Value(format!(
                        "float {} is not encodable",
                        f
                    )))
                }
            },
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(|v| self.to_json(v))
                    .collect::<CResult<Vec<_>>>()?,
            ),
            Value::Map(pairs) => {
                let plain = pairs.iter().all(|(k, _)| {
                    matches!(k, Value::Str(s) if s != MAP_SENTINEL)
                });
                if plain {
                    let mut obj = JsonMap::new();
                    for (k, v) in pairs {
                        let key = match k {
                            Value::Str(s) => s.clone(),
                            _ => unreachable!(),
                        };
                        obj.insert(key, self.to_json(v)?);
                    }
                    Json::Object(obj)
                } else {
                    let mut entries = Vec::with_capacity(pairs.len());
                    for (k, v) in pairs {
                        entries.push(Json::Array(vec![
                            self.to_json(k)?,
                            self.to_json(v)?,
                        ]));
                    }
                    let mut obj = JsonMap::new();
                    obj.insert(MAP_SENTINEL.to_string(), Json::Array(entries));
                    Json::Object(obj)
                }
            }
        })
    }

    fn from_json(&self, json: &Json) -> CResult<Value> {
        Ok(match json {
            Json::Null => {
                return Err(Error::Parse(
                    "null is not a value; deletion is a tombstone".to_string(),
                ))
            }
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(Error::Parse(format!(
                        "number {} out of range",
                        n
                    )));
                }
            }
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::List(
                items
                    .iter()
                    .map(|v| self.from_json(v))
                    .collect::<CResult<Vec<_>>>()?,
            ),
            Json::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(Json::Array(entries)) = obj.get(MAP_SENTINEL) {
                        let mut pairs = Vec::with_capacity(entries.len());
                        for entry in entries {
                            match entry {
                                Json::Array(kv) if kv.len() == 2 => pairs.push((
                                    self.from_json(&kv[0])?,
                                    self.from_json(&kv[1])?,
                                )),
                                other => {
                                    return Err(Error::Parse(format!(
                                        "malformed map entry: {}",
                                        other
                                    )))
                                }
                            }
                        }
                        return Ok(Value::map(pairs));
                    }
                }
                let mut pairs = Vec::with_capacity(obj.len());
                for (k, v) in obj {
                    pairs.push((Value::Str(k.clone()), self.from_json(v)?));
                }
                Value::map(pairs)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(v: Value) {
        let codec = JsonCodec::new();
        let text = codec.encode(&v).unwrap();
        assert_eq!(codec.decode(&text).unwrap(), v, "through {}", text);
    }

    #[test]
    fn scalars_roundtrip() {
        roundtrip(Value::Bool(true));
        roundtrip(Value::Bool(false));
        roundtrip(Value::Int(0));
        roundtrip(Value::Int(10_000_000_000));
        roundtrip(Value::Int(i64::MAX));
        roundtrip(Value::Int(i64::MIN));
        roundtrip(Value::Float(0.5));
        roundtrip(Value::Float(-1234.25));
        roundtrip(Value::Str("spam".into()));
        roundtrip(Value::Str("💧🔑𐦖".into()));
        roundtrip(Value::Str("".into()));
    }

    #[test]
    fn containers_roundtrip() {
        roundtrip(Value::List(vec![
            Value::from("spam"),
            Value::from("eggs"),
            Value::from("ham"),
        ]));
        roundtrip(Value::List(vec![Value::List(vec![Value::Int(1)])]));
        roundtrip(Value::map(vec![
            (Value::from("foo"), Value::from("bar")),
            (Value::from("💧"), Value::from("🔑")),
        ]));
    }

    #[test]
    fn non_string_map_keys_roundtrip() {
        // These are exactly the keys plain JSON objects would stringify.
        roundtrip(Value::map(vec![
            (Value::Int(0), Value::Int(1)),
            (Value::from("foo"), Value::from("bar")),
        ]));
        roundtrip(Value::map(vec![(
            Value::List(vec![Value::from("spam"), Value::from("eggs")]),
            Value::from("ham"),
        )]));
    }

    #[test]
    fn sentinel_key_does_not_confuse_decoding() {
        roundtrip(Value::map(vec![(
            Value::from(MAP_SENTINEL),
            Value::Int(1),
        )]));
    }

    #[test]
    fn int_and_float_stay_distinct() {
        let codec = JsonCodec::new();
        let i = codec.encode(&Value::Int(1)).unwrap();
        let f = codec.encode(&Value::Float(1.0)).unwrap();
        assert_ne!(i, f);
        assert_eq!(codec.decode(&i).unwrap(), Value::Int(1));
        assert_eq!(codec.decode(&f).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn null_is_rejected() {
        let codec = JsonCodec::new();
        assert!(codec.decode("null").is_err());
    }

    #[test]
    fn nonfinite_floats_are_rejected() {
        let codec = JsonCodec::new();
        assert!(codec.encode(&Value::Float(f64::NAN)).is_err());
        assert!(codec.encode(&Value::Float(f64::INFINITY)).is_err());
    }
}
