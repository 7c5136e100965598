use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A graph, node or edge datum: the keys and values callers attach to
/// entities, and also the names of graphs and nodes themselves.
///
/// Deletion is not representable here. The tombstone lives outside the
/// value domain, as `Option::<Value>::None` in the caches and as SQL NULL
/// in storage, so user code can never assign one by accident.
///
/// Maps are kept in canonical form: pairs sorted by key, keys unique.
/// Construct them through [`Value::map`] to get that for free.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Build a canonical map from arbitrary pairs. Pairs are sorted by
    /// key; on duplicate keys the last one wins.
    pub fn map<I>(pairs: I) -> Value
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut pairs: Vec<(Value, Value)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs.dedup_by(|a, b| {
            if a.0 == b.0 {
                // keep the later pair's value
                b.1 = std::mem::replace(&mut a.1, Value::Bool(false));
                true
            } else {
                false
            }
        });
        Value::Map(pairs)
    }

    /// Variant rank, for the total order across variants.
    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

// Floats take part in equality and hashing by their bit pattern, so the
// usual f64 caveats (NaN != NaN) don't leak into map keys.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Map(m) => m.hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn map_is_canonical() {
        let a = Value::map(vec![
            (Value::from("b"), Value::from(2i64)),
            (Value::from("a"), Value::from(1i64)),
        ]);
        let b = Value::map(vec![
            (Value::from("a"), Value::from(1i64)),
            (Value::from("b"), Value::from(2i64)),
        ]);
        assert_eq!(a, b);

        // Last duplicate wins.
        let c = Value::map(vec![
            (Value::from("a"), Value::from(1i64)),
            (Value::from("a"), Value::from(3i64)),
        ]);
        assert_eq!(
            c,
            Value::Map(vec![(Value::from("a"), Value::from(3i64))])
        );
    }

    #[test]
    fn usable_as_hash_key() {
        let mut m = HashMap::new();
        m.insert(Value::from("spam"), 1);
        m.insert(Value::from(0i64), 2);
        m.insert(Value::Float(0.5), 3);
        m.insert(Value::List(vec![Value::from("eggs")]), 4);
        assert_eq!(m[&Value::from("spam")], 1);
        assert_eq!(m[&Value::from(0i64)], 2);
        assert_eq!(m[&Value::Float(0.5)], 3);
        assert_eq!(m[&Value::List(vec![Value::from("eggs")])], 4);
        // Int and Float are distinct keys even when numerically equal.
        assert!(!m.contains_key(&Value::Float(0.0)));
    }

    #[test]
    fn total_order_across_variants() {
        let mut vs = vec![
            Value::from("z"),
            Value::from(true),
            Value::Float(1.5),
            Value::from(-3i64),
            Value::List(vec![]),
        ];
        vs.sort();
        assert_eq!(
            vs,
            vec![
                Value::from(true),
                Value::from(-3i64),
                Value::Float(1.5),
                Value::from("z"),
                Value::List(vec![]),
            ]
        );
    }
}
