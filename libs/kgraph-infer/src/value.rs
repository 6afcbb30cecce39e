//! Dynamic value model
//!
//! A [`Value`] is any concrete datum a query can bind, compare, or collect:
//! primitives, atoms, typed scalars (which keep their original lexical
//! form), lists, and maps. Variables are an AST concept and never appear
//! here; "unbound" is modelled as `Option::<Value>::None` at evaluation
//! boundaries, so answer sets are unbound-free by construction.

use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Map values keep insertion order for deterministic iteration; equality is
/// order-independent.
pub type ValueMap = IndexMap<Value, Value>;

/// A concrete KGraph value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Bare identifier constant; equal only to another atom with the same name.
    Atom(String),

    // Typed scalars, carrying the original lexical form.
    Date(String),
    DateTime(String),
    Time(String),
    Duration(String),
    Uri(String),
    Currency { amount: String, code: String },
    Unit { amount: String, unit: String },
    Geo { lat: f64, lon: f64 },

    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Atom(_) => "atom",
            Value::Date(_) => "date",
            Value::DateTime(_) => "dateTime",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Uri(_) => "uri",
            Value::Currency { .. } => "currency",
            Value::Unit { .. } => "unit",
            Value::Geo { .. } => "geolocation",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// JSON rendering for host consumption. Typed scalars become tagged
    /// objects; map keys are rendered with their DSL literal form when they
    /// are not plain strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Number, Value as Json};
        match self {
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::Bool(b) => Json::from(*b),
            Value::Str(s) => Json::from(s.clone()),
            Value::Atom(name) => json!({ "atom": name }),
            Value::Date(s) => json!({ "type": "date", "value": s }),
            Value::DateTime(s) => json!({ "type": "dateTime", "value": s }),
            Value::Time(s) => json!({ "type": "time", "value": s }),
            Value::Duration(s) => json!({ "type": "duration", "value": s }),
            Value::Uri(s) => json!({ "type": "uri", "value": s }),
            Value::Currency { amount, code } => {
                json!({ "type": "currency", "amount": amount, "code": code })
            }
            Value::Unit { amount, unit } => {
                json!({ "type": "unit", "amount": amount, "unit": unit })
            }
            Value::Geo { lat, lon } => json!({ "type": "geolocation", "lat": lat, "lon": lon }),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in entries {
                    let key = match k {
                        Value::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    obj.insert(key, v.to_json());
                }
                Json::Object(obj)
            }
        }
    }
}

// Numbers compare across Int/Float so a predicate binding of `35` matches a
// literal `35.0`; NaN is made self-equal to keep Eq lawful.
fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                float_eq(*a as f64, *b)
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Uri(a), Value::Uri(b)) => a == b,
            (
                Value::Currency { amount: a, code: ac },
                Value::Currency { amount: b, code: bc },
            ) => a == b && ac == bc,
            (Value::Unit { amount: a, unit: au }, Value::Unit { amount: b, unit: bu }) => {
                a == b && au == bu
            }
            (Value::Geo { lat: a, lon: b }, Value::Geo { lat: c, lon: d }) => {
                float_eq(*a, *c) && float_eq(*b, *d)
            }
            (Value::List(a), Value::List(b)) => a == b,
            // IndexMap equality is order-independent
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Int and Float share a discriminant so that cross-type numeric
        // equality stays consistent with hashing.
        match self {
            Value::Int(_) | Value::Float(_) => {
                std::mem::discriminant(&Value::Int(0)).hash(state);
            }
            _ => std::mem::discriminant(self).hash(state),
        }

        match self {
            Value::Int(i) => i.hash(state),
            Value::Float(f) => {
                // An integral float hashes like the matching integer.
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    (*f as i64).hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Value::Bool(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Atom(s) => s.hash(state),
            Value::Date(s)
            | Value::DateTime(s)
            | Value::Time(s)
            | Value::Duration(s)
            | Value::Uri(s) => s.hash(state),
            Value::Currency { amount, code } => {
                amount.hash(state);
                code.hash(state);
            }
            Value::Unit { amount, unit } => {
                amount.hash(state);
                unit.hash(state);
            }
            Value::Geo { lat, lon } => {
                lat.to_bits().hash(state);
                lon.to_bits().hash(state);
            }
            Value::List(items) => {
                for item in items {
                    item.hash(state);
                }
            }
            Value::Map(entries) => {
                // Order-independent: combine per-entry hashes commutatively.
                let mut combined: u64 = 0;
                for (k, v) in entries {
                    let mut entry_hasher = DefaultHasher::new();
                    k.hash(&mut entry_hasher);
                    v.hash(&mut entry_hasher);
                    combined = combined.wrapping_add(entry_hasher.finish());
                }
                entries.len().hash(state);
                combined.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Atom(name) => write!(f, "{}", name),
            Value::Date(s) => write!(f, "'{}'^Date", s),
            Value::DateTime(s) => write!(f, "'{}'^DateTime", s),
            Value::Time(s) => write!(f, "'{}'^Time", s),
            Value::Duration(s) => write!(f, "'{}'^Duration", s),
            Value::Uri(s) => write!(f, "'{}'^URI", s),
            Value::Currency { amount, code } => write!(f, "'{}'^Currency({})", amount, code),
            Value::Unit { amount, unit } => write!(f, "'{}'^Unit('{}')", amount, unit),
            Value::Geo { lat, lon } => write!(f, "'{:?},{:?}'^GeoLocation", lat, lon),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cross_equality() {
        assert_eq!(Value::Int(35), Value::Float(35.0));
        assert_ne!(Value::Int(35), Value::Float(35.5));
    }

    #[test]
    fn test_numeric_hash_consistency() {
        fn hash_of(v: &Value) -> u64 {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        }
        assert_eq!(hash_of(&Value::Int(35)), hash_of(&Value::Float(35.0)));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let mut a = ValueMap::new();
        a.insert(Value::Str("x".into()), Value::Int(1));
        a.insert(Value::Str("y".into()), Value::Int(2));

        let mut b = ValueMap::new();
        b.insert(Value::Str("y".into()), Value::Int(2));
        b.insert(Value::Str("x".into()), Value::Int(1));

        assert_eq!(Value::Map(a), Value::Map(b));
    }

    #[test]
    fn test_atom_distinct_from_string() {
        assert_ne!(Value::Atom("alice".into()), Value::Str("alice".into()));
    }
}
