//! Mango-style selectors: parsed once into a tree, then matched against
//! every candidate document.

use super::collation::{collate, collates_equal};
use super::InvalidQuery;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every clause must match. An empty list matches everything.
    All(Vec<Selector>),
    Any(Vec<Selector>),
    NoneOf(Vec<Selector>),
    Not(Box<Selector>),
    Field {
        path: Vec<String>,
        condition: Condition,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Type(JsonType),
    Size(usize),
    All(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }
}

impl Selector {
    pub fn parse(value: &Value) -> Result<Self, InvalidQuery> {
        let map = value
            .as_object()
            .ok_or_else(|| InvalidQuery::new("selector must be a JSON object"))?;
        parse_object(map, &[])
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Selector::All(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Selector::Any(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Selector::NoneOf(clauses) => !clauses.iter().any(|c| c.matches(doc)),
            Selector::Not(inner) => !inner.matches(doc),
            Selector::Field { path, condition } => condition.matches(lookup(doc, path)),
        }
    }
}

/// Resolves a field path inside a document; `None` when any segment is missing.
pub fn lookup<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

fn conjunction(mut clauses: Vec<Selector>) -> Selector {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        Selector::All(clauses)
    }
}

fn parse_object(map: &Map<String, Value>, prefix: &[String]) -> Result<Selector, InvalidQuery> {
    let mut clauses = Vec::with_capacity(map.len());
    for (key, value) in map {
        if let Some(op) = key.strip_prefix('$') {
            clauses.push(parse_combination(op, value)?);
        } else {
            let mut path = prefix.to_vec();
            path.extend(key.split('.').map(str::to_string));
            clauses.push(parse_field(path, value)?);
        }
    }
    Ok(conjunction(clauses))
}

fn parse_combination(op: &str, value: &Value) -> Result<Selector, InvalidQuery> {
    match op {
        "and" | "or" | "nor" => {
            let items = value
                .as_array()
                .filter(|items| !items.is_empty())
                .ok_or_else(|| InvalidQuery::new(format!("${op} expects a non-empty array")))?;
            let clauses = items
                .iter()
                .map(Selector::parse)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match op {
                "and" => Selector::All(clauses),
                "or" => Selector::Any(clauses),
                _ => Selector::NoneOf(clauses),
            })
        }
        "not" => Ok(Selector::Not(Box::new(Selector::parse(value)?))),
        other => Err(InvalidQuery::new(format!("unsupported operator ${other}"))),
    }
}

fn parse_field(path: Vec<String>, value: &Value) -> Result<Selector, InvalidQuery> {
    let map = match value {
        Value::Object(map) if !map.is_empty() => map,
        other => {
            return Ok(Selector::Field {
                path,
                condition: Condition::Eq(other.clone()),
            })
        }
    };

    let operators = map.keys().filter(|k| k.starts_with('$')).count();
    if operators == 0 {
        // Plain sub-object: a nested selector on the embedded document.
        return parse_object(map, &path);
    }
    if operators != map.len() {
        return Err(InvalidQuery::new(format!(
            "field '{}' mixes operators and sub-fields",
            path.join(".")
        )));
    }

    let mut clauses = Vec::with_capacity(map.len());
    for (op, operand) in map {
        if op == "$not" {
            clauses.push(Selector::Not(Box::new(parse_field(path.clone(), operand)?)));
        } else {
            clauses.push(Selector::Field {
                path: path.clone(),
                condition: Condition::parse(op, operand)?,
            });
        }
    }
    Ok(conjunction(clauses))
}

impl Condition {
    fn parse(op: &str, operand: &Value) -> Result<Self, InvalidQuery> {
        let array = || {
            operand
                .as_array()
                .cloned()
                .ok_or_else(|| InvalidQuery::new(format!("{op} expects an array")))
        };
        Ok(match op {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$in" => Condition::In(array()?),
            "$nin" => Condition::Nin(array()?),
            "$all" => Condition::All(array()?),
            "$exists" => Condition::Exists(
                operand
                    .as_bool()
                    .ok_or_else(|| InvalidQuery::new("$exists expects a boolean"))?,
            ),
            "$type" => Condition::Type(
                operand
                    .as_str()
                    .and_then(JsonType::parse)
                    .ok_or_else(|| InvalidQuery::new(format!("$type got unknown type {operand}")))?,
            ),
            "$size" => Condition::Size(
                operand
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| InvalidQuery::new("$size expects a non-negative integer"))?,
            ),
            other => return Err(InvalidQuery::new(format!("unsupported operator {other}"))),
        })
    }

    fn matches(&self, field: Option<&Value>) -> bool {
        let Some(value) = field else {
            return matches!(self, Condition::Exists(false));
        };
        match self {
            Condition::Exists(expected) => *expected,
            Condition::Eq(v) => collates_equal(value, v),
            Condition::Ne(v) => !collates_equal(value, v),
            Condition::Gt(v) => collate(value, v) == Ordering::Greater,
            Condition::Gte(v) => collate(value, v) != Ordering::Less,
            Condition::Lt(v) => collate(value, v) == Ordering::Less,
            Condition::Lte(v) => collate(value, v) != Ordering::Greater,
            Condition::In(vs) => vs.iter().any(|v| collates_equal(value, v)),
            Condition::Nin(vs) => !vs.iter().any(|v| collates_equal(value, v)),
            Condition::Type(t) => JsonType::of(value) == *t,
            Condition::Size(n) => value.as_array().is_some_and(|a| a.len() == *n),
            Condition::All(vs) => value
                .as_array()
                .is_some_and(|a| vs.iter().all(|v| a.iter().any(|e| collates_equal(e, v)))),
        }
    }
}
