//! Total ordering over JSON values, following CouchDB view collation:
//! null < false < true < numbers < strings < arrays < objects.

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => compare_arrays(x, y),
        (Value::Object(x), Value::Object(y)) => compare_objects(x, y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Values are equal when they collate equal, so `1` and `1.0` match.
pub fn collates_equal(a: &Value, b: &Value) -> bool {
    collate(a, b) == Ordering::Equal
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(0.0);
    let b = y.as_f64().unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_arrays(x: &[Value], y: &[Value]) -> Ordering {
    for (l, r) in x.iter().zip(y.iter()) {
        let ord = collate(l, r);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

fn compare_objects(x: &Map<String, Value>, y: &Map<String, Value>) -> Ordering {
    for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
        let ord = lk.cmp(rk).then_with(|| collate(lv, rv));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_order() {
        let ordered = [
            json!(null),
            json!(false),
            json!(true),
            json!(-5),
            json!(3.5),
            json!("a"),
            json!("b"),
            json!([1]),
            json!({"a": 1}),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(collate(&pair[0], &pair[1]), Ordering::Less, "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn integer_and_float_compare_by_value() {
        assert!(collates_equal(&json!(1), &json!(1.0)));
        assert_eq!(collate(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(collate(&json!(u64::MAX), &json!(1)), Ordering::Greater);
    }

    #[test]
    fn strings_compare_lexicographically() {
        // "1000" < "999" as strings; amounts are not numbers.
        assert_eq!(collate(&json!("1000"), &json!("999")), Ordering::Less);
    }

    #[test]
    fn arrays_compare_element_wise_then_by_length() {
        assert_eq!(collate(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(collate(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
    }
}
