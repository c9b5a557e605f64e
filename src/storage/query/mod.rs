//! Rich-query evaluation shared by the ledger back-ends.
//!
//! Expressions follow the CouchDB Mango shape:
//! `{"selector": {...}, "sort": [...], "limit": n, "skip": n}`.
//! Only values that decode as JSON objects take part in a query.

pub mod collation;
pub mod selector;

pub use selector::{Condition, JsonType, Selector};

use collation::collate;
use selector::lookup;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidQuery(pub String);

impl InvalidQuery {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Where a result sits in a query's order: the values of its sort fields
/// (absent fields are left out, keyed by sort position) then its key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Cursor {
    pub key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sort: BTreeMap<usize, Value>,
}

#[derive(Deserialize)]
struct RawQuery {
    selector: Option<Value>,
    #[serde(default)]
    sort: Vec<Value>,
    limit: Option<usize>,
    #[serde(default)]
    skip: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct SortField {
    path: Vec<String>,
    descending: bool,
}

impl SortField {
    fn parse(entry: &Value) -> Result<Self, InvalidQuery> {
        let split = |field: &str| field.split('.').map(str::to_string).collect::<Vec<_>>();
        match entry {
            Value::String(field) => Ok(SortField {
                path: split(field),
                descending: false,
            }),
            Value::Object(map) if map.len() == 1 => {
                let (field, direction) = map
                    .iter()
                    .next()
                    .ok_or_else(|| InvalidQuery::new("empty sort entry"))?;
                let descending = match direction.as_str() {
                    Some("asc") => false,
                    Some("desc") => true,
                    _ => {
                        return Err(InvalidQuery::new(format!(
                            "sort direction for '{field}' must be \"asc\" or \"desc\""
                        )))
                    }
                };
                Ok(SortField {
                    path: split(field),
                    descending,
                })
            }
            other => Err(InvalidQuery::new(format!("invalid sort entry {other}"))),
        }
    }
}

/// A parsed rich-query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct RichQuery {
    selector: Selector,
    sort: Vec<SortField>,
    limit: Option<usize>,
    skip: usize,
}

impl RichQuery {
    pub fn parse(expression: &str) -> Result<Self, InvalidQuery> {
        let raw: RawQuery = serde_json::from_str(expression)
            .map_err(|e| InvalidQuery::new(format!("query is not a valid JSON object: {e}")))?;
        let selector = raw
            .selector
            .ok_or_else(|| InvalidQuery::new("query must contain a selector"))?;
        Ok(Self {
            selector: Selector::parse(&selector)?,
            sort: raw
                .sort
                .iter()
                .map(SortField::parse)
                .collect::<Result<Vec<_>, _>>()?,
            limit: raw.limit,
            skip: raw.skip,
        })
    }

    pub fn matches(&self, doc: &Value) -> bool {
        doc.is_object() && self.selector.matches(doc)
    }

    /// Filters key-ordered entries and applies the requested sort. Entries
    /// whose values are not JSON objects are skipped. `limit` and `skip` are
    /// not applied here, see [`RichQuery::window`].
    pub fn select<I>(&self, entries: I) -> Vec<(String, Vec<u8>)>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        self.select_documents(entries)
            .into_iter()
            .map(|(key, _, bytes)| (key, bytes))
            .collect()
    }

    /// Like [`RichQuery::select`], but keeps the decoded document of each hit.
    pub fn select_documents<I>(&self, entries: I) -> Vec<(String, Value, Vec<u8>)>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut hits: Vec<(String, Value, Vec<u8>)> = entries
            .into_iter()
            .filter_map(|(key, bytes)| {
                let doc: Value = serde_json::from_slice(&bytes).ok()?;
                self.matches(&doc).then_some((key, doc, bytes))
            })
            .collect();

        if !self.sort.is_empty() {
            hits.sort_by(|a, b| self.compare(&a.1, &b.1).then_with(|| a.0.cmp(&b.0)));
        }
        hits
    }

    /// Position of `doc` stored under `key` in this query's result order.
    pub fn cursor(&self, key: &str, doc: &Value) -> Cursor {
        let sort = self
            .sort
            .iter()
            .enumerate()
            .filter_map(|(i, field)| lookup(doc, &field.path).map(|v| (i, v.clone())))
            .collect();
        Cursor {
            key: key.to_string(),
            sort,
        }
    }

    /// Orders a hit against a cursor exactly as [`RichQuery::select`] orders
    /// two hits.
    pub fn cmp_to_cursor(&self, key: &str, doc: &Value, cursor: &Cursor) -> Ordering {
        for (i, field) in self.sort.iter().enumerate() {
            let ord = compare_present(lookup(doc, &field.path), cursor.sort.get(&i));
            let ord = if field.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        key.cmp(cursor.key.as_str())
    }

    /// Applies `skip` and `limit` to already selected results.
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for field in &self.sort {
            let ord = compare_present(lookup(a, &field.path), lookup(b, &field.path));
            let ord = if field.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Missing fields sort before every present value.
fn compare_present(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => collate(x, y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: Value) -> (String, Vec<u8>) {
        (key.to_string(), serde_json::to_vec(&value).unwrap())
    }

    fn keys(hits: &[(String, Vec<u8>)]) -> Vec<&str> {
        hits.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn fixtures() -> Vec<(String, Vec<u8>)> {
        vec![
            entry("a", json!({"kind": "contract", "loanDate": "2024-03-01"})),
            entry("b", json!({"kind": "evidence"})),
            entry("c", json!({"kind": "contract", "loanDate": "2024-01-01"})),
            ("d".to_string(), b"not json".to_vec()),
            entry("e", json!(["an", "array"])),
        ]
    }

    #[test]
    fn selects_in_key_order_and_skips_non_objects() {
        let q = RichQuery::parse(r#"{"selector":{}}"#).unwrap();
        assert_eq!(keys(&q.select(fixtures())), vec!["a", "b", "c"]);
    }

    #[test]
    fn sorts_by_requested_fields() {
        let q = RichQuery::parse(
            r#"{"selector":{"kind":"contract"},"sort":[{"loanDate":"asc"}]}"#,
        )
        .unwrap();
        assert_eq!(keys(&q.select(fixtures())), vec!["c", "a"]);

        let q = RichQuery::parse(r#"{"selector":{"kind":"contract"},"sort":[{"loanDate":"desc"}]}"#)
            .unwrap();
        assert_eq!(keys(&q.select(fixtures())), vec!["a", "c"]);
    }

    #[test]
    fn cursor_orders_like_select() {
        let q = RichQuery::parse(r#"{"selector":{},"sort":[{"loanDate":"asc"}]}"#).unwrap();
        let b = json!({"kind": "evidence"});
        let cursor = q.cursor("b", &b);
        assert!(cursor.sort.is_empty());

        // "b" has no loanDate, so it sorts first and every dated hit follows it.
        let hits = q.select_documents(fixtures());
        let after: Vec<&str> = hits
            .iter()
            .filter(|(k, doc, _)| q.cmp_to_cursor(k, doc, &cursor) == Ordering::Greater)
            .map(|(k, _, _)| k.as_str())
            .collect();
        assert_eq!(after, vec!["c", "a"]);

        let c = json!({"kind": "contract", "loanDate": "2024-01-01"});
        let cursor = q.cursor("c", &c);
        assert_eq!(cursor.sort.get(&0), Some(&json!("2024-01-01")));
        assert_eq!(q.cmp_to_cursor("c", &c, &cursor), Ordering::Equal);
    }

    #[test]
    fn window_applies_skip_and_limit() {
        let q = RichQuery::parse(r#"{"selector":{},"skip":1,"limit":1}"#).unwrap();
        let hits = q.window(q.select(fixtures()));
        assert_eq!(keys(&hits), vec!["b"]);
    }

    #[test]
    fn ignores_unknown_top_level_keys() {
        assert!(RichQuery::parse(r#"{"selector":{},"use_index":"idx","fields":["a"]}"#).is_ok());
    }

    #[test]
    fn rejects_bad_expressions() {
        assert!(RichQuery::parse("not json").is_err());
        assert!(RichQuery::parse(r#"{"limit":1}"#).is_err());
        assert!(RichQuery::parse(r#"{"selector":{},"sort":[{"a":"up"}]}"#).is_err());
        assert!(RichQuery::parse(r#"{"selector":{},"limit":-1}"#).is_err());
    }
}
