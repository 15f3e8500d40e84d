//! Builders converting a [`SearchFilter`] into a concrete Qdrant filter.
//!
//! qdrant-client 1.15 specifics:
//! - `Condition` is a wrapper with `condition_one_of: Option<condition::ConditionOneOf>`.
//!   There are no helper constructors like `Condition::Field`; you must set the enum.
//! - `FieldCondition.r#match` expects a `Match`, which wraps `r#match::MatchValue`.
//! - Floats are not supported by `MatchValue`; use `Range { gte, lte }` for equality-like behavior.

use crate::record::SearchFilter;
use qdrant_client::qdrant::{
    condition, r#match::MatchValue, Condition, FieldCondition, Filter, Match, Range,
};
use serde_json::Value as J;

pub fn to_qdrant_filter(f: &SearchFilter) -> Filter {
    match f {
        SearchFilter::ByFieldEq { key, value } => Filter {
            must: vec![condition_field_eq(key, value)],
            ..Default::default()
        },

        SearchFilter::And(list) => {
            let mut out = Filter::default();
            for sub in list {
                let sf = to_qdrant_filter(sub);
                out.must.extend(sf.must);
                out.should.extend(sf.should);
                out.must_not.extend(sf.must_not);
            }
            out
        }

        SearchFilter::Or(list) => {
            let mut out = Filter::default();
            for sub in list {
                let sf = to_qdrant_filter(sub);
                out.should.push(Condition {
                    condition_one_of: Some(condition::ConditionOneOf::Filter(sf)),
                });
            }
            out
        }
    }
}

/// Applies a [`SearchFilter`] to a JSON payload in-process, used by the
/// local fallback cache where there is no query planner to push the filter
/// into.
pub fn matches_filter(f: &SearchFilter, payload: &J) -> bool {
    match f {
        SearchFilter::ByFieldEq { key, value } => {
            payload.get(key).map(|v| v == value).unwrap_or(false)
        }
        SearchFilter::And(list) => list.iter().all(|sub| matches_filter(sub, payload)),
        SearchFilter::Or(list) => list.iter().any(|sub| matches_filter(sub, payload)),
    }
}

fn condition_field_eq(key: impl Into<String>, value: &J) -> Condition {
    let key = key.into();

    let field = match value {
        J::String(s) => FieldCondition {
            key,
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(s.clone())),
            }),
            ..Default::default()
        },

        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldCondition {
                    key,
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Integer(i)),
                    }),
                    ..Default::default()
                }
            } else if let Some(f) = n.as_f64() {
                FieldCondition {
                    key,
                    range: Some(Range {
                        gte: Some(f),
                        lte: Some(f),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            } else {
                FieldCondition {
                    key,
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Keyword(n.to_string())),
                    }),
                    ..Default::default()
                }
            }
        }

        J::Bool(b) => FieldCondition {
            key,
            r#match: Some(Match {
                match_value: Some(MatchValue::Boolean(*b)),
            }),
            ..Default::default()
        },

        other => FieldCondition {
            key,
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(other.to_string())),
            }),
            ..Default::default()
        },
    };

    Condition {
        condition_one_of: Some(condition::ConditionOneOf::Field(field)),
    }
}
