//! Structural comparison of expression trees.
//!
//! Two trees are structurally equal when their dumps (see
//! [`Expr::to_json`]) match field by field, ignoring one named field. The
//! formatter uses this with `"position"` to check that printed output reads
//! back as the tree it was printed from.

use crate::ast::Expr;
use log::debug;
use serde_json::Value;

/// Nesting depth at which a comparison gives up and reports a mismatch.
pub const MAX_DEPTH: usize = 2048;

pub fn structurally_equal(a: &Expr, b: &Expr, ignore_field: &str) -> bool {
    json_structurally_equal(&a.to_json(), &b.to_json(), ignore_field)
}

pub fn json_structurally_equal(a: &Value, b: &Value, ignore_field: &str) -> bool {
    compare(a, b, ignore_field, 0)
}

fn compare(a: &Value, b: &Value, ignore_field: &str, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        debug!("comparison depth exhausted");
        return false;
    }

    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let keys = |map: &serde_json::Map<String, Value>| {
                map.keys().filter(|key| *key != ignore_field).count()
            };
            if keys(left) != keys(right) {
                debug!("field count mismatch: {} vs {}", keys(left), keys(right));
                return false;
            }
            left.iter()
                .filter(|(key, _)| *key != ignore_field)
                .all(|(key, value)| match right.get(key) {
                    Some(other) => compare(value, other, ignore_field, depth + 1),
                    None => {
                        debug!("field '{}' missing on the right", key);
                        false
                    }
                })
        }
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                debug!("array length mismatch: {} vs {}", left.len(), right.len());
                return false;
            }
            left.iter()
                .zip(right)
                .all(|(x, y)| compare(x, y, ignore_field, depth + 1))
        }
        _ => {
            let equal = a == b;
            if !equal {
                debug!("value mismatch: {} vs {}", a, b);
            }
            equal
        }
    }
}
