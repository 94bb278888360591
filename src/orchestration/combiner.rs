//! Flow combination
//!
//! Folds the per-service responses of one execute call, already in declared
//! service order, into a single aggregate response.

use std::collections::HashMap;

use log::warn;
use serde_json::{Map, Value as JsonValue};

use crate::{config::FlowMode, core::Response};

const AGGREGATE_STATUS: u16 = 200;

#[derive(Clone, Copy, Debug, Default)]
pub struct FlowCombiner {
    merge_headers: bool,
}

impl FlowCombiner {
    /// `merge_headers` makes sequential flow propagate response headers,
    /// later services overwriting earlier ones. Parallel flow never does.
    pub fn new(merge_headers: bool) -> Self {
        Self { merge_headers }
    }

    pub fn combine(&self, responses: Vec<Response>, flow: FlowMode) -> Response {
        match flow {
            FlowMode::Sequential => self.sequential(responses),
            FlowMode::Parallel => Self::parallel(responses),
        }
    }

    /// Shallow merge of top-level body keys, later services win.
    ///
    /// Bodies that are not JSON objects have no key space to merge and
    /// contribute nothing; they are logged. Arrays and strings are not
    /// spread into positional keys (`"0"`, `"1"`, ...).
    fn sequential(&self, responses: Vec<Response>) -> Response {
        let mut body = Map::new();
        let mut headers = HashMap::new();

        for (index, response) in responses.into_iter().enumerate() {
            match response.body {
                JsonValue::Object(fields) => body.extend(fields),
                JsonValue::Null => {}
                other => warn!(
                    "Sequential merge skipped non-object body of response #{index}: {}",
                    json_kind(&other)
                ),
            }
            if self.merge_headers {
                headers.extend(response.headers);
            }
        }

        Response {
            status: AGGREGATE_STATUS,
            headers,
            body: JsonValue::Object(body),
        }
    }

    fn parallel(responses: Vec<Response>) -> Response {
        let bodies = responses.into_iter().map(|r| r.body).collect();
        Response::ok(JsonValue::Array(bodies))
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_header(body: JsonValue, name: &str, value: &str) -> Response {
        let mut response = Response::ok(body);
        response.headers.insert(name.to_string(), value.to_string());
        response
    }

    #[test]
    fn test_sequential_later_keys_win() {
        let combined = FlowCombiner::default().combine(
            vec![
                Response::ok(json!({"x": 1})),
                Response::ok(json!({"x": 2, "y": 3})),
            ],
            FlowMode::Sequential,
        );
        assert_eq!(combined.status, 200);
        assert_eq!(combined.body, json!({"x": 2, "y": 3}));
    }

    #[test]
    fn test_sequential_is_left_fold() {
        let a = Response::ok(json!({"a": 1, "shared": "a"}));
        let b = Response::ok(json!({"b": 2, "shared": "b"}));
        let c = Response::ok(json!({"c": 3}));
        let combiner = FlowCombiner::default();

        let all = combiner.combine(vec![a.clone(), b.clone(), c.clone()], FlowMode::Sequential);
        let ab = combiner.combine(vec![a, b], FlowMode::Sequential);
        let stepwise = combiner.combine(vec![ab, c], FlowMode::Sequential);

        assert_eq!(all.body, stepwise.body);
        assert_eq!(all.body, json!({"a": 1, "b": 2, "c": 3, "shared": "b"}));
    }

    #[test]
    fn test_sequential_merge_is_shallow() {
        let combined = FlowCombiner::default().combine(
            vec![
                Response::ok(json!({"nested": {"a": 1}})),
                Response::ok(json!({"nested": {"b": 2}})),
            ],
            FlowMode::Sequential,
        );
        assert_eq!(combined.body, json!({"nested": {"b": 2}}));
    }

    #[test]
    fn test_sequential_skips_non_object_bodies() {
        let combined = FlowCombiner::default().combine(
            vec![
                Response::ok(json!({"a": 1})),
                Response::ok(json!([1, 2])),
                Response::ok(JsonValue::Null),
                Response::ok(json!("text")),
            ],
            FlowMode::Sequential,
        );
        assert_eq!(combined.body, json!({"a": 1}));
    }

    #[test]
    fn test_sequential_status_is_always_200() {
        let combined = FlowCombiner::default().combine(
            vec![Response::new(404, json!({"error": "missing"}))],
            FlowMode::Sequential,
        );
        assert_eq!(combined.status, 200);
        assert_eq!(combined.body, json!({"error": "missing"}));
    }

    #[test]
    fn test_sequential_headers() {
        let responses = vec![
            with_header(json!({}), "x-a", "1"),
            with_header(json!({}), "x-a", "2"),
        ];

        let dropped = FlowCombiner::new(false).combine(responses.clone(), FlowMode::Sequential);
        assert!(dropped.headers.is_empty());

        let merged = FlowCombiner::new(true).combine(responses, FlowMode::Sequential);
        assert_eq!(merged.headers.get("x-a").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parallel_preserves_input_order() {
        let combined = FlowCombiner::new(true).combine(
            vec![
                with_header(json!({"s": 1}), "x-a", "1"),
                Response::ok(json!("two")),
                Response::ok(json!({"s": 3})),
            ],
            FlowMode::Parallel,
        );
        assert_eq!(combined.status, 200);
        assert_eq!(combined.body, json!([{"s": 1}, "two", {"s": 3}]));
        assert!(combined.headers.is_empty());
    }

    #[test]
    fn test_empty_responses() {
        let combiner = FlowCombiner::default();
        let sequential = combiner.combine(vec![], FlowMode::Sequential);
        assert_eq!(sequential.status, 200);
        assert_eq!(sequential.body, json!({}));

        let parallel = combiner.combine(vec![], FlowMode::Parallel);
        assert_eq!(parallel.status, 200);
        assert_eq!(parallel.body, json!([]));
    }
}
