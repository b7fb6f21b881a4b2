#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use geoscan::engine::{update::parse_update_expression, validate_protected_attributes};
use geoscan::UpdateItemInput;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, i64>,
}

fuzz_target!(|input: FuzzInput| {
    let values: HashMap<String, serde_json::Value> = input
        .values
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::from(v)))
        .collect();

    // Parsing and validation must reject bad input without panicking.
    let _ = parse_update_expression(&input.expression, &input.names, &values);

    let mut update = UpdateItemInput::default().expression(input.expression);
    update.expression_attribute_names = input.names;
    update.expression_attribute_values = values;
    let _ = validate_protected_attributes(&update, &["hashKey", "geohash", "geoJson"]);
});
