use serde_json::Value;

/// Reads a named field from a JSON record.
///
/// Only finite JSON numbers count; strings, nulls, booleans and missing
/// fields all read as `None`.
pub fn numeric_field(name: &str) -> impl Fn(&Value) -> Option<f64> + '_ {
    move |record| {
        record
            .get(name)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_numbers_are_numeric() {
        let field = numeric_field("v");
        assert_eq!(field(&json!({"v": 3})), Some(3.0));
        assert_eq!(field(&json!({"v": -1.25})), Some(-1.25));
        assert_eq!(field(&json!({"v": "3"})), None);
        assert_eq!(field(&json!({"v": null})), None);
        assert_eq!(field(&json!({"v": true})), None);
        assert_eq!(field(&json!({"w": 1})), None);
        assert_eq!(field(&json!([1, 2])), None);
    }
}
