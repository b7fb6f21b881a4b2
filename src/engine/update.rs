//! Item updates: per-attribute actions and a small update-expression
//! language (`SET a = :v`, `REMOVE a`, `ADD a :n`, `DELETE a :v`), plus the
//! guard that keeps derived index attributes out of reach of callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::storage::{Attributes, GeoItem, PrimaryKey};
use crate::error::{GeoError, GeoResult, StoreError, StoreResult};

const CLAUSE_KEYWORDS: [&str; 4] = ["SET", "REMOVE", "ADD", "DELETE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeAction {
    Put,
    Add,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValueUpdate {
    pub action: AttributeAction,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Update of one item. Attribute names are caller attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateItemInput {
    pub attribute_updates: HashMap<String, AttributeValueUpdate>,
    pub update_expression: Option<String>,
    /// `#placeholder` -> attribute name.
    pub expression_attribute_names: HashMap<String, String>,
    /// `:placeholder` -> value.
    pub expression_attribute_values: HashMap<String, Value>,
}

/// [`UpdateItemInput`] bound to the item it targets.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemRequest {
    pub key: PrimaryKey,
    pub input: UpdateItemInput,
}

/// One parsed clause of an update expression.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateClause {
    Set { name: String, value: Value },
    Remove { name: String },
    Add { name: String, value: Value },
    Delete { name: String, value: Value },
}

/// An attribute reference found in an update expression.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameRef {
    name: String,
    alias: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl UpdateItemInput {
    pub fn is_empty(&self) -> bool {
        self.attribute_updates.is_empty()
            && self
                .update_expression
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
    }

    pub fn put(
        mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.attribute_updates.insert(
            name.into(),
            AttributeValueUpdate {
                action: AttributeAction::Put,
                value: Some(value),
            },
        );
        self
    }

    pub fn expression(
        mut self,
        expression: impl Into<String>,
    ) -> Self {
        self.update_expression = Some(expression.into());
        self
    }

    pub fn name(
        mut self,
        placeholder: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.expression_attribute_names
            .insert(placeholder.into(), name.into());
        self
    }

    pub fn value(
        mut self,
        placeholder: impl Into<String>,
        value: Value,
    ) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value);
        self
    }
}

fn is_keyword(token: &str) -> bool {
    CLAUSE_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(token))
}

/// Splits an expression into words, keeping `=` and `,` as their own
/// tokens.
fn tokenize(expression: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in expression.chars() {
        match ch {
            c if c.is_whitespace() || c == ',' || c == '=' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                if !c.is_whitespace() {
                    tokens.push(c.to_string());
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseKind {
    Set,
    Remove,
    Add,
    Delete,
}

/// A clause as written: action, target path and value placeholder.
#[derive(Debug)]
struct RawClause<'a> {
    kind: ClauseKind,
    path: &'a str,
    operand: Option<&'a str>,
}

fn clause_kind(token: &str) -> Option<ClauseKind> {
    match token.to_ascii_uppercase().as_str() {
        "SET" => Some(ClauseKind::Set),
        "REMOVE" => Some(ClauseKind::Remove),
        "ADD" => Some(ClauseKind::Add),
        "DELETE" => Some(ClauseKind::Delete),
        _ => None,
    }
}

fn is_separator(token: &str) -> bool {
    token == "," || token == "=" || is_keyword(token)
}

/// Splits the token stream into clauses. Clauses of one section must be
/// separated by `,`; anything else between two clauses is an error.
///
/// Validation and application both go through here, so every clause an
/// update applies is a clause the protected-attribute check has seen.
fn split_clauses(tokens: &[String]) -> StoreResult<Vec<RawClause<'_>>> {
    let token_at = |at: usize| tokens.get(at).map(String::as_str);
    let mut clauses = Vec::new();
    let mut kind: Option<ClauseKind> = None;
    let mut i = 0;

    while let Some(token) = token_at(i) {
        if let Some(next) = clause_kind(token) {
            if token_at(i + 1).map_or(true, is_separator) {
                return Err(StoreError::InvalidUpdate(format!(
                    "{} needs at least one clause",
                    token.to_ascii_uppercase()
                )));
            }
            kind = Some(next);
            i += 1;
            continue;
        }

        let Some(kind) = kind else {
            return Err(StoreError::InvalidUpdate(format!(
                "expression must start with SET, REMOVE, ADD or DELETE, found '{token}'"
            )));
        };
        if is_separator(token) || token.starts_with(':') {
            return Err(StoreError::InvalidUpdate(format!(
                "expected an attribute name, found '{token}'"
            )));
        }
        let operand = |at: usize| match token_at(at) {
            Some(t) if !is_separator(t) => Ok(t),
            _ => Err(StoreError::InvalidUpdate(format!(
                "missing operand for {token}"
            ))),
        };

        let (operand, width) = match kind {
            ClauseKind::Set => {
                if token_at(i + 1) != Some("=") {
                    return Err(StoreError::InvalidUpdate(format!(
                        "expected '=' after {token}"
                    )));
                }
                (Some(operand(i + 2)?), 3)
            }
            ClauseKind::Remove => (None, 1),
            ClauseKind::Add | ClauseKind::Delete => (Some(operand(i + 1)?), 2),
        };
        clauses.push(RawClause {
            kind,
            path: token,
            operand,
        });
        i += width;

        match token_at(i) {
            None => {}
            Some(",") => {
                if token_at(i + 1).map_or(true, is_separator) {
                    return Err(StoreError::InvalidUpdate(
                        "dangling ',' in update expression".to_string(),
                    ));
                }
                i += 1;
            }
            Some(t) if is_keyword(t) => {}
            Some(t) => {
                return Err(StoreError::InvalidUpdate(format!(
                    "expected ',' or a clause keyword before '{t}'"
                )));
            }
        }
    }
    Ok(clauses)
}

/// Top-level attribute of a document path (`a.b[0]` -> `a`).
fn path_head(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or(path)
}

fn resolve_name(
    token: &str,
    names: &HashMap<String, String>,
) -> StoreResult<NameRef> {
    let head = path_head(token);
    if head.starts_with('#') {
        let name = names.get(head).ok_or_else(|| {
            StoreError::InvalidUpdate(format!("undefined attribute name placeholder {head}"))
        })?;
        Ok(NameRef {
            name: name.clone(),
            alias: Some(head.to_string()),
        })
    } else if head.is_empty() || head.starts_with(':') {
        Err(StoreError::InvalidUpdate(format!(
            "expected an attribute name, found '{token}'"
        )))
    } else {
        Ok(NameRef {
            name: head.to_string(),
            alias: None,
        })
    }
}

fn resolve_value(
    token: &str,
    values: &HashMap<String, Value>,
) -> StoreResult<Value> {
    if !token.starts_with(':') {
        return Err(StoreError::InvalidUpdate(format!(
            "expected a value placeholder, found '{token}'"
        )));
    }
    values
        .get(token)
        .cloned()
        .ok_or_else(|| StoreError::InvalidUpdate(format!("undefined value placeholder {token}")))
}

/// Every attribute an expression writes to, in clause order.
fn clause_targets(
    expression: &str,
    names: &HashMap<String, String>,
) -> StoreResult<Vec<NameRef>> {
    let tokens = tokenize(expression);
    split_clauses(&tokens)?
        .iter()
        .map(|clause| resolve_name(clause.path, names))
        .collect()
}

/// Rejects updates that touch any `protected` attribute, comparing names
/// case-insensitively. Placeholders are resolved through the expression
/// attribute names. A malformed expression is rejected as well, since the
/// store would refuse it anyway.
pub fn validate_protected_attributes(
    input: &UpdateItemInput,
    protected: &[&str],
) -> GeoResult<()> {
    let find = |name: &str| {
        protected
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(|p| p.to_string())
    };

    let mut update_names: Vec<&String> = input.attribute_updates.keys().collect();
    update_names.sort();
    for name in update_names {
        if let Some(attribute) = find(path_head(name)) {
            return Err(GeoError::ProtectedAttribute {
                attribute,
                alias: None,
            });
        }
    }

    if let Some(expression) = input.update_expression.as_deref() {
        for name_ref in clause_targets(expression, &input.expression_attribute_names)? {
            if let Some(attribute) = find(&name_ref.name) {
                return Err(GeoError::ProtectedAttribute {
                    attribute,
                    alias: name_ref.alias,
                });
            }
        }
    }
    Ok(())
}

/// Parses an update expression into clauses.
pub fn parse_update_expression(
    expression: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, Value>,
) -> StoreResult<Vec<UpdateClause>> {
    let tokens = tokenize(expression);
    split_clauses(&tokens)?
        .into_iter()
        .map(|clause| {
            let name = resolve_name(clause.path, names)?.name;
            let value = clause
                .operand
                .map(|operand| resolve_value(operand, values))
                .transpose()?;
            Ok(match (clause.kind, value) {
                (ClauseKind::Set, Some(value)) => UpdateClause::Set { name, value },
                (ClauseKind::Add, Some(value)) => UpdateClause::Add { name, value },
                (ClauseKind::Delete, Some(value)) => UpdateClause::Delete { name, value },
                _ => UpdateClause::Remove { name },
            })
        })
        .collect()
}

fn add_value(
    attributes: &mut Attributes,
    name: &str,
    value: Value,
) -> StoreResult<()> {
    let current = attributes.remove(name);
    let updated = match (current, value) {
        (None, value @ (Value::Number(_) | Value::Array(_))) => value,
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Value::from(x.checked_add(y).ok_or_else(|| {
                StoreError::InvalidUpdate(format!("ADD overflows attribute {name}"))
            })?),
            _ => {
                let sum = a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default();
                serde_json::Number::from_f64(sum)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        StoreError::InvalidUpdate(format!("ADD produced a non-finite {name}"))
                    })?
            }
        },
        (Some(Value::Array(mut set)), Value::Array(extra)) => {
            for v in extra {
                if !set.contains(&v) {
                    set.push(v);
                }
            }
            Value::Array(set)
        }
        (current, value) => {
            if let Some(current) = current {
                attributes.insert(name.to_string(), current);
            }
            return Err(StoreError::InvalidUpdate(format!(
                "ADD needs a number or a set for {name}, got {value}"
            )));
        }
    };
    attributes.insert(name.to_string(), updated);
    Ok(())
}

fn delete_value(
    attributes: &mut Attributes,
    name: &str,
    value: Option<Value>,
) -> StoreResult<()> {
    match value {
        None => {
            attributes.remove(name);
        }
        Some(Value::Array(remove)) => {
            if let Some(Value::Array(set)) = attributes.get_mut(name) {
                set.retain(|v| !remove.contains(v));
            }
        }
        Some(other) => {
            return Err(StoreError::InvalidUpdate(format!(
                "DELETE needs a set of values for {name}, got {other}"
            )));
        }
    }
    Ok(())
}

/// Applies `input` to a copy of the item's attributes; the item is only
/// changed when every part of the update succeeds.
pub fn apply_update(
    item: &mut GeoItem,
    input: &UpdateItemInput,
) -> StoreResult<()> {
    let mut attributes = item.attributes.clone();

    let mut names: Vec<&String> = input.attribute_updates.keys().collect();
    names.sort();
    for name in names {
        let update = &input.attribute_updates[name];
        match update.action {
            AttributeAction::Put => {
                let value = update.value.clone().ok_or_else(|| {
                    StoreError::InvalidUpdate(format!("PUT of {name} needs a value"))
                })?;
                attributes.insert(name.clone(), value);
            }
            AttributeAction::Add => {
                let value = update.value.clone().ok_or_else(|| {
                    StoreError::InvalidUpdate(format!("ADD of {name} needs a value"))
                })?;
                add_value(&mut attributes, name, value)?;
            }
            AttributeAction::Delete => delete_value(&mut attributes, name, update.value.clone())?,
        }
    }

    if let Some(expression) = input.update_expression.as_deref() {
        let clauses = parse_update_expression(
            expression,
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )?;
        for clause in clauses {
            match clause {
                UpdateClause::Set { name, value } => {
                    attributes.insert(name, value);
                }
                UpdateClause::Remove { name } => {
                    attributes.remove(&name);
                }
                UpdateClause::Add { name, value } => add_value(&mut attributes, &name, value)?,
                UpdateClause::Delete { name, value } => {
                    delete_value(&mut attributes, &name, Some(value))?
                }
            }
        }
    }

    item.attributes = attributes;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    const PROTECTED: [&str; 2] = ["geohash", "geoJson"];

    fn item() -> GeoItem {
        let mut attributes = Attributes::new();
        attributes.insert("city".to_string(), json!("Londinium"));
        attributes.insert("visits".to_string(), json!(1));
        attributes.insert("tags".to_string(), json!(["old"]));
        attributes.insert("obsolete".to_string(), json!(true));
        GeoItem {
            hash_key: 51,
            range_key: "london".to_string(),
            geohash: 5_177_531_549_489_041_509,
            geo_json: r#"{"type":"Point","coordinates":[-0.13,51.51]}"#.to_string(),
            attributes,
        }
    }

    fn protected_err(input: &UpdateItemInput) -> String {
        validate_protected_attributes(input, &PROTECTED)
            .unwrap_err()
            .to_string()
    }

    #[rstest]
    #[case("SET geohash = :v", "geohash", None)]
    #[case("SET geoJson = :v", "geoJson", None)]
    #[case("SET GEOHASH = :v", "geohash", None)]
    #[case("SET city = :c, geohash = :v, country = :k", "geohash", None)]
    #[case("REMOVE geojson", "geoJson", None)]
    #[case("SET city = :c ADD geohash :v", "geohash", None)]
    #[case("ADD GEOJSON :v", "geoJson", None)]
    #[case("DELETE geoJson :v", "geoJson", None)]
    #[case("REMOVE city, #gh.x", "geohash", Some("#gh"))]
    #[case("SET #gh[0] = :v", "geohash", Some("#gh"))]
    #[case("SET geoJson.coordinates = :v", "geoJson", None)]
    fn test_expression_touching_protected_attribute(
        #[case] expression: &str,
        #[case] attribute: &str,
        #[case] alias: Option<&str>,
    ) {
        let input = UpdateItemInput::default()
            .expression(expression)
            .name("#gh", "geohash");
        let err = validate_protected_attributes(&input, &PROTECTED).unwrap_err();
        assert!(matches!(
            err,
            GeoError::ProtectedAttribute { attribute: ref a, alias: ref al }
                if a == attribute && al.as_deref() == alias
        ));
    }

    #[test]
    fn test_alias_is_reported() {
        let input = UpdateItemInput::default()
            .expression("SET #gh = :val")
            .name("#gh", "geohash");
        let message = protected_err(&input);
        assert!(message.contains("Cannot update protected attribute: geohash (referenced as #gh)"));
        assert!(message.contains("auto-generated"));

        let input = UpdateItemInput::default()
            .expression("SET #geo = :val")
            .name("#geo", "GeoJSON");
        assert!(protected_err(&input).contains("geoJson (referenced as #geo)"));
    }

    #[test]
    fn test_attribute_updates_touching_protected_attribute() {
        let input = UpdateItemInput::default().put("geohash", json!(12345));
        let message = protected_err(&input);
        assert!(message.starts_with("Cannot update protected attribute: geohash."));
    }

    #[test]
    fn test_unprotected_updates_pass() {
        let input = UpdateItemInput::default()
            .put("city", json!("London"))
            .expression("SET #city = :c, #country = :k ADD visitCount :inc REMOVE oldField")
            .name("#city", "city")
            .name("#country", "country");
        assert!(validate_protected_attributes(&input, &PROTECTED).is_ok());
    }

    /// Clauses must be comma separated; a run-on clause never reaches the
    /// store, whatever it targets.
    #[rstest]
    #[case("SET city = :v geohash = :g")]
    #[case("SET city = :v #gh = :g")]
    #[case("SET city = :v GEOJSON = :g")]
    #[case("REMOVE city geohash")]
    #[case("ADD visits :v geohash :g")]
    #[case("SET city = :v,")]
    #[case("SET , city = :v")]
    #[case("SET")]
    #[case("SET city = :v REMOVE")]
    fn test_malformed_expression_is_rejected(#[case] expression: &str) {
        let input = UpdateItemInput::default()
            .expression(expression)
            .name("#gh", "geohash")
            .value(":v", json!(1))
            .value(":g", json!(2));
        assert!(matches!(
            validate_protected_attributes(&input, &PROTECTED),
            Err(GeoError::Store(StoreError::InvalidUpdate(_)))
        ));

        let mut item = item();
        let before = item.clone();
        assert!(apply_update(&mut item, &input).is_err());
        assert_eq!(item, before);
    }

    /// Values never count as attribute references.
    #[test]
    fn test_value_placeholders_are_not_names() {
        let input = UpdateItemInput::default()
            .expression("SET city = :geohash")
            .value(":geohash", json!("x"));
        assert!(validate_protected_attributes(&input, &PROTECTED).is_ok());
    }

    #[test]
    fn test_parse_clauses() {
        let input = UpdateItemInput::default()
            .expression("SET #c = :c, country = :k ADD visits :one REMOVE obsolete DELETE tags :t")
            .name("#c", "city")
            .value(":c", json!("London"))
            .value(":k", json!("UK"))
            .value(":one", json!(1))
            .value(":t", json!(["old"]));
        let clauses = parse_update_expression(
            input.update_expression.as_deref().unwrap(),
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )
        .unwrap();
        assert_eq!(
            clauses,
            vec![
                UpdateClause::Set {
                    name: "city".to_string(),
                    value: json!("London")
                },
                UpdateClause::Set {
                    name: "country".to_string(),
                    value: json!("UK")
                },
                UpdateClause::Add {
                    name: "visits".to_string(),
                    value: json!(1)
                },
                UpdateClause::Remove {
                    name: "obsolete".to_string()
                },
                UpdateClause::Delete {
                    name: "tags".to_string(),
                    value: json!(["old"])
                },
            ]
        );
    }

    #[rstest]
    #[case("city = :c")]
    #[case("SET city :c")]
    #[case("SET city = :missing")]
    #[case("SET #unknown = :c")]
    #[case("ADD visits")]
    #[case("SET city = :c country = :c")]
    #[case("REMOVE city obsolete")]
    #[case("SET city = :c,, country = :c")]
    fn test_parse_rejects_malformed(#[case] expression: &str) {
        let values = HashMap::from([(":c".to_string(), json!("x"))]);
        assert!(matches!(
            parse_update_expression(expression, &HashMap::new(), &values),
            Err(StoreError::InvalidUpdate(_))
        ));
    }

    #[test]
    fn test_apply_update() {
        let mut item = item();
        let input = UpdateItemInput::default()
            .put("country", json!("UK"))
            .expression("SET city = :c ADD visits :one, tags :t REMOVE obsolete")
            .value(":c", json!("London"))
            .value(":one", json!(2))
            .value(":t", json!(["new", "old"]));
        apply_update(&mut item, &input).unwrap();

        assert_eq!(item.attributes["city"], json!("London"));
        assert_eq!(item.attributes["country"], json!("UK"));
        assert_eq!(item.attributes["visits"], json!(3));
        assert_eq!(item.attributes["tags"], json!(["old", "new"]));
        assert!(!item.attributes.contains_key("obsolete"));
    }

    /// A failing clause leaves the item untouched.
    #[test]
    fn test_apply_update_is_all_or_nothing() {
        let mut item = item();
        let before = item.clone();
        let input = UpdateItemInput::default()
            .expression("SET visits = :n ADD city :n")
            .value(":n", json!(5));
        assert!(apply_update(&mut item, &input).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn test_attribute_delete_actions() {
        let mut item = item();
        let mut input = UpdateItemInput::default();
        input.attribute_updates.insert(
            "obsolete".to_string(),
            AttributeValueUpdate {
                action: AttributeAction::Delete,
                value: None,
            },
        );
        input.attribute_updates.insert(
            "tags".to_string(),
            AttributeValueUpdate {
                action: AttributeAction::Delete,
                value: Some(json!(["old"])),
            },
        );
        apply_update(&mut item, &input).unwrap();
        assert!(!item.attributes.contains_key("obsolete"));
        assert_eq!(item.attributes["tags"], json!([]));
    }
}
