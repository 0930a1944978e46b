//! Request-body validation for the challenge endpoints.
//!
//! Bodies arrive as raw JSON so every failing field can be reported at once
//! as `{property, message}` instead of stopping at the first serde error.
//! Unknown properties are rejected. `null` on an optional field counts as
//! "not provided", except in patches where it clears `difficulty`/`category`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ChallengePatch, CreateChallenge, Difficulty};

const KNOWN_FIELDS: [&str; 5] = ["title", "description", "difficulty", "tags", "category"];

const TITLE_NOT_STRING: &str = "Title must be a string";
const TITLE_REQUIRED: &str = "Title is required";
const DESCRIPTION_NOT_STRING: &str = "Description must be a string";
const DIFFICULTY_INVALID: &str = "Difficulty must be one of: easy, medium, hard";
const TAGS_NOT_ARRAY: &str = "Tags must be an array of strings";
const TAG_NOT_STRING: &str = "Each tag must be a string";
const CATEGORY_NOT_STRING: &str = "Category must be a string";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub property: String,
    pub message: String,
}

impl FieldError {
    pub fn new(property: &str, message: impl Into<String>) -> Self {
        Self { property: property.to_string(), message: message.into() }
    }

    pub fn title_required() -> Self {
        Self::new("title", TITLE_REQUIRED)
    }
}

/// Collects field errors while reading one JSON object.
struct Checker<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Checker<'a> {
    fn new(body: &'a Value) -> Result<Self, Vec<FieldError>> {
        let Some(body) = body.as_object() else {
            return Err(vec![FieldError::new("body", "Request body must be a JSON object")]);
        };
        let errors = body
            .keys()
            .filter(|k| !KNOWN_FIELDS.contains(&k.as_str()))
            .map(|k| FieldError::new(k, format!("property {k} should not exist")))
            .collect();
        Ok(Self { body, errors })
    }

    /// Present and non-null value of `field`.
    fn value(&self, field: &str) -> Option<&'a Value> {
        self.body.get(field).filter(|v| !v.is_null())
    }

    fn string(&mut self, field: &str, not_string: &str) -> Option<String> {
        match self.value(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.errors.push(FieldError::new(field, not_string));
                None
            }
        }
    }

    fn title(&mut self, required: bool) -> Option<String> {
        match self.value("title") {
            None if required => {
                self.errors.push(FieldError::new("title", TITLE_REQUIRED));
                None
            }
            None => None,
            Some(Value::String(s)) if s.is_empty() => {
                self.errors.push(FieldError::new("title", TITLE_REQUIRED));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.errors.push(FieldError::new("title", TITLE_NOT_STRING));
                None
            }
        }
    }

    fn difficulty(&mut self) -> Option<Difficulty> {
        let parsed = match self.value("difficulty")? {
            Value::String(s) => s.parse::<Difficulty>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.push(FieldError::new("difficulty", DIFFICULTY_INVALID));
        }
        parsed
    }

    fn tags(&mut self) -> Option<Vec<String>> {
        let Value::Array(items) = self.value("tags")? else {
            self.errors.push(FieldError::new("tags", TAGS_NOT_ARRAY));
            return None;
        };
        let tags: Option<Vec<String>> = items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect();
        if tags.is_none() {
            self.errors.push(FieldError::new("tags", TAG_NOT_STRING));
        }
        tags
    }

    /// True when `field` was sent as an explicit `null`.
    fn is_null(&self, field: &str) -> bool {
        matches!(self.body.get(field), Some(Value::Null))
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() { Ok(value) } else { Err(self.errors) }
    }
}

/// Validate a `POST /challenge` body.
pub fn parse_create(body: &Value) -> Result<CreateChallenge, Vec<FieldError>> {
    let mut check = Checker::new(body)?;
    let title = check.title(true);
    let input = CreateChallenge {
        title: title.unwrap_or_default(),
        description: check.string("description", DESCRIPTION_NOT_STRING),
        difficulty: check.difficulty(),
        tags: check.tags(),
        category: check.string("category", CATEGORY_NOT_STRING),
    };
    check.finish(input)
}

/// Validate a `PATCH /challenge/:id` body.
pub fn parse_patch(body: &Value) -> Result<ChallengePatch, Vec<FieldError>> {
    let mut check = Checker::new(body)?;
    let mut patch = ChallengePatch {
        title: check.title(false),
        description: check.string("description", DESCRIPTION_NOT_STRING),
        difficulty: check.difficulty().map(Some),
        tags: check.tags(),
        category: check.string("category", CATEGORY_NOT_STRING).map(Some),
    };
    if check.is_null("difficulty") {
        patch.difficulty = Some(None);
    }
    if check.is_null("category") {
        patch.category = Some(None);
    }
    check.finish(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(errors: &[FieldError]) -> Vec<(&str, &str)> {
        errors.iter().map(|e| (e.property.as_str(), e.message.as_str())).collect()
    }

    #[test]
    fn minimal_create_body_is_accepted() {
        let input = parse_create(&json!({ "title": "Two Sum" })).unwrap();
        assert_eq!(input.title, "Two Sum");
        assert_eq!(input.description, None);
        assert_eq!(input.tags, None);
    }

    #[test]
    fn full_create_body_is_accepted() {
        let input = parse_create(&json!({
            "title": "Two Sum",
            "description": "Find indices",
            "difficulty": "easy",
            "tags": ["array", "hash-map"],
            "category": "arrays",
        }))
        .unwrap();
        assert_eq!(input.difficulty, Some(Difficulty::Easy));
        assert_eq!(input.tags.unwrap(), vec!["array", "hash-map"]);
        assert_eq!(input.category.as_deref(), Some("arrays"));
    }

    #[test]
    fn missing_or_empty_title_is_required() {
        let errors = parse_create(&json!({ "description": "x" })).unwrap_err();
        assert_eq!(messages(&errors), vec![("title", TITLE_REQUIRED)]);

        let errors = parse_create(&json!({ "title": "" })).unwrap_err();
        assert_eq!(messages(&errors), vec![("title", TITLE_REQUIRED)]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let errors = parse_create(&json!({
            "title": 5,
            "description": false,
            "difficulty": "extreme",
            "tags": ["ok", 3],
            "category": [],
        }))
        .unwrap_err();
        assert_eq!(
            messages(&errors),
            vec![
                ("title", TITLE_NOT_STRING),
                ("description", DESCRIPTION_NOT_STRING),
                ("difficulty", DIFFICULTY_INVALID),
                ("tags", TAG_NOT_STRING),
                ("category", CATEGORY_NOT_STRING),
            ]
        );
    }

    #[test]
    fn tags_must_be_an_array() {
        let errors = parse_create(&json!({ "title": "t", "tags": "array" })).unwrap_err();
        assert_eq!(messages(&errors), vec![("tags", TAGS_NOT_ARRAY)]);
    }

    #[test]
    fn unknown_properties_are_rejected() {
        let errors = parse_create(&json!({ "title": "t", "complexity": "low" })).unwrap_err();
        assert_eq!(messages(&errors), vec![("complexity", "property complexity should not exist")]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errors = parse_create(&json!(["title"])).unwrap_err();
        assert_eq!(errors[0].property, "body");
    }

    #[test]
    fn patch_keeps_absent_fields_untouched() {
        let patch = parse_patch(&json!({ "description": "Find two indices" })).unwrap();
        assert_eq!(patch.field_names(), vec!["description"]);
        assert!(parse_patch(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn patch_null_clears_nullable_fields_only() {
        let patch = parse_patch(&json!({ "difficulty": null, "category": null, "title": null })).unwrap();
        assert_eq!(patch.difficulty, Some(None));
        assert_eq!(patch.category, Some(None));
        assert_eq!(patch.title, None);
    }

    #[test]
    fn patch_rejects_empty_title() {
        let errors = parse_patch(&json!({ "title": "" })).unwrap_err();
        assert_eq!(messages(&errors), vec![("title", TITLE_REQUIRED)]);
    }
}
