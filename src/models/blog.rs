//! Blog record: persisted attributes, change tracking and lifecycle flags
//!
//! The vaulted password is deliberately absent here. It lives in the
//! credential store keyed by `(url, identification)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::color::{pick_color, IconColor};

/// Stable identifier assigned when a blog is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlogId(String);

impl BlogId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlogId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlogId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-secret attributes of a blog, in the shape they are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogAttrs {
    pub index: i64,
    pub name: String,
    pub url: String,
    pub identification: String,
    pub is_selected: bool,
    pub icon_color: IconColor,
    pub basic_username: String,
    pub basic_password: String,
    pub is_reset_requested: bool,
}

impl Default for BlogAttrs {
    fn default() -> Self {
        Self {
            index: 0,
            name: String::new(),
            url: String::new(),
            identification: String::new(),
            is_selected: false,
            icon_color: pick_color(None),
            basic_username: String::new(),
            basic_password: String::new(),
            is_reset_requested: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlogField {
    Index,
    Name,
    Url,
    Identification,
    IsSelected,
    IconColor,
    BasicUsername,
    BasicPassword,
    IsResetRequested,
}

impl BlogField {
    pub const ALL: [BlogField; 9] = [
        BlogField::Index,
        BlogField::Name,
        BlogField::Url,
        BlogField::Identification,
        BlogField::IsSelected,
        BlogField::IconColor,
        BlogField::BasicUsername,
        BlogField::BasicPassword,
        BlogField::IsResetRequested,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BlogField::Index => "index",
            BlogField::Name => "name",
            BlogField::Url => "url",
            BlogField::Identification => "identification",
            BlogField::IsSelected => "isSelected",
            BlogField::IconColor => "iconColor",
            BlogField::BasicUsername => "basicUsername",
            BlogField::BasicPassword => "basicPassword",
            BlogField::IsResetRequested => "isResetRequested",
        }
    }
}

/// Dynamically typed value of a single [`BlogField`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Color(IconColor),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntityError {
    #[error("Field {field} expects {expected}, got {got:?}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        got: FieldValue,
    },
}

/// A blog record with change tracking
#[derive(Debug, Clone)]
pub struct Blog {
    id: BlogId,
    attrs: BlogAttrs,
    persisted: Option<BlogAttrs>,
    is_deleted: bool,
    is_being_destroyed: bool,
    is_destroyed: bool,
}

impl Blog {
    pub fn new() -> Self {
        Self::from_attrs(BlogAttrs::default())
    }

    pub fn with_color(color: IconColor) -> Self {
        Self::from_attrs(BlogAttrs {
            icon_color: color,
            ..BlogAttrs::default()
        })
    }

    /// Fresh, unsaved record with the given attributes
    pub fn from_attrs(attrs: BlogAttrs) -> Self {
        Self {
            id: BlogId::generate(),
            attrs,
            persisted: None,
            is_deleted: false,
            is_being_destroyed: false,
            is_destroyed: false,
        }
    }

    /// Record loaded back from the store, clean
    pub fn from_persisted(id: BlogId, attrs: BlogAttrs) -> Self {
        Self {
            id,
            persisted: Some(attrs.clone()),
            attrs,
            is_deleted: false,
            is_being_destroyed: false,
            is_destroyed: false,
        }
    }

    pub fn id(&self) -> &BlogId {
        &self.id
    }

    pub fn attrs(&self) -> &BlogAttrs {
        &self.attrs
    }

    pub fn index(&self) -> i64 {
        self.attrs.index
    }

    pub fn name(&self) -> &str {
        &self.attrs.name
    }

    pub fn url(&self) -> &str {
        &self.attrs.url
    }

    pub fn identification(&self) -> &str {
        &self.attrs.identification
    }

    pub fn is_selected(&self) -> bool {
        self.attrs.is_selected
    }

    pub fn icon_color(&self) -> &IconColor {
        &self.attrs.icon_color
    }

    pub fn set_index(&mut self, index: i64) {
        self.attrs.index = index;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.attrs.name = name.into();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.attrs.url = url.into();
    }

    pub fn set_identification(&mut self, identification: impl Into<String>) {
        self.attrs.identification = identification.into();
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.attrs.is_selected = selected;
    }

    pub fn set_icon_color(&mut self, color: IconColor) {
        self.attrs.icon_color = color;
    }

    pub fn get(&self, field: BlogField) -> FieldValue {
        let a = &self.attrs;
        match field {
            BlogField::Index => FieldValue::Int(a.index),
            BlogField::Name => FieldValue::Text(a.name.clone()),
            BlogField::Url => FieldValue::Text(a.url.clone()),
            BlogField::Identification => FieldValue::Text(a.identification.clone()),
            BlogField::IsSelected => FieldValue::Bool(a.is_selected),
            BlogField::IconColor => FieldValue::Color(a.icon_color.clone()),
            BlogField::BasicUsername => FieldValue::Text(a.basic_username.clone()),
            BlogField::BasicPassword => FieldValue::Text(a.basic_password.clone()),
            BlogField::IsResetRequested => FieldValue::Bool(a.is_reset_requested),
        }
    }

    pub fn set(&mut self, field: BlogField, value: FieldValue) -> Result<(), EntityError> {
        let a = &mut self.attrs;
        match (field, value) {
            (BlogField::Index, FieldValue::Int(v)) => a.index = v,
            (BlogField::Name, FieldValue::Text(v)) => a.name = v,
            (BlogField::Url, FieldValue::Text(v)) => a.url = v,
            (BlogField::Identification, FieldValue::Text(v)) => a.identification = v,
            (BlogField::IsSelected, FieldValue::Bool(v)) => a.is_selected = v,
            (BlogField::IconColor, FieldValue::Color(v)) => a.icon_color = v,
            (BlogField::BasicUsername, FieldValue::Text(v)) => a.basic_username = v,
            (BlogField::BasicPassword, FieldValue::Text(v)) => a.basic_password = v,
            (BlogField::IsResetRequested, FieldValue::Bool(v)) => a.is_reset_requested = v,
            (field, got) => {
                let expected = match field {
                    BlogField::Index => "an integer",
                    BlogField::IsSelected | BlogField::IsResetRequested => "a boolean",
                    BlogField::IconColor => "a color",
                    _ => "a string",
                };
                return Err(EntityError::TypeMismatch {
                    field: field.key(),
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    /// True until the first successful save
    pub fn is_new(&self) -> bool {
        self.persisted.is_none()
    }

    pub fn has_dirty_attributes(&self) -> bool {
        self.persisted.as_ref() != Some(&self.attrs)
    }

    /// Fields that differ from the last persisted snapshot. Every field
    /// counts as changed on a record that was never saved.
    pub fn changed_fields(&self) -> Vec<BlogField> {
        let Some(persisted) = &self.persisted else {
            return BlogField::ALL.to_vec();
        };
        let snapshot = Blog::from_persisted(self.id.clone(), persisted.clone());
        BlogField::ALL
            .into_iter()
            .filter(|field| snapshot.get(*field) != self.get(*field))
            .collect()
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_being_destroyed(&self) -> bool {
        self.is_being_destroyed
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    /// Deleted, being torn down, or already gone
    pub fn is_gone(&self) -> bool {
        self.is_deleted || self.is_being_destroyed || self.is_destroyed
    }

    /// Discard unsaved changes and any pending deletion
    pub fn rollback(&mut self) {
        if self.is_destroyed || self.is_being_destroyed {
            return;
        }
        if let Some(persisted) = &self.persisted {
            self.attrs = persisted.clone();
        }
        self.is_deleted = false;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    pub(crate) fn mark_being_destroyed(&mut self, value: bool) {
        self.is_being_destroyed = value;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.is_being_destroyed = false;
        self.is_destroyed = true;
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = Some(self.attrs.clone());
    }

    /// Plain JSON form of the record, as sent to the main process
    pub fn to_payload(&self, include_id: bool) -> Value {
        let mut value = serde_json::to_value(&self.attrs).unwrap_or(Value::Null);
        if include_id {
            if let Value::Object(map) = &mut value {
                map.insert("id".to_string(), Value::String(self.id.0.clone()));
            }
        }
        value
    }
}

impl Default for Blog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_blog_has_defaults_and_color() {
        let blog = Blog::new();
        assert_eq!(blog.index(), 0);
        assert!(blog.url().is_empty());
        assert!(blog.identification().is_empty());
        assert!(!blog.is_selected());
        assert!(!blog.icon_color().as_str().is_empty());
        assert!(blog.is_new());
        assert!(blog.has_dirty_attributes());
    }

    #[test]
    fn generic_get_and_set() {
        let mut blog = Blog::new();
        blog.set(BlogField::Url, FieldValue::Text("https://a.example".into()))
            .expect("set url");
        blog.set(BlogField::IsSelected, FieldValue::Bool(true))
            .expect("set selected");

        assert_eq!(
            blog.get(BlogField::Url),
            FieldValue::Text("https://a.example".into())
        );
        assert_eq!(blog.get(BlogField::IsSelected), FieldValue::Bool(true));
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut blog = Blog::new();
        let err = blog
            .set(BlogField::Index, FieldValue::Text("one".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            EntityError::TypeMismatch { field: "index", .. }
        ));
        assert_eq!(blog.index(), 0);
    }

    #[test]
    fn change_tracking_against_snapshot() {
        let mut blog = Blog::new();
        blog.mark_persisted();
        assert!(!blog.is_new());
        assert!(!blog.has_dirty_attributes());
        assert!(blog.changed_fields().is_empty());

        blog.set_name("Staff Blog");
        assert!(blog.has_dirty_attributes());
        assert_eq!(blog.changed_fields(), vec![BlogField::Name]);
    }

    #[test]
    fn rollback_restores_snapshot_and_undeletes() {
        let mut blog = Blog::new();
        blog.set_name("Before");
        blog.mark_persisted();
        blog.set_name("After");
        blog.mark_deleted();
        assert!(blog.is_gone());

        blog.rollback();
        assert_eq!(blog.name(), "Before");
        assert!(!blog.is_deleted());
    }

    #[test]
    fn destroyed_blog_cannot_be_rolled_back() {
        let mut blog = Blog::new();
        blog.mark_deleted();
        blog.mark_destroyed();
        blog.rollback();
        assert!(blog.is_deleted());
        assert!(blog.is_destroyed());
    }

    #[test]
    fn payload_uses_camel_case_and_id() {
        let mut blog = Blog::with_color(IconColor::from("#26a69a"));
        blog.set_url("https://a.example");
        blog.set_identification("me@a.example");

        let payload = blog.to_payload(true);
        assert_eq!(payload["id"], blog.id().as_str());
        assert_eq!(payload["url"], "https://a.example");
        assert_eq!(payload["identification"], "me@a.example");
        assert_eq!(payload["iconColor"], "#26a69a");
        assert_eq!(payload["isSelected"], false);
        assert_eq!(payload["isResetRequested"], false);
        assert!(payload.get("basicUsername").is_some());

        assert!(blog.to_payload(false).get("id").is_none());
    }
}
