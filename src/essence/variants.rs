//! Essence types.

use crate::error::{EssenceError, ValidationError};
use crate::essence::{truncate_chars, Essence, EssenceKind};
use serde::{Deserialize, Serialize};

fn unknown(kind: EssenceKind, key: &str) -> EssenceError {
    EssenceError::UnknownAttribute {
        kind: kind.type_name(),
        key: key.to_string(),
    }
}

/// Empty strings clear an attribute.
fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_id(key: &str, value: &str) -> Result<Option<u64>, EssenceError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| EssenceError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}' is not a record id", value),
        })
}

fn check_link(link: &Option<String>, messages: &mut Vec<String>) {
    if let Some(link) = link {
        if link.chars().any(char::is_whitespace) {
            messages.push(format!("Link '{}' must not contain whitespace", link));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceText {
    pub body: Option<String>,
    pub link: Option<String>,
    pub link_title: Option<String>,
    pub link_class_name: Option<String>,
    pub link_target: Option<String>,
}

impl Essence for EssenceText {
    fn kind(&self) -> EssenceKind {
        EssenceKind::Text
    }

    fn ingredient_column(&self) -> &'static str {
        "body"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "body" => self.body.clone(),
            "link" => self.link.clone(),
            "link_title" => self.link_title.clone(),
            "link_class_name" => self.link_class_name.clone(),
            "link_target" => self.link_target.clone(),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        let slot = match key {
            "body" => &mut self.body,
            "link" => &mut self.link,
            "link_title" => &mut self.link_title,
            "link_class_name" => &mut self.link_class_name,
            "link_target" => &mut self.link_target,
            _ => return Err(unknown(EssenceKind::Text, key)),
        };
        *slot = optional(value);
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        check_link(&self.link, &mut messages);
        ValidationError::check(messages)
    }
}

/// Rich text keeps a tag-free copy of the body for previews and search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceRichtext {
    pub body: Option<String>,
    pub stripped_body: Option<String>,
}

impl EssenceRichtext {
    fn strip_tags(html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }
}

impl Essence for EssenceRichtext {
    fn kind(&self) -> EssenceKind {
        EssenceKind::Richtext
    }

    fn ingredient_column(&self) -> &'static str {
        "body"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "body" => self.body.clone(),
            "stripped_body" => self.stripped_body.clone(),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        match key {
            "body" => {
                self.body = optional(value);
                self.stripped_body = optional(&Self::strip_tags(value));
                Ok(())
            }
            "stripped_body" => Err(EssenceError::InvalidValue {
                key: key.to_string(),
                reason: "derived from body".to_string(),
            }),
            _ => Err(unknown(EssenceKind::Richtext, key)),
        }
    }

    fn preview_text(&self, max_chars: usize) -> String {
        truncate_chars(self.stripped_body.as_deref().unwrap_or_default(), max_chars)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssencePicture {
    pub picture_id: Option<u64>,
    pub caption: Option<String>,
    pub title: Option<String>,
    pub alt_tag: Option<String>,
    pub link: Option<String>,
    pub link_title: Option<String>,
    pub link_class_name: Option<String>,
    pub link_target: Option<String>,
    pub crop_from: Option<String>,
    pub crop_size: Option<String>,
}

impl Essence for EssencePicture {
    fn kind(&self) -> EssenceKind {
        EssenceKind::Picture
    }

    fn ingredient_column(&self) -> &'static str {
        "picture_id"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "picture_id" => self.picture_id.map(|id| id.to_string()),
            "caption" => self.caption.clone(),
            "title" => self.title.clone(),
            "alt_tag" => self.alt_tag.clone(),
            "link" => self.link.clone(),
            "link_title" => self.link_title.clone(),
            "link_class_name" => self.link_class_name.clone(),
            "link_target" => self.link_target.clone(),
            "crop_from" => self.crop_from.clone(),
            "crop_size" => self.crop_size.clone(),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        let slot = match key {
            "picture_id" => {
                self.picture_id = parse_id(key, value)?;
                return Ok(());
            }
            "caption" => &mut self.caption,
            "title" => &mut self.title,
            "alt_tag" => &mut self.alt_tag,
            "link" => &mut self.link,
            "link_title" => &mut self.link_title,
            "link_class_name" => &mut self.link_class_name,
            "link_target" => &mut self.link_target,
            "crop_from" => &mut self.crop_from,
            "crop_size" => &mut self.crop_size,
            _ => return Err(unknown(EssenceKind::Picture, key)),
        };
        *slot = optional(value);
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        check_link(&self.link, &mut messages);
        ValidationError::check(messages)
    }

    fn preview_text(&self, max_chars: usize) -> String {
        let label = self
            .caption
            .clone()
            .or_else(|| self.title.clone())
            .or_else(|| self.picture_id.map(|id| format!("Picture #{id}")))
            .unwrap_or_default();
        truncate_chars(&label, max_chars)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceFile {
    pub attachment_id: Option<u64>,
    pub title: Option<String>,
    pub css_class: Option<String>,
}

impl Essence for EssenceFile {
    fn kind(&self) -> EssenceKind {
        EssenceKind::File
    }

    fn ingredient_column(&self) -> &'static str {
        "attachment_id"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "attachment_id" => self.attachment_id.map(|id| id.to_string()),
            "title" => self.title.clone(),
            "css_class" => self.css_class.clone(),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        match key {
            "attachment_id" => self.attachment_id = parse_id(key, value)?,
            "title" => self.title = optional(value),
            "css_class" => self.css_class = optional(value),
            _ => return Err(unknown(EssenceKind::File, key)),
        }
        Ok(())
    }

    fn preview_text(&self, max_chars: usize) -> String {
        let label = self
            .title
            .clone()
            .or_else(|| self.attachment_id.map(|id| format!("Attachment #{id}")))
            .unwrap_or_default();
        truncate_chars(&label, max_chars)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceLink {
    pub link: Option<String>,
    pub link_title: Option<String>,
    pub link_class_name: Option<String>,
    pub link_target: Option<String>,
}

impl Essence for EssenceLink {
    fn kind(&self) -> EssenceKind {
        EssenceKind::Link
    }

    fn ingredient_column(&self) -> &'static str {
        "link"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "link" => self.link.clone(),
            "link_title" => self.link_title.clone(),
            "link_class_name" => self.link_class_name.clone(),
            "link_target" => self.link_target.clone(),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        let slot = match key {
            "link" => &mut self.link,
            "link_title" => &mut self.link_title,
            "link_class_name" => &mut self.link_class_name,
            "link_target" => &mut self.link_target,
            _ => return Err(unknown(EssenceKind::Link, key)),
        };
        *slot = optional(value);
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        check_link(&self.link, &mut messages);
        ValidationError::check(messages)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceBoolean {
    pub value: Option<bool>,
}

impl Essence for EssenceBoolean {
    fn kind(&self) -> EssenceKind {
        EssenceKind::Boolean
    }

    fn ingredient_column(&self) -> &'static str {
        "value"
    }

    fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "value" => self.value.map(|v| v.to_string()),
            _ => None,
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EssenceError> {
        if key != "value" {
            return Err(unknown(EssenceKind::Boolean, key));
        }
        self.value = match value.trim() {
            "" => None,
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            other => {
                return Err(EssenceError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("'{}' is not a boolean", other),
                })
            }
        };
        Ok(())
    }
}
