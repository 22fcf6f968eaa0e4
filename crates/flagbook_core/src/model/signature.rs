//! Guestbook signature payload.
//!
//! # Responsibility
//! - Carry the author, message body and styling of one signature.
//! - Validate visitor input before it reaches the grid.
//!
//! # Invariants
//! - Author names, email and message body are non-blank.
//! - `color` is a `#rrggbb` hex color.

use crate::model::message::{Payload, PayloadValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ink color used when the visitor does not pick one.
pub const DEFAULT_COLOR: &str = "#1a1a1a";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

/// Text size of a rendered signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Visitor-provided content of one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub message: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub size: InkSize,
    /// Stored upload filename, see `upload::ImageStore`.
    #[serde(default)]
    pub image_path: Option<String>,
}

impl Signature {
    /// Creates a signature with default styling and no image.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            message: message.into(),
            color: default_color(),
            size: InkSize::default(),
            image_path: None,
        }
    }
}

impl Payload for Signature {
    /// Length in UTF-16 code units, so an emoji counts as two.
    fn text_len(&self) -> usize {
        self.message.encode_utf16().count()
    }

    fn validate(&self) -> Result<(), PayloadValidationError> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(PayloadValidationError::MissingField(field));
            }
        }

        if !HEX_COLOR_RE.is_match(&self.color) {
            return Err(PayloadValidationError::InvalidField {
                field: "color",
                message: format!("expected #rrggbb, got `{}`", self.color),
            });
        }

        if let Some(path) = self.image_path.as_deref() {
            if path.trim().is_empty() {
                return Err(PayloadValidationError::InvalidField {
                    field: "image_path",
                    message: "must not be blank when set".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}
