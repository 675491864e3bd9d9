//! Multipart form decoding
//!
//! Collects text fields and file parts from a multipart body so handlers
//! can validate by name instead of streaming field-by-field.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::service::Upload;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    /// Drain a multipart body into named fields.
    ///
    /// Parts with a filename or a content type become files; everything
    /// else is read as UTF-8 text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(ToOwned::to_owned) else {
                continue;
            };

            let is_file = field.file_name().is_some() || field.content_type().is_some();
            if is_file {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read field {name}: {e}")))?
                    .to_vec();
                form.files.insert(name, Upload { data, content_type });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read field {name}: {e}")))?;
                form.texts.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("missing field: {name}")))
    }

    pub fn file(&self, name: &str) -> Option<Upload> {
        self.files.get(name).cloned()
    }

    pub fn require_file(&self, name: &str) -> Result<Upload, AppError> {
        self.file(name)
            .ok_or_else(|| AppError::Validation(format!("missing file: {name}")))
    }
}
