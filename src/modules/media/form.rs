use actix_multipart::{Field, Multipart};
use futures_util::TryStreamExt;
use std::collections::HashMap;

use crate::modules::media::{
    error::UploadError,
    model::{IncomingFile, UploadProfile},
};

const MAX_TEXT_FIELD: usize = 64 * 1024;
const MAX_TEXT_TOTAL: usize = 256 * 1024;
const MAX_PARTS: usize = 64;

/// Text fields plus at most one file from a multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    file: Option<IncomingFile>,
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, UploadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) =
        field.try_next().await.map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        if bytes.len() + chunk.len() > limit {
            return Ok(None);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(Some(bytes))
}

impl FormData {
    /// Reads the whole body. The only file accepted is `profile.field_name`; its size
    /// ceiling is enforced while streaming so an oversized file never reaches disk.
    pub async fn read(mut payload: Multipart, profile: &UploadProfile) -> Result<Self, UploadError> {
        let mut form = FormData::default();
        let mut parts = 0;
        let mut text_budget = MAX_TEXT_TOTAL;

        while let Some(mut field) =
            payload.try_next().await.map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            parts += 1;
            if parts > MAX_PARTS {
                return Err(UploadError::rejected("Too many form fields"));
            }

            let (name, filename) = match field.content_disposition() {
                Some(cd) => (
                    cd.get_name().unwrap_or_default().to_string(),
                    cd.get_filename().map(|f| f.to_string()),
                ),
                None => return Err(UploadError::rejected("Missing content disposition")),
            };

            match filename {
                // Browsers send an empty part when no file was picked
                Some(filename) if filename.is_empty() => {
                    read_field(&mut field, profile.max_size).await?;
                }
                Some(filename) => {
                    if name != profile.field_name {
                        return Err(UploadError::rejected(format!(
                            "Unexpected file field '{name}'"
                        )));
                    }
                    if form.file.is_some() {
                        return Err(UploadError::rejected("Only one file can be uploaded"));
                    }

                    let content_type = field
                        .content_type()
                        .map(|m| m.essence_str().to_string())
                        .unwrap_or_else(|| "application/octet-stream".to_string());

                    let bytes = read_field(&mut field, profile.max_size)
                        .await?
                        .ok_or(UploadError::TooLarge { max: profile.max_size })?;

                    form.file = Some(IncomingFile { filename, content_type, bytes });
                }
                None => {
                    let bytes = read_field(&mut field, MAX_TEXT_FIELD.min(text_budget))
                        .await?
                        .ok_or_else(|| {
                            if text_budget < MAX_TEXT_FIELD {
                                UploadError::rejected("Form fields are too large")
                            } else {
                                UploadError::rejected(format!("Field '{name}' is too long"))
                            }
                        })?;
                    text_budget -= bytes.len();
                    let value = String::from_utf8(bytes).map_err(|_| {
                        UploadError::rejected(format!("Field '{name}' is not valid UTF-8"))
                    })?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }

        Ok(form)
    }

    #[cfg(test)]
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = FormData::default();
        for (k, v) in fields {
            form.fields.entry(k.into()).or_default().push(v.into());
        }
        form
    }

    /// First non-blank value of `key`, trimmed.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(|values| values.iter().map(|v| v.trim()).find(|v| !v.is_empty()))
            .map(str::to_string)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.text(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Collects `key` and `key[]`; each value may be a JSON array or a comma list.
    /// `None` when the field was not sent at all.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let bracketed = format!("{key}[]");
        let raw: Vec<&String> = [key, bracketed.as_str()]
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .flatten()
            .collect();

        if raw.is_empty() {
            return None;
        }

        let mut items = Vec::new();
        for value in raw {
            let value = value.trim();
            if value.starts_with('[') {
                if let Ok(parsed) = serde_json::from_str::<Vec<String>>(value) {
                    items.extend(parsed);
                    continue;
                }
            }
            items.extend(value.split(',').map(str::to_string));
        }

        Some(items.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect())
    }

    pub fn take_file(&mut self) -> Option<IncomingFile> {
        self.file.take()
    }
}
