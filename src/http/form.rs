//! Request body extraction for tasting writes.
//!
//! Bodies arrive either as JSON objects or as `multipart/form-data`. In the
//! multipart case text parts become fields and a file part named
//! `foto_anilha` becomes the uploaded photo.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;

use super::error::ApiError;
use crate::input::{keys, FieldBag, PhotoUpload};

#[derive(Debug, Default)]
pub struct TastingForm {
    pub fields: FieldBag,
    pub photo: Option<PhotoUpload>,
}

impl<S> FromRequest<S> for TastingForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
            read_multipart(multipart).await
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
            read_json(&body)
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<TastingForm, ApiError> {
    let mut form = TastingForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(original_name) if name == keys::BAND_PHOTO => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
                // browsers send an empty part when no file was chosen
                if !original_name.is_empty() && !bytes.is_empty() {
                    form.photo = Some(PhotoUpload {
                        original_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
                form.fields.insert(name, Value::String(text));
            }
        }
    }

    Ok(form)
}

fn read_json(body: &[u8]) -> Result<TastingForm, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TastingForm::default());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(TastingForm {
            fields,
            photo: None,
        }),
        Ok(Value::Null) => Ok(TastingForm::default()),
        Ok(_) => Err(ApiError::bad_request("expected a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {}", e))),
    }
}
