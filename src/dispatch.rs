//! Submission: turns a valid draft into one backend request and routes the outcome.
//!
//! Two conventions exist and a form uses exactly one:
//!
//! - **Multipart**: local attachments are uploaded first and swapped for
//!   server identifiers, which are then sent as repeated `<key>[]` fields.
//! - **Inline base64**: one JSON body with attachments encoded as
//!   `<key>_base64` string arrays.
//!
//! There is no automatic retry. A failed submission keeps the draft, so
//! running the submission again picks up where it stopped; uploads that
//! already succeeded are not repeated.

use std::fs;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::blocking::multipart;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, Reply};
use crate::engine::{FieldError, FormEngine, Payload};
use crate::model::{AttachmentHandle, Convention};

/// How a sent submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success {
        tracking_code: Option<String>,
        message: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl SubmissionResult {
    /// The page to navigate to.
    pub fn route(&self) -> String {
        match self {
            Self::Success { .. } => "/success".to_string(),
            Self::Failure { message } => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
                format!("/failed?error={encoded}")
            }
        }
    }
}

/// What happened when the reporter pressed submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Validation failed; nothing was sent.
    Blocked(Vec<FieldError>),
    Sent(SubmissionResult),
}

/// Validate, upload, send. Clears the draft only on confirmed success.
pub fn submit(mut engine: FormEngine<'_>, api: &ApiClient) -> Submission {
    if let Err(errors) = engine.attempt_submit() {
        return Submission::Blocked(errors);
    }

    let result = match send(&mut engine, api) {
        Ok(reply) => {
            let tracking_code = tracking_code(&reply.data);
            info!(
                form = engine.kind().name(),
                tracking_code = tracking_code.as_deref().unwrap_or("-"),
                "report submitted"
            );
            engine.complete();
            SubmissionResult::Success {
                tracking_code,
                message: reply.message,
            }
        }
        Err(e) => {
            warn!(form = engine.kind().name(), error = %e, "submission failed");
            SubmissionResult::Failure {
                message: e.to_string(),
            }
        }
    };
    Submission::Sent(result)
}

fn send(engine: &mut FormEngine<'_>, api: &ApiClient) -> Result<Reply, ApiError> {
    let endpoint = engine
        .draft()
        .form
        .endpoint()
        .ok_or_else(|| ApiError::Decode("the form has no classification selected".into()))?;

    match engine.kind().convention() {
        Convention::Multipart => {
            upload_pending(engine, api)?;
            api.post_multipart(endpoint, multipart_form(&engine.payload())?)
        }
        Convention::InlineBase64 => api.post_json(endpoint, &inline_json(&engine.payload())?),
    }
}

/// Uploads every local attachment, recording each identifier as it arrives.
fn upload_pending(engine: &mut FormEngine<'_>, api: &ApiClient) -> Result<(), ApiError> {
    let pending: Vec<_> = engine
        .attachments()
        .iter()
        .filter_map(|h| match h {
            AttachmentHandle::Local { path, digest, .. } => Some((path.clone(), digest.clone())),
            AttachmentHandle::Uploaded { .. } => None,
        })
        .collect();

    for (path, digest) in pending {
        let id = api.upload(&path)?;
        info!(path = %path.display(), %id, "attachment uploaded");
        engine.mark_uploaded(&digest, &id);
    }
    Ok(())
}

/// Text fields as-is; attachments as repeated `<key>[]` identifier fields.
pub fn multipart_form(payload: &Payload) -> Result<multipart::Form, ApiError> {
    let mut form = multipart::Form::new();
    for (key, value) in payload.texts() {
        form = form.text(key, value.to_string());
    }
    for (key, files) in payload.files() {
        for handle in files {
            let id = handle
                .server_id()
                .ok_or_else(|| ApiError::NotUploaded(handle.name().to_string()))?;
            form = form.text(format!("{key}[]"), id.to_string());
        }
    }
    Ok(form)
}

/// One JSON object; attachments read from disk and inlined as base64.
pub fn inline_json(payload: &Payload) -> Result<Value, ApiError> {
    let mut object = payload.text_object();
    for (key, files) in payload.files() {
        let encoded = files
            .iter()
            .map(|handle| match handle {
                AttachmentHandle::Local { path, .. } => fs::read(path)
                    .map(|bytes| Value::String(STANDARD.encode(bytes)))
                    .map_err(|source| ApiError::Attachment {
                        path: path.clone(),
                        source,
                    }),
                AttachmentHandle::Uploaded { name, .. } => Err(ApiError::NotLocal(name.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        object.insert(format!("{key}_base64"), Value::Array(encoded));
    }
    Ok(Value::Object(object))
}

/// Best-effort removal of an uploaded file the reporter detached.
pub fn revert_attachment(api: &ApiClient, handle: &AttachmentHandle) {
    let Some(id) = handle.server_id() else {
        return;
    };
    match api.revert(id) {
        Ok(()) => info!(%id, "upload reverted"),
        Err(e) => warn!(%id, error = %e, "failed to revert upload"),
    }
}

/// The tracking code in a success reply's `data`: the string itself, or one
/// of the known code fields.
pub fn tracking_code(data: &Value) -> Option<String> {
    let code = match data {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["kode_laporan", "tracking_code", "kode", "id"]
            .iter()
            .find_map(|key| match map.get(*key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        _ => None,
    };
    code.filter(|c| !c.trim().is_empty())
}
