//! Blocking HTTP client for the reporting backend.
//!
//! Every endpoint answers with the same envelope, `{success, message, data}`.
//! A non-2xx status or `success: false` is a rejection carrying the
//! backend's message; anything else hands back the decoded body.

#[cfg(test)]
pub(crate) mod mock;

use std::{io, path::Path, path::PathBuf, time::Duration};

use reqwest::{
    Method, StatusCode,
    blocking::{Client, RequestBuilder, Response, multipart},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use crate::model::{ListQuery, ReferenceList, ReferenceOption, ReportKind, ReportPage, Tokens};

/// Where attachments are uploaded ahead of submission.
pub const UPLOAD_PATH: &str = "/api/laporan/dumas/upload";

/// Errors talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid backend URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered, but said no.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment { path: PathBuf, source: io::Error },

    #[error("attachment {0} has not been uploaded")]
    NotUploaded(String),

    #[error("attachment {0} is only available on the server")]
    NotLocal(String),
}

/// The backend's answer to a submission.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Reply {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Value,
}

/// Token responses come bare or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenReply {
    Wrapped { data: Tokens },
    Bare(Tokens),
}

impl From<TokenReply> for Tokens {
    fn from(reply: TokenReply) -> Self {
        match reply {
            TokenReply::Wrapped { data } | TokenReply::Bare(data) => data,
        }
    }
}

/// Client bound to one backend origin.
#[derive(Clone)]
pub struct ApiClient {
    origin: String,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, ApiError> {
        let origin = origin.trim_end_matches('/').to_string();
        Url::parse(&origin).map_err(|source| ApiError::InvalidUrl {
            url: origin.clone(),
            source,
        })?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            origin,
            http,
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` on every request from now on.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let full = format!("{}{path}", self.origin);
        Url::parse(&full).map_err(|source| ApiError::InvalidUrl { url: full, source })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        debug!(%method, %url, "backend request");
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    // ── Submissions ──

    pub fn post_multipart(&self, path: &str, form: multipart::Form) -> Result<Reply, ApiError> {
        let response = self.request(Method::POST, path)?.multipart(form).send()?;
        decode(&read_body(response)?)
    }

    pub fn post_json(&self, path: &str, body: &Value) -> Result<Reply, ApiError> {
        let response = self.request(Method::POST, path)?.json(body).send()?;
        decode(&read_body(response)?)
    }

    /// Uploads one file and returns the identifier the backend issued.
    pub fn upload(&self, path: &Path) -> Result<String, ApiError> {
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|source| ApiError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;
        let response = self
            .request(Method::POST, UPLOAD_PATH)?
            .multipart(form)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        check_status(status, &body)?;
        upload_id(&body).ok_or_else(|| ApiError::Decode("upload returned no identifier".into()))
    }

    /// Asks the backend to drop an uploaded file.
    pub fn revert(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, UPLOAD_PATH)?
            .body(id.to_string())
            .send()?;
        let status = response.status();
        let body = response.text()?;
        check_status(status, &body)
    }

    // ── Reference data ──

    pub fn reference(&self, list: ReferenceList) -> Result<Vec<ReferenceOption>, ApiError> {
        let response = self.request(Method::GET, list.path())?.send()?;
        let reply = decode(&read_body(response)?)?;
        serde_json::from_value(reply.data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ── Authentication ──

    pub fn login(&self, username: &str, password: &str) -> Result<Tokens, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response = self.request(Method::POST, "/api/login")?.json(&body).send()?;
        tokens(read_body(response)?)
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<Tokens, ApiError> {
        let body = json!({ "refresh_token": refresh_token });
        let response = self
            .request(Method::POST, "/api/refresh-token")?
            .json(&body)
            .send()?;
        tokens(read_body(response)?)
    }

    // ── Dashboard ──

    pub fn summary(&self, period: Option<&str>, year: Option<i32>) -> Result<Value, ApiError> {
        let mut query = Vec::new();
        if let Some(period) = period {
            query.push(("period", period.to_string()));
        }
        if let Some(year) = year {
            query.push(("year", year.to_string()));
        }
        let response = self
            .request(Method::GET, "/api/dashboard/summary")?
            .query(&query)
            .send()?;
        Ok(decode(&read_body(response)?)?.data)
    }

    pub fn list_reports(
        &self,
        kind: ReportKind,
        query: &ListQuery,
    ) -> Result<ReportPage, ApiError> {
        let path = format!("/api/v1/{}", kind.segment());
        let response = self
            .request(Method::GET, &path)?
            .query(&query.pairs())
            .send()?;
        let mut body = read_body(response)?;

        // Either `{data: {data, pagination}}` or the page itself.
        let nested = body
            .get("data")
            .is_some_and(|inner| inner.get("data").is_some());
        let page = if nested { body["data"].take() } else { body };
        serde_json::from_value(page).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn update_report(
        &self,
        kind: ReportKind,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<Reply, ApiError> {
        let path = format!("/api/v1/{}/{id}", kind.segment());
        let response = self.request(Method::PATCH, &path)?.json(fields).send()?;
        decode(&read_body(response)?)
    }
}

/// Read a JSON body, turning rejections into errors.
fn read_body(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text()?;
    check_status(status, &text)?;

    let body: Value = serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: message_of(&body).unwrap_or_else(|| "request was not accepted".to_string()),
        });
    }
    Ok(body)
}

fn check_status(status: StatusCode, text: &str) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| message_of(&body))
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty() && !t.starts_with('<')))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(message));
    }
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn message_of(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

fn decode(body: &Value) -> Result<Reply, ApiError> {
    Reply::deserialize(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn tokens(body: Value) -> Result<Tokens, ApiError> {
    serde_json::from_value::<TokenReply>(body)
        .map(Tokens::from)
        .map_err(|_| ApiError::Decode("response carried no tokens".into()))
}

/// The identifier in an upload response: plain text, a JSON string, or an
/// envelope whose `data` is the id or an object holding it.
fn upload_id(body: &str) -> Option<String> {
    let from_json = |value: &Value| -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => ["data", "id", "file_id", "fileId"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(|inner| match inner {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Object(_) => upload_id(&inner.to_string()),
                    _ => None,
                }),
            _ => None,
        }
    };
    let id = match serde_json::from_str::<Value>(body) {
        Ok(value) => from_json(&value),
        Err(_) => Some(body.trim().to_string()),
    };
    id.filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use super::mock::serve;

    fn client(origin: &str) -> ApiClient {
        ApiClient::new(origin, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_unparseable_origin() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn server_error_carries_backend_message() {
        let server = serve(vec![(500, r#"{"success": false, "message": "Database down"}"#)]);
        let err = client(&server.origin)
            .post_json("/api/laporan/dumas", &json!({}))
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
        assert_eq!(err.to_string(), "Database down");
        server.finish();
    }

    #[test]
    fn success_false_is_rejected_even_on_200() {
        let server = serve(vec![(200, r#"{"success": false, "message": "Kuota penuh"}"#)]);
        let err = client(&server.origin)
            .post_json("/api/laporan/dumas", &json!({}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Kuota penuh");
        server.finish();
    }

    #[test]
    fn login_accepts_wrapped_and_bare_tokens() {
        let server = serve(vec![
            (
                200,
                r#"{"success": true,
                    "data": {"access_token": "a1", "refresh_token": "r1", "expires_in": 900}}"#,
            ),
            (200, r#"{"access_token": "a2", "refresh_token": "r2", "expires_in": 900}"#),
        ]);
        let api = client(&server.origin);

        assert_eq!(api.login("admin", "rahasia").unwrap().access_token, "a1");
        assert_eq!(api.refresh("r1").unwrap().access_token, "a2");

        let requests = server.finish();
        assert_eq!(requests[0].path, "/api/login");
        assert_eq!(
            requests[0].json(),
            json!({"username": "admin", "password": "rahasia"})
        );
        assert_eq!(requests[1].path, "/api/refresh-token");
        assert_eq!(requests[1].json(), json!({"refresh_token": "r1"}));
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let server = serve(vec![(401, r#"{"message": "Username atau password salah"}"#)]);
        let err = client(&server.origin).login("admin", "x").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthorized(ref m) if m == "Username atau password salah"
        ));
        server.finish();
    }

    #[test]
    fn upload_reads_plain_and_enveloped_ids() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bukti.jpg");
        fs::write(&file, b"jpeg bytes").unwrap();

        let server = serve(vec![
            (200, "srv-plain"),
            (200, r#"{"success": true, "data": {"id": 42}}"#),
        ]);
        let api = client(&server.origin);

        assert_eq!(api.upload(&file).unwrap(), "srv-plain");
        assert_eq!(api.upload(&file).unwrap(), "42");

        let requests = server.finish();
        assert_eq!(requests[0].path, UPLOAD_PATH);
        assert!(requests[0].body_text().contains("name=\"file\""));
        assert!(requests[0].body_text().contains("jpeg bytes"));
    }

    #[test]
    fn revert_sends_id_as_body() {
        let server = serve(vec![(200, "")]);
        client(&server.origin).revert("srv-9").unwrap();

        let requests = server.finish();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].body_text(), "srv-9");
    }

    #[test]
    fn list_reports_sends_bearer_and_query() {
        let server = serve(vec![(
            200,
            r#"{"success": true, "data": {
                "data": [{"id": 1}, {"id": 2}],
                "pagination": {"total": 12, "limit": 10, "totalPages": 2}
            }}"#,
        )]);
        let api = client(&server.origin).with_token("tok");
        let query = ListQuery {
            page: 1,
            limit: 10,
            search: Some("jalan".into()),
        };

        let page = api.list_reports(ReportKind::Dumas, &query).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total, 12);

        let requests = server.finish();
        assert_eq!(requests[0].path, "/api/v1/dumas?page=1&limit=10&search=jalan");
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn reference_reads_data_array() {
        let server = serve(vec![(
            200,
            r#"{"success": true, "data": [{"id": 1, "nama": "TKJ"}, {"id": 2, "nama": "RPL"}]}"#,
        )]);
        let options = client(&server.origin)
            .reference(ReferenceList::ProgramKeahlian)
            .unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(options[1].label, "RPL");
        assert_eq!(server.finish()[0].path, "/api/ref/program-keahlian");
    }

    #[test]
    fn upload_id_shapes() {
        assert_eq!(upload_id("abc\n").as_deref(), Some("abc"));
        assert_eq!(upload_id(r#""quoted""#).as_deref(), Some("quoted"));
        assert_eq!(upload_id(r#"{"data": "in-data"}"#).as_deref(), Some("in-data"));
        assert_eq!(upload_id(r#"{"data": {"file_id": "deep"}}"#).as_deref(), Some("deep"));
        assert_eq!(upload_id(""), None);
        assert_eq!(upload_id("{}"), None);
    }
}
