// REST client for the exam-calendar backend. Session-cookie based: the
// login response sets the session cookie, which is replayed on every
// subsequent request together with Django's CSRF token for mutations.
use crate::client::cert::NoVerifier;
use crate::model::{
    AssignResponse, ExamCalendar, Id, NewCalendar, NewRule, NewSubject, Rule, Subject,
    SubjectPatch, User, Version,
};

use chrono::NaiveDate;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type HttpClient = Client<
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    String,
>;

/// Fallback when a mutation fails without a structured server message.
pub const GENERIC_ASSIGN_ERROR: &str = "The assignment could not be saved.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// Error payloads the backend produces: DRF uses `detail`, the assignment
/// validator uses `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn server_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.message.or(parsed.detail)
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: HttpClient,
    base: String,
    cookies: Arc<Mutex<HashMap<String, String>>>,
}

impl ApiClient {
    pub fn new(api_url: &str, insecure: bool) -> Result<Self, String> {
        if api_url.is_empty() {
            return Err("API URL is not configured.".to_string());
        }

        let tls_config_builder = rustls::ClientConfig::builder();
        let tls_config = if insecure {
            tls_config_builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);
            if root_store.is_empty() {
                return Err("No valid system certificates found.".to_string());
            }
            tls_config_builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http = Client::builder(TokioExecutor::new()).build(https_connector);

        Ok(Self {
            http,
            base: api_url.trim_end_matches('/').to_string(),
            cookies: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    // --- TRANSPORT ---

    fn cookie_header(&self) -> Option<String> {
        let jar = self.cookies.lock().unwrap();
        if jar.is_empty() {
            return None;
        }
        let mut pairs: Vec<String> = jar.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();
        Some(pairs.join("; "))
    }

    fn csrf_token(&self) -> Option<String> {
        self.cookies.lock().unwrap().get("csrftoken").cloned()
    }

    fn store_cookies<T>(&self, response: &http::Response<T>) {
        let mut jar = self.cookies.lock().unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            if let Ok(raw) = value.to_str()
                && let Some(pair) = raw.split(';').next()
                && let Some((name, val)) = pair.split_once('=')
            {
                jar.insert(name.trim().to_string(), val.trim().to_string());
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<(StatusCode, Vec<u8>), String> {
        let uri = format!("{}{}", self.base, path);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(header::ACCEPT, "application/json");

        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        // Django requires the CSRF token on session-authenticated mutations.
        if method != Method::GET
            && let Some(token) = self.csrf_token()
        {
            builder = builder.header("X-CSRFToken", token);
        }

        let request = builder
            .body(body.unwrap_or_default())
            .map_err(|e| format!("Invalid request: {}", e))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        self.store_cookies(&response);
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("Network error: {}", e))?
            .to_bytes();

        log::debug!("{} {} -> {}", method, path, status);
        Ok((status, bytes.to_vec()))
    }

    fn fail(status: StatusCode, body: &[u8]) -> String {
        server_message(body).unwrap_or_else(|| format!("Server error ({})", status.as_u16()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let (status, body) = self.send(Method::GET, path, None).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| format!("Invalid response payload: {}", e))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl serde::Serialize,
    ) -> Result<T, String> {
        let body = serde_json::to_string(payload)
            .map_err(|e| format!("Invalid request payload: {}", e))?;
        let (status, body) = self.send(Method::POST, path, Some(body)).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| format!("Invalid response payload: {}", e))
    }

    async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl serde::Serialize,
    ) -> Result<T, String> {
        let body = serde_json::to_string(payload)
            .map_err(|e| format!("Invalid request payload: {}", e))?;
        let (status, body) = self.send(Method::PATCH, path, Some(body)).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| format!("Invalid response payload: {}", e))
    }

    async fn delete(&self, path: &str) -> Result<(), String> {
        let (status, body) = self.send(Method::DELETE, path, None).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        Ok(())
    }

    // --- AUTH ---

    pub async fn login(&self, username: &str, password: &str) -> Result<User, String> {
        self.post_json(
            "/auth/login/",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Returns `None` when there is no active session.
    pub async fn me(&self) -> Result<Option<User>, String> {
        let (status, body) = self.send(Method::GET, "/auth/me/", None).await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| format!("Invalid response payload: {}", e))
    }

    pub async fn logout(&self) -> Result<(), String> {
        let (status, body) = self.send(Method::POST, "/auth/logout/", None).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        Ok(())
    }

    // --- CALENDARS ---

    pub async fn list_calendars(&self) -> Result<Vec<ExamCalendar>, String> {
        self.get_json("/calendars/").await
    }

    pub async fn create_calendar(&self, calendar: &NewCalendar) -> Result<ExamCalendar, String> {
        self.post_json("/calendars/", calendar).await
    }

    pub async fn get_calendar(&self, id: Id) -> Result<ExamCalendar, String> {
        self.get_json(&format!("/calendars/{}/", id)).await
    }

    pub async fn delete_calendar(&self, id: Id) -> Result<(), String> {
        self.delete(&format!("/calendars/{}/", id)).await
    }

    /// Upsert of an exam event. A missing `event_id` places a previously
    /// unassigned subject; a present one moves the existing event.
    ///
    /// Rejections surface the server's validator message verbatim when one
    /// is present; transport failures collapse to the generic message.
    pub async fn assign_event(
        &self,
        calendar: Id,
        subject: Id,
        date: NaiveDate,
        event_id: Option<Id>,
    ) -> Result<AssignResponse, String> {
        let mut payload = json!({ "subject": subject, "date": date });
        if let Some(id) = event_id {
            payload["event_id"] = json!(id);
        }
        let body = payload.to_string();
        let path = format!("/calendars/{}/assign_event/", calendar);

        let (status, body) = match self.send(Method::POST, &path, Some(body)).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("assign_event transport failure: {}", e);
                return Err(GENERIC_ASSIGN_ERROR.to_string());
            }
        };

        if !status.is_success() {
            return Err(server_message(&body).unwrap_or_else(|| GENERIC_ASSIGN_ERROR.to_string()));
        }
        serde_json::from_slice(&body).map_err(|e| format!("Invalid response payload: {}", e))
    }

    pub async fn remove_event(&self, calendar: Id, event: Id) -> Result<(), String> {
        self.delete(&format!("/calendars/{}/events/{}/", calendar, event))
            .await
    }

    /// Returns the new blocked state of the day.
    pub async fn toggle_blocked_day(&self, calendar: Id, date: NaiveDate) -> Result<bool, String> {
        #[derive(Deserialize)]
        struct Reply {
            blocked: bool,
        }
        let reply: Reply = self
            .post_json(
                &format!("/calendars/{}/toggle_blocked_day/", calendar),
                &json!({ "date": date }),
            )
            .await?;
        Ok(reply.blocked)
    }

    // --- VERSIONS ---

    pub async fn list_versions(&self) -> Result<Vec<Version>, String> {
        self.get_json("/versions/").await
    }

    pub async fn save_version(&self, calendar: Id, label: &str) -> Result<Version, String> {
        self.post_json(
            &format!("/calendars/{}/save_version/", calendar),
            &json!({ "label": label }),
        )
        .await
    }

    /// Applies a saved snapshot onto the live calendar. Irreversible without
    /// another save.
    pub async fn restore_version(&self, calendar: Id, version: Id) -> Result<(), String> {
        let path = format!("/calendars/{}/restore_version/{}/", calendar, version);
        let (status, body) = self.send(Method::POST, &path, None).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        Ok(())
    }

    pub async fn delete_version(&self, calendar: Id, version: Id) -> Result<(), String> {
        self.delete(&format!("/calendars/{}/versions/{}/", calendar, version))
            .await
    }

    /// Fetches an export document as raw bytes; the caller decides where to
    /// write it.
    pub async fn export(
        &self,
        calendar: Id,
        format: ExportFormat,
        version_id: Option<Id>,
    ) -> Result<Vec<u8>, String> {
        let mut path = format!("/calendars/{}/export/{}/", calendar, format.path_segment());
        if let Some(v) = version_id {
            path.push_str(&format!("?version_id={}", v));
        }
        let (status, body) = self.send(Method::GET, &path, None).await?;
        if !status.is_success() {
            return Err(Self::fail(status, &body));
        }
        Ok(body)
    }

    // --- SUBJECTS ---

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, String> {
        self.get_json("/subjects/").await
    }

    pub async fn create_subject(&self, subject: &NewSubject) -> Result<Subject, String> {
        self.post_json("/subjects/", subject).await
    }

    pub async fn update_subject(&self, id: Id, patch: &SubjectPatch) -> Result<Subject, String> {
        self.patch_json(&format!("/subjects/{}/", id), patch).await
    }

    pub async fn delete_subject(&self, id: Id) -> Result<(), String> {
        self.delete(&format!("/subjects/{}/", id)).await
    }

    // --- RULES ---

    pub async fn list_rules(&self) -> Result<Vec<Rule>, String> {
        self.get_json("/rules/").await
    }

    pub async fn create_rule(&self, rule: &NewRule) -> Result<Rule, String> {
        self.post_json("/rules/", rule).await
    }

    pub async fn delete_rule(&self, id: Id) -> Result<(), String> {
        self.delete(&format!("/rules/{}/", id)).await
    }

    // --- AGGREGATE LOADS ---

    /// The planner's four collections, fetched in parallel. Every mutation
    /// is followed by this full reload; the client never patches locally.
    pub async fn load_board(
        &self,
        calendar: Id,
    ) -> Result<(ExamCalendar, Vec<Subject>, Vec<Rule>, Vec<Version>), String> {
        futures::try_join!(
            self.get_calendar(calendar),
            self.list_subjects(),
            self.list_rules(),
            self.list_versions(),
        )
    }

    /// Home screen data: calendars and subjects, fetched in parallel.
    pub async fn load_home(&self) -> Result<(Vec<ExamCalendar>, Vec<Subject>), String> {
        futures::try_join!(self.list_calendars(), self.list_subjects())
    }
}
