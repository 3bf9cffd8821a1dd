//! Preservica REST adapter
//!
//! Just enough of the Entity and Content APIs to drive a migration: token
//! login, index search, entity lookups and OPEX export. There is no retry
//! logic here; a failed call fails the object (or, for search, the run).

use crate::config::Credentials;
use crate::core::error::{OcflError, Result};
use crate::core::types::ObjectId;
use crate::remote::search::{SearchPage, SearchQuery, REFERENCE_FIELD};
use crate::remote::{Asset, ExportOptions, Folder, RemoteIdentity, RepositoryClient};
use parking_lot::Mutex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tracing::debug;

const TOKEN_HEADER: &str = "Preservica-Access-Token";
const ENTITY_NAMESPACE: &str = "http://preservica.com/EntityAPI/v7.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Tokens are valid for 15 minutes; renew well before that
const TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 60);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Give up on an export that has not completed after this long
const MAX_EXPORT_WAIT: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    tenant: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    value: SearchValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchValue {
    #[serde(default)]
    object_ids: Vec<String>,
    #[serde(default)]
    total_hits: usize,
    #[serde(default)]
    metadata: Vec<Vec<MetadataField>>,
}

#[derive(Debug, Deserialize)]
struct MetadataField {
    name: String,
    value: serde_json::Value,
}

struct Session {
    token: String,
    obtained: Instant,
}

/// Blocking client for a Preservica server
pub struct PreservicaClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    identity: RemoteIdentity,
    session: Mutex<Session>,
    poll_interval: Duration,
    max_export_wait: Duration,
}

impl PreservicaClient {
    /// Log in and return a ready client
    pub fn connect(credentials: &Credentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("preservica-ocfl/", env!("CARGO_PKG_VERSION")))
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(|e| OcflError::network(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = format!("https://{}", credentials.server);

        let login = login(&http, &base_url, credentials)?;
        let tenant = login
            .tenant
            .clone()
            .or_else(|| credentials.tenant.clone())
            .unwrap_or_default();

        Ok(Self {
            http,
            base_url,
            identity: RemoteIdentity {
                username: credentials.username.clone(),
                server: credentials.server.clone(),
                tenant,
            },
            credentials: credentials.clone(),
            session: Mutex::new(Session {
                token: login.token,
                obtained: Instant::now(),
            }),
            poll_interval: POLL_INTERVAL,
            max_export_wait: MAX_EXPORT_WAIT,
        })
    }

    fn token(&self) -> Result<String> {
        let mut session = self.session.lock();
        if session.obtained.elapsed() > TOKEN_LIFETIME {
            let login = login(&self.http, &self.base_url, &self.credentials)?;
            session.token = login.token;
            session.obtained = Instant::now();
        }
        Ok(session.token.clone())
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .header(TOKEN_HEADER, self.token()?)
            .send()
            .map_err(|e| OcflError::network(format!("{}: {}", what, e)))?;
        if !response.status().is_success() {
            return Err(OcflError::remote(format!(
                "{} returned status: {}",
                what,
                response.status()
            )));
        }
        Ok(response)
    }

    fn entity_title(&self, path: &str, reference: &str) -> Result<String> {
        let url = format!("{}/api/entity/{}/{}", self.base_url, path, reference);
        let body = self
            .send(self.http.get(&url).timeout(REQUEST_TIMEOUT), &url)?
            .text()
            .map_err(|e| OcflError::network(format!("{}: {}", url, e)))?;
        element_text(&body, "Title")
            .ok_or_else(|| OcflError::remote(format!("{} has no title", reference)))
    }

    fn start_export(&self, reference: &ObjectId, options: &ExportOptions) -> Result<String> {
        let url = format!(
            "{}/api/entity/information-objects/{}/exports",
            self.base_url, reference
        );
        let response = self.send(
            self.http
                .post(&url)
                .timeout(REQUEST_TIMEOUT)
                .header("Content-Type", "application/xml;charset=UTF-8")
                .body(export_request_xml(options)),
            &url,
        )?;
        let progress = response
            .text()
            .map_err(|e| OcflError::network(format!("{}: {}", url, e)))?;
        Ok(progress.trim().to_string())
    }

    fn wait_for_export(&self, progress: &str) -> Result<()> {
        let url = format!("{}/api/entity/progress/{}", self.base_url, progress);
        poll_export(progress, self.poll_interval, self.max_export_wait, || {
            self.send(self.http.get(&url).timeout(REQUEST_TIMEOUT), &url)?
                .text()
                .map_err(|e| OcflError::network(format!("{}: {}", url, e)))
        })
    }

    fn download_export(&self, progress: &str) -> Result<TempPath> {
        let url = format!(
            "{}/api/entity/actions/exports/{}/content",
            self.base_url, progress
        );
        let mut response = self.send(self.http.get(&url), &url)?;
        let mut file = tempfile::Builder::new()
            .prefix(progress)
            .suffix(".zip")
            .tempfile()?;
        response
            .copy_to(file.as_file_mut())
            .map_err(|e| OcflError::network(format!("{}: {}", url, e)))?;
        file.flush()?;
        Ok(file.into_temp_path())
    }
}

impl RepositoryClient for PreservicaClient {
    fn identity(&self) -> &RemoteIdentity {
        &self.identity
    }

    fn search_page(&self, query: &SearchQuery, start: usize, max: usize) -> Result<SearchPage> {
        let url = format!("{}/api/content/search", self.base_url);
        let fields: Vec<serde_json::Value> = query
            .filters
            .iter()
            .map(|(name, value)| serde_json::json!({ "name": name, "values": [value] }))
            .collect();
        let q = serde_json::json!({ "q": query.query, "fields": fields }).to_string();
        let form = [
            ("q", q),
            ("start", start.to_string()),
            ("max", max.to_string()),
            ("metadata", REFERENCE_FIELD.to_string()),
        ];

        let response: SearchResponse = self
            .send(self.http.post(&url).timeout(REQUEST_TIMEOUT).form(&form), &url)?
            .json()
            .map_err(|e| OcflError::remote(format!("unreadable search response: {}", e)))?;

        debug!(start, max, total = response.value.total_hits, "search page");
        Ok(page_from(response.value))
    }

    fn asset(&self, reference: &ObjectId) -> Result<Asset> {
        let title = self.entity_title("information-objects", &reference.to_string())?;
        Ok(Asset {
            reference: *reference,
            title,
        })
    }

    fn folder(&self, reference: &str) -> Result<Folder> {
        let title = self.entity_title("structural-objects", reference)?;
        Ok(Folder {
            reference: reference.to_string(),
            title,
        })
    }

    fn export_by_reference(
        &self,
        reference: &ObjectId,
        options: &ExportOptions,
    ) -> Result<TempPath> {
        let progress = self.start_export(reference, options)?;
        debug!(id = %reference, progress = %progress, "export started");
        self.wait_for_export(&progress)?;
        self.download_export(&progress)
    }
}

fn login(http: &Client, base_url: &str, credentials: &Credentials) -> Result<LoginResponse> {
    let url = format!("{}/api/accesstoken/login", base_url);
    let mut form = vec![
        ("username", credentials.username.clone()),
        ("password", credentials.password.clone()),
    ];
    if let Some(tenant) = &credentials.tenant {
        form.push(("tenant", tenant.clone()));
    }

    let response = http
        .post(&url)
        .timeout(REQUEST_TIMEOUT)
        .form(&form)
        .send()
        .map_err(|e| OcflError::network(format!("{}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(OcflError::Authentication {
            reason: format!("{} returned status: {}", url, response.status()),
        });
    }
    response.json().map_err(|e| OcflError::Authentication {
        reason: format!("unreadable login response: {}", e),
    })
}

fn page_from(value: SearchValue) -> SearchPage {
    let from_metadata: Vec<String> = value
        .metadata
        .iter()
        .filter_map(|fields| {
            fields
                .iter()
                .find(|field| field.name == REFERENCE_FIELD)
                .and_then(|field| field.value.as_str())
                .map(str::to_string)
        })
        .collect();

    let references = if from_metadata.len() == value.object_ids.len() {
        from_metadata
    } else {
        // object ids look like "sdb:IO|<reference>"
        value
            .object_ids
            .iter()
            .map(|id| id.rsplit('|').next().unwrap_or(id).to_string())
            .collect()
    };

    SearchPage {
        references,
        total_hits: value.total_hits,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportState {
    Running,
    Completed,
}

/// Interpret one progress response
fn export_state(progress: &str, body: &str) -> Result<ExportState> {
    let status = element_text(body, "Status").ok_or_else(|| {
        OcflError::remote(format!("progress response for export {} has no status", progress))
    })?;
    match status.as_str() {
        "COMPLETED" => Ok(ExportState::Completed),
        "ACTIVE" | "PENDING" => Ok(ExportState::Running),
        other => Err(OcflError::remote(format!("export {} ended {}", progress, other))),
    }
}

/// Fetch progress until the export completes, fails, or `max_wait` passes
fn poll_export<F>(
    progress: &str,
    interval: Duration,
    max_wait: Duration,
    mut fetch: F,
) -> Result<()>
where
    F: FnMut() -> Result<String>,
{
    let started = Instant::now();
    loop {
        let body = fetch()?;
        if export_state(progress, &body)? == ExportState::Completed {
            return Ok(());
        }
        if started.elapsed() >= max_wait {
            return Err(OcflError::remote(format!(
                "export {} still running after {}s",
                progress,
                max_wait.as_secs()
            )));
        }
        std::thread::sleep(interval);
    }
}

fn export_request_xml(options: &ExportOptions) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<ExportAction xmlns="{ns}">
    <IncludeContent>{content}</IncludeContent>
    <IncludeMetadata>{metadata}</IncludeMetadata>
    <IncludedGenerations>{generations}</IncludedGenerations>
    <IncludeParentHierarchy>{parents}</IncludeParentHierarchy>
</ExportAction>"#,
        ns = ENTITY_NAMESPACE,
        content = options.include_content,
        metadata = options.include_metadata,
        generations = options.included_generations,
        parents = options.include_parent_hierarchy,
    )
}

/// Text of the first element named `local_name`, with or without a
/// namespace prefix
fn element_text(xml: &str, local_name: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(open) = rest.find('<') {
        rest = &rest[open + 1..];
        let end = rest.find('>')?;
        let tag = &rest[..end];
        let name = tag.split_whitespace().next().unwrap_or("");
        let local = name.rsplit(':').next().unwrap_or(name);
        if local == local_name && !tag.starts_with('/') && !tag.ends_with('/') {
            let body = &rest[end + 1..];
            let close = body.find('<').unwrap_or(body.len());
            return Some(unescape(body[..close].trim()));
        }
        rest = &rest[end + 1..];
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
