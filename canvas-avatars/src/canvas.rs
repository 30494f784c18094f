//! # Canvas connector
//!
//! Implements the core [`Connector`] trait against the Canvas LMS REST API.
//!
//! - [`CanvasClient::connect`] builds the API base URL from the configured domain and
//!   probes `GET /accounts` before handing the client out.
//! - One bearer token is used for the whole run.
//! - Redirects are never followed: the file-upload step inspects the redirect itself.
//!
//! Every step logs its own failure and reports `false`; no error leaves this module
//! through the trait.

use async_trait::async_trait;
use canvas_avatars_core::contract::{Client, ConnectError, Connector, FileId, RemoteId};
use reqwest::header::LOCATION;
use reqwest::multipart::{Form, Part};
use reqwest::{redirect, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Folder in the user's file storage that receives uploaded avatars.
pub const AVATAR_FOLDER: &str = "profile pictures";

#[derive(Debug, thiserror::Error)]
enum CanvasError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote id has not been resolved")]
    Unresolved,
    #[error("no file has been uploaded")]
    NotUploaded,
    #[error("upload redirect carried no usable Location header")]
    MissingLocation,
    #[error("no avatar option for uploaded file {0}")]
    NoAvatarOption(FileId),
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    id: u64,
}

/// Answer to the upload announcement: a one-time target plus the form fields it expects.
#[derive(Debug, Deserialize)]
struct UploadTarget {
    upload_url: String,
    #[serde(default)]
    upload_params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AvatarOption {
    #[serde(rename = "type")]
    kind: String,
    token: String,
    #[serde(default)]
    id: Option<u64>,
}

/// Turns the configured domain into the API base URL.
///
/// A bare host becomes `https://{host}/api/v1`; a value that already carries a
/// scheme is used as-is.
pub fn api_base_url(domain: &str) -> Result<String, ConnectError> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return Err(ConnectError::InvalidConfig("domain is empty".into()));
    }
    if domain.starts_with("http://") || domain.starts_with("https://") {
        Ok(domain.to_string())
    } else {
        Ok(format!("https://{domain}/api/v1"))
    }
}

fn param_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

async fn expect_success(response: Response) -> Result<Response, CanvasError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CanvasError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Authenticated session against one Canvas instance.
pub struct CanvasClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl CanvasClient {
    /// Connects to the Canvas instance at `domain` and verifies the connection.
    pub async fn connect(domain: &str, token: &str) -> Result<Self, ConnectError> {
        let base_url = api_base_url(domain)?;
        Self::connect_to(base_url, token).await
    }

    /// Connects to an explicit API base URL (e.g. `http://127.0.0.1:8080/api/v1`).
    pub async fn connect_to(
        base_url: impl Into<String>,
        token: &str,
    ) -> Result<Self, ConnectError> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        let client = Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.to_string(),
        };
        info!(
            base_url = %client.base_url,
            access_token_len = client.token.len(),
            "Initialised Canvas client"
        );
        client.test_connection().await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn test_connection(&self) -> Result<(), ConnectError> {
        let url = format!("{}/accounts", self.base_url);
        let response = self
            .authorised(self.http.get(&url))
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Canvas could not be reached");
                ConnectError::Transport(e.to_string())
            })?;

        if response.status() == reqwest::StatusCode::OK {
            info!("Canvas connection successfully tested");
            Ok(())
        } else {
            let status = response.status().as_u16();
            error!(status, "Canvas refused the connection");
            Err(ConnectError::Refused { status })
        }
    }

    async fn fetch_remote_id(&self, external_id: &str) -> Result<RemoteId, CanvasError> {
        let url = format!("{}/users/sis_user_id:{}", self.base_url, external_id);
        let response = self.authorised(self.http.get(&url)).send().await?;
        let user: UserProfile = expect_success(response).await?.json().await?;
        Ok(RemoteId(user.id))
    }

    async fn announce_upload(
        &self,
        client: &Client,
        remote_id: RemoteId,
    ) -> Result<UploadTarget, CanvasError> {
        let image = client.image();
        let url = format!("{}/self/files", self.base_url);
        let form = [
            ("name", image.name().to_string()),
            ("size", image.size_bytes().to_string()),
            ("content_type", image.content_type().to_string()),
            ("parent_folder_path", AVATAR_FOLDER.to_string()),
            ("as_user_id", remote_id.to_string()),
        ];
        let response = self.authorised(self.http.post(&url)).form(&form).send().await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn transfer(&self, client: &Client, target: UploadTarget) -> Result<FileId, CanvasError> {
        let image = client.image();

        // Server-issued fields go first, in the order given; the file part must be last.
        let mut form = Form::new();
        for (key, value) in target.upload_params {
            if let Some(value) = param_value(value) {
                form = form.text(key, value);
            }
        }
        let part = Part::bytes(image.raw_bytes().to_vec())
            .file_name(image.name().to_string())
            .mime_str(image.content_type())?;
        form = form.part("file", part);

        let response = self
            .http
            .post(&target.upload_url)
            .multipart(form)
            .send()
            .await?;

        let file: UploadedFile = if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or(CanvasError::MissingLocation)?
                .to_string();
            debug!(location = %location, "Confirming upload");
            let confirm = self.authorised(self.http.get(&location)).send().await?;
            expect_success(confirm).await?.json().await?
        } else {
            expect_success(response).await?.json().await?
        };
        Ok(FileId(file.id))
    }

    async fn bind_avatar(&self, remote_id: RemoteId, file_id: FileId) -> Result<(), CanvasError> {
        let url = format!("{}/users/{}/avatars", self.base_url, remote_id);
        let response = self.authorised(self.http.get(&url)).send().await?;
        let options: Vec<AvatarOption> = expect_success(response).await?.json().await?;

        let option = options
            .into_iter()
            .find(|option| option.kind == "attachment" && option.id == Some(file_id.0))
            .ok_or(CanvasError::NoAvatarOption(file_id))?;

        let url = format!("{}/users/{}", self.base_url, remote_id);
        let response = self
            .authorised(self.http.put(&url))
            .form(&[("user[avatar][token]", option.token.as_str())])
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Connector for CanvasClient {
    async fn resolve_remote_id(&self, client: &mut Client) -> bool {
        info!(client_id = %client.external_id(), "Getting Canvas ID");
        match self.fetch_remote_id(client.external_id()).await {
            Ok(remote_id) => {
                info!(client_id = %client.external_id(), %remote_id, "Canvas ID resolved");
                client.assign_remote_id(remote_id);
                true
            }
            Err(e) => {
                error!(client_id = %client.external_id(), error = %e, "User cannot be found in Canvas");
                false
            }
        }
    }

    async fn upload_file(&self, client: &mut Client) -> bool {
        let Some(remote_id) = client.remote_id() else {
            let cause = CanvasError::Unresolved;
            error!(client = %client, error = %cause, "Cannot upload file");
            return false;
        };

        let result = match self.announce_upload(client, remote_id).await {
            Ok(target) => {
                debug!(upload_url = %target.upload_url, params = target.upload_params.len(), "Upload target issued");
                self.transfer(client, target).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(file_id) => {
                info!(client = %client, %file_id, image = %client.image().name(), "File uploaded");
                client.record_uploaded_file(file_id);
                true
            }
            Err(e) => {
                error!(client = %client, error = %e, "File upload failed");
                false
            }
        }
    }

    async fn set_avatar(&self, client: &Client) -> bool {
        let (Some(remote_id), Some(file_id)) = (client.remote_id(), client.uploaded_file()) else {
            let cause = if client.remote_id().is_none() {
                CanvasError::Unresolved
            } else {
                CanvasError::NotUploaded
            };
            error!(client = %client, error = %cause, "Cannot set avatar");
            return false;
        };

        match self.bind_avatar(remote_id, file_id).await {
            Ok(()) => {
                info!(client = %client, %file_id, "Avatar updated");
                true
            }
            Err(e) => {
                error!(client = %client, %file_id, error = %e, "Setting avatar failed");
                false
            }
        }
    }
}
