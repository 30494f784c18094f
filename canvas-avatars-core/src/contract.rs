//! # contract: data model and the remote connector capability
//!
//! This module defines the plain data passed between the pipeline stages and the
//! [`Connector`] trait that every remote backend implements.
//!
//! ## Identity
//! A [`Client`] keeps the roster identifier it was created with for its whole
//! life. The remote platform's own identifier is stored next to it once
//! resolved, so logs can always name both.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockConnector` is exported under the
//!   `test-export-mocks` feature so the CLI crate's tests can use it too.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// One row of the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    /// External (SIS) identifier of the person.
    pub client_id: String,
    /// File name of the avatar image inside the images directory.
    pub image_filename: String,
}

/// Snapshot of an image file taken when it was resolved.
///
/// The size always matches the payload; the file is never reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    name: String,
    content_type: String,
    raw_bytes: Vec<u8>,
}

impl ImageDescriptor {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        raw_bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            raw_bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.raw_bytes.len() as u64
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }
}

/// Internal account identifier assigned by the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteId(pub u64);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a file stored on the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("client id is empty")]
    EmptyId,
    #[error("image name is empty")]
    UnnamedImage,
    #[error("image {0} has no content")]
    EmptyImage(String),
}

/// A person whose avatar will be uploaded.
///
/// Only ever constructed around a resolved image. The remote identifiers start
/// empty and are filled in, once each, as the upload sequence progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    external_id: String,
    remote_id: Option<RemoteId>,
    uploaded_file: Option<FileId>,
    image: ImageDescriptor,
}

impl Client {
    pub fn new(external_id: impl Into<String>, image: ImageDescriptor) -> Result<Self, ClientError> {
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(ClientError::EmptyId);
        }
        if image.name().trim().is_empty() {
            return Err(ClientError::UnnamedImage);
        }
        if image.raw_bytes().is_empty() {
            return Err(ClientError::EmptyImage(image.name().to_string()));
        }
        Ok(Self {
            external_id,
            remote_id: None,
            uploaded_file: None,
            image,
        })
    }

    /// The roster (SIS) identifier. Never changes.
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn remote_id(&self) -> Option<RemoteId> {
        self.remote_id
    }

    pub fn uploaded_file(&self) -> Option<FileId> {
        self.uploaded_file
    }

    pub fn image(&self) -> &ImageDescriptor {
        &self.image
    }

    pub fn assign_remote_id(&mut self, id: RemoteId) {
        self.remote_id = Some(id);
    }

    pub fn record_uploaded_file(&mut self, id: FileId) {
        self.uploaded_file = Some(id);
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remote_id {
            Some(id) => write!(f, "{} (remote {})", self.external_id, id),
            None => write!(f, "{}", self.external_id),
        }
    }
}

/// Why a roster record never became a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ImageNotFound,
    InvalidClient(ClientError),
}

/// A roster record that was dropped before the upload phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub client_id: String,
    pub image_filename: String,
    pub reason: SkipReason,
}

/// Final state of one accepted client after the upload phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadOutcome {
    /// All three remote steps succeeded.
    AvatarSet,
    SkippedIdNotFound,
    SkippedUploadFailed,
    /// The file reached remote storage but could not be bound as avatar.
    FailedAvatarSet,
}

impl UploadOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, UploadOutcome::AvatarSet)
    }
}

/// Failure to establish a session with the remote platform.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("remote service refused the connection (HTTP {status})")]
    Refused { status: u16 },
    #[error("could not reach remote service: {0}")]
    Transport(String),
    #[error("invalid connector configuration: {0}")]
    InvalidConfig(String),
}

/// Capability interface for a remote learning platform.
///
/// An implementor is only handed out once its connection has been verified.
/// Every step reports failure as `false`; implementors log the cause themselves
/// and never let one client's failure escape as an error.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Look up the client's remote account by its external id and store the
    /// remote id on the client.
    async fn resolve_remote_id(&self, client: &mut Client) -> bool;

    /// Transfer the client's image into the account's file storage and record
    /// the resulting file id on the client.
    async fn upload_file(&self, client: &mut Client) -> bool;

    /// Bind the uploaded file as the account's avatar.
    async fn set_avatar(&self, client: &Client) -> bool;
}
