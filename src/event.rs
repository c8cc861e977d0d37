// WHY: Queue-driven entry point: parse the queued storage events, fetch each referenced
// object and hand the raw bytes back to the caller for augmentation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const HANDLER_MESSAGE: &str = "garble event handled";

/// Queue delivery wrapping zero or more records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    /// JSON-encoded [`StorageEvent`]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    pub detail: StorageDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageDetail {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

/// Storage-location reference handed to an [`ObjectFetcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

impl From<&StorageEvent> for ObjectLocation {
    fn from(event: &StorageEvent) -> Self {
        Self {
            bucket: event.detail.bucket.name.clone(),
            key: event.detail.object.key.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event is not a queue event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    #[error("Record {index} body is not a storage event: {source}")]
    InvalidRecord {
        index: usize,
        source: serde_json::Error,
    },

    #[error("Object location {0} escapes its bucket")]
    InvalidLocation(ObjectLocation),

    #[error("Failed to fetch {location}: {source}")]
    Fetch {
        location: ObjectLocation,
        source: std::io::Error,
    },
}

/// Byte retrieval collaborator
pub trait ObjectFetcher {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, EventError>;
}

/// Fetches objects from `<root>/<bucket>/<key>` on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a location to a path under the store root
    pub fn resolve(&self, location: &ObjectLocation) -> Result<PathBuf, EventError> {
        let is_plain = |segment: &str| {
            let path = Path::new(segment);
            !segment.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
        };
        if !is_plain(&location.bucket) || location.bucket.contains('/') || !is_plain(&location.key) {
            return Err(EventError::InvalidLocation(location.clone()));
        }
        Ok(self.root.join(&location.bucket).join(&location.key))
    }
}

impl ObjectFetcher for LocalObjectStore {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, EventError> {
        let path = self.resolve(location)?;
        debug!("Fetching {} from {}", location, path.display());
        std::fs::read(&path).map_err(|source| EventError::Fetch {
            location: location.clone(),
            source,
        })
    }
}

/// Aggregated result of one handled event
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub message: String,
    pub event: serde_json::Value,
    pub file_contents: Vec<Vec<u8>>,
}

/// Parse every record body of a queue event into object locations
pub fn object_locations(event: &serde_json::Value) -> Result<Vec<ObjectLocation>, EventError> {
    let queue_event: QueueEvent =
        serde_json::from_value(event.clone()).map_err(EventError::InvalidEvent)?;

    queue_event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_str::<StorageEvent>(&record.body)
                .map(|storage_event| ObjectLocation::from(&storage_event))
                .map_err(|source| EventError::InvalidRecord { index, source })
        })
        .collect()
}

/// Fetch the object behind every record, in record order
pub fn handle<F: ObjectFetcher + ?Sized>(
    event: &serde_json::Value,
    fetcher: &F,
) -> Result<HandlerResponse, EventError> {
    let locations = object_locations(event)?;

    let file_contents = locations
        .iter()
        .map(|location| fetcher.fetch(location))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Handled event with {} record(s)", file_contents.len());

    Ok(HandlerResponse {
        message: HANDLER_MESSAGE.to_string(),
        event: event.clone(),
        file_contents,
    })
}
