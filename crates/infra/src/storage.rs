//! Object storage for product images and technical files.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gpsrhub_core::{FileUpload, UserId};

use crate::config::StorageConfig;
use crate::error::CollaboratorError;
use crate::persistence::StoreResult;

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Path inside the bucket, `{owner}/{name}`.
    pub path: String,
    pub public_url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `file` in the owner's folder. `name_hint` seeds the object name.
    async fn upload(&self, file: &FileUpload, owner_id: UserId, name_hint: &str) -> StoreResult<StoredObject>;

    /// Delete the object behind a public URL. `Ok(false)` when the URL is not one
    /// of ours or nothing was stored there.
    async fn delete(&self, public_url: &str) -> StoreResult<bool>;
}

/// `{base}/storage/v1/object/public/{bucket}/{path}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlLayout {
    prefix: String,
}

impl PublicUrlLayout {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            prefix: format!(
                "{}/storage/v1/object/public/{}/",
                config.public_base_url.as_str().trim_end_matches('/'),
                config.bucket
            ),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.prefix)
    }

    /// Reverse of `public_url`; `None` for foreign or malformed URLs.
    pub fn path_of(&self, public_url: &str) -> Option<String> {
        let path = public_url.strip_prefix(&self.prefix)?;
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let valid = !path.is_empty()
            && path
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        valid.then(|| path.to_string())
    }

    /// Fresh, collision-free object path for an upload.
    pub fn object_path(owner_id: UserId, name_hint: &str, file: &FileUpload) -> String {
        let stem = sanitize(name_hint);
        let id = Uuid::now_v7().simple();
        match file.extension() {
            Some(ext) => format!("{owner_id}/{stem}-{id}.{}", sanitize(&ext)),
            None => format!("{owner_id}/{stem}-{id}"),
        }
    }
}

/// Lowercase ASCII letters, digits and single dashes.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Object storage held in memory, for tests and local runs.
#[derive(Debug)]
pub struct InMemoryObjectStorage {
    layout: PublicUrlLayout,
    objects: RwLock<HashMap<String, FileUpload>>,
    delete_calls: AtomicUsize,
}

impl InMemoryObjectStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            layout: PublicUrlLayout::new(config),
            objects: RwLock::new(HashMap::new()),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn layout(&self) -> &PublicUrlLayout {
        &self.layout
    }

    pub fn contains_url(&self, public_url: &str) -> bool {
        let Some(path) = self.layout.path_of(public_url) else {
            return false;
        };
        self.objects
            .read()
            .map(|objects| objects.contains_key(&path))
            .unwrap_or(false)
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    /// Delete requests that reached the store (foreign URLs are not counted).
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, file: &FileUpload, owner_id: UserId, name_hint: &str) -> StoreResult<StoredObject> {
        if file.is_empty() {
            return Err(CollaboratorError::rejected(format!("{} is empty", file.file_name)));
        }
        let path = PublicUrlLayout::object_path(owner_id, name_hint, file);
        let mut objects = self
            .objects
            .write()
            .map_err(|_| CollaboratorError::unavailable("lock poisoned"))?;
        objects.insert(path.clone(), file.clone());
        Ok(StoredObject {
            public_url: self.layout.public_url(&path),
            path,
        })
    }

    async fn delete(&self, public_url: &str) -> StoreResult<bool> {
        let Some(path) = self.layout.path_of(public_url) else {
            return Ok(false);
        };
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self
            .objects
            .write()
            .map_err(|_| CollaboratorError::unavailable("lock poisoned"))?;
        Ok(objects.remove(&path).is_some())
    }
}
