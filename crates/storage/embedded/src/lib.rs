//! Embedded record store: the whole database lives in one JSON image file.
//!
//! Every mutation rewrites the full image, so save latency grows with the number of
//! live records. Fine for a single process holding a modest volume; anything larger
//! should use the managed provider.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use schemashare_core::{
    embedded_retention, generate_id, sweep_cutoff, RecordId, RecordStore, ValidationRecord,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug, Error)]
pub enum EmbeddedError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serde error: {0}")]
    Serde(String),
    #[error("store initialization failed: {0}")]
    Init(String),
}

const IMAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone)]
struct Image {
    #[serde(default = "Image::current_version")]
    version: u32,
    #[serde(default)]
    records: BTreeMap<RecordId, Row>,
}

impl Image {
    fn current_version() -> u32 {
        IMAGE_VERSION
    }
}

impl Default for Image {
    fn default() -> Self {
        Self {
            version: IMAGE_VERSION,
            records: BTreeMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct Row {
    schema: String,
    json: String,
    created_at: DateTime<Utc>,
}

pub struct EmbeddedStorage {
    shared: Arc<Shared>,
    retention: Duration,
}

struct Shared {
    path: PathBuf,
    // Init outcome is cached, failures included: a broken file is not retried per call.
    image: OnceCell<Result<Mutex<Image>, EmbeddedError>>,
}

impl EmbeddedStorage {
    /// Prepare a store backed by `path`. Nothing touches the disk until the first operation.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.as_ref().to_path_buf(),
                image: OnceCell::new(),
            }),
            retention: embedded_retention(),
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Number of live records, after a sweep.
    pub async fn len(&self) -> Result<usize, EmbeddedError> {
        let mut image = self.shared.image().await?.lock().await;
        self.shared.sweep_and_persist(&mut image, self.retention).await?;
        Ok(image.records.len())
    }

    pub async fn is_empty(&self) -> Result<bool, EmbeddedError> {
        Ok(self.len().await? == 0)
    }
}

impl Shared {
    async fn image(&self) -> Result<&Mutex<Image>, EmbeddedError> {
        let slot = self
            .image
            .get_or_init(|| async {
                let path = self.path.clone();
                let loaded = match tokio::task::spawn_blocking(move || load_image(&path)).await
                {
                    Ok(res) => res.map_err(|e| EmbeddedError::Init(e.to_string())),
                    Err(e) => Err(EmbeddedError::Init(e.to_string())),
                };
                match &loaded {
                    Ok(image) => info!(
                        path = %self.path.display(),
                        records = image.records.len(),
                        "embedded store opened"
                    ),
                    Err(e) => error!(path = %self.path.display(), error = %e, "embedded store failed to open"),
                }
                loaded.map(Mutex::new)
            })
            .await;
        slot.as_ref().map_err(Clone::clone)
    }

    async fn persist(&self, image: &Image) -> Result<(), EmbeddedError> {
        let data = serde_json::to_vec(image).map_err(|e| EmbeddedError::Serde(e.to_string()))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_image(&path, &data))
            .await
            .map_err(|e| EmbeddedError::Io(e.to_string()))?
    }

    async fn sweep_and_persist(
        &self,
        image: &mut Image,
        retention: Duration,
    ) -> Result<usize, EmbeddedError> {
        let removed = sweep(image, retention, Utc::now());
        if removed > 0 {
            self.persist(image).await?;
        }
        Ok(removed)
    }

    async fn insert(
        &self,
        retention: Duration,
        schema: String,
        json: String,
    ) -> Result<RecordId, EmbeddedError> {
        let mut image = self.image().await?.lock().await;
        let now = Utc::now();
        let swept = sweep(&mut image, retention, now);
        let id = generate_id();
        image.records.insert(
            id.clone(),
            Row {
                schema,
                json,
                created_at: now,
            },
        );
        if let Err(e) = self.persist(&image).await {
            image.records.remove(&id);
            warn!(record_id = %id, error = %e, "embedded save failed; insert rolled back");
            return Err(e);
        }
        debug!(
            record_id = %id,
            swept,
            records = image.records.len(),
            "embedded save committed"
        );
        Ok(id)
    }
}

fn sweep(image: &mut Image, retention: Duration, now: DateTime<Utc>) -> usize {
    let cutoff = sweep_cutoff(now, retention);
    let before = image.records.len();
    image.records.retain(|_, row| row.created_at >= cutoff);
    let removed = before - image.records.len();
    if removed > 0 {
        info!(removed, cutoff = %cutoff, "embedded sweep removed expired records");
    }
    removed
}

#[async_trait]
impl RecordStore for EmbeddedStorage {
    type Error = EmbeddedError;

    async fn save(&self, schema: &str, json: &str) -> Result<RecordId, Self::Error> {
        let shared = Arc::clone(&self.shared);
        let retention = self.retention;
        let (schema, json) = (schema.to_owned(), json.to_owned());
        // Detached so that insert, write and rollback finish even if the caller goes away.
        tokio::spawn(async move { shared.insert(retention, schema, json).await })
            .await
            .map_err(|e| EmbeddedError::Io(e.to_string()))?
    }

    async fn get(&self, id: &str) -> Result<Option<ValidationRecord>, Self::Error> {
        let mut image = self.shared.image().await?.lock().await;
        self.shared.sweep_and_persist(&mut image, self.retention).await?;
        let found = image
            .records
            .get(id)
            .map(|row| ValidationRecord::new(id.to_owned(), &row.schema, &row.json, row.created_at));
        debug!(record_id = id, hit = found.is_some(), "embedded get");
        Ok(found)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_image(path: &Path) -> Result<Image, EmbeddedError> {
    fs::create_dir_all(parent_dir(path)).map_err(|e| EmbeddedError::Io(e.to_string()))?;
    if !path.exists() {
        return Ok(Image::default());
    }
    let mut s = String::new();
    File::open(path)
        .map_err(|e| EmbeddedError::Io(e.to_string()))?
        .read_to_string(&mut s)
        .map_err(|e| EmbeddedError::Io(e.to_string()))?;
    if s.trim().is_empty() {
        return Ok(Image::default());
    }
    let image: Image = serde_json::from_str(&s).map_err(|e| EmbeddedError::Serde(e.to_string()))?;
    if image.version > IMAGE_VERSION {
        return Err(EmbeddedError::Serde(format!(
            "unsupported image version {}",
            image.version
        )));
    }
    Ok(image)
}

fn write_image(path: &Path, data: &[u8]) -> Result<(), EmbeddedError> {
    let dir = parent_dir(path);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("records.json");
    let ts = Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let tmp = dir.join(format!(".tmp-{}-{}-{}", name, std::process::id(), ts));
    write_atomic(&tmp, path, data)
}

// The previous image stays intact until the rename lands.
fn write_atomic(tmp: &Path, final_path: &Path, data: &[u8]) -> Result<(), EmbeddedError> {
    let staged = File::create(tmp)
        .and_then(|mut f| {
            f.write_all(data)?;
            f.sync_all()
        })
        .and_then(|()| fs::rename(tmp, final_path));
    if let Err(e) = staged {
        let _ = fs::remove_file(tmp);
        return Err(EmbeddedError::Io(e.to_string()));
    }
    // Committed once renamed; a failed directory sync cannot undo that.
    if let Err(e) = File::open(parent_dir(final_path)).and_then(|dir| dir.sync_all()) {
        warn!(path = %final_path.display(), error = %e, "directory sync after rename failed");
    }
    Ok(())
}
