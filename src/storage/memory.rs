use super::backend::{ObjectStore, StoredObject};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-process object store used by the handler tests
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Bytes, Option<String>)>>,
    presigned: Mutex<Vec<PresignRecord>>,
    calls: AtomicUsize,
    fail: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresignRecord {
    pub method: &'static str,
    pub key: String,
    pub content_type: Option<String>,
    pub expires_in: Duration,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails
    pub fn failing() -> Self {
        MemoryStorage {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn presigned(&self) -> Vec<PresignRecord> {
        self.presigned.lock().unwrap().clone()
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow::anyhow!("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStorage {
    async fn put_object(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> Result<()> {
        self.enter()?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.map(str::to_string)));
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        self.enter()?;
        let (bytes, content_type) = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", key))?;

        Ok(StoredObject {
            content_type,
            body: futures::stream::once(async move { Ok::<_, std::io::Error>(bytes) }).boxed(),
        })
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        self.enter()?;
        self.presigned.lock().unwrap().push(PresignRecord {
            method: "PUT",
            key: key.to_string(),
            content_type: Some(content_type.to_string()),
            expires_in,
        });
        Ok(format!(
            "https://bucket.test/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        self.enter()?;
        self.presigned.lock().unwrap().push(PresignRecord {
            method: "GET",
            key: key.to_string(),
            content_type: None,
            expires_in,
        });
        Ok(format!(
            "https://bucket.test/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}
