//! Persisted annotations: the comment list and the per-second stroke map.
//!
//! Every mutation builds the next collection, writes it to its slot, and
//! only then replaces the in-memory copy. A failed write leaves both the
//! slot and memory as they were and is returned to the caller.

mod kv;

pub use kv::{FileStore, KvStore, MemoryStore};

use crate::anchor::Anchor;
use crate::comment::{Comment, Reply, DRAWING_ID_PREFIX};
use crate::draw::model::Stroke;
use crate::ids::IdSource;
use crate::time::{bucket_key, bucket_of, canonical_bucket_key};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Strokes filed by integer-second key.
pub type BucketMap = BTreeMap<String, Vec<Stroke>>;

/// Slot names for one schema version. Bumping the version starts fresh
/// slots and leaves older data in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub comments: String,
    pub drawings: String,
}

impl StorageKeys {
    pub fn for_version(version: u32) -> Self {
        Self {
            comments: format!("comments_v{version}"),
            drawings: format!("drawings_v{version}"),
        }
    }
}

fn load_slot<S, T>(kv: &mut S, key: &str) -> T
where
    S: KvStore,
    T: DeserializeOwned + Default,
{
    let content = match kv.get(key) {
        Ok(Some(content)) if !content.trim().is_empty() => content,
        Ok(_) => return T::default(),
        Err(err) => {
            tracing::warn!("failed to read {key}, starting empty: {err:#}");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("{key} is not readable, starting empty: {err}");
            if let Err(err) = kv.quarantine(key) {
                tracing::error!("failed to set aside unreadable {key}: {err:#}");
            }
            T::default()
        }
    }
}

fn save_slot<S, T>(kv: &mut S, key: &str, value: &T) -> Result<()>
where
    S: KvStore,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value).with_context(|| format!("serialize {key}"))?;
    if let Err(err) = kv.set(key, &json) {
        tracing::error!("failed to persist {key}: {err:#}");
        return Err(err.context(format!("persist {key}")));
    }
    Ok(())
}

/// Fold digit keys written with leading zeros into their canonical bucket,
/// after any strokes already filed there under the padded spelling.
fn normalize_bucket_keys(strokes: BucketMap) -> BucketMap {
    let mut normalized = BucketMap::new();
    for (key, bucket) in strokes {
        let key = match canonical_bucket_key(&key) {
            Some(canonical) => {
                tracing::warn!("refiling stroke bucket {key:?} under {canonical:?}");
                canonical
            }
            None => key,
        };
        normalized.entry(key).or_default().extend(bucket);
    }
    normalized
}

fn sort_by_timestamp(comments: &mut [Comment]) {
    // stable: same-second comments keep insertion order
    comments.sort_by_key(|c| c.timestamp);
}

pub struct AnnotationStore<S: KvStore> {
    kv: S,
    keys: StorageKeys,
    comments: Vec<Comment>,
    strokes: BucketMap,
    ids: IdSource,
}

impl<S: KvStore> AnnotationStore<S> {
    /// Load both collections. Missing or unreadable slots start empty.
    pub fn open(mut kv: S, schema_version: u32) -> Self {
        let keys = StorageKeys::for_version(schema_version);
        let loaded: Vec<Comment> = load_slot(&mut kv, &keys.comments);
        let strokes = normalize_bucket_keys(load_slot(&mut kv, &keys.drawings));

        let before = loaded.len();
        let mut comments: Vec<Comment> = loaded.into_iter().filter(|c| !c.is_drawing()).collect();
        if comments.len() != before {
            tracing::warn!(
                "dropped {} stored drawing placeholders from {}",
                before - comments.len(),
                keys.comments
            );
        }
        sort_by_timestamp(&mut comments);

        let mut ids = IdSource::new();
        for comment in &comments {
            ids.observe(&comment.id);
            for reply in &comment.replies {
                ids.observe(&reply.id);
            }
        }
        for stroke in strokes.values().flatten() {
            ids.observe(&stroke.id);
        }

        tracing::debug!(
            comments = comments.len(),
            buckets = strokes.len(),
            "loaded annotations"
        );
        Self {
            kv,
            keys,
            comments,
            strokes,
            ids,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn ids_mut(&mut self) -> &mut IdSource {
        &mut self.ids
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn strokes(&self) -> &BucketMap {
        &self.strokes
    }

    pub fn strokes_at(&self, bucket: &str) -> &[Stroke] {
        self.strokes.get(bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Persist `next` as the full comment list, then adopt it.
    pub fn save_comments(&mut self, mut next: Vec<Comment>) -> Result<()> {
        if let Some(c) = next.iter().find(|c| c.is_drawing()) {
            bail!("drawing placeholder {} cannot be stored as a comment", c.id);
        }
        sort_by_timestamp(&mut next);
        save_slot(&mut self.kv, &self.keys.comments, &next)?;
        tracing::debug!(count = next.len(), "saved comments");
        self.comments = next;
        Ok(())
    }

    /// Persist `next` as the full stroke map, then adopt it.
    pub fn save_strokes(&mut self, next: BucketMap) -> Result<()> {
        save_slot(&mut self.kv, &self.keys.drawings, &next)?;
        tracing::debug!(buckets = next.len(), "saved strokes");
        self.strokes = next;
        Ok(())
    }

    fn insert_comment(&mut self, comment: Comment) -> Result<Comment> {
        let mut next = self.comments.clone();
        next.push(comment.clone());
        self.save_comments(next)?;
        Ok(comment)
    }

    /// Add a plain comment at playback time `t`. Blank text is ignored.
    pub fn add_comment(&mut self, text: &str, t: f64) -> Result<Option<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring blank comment");
            return Ok(None);
        }
        let comment = Comment::plain(self.ids.next_id(), bucket_of(t), text);
        self.insert_comment(comment).map(Some)
    }

    /// Add a pin comment at playback time `t`. Blank text is ignored.
    pub fn add_anchor_comment(
        &mut self,
        text: &str,
        t: f64,
        anchor: Anchor,
    ) -> Result<Option<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring blank anchor comment");
            return Ok(None);
        }
        let comment = Comment::anchored(self.ids.next_id(), bucket_of(t), text, anchor);
        self.insert_comment(comment).map(Some)
    }

    /// Append a reply to `parent_id`. Blank text or an unknown parent is
    /// ignored.
    pub fn add_reply(&mut self, parent_id: &str, text: &str, t: f64) -> Result<Option<Reply>> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring blank reply");
            return Ok(None);
        }
        let Some(idx) = self.comments.iter().position(|c| c.id == parent_id) else {
            tracing::debug!("reply target {parent_id} no longer exists");
            return Ok(None);
        };
        let reply = Reply::new(self.ids.next_id(), parent_id, bucket_of(t), text);
        let mut next = self.comments.clone();
        next[idx].replies.push(reply.clone());
        self.save_comments(next)?;
        Ok(Some(reply))
    }

    pub fn delete_reply(&mut self, parent_id: &str, reply_id: &str) -> Result<bool> {
        let Some(idx) = self.comments.iter().position(|c| c.id == parent_id) else {
            return Ok(false);
        };
        if !self.comments[idx].replies.iter().any(|r| r.id == reply_id) {
            return Ok(false);
        }
        let mut next = self.comments.clone();
        next[idx].replies.retain(|r| r.id != reply_id);
        self.save_comments(next)?;
        Ok(true)
    }

    /// File `stroke` under the bucket for playback time `t` and return that
    /// bucket's key.
    pub fn add_stroke(&mut self, t: f64, stroke: Stroke) -> Result<String> {
        let key = bucket_key(t);
        self.file_stroke(&key, stroke)?;
        Ok(key)
    }

    /// Append `stroke` to the bucket `key`.
    pub fn file_stroke(&mut self, key: &str, stroke: Stroke) -> Result<()> {
        let mut next = self.strokes.clone();
        next.entry(key.to_string()).or_default().push(stroke);
        self.save_strokes(next)
    }

    /// Take one stroke back out of its bucket. Emptied buckets are dropped.
    /// Only undo takes strokes out one at a time.
    pub(crate) fn remove_stroke(&mut self, key: &str, stroke_id: &str) -> Result<bool> {
        let Some(bucket) = self.strokes.get(key) else {
            return Ok(false);
        };
        if !bucket.iter().any(|s| s.id == stroke_id) {
            return Ok(false);
        }
        let mut next = self.strokes.clone();
        if let Some(bucket) = next.get_mut(key) {
            bucket.retain(|s| s.id != stroke_id);
            if bucket.is_empty() {
                next.remove(key);
            }
        }
        self.save_strokes(next)?;
        Ok(true)
    }

    /// Drop every stroke in bucket `key`.
    pub fn clear_bucket(&mut self, key: &str) -> Result<bool> {
        if !self.strokes.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.strokes.clone();
        next.remove(key);
        self.save_strokes(next)?;
        Ok(true)
    }

    /// Delete whatever `id` addresses: `draw-<key>` clears that stroke
    /// bucket, anything else removes the comment with that exact id.
    /// Returns whether something was removed.
    pub fn delete_annotation(&mut self, id: &str) -> Result<bool> {
        if let Some(key) = id.strip_prefix(DRAWING_ID_PREFIX) {
            return self.clear_bucket(key);
        }
        if !self.comments.iter().any(|c| c.id == id) {
            return Ok(false);
        }
        let next = self.comments.iter().filter(|c| c.id != id).cloned().collect();
        self.save_comments(next)?;
        Ok(true)
    }

    pub fn into_inner(self) -> S {
        self.kv
    }
}
