use crate::anchor::pin_visible_at;
use crate::comment::Comment;
use crate::draw::model::Stroke;
use crate::store::BucketMap;
use crate::time::{bucket_key, parse_bucket_key};
use std::collections::HashSet;

/// Merge comments and stroke buckets into one feed ordered by second.
///
/// Every non-empty bucket with no comment at the same second gets a
/// `draw-<key>` placeholder. Buckets whose key is not a whole second are
/// skipped. Ties keep their input order.
pub fn aggregate(comments: &[Comment], buckets: &BucketMap) -> Vec<Comment> {
    let mut covered: HashSet<u32> = comments.iter().map(|c| c.timestamp).collect();
    let mut feed = comments.to_vec();

    for (key, strokes) in buckets {
        if strokes.is_empty() {
            continue;
        }
        let Some(second) = parse_bucket_key(key) else {
            tracing::warn!("skipping stroke bucket with malformed key {key:?}");
            continue;
        };
        if covered.insert(second) {
            feed.push(Comment::drawing_placeholder(key, second));
        }
    }

    feed.sort_by_key(|c| c.timestamp);
    feed
}

/// Strokes shown while playback sits at `t`: the whole bucket for its second.
pub fn visible_strokes(buckets: &BucketMap, t: f64) -> &[Stroke] {
    buckets
        .get(&bucket_key(t))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Pin comments shown while playback sits at `t`.
pub fn visible_pins(comments: &[Comment], t: f64) -> Vec<&Comment> {
    comments
        .iter()
        .filter(|c| c.anchor().is_some() && pin_visible_at(c.timestamp, t))
        .collect()
}
