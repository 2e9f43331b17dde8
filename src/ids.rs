/// Hands out annotation ids as millisecond timestamps.
///
/// Ids are strictly increasing within one source, so two annotations created
/// in the same millisecond still get distinct ids.
#[derive(Debug, Clone, Default)]
pub struct IdSource {
    last: i64,
}

/// Stored ids this close to `i64::MAX` leave no room to count past them.
const ID_HEADROOM: i64 = 1 << 32;

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id` when it is numeric. Non-numeric
    /// ids are ignored, as are ids too large to count past.
    pub fn observe(&mut self, id: &str) {
        let Ok(value) = id.parse::<i64>() else {
            return;
        };
        if value > i64::MAX - ID_HEADROOM {
            tracing::warn!("id {id} is too large to order new ids after; ignoring it");
            return;
        }
        self.last = self.last.max(value);
    }

    pub fn next_id(&mut self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = match self.last.checked_add(1) {
            Some(after) => now.max(after),
            None => now,
        };
        self.last.to_string()
    }
}
