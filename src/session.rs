//! Review screen state and the commands the UI host sends into it.
//!
//! All view state lives in [`ReviewSession`]; the host forwards user input
//! and renders from the accessors. Commands that persist return the store's
//! error so the host can retry or warn.

use crate::anchor::Anchor;
use crate::comment::{Comment, Reply, DRAWING_ID_PREFIX};
use crate::draw::history::{DrawHistory, StrokeCommit};
use crate::draw::input::DrawInputState;
use crate::draw::model::{DrawColor, PathData, Point, Stroke};
use crate::feed;
use crate::overlay::AutoHideTimer;
use crate::playback::PlaybackSource;
use crate::seek::{self, SeekGesture, SeekPreview};
use crate::settings::ReviewSettings;
use crate::store::{AnnotationStore, KvStore};
use crate::time::{bucket_key, format_time};
use anyhow::Result;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Taps and drags control playback.
    #[default]
    Watch,
    /// Drags record strokes.
    Draw,
    /// Taps place a pin.
    Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    Comment(Comment),
    Reply(Reply),
}

pub struct ReviewSession<S: KvStore, P: PlaybackSource> {
    store: AnnotationStore<S>,
    player: P,
    settings: ReviewSettings,
    input: DrawInputState,
    history: DrawHistory,
    /// Finished strokes whose write failed, oldest first.
    unsaved_strokes: Vec<StrokeCommit>,
    overlay: AutoHideTimer,
    seek_drag: Option<SeekGesture>,
    mode: InputMode,
    current_time: f64,
    reply_to: Option<String>,
    pending_anchor: Option<Anchor>,
}

impl<S: KvStore, P: PlaybackSource> ReviewSession<S, P> {
    pub fn new(store: AnnotationStore<S>, player: P, settings: ReviewSettings) -> Self {
        let current_time = player.current_time();
        Self {
            input: DrawInputState::new(settings.stroke_style()),
            overlay: AutoHideTimer::new(settings.overlay_delay()),
            store,
            player,
            settings,
            history: DrawHistory::default(),
            unsaved_strokes: Vec::new(),
            seek_drag: None,
            mode: InputMode::Watch,
            current_time,
            reply_to: None,
            pending_anchor: None,
        }
    }

    /// Load annotations from `kv` using the configured schema version.
    pub fn open(kv: S, player: P, settings: ReviewSettings) -> Self {
        let store = AnnotationStore::open(kv, settings.schema_version);
        Self::new(store, player, settings)
    }

    pub fn store(&self) -> &AnnotationStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore<S> {
        &mut self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    // ---------------------------------------------------------------------
    // Playback
    // ---------------------------------------------------------------------

    /// Re-read the play position; the host calls this every
    /// `poll_interval_ms`.
    pub fn poll(&mut self) -> f64 {
        self.current_time = self.player.current_time();
        self.current_time
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn current_bucket(&self) -> String {
        bucket_key(self.current_time)
    }

    pub fn current_display_time(&self) -> String {
        format_time(self.current_time)
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn toggle_play(&mut self) {
        if self.player.is_playing() {
            self.player.pause();
        } else {
            self.player.play();
        }
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.player.is_muted();
        self.player.set_muted(!muted);
    }

    fn seek_to(&mut self, t: f64) {
        let target = seek::clamp_time(t, self.player.duration());
        self.player.seek(target);
        self.current_time = target;
    }

    /// Move by `offset` seconds from the player's live position, staying
    /// inside the video.
    pub fn skip(&mut self, offset: f64) {
        let from = self.player.current_time();
        self.seek_to(seek::skip(from, offset, self.player.duration()));
    }

    pub fn skip_forward(&mut self) {
        self.skip(self.settings.skip_seconds);
    }

    pub fn skip_back(&mut self) {
        self.skip(-self.settings.skip_seconds);
    }

    /// Seek to the second a feed entry is attached to.
    pub fn jump_to(&mut self, timestamp: u32) {
        self.seek_to(f64::from(timestamp));
    }

    /// Start a drag-to-seek. Unavailable while drawing.
    pub fn begin_seek_drag(&mut self) -> bool {
        if self.mode == InputMode::Draw {
            return false;
        }
        self.seek_drag = Some(SeekGesture::begin(self.current_time, self.player.duration()));
        true
    }

    pub fn update_seek_drag(&mut self, translation_x: f64, velocity_x: f64) -> Option<SeekPreview> {
        self.seek_drag
            .as_mut()
            .map(|drag| drag.update(translation_x, velocity_x))
    }

    /// Finish the drag and seek to its target.
    pub fn end_seek_drag(&mut self) -> Option<f64> {
        let target = self.seek_drag.take()?.finish();
        self.seek_to(target);
        Some(self.current_time)
    }

    // ---------------------------------------------------------------------
    // Modes
    // ---------------------------------------------------------------------

    fn enter_mode(&mut self, mode: InputMode) {
        if self.mode == mode {
            return;
        }
        if self.mode == InputMode::Draw {
            self.input.cancel();
        }
        if self.mode == InputMode::Anchor {
            self.pending_anchor = None;
        }
        self.seek_drag = None;
        self.mode = mode;
        match mode {
            InputMode::Watch => self.player.play(),
            InputMode::Draw | InputMode::Anchor => self.player.pause(),
        }
        tracing::debug!(?mode, "input mode changed");
    }

    /// Drawing pauses playback; leaving it resumes.
    pub fn toggle_draw_mode(&mut self) {
        let next = if self.mode == InputMode::Draw {
            InputMode::Watch
        } else {
            InputMode::Draw
        };
        self.enter_mode(next);
    }

    /// Pin placement pauses playback; leaving it resumes.
    pub fn toggle_anchor_mode(&mut self) {
        let next = if self.mode == InputMode::Anchor {
            InputMode::Watch
        } else {
            InputMode::Anchor
        };
        self.enter_mode(next);
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    pub fn set_color(&mut self, color: DrawColor) {
        self.input.set_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.input.set_width(width);
    }

    pub fn selected_color(&self) -> DrawColor {
        self.input.style().color
    }

    pub fn pointer_down(&mut self, point: Point) {
        if self.mode == InputMode::Draw {
            self.input.handle_down(point);
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        if self.mode == InputMode::Draw {
            self.input.handle_move(point);
        }
    }

    /// Finish the gesture and file its stroke under the current second.
    ///
    /// When the write fails the stroke is kept in [`Self::unsaved_strokes`]
    /// until [`Self::retry_unsaved_strokes`] files it or the host discards it.
    pub fn pointer_up(&mut self) -> Result<Option<Stroke>> {
        if self.mode != InputMode::Draw {
            return Ok(None);
        }
        let Some(stroke) = self.input.handle_up(self.store.ids_mut()) else {
            return Ok(None);
        };
        let bucket = bucket_key(self.current_time);
        if let Err(err) = self.store.file_stroke(&bucket, stroke.clone()) {
            tracing::warn!(stroke = %stroke.id, %bucket, "stroke kept unsaved for retry");
            self.unsaved_strokes.push(StrokeCommit { bucket, stroke });
            return Err(err);
        }
        self.history.commit(bucket, stroke.clone());
        Ok(Some(stroke))
    }

    /// Strokes drawn but not yet persisted, with the second they belong to.
    pub fn unsaved_strokes(&self) -> &[StrokeCommit] {
        &self.unsaved_strokes
    }

    /// File unsaved strokes in drawing order. Stops at the first failure,
    /// leaving it and later strokes unsaved. Returns how many were filed.
    pub fn retry_unsaved_strokes(&mut self) -> Result<usize> {
        let mut filed = 0;
        while let Some(commit) = self.unsaved_strokes.first().cloned() {
            self.store.file_stroke(&commit.bucket, commit.stroke.clone())?;
            self.unsaved_strokes.remove(0);
            self.history.commit(commit.bucket, commit.stroke);
            filed += 1;
        }
        Ok(filed)
    }

    pub fn discard_unsaved_strokes(&mut self) -> Vec<StrokeCommit> {
        std::mem::take(&mut self.unsaved_strokes)
    }

    /// Path of the gesture in progress, if any.
    pub fn preview(&self) -> Option<&PathData> {
        self.input.preview()
    }

    /// Take back the most recent stroke of this session.
    pub fn undo_stroke(&mut self) -> Result<bool> {
        let Some(commit) = self.history.peek_undo().cloned() else {
            return Ok(false);
        };
        self.store.remove_stroke(&commit.bucket, &commit.stroke.id)?;
        let _ = self.history.undo();
        self.input.cancel();
        Ok(true)
    }

    pub fn redo_stroke(&mut self) -> Result<bool> {
        let Some(commit) = self.history.peek_redo().cloned() else {
            return Ok(false);
        };
        self.store.file_stroke(&commit.bucket, commit.stroke)?;
        let _ = self.history.redo();
        Ok(true)
    }

    /// Remove every stroke in the second playback is at.
    pub fn clear_current_bucket(&mut self) -> Result<bool> {
        let key = self.current_bucket();
        let cleared = self.store.clear_bucket(&key)?;
        self.history.forget_bucket(&key);
        self.unsaved_strokes.retain(|c| c.bucket != key);
        self.input.cancel();
        Ok(cleared)
    }

    pub fn visible_strokes(&self) -> &[Stroke] {
        feed::visible_strokes(self.store.strokes(), self.current_time)
    }

    // ---------------------------------------------------------------------
    // Comments
    // ---------------------------------------------------------------------

    /// Direct the next submission at `comment_id` as a reply. Only stored
    /// comments can be replied to.
    pub fn set_reply_target(&mut self, comment_id: &str) -> bool {
        if self.store.comment(comment_id).is_none() {
            return false;
        }
        self.reply_to = Some(comment_id.to_string());
        true
    }

    pub fn clear_reply_target(&mut self) {
        self.reply_to = None;
    }

    pub fn reply_target(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    /// Store `text` as a reply when a target is set, otherwise as a comment
    /// at the current second. Blank input does nothing. Playback pauses
    /// after a successful submission.
    pub fn submit_text(&mut self, text: &str) -> Result<Option<Submitted>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let submitted = match self.reply_to.clone() {
            Some(parent) => {
                let reply = self.store.add_reply(&parent, text, self.current_time)?;
                self.reply_to = None;
                reply.map(Submitted::Reply)
            }
            None => self
                .store
                .add_comment(text, self.current_time)?
                .map(Submitted::Comment),
        };
        if submitted.is_some() {
            self.player.pause();
        }
        Ok(submitted)
    }

    /// Record where a pin should go. Only active in anchor mode.
    pub fn tap_anchor(
        &mut self,
        x: f64,
        y: f64,
        frame_width: f64,
        frame_height: f64,
        now: Instant,
    ) -> Option<Anchor> {
        if self.mode != InputMode::Anchor {
            return None;
        }
        let anchor = Anchor::from_tap(x, y, frame_width, frame_height)?;
        self.pending_anchor = Some(anchor);
        self.overlay.trigger(now);
        Some(anchor)
    }

    pub fn pending_anchor(&self) -> Option<Anchor> {
        self.pending_anchor
    }

    pub fn cancel_anchor(&mut self) {
        self.pending_anchor = None;
    }

    /// Store the pending pin with `text`. Blank text keeps the pin pending.
    pub fn submit_anchor(&mut self, text: &str) -> Result<Option<Comment>> {
        let Some(anchor) = self.pending_anchor else {
            return Ok(None);
        };
        let comment = self
            .store
            .add_anchor_comment(text, self.current_time, anchor)?;
        if comment.is_some() {
            self.pending_anchor = None;
            self.player.pause();
        }
        Ok(comment)
    }

    /// Delete a feed entry by id. Placeholder ids clear their stroke bucket.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let removed = self.store.delete_annotation(id)?;
        if let Some(key) = id.strip_prefix(DRAWING_ID_PREFIX) {
            self.history.forget_bucket(key);
            self.unsaved_strokes.retain(|c| c.bucket != key);
        }
        if self.reply_to.as_deref() == Some(id) {
            self.reply_to = None;
        }
        Ok(removed)
    }

    pub fn delete_reply(&mut self, parent_id: &str, reply_id: &str) -> Result<bool> {
        self.store.delete_reply(parent_id, reply_id)
    }

    /// Comments, pins and drawing placeholders in time order.
    pub fn feed(&self) -> Vec<Comment> {
        feed::aggregate(self.store.comments(), self.store.strokes())
    }

    pub fn visible_pins(&self) -> Vec<&Comment> {
        feed::visible_pins(self.store.comments(), self.current_time)
    }

    // ---------------------------------------------------------------------
    // Chrome
    // ---------------------------------------------------------------------

    pub fn touch_overlay(&mut self, now: Instant) {
        self.overlay.trigger(now);
    }

    pub fn overlay_visible(&self, now: Instant) -> bool {
        self.overlay.is_visible(now)
    }

    pub fn tick_overlay(&mut self, now: Instant) -> bool {
        self.overlay.tick(now)
    }
}
