/// Pixels of horizontal drag that make up one sensitivity unit.
const DRAG_SPAN_PX: f64 = 300.0;
const VELOCITY_SCALE: f64 = 1000.0;
const MAX_VELOCITY_BOOST: f64 = 2.0;

/// Clamp a target position into `[0, duration]`.
pub fn clamp_time(t: f64, duration: f64) -> f64 {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    if !t.is_finite() {
        return 0.0;
    }
    t.clamp(0.0, duration)
}

/// Target of a relative skip such as the ±10 s buttons.
pub fn skip(current: f64, offset: f64, duration: f64) -> f64 {
    clamp_time(current + offset, duration)
}

/// Fraction of the video one drag span covers; longer videos seek coarser.
pub fn sensitivity(duration: f64) -> f64 {
    if duration < 600.0 {
        0.05
    } else if duration < 3600.0 {
        0.10
    } else {
        0.15
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekPreview {
    /// Position the gesture would land on.
    pub time: f64,
    /// Signed offset from where the gesture started.
    pub delta: f64,
}

/// Horizontal drag-to-seek over the video.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekGesture {
    origin: f64,
    duration: f64,
    preview: Option<SeekPreview>,
}

impl SeekGesture {
    pub fn begin(origin: f64, duration: f64) -> Self {
        Self {
            origin,
            duration,
            preview: None,
        }
    }

    /// Recompute the target from the total drag distance and current
    /// horizontal velocity. Fast flicks seek up to three times further.
    pub fn update(&mut self, translation_x: f64, velocity_x: f64) -> SeekPreview {
        let distance = (translation_x / DRAG_SPAN_PX) * (self.duration * sensitivity(self.duration));
        let boost = (velocity_x.abs() / VELOCITY_SCALE).min(MAX_VELOCITY_BOOST);
        let delta = distance * (1.0 + boost);
        let preview = SeekPreview {
            time: clamp_time(self.origin + delta, self.duration),
            delta,
        };
        self.preview = Some(preview);
        preview
    }

    pub fn preview(&self) -> Option<SeekPreview> {
        self.preview
    }

    /// Position to seek to once the finger lifts. A drag that never moved
    /// stays where it started.
    pub fn finish(self) -> f64 {
        self.preview
            .map(|p| p.time)
            .unwrap_or_else(|| clamp_time(self.origin, self.duration))
    }
}
