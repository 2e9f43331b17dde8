use crate::time::bucket_of;

/// A point on the video frame in normalised coordinates, `0.0..=1.0` on
/// each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    x: f64,
    y: f64,
}

impl Anchor {
    /// Build an anchor from already normalised coordinates, clamping into
    /// the frame. Non-finite input yields `None`.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        })
    }

    /// Normalise a tap in pixels against the rendered frame size.
    ///
    /// Taps outside the frame are clamped onto its edge. A frame with no
    /// usable size cannot address anything and yields `None`.
    pub fn from_tap(x: f64, y: f64, frame_width: f64, frame_height: f64) -> Option<Self> {
        let usable = |d: f64| d.is_finite() && d > 0.0;
        if !usable(frame_width) || !usable(frame_height) {
            tracing::debug!(frame_width, frame_height, "ignoring tap on degenerate frame");
            return None;
        }
        Self::new(x / frame_width, y / frame_height)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Pixel position of the anchor inside a frame of the given size.
    pub fn to_frame(&self, frame_width: f64, frame_height: f64) -> (f64, f64) {
        (self.x * frame_width, self.y * frame_height)
    }
}

/// Pins show only during their exact second, unlike strokes.
pub fn pin_visible_at(pin_timestamp: u32, current_time: f64) -> bool {
    bucket_of(current_time) == pin_timestamp
}
