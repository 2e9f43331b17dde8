use crate::draw::model::{DrawColor, PathData, Point, Stroke, StrokeStyle};
use crate::ids::IdSource;

/// Accumulates one pointer gesture into a path.
///
/// The first sample becomes the move-to point and every later sample a
/// line-to. Only one gesture is tracked at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeRecorder {
    active: Option<PathData>,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a gesture. An abandoned preview from an earlier gesture that
    /// never ended is replaced.
    pub fn start(&mut self, point: Point) {
        if self.active.is_some() {
            tracing::debug!("pointer start while a gesture was active; dropping old preview");
        }
        self.active = Some(PathData::new(point));
    }

    /// Extend the active gesture. Samples outside a gesture are ignored.
    pub fn move_to(&mut self, point: Point) {
        if let Some(path) = self.active.as_mut() {
            path.line_to(point);
        }
    }

    /// Finish the gesture and hand back its path, resetting the recorder.
    /// Returns `None` when no gesture was started.
    pub fn end(&mut self) -> Option<PathData> {
        self.active.take()
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Transient path of the gesture in progress, for rendering.
    pub fn preview(&self) -> Option<&PathData> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// Recorder plus the currently selected pen.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInputState {
    style: StrokeStyle,
    recorder: StrokeRecorder,
}

impl DrawInputState {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            style,
            recorder: StrokeRecorder::new(),
        }
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn set_color(&mut self, color: DrawColor) {
        self.style.color = color;
    }

    pub fn set_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.style.width = width;
        }
    }

    pub fn handle_down(&mut self, point: Point) {
        self.recorder.start(point);
    }

    pub fn handle_move(&mut self, point: Point) {
        self.recorder.move_to(point);
    }

    /// Turn the finished gesture into a stroke with the pen selected at
    /// release time.
    pub fn handle_up(&mut self, ids: &mut IdSource) -> Option<Stroke> {
        let data = self.recorder.end()?;
        Some(Stroke::new(ids.next_id(), data, self.style))
    }

    pub fn cancel(&mut self) {
        self.recorder.cancel();
    }

    pub fn preview(&self) -> Option<&PathData> {
        self.recorder.preview()
    }
}

impl Default for DrawInputState {
    fn default() -> Self {
        Self::new(StrokeStyle::default())
    }
}
