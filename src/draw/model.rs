use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DrawColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl DrawColor {
    pub const RED: DrawColor = DrawColor::rgba(0xEF, 0x44, 0x44, 0xFF);
    pub const GREEN: DrawColor = DrawColor::rgba(0x22, 0xC5, 0x5E, 0xFF);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for DrawColor {
    fn default() -> Self {
        Self::RED
    }
}

impl FromStr for DrawColor {
    type Err = anyhow::Error;

    /// Accepts `#RRGGBB` and `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("colour {s:?} is missing the leading '#'"))?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            bail!("colour {s:?} must have 6 or 8 hex digits");
        }
        let channel = |idx: usize| {
            u8::from_str_radix(&hex[idx..idx + 2], 16)
                .with_context(|| format!("parse colour channel in {s:?}"))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 0xFF };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for DrawColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DrawColor> for String {
    fn from(color: DrawColor) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for DrawColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Position in the drawing overlay's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// A freehand path: one move-to point followed by line-to points.
///
/// Persisted as an SVG path string (`"M10,20 L12,24"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathData {
    start: Point,
    segments: Vec<Point>,
}

impl PathData {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn line_to(&mut self, point: Point) {
        self.segments.push(point);
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn segments(&self) -> &[Point] {
        &self.segments
    }

    /// All points of the path in drawing order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.start).chain(self.segments.iter().copied())
    }

    pub fn point_count(&self) -> usize {
        self.segments.len() + 1
    }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{},{}", self.start.x, self.start.y)?;
        for p in &self.segments {
            write!(f, " L{},{}", p.x, p.y)?;
        }
        Ok(())
    }
}

fn parse_point(token: &str) -> Result<Point> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| anyhow!("path point {token:?} is not `x,y`"))?;
    let x: f32 = x.trim().parse().with_context(|| format!("parse x in {token:?}"))?;
    let y: f32 = y.trim().parse().with_context(|| format!("parse y in {token:?}"))?;
    Ok(Point::new(x, y))
}

impl FromStr for PathData {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s.split_whitespace();
        let first = tokens.next().ok_or_else(|| anyhow!("empty path data"))?;
        let start = first
            .strip_prefix('M')
            .ok_or_else(|| anyhow!("path data must begin with a move-to, got {first:?}"))?;
        let mut path = PathData::new(parse_point(start)?);
        for token in tokens {
            let point = token
                .strip_prefix('L')
                .ok_or_else(|| anyhow!("unsupported path command {token:?}"))?;
            path.line_to(parse_point(point)?);
        }
        Ok(path)
    }
}

impl TryFrom<String> for PathData {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PathData> for String {
    fn from(path: PathData) -> Self {
        path.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: DrawColor,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            color: DrawColor::default(),
        }
    }
}

/// One completed freehand gesture. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: String,
    pub data: PathData,
    pub color: DrawColor,
    pub stroke_width: f32,
}

impl Stroke {
    pub fn new(id: impl Into<String>, data: PathData, style: StrokeStyle) -> Self {
        Self {
            id: id.into(),
            data,
            color: style.color,
            stroke_width: style.width,
        }
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.stroke_width,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_hex_forms() {
        assert_eq!("#EF4444".parse::<DrawColor>().unwrap(), DrawColor::RED);
        assert_eq!(
            "#22c55e80".parse::<DrawColor>().unwrap(),
            DrawColor::rgba(0x22, 0xC5, 0x5E, 0x80)
        );
        assert_eq!(DrawColor::GREEN.to_hex(), "#22C55E");
        assert_eq!(DrawColor::rgba(1, 2, 3, 4).to_hex(), "#01020304");
        assert!("red".parse::<DrawColor>().is_err());
        assert!("#12345".parse::<DrawColor>().is_err());
        assert!("#GG0000".parse::<DrawColor>().is_err());
    }

    #[test]
    fn path_string_matches_svg_layout() {
        let mut path = PathData::new(Point::new(10.0, 20.5));
        path.line_to(Point::new(11.0, 22.0));
        path.line_to(Point::new(15.25, 30.0));
        assert_eq!(path.to_string(), "M10,20.5 L11,22 L15.25,30");

        let parsed: PathData = "M10,20.5 L11,22 L15.25,30".parse().unwrap();
        assert_eq!(parsed, path);
        assert_eq!(parsed.point_count(), 3);
    }

    #[test]
    fn path_rejects_missing_move_to() {
        assert!("L1,2".parse::<PathData>().is_err());
        assert!("".parse::<PathData>().is_err());
        assert!("M1;2".parse::<PathData>().is_err());
        assert!("M1,2 C3,4".parse::<PathData>().is_err());
    }

    #[test]
    fn stroke_serializes_with_flat_string_fields() {
        let stroke = Stroke::new(
            "1700000000000",
            "M1,2 L3,4".parse().unwrap(),
            StrokeStyle {
                width: 4.0,
                color: DrawColor::GREEN,
            },
        );
        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1700000000000",
                "data": "M1,2 L3,4",
                "color": "#22C55E",
                "strokeWidth": 4.0
            })
        );
        let back: Stroke = serde_json::from_value(json).unwrap();
        assert_eq!(back, stroke);
    }
}
