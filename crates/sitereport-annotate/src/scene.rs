//! Scene objects and their portable snapshot encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Default geometry for objects placed with a single pointer tap.
pub const RECT_WIDTH: f64 = 100.0;
pub const RECT_HEIGHT: f64 = 60.0;
pub const CIRCLE_RADIUS: f64 = 30.0;
pub const LABEL_FONT_SIZE: f64 = 16.0;

/// Segments of the fixed arrow chevron, as (x1, y1, x2, y2) relative to
/// the anchor point.
pub const ARROW_SEGMENTS: [[f64; 4]; 3] = [
    [0.0, 0.0, 50.0, 0.0],
    [40.0, -10.0, 50.0, 0.0],
    [50.0, 0.0, 40.0, 10.0],
];

/// Padding applied around an object's bounding box when hit-testing.
const HIT_PADDING: f64 = 4.0;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One vector object drawn over the photo. The photo layer itself is not
/// a scene object: it is implicit, locked and always bottom-most.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SceneObject {
    Rect {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        stroke: String,
        stroke_width: f64,
    },
    Circle {
        left: f64,
        top: f64,
        radius: f64,
        stroke: String,
        stroke_width: f64,
    },
    Arrow {
        left: f64,
        top: f64,
        stroke: String,
        stroke_width: f64,
    },
    Path {
        points: Vec<[f64; 2]>,
        stroke: String,
        stroke_width: f64,
    },
    Label {
        left: f64,
        top: f64,
        text: String,
        font_size: f64,
        stroke: String,
        fill: String,
    },
}

impl SceneObject {
    /// Apply a new color: stroke for every kind, and additionally fill
    /// for labels.
    pub fn set_color(&mut self, color: &str) {
        match self {
            SceneObject::Rect { stroke, .. }
            | SceneObject::Circle { stroke, .. }
            | SceneObject::Arrow { stroke, .. }
            | SceneObject::Path { stroke, .. } => *stroke = color.to_string(),
            SceneObject::Label { stroke, fill, .. } => {
                *stroke = color.to_string();
                *fill = color.to_string();
            }
        }
    }

    /// Apply a new stroke width. Labels keep their width untouched.
    pub fn set_stroke_width(&mut self, width: f64) {
        match self {
            SceneObject::Rect { stroke_width, .. }
            | SceneObject::Circle { stroke_width, .. }
            | SceneObject::Arrow { stroke_width, .. }
            | SceneObject::Path { stroke_width, .. } => *stroke_width = width,
            SceneObject::Label { .. } => {}
        }
    }

    /// Move the object by a display-space delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            SceneObject::Rect { left, top, .. }
            | SceneObject::Circle { left, top, .. }
            | SceneObject::Arrow { left, top, .. }
            | SceneObject::Label { left, top, .. } => {
                *left += dx;
                *top += dy;
            }
            SceneObject::Path { points, .. } => {
                for p in points {
                    p[0] += dx;
                    p[1] += dy;
                }
            }
        }
    }

    /// Scale every coordinate (and stroke width) by a uniform factor.
    pub fn rescale(&mut self, factor: f64) {
        match self {
            SceneObject::Rect {
                left,
                top,
                width,
                height,
                stroke_width,
                ..
            } => {
                *left *= factor;
                *top *= factor;
                *width *= factor;
                *height *= factor;
                *stroke_width *= factor;
            }
            SceneObject::Circle {
                left,
                top,
                radius,
                stroke_width,
                ..
            } => {
                *left *= factor;
                *top *= factor;
                *radius *= factor;
                *stroke_width *= factor;
            }
            SceneObject::Arrow {
                left,
                top,
                stroke_width,
                ..
            } => {
                *left *= factor;
                *top *= factor;
                *stroke_width *= factor;
            }
            SceneObject::Path {
                points,
                stroke_width,
                ..
            } => {
                for p in points.iter_mut() {
                    p[0] *= factor;
                    p[1] *= factor;
                }
                *stroke_width *= factor;
            }
            SceneObject::Label {
                left,
                top,
                font_size,
                ..
            } => {
                *left *= factor;
                *top *= factor;
                *font_size *= factor;
            }
        }
    }

    /// Axis-aligned bounding box as (left, top, width, height).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            SceneObject::Rect {
                left,
                top,
                width,
                height,
                ..
            } => (*left, *top, *width, *height),
            SceneObject::Circle {
                left, top, radius, ..
            } => (*left, *top, radius * 2.0, radius * 2.0),
            SceneObject::Arrow { left, top, .. } => (*left, top - 10.0, 50.0, 20.0),
            SceneObject::Path { points, .. } => {
                let mut min = [f64::INFINITY, f64::INFINITY];
                let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
                for p in points {
                    min[0] = min[0].min(p[0]);
                    min[1] = min[1].min(p[1]);
                    max[0] = max[0].max(p[0]);
                    max[1] = max[1].max(p[1]);
                }
                if points.is_empty() {
                    (0.0, 0.0, 0.0, 0.0)
                } else {
                    (min[0], min[1], max[0] - min[0], max[1] - min[1])
                }
            }
            SceneObject::Label {
                left,
                top,
                text,
                font_size,
                ..
            } => {
                // Rough glyph metrics; good enough for tap targets.
                let width = text.chars().count() as f64 * font_size * 0.6;
                (*left, *top, width, font_size * 1.2)
            }
        }
    }

    /// Whether a display-space point falls on the object's padded
    /// bounding box.
    pub fn hit_test(&self, x: f64, y: f64) -> bool {
        let (left, top, width, height) = self.bounds();
        x >= left - HIT_PADDING
            && x <= left + width + HIT_PADDING
            && y >= top - HIT_PADDING
            && y <= top + height + HIT_PADDING
    }
}

/// Portable scene encoding: the object set plus the photo layer's
/// transform, enough to rebuild the surface from scratch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub version: u32,
    /// Display size of the surface the snapshot was taken from.
    pub width: f64,
    pub height: f64,
    /// Display scale of the locked photo layer.
    pub photo_scale: f64,
    pub objects: Vec<SceneObject>,
}

/// Envelope used for tolerant decoding: objects stay raw JSON so one
/// malformed entry cannot fail the whole load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default = "default_version")]
    version: u32,
    width: f64,
    height: f64,
    #[serde(default = "default_scale")]
    photo_scale: f64,
    #[serde(default)]
    objects: Vec<Value>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

fn default_scale() -> f64 {
    1.0
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> Result<Value, SceneError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a snapshot, skipping objects that fail to parse instead of
    /// failing the whole load.
    pub fn from_value(value: Value) -> Result<Self, SceneError> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        let total = raw.objects.len();
        let mut objects = Vec::with_capacity(total);
        for entry in raw.objects {
            match serde_json::from_value::<SceneObject>(entry) {
                Ok(object) => objects.push(object),
                Err(e) => warn!(error = %e, "skipping unrecognized scene object"),
            }
        }
        if objects.len() < total {
            warn!(
                kept = objects.len(),
                total, "scene snapshot loaded with losses"
            );
        }
        Ok(Self {
            version: raw.version,
            width: raw.width,
            height: raw.height,
            photo_scale: raw.photo_scale,
            objects,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, SceneError> {
        Self::from_value(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_objects() -> Vec<SceneObject> {
        vec![
            SceneObject::Rect {
                left: 10.0,
                top: 20.0,
                width: RECT_WIDTH,
                height: RECT_HEIGHT,
                stroke: "#e0222a".to_string(),
                stroke_width: 3.0,
            },
            SceneObject::Circle {
                left: 50.0,
                top: 60.0,
                radius: CIRCLE_RADIUS,
                stroke: "#0000ff".to_string(),
                stroke_width: 2.0,
            },
            SceneObject::Arrow {
                left: 5.0,
                top: 90.0,
                stroke: "#e0222a".to_string(),
                stroke_width: 3.0,
            },
            SceneObject::Path {
                points: vec![[0.0, 0.0], [3.0, 4.0], [3.0, 4.0], [10.0, 2.0]],
                stroke: "#00ff00".to_string(),
                stroke_width: 5.0,
            },
            SceneObject::Label {
                left: 70.0,
                top: 15.0,
                text: "Crack".to_string(),
                font_size: LABEL_FONT_SIZE,
                stroke: "#e0222a".to_string(),
                fill: "#e0222a".to_string(),
            },
        ]
    }

    #[test]
    fn test_snapshot_round_trips_losslessly() {
        let snapshot = SceneSnapshot {
            version: SNAPSHOT_VERSION,
            width: 640.0,
            height: 480.0,
            photo_scale: 0.32,
            objects: sample_objects(),
        };
        let json = snapshot.to_json().unwrap();
        let restored = SceneSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_tagged_encoding_is_stable() {
        let object = SceneObject::Rect {
            left: 1.0,
            top: 2.0,
            width: 3.0,
            height: 4.0,
            stroke: "#112233".to_string(),
            stroke_width: 1.5,
        };
        let value = serde_json::to_value(&object).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["strokeWidth"], 1.5);
    }

    #[test]
    fn test_malformed_object_is_skipped_not_fatal() {
        let raw = serde_json::json!({
            "version": 1,
            "width": 100.0,
            "height": 80.0,
            "photoScale": 0.5,
            "objects": [
                {"type": "rect", "left": 1.0, "top": 2.0, "width": 3.0,
                 "height": 4.0, "stroke": "#000000", "strokeWidth": 1.0},
                {"type": "hologram", "wat": true},
                {"type": "circle"},
                {"type": "label", "left": 5.0, "top": 6.0, "text": "ok",
                 "fontSize": 16.0, "stroke": "#000000", "fill": "#000000"}
            ]
        });
        let snapshot = SceneSnapshot::from_value(raw).unwrap();
        assert_eq!(snapshot.objects.len(), 2);
        assert!(matches!(snapshot.objects[0], SceneObject::Rect { .. }));
        assert!(matches!(snapshot.objects[1], SceneObject::Label { .. }));
    }

    #[test]
    fn test_missing_scale_defaults_to_identity() {
        let raw = serde_json::json!({"width": 10.0, "height": 10.0});
        let snapshot = SceneSnapshot::from_value(raw).unwrap();
        assert_eq!(snapshot.photo_scale, 1.0);
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.objects.is_empty());
    }

    #[test]
    fn test_set_color_updates_label_fill_too() {
        let mut label = SceneObject::Label {
            left: 0.0,
            top: 0.0,
            text: "x".to_string(),
            font_size: LABEL_FONT_SIZE,
            stroke: "#000000".to_string(),
            fill: "#000000".to_string(),
        };
        label.set_color("#ff0000");
        let SceneObject::Label { stroke, fill, .. } = &label else {
            unreachable!()
        };
        assert_eq!(stroke, "#ff0000");
        assert_eq!(fill, "#ff0000");
    }

    #[test]
    fn test_set_stroke_width_never_touches_labels() {
        let mut label = SceneObject::Label {
            left: 0.0,
            top: 0.0,
            text: "x".to_string(),
            font_size: LABEL_FONT_SIZE,
            stroke: "#000000".to_string(),
            fill: "#000000".to_string(),
        };
        let before = label.clone();
        label.set_stroke_width(9.0);
        assert_eq!(label, before);
    }

    #[test]
    fn test_translate_moves_every_path_point() {
        let mut path = SceneObject::Path {
            points: vec![[0.0, 0.0], [5.0, 5.0]],
            stroke: "#000000".to_string(),
            stroke_width: 1.0,
        };
        path.translate(2.0, -1.0);
        let SceneObject::Path { points, .. } = &path else {
            unreachable!()
        };
        assert_eq!(points, &vec![[2.0, -1.0], [7.0, 4.0]]);
    }

    #[test]
    fn test_hit_test_uses_padded_bounds() {
        let rect = SceneObject::Rect {
            left: 10.0,
            top: 10.0,
            width: 20.0,
            height: 10.0,
            stroke: "#000000".to_string(),
            stroke_width: 1.0,
        };
        assert!(rect.hit_test(10.0, 10.0));
        assert!(rect.hit_test(32.0, 22.0)); // inside the padding
        assert!(!rect.hit_test(40.0, 40.0));
    }

    #[test]
    fn test_empty_path_has_degenerate_bounds() {
        let path = SceneObject::Path {
            points: vec![],
            stroke: "#000000".to_string(),
            stroke_width: 1.0,
        };
        assert_eq!(path.bounds(), (0.0, 0.0, 0.0, 0.0));
    }

    proptest::proptest! {
        /// Serialize, deserialize, serialize again: identity on the
        /// object set.
        #[test]
        fn prop_round_trip_law(
            left in -500.0f64..500.0,
            top in -500.0f64..500.0,
            width in 1.0f64..400.0,
            radius in 1.0f64..200.0,
            stroke_width in 0.5f64..20.0,
        ) {
            let snapshot = SceneSnapshot {
                version: SNAPSHOT_VERSION,
                width: 800.0,
                height: 500.0,
                photo_scale: 0.5,
                objects: vec![
                    SceneObject::Rect {
                        left, top, width, height: width / 2.0,
                        stroke: "#aabbcc".to_string(), stroke_width,
                    },
                    SceneObject::Circle {
                        left, top, radius,
                        stroke: "#aabbcc".to_string(), stroke_width,
                    },
                ],
            };
            let restored = SceneSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
            proptest::prop_assert_eq!(restored, snapshot);
        }
    }
}
