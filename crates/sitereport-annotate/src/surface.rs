//! The stateful editing surface.
//!
//! A surface is bound to exactly one photo at a time; binding a new photo
//! means dropping the old surface, discarding whatever was not committed.
//! All coordinates are display-space pixels: the photo is shown scaled to
//! fit the viewport and objects live in that scaled space.

use tracing::debug;

use crate::scene::{
    SceneObject, SceneSnapshot, CIRCLE_RADIUS, LABEL_FONT_SIZE, RECT_HEIGHT, RECT_WIDTH,
    SNAPSHOT_VERSION,
};

pub const MAX_DISPLAY_WIDTH: f64 = 800.0;
pub const MAX_DISPLAY_HEIGHT: f64 = 500.0;
pub const VIEWPORT_GUTTER: f64 = 40.0;

const DEFAULT_COLOR: &str = "#e0222a";
const DEFAULT_STROKE_WIDTH: f64 = 3.0;

/// Display scale for a photo of the given pixel size in the given
/// viewport: fit within min(800, viewport - 40) by 500.
pub fn fit_scale(photo_width: u32, photo_height: u32, viewport_width: f64) -> f64 {
    let max_w = MAX_DISPLAY_WIDTH.min(viewport_width - VIEWPORT_GUTTER);
    let w = photo_width.max(1) as f64;
    let h = photo_height.max(1) as f64;
    (max_w / w).min(MAX_DISPLAY_HEIGHT / h)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Draw,
    Text,
    Rectangle,
    Circle,
    Arrow,
}

impl Tool {
    pub fn parse(name: &str) -> Option<Tool> {
        match name {
            "select" => Some(Tool::Select),
            "draw" => Some(Tool::Draw),
            "text" => Some(Tool::Text),
            "rectangle" => Some(Tool::Rectangle),
            "circle" => Some(Tool::Circle),
            "arrow" => Some(Tool::Arrow),
            _ => None,
        }
    }
}

/// Synchronous text input supplied by the hosting UI (a browser prompt,
/// a test stub).
pub trait TextPrompt {
    fn request_text(&mut self) -> Option<String>;
}

/// Editing session over one photo.
pub struct Surface {
    photo_width: u32,
    photo_height: u32,
    scale: f64,
    width: f64,
    height: f64,
    objects: Vec<SceneObject>,
    tool: Tool,
    color: String,
    stroke_width: f64,
    active: Option<usize>,
    drawing: Option<usize>,
    dragging: bool,
    last_pointer: Option<(f64, f64)>,
}

impl Surface {
    /// Bind a fresh surface to a photo, sizing the display to fit the
    /// viewport. The photo layer is locked: it is not a scene object and
    /// nothing here can select, move or restyle it.
    pub fn bind(photo_width: u32, photo_height: u32, viewport_width: f64) -> Self {
        let scale = fit_scale(photo_width, photo_height, viewport_width);
        let surface = Self {
            photo_width,
            photo_height,
            scale,
            width: photo_width.max(1) as f64 * scale,
            height: photo_height.max(1) as f64 * scale,
            objects: Vec::new(),
            tool: Tool::Select,
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            active: None,
            drawing: None,
            dragging: false,
            last_pointer: None,
        };
        debug!(
            photo_width,
            photo_height,
            scale = surface.scale,
            "surface bound"
        );
        surface
    }

    pub fn photo_width(&self) -> u32 {
        self.photo_width
    }

    pub fn photo_height(&self) -> u32 {
        self.photo_height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active.and_then(|i| self.objects.get(i))
    }

    /// Switch the active tool. Leaving Select discards the current
    /// selection; an in-progress freehand stroke is finalized as-is.
    pub fn select_tool(&mut self, tool: Tool) {
        if tool != Tool::Select {
            self.active = None;
        }
        self.drawing = None;
        self.dragging = false;
        self.last_pointer = None;
        self.tool = tool;
    }

    /// Set the style used for newly created objects. When the Select tool
    /// holds an active object the new color is applied to it immediately
    /// (stroke, plus fill for labels).
    pub fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
        if self.tool == Tool::Select {
            if let Some(object) = self.active.and_then(|i| self.objects.get_mut(i)) {
                object.set_color(color);
            }
        }
    }

    /// Set the stroke width for newly created objects; re-applied to the
    /// active object under Select, except labels which keep their width.
    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
        if self.tool == Tool::Select {
            if let Some(object) = self.active.and_then(|i| self.objects.get_mut(i)) {
                object.set_stroke_width(width);
            }
        }
    }

    /// Pointer pressed at display coordinates (x, y).
    ///
    /// Creates an object for the shape tools, starts a freehand stroke in
    /// Draw mode, asks `prompt` for text in Text mode, and hit-tests in
    /// Select mode.
    pub fn pointer_down(&mut self, x: f64, y: f64, prompt: &mut dyn TextPrompt) {
        match self.tool {
            Tool::Select => {
                match self.hit_test(x, y) {
                    Some(index) => {
                        self.active = Some(index);
                        self.dragging = true;
                        self.last_pointer = Some((x, y));
                    }
                    None => self.active = None,
                }
            }
            Tool::Draw => {
                self.objects.push(SceneObject::Path {
                    points: vec![[x, y]],
                    stroke: self.color.clone(),
                    stroke_width: self.stroke_width,
                });
                self.drawing = Some(self.objects.len() - 1);
            }
            Tool::Text => {
                let text = prompt.request_text().unwrap_or_default();
                if !text.is_empty() {
                    self.objects.push(SceneObject::Label {
                        left: x,
                        top: y,
                        text,
                        font_size: LABEL_FONT_SIZE,
                        stroke: self.color.clone(),
                        fill: self.color.clone(),
                    });
                }
            }
            Tool::Rectangle => self.objects.push(SceneObject::Rect {
                left: x,
                top: y,
                width: RECT_WIDTH,
                height: RECT_HEIGHT,
                stroke: self.color.clone(),
                stroke_width: self.stroke_width,
            }),
            Tool::Circle => self.objects.push(SceneObject::Circle {
                left: x,
                top: y,
                radius: CIRCLE_RADIUS,
                stroke: self.color.clone(),
                stroke_width: self.stroke_width,
            }),
            Tool::Arrow => self.objects.push(SceneObject::Arrow {
                left: x,
                top: y,
                stroke: self.color.clone(),
                stroke_width: self.stroke_width,
            }),
        }
    }

    /// Pointer moved while held: extends the current freehand stroke or
    /// drags the selected object. Zero-length segments are kept; they
    /// render as points and are harmless.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(index) = self.drawing {
            if let Some(SceneObject::Path { points, .. }) = self.objects.get_mut(index) {
                points.push([x, y]);
            }
            return;
        }
        if self.dragging && self.tool == Tool::Select {
            if let (Some((lx, ly)), Some(index)) = (self.last_pointer, self.active) {
                if let Some(object) = self.objects.get_mut(index) {
                    object.translate(x - lx, y - ly);
                }
                self.last_pointer = Some((x, y));
            }
        }
    }

    /// Pointer released: finalizes the stroke or drag in progress.
    pub fn pointer_up(&mut self) {
        self.drawing = None;
        self.dragging = false;
        self.last_pointer = None;
    }

    /// Remove every object, keeping the photo layer. Asking the user for
    /// confirmation is the UI's job, not the surface's.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
        self.drawing = None;
    }

    /// Capture the whole scene, including the photo layer's transform.
    pub fn serialize(&self) -> SceneSnapshot {
        SceneSnapshot {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            photo_scale: self.scale,
            objects: self.objects.clone(),
        }
    }

    /// Repopulate the surface from a prior snapshot. Coordinates are
    /// rescaled when the snapshot was taken at a different display scale
    /// (a different viewport), so objects stay glued to the same photo
    /// pixels.
    pub fn load(&mut self, snapshot: &SceneSnapshot) {
        let mut objects = snapshot.objects.clone();
        if snapshot.photo_scale > 0.0 && (snapshot.photo_scale - self.scale).abs() > f64::EPSILON {
            let factor = self.scale / snapshot.photo_scale;
            for object in &mut objects {
                object.rescale(factor);
            }
        }
        self.objects = objects;
        self.active = None;
        self.drawing = None;
        self.dragging = false;
    }

    /// Topmost-first hit test.
    fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.objects
            .iter()
            .enumerate()
            .rev()
            .find(|(_, object)| object.hit_test(x, y))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct NoPrompt;
    impl TextPrompt for NoPrompt {
        fn request_text(&mut self) -> Option<String> {
            None
        }
    }

    struct FixedPrompt(&'static str);
    impl TextPrompt for FixedPrompt {
        fn request_text(&mut self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn surface() -> Surface {
        // 1600x1000 photo in a 1024 viewport: max_w = 800, max_h = 500
        // -> scale = 0.5.
        Surface::bind(1600, 1000, 1024.0)
    }

    #[test]
    fn test_fit_scale_prefers_the_tighter_axis() {
        assert_eq!(fit_scale(1600, 1000, 1024.0), 0.5);
        // Tall photo: height is the constraint.
        assert_eq!(fit_scale(100, 1000, 1024.0), 0.5);
        // Narrow viewport wins over the 800 cap.
        assert_eq!(fit_scale(800, 100, 440.0), 0.5);
    }

    #[test]
    fn test_bind_sizes_surface_to_scaled_photo() {
        let s = surface();
        assert_eq!(s.scale(), 0.5);
        assert_eq!(s.width(), 800.0);
        assert_eq!(s.height(), 500.0);
    }

    #[test]
    fn test_shape_tools_place_fixed_size_objects() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 20.0, &mut NoPrompt);
        s.select_tool(Tool::Circle);
        s.pointer_down(30.0, 40.0, &mut NoPrompt);
        s.select_tool(Tool::Arrow);
        s.pointer_down(50.0, 60.0, &mut NoPrompt);

        assert_eq!(s.objects().len(), 3);
        assert!(matches!(
            s.objects()[0],
            SceneObject::Rect {
                width, height, ..
            } if width == RECT_WIDTH && height == RECT_HEIGHT
        ));
        assert!(matches!(
            s.objects()[1],
            SceneObject::Circle { radius, .. } if radius == CIRCLE_RADIUS
        ));
        assert!(matches!(s.objects()[2], SceneObject::Arrow { .. }));
    }

    #[test]
    fn test_draw_builds_a_path_across_moves() {
        let mut s = surface();
        s.select_tool(Tool::Draw);
        s.pointer_down(1.0, 1.0, &mut NoPrompt);
        s.pointer_move(2.0, 2.0);
        s.pointer_move(2.0, 2.0); // zero-length segment must not break
        s.pointer_move(3.0, 1.0);
        s.pointer_up();
        // Moves after release extend nothing.
        s.pointer_move(9.0, 9.0);

        assert_eq!(s.objects().len(), 1);
        let SceneObject::Path { points, .. } = &s.objects()[0] else {
            unreachable!()
        };
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_text_tool_places_label_only_for_non_empty_input() {
        let mut s = surface();
        s.select_tool(Tool::Text);
        s.pointer_down(5.0, 5.0, &mut NoPrompt);
        assert!(s.objects().is_empty());

        s.pointer_down(5.0, 5.0, &mut FixedPrompt(""));
        assert!(s.objects().is_empty());

        s.pointer_down(5.0, 5.0, &mut FixedPrompt("Spalling"));
        assert_eq!(s.objects().len(), 1);
        let SceneObject::Label {
            text,
            stroke,
            fill,
            font_size,
            ..
        } = &s.objects()[0]
        else {
            unreachable!()
        };
        assert_eq!(text, "Spalling");
        assert_eq!(font_size, &LABEL_FONT_SIZE);
        // Current color feeds both stroke and fill.
        assert_eq!(stroke, "#e0222a");
        assert_eq!(fill, "#e0222a");
    }

    #[test]
    fn test_select_hits_topmost_and_drags_it() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.pointer_down(10.0, 10.0, &mut NoPrompt); // stacked twin

        s.select_tool(Tool::Select);
        s.pointer_down(15.0, 15.0, &mut NoPrompt);
        assert_eq!(s.active, Some(1));

        s.pointer_move(25.0, 15.0);
        s.pointer_up();
        let SceneObject::Rect { left, top, .. } = &s.objects()[1] else {
            unreachable!()
        };
        assert_eq!((*left, *top), (20.0, 10.0));
        // The one underneath never moved.
        let SceneObject::Rect { left, .. } = &s.objects()[0] else {
            unreachable!()
        };
        assert_eq!(*left, 10.0);
    }

    #[test]
    fn test_select_miss_clears_selection() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.select_tool(Tool::Select);
        s.pointer_down(15.0, 15.0, &mut NoPrompt);
        assert!(s.active.is_some());
        s.pointer_up();
        s.pointer_down(700.0, 400.0, &mut NoPrompt);
        assert!(s.active.is_none());
    }

    #[test]
    fn test_leaving_select_discards_selection() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.select_tool(Tool::Select);
        s.pointer_down(15.0, 15.0, &mut NoPrompt);
        assert!(s.active.is_some());

        s.select_tool(Tool::Draw);
        assert!(s.active.is_none());
        // Color changes no longer restyle the former selection.
        s.set_color("#00ff00");
        let SceneObject::Rect { stroke, .. } = &s.objects()[0] else {
            unreachable!()
        };
        assert_eq!(stroke, "#e0222a");
    }

    #[test]
    fn test_set_color_restyles_active_selection() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.select_tool(Tool::Select);
        s.pointer_down(15.0, 15.0, &mut NoPrompt);
        s.set_color("#123456");
        let SceneObject::Rect { stroke, .. } = &s.objects()[0] else {
            unreachable!()
        };
        assert_eq!(stroke, "#123456");
    }

    #[test]
    fn test_set_stroke_width_skips_active_label() {
        let mut s = surface();
        s.select_tool(Tool::Text);
        s.pointer_down(10.0, 10.0, &mut FixedPrompt("note"));
        s.select_tool(Tool::Select);
        s.pointer_down(12.0, 12.0, &mut NoPrompt);
        assert!(s.active.is_some());
        let before = s.objects()[0].clone();
        s.set_stroke_width(9.0);
        assert_eq!(s.objects()[0], before);
    }

    #[test]
    fn test_clear_removes_all_objects() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.pointer_down(50.0, 50.0, &mut NoPrompt);
        s.clear();
        assert!(s.objects().is_empty());
        assert!(s.active.is_none());
    }

    #[test]
    fn test_serialize_load_round_trip_on_equal_scale() {
        let mut s = surface();
        s.select_tool(Tool::Rectangle);
        s.pointer_down(10.0, 10.0, &mut NoPrompt);
        s.select_tool(Tool::Draw);
        s.pointer_down(1.0, 1.0, &mut NoPrompt);
        s.pointer_move(4.0, 4.0);
        s.pointer_up();

        let snapshot = s.serialize();
        let mut fresh = surface();
        fresh.load(&snapshot);
        assert_eq!(fresh.serialize(), snapshot);
    }

    #[test]
    fn test_load_rescales_for_a_different_viewport() {
        let mut s = surface(); // scale 0.5
        s.select_tool(Tool::Rectangle);
        s.pointer_down(100.0, 100.0, &mut NoPrompt);
        let snapshot = s.serialize();

        // Same photo bound in a narrower viewport: scale 0.25.
        let mut narrow = Surface::bind(1600, 1000, 440.0);
        assert_eq!(narrow.scale(), 0.25);
        narrow.load(&snapshot);
        let SceneObject::Rect {
            left, top, width, ..
        } = &narrow.objects()[0]
        else {
            unreachable!()
        };
        // Same photo pixel, half the display coordinates.
        assert_eq!((*left, *top), (50.0, 50.0));
        assert_eq!(*width, RECT_WIDTH / 2.0);
    }
}
