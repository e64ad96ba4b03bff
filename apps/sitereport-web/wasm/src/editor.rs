//! Photo annotation editor session exposed to JavaScript.
//!
//! Wraps one [`Surface`] bound to one photo. Opening another photo means
//! constructing a new session; the old one (and any uncommitted edits)
//! is simply dropped. JavaScript re-renders its canvas from
//! [`EditorSession::serialize`] after each pointer event.

use wasm_bindgen::prelude::*;

use sitereport_annotate::{SceneSnapshot, Surface, TextPrompt, Tool};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Synchronous text input via `window.prompt`, matching the original
/// text-tool flow.
struct WindowPrompt;

impl TextPrompt for WindowPrompt {
    fn request_text(&mut self) -> Option<String> {
        web_sys::window()?
            .prompt_with_message("Enter text:")
            .ok()
            .flatten()
    }
}

#[wasm_bindgen]
pub struct EditorSession {
    surface: Surface,
}

#[wasm_bindgen]
impl EditorSession {
    /// Bind a fresh surface to a photo of the given pixel size, sized to
    /// fit the viewport.
    #[wasm_bindgen(constructor)]
    pub fn new(photo_width: u32, photo_height: u32, viewport_width: f64) -> EditorSession {
        EditorSession {
            surface: Surface::bind(photo_width, photo_height, viewport_width),
        }
    }

    /// Display width of the editing surface in CSS pixels.
    #[wasm_bindgen(getter, js_name = displayWidth)]
    pub fn display_width(&self) -> f64 {
        self.surface.width()
    }

    /// Display height of the editing surface in CSS pixels.
    #[wasm_bindgen(getter, js_name = displayHeight)]
    pub fn display_height(&self) -> f64 {
        self.surface.height()
    }

    /// Scale applied to the locked photo layer.
    #[wasm_bindgen(getter, js_name = photoScale)]
    pub fn photo_scale(&self) -> f64 {
        self.surface.scale()
    }

    /// Number of annotation objects on the surface.
    #[wasm_bindgen(getter, js_name = objectCount)]
    pub fn object_count(&self) -> usize {
        self.surface.objects().len()
    }

    /// Switch tool: "select", "draw", "text", "rectangle", "circle" or
    /// "arrow".
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool = Tool::parse(tool).ok_or_else(|| js_err(format!("unknown tool: {}", tool)))?;
        self.surface.select_tool(tool);
        Ok(())
    }

    /// Hex color for new objects (restyles the active selection too).
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, color: &str) {
        self.surface.set_color(color);
    }

    /// Stroke width for new objects (restyles the active non-label
    /// selection too).
    #[wasm_bindgen(js_name = setStrokeWidth)]
    pub fn set_stroke_width(&mut self, width: f64) {
        self.surface.set_stroke_width(width);
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.surface.pointer_down(x, y, &mut WindowPrompt);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.surface.pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.surface.pointer_up();
    }

    /// Remove every annotation (the confirmation dialog is the UI's job).
    #[wasm_bindgen(js_name = clearAnnotations)]
    pub fn clear_annotations(&mut self) {
        self.surface.clear();
    }

    /// Capture the scene as snapshot JSON for rendering or committing.
    pub fn serialize(&self) -> Result<String, JsValue> {
        self.surface.serialize().to_json().map_err(js_err)
    }

    /// Load a previously saved snapshot, rescaling it to this session's
    /// viewport. Malformed objects inside are skipped, not fatal.
    #[wasm_bindgen(js_name = loadSnapshot)]
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), JsValue> {
        let snapshot = SceneSnapshot::from_json(json).map_err(js_err)?;
        self.surface.load(&snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_sizes_surface_to_viewport() {
        let session = EditorSession::new(1600, 1000, 1024.0);
        assert_eq!(session.photo_scale(), 0.5);
        assert_eq!(session.display_width(), 800.0);
        assert_eq!(session.display_height(), 500.0);
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        let mut session = EditorSession::new(100, 100, 1024.0);
        assert!(session.select_tool("lasso").is_err());
        assert!(session.select_tool("rectangle").is_ok());
    }

    #[test]
    fn test_shape_placement_and_clear_round_trip() {
        let mut session = EditorSession::new(100, 100, 1024.0);
        session.select_tool("rectangle").unwrap();
        session.pointer_down(10.0, 10.0);
        session.pointer_up();
        assert_eq!(session.object_count(), 1);

        let json = session.serialize().unwrap();
        let mut fresh = EditorSession::new(100, 100, 1024.0);
        fresh.load_snapshot(&json).unwrap();
        assert_eq!(fresh.object_count(), 1);

        fresh.clear_annotations();
        assert_eq!(fresh.object_count(), 0);
    }
}
