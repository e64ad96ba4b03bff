//! WASM bindings for the site report builder.
//!
//! All state is held in Rust: the report collection behind [`ReportApp`]
//! and the active annotation session behind [`EditorSession`]. JavaScript
//! handles DOM events and file I/O only.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ReportApp, EditorSession } from './pkg/sitereport_wasm.js';
//!
//! await init();
//!
//! const app = new ReportApp();
//! const report = app.createReport({
//!   name: "Foundation", projectName: "Tower B",
//!   engineerName: "R. Osei", location: "Accra",
//! });
//! app.uploadPhoto(report.id, 0, bytes, file.type);
//!
//! // Annotation session over page 0's photo
//! const editor = new EditorSession(photoWidth, photoHeight, window.innerWidth);
//! editor.selectTool("rectangle");
//! editor.pointerDown(40, 30);
//! app.commitPageEdits(report.id, 0, commentBox.value, editor.serialize());
//!
//! const pdf = app.exportPdf(report.id);
//! downloadBlob(pdf, app.exportFileName(report.id));
//! ```

pub mod app;
pub mod editor;
pub mod storage;

use wasm_bindgen::prelude::*;

pub use app::ReportApp;
pub use editor::EditorSession;
pub use storage::LocalStorage;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }
}
