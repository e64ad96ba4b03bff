//! Stateful report session exposed to JavaScript.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use sitereport_core::{NewReport, Photo, Report, ReportStore};
use sitereport_pdf::export_report;
use sitereport_photo::{check_upload, from_data_url, normalize, to_data_url};

use crate::storage::LocalStorage;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// New-report form payload.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewReportFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    engineer_name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date: Option<String>,
}

/// One row of the saved-reports listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportSummary<'a> {
    id: &'a str,
    name: &'a str,
    engineer_name: &'a str,
    location: &'a str,
    description: &'a str,
    date: String,
    page_count: usize,
}

impl<'a> From<&'a Report> for ReportSummary<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            id: &report.id,
            name: &report.name,
            engineer_name: &report.engineer_name,
            location: &report.location,
            description: &report.description,
            date: report.date.to_string(),
            page_count: report.pages.len(),
        }
    }
}

/// A `YYYY-MM-DD` form value, or None for anything blank or malformed
/// (the model then defaults to today, like the original form did).
pub(crate) fn parse_report_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// Holds the report collection in Rust, persisting to localStorage.
#[wasm_bindgen]
pub struct ReportApp {
    store: ReportStore<LocalStorage>,
}

#[wasm_bindgen]
impl ReportApp {
    /// Open the persisted collection (tolerating legacy layouts).
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ReportApp, JsValue> {
        let backend = LocalStorage::new().map_err(js_err)?;
        let store = ReportStore::open(backend).map_err(js_err)?;
        Ok(ReportApp { store })
    }

    /// Validate the form fields and create a report with one empty page.
    /// Returns the full report as a JS object.
    #[wasm_bindgen(js_name = createReport)]
    pub fn create_report(&mut self, fields: JsValue) -> Result<JsValue, JsValue> {
        let fields: NewReportFields =
            serde_wasm_bindgen::from_value(fields).map_err(js_err)?;
        let report = self
            .store
            .create_report(NewReport {
                name: fields.name,
                project_name: fields.project_name,
                engineer_name: fields.engineer_name,
                location: fields.location,
                description: fields.description,
                date: parse_report_date(fields.date.as_deref()),
            })
            .map_err(js_err)?;
        serde_wasm_bindgen::to_value(&report).map_err(js_err)
    }

    /// Summaries of every saved report, in insertion order.
    #[wasm_bindgen(js_name = listReports)]
    pub fn list_reports(&self) -> Result<JsValue, JsValue> {
        let summaries: Vec<ReportSummary> =
            self.store.reports().iter().map(ReportSummary::from).collect();
        serde_wasm_bindgen::to_value(&summaries).map_err(js_err)
    }

    /// The full report, for the editor screen.
    #[wasm_bindgen(js_name = openReport)]
    pub fn open_report(&self, id: &str) -> Result<JsValue, JsValue> {
        let report = self
            .store
            .find_report(id)
            .ok_or_else(|| js_err(format!("report not found: {}", id)))?;
        serde_wasm_bindgen::to_value(report).map_err(js_err)
    }

    /// Append an empty page and return it. Not persisted until the next
    /// save/commit, matching the buffered-edit flow.
    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&mut self, id: &str) -> Result<JsValue, JsValue> {
        let page = self.store.add_page(id).map_err(js_err)?;
        serde_wasm_bindgen::to_value(&page).map_err(js_err)
    }

    /// Delete a page (refused for the last one) and persist.
    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&mut self, id: &str, index: usize) -> Result<(), JsValue> {
        self.store.delete_page(id, index).map_err(js_err)
    }

    /// Buffered comment edit; durable on the next commit/save.
    #[wasm_bindgen(js_name = updatePageComment)]
    pub fn update_page_comment(
        &mut self,
        id: &str,
        index: usize,
        text: &str,
    ) -> Result<(), JsValue> {
        self.store.update_page_comment(id, index, text).map_err(js_err)
    }

    /// Gate, normalize and attach an uploaded photo, then persist.
    ///
    /// Normalization failure falls back to the original bytes rather than
    /// aborting the upload. Returns the stored photo.
    #[wasm_bindgen(js_name = uploadPhoto)]
    pub fn upload_photo(
        &mut self,
        id: &str,
        index: usize,
        bytes: &[u8],
        mime: &str,
    ) -> Result<JsValue, JsValue> {
        check_upload(bytes, mime).map_err(js_err)?;
        let data_url = match normalize(bytes) {
            Ok(normalized) => to_data_url(&normalized.bytes, normalized.mime),
            Err(e) => {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "photo normalization failed, keeping original bytes: {}",
                    e
                )));
                to_data_url(bytes, mime)
            }
        };
        let photo = Photo::new(data_url);
        self.store.attach_photo(id, index, photo.clone()).map_err(js_err)?;
        self.store.persist().map_err(js_err)?;
        serde_wasm_bindgen::to_value(&photo).map_err(js_err)
    }

    /// Natural pixel size of a page's photo, as `[width, height]`; the
    /// editor needs it to size its surface.
    #[wasm_bindgen(js_name = photoDimensions)]
    pub fn photo_dimensions(&self, id: &str, index: usize) -> Result<Vec<u32>, JsValue> {
        let report = self
            .store
            .find_report(id)
            .ok_or_else(|| js_err(format!("report not found: {}", id)))?;
        let page = report.page(index).map_err(js_err)?;
        let photo = page
            .photo
            .as_ref()
            .ok_or_else(|| js_err(format!("page {} has no photo", index)))?;
        let decoded = from_data_url(&photo.data_url).map_err(js_err)?;
        let img = image_dimensions(&decoded.bytes).map_err(js_err)?;
        Ok(vec![img.0, img.1])
    }

    /// The saved annotation snapshot for a page's photo, as JSON (or
    /// null), for seeding a fresh editor session.
    #[wasm_bindgen(js_name = pageAnnotations)]
    pub fn page_annotations(&self, id: &str, index: usize) -> Result<Option<String>, JsValue> {
        let report = self
            .store
            .find_report(id)
            .ok_or_else(|| js_err(format!("report not found: {}", id)))?;
        let page = report.page(index).map_err(js_err)?;
        match page.photo.as_ref().and_then(|p| p.annotations.as_ref()) {
            Some(value) => Ok(Some(serde_json::to_string(value).map_err(js_err)?)),
            None => Ok(None),
        }
    }

    /// Commit the photo editor's buffered state (comment plus optional
    /// serialized scene) onto the page and persist the collection. Until
    /// this call, nothing from the edit session is durable.
    #[wasm_bindgen(js_name = commitPageEdits)]
    pub fn commit_page_edits(
        &mut self,
        id: &str,
        index: usize,
        comment: &str,
        snapshot_json: Option<String>,
    ) -> Result<(), JsValue> {
        self.store.update_page_comment(id, index, comment).map_err(js_err)?;
        if let Some(raw) = snapshot_json {
            let value: serde_json::Value = serde_json::from_str(&raw).map_err(js_err)?;
            self.store.set_annotations(id, index, value).map_err(js_err)?;
        }
        self.store.persist().map_err(js_err)
    }

    /// Assemble the report PDF and hand the bytes to JavaScript.
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self, id: &str) -> Result<js_sys::Uint8Array, JsValue> {
        let report = self
            .store
            .find_report(id)
            .ok_or_else(|| js_err(format!("report not found: {}", id)))?;
        let exported = export_report(report).map_err(js_err)?;
        let array = js_sys::Uint8Array::new_with_length(exported.bytes.len() as u32);
        array.copy_from(&exported.bytes);
        Ok(array)
    }

    /// The deterministic filename for the exported PDF.
    #[wasm_bindgen(js_name = exportFileName)]
    pub fn export_file_name(&self, id: &str) -> Result<String, JsValue> {
        let report = self
            .store
            .find_report(id)
            .ok_or_else(|| js_err(format!("report not found: {}", id)))?;
        Ok(sitereport_pdf::export_file_name(report))
    }

    /// Persist any buffered edits now.
    pub fn save(&mut self) -> Result<(), JsValue> {
        self.store.persist().map_err(js_err)
    }

    /// Number of saved reports.
    #[wasm_bindgen(js_name = reportCount)]
    pub fn report_count(&self) -> usize {
        self.store.reports().len()
    }
}

fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    Ok((img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_date_accepts_form_format() {
        assert_eq!(
            parse_report_date(Some("2026-03-05")),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
        assert_eq!(
            parse_report_date(Some(" 2026-03-05 ")),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
    }

    #[test]
    fn test_parse_report_date_falls_back_to_none() {
        assert_eq!(parse_report_date(None), None);
        assert_eq!(parse_report_date(Some("")), None);
        assert_eq!(parse_report_date(Some("05/03/2026")), None);
    }
}

// Browser-only tests; run with wasm-pack test.
#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fields() -> JsValue {
        serde_wasm_bindgen::to_value(&serde_json::json!({
            "name": "Foundation",
            "projectName": "Tower B",
            "engineerName": "R. Osei",
            "location": "Accra",
        }))
        .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_create_and_reopen_report() {
        let mut app = ReportApp::new().unwrap();
        let before = app.report_count();
        app.create_report(fields()).unwrap();
        assert_eq!(app.report_count(), before + 1);

        // A second app instance sees the persisted report.
        let reopened = ReportApp::new().unwrap();
        assert_eq!(reopened.report_count(), before + 1);
    }

    #[wasm_bindgen_test]
    fn test_blank_name_is_rejected() {
        let mut app = ReportApp::new().unwrap();
        let bad = serde_wasm_bindgen::to_value(&serde_json::json!({
            "name": "  ",
            "projectName": "Tower B",
            "engineerName": "R. Osei",
            "location": "Accra",
        }))
        .unwrap();
        assert!(app.create_report(bad).is_err());
    }
}
