//! Persistence for the report collection.
//!
//! The whole collection is one JSON blob under a fixed key, matching the
//! localStorage model of the hosting browser. Writes are plain
//! read-modify-write with no locking: concurrent tabs race on the single
//! key and the last writer wins. That is accepted for a single-user tool;
//! do not paper over it here.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::model::{NewReport, Page, Photo, Report};

/// Fixed storage key for the whole collection.
pub const STORAGE_KEY: &str = "siteReports";

/// Version written into the persisted envelope. Version 1 is the legacy
/// bare array (with or without the pre-pages `photos` report shape).
const SCHEMA_VERSION: u32 = 2;

/// Key-value persistence capability consumed by the store.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, ReportError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ReportError>;
}

/// In-memory backend for tests and native embedding.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, ReportError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ReportError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    reports: &'a [Report],
}

/// Owns the loaded report collection and the persistence backend.
///
/// Mutations follow the save discipline of the original tool: creating a
/// report and deleting a page persist immediately; comment, photo and
/// annotation edits stay buffered until the caller persists.
#[derive(Debug)]
pub struct ReportStore<B> {
    backend: B,
    reports: Vec<Report>,
}

impl<B: StorageBackend> ReportStore<B> {
    /// Load the collection from the backend, tolerating legacy shapes.
    pub fn open(backend: B) -> Result<Self, ReportError> {
        let reports = match backend.get(STORAGE_KEY)? {
            Some(raw) => decode_collection(&raw)?,
            None => Vec::new(),
        };
        debug!(count = reports.len(), "report collection loaded");
        Ok(Self { backend, reports })
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn find_report(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    fn report_mut(&mut self, id: &str) -> Result<&mut Report, ReportError> {
        self.reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ReportError::NotFound(id.to_string()))
    }

    /// Validate, append and persist a new report.
    pub fn create_report(&mut self, fields: NewReport) -> Result<Report, ReportError> {
        let report = Report::create(fields)?;
        self.reports.push(report.clone());
        self.persist()?;
        Ok(report)
    }

    /// Append an empty page. Does NOT persist: the caller saves once any
    /// buffered edits for the report are flushed.
    pub fn add_page(&mut self, report_id: &str) -> Result<Page, ReportError> {
        let report = self.report_mut(report_id)?;
        Ok(report.add_page().clone())
    }

    /// Remove a page, renumber the rest and persist.
    pub fn delete_page(&mut self, report_id: &str, index: usize) -> Result<(), ReportError> {
        self.report_mut(report_id)?.delete_page(index)?;
        self.persist()
    }

    /// In-memory comment edit; caller persists.
    pub fn update_page_comment(
        &mut self,
        report_id: &str,
        index: usize,
        text: &str,
    ) -> Result<(), ReportError> {
        self.report_mut(report_id)?.update_comment(index, text)
    }

    /// In-memory photo attach; caller persists.
    pub fn attach_photo(
        &mut self,
        report_id: &str,
        index: usize,
        photo: Photo,
    ) -> Result<(), ReportError> {
        self.report_mut(report_id)?.attach_photo(index, photo)
    }

    /// In-memory annotation commit; caller persists.
    pub fn set_annotations(
        &mut self,
        report_id: &str,
        index: usize,
        snapshot: Value,
    ) -> Result<(), ReportError> {
        self.report_mut(report_id)?.set_annotations(index, snapshot)
    }

    /// Serialize the whole collection to the backend under the fixed key.
    ///
    /// On failure the in-memory state stays the user's working copy; it is
    /// just not durable yet.
    pub fn persist(&mut self) -> Result<(), ReportError> {
        let envelope = Envelope {
            version: SCHEMA_VERSION,
            reports: &self.reports,
        };
        let raw = serde_json::to_string(&envelope)
            .map_err(|e| ReportError::Corrupt(e.to_string()))?;
        self.backend.set(STORAGE_KEY, &raw)
    }
}

/// Decode a persisted collection, accepting the v2 envelope, the legacy
/// bare array, and legacy reports that carry `photos` instead of `pages`.
/// Individually undecodable reports are skipped, never failing the load.
fn decode_collection(raw: &str) -> Result<Vec<Report>, ReportError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ReportError::Corrupt(e.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("reports") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ReportError::Corrupt(
                    "expected a reports array in the persisted envelope".to_string(),
                ))
            }
        },
        _ => {
            return Err(ReportError::Corrupt(
                "persisted collection is neither an array nor an envelope".to_string(),
            ))
        }
    };

    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        match decode_report(entry) {
            Some(report) => reports.push(report),
            None => warn!("skipping undecodable report entry"),
        }
    }
    Ok(reports)
}

fn decode_report(entry: Value) -> Option<Report> {
    let obj = entry.as_object()?;
    if obj.contains_key("pages") {
        let mut report: Report = serde_json::from_value(entry).ok()?;
        if report.pages.is_empty() {
            // Repair rather than reject: the invariant predates some data.
            report.pages.push(Page::new(0));
            warn!(id = %report.id, "report persisted with zero pages; added an empty one");
        }
        report.renumber();
        for page in &mut report.pages {
            collapse_annotation_list(page);
        }
        return Some(report);
    }
    if obj.contains_key("photos") {
        return decode_legacy_report(obj);
    }
    None
}

/// Older revisions stored a list of annotation snapshots but only ever
/// populated index 0; collapse the list to its first element.
fn collapse_annotation_list(page: &mut Page) {
    if let Some(photo) = page.photo.as_mut() {
        if matches!(photo.annotations, Some(Value::Array(_))) {
            if let Some(Value::Array(list)) = photo.annotations.take() {
                photo.annotations = list.into_iter().next();
            }
        }
    }
}

/// Pre-pages schema: the report held `photos` directly. Each legacy photo
/// becomes a page whose comment is the photo's description.
fn decode_legacy_report(obj: &serde_json::Map<String, Value>) -> Option<Report> {
    let id = str_field(obj, "id")?;
    let name = str_field(obj, "name")?;
    let created_at = obj
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Utc::now);
    let date = obj
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| created_at.date_naive());

    let mut pages = Vec::new();
    if let Some(Value::Array(photos)) = obj.get("photos") {
        for (i, entry) in photos.iter().enumerate() {
            match decode_legacy_photo(entry, i) {
                Some(page) => pages.push(page),
                None => warn!(report = %id, index = i, "skipping undecodable legacy photo"),
            }
        }
    }
    if pages.is_empty() {
        pages.push(Page::new(0));
    }

    debug!(report = %id, pages = pages.len(), "migrated legacy photos-shaped report");
    Some(Report {
        id,
        name,
        project_name: str_field(obj, "projectName").unwrap_or_default(),
        engineer_name: str_field(obj, "engineerName").unwrap_or_default(),
        location: str_field(obj, "location").unwrap_or_default(),
        description: str_field(obj, "description").unwrap_or_default(),
        date,
        pages,
        created_at,
    })
}

fn decode_legacy_photo(entry: &Value, index: usize) -> Option<Page> {
    let obj = entry.as_object()?;
    let timestamp = obj
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Utc::now);
    let annotations = match obj.get("annotations") {
        Some(Value::Array(list)) => list.first().cloned(),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.clone()),
    };
    let photo = Photo {
        id: str_field(obj, "id")?,
        data_url: str_field(obj, "dataUrl")?,
        annotations,
        timestamp,
    };
    let mut page = Page::new(index);
    page.comment = str_field(obj, "description").unwrap_or_default();
    page.timestamp = timestamp;
    page.photo = Some(photo);
    Some(page)
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
