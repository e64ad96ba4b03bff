//! Report, page and photo entities.
//!
//! All structural mutation goes through methods on [`Report`] so the two
//! invariants hold on every return: `pages` is never empty, and
//! `pages[i].page_number == i` for every index.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ReportError;

/// Engineer-supplied fields for a new report.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub name: String,
    pub project_name: String,
    pub engineer_name: String,
    pub location: String,
    pub description: String,
    /// Defaults to the creation day when unset.
    pub date: Option<NaiveDate>,
}

/// An orientation-normalized photo attached to a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    /// Self-contained raster encoding; the only bitmap source of truth
    /// after upload.
    pub data_url: String,
    /// At most one serialized scene snapshot; opaque to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl Photo {
    pub fn new(data_url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data_url,
            annotations: None,
            timestamp: Utc::now(),
        }
    }
}

/// One unit of report content: optional photo, comment, position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    /// Zero-based position; equal to the page's index in `Report::pages`.
    pub page_number: usize,
    #[serde(default)]
    pub photo: Option<Photo>,
    #[serde(default)]
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl Page {
    pub(crate) fn new(page_number: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_number,
            photo: None,
            comment: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Top-level document: metadata plus an ordered, never-empty page list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    pub project_name: String,
    pub engineer_name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub pages: Vec<Page>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Validate the supplied fields and build a report with one empty page
    /// numbered 0. Fails naming the first missing required field.
    pub fn create(fields: NewReport) -> Result<Self, ReportError> {
        let name = required(&fields.name, "a report name")?;
        let project_name = required(&fields.project_name, "a project name")?;
        let engineer_name = required(&fields.engineer_name, "the engineer's name")?;
        let location = required(&fields.location, "the site location")?;

        let created_at = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            project_name,
            engineer_name,
            location,
            description: fields.description.trim().to_string(),
            date: fields.date.unwrap_or_else(|| created_at.date_naive()),
            pages: vec![Page::new(0)],
            created_at,
        })
    }

    /// Append a new empty page numbered `pages.len()`.
    pub fn add_page(&mut self) -> &Page {
        let page = Page::new(self.pages.len());
        self.pages.push(page);
        // Just pushed, so the list is non-empty.
        &self.pages[self.pages.len() - 1]
    }

    /// Remove the page at `index` and renumber the survivors.
    ///
    /// Rejected outright for single-page reports; the report is left
    /// untouched on any error.
    pub fn delete_page(&mut self, index: usize) -> Result<(), ReportError> {
        if self.pages.len() == 1 {
            return Err(ReportError::LastPage);
        }
        self.check_index(index)?;
        self.pages.remove(index);
        self.renumber();
        Ok(())
    }

    pub fn page(&self, index: usize) -> Result<&Page, ReportError> {
        self.check_index(index)?;
        Ok(&self.pages[index])
    }

    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page, ReportError> {
        self.check_index(index)?;
        Ok(&mut self.pages[index])
    }

    pub fn update_comment(&mut self, index: usize, text: &str) -> Result<(), ReportError> {
        self.page_mut(index)?.comment = text.to_string();
        Ok(())
    }

    pub fn attach_photo(&mut self, index: usize, photo: Photo) -> Result<(), ReportError> {
        self.page_mut(index)?.photo = Some(photo);
        Ok(())
    }

    /// Commit a scene snapshot onto the page's photo.
    pub fn set_annotations(&mut self, index: usize, snapshot: Value) -> Result<(), ReportError> {
        let page = self.page_mut(index)?;
        match page.photo.as_mut() {
            Some(photo) => {
                photo.annotations = Some(snapshot);
                Ok(())
            }
            None => Err(ReportError::NoPhoto(index)),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ReportError> {
        if index >= self.pages.len() {
            return Err(ReportError::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        Ok(())
    }

    /// Renumbering is atomic over the whole sequence: every page gets its
    /// current index, no partial state is ever observable.
    pub(crate) fn renumber(&mut self) {
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.page_number = i;
        }
    }
}

fn required(value: &str, label: &'static str) -> Result<String, ReportError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReportError::MissingField(label));
    }
    Ok(trimmed.to_string())
}
