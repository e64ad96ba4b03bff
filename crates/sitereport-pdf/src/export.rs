//! Report document assembly.
//!
//! One cover page, then one physical page per report page. Layout
//! coordinates below are measured from the top-left of an A4 page and
//! converted to PDF space (origin bottom-left) at emission time.

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::warn;

use sitereport_annotate::{flatten, SceneSnapshot};
use sitereport_core::{Page, Photo, Report};
use sitereport_photo::{from_data_url, PhotoError};

use crate::error::ExportError;
use crate::text::{text_width, wrap_text};
use crate::xobject::{jpeg_xobject, rgb_xobject, PageImage};

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const SIDE_MARGIN: f64 = 20.0;

/// The photo fits within (page width - 40, page height - 80).
const IMAGE_MAX_WIDTH: f64 = PAGE_WIDTH - 40.0;
const IMAGE_MAX_HEIGHT: f64 = PAGE_HEIGHT - 80.0;
const IMAGE_TOP: f64 = 60.0;

const HEADING_BASELINE: f64 = 40.0;
const PLACEHOLDER_BASELINE: f64 = 100.0;
const COMMENT_GAP: f64 = 20.0;
const COMMENT_FALLBACK_TOP: f64 = 140.0;
const COMMENT_LINE_HEIGHT: f64 = 15.0;
const FOOTER_BASELINE: f64 = PAGE_HEIGHT - 20.0;

const COVER_TITLE_BASELINE: f64 = 120.0;
const COVER_SUBTITLE_BASELINE: f64 = 160.0;
const COVER_META_START: f64 = 280.0;
const COVER_META_STEP: f64 = 30.0;
const COVER_FOOTER_BASELINE: f64 = PAGE_HEIGHT - 60.0;
const COVER_BORDER_INSET: f64 = 4.0;
const COVER_BORDER_WIDTH: f64 = 8.0;

const TITLE_TEXT: &str = "Quality Control Report";
const SUBTITLE_TEXT: &str = "Site Inspection Report";
const COMPANY_LINE: &str = "Company: Spectrum Engineering Ltd.";
const COVER_FOOTER_TEXT: &str = "Generated by Quality Control App";
const NO_PHOTO_TEXT: &str = "No photo for this page";
const PHOTO_ERROR_TEXT: &str = "Error: could not load photo";
const COMMENT_PREFIX: &str = "Comments: ";
const FILE_PREFIX: &str = "QC_Report";

type Rgb = (f64, f64, f64);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const WHITE: Rgb = (1.0, 1.0, 1.0);
const BORDER_RED: Rgb = (224.0 / 255.0, 34.0 / 255.0, 42.0 / 255.0);
const META_GRAY: Rgb = (189.0 / 255.0, 195.0 / 255.0, 199.0 / 255.0);
const FOOTER_GRAY: Rgb = (149.0 / 255.0, 165.0 / 255.0, 166.0 / 255.0);
const PAGE_NUM_GRAY: Rgb = (100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0);
const PLACEHOLDER_GRAY: Rgb = (127.0 / 255.0, 140.0 / 255.0, 141.0 / 255.0);
const ERROR_RED: Rgb = (1.0, 0.0, 0.0);

/// Name every page's image resource is registered under.
const IMAGE_NAME: &str = "Im0";

/// A finished export: the document bytes and the derived filename.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Assemble the report into a PDF. Deterministic given report content; an
/// unloadable photo degrades to an inline error line rather than failing
/// the whole export.
pub fn export_report(report: &Report) -> Result<ExportedReport, ExportError> {
    if report.pages.is_empty() {
        // The model invariant keeps this from happening, but a coverless
        // empty document would be worse than an error.
        return Err(ExportError::EmptyReport);
    }

    let mut builder = PdfBuilder::new();
    builder.cover_page(report)?;
    for page in &report.pages {
        builder.report_page(page)?;
    }
    let bytes = builder.finish()?;

    Ok(ExportedReport {
        bytes,
        file_name: export_file_name(report),
    })
}

/// `QC_Report_<sanitized name>_<date>.pdf`, every non-alphanumeric
/// character of the name replaced with an underscore.
pub fn export_file_name(report: &Report) -> String {
    let sanitized: String = report
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}_{}.pdf", FILE_PREFIX, sanitized, report.date)
}

/// "March 5, 2026"-style date for the cover.
fn format_long_date(date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    format!("{} {}, {}", date.format("%B"), date.day(), date.year())
}

struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
        }
    }

    fn cover_page(&mut self, report: &Report) -> Result<(), ExportError> {
        let mut ops = PageOps::new();
        ops.fill_rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT, BLACK);
        ops.stroke_rect(
            COVER_BORDER_INSET,
            COVER_BORDER_INSET,
            PAGE_WIDTH - 2.0 * COVER_BORDER_INSET,
            PAGE_HEIGHT - 2.0 * COVER_BORDER_INSET,
            BORDER_RED,
            COVER_BORDER_WIDTH,
        );

        ops.text_centered(TITLE_TEXT, COVER_TITLE_BASELINE, 28.0, WHITE);
        ops.text_centered(SUBTITLE_TEXT, COVER_SUBTITLE_BASELINE, 22.0, WHITE);

        let meta = [
            format!("Engineer's Name: {}", report.engineer_name),
            COMPANY_LINE.to_string(),
            format!("Site Location: {}", report.location),
            format!("Project: {}", report.project_name),
            format!("Report: {}", report.name),
            format!("Date: {}", format_long_date(report.date)),
            format!("Pages: {}", report.pages.len()),
        ];
        for (i, line) in meta.iter().enumerate() {
            let baseline = COVER_META_START + i as f64 * COVER_META_STEP;
            ops.text_centered(line, baseline, 14.0, META_GRAY);
        }

        ops.text_centered(COVER_FOOTER_TEXT, COVER_FOOTER_BASELINE, 10.0, FOOTER_GRAY);
        self.push_page(ops, None)
    }

    fn report_page(&mut self, page: &Page) -> Result<(), ExportError> {
        let physical_number = self.page_ids.len() + 1;
        let mut ops = PageOps::new();

        ops.text_right(
            &format!("Page {}", physical_number),
            PAGE_WIDTH - SIDE_MARGIN,
            FOOTER_BASELINE,
            10.0,
            PAGE_NUM_GRAY,
        );
        ops.text(
            &format!("Page {}", page.page_number + 1),
            SIDE_MARGIN,
            HEADING_BASELINE,
            16.0,
            BLACK,
        );

        let mut comment_top = COMMENT_FALLBACK_TOP;
        let mut image = None;

        match &page.photo {
            Some(photo) => match page_image(photo) {
                Ok(page_image) => {
                    let scale = (IMAGE_MAX_WIDTH / page_image.width as f64)
                        .min(IMAGE_MAX_HEIGHT / page_image.height as f64);
                    let width = page_image.width as f64 * scale;
                    let height = page_image.height as f64 * scale;
                    let x = (PAGE_WIDTH - width) / 2.0;
                    ops.image(x, IMAGE_TOP, width, height);
                    comment_top = IMAGE_TOP + height + COMMENT_GAP;
                    image = Some(page_image);
                }
                Err(e) => {
                    warn!(page = page.page_number, error = %e, "photo unloadable at export");
                    ops.text(PHOTO_ERROR_TEXT, SIDE_MARGIN, PLACEHOLDER_BASELINE, 12.0, ERROR_RED);
                }
            },
            None => {
                ops.text(
                    NO_PHOTO_TEXT,
                    SIDE_MARGIN,
                    PLACEHOLDER_BASELINE,
                    12.0,
                    PLACEHOLDER_GRAY,
                );
            }
        }

        if !page.comment.trim().is_empty() {
            let full = format!("{}{}", COMMENT_PREFIX, page.comment);
            for (i, line) in wrap_text(&full, 12.0, IMAGE_MAX_WIDTH).iter().enumerate() {
                let baseline = comment_top + i as f64 * COMMENT_LINE_HEIGHT;
                ops.text(line, SIDE_MARGIN, baseline, 12.0, BLACK);
            }
        }

        self.push_page(ops, image)
    }

    fn push_page(&mut self, ops: PageOps, image: Option<PageImage>) -> Result<(), ExportError> {
        let content = Content {
            operations: ops.ops,
        };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(self.font_id) },
        };
        if let Some(page_image) = image {
            let image_id = self.doc.add_object(page_image.stream);
            resources.set(
                "XObject",
                dictionary! { IMAGE_NAME => Object::Reference(image_id) },
            );
        }

        let page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(PAGE_WIDTH as f32),
                Object::Real(PAGE_HEIGHT as f32),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Dictionary(resources),
        };
        self.page_ids.push(self.doc.add_object(page));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(self.page_ids.len() as i64),
            "Kids" => Object::Array(
                self.page_ids.iter().map(|id| Object::Reference(*id)).collect(),
            ),
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

/// Decode a photo into an embeddable XObject, flattening its annotation
/// scene onto the raster first when one is present.
fn page_image(photo: &Photo) -> Result<PageImage, PhotoError> {
    let decoded = from_data_url(&photo.data_url)?;
    let snapshot = photo.annotations.clone().and_then(|value| {
        match SceneSnapshot::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "unreadable annotation snapshot; exporting the bare photo");
                None
            }
        }
    });

    let is_jpeg = matches!(
        image::guess_format(&decoded.bytes),
        Ok(image::ImageFormat::Jpeg)
    );

    match snapshot {
        Some(snapshot) => {
            let img = image::load_from_memory(&decoded.bytes)
                .map_err(|e| PhotoError::Decode(e.to_string()))?;
            let flattened = flatten(&img.to_rgba8(), &snapshot);
            rgb_xobject(&DynamicImage::ImageRgba8(flattened).to_rgb8())
                .map_err(|e| PhotoError::Decode(e.to_string()))
        }
        None if is_jpeg => {
            let img = image::load_from_memory(&decoded.bytes)
                .map_err(|e| PhotoError::Decode(e.to_string()))?;
            Ok(jpeg_xobject(decoded.bytes, img.width(), img.height()))
        }
        None => {
            let img = image::load_from_memory(&decoded.bytes)
                .map_err(|e| PhotoError::Decode(e.to_string()))?;
            rgb_xobject(&img.to_rgb8()).map_err(|e| PhotoError::Decode(e.to_string()))
        }
    }
}

/// Content stream accumulator with top-down coordinates.
struct PageOps {
    ops: Vec<Operation>,
}

impl PageOps {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn fill_rect(&mut self, x: f64, y_top: f64, width: f64, height: f64, color: Rgb) {
        self.ops.push(Operation::new("rg", rgb_operands(color)));
        self.ops.push(Operation::new(
            "re",
            vec![
                real(x),
                real(PAGE_HEIGHT - y_top - height),
                real(width),
                real(height),
            ],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(
        &mut self,
        x: f64,
        y_top: f64,
        width: f64,
        height: f64,
        color: Rgb,
        line_width: f64,
    ) {
        self.ops.push(Operation::new("RG", rgb_operands(color)));
        self.ops.push(Operation::new("w", vec![real(line_width)]));
        self.ops.push(Operation::new(
            "re",
            vec![
                real(x),
                real(PAGE_HEIGHT - y_top - height),
                real(width),
                real(height),
            ],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn text(&mut self, text: &str, x: f64, baseline_top: f64, size: f64, color: Rgb) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), real(size)],
        ));
        self.ops.push(Operation::new("rg", rgb_operands(color)));
        self.ops.push(Operation::new(
            "Td",
            vec![real(x), real(PAGE_HEIGHT - baseline_top)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                text.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn text_centered(&mut self, text: &str, baseline_top: f64, size: f64, color: Rgb) {
        let x = ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(SIDE_MARGIN);
        self.text(text, x, baseline_top, size, color);
    }

    fn text_right(&mut self, text: &str, right: f64, baseline_top: f64, size: f64, color: Rgb) {
        let x = right - text_width(text, size);
        self.text(text, x, baseline_top, size, color);
    }

    /// Place the page's image resource at the given top-down box.
    fn image(&mut self, x: f64, y_top: f64, width: f64, height: f64) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                real(width),
                real(0.0),
                real(0.0),
                real(height),
                real(x),
                real(PAGE_HEIGHT - y_top - height),
            ],
        ));
        self.ops.push(Operation::new(
            "Do",
            vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())],
        ));
        self.ops.push(Operation::new("Q", vec![]));
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rgb_operands(color: Rgb) -> Vec<Object> {
    vec![real(color.0), real(color.1), real(color.2)]
}
