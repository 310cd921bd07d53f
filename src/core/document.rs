use crate::domain::model::{Artifact, ReceiptRequest};
use crate::domain::ports::Storage;
use crate::utils::error::{ReceiptError, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::io::BufWriter;

pub const TITLE: &str = "Hospital Receipt";
pub const THANK_YOU_NOTE: &str =
    "Thank you for your visit! If you have any questions, please contact us at support@hospital.com.";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const CELL_PADDING: f32 = 1.0;
const LINE_HEIGHT: f32 = 10.0;
const TITLE_CELL_WIDTH: f32 = 200.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const PT_TO_MM: f32 = 25.4 / 72.0;

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // {..~
];
/// Helvetica-Bold advance widths for the same range.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500, // a..z
    389, 280, 389, 584, // {..~
];
const FALLBACK_WIDTH: u16 = 556;

/// Which metrics table a run of text is measured with. Helvetica-Oblique
/// shares the regular widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            Face::Regular => &HELVETICA_WIDTHS,
            Face::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

/// Windows-1252 characters outside Latin-1 that the builtin fonts can still encode.
const WINANSI_EXTRAS: [char; 27] = [
    '€', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', 'Ž', '‘', '’', '“', '”', '•', '–',
    '—', '˜', '™', 'š', '›', 'œ', 'ž', 'Ÿ',
];

fn is_winansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}') || WINANSI_EXTRAS.contains(&c)
}

/// Rejects text the builtin (WinAnsi) fonts cannot draw.
pub fn check_encodable(request: &ReceiptRequest) -> Result<()> {
    for (field, value) in request.fields() {
        if let Some(c) = value.chars().find(|c| !is_winansi(*c)) {
            let reason = if c.is_control() {
                format!("control character U+{:04X}", c as u32)
            } else {
                format!("character '{}' (U+{:04X}) is not encodable", c, c as u32)
            };
            return Err(ReceiptError::FormattingError {
                field: field.to_string(),
                reason,
            });
        }
    }
    Ok(())
}

/// Width of `text` in millimetres when set in `face` at `size` points.
fn text_width(text: &str, size: f32, face: Face) -> f32 {
    let widths = face.widths();
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..=0x7E).contains(&code) {
                u32::from(widths[(code - 0x20) as usize])
            } else {
                u32::from(FALLBACK_WIDTH)
            }
        })
        .sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Greedy word wrap against a width in millimetres.
fn wrap_to_width(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if !current.is_empty() && text_width(&candidate, size, Face::Regular) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Text content of a receipt page, in drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    pub title: String,
    pub details: Vec<String>,
    pub note: String,
}

impl ReceiptLayout {
    pub fn from_request(request: &ReceiptRequest) -> Self {
        let details = vec![
            format!("Appointment ID: {}", request.appointment_id),
            format!("Patient Name: {}", request.patient_name),
            format!("Patient Email: {}", request.patient_email),
            format!("Doctor Name: {}", request.doctor_name),
            format!("Service Type: {}", request.service_type),
            format!("Appointment Date: {}", request.appointment_date),
            format!("Appointment Time: {}", request.appointment_time),
            format!("Total Amount: ${}", request.total_amount),
            format!("Payment Method: {}", request.payment_method),
        ];

        Self {
            title: TITLE.to_string(),
            details,
            note: THANK_YOU_NOTE.to_string(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.details.len() + 2);
        lines.push(self.title.clone());
        lines.extend(self.details.iter().cloned());
        lines.push(self.note.clone());
        lines
    }
}

// 以頁面上緣為基準的座標轉換成 PDF 座標（原點在左下）
fn baseline(top: f32, size: f32) -> Mm {
    Mm(PAGE_HEIGHT - (top + LINE_HEIGHT / 2.0 + 0.3 * size * PT_TO_MM))
}

fn draw_centered(
    layer: &PdfLayerReference,
    text: &str,
    size: f32,
    left: f32,
    width: f32,
    top: f32,
    (font, face): (&IndirectFontRef, Face),
) {
    let x = left + (width - text_width(text, size, face)) / 2.0;
    layer.use_text(text, size, Mm(x), baseline(top, size), font);
}

pub fn render_pdf(layout: &ReceiptLayout) -> Result<Vec<u8>> {
    let (doc, page1, layer1) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReceiptError::rendering(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReceiptError::rendering(format!("PDF font error: {e}")))?;
    let italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(|e| ReceiptError::rendering(format!("PDF font error: {e}")))?;

    let mut top = MARGIN;

    // Title
    draw_centered(
        &layer,
        &layout.title,
        TITLE_SIZE,
        MARGIN,
        TITLE_CELL_WIDTH,
        top,
        (&bold, Face::Bold),
    );
    top += LINE_HEIGHT * 2.0;

    // Appointment, patient and payment details
    for line in &layout.details {
        layer.use_text(
            line.as_str(),
            BODY_SIZE,
            Mm(MARGIN + CELL_PADDING),
            baseline(top, BODY_SIZE),
            &regular,
        );
        top += LINE_HEIGHT;
    }

    // Thank you note
    top += LINE_HEIGHT;
    let note_width = PAGE_WIDTH - 2.0 * MARGIN;
    for line in wrap_to_width(&layout.note, BODY_SIZE, note_width - 2.0 * CELL_PADDING) {
        draw_centered(
            &layer,
            &line,
            BODY_SIZE,
            MARGIN,
            note_width,
            top,
            (&italic, Face::Regular),
        );
        top += LINE_HEIGHT;
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReceiptError::rendering(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReceiptError::rendering(format!("PDF buffer error: {e}")))
}

pub struct DocumentBuilder<S: Storage> {
    storage: S,
}

impl<S: Storage> DocumentBuilder<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn build(&self, request: &ReceiptRequest) -> Result<Artifact> {
        check_encodable(request)?;

        let layout = ReceiptLayout::from_request(request);
        let bytes = render_pdf(&layout)?;

        let file_name = request.artifact_file_name();
        let path = self.storage.resolve(&file_name);
        tracing::debug!("Writing {} bytes to {}", bytes.len(), path.display());

        self.storage
            .write_file(&file_name, &bytes)
            .await
            .map_err(|e| {
                ReceiptError::rendering(format!("cannot write {}: {}", path.display(), e))
            })?;

        Ok(Artifact {
            file_name,
            path,
            size_bytes: bytes.len(),
        })
    }
}
