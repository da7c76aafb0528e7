//! CSV and PDF renderings of finished reports.
//!
//! Both formats are built from the same [`ExportRow`] list, so the set of
//! executive records in a CSV and its PDF twin is always identical.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use serde::Serialize;

use crate::{
    domain::{contact::SocialPlatform, report::Report},
    error::ExportError,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.5;
const WRAP_COLUMNS: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<ExportFormat> {
        match raw.trim().to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Rendered file plus the number of executive records written into it.
#[derive(Debug)]
pub struct Export {
    pub bytes: Vec<u8>,
    pub records: usize,
}

/// One CSV line: an executive with the organization's details repeated,
/// or a single placeholder when the organization has no executives.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub company: String,
    pub domain: String,
    pub website: String,
    pub category: String,
    pub executive_name: String,
    pub executive_title: String,
    pub executive_title_text: String,
    pub executive_source: String,
    pub executive_linkedin: String,
    pub instagram: String,
    pub facebook: String,
    pub linkedin: String,
    pub twitter: String,
    pub youtube: String,
    pub emails: String,
    pub phones: String,
    pub addresses: String,
    pub synopsis: String,
    pub generated_at: String,
    #[serde(skip)]
    pub is_executive: bool,
}

pub fn export(reports: &[Report], format: ExportFormat) -> Result<Export, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(reports),
        ExportFormat::Pdf => to_pdf(reports),
    }
}

pub fn export_rows(report: &Report) -> Vec<ExportRow> {
    let social = |platform| report.socials.get(platform).unwrap_or_default().to_string();
    let base = ExportRow {
        company: report.organization.name.clone(),
        domain: report.organization.domain.clone().unwrap_or_default(),
        website: report.website.clone().unwrap_or_default(),
        category: report.category.clone(),
        executive_name: String::new(),
        executive_title: String::new(),
        executive_title_text: String::new(),
        executive_source: String::new(),
        executive_linkedin: String::new(),
        instagram: social(SocialPlatform::Instagram),
        facebook: social(SocialPlatform::Facebook),
        linkedin: social(SocialPlatform::Linkedin),
        twitter: social(SocialPlatform::Twitter),
        youtube: social(SocialPlatform::Youtube),
        emails: report.contacts.emails.join("; "),
        phones: report.contacts.phones.join("; "),
        addresses: report
            .contacts
            .addresses
            .iter()
            .map(|a| a.value.as_str())
            .collect::<Vec<&str>>()
            .join("; "),
        synopsis: report.summary.synopsis.clone(),
        generated_at: report.generated_at.to_rfc3339(),
        is_executive: false,
    };

    if report.executives.is_empty() {
        return vec![base];
    }

    report
        .executives
        .iter()
        .map(|e| ExportRow {
            executive_name: e.name.clone(),
            executive_title: e.title.label().to_string(),
            executive_title_text: e.title_text.clone(),
            executive_source: e.source_page.clone(),
            executive_linkedin: e.linkedin.clone().unwrap_or_default(),
            is_executive: true,
            ..base.clone()
        })
        .collect()
}

pub fn to_csv(reports: &[Report]) -> Result<Export, ExportError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    let mut records = 0;

    for row in reports.iter().flat_map(export_rows) {
        if row.is_executive {
            records += 1;
        }
        writer.serialize(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;

    Ok(Export { bytes, records })
}

pub fn to_pdf(reports: &[Report]) -> Result<Export, ExportError> {
    let mut canvas = PdfCanvas::new("Company profiles")?;
    let mut records = 0;

    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            canvas.new_page();
        }
        records += draw_report(&mut canvas, report);
    }

    let bytes = canvas
        .doc
        .save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    Ok(Export { bytes, records })
}

fn draw_report(canvas: &mut PdfCanvas, report: &Report) -> usize {
    let rows = export_rows(report);
    let Some(first) = rows.first() else {
        return 0;
    };

    let heading = match first.company.is_empty() {
        true => first.domain.as_str(),
        false => first.company.as_str(),
    };
    canvas.heading(heading);
    canvas.line(&format!("Domain: {}", first.domain));
    canvas.line(&format!("Website: {}", first.website));
    canvas.line(&format!("Category: {}", first.category));
    canvas.gap();

    canvas.bold_line("Executives:");
    let mut records = 0;
    for row in rows.iter().filter(|r| r.is_executive) {
        let mut text = format!("  - {} - {}", row.executive_name, row.executive_title_text);
        if !row.executive_linkedin.is_empty() {
            text.push_str(&format!("  {}", row.executive_linkedin));
        }
        canvas.wrapped(&text);
        records += 1;
    }
    if records == 0 {
        canvas.line("  (none found on official pages)");
    }
    canvas.gap();

    canvas.bold_line("Contacts:");
    for email in &report.contacts.emails {
        canvas.line(&format!("  Email: {}", email));
    }
    for phone in &report.contacts.phones {
        canvas.line(&format!("  Phone: {}", phone));
    }
    for address in &report.contacts.addresses {
        canvas.wrapped(&format!("  Address: {}", address.value));
    }
    for (platform, url) in &report.socials.links {
        canvas.line(&format!("  {}: {}", platform.label(), url));
    }
    canvas.gap();

    if !first.synopsis.trim().is_empty() {
        canvas.bold_line("Summary:");
        canvas.wrapped(&first.synopsis);
    }

    records
}

/// A4 page cursor that starts a new page when the current one is full.
struct PdfCanvas {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfCanvas {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(PdfCanvas {
            doc,
            font,
            bold,
            layer,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn write(&mut self, text: &str, size: f32, bold: bool, advance: f32) {
        if self.y - advance < MARGIN {
            self.new_page();
        }
        let font = match bold {
            true => &self.bold,
            false => &self.font,
        };
        self.layer
            .use_text(win_ansi_safe(text), size, Mm(MARGIN), Mm(self.y), font);
        self.y -= advance;
    }

    fn heading(&mut self, text: &str) {
        self.write(text, 16.0, true, LINE_HEIGHT * 1.6);
    }

    fn bold_line(&mut self, text: &str) {
        self.write(text, 11.0, true, LINE_HEIGHT);
    }

    fn line(&mut self, text: &str) {
        self.write(text, 10.0, false, LINE_HEIGHT);
    }

    fn wrapped(&mut self, text: &str) {
        for part in wrap(text, WRAP_COLUMNS) {
            self.line(&part);
        }
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }
}

/// Built-in PDF fonts are WinAnsi encoded, and characters outside that code
/// page are silently dropped when the text is written. Keep what WinAnsi can
/// show, fold common Central European letters to their base letter, and mark
/// anything else with '?' so names never lose characters without a trace.
fn win_ansi_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c,
            '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž' | '‘'
            | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ' | 'ž' | 'Ÿ' => c,
            c if c.is_whitespace() => ' ',
            c => fold_latin_extended(c).unwrap_or('?'),
        })
        .collect()
}

fn fold_latin_extended(c: char) -> Option<char> {
    let folded = match c {
        'Ā' | 'Ă' | 'Ą' => 'A',
        'ā' | 'ă' | 'ą' => 'a',
        'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' | 'Đ' => 'D',
        'ď' | 'đ' => 'd',
        'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ī' | 'Į' | 'İ' => 'I',
        'ī' | 'į' | 'ı' => 'i',
        'Ķ' => 'K',
        'ķ' => 'k',
        'Ĺ' | 'Ļ' | 'Ľ' | 'Ł' => 'L',
        'ĺ' | 'ļ' | 'ľ' | 'ł' => 'l',
        'Ń' | 'Ņ' | 'Ň' => 'N',
        'ń' | 'ņ' | 'ň' => 'n',
        'Ō' | 'Ő' => 'O',
        'ō' | 'ő' => 'o',
        'Ŕ' | 'Ř' => 'R',
        'ŕ' | 'ř' => 'r',
        'Ś' | 'Ş' | 'Ș' => 'S',
        'ś' | 'ş' | 'ș' => 's',
        'Ţ' | 'Ť' | 'Ț' => 'T',
        'ţ' | 'ť' | 'ț' => 't',
        'Ū' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ū' | 'ů' | 'ű' | 'ų' => 'u',
        'Ź' | 'Ż' => 'Z',
        'ź' | 'ż' => 'z',
        _ => return None,
    };
    Some(folded)
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
