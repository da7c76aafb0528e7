use actix_multipart::{Multipart, MultipartError};
use actix_web::{http::StatusCode, post, web, HttpResponse};
use futures::StreamExt;

use crate::{
    configuration::ApplicationSettings, domain::organization::Organization,
    services::ProfileBuilder,
};

use super::{error_with_detail, json_error};

#[derive(Default)]
struct BulkForm {
    file: Vec<u8>,
    list: String,
}

impl BulkForm {
    /// An uploaded file wins over the pasted list.
    fn organizations(&self) -> Vec<Organization> {
        let rows = match self.file.is_empty() {
            false => parse_rows(&String::from_utf8_lossy(&self.file), true),
            true => parse_rows(&self.list, false),
        };

        rows.into_iter()
            .map(|(company, domain)| Organization::new(&company, &domain))
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[post("/bulk")]
pub async fn bulk(
    builder: web::Data<ProfileBuilder>,
    settings: web::Data<ApplicationSettings>,
    payload: Multipart,
) -> HttpResponse {
    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => {
            log::warn!("Rejected bulk upload: {}", e);
            return error_with_detail(
                StatusCode::BAD_REQUEST,
                &settings,
                "Could not read the uploaded rows.",
                &e,
            );
        }
    };

    let organizations = form.organizations();
    if organizations.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "No valid rows found.");
    }

    let limit = builder.bulk_limit();
    if organizations.len() > limit {
        return json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("Too many rows. Limit is {}.", limit),
        );
    }

    log::info!("Building {} profiles in bulk", organizations.len());
    let reports = builder.build_reports(organizations).await;
    HttpResponse::Ok().json(reports)
}

async fn read_form(mut payload: Multipart) -> Result<BulkForm, MultipartError> {
    let mut form = BulkForm::default();

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let name = field.name().unwrap_or_default().to_string();

        let mut bytes = vec![];
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        match name.as_str() {
            "file" => form.file = bytes,
            "list" => form.list = String::from_utf8_lossy(&bytes).into_owned(),
            _ => {}
        }
    }

    Ok(form)
}

/// Reads `company,domain` rows. A header row naming either column is honoured
/// when `detect_header` is set; otherwise each line is `company[,domain]`.
pub fn parse_rows(text: &str, detect_header: bool) -> Vec<(String, String)> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut columns = (0, 1);
    let mut rows = vec![];

    for (index, record) in reader.records().enumerate() {
        let Ok(record) = record else { continue };

        if index == 0 && detect_header {
            if let Some(header) = header_columns(&record) {
                columns = header;
                continue;
            }
        }

        let company = field_at(&record, columns.0);
        let domain = field_at(&record, columns.1);
        if !company.is_empty() || !domain.is_empty() {
            rows.push((company, domain));
        }
    }

    rows
}

fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    match (first_line.contains(','), first_line.contains(';')) {
        (false, true) => b';',
        _ => b',',
    }
}

fn header_columns(record: &csv::StringRecord) -> Option<(usize, usize)> {
    let position = |name: &str| record.iter().position(|h| h.eq_ignore_ascii_case(name));
    match (position("company"), position("domain")) {
        (None, None) => None,
        (company, domain) => Some((
            company.unwrap_or(usize::MAX),
            domain.unwrap_or(usize::MAX),
        )),
    }
}

fn field_at(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().trim().to_string()
}
