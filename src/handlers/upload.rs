use axum::extract::{Multipart, State};
use axum::response::Redirect;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::Ledger;
use crate::services::csv_parser::parse_csv;
use crate::state::AppState;

/// Multipart field carrying the CSV export.
pub const FILE_FIELD: &str = "file";

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Redirect> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::CsvParse(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload.csv".to_string());

        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::CsvParse(e.to_string()))?
            .to_vec();

        debug!(file_name = %file_name, size_bytes = content.len(), "Received CSV file");
        upload = Some((file_name, content));
    }

    let (file_name, content) = match upload {
        Some((name, content)) if !content.is_empty() => (name, content),
        _ => {
            warn!("Upload without a file");
            return Err(AppError::Validation("No file uploaded".into()));
        }
    };

    let result = parse_csv(&content)?;

    info!(
        file_name = %file_name,
        rows = result.transactions.len(),
        skipped = result.errors.len(),
        "Loaded transactions"
    );

    let ledger = Ledger::new(file_name, result.transactions, result.errors);
    if ledger.is_empty() {
        warn!(file_name = %ledger.source_name, "Upload contained no usable rows");
    }
    state.replace_ledger(ledger);

    Ok(Redirect::to("/"))
}

pub async fn reset(State(state): State<AppState>) -> Redirect {
    info!("Clearing loaded transactions");
    state.clear_ledger();
    Redirect::to("/")
}
