//! Translate route - upload a .docx, get the translated .docx back as JSON.

use axum::{extract::State, Json};
use axum_extra::extract::{multipart::Field, Multipart};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docx_translator_core::{translated_file_name, Lang, RenderMode};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::TranslateResponse;
use crate::helpers::{ApiError, ResultExt, RouteResult};
use crate::state::AppState;

/// Translate an uploaded document.
///
/// Multipart fields: `file` (required), `targetLanguage` and `bilingual`
/// (both optional, falling back to the server configuration). The upload is
/// spooled to a temporary file that is removed when the request ends,
/// whatever the outcome.
pub async fn translate_docx(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Json<TranslateResponse>> {
    let request_id = Uuid::new_v4();
    let mut upload: Option<(String, NamedTempFile)> = None;
    let mut target_lang: Option<String> = None;
    let mut bilingual: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await.or_upload_error()? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document.docx").to_string();
                let spool = spool_upload(&mut field).await?;
                upload = Some((filename, spool));
            }
            "targetLanguage" => target_lang = Some(field.text().await.or_upload_error()?),
            "bilingual" => bilingual = Some(field.text().await.or_upload_error()?),
            other => debug!("[{}] Ignoring multipart field '{}'", request_id, other),
        }
    }

    let (filename, spool) =
        upload.ok_or_else(|| ApiError::Upload("No file uploaded".to_string()))?;

    let target_lang = target_lang
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map_or_else(|| state.config.target_lang.clone(), Lang::new);

    let render_mode = match bilingual {
        Some(flag) => RenderMode::from_flag(&flag).or_upload_error()?,
        None => state.config.render_mode,
    };

    let data = tokio::fs::read(spool.path()).await.or_upload_error()?;
    info!(
        "[{}] Translating {} ({} bytes) to {} ({})",
        request_id,
        filename,
        data.len(),
        target_lang,
        render_mode
    );

    let translator = state.create_translator(target_lang.clone(), render_mode)?;
    let result = translator.translate_document(&data).await?;

    info!(
        "[{}] Translated {} paragraphs{}",
        request_id,
        result.paragraph_count,
        if result.from_cache { " (cached)" } else { "" }
    );

    Ok(Json(TranslateResponse {
        translated_doc: STANDARD.encode(&result.bytes),
        filename: translated_file_name(&filename, &target_lang, render_mode),
        paragraphs: result.paragraph_count,
        mode: render_mode.as_str(),
    }))
}

/// Stream a multipart field into a temporary file.
async fn spool_upload(field: &mut Field) -> RouteResult<NamedTempFile> {
    let spool = NamedTempFile::new().or_upload_error()?;
    let mut out = tokio::fs::File::from_std(spool.reopen().or_upload_error()?);

    while let Some(chunk) = field.chunk().await.or_upload_error()? {
        out.write_all(&chunk).await.or_upload_error()?;
    }
    out.flush().await.or_upload_error()?;

    Ok(spool)
}
