use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Form, Json, Router,
};
use bytes::Bytes;
use tracing::instrument;

use crate::{
    error::{ApiError, ApiResult},
    qa::dto::{AskForm, IngestReceipt, QaAnswer},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rag/upload_pdf/", post(upload_pdf))
        .route("/rag/ask_question/", post(ask_question))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state, multipart))]
async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestReceipt>> {
    let mut upload: Option<(String, Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A truncated or corrupt stream is the caller's problem, not a
            // missing field.
            Err(_) => return Err(ApiError::BadRequest("Could not read uploaded file".into())),
        };
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("upload.pdf")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::BadRequest("Could not read uploaded file".into()))?;
            upload = Some((filename, data));
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("file field is required".into()))?;

    let receipt = state.qa.ingest_pdf(&filename, data).await?;
    Ok(Json(receipt))
}

#[instrument(skip(state, form))]
async fn ask_question(
    State(state): State<AppState>,
    Form(form): Form<AskForm>,
) -> ApiResult<Json<QaAnswer>> {
    let answer = state.qa.ask(&form.question).await?;
    Ok(Json(answer))
}
