use analyst_core::Task;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Conventional name of the upload field carrying the task.
pub const TASK_FIELD: &str = "question_file";

/// Run the uploaded task through the pipeline and return its answers.
///
/// The first file field is the task; its name is not checked. If the client goes away the
/// request future is dropped and the pipeline is cancelled with it.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let text = read_task(&mut multipart).await?;
    let task = Task::new(text);
    info!(task_id = %task.id, bytes = task.text.len(), "Received task");

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let output = state.pipeline.run_until_cancelled(&task, cancel).await?;
    guard.disarm();

    Ok(Json(output.body))
}

async fn read_task(multipart: &mut Multipart) -> ApiResult<String> {
    while let Some(field) = multipart.next_field().await? {
        let is_task = field.file_name().is_some() || field.name() == Some(TASK_FIELD);
        if !is_task {
            debug!(field = ?field.name(), "Skipping non-file field");
            continue;
        }

        let bytes = field.bytes().await?;
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::BadRequest("task file is not valid UTF-8".to_string()));
    }

    Err(ApiError::BadRequest(format!(
        "no task file in upload, expected a file field such as `{}`",
        TASK_FIELD
    )))
}
