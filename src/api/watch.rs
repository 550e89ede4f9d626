use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_template::RenderHtml;
use serde_json::json;
use tracing::instrument;

use super::error::{DatabaseSnafu, Result};
use super::state::App;
use crate::model::Video;
use crate::prelude::*;

/// Public watch page. The video is resolved by the trailing segment of
/// its stored url, and the view counter is bumped in the same statement;
/// an unknown filename has no side effects.
#[instrument(skip(app))]
pub async fn watch(State(app): State<App>, Path(filename): Path<String>) -> Result<Response> {
    let suffix = format!("/{filename}");

    let Some(video) = Video::watch(suffix, &app.database)
        .await
        .context(DatabaseSnafu)?
    else {
        return Ok((
            StatusCode::NOT_FOUND,
            "This video does not exist or the link is wrong.",
        )
            .into_response());
    };

    Ok(RenderHtml(
        "watch_video.html",
        app.engine.clone(),
        json!({
            "video": {
                "title": video.title,
                "video_url": video.video_url,
                "thumbnail_url": video.thumbnail_url,
                "views": video.views,
            }
        }),
    )
    .into_response())
}
