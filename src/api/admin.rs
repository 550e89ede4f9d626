use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;
use axum_template::RenderHtml;
use serde_json::json;
use tracing::instrument;

use super::error::{DatabaseSnafu, Result, UploadFormSnafu, VideoNotFoundSnafu};
use super::state::App;
use crate::auth::AdminSession;
use crate::model::Video;
use crate::prelude::*;
use crate::storage::{readable_size, thumbnail_extension, StorageError};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[instrument(skip(app))]
pub async fn login_page(State(app): State<App>) -> Response {
    render_login(&app, None)
}

#[instrument(skip(app, jar, form), fields(username = %form.username))]
pub async fn login(
    State(app): State<App>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match app.auth.signin(&form.username, &form.password).await {
        Ok(user) => user,
        Err(_) => {
            tracing::warn!(username = %form.username, "failed admin login");
            return render_login(&app, Some("Invalid username or password."));
        }
    };

    match app.auth.session_cookie(&user) {
        Ok(cookie) => (jar.add(cookie), Redirect::to("/admin-dashboard/")).into_response(),
        Err(error) => {
            tracing::error!(%error, "could not issue a session");
            render_login(&app, Some("Login failed, please retry."))
        }
    }
}

#[instrument(skip(app, jar))]
pub async fn logout(State(app): State<App>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(app.auth.removal_cookie()),
        Redirect::to("/admin-login/"),
    )
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct DashboardPage {
    videos: Vec<VideoRow>,
    search_query: String,
    total_video_count: usize,
    total_storage_used: String,
}

#[derive(Debug, Serialize)]
struct VideoRow {
    id: String,
    filename: String,
    upload_time: String,
    title: String,
    video_url: String,
    thumbnail_url: Option<String>,
    views: i64,
}

impl From<Video> for VideoRow {
    fn from(video: Video) -> Self {
        VideoRow {
            id: video.key(),
            filename: video.filename().to_string(),
            upload_time: video.upload_time.format("%Y-%m-%d %H:%M").to_string(),
            title: video.title,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            views: video.views,
        }
    }
}

#[instrument(skip(app, session), fields(admin = %session.username))]
pub async fn dashboard(
    session: AdminSession,
    State(app): State<App>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let videos = if query.q.is_empty() {
        Video::all_recent(&app.database).await
    } else {
        Video::search(query.q.clone(), &app.database).await
    }
    .context(DatabaseSnafu)?;

    let page = DashboardPage {
        total_video_count: videos.len(),
        videos: videos.into_iter().map(VideoRow::from).collect(),
        search_query: query.q,
        total_storage_used: readable_size(app.media.video_storage_size().await),
    };

    Ok(RenderHtml("admin_dashboard.html", app.engine.clone(), page).into_response())
}

#[instrument(skip(app, session), fields(admin = %session.username))]
pub async fn edit_page(
    session: AdminSession,
    State(app): State<App>,
    id: Option<Path<String>>,
) -> Result<Response> {
    let video = match id {
        Some(Path(id)) => Some(find_video(&app, &id).await?),
        None => None,
    };

    Ok(render_edit(&app, video.as_ref(), None))
}

/// Create-or-update entry point: mounted on both the upload route (no
/// id) and the edit route (id in the path).
#[instrument(skip(app, session, multipart), fields(admin = %session.username))]
pub async fn save(
    session: AdminSession,
    State(app): State<App>,
    id: Option<Path<String>>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;

    match id {
        Some(Path(id)) => {
            let video = find_video(&app, &id).await?;
            update_video(&app, video, form).await
        }
        None => create_video(&app, form).await,
    }
}

#[instrument(skip(app, session), fields(admin = %session.username))]
pub async fn delete(
    session: AdminSession,
    State(app): State<App>,
    Path(id): Path<String>,
) -> Response {
    let video = match Video::find(&id, &app.database).await {
        Ok(Some(video)) => video,
        Ok(None) => return error_json(StatusCode::NOT_FOUND),
        Err(error) => {
            tracing::error!(%error, "could not look up the video");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if let Err(error) = video.delete(&app.database).await {
        tracing::error!(%error, "could not delete the video record");
        return error_json(StatusCode::INTERNAL_SERVER_ERROR);
    }

    // the row is gone; file removal is best-effort and only counted
    let mut deleted_files = 0;
    if app.media.remove(&video.video_url).await {
        deleted_files += 1;
    }
    if let Some(thumbnail_url) = &video.thumbnail_url {
        if app.media.remove(thumbnail_url).await {
            deleted_files += 1;
        }
    }

    tracing::info!(video_id = %video.id, title = %video.title, deleted_files, "video deleted");

    Json(json!({
        "status": "success",
        "deleted_files": deleted_files,
        "video_id": video.key(),
        "title": video.title,
    }))
    .into_response()
}

/// The delete route accepts nothing but POST.
pub async fn method_not_allowed() -> Response {
    error_json(StatusCode::METHOD_NOT_ALLOWED)
}

fn error_json(status: StatusCode) -> Response {
    (status, Json(json!({ "status": "error" }))).into_response()
}

async fn create_video(app: &App, form: UploadForm) -> Result<Response> {
    let Some(video_file) = &form.video else {
        return Ok(render_edit(app, None, Some("A video file is required.")));
    };
    let Some(thumbnail_file) = &form.thumbnail else {
        return Ok(render_edit(app, None, Some("A thumbnail image is required.")));
    };

    // the thumbnail format is checked before anything is written
    if let Err(error) = thumbnail_extension(&thumbnail_file.name) {
        return Ok(render_edit(app, None, Some(upload_message(&error).as_str())));
    }

    let video_url = match app
        .media
        .save_video(&form.title, &video_file.name, &video_file.bytes)
        .await
    {
        Ok(url) => url,
        Err(error) => return Ok(render_edit(app, None, Some(upload_message(&error).as_str()))),
    };

    let thumbnail_url = match app
        .media
        .save_thumbnail(&form.title, &thumbnail_file.name, &thumbnail_file.bytes)
        .await
    {
        Ok(url) => url,
        Err(error) => return Ok(render_edit(app, None, Some(upload_message(&error).as_str()))),
    };

    let video = Video::new(form.title, video_url, Some(thumbnail_url));

    if let Err(error) = video.create(&app.database).await {
        tracing::error!(%error, "could not insert the video record");

        // don't leave freshly written files behind a failed insert
        app.media.remove(&video.video_url).await;
        if let Some(thumbnail_url) = &video.thumbnail_url {
            app.media.remove(thumbnail_url).await;
        }

        return Ok(render_edit(app, None, Some("Saving failed, please retry.")));
    }

    Ok(Redirect::to("/admin-dashboard/").into_response())
}

async fn update_video(app: &App, mut video: Video, form: UploadForm) -> Result<Response> {
    video.title = form.title;

    if let Some(upload) = &form.video {
        let url = match app
            .media
            .save_video(&video.title, &upload.name, &upload.bytes)
            .await
        {
            Ok(url) => url,
            Err(error) => {
                return Ok(render_edit(app, Some(&video), Some(upload_message(&error).as_str())))
            }
        };

        let previous = std::mem::replace(&mut video.video_url, url);
        app.media.remove(&previous).await;
    }

    if let Some(upload) = &form.thumbnail {
        let url = match app
            .media
            .save_thumbnail(&video.title, &upload.name, &upload.bytes)
            .await
        {
            Ok(url) => url,
            Err(error) => {
                return Ok(render_edit(app, Some(&video), Some(upload_message(&error).as_str())))
            }
        };

        if let Some(previous) = video.thumbnail_url.replace(url) {
            app.media.remove(&previous).await;
        }
    }

    if let Err(error) = video.update(&app.database).await {
        tracing::error!(%error, "could not update the video record");
        return Ok(render_edit(app, Some(&video), Some("Saving failed, please retry.")));
    }

    Ok(Redirect::to("/admin-dashboard/").into_response())
}

#[derive(Debug, Default)]
struct UploadForm {
    title: String,
    video: Option<UploadedFile>,
    thumbnail: Option<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    name: String,
    bytes: axum::body::Bytes,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.context(UploadFormSnafu)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => form.title = field.text().await.context(UploadFormSnafu)?,
            "video_file" | "thumbnail_file" => {
                let file = UploadedFile {
                    name: field.file_name().unwrap_or_default().to_string(),
                    bytes: field.bytes().await.context(UploadFormSnafu)?,
                };

                // browsers submit an empty part for an untouched file input
                if !file.bytes.is_empty() {
                    if name == "video_file" {
                        form.video = Some(file);
                    } else {
                        form.thumbnail = Some(file);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn find_video(app: &App, id: &str) -> Result<Video> {
    Video::find(id, &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(VideoNotFoundSnafu { id })
}

fn upload_message(error: &StorageError) -> String {
    if error.is_validation() {
        error.to_string()
    } else {
        tracing::error!(%error, "file placement failed");
        "The upload could not be saved, please retry.".to_string()
    }
}

fn render_login(app: &App, error: Option<&str>) -> Response {
    RenderHtml(
        "admin_login.html",
        app.engine.clone(),
        json!({ "error": error }),
    )
    .into_response()
}

fn render_edit(app: &App, video: Option<&Video>, error: Option<&str>) -> Response {
    let video = video.cloned().map(VideoRow::from);

    RenderHtml(
        "admin_video_edit.html",
        app.engine.clone(),
        json!({ "video": video, "error": error }),
    )
    .into_response()
}
