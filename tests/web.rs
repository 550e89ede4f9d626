use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum_test::{TestResponse, TestServer, TestServerConfig};
use tempfile::TempDir;

use benshi::api;
use benshi::config::{AdminConfig, Config};
use benshi::database::{Database, DatabaseConfig};
use benshi::model::Video;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "hunter2";

struct TestApp {
    server: TestServer,
    database: Database,
    media_root: TempDir,
}

impl TestApp {
    /// Fresh application over an in-memory database and a temporary
    /// media root, with the staff account seeded.
    async fn spawn() -> TestApp {
        let media_root = tempfile::tempdir().expect("create media root");
        let database = Database::memory().await.expect("connect in-memory database");

        let config = Config {
            host: "127.0.0.1:0".parse().expect("parse host address"),
            surreal: DatabaseConfig::memory(),
            media_root: media_root.path().to_path_buf(),
            log_dir: "logs".into(),
            session_secret: "test-secret".to_string(),
            admin: Some(AdminConfig {
                username: ADMIN_USERNAME.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            max_upload_bytes: 32 * 1024 * 1024,
        };

        let app = api::create_app(&config, database.clone()).expect("create app");
        app.auth
            .seed_admin(config.admin.as_ref().expect("admin config"))
            .await
            .expect("seed staff user");

        let router = api::create_router(&config, app);

        let server = TestServer::new_with_config(
            router,
            TestServerConfig {
                save_cookies: true,
                ..TestServerConfig::default()
            },
        )
        .expect("start test server");

        TestApp {
            server,
            database,
            media_root,
        }
    }

    async fn login(&self) {
        let response = self
            .server
            .post("/admin-login/")
            .text(format!(
                "username={ADMIN_USERNAME}&password={ADMIN_PASSWORD}"
            ))
            .content_type("application/x-www-form-urlencoded")
            .await;

        assert_eq!(
            response.status_code(),
            StatusCode::SEE_OTHER,
            "login should redirect to the dashboard"
        );
    }

    async fn post_form(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        self.server
            .post(path)
            .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
            .bytes(Bytes::from(multipart_body(parts)))
            .await
    }

    /// Upload a video through the real create flow.
    async fn create_video(&self, title: &str) -> TestResponse {
        self.post_form(
            "/admin-dashboard/upload/",
            &[
                Part::text("title", title),
                Part::file("video_file", "clip.mp4", "video/mp4", b"fake video bytes"),
                Part::file("thumbnail_file", "cover.png", "image/png", b"fake image"),
            ],
        )
        .await
    }

    async fn videos(&self) -> Vec<Video> {
        Video::all_recent(&self.database).await.expect("list videos")
    }

    /// Filesystem path behind a stored media url.
    fn media_path(&self, url: &str) -> std::path::PathBuf {
        let relative = url.strip_prefix("/media/").expect("a media url");
        self.media_root.path().join(relative)
    }

    fn video_dir_entries(&self) -> usize {
        match std::fs::read_dir(self.media_root.path().join("videos")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

const BOUNDARY: &str = "xBenshiFormBoundary";

enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl<'a> Part<'a> {
    fn text(name: &'a str, value: &'a str) -> Part<'a> {
        Part::Text { name, value }
    }

    fn file(name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Part<'a> {
        Part::File {
            name,
            filename,
            content_type,
            bytes,
        }
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("a location header")
        .to_str()
        .expect("an ascii location")
        .to_string()
}

#[tokio::test]
async fn dashboard_requires_a_session() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/admin-dashboard/").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login/");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::spawn().await;

    let response = app
        .server
        .post("/admin-login/")
        .text(format!("username={ADMIN_USERNAME}&password=wrong"))
        .content_type("application/x-www-form-urlencoded")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(
        response.text().contains("Invalid username or password."),
        "the form should re-render with the generic message"
    );

    // no session was handed out
    let dashboard = app.server.get("/admin-dashboard/").await;
    assert_eq!(dashboard.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app.server.get("/admin-logout/").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login/");

    let dashboard = app.server.get("/admin-dashboard/").await;
    assert_eq!(
        dashboard.status_code(),
        StatusCode::SEE_OTHER,
        "the cleared cookie must no longer grant access"
    );
}

#[tokio::test]
async fn creating_a_video_stores_record_and_files() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app.create_video("Sea Breeze").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard/");

    let videos = app.videos().await;
    assert_eq!(videos.len(), 1);

    let video = &videos[0];
    assert_eq!(video.title, "Sea Breeze");
    assert_eq!(video.views, 0);
    assert!(
        video.video_url.starts_with("/media/videos/") && video.video_url.ends_with(".mp4"),
        "unexpected video url {}",
        video.video_url
    );

    let thumbnail_url = video.thumbnail_url.as_deref().expect("a thumbnail url");
    assert!(
        thumbnail_url.starts_with("/media/thumbnails/videohosting_videos/")
            && thumbnail_url.ends_with(".png"),
        "unexpected thumbnail url {thumbnail_url}"
    );

    assert_eq!(
        std::fs::read(app.media_path(&video.video_url)).expect("video on disk"),
        b"fake video bytes"
    );
    assert!(app.media_path(thumbnail_url).is_file());

    // uploaded files are served back under their stored urls
    let served = app.server.get(&video.video_url).await;
    assert_eq!(served.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn creating_without_a_video_file_is_rejected() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .post_form(
            "/admin-dashboard/upload/",
            &[
                Part::text("title", "No Video"),
                Part::file("thumbnail_file", "cover.png", "image/png", b"fake image"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("A video file is required."));

    assert!(app.videos().await.is_empty(), "no record may be created");
    assert_eq!(app.video_dir_entries(), 0, "no file may be written");
}

#[tokio::test]
async fn creating_without_a_thumbnail_is_rejected() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .post_form(
            "/admin-dashboard/upload/",
            &[
                Part::text("title", "No Thumbnail"),
                Part::file("video_file", "clip.mp4", "video/mp4", b"fake video bytes"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("A thumbnail image is required."));

    assert!(app.videos().await.is_empty());
    assert_eq!(app.video_dir_entries(), 0);
}

#[tokio::test]
async fn creating_with_a_disallowed_thumbnail_format_is_rejected_before_any_write() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .post_form(
            "/admin-dashboard/upload/",
            &[
                Part::text("title", "Bad Cover"),
                Part::file("video_file", "clip.mp4", "video/mp4", b"fake video bytes"),
                Part::file("thumbnail_file", "cover.gif", "image/gif", b"fake image"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("unsupported thumbnail format"));

    assert!(app.videos().await.is_empty());
    assert_eq!(
        app.video_dir_entries(),
        0,
        "the video file must not be written when the thumbnail is rejected"
    );
}

#[tokio::test]
async fn editing_only_the_title_leaves_files_alone() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Old Title").await;

    let before = app.videos().await.remove(0);

    // empty file parts, as a browser submits for untouched inputs
    let response = app
        .post_form(
            &format!("/admin-dashboard/edit/{}/", before.key()),
            &[
                Part::text("title", "New Title"),
                Part::file("video_file", "", "application/octet-stream", b""),
                Part::file("thumbnail_file", "", "application/octet-stream", b""),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let after = app.videos().await.remove(0);
    assert_eq!(after.title, "New Title");
    assert_eq!(after.video_url, before.video_url);
    assert_eq!(after.thumbnail_url, before.thumbnail_url);
    assert_eq!(after.upload_time, before.upload_time);
    assert!(app.media_path(&after.video_url).is_file());
}

#[tokio::test]
async fn editing_with_a_new_video_file_replaces_it() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Replace Me").await;

    let before = app.videos().await.remove(0);

    let response = app
        .post_form(
            &format!("/admin-dashboard/edit/{}/", before.key()),
            &[
                Part::text("title", "Replace Me"),
                Part::file("video_file", "better.mov", "video/quicktime", b"better bytes"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let after = app.videos().await.remove(0);
    assert_ne!(after.video_url, before.video_url);
    assert!(
        after.video_url.ends_with(".mov"),
        "the new extension is taken from the upload, got {}",
        after.video_url
    );
    assert_eq!(
        after.thumbnail_url, before.thumbnail_url,
        "the thumbnail must be untouched"
    );

    assert!(
        !app.media_path(&before.video_url).exists(),
        "the replaced video file must be removed"
    );
    assert_eq!(
        std::fs::read(app.media_path(&after.video_url)).expect("new video on disk"),
        b"better bytes"
    );
    assert!(app
        .media_path(before.thumbnail_url.as_deref().expect("a thumbnail"))
        .is_file());
}

#[tokio::test]
async fn deleting_removes_the_row_and_both_files() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Doomed").await;

    let video = app.videos().await.remove(0);

    let response = app
        .server
        .post(&format!("/admin-dashboard/delete/{}/", video.key()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["deleted_files"], 2);
    assert_eq!(body["title"], "Doomed");
    assert_eq!(body["video_id"], video.key());

    assert!(app.videos().await.is_empty());
    assert!(!app.media_path(&video.video_url).exists());
}

#[tokio::test]
async fn deleting_tolerates_files_already_missing() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Half Gone").await;

    let video = app.videos().await.remove(0);
    std::fs::remove_file(app.media_path(&video.video_url)).expect("drop the video file");

    let response = app
        .server
        .post(&format!("/admin-dashboard/delete/{}/", video.key()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["deleted_files"], 1,
        "only the file actually present may be counted"
    );

    assert!(
        app.videos().await.is_empty(),
        "the row is removed even when files are gone"
    );
}

#[tokio::test]
async fn deleting_an_unknown_id_is_not_found() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .server
        .post("/admin-dashboard/delete/does-not-exist/")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn deleting_with_the_wrong_method_is_rejected() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Stays").await;

    let video = app.videos().await.remove(0);

    let response = app
        .server
        .get(&format!("/admin-dashboard/delete/{}/", video.key()))
        .await;

    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(app.videos().await.len(), 1, "nothing may be deleted");
}

#[tokio::test]
async fn watching_increments_views_by_one() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Popular").await;
    app.create_video("Ignored").await;

    let popular = app
        .videos()
        .await
        .into_iter()
        .find(|video| video.title == "Popular")
        .expect("the created video");

    let response = app
        .server
        .get(&format!("/watch/{}/", popular.filename()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Popular"));
    assert!(body.contains("1 views"));

    let after = app.videos().await;
    let popular_views = after
        .iter()
        .find(|video| video.title == "Popular")
        .expect("popular")
        .views;
    let ignored_views = after
        .iter()
        .find(|video| video.title == "Ignored")
        .expect("ignored")
        .views;

    assert_eq!(popular_views, 1, "exactly one increment per watch");
    assert_eq!(ignored_views, 0, "other records are untouched");

    app.server
        .get(&format!("/watch/{}/", popular.filename()))
        .await;

    let watched_twice = app
        .videos()
        .await
        .into_iter()
        .find(|video| video.title == "Popular")
        .expect("popular");
    assert_eq!(watched_twice.views, 2);
}

#[tokio::test]
async fn watching_an_unknown_filename_is_not_found_without_side_effects() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Untouched").await;

    let response = app.server.get("/watch/unknown.mp4/").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("does not exist"));

    let video = app.videos().await.remove(0);
    assert_eq!(video.views, 0, "a missed watch must not count anywhere");
}

#[tokio::test]
async fn dashboard_searches_titles_case_insensitively() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.create_video("Alpha Trip").await;
    app.create_video("Beta Ride").await;

    let response = app.server.get("/admin-dashboard/").add_query_param("q", "ALPHA").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Alpha Trip"));
    assert!(
        !body.contains("Beta Ride"),
        "non-matching titles must be filtered out"
    );
    assert!(
        body.contains("of video storage used"),
        "the storage summary is always rendered"
    );
}

