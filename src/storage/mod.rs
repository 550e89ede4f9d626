use std::path::{Path, PathBuf};

use derive_new::new;
use snafu::{Location, ResultExt, Snafu};

use crate::model::{now, Timestamp};

/// Url prefix the media tree is served under.
pub const MEDIA_URL: &str = "/media/";

const VIDEO_DIR: &str = "videos";
const THUMBNAIL_DIR: &str = "thumbnails/videohosting_videos";

/// Image formats accepted for thumbnails.
const THUMBNAIL_FORMATS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Extension assumed for video uploads whose client name has none.
const DEFAULT_VIDEO_EXT: &str = "mp4";

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display(
        "unsupported thumbnail format `{extension}`, only jpg, jpeg and png are accepted"
    ))]
    UnsupportedThumbnail {
        extension: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not create media directory `{}`", path.display()))]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not write uploaded file `{}`", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl StorageError {
    /// Rejections raised before anything touches the disk.
    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::UnsupportedThumbnail { .. })
    }
}

/// Checks a thumbnail client filename against the allow-list without
/// writing anything, returning the normalized extension.
pub fn thumbnail_extension(client_name: &str) -> Result<String> {
    let extension = extension(client_name).unwrap_or_default().to_lowercase();

    if THUMBNAIL_FORMATS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        UnsupportedThumbnailSnafu { extension }.fail()
    }
}

/// Places uploaded files under the media root and hands back the
/// root-relative urls stored on [crate::model::Video] records.
#[derive(Debug, Clone, new)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Save a video upload. The extension is taken from the client
    /// filename as-is; a name without one falls back to `mp4`.
    pub async fn save_video(&self, title: &str, client_name: &str, bytes: &[u8]) -> Result<String> {
        let extension =
            extension(client_name).unwrap_or_else(|| DEFAULT_VIDEO_EXT.to_string());

        self.save(VIDEO_DIR, title, &extension, bytes).await
    }

    /// Save a thumbnail upload, rejecting formats outside the allow-list
    /// before any disk write.
    pub async fn save_thumbnail(
        &self,
        title: &str,
        client_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let extension = thumbnail_extension(client_name)?;
        self.save(THUMBNAIL_DIR, title, &extension, bytes).await
    }

    async fn save(&self, subdir: &str, title: &str, extension: &str, bytes: &[u8]) -> Result<String> {
        let filename = placement(title, extension, now());

        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .context(CreateDirectorySnafu { path: &dir })?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .context(WriteFileSnafu { path: &path })?;

        Ok(format!("{MEDIA_URL}{subdir}/{filename}"))
    }

    /// Best-effort removal of a stored file. Reports whether a file was
    /// actually deleted; failures other than the file already being gone
    /// are logged and swallowed.
    pub async fn remove(&self, url: &str) -> bool {
        let path = self.path_for(url);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not remove stored file");
                false
            }
        }
    }

    /// Filesystem path behind a stored media url.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let relative = url.strip_prefix(MEDIA_URL).unwrap_or(url);
        self.root.join(relative)
    }

    /// Total size of everything directly under the video directory.
    /// A full scan on every call; unreadable entries are skipped.
    pub async fn video_storage_size(&self) -> u64 {
        let dir = self.root.join(VIDEO_DIR);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut total = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => total += metadata.len(),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(path = %entry.path().display(), error = %err, "could not read file size");
                }
            }
        }

        total
    }
}

/// `{compact timestamp}-{slug}.{extension}`
fn placement(title: &str, extension: &str, at: Timestamp) -> String {
    format!("{}-{}.{}", at.compact(), slugify(title), extension)
}

/// Ascii slug of a title: lowercased, runs of separators collapsed into
/// single hyphens, everything else dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if matches!(c, ' ' | '\t' | '-' | '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_string()
}

/// 1024-scaled human-readable size with two decimals.
pub fn readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;

    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }

    format!("{size:.2} TB")
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
}
