use surrealdb::sql::Thing;
use uuid::Uuid;

use crate::prelude::*;

pub type VideoId = Thing;

pub fn new_video_id() -> VideoId {
    video_id(Uuid::new_v4())
}

/// Record ids use the simple uuid form so the raw part stays url-safe.
pub fn video_id(uuid: Uuid) -> VideoId {
    ("videos".to_string(), uuid.simple().to_string()).into()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Video {
    #[new(value = "new_video_id()")]
    pub id: VideoId,
    #[new(value = "now()")]
    pub upload_time: Timestamp,

    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[new(default)]
    #[serde(default)]
    pub views: i64,
}

impl Video {
    /// Trailing path segment of the stored video url, the public watch
    /// identity of this record.
    pub fn filename(&self) -> &str {
        self.video_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.video_url)
    }

    /// Raw id part, as carried by the admin urls.
    pub fn key(&self) -> String {
        self.id.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_the_trailing_segment() {
        let video = Video::new(
            "Sea Breeze".to_string(),
            "/media/videos/20240301083015-sea-breeze.mp4".to_string(),
            None,
        );

        assert_eq!(video.filename(), "20240301083015-sea-breeze.mp4");
    }

    #[test]
    fn new_records_start_with_zero_views() {
        let video = Video::new("t".to_string(), "/media/videos/t.mp4".to_string(), None);

        assert_eq!(video.views, 0);
        assert_eq!(video.id.tb, "videos");
    }
}
