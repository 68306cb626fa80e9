//! Thumbnail URLs derived from a video id

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThumbnailQuality {
    MaxRes,
    High,
}

impl ThumbnailQuality {
    fn file_name(self) -> &'static str {
        match self {
            ThumbnailQuality::MaxRes => "maxresdefault.jpg",
            ThumbnailQuality::High => "hqdefault.jpg",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thumbnail {
    video_id: String,
    quality: ThumbnailQuality,
}

impl Thumbnail {
    pub fn for_video(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            quality: ThumbnailQuality::MaxRes,
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}/{}", THUMBNAIL_BASE, self.video_id, self.quality.file_name())
    }

    /// Fall back to the standard-resolution image. Returns false once there is nothing left to fall back to.
    pub fn on_load_error(&mut self) -> bool {
        match self.quality {
            ThumbnailQuality::MaxRes => {
                tracing::debug!(video_id = %self.video_id, "Max-res thumbnail failed, using hq");
                self.quality = ThumbnailQuality::High;
                true
            }
            ThumbnailQuality::High => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_once() {
        let mut thumb = Thumbnail::for_video("dQw4w9WgXcQ");
        assert_eq!(thumb.url(), "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg");

        assert!(thumb.on_load_error());
        assert_eq!(thumb.url(), "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg");

        assert!(!thumb.on_load_error());
        assert!(thumb.url().ends_with("/hqdefault.jpg"));
    }
}
