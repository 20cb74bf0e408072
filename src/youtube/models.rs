use serde::{Deserialize, Serialize};

/// A video as the engine cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub uploader: String,
}

impl VideoSummary {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Mix playlists are addressed by prefixing the seed video id.
pub fn mix_playlist_id(video_id: &str) -> String {
    format!("RD{}", video_id)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipedStream {
    pub title: String,
    #[serde(default)]
    pub uploader: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipedItem {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uploader_name: Option<String>,
}

impl PipedItem {
    /// Only `stream` items pointing at `/watch?v=` become videos.
    pub fn into_summary(self) -> Option<VideoSummary> {
        if self.kind.as_deref().is_some_and(|k| k != "stream") {
            return None;
        }
        let id = self
            .url
            .split("v=")
            .nth(1)
            .map(|rest| rest.split('&').next().unwrap_or(rest))
            .filter(|id| !id.is_empty())?
            .to_string();

        Some(VideoSummary {
            id,
            title: self.title,
            uploader: self.uploader_name.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipedPlaylistPage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nextpage: Option<String>,
    #[serde(default)]
    pub related_streams: Vec<PipedItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipedSearchPage {
    #[serde(default)]
    pub items: Vec<PipedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_page_parses_related_streams() {
        let page: PipedPlaylistPage = serde_json::from_str(
            r#"{
                "name": "Mix",
                "nextpage": null,
                "relatedStreams": [
                    {"url": "/watch?v=aaaaaaaaaaa", "type": "stream", "title": "A - One", "uploaderName": "A"},
                    {"url": "/channel/UC123", "type": "channel", "title": "Some channel"},
                    {"url": "/watch?v=bbbbbbbbbbb&list=RDx", "type": "stream", "title": "Two", "uploaderName": "B - Topic"}
                ]
            }"#,
        )
        .unwrap();

        let videos: Vec<VideoSummary> = page
            .related_streams
            .into_iter()
            .filter_map(PipedItem::into_summary)
            .collect();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[1].id, "bbbbbbbbbbb");
        assert_eq!(videos[1].uploader, "B - Topic");
    }

    #[test]
    fn mix_ids() {
        assert_eq!(mix_playlist_id("dQw4w9WgXcQ"), "RDdQw4w9WgXcQ");
    }
}
