use serde::Deserialize;

/// Decoded payload returned by the parse API. Field presence varies with
/// the video type, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedVideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoSource {
    #[serde(default)]
    pub video_fullinfo: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoVariant {
    #[serde(rename = "type", default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

const QUALITY_ORDER: [&str; 3] = ["超高清", "720p", "540p"];

// Every unrecognized label shares the same lowest rank; two different
// unknown labels are deliberately not distinguished.
fn quality_rank(label: &str) -> usize {
    QUALITY_ORDER
        .iter()
        .position(|q| *q == label)
        .unwrap_or(QUALITY_ORDER.len())
}

/// Picks the single best media URL: the highest-priority quality label
/// among the first video's variants, the earliest entry winning ties, with
/// the top-level `url` as fallback.
pub fn best_media_url(info: &DecodedVideoInfo) -> Option<&str> {
    if let Some(first) = info.videos.first() {
        let mut best: Option<(usize, &str)> = None;
        for variant in &first.video_fullinfo {
            if variant.url.is_empty() {
                continue;
            }
            let rank = quality_rank(&variant.label);
            // strict improvement only, so earlier entries keep ties
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, &variant.url));
            }
        }
        if let Some((_, url)) = best {
            return Some(url);
        }
    }
    info.url.as_deref().filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(label: &str, url: &str) -> VideoVariant {
        VideoVariant {
            label: label.to_string(),
            url: url.to_string(),
        }
    }

    fn with_variants(variants: Vec<VideoVariant>) -> DecodedVideoInfo {
        DecodedVideoInfo {
            videos: vec![VideoSource {
                video_fullinfo: variants,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn picks_ultra_hd_over_others() {
        let info = with_variants(vec![
            variant("720p", "A"),
            variant("超高清", "B"),
            variant("540p", "C"),
        ]);
        assert_eq!(best_media_url(&info), Some("B"));
    }

    #[test]
    fn earliest_wins_on_equal_label() {
        let info = with_variants(vec![variant("720p", "first"), variant("720p", "second")]);
        assert_eq!(best_media_url(&info), Some("first"));
    }

    #[test]
    fn unknown_labels_rank_below_known_and_keep_order() {
        let info = with_variants(vec![variant("原画", "X"), variant("蓝光", "Y")]);
        assert_eq!(best_media_url(&info), Some("X"));

        let info = with_variants(vec![variant("原画", "X"), variant("540p", "C")]);
        assert_eq!(best_media_url(&info), Some("C"));
    }

    #[test]
    fn falls_back_to_top_level_url() {
        let info = DecodedVideoInfo {
            url: Some("Z".to_string()),
            videos: vec![],
            ..Default::default()
        };
        assert_eq!(best_media_url(&info), Some("Z"));
    }

    #[test]
    fn empty_variant_urls_are_skipped() {
        let mut info = with_variants(vec![variant("超高清", "")]);
        info.url = Some("Z".to_string());
        assert_eq!(best_media_url(&info), Some("Z"));
    }

    #[test]
    fn no_media_anywhere() {
        assert_eq!(best_media_url(&DecodedVideoInfo::default()), None);
    }

    #[test]
    fn deserializes_api_shape() {
        let info: DecodedVideoInfo = serde_json::from_str(
            r#"{"title":"t","cover":"c","videos":[{"video_fullinfo":[{"type":"超高清","url":"u"}]}]}"#,
        )
        .unwrap();
        assert_eq!(info.videos[0].video_fullinfo[0].label, "超高清");
        assert_eq!(best_media_url(&info), Some("u"));
    }
}
