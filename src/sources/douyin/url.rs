use std::sync::OnceLock;

use regex::Regex;

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// First http(s) URL embedded in free-form share text. Share messages wrap
/// the link in promotional text and CJK punctuation; the character class
/// matches what the upstream web client accepts and stops at everything
/// else.
pub fn extract_url(text: &str) -> Option<&str> {
    let pattern = URL_PATTERN.get_or_init(|| {
        Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*(),]|%[0-9a-fA-F]{2})+")
            .expect("url pattern is valid")
    });
    pattern.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_link_from_share_text() {
        let text = "1.25 09/06 LWz:/X@m.dA 想创业的看过来!AI 结合实体店 \
                    https://v.douyin.com/MPXX7C9U-SU/复制此链接，打开Dou音搜索，直接观看视频!";
        assert_eq!(extract_url(text), Some("https://v.douyin.com/MPXX7C9U-SU/"));
    }

    #[test]
    fn plain_url_passes_through() {
        assert_eq!(
            extract_url("https://v.douyin.com/MPXX7C9U-SU/"),
            Some("https://v.douyin.com/MPXX7C9U-SU/")
        );
    }

    #[test]
    fn first_of_several_wins() {
        let text = "http://a.example.com/x and https://b.example.com/y";
        assert_eq!(extract_url(text), Some("http://a.example.com/x"));
    }

    #[test]
    fn stops_at_whitespace() {
        assert_eq!(
            extract_url("see https://example.com/path?a=1&b=2 please"),
            Some("https://example.com/path?a=1&b=2")
        );
    }

    #[test]
    fn percent_escapes_are_kept() {
        assert_eq!(
            extract_url("https://example.com/%E8%A7%86%E9%A2%91 tail"),
            Some("https://example.com/%E8%A7%86%E9%A2%91")
        );
    }

    #[test]
    fn none_without_scheme() {
        assert_eq!(extract_url("没有链接的文本 v.douyin.com/abc"), None);
    }
}
