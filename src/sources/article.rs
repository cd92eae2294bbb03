use base64::prelude::*;
use md5::{Digest, Md5};
use regex::Regex;

use crate::common::http::{HttpClient, RetryPolicy};
use crate::error::ApiClientError;

/// One downloaded article image, ready for either relay path: `md5` keys
/// the platform emoji-forward API, `as_base64` feeds the attachment path.
#[derive(Debug, Clone)]
pub struct ArticleImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub md5: String,
}

impl ArticleImage {
    pub fn as_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }
}

/// Scrapes `<img>` tags out of an article page and downloads the images.
pub struct ArticleSource {
    http: HttpClient,
    img_tag: Regex,
    data_src_attr: Regex,
    src_attr: Regex,
}

impl ArticleSource {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: HttpClient::with_user_agent(RetryPolicy::default())?,
            img_tag: Regex::new(r"(?is)<img\b[^>]*>").expect("img pattern is valid"),
            data_src_attr: Regex::new(r#"(?i)data-src\s*=\s*["']([^"']+)["']"#)
                .expect("data-src pattern is valid"),
            src_attr: Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#)
                .expect("src pattern is valid"),
        })
    }

    /// Fetches the page and returns the image URLs found in it, in document
    /// order.
    pub async fn image_urls(&self, page_url: &str) -> Result<Vec<String>, ApiClientError> {
        let request = self.http.inner().get(page_url);
        let html = self
            .http
            .execute(request)
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(self.extract_image_urls(&html))
    }

    /// `data-src` wins over `src`: article pages lazy-load their images and
    /// leave a placeholder in `src`. Only http(s) URLs are kept.
    pub fn extract_image_urls(&self, html: &str) -> Vec<String> {
        self.img_tag
            .find_iter(html)
            .filter_map(|tag| {
                let tag = tag.as_str();
                self.data_src_attr
                    .captures(tag)
                    .or_else(|| self.src_attr.captures(tag))
                    .map(|captures| captures[1].to_string())
            })
            .filter(|url| url.contains("http"))
            .collect()
    }

    pub async fn download(&self, url: &str) -> Result<ArticleImage, ApiClientError> {
        let request = self.http.inner().get(url);
        let response = self.http.execute(request).await?.error_for_status()?;
        let bytes = response.bytes().await?.to_vec();
        let md5 = hex::encode(Md5::digest(&bytes));
        Ok(ArticleImage {
            url: url.to_string(),
            bytes,
            md5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ArticleSource {
        ArticleSource::new().unwrap()
    }

    #[test]
    fn prefers_data_src_over_src() {
        let html = r#"
            <p>text</p>
            <img src="https://cdn.example.com/placeholder.gif"
                 data-src="https://cdn.example.com/real-1.jpg">
            <img src="https://cdn.example.com/real-2.png" alt="x"/>
        "#;
        assert_eq!(
            source().extract_image_urls(html),
            vec![
                "https://cdn.example.com/real-1.jpg",
                "https://cdn.example.com/real-2.png",
            ]
        );
    }

    #[test]
    fn skips_non_http_sources() {
        let html = r#"<img src="data:image/gif;base64,R0lGOD"><img src="/relative.jpg">"#;
        assert!(source().extract_image_urls(html).is_empty());
    }

    #[test]
    fn no_images_no_urls() {
        assert!(source().extract_image_urls("<html><body>plain</body></html>").is_empty());
    }

    #[test]
    fn image_digest_and_base64() {
        let image = ArticleImage {
            url: "https://cdn.example.com/a.bin".to_string(),
            bytes: b"hello".to_vec(),
            md5: hex::encode(Md5::digest(b"hello")),
        };
        assert_eq!(image.md5, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(image.as_base64(), "aGVsbG8=");
    }
}
