pub mod decode;
pub mod info;
pub mod signing;
pub mod url;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::common::http::{DEFAULT_USER_AGENT, HttpClient, RetryPolicy};
use crate::configs::DouyinConfig;
use crate::error::{DecodeError, ResolveError};
use info::{DecodedVideoInfo, best_media_url};
use signing::SignedParams;

/// Resolved media item handed back to the command layer.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub title: Option<String>,
    pub cover: Option<String>,
    pub url: String,
}

/// Raw envelope returned by the parse endpoint. `encrypt: true` means
/// `data` is an obfuscated string and `iv` is present; otherwise `data` is
/// already plain JSON.
#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub iv: Option<String>,
}

/// Transport to the upstream parse service. The endpoint, header set and
/// signing scheme were reverse engineered and can change without notice,
/// so the whole contract sits behind this seam and the decode logic never
/// sees it.
#[async_trait]
pub trait ParseApi: Send + Sync {
    async fn submit(&self, body: &SignedParams) -> Result<ParseResponse, ResolveError>;
}

/// Production transport: POST the signed envelope with a browser-mimicking
/// header set.
pub struct KukutoolApi {
    http: HttpClient,
    api_url: String,
}

impl KukutoolApi {
    pub fn new(api_url: String, origin: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert(
            "Accept-Language",
            HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7,en-GB;q=0.6"),
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(origin) {
            headers.insert("Origin", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}/", origin)) {
            headers.insert("Referer", value);
        }
        headers.insert("User-Agent", HeaderValue::from_static(DEFAULT_USER_AGENT));

        Ok(Self {
            http: HttpClient::new(headers, RetryPolicy::default())?,
            api_url,
        })
    }
}

#[async_trait]
impl ParseApi for KukutoolApi {
    async fn submit(&self, body: &SignedParams) -> Result<ParseResponse, ResolveError> {
        let request = self.http.inner().post(&self.api_url).json(body);
        let response = self.http.execute(request).await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Short-video share link resolver.
pub struct DouyinSource {
    api: Box<dyn ParseApi>,
    secret: String,
    share_regex: Regex,
}

impl DouyinSource {
    pub fn new(config: &DouyinConfig) -> Result<Self, reqwest::Error> {
        let api = KukutoolApi::new(config.api_url.clone(), &config.origin)?;
        Ok(Self::with_api(Box::new(api), config.secret.clone()))
    }

    pub fn with_api(api: Box<dyn ParseApi>, secret: String) -> Self {
        Self {
            api,
            secret,
            share_regex: Regex::new(r"https?://(?:v|www)\.(?:douyin|iesdouyin)\.com/\S+")
                .expect("share pattern is valid"),
        }
    }

    pub fn can_handle(&self, text: &str) -> bool {
        self.share_regex.is_match(text)
    }

    /// Resolves free-form share text into a direct media URL.
    pub async fn resolve(&self, text: &str) -> Result<ResolvedVideo, ResolveError> {
        let link = url::extract_url(text).ok_or(ResolveError::NoUrlFound)?;
        debug!("resolving share link: {}", link);

        let params = signing::request_params(link, "", "");
        let body = SignedParams::create(params, &self.secret);
        let response = self.api.submit(&body).await?;

        if response.status != 0 {
            return Err(ResolveError::Api(response.status));
        }

        let decoded = decode_body(response)?;
        let media_url = best_media_url(&decoded)
            .ok_or(ResolveError::NoMediaFound)?
            .to_string();

        Ok(ResolvedVideo {
            title: decoded.title,
            cover: decoded.cover,
            url: media_url,
        })
    }
}

fn decode_body(response: ParseResponse) -> Result<DecodedVideoInfo, ResolveError> {
    if response.encrypt {
        let data = response
            .data
            .as_str()
            .ok_or(DecodeError::MissingField("data"))?;
        let iv = response
            .iv
            .as_deref()
            .ok_or(DecodeError::MissingField("iv"))?;
        Ok(decode::decrypt_response(data, iv)?)
    } else {
        serde_json::from_value(response.data)
            .map_err(|e| ResolveError::Decode(DecodeError::Json(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedApi {
        response: serde_json::Value,
    }

    #[async_trait]
    impl ParseApi for FixedApi {
        async fn submit(&self, _body: &SignedParams) -> Result<ParseResponse, ResolveError> {
            Ok(serde_json::from_value(self.response.clone()).expect("fixture parses"))
        }
    }

    fn source_with(response: serde_json::Value) -> DouyinSource {
        DouyinSource::with_api(Box::new(FixedApi { response }), "secret".to_string())
    }

    #[tokio::test]
    async fn resolves_unencrypted_payload() {
        let source = source_with(json!({
            "status": 0,
            "encrypt": false,
            "data": {
                "title": "demo",
                "videos": [{"video_fullinfo": [
                    {"type": "540p", "url": "https://cdn.example.com/540.mp4"},
                    {"type": "超高清", "url": "https://cdn.example.com/uhd.mp4"},
                ]}],
            },
        }));

        let video = source
            .resolve("看看这个 https://v.douyin.com/MPXX7C9U-SU/ 复制此链接")
            .await
            .unwrap();
        assert_eq!(video.title.as_deref(), Some("demo"));
        assert_eq!(video.url, "https://cdn.example.com/uhd.mp4");
    }

    #[tokio::test]
    async fn surfaces_api_status() {
        let source = source_with(json!({"status": 403, "encrypt": false, "data": {}}));
        let err = source
            .resolve("https://v.douyin.com/MPXX7C9U-SU/")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Api(403)));
    }

    #[tokio::test]
    async fn no_url_in_text() {
        let source = source_with(json!({"status": 0, "encrypt": false, "data": {}}));
        let err = source.resolve("这里没有链接").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoUrlFound));
    }

    #[tokio::test]
    async fn no_media_in_payload() {
        let source = source_with(json!({"status": 0, "encrypt": false, "data": {"title": "t"}}));
        let err = source
            .resolve("https://v.douyin.com/MPXX7C9U-SU/")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoMediaFound));
    }

    #[tokio::test]
    async fn encrypted_payload_without_iv_fails() {
        let source = source_with(json!({"status": 0, "encrypt": true, "data": "abc"}));
        let err = source
            .resolve("https://v.douyin.com/MPXX7C9U-SU/")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Decode(DecodeError::MissingField("iv"))
        ));
    }

    #[test]
    fn recognizes_share_domains() {
        let source = source_with(json!({}));
        assert!(source.can_handle("https://v.douyin.com/MPXX7C9U-SU/"));
        assert!(source.can_handle("https://www.iesdouyin.com/share/video/1"));
        assert!(!source.can_handle("https://example.com/video"));
    }
}
