use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::http::{DEFAULT_USER_AGENT, HttpClient, RetryPolicy};
use crate::configs::MailConfig;
use crate::error::ApiClientError;

#[derive(Debug, Deserialize)]
struct MailListResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    mail_list: Vec<MailSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSummary {
    pub mail_id: u64,
    #[serde(default)]
    pub is_new: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailDetail {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_mail: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    result: bool,
}

/// Watches a temporary mailbox and relays unread mail. Mail is deleted
/// only after it has been picked up for relay; the polling cadence is the
/// caller's business.
pub struct MailRelay {
    http: HttpClient,
    api_base: String,
    address: String,
    epin: String,
    limit: u32,
    last_mail_id: Option<u64>,
}

impl MailRelay {
    pub fn new(config: &MailConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert("Origin", HeaderValue::from_static("https://tempmail.plus"));
        headers.insert("Referer", HeaderValue::from_static("https://tempmail.plus/"));

        Ok(Self {
            http: HttpClient::new(headers, RetryPolicy::default())?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            address: config.address.clone(),
            epin: config.epin.clone(),
            limit: config.limit,
            last_mail_id: None,
        })
    }

    async fn list(&self) -> Result<Vec<MailSummary>, ApiClientError> {
        let limit = self.limit.to_string();
        let request = self
            .http
            .inner()
            .get(format!("{}/mails", self.api_base))
            .query(&[
                ("email", self.address.as_str()),
                ("limit", limit.as_str()),
                ("epin", self.epin.as_str()),
            ]);
        let response = self.http.execute(request).await?.error_for_status()?;
        let body: MailListResponse = response.json().await?;
        if !body.result {
            return Err(ApiClientError::Malformed("mailbox listing refused".into()));
        }
        Ok(body.mail_list)
    }

    pub async fn fetch(&self, mail_id: u64) -> Result<MailDetail, ApiClientError> {
        let request = self
            .http
            .inner()
            .get(format!("{}/mails/{}", self.api_base, mail_id))
            .query(&[
                ("email", self.address.as_str()),
                ("epin", self.epin.as_str()),
            ]);
        let response = self.http.execute(request).await?.error_for_status()?;
        let detail: MailDetail = response.json().await?;
        if !detail.result {
            return Err(ApiClientError::Malformed(format!(
                "mail {} not readable",
                mail_id
            )));
        }
        Ok(detail)
    }

    pub async fn delete(&self, mail_id: u64) -> Result<bool, ApiClientError> {
        let request = self
            .http
            .inner()
            .delete(format!("{}/mails/{}", self.api_base, mail_id))
            .query(&[
                ("email", self.address.as_str()),
                ("epin", self.epin.as_str()),
            ]);
        let response = self.http.execute(request).await?.error_for_status()?;
        let body: DeleteResponse = response.json().await?;
        Ok(body.result)
    }

    /// One poll: formats every unread mail newer than the high-water mark,
    /// deleting each one it picked up. Failures on a single mail are
    /// logged and skipped so one broken message cannot wedge the mailbox.
    pub async fn collect_new(&mut self) -> Result<Vec<String>, ApiClientError> {
        let mails = self.list().await?;
        let fresh = select_new(&mails, self.last_mail_id);
        debug!("mailbox poll: {} new of {} listed", fresh.len(), mails.len());

        let mut relayed = Vec::new();
        for summary in fresh {
            let detail = match self.fetch(summary.mail_id).await {
                Ok(detail) => detail,
                Err(error) => {
                    warn!("failed to fetch mail {}: {}", summary.mail_id, error);
                    continue;
                }
            };
            relayed.push(format_mail(&detail));
            self.last_mail_id = Some(
                self.last_mail_id
                    .map_or(summary.mail_id, |id| id.max(summary.mail_id)),
            );
            match self.delete(summary.mail_id).await {
                Ok(true) => {}
                Ok(false) => warn!("mailbox refused to delete mail {}", summary.mail_id),
                Err(error) => warn!("failed to delete mail {}: {}", summary.mail_id, error),
            }
        }
        Ok(relayed)
    }
}

/// Unread mail strictly newer than the high-water mark, oldest first.
fn select_new(mails: &[MailSummary], last_id: Option<u64>) -> Vec<MailSummary> {
    let mut fresh: Vec<MailSummary> = mails
        .iter()
        .filter(|m| m.is_new && last_id.is_none_or(|id| m.mail_id > id))
        .cloned()
        .collect();
    fresh.sort_by_key(|m| m.mail_id);
    fresh
}

fn format_mail(detail: &MailDetail) -> String {
    format!(
        "发件人: {} <{}>\n主题: {}\n时间: {}\n内容:\n{}",
        detail.from_name.as_deref().unwrap_or("未知"),
        detail.from_mail.as_deref().unwrap_or("未知"),
        detail.subject.as_deref().unwrap_or("无主题"),
        detail.date.as_deref().unwrap_or("未知"),
        detail.text.as_deref().unwrap_or("无内容"),
    )
}
