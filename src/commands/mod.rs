pub mod credentials;

use std::collections::HashMap;

use regex::Regex;
use tracing::{error, warn};

use crate::configs::{Config, ImageRelayMode};
use crate::mail::MailRelay;
use crate::qinglong::QinglongClient;
use crate::sources::article::ArticleSource;
use crate::sources::douyin::DouyinSource;
use credentials::{CredentialFlow, FlowStep};

/// Platform-agnostic reply element. The hosting adapter renders these into
/// its own message-chain format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Forward an already-uploaded image through the emoji API by MD5.
    Emoji { md5: String },
    /// Raw image as a base64 attachment.
    Image { base64: String },
}

/// Routes incoming chat text to the command handlers and collects their
/// replies. One instance serves all senders; per-sender state is only the
/// pending credential conversations.
pub struct Dispatcher {
    douyin: DouyinSource,
    article: ArticleSource,
    image_relay: ImageRelayMode,
    mail: Option<MailRelay>,
    qinglong: Option<QinglongClient>,
    env_name: String,
    img_command: Regex,
    pending: HashMap<String, CredentialFlow>,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            douyin: DouyinSource::new(&config.douyin)?,
            article: ArticleSource::new()?,
            image_relay: config.article.relay,
            mail: config.mail.as_ref().map(MailRelay::new).transpose()?,
            qinglong: config.qinglong.as_ref().map(QinglongClient::new).transpose()?,
            env_name: config
                .qinglong
                .as_ref()
                .map(|q| q.env_name.clone())
                .unwrap_or_default(),
            img_command: Regex::new(r"/img\s*(https?://\S+)").expect("img pattern is valid"),
            pending: HashMap::new(),
        })
    }

    pub async fn dispatch(&mut self, sender_id: &str, text: &str) -> Vec<Reply> {
        let msg = text.trim();

        if let Some(flow) = self.pending.remove(sender_id) {
            return self.advance_credentials(sender_id, flow, msg).await;
        }

        if msg.starts_with("/img") {
            return self.handle_img(msg).await;
        }
        if msg.starts_with("/id") {
            return vec![Reply::Text(format!("你的ID是: {}", sender_id))];
        }
        if msg.starts_with("/mail") {
            return self.handle_mail().await;
        }
        if msg.starts_with("/bind") {
            return self.start_credentials(sender_id);
        }
        if msg.starts_with("/dy") || self.douyin.can_handle(msg) {
            return self.handle_douyin(msg).await;
        }

        Vec::new()
    }

    async fn handle_img(&self, msg: &str) -> Vec<Reply> {
        let Some(captures) = self.img_command.captures(msg) else {
            return vec![Reply::Text("请提供有效的文章链接，格式：/img 链接".into())];
        };
        let page_url = &captures[1];

        let images = match self.article.image_urls(page_url).await {
            Ok(urls) => urls,
            Err(e) => {
                error!("article scrape failed for {}: {}", page_url, e);
                return vec![Reply::Text(format!("处理失败：{}", e))];
            }
        };
        if images.is_empty() {
            return vec![Reply::Text("未找到图片".into())];
        }

        let mut replies = vec![Reply::Text(format!(
            "找到 {} 张图片，开始处理...",
            images.len()
        ))];
        let mut sent = 0usize;
        for (index, image_url) in images.iter().enumerate() {
            match self.article.download(image_url).await {
                Ok(image) => {
                    replies.push(match self.image_relay {
                        ImageRelayMode::Emoji => Reply::Emoji { md5: image.md5 },
                        ImageRelayMode::Base64 => Reply::Image {
                            base64: image.as_base64(),
                        },
                    });
                    sent += 1;
                }
                Err(e) => warn!("第 {} 张图片处理失败: {}", index + 1, e),
            }
        }
        replies.push(Reply::Text(format!("处理完成，成功发送 {} 张图片", sent)));
        replies
    }

    async fn handle_douyin(&self, msg: &str) -> Vec<Reply> {
        let text = msg.strip_prefix("/dy").unwrap_or(msg);
        match self.douyin.resolve(text).await {
            Ok(video) => {
                let title = video.title.as_deref().unwrap_or("无标题");
                vec![Reply::Text(format!("📹 {}\n🔗 {}", title, video.url))]
            }
            Err(e) => {
                warn!("douyin resolve failed: {}", e);
                vec![Reply::Text(format!("解析失败：{}", e))]
            }
        }
    }

    async fn handle_mail(&mut self) -> Vec<Reply> {
        let Some(mail) = self.mail.as_mut() else {
            return vec![Reply::Text("未配置邮箱".into())];
        };
        match mail.collect_new().await {
            Ok(relayed) if relayed.is_empty() => vec![Reply::Text("暂无新邮件".into())],
            Ok(relayed) => relayed.into_iter().map(Reply::Text).collect(),
            Err(e) => {
                error!("mailbox poll failed: {}", e);
                vec![Reply::Text(format!("获取邮件失败：{}", e))]
            }
        }
    }

    fn start_credentials(&mut self, sender_id: &str) -> Vec<Reply> {
        if self.qinglong.is_none() {
            return vec![Reply::Text("未配置青龙面板".into())];
        }
        let (flow, prompt) = CredentialFlow::start();
        self.pending.insert(sender_id.to_string(), flow);
        vec![Reply::Text(prompt.into())]
    }

    async fn advance_credentials(
        &mut self,
        sender_id: &str,
        flow: CredentialFlow,
        msg: &str,
    ) -> Vec<Reply> {
        match flow.advance(msg) {
            (Some(next), FlowStep::Prompt(prompt)) => {
                self.pending.insert(sender_id.to_string(), next);
                vec![Reply::Text(prompt.into())]
            }
            (_, FlowStep::Complete { account, password }) => {
                // qinglong presence was checked when the flow started
                let Some(qinglong) = self.qinglong.as_ref() else {
                    return vec![Reply::Text("未配置青龙面板".into())];
                };
                let value = format!("{}#{}", account, password);
                match qinglong.upsert_env(&self.env_name, &value).await {
                    Ok(()) => vec![Reply::Text("绑定成功".into())],
                    Err(e) => {
                        error!("env push failed: {}", e);
                        vec![Reply::Text(format!("绑定失败：{}", e))]
                    }
                }
            }
            (None, FlowStep::Prompt(prompt)) => vec![Reply::Text(prompt.into())],
        }
    }
}
