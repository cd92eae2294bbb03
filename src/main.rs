use linkbot::commands::{Dispatcher, Reply};
use linkbot::configs::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let default_level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut dispatcher = Dispatcher::new(&config)?;
    info!("linkbot console ready; type a message, Ctrl-D to quit");

    // Local console driver standing in for a platform adapter: one line in,
    // the handler replies out.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for reply in dispatcher.dispatch("console", line).await {
            match reply {
                Reply::Text(text) => println!("{}", text),
                Reply::Emoji { md5 } => println!("[emoji md5={}]", md5),
                Reply::Image { base64 } => println!("[image base64, {} chars]", base64.len()),
            }
        }
    }

    Ok(())
}
