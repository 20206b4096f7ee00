//! StdoutSink - 通知を標準出力に 1 行ずつ書く
//!
//! ログ（tracing）は stderr、通知は stdout。パイプで通知だけを拾える。

use std::io::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Item;
use crate::ports::NotificationSink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `[0] You have mail! --- {title}`
    #[default]
    Text,

    /// One JSON object per item: `{"index":0,"id":..,"title":..,...}`
    Json,
}

#[derive(Serialize)]
struct Notification<'a> {
    index: usize,
    #[serde(flatten)]
    item: &'a Item,
}

#[derive(Debug, Clone, Default)]
pub struct StdoutSink {
    format: OutputFormat,
}

impl StdoutSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render one line per item, indexed from 0 in rank order.
    pub fn render(&self, items: &[Item]) -> Vec<String> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match self.format {
                OutputFormat::Text => Some(format!("[{index}] You have mail! --- {}", item.title)),
                OutputFormat::Json => match serde_json::to_string(&Notification { index, item }) {
                    Ok(line) => Some(line),
                    Err(e) => {
                        warn!(item_id = %item.id, error = %e, "failed to encode notification");
                        None
                    }
                },
            })
            .collect()
    }
}

#[async_trait]
impl NotificationSink for StdoutSink {
    async fn notify(&self, items: &[Item]) {
        let lines = self.render(items);
        let mut out = std::io::stdout().lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                // 閉じたパイプなど。通知は fire-and-forget
                warn!(error = %e, "failed to write notification");
                return;
            }
        }
        if let Err(e) = out.flush() {
            warn!(error = %e, "failed to flush notifications");
        }
    }
}
