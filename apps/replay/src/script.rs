//! Line format for replay input.

use anyhow::{Context, Result};
use chatsync_chats::{ChannelFrame, ConversationId};
use serde::Deserialize;

/// One line of a replay script
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptLine {
    /// An inbound frame, `{"event": ..., "data": ...}`
    Frame(ChannelFrame),
    /// A change of the open conversation, `{"active": "c1"}` or `{"active": null}`
    Active { active: Option<ConversationId> },
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, number: usize) -> Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    serde_json::from_str(line)
        .map(Some)
        .with_context(|| format!("line {number} is neither a frame nor an active marker"))
}
