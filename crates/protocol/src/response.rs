use anyhow::{bail, Context, Result};
use std::fmt;

/// One GTP response: `=id content` on success, `?id content` on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: Option<u32>,
    pub content: String,
    pub error: bool,
}

impl Response {
    pub fn success(id: Option<u32>, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            error: false,
        }
    }

    pub fn failure(id: Option<u32>, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            error: true,
        }
    }

    /// Builds a response from the lines of one frame, excluding the terminating blank line.
    pub fn from_frame_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let (head, rest) = lines.split_first().context("empty response frame")?;
        let head = head.as_ref();

        let error = match head.chars().next() {
            Some('=') => false,
            Some('?') => true,
            _ => bail!("unexpected response line {head:?}"),
        };

        let body = &head[1..];
        let digits = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        let id = body[..digits].parse::<u32>().ok();
        let first_line = body[digits..].trim();

        let mut content = first_line.to_string();
        for line in rest {
            content.push('\n');
            content.push_str(line.as_ref());
        }

        Ok(Self { id, content, error })
    }

    /// Wire form including the blank line that terminates the frame.
    pub fn to_frame(&self) -> String {
        format!("{self}\n\n")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.error { "?" } else { "=" })?;
        if let Some(id) = self.id {
            write!(f, "{id}")?;
        }
        write!(f, " {}", self.content)
    }
}
