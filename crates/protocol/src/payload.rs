use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Marker that precedes the JSON blob inside a success response body.
pub const SABAKI_SENTINEL: &str = "#sabaki";

/// Result of `sabaki-genmovelog`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenmoveLog {
    /// Concatenated SGF game trees, one per variation.
    pub variations: String,
    /// `point:letter` pairs joined by `;`.
    pub labels: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<Vec<Vec<u8>>>,
}

/// Result of `heatmap`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapPayload {
    pub heatmap: Vec<Vec<u8>>,
}

pub fn embed_payload<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    Ok(format!("{SABAKI_SENTINEL}{}", serde_json::to_string(payload)?))
}

/// Locates the sentinel in a response body and decodes the JSON that follows it.
pub fn extract_payload<T: DeserializeOwned>(content: &str) -> Option<T> {
    let start = content.find(SABAKI_SENTINEL)? + SABAKI_SENTINEL.len();
    let json = content[start..].lines().next()?.trim();
    serde_json::from_str(json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn genmove_log_omits_missing_heatmap() {
        let payload = GenmoveLog {
            variations: "(;B[dd])".to_string(),
            labels: "dd:A".to_string(),
            heatmap: None,
        };
        let embedded = embed_payload(&payload).expect("encode");
        assert_eq!(
            embedded,
            r#"#sabaki{"variations":"(;B[dd])","labels":"dd:A"}"#
        );
    }

    #[test]
    fn extract_finds_payload_after_prefix_text() {
        let body = r#"#sabaki{"heatmap":[[0,9],[4,1]]}"#;
        let decoded: HeatmapPayload = extract_payload(body).expect("payload");
        assert_eq!(decoded.heatmap, vec![vec![0, 9], vec![4, 1]]);

        assert!(extract_payload::<HeatmapPayload>("= D4").is_none());
    }
}
