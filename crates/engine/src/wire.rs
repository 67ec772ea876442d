//! Wire messages exchanged with a remote routing peer.
//!
//! Messages are JSON objects discriminated by the `"a"` field. Artifact
//! bytes travel base64-encoded inside the JSON text frame.

use serde::{Deserialize, Serialize};

/// A message on the remote session connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "a")]
pub enum RemoteMessage {
    /// Inbound: start a routing job on the attached artifact.
    #[serde(rename = "startRoute")]
    StartRoute {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// Outbound: a routing pass finished; `data` is the current on-disk
    /// artifact snapshot.
    #[serde(rename = "routingProgress")]
    RoutingProgress {
        #[serde(rename = "inCompleteNetNum")]
        incomplete_net_num: u32,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// Outbound: the job finished. `complete` is true only when every net
    /// was routed.
    #[serde(rename = "routingResult")]
    RoutingResult {
        #[serde(rename = "inCompleteNetNum")]
        incomplete_net_num: u32,
        complete: bool,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// Outbound: a start request arrived while a job was already running.
    #[serde(rename = "routeRejected")]
    RouteRejected { reason: String },
}

/// Parse one text frame into a typed message.
///
/// Returns `Err` for malformed JSON, unknown `"a"` values, or invalid
/// base64 payloads. Callers drop such frames with a warning; they never
/// affect a running job.
pub fn parse_message(text: &str) -> Result<RemoteMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Encode a message for sending as a text frame.
pub fn encode_message(msg: &RemoteMessage) -> String {
    // RemoteMessage contains nothing a JSON serializer can reject.
    serde_json::to_string(msg).expect("wire message serialization cannot fail")
}

mod base64_bytes {
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
