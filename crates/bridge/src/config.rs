//! Bridge configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_TAG: &str = "variant-studio";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Tag every page-channel envelope must carry; anything else is foreign.
    pub source_tag: String,
    /// Keep the last editor change list when delivering it failed, so a
    /// status query can still return it after the session ended.
    pub status_on_send_failure: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            status_on_send_failure: true,
        }
    }
}
