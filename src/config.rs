// VK credentials, read once at startup and passed into the clients.
// Nothing in the library touches the environment after this.

use crate::error::{Error, Result};

/// VK API version every call is pinned to.
pub const VK_API_VERSION: &str = "5.130";

/// Credentials for the VK group wall. `group_id` is the positive id as
/// shown in the group settings; the wall.post call negates it itself.
#[derive(Debug, Clone)]
pub struct VkConfig {
    pub access_token: String,
    pub group_id: String,
}

impl VkConfig {
    /// Read `VK_ACCESS_TOKEN` and `VK_GROUP_ID` from the environment.
    /// The binaries load `.env` beforehand; the library never does.
    pub fn from_env() -> Result<Self> {
        Ok(VkConfig {
            access_token: require_env("VK_ACCESS_TOKEN")?,
            group_id: require_env("VK_GROUP_ID")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} is not set", name))),
    }
}
