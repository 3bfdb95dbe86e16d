// Comic fetcher: a small blocking client for the xkcd JSON endpoints.
// Two lookups exist (the current comic at /info.0.json, a specific one
// at /{id}/info.0.json) and everything else builds on those.

use log::debug;
use rand::Rng;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Production endpoint; tests point the client at a local server instead.
pub const XKCD_BASE_URL: &str = "https://xkcd.com";

/// Everything the rest of the pipeline needs to know about one comic.
/// `caption` is the alt text; the wall post message is the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicRecord {
    pub image_url: String,
    pub title: String,
    pub caption: String,
}

/// Wire shape of the xkcd metadata body. Only the fields we consume;
/// a body missing any of them is treated as malformed.
#[derive(Deserialize)]
struct ComicInfo {
    num: u32,
    img: String,
    title: String,
    alt: String,
}

impl From<ComicInfo> for ComicRecord {
    fn from(info: ComicInfo) -> Self {
        ComicRecord {
            image_url: info.img,
            title: info.title,
            caption: info.alt,
        }
    }
}

pub struct ComicClient {
    client: Client,
    base_url: String,
}

impl ComicClient {
    pub fn new() -> Self {
        Self::with_base_url(XKCD_BASE_URL)
    }

    /// Point the client at a different host (used by the tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ComicClient {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the current comic.
    pub fn fetch_latest(&self) -> Result<ComicRecord> {
        Ok(self.fetch_info("info.0.json")?.into())
    }

    /// Fetch a uniformly random comic strictly older than the current one.
    /// The pick is drawn from [1, latest), so today's comic is never chosen.
    pub fn fetch_random(&self) -> Result<ComicRecord> {
        let latest = self.fetch_info("info.0.json")?;
        if latest.num < 2 {
            return Err(Error::Upstream(format!(
                "latest comic is #{}, no earlier comic to pick from",
                latest.num
            )));
        }
        let pick = rand::rng().random_range(1..latest.num);
        debug!("picked comic #{} out of [1, {})", pick, latest.num);
        Ok(self.fetch_info(&format!("{}/info.0.json", pick))?.into())
    }

    fn fetch_info(&self, path: &str) -> Result<ComicInfo> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Upstream(format!("requesting {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("{} answered {}", url, status)));
        }
        response
            .json()
            .map_err(|e| Error::Upstream(format!("malformed body from {}: {}", url, e)))
    }
}

impl Default for ComicClient {
    fn default() -> Self {
        Self::new()
    }
}
