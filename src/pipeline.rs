// Orchestrator: fetch comic metadata, download the image, run the VK
// publish protocol, and make sure the local image is gone afterwards no
// matter how far the run got.

use std::path::PathBuf;

use log::{info, warn};
use reqwest::blocking::Client;

use crate::comic::ComicClient;
use crate::error::Result;
use crate::image;
use crate::vk::VkClient;

/// Which comic to post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Latest,
    Random,
}

/// Removes the downloaded image when dropped, which covers every exit
/// path out of `run`, including a failed publish.
struct TempImage(PathBuf);

impl Drop for TempImage {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            warn!("could not remove {}: {}", self.0.display(), e);
        }
    }
}

pub struct Pipeline {
    comic: ComicClient,
    vk: VkClient,
    download_dir: PathBuf,
    http: Client,
}

impl Pipeline {
    /// Downloads land in the system temp dir by default.
    pub fn new(comic: ComicClient, vk: VkClient) -> Self {
        Self::with_download_dir(comic, vk, std::env::temp_dir())
    }

    pub fn with_download_dir(comic: ComicClient, vk: VkClient, download_dir: PathBuf) -> Self {
        Pipeline {
            comic,
            vk,
            download_dir,
            http: Client::new(),
        }
    }

    /// One full run: fetch -> download -> publish. Returns the wall post
    /// id. The first failing stage aborts the run; the downloaded file is
    /// removed on every path once it exists.
    pub fn run(&self, mode: Mode) -> Result<i64> {
        let comic = match mode {
            Mode::Latest => self.comic.fetch_latest()?,
            Mode::Random => self.comic.fetch_random()?,
        };
        info!("posting \"{}\"", comic.title);

        let path = image::download(&self.http, &comic.image_url, &self.download_dir)?;
        let guard = TempImage(path);

        self.vk.publish_photo(&guard.0, &comic.caption)
    }
}
