// Image retriever: fetches the comic image bytes and lands them in a
// local folder. The filename comes from the URL, so both the folder and
// the derived name are sanitized before anything touches the disk.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use path_clean::PathClean;
use percent_encoding::percent_decode_str;
use reqwest::blocking::Client;
use url::Url;

use crate::error::{Error, Result};

/// Download `image_url` into `dest_dir` and return the written path.
/// Single attempt; the bytes go through a `.part` file and a rename so a
/// failed transfer never leaves a half-written image under the final name.
pub fn download(client: &Client, image_url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let filename = image_filename(image_url)?;
    let dest_dir = dest_dir.to_path_buf().clean();
    let path = dest_dir.join(&filename);

    let response = client
        .get(image_url)
        .send()
        .map_err(|e| Error::Download(format!("requesting {}: {}", image_url, e)))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Download(format!("{} answered {}", image_url, status)));
    }
    let bytes = response
        .bytes()
        .map_err(|e| Error::Download(format!("reading body of {}: {}", image_url, e)))?;

    let part = path.with_extension(part_extension(&path));
    fs::write(&part, &bytes)
        .map_err(|e| Error::filesystem(format!("writing {}", part.display()), e))?;
    fs::rename(&part, &path)
        .map_err(|e| Error::filesystem(format!("renaming {}", part.display()), e))?;

    debug!("downloaded {} ({} bytes) to {}", image_url, bytes.len(), path.display());
    Ok(path)
}

/// Derive the local filename from the final path segment of the URL,
/// percent-decoded. Separators, traversal segments and characters that
/// are illegal in filenames are neutralized so the result can never
/// escape the destination folder.
pub fn image_filename(image_url: &str) -> Result<String> {
    let url = Url::parse(image_url)
        .map_err(|e| Error::Download(format!("invalid image url {}: {}", image_url, e)))?;
    let decoded = percent_decode_str(url.path()).decode_utf8_lossy();
    let segment = decoded
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    let name = sanitize_filename(segment);
    if name.is_empty() {
        return Err(Error::Download(format!("no usable filename in {}", image_url)));
    }
    Ok(name)
}

/// Replace reserved characters with `_`, drop control characters, and
/// strip trailing dots and spaces. A name that reduces to nothing but
/// dots (`.`/`..`) comes back empty.
fn sanitize_filename(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    cleaned.trim_end_matches(['.', ' ']).trim_start().to_string()
}

fn part_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.part", ext),
        None => "part".to_string(),
    }
}
