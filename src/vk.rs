// Wall publisher: the strict four-call VK upload protocol.
//
//   photos.getWallUploadServer -> upload URL
//   multipart POST to that URL -> opaque token fields
//   photos.saveWallPhoto       -> owner id + media id
//   wall.post                  -> post id
//
// Each call's output is the sole input the next one needs beyond the
// static credentials, so the sequence is a straight line: any failure
// aborts the remaining calls and the run. VK signals most errors in-band
// (HTTP 200 with an `error` object), so every body is checked before its
// payload is trusted.

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use reqwest::blocking::{multipart, Client};
use serde_json::{Map, Value};

use crate::config::{VkConfig, VK_API_VERSION};
use crate::error::{Error, Result};

/// Production method base; tests point the client at a local server.
pub const VK_API_BASE_URL: &str = "https://api.vk.com/method";

/// Fields the upload server returns. Their schema is server-defined, so
/// they are kept opaque and forwarded verbatim to photos.saveWallPhoto.
pub type UploadFields = Map<String, Value>;

/// Identity of a saved wall photo, as returned by photos.saveWallPhoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedPhoto {
    pub owner_id: i64,
    pub media_id: i64,
}

pub struct VkClient {
    client: Client,
    base_url: String,
    config: VkConfig,
}

impl VkClient {
    pub fn new(config: VkConfig) -> Self {
        Self::with_base_url(config, VK_API_BASE_URL)
    }

    /// Point the client at a different method base (used by the tests).
    pub fn with_base_url(config: VkConfig, base_url: impl Into<String>) -> Self {
        VkClient {
            client: Client::new(),
            base_url: base_url.into(),
            config,
        }
    }

    /// Run the whole protocol for one image and return the new post id.
    pub fn publish_photo(&self, image_path: &Path, message: &str) -> Result<i64> {
        let upload_url = self.get_upload_server()?;
        let fields = self.upload_photo(&upload_url, image_path)?;
        let saved = self.save_wall_photo(&fields)?;
        self.post_to_wall(saved, message)
    }

    /// Step 1: ask VK for the group wall upload endpoint.
    pub fn get_upload_server(&self) -> Result<String> {
        let url = self.method_url("photos.getWallUploadServer");
        let response = self
            .client
            .get(&url)
            .query(&self.credential_params())
            .send()
            .map_err(Error::Http)?;
        let body = read_api_body(response)?;
        let upload_url = body
            .pointer("/response/upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| missing_field("photos.getWallUploadServer", "response.upload_url"))?;
        debug!("upload server: {}", upload_url);
        Ok(upload_url.to_string())
    }

    /// Step 2: multipart POST of the image to the upload URL. The response
    /// body is an opaque object the save call needs verbatim.
    pub fn upload_photo(&self, upload_url: &str, image_path: &Path) -> Result<UploadFields> {
        let file = File::open(image_path)
            .map_err(|e| Error::filesystem(format!("opening {}", image_path.display()), e))?;
        let file_name = image_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let part = multipart::Part::reader(file).file_name(file_name);
        let form = multipart::Form::new().part("photo", part);

        let response = self
            .client
            .post(upload_url)
            .multipart(form)
            .send()
            .map_err(Error::Http)?;
        let body = read_api_body(response)?;
        match body {
            Value::Object(fields) => Ok(fields),
            other => Err(Error::Api {
                code: 0,
                message: format!("upload server answered a non-object body: {}", other),
            }),
        }
    }

    /// Step 3: attach the uploaded bytes to the group as a wall photo.
    /// The token fields ride along verbatim next to the credentials.
    pub fn save_wall_photo(&self, fields: &UploadFields) -> Result<SavedPhoto> {
        let url = self.method_url("photos.saveWallPhoto");
        let mut params = self.credential_params();
        for (key, value) in fields {
            params.push((key.clone(), query_value(value)));
        }
        let response = self
            .client
            .post(&url)
            .query(&params)
            .send()
            .map_err(Error::Http)?;
        let body = read_api_body(response)?;
        let photo = body
            .pointer("/response/0")
            .ok_or_else(|| missing_field("photos.saveWallPhoto", "response[0]"))?;
        let owner_id = photo
            .get("owner_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| missing_field("photos.saveWallPhoto", "response[0].owner_id"))?;
        let media_id = photo
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| missing_field("photos.saveWallPhoto", "response[0].id"))?;
        Ok(SavedPhoto { owner_id, media_id })
    }

    /// Step 4: publish the post. The attachment reference is the literal
    /// `photo{owner_id}_{media_id}` form wall.post expects, and the owner
    /// is the negated group id (negation marks a group-owned wall).
    pub fn post_to_wall(&self, photo: SavedPhoto, message: &str) -> Result<i64> {
        let url = self.method_url("wall.post");
        let mut params = self.credential_params();
        params.push(("from_group".into(), "1".into()));
        params.push(("message".into(), message.to_string()));
        params.push((
            "attachments".into(),
            format!("photo{}_{}", photo.owner_id, photo.media_id),
        ));
        params.push(("owner_id".into(), format!("-{}", self.config.group_id)));

        let response = self
            .client
            .post(&url)
            .query(&params)
            .send()
            .map_err(Error::Http)?;
        let body = read_api_body(response)?;
        let post_id = body
            .pointer("/response/post_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| missing_field("wall.post", "response.post_id"))?;
        info!("published wall post {}", post_id);
        Ok(post_id)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Every call builds its own parameter set from these named fields;
    /// nothing threads a mutable map between calls.
    fn credential_params(&self) -> Vec<(String, String)> {
        vec![
            ("access_token".into(), self.config.access_token.clone()),
            ("group_id".into(), self.config.group_id.clone()),
            ("v".into(), VK_API_VERSION.into()),
        ]
    }
}

/// Reject non-2xx statuses, parse the body as JSON, and reject in-band
/// errors. All four protocol calls funnel their responses through here.
fn read_api_body(response: reqwest::blocking::Response) -> Result<Value> {
    let response = response.error_for_status().map_err(Error::Http)?;
    let body: Value = response.json().map_err(Error::Http)?;
    check_in_band_error(&body)?;
    Ok(body)
}

/// VK reports failures inside a 200 body: `{"error": {"error_code": ...,
/// "error_msg": ...}}`. Presence of the key is the failure signal.
fn check_in_band_error(body: &Value) -> Result<()> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    Err(Error::Api {
        code: error.get("error_code").and_then(Value::as_i64).unwrap_or(0),
        message: error
            .get("error_msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
    })
}

fn missing_field(method: &str, field: &str) -> Error {
    Error::Api {
        code: 0,
        message: format!("{} answered without {}", method, field),
    }
}

/// Token fields go back to VK as query parameters, so JSON strings are
/// used as-is and everything else keeps its literal JSON spelling.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
