// Error taxonomy for the posting pipeline. Each stage maps its failures
// into one variant so the operator can tell from the message alone which
// call broke. No stage recovers locally; the first error aborts the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The comic API was unreachable, answered with a bad status, or
    /// returned JSON missing the expected fields.
    #[error("comic api: {0}")]
    Upstream(String),

    /// Fetching the raw image bytes failed.
    #[error("image download: {0}")]
    Download(String),

    /// A local write, rename or remove could not complete.
    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// VK reported an in-band error: HTTP 200 with an `error` object in
    /// the body instead of a `response`.
    #[error("vk api error {code}: {message}")]
    Api { code: i64, message: String },

    /// A VK request failed at the transport level or with a non-2xx status.
    #[error("vk request: {0}")]
    Http(#[source] reqwest::Error),

    /// A required environment variable is missing or empty.
    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Filesystem {
            context: context.into(),
            source,
        }
    }
}
