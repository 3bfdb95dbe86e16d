// Library root
// -----------
// This crate exposes the posting pipeline as a small library; the two
// binaries under `src/bin/` are one-liners over it (one per mode).
//
// Module responsibilities:
// - `config`: VK credentials read once from the environment into an
//   explicit struct that gets passed around.
// - `error`: the error taxonomy every stage maps its failures into.
// - `comic`: fetches comic metadata from the xkcd API (latest or random).
// - `image`: downloads the comic image into a local folder, with
//   filename sanitization.
// - `vk`: the four-call VK group wall upload protocol.
// - `pipeline`: runs the stages in order and guarantees the downloaded
//   file is removed afterwards.
//
// Keeping the HTTP clients behind injectable base URLs makes the whole
// pipeline exercisable against a local server in the tests.
pub mod comic;
pub mod config;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod vk;
