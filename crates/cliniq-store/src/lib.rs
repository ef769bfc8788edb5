// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Durable chat-session records.
//!
//! The whole history lives under one key of a flat [`BlobStore`] as a JSON
//! array of [`ChatRecord`]s.  [`SessionStore`] layers ordering, identity and
//! title rules on top; [`export`] turns a record into a plain-text file.
mod blob;
mod error;
pub mod export;
mod record;
mod store;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use export::{export_file_name, export_transcript};
pub use record::{derive_title, ChatRecord, RecordDraft};
pub use store::{Clock, SessionStore};
