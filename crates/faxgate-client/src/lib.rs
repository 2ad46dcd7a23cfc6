//! # faxgate-client
//!
//! Client for the upstream fax API.
//!
//! The gateway only depends on the [`FaxApi`] trait; [`FaxClient`] is the
//! reqwest-backed implementation. [`DocumentFetcher`] downloads documents
//! referenced by URL before they are submitted.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod fetch;
pub mod types;

pub use client::{FaxApi, FaxClient};
pub use error::{Error, Result};
pub use fetch::{DEFAULT_MAX_FETCH_BYTES, DocumentFetcher, FetchedDocument};
pub use types::{DocumentKind, FaxDocument, FaxJob, InboundFax, InboundPdf};
