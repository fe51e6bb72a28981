#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod access_url;
mod client;
mod error;
mod pacing;
mod pipeline;
mod record;
mod sink;

pub use access_url::*;
pub use client::*;
pub use error::*;
pub use pacing::*;
pub use pipeline::*;
pub use record::*;
pub use sink::*;
