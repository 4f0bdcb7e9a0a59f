//! Utility modules for snap-fetch
//!
//! - `files`: output directory layout
//! - `images`: canonical image format and conversion
//! - `http`: HTTP client setup
//! - `progress`: progress bars and the log writer that coexists with them

pub mod files;
pub mod http;
pub mod images;
pub mod progress;
