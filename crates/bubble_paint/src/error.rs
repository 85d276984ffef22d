//! Bubble error types
//!
//! Geometry and compositing never fail; errors only come from the edges of
//! the crate: configuration documents and the raster surface.

use std::io;
use thiserror::Error;

/// Errors that can occur when loading configuration or rendering to pixels
#[derive(Error, Debug)]
pub enum BubbleError {
    /// Malformed TOML configuration
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// State could not be written as TOML
    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Raster surface could not be allocated
    #[error("invalid surface size {width}x{height}")]
    Surface { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("encoding error: {0}")]
    Encode(String),

    /// IO error when writing output
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for fallible bubble operations
pub type Result<T> = std::result::Result<T, BubbleError>;
