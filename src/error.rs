//! Error types shared by every stage of the pixmap pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while resolving, configuring, or rendering icons.
///
/// Nothing in this crate retries or substitutes a fallback image; every
/// variant reaches the caller unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// A logical icon identifier could not be resolved to a source.
    #[error("unable to locate icon '{name}'")]
    ImageNotFound {
        /// The identifier as given by the caller.
        name: String,
    },

    /// An animation was configured with an empty frame range.
    #[error("invalid animation config: min frame {min} exceeds max frame {max}")]
    InvalidAnimationConfig { min: u32, max: u32 },

    /// A pixmap was requested at a size with a zero dimension.
    #[error("cannot render into an empty {width}x{height} buffer")]
    EmptySize { width: u32, height: u32 },

    /// The rasterizer rejected the resolved source.
    #[error("failed to parse svg '{identity}': {message}")]
    InvalidSvg { identity: String, message: String },

    /// Reading a resolved icon file failed.
    #[error("failed to read icon file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A color string was not `#rrggbb` or `#rrggbbaa`.
    #[error("invalid color '{0}', expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    /// A profile could not be (de)serialized.
    #[error("invalid icon profile: {0}")]
    Profile(#[from] serde_json::Error),

    /// A profile state references an animation name that is not declared.
    #[error("icon profile references unknown animation '{0}'")]
    UnknownAnimation(String),

    /// A profile declares no state for the normal mode.
    #[error("icon profile has no state for the normal mode")]
    MissingDefaultState,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
