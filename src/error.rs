//! Error types for rigcloud.
//!
//! Generation and per-frame evaluation are total functions and never fail.
//! The only failures are malformed configuration (caught when a scene,
//! camera path or attribute set is constructed) and loading that
//! configuration from disk.

use std::fmt;

/// Fatal configuration errors, detected at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A camera path needs at least two keyframes.
    TooFewKeyframes {
        /// Number of keyframes supplied.
        count: usize,
    },
    /// The first keyframe must be anchored at 0.0 and the last at 1.0.
    KeyframeAnchors {
        /// Anchor of the first keyframe.
        first: f32,
        /// Anchor of the last keyframe.
        last: f32,
    },
    /// Keyframe anchors must be nondecreasing (and finite).
    KeyframeOrder {
        /// Index of the first keyframe whose anchor is smaller than its predecessor's.
        index: usize,
    },
    /// Parallel particle arrays must have identical lengths.
    AttributeLengthMismatch {
        /// Number of target points.
        points: usize,
        /// Number of reveal delays.
        delays: usize,
    },
    /// A sampling density is above the supported maximum.
    DensityOutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
        /// Largest accepted density.
        max: f32,
    },
    /// A shape dimension or count must be positive and finite.
    InvalidDimension {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooFewKeyframes { count } => write!(
                f,
                "Camera path needs at least 2 keyframes spanning 0.0..=1.0, got {}",
                count
            ),
            ConfigError::KeyframeAnchors { first, last } => write!(
                f,
                "Camera keyframes must start at anchor 0.0 and end at 1.0, got {} and {}",
                first, last
            ),
            ConfigError::KeyframeOrder { index } => write!(
                f,
                "Camera keyframe {} has an anchor smaller than the previous keyframe",
                index
            ),
            ConfigError::AttributeLengthMismatch { points, delays } => write!(
                f,
                "Particle attribute arrays differ in length: {} points vs {} delays",
                points, delays
            ),
            ConfigError::DensityOutOfRange { field, value, max } => {
                write!(f, "{} must be at most {} points per unit, got {}", field, max, value)
            }
            ConfigError::InvalidDimension { field, value } => {
                write!(f, "{} must be positive and finite, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur when building a scene or loading its configuration.
#[derive(Debug)]
pub enum SceneError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// Failed to read or write a configuration file.
    Io(std::io::Error),
    /// Failed to parse or serialize JSON.
    Json(serde_json::Error),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Config(e) => write!(f, "Invalid scene configuration: {}", e),
            SceneError::Io(e) => write!(f, "Failed to access scene configuration file: {}", e),
            SceneError::Json(e) => write!(f, "Malformed scene configuration JSON: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Config(e) => Some(e),
            SceneError::Io(e) => Some(e),
            SceneError::Json(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SceneError {
    fn from(e: ConfigError) -> Self {
        SceneError::Config(e)
    }
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        SceneError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::AttributeLengthMismatch { points: 10, delays: 9 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("9"));
    }

    #[test]
    fn test_scene_error_source() {
        let err: SceneError = ConfigError::TooFewKeyframes { count: 1 }.into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("at least 2 keyframes"));
    }
}
