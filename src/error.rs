//! Error types for the banknote_verify library

use thiserror::Error;

/// Result type alias for banknote_verify operations
pub type Result<T> = std::result::Result<T, VerificationError>;

/// Error types for note verification operations
#[derive(Error, Debug)]
pub enum VerificationError {
    /// Input raster is not a non-empty 8-bit, 3-channel image of usable size
    #[error("Invalid image format: {reason}")]
    InvalidImageFormat { reason: String },

    /// Image file could not be opened or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File extension does not map to a decodable format
    #[error("Unsupported image format: {path} (supported: {supported})")]
    UnsupportedFormat { path: String, supported: String },

    /// Denomination outside the supported set
    #[error("Unknown denomination: {value} (expected one of 100, 200, 500, 2000)")]
    UnknownDenomination { value: String },

    /// Configuration could not be read, written or validated
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },

    /// Generic processing error
    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

impl VerificationError {
    /// Create an invalid image format error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImageFormat {
            reason: reason.into(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Check if retaking or re-exporting the photo could resolve this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VerificationError::InvalidImageFormat { .. }
                | VerificationError::ImageLoadError { .. }
                | VerificationError::UnsupportedFormat { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            VerificationError::UnsupportedFormat { supported, .. } => {
                format!("This file type is not supported. Please upload one of: {}.", supported)
            }
            VerificationError::UnknownDenomination { .. } => {
                "Please select one of the supported denominations: 100, 200, 500 or 2000.".to_string()
            }
            VerificationError::ConfigError { .. } => {
                "The detection settings could not be loaded. Check the configuration file.".to_string()
            }
            _ => {
                "Error processing image. Please ensure the image is clear and properly lit.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_image_is_recoverable() {
        let err = VerificationError::invalid_image("expected 3 channels, found 1");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("3 channels"));
        assert!(err.user_message().contains("properly lit"));
    }

    #[test]
    fn test_config_error_not_recoverable() {
        let err = VerificationError::config("block size must be odd");
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("configuration"));
    }

    #[test]
    fn test_unknown_denomination_message() {
        let err = VerificationError::UnknownDenomination {
            value: "50".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown denomination: 50 (expected one of 100, 200, 500, 2000)"
        );
    }
}
