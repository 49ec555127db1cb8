//! Error type shared by every stage of the profile pipeline.
//!
//! Every variant renders a message that can be shown to the user as-is; the CLI
//! prints `Display` output without further decoration.

use std::path::PathBuf;

/// Failure of any pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Unknown region or output target, or an unusable runtime setting.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Missing/invalid authorization code, rejected token exchange, or a 401
    /// from the account endpoint.
    #[error("{0}")]
    Authentication(String),

    /// Any other non-success HTTP status.
    #[error("Invalid HTTP response received: {status}")]
    Http { status: u16 },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// A success response whose body was not the expected JSON shape.
    #[error("Unexpected server response: {0}")]
    InvalidResponse(String),

    /// Payload is not a readable zip archive, or the archive could not be rewritten.
    #[error("Could not read appliance archive: {0}")]
    ArchiveFormat(String),

    /// A device description or feature mapping document could not be parsed.
    #[error("Could not parse appliance XML: {0}")]
    XmlFormat(String),

    /// An output document could not be encoded as JSON.
    #[error("Could not encode {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("No appliances found for this account!")]
    NoAppliances,

    #[error("Could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProfileError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ProfileError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ProfileError::Http {
                status: status.as_u16(),
            },
            None => ProfileError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_displayable() {
        assert_eq!(
            ProfileError::Http { status: 500 }.to_string(),
            "Invalid HTTP response received: 500"
        );
        assert_eq!(
            ProfileError::NoAppliances.to_string(),
            "No appliances found for this account!"
        );
        assert_eq!(
            ProfileError::Authentication("Wrong region used! Try a different region.".into())
                .to_string(),
            "Wrong region used! Try a different region."
        );
    }

    #[test]
    fn serialization_errors_name_the_document() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ProfileError::Serialization {
            what: "device configuration",
            source,
        };
        assert!(err
            .to_string()
            .starts_with("Could not encode device configuration: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
