use hrms_core::error::CoreError;

/// Errors from the HRMS client layer.
///
/// Wraps [`CoreError`] for state-machine violations and adds transport
/// variants. [`ClientError::user_message`] gives the text shown in the
/// transient notification.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("HRMS API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A domain-level error from `hrms_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience type alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

/// JSON keys the backend uses for error messages, in lookup order.
const MESSAGE_KEYS: &[&str] = &["error", "detail", "message"];

impl ClientError {
    /// Free-text message suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Request(err) if err.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ClientError::Request(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Api { status, body } => {
                extract_message(body).unwrap_or_else(|| match status {
                    401 => "Your session has expired. Please sign in again.".to_string(),
                    403 => "You do not have permission to perform this action.".to_string(),
                    404 => "The requested resource was not found.".to_string(),
                    _ => format!("The server rejected the request ({status})."),
                })
            }
            ClientError::Core(CoreError::Internal(_)) => "An internal error occurred".to_string(),
            ClientError::Core(CoreError::Validation(msg))
            | ClientError::Core(CoreError::Forbidden(msg)) => msg.clone(),
            ClientError::Core(err @ CoreError::NotFound { .. }) => err.to_string(),
            ClientError::Config(msg) => msg.clone(),
        }
    }
}

/// Pull a message out of a JSON error body such as `{"error": "..."}`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    MESSAGE_KEYS.iter().find_map(|key| match value.get(*key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, body: &str) -> ClientError {
        ClientError::Api {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn api_message_comes_from_json_body() {
        assert_eq!(
            api(422, r#"{"error": "Column 'Emp No' is required"}"#).user_message(),
            "Column 'Emp No' is required"
        );
        assert_eq!(api(400, r#"{"detail": ["Bad file"]}"#).user_message(), "Bad file");
        assert_eq!(api(400, r#"{"message": "Nope"}"#).user_message(), "Nope");
    }

    #[test]
    fn api_message_falls_back_to_status() {
        assert_eq!(
            api(403, "<html>forbidden</html>").user_message(),
            "You do not have permission to perform this action."
        );
        assert_eq!(
            api(502, "").user_message(),
            "The server rejected the request (502)."
        );
    }

    #[test]
    fn core_errors_keep_their_message() {
        let err = ClientError::from(CoreError::Validation("Pick a file first".into()));
        assert_eq!(err.user_message(), "Pick a file first");

        let internal = ClientError::from(CoreError::Internal("stack trace".into()));
        assert_eq!(internal.user_message(), "An internal error occurred");
    }
}
