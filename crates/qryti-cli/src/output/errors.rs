//! Error message formatting with actionable suggestions.

use std::error::Error;

use qryti_core::error::QrytiError;

use super::colors::ColorSupport;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error for the terminal.
    ///
    /// Leads with the user-level message, then the technical detail when it
    /// adds anything, then a suggestion and the source chain.
    pub fn format_error(&self, error: &QrytiError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.user_message());
        output.push('\n');

        let detail = error.to_string();
        if detail != error.user_message() {
            output.push_str(&self.colors.dim("detail"));
            output.push_str(": ");
            output.push_str(&detail);
            output.push('\n');
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            output.push('\n');
            source = err.source();
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_credentials_error_layout() {
        let error = QrytiError::from_status(401, serde_json::json!({ "error": "Invalid credentials" }));
        let formatted = plain().format_error(&error);

        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(
            lines[0],
            "error: Invalid credentials or expired session. Please sign in again."
        );
        assert_eq!(lines[1], "detail: Authentication failed: Invalid credentials");
        assert_eq!(lines[2], "help: Run 'qryti login' to start a new session");
    }

    #[test]
    fn test_connectivity_error_shows_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let error = QrytiError::network("Request to http://localhost failed".to_string(), io);
        let formatted = plain().format_error(&error);

        assert!(formatted.starts_with("error: Unable to reach the compliance service"));
        assert!(formatted.contains("caused by: connection refused"));
    }

    #[test]
    fn test_rejected_error_layout() {
        let error = QrytiError::Rejected {
            message: "Subscription expired".to_string(),
        };
        let formatted = plain().format_error(&error);
        assert_eq!(
            formatted,
            "error: Subscription expired\ndetail: Backend reported failure: Subscription expired\n"
        );
    }
}
