use std::fmt::{Display, Formatter};

pub type DrProbeResult<T> = Result<T, DrProbeError>;
pub type DocumentResult<T> = DrProbeResult<T>;
pub type ToolResult<T> = DrProbeResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrProbeErrorCategory {
    MalformedDocument,
    FileSystemError,
    ExternalToolError,
    InternalError,
}

impl DrProbeErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::MalformedDocument => 2,
            Self::FileSystemError => 3,
            Self::ExternalToolError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedDocument => "MalformedDocument",
            Self::FileSystemError => "FileSystemError",
            Self::ExternalToolError => "ExternalToolError",
            Self::InternalError => "InternalError",
        }
    }
}

impl Display for DrProbeErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} [{placeholder}] {message}")]
pub struct DrProbeError {
    category: DrProbeErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl DrProbeError {
    pub fn new(
        category: DrProbeErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn malformed_document(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DrProbeErrorCategory::MalformedDocument, placeholder, message)
    }

    pub fn file_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DrProbeErrorCategory::FileSystemError, placeholder, message)
    }

    pub fn external_tool(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DrProbeErrorCategory::ExternalToolError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DrProbeErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> DrProbeErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{DrProbeError, DrProbeErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (DrProbeErrorCategory::MalformedDocument, 2, "MalformedDocument"),
            (DrProbeErrorCategory::FileSystemError, 3, "FileSystemError"),
            (DrProbeErrorCategory::ExternalToolError, 4, "ExternalToolError"),
            (DrProbeErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn error_renders_category_placeholder_and_message() {
        let error = DrProbeError::malformed_document(
            "PARSE.MSA_LINE",
            "line 6: expected a float for 'wavelength', found 'abc'",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.to_string(),
            "MalformedDocument [PARSE.MSA_LINE] line 6: expected a float for 'wavelength', found 'abc'"
        );
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [PARSE.MSA_LINE] line 6: expected a float for 'wavelength', found 'abc'"
        );
    }
}
