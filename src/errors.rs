use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnaplinkError {
    InvalidUrl(String),
    InvalidValidity(String),
    InvalidShortcode(String),
    NotFound(String),
    Expired(String),
    DuplicateCode(String),
    CodeSpaceExhausted(String),
    Config(String),
    FileOperation(String),
}

impl SnaplinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::InvalidUrl(_) => "E001",
            SnaplinkError::InvalidValidity(_) => "E002",
            SnaplinkError::InvalidShortcode(_) => "E003",
            SnaplinkError::NotFound(_) => "E004",
            SnaplinkError::Expired(_) => "E005",
            SnaplinkError::DuplicateCode(_) => "E006",
            SnaplinkError::CodeSpaceExhausted(_) => "E007",
            SnaplinkError::Config(_) => "E008",
            SnaplinkError::FileOperation(_) => "E009",
        }
    }

    /// Client-facing error text, used as the `error` field of JSON bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::InvalidUrl(_) => "Invalid URL format",
            SnaplinkError::InvalidValidity(_) => "Invalid validity",
            SnaplinkError::InvalidShortcode(_) => "Invalid shortcode format",
            SnaplinkError::NotFound(_) => "Shortcode not found",
            SnaplinkError::Expired(_) => "Shortcode expired",
            SnaplinkError::DuplicateCode(_) => "Shortcode already in use",
            SnaplinkError::CodeSpaceExhausted(_) => "Could not allocate a shortcode",
            SnaplinkError::Config(_) | SnaplinkError::FileOperation(_) => "Internal Server Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SnaplinkError::InvalidUrl(msg)
            | SnaplinkError::InvalidValidity(msg)
            | SnaplinkError::InvalidShortcode(msg)
            | SnaplinkError::NotFound(msg)
            | SnaplinkError::Expired(msg)
            | SnaplinkError::DuplicateCode(msg)
            | SnaplinkError::CodeSpaceExhausted(msg)
            | SnaplinkError::Config(msg)
            | SnaplinkError::FileOperation(msg) => msg,
        }
    }

    /// HTTP status the error maps to at the handler boundary
    pub fn http_status(&self) -> StatusCode {
        match self {
            SnaplinkError::InvalidUrl(_)
            | SnaplinkError::InvalidValidity(_)
            | SnaplinkError::InvalidShortcode(_) => StatusCode::BAD_REQUEST,
            SnaplinkError::NotFound(_) => StatusCode::NOT_FOUND,
            SnaplinkError::Expired(_) => StatusCode::GONE,
            SnaplinkError::DuplicateCode(_) => StatusCode::CONFLICT,
            SnaplinkError::CodeSpaceExhausted(_)
            | SnaplinkError::Config(_)
            | SnaplinkError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("[{}] {}: {}", self.code(), self.error_type(), self.message())
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SnaplinkError {}

// 便捷的构造函数
impl SnaplinkError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidUrl(msg.into())
    }

    pub fn invalid_validity<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidValidity(msg.into())
    }

    pub fn invalid_shortcode<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidShortcode(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Expired(msg.into())
    }

    pub fn duplicate_code<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DuplicateCode(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::CodeSpaceExhausted(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::FileOperation(msg.into())
    }
}

impl From<std::io::Error> for SnaplinkError {
    fn from(err: std::io::Error) -> Self {
        SnaplinkError::FileOperation(err.to_string())
    }
}

impl From<config::ConfigError> for SnaplinkError {
    fn from(err: config::ConfigError) -> Self {
        SnaplinkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SnaplinkError {
    fn from(err: toml::ser::Error) -> Self {
        SnaplinkError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;
