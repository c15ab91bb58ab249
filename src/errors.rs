use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum DeviceMatcherError {
    /// 必填输入为空（device id、OS 名称、User-Agent）
    Validation(String),
    /// User-Agent 无法拆解为 OS / 浏览器字段
    Parsing {
        message: String,
        input: String,
        cause: String,
    },
    /// 设备匹配流程中的任意失败，包装底层错误
    DeviceMatch {
        context: String,
        source: Box<DeviceMatcherError>,
    },
    NotFound(String),
    Storage(String),
    Config(String),
}

impl DeviceMatcherError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            DeviceMatcherError::Validation(_) => "E001",
            DeviceMatcherError::Parsing { .. } => "E002",
            DeviceMatcherError::DeviceMatch { .. } => "E003",
            DeviceMatcherError::NotFound(_) => "E004",
            DeviceMatcherError::Storage(_) => "E005",
            DeviceMatcherError::Config(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            DeviceMatcherError::Validation(_) => "Validation Error",
            DeviceMatcherError::Parsing { .. } => "User-Agent Parsing Error",
            DeviceMatcherError::DeviceMatch { .. } => "Device Match Error",
            DeviceMatcherError::NotFound(_) => "Resource Not Found",
            DeviceMatcherError::Storage(_) => "Storage Error",
            DeviceMatcherError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            DeviceMatcherError::Validation(msg) => msg.clone(),
            DeviceMatcherError::Parsing { message, cause, .. } => {
                format!("{} ({})", message, cause)
            }
            DeviceMatcherError::DeviceMatch { context, source } => {
                format!("{}: {}", context, source.message())
            }
            DeviceMatcherError::NotFound(msg) => msg.clone(),
            DeviceMatcherError::Storage(msg) => msg.clone(),
            DeviceMatcherError::Config(msg) => msg.clone(),
        }
    }

    /// HTTP status for this error.
    ///
    /// A `DeviceMatch` takes the status of the error it wraps, so a parse
    /// failure stays a 400 and a storage failure stays a 500.
    pub fn http_status(&self) -> StatusCode {
        match self {
            DeviceMatcherError::Validation(_) | DeviceMatcherError::Parsing { .. } => {
                StatusCode::BAD_REQUEST
            }
            DeviceMatcherError::DeviceMatch { source, .. } => source.http_status(),
            DeviceMatcherError::NotFound(_) => StatusCode::NOT_FOUND,
            DeviceMatcherError::Storage(_) | DeviceMatcherError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The innermost error of a `DeviceMatch` chain (or `self`).
    pub fn root_cause(&self) -> &DeviceMatcherError {
        match self {
            DeviceMatcherError::DeviceMatch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Prefix storage messages with the operation that produced them.
    pub fn with_context<T: Into<String>>(self, context: T) -> Self {
        match self {
            DeviceMatcherError::Storage(msg) => {
                DeviceMatcherError::Storage(format!("{}: {}", context.into(), msg))
            }
            other => other,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for DeviceMatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for DeviceMatcherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceMatcherError::DeviceMatch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// 便捷的构造函数
impl DeviceMatcherError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        DeviceMatcherError::Validation(msg.into())
    }

    pub fn parsing<M, I, C>(message: M, input: I, cause: C) -> Self
    where
        M: Into<String>,
        I: Into<String>,
        C: fmt::Display,
    {
        DeviceMatcherError::Parsing {
            message: message.into(),
            input: input.into(),
            cause: cause.to_string(),
        }
    }

    pub fn device_match<T: Into<String>>(context: T, source: DeviceMatcherError) -> Self {
        DeviceMatcherError::DeviceMatch {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DeviceMatcherError::NotFound(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        DeviceMatcherError::Storage(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        DeviceMatcherError::Config(msg.into())
    }
}

impl From<redis::RedisError> for DeviceMatcherError {
    fn from(err: redis::RedisError) -> Self {
        DeviceMatcherError::Storage(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for DeviceMatcherError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DeviceMatcherError::Storage(format!("storage call timed out: {}", err))
    }
}

impl From<config::ConfigError> for DeviceMatcherError {
    fn from(err: config::ConfigError) -> Self {
        DeviceMatcherError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeviceMatcherError>;
