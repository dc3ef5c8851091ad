//! 看板服务错误类型
//!
//! 定义 CRUD 层的业务错误和存储层的系统错误。
//! 徽章引擎内部的错误不会透传给触发它的请求。

use thiserror::Error;

/// 看板服务错误类型
#[derive(Debug, Error)]
pub enum BoardError {
    // === 实体查找 ===
    #[error("群组不存在: {0}")]
    GroupNotFound(i64),

    #[error("帖子不存在: {0}")]
    PostNotFound(i64),

    #[error("评论不存在: {0}")]
    CommentNotFound(i64),

    #[error("徽章不存在: {0}")]
    BadgeNotFound(i64),

    // === 访问控制 ===
    #[error("密码错误")]
    PasswordMismatch,

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("参数校验失败: {0}")]
    Validation(String),
}

/// 看板服务 Result 类型别名
pub type Result<T> = std::result::Result<T, BoardError>;

impl BoardError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) => true,
            // 只有连接池与网络层故障是暂时性的，约束冲突、解码失败等重试无意义
            Self::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }

    /// 检查是否为实体不存在类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_)
                | Self::PostNotFound(_)
                | Self::CommentNotFound(_)
                | Self::BadgeNotFound(_)
        )
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::StoreUnavailable(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::PostNotFound(_) => "POST_NOT_FOUND",
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::BadgeNotFound(_) => "BADGE_NOT_FOUND",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::Database(_) => "DATABASE_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for BoardError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(BoardError::StoreUnavailable("timeout".to_string()).is_retryable());
        assert!(BoardError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!BoardError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(!BoardError::GroupNotFound(1).is_retryable());
        assert!(!BoardError::PasswordMismatch.is_retryable());
    }

    #[test]
    fn test_only_transient_database_errors_are_retryable() {
        let transient = [
            sqlx::Error::PoolClosed,
            sqlx::Error::WorkerCrashed,
            sqlx::Error::Protocol("unexpected message".to_string()),
            sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
        ];
        for e in transient {
            assert!(BoardError::Database(e).is_retryable());
        }

        let deterministic = [
            sqlx::Error::ColumnNotFound("badge_count".to_string()),
            sqlx::Error::TypeNotFound {
                type_name: "badge_kind".to_string(),
            },
            sqlx::Error::Configuration("bad url".into()),
        ];
        for e in deterministic {
            assert!(!BoardError::Database(e).is_retryable());
        }
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(BoardError::PostNotFound(1).is_business_error());
        assert!(BoardError::PasswordMismatch.is_business_error());
        assert!(!BoardError::Internal("panic".to_string()).is_business_error());
        assert!(!BoardError::StoreUnavailable("down".to_string()).is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(BoardError::GroupNotFound(1).error_code(), "GROUP_NOT_FOUND");
        assert_eq!(BoardError::PasswordMismatch.error_code(), "PASSWORD_MISMATCH");
        assert_eq!(
            BoardError::StoreUnavailable("x".to_string()).error_code(),
            "STORE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(BoardError::CommentNotFound(3).is_not_found());
        assert!(!BoardError::Validation("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::{ValidationError, ValidationErrors};

        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));
        let err: BoardError = errors.into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("name"));
    }
}
