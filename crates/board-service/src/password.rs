//! 密码处理
//!
//! 群组、帖子、评论的修改与删除都需要校验创建时设置的密码

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::{BoardError, Result};

/// 默认哈希成本
pub const DEFAULT_HASH_COST: u32 = DEFAULT_COST;

/// 使用指定成本对密码进行 bcrypt 哈希
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    hash(password, cost).map_err(|e| BoardError::Internal(format!("密码哈希失败: {}", e)))
}

/// 比较明文密码与存储的哈希值
pub fn verify_password(password: &str, hashed: &str) -> Result<bool> {
    verify(password, hashed).map_err(|e| BoardError::Internal(format!("密码验证失败: {}", e)))
}

/// 校验密码，不匹配时返回 `PasswordMismatch`
pub fn ensure_password(password: &str, hashed: &str) -> Result<()> {
    if verify_password(password, hashed)? {
        Ok(())
    } else {
        Err(BoardError::PasswordMismatch)
    }
}
