//! Reading Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 阅读会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingSessionId(Uuid);

impl ReadingSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReadingSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReadingSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(concat!($label, " 不能为空"));
                }
                if trimmed.len() > 128 {
                    return Err(concat!($label, " 长度不能超过128字符"));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// 学习资料标识（由外部后端分配）
    MaterialId,
    "materialId"
);

string_id!(
    /// 学生标识
    StudentId,
    "studentId"
);

string_id!(
    /// 课程标识
    CourseId,
    "courseId"
);
