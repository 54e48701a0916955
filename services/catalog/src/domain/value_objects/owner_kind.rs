//! Owner 类型

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 可以持有图片的目录实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    PhysicalGood,
    Seminar,
    Course,
    TrainingSession,
}

impl OwnerKind {
    pub const ALL: [OwnerKind; 4] = [
        OwnerKind::PhysicalGood,
        OwnerKind::Seminar,
        OwnerKind::Course,
        OwnerKind::TrainingSession,
    ];

    /// 图片关联表 `owner_kind` 列中的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::PhysicalGood => "physical_good",
            OwnerKind::Seminar => "seminar",
            OwnerKind::Course => "course",
            OwnerKind::TrainingSession => "training_session",
        }
    }

    /// 实体所在的表
    pub fn table_name(&self) -> &'static str {
        match self {
            OwnerKind::PhysicalGood => "physical_goods",
            OwnerKind::Seminar => "seminars",
            OwnerKind::Course => "courses",
            OwnerKind::TrainingSession => "training_sessions",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown owner kind: {0}")]
pub struct UnknownOwnerKind(pub String);

impl FromStr for OwnerKind {
    type Err = UnknownOwnerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OwnerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownOwnerKind(s.to_string()))
    }
}
