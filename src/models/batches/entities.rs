use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 班次状态，仅作标记，无状态迁移约束
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub enum BatchStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl<'de> Deserialize<'de> for BatchStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<BatchStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的班次状态: '{s}'. 支持的状态: upcoming, ongoing, completed"
            ))
        })
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Upcoming => write!(f, "upcoming"),
            BatchStatus::Ongoing => write!(f, "ongoing"),
            BatchStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(BatchStatus::Upcoming),
            "ongoing" => Ok(BatchStatus::Ongoing),
            "completed" => Ok(BatchStatus::Completed),
            _ => Err(format!("Invalid batch status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct Batch {
    pub id: i64,
    pub course_id: i64,
    pub instructor_id: i64,
    pub name: String,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub status: BatchStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 班次学员
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchStudent {
    pub student_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub email: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}
