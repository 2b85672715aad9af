use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub enum ResourceType {
    Assignment,
    Recording,
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ResourceType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的资源类型: '{s}'. 支持的类型: assignment, recording"
            ))
        })
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Assignment => write!(f, "assignment"),
            ResourceType::Recording => write!(f, "recording"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assignment" => Ok(ResourceType::Assignment),
            "recording" => Ok(ResourceType::Recording),
            _ => Err(format!("Invalid resource type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub struct Resource {
    pub id: i64,
    pub batch_id: i64,
    pub title: String,
    pub resource_type: ResourceType,
    pub file_name: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub stored_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 带序号与锁定状态的资源视图
///
/// `index` 为按 (created_at, id) 排序后的 0 起位置，`interval = index / 5 + 1`。
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/resource.ts")]
pub struct SequencedResource {
    #[serde(flatten)]
    #[ts(flatten)]
    pub resource: Resource,
    pub index: i64,
    pub interval: i64,
    pub locked: bool,
}
