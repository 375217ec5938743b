//! Common types used throughout Lexportal

use serde::{Deserialize, Serialize};

/// Entity families that own uploaded assets.
///
/// The category doubles as the first segment of every destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Clients,
    Lawyers,
    News,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Lawyers => "lawyers",
            Self::News => "news",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "clients" => Some(Self::Clients),
            "lawyers" => Some(Self::Lawyers),
            "news" => Some(Self::News),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
