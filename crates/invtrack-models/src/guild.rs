use serde::{Deserialize, Serialize};

pub const FEATURE_VANITY_URL: &str = "VANITY_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: i64,
    #[serde(default)]
    pub member_count: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub vanity_url_code: Option<String>,
}

impl Guild {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f.eq_ignore_ascii_case(feature))
    }

    /// A guild accepts joins through its vanity link when it has a code set
    /// or advertises the vanity feature.
    pub fn has_vanity_url(&self) -> bool {
        self.vanity_url_code
            .as_deref()
            .is_some_and(|code| !code.is_empty())
            || self.has_feature(FEATURE_VANITY_URL)
    }
}
