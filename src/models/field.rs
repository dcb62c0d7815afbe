use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(rename = "clauseNames")]
    #[serde(default)]
    pub clause_names: Vec<String>,
}

impl FieldDefinition {
    /// このフィールドの正規APIキーを返す
    ///
    /// issue検索レスポンスの`fields`オブジェクトはフィールドidを
    /// キーに使うため、idを優先しkeyにフォールバックする。
    pub fn canonical_key(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
            })
    }
}
