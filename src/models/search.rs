use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 検索レスポンス1ページ分
///
/// カーソル版（`/search/jql`）とレガシー版（`/search`）の両方の
/// レスポンスをこの1つのDTOで受ける。存在しないプロパティは
/// デフォルト値になる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<RawIssue>,

    #[serde(rename = "isLast")]
    #[serde(default)]
    pub is_last: bool,

    #[serde(rename = "nextPageToken")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    #[serde(default)]
    pub total: u32,
}

/// 検索レスポンス内のissue項目
///
/// フィールド値の形はデプロイごとに異なるため、`fields`は
/// 生のJSONのまま保持して正規化側に委ねる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}
