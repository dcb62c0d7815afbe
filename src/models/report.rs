use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Issue;
use crate::error::{Error, Result};

/// 設定上の名前付きレポート定義
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub jql: String,
    #[serde(default)]
    pub output_fields: Vec<String>,
    #[serde(default)]
    pub count_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
}

impl ReportConfig {
    /// レポートタイトルを返す（未設定時は定義名）
    pub fn report_title(&self) -> &str {
        match self.report_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }

    /// 読み込んだ定義の必須項目を検証する
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "Report config name must not be empty".to_string(),
            ));
        }
        if self.jql.trim().is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "Report config '{}' has no JQL query",
                self.name.trim()
            )));
        }
        Ok(())
    }
}

/// レポート出力1カラムの定義
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub key: String,
    pub header: String,
    pub console_width: usize,
}

/// グループ集計の1行
#[derive(Debug, Clone, PartialEq)]
pub struct CountRow {
    pub name: String,
    pub count: usize,
}

/// グループ集計テーブル
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    pub title: String,
    pub rows: Vec<CountRow>,
}

/// コンソール・PDF出力に渡すレポートデータ一式
#[derive(Debug, Clone)]
pub struct JqlReport {
    pub title: String,
    pub config_name: Option<String>,
    pub jql: String,
    pub generated_at: DateTime<Utc>,
    pub issues: Vec<Issue>,
    pub count_tables: Vec<CountTable>,
}

impl JqlReport {
    /// 取得済みissue一覧からレポートデータを組み立てる
    pub fn create(
        title: &str,
        config_name: Option<&str>,
        jql: &str,
        issues: Vec<Issue>,
        count_tables: Vec<CountTable>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Report title must not be empty".to_string(),
            ));
        }
        if jql.trim().is_empty() {
            return Err(Error::InvalidInput(
                "JQL query must not be empty".to_string(),
            ));
        }

        Ok(Self {
            title: title.trim().to_string(),
            config_name: config_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            jql: jql.trim().to_string(),
            generated_at,
            issues,
            count_tables,
        })
    }
}
