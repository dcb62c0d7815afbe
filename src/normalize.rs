use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::models::{Issue, MISSING_FIELD_VALUE, SearchPage};

/// オブジェクト値から表示値を探すプロパティの優先順
const OBJECT_DISPLAY_KEYS: [&str; 4] = ["displayName", "name", "value", "key"];

/// 正規化済みフィールド値
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedValue {
    /// カラム表示用の平坦化済み文字列
    pub display: String,
    /// 配列由来フィールドの個別値（それ以外は空）
    pub items: Vec<String>,
}

impl NormalizedValue {
    fn missing() -> Self {
        Self {
            display: MISSING_FIELD_VALUE.to_string(),
            items: Vec::new(),
        }
    }
}

/// 検索ページのissue項目をレポート用issue行へ変換する
///
/// キーが空のissueは重複除去できないため黙って破棄する。
/// エイリアスマップに載っているフィールドは、登録された全エイリアス名
/// からも同じ値を参照できるように展開する。
pub fn map_search_page(
    page: &SearchPage,
    aliases_by_field: &HashMap<String, Vec<String>>,
) -> Vec<Issue> {
    let aliases_lookup: HashMap<String, &Vec<String>> = aliases_by_field
        .iter()
        .map(|(field_key, aliases)| (field_key.trim().to_lowercase(), aliases))
        .collect();

    page.issues
        .iter()
        .filter_map(|raw| {
            let key = raw.key.as_deref().map(str::trim).filter(|key| !key.is_empty())?;
            let mut issue = Issue::new(key);

            for (field_key, raw_value) in &raw.fields {
                let field_key = field_key.trim();
                if field_key.is_empty() {
                    continue;
                }

                let normalized = normalize_value(field_key, raw_value);
                if let Some(aliases) = aliases_lookup.get(&field_key.to_lowercase()) {
                    for alias in aliases.iter() {
                        issue.insert_field(alias, normalized.display.clone(), normalized.items.clone());
                    }
                }
                issue.insert_field(field_key, normalized.display, normalized.items);
            }

            Some(issue)
        })
        .collect()
}

/// 生のJSONフィールド値を表示文字列へ正規化する
///
/// 配列は欠損要素を除いた上で大文字小文字を区別せず重複除去し、
/// 初出順を保って`", "`で結合する。使える要素がひとつも無い配列は
/// 欠損扱い。`created`/`updated`はISO-8601として解釈できる場合に
/// 日付（`yyyy-MM-dd`）へ畳み込む。
pub fn normalize_value(field_key: &str, raw_value: &Value) -> NormalizedValue {
    if let Value::Array(elements) = raw_value {
        let items = extract_array_items(elements);
        if items.is_empty() {
            return NormalizedValue::missing();
        }
        let display = items.join(", ");
        return NormalizedValue { display, items };
    }

    match extract_value(raw_value) {
        Some(value) => NormalizedValue {
            display: flatten_scalar(field_key, &value),
            items: Vec::new(),
        },
        None => NormalizedValue::missing(),
    }
}

fn extract_array_items(elements: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for element in elements {
        if let Some(item) = extract_value(element) {
            if seen.insert(item.to_lowercase()) {
                items.push(item);
            }
        }
    }

    items
}

fn extract_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => sanitize(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(elements) => {
            let items = extract_array_items(elements);
            if items.is_empty() {
                None
            } else {
                Some(items.join(", "))
            }
        }
        Value::Object(object) => OBJECT_DISPLAY_KEYS
            .iter()
            .find_map(|property| object.get(*property).and_then(extract_value)),
        Value::Null => None,
    }
}

fn sanitize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == MISSING_FIELD_VALUE {
        return None;
    }
    Some(trimmed.to_string())
}

fn flatten_scalar(field_key: &str, value: &str) -> String {
    if is_date_field(field_key) {
        if let Some(date) = flatten_date(value) {
            return date;
        }
    }
    value.to_string()
}

fn is_date_field(field_key: &str) -> bool {
    field_key.eq_ignore_ascii_case("created") || field_key.eq_ignore_ascii_case("updated")
}

fn flatten_date(value: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    // Jira Cloudはコロン無しオフセット（+0900）を返すことがある
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(parsed.format("%Y-%m-%d").to_string());
    }
    None
}
