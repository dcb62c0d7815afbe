use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::{CountRow, CountTable, Issue, JqlReport, MISSING_FIELD_VALUE, OutputColumn};

/// フィールド未指定時の出力カラム順
const DEFAULT_OUTPUT_ORDER: [&str; 7] = [
    "key",
    "issuetype",
    "status",
    "assignee",
    "created",
    "updated",
    "summary",
];

/// フィールド未指定時のグループ集計順
const DEFAULT_COUNT_ORDER: [&str; 3] = ["status", "issuetype", "assignee"];

/// グループ名が空・欠損のときの表示
const UNKNOWN_GROUP: &str = "Unknown";

/// 設定フィールドから出力カラム定義を組み立てる
///
/// 空リストや空欄だけのリストはデフォルト順へフォールバックする。
pub fn resolve_output_columns(configured_fields: Option<&[String]>) -> Vec<OutputColumn> {
    resolve_configured_field_keys(configured_fields, &DEFAULT_OUTPUT_ORDER)
        .into_iter()
        .map(|key| {
            let header = field_header(&key);
            let console_width = console_width(&key);
            OutputColumn {
                key,
                header,
                console_width,
            }
        })
        .collect()
}

/// 出力カラムと集計フィールドを合わせた、取得対象フィールドの一覧
///
/// 大文字小文字を区別せず重複除去し、出力カラム側の並びを先に保つ。
pub fn resolve_requested_fields(
    configured_output_fields: Option<&[String]>,
    configured_count_fields: Option<&[String]>,
) -> Vec<String> {
    let output_fields = resolve_output_columns(configured_output_fields)
        .into_iter()
        .map(|column| column.key);
    let count_fields =
        resolve_configured_field_keys(configured_count_fields, &DEFAULT_COUNT_ORDER);

    let mut requested = Vec::new();
    let mut seen = HashSet::new();

    for field in output_fields.chain(count_fields) {
        if seen.insert(field.to_lowercase()) {
            requested.push(field);
        }
    }

    requested
}

/// 集計フィールドごとのグループ集計テーブルを組み立てる
pub fn build_count_tables(
    issues: &[Issue],
    configured_count_fields: Option<&[String]>,
) -> Vec<CountTable> {
    resolve_configured_field_keys(configured_count_fields, &DEFAULT_COUNT_ORDER)
        .into_iter()
        .map(|field_key| CountTable {
            title: format!("By {}", field_header(&field_key)),
            rows: group_by_count(issues, &field_key),
        })
        .collect()
}

/// レポートデータ一式を組み立てる
pub fn build_report(
    title: &str,
    config_name: Option<&str>,
    jql: &str,
    issues: Vec<Issue>,
    configured_count_fields: Option<&[String]>,
    generated_at: DateTime<Utc>,
) -> Result<JqlReport> {
    let count_tables = build_count_tables(&issues, configured_count_fields);
    JqlReport::create(title, config_name, jql, issues, count_tables, generated_at)
}

/// issueを1フィールドの値でグループ集計する
///
/// 配列由来フィールドは個別値ごとに数え、単一値フィールドは表示値で
/// 数える。空・欠損は"Unknown"へ寄せ、件数降順・名前昇順で返す。
fn group_by_count(issues: &[Issue], field_key: &str) -> Vec<CountRow> {
    let mut groups: HashMap<String, (String, usize)> = HashMap::new();

    let mut add = |value: &str| {
        let trimmed = value.trim();
        let display = if trimmed.is_empty() || trimmed == MISSING_FIELD_VALUE {
            UNKNOWN_GROUP
        } else {
            trimmed
        };
        groups
            .entry(display.to_lowercase())
            .and_modify(|(_, count)| *count += 1)
            .or_insert_with(|| (display.to_string(), 1));
    };

    for issue in issues {
        let items = issue.field_items(field_key);
        if items.is_empty() {
            add(issue.field_value(field_key));
        } else {
            for item in items {
                add(item);
            }
        }
    }

    let mut rows: Vec<CountRow> = groups
        .into_values()
        .map(|(name, count)| CountRow { name, count })
        .collect();

    rows.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
    });
    rows
}

fn resolve_configured_field_keys(
    configured_fields: Option<&[String]>,
    default_fields: &[&str],
) -> Vec<String> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    if let Some(configured_fields) = configured_fields {
        for raw_field in configured_fields {
            let field = raw_field.trim();
            if field.is_empty() {
                continue;
            }
            if seen.insert(field.to_lowercase()) {
                resolved.push(field.to_string());
            }
        }
    }

    if resolved.is_empty() {
        return default_fields.iter().map(|field| field.to_string()).collect();
    }
    resolved
}

/// フィールドキーから人間向けのカラム見出しを作る
///
/// アンダースコアを空白に置き換え、各語の先頭を大文字化する。
pub fn field_header(field_key: &str) -> String {
    let words: Vec<String> = field_key
        .trim()
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        return "Field".to_string();
    }
    words.join(" ")
}

fn console_width(field_key: &str) -> usize {
    if field_key.eq_ignore_ascii_case("summary") {
        52
    } else {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_with(key: &str, field_key: &str, value: &str) -> Issue {
        let mut issue = Issue::new(key);
        issue.insert_field(field_key, value.to_string(), Vec::new());
        issue
    }

    #[test]
    fn test_default_output_columns() {
        // Given: フィールド未指定
        let columns = resolve_output_columns(None);

        // Then: デフォルト順のカラムが返る
        let keys: Vec<&str> = columns.iter().map(|column| column.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["key", "issuetype", "status", "assignee", "created", "updated", "summary"]
        );
        assert_eq!(columns[0].header, "Key");
        assert_eq!(columns[1].header, "Issuetype");
    }

    #[test]
    fn test_configured_output_columns_override_defaults() {
        let configured = vec!["summary".to_string(), " status ".to_string(), "".to_string()];

        let columns = resolve_output_columns(Some(&configured));

        let keys: Vec<&str> = columns.iter().map(|column| column.key.as_str()).collect();
        assert_eq!(keys, vec!["summary", "status"]);
    }

    #[test]
    fn test_blank_only_configuration_falls_back_to_defaults() {
        let configured = vec!["  ".to_string(), "".to_string()];

        let columns = resolve_output_columns(Some(&configured));

        assert_eq!(columns.len(), DEFAULT_OUTPUT_ORDER.len());
    }

    #[test]
    fn test_console_width_for_summary() {
        let columns = resolve_output_columns(None);

        let summary = columns.iter().find(|column| column.key == "summary").unwrap();
        let status = columns.iter().find(|column| column.key == "status").unwrap();
        assert_eq!(summary.console_width, 52);
        assert_eq!(status.console_width, 20);
    }

    #[test]
    fn test_field_header_capitalizes_words() {
        assert_eq!(field_header("story_points"), "Story Points");
        assert_eq!(field_header("summary"), "Summary");
        assert_eq!(field_header("Story Points"), "Story Points");
        assert_eq!(field_header("  "), "Field");
    }

    #[test]
    fn test_requested_fields_merge_output_and_count_fields() {
        let output = vec!["key".to_string(), "summary".to_string()];
        let count = vec!["status".to_string(), "SUMMARY".to_string()];

        let requested = resolve_requested_fields(Some(&output), Some(&count));

        // 出力カラム側が先、大文字小文字違いの重複は除去
        assert_eq!(requested, vec!["key", "summary", "status"]);
    }

    #[test]
    fn test_requested_fields_use_defaults_when_unconfigured() {
        let requested = resolve_requested_fields(None, None);

        assert_eq!(
            requested,
            vec!["key", "issuetype", "status", "assignee", "created", "updated", "summary"]
        );
    }

    #[test]
    fn test_group_by_count_orders_by_count_then_name() {
        // Given: ステータスの偏ったissue群
        let issues = vec![
            issue_with("APP-1", "status", "Open"),
            issue_with("APP-2", "status", "open"),
            issue_with("APP-3", "status", "Done"),
            issue_with("APP-4", "status", "Blocked"),
            issue_with("APP-5", "status", "blocked"),
        ];

        // When: statusで集計する
        let count_fields = vec!["status".to_string()];
        let tables = build_count_tables(&issues, Some(&count_fields));

        // Then: 件数降順・名前昇順で、大小文字違いは初出の表記に寄る
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].title, "By Status");
        let rows: Vec<(&str, usize)> = tables[0]
            .rows
            .iter()
            .map(|row| (row.name.as_str(), row.count))
            .collect();
        assert_eq!(rows, vec![("Blocked", 2), ("Open", 2), ("Done", 1)]);
    }

    #[test]
    fn test_group_by_count_maps_missing_to_unknown() {
        let issues = vec![
            issue_with("APP-1", "status", "Open"),
            issue_with("APP-2", "status", "-"),
            Issue::new("APP-3"),
        ];

        let count_fields = vec!["status".to_string()];
        let tables = build_count_tables(&issues, Some(&count_fields));

        let unknown = tables[0]
            .rows
            .iter()
            .find(|row| row.name == "Unknown")
            .unwrap();
        assert_eq!(unknown.count, 2);
    }

    #[test]
    fn test_group_by_count_counts_list_items_individually() {
        // Given: 配列由来のlabelsを持つissue
        let mut first = Issue::new("APP-1");
        first.insert_field(
            "labels",
            "backend, urgent".to_string(),
            vec!["backend".to_string(), "urgent".to_string()],
        );
        let mut second = Issue::new("APP-2");
        second.insert_field("labels", "backend".to_string(), vec!["backend".to_string()]);

        // When: labelsで集計する
        let count_fields = vec!["labels".to_string()];
        let tables = build_count_tables(&[first, second], Some(&count_fields));

        // Then: 結合文字列ではなく個別値で数える
        let rows: Vec<(&str, usize)> = tables[0]
            .rows
            .iter()
            .map(|row| (row.name.as_str(), row.count))
            .collect();
        assert_eq!(rows, vec![("backend", 2), ("urgent", 1)]);
    }

    #[test]
    fn test_default_count_tables() {
        let tables = build_count_tables(&[], None);

        let titles: Vec<&str> = tables.iter().map(|table| table.title.as_str()).collect();
        assert_eq!(titles, vec!["By Status", "By Issuetype", "By Assignee"]);
    }

    #[test]
    fn test_build_report_attaches_count_tables() {
        let issues = vec![
            issue_with("APP-1", "status", "Open"),
            issue_with("APP-2", "status", "Done"),
        ];

        let report = build_report(
            "Sprint Report",
            Some("weekly"),
            "project = APP",
            issues,
            Some(&vec!["status".to_string()]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.count_tables.len(), 1);
        assert_eq!(report.count_tables[0].rows.len(), 2);
    }
}
