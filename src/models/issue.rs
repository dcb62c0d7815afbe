use std::collections::HashMap;

/// 欠損・不明フィールドを表す予約表示値
pub const MISSING_FIELD_VALUE: &str = "-";

/// issueキーを参照する予約フィールド名
pub const ISSUE_KEY_FIELD: &str = "key";

/// 正規化済みのレポート用issue行
///
/// フィールド参照はすべて大文字小文字を区別しない。配列由来の
/// フィールドは結合済み表示値に加えて個々の値も保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    key: String,
    fields: HashMap<String, String>,
    list_fields: HashMap<String, Vec<String>>,
}

impl Issue {
    /// issueキーを指定して空のissue行を作成
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().trim().to_string(),
            fields: HashMap::new(),
            list_fields: HashMap::new(),
        }
    }

    /// issueキーを返す
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 正規化済みフィールド値を登録する
    ///
    /// `items`は配列由来フィールドの個別値（それ以外は空）。
    pub fn insert_field(&mut self, field_key: &str, value: String, items: Vec<String>) {
        let lookup_key = Self::lookup_key(field_key);
        if lookup_key.is_empty() {
            return;
        }

        if !items.is_empty() {
            self.list_fields.insert(lookup_key.clone(), items);
        }
        self.fields.insert(lookup_key, value);
    }

    /// フィールド値を返す（欠損時は`"-"`）
    ///
    /// 予約フィールド名`"key"`はissueキー自身を返す。
    pub fn field_value(&self, field_key: &str) -> &str {
        let lookup_key = Self::lookup_key(field_key);
        if lookup_key.is_empty() {
            return MISSING_FIELD_VALUE;
        }

        if lookup_key == ISSUE_KEY_FIELD {
            return &self.key;
        }

        match self.fields.get(&lookup_key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => MISSING_FIELD_VALUE,
        }
    }

    /// 配列由来フィールドの個別値を返す
    ///
    /// 単一値フィールドや欠損フィールドでは空スライスを返す。
    pub fn field_items(&self, field_key: &str) -> &[String] {
        self.list_fields
            .get(&Self::lookup_key(field_key))
            .map_or(&[], Vec::as_slice)
    }

    fn lookup_key(field_key: &str) -> String {
        field_key.trim().to_lowercase()
    }
}
