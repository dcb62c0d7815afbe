use std::collections::{HashMap, HashSet};
use tokio::sync::OnceCell;

use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::models::{FieldDefinition, ISSUE_KEY_FIELD};

/// id/keyエイリアスの優先度
const PRIORITY_CANONICAL: u8 = 3;
/// JQL句名エイリアスの優先度
const PRIORITY_CLAUSE: u8 = 2;
/// 表示名エイリアスの優先度
const PRIORITY_NAME: u8 = 1;

/// 設定フィールド名と正規APIフィールドキーの対応
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub api_key: String,
}

/// フィールド解決の結果
///
/// `aliases_by_field`は正規キーから、その値を参照すべき設定名
/// 一覧への逆引き（予約名`"key"`は含まない）。
#[derive(Debug, Clone, Default)]
pub struct ResolvedFields {
    pub fields: Vec<ResolvedField>,
    pub aliases_by_field: HashMap<String, Vec<String>>,
}

impl ResolvedFields {
    /// 検索リクエストに渡すAPIフィールドキー一覧
    ///
    /// 大文字小文字を区別せず重複除去し、設定順を保つ。
    pub fn api_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter(|field| seen.insert(field.api_key.to_lowercase()))
            .map(|field| field.api_key.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
struct AliasCandidate {
    api_key: String,
    priority: u8,
    custom: bool,
}

impl AliasCandidate {
    /// 衝突時にこの候補が既存候補より優先されるか
    ///
    /// 優先度クラスが高い方、同クラスではシステムフィールドが勝つ。
    /// それでも同順位なら先着を保持する。
    fn outranks(&self, incumbent: &Self) -> bool {
        if self.priority != incumbent.priority {
            return self.priority > incumbent.priority;
        }
        !self.custom && incumbent.custom
    }
}

/// フィールドカタログから組み立てるエイリアス索引
#[derive(Debug, Default)]
struct AliasIndex {
    exact: HashMap<String, AliasCandidate>,
    simplified: HashMap<String, AliasCandidate>,
}

impl AliasIndex {
    fn build(catalog: &[FieldDefinition]) -> Self {
        let mut index = Self::default();

        for field in catalog {
            let Some(canonical) = field.canonical_key() else {
                continue;
            };

            index.register(field.id.as_deref(), canonical, PRIORITY_CANONICAL, field.custom);
            index.register(field.key.as_deref(), canonical, PRIORITY_CANONICAL, field.custom);
            index.register(field.name.as_deref(), canonical, PRIORITY_NAME, field.custom);
            for clause_name in &field.clause_names {
                index.register(Some(clause_name.as_str()), canonical, PRIORITY_CLAUSE, field.custom);
            }
        }

        index
    }

    fn register(&mut self, alias: Option<&str>, api_key: &str, priority: u8, custom: bool) {
        let Some(alias) = alias.map(str::trim).filter(|alias| !alias.is_empty()) else {
            return;
        };

        let candidate = AliasCandidate {
            api_key: api_key.to_string(),
            priority,
            custom,
        };

        Self::insert(&mut self.exact, alias.to_lowercase(), candidate.clone());

        let simplified = simplify_alias(alias);
        if !simplified.is_empty() {
            Self::insert(&mut self.simplified, simplified.to_lowercase(), candidate);
        }
    }

    fn insert(map: &mut HashMap<String, AliasCandidate>, key: String, candidate: AliasCandidate) {
        match map.get(&key) {
            Some(incumbent) if !candidate.outranks(incumbent) => {}
            _ => {
                map.insert(key, candidate);
            }
        }
    }

    /// 設定名を正規APIキーへ引く（完全一致、次に簡略化一致）
    fn lookup(&self, configured_name: &str) -> Option<&str> {
        let exact_key = configured_name.trim().to_lowercase();
        if let Some(candidate) = self.exact.get(&exact_key) {
            return Some(&candidate.api_key);
        }

        let simplified = simplify_alias(configured_name);
        if simplified.is_empty() {
            return None;
        }
        self.simplified
            .get(&simplified.to_lowercase())
            .map(|candidate| candidate.api_key.as_str())
    }
}

/// エイリアス表記の装飾を取り除く
///
/// 外側の引用符1組を剥がし、末尾の`[...]`サフィックスを落とし、
/// 連続する空白を1つへ潰す（例: `"Sprint [12345]"` → `Sprint`）。
fn simplify_alias(alias: &str) -> String {
    let mut text = alias.trim();

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    let mut owned = text.to_string();
    if owned.ends_with(']') {
        if let Some(open) = owned.rfind('[') {
            owned.truncate(open);
        }
    }

    owned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 設定フィールド名を正規APIフィールドキーへ解決するリゾルバ
///
/// フィールドカタログはプロセス生存中に一度だけ取得して保持する。
/// 複数タスクから共有されても初回取得は一度しか走らない。
#[derive(Debug)]
pub struct FieldResolver {
    client: JiraClient,
    index: OnceCell<AliasIndex>,
}

impl FieldResolver {
    pub fn new(client: JiraClient) -> Self {
        Self {
            client,
            index: OnceCell::new(),
        }
    }

    /// 設定フィールド名の一覧を解決する
    ///
    /// 名前はトリムし、空欄と大文字小文字違いの重複は読み飛ばす。
    /// 予約名`"key"`はカタログを引かずそのまま解決する。ひとつでも
    /// 解決できない名前があれば、部分的な結果は返さず全未解決名を
    /// 載せたエラーになる。
    pub async fn resolve(&self, configured_fields: &[String]) -> Result<ResolvedFields> {
        let index = self.alias_index().await?;

        let mut resolved = ResolvedFields::default();
        let mut seen = HashSet::new();
        let mut unresolved = Vec::new();

        for raw_name in configured_fields {
            let name = raw_name.trim();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                continue;
            }

            if name.eq_ignore_ascii_case(ISSUE_KEY_FIELD) {
                resolved.fields.push(ResolvedField {
                    name: name.to_string(),
                    api_key: ISSUE_KEY_FIELD.to_string(),
                });
                continue;
            }

            match index.lookup(name) {
                Some(api_key) => {
                    resolved
                        .aliases_by_field
                        .entry(api_key.to_string())
                        .or_default()
                        .push(name.to_string());
                    resolved.fields.push(ResolvedField {
                        name: name.to_string(),
                        api_key: api_key.to_string(),
                    });
                }
                None => unresolved.push(name.to_string()),
            }
        }

        if !unresolved.is_empty() {
            return Err(Error::UnresolvedFields(unresolved));
        }

        Ok(resolved)
    }

    async fn alias_index(&self) -> Result<&AliasIndex> {
        self.index
            .get_or_try_init(|| async {
                let catalog: Vec<FieldDefinition> = self
                    .client
                    .get("/rest/api/3/field")
                    .await?
                    .ok_or_else(|| {
                        Error::EmptyResponse("field catalog response is empty".to_string())
                    })?;
                Ok(AliasIndex::build(&catalog))
            })
            .await
    }
}
