use std::collections::{HashMap, HashSet};

use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::fields::FieldResolver;
use crate::models::{Issue, SearchPage};
use crate::normalize;

/// 検索1ページあたりの件数の下限と上限
const MIN_PAGE_SIZE: u32 = 1;
const MAX_PAGE_SIZE: u32 = 100;

/// 検索結果と、レポート構築側が使うエイリアスマップ
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub issues: Vec<Issue>,
    pub aliases_by_field: HashMap<String, Vec<String>>,
}

/// JQL検索を実行するサービス
///
/// まずカーソル方式（`/rest/api/3/search/jql`）でページを辿り、
/// エンドポイントが存在しないインストール（404）ではレガシーの
/// オフセット方式（`/rest/api/3/search`）へ透過的に切り替える。
/// ページはカーソル・オフセットが前ページの結果に依存するため
/// 常に逐次取得する。
#[derive(Debug)]
pub struct SearchService {
    client: JiraClient,
    resolver: FieldResolver,
}

impl SearchService {
    pub fn new(client: JiraClient) -> Self {
        let resolver = FieldResolver::new(client.clone());
        Self { client, resolver }
    }

    /// フィールドリゾルバへの参照を返す
    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// JQLに一致するissueを全ページ分取得する
    ///
    /// 結果はissueキーで重複除去（大文字小文字を区別しない）した上で
    /// キー昇順に整列する。サーバー側の並び順には依存しない。
    pub async fn search(&self, jql: &str, configured_fields: &[String]) -> Result<SearchOutcome> {
        if jql.trim().is_empty() {
            return Err(Error::InvalidInput("JQL query must not be empty".to_string()));
        }

        let resolved = self.resolver.resolve(configured_fields).await?;
        let fields_csv = resolved.api_keys().join(",");
        let page_size = self
            .client
            .config()
            .max_results_per_page
            .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);

        let issues = match self
            .search_with_page_token(jql, &fields_csv, page_size, &resolved.aliases_by_field)
            .await
        {
            // 404はカーソル版エンドポイントが無いインストールの印
            Err(Error::ApiError { status: 404, .. }) => {
                self.search_with_start_at(jql, &fields_csv, page_size, &resolved.aliases_by_field)
                    .await?
            }
            other => other?,
        };

        Ok(SearchOutcome {
            issues: dedup_and_sort(issues),
            aliases_by_field: resolved.aliases_by_field,
        })
    }

    async fn search_with_page_token(
        &self,
        jql: &str,
        fields_csv: &str,
        page_size: u32,
        aliases_by_field: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "/rest/api/3/search/jql?jql={}&fields={}&maxResults={}",
                urlencoding::encode(jql),
                fields_csv,
                page_size
            );
            if let Some(token) = next_page_token.as_deref().filter(|token| !token.trim().is_empty())
            {
                url.push_str(&format!("&nextPageToken={}", urlencoding::encode(token)));
            }

            let page = self.search_page(&url).await?;
            issues.extend(normalize::map_search_page(&page, aliases_by_field));

            next_page_token = page.next_page_token.clone();
            let token_exhausted = next_page_token
                .as_deref()
                .map_or(true, |token| token.trim().is_empty());
            if page.issues.is_empty() || page.is_last || token_exhausted {
                break;
            }
        }

        Ok(issues)
    }

    async fn search_with_start_at(
        &self,
        jql: &str,
        fields_csv: &str,
        page_size: u32,
        aliases_by_field: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut start_at: u32 = 0;

        loop {
            let url = format!(
                "/rest/api/3/search?jql={}&fields={}&startAt={}&maxResults={}",
                urlencoding::encode(jql),
                fields_csv,
                start_at,
                page_size
            );

            let page = self.search_page(&url).await?;
            issues.extend(normalize::map_search_page(&page, aliases_by_field));

            if page.issues.is_empty() {
                break;
            }

            start_at += page.issues.len() as u32;
            // totalを報告しないサーバーでも停止できるよう下駄を履かせる
            let total = if page.total > 0 { page.total } else { start_at };
            if start_at >= total {
                break;
            }
        }

        Ok(issues)
    }

    async fn search_page(&self, url: &str) -> Result<SearchPage> {
        self.client
            .get(url)
            .await?
            .ok_or_else(|| Error::EmptyResponse("Jira search response is empty".to_string()))
    }
}

fn dedup_and_sort(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| seen.insert(issue.key().to_lowercase()))
        .collect();

    unique.sort_by(|left, right| {
        left.key()
            .to_lowercase()
            .cmp(&right.key().to_lowercase())
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str) -> Issue {
        Issue::new(key)
    }

    #[test]
    fn test_dedup_and_sort_is_case_insensitive() {
        // Given: ページ境界のずれで重複した大小文字違いのキー
        let issues = vec![issue("APP-2"), issue("app-2"), issue("APP-1")];

        // When: 最終処理を通す
        let result = dedup_and_sort(issues);

        // Then: 先着を残してキー昇順になる
        let keys: Vec<&str> = result.iter().map(Issue::key).collect();
        assert_eq!(keys, vec!["APP-1", "APP-2"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut first = issue("APP-1");
        first.insert_field("summary", "first".to_string(), Vec::new());
        let mut second = issue("app-1");
        second.insert_field("summary", "second".to_string(), Vec::new());

        let result = dedup_and_sort(vec![first, second]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].field_value("summary"), "first");
    }

    #[test]
    fn test_sort_orders_numeric_suffixes_lexicographically() {
        let result = dedup_and_sort(vec![issue("APP-10"), issue("APP-2"), issue("APP-1")]);

        let keys: Vec<&str> = result.iter().map(Issue::key).collect();
        assert_eq!(keys, vec!["APP-1", "APP-10", "APP-2"]);
    }
}
