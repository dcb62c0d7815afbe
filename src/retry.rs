use std::time::Duration;

/// リトライ遅延の基準値（ミリ秒）
const BASE_DELAY_MS: u64 = 200;

/// Jiraリクエストの再試行ポリシー
///
/// 判定は入力と設定済みリトライ回数のみに依存する純粋関数で、
/// 遅延は線形バックオフ（ジッターなし）。
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    retry_count: u32,
}

impl RetryPolicy {
    /// 最大リトライ回数を指定してポリシーを作成
    pub fn new(retry_count: u32) -> Self {
        Self { retry_count }
    }

    /// 再試行の可否を判定し、許可される場合は待機時間を返す
    ///
    /// `attempt`は1始まりの試行番号。上限は両端含む
    /// （`attempt > retry_count`で打ち切り）。
    pub fn delay_for(
        &self,
        attempt: u32,
        status_code: Option<u16>,
        transport_error: bool,
    ) -> Option<Duration> {
        if attempt == 0 || attempt > self.retry_count {
            return None;
        }

        if transport_error {
            return Some(self.linear_delay(attempt));
        }

        match status_code {
            Some(code) if Self::is_retryable(code) => Some(self.linear_delay(attempt)),
            _ => None,
        }
    }

    fn linear_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(BASE_DELAY_MS * u64::from(attempt))
    }

    fn is_retryable(status_code: u16) -> bool {
        status_code == 429 || status_code >= 500
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
