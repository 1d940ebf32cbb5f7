//! UseCase: 実行履歴の記録と参照
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - HistoryUseCase::record() / list() メソッド
//!
//! ### どのような状況を想定しているか
//! - 正常系：記録後に新しい順で読み戻される
//! - 異常系：ストアの障害がそのまま返る

use std::sync::Arc;

use crate::domain::{HistoryRecord, HistoryStore, JobOutcome, RepositoryError, RoomId};

/// 実行履歴のユースケース
pub struct HistoryUseCase {
    store: Arc<dyn HistoryStore>,
}

impl HistoryUseCase {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// 完了したジョブを記録し、ルームの履歴を新しい順で返す
    pub async fn record(&self, outcome: &JobOutcome) -> Result<Vec<HistoryRecord>, RepositoryError> {
        self.store.append(outcome.to_history_record()).await?;
        self.list(&outcome.room).await
    }

    /// ルームの履歴を終了時刻の新しい順で返す
    pub async fn list(&self, room: &RoomId) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let mut records = self.store.list(room).await?;
        records.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Chromosome, JobId, Timestamp, entity::fixtures, repository::MockHistoryStore,
        },
        infrastructure::repository::InMemoryHistoryStore,
    };

    fn outcome(room: &str, finished_at: i64) -> JobOutcome {
        JobOutcome {
            room: fixtures::room(room),
            job: JobId::new(1),
            winning_chromosome: Chromosome::from(vec!["1", "0", "1"]),
            fitness: 2.0,
            goal_reached: false,
            node_count: 2,
            started_at: Timestamp::new(finished_at - 1_000),
            finished_at: Timestamp::new(finished_at),
        }
    }

    #[tokio::test]
    async fn test_record_returns_newest_first() {
        // テスト項目: 記録後の履歴は終了時刻の新しい順に並ぶ
        // given (前提条件):
        let usecase = HistoryUseCase::new(Arc::new(InMemoryHistoryStore::new()));
        usecase.record(&outcome("ga", 2_000)).await.unwrap();

        // when (操作):
        let records = usecase.record(&outcome("ga", 5_000)).await.unwrap();

        // then (期待する結果):
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].end_time, Timestamp::new(5_000));
        assert_eq!(records[1].end_time, Timestamp::new(2_000));
        assert_eq!(records[0].result, "101");
    }

    #[tokio::test]
    async fn test_list_keeps_rooms_apart() {
        // テスト項目: 他のルームの履歴は含まれない
        // given (前提条件):
        let usecase = HistoryUseCase::new(Arc::new(InMemoryHistoryStore::new()));
        usecase.record(&outcome("ga", 1_000)).await.unwrap();
        usecase.record(&outcome("tsp", 2_000)).await.unwrap();

        // when (操作):
        let records = usecase.list(&fixtures::room("tsp")).await.unwrap();

        // then (期待する結果):
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].room, fixtures::room("tsp"));
    }

    #[tokio::test]
    async fn test_record_propagates_store_failure() {
        // テスト項目: ストアへの追記が失敗した場合はエラーを返し、読み戻しは行わない
        // given (前提条件):
        let mut store = MockHistoryStore::new();
        store
            .expect_append()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("disk full".to_string())));
        store.expect_list().never();
        let usecase = HistoryUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.record(&outcome("ga", 1_000)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::Unavailable("disk full".to_string()))
        );
    }
}
