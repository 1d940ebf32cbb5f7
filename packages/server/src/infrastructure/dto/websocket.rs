//! WebSocket message DTOs.
//!
//! Every message is a JSON object tagged by `type`; every room-scoped message
//! carries the room in `roomId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_reproductive_coefficient() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRefDto {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Job parameters, as sent with `start` or stored as a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParametersDto {
    pub generations: u32,
    pub population_size: usize,
    pub chromosome_length: usize,
    #[serde(default)]
    pub elitism: bool,
    pub fitness_goal: f64,
    #[serde(default = "default_reproductive_coefficient")]
    pub reproductive_coefficient: f64,
    /// Comma-delimited gene symbols
    pub gene_pool: String,
    pub fitness: StrategyRefDto,
    pub selection: StrategyRefDto,
    #[serde(default)]
    pub mutations: Vec<StrategyRefDto>,
}

/// Work assignment sent to a worker node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    /// Job fence; echo it back in [`FinishedTaskDto::job`].
    pub job: u64,
    pub generation: u32,
    pub population: Vec<Vec<String>>,
    pub fitness: StrategyRefDto,
    pub selection: StrategyRefDto,
    pub mutations: Vec<StrategyRefDto>,
    pub chromosome_length: usize,
    pub gene_pool: Vec<String>,
    pub reproductive_coefficient: f64,
    pub elitism: bool,
}

/// Result of a task returned by a worker node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedTaskDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<u64>,
    pub generation: u32,
    pub population: Vec<Vec<String>>,
    pub fitnesses: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub client_id: String,
    pub running: bool,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketGenerationDto {
    pub generation: u32,
    pub size: usize,
}

/// Room state as observed by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshotDto {
    pub nodes: Vec<NodeDto>,
    pub admin_count: usize,
    pub job_running: bool,
    pub job: Option<u64>,
    pub started_at: Option<i64>,
    pub bucket: Vec<BucketGenerationDto>,
    pub pending_tasks: usize,
    pub total_fitness_sum: f64,
    pub chromosomes_returned: usize,
    pub last_result: Option<String>,
    pub max_generation: Option<u32>,
    pub population_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResultDto {
    pub job: u64,
    pub winning_chromosome: Vec<String>,
    pub result: String,
    pub fitness: f64,
    pub goal_reached: bool,
    pub node_count: usize,
    pub started_at: i64,
    pub finished_at: i64,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecordDto {
    pub id: Uuid,
    pub room: String,
    pub nodes: usize,
    pub result: String,
    pub fitness: f64,
    /// RFC 3339 (UTC)
    pub start_time: String,
    /// RFC 3339 (UTC)
    pub end_time: String,
}

/// Messages sent by nodes and admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    Join {
        room_id: String,
    },
    Leave {
        room_id: String,
    },
    AdminJoin {
        room_id: String,
    },
    Start {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<JobParametersDto>,
    },
    Done {
        room_id: String,
        task: FinishedTaskDto,
    },
    JobError {
        room_id: String,
        error: String,
    },
    Abort {
        room_id: String,
    },
    RequestRoom {
        room_id: String,
    },
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Assign {
        room_id: String,
        task: TaskDto,
    },
    RoomUpdate {
        room_id: String,
        room: RoomSnapshotDto,
    },
    Abort {
        room_id: String,
    },
    JobFinished {
        room_id: String,
        result: JobResultDto,
    },
    HistoryUpdate {
        room_id: String,
        history: Vec<HistoryRecordDto>,
    },
    Rejected {
        room_id: Option<String>,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_message_wire_format() {
        // テスト項目: done メッセージは roomId と task を持つ単一のエンベロープとして解釈される
        // given (前提条件):
        let json = r#"{
            "type": "done",
            "roomId": "GENETIC_ALG",
            "task": {"job": 2, "generation": 3, "population": [["1","0"]], "fitnesses": [1.0]}
        }"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::Done {
                room_id: "GENETIC_ALG".to_string(),
                task: FinishedTaskDto {
                    job: Some(2),
                    generation: 3,
                    population: vec![vec!["1".to_string(), "0".to_string()]],
                    fitnesses: vec![1.0],
                },
            }
        );
    }

    #[test]
    fn test_start_without_parameters_and_job_error() {
        // テスト項目: パラメータなしの start と job-error が解釈される
        // given (前提条件):
        let start = r#"{"type":"start","roomId":"ga"}"#;
        let error = r#"{"type":"job-error","roomId":"ga","error":"boom"}"#;

        // when (操作):
        let start: ClientMessage = serde_json::from_str(start).unwrap();
        let error: ClientMessage = serde_json::from_str(error).unwrap();

        // then (期待する結果):
        assert_eq!(
            start,
            ClientMessage::Start {
                room_id: "ga".to_string(),
                parameters: None
            }
        );
        assert_eq!(
            error,
            ClientMessage::JobError {
                room_id: "ga".to_string(),
                error: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_parameters_defaults() {
        // テスト項目: 省略可能なパラメータにはデフォルト値が入る
        // given (前提条件):
        let json = r#"{
            "generations": 10, "populationSize": 500, "chromosomeLength": 8,
            "fitnessGoal": 8, "genePool": "0,1",
            "fitness": {"name": "count-gene", "body": "1"},
            "selection": {"name": "tournament"}
        }"#;

        // when (操作):
        let params: JobParametersDto = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(!params.elitism);
        assert_eq!(params.reproductive_coefficient, 1.0);
        assert!(params.mutations.is_empty());
        assert_eq!(params.fitness.body.as_deref(), Some("1"));
    }

    #[test]
    fn test_server_message_is_tagged() {
        // テスト項目: サーバーメッセージは type タグ付きで直列化される
        // given (前提条件):
        let message = ServerMessage::Abort {
            room_id: "ga".to_string(),
        };

        // when (操作):
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json, serde_json::json!({"type": "abort", "roomId": "ga"}));
    }
}
