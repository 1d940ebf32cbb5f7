//! Conversion logic between DTOs and domain types.

use colony_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    Chromosome, FinishedTask, HistoryRecord, JobId, JobOutcome, JobParameters, Node,
    Notification, RoomEvent, RoomEventKind, RoomId, RoomSnapshot, StrategyRef, Task,
    ValidationError,
};
use crate::infrastructure::dto::{http::RoomSummaryDto, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

impl From<dto::StrategyRefDto> for StrategyRef {
    fn from(dto: dto::StrategyRefDto) -> Self {
        Self {
            name: dto.name,
            body: dto.body,
        }
    }
}

impl From<dto::JobParametersDto> for JobParameters {
    fn from(dto: dto::JobParametersDto) -> Self {
        Self {
            generations: dto.generations,
            population_size: dto.population_size,
            chromosome_length: dto.chromosome_length,
            elitism: dto.elitism,
            fitness_goal: dto.fitness_goal,
            reproductive_coefficient: dto.reproductive_coefficient,
            gene_pool: dto.gene_pool,
            fitness: dto.fitness.into(),
            selection: dto.selection.into(),
            mutations: dto.mutations.into_iter().map(Into::into).collect(),
        }
    }
}

impl dto::FinishedTaskDto {
    /// The room comes from the enclosing envelope.
    pub fn into_domain(self, room: RoomId) -> FinishedTask {
        FinishedTask {
            room,
            job: self.job.map(JobId::new),
            generation: self.generation,
            population: self.population.into_iter().map(Chromosome::new).collect(),
            fitnesses: self.fitnesses,
        }
    }
}

impl TryFrom<dto::ClientMessage> for RoomEvent {
    type Error = ValidationError;

    fn try_from(message: dto::ClientMessage) -> Result<Self, Self::Error> {
        use dto::ClientMessage as M;

        let (room_id, kind) = match message {
            M::Join { room_id } => (room_id, RoomEventKind::Join),
            M::Leave { room_id } => (room_id, RoomEventKind::Leave),
            M::AdminJoin { room_id } => (room_id, RoomEventKind::AdminJoin),
            M::Start {
                room_id,
                parameters,
            } => (
                room_id,
                RoomEventKind::Start {
                    parameters: parameters.map(Into::into),
                },
            ),
            M::Done { room_id, task } => {
                let room = RoomId::new(room_id)?;
                let finished = task.into_domain(room.clone());
                return Ok(RoomEvent {
                    room,
                    kind: RoomEventKind::Done(finished),
                });
            }
            M::JobError { room_id, error } => (room_id, RoomEventKind::JobError { error }),
            M::Abort { room_id } => (room_id, RoomEventKind::Abort),
            M::RequestRoom { room_id } => (room_id, RoomEventKind::RequestRoom),
        };

        Ok(RoomEvent {
            room: RoomId::new(room_id)?,
            kind,
        })
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&StrategyRef> for dto::StrategyRefDto {
    fn from(model: &StrategyRef) -> Self {
        Self {
            name: model.name.clone(),
            body: model.body.clone(),
        }
    }
}

impl From<&JobParameters> for dto::JobParametersDto {
    fn from(model: &JobParameters) -> Self {
        Self {
            generations: model.generations,
            population_size: model.population_size,
            chromosome_length: model.chromosome_length,
            elitism: model.elitism,
            fitness_goal: model.fitness_goal,
            reproductive_coefficient: model.reproductive_coefficient,
            gene_pool: model.gene_pool.clone(),
            fitness: (&model.fitness).into(),
            selection: (&model.selection).into(),
            mutations: model.mutations.iter().map(Into::into).collect(),
        }
    }
}

impl From<&Task> for dto::TaskDto {
    fn from(model: &Task) -> Self {
        let config = &model.config;
        Self {
            job: model.job.value(),
            generation: model.generation,
            population: model
                .population
                .iter()
                .map(|chromosome| chromosome.genes().to_vec())
                .collect(),
            fitness: (&config.fitness).into(),
            selection: (&config.selection).into(),
            mutations: config.mutations.iter().map(Into::into).collect(),
            chromosome_length: config.chromosome_length,
            gene_pool: config.gene_pool.clone(),
            reproductive_coefficient: config.reproductive_coefficient,
            elitism: config.elitism,
        }
    }
}

impl From<&Node> for dto::NodeDto {
    fn from(model: &Node) -> Self {
        Self {
            client_id: model.id.as_str().to_string(),
            running: model.running,
            error: model.error,
            last_error: model.last_error.clone(),
        }
    }
}

impl From<&RoomSnapshot> for dto::RoomSnapshotDto {
    fn from(model: &RoomSnapshot) -> Self {
        Self {
            nodes: model.nodes.iter().map(Into::into).collect(),
            admin_count: model.admin_count,
            job_running: model.job_running,
            job: model.job.map(|job| job.value()),
            started_at: model.started_at.map(|t| t.value()),
            bucket: model
                .bucket
                .iter()
                .map(|&(generation, size)| dto::BucketGenerationDto { generation, size })
                .collect(),
            pending_tasks: model.pending_tasks,
            total_fitness_sum: model.total_fitness_sum,
            chromosomes_returned: model.chromosomes_returned,
            last_result: model.last_result.clone(),
            max_generation: model.max_generation,
            population_size: model.population_size,
        }
    }
}

impl From<&RoomSnapshot> for RoomSummaryDto {
    fn from(model: &RoomSnapshot) -> Self {
        Self {
            id: model.room.as_str().to_string(),
            nodes: model.nodes.len(),
            admins: model.admin_count,
            job_running: model.job_running,
            last_result: model.last_result.clone(),
        }
    }
}

impl From<&JobOutcome> for dto::JobResultDto {
    fn from(model: &JobOutcome) -> Self {
        Self {
            job: model.job.value(),
            winning_chromosome: model.winning_chromosome.genes().to_vec(),
            result: model.winning_chromosome.summary(),
            fitness: model.fitness,
            goal_reached: model.goal_reached,
            node_count: model.node_count,
            started_at: model.started_at.value(),
            finished_at: model.finished_at.value(),
            duration_ms: model.duration_millis(),
        }
    }
}

impl From<&HistoryRecord> for dto::HistoryRecordDto {
    fn from(model: &HistoryRecord) -> Self {
        Self {
            id: model.id,
            room: model.room.as_str().to_string(),
            nodes: model.node_count,
            result: model.result.clone(),
            fitness: model.fitness,
            start_time: timestamp_to_rfc3339(model.start_time.value()),
            end_time: timestamp_to_rfc3339(model.end_time.value()),
        }
    }
}

impl From<&Notification> for dto::ServerMessage {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::Assign(task) => Self::Assign {
                room_id: task.room.as_str().to_string(),
                task: task.into(),
            },
            Notification::RoomUpdate(snapshot) => Self::RoomUpdate {
                room_id: snapshot.room.as_str().to_string(),
                room: snapshot.into(),
            },
            Notification::Aborted { room } => Self::Abort {
                room_id: room.as_str().to_string(),
            },
            Notification::JobFinished(outcome) => Self::JobFinished {
                room_id: outcome.room.as_str().to_string(),
                result: outcome.into(),
            },
            Notification::HistoryUpdate { room, records } => Self::HistoryUpdate {
                room_id: room.as_str().to_string(),
                history: records.iter().map(Into::into).collect(),
            },
            Notification::Rejected { room, reason } => Self::Rejected {
                room_id: room.as_ref().map(|r| r.as_str().to_string()),
                reason: reason.clone(),
            },
        }
    }
}
