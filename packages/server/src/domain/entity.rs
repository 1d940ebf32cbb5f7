//! Domain entities: nodes, job parameters, tasks and run history.

use std::sync::Arc;

use uuid::Uuid;

use super::{
    error::ValidationError,
    value_object::{Chromosome, ClientId, JobId, RoomId, Timestamp},
};

/// A worker connection contributing to a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: ClientId,
    pub running: bool,
    pub error: bool,
    /// Last error reported by the node through `job-error`.
    pub last_error: Option<String>,
}

impl Node {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            running: false,
            error: false,
            last_error: None,
        }
    }
}

/// Opaque reference to a fitness, selection or mutation strategy.
///
/// The orchestrator never interprets it; workers resolve `name` (and optionally
/// `body`) against their own catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrategyRef {
    pub name: String,
    pub body: Option<String>,
}

impl StrategyRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
        }
    }
}

/// Job parameters as persisted per room (preset) or supplied with `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobParameters {
    pub generations: u32,
    pub population_size: usize,
    pub chromosome_length: usize,
    pub elitism: bool,
    pub fitness_goal: f64,
    pub reproductive_coefficient: f64,
    /// Comma-delimited gene symbols, e.g. `"0,1"`.
    pub gene_pool: String,
    pub fitness: StrategyRef,
    pub selection: StrategyRef,
    pub mutations: Vec<StrategyRef>,
}

impl JobParameters {
    /// Validate and map the persisted shape into the in-memory job configuration.
    pub fn to_config(&self) -> Result<JobConfig, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidParameters(reason.to_string());

        if self.generations == 0 {
            return Err(invalid("generations must be at least 1"));
        }
        if self.population_size == 0 {
            return Err(invalid("population size must be at least 1"));
        }
        if self.chromosome_length == 0 {
            return Err(invalid("chromosome length must be at least 1"));
        }
        if !self.fitness_goal.is_finite() {
            return Err(invalid("fitness goal must be a finite number"));
        }
        if !self.reproductive_coefficient.is_finite() || self.reproductive_coefficient <= 0.0 {
            return Err(invalid("reproductive coefficient must be positive"));
        }
        if self.fitness.name.trim().is_empty() {
            return Err(invalid("a fitness strategy is required"));
        }

        let gene_pool: Vec<String> = self
            .gene_pool
            .split(',')
            .map(str::trim)
            .filter(|gene| !gene.is_empty())
            .map(str::to_string)
            .collect();
        if gene_pool.is_empty() {
            return Err(invalid("gene pool must contain at least one gene"));
        }

        Ok(JobConfig {
            max_generation: self.generations,
            population_size: self.population_size,
            chromosome_length: self.chromosome_length,
            elitism: self.elitism,
            fitness_goal: self.fitness_goal,
            reproductive_coefficient: self.reproductive_coefficient,
            gene_pool,
            fitness: self.fitness.clone(),
            selection: self.selection.clone(),
            mutations: self.mutations.clone(),
        })
    }
}

/// Job configuration held by a running room.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub max_generation: u32,
    pub population_size: usize,
    pub chromosome_length: usize,
    pub elitism: bool,
    pub fitness_goal: f64,
    pub reproductive_coefficient: f64,
    pub gene_pool: Vec<String>,
    pub fitness: StrategyRef,
    pub selection: StrategyRef,
    pub mutations: Vec<StrategyRef>,
}

/// A dispatchable unit of work, consumed by exactly one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub room: RoomId,
    pub job: JobId,
    pub generation: u32,
    pub population: Vec<Chromosome>,
    /// Parameter snapshot taken when the job started.
    pub config: Arc<JobConfig>,
}

/// A node's result for a task.
///
/// `fitnesses[i]` is the fitness of `population[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedTask {
    pub room: RoomId,
    /// Fence echoed back from the task; `None` when the node did not send it.
    pub job: Option<JobId>,
    pub generation: u32,
    pub population: Vec<Chromosome>,
    pub fitnesses: Vec<f64>,
}

impl FinishedTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fitnesses.is_empty() {
            return Err(ValidationError::EmptyFitnesses);
        }
        if self.fitnesses.len() != self.population.len() {
            return Err(ValidationError::LengthMismatch {
                population: self.population.len(),
                fitnesses: self.fitnesses.len(),
            });
        }
        if let Some(index) = self.fitnesses.iter().position(|f| !f.is_finite()) {
            return Err(ValidationError::NonFiniteFitness { index });
        }
        Ok(())
    }
}

/// Winner of a finished job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub room: RoomId,
    pub job: JobId,
    pub winning_chromosome: Chromosome,
    pub fitness: f64,
    /// True when the fitness goal was reached before the last generation filled up.
    pub goal_reached: bool,
    pub node_count: usize,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl JobOutcome {
    pub fn duration_millis(&self) -> i64 {
        self.finished_at.millis_since(self.started_at)
    }

    pub fn to_history_record(&self) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            room: self.room.clone(),
            node_count: self.node_count,
            result: self.winning_chromosome.summary(),
            fitness: self.fitness,
            start_time: self.started_at,
            end_time: self.finished_at,
        }
    }
}

/// One completed run, as kept by the history store.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub room: RoomId,
    pub node_count: usize,
    pub result: String,
    pub fitness: f64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    pub fn client(name: &str) -> ClientId {
        ClientId::new(name.to_string()).unwrap()
    }

    pub fn parameters() -> JobParameters {
        JobParameters {
            generations: 3,
            population_size: 10,
            chromosome_length: 4,
            elitism: false,
            fitness_goal: 100.0,
            reproductive_coefficient: 1.0,
            gene_pool: "0,1".to_string(),
            fitness: StrategyRef::named("count-gene"),
            selection: StrategyRef::named("truncation"),
            mutations: vec![StrategyRef::named("point")],
        }
    }

    pub fn config() -> JobConfig {
        parameters().to_config().unwrap()
    }

    pub fn finished(room_name: &str, generation: u32, fitnesses: &[f64]) -> FinishedTask {
        FinishedTask {
            room: room(room_name),
            job: None,
            generation,
            population: fitnesses
                .iter()
                .map(|f| Chromosome::new(vec![format!("{}", f)]))
                .collect(),
            fitnesses: fitnesses.to_vec(),
        }
    }
}
