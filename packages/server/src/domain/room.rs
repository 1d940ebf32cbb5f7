//! Room state machine.
//!
//! `RoomState` holds everything one computation session owns and implements the
//! generation/termination protocol as plain synchronous transitions. Every
//! transition returns the [`Effect`]s the caller must deliver; nothing here
//! performs I/O, so the caller decides how transitions are serialized.
//!
//! The phase is derived from the fields: `Idle` until `start`, `Running` until
//! a finished task satisfies a termination condition (or `abort`). The
//! terminating step happens inside `task_completed` and is never observable.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::Arc,
};

use thiserror::Error;

use super::{
    bucket::{Bucket, BucketEntry, fittest_index},
    entity::{FinishedTask, JobConfig, JobOutcome, Node, Task},
    error::{ProtocolError, ValidationError},
    task_generator::{TaskBatch, TaskGenerator},
    value_object::{Chromosome, ClientId, JobId, RoomId, Timestamp},
};

/// Tasks generated per joined node when a job starts (or a node joins mid-run).
pub const DEFAULT_TASKS_PER_NODE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Idle,
    Running,
}

/// Output of a transition, to be delivered by the owner of the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send `task` to `node`.
    Assign { node: ClientId, task: Task },
    /// Send the current snapshot to every admin of the room.
    BroadcastSnapshot,
    /// Tell every former member that the job was aborted.
    AbortNotice { recipients: Vec<ClientId> },
    /// The job terminated; announce and persist the outcome.
    Finished(JobOutcome),
}

/// Rejection of a finished task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Read-only view of a room, sent to admins.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room: RoomId,
    pub nodes: Vec<Node>,
    pub admin_count: usize,
    pub job_running: bool,
    pub job: Option<JobId>,
    pub started_at: Option<Timestamp>,
    /// `(generation, accumulated population size)` for every present bucket entry.
    pub bucket: Vec<(u32, usize)>,
    pub pending_tasks: usize,
    pub total_fitness_sum: f64,
    pub chromosomes_returned: usize,
    pub last_result: Option<String>,
    pub max_generation: Option<u32>,
    pub population_size: Option<usize>,
}

impl RoomSnapshot {
    /// Snapshot of a room that was never created.
    pub fn empty(room: RoomId) -> Self {
        Self {
            room,
            nodes: Vec::new(),
            admin_count: 0,
            job_running: false,
            job: None,
            started_at: None,
            bucket: Vec::new(),
            pending_tasks: 0,
            total_fitness_sum: 0.0,
            chromosomes_returned: 0,
            last_result: None,
            max_generation: None,
            population_size: None,
        }
    }
}

/// All mutable state of one computation session.
#[derive(Debug)]
pub struct RoomState {
    room: RoomId,
    nodes: BTreeMap<ClientId, Node>,
    admins: BTreeSet<ClientId>,
    config: Option<Arc<JobConfig>>,
    job: JobId,
    job_running: bool,
    start: Option<Timestamp>,
    tasks: VecDeque<Task>,
    bucket: Bucket,
    total_fitness_sum: f64,
    chromosomes_returned: usize,
    last_result: Option<String>,
    tasks_per_node: usize,
}

impl RoomState {
    pub fn new(room: RoomId) -> Self {
        Self::with_tasks_per_node(room, DEFAULT_TASKS_PER_NODE)
    }

    pub fn with_tasks_per_node(room: RoomId, tasks_per_node: usize) -> Self {
        Self {
            room,
            nodes: BTreeMap::new(),
            admins: BTreeSet::new(),
            config: None,
            job: JobId::default(),
            job_running: false,
            start: None,
            tasks: VecDeque::new(),
            bucket: Bucket::new(),
            total_fitness_sum: 0.0,
            chromosomes_returned: 0,
            last_result: None,
            tasks_per_node: tasks_per_node.max(1),
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn phase(&self) -> RoomPhase {
        if self.job_running {
            RoomPhase::Running
        } else {
            RoomPhase::Idle
        }
    }

    pub fn is_job_running(&self) -> bool {
        self.job_running
    }

    pub fn node(&self, id: &ClientId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn admin_ids(&self) -> Vec<ClientId> {
        self.admins.iter().cloned().collect()
    }

    /// Nodes and admins, each listed once.
    pub fn members(&self) -> Vec<ClientId> {
        self.nodes
            .keys()
            .chain(self.admins.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn pending_tasks(&self) -> &VecDeque<Task> {
        &self.tasks
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn config(&self) -> Option<&Arc<JobConfig>> {
        self.config.as_ref()
    }

    pub fn current_job(&self) -> JobId {
        self.job
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn total_fitness_sum(&self) -> f64 {
        self.total_fitness_sum
    }

    pub fn chromosomes_returned(&self) -> usize {
        self.chromosomes_returned
    }

    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            nodes: self.nodes.values().cloned().collect(),
            admin_count: self.admins.len(),
            job_running: self.job_running,
            job: self.job_running.then_some(self.job),
            started_at: self.start,
            bucket: self.bucket.sizes(),
            pending_tasks: self.tasks.len(),
            total_fitness_sum: self.total_fitness_sum,
            chromosomes_returned: self.chromosomes_returned,
            last_result: self.last_result.clone(),
            max_generation: self.config.as_ref().map(|c| c.max_generation),
            population_size: self.config.as_ref().map(|c| c.population_size),
        }
    }

    // ========================================
    // Membership
    // ========================================

    pub fn add_admin(&mut self, admin: ClientId) -> Vec<Effect> {
        self.admins.insert(admin);
        vec![Effect::BroadcastSnapshot]
    }

    /// Returns whether `admin` was registered.
    pub fn remove_admin(&mut self, admin: &ClientId) -> bool {
        self.admins.remove(admin)
    }

    /// Register a worker node.
    ///
    /// While a job runs, a batch of fresh generation-0 tasks is generated for the
    /// enlarged room: the first goes straight to the joining node, the rest queue.
    pub fn join(&mut self, node: ClientId, generator: &dyn TaskGenerator) -> Vec<Effect> {
        self.nodes.insert(node.clone(), Node::new(node.clone()));
        let mut effects = Vec::new();

        if let (true, Some(config)) = (self.job_running, self.config.clone()) {
            let count = self.tasks_per_node * self.nodes.len();
            let mut fresh = generator
                .generate(self.batch(0, &config), count)
                .into_iter();
            if let Some(task) = fresh.next() {
                self.mark_running(&node);
                effects.push(Effect::Assign {
                    node: node.clone(),
                    task,
                });
            }
            self.tasks.extend(fresh);
            tracing::debug!(
                "Room '{}': late join of '{}', {} tasks pending",
                self.room,
                node,
                self.tasks.len()
            );
        }

        effects.push(Effect::BroadcastSnapshot);
        effects
    }

    /// Remove a worker node. Its in-flight task, if any, is abandoned.
    pub fn leave(&mut self, node: &ClientId) -> Vec<Effect> {
        if self.nodes.remove(node).is_none() {
            tracing::debug!("Room '{}': '{}' left but was not a node", self.room, node);
        }
        vec![Effect::BroadcastSnapshot]
    }

    // ========================================
    // Job lifecycle
    // ========================================

    /// Start a job with `config`; at most one job runs per room.
    pub fn start(
        &mut self,
        config: JobConfig,
        now: Timestamp,
        generator: &dyn TaskGenerator,
    ) -> Result<Vec<Effect>, ProtocolError> {
        if self.job_running {
            return Err(ProtocolError::JobAlreadyRunning(self.room.to_string()));
        }

        let config = Arc::new(config);
        self.config = Some(Arc::clone(&config));
        self.job = self.job.next();
        self.start = Some(now);
        self.total_fitness_sum = 0.0;
        self.chromosomes_returned = 0;
        for node in self.nodes.values_mut() {
            node.running = true;
            node.error = false;
            node.last_error = None;
        }
        self.job_running = true;

        let mut effects = self.start_job(&config, generator);
        effects.push(Effect::BroadcastSnapshot);
        Ok(effects)
    }

    /// Seed the queue with generation-0 work and hand one task to every node.
    fn start_job(&mut self, config: &Arc<JobConfig>, generator: &dyn TaskGenerator) -> Vec<Effect> {
        let count = self.tasks_per_node * self.nodes.len();
        self.bucket.clear();
        self.tasks = generator.generate(self.batch(0, config), count).into();

        let mut effects = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.keys() {
            match self.tasks.pop_front() {
                Some(task) => effects.push(Effect::Assign {
                    node: node.clone(),
                    task,
                }),
                None => break,
            }
        }
        tracing::info!(
            "Room '{}': job {} started with {} nodes, {} tasks queued",
            self.room,
            self.job.value(),
            self.nodes.len(),
            self.tasks.len()
        );
        effects
    }

    /// Aggregate a node's result and either terminate the job or keep it fed.
    ///
    /// The result is validated before any state changes. Every accepted result
    /// counts; retransmitting the same result counts it twice.
    pub fn task_completed(
        &mut self,
        node: &ClientId,
        finished: FinishedTask,
        now: Timestamp,
        generator: &dyn TaskGenerator,
    ) -> Result<Vec<Effect>, RoomError> {
        finished.validate()?;
        if !self.job_running {
            return Err(ProtocolError::JobNotRunning(self.room.to_string()).into());
        }
        if let Some(job) = finished.job
            && job != self.job
        {
            return Err(ProtocolError::StaleResult {
                room: self.room.to_string(),
                received: job.value(),
                current: self.job.value(),
            }
            .into());
        }
        let Some(config) = self.config.clone() else {
            return Err(ProtocolError::JobNotRunning(self.room.to_string()).into());
        };

        let FinishedTask {
            generation,
            population,
            fitnesses,
            ..
        } = finished;

        self.total_fitness_sum += fitnesses.iter().sum::<f64>();
        self.chromosomes_returned += population.len();

        let local_index = fittest_index(&fitnesses).unwrap_or(0);
        let local_best = (population[local_index].clone(), fitnesses[local_index]);

        self.bucket.merge(generation, population, fitnesses);

        let goal_reached = local_best.1 >= config.fitness_goal;
        let exhausted = self.bucket.len_of(config.max_generation) >= config.population_size;

        let mut effects = Vec::new();
        if goal_reached || exhausted {
            let (winner, fitness) = if goal_reached {
                local_best
            } else {
                self.bucket
                    .take(config.max_generation)
                    .and_then(BucketEntry::into_fittest)
                    .unwrap_or(local_best)
            };
            effects.push(Effect::Finished(
                self.finish(winner, fitness, goal_reached, now),
            ));
        } else {
            if self.nodes.contains_key(node)
                && let Some(task) = self.tasks.pop_front()
            {
                self.mark_running(node);
                effects.push(Effect::Assign {
                    node: node.clone(),
                    task,
                });
            }

            if self.bucket.len_of(generation) >= config.population_size {
                if let Some(entry) = self.bucket.take(generation) {
                    tracing::debug!(
                        "Room '{}': generation {} complete with {} chromosomes",
                        self.room,
                        generation,
                        entry.len()
                    );
                    self.tasks.push_back(Task {
                        room: self.room.clone(),
                        job: self.job,
                        generation,
                        population: entry.into_population(),
                        config: Arc::clone(&config),
                    });
                }
            } else {
                let filler = generator.generate(self.batch(generation, &config), 1);
                self.tasks.extend(filler);
            }
        }

        effects.push(Effect::BroadcastSnapshot);
        Ok(effects)
    }

    fn finish(
        &mut self,
        winner: Chromosome,
        fitness: f64,
        goal_reached: bool,
        now: Timestamp,
    ) -> JobOutcome {
        let started_at = self.start.take().unwrap_or(now);
        self.tasks.clear();
        self.bucket.clear();
        self.job_running = false;
        for node in self.nodes.values_mut() {
            node.running = false;
        }
        self.last_result = Some(winner.summary());

        JobOutcome {
            room: self.room.clone(),
            job: self.job,
            winning_chromosome: winner,
            fitness,
            goal_reached,
            node_count: self.nodes.len(),
            started_at,
            finished_at: now,
        }
    }

    /// Hard reset: drops the job and every node; nodes must rejoin.
    pub fn abort(&mut self) -> Vec<Effect> {
        let recipients = self.members();
        self.start = None;
        self.tasks.clear();
        self.bucket.clear();
        self.nodes.clear();
        self.job_running = false;
        tracing::info!("Room '{}': job {} aborted", self.room, self.job.value());
        vec![
            Effect::AbortNotice { recipients },
            Effect::BroadcastSnapshot,
        ]
    }

    /// Record a fault reported by a node; the job keeps running.
    pub fn node_error(
        &mut self,
        node: &ClientId,
        error: String,
    ) -> Result<Vec<Effect>, ProtocolError> {
        let Some(entry) = self.nodes.get_mut(node) else {
            return Err(ProtocolError::UnknownNode {
                room: self.room.to_string(),
                node: node.to_string(),
            });
        };
        entry.running = false;
        entry.error = true;
        entry.last_error = Some(error);
        Ok(vec![Effect::BroadcastSnapshot])
    }

    fn mark_running(&mut self, node: &ClientId) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.running = true;
        }
    }

    fn batch<'a>(&'a self, generation: u32, config: &'a Arc<JobConfig>) -> TaskBatch<'a> {
        TaskBatch {
            room: &self.room,
            job: self.job,
            generation,
            config,
        }
    }
}
