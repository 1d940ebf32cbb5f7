//! Random population task generator.

use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::domain::{Chromosome, JobConfig, Task, TaskBatch, TaskGenerator};

/// Generates tasks whose populations are drawn uniformly from the gene pool.
///
/// The population size is split across the batch: each of `count` tasks
/// carries `ceil(population_size / count)` chromosomes.
pub struct RandomTaskGenerator {
    rng: Mutex<StdRng>,
}

impl RandomTaskGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn random_chromosome(rng: &mut StdRng, config: &JobConfig) -> Chromosome {
        Chromosome::new(
            (0..config.chromosome_length)
                .map(|_| config.gene_pool[rng.gen_range(0..config.gene_pool.len())].clone())
                .collect(),
        )
    }
}

impl Default for RandomTaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGenerator for RandomTaskGenerator {
    fn generate(&self, batch: TaskBatch<'_>, count: usize) -> Vec<Task> {
        if count == 0 || batch.config.gene_pool.is_empty() {
            return Vec::new();
        }
        let slice = batch.config.population_size.div_ceil(count).max(1);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        (0..count)
            .map(|_| Task {
                room: batch.room.clone(),
                job: batch.job,
                generation: batch.generation,
                population: (0..slice)
                    .map(|_| Self::random_chromosome(&mut rng, batch.config))
                    .collect(),
                config: Arc::clone(batch.config),
            })
            .collect()
    }
}
