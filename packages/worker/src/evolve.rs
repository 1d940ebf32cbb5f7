//! One generation step over an assigned population slice.

use colony_server::infrastructure::dto::websocket::{FinishedTaskDto, TaskDto};
use rand::Rng;

use crate::{
    error::WorkerError,
    strategy::{Mutation, Scored, Selection, fitness_function},
};

/// Number of children bred from `len` parents.
fn offspring_count(len: usize, reproductive_coefficient: f64) -> usize {
    ((len as f64) * reproductive_coefficient).round().max(1.0) as usize
}

/// Single-point crossover; the cut never falls on the ends.
fn crossover<R: Rng + ?Sized>(first: &[String], second: &[String], rng: &mut R) -> Vec<String> {
    let len = first.len().min(second.len());
    if len < 2 {
        return first.to_vec();
    }
    let cut = rng.gen_range(1..len);
    first[..cut]
        .iter()
        .chain(&second[cut..])
        .cloned()
        .collect()
}

/// Evolve the task's population by one generation.
///
/// The result carries the task's job fence and `generation + 1`.
pub fn evolve<R: Rng + ?Sized>(
    task: &TaskDto,
    rng: &mut R,
) -> Result<FinishedTaskDto, WorkerError> {
    if task.population.is_empty() {
        return Err(WorkerError::EmptyPopulation);
    }
    let fitness = fitness_function(&task.fitness)?;
    let selection = Selection::from_ref(&task.selection)?;
    let mutations = task
        .mutations
        .iter()
        .map(Mutation::from_ref)
        .collect::<Result<Vec<_>, _>>()?;

    let scored: Vec<Scored> = task
        .population
        .iter()
        .map(|genes| Scored {
            genes: genes.clone(),
            fitness: fitness.evaluate(genes),
        })
        .collect();

    let count = offspring_count(scored.len(), task.reproductive_coefficient);
    let parents = selection.select(&scored, count, rng);
    let mut children = Vec::with_capacity(parents.len());
    for (i, parent) in parents.iter().enumerate() {
        let mate = &parents[(i + 1) % parents.len()];
        children.push(crossover(parent, mate, rng));
    }
    for child in children.iter_mut() {
        for mutation in &mutations {
            mutation.apply(child, &task.gene_pool, rng);
        }
    }

    // strict `>`: the first of equally fit parents is the elite
    let elite = scored
        .iter()
        .reduce(|best, s| if s.fitness > best.fitness { s } else { best });
    if task.elitism
        && let (Some(elite), Some(first)) = (elite, children.first_mut())
    {
        *first = elite.genes.clone();
    }

    let fitnesses = children.iter().map(|child| fitness.evaluate(child)).collect();
    Ok(FinishedTaskDto {
        job: Some(task.job),
        generation: task.generation + 1,
        population: children,
        fitnesses,
    })
}
