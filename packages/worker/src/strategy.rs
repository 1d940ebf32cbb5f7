//! Built-in strategy catalogue.
//!
//! Tasks reference strategies by name with an optional body that
//! parameterizes them:
//!
//! | kind      | name           | body                                   |
//! |-----------|----------------|----------------------------------------|
//! | fitness   | `count-gene`   | gene to count (default `1`)            |
//! | fitness   | `match-target` | comma-delimited target chromosome      |
//! | selection | `truncation`   | none                                   |
//! | selection | `tournament`   | tournament size (default 2)            |
//! | mutation  | `point`        | per-gene mutation rate (default 0.1)   |
//! | mutation  | `swap`         | none                                   |

use colony_server::infrastructure::dto::websocket::StrategyRefDto;
use rand::Rng;

use crate::error::WorkerError;

const DEFAULT_COUNTED_GENE: &str = "1";
const DEFAULT_TOURNAMENT_SIZE: usize = 2;
const DEFAULT_POINT_RATE: f64 = 0.1;

/// A chromosome with its evaluated fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub genes: Vec<String>,
    pub fitness: f64,
}

pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, genes: &[String]) -> f64;
}

/// Number of occurrences of one gene symbol.
pub struct CountGene {
    gene: String,
}

impl FitnessFunction for CountGene {
    fn evaluate(&self, genes: &[String]) -> f64 {
        genes.iter().filter(|gene| **gene == self.gene).count() as f64
    }
}

/// Number of positions agreeing with a target chromosome.
pub struct MatchTarget {
    target: Vec<String>,
}

impl FitnessFunction for MatchTarget {
    fn evaluate(&self, genes: &[String]) -> f64 {
        genes
            .iter()
            .zip(&self.target)
            .filter(|(gene, target)| gene == target)
            .count() as f64
    }
}

fn body(strategy: &StrategyRefDto) -> Option<&str> {
    strategy
        .body
        .as_deref()
        .map(str::trim)
        .filter(|body| !body.is_empty())
}

fn unknown(kind: &'static str, strategy: &StrategyRefDto) -> WorkerError {
    WorkerError::UnknownStrategy {
        kind,
        name: strategy.name.clone(),
    }
}

fn invalid(kind: &'static str, reason: impl Into<String>) -> WorkerError {
    WorkerError::InvalidStrategy {
        kind,
        reason: reason.into(),
    }
}

pub fn fitness_function(
    strategy: &StrategyRefDto,
) -> Result<Box<dyn FitnessFunction>, WorkerError> {
    match strategy.name.as_str() {
        "count-gene" => Ok(Box::new(CountGene {
            gene: body(strategy).unwrap_or(DEFAULT_COUNTED_GENE).to_string(),
        })),
        "match-target" => {
            let target: Vec<String> = body(strategy)
                .ok_or_else(|| invalid("fitness", "match-target needs a target"))?
                .split(',')
                .map(|gene| gene.trim().to_string())
                .collect();
            Ok(Box::new(MatchTarget { target }))
        }
        _ => Err(unknown("fitness", strategy)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Fittest half, cycled
    Truncation,
    Tournament { size: usize },
}

impl Selection {
    pub fn from_ref(strategy: &StrategyRefDto) -> Result<Self, WorkerError> {
        match strategy.name.as_str() {
            "truncation" => Ok(Self::Truncation),
            "tournament" => {
                let size = match body(strategy) {
                    Some(body) => body
                        .parse::<usize>()
                        .ok()
                        .filter(|size| *size > 0)
                        .ok_or_else(|| {
                            invalid("selection", format!("bad tournament size '{}'", body))
                        })?,
                    None => DEFAULT_TOURNAMENT_SIZE,
                };
                Ok(Self::Tournament { size })
            }
            _ => Err(unknown("selection", strategy)),
        }
    }

    /// Pick `count` parents from a non-empty scored population.
    pub fn select<R: Rng + ?Sized>(
        &self,
        scored: &[Scored],
        count: usize,
        rng: &mut R,
    ) -> Vec<Vec<String>> {
        if scored.is_empty() {
            return Vec::new();
        }
        match self {
            Self::Truncation => {
                let mut ranked: Vec<&Scored> = scored.iter().collect();
                ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
                let keep = scored.len().div_ceil(2);
                ranked
                    .into_iter()
                    .take(keep)
                    .cycle()
                    .take(count)
                    .map(|s| s.genes.clone())
                    .collect()
            }
            Self::Tournament { size } => (0..count)
                .map(|_| {
                    let mut best = &scored[rng.gen_range(0..scored.len())];
                    for _ in 1..*size {
                        let challenger = &scored[rng.gen_range(0..scored.len())];
                        if challenger.fitness > best.fitness {
                            best = challenger;
                        }
                    }
                    best.genes.clone()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    /// Replace each gene with a random pool gene with probability `rate`
    Point { rate: f64 },
    /// Exchange two random positions
    Swap,
}

impl Mutation {
    pub fn from_ref(strategy: &StrategyRefDto) -> Result<Self, WorkerError> {
        match strategy.name.as_str() {
            "point" => {
                let rate = match body(strategy) {
                    Some(body) => body
                        .parse::<f64>()
                        .ok()
                        .filter(|rate| (0.0..=1.0).contains(rate))
                        .ok_or_else(|| {
                            invalid("mutation", format!("bad point rate '{}'", body))
                        })?,
                    None => DEFAULT_POINT_RATE,
                };
                Ok(Self::Point { rate })
            }
            "swap" => Ok(Self::Swap),
            _ => Err(unknown("mutation", strategy)),
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        genes: &mut [String],
        gene_pool: &[String],
        rng: &mut R,
    ) {
        match self {
            Self::Point { rate } => {
                if gene_pool.is_empty() {
                    return;
                }
                for gene in genes.iter_mut() {
                    if rng.gen_bool(*rate) {
                        *gene = gene_pool[rng.gen_range(0..gene_pool.len())].clone();
                    }
                }
            }
            Self::Swap => {
                if genes.len() < 2 {
                    return;
                }
                let a = rng.gen_range(0..genes.len());
                let b = rng.gen_range(0..genes.len());
                genes.swap(a, b);
            }
        }
    }
}
