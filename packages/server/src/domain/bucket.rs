//! Per-generation accumulator of returned population and fitness fragments.

use std::collections::BTreeMap;

use super::value_object::Chromosome;

/// Accumulated results of one generation.
///
/// `population` and `fitnesses` always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketEntry {
    population: Vec<Chromosome>,
    fitnesses: Vec<f64>,
}

impl BucketEntry {
    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn fitnesses(&self) -> &[f64] {
        &self.fitnesses
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn into_population(self) -> Vec<Chromosome> {
        self.population
    }

    /// Final selection: the chromosome with the strictly greatest fitness.
    pub fn into_fittest(self) -> Option<(Chromosome, f64)> {
        let index = fittest_index(&self.fitnesses)?;
        let fitness = self.fitnesses[index];
        self.population
            .into_iter()
            .nth(index)
            .map(|chromosome| (chromosome, fitness))
    }
}

/// Index of the maximum fitness; the first occurrence wins ties.
pub fn fittest_index(fitnesses: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &fitness) in fitnesses.iter().enumerate() {
        match best {
            Some((_, most_fit)) if fitness > most_fit => best = Some((index, fitness)),
            None => best = Some((index, fitness)),
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}

/// Mapping from generation to its accumulated entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    entries: BTreeMap<u32, BucketEntry>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate a fragment onto the generation's entry, creating it if absent.
    ///
    /// Callers must pass equally long slices (see `FinishedTask::validate`).
    pub fn merge(&mut self, generation: u32, population: Vec<Chromosome>, fitnesses: Vec<f64>) {
        debug_assert_eq!(population.len(), fitnesses.len());
        let entry = self.entries.entry(generation).or_default();
        entry.population.extend(population);
        entry.fitnesses.extend(fitnesses);
    }

    pub fn get(&self, generation: u32) -> Option<&BucketEntry> {
        self.entries.get(&generation)
    }

    /// Accumulated population size of a generation (0 when absent).
    pub fn len_of(&self, generation: u32) -> usize {
        self.entries.get(&generation).map_or(0, BucketEntry::len)
    }

    /// Remove and return a generation's entry.
    pub fn take(&mut self, generation: u32) -> Option<BucketEntry> {
        self.entries.remove(&generation)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(generation, accumulated size)` pairs in ascending generation order.
    pub fn sizes(&self) -> Vec<(u32, usize)> {
        self.entries
            .iter()
            .map(|(generation, entry)| (*generation, entry.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chromosomes(names: &[&str]) -> Vec<Chromosome> {
        names
            .iter()
            .map(|name| Chromosome::new(vec![name.to_string()]))
            .collect()
    }

    #[test]
    fn test_merge_concatenates_fragments_of_same_generation() {
        // テスト項目: 同じ世代の断片は連結され、添字の対応が保たれる
        // given (前提条件):
        let mut bucket = Bucket::new();

        // when (操作):
        bucket.merge(2, chromosomes(&["a", "b"]), vec![1.0, 2.0]);
        bucket.merge(2, chromosomes(&["c"]), vec![3.0]);
        bucket.merge(2, chromosomes(&["d", "e", "f"]), vec![4.0, 5.0, 6.0]);

        // then (期待する結果):
        let entry = bucket.get(2).unwrap();
        assert_eq!(entry.len(), 6);
        assert_eq!(entry.fitnesses().len(), 6);
        assert_eq!(entry.population()[2], Chromosome::from(vec!["c"]));
        assert_eq!(entry.fitnesses()[2], 3.0);
        assert_eq!(entry.population()[5], Chromosome::from(vec!["f"]));
        assert_eq!(entry.fitnesses()[5], 6.0);
    }

    #[test]
    fn test_generations_are_kept_apart() {
        // テスト項目: 異なる世代は別々のエントリに蓄積される
        // given (前提条件):
        let mut bucket = Bucket::new();

        // when (操作):
        bucket.merge(0, chromosomes(&["a"]), vec![1.0]);
        bucket.merge(1, chromosomes(&["b", "c"]), vec![1.0, 1.0]);

        // then (期待する結果):
        assert_eq!(bucket.sizes(), vec![(0, 1), (1, 2)]);
        assert_eq!(bucket.len_of(7), 0);
    }

    #[test]
    fn test_take_clears_the_slot() {
        // テスト項目: take したエントリはバケットから消える
        // given (前提条件):
        let mut bucket = Bucket::new();
        bucket.merge(1, chromosomes(&["a"]), vec![1.0]);

        // when (操作):
        let taken = bucket.take(1);

        // then (期待する結果):
        assert_eq!(taken.unwrap().len(), 1);
        assert!(bucket.get(1).is_none());
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_fittest_index_prefers_first_on_ties() {
        // テスト項目: 最大値が複数ある場合は最初のものが選ばれる
        assert_eq!(fittest_index(&[1.0, 5.0, 3.0, 5.0]), Some(1));
        assert_eq!(fittest_index(&[-2.0, -1.0]), Some(1));
        assert_eq!(fittest_index(&[]), None);
    }

    #[test]
    fn test_into_fittest_returns_matching_chromosome() {
        // テスト項目: 最終選択は最大適応度の染色体とその値を返す
        // given (前提条件):
        let mut bucket = Bucket::new();
        bucket.merge(3, chromosomes(&["a", "b", "c"]), vec![0.5, 0.9, 0.9]);

        // when (操作):
        let winner = bucket.take(3).unwrap().into_fittest();

        // then (期待する結果):
        assert_eq!(winner, Some((Chromosome::from(vec!["b"]), 0.9)));
    }
}
