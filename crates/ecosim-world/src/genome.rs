//! Genomes and the crossover that produces a child's genome.

use crate::element::Animal;
use ecosim_core::{GeneticsConfig, MutationStyle, RandomSource, DIRECTION_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-length sequence of turn instructions, each in `[0, 8)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genome(Vec<u8>);

impl Genome {
    pub fn new(genes: Vec<u8>) -> Self {
        Self(genes.into_iter().map(|gene| gene % DIRECTION_COUNT).collect())
    }

    pub fn random(length: usize, rng: &mut dyn RandomSource) -> Self {
        Self(
            (0..length)
                .map(|_| rng.random_int(0, DIRECTION_COUNT as i32) as u8)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn gene(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn genes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for gene in &self.0 {
            write!(f, "{}", gene)?;
        }
        Ok(())
    }
}

/// Produces the genome of a child from its two parents
pub trait GenomeCombiner {
    fn combine(&self, mum: &Animal, dad: &Animal, rng: &mut dyn RandomSource) -> Genome;
}

/// Energy-weighted one-point crossover followed by mutation.
///
/// The stronger parent contributes a share of genes proportional to its part
/// of the couple's energy, taken from a randomly chosen end of the genome.
/// The weaker parent fills the rest. Afterwards between `min_mutations` and
/// `max_mutations` distinct genes are mutated.
pub struct Crossover {
    config: GeneticsConfig,
}

impl Crossover {
    pub fn new(config: GeneticsConfig) -> Self {
        Self { config }
    }

    fn stronger_share(&self, stronger: i32, weaker: i32, length: usize) -> usize {
        let total = stronger as i64 + weaker as i64;
        if total <= 0 {
            return length / 2;
        }
        ((length as i64 * stronger as i64 + total / 2) / total) as usize
    }

    fn mutate(&self, genes: &mut [u8], rng: &mut dyn RandomSource) {
        let max = self.config.max_mutations.min(genes.len());
        let min = self.config.min_mutations.min(max);
        let count = rng.random_int(min as i32, max as i32 + 1) as usize;

        // Partial Fisher-Yates picks `count` distinct genes
        let mut indices: Vec<usize> = (0..genes.len()).collect();
        for i in 0..count {
            let j = rng.random_int(i as i32, indices.len() as i32) as usize;
            indices.swap(i, j);

            let gene = &mut genes[indices[i]];
            *gene = match self.config.mutation_style {
                MutationStyle::FullRandom => rng.random_int(0, DIRECTION_COUNT as i32) as u8,
                MutationStyle::SlightCorrection => {
                    if rng.is_true(50) {
                        (*gene + 1) % DIRECTION_COUNT
                    } else {
                        (*gene + DIRECTION_COUNT - 1) % DIRECTION_COUNT
                    }
                }
            };
        }
    }
}

impl GenomeCombiner for Crossover {
    fn combine(&self, mum: &Animal, dad: &Animal, rng: &mut dyn RandomSource) -> Genome {
        let (stronger, weaker) = if mum.energy >= dad.energy {
            (mum, dad)
        } else {
            (dad, mum)
        };
        let strong_genes = stronger.genome().genes();
        let weak_genes = weaker.genome().genes();
        let length = strong_genes.len().min(weak_genes.len());
        let share = self.stronger_share(stronger.energy, weaker.energy, length);

        let mut genes = Vec::with_capacity(length);
        if rng.is_true(50) {
            genes.extend_from_slice(&strong_genes[..share]);
            genes.extend_from_slice(&weak_genes[share..length]);
        } else {
            let split = length - share;
            genes.extend_from_slice(&weak_genes[..split]);
            genes.extend_from_slice(&strong_genes[split..length]);
        }

        self.mutate(&mut genes, rng);
        Genome(genes)
    }
}
