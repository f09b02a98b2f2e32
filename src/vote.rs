//! Majority vote with reservoir-sampled tie breaking

use rand::Rng;

/// Source of uniform draws in `[0, 1)`.
///
/// Every `rand::Rng` is a source, so seeded generators give reproducible votes.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Per-class vote counts for one query row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    votes: Vec<usize>,
}

impl VoteTally {
    pub fn new(n_classes: usize) -> Self {
        Self {
            votes: vec![0; n_classes],
        }
    }

    pub fn reset(&mut self) {
        self.votes.iter_mut().for_each(|v| *v = 0);
    }

    #[inline]
    pub fn add(&mut self, label: usize) {
        self.votes[label] += 1;
    }

    pub fn votes(&self) -> &[usize] {
        &self.votes
    }

    /// Total number of votes cast
    pub fn total(&self) -> usize {
        self.votes.iter().sum()
    }

    /// Pick the class with the most votes.
    ///
    /// Scans classes in increasing index order. Each class that ties the
    /// running maximum consumes exactly one draw and replaces the leader with
    /// probability `1 / ntie`, which yields a uniform pick among all classes
    /// tied for the final maximum.
    pub fn resolve<S: UniformSource + ?Sized>(&self, source: &mut S) -> usize {
        let mut leader = 0;
        let mut max_votes = self.votes[0];
        let mut n_tied = 1usize;

        for (class, &count) in self.votes.iter().enumerate().skip(1) {
            if count > max_votes {
                leader = class;
                max_votes = count;
                n_tied = 1;
            } else if count == max_votes {
                n_tied += 1;
                if (n_tied as f64) * source.next_uniform() < 1.0 {
                    leader = class;
                }
            }
        }

        leader
    }
}
