//! Concurrent fan-out of workload tasks
//!
//! A population of homogeneous tasks runs on its own rayon pool sized by the
//! configured parallelism. Tests with writers and readers run the two
//! populations side by side in a thread scope and join both before any
//! oracle sees the final state.
//!
//! Tasks share nothing but the store. Each returns its own [`Tally`] and the
//! populations are reduced with [`Tally::merge`].

use crate::error::HarnessResult;
use crate::outcome::Tally;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic;
use std::thread;

/// Which population a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    /// Write transactions
    Writers,
    /// Read-only transactions
    Readers,
}

impl Population {
    fn stream(self) -> u64 {
        match self {
            Population::Writers => 0,
            Population::Readers => 1,
        }
    }
}

/// Per-task context handed to a workload closure
pub struct TaskContext {
    /// Index of the task within its population, from 0
    pub index: usize,
    rng: StdRng,
}

impl TaskContext {
    /// Deterministic random source of this task
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Seed of one task's random source
///
/// SplitMix64 over (seed, population, index): reproducible for a given
/// seed whatever thread the task lands on.
pub fn task_seed(seed: u64, population: Population, index: usize) -> u64 {
    let mut x = seed ^ (population.stream() << 62) ^ ((index as u64) << 1);
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn merge_results(a: HarnessResult<Tally>, b: HarnessResult<Tally>) -> HarnessResult<Tally> {
    Ok(a?.merge(b?))
}

/// Runs populations of workload tasks
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    parallelism: usize,
    seed: u64,
}

impl Orchestrator {
    /// Create an orchestrator running up to `parallelism` tasks per population
    pub fn new(parallelism: usize, seed: u64) -> Self {
        Orchestrator {
            parallelism: parallelism.max(1),
            seed,
        }
    }

    /// Worker threads per population
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Base seed of the per-task random sources
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn pool(&self) -> HarnessResult<ThreadPool> {
        Ok(ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .thread_name(|i| format!("isocheck-worker-{}", i))
            .build()?)
    }

    fn context(&self, population: Population, index: usize) -> TaskContext {
        TaskContext {
            index,
            rng: StdRng::seed_from_u64(task_seed(self.seed, population, index)),
        }
    }

    /// Run `count` tasks and reduce their tallies
    ///
    /// The first error returned by any task is returned; the remaining tasks
    /// still run to completion.
    pub fn fan_out<F>(&self, population: Population, count: usize, task: F) -> HarnessResult<Tally>
    where
        F: Fn(&mut TaskContext) -> HarnessResult<Tally> + Send + Sync,
    {
        let pool = self.pool()?;
        pool.install(|| {
            (0..count)
                .into_par_iter()
                .map(|index| task(&mut self.context(population, index)))
                .reduce(|| Ok(Tally::default()), merge_results)
        })
    }

    /// Run `count` tasks and collect their results in task order
    pub fn collect<R, F>(&self, population: Population, count: usize, task: F) -> HarnessResult<Vec<R>>
    where
        R: Send,
        F: Fn(&mut TaskContext) -> HarnessResult<R> + Send + Sync,
    {
        let pool = self.pool()?;
        pool.install(|| {
            (0..count)
                .into_par_iter()
                .map(|index| task(&mut self.context(population, index)))
                .collect()
        })
    }

    /// Run a writer and a reader population concurrently
    ///
    /// Returns the writer and reader tallies once both populations joined.
    pub fn race<W, R>(
        &self,
        writers: usize,
        write: W,
        readers: usize,
        read: R,
    ) -> HarnessResult<(Tally, Tally)>
    where
        W: Fn(&mut TaskContext) -> HarnessResult<Tally> + Send + Sync,
        R: Fn(&mut TaskContext) -> HarnessResult<Tally> + Send + Sync,
    {
        thread::scope(|s| {
            let writer_group = s.spawn(|| self.fan_out(Population::Writers, writers, write));
            let reader_group = s.spawn(|| self.fan_out(Population::Readers, readers, read));
            let written = writer_group
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            let observed = reader_group
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            Ok((written?, observed?))
        })
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        let parallelism = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Orchestrator::new(parallelism, 0)
    }
}
