//! Uniform random candidates within the variable bounds.
//!
//! Useful as an initial population for an external optimizer and as a
//! quick screening pass from the command line.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::dispatch::{Bounds, Evaluation, Problem};
use crate::error::Result;

/// Draws every coordinate uniformly in `[lower[k], upper[k]]`.
///
/// Degenerate or non-finite intervals yield the lower bound.
pub fn sample_within<R: Rng>(bounds: &Bounds, rng: &mut R) -> Vec<f64> {
    bounds
        .lower
        .iter()
        .zip(&bounds.upper)
        .map(|(&lo, &hi)| {
            if lo < hi && (hi - lo).is_finite() {
                rng.random_range(lo..=hi)
            } else {
                lo
            }
        })
        .collect()
}

/// The best candidate found by [`screen_random_candidates`].
#[derive(Debug, Clone)]
pub struct Screening {
    pub candidate: Vec<f64>,
    pub evaluation: Evaluation,
    /// Number of candidates evaluated.
    pub evaluated: usize,
}

/// Worst residual of an evaluation, used to rank candidates.
pub fn total_violation(eval: &Evaluation) -> f64 {
    eval.max_equality_violation()
        .max(eval.max_inequality_violation())
}

/// Evaluates `count` seeded random candidates and keeps the best one.
///
/// Candidates are ranked by least violation first, then highest profit.
/// Returns `Ok(None)` when `count` is zero.
///
/// # Errors
///
/// Propagates evaluation errors from `problem`.
pub fn screen_random_candidates<P: Problem + ?Sized>(
    problem: &P,
    count: usize,
    seed: u64,
) -> Result<Option<Screening>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut best: Option<Screening> = None;

    for k in 0..count {
        let x = sample_within(problem.bounds(), &mut rng);
        let eval = problem.evaluate(&x)?;
        let better = match &best {
            None => true,
            Some(b) => is_better(&eval, &b.evaluation),
        };
        if better {
            debug!(
                candidate = k,
                profit = eval.profit,
                violation = total_violation(&eval),
                "new best candidate"
            );
            best = Some(Screening {
                candidate: x,
                evaluation: eval,
                evaluated: 0,
            });
        }
    }

    if let Some(b) = best.as_mut() {
        b.evaluated = count;
        info!(
            count,
            seed,
            profit = b.evaluation.profit,
            violation = total_violation(&b.evaluation),
            "screening finished"
        );
    }
    Ok(best)
}

fn is_better(candidate: &Evaluation, incumbent: &Evaluation) -> bool {
    let (vc, vi) = (total_violation(candidate), total_violation(incumbent));
    vc < vi || (vc == vi && candidate.profit > incumbent.profit)
}
