use crate::mix::OpKind;
use crate::ops::PreparedOp;
use crate::runner::RunContext;
use rand::rngs::StdRng;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Operations claimed from the budget, successful or not
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Run one shuffled batch sequentially, stopping early if the budget runs
/// out. Failures are counted in the shared state and never retried.
pub async fn execute_batch(ctx: &RunContext, batch: &[OpKind], rng: &mut StdRng) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for &op in batch {
        if !ctx.state.claim(ctx.budget) {
            break;
        }
        outcome.executed += 1;

        let Some(prepared) = PreparedOp::prepare(op, ctx.generator.as_ref(), &ctx.state, rng) else {
            debug!(%op, "no live record to target, skipping");
            ctx.state.record_skip();
            outcome.skipped += 1;
            continue;
        };

        if let Err(err) = prepared.issue(ctx.backend.as_ref()).await {
            debug!(%op, error = %err, "operation failed");
            ctx.state.record_error(op);
            outcome.failed += 1;
        }
    }
    outcome
}
