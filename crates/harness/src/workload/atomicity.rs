//! Atomicity: commit and rollback variants

use super::RunContext;
use crate::error::HarnessResult;
use crate::fixture::{
    create_account, locate_account, seek_account, ACCOUNT, AMOUNT, NAME, TRANSFER, TRANS_HISTORY,
};
use crate::log;
use crate::oracle::{atomicity_holds, AtomicityCheck};
use crate::orchestrator::Population;
use crate::outcome::{commit, Tally, TxnOutcome};
use isocheck_core::{GraphStore, StoreResult, Transaction, Value, WriteTxn};

/// Count accounts, named accounts and transfer history items
pub fn summarize<T: Transaction>(txn: &T) -> StoreResult<AtomicityCheck> {
    let mut check = AtomicityCheck::default();
    let mut cursor = txn.scan_vertices()?;
    while cursor.valid() {
        if cursor.label()? == ACCOUNT {
            check.accounts += 1;
            if !cursor.field(NAME)?.is_null() {
                check.named += 1;
            }
            check.history_items += log::count_items(&cursor.field(TRANS_HISTORY)?);
        }
        cursor.advance();
    }
    Ok(check)
}

fn current_summary<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<AtomicityCheck> {
    let txn = ctx.store.begin_read().map_err(|e| ctx.failure(e))?;
    summarize(&txn).map_err(|e| ctx.failure(e))
}

fn judge<S: GraphStore>(
    ctx: &RunContext<'_, S>,
    baseline: AtomicityCheck,
    mut tally: Tally,
) -> HarnessResult<Tally> {
    let actual = current_summary(ctx)?;
    let committed = tally.committed;
    tally.check(atomicity_holds(baseline, committed, actual), || {
        format!(
            "expected {:?} after {} commits, found {:?}",
            baseline.after_commits(committed),
            committed,
            actual
        )
    });
    Ok(tally)
}

/// Every writer appends to account 1, creates an account and links it
pub fn commit_all<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let baseline = current_summary(ctx)?;
    let tally = ctx
        .orchestrator
        .fan_out(Population::Writers, ctx.size.writers, |task| {
            let amount = 200 + task.index as i64;
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                let source = locate_account(&mut cursor, 1)?;
                log::append_vertex(&cursor, TRANS_HISTORY, &amount.to_string())?;
                drop(cursor);
                let target = create_account(&txn, 3 + task.index as i64, &[])?;
                txn.create_edge(source, target, TRANSFER, &[(AMOUNT, Value::Int(amount))])?;
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        })?;
    judge(ctx, baseline, tally)
}

/// Even writers find account 2 already exists and roll back after
/// appending; odd writers create a fresh account and commit
pub fn roll_back_half<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let baseline = current_summary(ctx)?;
    let tally = ctx
        .orchestrator
        .fan_out(Population::Writers, ctx.size.writers, |task| {
            let target = if task.index % 2 == 0 {
                2
            } else {
                3 + task.index as i64
            };
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                log::append_vertex(&cursor, TRANS_HISTORY, "200")?;
                let exists = seek_account(&mut cursor, target)?;
                drop(cursor);
                if exists {
                    txn.abort();
                    return Ok(TxnOutcome::ExplicitAbort);
                }
                create_account(&txn, target, &[])?;
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        })?;

    let mut tally = judge(ctx, baseline, tally)?;
    let expected = (ctx.size.writers as u64 + 1) / 2;
    let aborted = tally.explicit_aborts;
    tally.check(aborted == expected, || {
        format!("expected {} rollbacks, found {}", expected, aborted)
    });
    Ok(tally)
}
