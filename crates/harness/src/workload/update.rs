//! Lost update (LU) and write skew (WS)

use super::{balance, count_transfers, RunContext};
use crate::error::HarnessResult;
use crate::fixture::{create_account, locate_account, BALANCE, NUM_TRANSFERRED, TRANSFER, WS_PAIRS};
use crate::oracle::{no_lost_update, pair_invariant_holds};
use crate::orchestrator::Population;
use crate::outcome::{commit, Tally, TxnOutcome};
use isocheck_core::{GraphStore, Transaction, Value, WriteTxn};
use rand::Rng;

/// Amount a write-skew writer debits
const DEBIT: f64 = 100.0;

/// Writers increment the counter of account 1 and add one transfer to a
/// fresh account; counter and transfer count must both equal the commits
pub fn lu<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let mut tally = ctx
        .orchestrator
        .fan_out(Population::Writers, ctx.size.writers, |task| {
            let target = task.index as i64 + 2;
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                let source = locate_account(&mut cursor, 1)?;
                let counter = cursor.field(NUM_TRANSFERRED)?.as_int().unwrap_or_default();
                cursor.set_field(NUM_TRANSFERRED, Value::Int(counter + 1))?;
                drop(cursor);
                let fresh = create_account(&txn, target, &[])?;
                txn.create_edge(source, fresh, TRANSFER, &[])?;
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        })?;

    let (counter, transfers) = ctx
        .store
        .begin_read()
        .and_then(|txn| {
            let mut cursor = txn.scan_vertices()?;
            locate_account(&mut cursor, 1)?;
            let counter = cursor.field(NUM_TRANSFERRED)?.as_int().unwrap_or_default();
            Ok((counter, count_transfers(cursor.out_edges()?)?))
        })
        .map_err(|e| ctx.failure(e))?;

    let committed = tally.committed;
    tally.check(no_lost_update(counter, transfers, committed), || {
        format!(
            "{} commits but counter {} and {} transfers",
            committed, counter, transfers
        )
    });
    Ok(tally)
}

/// Writers pick a random pair, check that it can cover a debit, pause, and
/// debit one side; no pair may end with a negative sum
pub fn ws<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let mut tally = ctx
        .orchestrator
        .fan_out(Population::Writers, ctx.size.writers, |task| {
            let pair = task.rng().gen_range(1..=WS_PAIRS);
            let debit_first = task.rng().gen_bool(0.5);
            let outcome = ctx.write(|txn| {
                let mut first = txn.scan_vertices()?;
                locate_account(&mut first, 2 * pair - 1)?;
                let b1 = balance(&first)?;
                let mut second = txn.scan_vertices()?;
                locate_account(&mut second, 2 * pair)?;
                let b2 = balance(&second)?;

                if b1 + b2 - DEBIT < 0.0 {
                    drop(first);
                    drop(second);
                    txn.abort();
                    return Ok(TxnOutcome::Skipped);
                }
                ctx.pause();
                if debit_first {
                    first.set_field(BALANCE, Value::Float(b1 - DEBIT))?;
                } else {
                    second.set_field(BALANCE, Value::Float(b2 - DEBIT))?;
                }
                drop(first);
                drop(second);
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        })?;

    let balances = ctx
        .store
        .begin_read()
        .and_then(|txn| {
            let mut cursor = txn.scan_vertices()?;
            let mut balances = Vec::with_capacity(WS_PAIRS as usize);
            for pair in 1..=WS_PAIRS {
                locate_account(&mut cursor, 2 * pair - 1)?;
                let b1 = balance(&cursor)?;
                locate_account(&mut cursor, 2 * pair)?;
                balances.push((pair, b1, balance(&cursor)?));
            }
            Ok(balances)
        })
        .map_err(|e| ctx.failure(e))?;

    for (pair, b1, b2) in balances {
        tally.check(pair_invariant_holds(b1, b2), || {
            format!(
                "accounts {} and {} hold {} + {} < 0",
                2 * pair - 1,
                2 * pair,
                b1,
                b2
            )
        });
    }
    Ok(tally)
}
