//! Observed transaction vanishes (OTV) and fractured read (FR) over the
//! four-account transfer cycle

use super::RunContext;
use crate::error::HarnessResult;
use crate::fixture::{locate_account, BALANCE};
use crate::oracle::{no_vanished_writes, stable_read};
use crate::outcome::{commit, Tally, TxnOutcome};
use isocheck_core::{
    GraphStore, StoreError, StoreResult, Transaction, Value, VertexCursor, VertexRef, WriteTxn,
};

/// Accounts on the cycle
const CYCLE_LEN: usize = 4;

/// Depth-first search for a transfer cycle of `CYCLE_LEN` accounts
/// returning to `path[0]`
fn extend_cycle<T: Transaction>(txn: &T, path: &mut Vec<VertexRef>) -> StoreResult<bool> {
    let last = match path.last() {
        Some(v) => *v,
        None => return Ok(false),
    };
    let mut edges = VertexCursor::at(txn, last)?.out_edges()?;
    while edges.valid() {
        let next = edges.dst()?;
        if path.len() == CYCLE_LEN {
            if next == path[0] {
                return Ok(true);
            }
        } else {
            path.push(next);
            if extend_cycle(txn, path)? {
                return Ok(true);
            }
            path.pop();
        }
        edges.advance();
    }
    Ok(false)
}

/// The accounts of the transfer cycle through account 1, in cycle order
fn find_cycle<T: Transaction>(txn: &T) -> StoreResult<Option<Vec<VertexRef>>> {
    let mut cursor = txn.scan_vertices()?;
    let mut path = vec![locate_account(&mut cursor, 1)?];
    Ok(if extend_cycle(txn, &mut path)? {
        Some(path)
    } else {
        None
    })
}

fn cycle_balances<T: Transaction>(txn: &T) -> StoreResult<Vec<f64>> {
    let cycle = find_cycle(txn)?
        .ok_or_else(|| StoreError::invalid_state("transfer cycle through account 1 is missing"))?;
    cycle
        .into_iter()
        .map(|v| {
            txn.vertex_field(v, BALANCE)?
                .as_float()
                .ok_or_else(|| StoreError::invalid_state(format!("{} has no balance", v)))
        })
        .collect()
}

/// Increment every balance on the cycle in one transaction
fn bump_cycle<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let outcome = ctx.write(|txn| {
        let cycle = match find_cycle(&txn)? {
            Some(cycle) => cycle,
            None => {
                txn.abort();
                return Ok(TxnOutcome::Skipped);
            }
        };
        for v in cycle {
            let current = txn.vertex_field(v, BALANCE)?.as_float().unwrap_or_default();
            txn.set_vertex_field(v, BALANCE, Value::Float(current + 1.0))?;
        }
        Ok(commit(txn, ()))
    })?;
    Ok(Tally::of(&outcome))
}

/// Read the cycle's balances twice around a pause
fn read_cycle_twice<S: GraphStore>(
    ctx: &RunContext<'_, S>,
    judge: impl FnOnce(&[f64], &[f64], &mut Tally),
) -> HarnessResult<Tally> {
    ctx.observe(|txn| {
        let first = cycle_balances(txn)?;
        ctx.pause();
        let second = cycle_balances(txn)?;
        let mut tally = Tally::default();
        judge(&first, &second, &mut tally);
        Ok(tally)
    })
}

/// Readers must never see an older cycle after a newer one
pub fn otv<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| bump_cycle(ctx),
        ctx.size.readers,
        |_| {
            read_cycle_twice(ctx, |first, second, tally| {
                tally.check(no_vanished_writes(first, second), || {
                    format!("read {:?} then {:?}", first, second)
                })
            })
        },
    )?;
    Ok(written.merge(observed))
}

/// Readers must see the same cycle twice
pub fn fr<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| bump_cycle(ctx),
        ctx.size.readers,
        |_| {
            read_cycle_twice(ctx, |first, second, tally| {
                tally.check(stable_read(&first, &second), || {
                    format!("read {:?} then {:?}", first, second)
                })
            })
        },
    )?;
    Ok(written.merge(observed))
}
