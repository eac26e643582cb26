//! Dirty writes (G0), aborted reads (G1a), intermediate reads (G1b) and
//! circular information flow (G1c)

use super::{balance, RunContext};
use crate::error::HarnessResult;
use crate::fixture::{locate_account, BALANCE, TRANSFER, VERSION_HISTORY};
use crate::log;
use crate::oracle::{circular_flows, logs_agree, no_aborted_read, no_intermediate_read};
use crate::orchestrator::Population;
use crate::outcome::{commit, Tally, TxnOutcome};
use isocheck_core::{
    EdgeCursor, GraphStore, StoreError, StoreResult, Transaction, Value, VertexCursor, VertexRef,
    WriteTxn,
};
use rand::Rng;

/// Balance written by aborting and overwritten by committing writers
const DIRTY_BALANCE: f64 = 200.0;
/// Committed balance of the G1a and G1b fixtures
const CLEAN_BALANCE: f64 = 99.0;

/// Cursor on the transfer edge from `src` to `dst`
fn transfer_between<T: Transaction>(
    txn: &T,
    src: VertexRef,
    dst: VertexRef,
) -> StoreResult<EdgeCursor<'_, T>> {
    let mut edges = VertexCursor::at(txn, src)?.out_edges()?;
    while edges.valid() {
        if edges.dst()? == dst && edges.label()? == TRANSFER {
            return Ok(edges);
        }
        edges.advance();
    }
    Err(StoreError::not_found(format!("transfer {} -> {}", src, dst)))
}

/// Every writer appends its id to both accounts and the transfer between
/// them; all three logs must end up identical
pub fn g0<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let mut tally = ctx
        .orchestrator
        .fan_out(Population::Writers, ctx.size.writers, |task| {
            let item = (task.index + 1).to_string();
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                let a1 = locate_account(&mut cursor, 1)?;
                log::append_vertex(&cursor, VERSION_HISTORY, &item)?;
                let a2 = locate_account(&mut cursor, 2)?;
                log::append_vertex(&cursor, VERSION_HISTORY, &item)?;
                let edge = transfer_between(&txn, a1, a2)?;
                log::append_edge(&edge, VERSION_HISTORY, &item)?;
                drop(edge);
                drop(cursor);
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        })?;

    let logs = ctx
        .store
        .begin_read()
        .and_then(|txn| {
            let mut cursor = txn.scan_vertices()?;
            let a1 = locate_account(&mut cursor, 1)?;
            let log1 = cursor.field(VERSION_HISTORY)?;
            let a2 = locate_account(&mut cursor, 2)?;
            let log2 = cursor.field(VERSION_HISTORY)?;
            let transfer = transfer_between(&txn, a1, a2)?.field(VERSION_HISTORY)?;
            Ok((log1, log2, transfer))
        })
        .map_err(|e| ctx.failure(e))?;

    let (log1, log2, transfer) = logs;
    let (l1, l2, lt) = (
        log1.as_str().unwrap_or_default(),
        log2.as_str().unwrap_or_default(),
        transfer.as_str().unwrap_or_default(),
    );
    tally.check(logs_agree(l1, l2, lt), || {
        format!("logs diverge: account 1 {:?}, account 2 {:?}, transfer {:?}", l1, l2, lt)
    });
    let applied = log::count_items(&transfer);
    let committed = tally.committed;
    tally.check(applied == committed + 1, || {
        format!(
            "transfer log holds {} writers but {} committed",
            applied.saturating_sub(1),
            committed
        )
    });
    Ok(tally)
}

/// Writers set a dirty balance between two pauses and abort; readers must
/// only ever see the committed balance
pub fn g1a<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| {
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                ctx.pause();
                cursor.set_field(BALANCE, Value::Float(DIRTY_BALANCE))?;
                ctx.pause();
                drop(cursor);
                txn.abort();
                Ok(TxnOutcome::<()>::ExplicitAbort)
            })?;
            Ok(Tally::of(&outcome))
        },
        ctx.size.readers,
        |_| {
            ctx.observe(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                let seen = balance(&cursor)?;
                let mut tally = Tally::default();
                tally.check(no_aborted_read(seen, CLEAN_BALANCE), || {
                    format!("read aborted balance {}", seen)
                });
                Ok(tally)
            })
        },
    )?;
    Ok(written.merge(observed))
}

/// Writers set an even balance, pause, then commit an odd one; readers
/// must never see an even balance
pub fn g1b<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| {
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                cursor.set_field(BALANCE, Value::Float(DIRTY_BALANCE))?;
                ctx.pause();
                cursor.set_field(BALANCE, Value::Float(CLEAN_BALANCE))?;
                drop(cursor);
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        },
        ctx.size.readers,
        |_| {
            ctx.observe(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                let seen = balance(&cursor)?;
                let mut tally = Tally::default();
                tally.check(no_intermediate_read(seen), || {
                    format!("read intermediate balance {}", seen)
                });
                Ok(tally)
            })
        },
    )?;
    Ok(written.merge(observed))
}

/// Transaction `i` writes `i` into one account and reads the other; no two
/// committed transactions may have read each other's write
pub fn g1c<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let outcomes = ctx
        .orchestrator
        .collect(Population::Writers, ctx.size.writers, |task| {
            let id = task.index as i64 + 1;
            let (write_to, read_from) = if task.rng().gen_bool(0.5) { (1, 2) } else { (2, 1) };
            ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, write_to)?;
                cursor.set_field(BALANCE, Value::Float(id as f64))?;
                locate_account(&mut cursor, read_from)?;
                let seen = balance(&cursor)? as i64;
                drop(cursor);
                Ok(commit(txn, seen))
            })
        })?;

    let mut tally: Tally = outcomes.iter().map(Tally::of).collect();
    let results: Vec<Option<i64>> = outcomes.iter().map(|o| o.committed().copied()).collect();
    let flows = circular_flows(&results);
    for (index, result) in results.iter().enumerate() {
        if result.is_none() {
            continue;
        }
        let reader = index as i64 + 1;
        let flow = flows.iter().find(|(r, _)| *r == reader);
        tally.check(flow.is_none(), || match flow {
            Some((_, writer)) => format!(
                "transaction {} read {} which aborted or read {} back",
                reader, writer, reader
            ),
            None => String::new(),
        });
    }
    Ok(tally)
}
