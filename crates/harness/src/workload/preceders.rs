//! Item-many-preceders (IMP) and predicate-many-preceders (PMP)

use super::{balance, count_transfers, RunContext};
use crate::error::HarnessResult;
use crate::fixture::{locate_account, BALANCE, TRANSFER};
use crate::oracle::stable_read;
use crate::outcome::{commit, Tally};
use isocheck_core::{GraphStore, Transaction, Value, WriteTxn};

/// Writers increment one balance; readers read it twice around a pause and
/// must see the same value
pub fn imp<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| {
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 1)?;
                let current = balance(&cursor)?;
                cursor.set_field(BALANCE, Value::Float(current + 1.0))?;
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
                let first = balance(&cursor)?;
                ctx.pause();
                locate_account(&mut cursor, 1)?;
                let second = balance(&cursor)?;
                let mut tally = Tally::default();
                tally.check(stable_read(&first, &second), || {
                    format!("balance changed from {} to {}", first, second)
                });
                Ok(tally)
            })
        },
    )?;
    Ok(written.merge(observed))
}

/// Writers add a transfer from account 1 to account 2; readers count the
/// transfers into account 2 twice around a pause and must get one answer
pub fn pmp<S: GraphStore>(ctx: &RunContext<'_, S>) -> HarnessResult<Tally> {
    let (written, observed) = ctx.orchestrator.race(
        ctx.size.writers,
        |_| {
            let outcome = ctx.write(|txn| {
                let mut cursor = txn.scan_vertices()?;
                let a1 = locate_account(&mut cursor, 1)?;
                let a2 = locate_account(&mut cursor, 2)?;
                drop(cursor);
                txn.create_edge(a1, a2, TRANSFER, &[])?;
                Ok(commit(txn, ()))
            })?;
            Ok(Tally::of(&outcome))
        },
        ctx.size.readers,
        |_| {
            ctx.observe(|txn| {
                let mut cursor = txn.scan_vertices()?;
                locate_account(&mut cursor, 2)?;
                let first = count_transfers(cursor.in_edges()?)?;
                ctx.pause();
                locate_account(&mut cursor, 2)?;
                let second = count_transfers(cursor.in_edges()?)?;
                let mut tally = Tally::default();
                tally.check(stable_read(&first, &second), || {
                    format!("incoming transfers changed from {} to {}", first, second)
                });
                Ok(tally)
            })
        },
    )?;
    Ok(written.merge(observed))
}
