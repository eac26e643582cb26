//! Fixture initialization: schema, seed data, business-key lookup
//!
//! Every test starts from [`reset_schema`] followed by its seed. Records are
//! addressed by the `id` business key only; store references never leave the
//! transaction that produced them.

use crate::anomaly::TestName;
use crate::error::{HarnessError, HarnessResult};
use isocheck_core::{
    ConcurrencyMode, FieldSpec, FieldType, GraphStore, StoreError, StoreResult, Transaction,
    Value, VertexCursor, VertexRef, WriteTxn,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Account vertex type
pub const ACCOUNT: &str = "Account";
/// Transfer edge type
pub const TRANSFER: &str = "transfer";

/// Account business key
pub const ID: &str = "id";
/// Account holder name
pub const NAME: &str = "name";
/// Account balance
pub const BALANCE: &str = "balance";
/// Transfer counter
pub const NUM_TRANSFERRED: &str = "numTransferred";
/// Transfer history log
pub const TRANS_HISTORY: &str = "transHistory";
/// Writer history log, on accounts and transfers
pub const VERSION_HISTORY: &str = "versionHistory";
/// Transfer amount
pub const AMOUNT: &str = "amount";

/// Fields of the Account vertex type
pub fn account_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required(ID, FieldType::Int64),
        FieldSpec::optional(NAME, FieldType::String),
        FieldSpec::optional(BALANCE, FieldType::Double),
        FieldSpec::optional(NUM_TRANSFERRED, FieldType::Int64),
        FieldSpec::optional(TRANS_HISTORY, FieldType::String),
        FieldSpec::optional(VERSION_HISTORY, FieldType::String),
    ]
}

/// Fields of the transfer edge type
pub fn transfer_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::optional(AMOUNT, FieldType::Double),
        FieldSpec::optional(VERSION_HISTORY, FieldType::String),
    ]
}

/// Drop all data and register the Account and transfer types
pub fn reset_schema<S: GraphStore>(store: &S) -> StoreResult<()> {
    store.reset_all_data()?;
    store.define_vertex_type(ACCOUNT, &account_fields(), ID)?;
    store.define_edge_type(TRANSFER, &transfer_fields())?;
    Ok(())
}

/// Reset the store and seed the starting state of `test`
///
/// # Errors
///
/// Any store failure is a [`HarnessError::Setup`]; it is never retried.
pub fn prepare<S: GraphStore>(
    store: &S,
    test: TestName,
    mode: ConcurrencyMode,
) -> HarnessResult<()> {
    reset_schema(store)
        .and_then(|()| seed(store, test, mode))
        .map_err(|e| {
            error!(target: "isocheck::fixture", %test, error = %e, "Fixture setup failed");
            HarnessError::setup(test, e)
        })?;
    debug!(target: "isocheck::fixture", %test, "Fixture ready");
    Ok(())
}

/// Seed the starting records of `test` in one transaction
pub fn seed<S: GraphStore>(store: &S, test: TestName, mode: ConcurrencyMode) -> StoreResult<()> {
    let txn = store.begin_write(mode)?;
    match test {
        TestName::AtomicityC | TestName::AtomicityRb => {
            create_account(
                &txn,
                1,
                &[(NAME, Value::from("AliceAcc")), (TRANS_HISTORY, Value::from("100"))],
            )?;
            create_account(
                &txn,
                2,
                &[(NAME, Value::from("BobAcc")), (TRANS_HISTORY, Value::from("50;150"))],
            )?;
        }
        TestName::G0 => {
            let a1 = create_account(&txn, 1, &[(VERSION_HISTORY, Value::from("0"))])?;
            let a2 = create_account(&txn, 2, &[(VERSION_HISTORY, Value::from("0"))])?;
            txn.create_edge(a1, a2, TRANSFER, &[(VERSION_HISTORY, Value::from("0"))])?;
        }
        TestName::G1a | TestName::G1b => {
            create_account(&txn, 1, &[(BALANCE, Value::Float(99.0))])?;
        }
        TestName::G1c => {
            create_account(&txn, 1, &[(BALANCE, Value::Float(0.0))])?;
            create_account(&txn, 2, &[(BALANCE, Value::Float(0.0))])?;
        }
        TestName::Imp => {
            create_account(&txn, 1, &[(BALANCE, Value::Float(1.0))])?;
        }
        TestName::Pmp => {
            create_account(&txn, 1, &[])?;
            create_account(&txn, 2, &[])?;
        }
        TestName::Otv | TestName::Fr => {
            let mut cycle = Vec::with_capacity(4);
            for id in 1..=4 {
                cycle.push(create_account(&txn, id, &[(BALANCE, Value::Float(0.0))])?);
            }
            for (i, src) in cycle.iter().enumerate() {
                txn.create_edge(*src, cycle[(i + 1) % cycle.len()], TRANSFER, &[])?;
            }
        }
        TestName::Lu => {
            create_account(&txn, 1, &[(NUM_TRANSFERRED, Value::Int(0))])?;
        }
        TestName::Ws => {
            for pair in 1..=WS_PAIRS {
                create_account(&txn, 2 * pair - 1, &[(BALANCE, Value::Float(70.0))])?;
                create_account(&txn, 2 * pair, &[(BALANCE, Value::Float(80.0))])?;
            }
        }
    }
    txn.commit()
}

/// Number of account pairs seeded for write skew
pub const WS_PAIRS: i64 = 10;

/// Create an account with the given business key and extra fields
pub fn create_account<T: WriteTxn>(
    txn: &T,
    id: i64,
    fields: &[(&str, Value)],
) -> StoreResult<VertexRef> {
    let mut all = Vec::with_capacity(fields.len() + 1);
    all.push((ID, Value::Int(id)));
    all.extend(fields.iter().cloned());
    txn.create_vertex(ACCOUNT, &all)
}

/// Position `cursor` on the account with business key `id`
///
/// The scan restarts from the beginning. Returns `false`, leaving the cursor
/// exhausted, if no such account is visible.
pub fn seek_account<T: Transaction>(cursor: &mut VertexCursor<'_, T>, id: i64) -> StoreResult<bool> {
    cursor.rewind()?;
    while cursor.valid() {
        if cursor.label()? == ACCOUNT && cursor.field(ID)?.as_int() == Some(id) {
            return Ok(true);
        }
        cursor.advance();
    }
    Ok(false)
}

/// Like [`seek_account`], but a missing account is an error
pub fn locate_account<T: Transaction>(
    cursor: &mut VertexCursor<'_, T>,
    id: i64,
) -> StoreResult<VertexRef> {
    if seek_account(cursor, id)? {
        cursor.current()
    } else {
        Err(StoreError::not_found(format!("account {}", id)))
    }
}

#[derive(Serialize)]
struct TransferDump {
    src: i64,
    dst: i64,
    fields: BTreeMap<String, Value>,
}

#[derive(Serialize)]
struct StateDump {
    accounts: BTreeMap<i64, BTreeMap<String, Value>>,
    transfers: Vec<TransferDump>,
}

fn present_fields(
    specs: &[FieldSpec],
    mut read: impl FnMut(&str) -> StoreResult<Value>,
) -> StoreResult<BTreeMap<String, Value>> {
    let mut fields = BTreeMap::new();
    for spec in specs {
        let value = read(&spec.name)?;
        if !value.is_null() {
            fields.insert(spec.name.clone(), value);
        }
    }
    Ok(fields)
}

fn account_id<T: Transaction>(txn: &T, vertex: VertexRef) -> StoreResult<i64> {
    txn.vertex_field(vertex, ID)?
        .as_int()
        .ok_or_else(|| StoreError::invalid_state(format!("account {} has no id", vertex)))
}

/// Serialize every account and transfer into canonical JSON
///
/// Records are keyed by business key, so two stores (or two runs) holding
/// the same logical state produce identical bytes.
pub fn dump_state<S: GraphStore>(store: &S) -> HarnessResult<Vec<u8>> {
    let txn = store.begin_read()?;
    let dump = collect_state(&txn)?;
    Ok(serde_json::to_vec(&dump)?)
}

fn collect_state<T: Transaction>(txn: &T) -> StoreResult<StateDump> {
    let account_specs = account_fields();
    let transfer_specs = transfer_fields();
    let mut accounts = BTreeMap::new();
    let mut transfers = Vec::new();

    let mut cursor = txn.scan_vertices()?;
    while cursor.valid() {
        if cursor.label()? == ACCOUNT {
            let src = account_id(txn, cursor.current()?)?;
            accounts.insert(src, present_fields(&account_specs, |name| cursor.field(name))?);

            let mut edges = cursor.out_edges()?;
            while edges.valid() {
                if edges.label()? == TRANSFER {
                    transfers.push(TransferDump {
                        src,
                        dst: account_id(txn, edges.dst()?)?,
                        fields: present_fields(&transfer_specs, |name| edges.field(name))?,
                    });
                }
                edges.advance();
            }
        }
        cursor.advance();
    }

    transfers.sort_by(|a, b| {
        (a.src, a.dst)
            .cmp(&(b.src, b.dst))
            .then_with(|| format!("{:?}", a.fields).cmp(&format!("{:?}", b.fields)))
    });
    Ok(StateDump {
        accounts,
        transfers,
    })
}
