use crate::data::{Amount, Error, RepId, RepresentativeRecord, Transaction, TxId, TxType};
use crate::registry::Registry;
use serde::Deserialize;

/// Trait for doing something with a `Transaction` read from the transaction file.
/// The accumulation pass implements it on `Registry`; tests use it to check what the
/// decoder produces.
pub trait TransactionUser {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error>;
}

/// Raw shape of a transaction line, before the type tag is checked.
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    id: TxId,
    representative: RepId,
    txtype: u8,
    amount: Amount,
}

const TRANSACTION_FIELDS: usize = 4;
const REPRESENTATIVE_FIELDS: usize = 3;

/// Both input files are headerless and comma separated. Field counts are checked per
/// record so that the error names the line.
fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

fn malformed(record: &csv::StringRecord, reason: impl ToString) -> Error {
    Error::MalformedRecord {
        line: line_of(record),
        record: record.iter().collect::<Vec<_>>().join(","),
        reason: reason.to_string(),
    }
}

/// csv errors are either I/O failures or undecodable input.
fn read_error(err: csv::Error) -> Error {
    let line = err.position().map_or(0, |pos| pos.line());
    match err.into_kind() {
        csv::ErrorKind::Io(err) => Error::Io(err),
        kind => Error::MalformedRecord {
            line,
            record: String::new(),
            reason: format!("{kind:?}"),
        },
    }
}

fn check_len(record: &csv::StringRecord, expected: usize) -> Result<(), Error> {
    if record.len() != expected {
        return Err(malformed(
            record,
            format!("expected {expected} fields, found {}", record.len()),
        ));
    }
    Ok(())
}

pub(crate) fn decode_transaction(record: &csv::StringRecord) -> Result<Transaction, Error> {
    check_len(record, TRANSACTION_FIELDS)?;
    let raw: TransactionRecord = record
        .deserialize(None)
        .map_err(|err| malformed(record, err))?;
    let txtype = TxType::try_from(raw.txtype).map_err(|err| malformed(record, err))?;
    if raw.amount < 0 {
        return Err(malformed(record, "transaction amount must not be negative"));
    }
    Ok(Transaction {
        id: raw.id,
        representative: raw.representative,
        txtype,
        amount: raw.amount,
    })
}

pub(crate) fn decode_representative(
    record: &csv::StringRecord,
) -> Result<RepresentativeRecord, Error> {
    check_len(record, REPRESENTATIVE_FIELDS)?;
    record
        .deserialize(None)
        .map_err(|err| malformed(record, err))
}

/// Stream the transaction file into `user`, one record at a time, stopping at the
/// first failure. Returns how many transactions were applied.
pub fn read_transactions<R: std::io::Read, U: TransactionUser>(
    reader: R,
    user: &mut U,
) -> Result<u64, Error> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut record = csv::StringRecord::new();
    let mut applied = 0;
    while rdr.read_record(&mut record).map_err(read_error)? {
        let tx = decode_transaction(&record)?;
        user.use_tx(tx)?;
        applied += 1;
    }
    Ok(applied)
}

/// Populate `registry` from the balance file. Each line's starting byte offset is kept
/// so the line can be rewritten in place later; lines are read one by one rather than
/// through the csv reader because the offset must be exact. Returns the number of
/// representatives read.
pub fn read_representatives<R: std::io::BufRead>(
    mut reader: R,
    registry: &mut Registry,
) -> Result<usize, Error> {
    let mut line = Vec::new();
    let (mut offset, mut line_no, mut loaded) = (0u64, 0u64, 0);
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        let start = offset;
        offset += read as u64;
        line_no += 1;
        let content = std::str::from_utf8(&line).map_err(|err| Error::MalformedRecord {
            line: line_no,
            record: String::from_utf8_lossy(&line).trim_end().to_string(),
            reason: err.to_string(),
        })?;
        let content = content.trim_end_matches(['\r', '\n']);
        if content.trim().is_empty() {
            continue;
        }
        let mut record: csv::StringRecord = content.split(',').collect();
        record.trim();
        let mut position = csv::Position::new();
        position.set_byte(start).set_line(line_no);
        record.set_position(Some(position));
        let rep = decode_representative(&record)?;
        registry.load(rep, start)?;
        loaded += 1;
    }
    Ok(loaded)
}
