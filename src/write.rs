use crate::{
    data::{Amount, Error, RankingRow, Representative},
    registry::Registry,
};
use std::io::{Read, Seek, SeekFrom, Write};

const MAX_ID: i64 = 9_999;
const MAX_TERRITORY: i64 = 99_999;
const MIN_AMOUNT: Amount = -999_999;
const MAX_AMOUNT: Amount = 9_999_999;

/// Width of an encoded representative line, terminator excluded.
pub const RECORD_WIDTH: usize = 4 + 1 + 5 + 1 + 7;

fn check(
    rep: &Representative,
    field: &'static str,
    value: i64,
    range: std::ops::RangeInclusive<i64>,
) -> Result<(), Error> {
    if !range.contains(&value) {
        return Err(Error::EncodingOverflow {
            representative: rep.id,
            field,
            value,
        });
    }
    Ok(())
}

/// Fixed-width balance-file line: `IIII,TTTTT,AAAAAAA`, zero padded, no terminator.
/// A negative amount takes one of the seven columns for its sign. Anything that
/// doesn't fit is refused rather than widened, since the line is rewritten in place.
pub fn encode_representative(rep: &Representative) -> Result<String, Error> {
    let territory = rep.territory.ok_or(Error::RepresentativeNotFound(rep.id))?;
    check(rep, "id", rep.id.into(), 0..=MAX_ID)?;
    check(rep, "territory", territory.into(), 0..=MAX_TERRITORY)?;
    check(rep, "amount", rep.amount, MIN_AMOUNT..=MAX_AMOUNT)?;
    Ok(format!("{:04},{:05},{:07}", rep.id, territory, rep.amount))
}

/// A pending overwrite of one balance-file line.
#[derive(Debug, PartialEq, Eq)]
pub struct Patch {
    offset: Option<u64>,
    line: String,
}

/// Encode every loaded representative. Nothing is written here, so an overflow found
/// in any line leaves the balance file as it was.
pub fn encode_representatives(registry: &Registry) -> Result<Vec<Patch>, Error> {
    registry
        .loaded()
        .map(|rep| {
            Ok(Patch {
                offset: rep.offset,
                line: encode_representative(rep)?,
            })
        })
        .collect()
}

/// Terminate the last line if the file doesn't end with a newline, so an appended
/// record starts on a line of its own. Leaves the cursor at the end of the file.
fn end_line<F: Read + Write + Seek>(file: &mut F) -> Result<(), Error> {
    if file.seek(SeekFrom::End(0))? == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Write each line at the offset it was read from; lines without an offset are
/// appended.
pub fn apply_patches<F: Read + Write + Seek>(
    file: &mut F,
    patches: &[Patch],
) -> Result<(), Error> {
    for patch in patches {
        match patch.offset {
            Some(offset) => {
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(patch.line.as_bytes())?;
            }
            None => {
                end_line(file)?;
                file.write_all(patch.line.as_bytes())?;
                file.write_all(b"\n")?;
            }
        }
    }
    file.flush()?;
    Ok(())
}

/// Rewrite every loaded representative in place. Returns the number of lines written.
pub fn flush_representatives<F: Read + Write + Seek>(
    file: &mut F,
    registry: &Registry,
) -> Result<usize, Error> {
    let patches = encode_representatives(registry)?;
    apply_patches(file, &patches)?;
    Ok(patches.len())
}

/// One `territoryid,amount` line per territory, ascending id, active or not.
pub fn write_territories<W: Write>(writer: W, registry: &Registry) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for territory in registry.territories() {
        wtr.serialize(territory).map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

/// CSV report of the loaded representatives, lowest balance first.
pub fn write_ranking<W: Write>(writer: W, registry: &Registry) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for rep in registry.ranking() {
        let row = RankingRow {
            salerep: rep.id,
            territory: rep.territory.unwrap_or_default(),
            amount: rep.amount,
        };
        wtr.serialize(row).map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}
