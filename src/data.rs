use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type RepId = u32;
pub type TerritoryId = u32;
pub type TxId = u32;

/// Balances and transaction amounts are plain integers; percentages are applied
/// with integer division so the results floor exactly like the legacy `long` math.
pub type Amount = i64;

/// Sentinel balance of a representative slot that was never loaded.
pub const UNSET_AMOUNT: Amount = -1;

/// A sales representative and its running balance. A freshly allocated slot has no
/// territory and no source offset; it only becomes "real" once the balance file
/// provides a line for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representative {
    pub id: RepId,
    pub territory: Option<TerritoryId>,
    pub amount: Amount,
    /// Byte offset of the line this representative was read from.
    pub offset: Option<u64>,
}

impl Representative {
    pub fn unset(id: RepId) -> Self {
        Self {
            id,
            territory: None,
            amount: UNSET_AMOUNT,
            offset: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.territory.is_some()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub amount: Amount,
}

/// One line of the balance file: `salerepid,territoryid,amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RepresentativeRecord {
    pub id: RepId,
    pub territory: TerritoryId,
    pub amount: Amount,
}

/// Row of the ranking report.
#[derive(Debug, Serialize)]
pub(crate) struct RankingRow {
    pub salerep: RepId,
    pub territory: TerritoryId,
    pub amount: Amount,
}

/// A decoded transaction line. It only lives for the time it takes to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxId,
    pub representative: RepId,
    pub txtype: TxType,
    pub amount: Amount,
}

/// Transaction types, with the integer tag used in the transaction file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    Sale = 1,
    ValueAdded = 2,
    Credit = 3,
    Cancel = 4,
    Promo = 5,
    Discount = 6,
    InterTerritory = 7,
}

impl TxType {
    pub const ALL: [TxType; 7] = [
        TxType::Sale,
        TxType::ValueAdded,
        TxType::Credit,
        TxType::Cancel,
        TxType::Promo,
        TxType::Discount,
        TxType::InterTerritory,
    ];
}

impl TryFrom<u8> for TxType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        use TxType::*;
        Ok(match tag {
            1 => Sale,
            2 => ValueAdded,
            3 => Credit,
            4 => Cancel,
            5 => Promo,
            6 => Discount,
            7 => InterTerritory,
            other => return Err(Error::UnsupportedTransactionType(other)),
        })
    }
}

/// Everything that can stop a run. Any of these aborts before the balance file or the
/// territory file is touched, except `Io` raised while writing them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed record at line {line} ({record:?}): {reason}")]
    MalformedRecord {
        line: u64,
        record: String,
        reason: String,
    },
    #[error("Unsupported transaction type {0}")]
    UnsupportedTransactionType(u8),
    #[error("Representative #{0} not found")]
    RepresentativeNotFound(RepId),
    #[error("Territory #{0} not found")]
    TerritoryNotFound(TerritoryId),
    #[error("Transaction #{tx} references unknown representative #{representative}")]
    UnknownRepresentative { tx: TxId, representative: RepId },
    #[error("Transaction #{tx} overflows a running balance")]
    BalanceOverflow { tx: TxId },
    #[error("Representative #{representative}: {field} {value} overflows the fixed-width record")]
    EncodingOverflow {
        representative: RepId,
        field: &'static str,
        value: i64,
    },
}
