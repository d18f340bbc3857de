use crate::data::{Amount, TxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn sign(self) -> Amount {
        match self {
            Direction::Increase => 1,
            Direction::Decrease => -1,
        }
    }
}

/// How much of a transaction goes to the territory and to the representative, and in
/// which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub territory_percent: Amount,
    pub representative_percent: Amount,
    pub direction: Direction,
}

/// The attribution table. Every transaction type has an entry, so this can't fail;
/// unknown tags are rejected when the type is decoded.
pub const fn attribution(txtype: TxType) -> Attribution {
    use Direction::*;
    let (territory_percent, representative_percent, direction) = match txtype {
        TxType::Sale => (100, 100, Increase),
        TxType::ValueAdded => (100, 110, Increase),
        TxType::Credit => (100, 100, Decrease),
        TxType::Cancel => (100, 125, Decrease),
        TxType::Promo => (100, 0, Decrease),
        TxType::Discount => (100, 110, Decrease),
        TxType::InterTerritory => (0, 75, Increase),
    };
    Attribution {
        territory_percent,
        representative_percent,
        direction,
    }
}

impl Attribution {
    /// `(territory delta, representative delta)` for `amount`. The percentage is taken
    /// with integer division before the sign is applied, so 75% of 1 is 0 either way.
    /// `None` on arithmetic overflow.
    pub fn deltas(&self, amount: Amount) -> Option<(Amount, Amount)> {
        let sign = self.direction.sign();
        let territory = self.territory_percent.checked_mul(amount)? / 100 * sign;
        let representative = self.representative_percent.checked_mul(amount)? / 100 * sign;
        Some((territory, representative))
    }
}
