use crate::data::{Error, RepId, Representative, RepresentativeRecord, Territory, TerritoryId};
use tracing::{debug, warn};

/// Owns every representative and territory of a run. Both are pre-allocated for ids
/// `1..=count` and indexed by `id - 1`; nothing is created lazily.
#[derive(Debug, Clone)]
pub struct Registry {
    representatives: Vec<Representative>,
    territories: Vec<Territory>,
}

fn slot(id: u32, len: usize) -> Option<usize> {
    let index = usize::try_from(id.checked_sub(1)?).ok()?;
    (index < len).then_some(index)
}

impl Registry {
    pub fn new(count: u32) -> Self {
        Self {
            representatives: (1..=count).map(Representative::unset).collect(),
            territories: (1..=count).map(|id| Territory { id, amount: 0 }).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.representatives.len()
    }

    /// Store a balance-file line into its slot, remembering where the line started.
    /// A repeated id overwrites the previous line's data and offset.
    pub fn load(&mut self, record: RepresentativeRecord, offset: u64) -> Result<(), Error> {
        self.store(record, Some(offset))
    }

    /// Place a representative that has no line in the balance file yet; it is appended
    /// on write-back.
    pub fn enroll(&mut self, record: RepresentativeRecord) -> Result<(), Error> {
        self.store(record, None)
    }

    fn store(&mut self, record: RepresentativeRecord, offset: Option<u64>) -> Result<(), Error> {
        let index = slot(record.id, self.representatives.len())
            .ok_or(Error::RepresentativeNotFound(record.id))?;
        let rep = &mut self.representatives[index];
        if rep.is_loaded() {
            warn!(
                salerep = record.id,
                previous = ?rep.offset,
                offset = ?offset,
                "representative listed more than once, keeping the last line"
            );
        }
        debug!(
            salerep = record.id,
            territory = record.territory,
            amount = record.amount,
            offset = ?offset,
            "loaded"
        );
        rep.territory = Some(record.territory);
        rep.amount = record.amount;
        rep.offset = offset;
        Ok(())
    }

    pub fn find(&self, id: RepId) -> Result<&Representative, Error> {
        slot(id, self.representatives.len())
            .map(|index| &self.representatives[index])
            .ok_or(Error::RepresentativeNotFound(id))
    }

    /// Territory of a loaded representative.
    pub fn territory_of(&self, id: RepId) -> Result<TerritoryId, Error> {
        self.find(id)?
            .territory
            .ok_or(Error::RepresentativeNotFound(id))
    }

    pub fn territory(&self, id: TerritoryId) -> Result<&Territory, Error> {
        slot(id, self.territories.len())
            .map(|index| &self.territories[index])
            .ok_or(Error::TerritoryNotFound(id))
    }

    /// Both balances touched by a transaction on `id`. Either both resolve or neither
    /// is handed out.
    pub(crate) fn balances_mut(
        &mut self,
        id: RepId,
    ) -> Result<(&mut Representative, &mut Territory), Error> {
        let territory = self.territory_of(id)?;
        let rep_index =
            slot(id, self.representatives.len()).ok_or(Error::RepresentativeNotFound(id))?;
        let territory_index =
            slot(territory, self.territories.len()).ok_or(Error::TerritoryNotFound(territory))?;
        Ok((
            &mut self.representatives[rep_index],
            &mut self.territories[territory_index],
        ))
    }

    pub fn representatives(&self) -> impl Iterator<Item = &Representative> + '_ {
        self.representatives.iter()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &Representative> + '_ {
        self.representatives.iter().filter(|rep| rep.is_loaded())
    }

    pub fn territories(&self) -> impl Iterator<Item = &Territory> + '_ {
        self.territories.iter()
    }

    /// Loaded representatives, ascending by amount, ties broken by id.
    pub fn ranking(&self) -> Vec<&Representative> {
        let mut ranking: Vec<_> = self.loaded().collect();
        ranking.sort_by_key(|rep| (rep.amount, rep.id));
        ranking
    }
}
