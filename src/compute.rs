use crate::{
    data::{Error, Transaction},
    read::TransactionUser,
    registry::Registry,
    rules::attribution,
};
use tracing::trace;

/// The accumulation pass: every transaction moves the owning representative's balance
/// and the balance of that representative's territory, following the attribution table.
/// Both balances are resolved and both new values computed before either is written, so
/// a failing transaction leaves the registry untouched.
impl TransactionUser for Registry {
    fn use_tx(&mut self, tx: Transaction) -> Result<(), Error> {
        let (rep, territory) = self.balances_mut(tx.representative).map_err(|err| match err {
            Error::RepresentativeNotFound(representative) => Error::UnknownRepresentative {
                tx: tx.id,
                representative,
            },
            other => other,
        })?;
        let (territory_delta, rep_delta) = attribution(tx.txtype)
            .deltas(tx.amount)
            .ok_or(Error::BalanceOverflow { tx: tx.id })?;
        let territory_amount = territory
            .amount
            .checked_add(territory_delta)
            .ok_or(Error::BalanceOverflow { tx: tx.id })?;
        let rep_amount = rep
            .amount
            .checked_add(rep_delta)
            .ok_or(Error::BalanceOverflow { tx: tx.id })?;
        trace!(
            tx = tx.id,
            salerep = rep.id,
            territory = territory.id,
            territory_delta,
            rep_delta,
            "applied"
        );
        territory.amount = territory_amount;
        rep.amount = rep_amount;
        Ok(())
    }
}
