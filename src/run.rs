use crate::{
    data::Error,
    read::{read_representatives, read_transactions},
    registry::Registry,
    write::{apply_patches, encode_representatives, write_territories},
};
use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};
use tracing::info;

/// What a run needs: how many representative/territory ids exist and the three files.
#[derive(Debug, Clone)]
pub struct Config {
    pub count: u32,
    /// Balance file, read then rewritten in place.
    pub representatives: PathBuf,
    pub transactions: PathBuf,
    /// Territory totals, truncated and rewritten every run.
    pub territories: PathBuf,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.count == 0 {
            return Err(Error::Configuration("count must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub representatives: usize,
    pub transactions: u64,
    pub territories: usize,
}

fn open_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Open {
        path: path.to_path_buf(),
        source,
    }
}

/// Load the balances, apply every transaction, then write back. Nothing is written
/// unless the whole transaction file was applied and every balance still fits its
/// fixed-width line.
pub fn run(config: &Config) -> Result<(Registry, Summary), Error> {
    config.validate()?;
    let mut balances = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&config.representatives)
        .map_err(open_error(&config.representatives))?;
    let transactions =
        File::open(&config.transactions).map_err(open_error(&config.transactions))?;

    let mut registry = Registry::new(config.count);
    let representatives = read_representatives(BufReader::new(&balances), &mut registry)?;
    let applied = read_transactions(BufReader::new(transactions), &mut registry)?;

    let patches = encode_representatives(&registry)?;
    let mut territories = Vec::new();
    write_territories(&mut territories, &registry)?;
    let mut output =
        File::create(&config.territories).map_err(open_error(&config.territories))?;

    apply_patches(&mut balances, &patches)?;
    output.write_all(&territories)?;
    output.flush()?;

    let summary = Summary {
        representatives,
        transactions: applied,
        territories: registry.count(),
    };
    info!(
        representatives = summary.representatives,
        transactions = summary.transactions,
        territories = summary.territories,
        "balances updated"
    );
    Ok((registry, summary))
}

#[cfg(test)]
mod tests {
    use super::{run, Config, Summary};
    use crate::data::Error;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new(representatives: &str, transactions: &str) -> Self {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("salereps.txt"), representatives).unwrap();
            fs::write(dir.path().join("transactions.txt"), transactions).unwrap();
            Self { dir }
        }

        fn config(&self, count: u32) -> Config {
            Config {
                count,
                representatives: self.path("salereps.txt"),
                transactions: self.path("transactions.txt"),
                territories: self.path("territories.txt"),
            }
        }

        fn path(&self, name: &str) -> std::path::PathBuf {
            self.dir.path().join(name)
        }

        fn read(&self, name: &str) -> String {
            fs::read_to_string(self.path(name)).unwrap()
        }
    }

    #[test]
    fn scenario_sale() {
        let fixture = Fixture::new("0001,00001,0000100\n", "1,1,1,50\n");
        let (registry, summary) = run(&fixture.config(1)).unwrap();
        assert_eq!(
            summary,
            Summary {
                representatives: 1,
                transactions: 1,
                territories: 1
            }
        );
        assert_eq!(registry.find(1).unwrap().amount, 150);
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000150\n");
        assert_eq!(fixture.read("territories.txt"), "1,50\n");
    }

    #[test]
    fn scenario_promo() {
        let fixture = Fixture::new("0001,00001,0000100\n", "1,1,5,50\n");
        run(&fixture.config(1)).unwrap();
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000100\n");
        assert_eq!(fixture.read("territories.txt"), "1,-50\n");
    }

    #[test]
    fn scenario_inter_territory() {
        let fixture = Fixture::new("0001,00001,0000100\n", "1,1,7,100\n");
        run(&fixture.config(1)).unwrap();
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000175\n");
        assert_eq!(fixture.read("territories.txt"), "1,0\n");
    }

    #[test]
    fn scenario_value_added_floors() {
        let fixture = Fixture::new("0001,00001,0000100\n", "1,1,2,3\n");
        run(&fixture.config(1)).unwrap();
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000103\n");
        assert_eq!(fixture.read("territories.txt"), "1,3\n");
    }

    #[test]
    fn scenario_unknown_representative() {
        let balances = "0001,00001,0000100\n";
        let fixture = Fixture::new(balances, "1,1,1,50\n2,2,1,50\n");
        let err = run(&fixture.config(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownRepresentative {
                tx: 2,
                representative: 2
            }
        ));
        assert_eq!(fixture.read("salereps.txt"), balances);
        assert!(!fixture.path("territories.txt").exists());
    }

    #[test]
    fn malformed_transaction_mutates_nothing() {
        let balances = "0001,00001,0000100\n";
        let fixture = Fixture::new(balances, "1,1,1,50\n2,1,x,50\n");
        fs::write(fixture.path("territories.txt"), "previous\n").unwrap();
        let err = run(&fixture.config(1)).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }), "{err}");
        assert_eq!(fixture.read("salereps.txt"), balances);
        assert_eq!(fixture.read("territories.txt"), "previous\n");
    }

    #[test]
    fn overflow_mutates_nothing() {
        let balances = "0001,00001,9999990\n";
        let fixture = Fixture::new(balances, "1,1,1,50\n");
        let err = run(&fixture.config(1)).unwrap_err();
        assert!(matches!(err, Error::EncodingOverflow { representative: 1, .. }), "{err}");
        assert_eq!(fixture.read("salereps.txt"), balances);
        assert!(!fixture.path("territories.txt").exists());
    }

    #[test]
    fn every_territory_is_written() {
        let fixture = Fixture::new(
            "0001,00002,0000000\n0003,00002,0000010\n",
            "1,1,1,20\n2,3,3,5\n",
        );
        run(&fixture.config(4)).unwrap();
        assert_eq!(fixture.read("territories.txt"), "1,0\n2,15\n3,0\n4,0\n");
        assert_eq!(
            fixture.read("salereps.txt"),
            "0001,00002,0000020\n0003,00002,0000005\n"
        );
    }

    #[test]
    fn no_transactions_keeps_the_balance_file() {
        let balances = "0002,00001,0000042\r\n0001,00003,-000007\r\n";
        let fixture = Fixture::new(balances, "");
        let (_, summary) = run(&fixture.config(3)).unwrap();
        assert_eq!(summary.transactions, 0);
        assert_eq!(fixture.read("salereps.txt"), balances);
        assert_eq!(fixture.read("territories.txt"), "1,0\n2,0\n3,0\n");
    }

    #[test]
    fn rerun_applies_again() {
        let fixture = Fixture::new("0001,00001,0000100\n", "1,1,1,50\n");
        run(&fixture.config(1)).unwrap();
        run(&fixture.config(1)).unwrap();
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000200\n");
        assert_eq!(fixture.read("territories.txt"), "1,50\n");
    }

    #[test]
    fn missing_file() {
        let fixture = Fixture::new("0001,00001,0000100\n", "");
        let mut config = fixture.config(1);
        config.transactions = fixture.path("nope.txt");
        let err = run(&config).unwrap_err();
        assert!(
            matches!(err, Error::Open { ref path, .. } if path == &config.transactions),
            "{err}"
        );
        assert_eq!(fixture.read("salereps.txt"), "0001,00001,0000100\n");
    }

    #[test]
    fn unwritable_territory_file_keeps_the_balances() {
        let balances = "0001,00001,0000100\n";
        let fixture = Fixture::new(balances, "1,1,1,50\n");
        let mut config = fixture.config(1);
        config.territories = fixture.dir.path().to_path_buf();
        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "{err}");
        assert_eq!(fixture.read("salereps.txt"), balances);
    }

    #[test]
    fn zero_count() {
        let fixture = Fixture::new("", "");
        assert!(matches!(
            run(&fixture.config(0)),
            Err(Error::Configuration(_))
        ));
    }
}
