use crate::config::toml_config::TomlConfig;
use crate::domain::ports::StoreBackend;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vet-clinic")]
#[command(about = "Veterinary clinic records: owners, pets and appointment slots")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override storage.data_dir
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override storage.backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<StoreBackend>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register an owner
    AddOwner {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
    },
    /// Register a pet; the owner is created when phone and address are given
    AddPet {
        #[arg(long)]
        name: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        breed: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    ListOwners,
    ListPets,
    /// Open slots for one day (YYYY-MM-DD)
    Slots {
        #[arg(long)]
        date: String,
    },
    /// Open slots for several consecutive days
    Calendar {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,
        /// Number of days, 1 to 366
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=366))]
        days: u32,
    },
    /// Book an appointment in a free slot
    Book {
        /// YYYY-MM-DD, or "YYYY-MM-DD HH:MM" when --time is omitted
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        pet: String,
        /// Owner name, to tell apart pets sharing a name
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        diagnosis: Option<String>,
    },
    /// Consultation history of one pet
    History {
        #[arg(long)]
        pet: String,
    },
    /// Write every record to CSV + JSON files in a directory
    Export {
        #[arg(long)]
        to: PathBuf,
    },
}

impl CliConfig {
    /// 載入設定檔（若有），再套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;

    #[test]
    fn test_parse_book_command() {
        let cli = CliConfig::try_parse_from([
            "vet-clinic",
            "book",
            "--date",
            "2025-06-02",
            "--time",
            "10:00",
            "--pet",
            "Rex",
            "--reason",
            "Checkup",
            "--backend",
            "flat-file",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(StoreBackend::FlatFile));
        match cli.command {
            Command::Book { date, time, pet, diagnosis, .. } => {
                assert_eq!(date, "2025-06-02");
                assert_eq!(time.as_deref(), Some("10:00"));
                assert_eq!(pet, "Rex");
                assert!(diagnosis.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply_over_defaults() {
        let cli = CliConfig::try_parse_from([
            "vet-clinic",
            "--data-dir",
            "/tmp/vet",
            "list-pets",
        ])
        .unwrap();

        let config = cli.resolve().unwrap();
        assert_eq!(config.data_dir(), std::path::Path::new("/tmp/vet"));
        assert_eq!(config.backend(), StoreBackend::Sqlite);
    }

    #[test]
    fn test_calendar_defaults() {
        let cli = CliConfig::try_parse_from(["vet-clinic", "calendar"]).unwrap();
        assert!(matches!(cli.command, Command::Calendar { from: None, days: 7 }));
    }

    #[test]
    fn test_calendar_days_are_bounded() {
        let year = CliConfig::try_parse_from(["vet-clinic", "calendar", "--days", "366"]).unwrap();
        assert!(matches!(year.command, Command::Calendar { days: 366, .. }));

        for days in ["0", "367", "4000000000"] {
            assert!(
                CliConfig::try_parse_from(["vet-clinic", "calendar", "--days", days]).is_err(),
                "--days {days} should be rejected"
            );
        }
    }
}
