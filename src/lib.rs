pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::TomlConfig;

pub use adapters::{FlatFileStore, LocalStorage, SqliteStore};
pub use core::availability::DailySchedule;
pub use core::clinic::{BookingForm, Clinic, OwnerForm, PetForm, PetRecord};
pub use core::repository::ClinicRepository;
pub use utils::error::{ClinicError, Result};
