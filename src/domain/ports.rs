use crate::domain::model::{
    Appointment, ClinicSnapshot, NewAppointment, NewOwner, NewPet, Owner, Pet,
};
use crate::utils::error::Result;
use chrono::NaiveTime;
use std::path::Path;

/// 位元組層級的檔案存取；找不到檔案時回傳 `Ok(None)`
pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

/// 持久化介面：每個操作各自開啟、提交、關閉
pub trait ClinicStore {
    fn load(&self) -> Result<ClinicSnapshot>;
    fn insert_owner(&self, owner: &NewOwner) -> Result<Owner>;
    fn insert_pet(&self, pet: &NewPet) -> Result<Pet>;
    fn insert_appointment(&self, appointment: &NewAppointment) -> Result<Appointment>;
}

pub trait ConfigProvider {
    fn backend(&self) -> StoreBackend;
    fn data_dir(&self) -> &Path;
    fn pets_file(&self) -> &str;
    fn appointments_file(&self) -> &str;
    fn database_file(&self) -> &str;
    fn daily_slots(&self) -> Result<Vec<NaiveTime>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum StoreBackend {
    /// CSV（owners + pets）加 JSON（appointments）
    FlatFile,
    #[default]
    Sqlite,
}
