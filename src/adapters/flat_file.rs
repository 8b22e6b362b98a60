//! CSV + JSON 檔案儲存。
//!
//! owners 與 pets 共用一個 CSV（每列一隻寵物加上飼主欄位），預約存成 JSON 陣列。
//! 載入時依名稱重新連結飼主與寵物，不依 id。id 依出現順序編號，寫入只會附加，
//! 所以重新開啟後 id 不變。

use crate::domain::model::{
    Appointment, ClinicSnapshot, NewAppointment, NewOwner, NewPet, Owner, Pet,
};
use crate::domain::ports::{ClinicStore, Storage};
use crate::utils::error::{ClinicError, Result};
use crate::utils::validation::DATE_TIME_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PETS_FILE: &str = "pets_owners.csv";
pub const DEFAULT_APPOINTMENTS_FILE: &str = "appointments.json";

/// CSV 的一列；寵物欄位留空代表只登記飼主
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetOwnerRow {
    pub pet_name: String,
    pub species: String,
    pub breed: String,
    pub age: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_address: String,
}

impl PetOwnerRow {
    fn for_pet(pet: &Pet, owner: &Owner) -> Self {
        Self {
            pet_name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone(),
            age: pet.age.to_string(),
            owner_name: owner.name.clone(),
            owner_phone: owner.phone.clone(),
            owner_address: owner.address.clone(),
        }
    }

    fn owner_only(owner: &Owner) -> Self {
        Self {
            pet_name: String::new(),
            species: String::new(),
            breed: String::new(),
            age: String::new(),
            owner_name: owner.name.clone(),
            owner_phone: owner.phone.clone(),
            owner_address: owner.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentEntry {
    pub date: String,
    pub reason: String,
    pub diagnosis: String,
    pub pet_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl AppointmentEntry {
    fn from_appointment(appointment: &Appointment, pet: &Pet, owner: &Owner) -> Self {
        Self {
            date: appointment
                .scheduled_at()
                .format(DATE_TIME_FORMAT)
                .to_string(),
            reason: appointment.reason.clone(),
            diagnosis: appointment.diagnosis.clone(),
            pet_name: pet.name.clone(),
            owner_name: Some(owner.name.clone()),
        }
    }
}

/// 解析 owners/pets CSV；壞掉的列記錄後略過
pub fn decode_pets_and_owners(data: &[u8]) -> (Vec<Owner>, Vec<Pet>) {
    let mut owners: Vec<Owner> = Vec::new();
    let mut pets: Vec<Pet> = Vec::new();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .from_reader(data);

    for (index, record) in reader.deserialize::<PetOwnerRow>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                tracing::error!("Skipping malformed CSV row {}: {}", index + 1, e);
                continue;
            }
        };

        if row.owner_name.is_empty() {
            tracing::error!("Skipping CSV row {}: owner name is empty", index + 1);
            continue;
        }

        // 先確認寵物欄位，整列有效才登記飼主
        let age = if row.pet_name.is_empty() {
            None
        } else {
            match row.age.parse::<u32>() {
                Ok(age) => Some(age),
                Err(e) => {
                    tracing::error!(
                        "Skipping CSV row {}: invalid age '{}' ({})",
                        index + 1,
                        row.age,
                        e
                    );
                    continue;
                }
            }
        };

        let owner_id = match owners.iter().find(|o| o.name == row.owner_name) {
            Some(owner) => owner.id,
            None => {
                let owner = Owner {
                    id: owners.len() as i64 + 1,
                    name: row.owner_name.clone(),
                    phone: row.owner_phone.clone(),
                    address: row.owner_address.clone(),
                };
                tracing::debug!("Owner loaded from CSV: {}", owner.name);
                let id = owner.id;
                owners.push(owner);
                id
            }
        };

        if let Some(age) = age {
            tracing::debug!("Pet loaded from CSV: {}", row.pet_name);
            pets.push(Pet {
                id: pets.len() as i64 + 1,
                name: row.pet_name,
                species: row.species,
                breed: row.breed,
                age,
                owner_id,
            });
        }
    }

    (owners, pets)
}

/// 依飼主順序輸出：沒有寵物的飼主排在後面飼主的第一隻寵物之前，
/// 重新載入時依出現順序編出的 id 才會一致
pub fn encode_pets_and_owners(owners: &[Owner], pets: &[Pet]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let has_pets = |owner: &Owner| pets.iter().any(|p| p.owner_id == owner.id);
    let mut next_owner = 0;

    for pet in pets {
        let position = owners
            .iter()
            .position(|o| o.id == pet.owner_id)
            .ok_or_else(|| ClinicError::owner_not_found(format!("#{}", pet.owner_id)))?;
        while next_owner <= position {
            let owner = &owners[next_owner];
            if !has_pets(owner) {
                writer.serialize(PetOwnerRow::owner_only(owner))?;
            }
            next_owner += 1;
        }
        writer.serialize(PetOwnerRow::for_pet(pet, &owners[position]))?;
    }
    for owner in owners.iter().skip(next_owner) {
        if !has_pets(owner) {
            writer.serialize(PetOwnerRow::owner_only(owner))?;
        }
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// 解析預約 JSON；依 pet_name（以及 owner_name）連回寵物
pub fn decode_appointments(data: &[u8], owners: &[Owner], pets: &[Pet]) -> Vec<Appointment> {
    let entries: Vec<serde_json::Value> = match serde_json::from_slice(data) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Failed to load appointments JSON: {}", e);
            return Vec::new();
        }
    };

    let mut appointments = Vec::new();
    for value in entries {
        let entry: AppointmentEntry = match serde_json::from_value(value.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!("Missing field in appointment entry {}: {}", value, e);
                continue;
            }
        };

        let scheduled = match NaiveDateTime::parse_from_str(&entry.date, DATE_TIME_FORMAT) {
            Ok(dt) => dt,
            Err(_) => {
                tracing::error!("Invalid date format in appointments JSON: {}", entry.date);
                continue;
            }
        };

        let pet = pets.iter().find(|p| {
            p.name == entry.pet_name
                && entry.owner_name.as_ref().is_none_or(|owner_name| {
                    owners
                        .iter()
                        .any(|o| o.id == p.owner_id && &o.name == owner_name)
                })
        });
        let Some(pet) = pet else {
            tracing::warn!(
                "Skipping appointment on {}: pet '{}' is not registered",
                entry.date,
                entry.pet_name
            );
            continue;
        };

        appointments.push(Appointment {
            id: appointments.len() as i64 + 1,
            date: scheduled.date(),
            time: scheduled.time(),
            owner_id: pet.owner_id,
            pet_id: pet.id,
            reason: entry.reason,
            diagnosis: entry.diagnosis,
        });
    }

    appointments
}

pub fn encode_appointments(snapshot: &ClinicSnapshot) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(snapshot.appointments.len());
    for appointment in &snapshot.appointments {
        let pet = snapshot
            .pet(appointment.pet_id)
            .ok_or_else(|| ClinicError::pet_not_found(format!("#{}", appointment.pet_id)))?;
        let owner = snapshot
            .owner(appointment.owner_id)
            .ok_or_else(|| ClinicError::owner_not_found(format!("#{}", appointment.owner_id)))?;
        entries.push(AppointmentEntry::from_appointment(appointment, pet, owner));
    }
    Ok(serde_json::to_vec_pretty(&entries)?)
}

pub struct FlatFileStore<S: Storage> {
    storage: S,
    pets_file: String,
    appointments_file: String,
}

impl<S: Storage> FlatFileStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_files(storage, DEFAULT_PETS_FILE, DEFAULT_APPOINTMENTS_FILE)
    }

    pub fn with_files(storage: S, pets_file: &str, appointments_file: &str) -> Self {
        Self {
            storage,
            pets_file: pets_file.to_string(),
            appointments_file: appointments_file.to_string(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 以快照覆寫兩個檔案（匯出用）
    pub fn save_snapshot(&self, snapshot: &ClinicSnapshot) -> Result<()> {
        let csv_data = encode_pets_and_owners(&snapshot.owners, &snapshot.pets)?;
        let json_data = encode_appointments(snapshot)?;
        self.storage.write_file(&self.pets_file, &csv_data)?;
        self.storage.write_file(&self.appointments_file, &json_data)?;
        tracing::info!(
            "Saved {} pets, {} owners and {} appointments to flat files",
            snapshot.pets.len(),
            snapshot.owners.len(),
            snapshot.appointments.len()
        );
        Ok(())
    }

    fn load_pets_and_owners(&self) -> Result<(Vec<Owner>, Vec<Pet>)> {
        match self.storage.read_file(&self.pets_file)? {
            Some(data) => Ok(decode_pets_and_owners(&data)),
            None => {
                tracing::info!("{} does not exist, no pets to load", self.pets_file);
                Ok((Vec::new(), Vec::new()))
            }
        }
    }

    fn append_row(&self, row: &PetOwnerRow) -> Result<()> {
        let mut data = self
            .storage
            .read_file(&self.pets_file)?
            .unwrap_or_default();
        let needs_header = data.iter().all(|b| b.is_ascii_whitespace());
        if needs_header {
            data.clear();
        } else if data.last() != Some(&b'\n') {
            data.push(b'\n');
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(Vec::new());
        writer.serialize(row)?;
        let encoded = writer.into_inner().map_err(|e| e.into_error())?;
        data.extend_from_slice(&encoded);

        self.storage.write_file(&self.pets_file, &data)
    }
}

impl<S: Storage> ClinicStore for FlatFileStore<S> {
    fn load(&self) -> Result<ClinicSnapshot> {
        let (owners, pets) = self.load_pets_and_owners()?;
        let appointments = match self.storage.read_file(&self.appointments_file)? {
            Some(data) => decode_appointments(&data, &owners, &pets),
            None => {
                tracing::info!(
                    "{} does not exist, no appointments to load",
                    self.appointments_file
                );
                Vec::new()
            }
        };

        Ok(ClinicSnapshot {
            owners,
            pets,
            appointments,
        })
    }

    fn insert_owner(&self, owner: &NewOwner) -> Result<Owner> {
        let snapshot = self.load()?;
        // 檔案格式以名稱識別飼主
        if let Some(existing) = snapshot.owner_by_name(&owner.name) {
            tracing::debug!("Owner {} already stored in {}", owner.name, self.pets_file);
            return Ok(existing.clone());
        }

        let stored = Owner {
            id: snapshot.next_owner_id(),
            name: owner.name.clone(),
            phone: owner.phone.clone(),
            address: owner.address.clone(),
        };
        self.append_row(&PetOwnerRow::owner_only(&stored))?;
        Ok(stored)
    }

    fn insert_pet(&self, pet: &NewPet) -> Result<Pet> {
        let snapshot = self.load()?;
        let owner = snapshot
            .owner(pet.owner_id)
            .ok_or_else(|| ClinicError::owner_not_found(format!("#{}", pet.owner_id)))?;

        let stored = Pet {
            id: snapshot.next_pet_id(),
            name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone(),
            age: pet.age,
            owner_id: pet.owner_id,
        };
        self.append_row(&PetOwnerRow::for_pet(&stored, owner))?;
        Ok(stored)
    }

    fn insert_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        let snapshot = self.load()?;
        let pet = snapshot
            .pet(appointment.pet_id)
            .ok_or_else(|| ClinicError::pet_not_found(format!("#{}", appointment.pet_id)))?;
        // 預約的飼主必須是寵物的飼主，否則重新載入時對不回這筆預約
        let owner = snapshot
            .owner(appointment.owner_id)
            .filter(|owner| owner.id == pet.owner_id)
            .ok_or_else(|| ClinicError::owner_not_found(format!("#{}", appointment.owner_id)))?;

        // 原檔案若無法解析就中止，避免覆寫掉資料
        let mut entries: Vec<serde_json::Value> =
            match self.storage.read_file(&self.appointments_file)? {
                Some(data) if !data.iter().all(|b| b.is_ascii_whitespace()) => {
                    serde_json::from_slice(&data)?
                }
                _ => Vec::new(),
            };

        let stored = Appointment {
            id: snapshot.next_appointment_id(),
            date: appointment.date,
            time: appointment.time,
            owner_id: appointment.owner_id,
            pet_id: appointment.pet_id,
            reason: appointment.reason.clone(),
            diagnosis: appointment.diagnosis.clone(),
        };
        entries.push(serde_json::to_value(AppointmentEntry::from_appointment(
            &stored, pet, owner,
        ))?);

        let data = serde_json::to_vec_pretty(&entries)?;
        self.storage.write_file(&self.appointments_file, &data)?;
        Ok(stored)
    }
}
