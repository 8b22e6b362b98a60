use crate::core::availability::{DailySchedule, DayAvailability};
use crate::core::repository::ClinicRepository;
use crate::domain::model::{Appointment, NewAppointment, NewOwner, NewPet, Owner, Pet};
use crate::domain::ports::ClinicStore;
use crate::utils::error::{ClinicError, Result};
use crate::utils::validation::{
    parse_age, parse_date, parse_date_time, parse_time, validate_letters_fields,
    validate_letters_only, validate_non_empty_string, DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT,
};
use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Default)]
pub struct OwnerForm {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// 新增寵物；飼主不存在且有提供電話與地址時會一併建立
#[derive(Debug, Clone, Default)]
pub struct PetForm {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: String,
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub owner_address: Option<String>,
}

/// `time` 留空時，`date` 可用 "YYYY-MM-DD HH:MM" 一次給完
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub date: String,
    pub time: String,
    pub pet_name: String,
    pub owner_name: Option<String>,
    pub reason: String,
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetRecord {
    pub pet: Pet,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    pub owner: Owner,
    pub pets: Vec<Pet>,
}

pub struct Clinic<S: ClinicStore> {
    repository: ClinicRepository<S>,
    schedule: DailySchedule,
}

impl<S: ClinicStore> Clinic<S> {
    pub fn open(store: S, schedule: DailySchedule) -> Result<Self> {
        let repository = ClinicRepository::open(store)?;
        tracing::info!("Clinic system initialized");
        Ok(Self {
            repository,
            schedule,
        })
    }

    pub fn repository(&mut self) -> &mut ClinicRepository<S> {
        &mut self.repository
    }

    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    pub fn register_owner(&mut self, form: &OwnerForm) -> Result<Owner> {
        let name = form.name.trim();
        validate_letters_only("owner", name)?;
        validate_non_empty_string("phone", &form.phone)?;
        validate_non_empty_string("address", &form.address)?;

        if let Some(existing) = self.repository.find_owner_by_name(name)? {
            tracing::info!("Found existing owner: {}", name);
            return Ok(existing);
        }

        let owner = self.repository.add_owner(NewOwner {
            name: name.to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
        })?;
        tracing::info!("New owner registered: {}", owner.name);
        Ok(owner)
    }

    pub fn register_pet(&mut self, form: &PetForm) -> Result<PetRecord> {
        let name = form.name.trim();
        let species = form.species.trim();
        let breed = form.breed.trim();
        let owner_name = form.owner_name.trim();
        validate_letters_fields(&[
            ("name", name),
            ("species", species),
            ("breed", breed),
            ("owner", owner_name),
        ])?;
        let age = parse_age("age", &form.age)?;

        let owner = match self.repository.find_owner_by_name(owner_name)? {
            Some(owner) => {
                tracing::info!("Found existing owner: {}", owner_name);
                owner
            }
            None => match (&form.owner_phone, &form.owner_address) {
                (Some(phone), Some(address)) => {
                    tracing::info!("Creating new owner: {}", owner_name);
                    self.register_owner(&OwnerForm {
                        name: owner_name.to_string(),
                        phone: phone.clone(),
                        address: address.clone(),
                    })?
                }
                _ => {
                    tracing::warn!("Owner not found: {}", owner_name);
                    return Err(ClinicError::owner_not_found(owner_name));
                }
            },
        };

        let pet = self.repository.add_pet(NewPet {
            name: name.to_string(),
            species: species.to_string(),
            breed: breed.to_string(),
            age,
            owner_id: owner.id,
        })?;
        tracing::info!(
            "New pet registered: {} ({}, {}) for owner {}",
            pet.name,
            pet.species,
            pet.breed,
            owner.name
        );
        Ok(PetRecord { pet, owner })
    }

    pub fn list_pets(&mut self) -> Result<Vec<PetRecord>> {
        let snapshot = self.repository.snapshot()?;
        let records: Vec<PetRecord> = snapshot
            .pets
            .iter()
            .filter_map(|pet| {
                snapshot.owner(pet.owner_id).map(|owner| PetRecord {
                    pet: pet.clone(),
                    owner: owner.clone(),
                })
            })
            .collect();
        if records.is_empty() {
            tracing::warn!("Attempted to list pets but none are registered");
        } else {
            tracing::info!("Listed {} pets", records.len());
        }
        Ok(records)
    }

    pub fn list_owners(&mut self) -> Result<Vec<OwnerRecord>> {
        let snapshot = self.repository.snapshot()?;
        Ok(snapshot
            .owners
            .iter()
            .map(|owner| OwnerRecord {
                owner: owner.clone(),
                pets: snapshot.pets_of_owner(owner.id).cloned().collect(),
            })
            .collect())
    }

    pub fn available_slots(&mut self, date: NaiveDate) -> Result<Vec<NaiveTime>> {
        let booked = self.repository.appointments_on(date)?;
        let open = self.schedule.available_slots(date, &booked);
        if open.is_empty() {
            tracing::warn!("No open slots left on {}", date.format(DATE_FORMAT));
        }
        Ok(open)
    }

    pub fn calendar(&mut self, from: NaiveDate, days: u32) -> Result<Vec<DayAvailability>> {
        let snapshot = self.repository.snapshot()?;
        Ok(self.schedule.calendar(from, days, &snapshot.appointments))
    }

    pub fn book_appointment(&mut self, form: &BookingForm) -> Result<Appointment> {
        let (date, time) = if form.time.trim().is_empty() {
            let scheduled = parse_date_time("date", &form.date)?;
            (scheduled.date(), scheduled.time())
        } else {
            (parse_date("date", &form.date)?, parse_time("time", &form.time)?)
        };

        let reason = form.reason.trim();
        let diagnosis = form.diagnosis.trim();
        validate_letters_only("reason", reason)?;
        // 預約時還沒有診斷，可留空
        if !diagnosis.is_empty() {
            validate_letters_only("diagnosis", diagnosis)?;
        }

        let pet_name = form.pet_name.trim();
        let pet = self.find_pet(pet_name, form.owner_name.as_deref())?;

        if !self.schedule.contains(time) {
            return Err(ClinicError::validation(
                "time",
                &time.format(TIME_FORMAT).to_string(),
                "is not one of the clinic time slots",
            ));
        }
        let booked = self.repository.appointments_on(date)?;
        if !self.schedule.is_available(date, time, &booked) {
            tracing::warn!(
                "Slot {} on {} is already booked",
                time.format(TIME_FORMAT),
                date.format(DATE_FORMAT)
            );
            return Err(ClinicError::validation(
                "time",
                &time.format(TIME_FORMAT).to_string(),
                format!("is already booked on {}", date.format(DATE_FORMAT)),
            ));
        }

        let appointment = self.repository.add_appointment(NewAppointment {
            date,
            time,
            owner_id: pet.owner_id,
            pet_id: pet.id,
            reason: reason.to_string(),
            diagnosis: diagnosis.to_string(),
        })?;
        tracing::info!(
            "New consultation registered for pet {} on {}",
            pet.name,
            appointment.scheduled_at().format(DATE_TIME_FORMAT)
        );
        Ok(appointment)
    }

    /// 某隻寵物的看診紀錄，依時間排序
    pub fn consultation_history(&mut self, pet_name: &str) -> Result<Vec<Appointment>> {
        let pet = self.find_pet(pet_name.trim(), None)?;
        let mut history = self.repository.appointments_for_pet(pet.id)?;
        history.sort_by_key(Appointment::scheduled_at);

        if history.is_empty() {
            tracing::warn!("No consultations found for pet: {}", pet.name);
        } else {
            tracing::info!("Found {} consultations for pet {}", history.len(), pet.name);
        }
        Ok(history)
    }

    fn find_pet(&mut self, pet_name: &str, owner_name: Option<&str>) -> Result<Pet> {
        let snapshot = self.repository.snapshot()?;
        let owner_id = match owner_name.map(str::trim) {
            Some(name) => Some(
                snapshot
                    .owner_by_name(name)
                    .ok_or_else(|| ClinicError::owner_not_found(name))?
                    .id,
            ),
            None => None,
        };

        snapshot
            .pets
            .iter()
            .find(|p| p.name == pet_name && owner_id.is_none_or(|id| p.owner_id == id))
            .cloned()
            .ok_or_else(|| {
                tracing::error!("Pet not found: {}", pet_name);
                ClinicError::pet_not_found(pet_name)
            })
    }
}
