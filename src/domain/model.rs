use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type OwnerId = i64;
pub type PetId = i64;
pub type AppointmentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOwner {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: u32,
    pub owner_id: OwnerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: u32,
    pub owner_id: OwnerId,
}

/// 看診預約；同一 (date, time) 只會有一筆
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub owner_id: OwnerId,
    pub pet_id: PetId,
    pub reason: String,
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub owner_id: OwnerId,
    pub pet_id: PetId,
    pub reason: String,
    pub diagnosis: String,
}

impl Appointment {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 目前載入的整個資料圖：先 owners，再 pets，最後 appointments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClinicSnapshot {
    pub owners: Vec<Owner>,
    pub pets: Vec<Pet>,
    pub appointments: Vec<Appointment>,
}

impl ClinicSnapshot {
    pub fn owner(&self, id: OwnerId) -> Option<&Owner> {
        self.owners.iter().find(|o| o.id == id)
    }

    pub fn pet(&self, id: PetId) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == id)
    }

    pub fn owner_by_name(&self, name: &str) -> Option<&Owner> {
        self.owners.iter().find(|o| o.name == name)
    }

    pub fn pet_by_name(&self, name: &str) -> Option<&Pet> {
        self.pets.iter().find(|p| p.name == name)
    }

    pub fn pets_of_owner(&self, owner_id: OwnerId) -> impl Iterator<Item = &Pet> {
        self.pets.iter().filter(move |p| p.owner_id == owner_id)
    }

    pub fn appointments_for_pet(&self, pet_id: PetId) -> impl Iterator<Item = &Appointment> {
        self.appointments.iter().filter(move |a| a.pet_id == pet_id)
    }

    pub fn appointments_for_owner(
        &self,
        owner_id: OwnerId,
    ) -> impl Iterator<Item = &Appointment> {
        self.appointments
            .iter()
            .filter(move |a| a.owner_id == owner_id)
    }

    pub fn appointments_on(&self, date: NaiveDate) -> impl Iterator<Item = &Appointment> {
        self.appointments.iter().filter(move |a| a.date == date)
    }

    pub fn next_owner_id(&self) -> OwnerId {
        self.owners.iter().map(|o| o.id).max().unwrap_or(0) + 1
    }

    pub fn next_pet_id(&self) -> PetId {
        self.pets.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    pub fn next_appointment_id(&self) -> AppointmentId {
        self.appointments.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }
}
