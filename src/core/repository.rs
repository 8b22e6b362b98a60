use crate::domain::model::{
    Appointment, ClinicSnapshot, NewAppointment, NewOwner, NewPet, Owner, OwnerId, Pet, PetId,
};
use crate::domain::ports::ClinicStore;
use crate::utils::error::Result;
use chrono::NaiveDate;

/// 儲存層是唯一的真實來源；`cache` 只是快取，每次寫入後作廢，下次讀取時重新載入。
pub struct ClinicRepository<S: ClinicStore> {
    store: S,
    cache: Option<ClinicSnapshot>,
}

impl<S: ClinicStore> ClinicRepository<S> {
    /// 開啟時就把所有紀錄載入記憶體
    pub fn open(store: S) -> Result<Self> {
        let mut repository = Self { store, cache: None };
        let snapshot = repository.snapshot()?;
        tracing::info!(
            "Loaded {} owners, {} pets and {} appointments",
            snapshot.owners.len(),
            snapshot.pets.len(),
            snapshot.appointments.len()
        );
        Ok(repository)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn snapshot(&mut self) -> Result<&ClinicSnapshot> {
        if self.cache.is_none() {
            let snapshot = self.store.load()?;
            tracing::debug!("Repository cache refreshed from store");
            self.cache = Some(snapshot);
        }
        Ok(self.cache.get_or_insert_with(ClinicSnapshot::default))
    }

    pub fn reload(&mut self) -> Result<&ClinicSnapshot> {
        self.cache = None;
        self.snapshot()
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn add_owner(&mut self, owner: NewOwner) -> Result<Owner> {
        let stored = self.store.insert_owner(&owner).map_err(|e| {
            tracing::error!("Error adding owner {} to the store: {}", owner.name, e);
            e
        })?;
        self.invalidate();
        Ok(stored)
    }

    pub fn add_pet(&mut self, pet: NewPet) -> Result<Pet> {
        let stored = self.store.insert_pet(&pet).map_err(|e| {
            tracing::error!("Error adding pet {} to the store: {}", pet.name, e);
            e
        })?;
        self.invalidate();
        Ok(stored)
    }

    pub fn add_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment> {
        let stored = self.store.insert_appointment(&appointment).map_err(|e| {
            tracing::error!(
                "Error adding appointment for pet id {} to the store: {}",
                appointment.pet_id,
                e
            );
            e
        })?;
        self.invalidate();
        Ok(stored)
    }

    pub fn owners(&mut self) -> Result<Vec<Owner>> {
        Ok(self.snapshot()?.owners.clone())
    }

    pub fn pets(&mut self) -> Result<Vec<Pet>> {
        Ok(self.snapshot()?.pets.clone())
    }

    pub fn appointments(&mut self) -> Result<Vec<Appointment>> {
        Ok(self.snapshot()?.appointments.clone())
    }

    pub fn owner(&mut self, id: OwnerId) -> Result<Option<Owner>> {
        Ok(self.snapshot()?.owner(id).cloned())
    }

    pub fn pet(&mut self, id: PetId) -> Result<Option<Pet>> {
        Ok(self.snapshot()?.pet(id).cloned())
    }

    pub fn find_owner_by_name(&mut self, name: &str) -> Result<Option<Owner>> {
        Ok(self.snapshot()?.owner_by_name(name).cloned())
    }

    pub fn find_pet_by_name(&mut self, name: &str) -> Result<Option<Pet>> {
        Ok(self.snapshot()?.pet_by_name(name).cloned())
    }

    pub fn pets_of_owner(&mut self, owner_id: OwnerId) -> Result<Vec<Pet>> {
        Ok(self.snapshot()?.pets_of_owner(owner_id).cloned().collect())
    }

    pub fn appointments_for_pet(&mut self, pet_id: PetId) -> Result<Vec<Appointment>> {
        Ok(self
            .snapshot()?
            .appointments_for_pet(pet_id)
            .cloned()
            .collect())
    }

    pub fn appointments_for_owner(&mut self, owner_id: OwnerId) -> Result<Vec<Appointment>> {
        Ok(self
            .snapshot()?
            .appointments_for_owner(owner_id)
            .cloned()
            .collect())
    }

    pub fn appointments_on(&mut self, date: NaiveDate) -> Result<Vec<Appointment>> {
        Ok(self.snapshot()?.appointments_on(date).cloned().collect())
    }
}
