pub mod availability;
pub mod clinic;
pub mod repository;

pub use crate::domain::model::{
    Appointment, ClinicSnapshot, NewAppointment, NewOwner, NewPet, Owner, Pet,
};
pub use crate::domain::ports::{ClinicStore, ConfigProvider, Storage, StoreBackend};
pub use crate::utils::error::Result;
