//! SQLite 儲存：owners、pets、appointments 三張表，以外鍵連結。
//! 每個操作開一條連線、跑一個交易後關閉。

use crate::domain::model::{
    Appointment, ClinicSnapshot, NewAppointment, NewOwner, NewPet, Owner, Pet,
};
use crate::domain::ports::ClinicStore;
use crate::utils::error::{ClinicError, Result};
use crate::utils::validation::{DATE_FORMAT, TIME_FORMAT};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_FILE: &str = "clinic.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    address TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT NOT NULL,
    age INTEGER NOT NULL,
    owner_id INTEGER NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES owners (id)
);

CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    reason TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    pet_id INTEGER NOT NULL,
    owner_id INTEGER NOT NULL,
    FOREIGN KEY (pet_id) REFERENCES pets (id),
    FOREIGN KEY (owner_id) REFERENCES owners (id)
);

CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments (date, time);
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// 開啟（必要時建立）資料庫並確保資料表存在
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            db_path: db_path.into(),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path).map_err(|e| {
            tracing::error!("Error connecting to {}: {}", self.db_path.display(), e);
            e
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA).map_err(|e| {
            tracing::error!("Error initializing database tables: {}", e);
            e
        })?;
        tracing::debug!("Database tables ready at {}", self.db_path.display());
        Ok(())
    }

    fn load_owners(conn: &Connection) -> Result<Vec<Owner>> {
        let mut stmt = conn.prepare("SELECT id, name, phone, address FROM owners ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Owner {
                id: row.get(0)?,
                name: row.get(1)?,
                phone: row.get(2)?,
                address: row.get(3)?,
            })
        })?;

        let mut owners = Vec::new();
        for row in rows {
            match row {
                Ok(owner) => owners.push(owner),
                Err(e) => tracing::error!("Skipping malformed owner row: {}", e),
            }
        }
        Ok(owners)
    }

    fn load_pets(conn: &Connection) -> Result<Vec<Pet>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.species, p.breed, p.age, p.owner_id
             FROM pets p
             JOIN owners o ON p.owner_id = o.id
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut pets = Vec::new();
        for row in rows {
            let (id, name, species, breed, age, owner_id) = match row {
                Ok(values) => values,
                Err(e) => {
                    tracing::error!("Skipping malformed pet row: {}", e);
                    continue;
                }
            };
            let Ok(age) = u32::try_from(age) else {
                tracing::error!("Skipping pet {} ({}): invalid age {}", id, name, age);
                continue;
            };
            pets.push(Pet {
                id,
                name,
                species,
                breed,
                age,
                owner_id,
            });
        }
        Ok(pets)
    }

    fn load_appointments(conn: &Connection) -> Result<Vec<Appointment>> {
        let mut stmt = conn.prepare(
            "SELECT a.id, a.date, a.time, a.reason, a.diagnosis, a.pet_id, a.owner_id
             FROM appointments a
             JOIN pets p ON a.pet_id = p.id
             JOIN owners o ON a.owner_id = o.id
             ORDER BY a.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut appointments = Vec::new();
        for row in rows {
            let (id, date, time, reason, diagnosis, pet_id, owner_id) = match row {
                Ok(values) => values,
                Err(e) => {
                    tracing::error!("Skipping malformed appointment row: {}", e);
                    continue;
                }
            };
            let parsed = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .ok()
                .zip(NaiveTime::parse_from_str(&time, TIME_FORMAT).ok());
            let Some((date, time)) = parsed else {
                tracing::error!(
                    "Skipping appointment {}: invalid date/time '{} {}'",
                    id,
                    date,
                    time
                );
                continue;
            };
            appointments.push(Appointment {
                id,
                date,
                time,
                owner_id,
                pet_id,
                reason,
                diagnosis,
            });
        }
        Ok(appointments)
    }
}

fn owner_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM owners WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

impl ClinicStore for SqliteStore {
    fn load(&self) -> Result<ClinicSnapshot> {
        let conn = self.connect()?;
        let owners = Self::load_owners(&conn)?;
        let pets = Self::load_pets(&conn)?;
        let mut appointments = Self::load_appointments(&conn)?;
        // 寵物列被略過時，它的預約也一併略過
        appointments.retain(|a| {
            let known = pets.iter().any(|p| p.id == a.pet_id);
            if !known {
                tracing::error!(
                    "Skipping appointment {}: pet id {} was not loaded",
                    a.id,
                    a.pet_id
                );
            }
            known
        });
        tracing::debug!(
            "Loaded {} owners, {} pets and {} appointments from {}",
            owners.len(),
            pets.len(),
            appointments.len(),
            self.db_path.display()
        );
        Ok(ClinicSnapshot {
            owners,
            pets,
            appointments,
        })
    }

    fn insert_owner(&self, owner: &NewOwner) -> Result<Owner> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO owners (name, phone, address) VALUES (?1, ?2, ?3)",
            params![owner.name, owner.phone, owner.address],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!("Owner {} stored with id {}", owner.name, id);

        Ok(Owner {
            id,
            name: owner.name.clone(),
            phone: owner.phone.clone(),
            address: owner.address.clone(),
        })
    }

    fn insert_pet(&self, pet: &NewPet) -> Result<Pet> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        if !owner_exists(&tx, pet.owner_id)? {
            return Err(ClinicError::owner_not_found(format!("#{}", pet.owner_id)));
        }
        tx.execute(
            "INSERT INTO pets (name, species, breed, age, owner_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![pet.name, pet.species, pet.breed, pet.age, pet.owner_id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!("Pet {} stored with id {}", pet.name, id);

        Ok(Pet {
            id,
            name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone(),
            age: pet.age,
            owner_id: pet.owner_id,
        })
    }

    fn insert_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let pet_owner: Option<i64> = tx
            .query_row(
                "SELECT owner_id FROM pets WHERE id = ?1",
                [appointment.pet_id],
                |row| row.get(0),
            )
            .optional()?;
        match pet_owner {
            None => {
                return Err(ClinicError::pet_not_found(format!("#{}", appointment.pet_id)));
            }
            Some(owner_id) if owner_id != appointment.owner_id => {
                return Err(ClinicError::owner_not_found(format!(
                    "#{}",
                    appointment.owner_id
                )));
            }
            Some(_) => {}
        }

        tx.execute(
            "INSERT INTO appointments (date, time, reason, diagnosis, pet_id, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                appointment.date.format(DATE_FORMAT).to_string(),
                appointment.time.format(TIME_FORMAT).to_string(),
                appointment.reason,
                appointment.diagnosis,
                appointment.pet_id,
                appointment.owner_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!("Appointment stored for pet id {}", appointment.pet_id);

        Ok(Appointment {
            id,
            date: appointment.date,
            time: appointment.time,
            owner_id: appointment.owner_id,
            pet_id: appointment.pet_id,
            reason: appointment.reason.clone(),
            diagnosis: appointment.diagnosis.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(dir.path().join(DEFAULT_DATABASE_FILE)).unwrap()
    }

    fn seed(store: &SqliteStore) -> (Owner, Pet) {
        let owner = store
            .insert_owner(&NewOwner {
                name: "Juan".into(),
                phone: "123456789".into(),
                address: "Calle Falsa 123".into(),
            })
            .unwrap();
        let pet = store
            .insert_pet(&NewPet {
                name: "Pepito".into(),
                species: "Dog".into(),
                breed: "Labrador".into(),
                age: 5,
                owner_id: owner.id,
            })
            .unwrap();
        (owner, pet)
    }

    #[test]
    fn test_open_creates_empty_database() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), ClinicSnapshot::default());
    }

    #[test]
    fn test_inserted_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let (owner, pet) = seed(&store(&dir));

        let snapshot = store(&dir).load().unwrap();
        assert_eq!(snapshot.owners, vec![owner]);
        assert_eq!(snapshot.pets, vec![pet]);
    }

    #[test]
    fn test_pet_requires_existing_owner() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir)
            .insert_pet(&NewPet {
                name: "Rex".into(),
                species: "Dog".into(),
                breed: "Beagle".into(),
                age: 3,
                owner_id: 99,
            })
            .unwrap_err();
        assert!(matches!(err, ClinicError::OwnerNotFound { .. }));
    }

    #[test]
    fn test_appointment_owner_must_match_pet() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (owner, pet) = seed(&store);
        let mut appointment = NewAppointment {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            owner_id: owner.id + 1,
            pet_id: pet.id,
            reason: "Vaccine".into(),
            diagnosis: "Healthy".into(),
        };
        assert!(store.insert_appointment(&appointment).is_err());

        appointment.owner_id = owner.id;
        let stored = store.insert_appointment(&appointment).unwrap();
        assert_eq!(store.load().unwrap().appointments, vec![stored]);
    }

    #[test]
    fn test_malformed_appointment_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let (owner, pet) = seed(&store);

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO appointments (date, time, reason, diagnosis, pet_id, owner_id)
             VALUES ('yesterday', '10:00', 'Checkup', 'Fine', ?1, ?2)",
            params![pet.id, owner.id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO pets (name, species, breed, age, owner_id) VALUES ('Old', 'Cat', 'Mixed', -2, ?1)",
            params![owner.id],
        )
        .unwrap();
        let old_pet_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO appointments (date, time, reason, diagnosis, pet_id, owner_id)
             VALUES ('2025-06-02', '11:00', 'Checkup', 'Fine', ?1, ?2)",
            params![old_pet_id, owner.id],
        )
        .unwrap();

        let snapshot = store.load().unwrap();
        assert!(snapshot.appointments.is_empty());
        assert_eq!(snapshot.pets.len(), 1);
        // 載入結果可以完整匯出
        assert!(crate::adapters::flat_file::encode_appointments(&snapshot).is_ok());
    }
}
