use chrono::{NaiveDate, NaiveTime};
use tempfile::TempDir;
use vet_clinic::core::ClinicStore;
use vet_clinic::{
    BookingForm, Clinic, ClinicError, DailySchedule, FlatFileStore, LocalStorage, OwnerForm,
    PetForm, SqliteStore,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn rex_form() -> PetForm {
    PetForm {
        name: "Rex".into(),
        species: "Dog".into(),
        breed: "Beagle".into(),
        age: "3".into(),
        owner_name: "Luis".into(),
        owner_phone: Some("555222333".into()),
        owner_address: Some("Calle Real 456".into()),
    }
}

fn booking(date: &str, time: &str, reason: &str) -> BookingForm {
    BookingForm {
        date: date.into(),
        time: time.into(),
        pet_name: "Rex".into(),
        reason: reason.into(),
        ..Default::default()
    }
}

/// 登記 → 查空檔 → 預約 → 空檔減少 → 看診紀錄
fn run_booking_flow<S: ClinicStore>(clinic: &mut Clinic<S>) {
    let record = clinic.register_pet(&rex_form()).unwrap();
    assert_eq!(record.owner.name, "Luis");

    let day = date(2030, 1, 7);
    assert_eq!(clinic.available_slots(day).unwrap().len(), 6);

    let first = clinic
        .book_appointment(&booking("2030-01-07", "10:00", "Checkup"))
        .unwrap();
    assert_eq!(first.pet_id, record.pet.id);
    assert_eq!(first.owner_id, record.owner.id);
    clinic
        .book_appointment(&booking("2030-01-07 15:00", "", "Vaccine"))
        .unwrap();

    assert_eq!(
        clinic.available_slots(day).unwrap(),
        vec![time(11), time(12), time(14), time(16)]
    );
    assert_eq!(clinic.available_slots(date(2030, 1, 8)).unwrap().len(), 6);

    let err = clinic
        .book_appointment(&booking("2030-01-07", "10:00", "Again"))
        .unwrap_err();
    assert!(err.is_validation());

    let err = clinic
        .book_appointment(&booking("2030-01-07", "13:00", "Lunch"))
        .unwrap_err();
    assert!(err.is_validation());

    let history = clinic.consultation_history("Rex").unwrap();
    let reasons: Vec<&str> = history.iter().map(|a| a.reason.as_str()).collect();
    assert_eq!(reasons, vec!["Checkup", "Vaccine"]);

    let calendar = clinic.calendar(day, 2).unwrap();
    assert_eq!(calendar.len(), 2);
    assert_eq!(calendar[0].open_slots.len(), 4);
    assert_eq!(calendar[1].open_slots.len(), 6);
}

#[test]
fn test_booking_flow_on_flat_files() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStore::new(LocalStorage::new(dir.path()));
    let mut clinic = Clinic::open(store, DailySchedule::default()).unwrap();
    run_booking_flow(&mut clinic);

    // 重新開啟後預約仍佔用時段
    let store = FlatFileStore::new(LocalStorage::new(dir.path()));
    let mut reopened = Clinic::open(store, DailySchedule::default()).unwrap();
    assert_eq!(reopened.available_slots(date(2030, 1, 7)).unwrap().len(), 4);
}

#[test]
fn test_booking_flow_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("clinic.db");
    let mut clinic =
        Clinic::open(SqliteStore::open(&db_path).unwrap(), DailySchedule::default()).unwrap();
    run_booking_flow(&mut clinic);

    let mut reopened =
        Clinic::open(SqliteStore::open(&db_path).unwrap(), DailySchedule::default()).unwrap();
    assert_eq!(reopened.consultation_history("Rex").unwrap().len(), 2);
}

#[test]
fn test_custom_schedule_limits_slots() {
    let dir = TempDir::new().unwrap();
    let schedule = DailySchedule::new(vec![time(9), time(17)]).unwrap();
    let store = SqliteStore::open(dir.path().join("clinic.db")).unwrap();
    let mut clinic = Clinic::open(store, schedule).unwrap();
    clinic.register_pet(&rex_form()).unwrap();

    let err = clinic
        .book_appointment(&booking("2030-01-07", "10:00", "Checkup"))
        .unwrap_err();
    assert!(err.is_validation());
    clinic
        .book_appointment(&booking("2030-01-07", "17:00", "Checkup"))
        .unwrap();
    assert_eq!(clinic.available_slots(date(2030, 1, 7)).unwrap(), vec![time(9)]);
}

#[test]
fn test_register_pet_without_owner_details_fails() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStore::new(LocalStorage::new(dir.path()));
    let mut clinic = Clinic::open(store, DailySchedule::default()).unwrap();

    let err = clinic
        .register_pet(&PetForm {
            owner_phone: None,
            owner_address: None,
            ..rex_form()
        })
        .unwrap_err();
    assert!(matches!(err, ClinicError::OwnerNotFound { .. }));
    assert_eq!(err.exit_code(), 3);

    clinic
        .register_owner(&OwnerForm {
            name: "Luis".into(),
            phone: "555222333".into(),
            address: "Calle Real 456".into(),
        })
        .unwrap();
    let record = clinic
        .register_pet(&PetForm {
            owner_phone: None,
            owner_address: None,
            ..rex_form()
        })
        .unwrap();
    assert_eq!(record.owner.phone, "555222333");
    assert_eq!(clinic.list_pets().unwrap().len(), 1);
}

#[test]
fn test_export_copies_sqlite_records_to_flat_files() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("clinic.db")).unwrap();
    let mut clinic = Clinic::open(store, DailySchedule::default()).unwrap();
    clinic.register_pet(&rex_form()).unwrap();
    clinic
        .book_appointment(&BookingForm {
            diagnosis: "Healthy".into(),
            ..booking("2030-01-07", "11:00", "Checkup")
        })
        .unwrap();

    let export_dir = dir.path().join("export");
    let target = FlatFileStore::new(LocalStorage::new(&export_dir));
    target
        .save_snapshot(clinic.repository().snapshot().unwrap())
        .unwrap();

    let exported = target.load().unwrap();
    assert_eq!(exported.owners.len(), 1);
    assert_eq!(exported.pets[0].name, "Rex");
    assert_eq!(exported.appointments.len(), 1);
    assert_eq!(exported.appointments[0].diagnosis, "Healthy");
}

#[test]
fn test_pets_sharing_a_name_stay_with_their_owner_after_restart() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStore::new(LocalStorage::new(dir.path()));
    let mut clinic = Clinic::open(store, DailySchedule::default()).unwrap();

    let luis_rex = clinic.register_pet(&rex_form()).unwrap();
    let ana_rex = clinic
        .register_pet(&PetForm {
            breed: "Poodle".into(),
            owner_name: "Ana".into(),
            owner_phone: Some("987654321".into()),
            owner_address: Some("Calle 654".into()),
            ..rex_form()
        })
        .unwrap();
    assert_ne!(luis_rex.pet.id, ana_rex.pet.id);

    clinic
        .book_appointment(&BookingForm {
            owner_name: Some("Ana".into()),
            ..booking("2030-01-07", "12:00", "Vaccine")
        })
        .unwrap();

    let store = FlatFileStore::new(LocalStorage::new(dir.path()));
    let snapshot = store.load().unwrap();
    assert_eq!(snapshot.appointments.len(), 1);
    let appointment = &snapshot.appointments[0];
    assert_eq!(appointment.pet_id, ana_rex.pet.id);
    assert_eq!(appointment.owner_id, ana_rex.owner.id);
    assert_eq!(snapshot.pet(appointment.pet_id).unwrap().breed, "Poodle");

    let mut reopened = Clinic::open(store, DailySchedule::default()).unwrap();
    assert!(reopened
        .repository()
        .appointments_for_pet(luis_rex.pet.id)
        .unwrap()
        .is_empty());
}
