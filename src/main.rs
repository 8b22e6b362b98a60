use anyhow::Context;
use clap::Parser;
use vet_clinic::config::LogFormat;
use vet_clinic::core::{ClinicStore, ConfigProvider, StoreBackend};
use vet_clinic::utils::validation::{parse_date, Validate, DATE_FORMAT, TIME_FORMAT};
use vet_clinic::utils::logger;
use vet_clinic::{
    BookingForm, CliConfig, Clinic, ClinicError, Command, FlatFileStore, LocalStorage, OwnerForm,
    PetForm, SqliteStore, TomlConfig,
};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    std::fs::create_dir_all(config.data_dir()).with_context(|| {
        format!("cannot create data directory {}", config.data_dir().display())
    })?;

    // 初始化日誌
    match config.logging.format {
        LogFormat::Json => logger::init_json_logger(config.log_level()),
        LogFormat::Compact => {
            logger::init_cli_logger(cli.verbose, config.log_level(), config.log_file().as_deref())
                .context("cannot open log file")?
        }
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = dispatch(&cli.command, &config) {
        tracing::error!("❌ Operation failed: {}", e);
        exit_with(&e);
    }

    Ok(())
}

fn exit_with(e: &ClinicError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(e.exit_code());
}

fn dispatch(command: &Command, config: &TomlConfig) -> vet_clinic::Result<()> {
    let schedule = config.schedule()?;
    match config.backend() {
        StoreBackend::FlatFile => {
            let storage = LocalStorage::new(config.data_dir());
            let store =
                FlatFileStore::with_files(storage, config.pets_file(), config.appointments_file());
            run(&mut Clinic::open(store, schedule)?, command, config)
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(config.data_dir().join(config.database_file()))?;
            run(&mut Clinic::open(store, schedule)?, command, config)
        }
    }
}

fn run<S: ClinicStore>(
    clinic: &mut Clinic<S>,
    command: &Command,
    config: &TomlConfig,
) -> vet_clinic::Result<()> {
    match command {
        Command::AddOwner {
            name,
            phone,
            address,
        } => {
            let owner = clinic.register_owner(&OwnerForm {
                name: name.clone(),
                phone: phone.clone(),
                address: address.clone(),
            })?;
            println!("✅ Owner {} registered (id {})", owner.name, owner.id);
        }
        Command::AddPet {
            name,
            species,
            breed,
            age,
            owner,
            phone,
            address,
        } => {
            let record = clinic.register_pet(&PetForm {
                name: name.clone(),
                species: species.clone(),
                breed: breed.clone(),
                age: age.clone(),
                owner_name: owner.clone(),
                owner_phone: phone.clone(),
                owner_address: address.clone(),
            })?;
            println!(
                "✅ Pet {} registered for owner {} (id {})",
                record.pet.name, record.owner.name, record.pet.id
            );
        }
        Command::ListOwners => {
            let owners = clinic.list_owners()?;
            if owners.is_empty() {
                println!("No owners registered");
            }
            for record in owners {
                println!("Owner: {}", record.owner.name);
                println!(" Phone: {}", record.owner.phone);
                println!(" Address: {}", record.owner.address);
                let names: Vec<&str> = record.pets.iter().map(|p| p.name.as_str()).collect();
                println!(" Pets: {}", names.join(", "));
                println!("{}", "-".repeat(50));
            }
        }
        Command::ListPets => {
            let pets = clinic.list_pets()?;
            if pets.is_empty() {
                println!("No pets registered");
            }
            for record in pets {
                println!("ID: {}", record.pet.id);
                println!("Name: {}", record.pet.name);
                println!("Species: {}", record.pet.species);
                println!("Breed: {}", record.pet.breed);
                println!("Age: {}", record.pet.age);
                println!("Owner: {}", record.owner.name);
                println!("Owner phone: {}", record.owner.phone);
                println!("Owner address: {}", record.owner.address);
                println!("{}", "-".repeat(50));
            }
        }
        Command::Slots { date } => {
            let date = parse_date("date", date)?;
            let open = clinic.available_slots(date)?;
            if open.is_empty() {
                println!("No slots available on {}", date.format(DATE_FORMAT));
            } else {
                let slots: Vec<String> = open
                    .iter()
                    .map(|slot| slot.format(TIME_FORMAT).to_string())
                    .collect();
                println!("{}: {}", date.format(DATE_FORMAT), slots.join(" "));
            }
        }
        Command::Calendar { from, days } => {
            let from = match from {
                Some(value) => parse_date("from", value)?,
                None => chrono::Local::now().date_naive(),
            };
            for day in clinic.calendar(from, *days)? {
                let slots: Vec<String> = day
                    .open_slots
                    .iter()
                    .map(|slot| slot.format(TIME_FORMAT).to_string())
                    .collect();
                let listing = if slots.is_empty() {
                    "fully booked".to_string()
                } else {
                    slots.join(" ")
                };
                println!("{}: {}", day.date.format(DATE_FORMAT), listing);
            }
        }
        Command::Book {
            date,
            time,
            pet,
            owner,
            reason,
            diagnosis,
        } => {
            let appointment = clinic.book_appointment(&BookingForm {
                date: date.clone(),
                time: time.clone().unwrap_or_default(),
                pet_name: pet.clone(),
                owner_name: owner.clone(),
                reason: reason.clone(),
                diagnosis: diagnosis.clone().unwrap_or_default(),
            })?;
            println!(
                "✅ Appointment booked for {} on {} at {}",
                pet,
                appointment.date.format(DATE_FORMAT),
                appointment.time.format(TIME_FORMAT)
            );
        }
        Command::History { pet } => {
            let history = clinic.consultation_history(pet)?;
            if history.is_empty() {
                println!("There are no registered consultations for this pet");
            }
            for appointment in history {
                println!(
                    "Date: {} {}",
                    appointment.date.format(DATE_FORMAT),
                    appointment.time.format(TIME_FORMAT)
                );
                println!("Reason: {}", appointment.reason);
                println!("Diagnosis: {}", appointment.diagnosis);
                println!("{}", "-".repeat(50));
            }
        }
        Command::Export { to } => {
            let target = FlatFileStore::with_files(
                LocalStorage::new(to),
                config.pets_file(),
                config.appointments_file(),
            );
            target.save_snapshot(clinic.repository().snapshot()?)?;
            println!("📁 Records exported to {}", to.display());
        }
    }
    Ok(())
}
