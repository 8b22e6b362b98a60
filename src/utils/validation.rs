use crate::utils::error::{ClinicError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn letters_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z ]+$").expect("static pattern compiles"))
}

fn reject(field: &str, value: &str, reason: impl Into<String>) -> ClinicError {
    let err = ClinicError::validation(field, value, reason);
    tracing::error!("Invalid value in field '{}': {}", field, value);
    err
}

/// 只允許 ASCII 字母與空白，空字串也不接受
pub fn validate_letters_only(field_name: &str, value: &str) -> Result<()> {
    if letters_pattern().is_match(value) {
        Ok(())
    } else {
        Err(reject(
            field_name,
            value,
            "must contain only letters and spaces",
        ))
    }
}

/// 一次驗證多個欄位，遇到第一個錯誤就停止
pub fn validate_letters_fields(fields: &[(&str, &str)]) -> Result<()> {
    fields
        .iter()
        .try_for_each(|(field, value)| validate_letters_only(field, value))
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(reject(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn parse_age(field_name: &str, value: &str) -> Result<u32> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| reject(field_name, value, "must contain numbers"))?;
    if parsed < 0 {
        return Err(reject(field_name, value, "must be positive"));
    }
    u32::try_from(parsed).map_err(|_| reject(field_name, value, "is out of range"))
}

pub fn parse_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| reject(field_name, value, "must be in the format YYYY-MM-DD"))
}

pub fn parse_time(field_name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| reject(field_name, value, "must be in the format HH:MM"))
}

pub fn parse_date_time(field_name: &str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT)
        .map_err(|_| reject(field_name, value, "must be in the format YYYY-MM-DD HH:MM"))
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ClinicError::Config {
            message: format!("{}: path cannot be empty", field_name),
        });
    }

    if path.contains('\0') {
        return Err(ClinicError::Config {
            message: format!("{}: path contains null bytes", field_name),
        });
    }

    Ok(())
}
