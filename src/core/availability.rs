use crate::domain::model::Appointment;
use crate::utils::error::{ClinicError, Result};
use chrono::{Days, NaiveDate, NaiveTime};

/// 預設的每日看診時段
pub const DEFAULT_SLOTS: [(u32, u32); 6] = [(10, 0), (11, 0), (12, 0), (14, 0), (15, 0), (16, 0)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    slots: Vec<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub open_slots: Vec<NaiveTime>,
}

impl Default for DailySchedule {
    fn default() -> Self {
        let slots = DEFAULT_SLOTS
            .iter()
            .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect();
        Self { slots }
    }
}

impl DailySchedule {
    /// 排序並去除重複；空的時段表不合法
    pub fn new(mut slots: Vec<NaiveTime>) -> Result<Self> {
        slots.sort();
        slots.dedup();
        if slots.is_empty() {
            return Err(ClinicError::Config {
                message: "schedule.slots must contain at least one time".to_string(),
            });
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.slots.contains(&time)
    }

    /// 當天尚未被預約的時段，依時段表順序
    pub fn available_slots(
        &self,
        date: NaiveDate,
        appointments: &[Appointment],
    ) -> Vec<NaiveTime> {
        self.slots
            .iter()
            .copied()
            .filter(|slot| {
                !appointments
                    .iter()
                    .any(|a| a.date == date && a.time == *slot)
            })
            .collect()
    }

    pub fn is_available(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        appointments: &[Appointment],
    ) -> bool {
        self.contains(time)
            && !appointments
                .iter()
                .any(|a| a.date == date && a.time == time)
    }

    pub fn calendar(
        &self,
        from: NaiveDate,
        days: u32,
        appointments: &[Appointment],
    ) -> Vec<DayAvailability> {
        (0..days)
            .filter_map(|offset| from.checked_add_days(Days::new(u64::from(offset))))
            .map(|date| DayAvailability {
                date,
                open_slots: self.available_slots(date, appointments),
            })
            .collect()
    }
}
