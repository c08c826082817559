// src/common/clock.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Relógio do negócio: "hoje" é a data local no fuso configurado da loja.
///
/// Os handlers chamam `today()` uma única vez por requisição e repassam o valor
/// para as funções puras (status, dashboard, cobrança).
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    offset: FixedOffset,
}

impl BusinessClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_utc_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    pub fn today_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Meia-noite local de `date`, como instante UTC (usado no `paid_at` de venda à vista).
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}

// UTC
impl Default for BusinessClock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_uses_business_offset() {
        let clock = BusinessClock::from_utc_offset_hours(-3).unwrap();
        // 02:00 UTC ainda é o dia anterior em Brasília
        let instant = Utc.with_ymd_and_hms(2024, 3, 2, 2, 0, 0).unwrap();
        assert_eq!(clock.today_at(instant), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let later = Utc.with_ymd_and_hms(2024, 3, 2, 3, 0, 0).unwrap();
        assert_eq!(clock.today_at(later), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let clock = BusinessClock::from_utc_offset_hours(-3).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(clock.start_of_day(date), Utc.with_ymd_and_hms(2024, 1, 10, 3, 0, 0).unwrap());
    }

    #[test]
    fn formats_brazilian_date() {
        assert_eq!(format_date_br(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()), "08/03/2024");
    }
}
