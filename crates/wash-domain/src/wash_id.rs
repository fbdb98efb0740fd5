// wash_id.rs
use crate::errors::{Exhausted, ValidationError, ValidationReason, WashError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Máximo de ciclos que pueden iniciarse en un mismo día (secuencia XX).
pub const MAX_DAILY_SEQUENCE: u32 = 99;

/// Identificador legible de un ciclo de lavado con formato `YYMMDDXX`.
///
/// Los seis primeros dígitos son la fecha de inicio y los dos últimos la
/// secuencia dentro del día (01–99). Se asigna al crear el ciclo y no cambia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WashId(i64);

impl WashId {
  /// Valida un id recibido desde fuera: 8 dígitos, fecha real y secuencia
  /// distinta de 00.
  pub fn parse(raw: i64) -> Result<Self, ValidationError> {
    let invalid = || ValidationError::new(ValidationReason::InvalidWashId, raw);
    if !(10_000_000..=99_999_999).contains(&raw) {
      return Err(invalid());
    }
    let sequence = raw % 100;
    if sequence == 0 {
      return Err(invalid());
    }
    let prefix = raw / 100;
    let (yy, mm, dd) = (prefix / 10_000, (prefix / 100) % 100, prefix % 100);
    NaiveDate::from_ymd_opt(2000 + yy as i32, mm as u32, dd as u32).ok_or_else(invalid)?;
    Ok(Self(raw))
  }

  /// Calcula el siguiente id del día `today` a partir del mayor emitido hoy.
  ///
  /// Debe invocarse dentro de la misma transacción que inserta el ciclo: de
  /// lo contrario dos inicios concurrentes calcularían la misma secuencia.
  pub fn next(today: NaiveDate, max_issued_today: Option<WashId>) -> Result<Self, WashError> {
    let prefix = Self::day_prefix(today);
    let sequence = match max_issued_today {
      Some(max) => (max.0 % 100) + 1,
      None => 1,
    };
    if sequence > MAX_DAILY_SEQUENCE as i64 {
      return Err(WashError::CapacityExhausted(Exhausted::DailyIdentifiers { prefix: format!("{:06}", prefix) }));
    }
    Ok(Self(prefix * 100 + sequence))
  }

  /// `YYMMDD` como entero.
  pub fn day_prefix(day: NaiveDate) -> i64 {
    ((day.year() % 100) as i64) * 10_000 + (day.month() as i64) * 100 + day.day() as i64
  }

  /// Rango inclusivo de ids posibles para un día (`YYMMDD01..=YYMMDD99`).
  pub fn day_bounds(day: NaiveDate) -> (i64, i64) {
    let base = Self::day_prefix(day) * 100;
    (base + 1, base + MAX_DAILY_SEQUENCE as i64)
  }

  pub fn value(self) -> i64 {
    self.0
  }

  pub fn sequence(self) -> u32 {
    (self.0 % 100) as u32
  }

  /// Fecha codificada en el id. Siempre válida porque el constructor la
  /// comprueba.
  pub fn date(self) -> NaiveDate {
    let prefix = self.0 / 100;
    NaiveDate::from_ymd_opt(2000 + (prefix / 10_000) as i32,
                            ((prefix / 100) % 100) as u32,
                            (prefix % 100) as u32).unwrap_or(NaiveDate::MIN)
  }

  /// Año de cuatro cifras usado para particionar el almacén de fotos.
  pub fn year(self) -> i32 {
    self.date().year()
  }
}

impl fmt::Display for WashId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:08}", self.0)
  }
}

impl FromStr for WashId {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
      return Err(ValidationError::new(ValidationReason::InvalidWashId, trimmed));
    }
    let raw: i64 = trimmed.parse().map_err(|_| ValidationError::new(ValidationReason::InvalidWashId, trimmed))?;
    Self::parse(raw)
  }
}

impl TryFrom<i64> for WashId {
  type Error = ValidationError;

  fn try_from(raw: i64) -> Result<Self, Self::Error> {
    Self::parse(raw)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn first_id_of_the_day_is_sequence_one() {
    let id = WashId::next(day(2025, 8, 1), None).unwrap();
    assert_eq!(id.value(), 25_080_101);
    assert_eq!(id.to_string(), "25080101");
    assert_eq!(id.sequence(), 1);
  }

  #[test]
  fn next_increments_the_max_issued_today() {
    let max = WashId::parse(25_080_107).unwrap();
    let id = WashId::next(day(2025, 8, 1), Some(max)).unwrap();
    assert_eq!(id.value(), 25_080_108);
  }

  #[test]
  fn sequence_above_99_is_exhausted() {
    let max = WashId::parse(25_080_199).unwrap();
    let err = WashId::next(day(2025, 8, 1), Some(max)).unwrap_err();
    assert_eq!(err.code(), "daily_ids_exhausted");
  }

  #[test]
  fn parse_rejects_bad_shapes() {
    assert!(WashId::parse(2_508_011).is_err());
    assert!(WashId::parse(25_080_100).is_err());
    assert!(WashId::parse(25_133_101).is_err());
    assert!(WashId::parse(25_023_001).is_err());
    assert!("2508010a".parse::<WashId>().is_err());
    assert_eq!("25080102".parse::<WashId>().unwrap().value(), 25_080_102);
  }

  #[test]
  fn date_and_year_come_from_the_prefix() {
    let id = WashId::parse(24_022_905).unwrap();
    assert_eq!(id.date(), day(2024, 2, 29));
    assert_eq!(id.year(), 2024);
    assert_eq!(WashId::day_bounds(day(2024, 2, 29)), (24_022_901, 24_022_999));
  }
}
