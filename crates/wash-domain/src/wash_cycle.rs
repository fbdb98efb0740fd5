// wash_cycle.rs
//
// Máquina de estados del ciclo: `InProgress` (inicial) → `Finished`
// (terminal). No hay cancelación: un ciclo iniciado sólo puede finalizarse.
use crate::errors::{InvalidState, Precondition, ValidationReason, WashError};
use crate::locale::Locale;
use crate::{Photo, Prot, WashId};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WashStatus {
  InProgress,
  Finished,
}

impl WashStatus {
  /// Código de una letra usado en la columna `status` (`P` / `F`).
  pub fn code(self) -> &'static str {
    match self {
      WashStatus::InProgress => "P",
      WashStatus::Finished => "F",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    match code.trim() {
      "P" => Some(WashStatus::InProgress),
      "F" => Some(WashStatus::Finished),
      _ => None,
    }
  }

  pub fn description(self, locale: Locale) -> &'static str {
    match (self, locale) {
      (WashStatus::InProgress, Locale::English) => "In progress",
      (WashStatus::InProgress, Locale::Spanish) => "En progreso",
      (WashStatus::Finished, Locale::English) => "Finished",
      (WashStatus::Finished, Locale::Spanish) => "Finalizado",
    }
  }
}

impl fmt::Display for WashStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.description(Locale::English))
  }
}

/// Reglas adicionales de cierre, activables por separado desde parámetros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinishRules {
  /// Exige que quien finaliza no sea quien inició.
  pub require_distinct_end_user: bool,
  /// Duración mínima del ciclo en segundos (0 = sin mínimo).
  pub minimum_duration_seconds: u32,
}

/// Campos planos de un ciclo tal como los guarda un repositorio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordParts {
  pub id: WashId,
  pub machine_id: i16,
  pub start_user_id: i32,
  pub end_user_id: Option<i32>,
  pub started_at: DateTime<Utc>,
  pub ended_at: Option<DateTime<Utc>>,
  pub status: WashStatus,
  pub start_observation: Option<String>,
  pub finish_observation: Option<String>,
}

/// Cabecera del ciclo (fila `wash_cycles`), sin Prots ni fotos. Es lo que
/// cargan las transiciones: nunca se recorre un grafo de objetos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WashCycleRecord {
  id: WashId,
  machine_id: i16,
  start_user_id: i32,
  end_user_id: Option<i32>,
  started_at: DateTime<Utc>,
  ended_at: Option<DateTime<Utc>>,
  status: WashStatus,
  start_observation: Option<String>,
  finish_observation: Option<String>,
}

impl WashCycleRecord {
  /// Estado inicial de un ciclo recién admitido.
  pub fn open(id: WashId,
              machine_id: i16,
              start_user_id: i32,
              start_observation: Option<String>,
              now: DateTime<Utc>)
              -> Self {
    Self { id,
           machine_id,
           start_user_id,
           end_user_id: None,
           started_at: now,
           ended_at: None,
           status: WashStatus::InProgress,
           start_observation,
           finish_observation: None }
  }

  /// Reconstruye una cabecera persistida comprobando su coherencia.
  pub fn from_parts(parts: RecordParts) -> Result<Self, WashError> {
    let finished_fields = parts.end_user_id.is_some() && parts.ended_at.is_some();
    match parts.status {
      WashStatus::Finished if !finished_fields => {
        return Err(WashError::internal(format!("ciclo {} finalizado sin operario o fecha de fin", parts.id)));
      }
      WashStatus::InProgress if parts.ended_at.is_some() => {
        return Err(WashError::internal(format!("ciclo {} en curso con fecha de fin", parts.id)));
      }
      _ => {}
    }
    Ok(Self { id: parts.id,
              machine_id: parts.machine_id,
              start_user_id: parts.start_user_id,
              end_user_id: parts.end_user_id,
              started_at: parts.started_at,
              ended_at: parts.ended_at,
              status: parts.status,
              start_observation: parts.start_observation,
              finish_observation: parts.finish_observation })
  }

  pub fn to_parts(&self) -> RecordParts {
    RecordParts { id: self.id,
                  machine_id: self.machine_id,
                  start_user_id: self.start_user_id,
                  end_user_id: self.end_user_id,
                  started_at: self.started_at,
                  ended_at: self.ended_at,
                  status: self.status,
                  start_observation: self.start_observation.clone(),
                  finish_observation: self.finish_observation.clone() }
  }

  pub fn is_in_progress(&self) -> bool {
    self.status == WashStatus::InProgress
  }

  /// Un ciclo finalizado es inmutable: cualquier modificación falla con
  /// `InvalidState`.
  pub fn ensure_in_progress(&self) -> Result<(), WashError> {
    if self.is_in_progress() {
      Ok(())
    } else {
      Err(WashError::InvalidState(InvalidState { wash_id: self.id, status: self.status }))
    }
  }

  /// Transición `InProgress → Finished`. Irreversible.
  ///
  /// `photo_count` es el número de fotos ya registradas para el ciclo; la
  /// observación llega validada.
  pub fn finish(&mut self,
                end_user_id: i32,
                finish_observation: Option<String>,
                photo_count: u32,
                now: DateTime<Utc>,
                rules: &FinishRules)
                -> Result<(), WashError> {
    self.ensure_in_progress()?;
    if photo_count == 0 {
      return Err(WashError::PreconditionFailed(Precondition::NoPhotos(self.id)));
    }
    if rules.require_distinct_end_user && end_user_id == self.start_user_id {
      return Err(WashError::validation(ValidationReason::SameStartEndUser, end_user_id));
    }
    if rules.minimum_duration_seconds > 0 {
      let elapsed = (now - self.started_at).num_seconds();
      if elapsed < rules.minimum_duration_seconds as i64 {
        return Err(WashError::PreconditionFailed(Precondition::MinimumDuration { wash_id: self.id,
                                                                                 required_seconds:
                                                                                   rules.minimum_duration_seconds,
                                                                                 elapsed_seconds: elapsed }));
      }
    }
    self.end_user_id = Some(end_user_id);
    self.finish_observation = finish_observation;
    self.ended_at = Some(now);
    self.status = WashStatus::Finished;
    Ok(())
  }

  pub fn id(&self) -> WashId {
    self.id
  }

  pub fn machine_id(&self) -> i16 {
    self.machine_id
  }

  pub fn start_user_id(&self) -> i32 {
    self.start_user_id
  }

  pub fn end_user_id(&self) -> Option<i32> {
    self.end_user_id
  }

  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  pub fn ended_at(&self) -> Option<DateTime<Utc>> {
    self.ended_at
  }

  pub fn status(&self) -> WashStatus {
    self.status
  }

  pub fn start_observation(&self) -> Option<&str> {
    self.start_observation.as_deref()
  }

  pub fn finish_observation(&self) -> Option<&str> {
    self.finish_observation.as_deref()
  }
}

/// Ciclo completo: cabecera más sus Prots (conjunto ordenado) y fotos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WashCycle {
  record: WashCycleRecord,
  prots: IndexSet<Prot>,
  photos: Vec<Photo>,
}

impl WashCycle {
  /// Transición `Start`: crea el ciclo en curso con sus Prots iniciales.
  /// Requiere al menos un Prot.
  pub fn start(id: WashId,
               machine_id: i16,
               start_user_id: i32,
               start_observation: Option<String>,
               prots: IndexSet<Prot>,
               now: DateTime<Utc>)
               -> Result<Self, WashError> {
    if prots.is_empty() {
      return Err(WashError::validation(ValidationReason::EmptyProtList, "[]"));
    }
    let record = WashCycleRecord::open(id, machine_id, start_user_id, start_observation, now);
    Ok(Self { record, prots, photos: Vec::new() })
  }

  /// Ensambla un ciclo leído del almacén.
  pub fn from_rows(record: WashCycleRecord, prots: impl IntoIterator<Item = Prot>, photos: Vec<Photo>) -> Self {
    let mut photos = photos;
    photos.sort_by_key(|p| p.sequence);
    Self { record, prots: prots.into_iter().collect(), photos }
  }

  pub fn record(&self) -> &WashCycleRecord {
    &self.record
  }

  pub fn id(&self) -> WashId {
    self.record.id
  }

  pub fn status(&self) -> WashStatus {
    self.record.status
  }

  pub fn prots(&self) -> &IndexSet<Prot> {
    &self.prots
  }

  pub fn photos(&self) -> &[Photo] {
    &self.photos
  }

  pub fn contains_prot(&self, prot: &Prot) -> bool {
    self.prots.contains(prot)
  }
}
