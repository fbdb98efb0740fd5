// errors.rs
//
// Taxonomía de errores del controlador de ciclos de lavado. Cada variante
// lleva un motivo tipado: `code()` da un identificador estable para máquinas
// y `message(locale)` el texto para el operario. `Display` usa inglés.
use crate::locale::Locale;
use crate::{Prot, WashId, WashStatus};
use std::fmt;
use thiserror::Error;

/// Familia del error, para que la capa externa (HTTP) elija el código de
/// estado sin inspeccionar motivos concretos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Validation,
  Conflict,
  NotFound,
  InvalidState,
  PreconditionFailed,
  CapacityExhausted,
  Duplicate,
  Internal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WashError {
  /// Entrada con forma o rango inválido. El llamador puede corregirla.
  #[error("{0}")]
  Validation(ValidationError),
  /// Máquina ocupada, cupo global agotado o escritura concurrente.
  #[error("{0}")]
  Conflict(ConflictReason),
  #[error("{0}")]
  NotFound(NotFound),
  /// Operación ilegal para el estado actual del ciclo.
  #[error("{0}")]
  InvalidState(InvalidState),
  #[error("{0}")]
  PreconditionFailed(Precondition),
  /// Espacio de ids del día o cupo de fotos agotado.
  #[error("{0}")]
  CapacityExhausted(Exhausted),
  #[error("{0}")]
  Duplicate(DuplicateProt),
  /// Fallo opaco de almacenamiento (BD, disco, pool).
  #[error("Internal error: {0}")]
  Internal(String),
}

impl WashError {
  pub fn validation(reason: ValidationReason, value: impl ToString) -> Self {
    WashError::Validation(ValidationError::new(reason, value))
  }

  pub fn internal(detail: impl Into<String>) -> Self {
    WashError::Internal(detail.into())
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      WashError::Validation(_) => ErrorKind::Validation,
      WashError::Conflict(_) => ErrorKind::Conflict,
      WashError::NotFound(_) => ErrorKind::NotFound,
      WashError::InvalidState(_) => ErrorKind::InvalidState,
      WashError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
      WashError::CapacityExhausted(_) => ErrorKind::CapacityExhausted,
      WashError::Duplicate(_) => ErrorKind::Duplicate,
      WashError::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Código estable del motivo concreto (p. ej. `machine_busy`).
  pub fn code(&self) -> &'static str {
    match self {
      WashError::Validation(v) => v.reason.code(),
      WashError::Conflict(c) => c.code(),
      WashError::NotFound(n) => n.code(),
      WashError::InvalidState(_) => "invalid_state",
      WashError::PreconditionFailed(p) => p.code(),
      WashError::CapacityExhausted(e) => e.code(),
      WashError::Duplicate(_) => "duplicate_prot",
      WashError::Internal(_) => "internal",
    }
  }

  pub fn message(&self, locale: Locale) -> String {
    match self {
      WashError::Validation(v) => v.message(locale),
      WashError::Conflict(c) => c.message(locale),
      WashError::NotFound(n) => n.message(locale),
      WashError::InvalidState(s) => s.message(locale),
      WashError::PreconditionFailed(p) => p.message(locale),
      WashError::CapacityExhausted(e) => e.message(locale),
      WashError::Duplicate(d) => d.message(locale),
      WashError::Internal(detail) => {
        locale.pick(format!("Internal error: {}", detail), format!("Error interno: {}", detail))
      }
    }
  }
}

impl From<ValidationError> for WashError {
  fn from(e: ValidationError) -> Self {
    WashError::Validation(e)
  }
}

// ---------------------------------------------------------------------------
// Validación

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
  InvalidWashId,
  InvalidMachineId,
  MachineNotFound,
  InvalidUserId,
  StartUserNotFound,
  EndUserNotFound,
  InactiveUser,
  SameStartEndUser,
  EmptyProtList,
  InvalidProtId,
  InvalidBatchNumber,
  InvalidBagNumber,
  DuplicateProtInRequest,
  StartObservationTooLong,
  FinishObservationTooLong,
  DescriptionTooLong,
  FileRequired,
  FileTooLarge,
  UnsupportedContentType,
  SignatureMismatch,
  UnsupportedFileType,
}

impl ValidationReason {
  pub fn code(self) -> &'static str {
    match self {
      ValidationReason::InvalidWashId => "invalid_wash_id",
      ValidationReason::InvalidMachineId => "invalid_machine_id",
      ValidationReason::MachineNotFound => "machine_not_found",
      ValidationReason::InvalidUserId => "invalid_user_id",
      ValidationReason::StartUserNotFound => "start_user_not_found",
      ValidationReason::EndUserNotFound => "end_user_not_found",
      ValidationReason::InactiveUser => "inactive_user",
      ValidationReason::SameStartEndUser => "same_start_end_user",
      ValidationReason::EmptyProtList => "empty_prot_list",
      ValidationReason::InvalidProtId => "invalid_prot_id",
      ValidationReason::InvalidBatchNumber => "invalid_batch_number",
      ValidationReason::InvalidBagNumber => "invalid_bag_number",
      ValidationReason::DuplicateProtInRequest => "duplicate_prot_in_request",
      ValidationReason::StartObservationTooLong => "start_observation_too_long",
      ValidationReason::FinishObservationTooLong => "finish_observation_too_long",
      ValidationReason::DescriptionTooLong => "description_too_long",
      ValidationReason::FileRequired => "file_required",
      ValidationReason::FileTooLarge => "file_too_large",
      ValidationReason::UnsupportedContentType => "unsupported_content_type",
      ValidationReason::SignatureMismatch => "signature_mismatch",
      ValidationReason::UnsupportedFileType => "unsupported_file_type",
    }
  }
}

/// Motivo de validación más el valor recibido que lo provocó.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
  pub reason: ValidationReason,
  pub value: String,
}

impl ValidationError {
  pub fn new(reason: ValidationReason, value: impl ToString) -> Self {
    Self { reason, value: value.to_string() }
  }

  pub fn message(&self, locale: Locale) -> String {
    let v = &self.value;
    match self.reason {
      ValidationReason::InvalidWashId => {
        locale.pick(format!("Invalid washing ID format: {}. Must follow YYMMDDXX pattern (e.g., 25080101)", v),
                    format!("Formato de ID de lavado inválido: {}. Debe seguir el patrón YYMMDDXX (ej: 25080101)", v))
      }
      ValidationReason::InvalidMachineId => {
        locale.pick(format!("Invalid machine ID: {}. Must be a positive integer", v),
                    format!("ID de máquina inválido: {}. Debe ser un número entero positivo", v))
      }
      ValidationReason::MachineNotFound => {
        locale.pick(format!("Machine with ID {} does not exist", v), format!("La máquina con ID {} no existe", v))
      }
      ValidationReason::InvalidUserId => {
        locale.pick(format!("Invalid user ID: {}. Must be a positive integer", v),
                    format!("ID de usuario inválido: {}. Debe ser un número entero positivo", v))
      }
      ValidationReason::StartUserNotFound => {
        locale.pick(format!("Start operator with ID {} is not registered", v),
                    format!("El operario de inicio con ID {} no está registrado", v))
      }
      ValidationReason::EndUserNotFound => {
        locale.pick(format!("End operator with ID {} is not registered", v),
                    format!("El operario de finalización con ID {} no está registrado", v))
      }
      ValidationReason::InactiveUser => {
        locale.pick(format!("Operator with ID {} is not active", v),
                    format!("El operario con ID {} no está activo", v))
      }
      ValidationReason::SameStartEndUser => {
        locale.pick("Start and end operators must be different".to_string(),
                    "El operario de inicio y finalización deben ser diferentes".to_string())
      }
      ValidationReason::EmptyProtList => {
        locale.pick("Must add at least one PROT instrument set to start the wash cycle".to_string(),
                    "Debe agregar al menos un conjunto de instrumentos PROT para iniciar el ciclo de lavado".to_string())
      }
      ValidationReason::InvalidProtId => {
        locale.pick(format!("Invalid ProtId format: '{}'. Must follow PROTXXX pattern (e.g., PROT001)", v),
                    format!("Formato de ProtId inválido: '{}'. Debe seguir el patrón PROTXXX (ej: PROT001)", v))
      }
      ValidationReason::InvalidBatchNumber => {
        locale.pick(format!("Invalid BatchNumber format: '{}'. Must follow NLXX pattern (e.g., NL01)", v),
                    format!("Formato de BatchNumber inválido: '{}'. Debe seguir el patrón NLXX (ej: NL01)", v))
      }
      ValidationReason::InvalidBagNumber => {
        locale.pick(format!("Invalid BagNumber format: '{}'. Must follow XX/XX pattern (e.g., 01/02)", v),
                    format!("Formato de BagNumber inválido: '{}'. Debe seguir el patrón XX/XX (ej: 01/02)", v))
      }
      ValidationReason::DuplicateProtInRequest => {
        locale.pick(format!("Cannot add duplicate PROT entries in the same request: {}", v),
                    format!("No se pueden agregar entradas PROT duplicadas en la misma solicitud: {}", v))
      }
      ValidationReason::StartObservationTooLong => {
        locale.pick(format!("Start observation cannot exceed {} characters", v),
                    format!("La observación de inicio no puede superar {} caracteres", v))
      }
      ValidationReason::FinishObservationTooLong => {
        locale.pick(format!("Finish observation cannot exceed {} characters", v),
                    format!("La observación de finalización no puede superar {} caracteres", v))
      }
      ValidationReason::DescriptionTooLong => {
        locale.pick(format!("Photo description cannot exceed {} characters", v),
                    format!("La descripción de la foto no puede superar {} caracteres", v))
      }
      ValidationReason::FileRequired => {
        locale.pick("A photo file is required".to_string(), "Se requiere un archivo de foto".to_string())
      }
      ValidationReason::FileTooLarge => {
        locale.pick(format!("File size {} bytes exceeds the maximum allowed", v),
                    format!("El tamaño del archivo ({} bytes) supera el máximo permitido", v))
      }
      ValidationReason::UnsupportedContentType => {
        locale.pick(format!("Invalid file type '{}'. Only JPEG and PNG images are allowed", v),
                    format!("Tipo de archivo inválido '{}'. Solo se permiten imágenes JPEG y PNG", v))
      }
      ValidationReason::SignatureMismatch => {
        locale.pick(format!("File content does not match the declared type '{}'", v),
                    format!("El contenido del archivo no coincide con el tipo declarado '{}'", v))
      }
      ValidationReason::UnsupportedFileType => {
        locale.pick(format!("File extension '{}' is not enabled for uploads", v),
                    format!("La extensión '{}' no está habilitada para subir fotos", v))
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// Conflictos de admisión

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
  MachineBusy { machine_id: i16 },
  GlobalCapacityExceeded { max_active: u32 },
  /// El almacén rechazó la escritura por otra transacción concurrente.
  ConcurrentModification,
}

impl ConflictReason {
  pub fn code(&self) -> &'static str {
    match self {
      ConflictReason::MachineBusy { .. } => "machine_busy",
      ConflictReason::GlobalCapacityExceeded { .. } => "global_capacity_exceeded",
      ConflictReason::ConcurrentModification => "concurrent_modification",
    }
  }

  pub fn message(&self, locale: Locale) -> String {
    match self {
      ConflictReason::MachineBusy { machine_id } => {
        locale.pick(format!("Machine {} is already in use by another wash cycle", machine_id),
                    format!("La máquina {} ya está en uso por otro ciclo de lavado", machine_id))
      }
      ConflictReason::GlobalCapacityExceeded { max_active } => {
        locale.pick(format!("Cannot start more wash cycles. Maximum {} active washes allowed simultaneously",
                            max_active),
                    format!("No se pueden iniciar más ciclos de lavado. Máximo {} lavados activos permitidos \
                             simultáneamente",
                            max_active))
      }
      ConflictReason::ConcurrentModification => {
        locale.pick("The wash data was modified concurrently, please retry".to_string(),
                    "Los datos del lavado se modificaron de forma concurrente, reintente".to_string())
      }
    }
  }
}

impl fmt::Display for ConflictReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// No encontrado

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
  WashCycle(WashId),
  Photo { wash_id: WashId, sequence: u32 },
  /// El registro existe pero el archivo no está en el almacén.
  PhotoFile(String),
  /// El ciclo existe pero no tiene fotos que descargar.
  NoPhotos(WashId),
}

impl NotFound {
  pub fn code(&self) -> &'static str {
    match self {
      NotFound::WashCycle(_) => "wash_not_found",
      NotFound::Photo { .. } => "photo_not_found",
      NotFound::PhotoFile(_) => "photo_file_not_found",
      NotFound::NoPhotos(_) => "no_photos_for_wash",
    }
  }

  pub fn message(&self, locale: Locale) -> String {
    match self {
      NotFound::WashCycle(id) => {
        locale.pick(format!("Wash cycle with ID {} does not exist", id),
                    format!("El ciclo de lavado con ID {} no existe", id))
      }
      NotFound::Photo { wash_id, sequence } => {
        locale.pick(format!("Photo {:02} of wash cycle {} does not exist", sequence, wash_id),
                    format!("La foto {:02} del ciclo de lavado {} no existe", sequence, wash_id))
      }
      NotFound::PhotoFile(name) => {
        locale.pick(format!("Photo file '{}' not found in the file system", name),
                    format!("El archivo de foto '{}' no se encuentra en el sistema de archivos", name))
      }
      NotFound::NoPhotos(id) => {
        locale.pick(format!("Wash cycle {} has no photos", id),
                    format!("El ciclo de lavado {} no tiene fotos", id))
      }
    }
  }
}

impl fmt::Display for NotFound {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// Estado inválido

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidState {
  pub wash_id: WashId,
  pub status: WashStatus,
}

impl InvalidState {
  pub fn message(&self, locale: Locale) -> String {
    match self.status {
      WashStatus::Finished => {
        locale.pick(format!("Wash cycle {} is already finished and cannot be modified", self.wash_id),
                    format!("El ciclo de lavado {} ya está finalizado y no puede modificarse", self.wash_id))
      }
      WashStatus::InProgress => {
        locale.pick(format!("Wash cycle {} is not in a state that allows this operation", self.wash_id),
                    format!("El ciclo de lavado {} no está en un estado que permita esta operación", self.wash_id))
      }
    }
  }
}

impl fmt::Display for InvalidState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// Precondiciones de cierre

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
  NoPhotos(WashId),
  MinimumDuration { wash_id: WashId, required_seconds: u32, elapsed_seconds: i64 },
}

impl Precondition {
  pub fn code(&self) -> &'static str {
    match self {
      Precondition::NoPhotos(_) => "no_photos",
      Precondition::MinimumDuration { .. } => "minimum_duration",
    }
  }

  pub fn message(&self, locale: Locale) -> String {
    match self {
      Precondition::NoPhotos(id) => {
        locale.pick(format!("Cannot finish wash cycle {}: at least one photo is required", id),
                    format!("No se puede finalizar el ciclo de lavado {}: se requiere al menos una foto", id))
      }
      Precondition::MinimumDuration { wash_id, required_seconds, elapsed_seconds } => {
        locale.pick(format!("Cannot finish wash cycle {}: it must run at least {} seconds ({} elapsed)",
                            wash_id, required_seconds, elapsed_seconds),
                    format!("No se puede finalizar el ciclo de lavado {}: debe durar al menos {} segundos ({} \
                             transcurridos)",
                            wash_id, required_seconds, elapsed_seconds))
      }
    }
  }
}

impl fmt::Display for Precondition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// Cupos agotados

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exhausted {
  /// Ya se emitieron los 99 ids del día `prefix` (YYMMDD).
  DailyIdentifiers { prefix: String },
  PhotosPerCycle { wash_id: WashId, max: u32 },
}

impl Exhausted {
  pub fn code(&self) -> &'static str {
    match self {
      Exhausted::DailyIdentifiers { .. } => "daily_ids_exhausted",
      Exhausted::PhotosPerCycle { .. } => "photo_limit_exceeded",
    }
  }

  pub fn message(&self, locale: Locale) -> String {
    match self {
      Exhausted::DailyIdentifiers { prefix } => {
        locale.pick(format!("No more wash cycles can be started on {}: the daily limit of 99 was reached", prefix),
                    format!("No se pueden iniciar más ciclos de lavado el día {}: se alcanzó el límite diario de 99",
                            prefix))
      }
      Exhausted::PhotosPerCycle { wash_id, max } => {
        locale.pick(format!("Photo limit reached for wash {}. Maximum {} photos allowed per wash cycle", wash_id, max),
                    format!("Límite de fotos alcanzado para el lavado {}. Máximo {} fotos permitidas por ciclo de \
                             lavado",
                            wash_id, max))
      }
    }
  }
}

impl fmt::Display for Exhausted {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

// ---------------------------------------------------------------------------
// Prot duplicado en el ciclo

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateProt {
  pub wash_id: WashId,
  pub prot: Prot,
}

impl DuplicateProt {
  pub fn message(&self, locale: Locale) -> String {
    let p = &self.prot;
    locale.pick(format!("PROT '{}' with batch '{}' and bag '{}' already exists in this wash cycle",
                        p.prot_id(),
                        p.batch_number(),
                        p.bag_number()),
                format!("El PROT '{}' con lote '{}' y bolsa '{}' ya existe en este ciclo de lavado",
                        p.prot_id(),
                        p.batch_number(),
                        p.bag_number()))
  }
}

impl fmt::Display for DuplicateProt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message(Locale::English))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_is_english_and_spanish_is_explicit() {
    let err = WashError::Conflict(ConflictReason::MachineBusy { machine_id: 1 });
    assert_eq!(err.to_string(), "Machine 1 is already in use by another wash cycle");
    assert_eq!(err.message(Locale::Spanish), "La máquina 1 ya está en uso por otro ciclo de lavado");
    assert_eq!(err.code(), "machine_busy");
    assert_eq!(err.kind(), ErrorKind::Conflict);
  }

  #[test]
  fn validation_carries_offending_value() {
    let err = WashError::validation(ValidationReason::InvalidProtId, "PROTX");
    match &err {
      WashError::Validation(v) => assert_eq!(v.value, "PROTX"),
      other => panic!("expected validation error, got {:?}", other),
    }
    assert!(err.to_string().contains("'PROTX'"));
    assert_eq!(err.code(), "invalid_prot_id");
  }

  #[test]
  fn capacity_message_names_the_limit() {
    let err = WashError::Conflict(ConflictReason::GlobalCapacityExceeded { max_active: 2 });
    assert!(err.to_string().contains("Maximum 2 active washes"));
  }
}
