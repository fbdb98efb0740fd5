// validation.rs
//
// Reglas de validación puras. Ninguna toca almacenamiento: las búsquedas de
// máquina y usuario las hace el llamador y aquí sólo se juzga el resultado.
use crate::errors::{ValidationError, ValidationReason};
use crate::photo::ImageKind;
use crate::{Machine, Prot, ProtInput, User};
use indexmap::IndexSet;

/// Longitud máxima (en caracteres) de observaciones y descripciones.
pub const MAX_OBSERVATION_LEN: usize = 100;

pub fn validate_machine_id(machine_id: i16) -> Result<i16, ValidationError> {
  if machine_id <= 0 {
    return Err(ValidationError::new(ValidationReason::InvalidMachineId, machine_id));
  }
  Ok(machine_id)
}

pub fn validate_user_id(user_id: i32) -> Result<i32, ValidationError> {
  if user_id <= 0 {
    return Err(ValidationError::new(ValidationReason::InvalidUserId, user_id));
  }
  Ok(user_id)
}

/// La máquina debe pertenecer al catálogo configurado.
pub fn require_known_machine(machine_id: i16, found: Option<Machine>) -> Result<Machine, ValidationError> {
  found.ok_or_else(|| ValidationError::new(ValidationReason::MachineNotFound, machine_id))
}

/// Quien inicia debe existir y estar activo.
pub fn require_active_start_user(user_id: i32, found: Option<User>) -> Result<User, ValidationError> {
  let user = found.ok_or_else(|| ValidationError::new(ValidationReason::StartUserNotFound, user_id))?;
  if !user.active {
    return Err(ValidationError::new(ValidationReason::InactiveUser, user_id));
  }
  Ok(user)
}

/// Quien finaliza sólo tiene que existir.
pub fn require_end_user(user_id: i32, found: Option<User>) -> Result<User, ValidationError> {
  found.ok_or_else(|| ValidationError::new(ValidationReason::EndUserNotFound, user_id))
}

/// Normaliza una observación opcional: vacía o sólo espacios cuenta como
/// ausente. El límite se mide en caracteres, no en bytes.
pub fn validate_observation(text: Option<&str>, reason: ValidationReason) -> Result<Option<String>, ValidationError> {
  let Some(raw) = text else {
    return Ok(None);
  };
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  if trimmed.chars().count() > MAX_OBSERVATION_LEN {
    return Err(ValidationError::new(reason, MAX_OBSERVATION_LEN));
  }
  Ok(Some(trimmed.to_string()))
}

pub fn validate_description(text: Option<&str>) -> Result<Option<String>, ValidationError> {
  validate_observation(text, ValidationReason::DescriptionTooLong)
}

/// Valida los Prots de un inicio: al menos uno, formatos correctos y sin
/// repetir la clave compuesta dentro de la misma petición. Conserva el orden
/// de envío.
pub fn validate_prot_batch(inputs: &[ProtInput]) -> Result<IndexSet<Prot>, ValidationError> {
  if inputs.is_empty() {
    return Err(ValidationError::new(ValidationReason::EmptyProtList, "[]"));
  }
  let mut prots = IndexSet::with_capacity(inputs.len());
  for input in inputs {
    let prot = input.validate()?;
    let key = prot.to_string();
    if !prots.insert(prot) {
      return Err(ValidationError::new(ValidationReason::DuplicateProtInRequest, key));
    }
  }
  Ok(prots)
}

/// Comprueba una foto subida y devuelve su tipo real.
///
/// Orden: contenido presente, tamaño, MIME declarado, firma de bytes
/// coherente con el MIME y extensión habilitada en `supported`.
pub fn validate_photo(bytes: &[u8],
                      declared_mime: &str,
                      max_bytes: u64,
                      supported: &[String])
                      -> Result<ImageKind, ValidationError> {
  if bytes.is_empty() {
    return Err(ValidationError::new(ValidationReason::FileRequired, 0));
  }
  if bytes.len() as u64 > max_bytes {
    return Err(ValidationError::new(ValidationReason::FileTooLarge, bytes.len()));
  }
  let declared = ImageKind::from_mime(declared_mime)
    .ok_or_else(|| ValidationError::new(ValidationReason::UnsupportedContentType, declared_mime))?;
  match ImageKind::sniff(bytes) {
    Some(actual) if actual == declared => {}
    _ => return Err(ValidationError::new(ValidationReason::SignatureMismatch, declared_mime)),
  }
  let enabled = supported.iter().any(|ext| ImageKind::from_extension(ext) == Some(declared));
  if !enabled {
    return Err(ValidationError::new(ValidationReason::UnsupportedFileType, declared.extension()));
  }
  Ok(declared)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::photo::{JPEG_SIGNATURE, PNG_SIGNATURE};

  fn jpeg() -> Vec<u8> {
    let mut v = JPEG_SIGNATURE.to_vec();
    v.extend_from_slice(&[0xE0, 0x00, 0x10]);
    v
  }

  fn all_types() -> Vec<String> {
    vec!["jpg".to_string(), "png".to_string()]
  }

  #[test]
  fn ids_must_be_positive() {
    assert!(validate_machine_id(0).is_err());
    assert!(validate_machine_id(-3).is_err());
    assert_eq!(validate_machine_id(2), Ok(2));
    assert_eq!(validate_user_id(0).unwrap_err().reason, ValidationReason::InvalidUserId);
  }

  #[test]
  fn start_user_must_be_active() {
    let err = require_active_start_user(5, Some(User::new(5, "baja").inactive())).unwrap_err();
    assert_eq!(err.reason, ValidationReason::InactiveUser);
    let err = require_active_start_user(8, None).unwrap_err();
    assert_eq!(err.reason, ValidationReason::StartUserNotFound);
    assert!(require_end_user(5, Some(User::new(5, "baja").inactive())).is_ok());
  }

  #[test]
  fn observation_limit_counts_characters() {
    let ok = "ñ".repeat(100);
    assert_eq!(validate_observation(Some(&ok), ValidationReason::StartObservationTooLong).unwrap(), Some(ok.clone()));
    let long = "a".repeat(101);
    let err = validate_observation(Some(&long), ValidationReason::FinishObservationTooLong).unwrap_err();
    assert_eq!(err.reason, ValidationReason::FinishObservationTooLong);
    assert_eq!(validate_observation(Some("   "), ValidationReason::StartObservationTooLong).unwrap(), None);
  }

  #[test]
  fn prot_batch_rejects_empty_and_repeated() {
    assert_eq!(validate_prot_batch(&[]).unwrap_err().reason, ValidationReason::EmptyProtList);
    let p = ProtInput::new("PROT001", "NL01", "01/02");
    let err = validate_prot_batch(&[p.clone(), p.clone()]).unwrap_err();
    assert_eq!(err.reason, ValidationReason::DuplicateProtInRequest);
    let set = validate_prot_batch(&[ProtInput::new("PROT002", "NL01", "01/02"), p]).unwrap();
    assert_eq!(set.get_index(0).unwrap().prot_id(), "PROT002");
  }

  #[test]
  fn photo_checks_in_order() {
    let types = all_types();
    assert_eq!(validate_photo(&[], "image/jpeg", 10, &types).unwrap_err().reason, ValidationReason::FileRequired);
    assert_eq!(validate_photo(&jpeg(), "image/jpeg", 3, &types).unwrap_err().reason, ValidationReason::FileTooLarge);
    assert_eq!(validate_photo(&jpeg(), "image/gif", 1024, &types).unwrap_err().reason,
               ValidationReason::UnsupportedContentType);
    assert_eq!(validate_photo(&jpeg(), "image/png", 1024, &types).unwrap_err().reason,
               ValidationReason::SignatureMismatch);
    assert_eq!(validate_photo(&PNG_SIGNATURE, "image/png", 1024, &["jpg".to_string()]).unwrap_err().reason,
               ValidationReason::UnsupportedFileType);
    assert_eq!(validate_photo(&jpeg(), "image/jpeg", 1024, &types), Ok(ImageKind::Jpeg));
  }
}
