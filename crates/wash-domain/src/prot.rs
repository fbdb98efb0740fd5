// prot.rs
use crate::errors::{ValidationError, ValidationReason};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static PROT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PROT[0-9]{3}$").expect("regex PROT válida"));
static BATCH_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^NL[0-9]{2}$").expect("regex de lote válida"));
static BAG_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}$").expect("regex de bolsa válida"));

/// Escaneo de un conjunto de instrumental. Los tres campos forman la clave
/// compuesta que debe ser única dentro de un ciclo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prot {
  prot_id: String,
  batch_number: String,
  bag_number: String,
}

impl Prot {
  /// Construye un Prot validado. Falla con el primer campo inválido.
  pub fn new(prot_id: &str, batch_number: &str, bag_number: &str) -> Result<Self, ValidationError> {
    if !PROT_ID.is_match(prot_id) {
      return Err(ValidationError::new(ValidationReason::InvalidProtId, prot_id));
    }
    if !BATCH_NUMBER.is_match(batch_number) {
      return Err(ValidationError::new(ValidationReason::InvalidBatchNumber, batch_number));
    }
    if !BAG_NUMBER.is_match(bag_number) {
      return Err(ValidationError::new(ValidationReason::InvalidBagNumber, bag_number));
    }
    Ok(Self { prot_id: prot_id.to_string(), batch_number: batch_number.to_string(), bag_number: bag_number.to_string() })
  }

  pub fn prot_id(&self) -> &str {
    &self.prot_id
  }

  pub fn batch_number(&self) -> &str {
    &self.batch_number
  }

  pub fn bag_number(&self) -> &str {
    &self.bag_number
  }
}

impl fmt::Display for Prot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}-{}", self.prot_id, self.batch_number, self.bag_number)
  }
}

/// Prot tal como llega del escáner o del formulario, sin validar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtInput {
  pub prot_id: String,
  pub batch_number: String,
  pub bag_number: String,
}

impl ProtInput {
  pub fn new(prot_id: impl Into<String>, batch_number: impl Into<String>, bag_number: impl Into<String>) -> Self {
    Self { prot_id: prot_id.into(), batch_number: batch_number.into(), bag_number: bag_number.into() }
  }

  pub fn validate(&self) -> Result<Prot, ValidationError> {
    Prot::new(&self.prot_id, &self.batch_number, &self.bag_number)
  }
}

impl From<&Prot> for ProtInput {
  fn from(p: &Prot) -> Self {
    Self::new(p.prot_id(), p.batch_number(), p.bag_number())
  }
}
