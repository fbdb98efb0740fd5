// locale.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Idioma en el que se redactan los mensajes de error para el operario.
///
/// No existe un idioma "actual" global: quien necesite un texto lo pide
/// pasando explícitamente el `Locale` (ver `WashError::message`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  English,
  Spanish,
}

impl Locale {
  /// Elige entre el texto inglés y el español.
  pub(crate) fn pick(self, en: String, es: String) -> String {
    match self {
      Locale::English => en,
      Locale::Spanish => es,
    }
  }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Locale::English => "en",
      Locale::Spanish => "es",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for Locale {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "en" | "english" | "en-us" | "en-gb" => Ok(Locale::English),
      "es" | "spanish" | "español" | "es-es" => Ok(Locale::Spanish),
      other => Err(format!("idioma no soportado: {}", other)),
    }
  }
}
