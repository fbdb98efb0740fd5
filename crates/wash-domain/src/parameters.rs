// parameters.rs
use crate::wash_cycle::FinishRules;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const IMAGE_PATH: &str = "ImagePath";
pub const MAX_PHOTOS_PER_WASH: &str = "MaxPhotosPerWash";
pub const SUPPORTED_FILE_TYPES: &str = "SupportedFileTypes";
pub const MAX_ACTIVE_WASHES: &str = "MaxActiveWashes";
pub const MAX_PHOTO_SIZE_BYTES: &str = "MaxPhotoSizeBytes";
pub const REQUIRE_DISTINCT_END_USER: &str = "RequireDistinctEndUser";
pub const MINIMUM_WASH_DURATION_SECONDS: &str = "MinimumWashDurationSeconds";

/// Parámetros de operación leídos de la tabla `parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
  pub image_path: PathBuf,
  pub max_photos_per_wash: u32,
  pub supported_file_types: Vec<String>,
  pub max_active_washes: u32,
  pub max_photo_size_bytes: u64,
  pub finish_rules: FinishRules,
}

impl Default for Parameters {
  fn default() -> Self {
    Self { image_path: PathBuf::from("/shared/photos"),
           max_photos_per_wash: 99,
           supported_file_types: vec!["jpg".to_string(), "png".to_string()],
           max_active_washes: 2,
           max_photo_size_bytes: 5 * 1024 * 1024,
           finish_rules: FinishRules::default() }
  }
}

impl Parameters {
  /// Construye los parámetros desde pares nombre/valor. Las claves ausentes
  /// o con valor ilegible conservan el valor por defecto.
  pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where I: IntoIterator<Item = (K, V)>,
          K: AsRef<str>,
          V: AsRef<str>
  {
    let mut params = Parameters::default();
    for (name, value) in pairs {
      let (name, value) = (name.as_ref(), value.as_ref().trim());
      match name {
        IMAGE_PATH if !value.is_empty() => params.image_path = PathBuf::from(value),
        MAX_PHOTOS_PER_WASH => parse_into(name, value, &mut params.max_photos_per_wash),
        MAX_ACTIVE_WASHES => parse_into(name, value, &mut params.max_active_washes),
        MAX_PHOTO_SIZE_BYTES => parse_into(name, value, &mut params.max_photo_size_bytes),
        MINIMUM_WASH_DURATION_SECONDS => parse_into(name, value, &mut params.finish_rules.minimum_duration_seconds),
        REQUIRE_DISTINCT_END_USER => parse_into(name, value, &mut params.finish_rules.require_distinct_end_user),
        SUPPORTED_FILE_TYPES => {
          let types: Vec<String> = value.split(',')
                                        .map(|t| t.trim().trim_start_matches('.').to_ascii_lowercase())
                                        .filter(|t| !t.is_empty())
                                        .collect();
          if types.is_empty() {
            warn!("Parámetro {} vacío, se usan los tipos por defecto", name);
          } else {
            params.supported_file_types = types;
          }
        }
        _ => {}
      }
    }
    params
  }
}

fn parse_into<T: FromStr>(name: &str, value: &str, slot: &mut T) {
  match value.to_ascii_lowercase().parse::<T>() {
    Ok(v) => *slot = v,
    Err(_) => warn!("Valor '{}' inválido para el parámetro {}, se conserva el valor por defecto", value, name),
  }
}
