// photo.rs
use crate::WashId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Firma de un JPEG (SOI + primer marcador).
pub const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
/// Firma de 8 bytes de un PNG.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Tipos de imagen aceptados como evidencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
  Jpeg,
  Png,
}

impl ImageKind {
  /// Interpreta el tipo MIME declarado por el cliente (ignora parámetros
  /// como `; charset=`).
  pub fn from_mime(mime: &str) -> Option<Self> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
      "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageKind::Jpeg),
      "image/png" => Some(ImageKind::Png),
      _ => None,
    }
  }

  /// Detecta el tipo real por los bytes mágicos del contenido.
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    if bytes.starts_with(&PNG_SIGNATURE) {
      Some(ImageKind::Png)
    } else if bytes.starts_with(&JPEG_SIGNATURE) {
      Some(ImageKind::Jpeg)
    } else {
      None
    }
  }

  pub fn from_extension(ext: &str) -> Option<Self> {
    match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
      "jpg" | "jpeg" => Some(ImageKind::Jpeg),
      "png" => Some(ImageKind::Png),
      _ => None,
    }
  }

  pub fn from_file_name(name: &str) -> Option<Self> {
    name.rsplit_once('.').and_then(|(_, ext)| Self::from_extension(ext))
  }

  pub fn extension(self) -> &'static str {
    match self {
      ImageKind::Jpeg => "jpg",
      ImageKind::Png => "png",
    }
  }

  pub fn mime(self) -> &'static str {
    match self {
      ImageKind::Jpeg => "image/jpeg",
      ImageKind::Png => "image/png",
    }
  }
}

impl fmt::Display for ImageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mime())
  }
}

/// Nombre determinista `{washId}_{seq:02}.{ext}`.
pub fn photo_file_name(wash_id: WashId, sequence: u32, kind: ImageKind) -> String {
  format!("{}_{:02}.{}", wash_id, sequence, kind.extension())
}

/// Ruta relativa dentro del almacén: `{YYYY}/{fileName}`. El año sale del
/// propio id, así la ruta se regenera igual con sólo `(id, secuencia)`.
pub fn photo_relative_path(wash_id: WashId, file_name: &str) -> String {
  format!("{}/{}", wash_id.year(), file_name)
}

/// SHA-256 en hexadecimal del contenido almacenado.
pub fn checksum(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Foto de evidencia adjunta a un ciclo. Inmutable una vez creada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
  pub wash_id: WashId,
  pub sequence: u32,
  pub file_name: String,
  pub file_path: String,
  pub kind: ImageKind,
  pub size_bytes: u64,
  pub checksum: String,
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Photo {
  /// Registro de la foto número `sequence` a partir de los bytes recibidos.
  pub fn new(wash_id: WashId,
             sequence: u32,
             kind: ImageKind,
             bytes: &[u8],
             description: Option<String>,
             created_at: DateTime<Utc>)
             -> Self {
    let file_name = photo_file_name(wash_id, sequence, kind);
    let file_path = photo_relative_path(wash_id, &file_name);
    Self { wash_id,
           sequence,
           file_name,
           file_path,
           kind,
           size_bytes: bytes.len() as u64,
           checksum: checksum(bytes),
           description,
           created_at }
  }

  /// Comprueba que los bytes leídos del almacén son los que se subieron.
  pub fn verify(&self, bytes: &[u8]) -> bool {
    checksum(bytes) == self.checksum
  }
}
