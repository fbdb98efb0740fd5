// Archivo: evidence.rs
// Propósito: compuerta de evidencias del ciclo. Decide si un Prot o una foto
// pueden añadirse, sin tocar almacenamiento; el llamador aporta lo que ya
// existe (Prot presente, número de fotos).
use wash_domain::validation::validate_photo;
use wash_domain::{photo_file_name, photo_relative_path, DuplicateProt, Exhausted, ImageKind, Parameters, Prot,
                  WashError, WashId};

/// Hueco asignado a la siguiente foto de un ciclo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSlot {
    pub sequence: u32,
    pub file_name: String,
    pub relative_path: String,
}

#[derive(Debug, Clone)]
pub struct EvidenceGate {
    max_photos: u32,
    max_photo_bytes: u64,
    supported_types: Vec<String>,
}

impl EvidenceGate {
    pub fn new(max_photos: u32, max_photo_bytes: u64, supported_types: Vec<String>) -> Self {
        Self { max_photos, max_photo_bytes, supported_types }
    }

    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(params.max_photos_per_wash, params.max_photo_size_bytes, params.supported_file_types.clone())
    }

    /// Valida el contenido subido y devuelve el tipo real de imagen.
    pub fn inspect_upload(&self, bytes: &[u8], declared_mime: &str) -> Result<ImageKind, WashError> {
        Ok(validate_photo(bytes, declared_mime, self.max_photo_bytes, &self.supported_types)?)
    }

    /// Un Prot ya presente en el ciclo se rechaza como duplicado.
    pub fn admit_prot(&self, wash_id: WashId, prot: &Prot, already_present: bool) -> Result<(), WashError> {
        if already_present {
            return Err(WashError::Duplicate(DuplicateProt { wash_id, prot: prot.clone() }));
        }
        Ok(())
    }

    /// Asigna la secuencia `current_count + 1` si queda cupo.
    pub fn admit_photo(&self, wash_id: WashId, current_count: u32, kind: ImageKind) -> Result<PhotoSlot, WashError> {
        if current_count >= self.max_photos {
            return Err(WashError::CapacityExhausted(Exhausted::PhotosPerCycle { wash_id, max: self.max_photos }));
        }
        let sequence = current_count + 1;
        let file_name = photo_file_name(wash_id, sequence, kind);
        let relative_path = photo_relative_path(wash_id, &file_name);
        Ok(PhotoSlot { sequence, file_name, relative_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wash_domain::JPEG_SIGNATURE;

    fn gate() -> EvidenceGate {
        EvidenceGate::new(2, 64, vec!["jpg".into(), "png".into()])
    }

    #[test]
    fn duplicate_prot_is_rejected() {
        let id = WashId::parse(25_080_101).unwrap();
        let prot = Prot::new("PROT001", "NL01", "01/02").unwrap();
        assert!(gate().admit_prot(id, &prot, false).is_ok());
        let err = gate().admit_prot(id, &prot, true).unwrap_err();
        assert_eq!(err.code(), "duplicate_prot");
    }

    #[test]
    fn photo_slots_follow_the_count_until_the_limit() {
        let id = WashId::parse(25_080_101).unwrap();
        let slot = gate().admit_photo(id, 0, ImageKind::Jpeg).unwrap();
        assert_eq!(slot.sequence, 1);
        assert_eq!(slot.file_name, "25080101_01.jpg");
        assert_eq!(slot.relative_path, "2025/25080101_01.jpg");
        assert_eq!(gate().admit_photo(id, 1, ImageKind::Png).unwrap().file_name, "25080101_02.png");
        let err = gate().admit_photo(id, 2, ImageKind::Jpeg).unwrap_err();
        assert_eq!(err.code(), "photo_limit_exceeded");
    }

    #[test]
    fn upload_inspection_uses_configured_size() {
        let mut big = JPEG_SIGNATURE.to_vec();
        big.resize(65, 0);
        assert_eq!(gate().inspect_upload(&big, "image/jpeg").unwrap_err().code(), "file_too_large");
        big.truncate(64);
        assert_eq!(gate().inspect_upload(&big, "image/jpeg").unwrap(), ImageKind::Jpeg);
    }
}
