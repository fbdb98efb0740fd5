// photo_store.rs
// Archivos de evidencia bajo el directorio raíz configurado (`ImagePath`).
// Las rutas que llegan son relativas (`<año>/<nombre>`); nunca pueden salir
// de la raíz.
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use wash_domain::{ConflictReason, WashError};
use wash_flow::PhotoStore;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FsPhotoStore {
  root: PathBuf,
}

impl FsPhotoStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    FsPhotoStore { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Ruta absoluta de un archivo relativo a la raíz. Rechaza rutas vacías,
  /// absolutas o con componentes `..`.
  pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, WashError> {
    let rel = Path::new(relative_path);
    if relative_path.trim().is_empty() || rel.is_absolute() {
      return Err(WashError::internal(format!("ruta de foto inválida: '{}'", relative_path)));
    }
    for component in rel.components() {
      match component {
        Component::Normal(_) => {}
        _ => return Err(WashError::internal(format!("ruta de foto fuera del directorio de imágenes: '{}'",
                                                    relative_path))),
      }
    }
    Ok(self.root.join(rel))
  }
}

impl PhotoStore for FsPhotoStore {
  fn put(&self, relative_path: &str, bytes: &[u8]) -> Result<(), WashError> {
    let target = self.resolve(relative_path)?;
    let dir = target.parent().unwrap_or(&self.root);
    fs::create_dir_all(dir).map_err(|e| {
                             WashError::internal(format!("no se pudo crear {}: {}", dir.display(), e))
                           })?;
    // Temporal + enlace duro: un lector nunca ve un archivo a medias y un
    // nombre ya ocupado no se pisa
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.{}.part", name, std::process::id(), TMP_SEQ.fetch_add(1, Ordering::Relaxed)));
    fs::write(&tmp, bytes).map_err(|e| WashError::internal(format!("error escribiendo {}: {}", tmp.display(), e)))?;
    let linked = fs::hard_link(&tmp, &target);
    let _ = fs::remove_file(&tmp);
    match linked {
      Ok(()) => {}
      Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
        warn!("La foto {} ya existe; no se sobrescribe", target.display());
        return Err(WashError::Conflict(ConflictReason::ConcurrentModification));
      }
      Err(e) => {
        return Err(WashError::internal(format!("error moviendo {} a {}: {}", tmp.display(), target.display(), e)))
      }
    }
    debug!("Foto guardada en {} ({} bytes)", target.display(), bytes.len());
    Ok(())
  }

  fn get(&self, relative_path: &str) -> Result<Option<Vec<u8>>, WashError> {
    let target = self.resolve(relative_path)?;
    match fs::read(&target) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
      Err(e) => Err(WashError::internal(format!("error leyendo {}: {}", target.display(), e))),
    }
  }

  fn remove(&self, relative_path: &str) -> Result<(), WashError> {
    let target = self.resolve(relative_path)?;
    match fs::remove_file(&target) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
      Err(e) => {
        warn!("No se pudo borrar {}: {}", target.display(), e);
        Err(WashError::internal(format!("error borrando {}: {}", target.display(), e)))
      }
    }
  }
}
