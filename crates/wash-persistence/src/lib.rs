//! Persistencia Diesel de los ciclos de lavado y almacén de fotos en disco.
//! `DieselWashRepository` implementa `WashRepository` de `wash-flow` y los
//! colaboradores de sólo lectura del dominio (operarios, máquinas y
//! parámetros). SQLite por defecto; Postgres con la feature `pg`.

mod photo_store;
pub mod schema;
mod wash_persistence;

pub use photo_store::FsPhotoStore;
pub use wash_persistence::{new_from_env, DieselWashRepository, MIGRATIONS};
