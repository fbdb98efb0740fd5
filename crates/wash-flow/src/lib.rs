//! Crate `wash-flow`: orquestación del ciclo de lavado
//!
//! Define el contrato transaccional de persistencia (`WashRepository` /
//! `WashTx`), el almacén de fotos (`PhotoStore`), la compuerta de capacidad
//! (`CapacityGuard`), la compuerta de evidencias (`EvidenceGate`) y el
//! servicio `WashService`, única capa que modifica el estado. Incluye
//! implementaciones en memoria para pruebas (`InMemoryWashRepository`,
//! `InMemoryPhotoStore`).
//!
//! Concurrencia:
//! - Cada operación que modifica estado es una transacción. La comprobación
//!   de admisión y la inserción ocurren dentro de la misma.
//! - Las restricciones del almacén (índice único por máquina en curso,
//!   claves primarias) actúan como segunda barrera.
//! - Las operaciones sobre un ciclo existente lo abren con
//!   `WashTx::lock_record`; `PhotoStore::put` nunca pisa un archivo.
//!
//! Ejemplo rápido:
//! ```rust
//! use std::sync::Arc;
//! use wash_domain::DomainStubs;
//! use wash_flow::{Collaborators, InMemoryPhotoStore, InMemoryWashRepository, SystemClock, WashService};
//! let dir = Arc::new(DomainStubs::sample_directory());
//! let ctx = Collaborators { users: dir.clone(), machines: dir.clone(), parameters: dir, clock: Arc::new(SystemClock) };
//! let service = WashService::new(Arc::new(InMemoryWashRepository::new()), Arc::new(InMemoryPhotoStore::new()), ctx);
//! assert!(service.get_active().unwrap().is_empty());
//! ```
pub mod capacity;
pub mod clock;
pub mod dto;
pub mod evidence;
pub mod repository;
pub mod service;
pub mod stubs;

pub use capacity::*;
pub use clock::*;
pub use dto::*;
pub use evidence::*;
pub use repository::*;
pub use service::*;
pub use stubs::*;
