mod domain_repository;
mod domain_stubs;
mod errors;
mod locale;
mod machine;
mod parameters;
mod photo;
mod prot;
pub mod validation;
mod wash_cycle;
mod wash_id;

pub use domain_repository::{InMemoryDirectory, MachineCatalog, ParameterStore, UserDirectory};
pub use domain_stubs::DomainStubs;
pub use errors::{ConflictReason, DuplicateProt, ErrorKind, Exhausted, InvalidState, NotFound, Precondition,
                 ValidationError, ValidationReason, WashError};
pub use locale::Locale;
pub use machine::{Machine, User};
pub use parameters::Parameters;
// Nombres de las claves de la tabla `parameters`
pub mod parameter_keys {
    pub use crate::parameters::{IMAGE_PATH, MAX_ACTIVE_WASHES, MAX_PHOTOS_PER_WASH, MAX_PHOTO_SIZE_BYTES,
                                MINIMUM_WASH_DURATION_SECONDS, REQUIRE_DISTINCT_END_USER, SUPPORTED_FILE_TYPES};
}
pub use photo::{checksum, photo_file_name, photo_relative_path, ImageKind, Photo, JPEG_SIGNATURE, PNG_SIGNATURE};
pub use prot::{Prot, ProtInput};
pub use wash_cycle::{FinishRules, RecordParts, WashCycle, WashCycleRecord, WashStatus};
pub use wash_id::{WashId, MAX_DAILY_SEQUENCE};
