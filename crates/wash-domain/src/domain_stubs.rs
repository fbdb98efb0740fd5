use crate::domain_repository::InMemoryDirectory;
use crate::{Machine, Parameters, User};

pub struct DomainStubs;

impl DomainStubs {
    /// Directorio en memoria con las cuatro lavadoras de planta, tres
    /// operarios activos (3, 7, 9) y uno dado de baja (5).
    pub fn sample_directory() -> InMemoryDirectory {
        Self::sample_directory_with(Parameters::default())
    }

    pub fn sample_directory_with(parameters: Parameters) -> InMemoryDirectory {
        let dir = InMemoryDirectory::with_parameters(parameters);
        for id in 1..=4i16 {
            let _ = dir.add_machine(Machine::new(id, format!("Lavadora {}", id)));
        }
        let _ = dir.add_user(User::new(3, "amartin"));
        let _ = dir.add_user(User::new(7, "lgarcia"));
        let _ = dir.add_user(User::new(9, "psanchez"));
        // Operario dado de baja: puede aparecer como usuario de cierre
        // histórico pero no puede iniciar ciclos.
        let _ = dir.add_user(User::new(5, "jlopez").inactive());
        dir
    }
}
