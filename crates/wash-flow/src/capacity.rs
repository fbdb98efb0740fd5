// Archivo: capacity.rs
// Propósito: decidir si un inicio de lavado se admite según la ocupación
// actual. No hay cola: lo que no cabe se rechaza.
use wash_domain::{ConflictReason, WashCycleRecord, WashError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject(ConflictReason),
}

/// Límite de ciclos simultáneos más la regla de una máquina, un ciclo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGuard {
    max_active: u32,
}

impl CapacityGuard {
    pub fn new(max_active: u32) -> Self {
        Self { max_active }
    }

    /// Evalúa la admisión sobre la lista de ciclos en curso. La máquina
    /// ocupada se comprueba antes que el cupo global.
    pub fn can_start(&self, machine_id: i16, active: &[WashCycleRecord]) -> Admission {
        let in_progress: Vec<&WashCycleRecord> = active.iter().filter(|c| c.is_in_progress()).collect();
        if in_progress.iter().any(|c| c.machine_id() == machine_id) {
            return Admission::Reject(ConflictReason::MachineBusy { machine_id });
        }
        if in_progress.len() as u64 >= self.max_active as u64 {
            return Admission::Reject(ConflictReason::GlobalCapacityExceeded { max_active: self.max_active });
        }
        Admission::Admit
    }

    pub fn admit(&self, machine_id: i16, active: &[WashCycleRecord]) -> Result<(), WashError> {
        match self.can_start(machine_id, active) {
            Admission::Admit => Ok(()),
            Admission::Reject(reason) => Err(WashError::Conflict(reason)),
        }
    }
}
