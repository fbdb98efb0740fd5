use crate::{Machine, Parameters, User, WashError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Directorio de operarios (sólo lectura).
pub trait UserDirectory: Send + Sync {
    fn find_user(&self, user_id: i32) -> Result<Option<User>, WashError>;
}

/// Catálogo de lavadoras configuradas.
pub trait MachineCatalog: Send + Sync {
    fn find_machine(&self, machine_id: i16) -> Result<Option<Machine>, WashError>;

    /// Todas las máquinas ordenadas por id.
    fn list_machines(&self) -> Result<Vec<Machine>, WashError>;
}

/// Fuente de parámetros de operación.
pub trait ParameterStore: Send + Sync {
    fn parameters(&self) -> Result<Parameters, WashError>;
}

/// Implementación en memoria de los tres colaboradores, para tests y
/// desarrollo.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<Mutex<HashMap<i32, User>>>,
    machines: Arc<Mutex<BTreeMap<i16, Machine>>>,
    parameters: Arc<Mutex<Parameters>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(parameters: Parameters) -> Self {
        let dir = Self::default();
        if let Ok(mut p) = dir.parameters.lock() {
            *p = parameters;
        }
        dir
    }

    // Helper para mapear mutex envenenados a WashError
    fn lock_map<'a, T>(&'a self, m: &'a Mutex<T>, name: &str) -> Result<std::sync::MutexGuard<'a, T>, WashError> {
        m.lock()
         .map_err(|e| WashError::internal(format!("Mutex '{}' poisoned: {}", name, e)))
    }

    pub fn add_user(&self, user: User) -> Result<(), WashError> {
        let mut users = self.lock_map(&self.users, "users")?;
        users.insert(user.id, user);
        Ok(())
    }

    pub fn add_machine(&self, machine: Machine) -> Result<(), WashError> {
        let mut machines = self.lock_map(&self.machines, "machines")?;
        machines.insert(machine.id, machine);
        Ok(())
    }

    /// Reemplaza los parámetros vigentes.
    pub fn set_parameters(&self, parameters: Parameters) -> Result<(), WashError> {
        let mut current = self.lock_map(&self.parameters, "parameters")?;
        *current = parameters;
        Ok(())
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_user(&self, user_id: i32) -> Result<Option<User>, WashError> {
        let users = self.lock_map(&self.users, "users")?;
        Ok(users.get(&user_id).cloned())
    }
}

impl MachineCatalog for InMemoryDirectory {
    fn find_machine(&self, machine_id: i16) -> Result<Option<Machine>, WashError> {
        let machines = self.lock_map(&self.machines, "machines")?;
        Ok(machines.get(&machine_id).cloned())
    }

    fn list_machines(&self) -> Result<Vec<Machine>, WashError> {
        let machines = self.lock_map(&self.machines, "machines")?;
        Ok(machines.values().cloned().collect())
    }
}

impl ParameterStore for InMemoryDirectory {
    fn parameters(&self) -> Result<Parameters, WashError> {
        let p = self.lock_map(&self.parameters, "parameters")?;
        Ok(p.clone())
    }
}
