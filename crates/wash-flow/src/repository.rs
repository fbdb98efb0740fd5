// Archivo: repository.rs
// Propósito: contratos de persistencia del controlador. `WashRepository`
// abre transacciones y ofrece lecturas; `WashTx` es la vista de escritura
// dentro de una transacción; `PhotoStore` guarda los bytes de las fotos.
use chrono::NaiveDate;
use indexmap::IndexSet;
use wash_domain::{Photo, Prot, WashCycle, WashCycleRecord, WashError, WashId};

/// Operaciones disponibles dentro de una transacción.
///
/// Todo lo que se lee aquí es consistente con lo que se escribe: la
/// implementación garantiza que ninguna otra transacción de escritura se
/// intercala (mutex en memoria, `BEGIN IMMEDIATE` en SQLite, `SERIALIZABLE`
/// en Postgres).
pub trait WashTx {
    /// Ciclos en curso en el momento de la transacción.
    fn active_cycles(&mut self) -> Result<Vec<WashCycleRecord>, WashError>;

    /// Mayor id emitido en el día `day`, si hay alguno.
    fn max_id_issued_on(&mut self, day: NaiveDate) -> Result<Option<WashId>, WashError>;

    /// Inserta la cabecera y los Prots iniciales. Debe fallar con
    /// `Conflict(MachineBusy)` si la máquina ya tiene un ciclo en curso.
    fn insert_cycle(&mut self, record: &WashCycleRecord, prots: &IndexSet<Prot>) -> Result<(), WashError>;

    fn load_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError>;

    /// Como `load_record`, pero además reserva la fila de la cabecera hasta
    /// el final de la transacción: dos transacciones que bloquean el mismo
    /// ciclo no pueden confirmar ambas. Donde la transacción ya es exclusiva
    /// basta con leer.
    fn lock_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError> {
        self.load_record(wash_id)
    }

    fn contains_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<bool, WashError>;

    /// Añade un Prot al final del ciclo. La clave compuesta repetida falla
    /// con `Duplicate`.
    fn insert_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<(), WashError>;

    fn count_photos(&mut self, wash_id: WashId) -> Result<u32, WashError>;

    fn insert_photo(&mut self, photo: &Photo) -> Result<(), WashError>;

    /// Persiste el cierre. La actualización sólo aplica si el ciclo sigue
    /// `InProgress`; en otro caso falla con `InvalidState`.
    fn save_finish(&mut self, record: &WashCycleRecord) -> Result<(), WashError>;
}

/// Contrato del almacén de ciclos.
pub trait WashRepository: Send + Sync {
    /// Ejecuta `op` como una unidad atómica: si devuelve `Err` no queda
    /// ningún efecto persistido.
    fn in_transaction<T, F>(&self, op: F) -> Result<T, WashError>
        where F: FnOnce(&mut dyn WashTx) -> Result<T, WashError>;

    /// Ciclo completo con sus Prots (orden de alta) y fotos (por secuencia).
    fn find_cycle(&self, wash_id: WashId) -> Result<Option<WashCycle>, WashError>;

    /// Ciclos en curso, ordenados por id.
    fn list_active(&self) -> Result<Vec<WashCycle>, WashError>;

    fn active_on_machine(&self, machine_id: i16) -> Result<Option<WashCycle>, WashError>;

    fn find_photo(&self, wash_id: WashId, sequence: u32) -> Result<Option<Photo>, WashError>;

    fn list_photos(&self, wash_id: WashId) -> Result<Vec<Photo>, WashError>;
}

/// Almacén de bytes de fotos direccionado por ruta relativa
/// (`{YYYY}/{fileName}`).
pub trait PhotoStore: Send + Sync {
    /// Escribe el contenido completo. Nunca pisa un archivo existente: si la
    /// ruta ya está ocupada devuelve `Conflict(ConcurrentModification)`.
    fn put(&self, relative_path: &str, bytes: &[u8]) -> Result<(), WashError>;

    /// `None` si no existe el archivo.
    fn get(&self, relative_path: &str) -> Result<Option<Vec<u8>>, WashError>;

    /// Borra el archivo. Borrar algo inexistente no es error.
    fn remove(&self, relative_path: &str) -> Result<(), WashError>;
}
