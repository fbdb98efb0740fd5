// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// `InMemoryWashRepository` serializa todas las transacciones con un único
// mutex y trabaja sobre una copia del estado que sólo se publica si la
// operación termina bien. No es durable.
use crate::repository::{PhotoStore, WashRepository, WashTx};
use chrono::NaiveDate;
use indexmap::IndexSet;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use wash_domain::{ConflictReason, DuplicateProt, InvalidState, Photo, Prot, WashCycle, WashCycleRecord, WashError,
                  WashId, WashStatus};

#[derive(Debug, Clone, Default)]
struct WashState {
    cycles: BTreeMap<WashId, WashCycleRecord>,
    prots: HashMap<WashId, IndexSet<Prot>>,
    photos: HashMap<WashId, Vec<Photo>>,
}

impl WashState {
    fn assemble(&self, record: &WashCycleRecord) -> WashCycle {
        let id = record.id();
        let prots = self.prots.get(&id).cloned().unwrap_or_default();
        let photos = self.photos.get(&id).cloned().unwrap_or_default();
        WashCycle::from_rows(record.clone(), prots, photos)
    }
}

pub struct InMemoryWashRepository {
    state: Mutex<WashState>,
}

impl InMemoryWashRepository {
    pub fn new() -> Self {
        Self { state: Mutex::new(WashState::default()) }
    }

    /// Helper para mapear `Mutex::lock()` a `WashError::Internal`.
    fn lock(&self) -> Result<MutexGuard<'_, WashState>, WashError> {
        self.state
            .lock()
            .map_err(|e| WashError::internal(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryWashRepository {
    fn default() -> Self {
        Self::new()
    }
}

struct MemTx<'a> {
    state: &'a mut WashState,
}

impl WashTx for MemTx<'_> {
    fn active_cycles(&mut self) -> Result<Vec<WashCycleRecord>, WashError> {
        Ok(self.state.cycles.values().filter(|c| c.is_in_progress()).cloned().collect())
    }

    fn max_id_issued_on(&mut self, day: NaiveDate) -> Result<Option<WashId>, WashError> {
        let (lo, hi) = WashId::day_bounds(day);
        Ok(self.state
               .cycles
               .keys()
               .filter(|id| (lo..=hi).contains(&id.value()))
               .max()
               .copied())
    }

    fn insert_cycle(&mut self, record: &WashCycleRecord, prots: &IndexSet<Prot>) -> Result<(), WashError> {
        let id = record.id();
        if self.state.cycles.contains_key(&id) {
            return Err(WashError::Conflict(ConflictReason::ConcurrentModification));
        }
        // Equivalente al índice único parcial (machine_id) WHERE status = 'P'
        let busy = self.state
                       .cycles
                       .values()
                       .any(|c| c.is_in_progress() && c.machine_id() == record.machine_id());
        if busy && record.is_in_progress() {
            return Err(WashError::Conflict(ConflictReason::MachineBusy { machine_id: record.machine_id() }));
        }
        self.state.cycles.insert(id, record.clone());
        self.state.prots.insert(id, prots.clone());
        Ok(())
    }

    fn load_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError> {
        Ok(self.state.cycles.get(&wash_id).cloned())
    }

    fn contains_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<bool, WashError> {
        Ok(self.state.prots.get(&wash_id).map(|set| set.contains(prot)).unwrap_or(false))
    }

    fn insert_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<(), WashError> {
        let set = self.state.prots.entry(wash_id).or_default();
        if !set.insert(prot.clone()) {
            return Err(WashError::Duplicate(DuplicateProt { wash_id, prot: prot.clone() }));
        }
        Ok(())
    }

    fn count_photos(&mut self, wash_id: WashId) -> Result<u32, WashError> {
        Ok(self.state.photos.get(&wash_id).map(|v| v.len() as u32).unwrap_or(0))
    }

    fn insert_photo(&mut self, photo: &Photo) -> Result<(), WashError> {
        let list = self.state.photos.entry(photo.wash_id).or_default();
        if list.iter().any(|p| p.sequence == photo.sequence) {
            return Err(WashError::Conflict(ConflictReason::ConcurrentModification));
        }
        list.push(photo.clone());
        Ok(())
    }

    fn save_finish(&mut self, record: &WashCycleRecord) -> Result<(), WashError> {
        let id = record.id();
        match self.state.cycles.get_mut(&id) {
            Some(current) if current.is_in_progress() => {
                *current = record.clone();
                Ok(())
            }
            Some(current) => Err(WashError::InvalidState(InvalidState { wash_id: id, status: current.status() })),
            None => Err(WashError::InvalidState(InvalidState { wash_id: id, status: WashStatus::Finished })),
        }
    }
}

impl WashRepository for InMemoryWashRepository {
    fn in_transaction<T, F>(&self, op: F) -> Result<T, WashError>
        where F: FnOnce(&mut dyn WashTx) -> Result<T, WashError>
    {
        let mut guard = self.lock()?;
        let mut work = (*guard).clone();
        let out = op(&mut MemTx { state: &mut work })?;
        *guard = work;
        Ok(out)
    }

    fn find_cycle(&self, wash_id: WashId) -> Result<Option<WashCycle>, WashError> {
        let state = self.lock()?;
        Ok(state.cycles.get(&wash_id).map(|r| state.assemble(r)))
    }

    fn list_active(&self) -> Result<Vec<WashCycle>, WashError> {
        let state = self.lock()?;
        Ok(state.cycles
                .values()
                .filter(|r| r.is_in_progress())
                .map(|r| state.assemble(r))
                .collect())
    }

    fn active_on_machine(&self, machine_id: i16) -> Result<Option<WashCycle>, WashError> {
        let state = self.lock()?;
        Ok(state.cycles
                .values()
                .find(|r| r.is_in_progress() && r.machine_id() == machine_id)
                .map(|r| state.assemble(r)))
    }

    fn find_photo(&self, wash_id: WashId, sequence: u32) -> Result<Option<Photo>, WashError> {
        let state = self.lock()?;
        Ok(state.photos
                .get(&wash_id)
                .and_then(|v| v.iter().find(|p| p.sequence == sequence))
                .cloned())
    }

    fn list_photos(&self, wash_id: WashId) -> Result<Vec<Photo>, WashError> {
        let state = self.lock()?;
        let mut photos = state.photos.get(&wash_id).cloned().unwrap_or_default();
        photos.sort_by_key(|p| p.sequence);
        Ok(photos)
    }
}

/// Almacén de fotos en memoria indexado por ruta relativa.
#[derive(Debug, Default)]
pub struct InMemoryPhotoStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).contains_key(relative_path)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PhotoStore for InMemoryPhotoStore {
    fn put(&self, relative_path: &str, bytes: &[u8]) -> Result<(), WashError> {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        match files.entry(relative_path.to_string()) {
            Entry::Occupied(_) => Err(WashError::Conflict(ConflictReason::ConcurrentModification)),
            Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(())
            }
        }
    }

    fn get(&self, relative_path: &str) -> Result<Option<Vec<u8>>, WashError> {
        Ok(self.files.lock().unwrap_or_else(|e| e.into_inner()).get(relative_path).cloned())
    }

    fn remove(&self, relative_path: &str) -> Result<(), WashError> {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).remove(relative_path);
        Ok(())
    }
}
