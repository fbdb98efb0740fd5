mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::*;
use indexmap::IndexSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wash_domain::{DomainStubs, Photo, Prot, WashCycle, WashCycleRecord, WashError, WashId};
use wash_flow::{FixedClock, InMemoryPhotoStore, InMemoryWashRepository, PhotoStore, WashRepository, WashService,
                WashTx};

/// Almacén de fotos que rechaza toda escritura.
struct FullDisk;

impl PhotoStore for FullDisk {
  fn put(&self, relative_path: &str, _bytes: &[u8]) -> Result<(), WashError> {
    Err(WashError::internal(format!("no space left writing {}", relative_path)))
  }

  fn get(&self, _relative_path: &str) -> Result<Option<Vec<u8>>, WashError> {
    Ok(None)
  }

  fn remove(&self, _relative_path: &str) -> Result<(), WashError> {
    Ok(())
  }
}

/// Repositorio que delega en memoria con dos fallos inyectables: rechazar
/// la fila de la foto después de escribir el archivo, o devolver un conteo
/// de fotos atrasado en uno, como lo vería una transacción concurrente que
/// leyó antes de que otra confirmara.
struct FaultyRows {
  inner: InMemoryWashRepository,
  reject_photo_rows: bool,
  stale_count: AtomicBool,
}

impl FaultyRows {
  fn rejecting_photo_rows() -> Self {
    FaultyRows { inner: InMemoryWashRepository::new(), reject_photo_rows: true, stale_count: AtomicBool::new(false) }
  }

  fn with_stale_count() -> Self {
    FaultyRows { inner: InMemoryWashRepository::new(), reject_photo_rows: false, stale_count: AtomicBool::new(false) }
  }
}

struct FaultyTx<'a> {
  inner: &'a mut dyn WashTx,
  reject_photo_rows: bool,
  stale_count: bool,
}

impl WashTx for FaultyTx<'_> {
  fn active_cycles(&mut self) -> Result<Vec<WashCycleRecord>, WashError> {
    self.inner.active_cycles()
  }

  fn max_id_issued_on(&mut self, day: NaiveDate) -> Result<Option<WashId>, WashError> {
    self.inner.max_id_issued_on(day)
  }

  fn insert_cycle(&mut self, record: &WashCycleRecord, prots: &IndexSet<Prot>) -> Result<(), WashError> {
    self.inner.insert_cycle(record, prots)
  }

  fn load_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError> {
    self.inner.load_record(wash_id)
  }

  fn contains_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<bool, WashError> {
    self.inner.contains_prot(wash_id, prot)
  }

  fn insert_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<(), WashError> {
    self.inner.insert_prot(wash_id, prot)
  }

  fn count_photos(&mut self, wash_id: WashId) -> Result<u32, WashError> {
    let n = self.inner.count_photos(wash_id)?;
    Ok(if self.stale_count { n.saturating_sub(1) } else { n })
  }

  fn insert_photo(&mut self, photo: &Photo) -> Result<(), WashError> {
    if self.reject_photo_rows {
      return Err(WashError::internal("photos table unavailable"));
    }
    self.inner.insert_photo(photo)
  }

  fn save_finish(&mut self, record: &WashCycleRecord) -> Result<(), WashError> {
    self.inner.save_finish(record)
  }
}

impl WashRepository for FaultyRows {
  fn in_transaction<T, F>(&self, op: F) -> Result<T, WashError>
    where F: FnOnce(&mut dyn WashTx) -> Result<T, WashError>
  {
    let stale_count = self.stale_count.load(Ordering::SeqCst);
    self.inner.in_transaction(|tx| {
                op(&mut FaultyTx { inner: tx, reject_photo_rows: self.reject_photo_rows, stale_count })
              })
  }

  fn find_cycle(&self, wash_id: WashId) -> Result<Option<WashCycle>, WashError> {
    self.inner.find_cycle(wash_id)
  }

  fn list_active(&self) -> Result<Vec<WashCycle>, WashError> {
    self.inner.list_active()
  }

  fn active_on_machine(&self, machine_id: i16) -> Result<Option<WashCycle>, WashError> {
    self.inner.active_on_machine(machine_id)
  }

  fn find_photo(&self, wash_id: WashId, sequence: u32) -> Result<Option<Photo>, WashError> {
    self.inner.find_photo(wash_id, sequence)
  }

  fn list_photos(&self, wash_id: WashId) -> Result<Vec<Photo>, WashError> {
    self.inner.list_photos(wash_id)
  }
}

fn fixed_clock() -> Arc<FixedClock> {
  Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap()))
}

#[test]
fn failed_file_write_leaves_no_photo_record() {
  let dir = Arc::new(DomainStubs::sample_directory());
  let clock = fixed_clock();
  let repo = Arc::new(InMemoryWashRepository::new());
  let service = WashService::new(repo.clone(), Arc::new(FullDisk), collaborators(&dir, &clock));

  service.start(one_prot(1)).unwrap();
  let err = service.upload_photo(25_080_101, &jpeg_bytes(), "image/jpeg", None).unwrap_err();
  assert_eq!(err.code(), "internal");
  assert!(repo.list_photos(WashId::parse(25_080_101).unwrap()).unwrap().is_empty());
  assert_eq!(service.finish(25_080_101, finish_cmd(9)).unwrap_err().code(), "no_photos");
}

#[test]
fn failed_photo_row_removes_the_written_file() {
  let dir = Arc::new(DomainStubs::sample_directory());
  let clock = fixed_clock();
  let repo = Arc::new(FaultyRows::rejecting_photo_rows());
  let photos = Arc::new(InMemoryPhotoStore::new());
  let service = WashService::new(repo.clone(), photos.clone(), collaborators(&dir, &clock));

  service.start(one_prot(1)).unwrap();
  let err = service.upload_photo(25_080_101, &jpeg_bytes(), "image/jpeg", None).unwrap_err();
  assert_eq!(err.code(), "internal");
  assert!(photos.is_empty());
  assert!(service.list_photos(25_080_101).unwrap().is_empty());
}

#[test]
fn losing_upload_keeps_the_committed_photo_file() {
  let dir = Arc::new(DomainStubs::sample_directory());
  let clock = fixed_clock();
  let repo = Arc::new(FaultyRows::with_stale_count());
  let photos = Arc::new(InMemoryPhotoStore::new());
  let service = WashService::new(repo.clone(), photos.clone(), collaborators(&dir, &clock));

  service.start(one_prot(1)).unwrap();
  let first = jpeg_bytes();
  service.upload_photo(25_080_101, &first, "image/jpeg", Some("primera")).unwrap();

  // La segunda subida calcula la misma secuencia que la ya confirmada
  repo.stale_count.store(true, Ordering::SeqCst);
  let mut second = jpeg_bytes();
  second.extend_from_slice(b"otra");
  let err = service.upload_photo(25_080_101, &second, "image/jpeg", Some("segunda")).unwrap_err();
  assert_eq!(err.code(), "concurrent_modification");

  let names: Vec<String> = service.list_photos(25_080_101).unwrap().into_iter().map(|p| p.file_name).collect();
  assert_eq!(names, vec!["25080101_01.jpg".to_string()]);
  assert!(photos.contains("2025/25080101_01.jpg"));
  assert_eq!(photos.len(), 1);
  assert_eq!(service.download_photo(25_080_101, 1).unwrap().bytes, first);
}

#[test]
fn rejected_start_leaves_no_trace() {
  let h = harness();
  h.service.start(one_prot(1)).unwrap();
  assert!(h.service.start(one_prot(1)).is_err());
  // El id 02 no se consumió: el siguiente inicio válido lo recibe
  assert_eq!(h.service.start(one_prot(2)).unwrap().wash_id.value(), 25_080_102);
}
