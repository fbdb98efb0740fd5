// Pruebas contra SQLite en archivo temporal; con la feature `pg` no aplican.
#![cfg(not(feature = "pg"))]

use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;
use uuid::Uuid;
use wash_domain::{parameter_keys, Machine, MachineCatalog, ParameterStore, ProtInput, User, UserDirectory, WashError,
                  WashId, JPEG_SIGNATURE};
use wash_flow::{Collaborators, FinishWashCommand, FixedClock, StartWashCommand, WashRepository, WashService};
use wash_persistence::{DieselWashRepository, FsPhotoStore};

struct Fixture {
  service: WashService<DieselWashRepository, FsPhotoStore>,
  repo: Arc<DieselWashRepository>,
  clock: Arc<FixedClock>,
  db_path: PathBuf,
  photo_root: PathBuf,
}

impl Drop for Fixture {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.db_path);
    let _ = std::fs::remove_file(self.db_path.with_extension("db-wal"));
    let _ = std::fs::remove_file(self.db_path.with_extension("db-shm"));
    let _ = std::fs::remove_dir_all(&self.photo_root);
  }
}

fn fixture() -> Fixture {
  let tag = Uuid::new_v4();
  let db_path = std::env::temp_dir().join(format!("controlmat_test_{}.db", tag));
  let photo_root = std::env::temp_dir().join(format!("controlmat_photos_{}", tag));
  let repo = Arc::new(DieselWashRepository::new(db_path.to_str().unwrap()).expect("failed to create repo"));
  for user in [User::new(3, "amartin"), User::new(7, "lgarcia"), User::new(9, "psanchez"), User::new(5, "jlopez").inactive()] {
    repo.register_user(&user).expect("register user");
  }
  let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap()));
  let ctx = Collaborators { users: repo.clone(), machines: repo.clone(), parameters: repo.clone(), clock: clock.clone() };
  let service = WashService::new(repo.clone(), Arc::new(FsPhotoStore::new(&photo_root)), ctx);
  Fixture { service, repo, clock, db_path, photo_root }
}

fn start(machine_id: i16, user_id: i32) -> StartWashCommand {
  StartWashCommand { machine_id,
                     start_user_id: user_id,
                     start_observation: Some("turno mañana".into()),
                     prots: vec![ProtInput::new("PROT001", "NL01", "01/02"), ProtInput::new("PROT002", "NL01", "02/02")] }
}

fn finish(user_id: i32) -> FinishWashCommand {
  FinishWashCommand { end_user_id: user_id, finish_observation: None }
}

fn jpeg() -> Vec<u8> {
  let mut v = JPEG_SIGNATURE.to_vec();
  v.extend_from_slice(b"\xE0\x00\x10JFIF\x00");
  v
}

#[test]
fn migrations_seed_machines_and_parameters() {
  let f = fixture();
  let machines = f.repo.list_machines().expect("list machines");
  assert_eq!(machines.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
  assert_eq!(f.repo.find_machine(2).unwrap(), Some(Machine::new(2, "Lavadora 2")));
  assert_eq!(f.repo.find_machine(40).unwrap(), None);

  let params = f.repo.parameters().expect("parameters");
  assert_eq!(params.max_active_washes, 2);
  assert_eq!(params.max_photos_per_wash, 99);
  assert_eq!(params.supported_file_types, vec!["jpg".to_string(), "png".to_string()]);

  f.repo.set_parameter(parameter_keys::MAX_ACTIVE_WASHES, "3").unwrap();
  assert_eq!(f.repo.parameters().unwrap().max_active_washes, 3);

  f.repo.register_machine(&Machine::new(4, "Lavadora 4 (túnel)")).unwrap();
  f.repo.register_machine(&Machine::new(5, "Lavadora 5")).unwrap();
  assert_eq!(f.repo.find_machine(4).unwrap(), Some(Machine::new(4, "Lavadora 4 (túnel)")));
  assert_eq!(f.repo.list_machines().unwrap().len(), 5);

  let user = f.repo.find_user(5).unwrap().expect("user 5");
  assert!(!user.active);
  assert_eq!(f.repo.find_user(99).unwrap(), None);
}

#[test]
fn full_lifecycle_persists_and_reloads() {
  let f = fixture();
  let started = f.service.start(start(1, 7)).expect("start");
  assert_eq!(started.wash_id.value(), 25_080_101);
  assert_eq!(started.machine_name.as_deref(), Some("Lavadora 1"));
  assert_eq!(started.status, "P");

  f.service.add_prot(25_080_101, ProtInput::new("PROT003", "NL02", "01/01")).expect("add prot");
  let dup = f.service.add_prot(25_080_101, ProtInput::new("PROT001", "NL01", "01/02")).unwrap_err();
  assert!(matches!(dup, WashError::Duplicate(_)));

  let photo = f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", Some("carga")).expect("upload");
  assert_eq!(photo.file_name, "25080101_01.jpg");
  assert_eq!(photo.file_path, "2025/25080101_01.jpg");
  assert!(f.photo_root.join("2025").join("25080101_01.jpg").exists());

  f.clock.advance(Duration::minutes(45));
  let done = f.service.finish(25_080_101, finish(9)).expect("finish");
  assert_eq!(done.status, "F");
  assert_eq!(done.end_user_name.as_deref(), Some("psanchez"));
  assert_eq!(done.ended_at, Some(Utc.with_ymd_and_hms(2025, 8, 1, 8, 45, 0).unwrap()));

  // Recarga completa desde la BD
  let cycle = f.repo.find_cycle(WashId::parse(25_080_101).unwrap()).unwrap().expect("cycle");
  let prot_ids: Vec<&str> = cycle.prots().iter().map(|p| p.prot_id()).collect();
  assert_eq!(prot_ids, vec!["PROT001", "PROT002", "PROT003"]);
  assert_eq!(cycle.photos().len(), 1);
  assert_eq!(cycle.record().start_observation(), Some("turno mañana"));

  let download = f.service.download_photo(25_080_101, 1).expect("download");
  assert_eq!(download.bytes, jpeg());
  assert_eq!(download.content_type, "image/jpeg");

  // Un ciclo finalizado no acepta más cambios
  assert_eq!(f.service.finish(25_080_101, finish(9)).unwrap_err().code(), "invalid_state");
  assert_eq!(f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", None).unwrap_err().code(),
             "invalid_state");
  assert!(f.service.get_active().unwrap().is_empty());
}

#[test]
fn busy_machine_and_capacity_are_enforced() {
  let f = fixture();
  f.service.start(start(1, 7)).expect("first start");
  assert_eq!(f.service.start(start(1, 3)).unwrap_err().code(), "machine_busy");
  f.service.start(start(2, 3)).expect("second start");
  assert_eq!(f.service.start(start(3, 9)).unwrap_err().code(), "global_capacity_exceeded");

  let machines = f.service.list_machines().unwrap();
  let free: Vec<i16> = machines.iter().filter(|m| m.is_available).map(|m| m.id).collect();
  assert_eq!(free, vec![3, 4]);
  let on_two = f.service.get_active_by_machine(2).unwrap().expect("active on 2");
  assert_eq!(on_two.wash_id.value(), 25_080_102);
  assert!(f.service.get_active_by_machine(4).unwrap().is_none());
}

#[test]
fn unique_index_rejects_second_active_cycle_on_machine() {
  let f = fixture();
  f.service.start(start(4, 7)).unwrap();
  // Saltándose la compuerta de capacidad, el índice parcial sigue protegiendo
  let record = wash_domain::WashCycleRecord::open(WashId::parse(25_080_150).unwrap(),
                                                  4,
                                                  3,
                                                  None,
                                                  Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap());
  let prots: indexmap::IndexSet<_> = [wash_domain::Prot::new("PROT009", "NL09", "01/01").unwrap()].into_iter().collect();
  let err = f.repo.in_transaction(|tx| tx.insert_cycle(&record, &prots)).unwrap_err();
  assert_eq!(err.code(), "machine_busy");
  assert!(f.repo.find_cycle(WashId::parse(25_080_150).unwrap()).unwrap().is_none());
}

#[test]
fn failed_transaction_rolls_back() {
  let f = fixture();
  f.service.start(start(1, 7)).unwrap();
  let id = WashId::parse(25_080_101).unwrap();
  let prot = wash_domain::Prot::new("PROT050", "NL05", "05/05").unwrap();
  let err = f.repo
             .in_transaction(|tx| {
               tx.insert_prot(id, &prot)?;
               Err::<(), _>(WashError::internal("abort"))
             })
             .unwrap_err();
  assert_eq!(err.code(), "internal");
  let cycle = f.repo.find_cycle(id).unwrap().unwrap();
  assert!(!cycle.contains_prot(&prot));
}

#[test]
fn ids_continue_after_finished_cycles_and_reset_next_day() {
  let f = fixture();
  f.service.start(start(1, 7)).unwrap();
  f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", None).unwrap();
  f.service.finish(25_080_101, finish(7)).unwrap();
  assert_eq!(f.service.start(start(1, 7)).unwrap().wash_id.value(), 25_080_102);

  f.clock.set(Utc.with_ymd_and_hms(2025, 8, 2, 6, 0, 0).unwrap());
  assert_eq!(f.service.start(start(2, 7)).unwrap().wash_id.value(), 25_080_201);
}

#[test]
fn inactive_and_unknown_operators_are_rejected() {
  let f = fixture();
  assert_eq!(f.service.start(start(1, 5)).unwrap_err().code(), "inactive_user");
  assert_eq!(f.service.start(start(1, 42)).unwrap_err().code(), "start_user_not_found");
  assert_eq!(f.service.start(start(9, 7)).unwrap_err().code(), "machine_not_found");
}

#[test]
fn concurrent_starts_on_sqlite_admit_one_per_machine() {
  let f = fixture();
  let barrier = Barrier::new(4);
  let results: Vec<Result<i64, WashError>> = thread::scope(|s| {
    let handles: Vec<_> = [(1, 3), (1, 7), (1, 9), (2, 7)].into_iter()
                                                          .map(|(machine, user)| {
                                                            let barrier = &barrier;
                                                            let service = &f.service;
                                                            s.spawn(move || {
                                                              barrier.wait();
                                                              service.start(start(machine, user))
                                                                     .map(|v| v.wash_id.value())
                                                            })
                                                          })
                                                          .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  let ids: BTreeSet<i64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
  assert_eq!(ids, BTreeSet::from([25_080_101, 25_080_102]));
  let rejected: Vec<&str> = results.iter().filter_map(|r| r.as_ref().err()).map(|e| e.code()).collect();
  assert_eq!(rejected.len(), 2);
  assert!(rejected.iter().all(|c| *c == "machine_busy"), "unexpected errors: {:?}", rejected);
  assert!(f.service.get_active_by_machine(1).unwrap().is_some());
  assert!(f.service.get_active_by_machine(2).unwrap().is_some());
}

#[test]
fn photos_zip_reads_files_from_disk() {
  let f = fixture();
  f.service.start(start(1, 7)).unwrap();
  assert_eq!(f.service.download_photos_zip(25_080_101).unwrap_err().code(), "no_photos_for_wash");
  f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", None).unwrap();
  f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", Some("descarga")).unwrap();

  let archive = f.service.download_photos_zip(25_080_101).expect("zip");
  assert_eq!(archive.photo_count, 2);
  let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
  let mut names = Vec::new();
  for i in 0..zip.len() {
    let mut entry = zip.by_index(i).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, jpeg());
    names.push(entry.name().to_string());
  }
  assert_eq!(names, vec!["25080101_01.jpg", "25080101_02.jpg"]);

  std::fs::remove_file(f.photo_root.join("2025").join("25080101_02.jpg")).unwrap();
  assert_eq!(f.service.download_photos_zip(25_080_101).unwrap_err().code(), "photo_file_not_found");
}

#[test]
fn concurrent_uploads_on_sqlite_respect_photo_limit() {
  let f = fixture();
  f.repo.set_parameter(parameter_keys::MAX_PHOTOS_PER_WASH, "3").unwrap();
  f.service.start(start(1, 7)).unwrap();
  for _ in 0..2 {
    f.service.upload_photo(25_080_101, &jpeg(), "image/jpeg", None).unwrap();
  }

  let barrier = Barrier::new(2);
  let results: Vec<Result<String, WashError>> = thread::scope(|s| {
    let handles: Vec<_> = (0..2).map(|_| {
                                  let barrier = &barrier;
                                  let service = &f.service;
                                  s.spawn(move || {
                                     barrier.wait();
                                     service.upload_photo(25_080_101, &jpeg(), "image/jpeg", None).map(|p| p.file_name)
                                   })
                                })
                                .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  let ok: Vec<&str> = results.iter().filter_map(|r| r.as_ref().ok()).map(String::as_str).collect();
  assert_eq!(ok, vec!["25080101_03.jpg"]);
  let rejected: Vec<&str> = results.iter().filter_map(|r| r.as_ref().err()).map(|e| e.code()).collect();
  assert_eq!(rejected, vec!["photo_limit_exceeded"]);
  assert_eq!(std::fs::read_dir(f.photo_root.join("2025")).unwrap().count(), 3);
  assert_eq!(f.service.list_photos(25_080_101).unwrap().len(), 3);
}
