#![allow(dead_code)]
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use wash_domain::{DomainStubs, InMemoryDirectory, Parameters, ProtInput, JPEG_SIGNATURE, PNG_SIGNATURE};
use wash_flow::{Collaborators, FinishWashCommand, FixedClock, InMemoryPhotoStore, InMemoryWashRepository,
                StartWashCommand, WashService};

pub struct Harness {
  pub service: WashService<InMemoryWashRepository, InMemoryPhotoStore>,
  pub repo: Arc<InMemoryWashRepository>,
  pub photos: Arc<InMemoryPhotoStore>,
  pub clock: Arc<FixedClock>,
  pub dir: Arc<InMemoryDirectory>,
}

/// Servicio en memoria con reloj fijo el 2025-08-01 08:00 UTC.
pub fn harness() -> Harness {
  harness_with(Parameters::default())
}

pub fn harness_with(params: Parameters) -> Harness {
  let dir = Arc::new(DomainStubs::sample_directory_with(params));
  let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap()));
  let repo = Arc::new(InMemoryWashRepository::new());
  let photos = Arc::new(InMemoryPhotoStore::new());
  let service = WashService::new(repo.clone(), photos.clone(), collaborators(&dir, &clock));
  Harness { service, repo, photos, clock, dir }
}

pub fn collaborators(dir: &Arc<InMemoryDirectory>, clock: &Arc<FixedClock>) -> Collaborators {
  Collaborators { users: dir.clone(), machines: dir.clone(), parameters: dir.clone(), clock: clock.clone() }
}

pub fn start_cmd(machine_id: i16, user_id: i32, prots: &[(&str, &str, &str)]) -> StartWashCommand {
  StartWashCommand { machine_id,
                     start_user_id: user_id,
                     start_observation: None,
                     prots: prots.iter().map(|(p, b, g)| ProtInput::new(*p, *b, *g)).collect() }
}

pub fn one_prot(machine_id: i16) -> StartWashCommand {
  start_cmd(machine_id, 7, &[("PROT001", "NL01", "01/02")])
}

pub fn finish_cmd(user_id: i32) -> FinishWashCommand {
  FinishWashCommand { end_user_id: user_id, finish_observation: None }
}

pub fn jpeg_bytes() -> Vec<u8> {
  let mut v = JPEG_SIGNATURE.to_vec();
  v.extend_from_slice(&[0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]);
  v
}

pub fn png_bytes() -> Vec<u8> {
  let mut v = PNG_SIGNATURE.to_vec();
  v.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R']);
  v
}
