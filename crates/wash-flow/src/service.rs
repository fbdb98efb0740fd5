// Archivo: service.rs
// Propósito: `WashService`, el orquestador del ciclo de lavado. Es la única
// capa que toca persistencia: valida la entrada, abre la transacción,
// consulta la compuerta de capacidad o de evidencias y aplica la transición.
// Pensado para invocarse desde handlers HTTP o desde la CLI.
use crate::capacity::CapacityGuard;
use crate::clock::Clock;
use crate::dto::{FinishWashCommand, MachineView, PhotoArchive, PhotoDownload, PhotoView, ProtView, StartWashCommand,
                 WashCycleView};
use crate::evidence::EvidenceGate;
use crate::repository::{PhotoStore, WashRepository};
use log::{error, info, warn};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Arc;
use wash_domain::validation::{require_active_start_user, require_end_user, require_known_machine,
                              validate_description, validate_machine_id, validate_observation, validate_prot_batch,
                              validate_user_id};
use wash_domain::{ErrorKind, Locale, MachineCatalog, NotFound, ParameterStore, Photo, ProtInput, UserDirectory,
                  ValidationReason, WashCycle, WashError, WashId};

/// Colaboradores de sólo lectura que el servicio consulta.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub machines: Arc<dyn MachineCatalog>,
    pub parameters: Arc<dyn ParameterStore>,
    pub clock: Arc<dyn Clock>,
}

pub struct WashService<R, S>
    where R: WashRepository,
          S: PhotoStore
{
    repo: Arc<R>,
    photos: Arc<S>,
    ctx: Collaborators,
    /// Idioma de las descripciones de estado en las vistas.
    locale: Locale,
}

impl<R, S> WashService<R, S>
    where R: WashRepository,
          S: PhotoStore
{
    pub fn new(repo: Arc<R>, photos: Arc<S>, ctx: Collaborators) -> Self {
        Self { repo, photos, ctx, locale: Locale::default() }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Inicia un ciclo en `machine_id` con sus Prots iniciales.
    ///
    /// Orden de fallos: formato de entrada, máquina/usuario, máquina
    /// ocupada, cupo global y por último ids del día agotados.
    pub fn start(&self, cmd: StartWashCommand) -> Result<WashCycleView, WashError> {
        let machine_id = validate_machine_id(cmd.machine_id)?;
        let user_id = validate_user_id(cmd.start_user_id)?;
        let observation = validate_observation(cmd.start_observation.as_deref(),
                                               ValidationReason::StartObservationTooLong)?;
        let prots = validate_prot_batch(&cmd.prots)?;

        require_known_machine(machine_id, self.ctx.machines.find_machine(machine_id)?)?;
        require_active_start_user(user_id, self.ctx.users.find_user(user_id)?)?;

        let params = self.ctx.parameters.parameters()?;
        let guard = CapacityGuard::new(params.max_active_washes);
        let now = self.ctx.clock.now();
        let today = now.date_naive();

        let result = self.repo.in_transaction(|tx| {
                                  let active = tx.active_cycles()?;
                                  guard.admit(machine_id, &active)?;
                                  let max = tx.max_id_issued_on(today)?;
                                  let id = WashId::next(today, max)?;
                                  let cycle = WashCycle::start(id, machine_id, user_id, observation, prots, now)?;
                                  tx.insert_cycle(cycle.record(), cycle.prots())?;
                                  Ok(cycle)
                              });
        let cycle = self.log_outcome("start", result)?;
        info!("Lavado {} iniciado en máquina {} por usuario {} ({} prots)",
              cycle.id(),
              machine_id,
              user_id,
              cycle.prots().len());
        self.view(&cycle)
    }

    /// Añade un Prot a un ciclo en curso.
    pub fn add_prot(&self, wash_id: i64, input: ProtInput) -> Result<ProtView, WashError> {
        let id = WashId::parse(wash_id)?;
        let prot = input.validate()?;
        let params = self.ctx.parameters.parameters()?;
        let gate = EvidenceGate::from_parameters(&params);

        let result = self.repo.in_transaction(|tx| {
                                  let record =
                                      tx.lock_record(id)?.ok_or(WashError::NotFound(NotFound::WashCycle(id)))?;
                                  record.ensure_in_progress()?;
                                  let present = tx.contains_prot(id, &prot)?;
                                  gate.admit_prot(id, &prot, present)?;
                                  tx.insert_prot(id, &prot)
                              });
        self.log_outcome("add_prot", result)?;
        info!("Prot {} añadido al lavado {}", prot, id);
        Ok(ProtView::from(&prot))
    }

    /// Sube una foto de evidencia. El archivo se escribe dentro de la
    /// transacción y se borra si ésta no confirma, de modo que nunca queda
    /// registro sin archivo ni archivo sin registro.
    pub fn upload_photo(&self,
                        wash_id: i64,
                        bytes: &[u8],
                        content_type: &str,
                        description: Option<&str>)
                        -> Result<PhotoView, WashError> {
        let id = WashId::parse(wash_id)?;
        let description = validate_description(description)?;
        let params = self.ctx.parameters.parameters()?;
        let gate = EvidenceGate::from_parameters(&params);
        let kind = gate.inspect_upload(bytes, content_type)?;
        let now = self.ctx.clock.now();

        let mut written: Option<String> = None;
        let result = self.repo.in_transaction(|tx| {
                                  let record =
                                      tx.lock_record(id)?.ok_or(WashError::NotFound(NotFound::WashCycle(id)))?;
                                  record.ensure_in_progress()?;
                                  let count = tx.count_photos(id)?;
                                  let slot = gate.admit_photo(id, count, kind)?;
                                  let photo = Photo::new(id, slot.sequence, kind, bytes, description, now);
                                  self.photos.put(&slot.relative_path, bytes)?;
                                  written = Some(slot.relative_path);
                                  tx.insert_photo(&photo)?;
                                  Ok(photo)
                              });
        if result.is_err() {
            if let Some(path) = written.as_deref() {
                if let Err(e) = self.photos.remove(path) {
                    error!("No se pudo borrar la foto huérfana {}: {}", path, e);
                }
            }
        }
        let photo = self.log_outcome("upload_photo", result)?;
        info!("Foto {} registrada para el lavado {} ({} bytes)", photo.file_name, id, photo.size_bytes);
        Ok(PhotoView::from(&photo))
    }

    /// Finaliza un ciclo. Exige al menos una foto y un operario de cierre
    /// registrado; aplica además las reglas opcionales de `FinishRules`.
    pub fn finish(&self, wash_id: i64, cmd: FinishWashCommand) -> Result<WashCycleView, WashError> {
        let id = WashId::parse(wash_id)?;
        let end_user_id = validate_user_id(cmd.end_user_id)?;
        let observation = validate_observation(cmd.finish_observation.as_deref(),
                                               ValidationReason::FinishObservationTooLong)?;
        let end_user = self.ctx.users.find_user(end_user_id)?;
        let rules = self.ctx.parameters.parameters()?.finish_rules;
        let now = self.ctx.clock.now();

        let result = self.repo.in_transaction(|tx| {
                                  let mut record =
                                      tx.lock_record(id)?.ok_or(WashError::NotFound(NotFound::WashCycle(id)))?;
                                  record.ensure_in_progress()?;
                                  require_end_user(end_user_id, end_user)?;
                                  let photo_count = tx.count_photos(id)?;
                                  record.finish(end_user_id, observation, photo_count, now, &rules)?;
                                  tx.save_finish(&record)?;
                                  Ok(record)
                              });
        let record = self.log_outcome("finish", result)?;
        info!("Lavado {} finalizado en máquina {} por usuario {}",
              id,
              record.machine_id(),
              end_user_id);
        self.get_cycle(id)
    }

    /// Ciclos en curso, ordenados por id.
    pub fn get_active(&self) -> Result<Vec<WashCycleView>, WashError> {
        let cycles = self.repo.list_active()?;
        cycles.iter().map(|c| self.view(c)).collect()
    }

    pub fn get_by_id(&self, wash_id: i64) -> Result<WashCycleView, WashError> {
        let id = WashId::parse(wash_id)?;
        self.get_cycle(id)
    }

    /// Ciclo en curso de una máquina, si lo hay.
    pub fn get_active_by_machine(&self, machine_id: i16) -> Result<Option<WashCycleView>, WashError> {
        let machine_id = validate_machine_id(machine_id)?;
        require_known_machine(machine_id, self.ctx.machines.find_machine(machine_id)?)?;
        match self.repo.active_on_machine(machine_id)? {
            Some(cycle) => Ok(Some(self.view(&cycle)?)),
            None => Ok(None),
        }
    }

    /// Catálogo de máquinas con su disponibilidad derivada de los ciclos en
    /// curso.
    pub fn list_machines(&self) -> Result<Vec<MachineView>, WashError> {
        let busy: HashMap<i16, WashId> =
            self.repo.list_active()?.iter().map(|c| (c.record().machine_id(), c.id())).collect();
        let machines = self.ctx.machines.list_machines()?;
        Ok(machines.into_iter()
                   .map(|m| MachineView { id: m.id,
                                          is_available: !busy.contains_key(&m.id),
                                          active_wash_id: busy.get(&m.id).copied(),
                                          name: m.name })
                   .collect())
    }

    pub fn list_photos(&self, wash_id: i64) -> Result<Vec<PhotoView>, WashError> {
        let id = WashId::parse(wash_id)?;
        if self.repo.find_cycle(id)?.is_none() {
            return Err(WashError::NotFound(NotFound::WashCycle(id)));
        }
        Ok(self.repo.list_photos(id)?.iter().map(PhotoView::from).collect())
    }

    /// Devuelve el contenido de la foto `sequence`. Falla con `NotFound` si
    /// falta el registro o el archivo.
    pub fn download_photo(&self, wash_id: i64, sequence: u32) -> Result<PhotoDownload, WashError> {
        let id = WashId::parse(wash_id)?;
        let photo = self.repo
                        .find_photo(id, sequence)?
                        .ok_or(WashError::NotFound(NotFound::Photo { wash_id: id, sequence }))?;
        let bytes = self.photos
                        .get(&photo.file_path)?
                        .ok_or_else(|| WashError::NotFound(NotFound::PhotoFile(photo.file_name.clone())))?;
        if !photo.verify(&bytes) {
            error!("Checksum distinto para {}: el archivo no coincide con el registrado", photo.file_path);
            return Err(WashError::internal(format!("checksum mismatch for {}", photo.file_name)));
        }
        Ok(PhotoDownload { file_name: photo.file_name, content_type: photo.kind.mime().to_string(), bytes })
    }

    /// Empaqueta en un ZIP todas las fotos del ciclo, en orden de secuencia.
    ///
    /// Falla con `NotFound` si el ciclo no existe, si no tiene fotos o si
    /// falta alguno de los archivos; en ese caso no se genera nada.
    pub fn download_photos_zip(&self, wash_id: i64) -> Result<PhotoArchive, WashError> {
        let id = WashId::parse(wash_id)?;
        if self.repo.find_cycle(id)?.is_none() {
            return Err(WashError::NotFound(NotFound::WashCycle(id)));
        }
        let photos = self.repo.list_photos(id)?;
        if photos.is_empty() {
            return Err(WashError::NotFound(NotFound::NoPhotos(id)));
        }

        let mut contents = Vec::with_capacity(photos.len());
        for photo in &photos {
            let bytes = self.photos
                            .get(&photo.file_path)?
                            .ok_or_else(|| WashError::NotFound(NotFound::PhotoFile(photo.file_name.clone())))?;
            if !photo.verify(&bytes) {
                error!("Checksum distinto para {}: el archivo no coincide con el registrado", photo.file_path);
                return Err(WashError::internal(format!("checksum mismatch for {}", photo.file_name)));
            }
            contents.push((photo.file_name.as_str(), bytes));
        }

        let bytes = build_zip(&contents).map_err(|e| WashError::internal(format!("error generando el zip: {}", e)))?;
        info!("ZIP del lavado {} con {} fotos ({} bytes)", id, contents.len(), bytes.len());
        Ok(PhotoArchive { file_name: format!("{}_photos.zip", id),
                          content_type: "application/zip".to_string(),
                          photo_count: contents.len(),
                          bytes })
    }

    fn get_cycle(&self, id: WashId) -> Result<WashCycleView, WashError> {
        let cycle = self.repo
                        .find_cycle(id)?
                        .ok_or(WashError::NotFound(NotFound::WashCycle(id)))?;
        self.view(&cycle)
    }

    fn view(&self, cycle: &WashCycle) -> Result<WashCycleView, WashError> {
        let record = cycle.record();
        let machine_name = self.ctx.machines.find_machine(record.machine_id())?.map(|m| m.name);
        let start_user_name = self.ctx.users.find_user(record.start_user_id())?.map(|u| u.user_name);
        let end_user_name = match record.end_user_id() {
            Some(uid) => self.ctx.users.find_user(uid)?.map(|u| u.user_name),
            None => None,
        };
        Ok(WashCycleView { wash_id: record.id(),
                           machine_id: record.machine_id(),
                           machine_name,
                           start_user_id: record.start_user_id(),
                           start_user_name,
                           end_user_id: record.end_user_id(),
                           end_user_name,
                           started_at: record.started_at(),
                           ended_at: record.ended_at(),
                           status: record.status().code().to_string(),
                           status_description: record.status().description(self.locale).to_string(),
                           start_observation: record.start_observation().map(str::to_string),
                           finish_observation: record.finish_observation().map(str::to_string),
                           prots: cycle.prots().iter().map(ProtView::from).collect(),
                           photos: cycle.photos().iter().map(PhotoView::from).collect() })
    }

    fn log_outcome<T>(&self, op: &str, result: Result<T, WashError>) -> Result<T, WashError> {
        if let Err(e) = &result {
            match e.kind() {
                ErrorKind::Internal => error!("{} falló: {}", op, e),
                _ => warn!("{} rechazado ({}): {}", op, e.code(), e),
            }
        }
        result
    }
}

// Las imágenes ya van comprimidas; se guardan tal cual.
fn build_zip(entries: &[(&str, Vec<u8>)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}
