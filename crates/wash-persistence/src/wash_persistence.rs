use crate::schema::{machines, parameters, photos, prots, users, wash_cycles};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use indexmap::IndexSet;
use log::{error, info};
use std::sync::Arc;
use wash_domain::{ConflictReason, DuplicateProt, ImageKind, InvalidState, Machine, MachineCatalog, ParameterStore,
                  Parameters, Photo, Prot, RecordParts, User, UserDirectory, WashCycle, WashCycleRecord, WashError,
                  WashId, WashStatus};
use wash_flow::{WashRepository, WashTx};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;

/// Ajustes aplicados a cada conexión SQLite del pool: espera ante bloqueo
/// en vez de fallar y claves foráneas activas.
#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;
#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn)
                                                    .map_err(diesel::r2d2::Error::QueryError)?;
    diesel::sql_query("PRAGMA foreign_keys = ON;").execute(conn)
                                                  .map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

/// Error interno de una transacción Diesel: o bien la operación de dominio
/// falló, o bien la BD.
#[derive(Debug, thiserror::Error)]
enum TxError {
  #[error(transparent)]
  Wash(WashError),
  #[error(transparent)]
  Db(#[from] DieselError),
}

impl From<TxError> for WashError {
  fn from(e: TxError) -> Self {
    match e {
      TxError::Wash(w) => w,
      TxError::Db(d) => map_diesel_error(d),
    }
  }
}

/// Repo Diesel que implementa `WashRepository` y los colaboradores de sólo
/// lectura (`UserDirectory`, `MachineCatalog`, `ParameterStore`).
#[derive(Clone)]
pub struct DieselWashRepository {
  pool: Arc<DbPool>,
}

impl DieselWashRepository {
  pub fn new(database_url: &str) -> Result<Self, WashError> {
    let manager = ConnectionManager::<DbConn>::new(database_url);
    let builder = Pool::builder().max_size(8);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager)
                      .map_err(|e| WashError::internal(format!("no se pudo crear el pool de conexiones: {}", e)))?;
    let repo = DieselWashRepository { pool: Arc::new(pool) };
    repo.migrate()?;
    Ok(repo)
  }

  fn migrate(&self) -> Result<(), WashError> {
    let mut c = self.conn()?;
    #[cfg(not(feature = "pg"))]
    {
      let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
    }
    let applied = c.run_pending_migrations(MIGRATIONS)
                   .map_err(|e| WashError::internal(format!("migraciones: {}", e)))?;
    if !applied.is_empty() {
      info!("Aplicadas {} migraciones", applied.len());
    }
    Ok(())
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<DbConn>>, r2d2::Error> {
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>, WashError> {
    self.conn_raw().map_err(|e| WashError::internal(format!("pool: {}", e)))
  }

  /// Lectura consistente: varias consultas dentro de una transacción.
  fn read<T, F>(&self, f: F) -> Result<T, WashError>
    where F: FnOnce(&mut DbConn) -> Result<T, TxError>
  {
    let mut pooled = self.conn()?;
    let conn: &mut DbConn = &mut pooled;
    Ok(conn.transaction(f)?)
  }

  /// Alta o actualización de un operario.
  pub fn register_user(&self, user: &User) -> Result<(), WashError> {
    let mut conn = self.conn()?;
    let row = UserRow::from(user);
    map_db_err(diesel::insert_into(users::table).values(&row)
                                                .on_conflict(users::id)
                                                .do_update()
                                                .set((users::user_name.eq(&row.user_name),
                                                      users::role.eq(&row.role),
                                                      users::active.eq(row.active)))
                                                .execute(&mut conn))?;
    Ok(())
  }

  pub fn register_machine(&self, machine: &Machine) -> Result<(), WashError> {
    let mut conn = self.conn()?;
    let row = MachineRow { id: machine.id, name: machine.name.clone() };
    map_db_err(diesel::insert_into(machines::table).values(&row)
                                                   .on_conflict(machines::id)
                                                   .do_update()
                                                   .set(machines::name.eq(&row.name))
                                                   .execute(&mut conn))?;
    Ok(())
  }

  /// Cambia un parámetro de operación (`parameter_keys::*`).
  pub fn set_parameter(&self, name: &str, value: &str) -> Result<(), WashError> {
    let mut conn = self.conn()?;
    map_db_err(diesel::insert_into(parameters::table).values((parameters::name.eq(name), parameters::value.eq(value)))
                                                     .on_conflict(parameters::name)
                                                     .do_update()
                                                     .set(parameters::value.eq(value))
                                                     .execute(&mut conn))?;
    Ok(())
  }
}

// Filas Diesel
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = wash_cycles)]
struct CycleRow {
  pub id: i64,
  pub machine_id: i16,
  pub start_user_id: i32,
  pub end_user_id: Option<i32>,
  pub started_at_ts: i64,
  pub ended_at_ts: Option<i64>,
  pub status: String,
  pub start_observation: Option<String>,
  pub finish_observation: Option<String>,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = prots)]
struct ProtRow {
  pub wash_id: i64,
  pub prot_id: String,
  pub batch_number: String,
  pub bag_number: String,
  pub position: i32,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = photos)]
struct PhotoRow {
  pub wash_id: i64,
  pub sequence: i32,
  pub file_name: String,
  pub file_path: String,
  pub content_type: String,
  pub size_bytes: i64,
  pub checksum: String,
  pub description: Option<String>,
  pub created_at_ts: i64,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = machines)]
struct MachineRow {
  pub id: i16,
  pub name: String,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = users)]
struct UserRow {
  pub id: i32,
  pub user_name: String,
  pub role: String,
  pub active: bool,
}

impl From<&WashCycleRecord> for CycleRow {
  fn from(r: &WashCycleRecord) -> Self {
    CycleRow { id: r.id().value(),
               machine_id: r.machine_id(),
               start_user_id: r.start_user_id(),
               end_user_id: r.end_user_id(),
               started_at_ts: r.started_at().timestamp_millis(),
               ended_at_ts: r.ended_at().map(|t| t.timestamp_millis()),
               status: r.status().code().to_string(),
               start_observation: r.start_observation().map(str::to_string),
               finish_observation: r.finish_observation().map(str::to_string) }
  }
}

impl CycleRow {
  fn into_record(self) -> Result<WashCycleRecord, WashError> {
    let status = WashStatus::from_code(&self.status)
      .ok_or_else(|| WashError::internal(format!("estado desconocido '{}' en ciclo {}", self.status, self.id)))?;
    WashCycleRecord::from_parts(RecordParts { id: stored_id(self.id)?,
                                              machine_id: self.machine_id,
                                              start_user_id: self.start_user_id,
                                              end_user_id: self.end_user_id,
                                              started_at: from_ts(self.started_at_ts)?,
                                              ended_at: self.ended_at_ts.map(from_ts).transpose()?,
                                              status,
                                              start_observation: self.start_observation,
                                              finish_observation: self.finish_observation })
  }
}

impl ProtRow {
  fn into_prot(self) -> Result<Prot, WashError> {
    Prot::new(&self.prot_id, &self.batch_number, &self.bag_number)
      .map_err(|e| WashError::internal(format!("prot inválido en ciclo {}: {}", self.wash_id, e)))
  }
}

impl From<&Photo> for PhotoRow {
  fn from(p: &Photo) -> Self {
    PhotoRow { wash_id: p.wash_id.value(),
               sequence: p.sequence as i32,
               file_name: p.file_name.clone(),
               file_path: p.file_path.clone(),
               content_type: p.kind.mime().to_string(),
               size_bytes: p.size_bytes as i64,
               checksum: p.checksum.clone(),
               description: p.description.clone(),
               created_at_ts: p.created_at.timestamp_millis() }
  }
}

impl PhotoRow {
  fn into_photo(self) -> Result<Photo, WashError> {
    let kind = ImageKind::from_mime(&self.content_type)
      .or_else(|| ImageKind::from_file_name(&self.file_name))
      .ok_or_else(|| WashError::internal(format!("tipo de foto desconocido '{}'", self.content_type)))?;
    Ok(Photo { wash_id: stored_id(self.wash_id)?,
               sequence: self.sequence as u32,
               file_name: self.file_name,
               file_path: self.file_path,
               kind,
               size_bytes: self.size_bytes as u64,
               checksum: self.checksum,
               description: self.description,
               created_at: from_ts(self.created_at_ts)? })
  }
}

impl From<&User> for UserRow {
  fn from(u: &User) -> Self {
    UserRow { id: u.id, user_name: u.user_name.clone(), role: u.role.clone(), active: u.active }
  }
}

impl From<UserRow> for User {
  fn from(r: UserRow) -> Self {
    User { id: r.id, user_name: r.user_name, role: r.role, active: r.active }
  }
}

fn stored_id(raw: i64) -> Result<WashId, WashError> {
  WashId::parse(raw).map_err(|_| WashError::internal(format!("id de lavado corrupto en BD: {}", raw)))
}

fn from_ts(ts: i64) -> Result<DateTime<Utc>, WashError> {
  DateTime::from_timestamp_millis(ts).ok_or_else(|| WashError::internal(format!("timestamp fuera de rango: {}", ts)))
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, WashError> {
  res.map_err(map_diesel_error)
}

/// Traduce errores de Diesel. Las violaciones de unicidad y los fallos de
/// serialización son conflictos de concurrencia; el resto es interno.
fn map_diesel_error(e: DieselError) -> WashError {
  match &e {
    DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _)
    | DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
      WashError::Conflict(ConflictReason::ConcurrentModification)
    }
    DieselError::DatabaseError(_, info) if info.message().contains("database is locked") => {
      WashError::Conflict(ConflictReason::ConcurrentModification)
    }
    _ => {
      error!("Error de base de datos: {}", e);
      WashError::internal(format!("db: {}", e))
    }
  }
}

/// Distingue qué índice único saltó al insertar un ciclo.
fn is_active_machine_violation(e: &DieselError) -> bool {
  match e {
    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
      info.constraint_name().map(|c| c.contains("active_machine")).unwrap_or(false)
      || info.message().contains("machine_id")
      || info.message().contains("active_machine")
    }
    _ => false,
  }
}

fn is_unique_violation(e: &DieselError) -> bool {
  matches!(e, DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
}

fn assemble(conn: &mut DbConn, row: CycleRow) -> Result<WashCycle, TxError> {
  let prot_rows = prots::table.filter(prots::wash_id.eq(row.id))
                              .order(prots::position.asc())
                              .load::<ProtRow>(conn)?;
  let photo_rows = photos::table.filter(photos::wash_id.eq(row.id))
                                .order(photos::sequence.asc())
                                .load::<PhotoRow>(conn)?;
  let record = row.into_record().map_err(TxError::Wash)?;
  let prots = prot_rows.into_iter()
                       .map(ProtRow::into_prot)
                       .collect::<Result<Vec<_>, _>>()
                       .map_err(TxError::Wash)?;
  let photos = photo_rows.into_iter()
                         .map(PhotoRow::into_photo)
                         .collect::<Result<Vec<_>, _>>()
                         .map_err(TxError::Wash)?;
  Ok(WashCycle::from_rows(record, prots, photos))
}

/// Ejecuta `f` en una transacción que excluye a otros escritores:
/// `BEGIN IMMEDIATE` en SQLite.
#[cfg(not(feature = "pg"))]
fn run_serialized<T, F>(conn: &mut DbConn, f: F) -> Result<T, TxError>
  where F: FnOnce(&mut DbConn) -> Result<T, TxError>
{
  conn.immediate_transaction(f)
}

/// En Postgres, aislamiento `SERIALIZABLE`; los fallos de serialización
/// llegan como `Conflict(ConcurrentModification)`.
#[cfg(feature = "pg")]
fn run_serialized<T, F>(conn: &mut DbConn, f: F) -> Result<T, TxError>
  where F: FnOnce(&mut DbConn) -> Result<T, TxError>
{
  conn.build_transaction().serializable().run(f)
}

/// Vista de escritura sobre la conexión de la transacción en curso.
struct DieselTx<'c> {
  conn: &'c mut DbConn,
}

impl WashTx for DieselTx<'_> {
  fn active_cycles(&mut self) -> Result<Vec<WashCycleRecord>, WashError> {
    let rows = map_db_err(wash_cycles::table.filter(wash_cycles::status.eq(WashStatus::InProgress.code()))
                                            .order(wash_cycles::id.asc())
                                            .load::<CycleRow>(self.conn))?;
    rows.into_iter().map(CycleRow::into_record).collect()
  }

  fn max_id_issued_on(&mut self, day: NaiveDate) -> Result<Option<WashId>, WashError> {
    let (lo, hi) = WashId::day_bounds(day);
    let found: Option<i64> = map_db_err(wash_cycles::table.filter(wash_cycles::id.between(lo, hi))
                                                          .select(max(wash_cycles::id))
                                                          .get_result(self.conn))?;
    found.map(stored_id).transpose()
  }

  fn insert_cycle(&mut self, record: &WashCycleRecord, prot_set: &IndexSet<Prot>) -> Result<(), WashError> {
    let row = CycleRow::from(record);
    if let Err(e) = diesel::insert_into(wash_cycles::table).values(&row).execute(self.conn) {
      if is_active_machine_violation(&e) {
        return Err(WashError::Conflict(ConflictReason::MachineBusy { machine_id: record.machine_id() }));
      }
      return Err(map_diesel_error(e));
    }
    for (position, prot) in prot_set.iter().enumerate() {
      let pr = ProtRow { wash_id: row.id,
                         prot_id: prot.prot_id().to_string(),
                         batch_number: prot.batch_number().to_string(),
                         bag_number: prot.bag_number().to_string(),
                         position: position as i32 };
      map_db_err(diesel::insert_into(prots::table).values(&pr).execute(self.conn))?;
    }
    Ok(())
  }

  fn load_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError> {
    let row = map_db_err(wash_cycles::table.find(wash_id.value())
                                           .first::<CycleRow>(self.conn)
                                           .optional())?;
    row.map(CycleRow::into_record).transpose()
  }

  // Un UPDATE sin cambios toma el bloqueo de fila: en Postgres la segunda
  // transacción serializable que toque el mismo ciclo no puede confirmar.
  fn lock_record(&mut self, wash_id: WashId) -> Result<Option<WashCycleRecord>, WashError> {
    let touched = map_db_err(diesel::update(wash_cycles::table.find(wash_id.value()))
                               .set(wash_cycles::status.eq(wash_cycles::status))
                               .execute(self.conn))?;
    if touched == 0 {
      return Ok(None);
    }
    self.load_record(wash_id)
  }

  fn contains_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<bool, WashError> {
    let n: i64 = map_db_err(prots::table.filter(prots::wash_id.eq(wash_id.value()))
                                        .filter(prots::prot_id.eq(prot.prot_id()))
                                        .filter(prots::batch_number.eq(prot.batch_number()))
                                        .filter(prots::bag_number.eq(prot.bag_number()))
                                        .select(count_star())
                                        .get_result(self.conn))?;
    Ok(n > 0)
  }

  fn insert_prot(&mut self, wash_id: WashId, prot: &Prot) -> Result<(), WashError> {
    let last: Option<i32> = map_db_err(prots::table.filter(prots::wash_id.eq(wash_id.value()))
                                                   .select(max(prots::position))
                                                   .get_result(self.conn))?;
    let pr = ProtRow { wash_id: wash_id.value(),
                       prot_id: prot.prot_id().to_string(),
                       batch_number: prot.batch_number().to_string(),
                       bag_number: prot.bag_number().to_string(),
                       position: last.map(|p| p + 1).unwrap_or(0) };
    match diesel::insert_into(prots::table).values(&pr).execute(self.conn) {
      Ok(_) => Ok(()),
      Err(e) if is_unique_violation(&e) => Err(WashError::Duplicate(DuplicateProt { wash_id, prot: prot.clone() })),
      Err(e) => Err(map_diesel_error(e)),
    }
  }

  fn count_photos(&mut self, wash_id: WashId) -> Result<u32, WashError> {
    let n: i64 = map_db_err(photos::table.filter(photos::wash_id.eq(wash_id.value()))
                                         .select(count_star())
                                         .get_result(self.conn))?;
    Ok(n as u32)
  }

  fn insert_photo(&mut self, photo: &Photo) -> Result<(), WashError> {
    let row = PhotoRow::from(photo);
    map_db_err(diesel::insert_into(photos::table).values(&row).execute(self.conn))?;
    Ok(())
  }

  fn save_finish(&mut self, record: &WashCycleRecord) -> Result<(), WashError> {
    let id = record.id();
    let updated =
      map_db_err(diesel::update(wash_cycles::table.filter(wash_cycles::id.eq(id.value()))
                                                  .filter(wash_cycles::status.eq(WashStatus::InProgress.code())))
                 .set((wash_cycles::end_user_id.eq(record.end_user_id()),
                       wash_cycles::ended_at_ts.eq(record.ended_at().map(|t| t.timestamp_millis())),
                       wash_cycles::status.eq(record.status().code()),
                       wash_cycles::finish_observation.eq(record.finish_observation())))
                 .execute(self.conn))?;
    if updated == 0 {
      return Err(WashError::InvalidState(InvalidState { wash_id: id, status: WashStatus::Finished }));
    }
    Ok(())
  }
}

impl WashRepository for DieselWashRepository {
  fn in_transaction<T, F>(&self, op: F) -> Result<T, WashError>
    where F: FnOnce(&mut dyn WashTx) -> Result<T, WashError>
  {
    let mut pooled = self.conn()?;
    let outcome = run_serialized(&mut pooled, |c| {
      let mut tx = DieselTx { conn: c };
      op(&mut tx).map_err(TxError::Wash)
    });
    Ok(outcome?)
  }

  fn find_cycle(&self, wash_id: WashId) -> Result<Option<WashCycle>, WashError> {
    self.read(|c| {
          let row = wash_cycles::table.find(wash_id.value()).first::<CycleRow>(c).optional()?;
          match row {
            Some(r) => Ok(Some(assemble(c, r)?)),
            None => Ok(None),
          }
        })
  }

  fn list_active(&self) -> Result<Vec<WashCycle>, WashError> {
    self.read(|c| {
          let rows = wash_cycles::table.filter(wash_cycles::status.eq(WashStatus::InProgress.code()))
                                       .order(wash_cycles::id.asc())
                                       .load::<CycleRow>(c)?;
          rows.into_iter().map(|r| assemble(c, r)).collect()
        })
  }

  fn active_on_machine(&self, machine_id: i16) -> Result<Option<WashCycle>, WashError> {
    self.read(|c| {
          let row = wash_cycles::table.filter(wash_cycles::machine_id.eq(machine_id))
                                      .filter(wash_cycles::status.eq(WashStatus::InProgress.code()))
                                      .first::<CycleRow>(c)
                                      .optional()?;
          match row {
            Some(r) => Ok(Some(assemble(c, r)?)),
            None => Ok(None),
          }
        })
  }

  fn find_photo(&self, wash_id: WashId, sequence: u32) -> Result<Option<Photo>, WashError> {
    let mut conn = self.conn()?;
    let row = map_db_err(photos::table.find((wash_id.value(), sequence as i32))
                                      .first::<PhotoRow>(&mut conn)
                                      .optional())?;
    row.map(PhotoRow::into_photo).transpose()
  }

  fn list_photos(&self, wash_id: WashId) -> Result<Vec<Photo>, WashError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(photos::table.filter(photos::wash_id.eq(wash_id.value()))
                                       .order(photos::sequence.asc())
                                       .load::<PhotoRow>(&mut conn))?;
    rows.into_iter().map(PhotoRow::into_photo).collect()
  }
}

impl UserDirectory for DieselWashRepository {
  fn find_user(&self, user_id: i32) -> Result<Option<User>, WashError> {
    let mut conn = self.conn()?;
    let row = map_db_err(users::table.find(user_id).first::<UserRow>(&mut conn).optional())?;
    Ok(row.map(User::from))
  }
}

impl MachineCatalog for DieselWashRepository {
  fn find_machine(&self, machine_id: i16) -> Result<Option<Machine>, WashError> {
    let mut conn = self.conn()?;
    let row = map_db_err(machines::table.find(machine_id).first::<MachineRow>(&mut conn).optional())?;
    Ok(row.map(|r| Machine::new(r.id, r.name)))
  }

  fn list_machines(&self) -> Result<Vec<Machine>, WashError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(machines::table.order(machines::id.asc()).load::<MachineRow>(&mut conn))?;
    Ok(rows.into_iter().map(|r| Machine::new(r.id, r.name)).collect())
  }
}

impl ParameterStore for DieselWashRepository {
  fn parameters(&self) -> Result<Parameters, WashError> {
    let mut conn = self.conn()?;
    let pairs = map_db_err(parameters::table.select((parameters::name, parameters::value))
                                            .load::<(String, String)>(&mut conn))?;
    Ok(Parameters::from_pairs(pairs))
  }
}

fn looks_like_postgres(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://")
}

/// Crear repo desde las variables de entorno. Lee `CONTROLMAT_DB_URL` y, si
/// no existe, `DATABASE_URL` (tras cargar `.env`).
#[cfg(feature = "pg")]
pub fn new_from_env() -> Result<DieselWashRepository, WashError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("CONTROLMAT_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                              .map_err(|_| WashError::internal("CONTROLMAT_DB_URL / DATABASE_URL not set"))?;
  if !looks_like_postgres(&url) {
    return Err(WashError::internal("CONTROLMAT_DB_URL / DATABASE_URL does not look like Postgres URL"));
  }
  DieselWashRepository::new(&url)
}

/// Sin `pg` se usa SQLite; por defecto el archivo local `controlmat.db`.
#[cfg(not(feature = "pg"))]
pub fn new_from_env() -> Result<DieselWashRepository, WashError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("CONTROLMAT_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                              .unwrap_or_else(|_| "controlmat.db".into());
  if looks_like_postgres(&url) {
    return Err(WashError::internal("wash-persistence was compiled without 'pg' feature; enable the 'pg' feature to use \
                                    Postgres"));
  }
  DieselWashRepository::new(&url)
}
