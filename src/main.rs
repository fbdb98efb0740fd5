use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wash_domain::{Locale, Machine, ParameterStore, ProtInput, User, WashError};
use wash_flow::{Collaborators, FinishWashCommand, StartWashCommand, SystemClock, WashService};
use wash_persistence::{DieselWashRepository, FsPhotoStore};

type Service = WashService<DieselWashRepository, FsPhotoStore>;

/// Menú de operario para el control de lavados sobre la BD configurada en
/// `CONTROLMAT_DB_URL`.
///
/// Opciones soportadas:
/// 1) Iniciar lavado
/// 2) Añadir prot a un lavado
/// 3) Subir foto desde un archivo
/// 4) Finalizar lavado
/// 5) Lavados en curso
/// 6) Consultar lavado por id
/// 7) Máquinas y disponibilidad
/// 8) Fotos de un lavado
/// 9) Descargar foto
/// 10) Registrar operario
/// 11) Registrar máquina
/// 12) Descargar todas las fotos en ZIP
/// 0) Salir
fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info")?;

    // Inicializar repo (aplica migraciones embebidas si procede)
    let repo = Arc::new(wash_persistence::new_from_env().context("No se pudo abrir la base de datos")?);
    let photo_root = match std::env::var("CONTROLMAT_IMAGE_PATH") {
        Ok(p) => PathBuf::from(p),
        Err(_) => repo.parameters()?.image_path,
    };
    let locale: Locale = std::env::var("CONTROLMAT_LANG").ok()
                                                        .and_then(|l| l.parse().ok())
                                                        .unwrap_or_default();
    info!("Fotos en {} (idioma {})", photo_root.display(), locale);

    let ctx = Collaborators { users: repo.clone(),
                              machines: repo.clone(),
                              parameters: repo.clone(),
                              clock: Arc::new(SystemClock) };
    let service = WashService::new(repo.clone(), Arc::new(FsPhotoStore::new(photo_root)), ctx).with_locale(locale);

    loop {
        println!("\n== Control de lavados ==");
        println!("1) Iniciar lavado");
        println!("2) Añadir prot");
        println!("3) Subir foto");
        println!("4) Finalizar lavado");
        println!("5) Lavados en curso");
        println!("6) Consultar lavado");
        println!("7) Máquinas");
        println!("8) Fotos de un lavado");
        println!("9) Descargar foto");
        println!("10) Registrar operario");
        println!("11) Registrar máquina");
        println!("12) Descargar fotos en ZIP");
        println!("0) Salir");
        let choice = prompt("Elige una opción: ")?;
        let outcome = match choice.trim() {
            "1" => start(&service),
            "2" => add_prot(&service),
            "3" => upload_photo(&service),
            "4" => finish(&service),
            "5" => show(service.get_active()),
            "6" => read_wash_id().and_then(|id| show(service.get_by_id(id))),
            "7" => show(service.list_machines()),
            "8" => read_wash_id().and_then(|id| show(service.list_photos(id))),
            "9" => download(&service),
            "10" => register_user(&repo),
            "11" => register_machine(&repo),
            "12" => download_zip(&service),
            "0" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            report(&e, service.locale());
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    Ok(())
}

/// Los errores de dominio se muestran con su código y el mensaje en el
/// idioma elegido; el resto tal cual.
fn report(e: &anyhow::Error, locale: Locale) {
    match e.downcast_ref::<WashError>() {
        Some(w) => eprintln!("[{}] {}", w.code(), w.message(locale)),
        None => eprintln!("Error: {:#}", e),
    }
}

fn show<T: Serialize>(result: Result<T, WashError>) -> Result<()> {
    print_json(&result?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("No se pudo serializar la respuesta: {}", e),
    }
}

fn start(service: &Service) -> Result<()> {
    let machine_id: i16 = prompt("Máquina: ")?.trim().parse().context("Id de máquina inválido")?;
    let start_user_id: i32 = prompt("Operario: ")?.trim().parse().context("Id de operario inválido")?;
    let observation = optional(prompt("Observación (enter para vacío): ")?);
    let mut prots = Vec::new();
    loop {
        let prot_id = prompt("Prot (enter para terminar): ")?;
        if prot_id.trim().is_empty() {
            break;
        }
        prots.push(read_prot(prot_id.trim())?);
    }
    let view = service.start(StartWashCommand { machine_id, start_user_id, start_observation: observation, prots })?;
    print_json(&view);
    Ok(())
}

fn add_prot(service: &Service) -> Result<()> {
    let id = read_wash_id()?;
    let prot_id = prompt("Prot: ")?;
    let prot = read_prot(prot_id.trim())?;
    print_json(&service.add_prot(id, prot)?);
    Ok(())
}

fn read_prot(prot_id: &str) -> Result<ProtInput> {
    let batch = prompt("  Lote (NLxx): ")?;
    let bag = prompt("  Bolsa (n/m): ")?;
    Ok(ProtInput::new(prot_id, batch.trim(), bag.trim()))
}

fn upload_photo(service: &Service) -> Result<()> {
    let id = read_wash_id()?;
    let path = PathBuf::from(prompt("Archivo: ")?.trim());
    let bytes = std::fs::read(&path).with_context(|| format!("No se pudo leer {}", path.display()))?;
    let content_type = match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ref e) if e == "png" => "image/png",
        _ => "image/jpeg",
    };
    let description = optional(prompt("Descripción (enter para vacío): ")?);
    print_json(&service.upload_photo(id, &bytes, content_type, description.as_deref())?);
    Ok(())
}

fn finish(service: &Service) -> Result<()> {
    let id = read_wash_id()?;
    let end_user_id: i32 = prompt("Operario de cierre: ")?.trim().parse().context("Id de operario inválido")?;
    let observation = optional(prompt("Observación (enter para vacío): ")?);
    print_json(&service.finish(id, FinishWashCommand { end_user_id, finish_observation: observation })?);
    Ok(())
}

fn download(service: &Service) -> Result<()> {
    let id = read_wash_id()?;
    let sequence: u32 = prompt("Secuencia: ")?.trim().parse().context("Secuencia inválida")?;
    let dir = prompt("Directorio destino (enter para el actual): ")?;
    let photo = service.download_photo(id, sequence)?;
    let target = PathBuf::from(if dir.trim().is_empty() { "." } else { dir.trim() }).join(&photo.file_name);
    std::fs::write(&target, &photo.bytes).with_context(|| format!("No se pudo escribir {}", target.display()))?;
    println!("{} ({}, {} bytes) -> {}", photo.file_name, photo.content_type, photo.bytes.len(), target.display());
    Ok(())
}

fn download_zip(service: &Service) -> Result<()> {
    let id = read_wash_id()?;
    let dir = prompt("Directorio destino (enter para el actual): ")?;
    let archive = service.download_photos_zip(id)?;
    let target = PathBuf::from(if dir.trim().is_empty() { "." } else { dir.trim() }).join(&archive.file_name);
    std::fs::write(&target, &archive.bytes).with_context(|| format!("No se pudo escribir {}", target.display()))?;
    println!("{} ({} fotos, {} bytes) -> {}", archive.file_name, archive.photo_count, archive.bytes.len(), target.display());
    Ok(())
}

fn register_machine(repo: &DieselWashRepository) -> Result<()> {
    let id: i16 = prompt("Id de máquina: ")?.trim().parse().context("Id de máquina inválido")?;
    let name = prompt("Nombre: ")?;
    let machine = Machine::new(id, name.trim());
    repo.register_machine(&machine)?;
    println!("Máquina registrada: {} ({})", machine.name, machine.id);
    Ok(())
}

fn register_user(repo: &DieselWashRepository) -> Result<()> {
    let id: i32 = prompt("Id de operario: ")?.trim().parse().context("Id de operario inválido")?;
    let name = prompt("Nombre de usuario: ")?;
    let active = prompt("¿Activo? (s/n): ")?;
    let mut user = User::new(id, name.trim());
    if active.trim().eq_ignore_ascii_case("n") {
        user = user.inactive();
    }
    repo.register_user(&user)?;
    println!("Operario registrado: {} ({})", user.user_name, user.id);
    Ok(())
}

fn read_wash_id() -> Result<i64> {
    prompt("Id de lavado (YYMMDDNN): ")?.trim().parse().context("Id de lavado inválido")
}

fn optional(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s.trim().to_string()) }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
