// Archivo: dto.rs
// Propósito: comandos de entrada y vistas de salida del servicio. Las vistas
// se serializan a JSON con nombres camelCase.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wash_domain::{Photo, Prot, ProtInput, WashId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWashCommand {
    pub machine_id: i16,
    pub start_user_id: i32,
    #[serde(default)]
    pub start_observation: Option<String>,
    #[serde(default)]
    pub prots: Vec<ProtInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishWashCommand {
    pub end_user_id: i32,
    #[serde(default)]
    pub finish_observation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtView {
    pub prot_id: String,
    pub batch_number: String,
    pub bag_number: String,
}

impl From<&Prot> for ProtView {
    fn from(p: &Prot) -> Self {
        Self { prot_id: p.prot_id().to_string(),
               batch_number: p.batch_number().to_string(),
               bag_number: p.bag_number().to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    pub wash_id: WashId,
    pub sequence: u32,
    pub file_name: String,
    pub file_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Photo> for PhotoView {
    fn from(p: &Photo) -> Self {
        Self { wash_id: p.wash_id,
               sequence: p.sequence,
               file_name: p.file_name.clone(),
               file_path: p.file_path.clone(),
               content_type: p.kind.mime().to_string(),
               size_bytes: p.size_bytes,
               description: p.description.clone(),
               created_at: p.created_at }
    }
}

/// Ciclo con nombres resueltos para mostrar al operario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WashCycleView {
    pub wash_id: WashId,
    pub machine_id: i16,
    pub machine_name: Option<String>,
    pub start_user_id: i32,
    pub start_user_name: Option<String>,
    pub end_user_id: Option<i32>,
    pub end_user_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Código de una letra (`P` / `F`).
    pub status: String,
    pub status_description: String,
    pub start_observation: Option<String>,
    pub finish_observation: Option<String>,
    pub prots: Vec<ProtView>,
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineView {
    pub id: i16,
    pub name: String,
    /// Libre si no tiene ciclo en curso.
    pub is_available: bool,
    pub active_wash_id: Option<WashId>,
}

/// Contenido de una foto listo para entregar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDownload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Todas las fotos de un ciclo empaquetadas en un ZIP, una entrada por foto
/// con su nombre de archivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoArchive {
    pub file_name: String,
    pub content_type: String,
    pub photo_count: usize,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_command_reads_camel_case() {
        let cmd: StartWashCommand = serde_json::from_value(json!({
            "machineId": 1,
            "startUserId": 7,
            "prots": [{"protId": "PROT001", "batchNumber": "NL01", "bagNumber": "01/02"}]
        })).unwrap();
        assert_eq!(cmd.machine_id, 1);
        assert_eq!(cmd.start_observation, None);
        assert_eq!(cmd.prots[0].bag_number, "01/02");
    }

    #[test]
    fn machine_view_writes_camel_case() {
        let v = MachineView { id: 2, name: "Lavadora 2".into(), is_available: true, active_wash_id: None };
        let value = serde_json::to_value(&v).unwrap();
        assert_eq!(value["isAvailable"], json!(true));
        assert_eq!(value["activeWashId"], json!(null));
    }
}
