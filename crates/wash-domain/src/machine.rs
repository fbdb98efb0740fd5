// machine.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lavadora física. Si está ocupada o no se deduce de los ciclos en curso;
/// no se guarda aquí.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
  pub id: i16,
  pub name: String,
}

impl Machine {
  pub fn new(id: i16, name: impl Into<String>) -> Self {
    Self { id, name: name.into() }
  }
}

impl fmt::Display for Machine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.id)
  }
}

/// Operario que inicia o finaliza lavados.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i32,
  pub user_name: String,
  pub role: String,
  pub active: bool,
}

impl User {
  pub fn new(id: i32, user_name: impl Into<String>) -> Self {
    Self { id, user_name: user_name.into(), role: "WarehouseUser".to_string(), active: true }
  }

  pub fn inactive(mut self) -> Self {
    self.active = false;
    self
  }
}
