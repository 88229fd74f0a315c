use serde::{Deserialize, Serialize};

/// Sector used when the operator profile carries no department.
pub const DEFAULT_SECTOR: &str = "Geral";

/// Operator profile as returned by `GET /atendentes/me` and kept in the
/// local store under `user_data`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "cargo", default)]
    pub role: String,
    #[serde(rename = "departamento", default)]
    pub department: String,
}

impl Operator {
    /// Sector announced to the channel. Empty departments fall back to "Geral".
    pub fn sector(&self) -> &str {
        if self.department.trim().is_empty() {
            DEFAULT_SECTOR
        } else {
            &self.department
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_with_portuguese_fields() {
        let op: Operator = serde_json::from_str(
            r#"{"id":"7","nome":"Ana","email":"ana@ifce.edu.br","cargo":"ATENDENTE","departamento":"Protocolo"}"#,
        )
        .unwrap();
        assert_eq!(op.name, "Ana");
        assert_eq!(op.role, "ATENDENTE");
        assert_eq!(op.sector(), "Protocolo");
    }

    #[test]
    fn missing_department_uses_default_sector() {
        let op: Operator = serde_json::from_str(r#"{"id":"7","nome":"Ana"}"#).unwrap();
        assert_eq!(op.sector(), DEFAULT_SECTOR);
    }
}
