use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Domain entities. Field names map onto the wire keys the frontend and the
// stored database.json use (Portuguese, camelCase).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeStatus {
    /// Realized income, already received.
    Entrada,
    /// Projected income, expected but not yet received.
    Futuros,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEntry {
    pub id: String,
    pub valor: f64,
    pub descricao: String,
    #[serde(default)]
    pub data: Option<NaiveDate>,
    pub pessoa: String,
    pub status: IncomeStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    pub id: String,
    pub categoria: String,
    pub total: f64,
    pub pago: f64,
    /// Stored redundantly by the frontend and can drift; use `restante()`.
    #[serde(default)]
    pub falta_pagar: f64,
    #[serde(default)]
    pub meta_orcamento: Option<f64>,
    #[serde(default)]
    pub vencimento: Option<NaiveDate>,
    #[serde(default)]
    pub notas: Option<String>,
}

impl ExpenseCategory {
    /// Remaining amount owed, recomputed from the authoritative fields.
    pub fn restante(&self) -> f64 {
        self.total - self.pago
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub categoria: String,
    pub valor: f64,
}

/// Derived totals and balances. Never persisted as a source of truth, always
/// recomputed from the raw records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_entradas: f64,
    pub total_saidas: f64,
    pub total_pago: f64,
    pub total_a_pagar: f64,
    pub total_futuros: f64,
    pub saldo_final_previsto: f64,
    pub saldo_final_com_futuros: f64,
    pub saldo_atual: f64,
    #[serde(rename = "saldoAposCambioEUR")]
    pub saldo_apos_cambio_eur: f64,
    pub taxa_cambio: f64,
}

/// Snapshot of the user's data shipped to the assistant with each question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub entradas: Vec<IncomeEntry>,
    pub saidas: Vec<ExpenseCategory>,
    pub investimentos: Vec<Investment>,
    pub resumo: FinancialSummary,
    pub meta_entradas: f64,
}

// Settings models

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsServer {
    pub host: String,
    pub port: u16,
}

impl Default for SettingsServer {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsAssistant {
    pub base_url: String,
    pub model: String,
}

impl Default for SettingsAssistant {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsExchange {
    pub endpoint: String,
}

impl Default for SettingsExchange {
    fn default() -> Self {
        Self {
            endpoint: "https://economia.awesomeapi.com.br/json/last/EUR-BRL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: SettingsServer,
    /// Fixed set of participant names income entries may be assigned to.
    /// Empty means any name is accepted.
    pub participants: Vec<String>,
    pub assistant: SettingsAssistant,
    pub exchange: SettingsExchange,
}

// Input coercion helpers. User-entered text is recovered locally: a value
// that cannot be parsed becomes a safe default instead of a fatal error.

/// Parses a user-entered Brazilian currency string, e.g. "R$ 1.234,56".
pub fn parse_valor(s: &str) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return Err(anyhow!("Empty amount"));
    }

    // Remove currency symbol and spaces
    let mut cleaned = s.replace("R$", "").replace(' ', "");

    // Brazilian number format (dots for thousands, comma for decimal)
    // Example: "1.234,56" or "-1.234,56"
    if cleaned.contains(',') {
        cleaned = cleaned.replace('.', "");
        cleaned = cleaned.replace(',', ".");
    }

    let value = cleaned
        .parse::<f64>()
        .with_context(|| format!("Failed to parse amount: {}", s))?;
    if !value.is_finite() {
        return Err(anyhow!("Non-finite amount: {}", s));
    }
    Ok(value)
}

/// Coercing variant used on form input: unparseable amounts become zero.
pub fn parse_valor_or_zero(s: &str) -> f64 {
    parse_valor(s).unwrap_or(0.0)
}

/// Parses a date in the formats the frontend has produced over time.
pub fn parse_data(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // YYYY-MM-DD
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    // DD/MM/YYYY
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Ok(date);
    }

    // DD-MM-YYYY
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d-%m-%Y") {
        return Ok(date);
    }

    Err(anyhow!("Unrecognized date format: {}", s))
}

/// Coercing variant used on form input: unparseable dates become `None`.
pub fn parse_data_opt(s: &str) -> Option<NaiveDate> {
    parse_data(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valor_brazilian_format() {
        assert_eq!(parse_valor("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_valor("R$ 1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_valor("-1.234,56").unwrap(), -1234.56);
    }

    #[test]
    fn test_parse_valor_plain_format() {
        assert_eq!(parse_valor("1234.56").unwrap(), 1234.56);
        assert_eq!(parse_valor("500").unwrap(), 500.0);
    }

    #[test]
    fn test_parse_valor_rejects_garbage() {
        assert!(parse_valor("").is_err());
        assert!(parse_valor("-").is_err());
        assert!(parse_valor("abc").is_err());
        assert!(parse_valor("NaN").is_err());
        assert!(parse_valor("inf").is_err());
    }

    #[test]
    fn test_parse_valor_or_zero_coerces() {
        assert_eq!(parse_valor_or_zero("abc"), 0.0);
        assert_eq!(parse_valor_or_zero(""), 0.0);
        assert_eq!(parse_valor_or_zero("2,50"), 2.5);
    }

    #[test]
    fn test_parse_data_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert_eq!(parse_data("2026-01-10").unwrap(), expected);
        assert_eq!(parse_data("10/01/2026").unwrap(), expected);
        assert_eq!(parse_data("10-01-2026").unwrap(), expected);
    }

    #[test]
    fn test_parse_data_opt_coerces() {
        assert!(parse_data_opt("not a date").is_none());
        assert!(parse_data_opt("2026-02-30").is_none());
        assert!(parse_data_opt("2026-02-28").is_some());
    }

    #[test]
    fn test_income_entry_wire_keys() {
        let json = r#"{
            "id": "e1",
            "valor": 1500.0,
            "descricao": "Salário",
            "data": "2026-01-05",
            "pessoa": "Ana",
            "status": "Entrada",
            "tags": ["mensal"]
        }"#;
        let entry: IncomeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.valor, 1500.0);
        assert_eq!(entry.status, IncomeStatus::Entrada);
        assert!(entry.notas.is_none());
    }

    #[test]
    fn test_expense_category_restante_ignores_stored_field() {
        let json = r#"{
            "id": "c1",
            "categoria": "Hospedagem",
            "total": 900.0,
            "pago": 300.0,
            "faltaPagar": 123.0
        }"#;
        let category: ExpenseCategory = serde_json::from_str(json).unwrap();
        // Stored faltaPagar is stale on purpose; restante recomputes
        assert_eq!(category.falta_pagar, 123.0);
        assert_eq!(category.restante(), 600.0);
    }

    #[test]
    fn test_summary_wire_keys() {
        let summary = FinancialSummary {
            saldo_apos_cambio_eur: 10.0,
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("saldoAposCambioEUR").is_some());
        assert!(json.get("totalAPagar").is_some());
    }
}
