use chrono::NaiveDate;
use models::{ExpenseCategory, FinancialSummary, IncomeEntry, IncomeStatus, Investment};
use serde::Serialize;

/// Derives the financial summary from the raw records.
///
/// Pure function of its inputs: no side effects, safe to re-run on every
/// change, and empty slices yield an all-zero summary. Realized income
/// (`Entrada`) and projected income (`Futuros`) are totalled separately.
///
/// `taxa_cambio` is the EUR→BRL rate (BRL per EUR). When it is absent or
/// non-positive there is no conversion available and `saldo_apos_cambio_eur`
/// carries the unconverted BRL value.
pub fn compute_summary(
    entradas: &[IncomeEntry],
    saidas: &[ExpenseCategory],
    _investimentos: &[Investment],
    taxa_cambio: Option<f64>,
) -> FinancialSummary {
    let total_entradas: f64 = entradas
        .iter()
        .filter(|e| e.status == IncomeStatus::Entrada)
        .map(|e| e.valor)
        .sum();
    let total_futuros: f64 = entradas
        .iter()
        .filter(|e| e.status == IncomeStatus::Futuros)
        .map(|e| e.valor)
        .sum();

    let total_saidas: f64 = saidas.iter().map(|c| c.total).sum();
    let total_pago: f64 = saidas.iter().map(|c| c.pago).sum();
    // Never read from the stored faltaPagar field, which can drift
    let total_a_pagar = total_saidas - total_pago;

    let saldo_final_previsto = total_entradas - total_saidas;
    let saldo_final_com_futuros = saldo_final_previsto + total_futuros;
    let saldo_atual = total_entradas - total_pago;

    let (saldo_apos_cambio_eur, taxa_cambio) = match taxa_cambio {
        Some(taxa) if taxa > 0.0 && taxa.is_finite() => (saldo_final_previsto / taxa, taxa),
        _ => (saldo_final_previsto, 0.0),
    };

    FinancialSummary {
        total_entradas,
        total_saidas,
        total_pago,
        total_a_pagar,
        total_futuros,
        saldo_final_previsto,
        saldo_final_com_futuros,
        saldo_atual,
        saldo_apos_cambio_eur,
        taxa_cambio,
    }
}

/// Progress towards the income goal, as a percentage.
///
/// Returns `None` when no goal is set (zero or negative), so consumers never
/// divide by zero and the progress indicator simply does not render.
pub fn goal_progress(total_entradas: f64, meta_entradas: f64) -> Option<f64> {
    if meta_entradas > 0.0 && meta_entradas.is_finite() {
        Some(total_entradas / meta_entradas * 100.0)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    NearLimit,
    OverBudget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetCheck {
    pub status: BudgetStatus,
    pub percentage: f64,
}

/// Classifies spending against a category's budget ceiling.
///
/// No classification when the ceiling is absent or zero. Below 80% is on
/// track, from 80% up to (but excluding) 100% is near the limit, and 100% or
/// more is over budget.
pub fn classify_budget(total: f64, meta_orcamento: Option<f64>) -> Option<BudgetCheck> {
    let meta = meta_orcamento?;
    if meta <= 0.0 {
        return None;
    }
    let percentage = total / meta * 100.0;
    let status = if percentage >= 100.0 {
        BudgetStatus::OverBudget
    } else if percentage >= 80.0 {
        BudgetStatus::NearLimit
    } else {
        BudgetStatus::OnTrack
    };
    Some(BudgetCheck { status, percentage })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DueUrgency {
    /// Past the due date with money still owed.
    Overdue { days_late: i64 },
    /// Due within the next seven days.
    Upcoming {
        days_until: i64,
        severity: AlertSeverity,
    },
}

/// Classifies how urgent a category's due date is.
///
/// Nothing to report when the category is fully paid or has no due date.
pub fn classify_due_date(
    vencimento: Option<NaiveDate>,
    restante: f64,
    today: NaiveDate,
) -> Option<DueUrgency> {
    if restante <= 0.0 {
        return None;
    }
    let vencimento = vencimento?;
    let days = vencimento.signed_duration_since(today).num_days();
    if days < 0 {
        Some(DueUrgency::Overdue { days_late: -days })
    } else if days <= 7 {
        let severity = if days <= 2 {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        Some(DueUrgency::Upcoming {
            days_until: days,
            severity,
        })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Vencimento,
    Orcamento,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub categoria_id: String,
    pub categoria: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Generates the alert list for the given categories.
///
/// Alerts are ephemeral: nothing is stored, and the same inputs with the same
/// `today` regenerate the identical list. The remaining amount is recomputed
/// from `total - pago` rather than read from the stored faltaPagar.
pub fn generate_alerts(saidas: &[ExpenseCategory], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for categoria in saidas {
        match classify_due_date(categoria.vencimento, categoria.restante(), today) {
            Some(DueUrgency::Overdue { days_late }) => alerts.push(Alert {
                categoria_id: categoria.id.clone(),
                categoria: categoria.categoria.clone(),
                kind: AlertKind::Vencimento,
                severity: AlertSeverity::Critical,
                message: format!(
                    "{} venceu há {} dia(s) com R$ {:.2} em aberto",
                    categoria.categoria,
                    days_late,
                    categoria.restante()
                ),
            }),
            Some(DueUrgency::Upcoming {
                days_until,
                severity,
            }) => {
                let message = if days_until == 0 {
                    format!("{} vence hoje", categoria.categoria)
                } else {
                    format!("{} vence em {} dia(s)", categoria.categoria, days_until)
                };
                alerts.push(Alert {
                    categoria_id: categoria.id.clone(),
                    categoria: categoria.categoria.clone(),
                    kind: AlertKind::Vencimento,
                    severity,
                    message,
                });
            }
            None => {}
        }

        match classify_budget(categoria.total, categoria.meta_orcamento) {
            Some(check) if check.status == BudgetStatus::OverBudget => alerts.push(Alert {
                categoria_id: categoria.id.clone(),
                categoria: categoria.categoria.clone(),
                kind: AlertKind::Orcamento,
                severity: AlertSeverity::Critical,
                message: format!(
                    "{} estourou o orçamento ({:.0}% da meta)",
                    categoria.categoria, check.percentage
                ),
            }),
            Some(check) if check.status == BudgetStatus::NearLimit => alerts.push(Alert {
                categoria_id: categoria.id.clone(),
                categoria: categoria.categoria.clone(),
                kind: AlertKind::Orcamento,
                severity: AlertSeverity::Warning,
                message: format!(
                    "{} está perto do limite do orçamento ({:.0}% da meta)",
                    categoria.categoria, check.percentage
                ),
            }),
            _ => {}
        }
    }

    alerts
}
