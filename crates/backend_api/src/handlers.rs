use ai_client::AssistantClient;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use models::{ContextSnapshot, ExpenseCategory, FinancialSummary, IncomeEntry, Investment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiError, rates::RateProvider, repository::PlannerRepository, Result};

/// Shared state handed to every handler.
pub struct AppState {
    pub repo: Arc<dyn PlannerRepository>,
    pub rates: Arc<dyn RateProvider>,
    pub assistant: AssistantClient,
    /// Fixed set of participant names; empty accepts any name.
    pub participants: Vec<String>,
}

pub type SharedState = Arc<AppState>;

fn validate_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid {}: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_income_entry(state: &AppState, entry: &IncomeEntry) -> Result<()> {
    validate_amount("valor", entry.valor)?;
    if !state.participants.is_empty() && !state.participants.iter().any(|p| p == &entry.pessoa) {
        return Err(ApiError::BadRequest(format!(
            "Unknown participant: {}",
            entry.pessoa
        )));
    }
    Ok(())
}

fn validate_expense_category(category: &ExpenseCategory) -> Result<()> {
    validate_amount("total", category.total)?;
    validate_amount("pago", category.pago)?;
    if let Some(meta) = category.meta_orcamento {
        validate_amount("metaOrcamento", meta)?;
    }
    Ok(())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "trip-planner-api"
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumoResponse {
    pub resumo: FinancialSummary,
    pub meta_entradas: f64,
    /// Absent when no goal is set, so the progress bar does not render.
    pub progresso_meta: Option<f64>,
}

/// GET /api/resumo
/// Recomputes the full summary from the stored records
pub async fn get_resumo(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let entradas = state.repo.list_income_entries().await?;
    let saidas = state.repo.list_expense_categories().await?;
    let investimentos = state.repo.list_investments().await?;
    let meta_entradas = state.repo.get_meta_entradas().await?;
    let taxa_cambio = state.rates.eur_brl_rate().await;

    let resumo = summary_engine::compute_summary(&entradas, &saidas, &investimentos, taxa_cambio);
    let progresso_meta = summary_engine::goal_progress(resumo.total_entradas, meta_entradas);

    Ok(Json(ResumoResponse {
        resumo,
        meta_entradas,
        progresso_meta,
    }))
}

/// GET /api/alertas
/// Alerts are ephemeral: recomputed from scratch on every call
pub async fn get_alertas(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let saidas = state.repo.list_expense_categories().await?;
    let today = chrono::Local::now().date_naive();
    Ok(Json(summary_engine::generate_alerts(&saidas, today)))
}

/// GET /api/entradas
pub async fn list_entradas(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    Ok(Json(state.repo.list_income_entries().await?))
}

/// POST /api/entradas
pub async fn create_entrada(
    State(state): State<SharedState>,
    Json(entry): Json<IncomeEntry>,
) -> Result<impl IntoResponse> {
    validate_income_entry(&state, &entry)?;
    state.repo.create_income_entry(entry.clone()).await?;
    Ok(Json(entry))
}

/// PUT /api/entradas/:id
pub async fn update_entrada(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mut entry): Json<IncomeEntry>,
) -> Result<impl IntoResponse> {
    entry.id = id;
    validate_income_entry(&state, &entry)?;
    state.repo.update_income_entry(entry.clone()).await?;
    Ok(Json(entry))
}

/// DELETE /api/entradas/:id
pub async fn delete_entrada(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.repo.delete_income_entry(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// GET /api/saidas
pub async fn list_saidas(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    Ok(Json(state.repo.list_expense_categories().await?))
}

/// POST /api/saidas
pub async fn create_saida(
    State(state): State<SharedState>,
    Json(mut category): Json<ExpenseCategory>,
) -> Result<impl IntoResponse> {
    validate_expense_category(&category)?;
    // Reconcile the redundant stored field before it hits the disk
    category.falta_pagar = category.restante();
    state.repo.create_expense_category(category.clone()).await?;
    Ok(Json(category))
}

/// PUT /api/saidas/:id
pub async fn update_saida(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mut category): Json<ExpenseCategory>,
) -> Result<impl IntoResponse> {
    category.id = id;
    validate_expense_category(&category)?;
    category.falta_pagar = category.restante();
    state.repo.update_expense_category(category.clone()).await?;
    Ok(Json(category))
}

/// DELETE /api/saidas/:id
pub async fn delete_saida(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.repo.delete_expense_category(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// GET /api/investimentos
pub async fn list_investimentos(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    Ok(Json(state.repo.list_investments().await?))
}

/// POST /api/investimentos
pub async fn create_investimento(
    State(state): State<SharedState>,
    Json(investment): Json<Investment>,
) -> Result<impl IntoResponse> {
    validate_amount("valor", investment.valor)?;
    state.repo.create_investment(investment.clone()).await?;
    Ok(Json(investment))
}

/// PUT /api/investimentos/:id
pub async fn update_investimento(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mut investment): Json<Investment>,
) -> Result<impl IntoResponse> {
    investment.id = id;
    validate_amount("valor", investment.valor)?;
    state.repo.update_investment(investment.clone()).await?;
    Ok(Json(investment))
}

/// DELETE /api/investimentos/:id
pub async fn delete_investimento(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.repo.delete_investment(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaBody {
    pub meta_entradas: f64,
}

/// GET /api/meta
pub async fn get_meta(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let meta_entradas = state.repo.get_meta_entradas().await?;
    Ok(Json(MetaBody { meta_entradas }))
}

/// PUT /api/meta
pub async fn set_meta(
    State(state): State<SharedState>,
    Json(body): Json<MetaBody>,
) -> Result<impl IntoResponse> {
    validate_amount("metaEntradas", body.meta_entradas)?;
    state.repo.set_meta_entradas(body.meta_entradas).await?;
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub pergunta: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub resposta: String,
}

/// POST /api/assistente
/// Assembles a fresh snapshot, streams the assistant's reply and returns the
/// accumulated text once the stream ends
pub async fn ask_assistant(
    State(state): State<SharedState>,
    Json(request): Json<AssistantRequest>,
) -> Result<impl IntoResponse> {
    let entradas = state.repo.list_income_entries().await?;
    let saidas = state.repo.list_expense_categories().await?;
    let investimentos = state.repo.list_investments().await?;
    let meta_entradas = state.repo.get_meta_entradas().await?;
    let taxa_cambio = state.rates.eur_brl_rate().await;

    let resumo = summary_engine::compute_summary(&entradas, &saidas, &investimentos, taxa_cambio);
    let snapshot = ContextSnapshot {
        entradas,
        saidas,
        investimentos,
        resumo,
        meta_entradas,
    };

    let resposta = state
        .assistant
        .ask_stream(&snapshot, &request.pergunta, |delta| {
            tracing::debug!(len = delta.len(), "assistant delta received");
        })
        .await?;

    Ok(Json(AssistantResponse { resposta }))
}
