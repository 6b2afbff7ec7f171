use async_trait::async_trait;
use models::{ExpenseCategory, IncomeEntry, Investment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ApiError, Result};

/// On-disk document backing the planner.
///
/// Collections are plain vectors so listings come back in insertion order;
/// `id` uniqueness is enforced on create.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub income_entries: Vec<IncomeEntry>,
    pub expense_categories: Vec<ExpenseCategory>,
    pub investments: Vec<Investment>,
    pub meta_entradas: f64,
}

/// Repository trait for the planner's records
///
/// This abstraction allows swapping between file-based and database-backed
/// implementations.
#[async_trait]
pub trait PlannerRepository: Send + Sync {
    async fn list_income_entries(&self) -> Result<Vec<IncomeEntry>>;
    async fn create_income_entry(&self, entry: IncomeEntry) -> Result<()>;
    async fn update_income_entry(&self, entry: IncomeEntry) -> Result<()>;
    async fn delete_income_entry(&self, id: &str) -> Result<()>;

    async fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>>;
    async fn create_expense_category(&self, category: ExpenseCategory) -> Result<()>;
    async fn update_expense_category(&self, category: ExpenseCategory) -> Result<()>;
    async fn delete_expense_category(&self, id: &str) -> Result<()>;

    async fn list_investments(&self) -> Result<Vec<Investment>>;
    async fn create_investment(&self, investment: Investment) -> Result<()>;
    async fn update_investment(&self, investment: Investment) -> Result<()>;
    async fn delete_investment(&self, id: &str) -> Result<()>;

    async fn get_meta_entradas(&self) -> Result<f64>;
    async fn set_meta_entradas(&self, value: f64) -> Result<()>;
}

/// File-based implementation that reads/writes the whole document from
/// database.json on every call.
pub struct FilePlannerRepository {
    database_path: PathBuf,
}

impl FilePlannerRepository {
    pub fn new<P: AsRef<Path>>(database_path: P) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
        }
    }

    async fn load_database(&self) -> Result<Database> {
        match tokio::fs::read_to_string(&self.database_path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            // First run: start from an empty document
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Database::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_database(&self, database: &Database) -> Result<()> {
        let content = serde_json::to_string_pretty(database)?;
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.database_path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl PlannerRepository for FilePlannerRepository {
    async fn list_income_entries(&self) -> Result<Vec<IncomeEntry>> {
        Ok(self.load_database().await?.income_entries)
    }

    async fn create_income_entry(&self, entry: IncomeEntry) -> Result<()> {
        let mut database = self.load_database().await?;

        if database.income_entries.iter().any(|e| e.id == entry.id) {
            return Err(ApiError::BadRequest(format!(
                "Income entry with ID {} already exists",
                entry.id
            )));
        }

        database.income_entries.push(entry);
        self.save_database(&database).await
    }

    async fn update_income_entry(&self, entry: IncomeEntry) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .income_entries
            .iter()
            .position(|e| e.id == entry.id)
            .ok_or_else(|| ApiError::NotFound(format!("Income entry {}", entry.id)))?;

        database.income_entries[index] = entry;
        self.save_database(&database).await
    }

    async fn delete_income_entry(&self, id: &str) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .income_entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Income entry {}", id)))?;

        database.income_entries.remove(index);
        self.save_database(&database).await
    }

    async fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
        Ok(self.load_database().await?.expense_categories)
    }

    async fn create_expense_category(&self, category: ExpenseCategory) -> Result<()> {
        let mut database = self.load_database().await?;

        if database
            .expense_categories
            .iter()
            .any(|c| c.id == category.id)
        {
            return Err(ApiError::BadRequest(format!(
                "Expense category with ID {} already exists",
                category.id
            )));
        }

        database.expense_categories.push(category);
        self.save_database(&database).await
    }

    async fn update_expense_category(&self, category: ExpenseCategory) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .expense_categories
            .iter()
            .position(|c| c.id == category.id)
            .ok_or_else(|| ApiError::NotFound(format!("Expense category {}", category.id)))?;

        database.expense_categories[index] = category;
        self.save_database(&database).await
    }

    async fn delete_expense_category(&self, id: &str) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .expense_categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Expense category {}", id)))?;

        database.expense_categories.remove(index);
        self.save_database(&database).await
    }

    async fn list_investments(&self) -> Result<Vec<Investment>> {
        Ok(self.load_database().await?.investments)
    }

    async fn create_investment(&self, investment: Investment) -> Result<()> {
        let mut database = self.load_database().await?;

        if database.investments.iter().any(|i| i.id == investment.id) {
            return Err(ApiError::BadRequest(format!(
                "Investment with ID {} already exists",
                investment.id
            )));
        }

        database.investments.push(investment);
        self.save_database(&database).await
    }

    async fn update_investment(&self, investment: Investment) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .investments
            .iter()
            .position(|i| i.id == investment.id)
            .ok_or_else(|| ApiError::NotFound(format!("Investment {}", investment.id)))?;

        database.investments[index] = investment;
        self.save_database(&database).await
    }

    async fn delete_investment(&self, id: &str) -> Result<()> {
        let mut database = self.load_database().await?;

        let index = database
            .investments
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Investment {}", id)))?;

        database.investments.remove(index);
        self.save_database(&database).await
    }

    async fn get_meta_entradas(&self) -> Result<f64> {
        Ok(self.load_database().await?.meta_entradas)
    }

    async fn set_meta_entradas(&self, value: f64) -> Result<()> {
        let mut database = self.load_database().await?;
        database.meta_entradas = value;
        self.save_database(&database).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::IncomeStatus;

    fn entry(id: &str, valor: f64) -> IncomeEntry {
        IncomeEntry {
            id: id.to_string(),
            valor,
            descricao: "test".to_string(),
            data: None,
            pessoa: "Ana".to_string(),
            status: IncomeStatus::Entrada,
            tags: vec![],
            notas: None,
        }
    }

    fn repo() -> (tempfile::TempDir, FilePlannerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePlannerRepository::new(dir.path().join("database.json"));
        (dir, repo)
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty_database() {
        let (_dir, repo) = repo();
        assert!(repo.list_income_entries().await.unwrap().is_empty());
        assert_eq!(repo.get_meta_entradas().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_income_entry_round_trip_preserves_order() {
        let (_dir, repo) = repo();
        repo.create_income_entry(entry("a", 100.0)).await.unwrap();
        repo.create_income_entry(entry("b", 200.0)).await.unwrap();
        repo.create_income_entry(entry("c", 300.0)).await.unwrap();

        let ids: Vec<String> = repo
            .list_income_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let (_dir, repo) = repo();
        repo.create_income_entry(entry("a", 100.0)).await.unwrap();
        let result = repo.create_income_entry(entry("a", 999.0)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, repo) = repo();
        repo.create_income_entry(entry("a", 100.0)).await.unwrap();

        repo.update_income_entry(entry("a", 150.0)).await.unwrap();
        let entries = repo.list_income_entries().await.unwrap();
        assert_eq!(entries[0].valor, 150.0);

        repo.delete_income_entry("a").await.unwrap();
        assert!(repo.list_income_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_entry_is_not_found() {
        let (_dir, repo) = repo();
        let result = repo.update_income_entry(entry("ghost", 1.0)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let result = repo.delete_income_entry("ghost").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_meta_entradas_round_trip() {
        let (_dir, repo) = repo();
        repo.set_meta_entradas(25000.0).await.unwrap();
        assert_eq!(repo.get_meta_entradas().await.unwrap(), 25000.0);
    }
}
