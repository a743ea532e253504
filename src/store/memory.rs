use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ExpenseStore, StoreError};
use crate::models::{Expense, NewExpense};

/// In-process store. Records are kept in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Expense>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all owners
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn create(&self, owner: Uuid, fields: NewExpense) -> Result<Expense, StoreError> {
        let expense = Expense::new(owner, fields);
        self.records.write().await.push(expense.clone());
        Ok(expense)
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|e| e.owner_id == owner).cloned().collect())
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Expense>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|e| e.id == id && e.owner_id == owner).cloned())
    }

    async fn update(&self, owner: Uuid, id: Uuid, fields: NewExpense) -> Result<Option<Expense>, StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|e| e.id == id && e.owner_id == owner) {
            Some(expense) => {
                expense.apply(fields);
                Ok(Some(expense.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|e| !(e.id == id && e.owner_id == owner));
        Ok(records.len() != before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
