//! In-process `ExpenseApi` for unit tests, backed by a `MemoryStore`.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::api::{ClientError, ExpenseApi, ExpenseDraft};
use crate::models::{Expense, ExpensePayload, NewExpense};
use crate::store::{ExpenseStore, MemoryStore};

pub struct FakeApi {
    store: MemoryStore,
    owner: Uuid,
    unauthorized: AtomicBool,
    garbled: AtomicBool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            owner: Uuid::new_v4(),
            unauthorized: AtomicBool::new(false),
            garbled: AtomicBool::new(false),
        }
    }

    pub async fn seed(&self, title: &str, value: f64) -> Expense {
        let fields = NewExpense { title: title.into(), category: crate::models::Category::Food, value };
        self.store.create(self.owner, fields).await.unwrap()
    }

    /// Make every subsequent call fail with 401 until reset
    pub fn fail_with_unauthorized(&self, on: bool) {
        self.unauthorized.store(on, Ordering::SeqCst);
    }

    /// Answer every subsequent call with a body that is not JSON
    pub fn fail_with_garbled_body(&self, on: bool) {
        self.garbled.store(on, Ordering::SeqCst);
    }

    fn gate(&self) -> Result<(), ClientError> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized("Invalid or expired token".into()));
        }
        if self.garbled.load(Ordering::SeqCst) {
            let err = serde_json::from_str::<serde_json::Value>("<html>502 Bad Gateway</html>").unwrap_err();
            return Err(ClientError::Decode(err));
        }
        Ok(())
    }

    fn fields(draft: &ExpenseDraft) -> Result<NewExpense, ClientError> {
        let payload: ExpensePayload = serde_json::from_value(json!(draft)).map_err(ClientError::Decode)?;
        payload.validate().map_err(|field_errors| ClientError::Validation {
            message: "Missing or invalid fields".into(),
            field_errors,
        })
    }

    fn not_found(id: Uuid) -> ClientError {
        ClientError::NotFound(format!("Expense {} not found", id))
    }
}

#[async_trait]
impl ExpenseApi for FakeApi {
    async fn list(&self) -> Result<Vec<Expense>, ClientError> {
        self.gate()?;
        Ok(self.store.list(self.owner).await.unwrap())
    }

    async fn get(&self, id: Uuid) -> Result<Expense, ClientError> {
        self.gate()?;
        self.store.get(self.owner, id).await.unwrap().ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &ExpenseDraft) -> Result<Expense, ClientError> {
        self.gate()?;
        let fields = Self::fields(draft)?;
        Ok(self.store.create(self.owner, fields).await.unwrap())
    }

    async fn update(&self, id: Uuid, draft: &ExpenseDraft) -> Result<Expense, ClientError> {
        self.gate()?;
        let fields = Self::fields(draft)?;
        self.store
            .update(self.owner, id, fields)
            .await
            .unwrap()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.gate()?;
        if self.store.delete(self.owner, id).await.unwrap() {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }
}
