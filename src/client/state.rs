use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::api::{ClientError, ExpenseApi, ExpenseDraft};
use crate::models::Expense;

/// What the client last learned about the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    AuthFailed,
    Disconnected,
}

impl ConnectionStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Backend Working!",
            ConnectionStatus::AuthFailed => "Auth Failed - Please Login",
            ConnectionStatus::Disconnected => "Backend not connected",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Active client view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Section {
    #[default]
    Home,
    Expenses,
    About,
}

/// Client-side cache of the caller's expenses.
///
/// Owned by the front end and passed by reference. Items only change through
/// `refresh` (wholesale) or a successful mutation (patched from the server's
/// response); a failed remote call leaves them untouched.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    items: Vec<Expense>,
    status: ConnectionStatus,
    section: Section,
}

impl Default for ExpenseState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpenseState {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            status: ConnectionStatus::Connecting,
            section: Section::Home,
        }
    }

    pub fn items(&self) -> &[Expense] {
        &self.items
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn status_message(&self) -> &'static str {
        self.status.message()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn find(&self, id: Uuid) -> Option<&Expense> {
        self.items.iter().find(|e| e.id == id)
    }

    /// Switch view and resynchronize with the backend
    pub async fn activate(&mut self, section: Section, api: &dyn ExpenseApi) {
        self.section = section;
        self.refresh(api).await;
    }

    /// Replace the local list with the server's, updating the status either way
    pub async fn refresh(&mut self, api: &dyn ExpenseApi) {
        match api.list().await {
            Ok(items) => {
                tracing::debug!("Fetched {} expenses", items.len());
                self.items = items;
                self.status = ConnectionStatus::Connected;
            }
            Err(e @ (ClientError::Network(_) | ClientError::Decode(_))) => {
                tracing::warn!("Fetch failed: {}", e);
                self.status = ConnectionStatus::Disconnected;
            }
            Err(e) => {
                tracing::warn!("Fetch rejected: {}", e);
                self.status = ConnectionStatus::AuthFailed;
            }
        }
    }

    pub async fn add(&mut self, draft: &ExpenseDraft, api: &dyn ExpenseApi) -> Result<&Expense, ClientError> {
        match api.create(draft).await {
            Ok(created) => {
                self.items.push(created);
                Ok(&self.items[self.items.len() - 1])
            }
            Err(e) => {
                tracing::warn!("Add failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn update(&mut self, id: Uuid, draft: &ExpenseDraft, api: &dyn ExpenseApi) -> Result<&Expense, ClientError> {
        let updated = match api.update(id, draft).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!("Update failed: {}", e);
                return Err(e);
            }
        };

        match self.items.iter().position(|e| e.id == id) {
            Some(index) => {
                self.items[index] = updated;
                Ok(&self.items[index])
            }
            // Not cached locally (e.g. list never fetched); keep the server's copy
            None => {
                self.items.push(updated);
                Ok(&self.items[self.items.len() - 1])
            }
        }
    }

    pub async fn remove(&mut self, id: Uuid, api: &dyn ExpenseApi) -> Result<(), ClientError> {
        if let Err(e) = api.delete(id).await {
            tracing::warn!("Delete failed: {}", e);
            return Err(e);
        }
        self.items.retain(|e| e.id != id);
        Ok(())
    }

    /// Drop the local list without touching the backend
    pub fn clear_local(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeApi;

    fn draft(title: &str, value: f64) -> ExpenseDraft {
        ExpenseDraft { title: title.into(), category: "Food".into(), value }
    }

    #[tokio::test]
    async fn activate_fetches_list() {
        let api = FakeApi::new();
        api.seed("Coffee", 5.0).await;
        let mut state = ExpenseState::new();
        assert_eq!(state.status(), ConnectionStatus::Connecting);

        state.activate(Section::Expenses, &api).await;
        assert_eq!(state.section(), Section::Expenses);
        assert_eq!(state.status(), ConnectionStatus::Connected);
        assert_eq!(state.status_message(), "Backend Working!");
        assert_eq!(state.items().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_refresh_keeps_items() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        state.add(&draft("Coffee", 5.0), &api).await.unwrap();

        api.fail_with_unauthorized(true);
        state.refresh(&api).await;
        assert_eq!(state.status(), ConnectionStatus::AuthFailed);
        assert_eq!(state.items().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_body_reports_disconnected() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        state.add(&draft("Coffee", 5.0), &api).await.unwrap();

        api.fail_with_garbled_body(true);
        state.refresh(&api).await;
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
        assert_eq!(state.status_message(), "Backend not connected");
        assert_eq!(state.items().len(), 1);
    }

    #[tokio::test]
    async fn mutations_patch_local_state() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();

        let id = state.add(&draft("Coffee", 5.0), &api).await.unwrap().id;
        state.add(&draft("Tea", 3.0), &api).await.unwrap();

        let updated = state.update(id, &draft("Coffee", 10.0), &api).await.unwrap();
        assert_eq!(updated.value, 10.0);
        assert_eq!(state.items()[0].id, id);
        assert_eq!(state.items()[0].value, 10.0);

        state.remove(id, &api).await.unwrap();
        assert!(state.find(id).is_none());
        assert_eq!(state.items().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutations_leave_state_unchanged() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let id = state.add(&draft("Coffee", 5.0), &api).await.unwrap().id;
        let before = state.items().to_vec();

        api.fail_with_unauthorized(true);
        assert!(state.add(&draft("Tea", 3.0), &api).await.is_err());
        assert!(state.update(id, &draft("Coffee", 10.0), &api).await.is_err());
        assert!(state.remove(id, &api).await.is_err());
        assert_eq!(state.items(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_of_missing_record_is_not_found() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let id = state.add(&draft("Coffee", 5.0), &api).await.unwrap().id;

        state.remove(id, &api).await.unwrap();
        assert!(matches!(state.remove(id, &api).await, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn clear_local_skips_backend() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        state.add(&draft("Coffee", 5.0), &api).await.unwrap();

        state.clear_local();
        assert!(state.items().is_empty());
        assert_eq!(api.list().await.unwrap().len(), 1);
    }
}
