//! Create/edit form for a single expense.
//!
//! One edit buffer serves both modes. Local events go through `apply`; the
//! async `submit`/`delete` delegate to `ExpenseState` and, on success, reset
//! the buffer and raise a banner that expires after `BANNER_TTL`.

use std::time::{Duration, Instant};
use uuid::Uuid;

use super::api::{ClientError, ExpenseApi, ExpenseDraft};
use super::state::ExpenseState;
use crate::models::Expense;

pub const BANNER_TTL: Duration = Duration::from_secs(3);

pub const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required!";
pub const INVALID_AMOUNT_MESSAGE: &str = "Amount must be a number";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub title: String,
    pub category: String,
    pub value: String,
}

impl FormFields {
    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.category.trim().is_empty() && !self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub kind: BannerKind,
    pub shown_at: Instant,
}

impl Banner {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < BANNER_TTL
    }
}

/// Local form events
#[derive(Debug, Clone)]
pub enum FormEvent<'a> {
    SetTitle(String),
    SetCategory(String),
    SetValue(String),
    BeginEdit(&'a Expense),
    CancelEdit,
}

#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    fields: FormFields,
    mode: FormMode,
    error: Option<String>,
    banner: Option<Banner>,
}

impl ItemForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The banner, if one was raised less than `BANNER_TTL` before `now`
    pub fn banner_at(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| b.is_visible_at(now))
    }

    pub fn apply(&mut self, event: FormEvent<'_>) {
        match event {
            FormEvent::SetTitle(v) => {
                self.fields.title = v;
                self.error = None;
            }
            FormEvent::SetCategory(v) => {
                self.fields.category = v;
                self.error = None;
            }
            FormEvent::SetValue(v) => {
                self.fields.value = v;
                self.error = None;
            }
            FormEvent::BeginEdit(expense) => {
                self.mode = FormMode::Editing(expense.id);
                self.fields = FormFields {
                    title: expense.title.clone(),
                    category: expense.category.to_string(),
                    value: expense.value.to_string(),
                };
                self.error = None;
            }
            FormEvent::CancelEdit => self.reset(),
        }
    }

    /// Validate locally, then create or update through `state`.
    ///
    /// Returns `Ok(None)` when local validation blocked the submit (see
    /// `error()`), `Ok(Some(expense))` on success.
    pub async fn submit(
        &mut self,
        state: &mut ExpenseState,
        api: &dyn ExpenseApi,
        now: Instant,
    ) -> Result<Option<Expense>, ClientError> {
        let draft = match self.draft() {
            Ok(draft) => draft,
            Err(msg) => {
                self.error = Some(msg.to_string());
                return Ok(None);
            }
        };

        let result = match self.mode {
            FormMode::Creating => state.add(&draft, api).await.cloned(),
            FormMode::Editing(id) => state.update(id, &draft, api).await.cloned(),
        };

        match result {
            Ok(expense) => {
                let (message, kind) = match self.mode {
                    FormMode::Creating => ("Item added successfully!", BannerKind::Success),
                    FormMode::Editing(_) => ("Item updated successfully!", BannerKind::Warning),
                };
                self.show_banner(message, kind, now);
                self.reset();
                Ok(Some(expense))
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn delete(
        &mut self,
        id: Uuid,
        state: &mut ExpenseState,
        api: &dyn ExpenseApi,
        now: Instant,
    ) -> Result<(), ClientError> {
        match state.remove(id, api).await {
            Ok(()) => {
                self.show_banner("Item deleted successfully!", BannerKind::Danger, now);
                if self.mode == FormMode::Editing(id) {
                    self.reset();
                }
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn draft(&self) -> Result<ExpenseDraft, &'static str> {
        if !self.fields.is_complete() {
            return Err(REQUIRED_FIELDS_MESSAGE);
        }
        let value = self
            .fields
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(INVALID_AMOUNT_MESSAGE)?;

        Ok(ExpenseDraft {
            title: self.fields.title.trim().to_string(),
            category: self.fields.category.trim().to_string(),
            value,
        })
    }

    fn reset(&mut self) {
        self.fields = FormFields::default();
        self.mode = FormMode::Creating;
        self.error = None;
    }

    fn show_banner(&mut self, message: &str, kind: BannerKind, now: Instant) {
        self.banner = Some(Banner {
            message: message.to_string(),
            kind,
            shown_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeApi;

    fn fill(form: &mut ItemForm, title: &str, category: &str, value: &str) {
        form.apply(FormEvent::SetTitle(title.into()));
        form.apply(FormEvent::SetCategory(category.into()));
        form.apply(FormEvent::SetValue(value.into()));
    }

    #[tokio::test]
    async fn empty_field_blocks_submit() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        fill(&mut form, "Coffee", "", "5");

        let outcome = form.submit(&mut state, &api, Instant::now()).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(form.error(), Some(REQUIRED_FIELDS_MESSAGE));
        assert!(state.items().is_empty());
        assert_eq!(form.fields().title, "Coffee");

        form.apply(FormEvent::SetCategory("Food".into()));
        assert_eq!(form.error(), None);
    }

    #[tokio::test]
    async fn non_numeric_amount_blocks_submit() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        fill(&mut form, "Coffee", "Food", "five");

        assert!(form.submit(&mut state, &api, Instant::now()).await.unwrap().is_none());
        assert_eq!(form.error(), Some(INVALID_AMOUNT_MESSAGE));
    }

    #[tokio::test]
    async fn create_then_edit_round() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        let now = Instant::now();

        fill(&mut form, "Coffee", "Food", "5");
        let created = form.submit(&mut state, &api, now).await.unwrap().unwrap();
        assert_eq!(created.value, 5.0);
        assert_eq!(form.fields(), &FormFields::default());
        assert_eq!(form.mode(), FormMode::Creating);
        let banner = form.banner_at(now).unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert_eq!(banner.message, "Item added successfully!");

        form.apply(FormEvent::BeginEdit(&created));
        assert_eq!(form.mode(), FormMode::Editing(created.id));
        assert_eq!(form.fields().title, "Coffee");
        assert_eq!(form.fields().value, "5");

        form.apply(FormEvent::SetValue("10".into()));
        let updated = form.submit(&mut state, &api, now).await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].value, 10.0);
        assert_eq!(form.mode(), FormMode::Creating);
        assert_eq!(form.banner_at(now).unwrap().kind, BannerKind::Warning);
    }

    #[tokio::test]
    async fn banner_expires() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        let now = Instant::now();

        fill(&mut form, "Coffee", "Food", "5");
        form.submit(&mut state, &api, now).await.unwrap();
        assert!(form.banner_at(now + Duration::from_millis(2999)).is_some());
        assert!(form.banner_at(now + BANNER_TTL).is_none());
    }

    #[tokio::test]
    async fn cancel_edit_clears_buffer() {
        let api = FakeApi::new();
        let expense = api.seed("Taxi", 12.0).await;
        let mut form = ItemForm::new();

        form.apply(FormEvent::BeginEdit(&expense));
        form.apply(FormEvent::CancelEdit);
        assert_eq!(form.mode(), FormMode::Creating);
        assert_eq!(form.fields(), &FormFields::default());
    }

    #[tokio::test]
    async fn server_rejection_keeps_buffer() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        // Category membership is left to the server
        fill(&mut form, "Gift", "Gifts", "20");

        let err = form.submit(&mut state, &api, Instant::now()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));
        assert!(form.error().unwrap().contains("category"));
        assert_eq!(form.fields().category, "Gifts");
        assert!(form.banner_at(Instant::now()).is_none());
        assert!(state.items().is_empty());
    }

    #[tokio::test]
    async fn delete_raises_danger_banner() {
        let api = FakeApi::new();
        let mut state = ExpenseState::new();
        let mut form = ItemForm::new();
        let now = Instant::now();

        fill(&mut form, "Coffee", "Food", "5");
        let created = form.submit(&mut state, &api, now).await.unwrap().unwrap();

        form.delete(created.id, &mut state, &api, now).await.unwrap();
        assert!(state.items().is_empty());
        assert_eq!(form.banner_at(now).unwrap().kind, BannerKind::Danger);

        assert!(form.delete(created.id, &mut state, &api, now).await.is_err());
    }
}
