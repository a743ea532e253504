//! Typed client for the expense API: remote calls, token storage, the
//! client-side state container and the item form that drives it.

pub mod api;
pub mod form;
pub mod state;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ClientError, ExpenseApi, ExpenseClient, ExpenseDraft};
pub use form::{Banner, BannerKind, FormEvent, FormFields, FormMode, ItemForm, BANNER_TTL};
pub use state::{ConnectionStatus, ExpenseState, Section};
pub use token::{FileTokenStore, StaticToken, TokenError, TokenProvider};
