use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fixed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Travel,
    Work,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Food, Category::Travel, Category::Work, Category::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Work => "Work",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!("Category must be one of: Food, Travel, Work, Other (got '{}')", s)
            })
    }
}

/// A persisted expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub value: f64,
    #[serde(skip_serializing, default = "Uuid::nil")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current time at the microsecond precision PostgreSQL stores
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Expense {
    pub fn new(owner_id: Uuid, fields: NewExpense) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            category: fields.category,
            value: fields.value,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the mutable fields, keeping identity, owner and creation time
    pub fn apply(&mut self, fields: NewExpense) {
        self.title = fields.title;
        self.category = fields.category;
        self.value = fields.value;
        self.updated_at = timestamp_now();
    }
}

/// Validated create/update fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub category: Category,
    pub value: f64,
}

/// Request body for create and update, as it arrives on the wire.
///
/// Every field is optional so missing ones can be reported together. Unknown
/// fields (`id`, `_id`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePayload {
    pub title: Option<Value>,
    pub category: Option<Value>,
    pub value: Option<Value>,
}

impl ExpensePayload {
    /// Validate into `NewExpense`, collecting one message per bad field
    pub fn validate(self) -> Result<NewExpense, HashMap<String, String>> {
        let mut field_errors = HashMap::new();

        let title = match text_field(self.title) {
            Ok(t) => Some(t),
            Err(msg) => {
                field_errors.insert("title".to_string(), msg.to_string());
                None
            }
        };

        let category = match text_field(self.category) {
            Ok(raw) => match raw.parse::<Category>() {
                Ok(c) => Some(c),
                Err(msg) => {
                    field_errors.insert("category".to_string(), msg);
                    None
                }
            },
            Err(msg) => {
                field_errors.insert("category".to_string(), msg.to_string());
                None
            }
        };

        let value = match self.value {
            None | Some(Value::Null) => {
                field_errors.insert("value".to_string(), "This field is required".to_string());
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                field_errors.insert("value".to_string(), "This field is required".to_string());
                None
            }
            Some(raw) => match parse_amount(&raw) {
                Some(v) => Some(v),
                None => {
                    field_errors.insert("value".to_string(), "Value must be a number".to_string());
                    None
                }
            },
        };

        match (title, category, value) {
            (Some(title), Some(category), Some(value)) => Ok(NewExpense { title, category, value }),
            _ => Err(field_errors),
        }
    }
}

/// A required string field, trimmed
fn text_field(raw: Option<Value>) -> Result<String, &'static str> {
    match raw {
        None | Some(Value::Null) => Err("This field is required"),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err("This field is required")
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err("Must be a string"),
    }
}

fn parse_amount(raw: &Value) -> Option<f64> {
    let v = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}
