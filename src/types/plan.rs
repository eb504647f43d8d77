//! Action Plan Types
//!
//! A plan is a list of days, each with a focus and a list of actions.
//! Actions are produced in two stages: a skeleton carrying identity and
//! classification fields, then per-action details merged in afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils::slugify;

/// Marker step written into actions whose detail generation failed
pub const DETAILS_FAILED_STEP: &str = "Error: Could not generate implementation steps.";

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Technical,
    ContentUpdate,
    NewContent,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unspecified,
}

// =============================================================================
// Skeleton (stage 1)
// =============================================================================

/// Identity and classification fields of an action, pending detail enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItemSkeleton {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_keyword: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub action_type: ActionType,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient::number")]
    pub impact: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub estimated_time: String,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub dependencies: Vec<String>,
}

impl ActionItemSkeleton {
    /// Stable id: the provided one, or a slug of the title when missing
    pub fn resolved_id(&self) -> String {
        if self.id.trim().is_empty() {
            slugify(&self.title)
        } else {
            self.id.clone()
        }
    }
}

// =============================================================================
// Details (stage 2)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ToolRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<Value> for ToolRef {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => Self {
                name: lenient::field_text(&value, "name"),
                url: lenient::scalar_text(value.get("url").unwrap_or(&Value::Null)),
            },
            other => Self {
                name: lenient::scalar_text(&other).unwrap_or_default(),
                url: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PromptTemplate {
    pub title: String,
    pub prompt: String,
}

impl From<Value> for PromptTemplate {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => Self {
                title: lenient::field_text(&value, "title"),
                prompt: lenient::field_text(&value, "prompt"),
            },
            other => Self {
                title: String::new(),
                prompt: lenient::scalar_text(&other).unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ChecklistItem {
    pub item: String,
    pub checked: bool,
}

impl From<Value> for ChecklistItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => Self {
                item: lenient::field_text(&value, "item"),
                checked: value.get("checked").and_then(Value::as_bool).unwrap_or(false),
            },
            other => Self {
                item: lenient::scalar_text(&other).unwrap_or_default(),
                checked: false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct SuccessMetric {
    pub method: String,
    pub metric: String,
}

impl From<Value> for SuccessMetric {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => Self {
                method: lenient::field_text(&value, "method"),
                metric: lenient::field_text(&value, "metric"),
            },
            other => Self {
                method: String::new(),
                metric: lenient::scalar_text(&other).unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct NextStep {
    pub action: String,
    pub rationale: String,
}

impl From<Value> for NextStep {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) => Self {
                action: lenient::field_text(&value, "action"),
                rationale: lenient::field_text(&value, "rationale"),
            },
            other => Self {
                action: lenient::scalar_text(&other).unwrap_or_default(),
                rationale: String::new(),
            },
        }
    }
}

/// Enrichment fields produced per action by the detail stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItemDetails {
    #[serde(default, deserialize_with = "lenient::list")]
    pub tools_required: Vec<ToolRef>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub step_by_step_implementation: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub prompts: Vec<PromptTemplate>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub verification_checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub success_verification: Vec<SuccessMetric>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub next_steps: Vec<NextStep>,
}

impl ActionItemDetails {
    /// Placeholder details for an action whose enrichment failed
    pub fn failed() -> Self {
        Self {
            step_by_step_implementation: vec![DETAILS_FAILED_STEP.to_string()],
            ..Self::default()
        }
    }
}

// =============================================================================
// Merged action
// =============================================================================

/// A fully merged action: skeleton fields plus details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(flatten)]
    pub skeleton: ActionItemSkeleton,
    #[serde(flatten)]
    pub details: ActionItemDetails,
    #[serde(default)]
    pub completed: bool,
}

impl ActionItem {
    pub fn from_parts(skeleton: ActionItemSkeleton, details: ActionItemDetails) -> Self {
        let id = skeleton.resolved_id();
        Self {
            skeleton: ActionItemSkeleton { id, ..skeleton },
            details,
            completed: false,
        }
    }

    /// Degraded placeholder that keeps the plan structurally complete
    pub fn placeholder(skeleton: ActionItemSkeleton) -> Self {
        Self::from_parts(skeleton, ActionItemDetails::failed())
    }

    pub fn is_placeholder(&self) -> bool {
        self.details.step_by_step_implementation == [DETAILS_FAILED_STEP]
    }
}

// =============================================================================
// Plan days
// =============================================================================

/// One day of the plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDay<A> {
    #[serde(deserialize_with = "lenient::day")]
    pub day: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub focus: String,
    pub actions: Vec<A>,
}

/// A day of the coarse plan returned by the skeleton stage
pub type SkeletonDay = PlanDay<ActionItemSkeleton>;

/// A day of the final, merged plan
pub type DailyActionPlan = PlanDay<ActionItem>;

/// Envelope the skeleton stage responds with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonResponse {
    pub action_plan: Vec<SkeletonDay>,
}

/// Total number of actions across all days
pub fn count_actions<A>(plan: &[PlanDay<A>]) -> usize {
    plan.iter().map(|d| d.actions.len()).sum()
}

// =============================================================================
// Lenient decoding
// =============================================================================

/// Model output is validated structurally before it is decoded, so decoding
/// accepts every shape the validators let through: integral floats for day
/// numbers, null lists, numbers where text is expected, and bare strings for
/// list entries.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is, numbers and booleans printed, anything else `None`
    pub fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn field_text(value: &Value, key: &str) -> String {
        value.get(key).and_then(scalar_text).unwrap_or_default()
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(&Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(&Value::deserialize(deserializer)?))
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    /// Any non-negative JSON number, rounded; numeric strings too
    pub fn day<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let raw = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match raw {
            Some(day) if day.is_finite() && day >= 0.0 => {
                Ok(day.round().min(f64::from(u32::MAX)) as u32)
            }
            _ => Err(serde::de::Error::custom(format!(
                "invalid day number: {}",
                value
            ))),
        }
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(T::deserialize(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    /// Array of text entries; null or a non-array is empty
    pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            _ => Vec::new(),
        })
    }

    /// Array of entries built from arbitrary values; null or a non-array is empty
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<Value>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().map(T::from).collect(),
            _ => Vec::new(),
        })
    }
}
