use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use validator::Validate;

/// A persisted football record with a typed primary key.
///
/// Every repository backend works in terms of this trait: `Id` is the
/// primary key, `Patch` the partial-update payload (all fields optional,
/// field names matching the entity) and `Filter` the typed equivalent of a
/// `WHERE` clause.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    type Id: Clone + Ord + Debug + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Patch: Serialize + DeserializeOwned + Debug + Send + Sync + 'static;
    type Filter: Default + Debug + Send + Sync + 'static;

    /// Human readable name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    /// Refresh the bookkeeping timestamps before a write.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Take over the creation time of the row this one replaces.
    fn keep_created_at(&mut self, _stored: &Self) {}

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Natural keys that must be unique across the table besides the primary key.
    fn unique_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Foreign keys this row holds. Nullable columns only count when set.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A foreign key value: the referenced entity and its primary key as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub entity: &'static str,
    pub id: String,
}

impl Reference {
    pub fn to<T: Entity>(id: &T::Id) -> Self {
        Reference {
            entity: T::NAME,
            id: id.to_string(),
        }
    }
}

/// Applies the present (non-null) fields of `patch` on top of `current`.
///
/// Fields are matched by their serialized names, so a patch can never clear
/// a column, only overwrite it.
pub fn merge_patch<E: Entity>(current: &E, patch: &E::Patch) -> Result<E, serde_json::Error> {
    let mut merged = serde_json::to_value(current)?;
    let changes = serde_json::to_value(patch)?;
    if let (Value::Object(fields), Value::Object(changed)) = (&mut merged, changes) {
        for (key, value) in changed {
            if !value.is_null() {
                fields.insert(key, value);
            }
        }
    }
    serde_json::from_value(merged)
}

pub(crate) fn stamp(
    created_at: &mut Option<DateTime<Utc>>,
    updated_at: &mut Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) {
    if created_at.is_none() {
        *created_at = Some(now);
    }
    *updated_at = Some(now);
}
