//! Field access for records that can be searched.

use std::collections::{BTreeMap, HashMap};

use crate::value::Value;

/// Trait for types whose fields can be read by key.
///
/// Return `None` for keys the type does not know; the translator reports
/// those as [`SearchError::UnknownField`](crate::SearchError::UnknownField).
/// Return `Some(Value::Null)` for known fields that hold no value.
///
/// ```
/// use search_criteria::{CriteriaSequence, Number, Searchable, Value};
///
/// struct Task {
///     name: String,
///     priority: u8,
///     owner: Option<String>,
/// }
///
/// impl Searchable for Task {
///     fn field_value(&self, key: &str) -> Option<Value<'_>> {
///         match key {
///             "name" => Some(Value::String(&self.name)),
///             "priority" => Some(Value::Number(Number::from(self.priority))),
///             "owner" => Some(Value::from(self.owner.as_deref())),
///             _ => None,
///         }
///     }
/// }
///
/// let tasks = vec![
///     Task { name: "a".into(), priority: 3, owner: None },
///     Task { name: "b".into(), priority: 1, owner: Some("kim".into()) },
/// ];
/// let filter = CriteriaSequence::parse("owner@null;|priority>2").unwrap().compile().unwrap();
/// assert_eq!(filter.count(&tasks, Task::accessor).unwrap(), 1);
/// ```
pub trait Searchable {
    /// Returns the value of `key`, or `None` if there is no such field.
    fn field_value(&self, key: &str) -> Option<Value<'_>>;

    /// Adapter usable wherever an accessor function is expected.
    fn accessor<'a>(item: &'a Self, key: &str) -> Option<Value<'a>>
    where
        Self: Sized,
    {
        item.field_value(key)
    }
}

/// String maps expose every entry as a text field.
impl Searchable for HashMap<String, String> {
    fn field_value(&self, key: &str) -> Option<Value<'_>> {
        self.get(key).map(|v| Value::String(v))
    }
}

impl Searchable for BTreeMap<String, String> {
    fn field_value(&self, key: &str) -> Option<Value<'_>> {
        self.get(key).map(|v| Value::String(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Number;

    struct Item {
        name: String,
        count: i32,
        note: Option<String>,
    }

    impl Searchable for Item {
        fn field_value(&self, key: &str) -> Option<Value<'_>> {
            match key {
                "name" => Some(Value::String(&self.name)),
                "count" => Some(Value::Number(Number::from(self.count))),
                "note" => Some(Value::from(self.note.as_deref())),
                _ => None,
            }
        }
    }

    #[test]
    fn manual_impl() {
        let item = Item {
            name: "test".to_string(),
            count: 42,
            note: None,
        };

        assert_eq!(item.field_value("name"), Some(Value::String("test")));
        assert_eq!(item.field_value("count"), Some(Value::Number(Number::I64(42))));
        assert_eq!(item.field_value("note"), Some(Value::Null));
        assert_eq!(item.field_value("unknown"), None);
        assert_eq!(Item::accessor(&item, "name"), Some(Value::String("test")));
    }

    #[test]
    fn string_maps() {
        let mut map = HashMap::new();
        map.insert("city".to_string(), "Oslo".to_string());
        assert_eq!(map.field_value("city"), Some(Value::String("Oslo")));
        assert_eq!(map.field_value("zip"), None);

        let tree: BTreeMap<String, String> = map.into_iter().collect();
        assert_eq!(tree.field_value("city"), Some(Value::String("Oslo")));
    }
}
