use serde_json::Value;

/// A page of records, whatever shape the endpoint answered with.
///
/// FlickList endpoints return either a bare array, `{results: [...], total_pages}`
/// or `{items: [...]}`. Everything past the client sees only this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginatedResult {
    pub items: Vec<Value>,
    pub total_pages: u32,
}

impl PaginatedResult {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self { items, total_pages: 1 },
            Value::Object(mut map) => {
                let total_pages = map
                    .get("total_pages")
                    .and_then(Value::as_u64)
                    .map(|pages| pages.min(u32::MAX as u64) as u32)
                    .unwrap_or(1);
                let items = match map.remove("results").or_else(|| map.remove("items")) {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                Self { items, total_pages }
            }
            _ => Self { items: Vec::new(), total_pages: 1 },
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
