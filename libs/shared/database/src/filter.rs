use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Equality filter with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn newest_first(self) -> Self {
        self.order("createdAt", SortDirection::Desc)
    }

    pub fn order(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field).unwrap_or(&Value::Null) == expected)
    }

    /// Renders the filter as a PostgREST query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = self
            .conditions
            .iter()
            .map(|(field, value)| match value {
                Value::Null => format!("{}=is.null", field),
                Value::String(s) => format!("{}=eq.{}", field, urlencoding::encode(s)),
                other => format!("{}=eq.{}", field, urlencoding::encode(&other.to_string())),
            })
            .collect();

        if let Some((field, direction)) = &self.order_by {
            let dir = match direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            parts.push(format!("order={}.{}", field, dir));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }

        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_string_encodes_conditions_order_and_limit() {
        let filter = Filter::new()
            .eq("doctor_id", "doc 1")
            .eq("is_read", false)
            .newest_first()
            .limit(5);

        assert_eq!(
            filter.to_query_string(),
            "doctor_id=eq.doc%201&is_read=eq.false&order=createdAt.desc&limit=5"
        );
    }

    #[test]
    fn null_condition_uses_is_operator() {
        let filter = Filter::new().eq("role", Value::Null);
        assert_eq!(filter.to_query_string(), "role=is.null");
    }

    #[test]
    fn matches_treats_missing_fields_as_null() {
        let doc = json!({ "doctor_id": "doc1" });
        assert!(Filter::new().eq("doctor_id", "doc1").matches(&doc));
        assert!(!Filter::new().eq("doctor_id", "doc2").matches(&doc));
        assert!(Filter::new().eq("role", Value::Null).matches(&doc));
        assert!(Filter::new().matches(&doc));
    }
}
