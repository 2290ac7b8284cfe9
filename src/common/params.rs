use serde::{Deserialize, Serialize};

/// Source column names for the four fields of a sales line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub product_code: String,
    pub product_description: String,
    pub month: String,
    pub quantity: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            product_code: "PRODUCT_CODE".to_string(),
            product_description: "PRODUCT_DESCRIPTION".to_string(),
            month: "MONTH".to_string(),
            quantity: "QUANTITY".to_string(),
        }
    }
}

impl ColumnNames {
    /// All four names, in code, description, month, quantity order.
    pub fn all(&self) -> [&str; 4] {
        [
            &self.product_code,
            &self.product_description,
            &self.month,
            &self.quantity,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = ColumnNames::default();
        assert_eq!(
            names.all(),
            ["PRODUCT_CODE", "PRODUCT_DESCRIPTION", "MONTH", "QUANTITY"]
        );
    }

    #[test]
    fn test_partial_override_from_json() {
        let names: ColumnNames = serde_json::from_str(r#"{"month": "period"}"#).unwrap();
        assert_eq!(names.month, "period");
        assert_eq!(names.product_code, "PRODUCT_CODE");
    }
}
