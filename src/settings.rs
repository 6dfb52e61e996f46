use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnalyticsError, Result};

/// Labels written into order records when the source sheet leaves them blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ImportDefaults {
    #[schemars(description = "Platform used for rows without a channel")]
    pub platform: String,

    #[schemars(description = "Product group used for rows without a group")]
    pub product_group: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            platform: "Other".to_string(),
            product_group: "General".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardSettings {
    #[schemars(description = "Directory holding the persisted dataset blobs")]
    pub storage_dir: PathBuf,

    #[schemars(description = "Storage key of the serialized order records")]
    pub sales_key: String,

    #[schemars(description = "Storage key of the serialized expense table")]
    pub expenses_key: String,

    pub import_defaults: ImportDefaults,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("data"),
            sales_key: "ecommerce_sales_data".to_string(),
            expenses_key: "ecommerce_expenses".to_string(),
            import_defaults: ImportDefaults::default(),
        }
    }
}

impl DashboardSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sales_key.trim().is_empty() || self.expenses_key.trim().is_empty() {
            return Err(AnalyticsError::InvalidSettings(
                "storage keys must not be blank".to_string(),
            ));
        }

        if self.sales_key == self.expenses_key {
            return Err(AnalyticsError::InvalidSettings(format!(
                "sales and expenses share the storage key '{}'",
                self.sales_key
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DashboardSettings::default();
        assert_eq!(settings.sales_key, "ecommerce_sales_data");
        assert_eq!(settings.expenses_key, "ecommerce_expenses");
        assert_eq!(settings.import_defaults.platform, "Other");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = DashboardSettings::from_json_str(
            r#"{"storage_dir": "/var/lib/dashboard", "import_defaults": {"platform": "Diğer"}}"#,
        )
        .unwrap();
        assert_eq!(settings.storage_dir, PathBuf::from("/var/lib/dashboard"));
        assert_eq!(settings.import_defaults.platform, "Diğer");
        assert_eq!(settings.import_defaults.product_group, "General");
        assert_eq!(settings.sales_key, "ecommerce_sales_data");
    }

    #[test]
    fn test_rejects_clashing_keys() {
        let result = DashboardSettings::from_json_str(r#"{"sales_key": "x", "expenses_key": "x"}"#);
        assert!(matches!(result, Err(AnalyticsError::InvalidSettings(_))));

        let result = DashboardSettings::from_json_str(r#"{"sales_key": "  "}"#);
        assert!(matches!(result, Err(AnalyticsError::InvalidSettings(_))));
    }
}
