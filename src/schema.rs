use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalyticsError, Result};

/// The single order status value that marks a line as returned.
pub const RETURNED_STATUS: &str = "İade Edildi";

/// One order line. Serialized with camelCase keys; the sheet-style keys of
/// older backups (`Platform`, `Ay`, `SiparisTutari`, ...) are accepted on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRecord {
    #[serde(alias = "Platform", deserialize_with = "lenient::text")]
    #[schemars(description = "Sales channel the order came through (e.g. 'Trendyol', 'Web')")]
    pub platform: String,

    #[serde(alias = "SiparisTarihi", deserialize_with = "lenient::text")]
    #[schemars(description = "Order date as it appeared in the source sheet")]
    pub order_date: String,

    #[serde(alias = "Ay", deserialize_with = "lenient::text")]
    #[schemars(
        description = "Free-form month label (e.g. '2025 Ocak'). Used both as grouping key and for chronological ordering."
    )]
    pub period: String,

    #[serde(alias = "SiparisNo", deserialize_with = "lenient::text")]
    pub order_number: String,

    #[serde(alias = "SiparisStatusu", deserialize_with = "lenient::text")]
    #[schemars(
        description = "Order status. 'İade Edildi' marks a return, anything else counts as delivered."
    )]
    pub order_status: String,

    #[serde(alias = "UrunKodu", deserialize_with = "lenient::text")]
    pub product_code: String,

    #[serde(alias = "UrunGrubu", deserialize_with = "lenient::text")]
    pub product_group: String,

    #[serde(alias = "UrunAciklamasi", deserialize_with = "lenient::text")]
    pub product_description: String,

    #[serde(alias = "UrunAdedi", deserialize_with = "lenient::count")]
    #[schemars(with = "u64", description = "Units sold or returned on this line")]
    pub quantity: u64,

    #[serde(alias = "AlisFiyati", deserialize_with = "lenient::number")]
    #[schemars(with = "f64", description = "Cost of goods for the line, VAT exclusive")]
    pub purchase_cost: f64,

    #[serde(alias = "SiparisTutari", deserialize_with = "lenient::number")]
    #[schemars(with = "f64", description = "Order value, VAT inclusive")]
    pub order_amount: f64,

    #[serde(alias = "Komisyon", deserialize_with = "lenient::number")]
    #[schemars(with = "f64")]
    pub commission: f64,

    #[serde(alias = "Kargo", deserialize_with = "lenient::number")]
    #[schemars(with = "f64")]
    pub shipping_cost: f64,

    #[serde(alias = "IadeKargoBedeli", deserialize_with = "lenient::number")]
    #[schemars(with = "f64")]
    pub return_shipping_cost: f64,

    #[serde(alias = "CezaBedeli", deserialize_with = "lenient::number")]
    #[schemars(with = "f64")]
    pub penalty_fee: f64,

    #[serde(alias = "PlatformGideri", deserialize_with = "lenient::number")]
    #[schemars(with = "f64")]
    pub platform_fee: f64,

    #[serde(alias = "SiparisSayisi", deserialize_with = "lenient::count")]
    #[schemars(
        with = "u64",
        description = "Logical orders this line stands for. Zero or missing counts as one."
    )]
    pub order_count: u64,
}

impl OrderRecord {
    pub fn is_return(&self) -> bool {
        self.order_status == RETURNED_STATUS
    }

    pub fn effective_order_count(&self) -> u64 {
        if self.order_count == 0 {
            1
        } else {
            self.order_count
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FixedExpense {
    #[serde(deserialize_with = "lenient::number")]
    #[schemars(with = "f64", description = "Advertising spend for the period")]
    pub marketing: f64,

    #[serde(deserialize_with = "lenient::number")]
    #[schemars(with = "f64", description = "Fixed operating cost for the period")]
    pub operations: f64,
}

/// Fixed costs keyed by the same free-form period labels used on order records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ExpenseTable(BTreeMap<String, FixedExpense>);

impl ExpenseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, period: &str) -> Option<&FixedExpense> {
        self.0.get(period)
    }

    pub fn insert(&mut self, period: impl Into<String>, expense: FixedExpense) {
        self.0.insert(period.into(), expense);
    }

    pub fn add_marketing(&mut self, period: &str, amount: f64) {
        self.0.entry(period.to_string()).or_default().marketing += amount;
    }

    pub fn add_operations(&mut self, period: &str, amount: f64) {
        self.0.entry(period.to_string()).or_default().operations += amount;
    }

    /// Sum of every period in the table.
    pub fn total(&self) -> FixedExpense {
        self.0.values().fold(FixedExpense::default(), |acc, e| FixedExpense {
            marketing: acc.marketing + e.marketing,
            operations: acc.operations + e.operations,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FixedExpense)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FixedExpense)> for ExpenseTable {
    fn from_iter<I: IntoIterator<Item = (String, FixedExpense)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The export/import document: every order line plus the fixed expense table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SalesSnapshot {
    #[schemars(description = "All order lines, sales and returns")]
    pub sales: Vec<OrderRecord>,

    #[serde(default)]
    #[schemars(description = "Fixed marketing and operations costs keyed by period label")]
    pub expenses: ExpenseTable,
}

impl SalesSnapshot {
    pub fn new(sales: Vec<OrderRecord>, expenses: ExpenseTable) -> Self {
        Self { sales, expenses }
    }

    /// Parses a backup document. A `sales` array is mandatory, `expenses` may be omitted.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;

        match value.get("sales") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => {
                return Err(AnalyticsError::InvalidSnapshot(
                    "'sales' must be an array".to_string(),
                ))
            }
            None => {
                return Err(AnalyticsError::InvalidSnapshot(
                    "missing top-level 'sales' array".to_string(),
                ))
            }
        }

        let mut value = value;
        if let Some(obj) = value.as_object_mut() {
            if obj.get("expenses").map_or(true, |e| e.is_null()) {
                obj.insert(
                    "expenses".to_string(),
                    serde_json::Value::Object(Default::default()),
                );
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SalesSnapshot)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Coercion rules shared by snapshot deserialization and sheet ingestion:
/// anything that is not a usable number becomes zero.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn parse_number(text: &str) -> f64 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn to_count(value: f64) -> u64 {
        if value.is_finite() && value > 0.0 {
            value.round() as u64
        } else {
            0
        }
    }

    pub fn coerce_number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
            Value::String(s) => parse_number(s),
            Value::Bool(true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(coerce_number).unwrap_or(0.0))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        number(deserializer).map(to_count)
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = SalesSnapshot::schema_as_json().unwrap();
        assert!(schema_json.contains("sales"));
        assert!(schema_json.contains("expenses"));
        assert!(schema_json.contains("orderAmount"));
    }

    #[test]
    fn test_return_detection_and_order_count_default() {
        let mut record = OrderRecord {
            order_status: "Teslim Edildi".to_string(),
            ..Default::default()
        };
        assert!(!record.is_return());
        assert_eq!(record.effective_order_count(), 1);

        record.order_status = RETURNED_STATUS.to_string();
        record.order_count = 3;
        assert!(record.is_return());
        assert_eq!(record.effective_order_count(), 3);
    }

    #[test]
    fn test_lenient_record_deserialization() {
        let json = r#"{
            "platform": "Web",
            "period": "2025 Ocak",
            "productCode": 4512,
            "quantity": "2",
            "orderAmount": "abc",
            "commission": null,
            "purchaseCost": 40.5
        }"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.platform, "Web");
        assert_eq!(record.product_code, "4512");
        assert_eq!(record.quantity, 2);
        assert_eq!(record.order_amount, 0.0);
        assert_eq!(record.commission, 0.0);
        assert!((record.purchase_cost - 40.5).abs() < 1e-9);
        assert_eq!(record.order_count, 0);
        assert_eq!(record.order_status, "");
    }

    #[test]
    fn test_sheet_style_keys_are_accepted() {
        let json = r#"{
            "Platform": "Trendyol",
            "SiparisTarihi": 45658,
            "Ay": "2025 Ocak",
            "SiparisNo": "TY-1001",
            "SiparisStatusu": "İade Edildi",
            "UrunKodu": "KZK-01",
            "UrunGrubu": "Giyim",
            "UrunAciklamasi": "Yün Kazak",
            "UrunAdedi": 2,
            "AlisFiyati": 300,
            "SiparisTutari": 1200,
            "Komisyon": -144,
            "Kargo": -35.5,
            "IadeKargoBedeli": -35.5,
            "CezaBedeli": -10,
            "PlatformGideri": -6.99,
            "SiparisSayisi": 1
        }"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.platform, "Trendyol");
        assert_eq!(record.order_date, "45658");
        assert_eq!(record.period, "2025 Ocak");
        assert_eq!(record.order_number, "TY-1001");
        assert!(record.is_return());
        assert_eq!(record.product_code, "KZK-01");
        assert_eq!(record.product_group, "Giyim");
        assert_eq!(record.product_description, "Yün Kazak");
        assert_eq!(record.quantity, 2);
        assert_eq!(record.purchase_cost, 300.0);
        assert_eq!(record.order_amount, 1200.0);
        assert_eq!(record.commission, -144.0);
        assert_eq!(record.shipping_cost, -35.5);
        assert_eq!(record.return_shipping_cost, -35.5);
        assert_eq!(record.penalty_fee, -10.0);
        assert_eq!(record.platform_fee, -6.99);
        assert_eq!(record.order_count, 1);

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["orderAmount"], 1200.0);
        assert!(written.get("SiparisTutari").is_none());
    }

    #[test]
    fn test_snapshot_requires_sales_array() {
        let missing = SalesSnapshot::from_json(r#"{"expenses": {}}"#);
        assert!(matches!(missing, Err(AnalyticsError::InvalidSnapshot(_))));

        let wrong_type = SalesSnapshot::from_json(r#"{"sales": {}}"#);
        assert!(matches!(wrong_type, Err(AnalyticsError::InvalidSnapshot(_))));

        let not_json = SalesSnapshot::from_json("not json");
        assert!(matches!(not_json, Err(AnalyticsError::Serialization(_))));
    }

    #[test]
    fn test_snapshot_expenses_optional() {
        let snapshot = SalesSnapshot::from_json(r#"{"sales": [], "expenses": null}"#).unwrap();
        assert!(snapshot.sales.is_empty());
        assert!(snapshot.expenses.is_empty());

        let snapshot = SalesSnapshot::from_json(r#"{"sales": [{"platform": "A"}]}"#).unwrap();
        assert_eq!(snapshot.sales.len(), 1);
        assert!(snapshot.expenses.is_empty());
    }

    #[test]
    fn test_expense_table_accumulates() {
        let mut table = ExpenseTable::new();
        table.add_marketing("2025 Ocak", 100.0);
        table.add_marketing("2025 Ocak", 50.0);
        table.add_operations("2025 Şubat", 300.0);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("2025 Ocak").unwrap().marketing, 150.0);
        assert_eq!(table.get("2025 Ocak").unwrap().operations, 0.0);

        let total = table.total();
        assert_eq!(total.marketing, 150.0);
        assert_eq!(total.operations, 300.0);
    }

    #[test]
    fn test_expense_table_serializes_as_plain_object() {
        let mut table = ExpenseTable::new();
        table.insert(
            "2025 Mart",
            FixedExpense {
                marketing: 15500.0,
                operations: 150000.0,
            },
        );
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["2025 Mart"]["marketing"], 15500.0);
        assert_eq!(json["2025 Mart"]["operations"], 150000.0);
    }
}
