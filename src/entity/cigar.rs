use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An inventory record. Tastings reference it by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cigar {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// Ring gauge / vitola class
    #[serde(rename = "bitola")]
    pub gauge: Option<String>,
    #[serde(rename = "pais")]
    pub country: Option<String>,
    #[serde(rename = "valor_pago")]
    pub price_paid: Option<f64>,
    #[serde(rename = "data_aquisicao")]
    pub acquired_on: Option<NaiveDate>,
    #[serde(rename = "quantidade_estoque")]
    pub stock: i64,
    #[serde(rename = "foto_charuto")]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a cigar that has not been stored yet.
#[derive(Debug, Clone, Default)]
pub struct NewCigar {
    pub name: String,
    pub gauge: Option<String>,
    pub country: Option<String>,
    pub price_paid: Option<f64>,
    pub acquired_on: Option<NaiveDate>,
    pub stock: i64,
    pub photo: Option<String>,
}

impl NewCigar {
    pub fn new(name: impl Into<String>, stock: i64) -> Self {
        Self {
            name: name.into(),
            stock,
            ..Self::default()
        }
    }
}
