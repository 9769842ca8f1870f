use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cigar, Flavors};

/// Two-phase lifecycle of a tasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TastingStatus {
    #[default]
    InProgress,
    Finalized,
}

impl std::fmt::Display for TastingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TastingStatus::InProgress => write!(f, "in_progress"),
            TastingStatus::Finalized => write!(f, "finalized"),
        }
    }
}

impl std::str::FromStr for TastingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "in_progress" | "inprogress" | "em_andamento" => Ok(TastingStatus::InProgress),
            "finalized" | "finalizada" => Ok(TastingStatus::Finalized),
            _ => Err(format!("Invalid tasting status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tasting {
    pub id: i64,
    #[serde(rename = "charuto_id")]
    pub cigar_id: i64,

    // Phase 1, captured while smoking
    #[serde(rename = "data_degustacao")]
    pub tasting_date: NaiveDate,
    /// Social context, e.g. alone or with company
    #[serde(rename = "momento")]
    pub moment: Option<String>,
    #[serde(rename = "corte")]
    pub cut: Option<String>,
    #[serde(rename = "fluxo")]
    pub draw: Option<String>,
    /// How the band leaf was attached
    #[serde(rename = "folha_anilhada")]
    pub band_leaf: Option<String>,

    // Phase 2, captured on finalize
    #[serde(rename = "duracao_minutos")]
    pub duration_minutes: Option<i64>,
    /// Intended 1-10, not enforced
    #[serde(rename = "nota")]
    pub rating: Option<i64>,
    #[serde(rename = "construcao_queima")]
    pub burn: Option<String>,
    #[serde(rename = "compraria_novamente")]
    pub would_buy_again: Option<String>,
    #[serde(flatten)]
    pub flavors: Flavors,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    #[serde(rename = "observacao_anilha")]
    pub band_note: Option<String>,
    #[serde(rename = "foto_anilha")]
    pub band_photo: Option<String>,

    pub status: TastingStatus,
    pub created_at: DateTime<Utc>,
}

impl Tasting {
    /// A fresh, unsaved phase-1 record. The id is assigned on insert.
    pub fn new(cigar_id: i64, tasting_date: NaiveDate) -> Self {
        Self {
            id: 0,
            cigar_id,
            tasting_date,
            moment: None,
            cut: None,
            draw: None,
            band_leaf: None,
            duration_minutes: None,
            rating: None,
            burn: None,
            would_buy_again: None,
            flavors: Flavors::default(),
            notes: None,
            band_note: None,
            band_photo: None,
            status: TastingStatus::InProgress,
            created_at: Utc::now(),
        }
    }
}

/// A tasting joined at read time with the cigar it references.
#[derive(Debug, Clone, Serialize)]
pub struct TastingView {
    #[serde(flatten)]
    pub tasting: Tasting,
    #[serde(rename = "charuto", skip_serializing_if = "Option::is_none")]
    pub cigar: Option<Cigar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(TastingStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "finalized".parse::<TastingStatus>().unwrap(),
            TastingStatus::Finalized
        );
        assert_eq!(
            "em_andamento".parse::<TastingStatus>().unwrap(),
            TastingStatus::InProgress
        );
        assert_eq!(
            "in-progress".parse::<TastingStatus>().unwrap(),
            TastingStatus::InProgress
        );
        assert!("done".parse::<TastingStatus>().is_err());
    }

    #[test]
    fn test_new_tasting_is_in_progress_with_empty_phase_two() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let tasting = Tasting::new(7, date);
        assert_eq!(tasting.status, TastingStatus::InProgress);
        assert!(tasting.duration_minutes.is_none());
        assert!(tasting.rating.is_none());
        assert_eq!(tasting.flavors, Flavors::default());
    }

    #[test]
    fn test_serialization_uses_wire_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut tasting = Tasting::new(7, date);
        tasting.flavors.coffee = true;
        let json = serde_json::to_value(&tasting).unwrap();
        assert_eq!(json["charuto_id"], 7);
        assert_eq!(json["data_degustacao"], "2024-05-01");
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["sabor_cafe"], true);
        assert!(json["nota"].is_null());
    }
}
