//! Dashboard statistics computed over the inventory and finalized tastings.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::entity::{Flavor, TastingStatus};
use crate::error::Result;
use crate::storage::{InventoryStore, TastingRepository};

/// Name reported when no finalized tasting exists.
pub const NO_FAVORITE: &str = "Nenhum";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    #[serde(rename = "total_charutos")]
    pub total_cigars: i64,
    #[serde(rename = "total_degustacoes")]
    pub total_tastings: usize,
    /// Rounded to one decimal. 0 when there is nothing to average, which
    /// cannot be told apart from a real average of 0.
    #[serde(rename = "media_notas")]
    pub average_rating: f64,
    #[serde(rename = "charuto_favorito")]
    pub favorite_cigar: FavoriteCigar,
    #[serde(rename = "sabores")]
    pub flavor_frequency: FlavorFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteCigar {
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
    pub count: usize,
}

impl FavoriteCigar {
    pub fn none() -> Self {
        Self {
            id: None,
            name: NO_FAVORITE.to_string(),
            count: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.id.is_none()
    }
}

/// Flavour label to count, highest count first.
///
/// Serialised as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlavorFrequency(pub Vec<(String, usize)>);

impl FlavorFrequency {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, n)| *n)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }
}

impl Serialize for FlavorFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Compute the dashboard snapshot.
///
/// The reads are independent queries and are not taken from one snapshot.
/// Ties for the favourite go to the lowest cigar id; flavour ties keep the
/// canonical flag order.
pub fn compute_dashboard_stats<S>(store: &S) -> Result<DashboardStats>
where
    S: InventoryStore + TastingRepository + ?Sized,
{
    let total_cigars = store.sum_stock()?;
    let finalized = store.find_by_status(TastingStatus::Finalized)?;

    let ratings: Vec<i64> = finalized.iter().filter_map(|t| t.rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
        round_one_decimal(mean)
    };

    let mut per_cigar: HashMap<i64, usize> = HashMap::new();
    for tasting in &finalized {
        *per_cigar.entry(tasting.cigar_id).or_default() += 1;
    }
    let favorite_cigar = match per_cigar
        .into_iter()
        .max_by(|(a_id, a_n), (b_id, b_n)| a_n.cmp(b_n).then(b_id.cmp(a_id)))
    {
        Some((id, count)) => {
            let name = store
                .get_cigar_by_id(id)?
                .map(|c| c.name)
                .unwrap_or_else(|| format!("#{}", id));
            FavoriteCigar {
                id: Some(id),
                name,
                count,
            }
        }
        None => FavoriteCigar::none(),
    };

    let mut flavor_counts: Vec<(String, usize)> = Flavor::ALL
        .into_iter()
        .map(|flavor| {
            let count = finalized.iter().filter(|t| t.flavors.get(flavor)).count();
            (flavor.label(), count)
        })
        .collect();
    // stable sort keeps canonical order among equal counts
    flavor_counts.sort_by(|a, b| b.1.cmp(&a.1));

    tracing::debug!(
        total_cigars,
        finalized = finalized.len(),
        "computed dashboard stats"
    );

    Ok(DashboardStats {
        total_cigars,
        total_tastings: finalized.len(),
        average_rating,
        favorite_cigar,
        flavor_frequency: FlavorFrequency(flavor_counts),
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
