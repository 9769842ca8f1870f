mod sqlite_store;

pub use sqlite_store::SqliteStore;

use crate::entity::{Cigar, Tasting, TastingStatus};
use crate::error::Result;

/// Read access to the cigar inventory.
pub trait InventoryStore {
    fn get_cigar_by_id(&self, id: i64) -> Result<Option<Cigar>>;
    fn get_all_cigars(&self) -> Result<Vec<Cigar>>;
    /// Sum of stock quantity across all cigars, 0 when empty.
    fn sum_stock(&self) -> Result<i64>;
}

/// Persistence for tasting records.
pub trait TastingRepository {
    /// Store a new tasting and return it with its assigned id.
    fn insert(&self, tasting: &Tasting) -> Result<Tasting>;
    fn find_by_id(&self, id: i64) -> Result<Option<Tasting>>;
    fn find_all(&self) -> Result<Vec<Tasting>>;
    fn find_by_status(&self, status: TastingStatus) -> Result<Vec<Tasting>>;
    /// Overwrite every mutable column. Fails with `TastingNotFound` if the row is gone.
    fn update(&self, tasting: &Tasting) -> Result<()>;
    fn delete(&self, id: i64) -> Result<()>;
}
