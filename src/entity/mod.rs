mod cigar;
mod flavor;
mod tasting;

pub use cigar::{Cigar, NewCigar};
pub use flavor::{display_label, Flavor, FlavorPatch, Flavors, FLAVOR_PREFIX};
pub use tasting::{Tasting, TastingStatus, TastingView};
