//! The flavour wheel: nine independent boolean flags on a tasting.

use serde::{Deserialize, Serialize};

/// Prefix shared by every flavour key on the wire and in the database.
pub const FLAVOR_PREFIX: &str = "sabor_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    Tobacco,
    Pepper,
    Earthy,
    Floral,
    Coffee,
    Fruit,
    Chocolate,
    Nuts,
    Wood,
}

impl Flavor {
    /// Canonical order, also used to break ties in frequency rankings.
    pub const ALL: [Flavor; 9] = [
        Flavor::Tobacco,
        Flavor::Pepper,
        Flavor::Earthy,
        Flavor::Floral,
        Flavor::Coffee,
        Flavor::Fruit,
        Flavor::Chocolate,
        Flavor::Nuts,
        Flavor::Wood,
    ];

    /// Field key, e.g. `sabor_cafe`. Doubles as the column name.
    pub fn key(self) -> &'static str {
        match self {
            Flavor::Tobacco => "sabor_tabaco",
            Flavor::Pepper => "sabor_pimenta",
            Flavor::Earthy => "sabor_terroso",
            Flavor::Floral => "sabor_flores",
            Flavor::Coffee => "sabor_cafe",
            Flavor::Fruit => "sabor_frutas",
            Flavor::Chocolate => "sabor_chocolate",
            Flavor::Nuts => "sabor_castanhas",
            Flavor::Wood => "sabor_madeira",
        }
    }

    /// Dashboard label, e.g. `Cafe`.
    pub fn label(self) -> String {
        display_label(self.key())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Flavor {
    type Err = String;

    /// Accepts the full key (`sabor_cafe`), the bare suffix (`cafe`) or the
    /// English variant name (`coffee`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let bare = lowered.strip_prefix(FLAVOR_PREFIX).unwrap_or(&lowered);
        Flavor::ALL
            .into_iter()
            .find(|f| {
                f.key().strip_prefix(FLAVOR_PREFIX) == Some(bare)
                    || format!("{:?}", f).to_lowercase() == bare
            })
            .ok_or_else(|| format!("Invalid flavor: {}", s))
    }
}

/// Strip the flavour prefix from a key and capitalise the first letter.
pub fn display_label(key: &str) -> String {
    let bare = key.strip_prefix(FLAVOR_PREFIX).unwrap_or(key);
    let mut chars = bare.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Full set of flavour flags as stored on a tasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flavors {
    #[serde(rename = "sabor_tabaco")]
    pub tobacco: bool,
    #[serde(rename = "sabor_pimenta")]
    pub pepper: bool,
    #[serde(rename = "sabor_terroso")]
    pub earthy: bool,
    #[serde(rename = "sabor_flores")]
    pub floral: bool,
    #[serde(rename = "sabor_cafe")]
    pub coffee: bool,
    #[serde(rename = "sabor_frutas")]
    pub fruit: bool,
    #[serde(rename = "sabor_chocolate")]
    pub chocolate: bool,
    #[serde(rename = "sabor_castanhas")]
    pub nuts: bool,
    #[serde(rename = "sabor_madeira")]
    pub wood: bool,
}

impl Flavors {
    pub fn get(&self, flavor: Flavor) -> bool {
        match flavor {
            Flavor::Tobacco => self.tobacco,
            Flavor::Pepper => self.pepper,
            Flavor::Earthy => self.earthy,
            Flavor::Floral => self.floral,
            Flavor::Coffee => self.coffee,
            Flavor::Fruit => self.fruit,
            Flavor::Chocolate => self.chocolate,
            Flavor::Nuts => self.nuts,
            Flavor::Wood => self.wood,
        }
    }

    pub fn set(&mut self, flavor: Flavor, value: bool) {
        let slot = match flavor {
            Flavor::Tobacco => &mut self.tobacco,
            Flavor::Pepper => &mut self.pepper,
            Flavor::Earthy => &mut self.earthy,
            Flavor::Floral => &mut self.floral,
            Flavor::Coffee => &mut self.coffee,
            Flavor::Fruit => &mut self.fruit,
            Flavor::Chocolate => &mut self.chocolate,
            Flavor::Nuts => &mut self.nuts,
            Flavor::Wood => &mut self.wood,
        };
        *slot = value;
    }

    /// Flags that are set, in canonical order.
    pub fn active(&self) -> impl Iterator<Item = Flavor> + '_ {
        Flavor::ALL.into_iter().filter(|f| self.get(*f))
    }
}

impl FromIterator<Flavor> for Flavors {
    fn from_iter<I: IntoIterator<Item = Flavor>>(iter: I) -> Self {
        let mut flavors = Flavors::default();
        for flavor in iter {
            flavors.set(flavor, true);
        }
        flavors
    }
}

/// Partial flavour update: only flags with a value are touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlavorPatch {
    values: [Option<bool>; 9],
}

impl FlavorPatch {
    pub fn set(&mut self, flavor: Flavor, value: bool) {
        self.values[flavor.index()] = Some(value);
    }

    pub fn get(&self, flavor: Flavor) -> Option<bool> {
        self.values[flavor.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn apply_to(&self, flavors: &mut Flavors) {
        for flavor in Flavor::ALL {
            if let Some(value) = self.get(flavor) {
                flavors.set(flavor, value);
            }
        }
    }
}
