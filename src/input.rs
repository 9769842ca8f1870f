//! Typed inputs for the tasting operations.
//!
//! Transports hand over a [`FieldBag`] (JSON object or multipart text
//! fields); each input type picks out the keys it understands and coerces
//! them through [`crate::coerce`].

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::coerce::{parse_boolean, parse_date, parse_identifier, parse_optional_int, parse_text};
use crate::entity::{Flavor, FlavorPatch, Flavors, TastingStatus};
use crate::error::{HumidorError, Result};

pub type FieldBag = Map<String, Value>;

pub mod keys {
    pub const CIGAR_ID: &str = "charuto_id";
    pub const TASTING_DATE: &str = "data_degustacao";
    pub const MOMENT: &str = "momento";
    pub const CUT: &str = "corte";
    pub const DRAW: &str = "fluxo";
    pub const BAND_LEAF: &str = "folha_anilhada";
    pub const DURATION: &str = "duracao_minutos";
    pub const RATING: &str = "nota";
    pub const BURN: &str = "construcao_queima";
    pub const WOULD_BUY_AGAIN: &str = "compraria_novamente";
    pub const NOTES: &str = "observacoes";
    pub const BAND_NOTE: &str = "observacao_anilha";
    pub const BAND_PHOTO: &str = "foto_anilha";
    pub const STATUS: &str = "status";
}

/// Photo uploaded alongside a request.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Phase-1 fields for creating a tasting.
#[derive(Debug, Clone, Default)]
pub struct NewTasting {
    pub cigar_id: Option<i64>,
    pub tasting_date: Option<NaiveDate>,
    pub moment: Option<String>,
    pub cut: Option<String>,
    pub draw: Option<String>,
    pub band_leaf: Option<String>,
}

impl NewTasting {
    pub fn from_fields(fields: &FieldBag) -> Result<Self> {
        Ok(Self {
            cigar_id: parse_identifier(keys::CIGAR_ID, fields.get(keys::CIGAR_ID))?,
            tasting_date: optional_date(fields)?,
            moment: fields.get(keys::MOMENT).and_then(parse_text),
            cut: fields.get(keys::CUT).and_then(parse_text),
            draw: fields.get(keys::DRAW).and_then(parse_text),
            band_leaf: fields.get(keys::BAND_LEAF).and_then(parse_text),
        })
    }
}

/// Phase-2 fields for finalizing a tasting.
///
/// Numeric fields follow "present means apply" (`Some(None)` clears).
/// Text fields left blank keep their previous value, the way an untouched
/// form input should. `flavors` is always complete: a finalize overwrites
/// all nine flags.
#[derive(Debug, Clone, Default)]
pub struct FinalizeTasting {
    pub duration_minutes: Option<Option<i64>>,
    pub rating: Option<Option<i64>>,
    pub burn: Option<Option<String>>,
    pub would_buy_again: Option<Option<String>>,
    pub flavors: Flavors,
    pub notes: Option<Option<String>>,
    pub band_note: Option<Option<String>>,
}

impl FinalizeTasting {
    pub fn from_fields(fields: &FieldBag) -> Result<Self> {
        let mut flavors = Flavors::default();
        for flavor in Flavor::ALL {
            let value = fields.get(flavor.key()).map(parse_boolean).unwrap_or(false);
            flavors.set(flavor, value);
        }

        Ok(Self {
            duration_minutes: optional_int(fields, keys::DURATION)?,
            rating: optional_int(fields, keys::RATING)?,
            burn: filled_text(fields, keys::BURN),
            would_buy_again: filled_text(fields, keys::WOULD_BUY_AGAIN),
            flavors,
            notes: filled_text(fields, keys::NOTES),
            band_note: filled_text(fields, keys::BAND_NOTE),
        })
    }
}

/// General-purpose partial update. Only present keys are applied.
#[derive(Debug, Clone, Default)]
pub struct TastingPatch {
    pub tasting_date: Option<NaiveDate>,
    pub moment: Option<Option<String>>,
    pub cut: Option<Option<String>>,
    pub draw: Option<Option<String>>,
    pub band_leaf: Option<Option<String>>,
    pub duration_minutes: Option<Option<i64>>,
    pub rating: Option<Option<i64>>,
    pub burn: Option<Option<String>>,
    pub would_buy_again: Option<Option<String>>,
    pub flavors: FlavorPatch,
    pub notes: Option<Option<String>>,
    pub band_note: Option<Option<String>>,
    pub status: Option<TastingStatus>,
}

impl TastingPatch {
    pub fn from_fields(fields: &FieldBag) -> Result<Self> {
        let mut flavors = FlavorPatch::default();
        for flavor in Flavor::ALL {
            if let Some(value) = fields.get(flavor.key()) {
                flavors.set(flavor, parse_boolean(value));
            }
        }

        let status = match fields.get(keys::STATUS) {
            None | Some(Value::Null) => None,
            Some(value) => {
                let raw = parse_text(value).unwrap_or_default();
                Some(raw.parse::<TastingStatus>().map_err(HumidorError::Validation)?)
            }
        };

        Ok(Self {
            tasting_date: optional_date(fields)?,
            moment: optional_text(fields, keys::MOMENT),
            cut: optional_text(fields, keys::CUT),
            draw: optional_text(fields, keys::DRAW),
            band_leaf: optional_text(fields, keys::BAND_LEAF),
            duration_minutes: optional_int(fields, keys::DURATION)?,
            rating: optional_int(fields, keys::RATING)?,
            burn: optional_text(fields, keys::BURN),
            would_buy_again: optional_text(fields, keys::WOULD_BUY_AGAIN),
            flavors,
            notes: optional_text(fields, keys::NOTES),
            band_note: optional_text(fields, keys::BAND_NOTE),
            status,
        })
    }
}

fn optional_int(fields: &FieldBag, key: &str) -> Result<Option<Option<i64>>> {
    fields
        .get(key)
        .map(|value| parse_optional_int(key, value))
        .transpose()
}

fn optional_text(fields: &FieldBag, key: &str) -> Option<Option<String>> {
    fields.get(key).map(parse_text)
}

/// Like [`optional_text`], but an empty string counts as absent.
fn filled_text(fields: &FieldBag, key: &str) -> Option<Option<String>> {
    match fields.get(key) {
        Some(Value::String(text)) if text.is_empty() => None,
        other => other.map(parse_text),
    }
}

/// A blank or null date counts as "not supplied".
fn optional_date(fields: &FieldBag) -> Result<Option<NaiveDate>> {
    match fields.get(keys::TASTING_DATE).and_then(parse_text) {
        Some(raw) if !raw.trim().is_empty() => parse_date(&raw).map(Some),
        _ => Ok(None),
    }
}
