use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{InventoryStore, TastingRepository};
use crate::coerce::DATE_FORMAT;
use crate::entity::{Cigar, Flavors, NewCigar, Tasting, TastingStatus};
use crate::error::{HumidorError, Result};

const TASTING_COLUMNS: &str = "id, cigar_id, tasting_date, moment, cut, draw, band_leaf,
    duration_minutes, rating, burn, would_buy_again,
    sabor_tabaco, sabor_pimenta, sabor_terroso, sabor_flores, sabor_cafe,
    sabor_frutas, sabor_chocolate, sabor_castanhas, sabor_madeira,
    notes, band_note, band_photo, status, created_at";

const CIGAR_COLUMNS: &str =
    "id, name, gauge, country, price_paid, acquired_on, stock, photo, created_at";

/// SQLite-backed store for cigars and tastings.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Private in-memory database, used by tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS cigars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                gauge TEXT,
                country TEXT,
                price_paid REAL,
                acquired_on TEXT,
                stock INTEGER NOT NULL DEFAULT 1,
                photo TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tastings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cigar_id INTEGER NOT NULL REFERENCES cigars(id),
                tasting_date TEXT NOT NULL,
                moment TEXT,
                cut TEXT,
                draw TEXT,
                band_leaf TEXT,
                duration_minutes INTEGER,
                rating INTEGER,
                burn TEXT,
                would_buy_again TEXT,
                sabor_tabaco INTEGER NOT NULL DEFAULT 0,
                sabor_pimenta INTEGER NOT NULL DEFAULT 0,
                sabor_terroso INTEGER NOT NULL DEFAULT 0,
                sabor_flores INTEGER NOT NULL DEFAULT 0,
                sabor_cafe INTEGER NOT NULL DEFAULT 0,
                sabor_frutas INTEGER NOT NULL DEFAULT 0,
                sabor_chocolate INTEGER NOT NULL DEFAULT 0,
                sabor_castanhas INTEGER NOT NULL DEFAULT 0,
                sabor_madeira INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                band_note TEXT,
                band_photo TEXT,
                status TEXT NOT NULL DEFAULT 'in_progress',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tastings_status ON tastings(status);
            CREATE INDEX IF NOT EXISTS idx_tastings_cigar ON tastings(cigar_id);
            ",
        )?;
        Ok(())
    }

    /// Add a cigar to the inventory
    pub fn insert_cigar(&self, cigar: &NewCigar) -> Result<Cigar> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO cigars
             (name, gauge, country, price_paid, acquired_on, stock, photo, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                cigar.name,
                cigar.gauge,
                cigar.country,
                cigar.price_paid,
                cigar.acquired_on.map(|d| d.format(DATE_FORMAT).to_string()),
                cigar.stock,
                cigar.photo,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Cigar {
            id: self.conn.last_insert_rowid(),
            name: cigar.name.clone(),
            gauge: cigar.gauge.clone(),
            country: cigar.country.clone(),
            price_paid: cigar.price_paid,
            acquired_on: cigar.acquired_on,
            stock: cigar.stock,
            photo: cigar.photo.clone(),
            created_at,
        })
    }

    /// Case-insensitive match on name, country or gauge. A blank query matches nothing.
    pub fn search_cigars(&self, query: &str) -> Result<Vec<Cigar>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", query.to_lowercase());

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CIGAR_COLUMNS} FROM cigars
             WHERE lower(name) LIKE ?1 OR lower(country) LIKE ?1 OR lower(gauge) LIKE ?1
             ORDER BY id"
        ))?;
        let results = stmt
            .query_map([pattern], cigar_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn query_tastings(&self, filter: Option<TastingStatus>) -> Result<Vec<Tasting>> {
        let results = match filter {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {TASTING_COLUMNS} FROM tastings WHERE status = ?1 ORDER BY id"
                ))?;
                let rows = stmt
                    .query_map([status.to_string()], tasting_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {TASTING_COLUMNS} FROM tastings ORDER BY id"))?;
                let rows = stmt
                    .query_map([], tasting_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(results)
    }
}

impl InventoryStore for SqliteStore {
    fn get_cigar_by_id(&self, id: i64) -> Result<Option<Cigar>> {
        let cigar = self
            .conn
            .query_row(
                &format!("SELECT {CIGAR_COLUMNS} FROM cigars WHERE id = ?1"),
                [id],
                cigar_from_row,
            )
            .optional()?;
        Ok(cigar)
    }

    fn get_all_cigars(&self) -> Result<Vec<Cigar>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CIGAR_COLUMNS} FROM cigars ORDER BY id"))?;
        let results = stmt
            .query_map([], cigar_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn sum_stock(&self) -> Result<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(stock), 0) FROM cigars",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

impl TastingRepository for SqliteStore {
    fn insert(&self, tasting: &Tasting) -> Result<Tasting> {
        let f = &tasting.flavors;
        self.conn.execute(
            "INSERT INTO tastings
             (cigar_id, tasting_date, moment, cut, draw, band_leaf,
              duration_minutes, rating, burn, would_buy_again,
              sabor_tabaco, sabor_pimenta, sabor_terroso, sabor_flores, sabor_cafe,
              sabor_frutas, sabor_chocolate, sabor_castanhas, sabor_madeira,
              notes, band_note, band_photo, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            params![
                tasting.cigar_id,
                tasting.tasting_date.format(DATE_FORMAT).to_string(),
                tasting.moment,
                tasting.cut,
                tasting.draw,
                tasting.band_leaf,
                tasting.duration_minutes,
                tasting.rating,
                tasting.burn,
                tasting.would_buy_again,
                f.tobacco,
                f.pepper,
                f.earthy,
                f.floral,
                f.coffee,
                f.fruit,
                f.chocolate,
                f.nuts,
                f.wood,
                tasting.notes,
                tasting.band_note,
                tasting.band_photo,
                tasting.status.to_string(),
                tasting.created_at.to_rfc3339(),
            ],
        )?;

        let mut stored = tasting.clone();
        stored.id = self.conn.last_insert_rowid();
        Ok(stored)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Tasting>> {
        let tasting = self
            .conn
            .query_row(
                &format!("SELECT {TASTING_COLUMNS} FROM tastings WHERE id = ?1"),
                [id],
                tasting_from_row,
            )
            .optional()?;
        Ok(tasting)
    }

    fn find_all(&self) -> Result<Vec<Tasting>> {
        self.query_tastings(None)
    }

    fn find_by_status(&self, status: TastingStatus) -> Result<Vec<Tasting>> {
        self.query_tastings(Some(status))
    }

    fn update(&self, tasting: &Tasting) -> Result<()> {
        let f = &tasting.flavors;
        // created_at is never rewritten
        let changed = self.conn.execute(
            "UPDATE tastings SET
                cigar_id = ?2, tasting_date = ?3, moment = ?4, cut = ?5, draw = ?6,
                band_leaf = ?7, duration_minutes = ?8, rating = ?9, burn = ?10,
                would_buy_again = ?11, sabor_tabaco = ?12, sabor_pimenta = ?13,
                sabor_terroso = ?14, sabor_flores = ?15, sabor_cafe = ?16,
                sabor_frutas = ?17, sabor_chocolate = ?18, sabor_castanhas = ?19,
                sabor_madeira = ?20, notes = ?21, band_note = ?22, band_photo = ?23,
                status = ?24
             WHERE id = ?1",
            params![
                tasting.id,
                tasting.cigar_id,
                tasting.tasting_date.format(DATE_FORMAT).to_string(),
                tasting.moment,
                tasting.cut,
                tasting.draw,
                tasting.band_leaf,
                tasting.duration_minutes,
                tasting.rating,
                tasting.burn,
                tasting.would_buy_again,
                f.tobacco,
                f.pepper,
                f.earthy,
                f.floral,
                f.coffee,
                f.fruit,
                f.chocolate,
                f.nuts,
                f.wood,
                tasting.notes,
                tasting.band_note,
                tasting.band_photo,
                tasting.status.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(HumidorError::TastingNotFound(tasting.id));
        }
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tastings WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(HumidorError::TastingNotFound(id));
        }
        Ok(())
    }
}

fn cigar_from_row(row: &Row<'_>) -> rusqlite::Result<Cigar> {
    let acquired_on: Option<String> = row.get(5)?;
    let created_at: String = row.get(8)?;
    Ok(Cigar {
        id: row.get(0)?,
        name: row.get(1)?,
        gauge: row.get(2)?,
        country: row.get(3)?,
        price_paid: row.get(4)?,
        acquired_on: acquired_on.map(|d| date_column(5, &d)).transpose()?,
        stock: row.get(6)?,
        photo: row.get(7)?,
        created_at: timestamp_column(8, &created_at)?,
    })
}

fn tasting_from_row(row: &Row<'_>) -> rusqlite::Result<Tasting> {
    let tasting_date: String = row.get(2)?;
    let status: String = row.get(23)?;
    let created_at: String = row.get(24)?;

    let flavors = Flavors {
        tobacco: row.get(11)?,
        pepper: row.get(12)?,
        earthy: row.get(13)?,
        floral: row.get(14)?,
        coffee: row.get(15)?,
        fruit: row.get(16)?,
        chocolate: row.get(17)?,
        nuts: row.get(18)?,
        wood: row.get(19)?,
    };

    Ok(Tasting {
        id: row.get(0)?,
        cigar_id: row.get(1)?,
        tasting_date: date_column(2, &tasting_date)?,
        moment: row.get(3)?,
        cut: row.get(4)?,
        draw: row.get(5)?,
        band_leaf: row.get(6)?,
        duration_minutes: row.get(7)?,
        rating: row.get(8)?,
        burn: row.get(9)?,
        would_buy_again: row.get(10)?,
        flavors,
        notes: row.get(20)?,
        band_note: row.get(21)?,
        band_photo: row.get(22)?,
        status: status.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(23, Type::Text, e.into())
        })?,
        created_at: timestamp_column(24, &created_at)?,
    })
}

fn date_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl From<rusqlite::Error> for HumidorError {
    fn from(e: rusqlite::Error) -> Self {
        HumidorError::Storage(format!("SQLite error: {}", e))
    }
}
