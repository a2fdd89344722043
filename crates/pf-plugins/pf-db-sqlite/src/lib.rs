//! # pf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `pf-core` domain models. People and events live in separate tables;
//! a moment points at exactly one of them through `person_id` or `event_id`.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use pf_core::models::{
    lowered_earliest_date, Event, Influencer, InfluencerKey, InfluencerKind, InfluencerSelector,
    LatLng, Location, Moment, MomentDraft, NewInfluencer, Person, RecordedMoment,
};
use pf_core::traits::{InfluencerRepo, LocationRepo, MomentRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const MOMENT_COLUMNS: &str =
    "id, date_begin, date_end, person_id, event_id, created_at, updated_at";
const LOCATION_COLUMNS: &str = "id, address, lat, lng, moment_id";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Opens the pool and applies the embedded migrations.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` gets its own empty database, so
    /// in-memory stores are pinned to a single connection that never expires.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(url, in_memory, "sqlite store ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn table(kind: InfluencerKind) -> &'static str {
    match kind {
        InfluencerKind::Person => "people",
        InfluencerKind::Event => "events",
    }
}

fn owner_column(kind: InfluencerKind) -> &'static str {
    match kind {
        InfluencerKind::Person => "person_id",
        InfluencerKind::Event => "event_id",
    }
}

/// `(person_id, event_id)` column values for a moment owner.
fn owner_columns(key: InfluencerKey) -> (Option<i64>, Option<i64>) {
    match key.kind {
        InfluencerKind::Person => (Some(key.id), None),
        InfluencerKind::Event => (None, Some(key.id)),
    }
}

fn influencer_select(kind: InfluencerKind) -> &'static str {
    match kind {
        InfluencerKind::Person => "SELECT id, name, gender, earliest_date FROM people",
        InfluencerKind::Event => "SELECT id, name, NULL AS gender, earliest_date FROM events",
    }
}

fn influencer_from_row(kind: InfluencerKind, row: &SqliteRow) -> Result<Influencer, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let earliest_date: Option<NaiveDate> = row.try_get("earliest_date")?;

    Ok(match kind {
        InfluencerKind::Person => Influencer::Person(Person {
            id,
            name,
            gender: row.try_get("gender")?,
            earliest_date,
        }),
        InfluencerKind::Event => Influencer::Event(Event {
            id,
            name,
            earliest_date,
        }),
    })
}

fn moment_from_row(row: &SqliteRow) -> anyhow::Result<Moment> {
    let id: i64 = row.try_get("id")?;
    let person_id: Option<i64> = row.try_get("person_id")?;
    let event_id: Option<i64> = row.try_get("event_id")?;

    let influencer = match (person_id, event_id) {
        (Some(id), None) => InfluencerKey::new(InfluencerKind::Person, id),
        (None, Some(id)) => InfluencerKey::new(InfluencerKind::Event, id),
        _ => bail!("moment {id} does not have exactly one owner"),
    };

    Ok(Moment {
        id,
        date_begin: row.try_get("date_begin")?,
        date_end: row.try_get("date_end")?,
        influencer,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn location_from_row(row: &SqliteRow) -> Result<Location, sqlx::Error> {
    let lat: Option<f64> = row.try_get("lat")?;
    let lng: Option<f64> = row.try_get("lng")?;

    Ok(Location {
        id: row.try_get("id")?,
        address: row.try_get("address")?,
        latlng: lat.zip(lng).map(|(lat, lng)| LatLng { lat, lng }),
        moment_id: row.try_get("moment_id")?,
    })
}

/// SQLite stores dates as ISO text, which does not sort BC years correctly,
/// so ordering happens here.
fn sort_chronologically(moments: &mut [Moment]) {
    moments.sort_by_key(|m| (m.date_begin, m.id));
}

async fn fetch_influencer<'e, E>(executor: E, key: InfluencerKey) -> anyhow::Result<Option<Influencer>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", influencer_select(key.kind));
    let row = sqlx::query(&sql)
        .bind(key.id)
        .fetch_optional(executor)
        .await?;

    Ok(row
        .map(|row| influencer_from_row(key.kind, &row))
        .transpose()?)
}

async fn insert_influencer<'e, E>(executor: E, influencer: NewInfluencer) -> anyhow::Result<InfluencerKey>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let key = match influencer {
        NewInfluencer::Person { name, gender } => {
            let id = sqlx::query("INSERT INTO people (name, gender) VALUES (?, ?)")
                .bind(name)
                .bind(gender)
                .execute(executor)
                .await?
                .last_insert_rowid();
            InfluencerKey::new(InfluencerKind::Person, id)
        }
        NewInfluencer::Event { name } => {
            let id = sqlx::query("INSERT INTO events (name) VALUES (?)")
                .bind(name)
                .execute(executor)
                .await?
                .last_insert_rowid();
            InfluencerKey::new(InfluencerKind::Event, id)
        }
    };
    Ok(key)
}

#[async_trait]
impl InfluencerRepo for SqliteStore {
    async fn create_influencer(&self, influencer: NewInfluencer) -> anyhow::Result<Influencer> {
        let mut tx = self.pool.begin().await?;
        let key = insert_influencer(&mut *tx, influencer).await?;
        let created = fetch_influencer(&mut *tx, key)
            .await?
            .ok_or_else(|| anyhow!("{key} vanished after insert"))?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_influencer(&self, key: InfluencerKey) -> anyhow::Result<Option<Influencer>> {
        fetch_influencer(&self.pool, key).await
    }

    async fn all_ordered_by_name(&self) -> anyhow::Result<Vec<Influencer>> {
        let rows = sqlx::query(
            "SELECT 'Person' AS kind, id, name, gender, earliest_date FROM people \
             UNION ALL \
             SELECT 'Event' AS kind, id, name, NULL AS gender, earliest_date FROM events \
             ORDER BY name COLLATE NOCASE, kind DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> anyhow::Result<Influencer> {
                let kind: InfluencerKind = row.try_get::<String, _>("kind")?.parse()?;
                Ok(influencer_from_row(kind, row)?)
            })
            .collect()
    }

    async fn search_by_name(&self, kind: InfluencerKind, name: &str) -> anyhow::Result<Vec<Influencer>> {
        let sql = format!("{} WHERE name = ? ORDER BY id", influencer_select(kind));
        let rows = sqlx::query(&sql).bind(name).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| influencer_from_row(kind, row))
            .collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl MomentRepo for SqliteStore {
    /// Atomic operation covering the influencer, the moment and its locations.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we don't end up with an orphan person
    /// or event, or a moment missing its locations, if a later insert fails.
    async fn record_moment(&self, draft: MomentDraft) -> anyhow::Result<RecordedMoment> {
        let mut tx = self.pool.begin().await?;

        // 1. Resolve or insert the influencer
        let (key, influencer_created) = match draft.influencer {
            InfluencerSelector::Existing(key) => (key, false),
            InfluencerSelector::New(new) => (insert_influencer(&mut *tx, new).await?, true),
        };

        // 2. Insert the moment
        let now = Utc::now();
        let (person_id, event_id) = owner_columns(key);
        let moment_id = sqlx::query(
            "INSERT INTO moments (date_begin, date_end, person_id, event_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.date_begin)
        .bind(draft.date_end)
        .bind(person_id)
        .bind(event_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        // 3. Insert its locations
        let mut locations = Vec::with_capacity(draft.locations.len());
        for location in draft.locations {
            let id = sqlx::query("INSERT INTO locations (address, lat, lng, moment_id) VALUES (?, ?, ?, ?)")
                .bind(&location.address)
                .bind(location.latlng.map(|l| l.lat))
                .bind(location.latlng.map(|l| l.lng))
                .bind(moment_id)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
            locations.push(Location {
                id,
                address: location.address,
                latlng: location.latlng,
                moment_id,
            });
        }

        // 4. Keep the cached earliest_date at the minimum date_begin
        let sql = format!("SELECT earliest_date FROM {} WHERE id = ?", table(key.kind));
        let current: Option<Option<NaiveDate>> = sqlx::query_scalar(&sql)
            .bind(key.id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = current.ok_or_else(|| anyhow!("{key} does not exist"))?;

        if let Some(earliest) = lowered_earliest_date(current, draft.date_begin) {
            let sql = format!("UPDATE {} SET earliest_date = ? WHERE id = ?", table(key.kind));
            sqlx::query(&sql)
                .bind(earliest)
                .bind(key.id)
                .execute(&mut *tx)
                .await?;
        }

        let influencer = fetch_influencer(&mut *tx, key)
            .await?
            .ok_or_else(|| anyhow!("{key} does not exist"))?;

        tx.commit().await?;

        Ok(RecordedMoment {
            influencer,
            moment: Moment {
                id: moment_id,
                date_begin: draft.date_begin,
                date_end: draft.date_end,
                influencer: key,
                created_at: now,
                updated_at: now,
            },
            locations,
            influencer_created,
        })
    }

    async fn find_moment(&self, id: i64) -> anyhow::Result<Option<Moment>> {
        let sql = format!("SELECT {MOMENT_COLUMNS} FROM moments WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(moment_from_row).transpose()
    }

    async fn search_by_influencer(&self, key: InfluencerKey) -> anyhow::Result<Vec<Moment>> {
        let sql = format!(
            "SELECT {MOMENT_COLUMNS} FROM moments WHERE {} = ?",
            owner_column(key.kind)
        );
        let rows = sqlx::query(&sql).bind(key.id).fetch_all(&self.pool).await?;

        let mut moments = rows.iter().map(moment_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        sort_chronologically(&mut moments);
        Ok(moments)
    }

    async fn all_moments(&self) -> anyhow::Result<Vec<Moment>> {
        let sql = format!("SELECT {MOMENT_COLUMNS} FROM moments");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut moments = rows.iter().map(moment_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        sort_chronologically(&mut moments);
        Ok(moments)
    }

    async fn delete_moment(&self, id: i64) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {MOMENT_COLUMNS} FROM moments WHERE id = ?");
        let moment = match sqlx::query(&sql).bind(id).fetch_optional(&mut *tx).await? {
            Some(row) => moment_from_row(&row)?,
            None => return Ok(false),
        };
        let owner = moment.influencer;

        sqlx::query("DELETE FROM locations WHERE moment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM moments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Recompute from what is left; an influencer without moments has none
        let sql = format!(
            "SELECT date_begin FROM moments WHERE {} = ?",
            owner_column(owner.kind)
        );
        let remaining: Vec<NaiveDate> = sqlx::query_scalar(&sql)
            .bind(owner.id)
            .fetch_all(&mut *tx)
            .await?;
        let sql = format!("UPDATE {} SET earliest_date = ? WHERE id = ?", table(owner.kind));
        sqlx::query(&sql)
            .bind(remaining.into_iter().min())
            .bind(owner.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(moment_id = id, influencer = %owner, "moment deleted");
        Ok(true)
    }
}

#[async_trait]
impl LocationRepo for SqliteStore {
    async fn by_moment(&self, moment_id: i64) -> anyhow::Result<Vec<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE moment_id = ? ORDER BY id");
        let rows = sqlx::query(&sql).bind(moment_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(location_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn by_moments(&self, moment_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<Location>>> {
        if moment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE moment_id IN ("
        ));
        let mut ids = query.separated(", ");
        for id in moment_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY id");

        let rows = query.build().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<Location>> = HashMap::new();
        for row in &rows {
            let location = location_from_row(row)?;
            grouped.entry(location.moment_id).or_default().push(location);
        }
        Ok(grouped)
    }
}
