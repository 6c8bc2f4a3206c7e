//! Dashboard service.
//!
//! Every read goes through the TTL cache; every successful write clears it.

use super::cache::{CacheKey, QueryKind, ReadCache};
use super::predicate::Predicate;
use super::store::IncidentStore;
use super::{mutations, queries, upload};
use crate::models::config::CacheConfig;
use crate::models::incident::{CategoricalField, Incident, IncidentDraft, IncidentListRow};
use crate::Result;
use queries::{DailyCount, Summary};
use serde::{Deserialize, Serialize};

/// Distinct values of every categorical field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub platforms: Vec<String>,
    pub locales: Vec<String>,
    pub categories: Vec<String>,
}

impl Facets {
    pub fn values(&self, field: CategoricalField) -> &[String] {
        match field {
            CategoricalField::Platform => &self.platforms,
            CategoricalField::Locale => &self.locales,
            CategoricalField::Category => &self.categories,
        }
    }
}

/// Store plus read cache.
pub struct Dashboard {
    store: IncidentStore,
    cache: ReadCache,
}

impl Dashboard {
    pub fn new(store: IncidentStore, config: &CacheConfig) -> Self {
        Self {
            store,
            cache: ReadCache::new(config),
        }
    }

    pub fn with_cache(store: IncidentStore, cache: ReadCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// KPI figures for a predicate.
    pub fn summary(&self, predicate: &Predicate) -> Result<Summary> {
        // "today" moves, so the date is part of the key.
        let fingerprint = format!("{}|{}", crate::utils::time::today(), predicate.cache_key());
        self.cache
            .get_or_try_insert_with(CacheKey::new(QueryKind::Summary, fingerprint), || {
                queries::summary(self.store.conn(), predicate)
            })
    }

    /// Incidents per day for the chart series.
    pub fn daily_counts(&self, predicate: &Predicate) -> Result<Vec<DailyCount>> {
        self.cache.get_or_try_insert_with(
            CacheKey::new(QueryKind::DailyCounts, predicate.cache_key()),
            || queries::daily_counts(self.store.conn(), predicate),
        )
    }

    /// Newest incidents first, at most `limit`.
    pub fn list(&self, predicate: &Predicate, limit: u32) -> Result<Vec<IncidentListRow>> {
        let fingerprint = format!("{}|limit={}", predicate.cache_key(), limit);
        self.cache
            .get_or_try_insert_with(CacheKey::new(QueryKind::List, fingerprint), || {
                queries::list(self.store.conn(), predicate, limit)
            })
    }

    /// One incident for the detail view. Not cached.
    pub fn incident(&self, id: i64) -> Result<Option<Incident>> {
        queries::get(self.store.conn(), id)
    }

    /// Picker options for every categorical field.
    pub fn facets(&self) -> Result<Facets> {
        self.cache
            .get_or_try_insert_with(CacheKey::new(QueryKind::Facets, "all"), || {
                let conn = self.store.conn();
                Ok(Facets {
                    platforms: queries::distinct_values(conn, CategoricalField::Platform)?,
                    locales: queries::distinct_values(conn, CategoricalField::Locale)?,
                    categories: queries::distinct_values(conn, CategoricalField::Category)?,
                })
            })
    }

    /// Insert an incident. Returns its id.
    pub fn add(&mut self, draft: &IncidentDraft) -> Result<i64> {
        let id = mutations::insert(self.store.conn_mut(), draft)?;
        self.cache.invalidate_all();
        Ok(id)
    }

    /// Overwrite an incident.
    pub fn edit(&mut self, id: i64, draft: &IncidentDraft) -> Result<()> {
        mutations::update(self.store.conn_mut(), id, draft)?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Delete incidents by id. Returns the rows removed.
    pub fn delete(&mut self, ids: &[i64]) -> Result<usize> {
        let removed = mutations::delete_by_ids(self.store.conn_mut(), ids)?;
        self.cache.invalidate_all();
        Ok(removed)
    }

    /// Append a validated upload. Returns the rows written.
    pub fn upload(&mut self, batch: &upload::UploadBatch) -> Result<usize> {
        let written = upload::append(self.store.conn_mut(), batch)?;
        self.cache.invalidate_all();
        Ok(written)
    }
}
