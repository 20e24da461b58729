//! In-memory site and campaign stores

use async_trait::async_trait;
use chrono::Utc;
use lander_core::models::{
    site_storage_path, CampaignCode, CampaignCodeFilter, CodeGenre, LandingPage, NewCampaignCode,
    NewLandingPage, SortOrderEntry, TagFlags, UpdateCampaignCodeRequest,
};
use lander_core::AppError;
use lander_db::{CampaignStore, SiteStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct SiteState {
    sites: BTreeMap<i32, LandingPage>,
    /// Greatest site number ever issued
    high_water: Option<i32>,
}

/// Site store double that keeps the issued-number high-water mark the way
/// the Postgres counter table does
#[derive(Clone, Default)]
pub struct MemorySiteStore {
    state: Arc<Mutex<SiteState>>,
}

fn new_page(site: NewLandingPage) -> LandingPage {
    let now = Utc::now();
    LandingPage {
        id: Uuid::new_v4(),
        site_number: site.site_number,
        name: site.name,
        has_analytics_tag: site.flags.analytics_tag,
        has_tracking_script: site.flags.tracking_script,
        has_cta_marker: site.flags.cta_marker,
        storage_path: site_storage_path(site.site_number),
        cta_url: site.cta_url,
        is_hidden: false,
        is_published: true,
        sort_order: site.sort_order,
        created_at: now,
        updated_at: now,
    }
}

fn not_found(site_number: i32) -> AppError {
    AppError::NotFound(format!("Site {} not found", site_number))
}

impl MemorySiteStore {
    /// Insert a published site with no tags, sorted by its number
    pub fn seed_site(&self, site_number: i32, name: &str) -> LandingPage {
        let page = new_page(NewLandingPage {
            site_number,
            name: name.to_string(),
            flags: TagFlags::default(),
            cta_url: None,
            sort_order: site_number,
        });
        let mut state = self.state.lock().unwrap();
        state.sites.insert(site_number, page.clone());
        state.high_water = state.high_water.max(Some(site_number));
        page
    }

    fn mutate(
        &self,
        site_number: i32,
        apply: impl FnOnce(&mut LandingPage),
    ) -> Result<LandingPage, AppError> {
        let mut state = self.state.lock().unwrap();
        let site = state
            .sites
            .get_mut(&site_number)
            .ok_or_else(|| not_found(site_number))?;
        apply(site);
        site.updated_at = Utc::now();
        Ok(site.clone())
    }
}

#[async_trait]
impl SiteStore for MemorySiteStore {
    async fn next_site_number(&self) -> Result<i32, AppError> {
        let state = self.state.lock().unwrap();
        let max_existing = state.sites.keys().next_back().copied();
        Ok(state.high_water.max(max_existing).map_or(0, |n| n + 1))
    }

    async fn get_site(&self, site_number: i32) -> Result<Option<LandingPage>, AppError> {
        Ok(self.state.lock().unwrap().sites.get(&site_number).cloned())
    }

    async fn list_sites(&self) -> Result<Vec<LandingPage>, AppError> {
        let mut sites: Vec<LandingPage> =
            self.state.lock().unwrap().sites.values().cloned().collect();
        sites.sort_by_key(|site| (site.sort_order, site.site_number));
        Ok(sites)
    }

    async fn create_site(&self, site: NewLandingPage) -> Result<LandingPage, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.sites.contains_key(&site.site_number) {
            return Err(AppError::Conflict(format!(
                "Site {} already exists",
                site.site_number
            )));
        }
        let page = new_page(site);
        state.high_water = state.high_water.max(Some(page.site_number));
        state.sites.insert(page.site_number, page.clone());
        Ok(page)
    }

    async fn update_after_upload(
        &self,
        site_number: i32,
        name: &str,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| {
            site.name = name.to_string();
            site.has_analytics_tag = flags.analytics_tag;
            site.has_tracking_script = flags.tracking_script;
            site.has_cta_marker = flags.cta_marker;
        })
    }

    async fn delete_site(&self, site_number: i32) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sites
            .remove(&site_number)
            .is_some())
    }

    async fn set_hidden(&self, site_number: i32, hidden: bool) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| site.is_hidden = hidden)
    }

    async fn set_published(
        &self,
        site_number: i32,
        published: bool,
    ) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| site.is_published = published)
    }

    async fn update_name(&self, site_number: i32, name: &str) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| site.name = name.to_string())
    }

    async fn update_cta_url(
        &self,
        site_number: i32,
        cta_url: Option<&str>,
    ) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| site.cta_url = cta_url.map(str::to_string))
    }

    async fn update_tag_flags(
        &self,
        site_number: i32,
        flags: TagFlags,
    ) -> Result<LandingPage, AppError> {
        self.mutate(site_number, |site| {
            site.has_analytics_tag = flags.analytics_tag;
            site.has_tracking_script = flags.tracking_script;
            site.has_cta_marker = flags.cta_marker;
        })
    }

    async fn set_sort_orders(&self, entries: &[SortOrderEntry]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(missing) = entries
            .iter()
            .find(|entry| !state.sites.contains_key(&entry.site_number))
        {
            return Err(not_found(missing.site_number));
        }
        for entry in entries {
            if let Some(site) = state.sites.get_mut(&entry.site_number) {
                site.sort_order = entry.order;
            }
        }
        Ok(())
    }

    async fn next_sort_order(&self) -> Result<i32, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sites
            .values()
            .map(|site| site.sort_order)
            .max()
            .map_or(0, |order| order + 1))
    }
}

#[derive(Default)]
struct CampaignState {
    genres: Vec<CodeGenre>,
    /// Insertion order; listed newest first
    codes: Vec<CampaignCode>,
    next_genre_id: i32,
}

impl CampaignState {
    fn add_genre(&mut self, prefix: &str, name: &str, sort_order: i32) -> CodeGenre {
        self.next_genre_id += 1;
        let genre = CodeGenre {
            id: self.next_genre_id,
            prefix: prefix.to_string(),
            name: name.to_string(),
            sort_order,
            created_at: Utc::now(),
        };
        self.genres.push(genre.clone());
        genre
    }
}

/// Campaign store double; site references are not checked
#[derive(Clone, Default)]
pub struct MemoryCampaignStore {
    state: Arc<Mutex<CampaignState>>,
}

impl MemoryCampaignStore {
    pub fn seed_genre(&self, prefix: &str, name: &str) -> CodeGenre {
        let mut state = self.state.lock().unwrap();
        let sort_order = state.genres.len() as i32 + 1;
        state.add_genre(prefix, name, sort_order)
    }

    pub fn seed_code(
        &self,
        code: &str,
        site_id: Uuid,
        genre: &CodeGenre,
        is_active: bool,
    ) -> CampaignCode {
        let code = CampaignCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            site_id,
            genre_id: genre.id,
            genre_prefix: genre.prefix.clone(),
            genre_name: genre.name.clone(),
            name: format!("{} - {}", genre.name, code),
            memo: None,
            is_active,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().codes.push(code.clone());
        code
    }

    pub fn codes_for_site(&self, site_id: Uuid) -> Vec<CampaignCode> {
        self.state
            .lock()
            .unwrap()
            .codes
            .iter()
            .filter(|code| code.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn genre_count(&self) -> usize {
        self.state.lock().unwrap().genres.len()
    }
}

fn code_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Campaign code {} not found", id))
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn list_codes(&self, filter: CampaignCodeFilter) -> Result<Vec<CampaignCode>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .codes
            .iter()
            .rev()
            .filter(|code| filter.site_id.is_none_or(|id| code.site_id == id))
            .filter(|code| filter.genre_id.is_none_or(|id| code.genre_id == id))
            .cloned()
            .collect())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CampaignCode>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .codes
            .iter()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .codes
            .iter()
            .any(|c| c.code == code))
    }

    async fn create_code(&self, code: NewCampaignCode) -> Result<CampaignCode, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.codes.iter().any(|c| c.code == code.code) {
            return Err(AppError::Conflict(format!(
                "Campaign code {} already exists",
                code.code
            )));
        }
        let genre = state
            .genres
            .iter()
            .find(|g| g.id == code.genre_id)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("Site or genre does not exist".to_string()))?;

        let created = CampaignCode {
            id: Uuid::new_v4(),
            code: code.code,
            site_id: code.site_id,
            genre_id: genre.id,
            genre_prefix: genre.prefix,
            genre_name: genre.name,
            name: code.name,
            memo: code.memo,
            is_active: code.is_active,
            created_at: Utc::now(),
        };
        state.codes.push(created.clone());
        Ok(created)
    }

    async fn update_code(
        &self,
        id: Uuid,
        update: UpdateCampaignCodeRequest,
    ) -> Result<CampaignCode, AppError> {
        let mut state = self.state.lock().unwrap();
        let code = state
            .codes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| code_not_found(id))?;
        if let Some(name) = update.name {
            code.name = name;
        }
        if let Some(memo) = update.memo {
            code.memo = Some(memo);
        }
        if let Some(is_active) = update.is_active {
            code.is_active = is_active;
        }
        Ok(code.clone())
    }

    async fn delete_code(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.codes.len();
        state.codes.retain(|c| c.id != id);
        if state.codes.len() == before {
            return Err(code_not_found(id));
        }
        Ok(())
    }

    async fn list_active_codes_for_site(
        &self,
        site_id: Uuid,
    ) -> Result<Vec<CampaignCode>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .codes
            .iter()
            .filter(|c| c.site_id == site_id && c.is_active)
            .cloned()
            .collect())
    }

    async fn list_genres(&self) -> Result<Vec<CodeGenre>, AppError> {
        let mut genres = self.state.lock().unwrap().genres.clone();
        genres.sort_by_key(|g| (g.sort_order, g.id));
        Ok(genres)
    }

    async fn get_genre(&self, id: i32) -> Result<Option<CodeGenre>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .genres
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn last_genre_prefix(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .genres
            .iter()
            .map(|g| g.prefix.clone())
            .max())
    }

    async fn create_genre(&self, prefix: &str, name: &str) -> Result<CodeGenre, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.genres.iter().any(|g| g.prefix == prefix) {
            return Err(AppError::Conflict(format!(
                "Genre prefix {} already exists",
                prefix
            )));
        }
        let sort_order = state.genres.iter().map(|g| g.sort_order).max().unwrap_or(0) + 1;
        Ok(state.add_genre(prefix, name, sort_order))
    }

    async fn insert_genres(&self, genres: &[(&str, &str, i32)]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        for (prefix, name, sort_order) in genres {
            if !state.genres.iter().any(|g| g.prefix == *prefix) {
                state.add_genre(prefix, name, *sort_order);
            }
        }
        Ok(())
    }

    async fn rename_genre(&self, id: i32, name: &str) -> Result<CodeGenre, AppError> {
        let mut state = self.state.lock().unwrap();
        let genre = state
            .genres
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
        genre.name = name.to_string();
        Ok(genre.clone())
    }

    async fn delete_genre(&self, id: i32) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.codes.iter().any(|c| c.genre_id == id) {
            return Err(AppError::Conflict(
                "Genre is referenced by campaign codes and cannot be deleted".to_string(),
            ));
        }
        let before = state.genres.len();
        state.genres.retain(|g| g.id != id);
        if state.genres.len() == before {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        Ok(())
    }
}
