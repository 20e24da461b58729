//! Campaign codes and code genres

use lander_core::models::{
    CampaignCode, CampaignCodeFilter, CodeGenre, CodeLookupResponse, CreateCampaignCodeRequest,
    NewCampaignCode, UpdateCampaignCodeRequest,
};
use lander_core::AppError;
use lander_db::{CampaignStore, SiteStore};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

/// Genres seeded into an empty genre table, in sort order
pub const DEFAULT_GENRES: &[(&str, &str)] = &[
    ("AAA", "LINE"),
    ("AAB", "Meta広告"),
    ("AAC", "Facebook"),
    ("AAD", "Instagram"),
    ("AAE", "Messenger"),
    ("AAF", "Audience Network"),
    ("AAG", "Threads"),
    ("AAH", "Google広告"),
];

const CODE_SUFFIX_LEN: usize = 6;
const CODE_SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 10;

/// Prefix following `last` in `AAA`, `AAB`, … `AAZ`, `ABA`, … order
///
/// `None` (no genre yet) yields `AAA`; `ZZZ` has no successor.
pub fn next_genre_prefix(last: Option<&str>) -> Result<String, AppError> {
    let Some(last) = last else {
        return Ok("AAA".to_string());
    };

    let mut letters: Vec<u8> = last.bytes().collect();
    if letters.len() != 3 || !letters.iter().all(u8::is_ascii_uppercase) {
        return Err(AppError::Internal(format!(
            "Unexpected genre prefix in store: {}",
            last
        )));
    }

    for i in (0..letters.len()).rev() {
        if letters[i] < b'Z' {
            letters[i] += 1;
            return Ok(String::from_utf8_lossy(&letters).into_owned());
        }
        letters[i] = b'A';
    }

    Err(AppError::Conflict(
        "All genre prefixes are in use".to_string(),
    ))
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_SUFFIX_CHARSET[rng.random_range(0..CODE_SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// `{prefix}-{6 random [A-Z0-9]}` not yet present in the store
pub(crate) async fn generate_unique_code(
    store: &dyn CampaignStore,
    prefix: &str,
) -> Result<String, AppError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = format!("{}-{}", prefix, random_suffix());
        if !store.code_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!(code = %candidate, "Campaign code collision, retrying");
    }

    Err(AppError::Internal(format!(
        "Could not generate a unique campaign code for prefix {} after {} attempts",
        prefix, MAX_CODE_ATTEMPTS
    )))
}

/// Campaign code and genre management
#[derive(Clone)]
pub struct CampaignService {
    sites: Arc<dyn SiteStore>,
    store: Arc<dyn CampaignStore>,
}

impl CampaignService {
    pub fn new(sites: Arc<dyn SiteStore>, store: Arc<dyn CampaignStore>) -> Self {
        Self { sites, store }
    }

    async fn site_id(&self, site_number: i32) -> Result<Uuid, AppError> {
        self.sites
            .get_site(site_number)
            .await?
            .map(|site| site.id)
            .ok_or_else(|| AppError::NotFound(format!("Site {} not found", site_number)))
    }

    /// Codes filtered by site number and/or genre, newest first
    #[tracing::instrument(skip(self))]
    pub async fn list_codes(
        &self,
        site_number: Option<i32>,
        genre_id: Option<i32>,
    ) -> Result<Vec<CampaignCode>, AppError> {
        let site_id = match site_number {
            Some(n) => Some(self.site_id(n).await?),
            None => None,
        };
        self.store
            .list_codes(CampaignCodeFilter { site_id, genre_id })
            .await
    }

    #[tracing::instrument(skip(self, request), fields(site_number = request.site_number, genre_id = request.genre_id))]
    pub async fn create_code(
        &self,
        request: CreateCampaignCodeRequest,
    ) -> Result<CampaignCode, AppError> {
        let site_id = self.site_id(request.site_number).await?;
        let genre = self
            .store
            .get_genre(request.genre_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", request.genre_id)))?;

        let code = generate_unique_code(self.store.as_ref(), &genre.prefix).await?;
        let name = request
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{} - {}", genre.name, code));

        let created = self
            .store
            .create_code(NewCampaignCode {
                code,
                site_id,
                genre_id: genre.id,
                name,
                memo: request.memo,
                is_active: true,
            })
            .await?;

        tracing::info!(code = %created.code, site_number = request.site_number, "Campaign code created");
        Ok(created)
    }

    pub async fn update_code(
        &self,
        id: Uuid,
        update: UpdateCampaignCodeRequest,
    ) -> Result<CampaignCode, AppError> {
        self.store.update_code(id, update).await
    }

    pub async fn delete_code(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete_code(id).await?;
        tracing::info!(code_id = %id, "Campaign code deleted");
        Ok(())
    }

    /// Resolve a code value; unknown codes are `valid: false`, not an error
    pub async fn lookup(&self, code: &str) -> Result<CodeLookupResponse, AppError> {
        Ok(self
            .store
            .find_by_code(code)
            .await?
            .map(CodeLookupResponse::from)
            .unwrap_or_else(CodeLookupResponse::invalid))
    }

    /// Genres in sort order, seeding the defaults into an empty table
    pub async fn list_genres(&self) -> Result<Vec<CodeGenre>, AppError> {
        let genres = self.store.list_genres().await?;
        if !genres.is_empty() {
            return Ok(genres);
        }

        let defaults: Vec<(&str, &str, i32)> = DEFAULT_GENRES
            .iter()
            .zip(1..)
            .map(|(&(prefix, name), order)| (prefix, name, order))
            .collect();
        self.store.insert_genres(&defaults).await?;
        tracing::info!(count = defaults.len(), "Seeded default code genres");

        self.store.list_genres().await
    }

    pub async fn create_genre(&self, name: &str) -> Result<CodeGenre, AppError> {
        let last = self.store.last_genre_prefix().await?;
        let prefix = next_genre_prefix(last.as_deref())?;
        let genre = self.store.create_genre(&prefix, name.trim()).await?;
        tracing::info!(prefix = %genre.prefix, "Code genre created");
        Ok(genre)
    }

    pub async fn rename_genre(&self, id: i32, name: &str) -> Result<CodeGenre, AppError> {
        self.store.rename_genre(id, name.trim()).await
    }

    pub async fn delete_genre(&self, id: i32) -> Result<(), AppError> {
        self.store.delete_genre(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemoryCampaignStore, MemorySiteStore};

    fn service() -> (CampaignService, Arc<MemorySiteStore>, Arc<MemoryCampaignStore>) {
        let sites = Arc::new(MemorySiteStore::default());
        let store = Arc::new(MemoryCampaignStore::default());
        (
            CampaignService::new(sites.clone(), store.clone()),
            sites,
            store,
        )
    }

    #[test]
    fn test_next_genre_prefix() {
        assert_eq!(next_genre_prefix(None).unwrap(), "AAA");
        assert_eq!(next_genre_prefix(Some("AAA")).unwrap(), "AAB");
        assert_eq!(next_genre_prefix(Some("AAZ")).unwrap(), "ABA");
        assert_eq!(next_genre_prefix(Some("AZZ")).unwrap(), "BAA");
        assert!(matches!(
            next_genre_prefix(Some("ZZZ")),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_list_genres_seeds_defaults_once() {
        let (service, _, store) = service();

        let genres = service.list_genres().await.unwrap();
        assert_eq!(genres.len(), DEFAULT_GENRES.len());
        assert_eq!(genres[0].prefix, "AAA");
        assert_eq!(genres[0].name, "LINE");
        assert_eq!(genres[7].prefix, "AAH");

        service.list_genres().await.unwrap();
        assert_eq!(store.genre_count(), DEFAULT_GENRES.len());
    }

    #[tokio::test]
    async fn test_create_genre_takes_next_prefix() {
        let (service, _, _) = service();
        service.list_genres().await.unwrap();

        let genre = service.create_genre(" TikTok ").await.unwrap();
        assert_eq!(genre.prefix, "AAI");
        assert_eq!(genre.name, "TikTok");
        assert_eq!(genre.sort_order, 9);
    }

    #[tokio::test]
    async fn test_create_code_defaults_name_and_uses_prefix() {
        let (service, sites, _) = service();
        sites.seed_site(3, "Spring");
        let genres = service.list_genres().await.unwrap();

        let code = service
            .create_code(CreateCampaignCodeRequest {
                site_number: 3,
                genre_id: genres[0].id,
                name: None,
                memo: Some("first".into()),
            })
            .await
            .unwrap();

        assert!(code.code.starts_with("AAA-"));
        assert_eq!(code.code.len(), 10);
        assert_eq!(code.name, format!("LINE - {}", code.code));
        assert!(code.is_active);

        let listed = service.list_codes(Some(3), None).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_code_for_missing_site() {
        let (service, _, _) = service();
        let genres = service.list_genres().await.unwrap();

        let result = service
            .create_code(CreateCampaignCodeRequest {
                site_number: 99,
                genre_id: genres[0].id,
                name: None,
                memo: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup() {
        let (service, sites, _) = service();
        sites.seed_site(1, "A");
        let genres = service.list_genres().await.unwrap();
        let code = service
            .create_code(CreateCampaignCodeRequest {
                site_number: 1,
                genre_id: genres[1].id,
                name: Some("Spring ads".into()),
                memo: None,
            })
            .await
            .unwrap();

        let found = service.lookup(&code.code).await.unwrap();
        assert!(found.valid);
        assert_eq!(found.genre_prefix.as_deref(), Some("AAB"));
        assert_eq!(found.genre_name.as_deref(), Some("Meta広告"));

        let missing = service.lookup("AAA-NOPE00").await.unwrap();
        assert!(!missing.valid);
        assert!(missing.code.is_none());
    }

    #[tokio::test]
    async fn test_genre_in_use_cannot_be_deleted() {
        let (service, sites, _) = service();
        sites.seed_site(1, "A");
        let genres = service.list_genres().await.unwrap();
        service
            .create_code(CreateCampaignCodeRequest {
                site_number: 1,
                genre_id: genres[0].id,
                name: None,
                memo: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            service.delete_genre(genres[0].id).await,
            Err(AppError::Conflict(_))
        ));
        service.delete_genre(genres[1].id).await.unwrap();
    }
}
