//! `CampaignCodeRepository` against Postgres: uniqueness and referential rules.

mod helpers;

use helpers::{new_site, setup_test_db};
use lander_core::models::{CampaignCodeFilter, NewCampaignCode};
use lander_core::AppError;
use lander_db::{CampaignCodeRepository, CampaignStore, SiteRepository, SiteStore};

#[tokio::test]
async fn test_duplicate_code_is_conflict_and_genre_in_use_is_kept() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let sites = SiteRepository::new(db.pool.clone());
    let codes = CampaignCodeRepository::new(db.pool.clone());

    let site = sites.create_site(new_site(0, "Spring")).await.unwrap();
    codes
        .insert_genres(&[("AAA", "LINE", 1), ("AAB", "Meta", 2)])
        .await
        .unwrap();
    let genres = codes.list_genres().await.unwrap();
    assert_eq!(genres.len(), 2);

    let new_code = NewCampaignCode {
        code: "AAA-ABC123".to_string(),
        site_id: site.id,
        genre_id: genres[0].id,
        name: "Spring LINE".to_string(),
        memo: None,
        is_active: true,
    };
    let created = codes.create_code(new_code.clone()).await.unwrap();
    assert_eq!(created.genre_prefix, "AAA");
    assert!(codes.code_exists("AAA-ABC123").await.unwrap());

    assert!(matches!(
        codes.create_code(new_code).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        codes.delete_genre(genres[0].id).await,
        Err(AppError::Conflict(_))
    ));
    codes.delete_genre(genres[1].id).await.unwrap();

    // Codes go with their site
    sites.delete_site(0).await.unwrap();
    let remaining = codes
        .list_codes(CampaignCodeFilter::default())
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_seeding_genres_twice_keeps_one_copy() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let codes = CampaignCodeRepository::new(db.pool.clone());

    codes.insert_genres(&[("AAA", "LINE", 1)]).await.unwrap();
    codes.insert_genres(&[("AAA", "LINE", 1)]).await.unwrap();
    assert_eq!(codes.list_genres().await.unwrap().len(), 1);
    assert_eq!(codes.last_genre_prefix().await.unwrap().as_deref(), Some("AAA"));

    let genre = codes.create_genre("AAB", "Meta").await.unwrap();
    assert_eq!(genre.sort_order, 2);
}
