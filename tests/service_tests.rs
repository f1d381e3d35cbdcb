//! Service-level tests against a real SQLite database.

use concert_hub::config::SecurityConfig;
use concert_hub::db::{ConcertFilter, Store};
use concert_hub::domain::Role;
use concert_hub::models::concert::{ConcertInput, MediaRefs, PriceInput};
use concert_hub::models::user::{ProfileUpdate, Registration};
use concert_hub::services::{
    ConcertError, ConcertService, CredentialError, CredentialService, SeaOrmConcertService,
    SeaOrmCredentialService,
};

async fn temp_store() -> Store {
    let db_path = std::env::temp_dir().join(format!(
        "concert-hub-service-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open store")
}

fn registration(email: &str, role: Option<&str>) -> Registration {
    Registration {
        name: Some("Tester".to_string()),
        email: Some(email.to_string()),
        password: Some("rahasia1".to_string()),
        confirm_password: Some("rahasia1".to_string()),
        role: role.map(str::to_string),
    }
}

fn concert_input(name: &str) -> ConcertInput {
    ConcertInput {
        name: Some(name.to_string()),
        artist: Some("Orkes".to_string()),
        genre: Some("jazz".to_string()),
        date: Some("2026-07-01".to_string()),
        time: Some("18:45".to_string()),
        location: Some("Surabaya".to_string()),
        price: Some(PriceInput::Text("50000".to_string())),
        ..ConcertInput::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_logins_share_one_key() {
    let store = temp_store().await;
    let credentials = SeaOrmCredentialService::new(store.clone(), SecurityConfig::default());

    for round in 0..5 {
        let email = format!("first-login-{round}@example.com");
        let user = credentials
            .register(registration(&email, None))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            credentials.login(&email, "rahasia1"),
            credentials.login(&email, "rahasia1"),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.api_key, second.api_key);
        assert_eq!(store.count_active_api_keys(user.id).await.unwrap(), 1);
        assert_eq!(
            credentials
                .authenticate(Some(&first.api_key))
                .await
                .unwrap()
                .user_id(),
            user.id
        );
    }
}

#[tokio::test]
async fn test_rotation_leaves_exactly_one_active_key() {
    let store = temp_store().await;
    let credentials = SeaOrmCredentialService::new(store.clone(), SecurityConfig::default());

    let user = credentials
        .register(registration("keys@example.com", None))
        .await
        .unwrap();
    assert_eq!(user.role, Role::User);
    assert!(credentials.active_key(user.id).await.unwrap().is_none());

    let mut previous = Vec::new();
    for _ in 0..5 {
        let key = credentials.rotate_key(user.id).await.unwrap();
        assert_eq!(store.count_active_api_keys(user.id).await.unwrap(), 1);
        previous.push(key.api_key);
    }

    let latest = previous.pop().unwrap();
    assert!(credentials.owns_active_key(user.id, &latest).await.unwrap());
    for old in &previous {
        assert!(matches!(
            credentials.authenticate(Some(old)).await,
            Err(CredentialError::InvalidApiKey)
        ));
    }

    let authenticated = credentials.authenticate(Some(&latest)).await.unwrap();
    assert_eq!(authenticated.user_id(), user.id);

    assert!(matches!(
        credentials.rotate_key(99_999).await,
        Err(CredentialError::UserNotFound)
    ));
}

#[tokio::test]
async fn test_authorizer_requires_admin_role() {
    let store = temp_store().await;
    let credentials = SeaOrmCredentialService::new(store, SecurityConfig::default());

    let admin = credentials
        .register(registration("boss@example.com", Some("admin")))
        .await
        .unwrap();
    let member = credentials
        .register(registration("member@example.com", None))
        .await
        .unwrap();

    let admin_key = credentials.rotate_key(admin.id).await.unwrap();
    let member_key = credentials.rotate_key(member.id).await.unwrap();

    let admin_auth = credentials
        .authenticate(Some(&admin_key.api_key))
        .await
        .unwrap();
    assert_eq!(
        credentials.authorize_admin(&admin_auth).await.unwrap().id,
        admin.id
    );

    let member_auth = credentials
        .authenticate(Some(&member_key.api_key))
        .await
        .unwrap();
    assert!(matches!(
        credentials.authorize_admin(&member_auth).await,
        Err(CredentialError::Forbidden(_))
    ));

    assert!(matches!(
        credentials.authenticate(None).await,
        Err(CredentialError::MissingApiKey)
    ));
    assert!(matches!(
        credentials.authenticate(Some("   ")).await,
        Err(CredentialError::MissingApiKey)
    ));
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let store = temp_store().await;
    let credentials = SeaOrmCredentialService::new(store, SecurityConfig::default());

    let admin = credentials
        .register(registration("only@example.com", Some("admin")))
        .await
        .unwrap();

    let demote = ProfileUpdate {
        name: Some(admin.name.clone()),
        email: Some(admin.email.clone()),
        role: Some("user".to_string()),
    };
    assert!(matches!(
        credentials.update_user(admin.id, demote).await,
        Err(CredentialError::Validation(_))
    ));
}

#[tokio::test]
async fn test_bootstrap_admin_is_created_once() {
    let store = temp_store().await;
    let credentials = SeaOrmCredentialService::new(store.clone(), SecurityConfig::default());

    let admin = credentials.ensure_bootstrap_admin().await.unwrap().unwrap();
    assert_eq!(admin.email, "admin@concert-hub.local");
    assert!(admin.role.is_admin());
    assert_eq!(store.count_active_api_keys(admin.id).await.unwrap(), 1);

    assert!(credentials.ensure_bootstrap_admin().await.unwrap().is_none());

    let login = credentials
        .login("ADMIN@concert-hub.local", "password")
        .await
        .unwrap();
    assert_eq!(login.user.id, admin.id);
}

#[tokio::test]
async fn test_update_preserves_media_references() {
    let store = temp_store().await;
    let concerts = SeaOrmConcertService::new(store, "/uploads/concerts/default.jpg".to_string());

    let media = MediaRefs {
        image_url: Some("/uploads/concerts/1-1.png".to_string()),
        music_url: Some("/uploads/music/1-2.mp3".to_string()),
    };
    let created = concerts
        .create(concert_input("Jazz Sore"), media)
        .await
        .unwrap();
    assert_eq!(created.genre, "jazz");
    assert!((created.price - 50_000.0).abs() < f64::EPSILON);

    let updated = concerts
        .update(created.id, concert_input("Jazz Malam"), MediaRefs::default())
        .await
        .unwrap();
    assert_eq!(updated.name, "Jazz Malam");
    assert_eq!(updated.image_url, "/uploads/concerts/1-1.png");
    assert_eq!(updated.music_url.as_deref(), Some("/uploads/music/1-2.mp3"));

    let replaced = concerts
        .update(
            created.id,
            concert_input("Jazz Malam"),
            MediaRefs {
                image_url: Some("/uploads/concerts/2-2.gif".to_string()),
                music_url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.image_url, "/uploads/concerts/2-2.gif");
    assert_eq!(replaced.music_url.as_deref(), Some("/uploads/music/1-2.mp3"));

    assert!(matches!(
        concerts
            .update(9_999, concert_input("Ghost"), MediaRefs::default())
            .await,
        Err(ConcertError::NotFound(9_999))
    ));
}

#[tokio::test]
async fn test_search_and_delete() {
    let store = temp_store().await;
    let concerts = SeaOrmConcertService::new(store, "/uploads/concerts/default.jpg".to_string());

    let created = concerts
        .create(concert_input("Malam Jazz"), MediaRefs::default())
        .await
        .unwrap();
    assert_eq!(created.image_url, "/uploads/concerts/default.jpg");
    assert!(created.music_url.is_none());

    let none = concerts
        .list(ConcertFilter {
            genre: None,
            search: Some("rock".to_string()),
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    let by_artist = concerts
        .list(ConcertFilter {
            genre: Some("jazz".to_string()),
            search: Some("orkes".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(by_artist.len(), 1);

    assert!(concerts.delete(created.id).await.unwrap());
    assert!(!concerts.delete(created.id).await.unwrap());
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let store = temp_store().await;
    let concerts = SeaOrmConcertService::new(store, "/uploads/concerts/default.jpg".to_string());

    concerts
        .create(concert_input("ÉLAN Live"), MediaRefs::default())
        .await
        .unwrap();

    for search in ["élan", "ÉLAN", "Élan live"] {
        let found = concerts
            .list(ConcertFilter {
                genre: None,
                search: Some(search.to_string()),
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "search: {search}");
        assert_eq!(found[0].name, "ÉLAN Live");
    }
}
