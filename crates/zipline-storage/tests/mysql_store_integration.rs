use std::time::Duration;

use uuid::Uuid;
use zipline_core::{NewUrl, Owner, UrlStatus, UrlStore, UrlUpdate};
use zipline_storage::MySqlStore;
use zipline_test_infra::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    store: MySqlStore,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        sqlx::query(include_str!("../ddl/mysql/urls.sql"))
            .execute(&pool)
            .await
            .expect("create schema");

        Self {
            _mysql: mysql,
            store: MySqlStore::new(pool),
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    use sqlx::mysql::MySqlPoolOptions;

    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn new_url(url: &str, owner: Owner) -> NewUrl {
    NewUrl::new(url, owner)
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn insert_populates_the_record() {
    let fixture = Fixture::start().await;

    let record = fixture
        .store
        .insert(new_url("https://example.com", Owner::Anonymous))
        .await
        .unwrap();

    assert_eq!(record.id, 1);
    assert_eq!(record.short_code.as_str(), "1");
    assert_eq!(record.clicks, 0);
    assert_eq!(record.status, UrlStatus::Active);
    assert_eq!(record.owner, Owner::Anonymous);

    // The committed row equals what insert returned.
    let found = fixture.store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(found, record);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn find_by_short_code_with_status_filter() {
    let fixture = Fixture::start().await;

    let record = fixture
        .store
        .insert(new_url("https://example.com", Owner::Anonymous))
        .await
        .unwrap();
    fixture
        .store
        .set_status(record.id, UrlStatus::Inactive)
        .await
        .unwrap();

    let active_only = fixture
        .store
        .find_by_short_code(&record.short_code, Some(UrlStatus::Active))
        .await
        .unwrap();
    assert_eq!(active_only, None);

    let any = fixture
        .store
        .find_by_short_code(&record.short_code, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(any.status, UrlStatus::Inactive);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn owner_probe_and_listing() {
    let fixture = Fixture::start().await;
    let user = Uuid::new_v4();

    let anon = fixture
        .store
        .insert(new_url("https://example.com", Owner::Anonymous))
        .await
        .unwrap();
    let owned_a = fixture
        .store
        .insert(new_url("https://example.com", Owner::User(user)))
        .await
        .unwrap();
    let owned_b = fixture
        .store
        .insert(new_url("https://example.com/b", Owner::User(user)))
        .await
        .unwrap();

    let probe = fixture
        .store
        .find_by_owner_and_url(&Owner::Anonymous, "https://example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(probe.id, anon.id);

    let probe = fixture
        .store
        .find_by_owner_and_url(&Owner::User(user), "https://example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(probe.id, owned_a.id);

    let listed = fixture.store.list_by_owner(user).await.unwrap();
    assert_eq!(
        listed.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![owned_a.id, owned_b.id]
    );
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn clicks_accumulate_durably() {
    let fixture = Fixture::start().await;

    let record = fixture
        .store
        .insert(new_url("https://example.com", Owner::Anonymous))
        .await
        .unwrap();

    for _ in 0..4 {
        fixture.store.increment_clicks(record.id).await.unwrap();
    }

    let found = fixture.store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(found.clicks, 4);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn update_fields_rereads_the_row() {
    let fixture = Fixture::start().await;

    let record = fixture
        .store
        .insert(new_url("https://example.com/old", Owner::Anonymous))
        .await
        .unwrap();

    let updated = fixture
        .store
        .update_fields(
            record.id,
            UrlUpdate {
                original_url: "https://example.com/new".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.original_url, "https://example.com/new");
    assert_eq!(updated.short_code, record.short_code);

    let missing = fixture
        .store
        .update_fields(
            999,
            UrlUpdate {
                original_url: "https://example.com/x".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn delete_removes_the_row() {
    let fixture = Fixture::start().await;

    let record = fixture
        .store
        .insert(new_url("https://example.com", Owner::Anonymous))
        .await
        .unwrap();

    assert!(fixture.store.delete_by_id(record.id).await.unwrap());
    assert!(!fixture.store.delete_by_id(record.id).await.unwrap());
    assert_eq!(fixture.store.find_by_id(record.id).await.unwrap(), None);
}
