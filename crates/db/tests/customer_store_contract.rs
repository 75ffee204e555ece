use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use eshop_core::config::{AppConfig, DatabaseConfig};
use eshop_core::domain::customer::CustomerInput;
use eshop_core::pagination::{PageRequest, PageSize};
use eshop_core::query::{build_query, CustomerFilter, Predicate};
use eshop_core::synthetic::SyntheticCustomers;
use eshop_db::{BulkSeeder, CustomerCollection, CustomerService, Store, UpdateOutcome};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn open_store(dir: &tempfile::TempDir) -> ContractResult<Store> {
    let database = DatabaseConfig {
        url: format!("sqlite://{}/eshop.db?mode=rwc", dir.path().display()),
        name: "eshop".to_string(),
        max_connections: 2,
        timeout_secs: 5,
    };
    Store::open(&database, &AppConfig::default().store).await.map_err(|e| e.to_string())
}

#[tokio::test]
async fn create_read_update_delete_round_trip() -> ContractResult {
    let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
    let store = open_store(&dir).await?;
    let collection = store.collection(None).await.map_err(|e| e.to_string())?;
    let service = CustomerService::new(Arc::new(collection));

    let input = CustomerInput {
        name: "Lúcia Prado".to_string(),
        email: "lucia@example.com".to_string(),
        city: "Florianópolis".to_string(),
        state: "SC".to_string(),
        phone: "(48) 99999-0000".to_string(),
        is_vip: true,
        ..CustomerInput::default()
    };
    let id = service.create_customer(input.clone()).await.map_err(|e| e.to_string())?;

    let stored = service
        .find_customer(&id.to_string())
        .await
        .map_err(|e| e.to_string())?
        .ok_or("created customer should be readable")?;
    require_eq!(stored.fields(), input);

    let outcome = service
        .update_customer(
            &id.to_string(),
            CustomerInput { city: "Blumenau".to_string(), ..input.clone() },
        )
        .await
        .map_err(|e| e.to_string())?;
    require_eq!(outcome, UpdateOutcome::Updated);

    let by_city = build_query(&CustomerFilter {
        city: Some("BLUMENAU".to_string()),
        ..CustomerFilter::default()
    });
    let page = service
        .read_page(&by_city, PageRequest::default())
        .await
        .map_err(|e| e.to_string())?;
    require_eq!(page.total_matching, 1);
    require_eq!(page.items[0].created_at, stored.created_at);

    let first = service.delete_customer(&id.to_string()).await.map_err(|e| e.to_string())?;
    let second = service.delete_customer(&id.to_string()).await.map_err(|e| e.to_string())?;
    require_eq!((first.deleted_count, second.deleted_count), (1, 0));

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn seeded_collection_pages_agree_with_in_memory_oracle() -> ContractResult {
    let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
    let store = open_store(&dir).await?;
    let collection = store.collection(Some("seed_check")).await.map_err(|e| e.to_string())?;

    let reference = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).single().ok_or("instant")?;
    let mut seeder = BulkSeeder::new(50).map_err(|e| e.to_string())?;
    let report = seeder
        .seed(&collection, SyntheticCustomers::seeded(99, reference), 237)
        .await
        .map_err(|e| e.to_string())?;
    require_eq!(report.total_inserted, 237);
    require_eq!(report.batches, 5);

    let everything = collection
        .find(&Predicate::match_all(), Default::default())
        .await
        .map_err(|e| e.to_string())?;
    require_eq!(everything.len(), 237);
    require!(
        everything.windows(2).all(|pair| (pair[0].created_at, pair[0].id)
            <= (pair[1].created_at, pair[1].id)),
        "records should be ordered by created_at then id"
    );

    let filter = CustomerFilter {
        created_from: NaiveDate::from_ymd_opt(2023, 1, 1),
        created_to: NaiveDate::from_ymd_opt(2024, 12, 31),
        ..CustomerFilter::default()
    };
    let predicate = build_query(&filter);
    let expected: Vec<_> =
        everything.iter().filter(|customer| predicate.matches(customer)).cloned().collect();

    let service = CustomerService::new(Arc::new(collection));
    let mut paged = Vec::new();
    let mut page_number = 1;
    loop {
        let request =
            PageRequest::new(page_number, PageSize::TwentyFive).map_err(|e| e.to_string())?;
        let page = service.read_page(&predicate, request).await.map_err(|e| e.to_string())?;
        require_eq!(page.total_matching, expected.len() as u64);
        if page.is_empty() {
            break;
        }
        paged.extend(page.items);
        page_number += 1;
    }
    require_eq!(paged, expected);

    let index_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'eshop_seed_check' AND name LIKE 'idx_%'",
    )
    .fetch_one(store.pool())
    .await
    .map_err(|e| e.to_string())?;
    require_eq!(index_count, 3);

    store.close().await;
    Ok(())
}
