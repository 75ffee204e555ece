use chrono::Utc;
use eshop_core::config::{AppConfig, LoadOptions};
use eshop_core::synthetic::SyntheticCustomers;
use eshop_db::{BulkSeeder, CustomerCollection, RepositoryError, SeedError, SeedReport, Store};

use crate::commands::{exit, CommandResult};

/// Command-line overrides; `None` falls back to the `seed`/`store` config sections.
#[derive(Clone, Debug, Default)]
pub struct SeedArgs {
    pub count: Option<u64>,
    pub batch_size: Option<usize>,
    pub collection: Option<String>,
    pub rng_seed: Option<u64>,
}

type Failure = (&'static str, String, u8);

pub fn run(args: SeedArgs) -> CommandResult {
    run_with_options(args, LoadOptions::default())
}

pub fn run_with_options(args: SeedArgs, options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                exit::CONFIG,
            );
        }
    };

    let count = args.count.unwrap_or(config.seed.count);
    let batch_size = args.batch_size.unwrap_or(config.seed.batch_size);
    let mut seeder = match BulkSeeder::new(batch_size) {
        Ok(seeder) => seeder,
        Err(error) => {
            return CommandResult::failure("seed", "seed_validation", error.to_string(), exit::CONFIG);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                exit::RUNTIME,
            );
        }
    };

    let result = runtime.block_on(async {
        let store = Store::open(&config.database, &config.store)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), exit::CONNECTIVITY))?;

        let outcome = async {
            let collection = store
                .collection_for_bulk_load(args.collection.as_deref())
                .await
                .map_err(collection_failure)?;
            let generator = match args.rng_seed {
                Some(seed) => SyntheticCustomers::seeded(seed, Utc::now()),
                None => SyntheticCustomers::new(Utc::now()),
            };
            let report =
                seeder.seed(&collection, generator, count).await.map_err(seed_failure)?;
            Ok::<_, Failure>((collection.name().to_string(), report))
        }
        .await;

        store.close().await;
        outcome
    });

    match result {
        Ok((collection, report)) => CommandResult::success_with_report(
            "seed",
            summary(&collection, count, &report),
            serde_json::to_value(&report).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn collection_failure(error: RepositoryError) -> Failure {
    match error {
        RepositoryError::InvalidCollectionName(_) => {
            ("invalid_collection", error.to_string(), exit::CONFIG)
        }
        other if other.is_connectivity() => {
            ("db_connectivity", other.to_string(), exit::CONNECTIVITY)
        }
        other => ("seed_execution", other.to_string(), exit::SEED),
    }
}

fn seed_failure(error: SeedError) -> Failure {
    if error.is_connectivity() {
        return ("db_connectivity", error.to_string(), exit::CONNECTIVITY);
    }
    match error {
        SeedError::Validation(_) => ("seed_validation", error.to_string(), exit::CONFIG),
        SeedError::BatchFailed { .. } | SeedError::Indexes(_) => {
            ("seed_execution", error.to_string(), exit::SEED)
        }
    }
}

fn summary(collection: &str, target: u64, report: &SeedReport) -> String {
    let mut message = format!(
        "inserted {}/{} customers into `{collection}` in {} batches",
        report.total_inserted, target, report.batches
    );
    if report.failed_documents > 0 {
        message.push_str(&format!("; {} documents rejected", report.failed_documents));
    }
    message
}
