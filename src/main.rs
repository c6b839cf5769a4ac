//! athena-glance - run builder-assembled queries against Amazon Athena.

use std::time::Duration;

use athena_glance::athena::{MockQueryService, QueryService, QueryState, ResultLocation};
use athena_glance::cli::Cli;
use athena_glance::config::Config;
use athena_glance::error::Result;
use athena_glance::logging;
use athena_glance::query::{
    DistributionPercentageQueryBuilder, PollPolicy, QueryBuilder, QueryExecutionClient,
    SelectQueryBuilder,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config);

    let distribution = distribution_query()?;
    let select = select_query();
    let builders: [&dyn QueryBuilder; 2] = [&distribution, &select];

    if cli.mock {
        let athena = &config.athena;
        let service = MockQueryService::new().with_states([QueryState::Queued, QueryState::Running]);
        let client = QueryExecutionClient::new(
            service,
            athena.database.clone().unwrap_or_else(|| "mock_db".to_string()),
            ResultLocation::new(
                athena.output_bucket.clone().unwrap_or_else(|| "mock-bucket".to_string()),
                athena.output_folder.clone().unwrap_or_default(),
            ),
        )
        .with_poll_policy(PollPolicy::new(config.polling.max_attempts, Duration::ZERO)?);

        return run_all(&client, &builders).await;
    }

    config.apply_env_defaults();
    let settings = config.resolve()?;
    info!(
        "Using database '{}' in {} (results to s3://{}/{})",
        settings.database, settings.region, settings.output_bucket, settings.output_folder
    );
    let client = QueryExecutionClient::from_settings(&settings)?;

    run_all(&client, &builders).await
}

/// Percentage of detections per vehicle type, bucketed by distance.
fn distribution_query() -> Result<DistributionPercentageQueryBuilder> {
    let mut builder = DistributionPercentageQueryBuilder::new(
        "distance_detection",
        "vehicle_type",
        "detection",
        "distance",
    );
    builder
        .add_distribution_range(0, 10)?
        .add_distribution_range(10, 20)?
        .add_distribution_range(20, 100)?;
    Ok(builder)
}

/// A handful of raw detection rows.
fn select_query() -> SelectQueryBuilder {
    let mut builder = SelectQueryBuilder::new("distance_detection");
    builder
        .add_column("clip_name")
        .add_column("frame_id")
        .add_column("vehicle_type");
    builder
}

async fn run_all<S: QueryService>(
    client: &QueryExecutionClient<S>,
    builders: &[&dyn QueryBuilder],
) -> Result<()> {
    for builder in builders {
        let outcome = client.run_builder(*builder).await?;

        if !outcome.succeeded() {
            warn!(
                "Query {} finished as {}: {}",
                outcome.execution.execution_id,
                outcome.execution.state,
                outcome
                    .execution
                    .state_change_reason
                    .as_deref()
                    .unwrap_or("no reason given")
            );
        }

        if outcome.result_set.is_empty() {
            info!("Query {} returned no rows", outcome.execution.execution_id);
        }
        println!("{}", outcome.result_set);
        info!("Query finished in {:.1}s", outcome.elapsed.as_secs_f64());
    }
    Ok(())
}
