use std::sync::Arc;

use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

mod config;
mod enricher;
mod error;
mod handler;
mod lookup;
mod message;
mod sink;
mod telemetry;

use config::EnricherConfig;
use enricher::MessageEnricher;
use handler::function_handler;
use lookup::IpifyClient;
use sink::DynamoDbSink;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = EnricherConfig::from_env()?;
    telemetry::init_tracing(&config.log_level);

    // Clients are built once at cold start and reused by every invocation
    let http_client = reqwest::Client::builder()
        .timeout(config.ip_lookup_timeout())
        .build()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);

    let lookup = IpifyClient::new(http_client, config.ip_lookup_url.clone());
    info!(
        table_name = %config.table_name,
        lookup_url = %lookup.url(),
        "starting message enricher"
    );

    let enricher = MessageEnricher::new(
        Arc::new(lookup),
        Arc::new(DynamoDbSink::new(dynamodb_client, config.table_name.clone())),
    );
    let enricher = &enricher;

    run(service_fn(move |event: LambdaEvent<Option<SqsEvent>>| async move {
        function_handler(enricher, event).await
    }))
    .await
}
