use std::io::{self, Read};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lesson_engine::config::EngineConfig;
use lesson_engine::engine::materialize;
use lesson_engine::models::TemplateLesson;
use lesson_engine::{EngineError, ErrorResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    template: Vec<TemplateLesson>,
    week_of: NaiveDate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = EngineConfig::new_from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let request: PreviewRequest = serde_json::from_str(&input).map_err(EngineError::from)?;

    let today = config.today();
    info!(
        "previewing {} template lessons for week of {} (today {})",
        request.template.len(),
        request.week_of,
        today
    );

    match materialize::preview(&request.template, request.week_of, today) {
        Ok(preview) => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
            Ok(())
        }
        Err(rule) => {
            let err = EngineError::from(rule);
            error!("preview rejected: {}", err);
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
            Err(err.into())
        }
    }
}
