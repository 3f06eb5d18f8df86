use std::error::Error;

use react_labs::{observability, run_console, Lab, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = Settings::from_env()?;
    let telemetry = observability::init(&settings.langfuse)?;

    let result = run_console(Lab::Weather, &settings).await;

    observability::shutdown(telemetry);
    result
}
