use std::error::Error;

use react_labs::{observability, web, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = Settings::from_env()?;
    let telemetry = observability::init(&settings.langfuse)?;

    let result = web::serve(settings).await;

    observability::shutdown(telemetry);
    result
}
