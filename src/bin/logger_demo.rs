use rapport::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap()?;
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!(operation = "send", step = 1, "bootstrap info log");

    let config = LogConfig {
        filter: "debug".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("configured trace log");
    debug!(operation = "accept", step = 2, total = 4, "configured debug log");
    warn!("configured warn log");

    let bad = LogConfig {
        filter: "not a [valid filter".to_string(),
    };
    println!("invalid filter rejected: {}", logger.reload_from_config(&bad).is_err());

    Ok(())
}
