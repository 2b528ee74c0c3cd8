use rapport::domain_model::{UserId, UserPair};
use rapport::domain_port::StaticIdentity;
use rapport::logger::*;
use rapport::runtime::*;
use rapport::session::*;
use rapport::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap()?;

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let runtime = Runtime::try_new(&project_settings).await?;

    if let Command::Inspect { first, second } = &cli.command {
        let pair = UserPair::new(UserId::from_username(first), UserId::from_username(second))
            .ok_or_else(|| anyhow::anyhow!("inspect needs two different users"))?;
        let inspection = runtime.repository.inspect_pair(pair).await?;
        println!("{} -> {}: {}", pair.min(), pair.max(), inspection.min_view);
        println!("{} -> {}: {}", pair.max(), pair.min(), inspection.max_view);
        for violation in &inspection.violations {
            println!("violation: {violation}");
        }
        if inspection.is_consistent() {
            println!("consistent");
        }
        return Ok(());
    }

    let acting_as = cli
        .acting_as
        .as_deref()
        .or(project_settings.session.username.as_deref());
    let identity = StaticIdentity(acting_as.map(UserId::from_username));
    let controller = RelationshipController::sign_in(&identity, runtime.repository.clone())?;
    controller.refresh().await;

    let outcome = match &cli.command {
        Command::Send { username } => {
            controller
                .send_request(UserId::from_username(username))
                .await
        }
        Command::Cancel { username } => {
            controller
                .cancel_request(UserId::from_username(username))
                .await
        }
        Command::Accept { username } => {
            controller
                .accept_request(UserId::from_username(username))
                .await
        }
        Command::Reject { username } => {
            controller
                .reject_request(UserId::from_username(username))
                .await
        }
        Command::Remove { username } => {
            controller
                .remove_link(UserId::from_username(username))
                .await
        }
        Command::Show | Command::Inspect { .. } => {
            let snapshot = controller.snapshot();
            println!("user: {}", controller.user_id());
            println!("own requests: {:?}", snapshot.own_requests);
            println!("incoming requests: {:?}", snapshot.incoming_requests);
            println!("links: {:?}", snapshot.links);
            return Ok(());
        }
    };

    let report = outcome?;
    if report.is_skipped() {
        println!("{}: nothing pending, no writes issued", report.operation);
    } else {
        println!(
            "{}: store acknowledged {}/{} writes",
            report.operation, report.steps_applied, report.total_steps
        );
    }

    controller.sign_out();
    Ok(())
}
