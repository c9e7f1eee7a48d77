use airdrop_indexer::config::Config;
use airdrop_indexer::repository::Database;
use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let config = Config::from_env()?;

    println!("Running migrations on database: {}", config.database_url);

    let db = Database::new(&config.database_url)?;
    let entities = config.watched_entities();
    db.seed_checkpoints(&entities)?;

    for entity in &entities {
        println!(
            "Checkpoint ready for {} {:?}",
            entity.kind().label(),
            entity.address()
        );
    }

    println!("Migrations completed successfully!");

    Ok(())
}
