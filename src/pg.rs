use crate::store::GameStats;
use anyhow::Context;
use sled::IVec;
use std::time::Duration;
use tokio_postgres::{types::ToSql, Client, NoTls, Statement};

/// Returns true if the PostgreSQL connection settings are present in the environment.
pub fn is_configured() -> bool {
    ["PG_HOST", "PG_USER", "PG_PASSWORD", "PG_DBNAME"]
        .iter()
        .all(|key| std::env::var(key).is_ok())
}

/// Drains the archive of finished games into PostgreSQL, one row at a time.
pub async fn sync_game_stats(db: sled::Db) {
    let client = match connect_pg().await {
        Ok(client) => client,
        Err(err) => return log::error!("Could not connect to PostgreSQL: {:?}", err),
    };

    let sql = "INSERT INTO game (id, code, room_code, started, finished, players, winner, outcome)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT DO NOTHING;";
    let Ok(insert) = client.prepare(sql).await else {
        return log::error!("Could not create prepared statement");
    };

    let Ok(db) = db.open_tree("archive") else {
        return log::error!("Could not open archive database");
    };

    log::info!("Writing game statistics to PostgreSQL.");
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;

        if client.is_closed() {
            log::error!("Connection to PostgreSQL closed.");
            return;
        }

        let Some((key, stats)) = db.iter().flat_map(|e| e.ok().and_then(read_row)).next() else {
            continue;
        };

        if let Err(err) = write_row(&client, &insert, key, &stats).await {
            log::error!("Could not write row: {:?}", err);
            continue;
        }

        log::info!("Archived game {} to PostgreSQL", stats.id);
        db.remove((key as u64).to_be_bytes()).ok();
    }
}

async fn connect_pg() -> anyhow::Result<Client> {
    let host = std::env::var("PG_HOST").context("PG_HOST is not set")?;
    let user = std::env::var("PG_USER").context("PG_USER is not set")?;
    let password = std::env::var("PG_PASSWORD").context("PG_PASSWORD is not set")?;
    let dbname = std::env::var("PG_DBNAME").context("PG_DBNAME is not set")?;

    let (client, connection) = tokio_postgres::Config::new()
        .host(&host)
        .user(&user)
        .password(&password)
        .dbname(&dbname)
        .connect(NoTls)
        .await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok(client)
}

fn read_row(entry: (IVec, IVec)) -> Option<(i64, GameStats)> {
    let key = u64::from_be_bytes(entry.0.as_ref().try_into().ok()?) as i64;
    let stats = serde_json::from_slice::<GameStats>(&entry.1).ok()?;
    Some((key, stats))
}

async fn write_row(client: &Client, stmt: &Statement, key: i64, stats: &GameStats) -> anyhow::Result<()> {
    let winner = stats.winner.to_string();
    let outcome = stats.outcome.to_string();
    let args: [&(dyn ToSql + Sync); 8] = [
        &key,
        &stats.id.as_str(),
        &stats.room_code.as_str(),
        &stats.started,
        &stats.finished,
        &stats.players,
        &winner,
        &outcome,
    ];
    client.execute(stmt, &args).await?;
    Ok(())
}
