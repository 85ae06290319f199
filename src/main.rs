use crate::session::SessionManager;
use crate::store::{GameStore, MemoryStore, SledStore};
use crate::ws::accept_connection;
use anyhow::Context;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::TcpListener;

mod api;
mod client;
mod error;
mod game;
mod pg;
mod session;
mod store;
mod time;
mod ws;

// FIXME: Implement TLS support

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::try_init().ok();

    let port: u16 = std::env::var("PORT")
        .context("PORT is unspecified")?
        .parse()
        .context("PORT is invalid")?;

    let store: Box<dyn GameStore> = match std::env::var("STORE").as_deref() {
        Ok("memory") => {
            log::warn!("Games are kept in memory and will be lost on restart");
            Box::new(MemoryStore::new())
        }
        Ok("sled") | Err(_) => {
            let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "hitler.db".to_string());
            let db = sled::open(&db_path).with_context(|| format!("could not open database at {}", db_path))?;
            if pg::is_configured() {
                tokio::spawn(pg::sync_game_stats(db.clone()));
            } else {
                log::info!("PostgreSQL is not configured; finished games stay in the local archive");
            }
            Box::new(SledStore::open(db)?)
        }
        Ok(other) => anyhow::bail!("STORE must be \"sled\" or \"memory\", not {:?}", other),
    };
    let manager: &'static SessionManager = Box::leak(Box::new(SessionManager::new(store)));

    if let Ok(api_port) = std::env::var("API_PORT") {
        let api_port: u16 = api_port.parse().context("API_PORT is invalid")?;
        let listener = api::listen(api_port).await?;
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, api::make_router(manager)).await {
                log::error!("API server failed: {}", err);
            }
        });
    }

    let addr = SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind to address {:?}", addr))?;
    log::info!("Listening on: {:?}", addr);

    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(accept_connection(stream, manager));
    }
    Ok(())
}
