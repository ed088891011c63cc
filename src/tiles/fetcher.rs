//! Background tile image fetching.
//!
//! A dedicated worker thread owns a tokio runtime and a reqwest client;
//! commands and results travel over plain mpsc channels so the render loop
//! never blocks on the network.

use bevy::prelude::*;
use std::sync::{
    Arc, Mutex,
    mpsc::{self, Receiver, Sender},
};
use std::thread;

use crate::tiles::mercator::Tile;

/// Commands for the tile fetch worker.
#[derive(Debug)]
pub enum FetchCommand {
    Tile {
        tile: Tile,
        url: String,
        /// Tile-set generation the request belongs to; stale results are
        /// dropped on drain.
        generation: u64,
    },
}

/// Results from the tile fetch worker.
pub enum FetchResultMsg {
    Loaded {
        tile: Tile,
        generation: u64,
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    Failed {
        tile: Tile,
        generation: u64,
        error: String,
    },
}

/// Channels for communicating with the tile fetch worker thread.
#[derive(Resource)]
pub struct TileFetchChannels {
    pub cmd_tx: Sender<FetchCommand>,
    pub res_rx: Arc<Mutex<Receiver<FetchResultMsg>>>,
}

/// Start the background tile fetch worker thread.
pub fn start_tile_worker() -> TileFetchChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<FetchCommand>();
    let (res_tx, res_rx) = mpsc::channel::<FetchResultMsg>();

    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let client = reqwest::Client::new();

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    FetchCommand::Tile {
                        tile,
                        url,
                        generation,
                    } => {
                        let res = async {
                            let resp = client.get(&url).send().await?;
                            let status = resp.status();
                            if !status.is_success() {
                                anyhow::bail!("HTTP {status}");
                            }
                            let content_type = resp
                                .headers()
                                .get(reqwest::header::CONTENT_TYPE)
                                .and_then(|v| v.to_str().ok())
                                .map(|v| v.to_string());
                            let bytes = resp.bytes().await?.to_vec();
                            Ok::<_, anyhow::Error>((bytes, content_type))
                        }
                        .await;

                        let msg = match res {
                            Ok((bytes, content_type)) => FetchResultMsg::Loaded {
                                tile,
                                generation,
                                bytes,
                                content_type,
                            },
                            Err(e) => FetchResultMsg::Failed {
                                tile,
                                generation,
                                error: e.to_string(),
                            },
                        };
                        if res_tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    });

    TileFetchChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}
