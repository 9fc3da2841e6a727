use crate::{
    Result,
    catalog::WordCatalog,
    message::{ErrorCode, GameMessage},
    storage::Storage,
    table::Table,
};
use axum::{
    Router,
    extract::Query,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Html,
    response::Json,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct TableQuery {
    table_id: Option<String>,
    player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    player_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    player_id: String,
    limit: Option<usize>,
}

/// The service shell: tracks one table per connected player and serves the
/// HTTP side endpoints next to the WebSocket game loop.
pub struct GameServer {
    tables: Arc<DashMap<String, Arc<Table>>>,
    catalog: Arc<WordCatalog>,
    storage: Arc<Storage>,
}

impl GameServer {
    pub async fn new() -> Self {
        let config = crate::config::Config::get();
        let storage = Arc::new(
            Storage::new(&config.redis.url)
                .await
                .expect("Failed to create storage"),
        );

        let catalog = WordCatalog::new();
        for issue in catalog.validate() {
            tracing::warn!("catalog integrity: {}", issue);
        }
        if catalog.phrase_count() == 0 {
            // Startup integrity check: production data must never be empty.
            panic!("word catalog has no phrases to draw from");
        }

        GameServer {
            tables: Arc::new(DashMap::new()),
            catalog: Arc::new(catalog),
            storage,
        }
    }

    /// Start the HTTP server (health, progress, history, table status).
    pub async fn start_http_server(&self, http_addr: &str) -> Result<()> {
        let config = crate::config::Config::get();

        let cors = if config.cors.allow_all_origins.unwrap_or(true) {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_credentials(false)
        } else if let Some(allowed_origins) = &config.cors.allowed_origins {
            let origins = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>();

            debug!("CORS allowed origins: {:?}", origins);
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_credentials(true)
        } else {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_credentials(false)
        };

        let http_app = Router::new()
            .route("/", get(serve_index))
            .route("/index.html", get(serve_index))
            .route("/healthz", get(handle_health))
            .route(
                "/progress",
                get({
                    let storage = self.storage.clone();
                    move |Query(query): Query<ProgressQuery>| async move {
                        handle_progress(query, storage.clone()).await
                    }
                }),
            )
            .route(
                "/history",
                get({
                    let storage = self.storage.clone();
                    move |Query(query): Query<HistoryQuery>| async move {
                        handle_history(query, storage.clone()).await
                    }
                }),
            )
            .route(
                "/tables/status",
                get({
                    let tables = self.tables.clone();
                    move || async move { handle_tables_status(tables.clone()).await }
                }),
            )
            .layer(cors);

        let http_listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .map_err(|e| crate::Error::Io(anyhow::anyhow!(e)))?;

        tokio::spawn(async move {
            axum::serve(http_listener, http_app).await.map_err(|e| {
                error!("HTTP server error: {}", e);
                crate::Error::Io(anyhow::anyhow!(e))
            })
        });

        Ok(())
    }

    /// Start the WebSocket server carrying the game protocol.
    pub async fn start_ws_server(&self, ws_addr: &str) -> Result<()> {
        let tables = self.tables.clone();
        let catalog = self.catalog.clone();
        let storage = self.storage.clone();

        let ws_app = Router::new().route(
            "/ws",
            get({
                move |ws: WebSocketUpgrade, Query(query): Query<TableQuery>| async move {
                    let table_id = query.table_id.unwrap_or_else(generate_random_table_id);
                    let player_id = query
                        .player_id
                        .unwrap_or_else(|| Uuid::new_v4().to_string());

                    debug!(
                        "WebSocket connection for table {}, player {}",
                        table_id, player_id
                    );

                    ws.on_upgrade(move |socket| async move {
                        handle_table_connection(
                            socket,
                            table_id,
                            player_id,
                            tables.clone(),
                            catalog.clone(),
                            storage.clone(),
                        )
                        .await;
                        debug!("WebSocket connection finished");
                    })
                }
            }),
        );

        let ws_listener = tokio::net::TcpListener::bind(ws_addr).await.map_err(|e| {
            error!("binding WebSocket address failed: {} - {}", ws_addr, e);
            crate::Error::Io(anyhow::anyhow!(e))
        })?;

        axum::serve(ws_listener, ws_app).await.map_err(|e| {
            error!("WebSocket server error: {}", e);
            crate::Error::Io(anyhow::anyhow!(e))
        })?;
        Ok(())
    }

    /// Start both servers on one address.
    pub async fn start(&self, addr: &str) -> Result<()> {
        self.start_http_server(addr).await?;
        self.start_ws_server(addr).await?;
        Ok(())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// One client connection: a forward task draining the table's outbound
/// channel, a keepalive ping task, and the inbound command loop.
async fn handle_table_connection(
    socket: WebSocket,
    table_id: String,
    player_id: String,
    tables: Arc<DashMap<String, Arc<Table>>>,
    catalog: Arc<WordCatalog>,
    storage: Arc<Storage>,
) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));

    let table = tables
        .entry(table_id.clone())
        .or_insert_with(|| {
            Arc::new(Table::new(
                table_id.clone(),
                player_id.clone(),
                catalog,
                storage,
            ))
        })
        .clone();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<GameMessage>(100);

    let forward_sender = ws_sender.clone();
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(text) => {
                    let mut sender = forward_sender.lock().await;
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        error!("forwarding message failed: {}", e);
                        break;
                    }
                }
                Err(e) => error!("serializing message failed: {}", e),
            }
        }
    });

    let ping_sender = ws_sender.clone();
    let ping_interval = crate::config::Config::get().ping_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ping_interval);
        interval.tick().await; // the first tick fires immediately
        loop {
            interval.tick().await;
            let mut sender = ping_sender.lock().await;
            if sender.send(Message::Ping(Vec::new())).await.is_err() {
                break;
            }
        }
    });

    // Tell the client which table and player ids this connection got.
    let hello = GameMessage::new(
        "table_info",
        serde_json::json!({
            "table_id": table_id,
            "player_id": player_id,
        }),
    );
    if let Ok(text) = serde_json::to_string(&hello) {
        if let Err(e) = ws_sender.lock().await.send(Message::Text(text)).await {
            error!("sending table info failed: {}", e);
        }
    }

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                debug!("received: {}", text);
                match serde_json::from_str::<GameMessage>(&text) {
                    Ok(message) => {
                        let player_tx = if message.type_ == "join" {
                            Some(tx.clone())
                        } else {
                            None
                        };

                        if let Err(e) = table.handle_message(message, player_tx).await {
                            error!("handling message failed: {}", e);
                            let error =
                                GameMessage::error(ErrorCode::InternalError, &e.to_string());
                            if let Ok(text) = serde_json::to_string(&error) {
                                if let Err(e) =
                                    ws_sender.lock().await.send(Message::Text(text)).await
                                {
                                    error!("sending error message failed: {}", e);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        error!("parsing message failed: {}", e);
                        let error = GameMessage::error(ErrorCode::ParseError, "malformed message");
                        if let Ok(text) = serde_json::to_string(&error) {
                            if let Err(e) = ws_sender.lock().await.send(Message::Text(text)).await
                            {
                                error!("sending error message failed: {}", e);
                            }
                        }
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!("received close");
                break;
            }
            Ok(Message::Ping(data)) => {
                if let Err(e) = ws_sender.lock().await.send(Message::Pong(data)).await {
                    error!("sending pong failed: {}", e);
                }
            }
            Ok(Message::Pong(_)) => {}
            Ok(Message::Binary(_)) => {
                debug!("ignoring binary message");
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    table.clear_channel().await;

    // Drop tables with no game in them; a table mid-game survives for
    // the player to reconnect to.
    let (has_game, _, _) = table.status().await;
    if !has_game {
        tables.remove(&table_id);
    }

    debug!("connection to table {} closed", table_id);
}

/// Random 6-letter table id.
fn generate_random_table_id() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::rng();

    (0..6)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

async fn serve_index() -> Html<String> {
    let index_path = Path::new("index.html");
    match fs::read_to_string(index_path) {
        Ok(content) => Html(content),
        Err(e) => {
            error!("reading index.html failed: {}", e);
            Html("<h1>404 Not Found</h1><p>index.html is missing</p>".to_string())
        }
    }
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_progress(query: ProgressQuery, storage: Arc<Storage>) -> Json<serde_json::Value> {
    match storage.load_progress(&query.player_id).await {
        Ok(progress) => Json(serde_json::json!({
            "success": true,
            "highestLevelUnlocked": progress.highest_level_unlocked(),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
        })),
    }
}

async fn handle_history(query: HistoryQuery, storage: Arc<Storage>) -> Json<serde_json::Value> {
    let limit = query.limit.unwrap_or(20);
    match storage.recent_records(&query.player_id, limit).await {
        Ok(records) => Json(serde_json::json!({
            "success": true,
            "records": records,
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
        })),
    }
}

async fn handle_tables_status(tables: Arc<DashMap<String, Arc<Table>>>) -> Json<serde_json::Value> {
    let mut statuses = Vec::new();

    for entry in tables.iter() {
        let table = entry.value();
        let (has_game, is_over, idle_seconds) = table.status().await;
        statuses.push(serde_json::json!({
            "table_id": entry.key(),
            "has_game": has_game,
            "is_over": is_over,
            "idle_seconds": idle_seconds,
        }));
    }

    Json(serde_json::json!({
        "success": true,
        "tables": statuses,
        "total_tables": statuses.len(),
    }))
}
