mod api;
mod config;
mod memory;
mod seed;
mod session;

use std::sync::Arc;

use axum::{routing::get, Router};
use dashmap::DashMap;
use parking_lot::Mutex as P_Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bingo_eden_core::{FeedbackStore, GameId, GameSession, GameStore, TemplateStore};

use crate::config::ServerConfig;
use crate::memory::{MemoryFeedbackStore, MemoryGameStore, MemoryTemplateStore};

// 服务器全局状态
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub games: Arc<dyn GameStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    // 正在进行中的对局。同一局同一时间只能被一个连接持有，
    // 锁只在同步代码块里持有，不能跨越 await。
    pub sessions: DashMap<GameId, Arc<P_Mutex<GameSession>>>,
}

impl AppState {
    pub fn in_memory() -> Self {
        AppState {
            templates: Arc::new(MemoryTemplateStore::default()),
            games: Arc::new(MemoryGameStore::default()),
            feedback: Arc::new(MemoryFeedbackStore::default()),
            sessions: DashMap::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bingo_eden_server=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let state = SharedState::new(AppState::in_memory());

    if config.seed_templates {
        let loaded = seed::load(state.templates.as_ref()).await?;
        info!("已载入 {} 个内置主题", loaded);
    }

    let app = Router::new()
        .route("/ws", get(session::websocket_handler))
        .merge(api::router())
        .with_state(state);

    info!("服务器正在监听 {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
