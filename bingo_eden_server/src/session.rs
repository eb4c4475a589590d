use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use dashmap::mapref::entry::Entry;
use futures_util::{stream::StreamExt, SinkExt};
use parking_lot::Mutex as P_Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use bingo_eden_core::{
    ClientMessage, GameId, GameRecord, GameSession, GameStore, ServerMessage, TemplateSummary,
};

use crate::SharedState;

/// 处理 WebSocket 连接请求
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期。一个连接同一时间只玩一局。
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接持有的对局，以及它的进度保存队列
    let mut current_game: Option<GameId> = None;
    let saver = ProgressSaver::spawn(state.games.clone());

    // 主循环：消息逐条处理完毕后才读取下一条
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, &state, &tx, &saver, &mut current_game).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                }
            }
        }
    }

    // 客户端断开连接，等进度写完后释放对局
    release_game(&state, &saver, &mut current_game).await;
    info!("客户端连接关闭");
}

/// 核心消息处理逻辑
pub async fn handle_client_message(
    msg: ClientMessage,
    state: &SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    saver: &ProgressSaver,
    current_game: &mut Option<GameId>,
) {
    match msg {
        ClientMessage::ListTemplates => match state.templates.list().await {
            Ok(templates) => {
                let templates = templates.iter().map(TemplateSummary::from).collect();
                let _ = tx.send(ServerMessage::TemplateList { templates }).await;
            }
            Err(e) => {
                warn!("读取主题列表失败: {}", e);
                send_error(tx, "读取主题失败，请稍后再试").await;
            }
        },
        ClientMessage::StartGame { template_id } => {
            let template = match state.templates.get(template_id).await {
                Ok(Some(t)) => t,
                Ok(None) => {
                    send_error(tx, "主题不存在").await;
                    return;
                }
                Err(e) => {
                    warn!("读取主题 {} 失败: {}", template_id, e);
                    send_error(tx, "读取主题失败，请稍后再试").await;
                    return;
                }
            };

            let game = match GameSession::new(&template) {
                Ok(game) => game,
                Err(e) => {
                    // 选项不足时不能开局
                    send_error(tx, e.to_string()).await;
                    return;
                }
            };

            // 开局是显式的保存动作，失败要告知玩家
            if let Err(e) = state.games.save(game.to_record()).await {
                warn!("保存新对局 {} 失败: {}", game.id, e);
                send_error(tx, "创建对局失败，请稍后再试").await;
                return;
            }

            release_game(state, saver, current_game).await;
            state.sessions.insert(game.id, Arc::new(P_Mutex::new(game.clone())));
            *current_game = Some(game.id);
            info!("开始新对局 {} (主题 {})", game.id, template.name);
            let _ = tx.send(ServerMessage::GameStarted { game }).await;
        }
        ClientMessage::ResumeGame { game_id } => {
            if *current_game == Some(game_id) {
                send_snapshot(state, tx, game_id).await;
                return;
            }

            let record = match state.games.get(game_id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    send_error(tx, "对局不存在").await;
                    return;
                }
                Err(e) => {
                    warn!("读取对局 {} 失败: {}", game_id, e);
                    send_error(tx, "读取对局失败，请稍后再试").await;
                    return;
                }
            };
            let game = match GameSession::from_record(record) {
                Ok(game) => game,
                Err(e) => {
                    warn!("对局 {} 的记录无法恢复: {}", game_id, e);
                    send_error(tx, e.to_string()).await;
                    return;
                }
            };

            // 分片锁不能跨越 await，先决定是否占用成功
            let claimed = match state.sessions.entry(game_id) {
                Entry::Occupied(_) => false,
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(P_Mutex::new(game.clone())));
                    true
                }
            };
            if !claimed {
                send_error(tx, "该对局正在另一处进行").await;
                return;
            }
            release_game(state, saver, current_game).await;
            *current_game = Some(game_id);
            info!("继续对局 {}", game_id);
            let finished = game.is_completed();
            let _ = tx.send(ServerMessage::GameSnapshot(game)).await;
            if finished {
                let _ = tx.send(ServerMessage::Info { message: "该对局已结束，只能查看".to_string() }).await;
            }
        }
        // ... 其他需要先持有对局才能执行的消息
        _ => {
            let Some(game_id) = *current_game else {
                send_error(tx, "请先开始或继续一局游戏").await;
                return;
            };
            let session = state.sessions.get(&game_id).map(|s| s.value().clone());
            let Some(session) = session else {
                *current_game = None;
                send_error(tx, "对局已失效，请重新开始").await;
                return;
            };

            match msg {
                ClientMessage::ToggleCell(index) => {
                    let (notifications, record) = {
                        let mut game = session.lock();
                        let notifications = game.toggle_cell(index);
                        (notifications, game.to_record())
                    };
                    // 中心格、越界或不接受点击的状态：静默忽略
                    if notifications.is_empty() {
                        return;
                    }
                    if record.completed {
                        save_completed(state, tx, saver, record).await;
                    } else {
                        saver.save(record);
                    }
                    for notification in notifications {
                        let _ = tx.send(notification.into()).await;
                    }
                }
                ClientMessage::Decide(decision) => {
                    let (notifications, record) = {
                        let mut game = session.lock();
                        let notifications = game.decide(decision);
                        (notifications, game.to_record())
                    };
                    if notifications.is_empty() {
                        return;
                    }
                    if record.completed {
                        save_completed(state, tx, saver, record).await;
                    } else {
                        saver.save(record);
                    }
                    for notification in notifications {
                        let _ = tx.send(notification.into()).await;
                    }
                }
                ClientMessage::RegenerateCard => {
                    let template_id = session.lock().template_id;
                    let template = match state.templates.get(template_id).await {
                        Ok(Some(t)) => t,
                        Ok(None) => {
                            send_error(tx, "主题已被删除，无法重新生成卡片").await;
                            return;
                        }
                        Err(e) => {
                            warn!("读取主题 {} 失败: {}", template_id, e);
                            send_error(tx, "读取主题失败，请稍后再试").await;
                            return;
                        }
                    };

                    let result = {
                        let mut game = session.lock();
                        game.regenerate(&template.items).map(|notifications| (notifications, game.clone()))
                    };
                    match result {
                        Ok((notifications, game)) => {
                            saver.save(game.to_record());
                            for notification in notifications {
                                let _ = tx.send(notification.into()).await;
                            }
                            let _ = tx.send(ServerMessage::GameSnapshot(game)).await;
                        }
                        Err(e) => send_error(tx, e.to_string()).await,
                    }
                }
                ClientMessage::GetCard => {
                    send_snapshot(state, tx, game_id).await;
                }
                ClientMessage::ListTemplates | ClientMessage::StartGame { .. } | ClientMessage::ResumeGame { .. } => {}
            }
        }
    }
}

enum SaveRequest {
    Progress(GameRecord),
    Flush(oneshot::Sender<()>),
}

/// 一个连接的进度保存队列
///
/// 进度由后台任务按提交顺序逐条写入，调用方不等待结果，先提交的进度不会覆盖后提交的。
/// 保存失败只记录日志，不回滚内存中的状态。
pub struct ProgressSaver {
    tx: mpsc::UnboundedSender<SaveRequest>,
}

impl ProgressSaver {
    pub fn spawn(games: Arc<dyn GameStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    SaveRequest::Progress(record) => {
                        let game_id = record.id;
                        if let Err(e) = games.save(record).await {
                            warn!("保存对局 {} 的进度失败: {}", game_id, e);
                        }
                    }
                    SaveRequest::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        ProgressSaver { tx }
    }

    pub fn save(&self, record: GameRecord) {
        if self.tx.send(SaveRequest::Progress(record)).is_err() {
            warn!("进度保存任务已退出");
        }
    }

    /// 等待已提交的进度全部写完
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(SaveRequest::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

/// 结束对局是显式的保存动作：先等排队的进度写完，再保存结果，失败要告知玩家
async fn save_completed(
    state: &SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    saver: &ProgressSaver,
    record: GameRecord,
) {
    let game_id = record.id;
    saver.flush().await;
    match state.games.save(record).await {
        Ok(()) => info!("对局 {} 已完成", game_id),
        Err(e) => {
            warn!("保存已完成的对局 {} 失败: {}", game_id, e);
            send_error(tx, "保存对局失败，请稍后再试").await;
        }
    }
}

/// 释放当前连接持有的对局，让它可以在别处继续。释放前等进度写完，
/// 否则在别处恢复时可能读到旧的记录。
async fn release_game(state: &SharedState, saver: &ProgressSaver, current_game: &mut Option<GameId>) {
    if let Some(game_id) = current_game.take() {
        saver.flush().await;
        state.sessions.remove(&game_id);
    }
}

async fn send_snapshot(state: &SharedState, tx: &mpsc::Sender<ServerMessage>, game_id: GameId) {
    let game = state.sessions.get(&game_id).map(|s| s.value().lock().clone());
    match game {
        Some(game) => {
            let _ = tx.send(ServerMessage::GameSnapshot(game)).await;
        }
        None => send_error(tx, "对局已失效，请重新开始").await,
    }
}

async fn send_error(tx: &mpsc::Sender<ServerMessage>, message: impl Into<String>) {
    let _ = tx.send(ServerMessage::Error { message: message.into() }).await;
}
