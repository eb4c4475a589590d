mod render;

use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use bingo_eden_core::{
    ClientMessage, ContinueDecision, GameId, GameSession, GameStatus, Notification, ServerMessage, TemplateId,
};

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:25917/ws";

/// 服务器地址：命令行第一个参数 > BINGO_SERVER_URL > 默认值
fn server_url() -> Result<Url, url::ParseError> {
    let raw = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BINGO_SERVER_URL").ok())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    Url::parse(&raw)
}

fn print_help() {
    println!("可用命令:");
    println!("  themes                    - 列出可用主题");
    println!("  new <主题ID>              - 用指定主题开始新的一局");
    println!("  resume <对局ID>           - 继续一局已保存的游戏");
    println!("  mark <0-24>               - 标记/取消标记一格 (12 是中心格)");
    println!("  continue                  - 达成目标后继续挑战");
    println!("  stop                      - 达成目标后结束本局");
    println!("  regen                     - 重新生成卡片");
    println!("  card                      - 重新显示卡片");
    println!("  exit                      - 退出");
}

/// 把通知应用到本地的对局副本上，返回是否需要重绘卡片
fn apply_notification(game: &mut GameSession, notification: &Notification) -> bool {
    match notification {
        Notification::CellMarked(index) => {
            game.marked.insert(*index);
            true
        }
        Notification::CellUnmarked(index) => {
            game.marked.remove(*index);
            true
        }
        Notification::BingoCountChanged { bingo_count } => {
            game.bingo_count = *bingo_count;
            false
        }
        Notification::ContinuePrompt { next, .. } => {
            game.status = GameStatus::AwaitingContinueDecision { next: *next };
            false
        }
        Notification::TargetAdvanced { target } => {
            game.target = *target;
            game.status = GameStatus::Playing;
            false
        }
        Notification::GameCompleted { .. } => {
            game.status = GameStatus::Completed;
            true
        }
        Notification::CardRegenerated => false,
    }
}

fn describe(notification: &Notification) -> Option<String> {
    match notification {
        Notification::BingoCountChanged { bingo_count } => Some(format!("当前连线数: {}", bingo_count)),
        Notification::ContinuePrompt { bingo_count, next } => Some(format!(
            "🎉 BINGO! 已完成 {} 条连线。输入 continue 挑战{}，或 stop 结束本局",
            bingo_count, next
        )),
        Notification::TargetAdvanced { target } => Some(format!("新目标: {}", target)),
        Notification::GameCompleted { bingo_count } => Some(format!("本局结束，共 {} 条连线", bingo_count)),
        Notification::CardRegenerated => Some("卡片已重新生成".to_string()),
        Notification::CellMarked(_) | Notification::CellUnmarked(_) => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = server_url()?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息，并维护当前对局的本地副本
    tokio::spawn(async move {
        let mut current: Option<GameSession> = None;
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        println!();
                        match server_msg {
                            ServerMessage::TemplateList { templates } => {
                                for t in templates {
                                    println!("  {}  {} ({} 个选项)", t.id, t.name, t.item_count);
                                }
                            }
                            ServerMessage::GameStarted { game } | ServerMessage::GameSnapshot(game) => {
                                render::print_card(&game);
                                current = Some(game);
                            }
                            ServerMessage::Notified(notification) => {
                                let redraw = match current.as_mut() {
                                    Some(game) => apply_notification(game, &notification),
                                    None => false,
                                };
                                if redraw {
                                    if let Some(game) = &current {
                                        render::print_card(game);
                                    }
                                }
                                if let Some(text) = describe(&notification) {
                                    println!("{}", text);
                                }
                            }
                            ServerMessage::Info { message } => println!("[提示] {}", message),
                            ServerMessage::Error { message } => println!("[错误] {}", message),
                        }
                        print!("> "); // 重新显示输入提示符
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 宾果卡片客户端 ---");
    print_help();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().copied();

        let client_msg = match command {
            Some("themes") => ClientMessage::ListTemplates,
            Some("new") => match parts.get(1).map(|s| s.parse::<TemplateId>()) {
                Some(Ok(template_id)) => ClientMessage::StartGame { template_id },
                _ => {
                    println!("用法: new <主题ID>");
                    continue;
                }
            },
            Some("resume") => match parts.get(1).map(|s| s.parse::<GameId>()) {
                Some(Ok(game_id)) => ClientMessage::ResumeGame { game_id },
                _ => {
                    println!("用法: resume <对局ID>");
                    continue;
                }
            },
            Some("mark") | Some("m") => match parts.get(1).map(|s| s.parse::<u8>()) {
                Some(Ok(index)) => ClientMessage::ToggleCell(index),
                _ => {
                    println!("用法: mark <0-24>");
                    continue;
                }
            },
            Some("continue") => ContinueDecision::Continue.into(),
            Some("stop") => ContinueDecision::Stop.into(),
            Some("regen") => ClientMessage::RegenerateCard,
            Some("card") => ClientMessage::GetCard,
            Some("help") => {
                print_help();
                continue;
            }
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            None => continue,
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}
