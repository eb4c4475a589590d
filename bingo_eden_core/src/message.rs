use crate::state::{ContinueDecision, GameId, GameSession, ProgressTarget};
use crate::template::{Template, TemplateId};
use serde::{Deserialize, Serialize};

// --- 通知 ---
// 核心逻辑产生的事件，界面据此给出震动或视觉反馈。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// 某格被标记
    CellMarked(u8),
    /// 某格被取消标记
    CellUnmarked(u8),
    /// 连线数发生变化
    BingoCountChanged { bingo_count: u8 },
    /// 达成当前目标，询问是否继续挑战 `next`
    ContinuePrompt { bingo_count: u8, next: ProgressTarget },
    /// 玩家选择继续，目标已推进
    TargetAdvanced { target: ProgressTarget },
    /// 对局结束
    GameCompleted { bingo_count: u8 },
    /// 卡片已重新生成，进度清零
    CardRegenerated,
}

// --- 客户端 -> 服务器 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ClientMessage {
    /// 列出可用的主题
    ListTemplates,
    /// 用指定主题开始新的一局
    StartGame { template_id: TemplateId },
    /// 继续一局已保存的游戏
    ResumeGame { game_id: GameId },
    /// 切换一格的标记状态
    ToggleCell(u8),
    /// 对继续提示作出选择
    Decide(ContinueDecision),
    /// 重新生成卡片
    RegenerateCard,
    /// 获取当前对局的完整快照
    GetCard,
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 可用主题的摘要
    TemplateList { templates: Vec<TemplateSummary> },
    /// 新的一局已创建并保存
    GameStarted { game: GameSession },
    /// 当前对局的完整快照 (恢复对局、重新生成卡片、主动请求时发送)
    GameSnapshot(GameSession),
    /// 对局内的事件
    Notified(Notification),

    Info { message: String },
    Error { message: String },
}

/// 主题摘要，不带完整选项列表
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub item_count: usize,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        TemplateSummary {
            id: template.id,
            name: template.name.clone(),
            item_count: template.items.len(),
        }
    }
}

impl From<ContinueDecision> for ClientMessage {
    fn from(decision: ContinueDecision) -> Self {
        ClientMessage::Decide(decision)
    }
}

impl From<Notification> for ServerMessage {
    fn from(notification: Notification) -> Self {
        ServerMessage::Notified(notification)
    }
}
