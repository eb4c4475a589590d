use crate::card::{Card, MarkedSet};
use crate::template::TemplateId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type GameId = Uuid;

/// 玩家当前努力达成的目标，只会向前推进
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProgressTarget {
    /// 第一条连线
    FirstBingo,
    /// 三条连线
    ThreeBingos,
    /// 全部 25 格
    FullCard,
}

impl ProgressTarget {
    /// 目标对应的数值：1、3 条连线，或 25 格
    pub fn threshold(self) -> u8 {
        match self {
            ProgressTarget::FirstBingo => 1,
            ProgressTarget::ThreeBingos => 3,
            ProgressTarget::FullCard => 25,
        }
    }

    pub fn from_threshold(threshold: u8) -> Option<Self> {
        match threshold {
            1 => Some(ProgressTarget::FirstBingo),
            3 => Some(ProgressTarget::ThreeBingos),
            25 => Some(ProgressTarget::FullCard),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            ProgressTarget::FirstBingo => Some(ProgressTarget::ThreeBingos),
            ProgressTarget::ThreeBingos => Some(ProgressTarget::FullCard),
            ProgressTarget::FullCard => None,
        }
    }
}

impl fmt::Display for ProgressTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            ProgressTarget::FirstBingo => "第一条连线",
            ProgressTarget::ThreeBingos => "三条连线",
            ProgressTarget::FullCard => "全卡",
        })
    }
}

/// 对局进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// 正在朝 `GameSession::target` 努力
    Playing,
    /// 已达成当前目标，等待玩家选择继续 (朝 `next` 推进) 还是结束
    AwaitingContinueDecision { next: ProgressTarget },
    /// 对局结束
    Completed,
}

/// 玩家在达成目标后的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinueDecision {
    Continue,
    Stop,
}

/// 一局正在进行的宾果游戏
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: GameId,
    pub template_id: TemplateId,
    pub template_name: String,
    pub card: Card,
    pub marked: MarkedSet,
    // 最近一次计算出的连线数，下一次切换时作为 "之前的连线数"
    pub bingo_count: u8,
    pub target: ProgressTarget,
    pub status: GameStatus,
}

/// 游戏存储中的记录格式
///
/// 字段名使用 camelCase，与存储协作方约定的 JSON 结构一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: GameId,
    pub template_id: TemplateId,
    pub template_name: String,
    pub marked_cells: Vec<u8>,
    pub items: Vec<String>,
    pub completed: bool,
    pub bingo_count: u8,
    pub target_bingo_count: u8,
}
