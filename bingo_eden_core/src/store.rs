//! 存储协作方的接口。
//!
//! 核心逻辑只依赖这些 trait，具体实现 (内存、数据库) 由上层应用提供。

use crate::error::StoreError;
use crate::state::{GameId, GameRecord};
use crate::template::{Feedback, Template, TemplateId};
use async_trait::async_trait;

/// 主题存储：提供带名字的选项列表
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Template>, StoreError>;
    async fn get(&self, id: TemplateId) -> Result<Option<Template>, StoreError>;
    async fn insert(&self, template: Template) -> Result<(), StoreError>;
    /// 返回是否真的删除了记录
    async fn delete(&self, id: TemplateId) -> Result<bool, StoreError>;
}

/// 游戏存储：保存每局的标记进度
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn list(&self) -> Result<Vec<GameRecord>, StoreError>;
    async fn get(&self, id: GameId) -> Result<Option<GameRecord>, StoreError>;
    /// 按 id 插入或覆盖。已完成的记录不会被未完成的记录覆盖
    async fn save(&self, record: GameRecord) -> Result<(), StoreError>;
    async fn delete(&self, id: GameId) -> Result<bool, StoreError>;
    /// 已完成的对局数
    async fn completed_count(&self) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert(&self, feedback: Feedback) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<Feedback>, StoreError>;
}
