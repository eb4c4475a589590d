//! 基于内存的存储实现

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex as P_Mutex;

use bingo_eden_core::{
    Feedback, FeedbackStore, GameId, GameRecord, GameStore, StoreError, Template, TemplateId, TemplateStore,
};

#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: DashMap<TemplateId, Template>,
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn list(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates: Vec<Template> = self.templates.iter().map(|t| t.value().clone()).collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn get(&self, id: TemplateId) -> Result<Option<Template>, StoreError> {
        Ok(self.templates.get(&id).map(|t| t.value().clone()))
    }

    async fn insert(&self, template: Template) -> Result<(), StoreError> {
        self.templates.insert(template.id, template);
        Ok(())
    }

    async fn delete(&self, id: TemplateId) -> Result<bool, StoreError> {
        Ok(self.templates.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryGameStore {
    games: DashMap<GameId, GameRecord>,
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn list(&self) -> Result<Vec<GameRecord>, StoreError> {
        let mut games: Vec<GameRecord> = self.games.iter().map(|g| g.value().clone()).collect();
        games.sort_by(|a, b| a.template_name.cmp(&b.template_name).then(a.id.cmp(&b.id)));
        Ok(games)
    }

    async fn get(&self, id: GameId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.games.get(&id).map(|g| g.value().clone()))
    }

    async fn save(&self, record: GameRecord) -> Result<(), StoreError> {
        // 进度是异步保存的，晚到的旧进度不能覆盖已完成的记录
        match self.games.entry(record.id) {
            Entry::Occupied(mut entry) => {
                if !entry.get().completed || record.completed {
                    entry.insert(record);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: GameId) -> Result<bool, StoreError> {
        Ok(self.games.remove(&id).is_some())
    }

    async fn completed_count(&self) -> Result<usize, StoreError> {
        Ok(self.games.iter().filter(|g| g.completed).count())
    }
}

// 反馈按提交顺序保存
#[derive(Default)]
pub struct MemoryFeedbackStore {
    feedback: P_Mutex<Vec<Feedback>>,
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn insert(&self, feedback: Feedback) -> Result<(), StoreError> {
        self.feedback.lock().push(feedback);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Feedback>, StoreError> {
        Ok(self.feedback.lock().clone())
    }
}
