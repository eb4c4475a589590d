use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TemplateId = Uuid;
pub type FeedbackId = Uuid;

/// 保存主题时要求的最少选项数，比生成卡片所需的 24 个多留一个余量
pub const MIN_TEMPLATE_ITEMS: usize = 25;

/// 主题：一组带名字的卡片选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub items: Vec<String>,
}

/// 创建主题的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub items: Vec<String>,
}

impl NewTemplate {
    /// 校验并生成带 id 的主题。
    /// 名称和选项都会去掉首尾空白，空选项被丢弃。
    pub fn validate(self) -> Result<Template, TemplateError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(TemplateError::EmptyName);
        }

        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if items.len() < MIN_TEMPLATE_ITEMS {
            return Err(TemplateError::TooFewItems {
                required: MIN_TEMPLATE_ITEMS,
                found: items.len(),
            });
        }

        Ok(Template { id: Uuid::new_v4(), name, items })
    }
}

/// 玩家提交的反馈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub message: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub message: String,
    #[serde(default)]
    pub contact: Option<String>,
}

impl NewFeedback {
    pub fn validate(self) -> Result<Feedback, TemplateError> {
        let message = self.message.trim().to_string();
        if message.is_empty() {
            return Err(TemplateError::EmptyFeedback);
        }
        let contact = self
            .contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Feedback { id: Uuid::new_v4(), message, contact })
    }
}
