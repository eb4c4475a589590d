use thiserror::Error;

/// 生成或校验卡片时的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("选项不足：至少需要 {required} 个，实际只有 {found} 个")]
    InsufficientOptions { required: usize, found: usize },

    #[error("卡片必须恰好有 25 格，实际为 {0} 格")]
    WrongCellCount(usize),

    #[error("卡片中心格必须是 FREE SPACE")]
    MissingFreeSpace,
}

/// 游戏会话层面的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Card(#[from] CardError),

    #[error("游戏已结束，不能重新生成卡片")]
    GameFinished,

    #[error("无效的游戏记录: {reason}")]
    InvalidRecord { reason: String },
}

/// 主题与反馈的输入校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("主题名称不能为空")]
    EmptyName,

    #[error("主题选项太少：至少需要 {required} 个，实际只有 {found} 个")]
    TooFewItems { required: usize, found: usize },

    #[error("反馈内容不能为空")]
    EmptyFeedback,
}

/// 存储协作方返回的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("存储不可用: {message}")]
    Unavailable { message: String },
}
