//! # 宾果卡片核心逻辑库
//!
//! 这个 `core` crate 包含宾果游戏的卡片生成、连线判定、
//! 进度状态机，以及客户端-服务器通信消息和存储协作方接口的定义。
//! 它与具体实现 (网络服务器、客户端界面、数据库) 解耦，
//! 可以被任何上层应用复用。

mod card;
mod error;
mod logic;
mod message;
mod state;
mod store;
mod template;

pub use card::*;

pub use error::*;

pub use logic::next_status;

pub use message::*;

pub use state::*;

pub use store::*;

pub use template::*;
