//! 内置主题，让新启动的服务器可以直接开始游戏

use tracing::{info, warn};

use bingo_eden_core::{NewTemplate, StoreError, TemplateStore};

fn template(name: &str, items: &[&str]) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn builtin_templates() -> Vec<NewTemplate> {
    vec![
        template("公路旅行", &[
            "加油站", "收费站", "服务区", "隧道", "大桥", "堵车", "测速拍照", "货车车队",
            "外地车牌", "路边水果摊", "风力发电机", "火车并行", "有人晕车", "导航重新规划",
            "错过出口", "看到牛羊", "下雨", "彩虹", "加油排队", "吃泡面", "合唱一首歌",
            "有人睡着", "问还有多久", "拍风景照", "手机没电", "山路弯道", "隧道超过 3 公里",
            "看到警车",
        ]),
        template("办公室会议", &[
            "会议迟到", "麦克风没开", "共享错屏幕", "\"能听到吗？\"", "有人在吃东西", "网络卡顿",
            "\"我们线下再聊\"", "会议超时", "有人忘了静音", "背景有狗叫", "\"下一页\"",
            "有人打断发言", "\"对齐一下\"", "重复上次的结论", "议程没人看", "有人在打字",
            "摄像头一直关着", "\"抓手\"", "\"闭环\"", "\"赋能\"", "提前结束 (奇迹)",
            "安排下次会议", "有人说 \"我补充一点\"", "投屏失败", "孩子闯入画面", "有人掉线",
        ]),
        template("Movie Night", &[
            "Opening explosion", "Slow-motion walk", "Hacker types fast", "\"We have company\"",
            "Car chase", "Training montage", "Villain monologue", "Fake death",
            "Unnecessary sequel hook", "Phone has no signal", "Mirror jump scare", "Plot twist",
            "Wise old mentor", "\"It's quiet... too quiet\"", "Countdown timer", "Dramatic rain",
            "Lab coat scientist", "Cat jump scare", "Helicopter shot", "Kiss in the rain",
            "Running from fireball", "\"Enhance!\"", "Sunglasses reveal", "Tied-up hostage",
            "Cliffhanger ending", "Mid-credits scene",
        ]),
    ]
}

/// 把内置主题写入存储，返回写入的数量。校验失败的主题被跳过并记录警告。
pub async fn load(store: &dyn TemplateStore) -> Result<usize, StoreError> {
    let mut loaded = 0;
    for new_template in builtin_templates() {
        let name = new_template.name.clone();
        match new_template.validate() {
            Ok(template) => {
                info!("载入内置主题 {} ({})", template.name, template.id);
                store.insert(template).await?;
                loaded += 1;
            }
            Err(e) => warn!("跳过内置主题 {}: {}", name, e),
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTemplateStore;
    use bingo_eden_core::MIN_TEMPLATE_ITEMS;

    #[test]
    fn test_builtin_templates_are_valid() {
        for new_template in builtin_templates() {
            let name = new_template.name.clone();
            let template = new_template.validate().unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert!(template.items.len() >= MIN_TEMPLATE_ITEMS);
        }
    }

    #[tokio::test]
    async fn test_load_into_store() {
        let store = MemoryTemplateStore::default();
        let loaded = load(&store).await.unwrap();
        assert_eq!(loaded, builtin_templates().len());
        assert_eq!(store.list().await.unwrap().len(), loaded);
    }
}
