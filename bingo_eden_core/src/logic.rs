use crate::card::*;
use crate::error::SessionError;
use crate::message::Notification;
use crate::state::*;
use crate::template::Template;
use rand::Rng;
use uuid::Uuid;

// --- 进度状态机 ---

/// 一次切换之后的进度判定
///
/// `prior_bingo_count` 是切换前记录的连线数，只有从低于目标跨越到达到目标时才触发，
/// 因此每个里程碑在一局中只会提示一次。
pub fn next_status(target: ProgressTarget, prior_bingo_count: u8, marked: MarkedSet) -> GameStatus {
    let new_bingo_count = count_bingos(marked);
    match target {
        ProgressTarget::FirstBingo if new_bingo_count >= 1 && prior_bingo_count < 1 => {
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::ThreeBingos }
        }
        ProgressTarget::ThreeBingos if new_bingo_count >= 3 && prior_bingo_count < 3 => {
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::FullCard }
        }
        // 全卡必然 12 条线全部完成
        ProgressTarget::FullCard if marked.is_full() => GameStatus::Completed,
        _ => GameStatus::Playing,
    }
}

/// 按当前标记判断目标是否已经达成，不看之前的连线数
///
/// 用于恢复未完成的对局，以及选择继续之后：一次点击可能同时越过多个目标。
fn reached_status(target: ProgressTarget, marked: MarkedSet) -> GameStatus {
    match target.next() {
        Some(next) if count_bingos(marked) >= target.threshold() => {
            GameStatus::AwaitingContinueDecision { next }
        }
        None if marked.is_full() => GameStatus::Completed,
        _ => GameStatus::Playing,
    }
}

// --- GameSession 的实现方法 ---

impl GameSession {
    /// 用主题的选项开始新的一局
    pub fn new(template: &Template) -> Result<Self, SessionError> {
        Self::new_with_rng(template, &mut rand::rng())
    }

    pub fn new_with_rng<R: Rng + ?Sized>(template: &Template, rng: &mut R) -> Result<Self, SessionError> {
        let card = generate_card_with_rng(&template.items, rng)?;
        Ok(GameSession {
            id: Uuid::new_v4(),
            template_id: template.id,
            template_name: template.name.clone(),
            card,
            marked: MarkedSet::new(),
            bingo_count: 0,
            target: ProgressTarget::FirstBingo,
            status: GameStatus::Playing,
        })
    }

    /// 从存储记录恢复对局
    ///
    /// 越界的标记被丢弃，中心格总是视为已标记，连线数按标记重新计算。
    pub fn from_record(record: GameRecord) -> Result<Self, SessionError> {
        let target = ProgressTarget::from_threshold(record.target_bingo_count).ok_or_else(|| {
            SessionError::InvalidRecord {
                reason: format!("未知的目标值 {}", record.target_bingo_count),
            }
        })?;
        let card = Card::try_from(record.items)?;
        let marked = MarkedSet::from(record.marked_cells);
        let status = if record.completed {
            GameStatus::Completed
        } else {
            reached_status(target, marked)
        };

        Ok(GameSession {
            id: record.id,
            template_id: record.template_id,
            template_name: record.template_name,
            card,
            marked,
            bingo_count: count_bingos(marked),
            target,
            status,
        })
    }

    pub fn to_record(&self) -> GameRecord {
        GameRecord {
            id: self.id,
            template_id: self.template_id,
            template_name: self.template_name.clone(),
            marked_cells: self.marked.into(),
            items: self.card.clone().into(),
            completed: self.is_completed(),
            bingo_count: self.bingo_count,
            target_bingo_count: self.target.threshold(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    /// 玩家点击一格
    ///
    /// 中心格、越界索引，以及等待选择或已结束时的点击都被忽略，返回空列表。
    pub fn toggle_cell(&mut self, index: u8) -> Vec<Notification> {
        if self.status != GameStatus::Playing {
            return vec![];
        }
        let Some(now_marked) = self.marked.toggle(index) else {
            return vec![];
        };

        let mut notifications = vec![if now_marked {
            Notification::CellMarked(index)
        } else {
            Notification::CellUnmarked(index)
        }];

        let prior_bingo_count = self.bingo_count;
        self.bingo_count = count_bingos(self.marked);
        if self.bingo_count != prior_bingo_count {
            notifications.push(Notification::BingoCountChanged { bingo_count: self.bingo_count });
        }

        self.status = next_status(self.target, prior_bingo_count, self.marked);
        notifications.extend(self.status_notification());
        notifications
    }

    fn status_notification(&self) -> Option<Notification> {
        match self.status {
            GameStatus::AwaitingContinueDecision { next } => {
                Some(Notification::ContinuePrompt { bingo_count: self.bingo_count, next })
            }
            GameStatus::Completed => Some(Notification::GameCompleted { bingo_count: self.bingo_count }),
            GameStatus::Playing => None,
        }
    }

    /// 处理玩家对继续提示的选择，不在等待选择时忽略
    pub fn decide(&mut self, decision: ContinueDecision) -> Vec<Notification> {
        let GameStatus::AwaitingContinueDecision { next } = self.status else {
            return vec![];
        };
        match decision {
            ContinueDecision::Stop => {
                self.status = GameStatus::Completed;
                vec![Notification::GameCompleted { bingo_count: self.bingo_count }]
            }
            ContinueDecision::Continue => {
                self.target = next;
                // 新目标可能已经达成，此时立即提示，而不是等下一次越过阈值
                self.status = reached_status(next, self.marked);
                let mut notifications = vec![Notification::TargetAdvanced { target: next }];
                notifications.extend(self.status_notification());
                notifications
            }
        }
    }

    /// 重新生成卡片：标记清空为只剩中心格，目标回到第一条连线，丢弃待定的选择
    pub fn regenerate(&mut self, pool: &[String]) -> Result<Vec<Notification>, SessionError> {
        self.regenerate_with_rng(pool, &mut rand::rng())
    }

    pub fn regenerate_with_rng<R: Rng + ?Sized>(
        &mut self,
        pool: &[String],
        rng: &mut R,
    ) -> Result<Vec<Notification>, SessionError> {
        if self.is_completed() {
            return Err(SessionError::GameFinished);
        }
        self.card = generate_card_with_rng(pool, rng)?;
        self.marked = MarkedSet::new();
        self.bingo_count = 0;
        self.target = ProgressTarget::FirstBingo;
        self.status = GameStatus::Playing;
        Ok(vec![Notification::CardRegenerated])
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CardError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // 辅助函数：创建用于测试的主题和对局
    fn test_template(n: usize) -> Template {
        Template {
            id: Uuid::new_v4(),
            name: "测试主题".to_string(),
            items: (0..n).map(|i| format!("item-{}", i)).collect(),
        }
    }

    fn setup_test_game() -> GameSession {
        let mut rng = StdRng::seed_from_u64(7);
        GameSession::new_with_rng(&test_template(30), &mut rng).unwrap()
    }

    fn toggle_all(game: &mut GameSession, cells: &[u8]) -> Vec<Notification> {
        cells.iter().flat_map(|&c| game.toggle_cell(c)).collect()
    }

    #[test]
    fn test_new_game_initial_state() {
        let game = setup_test_game();
        assert_eq!(game.marked, MarkedSet::new());
        assert_eq!(game.bingo_count, 0);
        assert_eq!(game.target, ProgressTarget::FirstBingo);
        assert_eq!(game.status, GameStatus::Playing);
        assert_eq!(game.card.cell(FREE_SPACE_INDEX), Some(FREE_SPACE));
    }

    #[test]
    fn test_new_game_insufficient_options() {
        let err = GameSession::new(&test_template(10)).unwrap_err();
        assert_eq!(
            err,
            SessionError::Card(CardError::InsufficientOptions { required: 24, found: 10 })
        );
    }

    #[test]
    fn test_first_bingo_prompts_continue() {
        let mut game = setup_test_game();
        let before = toggle_all(&mut game, &[0, 1, 2, 3]);
        assert!(before.iter().all(|n| !matches!(n, Notification::ContinuePrompt { .. })));
        assert_eq!(game.status, GameStatus::Playing);

        let notifications = game.toggle_cell(4);
        assert_eq!(
            notifications,
            vec![
                Notification::CellMarked(4),
                Notification::BingoCountChanged { bingo_count: 1 },
                Notification::ContinuePrompt { bingo_count: 1, next: ProgressTarget::ThreeBingos },
            ]
        );
        assert_eq!(
            game.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::ThreeBingos }
        );
    }

    #[test]
    fn test_continue_advances_target() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);

        let notifications = game.decide(ContinueDecision::Continue);
        assert_eq!(notifications, vec![Notification::TargetAdvanced { target: ProgressTarget::ThreeBingos }]);
        assert_eq!(game.target, ProgressTarget::ThreeBingos);
        assert_eq!(game.status, GameStatus::Playing);
        assert!(!game.is_completed());
    }

    #[test]
    fn test_stop_completes_and_records() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);

        let notifications = game.decide(ContinueDecision::Stop);
        assert_eq!(notifications, vec![Notification::GameCompleted { bingo_count: 1 }]);
        assert_eq!(game.status, GameStatus::Completed);

        let record = game.to_record();
        assert!(record.completed);
        assert_eq!(record.marked_cells, vec![0, 1, 2, 3, 4, 12]);
        assert_eq!(record.bingo_count, 1);
        assert_eq!(record.target_bingo_count, 1);
        assert_eq!(record.items.len(), 25);
    }

    #[test]
    fn test_first_bingo_does_not_refire() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        game.decide(ContinueDecision::Continue);

        // 取消再重新完成第一行：连线数回到 1，但目标已是 3，不应再提示
        let notifications = toggle_all(&mut game, &[4, 4]);
        assert!(notifications.iter().all(|n| !matches!(n, Notification::ContinuePrompt { .. })));
        assert_eq!(game.status, GameStatus::Playing);
        assert_eq!(game.bingo_count, 1);
    }

    #[test]
    fn test_three_bingos_then_full_card() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        game.decide(ContinueDecision::Continue);

        // 第 1 行 + 第 2 行 (借助中心格)
        toggle_all(&mut game, &[5, 6, 7, 8]);
        assert_eq!(game.status, GameStatus::Playing);
        let notifications = toggle_all(&mut game, &[9, 10, 11, 13, 14]);
        assert!(notifications.contains(&Notification::ContinuePrompt {
            bingo_count: game.bingo_count,
            next: ProgressTarget::FullCard,
        }));
        assert!(game.bingo_count >= 3);
        assert_eq!(
            game.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::FullCard }
        );

        game.decide(ContinueDecision::Continue);
        assert_eq!(game.target, ProgressTarget::FullCard);

        let remaining: Vec<u8> = (15..25).collect();
        let (last, rest) = remaining.split_last().unwrap();
        toggle_all(&mut game, rest);
        assert_eq!(game.status, GameStatus::Playing);

        let notifications = game.toggle_cell(*last);
        assert!(notifications.contains(&Notification::GameCompleted { bingo_count: 12 }));
        assert_eq!(game.status, GameStatus::Completed);
        assert!(game.marked.is_full());
        assert!(game.to_record().completed);
        assert_eq!(game.to_record().target_bingo_count, 25);
    }

    #[test]
    fn test_double_line_jump_at_first_target() {
        let mut game = setup_test_game();
        // 第 0 行和第 0 列共享格子 0，最后一格同时完成两条线
        toggle_all(&mut game, &[1, 2, 3, 4, 5, 10, 15, 20]);
        let notifications = game.toggle_cell(0);
        assert!(notifications.contains(&Notification::BingoCountChanged { bingo_count: 2 }));
        assert_eq!(
            game.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::ThreeBingos }
        );
    }

    #[test]
    fn test_triple_line_jump_then_continue_prompts_again() {
        let mut game = setup_test_game();
        // 格子 0 同时完成第 0 行、第 0 列和主对角线
        toggle_all(&mut game, &[1, 2, 3, 4, 5, 10, 15, 20, 6, 18, 24]);
        assert_eq!(game.bingo_count, 0);
        let notifications = game.toggle_cell(0);
        assert!(notifications.contains(&Notification::BingoCountChanged { bingo_count: 3 }));
        assert_eq!(
            game.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::ThreeBingos }
        );

        // 三条连线已经达成，继续之后直接提示下一目标
        let notifications = game.decide(ContinueDecision::Continue);
        assert_eq!(
            notifications,
            vec![
                Notification::TargetAdvanced { target: ProgressTarget::ThreeBingos },
                Notification::ContinuePrompt { bingo_count: 3, next: ProgressTarget::FullCard },
            ]
        );
        assert_eq!(game.target, ProgressTarget::ThreeBingos);

        game.decide(ContinueDecision::Continue);
        assert_eq!(game.target, ProgressTarget::FullCard);
        assert_eq!(game.status, GameStatus::Playing);

        let remaining: Vec<u8> = (0..25).filter(|&i| !game.marked.contains(i)).collect();
        let notifications = toggle_all(&mut game, &remaining);
        assert_eq!(notifications.last(), Some(&Notification::GameCompleted { bingo_count: 12 }));
        assert_eq!(game.status, GameStatus::Completed);
    }

    #[test]
    fn test_continue_onto_full_card_already_marked_completes() {
        let mut record = setup_test_game().to_record();
        record.marked_cells = (0..25).collect();
        record.target_bingo_count = 3;

        let mut game = GameSession::from_record(record).unwrap();
        assert!(game.marked.is_full());
        assert_eq!(
            game.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::FullCard }
        );

        let notifications = game.decide(ContinueDecision::Continue);
        assert_eq!(notifications.last(), Some(&Notification::GameCompleted { bingo_count: 12 }));
        assert!(game.is_completed());
        assert_eq!(game.to_record().target_bingo_count, 25);
    }

    #[test]
    fn test_free_space_toggle_is_ignored_in_every_state() {
        let mut game = setup_test_game();
        assert!(game.toggle_cell(FREE_SPACE_INDEX).is_empty());
        assert_eq!(game.marked, MarkedSet::new());

        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        let (marked, count) = (game.marked, game.bingo_count);
        assert!(game.toggle_cell(FREE_SPACE_INDEX).is_empty());
        assert_eq!((game.marked, game.bingo_count), (marked, count));

        game.decide(ContinueDecision::Continue);
        assert!(game.toggle_cell(FREE_SPACE_INDEX).is_empty());
        assert_eq!((game.marked, game.bingo_count), (marked, count));

        game.status = GameStatus::Completed;
        assert!(game.toggle_cell(FREE_SPACE_INDEX).is_empty());
        assert_eq!((game.marked, game.bingo_count), (marked, count));
    }

    #[test]
    fn test_out_of_range_toggle_is_ignored() {
        let mut game = setup_test_game();
        assert!(game.toggle_cell(25).is_empty());
        assert!(game.toggle_cell(u8::MAX).is_empty());
        assert_eq!(game.marked, MarkedSet::new());
    }

    #[test]
    fn test_toggles_ignored_while_awaiting_decision() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        assert!(game.toggle_cell(7).is_empty());
        assert!(!game.marked.contains(7));
    }

    #[test]
    fn test_decide_ignored_while_playing() {
        let mut game = setup_test_game();
        assert!(game.decide(ContinueDecision::Stop).is_empty());
        assert_eq!(game.status, GameStatus::Playing);
    }

    #[test]
    fn test_regenerate_resets_progress() {
        let mut game = setup_test_game();
        let old_card = game.card.clone();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        game.decide(ContinueDecision::Continue);
        toggle_all(&mut game, &[5, 6]);

        let pool = test_template(60).items;
        let notifications = game
            .regenerate_with_rng(&pool, &mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(notifications, vec![Notification::CardRegenerated]);
        assert_ne!(game.card, old_card);
        assert_eq!(game.marked, MarkedSet::new());
        assert_eq!(game.bingo_count, 0);
        assert_eq!(game.target, ProgressTarget::FirstBingo);
        assert_eq!(game.status, GameStatus::Playing);
    }

    #[test]
    fn test_regenerate_discards_pending_decision() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        game.regenerate(&test_template(25).items).unwrap();
        assert_eq!(game.status, GameStatus::Playing);
        assert!(game.decide(ContinueDecision::Stop).is_empty());
    }

    #[test]
    fn test_regenerate_rejected_when_finished() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        game.decide(ContinueDecision::Stop);
        assert_eq!(game.regenerate(&test_template(25).items), Err(SessionError::GameFinished));
    }

    #[test]
    fn test_regenerate_insufficient_options_keeps_card() {
        let mut game = setup_test_game();
        let old_card = game.card.clone();
        assert!(game.regenerate(&test_template(5).items).is_err());
        assert_eq!(game.card, old_card);
    }

    #[test]
    fn test_record_round_trip() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 6, 18]);
        let restored = GameSession::from_record(game.to_record()).unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn test_resume_reached_target_prompts_again() {
        let mut game = setup_test_game();
        toggle_all(&mut game, &[0, 1, 2, 3, 4]);
        // 提示弹出后未作选择就离开
        let restored = GameSession::from_record(game.to_record()).unwrap();
        assert_eq!(
            restored.status,
            GameStatus::AwaitingContinueDecision { next: ProgressTarget::ThreeBingos }
        );
    }

    #[test]
    fn test_resume_sanitizes_marked_cells() {
        let mut record = setup_test_game().to_record();
        record.marked_cells = vec![0, 1, 30, 200];
        record.bingo_count = 9;
        let restored = GameSession::from_record(record).unwrap();
        assert_eq!(Vec::<u8>::from(restored.marked), vec![0, 1, 12]);
        assert_eq!(restored.bingo_count, 0);
    }

    #[test]
    fn test_resume_rejects_bad_records() {
        let mut record = setup_test_game().to_record();
        record.target_bingo_count = 2;
        assert!(matches!(
            GameSession::from_record(record),
            Err(SessionError::InvalidRecord { .. })
        ));

        let mut record = setup_test_game().to_record();
        record.items.pop();
        assert_eq!(
            GameSession::from_record(record),
            Err(SessionError::Card(CardError::WrongCellCount(24)))
        );
    }

    #[test]
    fn test_record_json_shape() {
        let record = setup_test_game().to_record();
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id", "templateId", "templateName", "markedCells", "items",
            "completed", "bingoCount", "targetBingoCount",
        ] {
            assert!(json.get(key).is_some(), "缺少字段 {}", key);
        }
        assert_eq!(json["markedCells"], serde_json::json!([12]));
        assert_eq!(json["targetBingoCount"], 1);
    }
}
