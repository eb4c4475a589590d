use crossterm::style::{style, Stylize};

use bingo_eden_core::{completed_lines, GameSession, GameStatus, FREE_SPACE_INDEX, GRID_SIZE, LINES};

// 每格显示的最大字符数
const CELL_WIDTH: usize = 10;

fn truncate(text: &str) -> String {
    let mut out: String = text.chars().take(CELL_WIDTH).collect();
    if text.chars().count() > CELL_WIDTH {
        out.pop();
        out.push('…');
    }
    out
}

/// 在终端画出 5×5 卡片：已标记的格子绿底，完成连线上的格子加粗
pub fn print_card(game: &GameSession) {
    let lines = completed_lines(game.marked);
    let in_bingo = |index: u8| lines.iter().any(|&l| LINES[l].contains(&index));

    println!("对局 {}  主题: {}", game.id, game.template_name);
    for (row, cells) in game.card.rows().enumerate() {
        let mut out = String::new();
        for (col, text) in cells.iter().enumerate() {
            let index = (row * GRID_SIZE + col) as u8;
            let label = format!("{:>2} {:<width$}", index, truncate(text), width = CELL_WIDTH);
            let mut cell = style(label);
            if index == FREE_SPACE_INDEX {
                cell = cell.on_dark_yellow();
            } else if game.marked.contains(index) {
                cell = cell.on_dark_green();
            }
            if in_bingo(index) {
                cell = cell.bold();
            }
            out.push_str(&format!("{} ", cell));
        }
        println!("{}", out);
    }

    let status = match game.status {
        GameStatus::Playing => format!("目标: {}", game.target),
        GameStatus::AwaitingContinueDecision { next } => format!("已达成 {}，等待选择 (下一目标: {})", game.target, next),
        GameStatus::Completed => "已结束".to_string(),
    };
    println!("连线数: {}  {}", game.bingo_count, status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        assert_eq!(truncate("0123456789"), "0123456789");
        assert_eq!(truncate("0123456789abc"), "012345678…");
    }
}
