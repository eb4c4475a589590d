use crate::error::CardError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- 卡片布局常量 ---

/// 卡片边长 (5×5)
pub const GRID_SIZE: usize = 5;
/// 卡片总格数
pub const CARD_CELLS: usize = GRID_SIZE * GRID_SIZE;
/// 中心格 (第 2 行第 2 列，0 起) 的扁平索引
pub const FREE_SPACE_INDEX: u8 = 12;
/// 中心格的固定内容
pub const FREE_SPACE: &str = "FREE SPACE";
/// 生成一张卡片所需的最少选项数 (不含中心格)
pub const REQUIRED_OPTIONS: usize = CARD_CELLS - 1;

/// 全部 12 条连线：5 行、5 列、2 条对角线。
/// 索引按 `row * 5 + col` 计算，这张表是对外约定，不能改动。
pub const LINES: [[u8; GRID_SIZE]; 12] = [
    // 行
    [0, 1, 2, 3, 4],
    [5, 6, 7, 8, 9],
    [10, 11, 12, 13, 14],
    [15, 16, 17, 18, 19],
    [20, 21, 22, 23, 24],
    // 列
    [0, 5, 10, 15, 20],
    [1, 6, 11, 16, 21],
    [2, 7, 12, 17, 22],
    [3, 8, 13, 18, 23],
    [4, 9, 14, 19, 24],
    // 对角线
    [0, 6, 12, 18, 24],
    [4, 8, 12, 16, 20],
];

const fn line_mask(line: [u8; GRID_SIZE]) -> u32 {
    let mut mask = 0u32;
    let mut i = 0;
    while i < GRID_SIZE {
        mask |= 1u32 << line[i];
        i += 1;
    }
    mask
}

/// 与 `LINES` 一一对应的位掩码
pub const LINE_MASKS: [u32; 12] = {
    let mut masks = [0u32; 12];
    let mut i = 0;
    while i < LINES.len() {
        masks[i] = line_mask(LINES[i]);
        i += 1;
    }
    masks
};

const FULL_MASK: u32 = (1u32 << CARD_CELLS) - 1;

// --- 核心数据结构定义 ---

/// 一张 5×5 的宾果卡片
///
/// 始终恰好 25 格，且第 12 格固定为 [`FREE_SPACE`]。
/// 序列化时表现为长度 25 的字符串数组 (即游戏记录里的 `items`)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Card {
    cells: [String; CARD_CELLS],
}

impl Card {
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, index: u8) -> Option<&str> {
        self.cells.get(index as usize).map(String::as_str)
    }

    /// 按行遍历，每行 5 格
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.chunks(GRID_SIZE)
    }
}

impl TryFrom<Vec<String>> for Card {
    type Error = CardError;

    fn try_from(cells: Vec<String>) -> Result<Self, Self::Error> {
        let len = cells.len();
        let cells: [String; CARD_CELLS] = cells
            .try_into()
            .map_err(|_| CardError::WrongCellCount(len))?;
        if cells[FREE_SPACE_INDEX as usize] != FREE_SPACE {
            return Err(CardError::MissingFreeSpace);
        }
        Ok(Card { cells })
    }
}

impl From<Card> for Vec<String> {
    fn from(card: Card) -> Self {
        Vec::from(card.cells)
    }
}

/// 已标记格子的集合
///
/// 用 `u32` 的低 25 位表示，第 12 位 (中心格) 永远置位。
/// 超出 [0,24] 的索引在构造时被丢弃，查询时永远不存在。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct MarkedSet(u32);

impl MarkedSet {
    /// 只包含中心格的初始集合
    pub fn new() -> Self {
        MarkedSet(1 << FREE_SPACE_INDEX)
    }

    /// 25 格全部标记
    pub fn full() -> Self {
        MarkedSet(FULL_MASK)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, index: u8) -> bool {
        (index as usize) < CARD_CELLS && self.0 & (1 << index) != 0
    }

    /// 插入一个索引，返回集合是否发生变化
    pub fn insert(&mut self, index: u8) -> bool {
        if (index as usize) >= CARD_CELLS || self.contains(index) {
            return false;
        }
        self.0 |= 1 << index;
        true
    }

    /// 移除一个索引，中心格不可移除。返回集合是否发生变化
    pub fn remove(&mut self, index: u8) -> bool {
        if index == FREE_SPACE_INDEX || !self.contains(index) {
            return false;
        }
        self.0 &= !(1 << index);
        true
    }

    /// 玩家切换一格。
    /// 返回 `Some(true)` 表示变为已标记，`Some(false)` 表示取消标记，
    /// 中心格或越界索引返回 `None` 且不做任何修改。
    pub fn toggle(&mut self, index: u8) -> Option<bool> {
        if index == FREE_SPACE_INDEX || (index as usize) >= CARD_CELLS {
            return None;
        }
        if self.remove(index) {
            Some(false)
        } else {
            self.insert(index);
            Some(true)
        }
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_full(&self) -> bool {
        self.0 & FULL_MASK == FULL_MASK
    }

    /// 按升序遍历已标记的索引
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..CARD_CELLS as u8).filter(move |&i| self.contains(i))
    }
}

impl Default for MarkedSet {
    fn default() -> Self {
        MarkedSet::new()
    }
}

impl FromIterator<u8> for MarkedSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = MarkedSet::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl From<Vec<u8>> for MarkedSet {
    fn from(indices: Vec<u8>) -> Self {
        indices.into_iter().collect()
    }
}

impl From<MarkedSet> for Vec<u8> {
    fn from(set: MarkedSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for MarkedSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indices: Vec<String> = self.iter().map(|i| i.to_string()).collect();
        write!(f, "{{{}}}", indices.join(","))
    }
}

// --- 随机卡片生成 ---

/// 从选项池中随机生成一张卡片，使用线程本地随机源
pub fn generate_card(pool: &[String]) -> Result<Card, CardError> {
    generate_card_with_rng(pool, &mut rand::rng())
}

/// 从选项池中随机生成一张卡片
///
/// 1. 对选项池的副本做 Fisher–Yates 洗牌 (i 从末尾到 1，与 [0,i] 内的均匀随机位置交换)。
/// 2. 取洗牌后的前 24 个。
/// 3. 前 12 个 + FREE SPACE + 后 12 个，中心格总在索引 12。
///
/// 选项少于 24 个时返回 [`CardError::InsufficientOptions`]。
pub fn generate_card_with_rng<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> Result<Card, CardError> {
    if pool.len() < REQUIRED_OPTIONS {
        return Err(CardError::InsufficientOptions {
            required: REQUIRED_OPTIONS,
            found: pool.len(),
        });
    }

    let mut options = pool.to_vec();
    for i in (1..options.len()).rev() {
        let j = rng.random_range(0..=i);
        options.swap(i, j);
    }
    options.truncate(REQUIRED_OPTIONS);

    let after = options.split_off(FREE_SPACE_INDEX as usize);
    let mut cells = options;
    cells.push(FREE_SPACE.to_string());
    cells.extend(after);

    Card::try_from(cells)
}

// --- 连线评估逻辑 ---

/// 统计已完成的连线数 (行 + 列 + 对角线)，结果在 [0,12]。
///
/// 12 条线各自独立判断后求和，不去重也不提前退出。
pub fn count_bingos(marked: MarkedSet) -> u8 {
    LINE_MASKS
        .iter()
        .map(|&mask| u8::from(marked.bits() & mask == mask))
        .sum()
}

/// 返回已完成连线在 [`LINES`] 中的下标，供界面高亮使用
pub fn completed_lines(marked: MarkedSet) -> Vec<usize> {
    LINE_MASKS
        .iter()
        .enumerate()
        .filter(|&(_, &mask)| marked.bits() & mask == mask)
        .map(|(i, _)| i)
        .collect()
}

// --- 单元测试 ---
