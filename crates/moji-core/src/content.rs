//! Caption pools and batch slot assignments.
//!
//! The daily theme assigns each of the 12 batch slots a behavioral state,
//! a pose descriptor, and a state-specific caption pool. The horse theme
//! has no per-slot semantics; its captions are drawn from two greeting
//! pools and shuffled.

use serde::{Deserialize, Serialize};

/// Behavioral state tag attached to a generated sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerState {
    /// Acknowledgement ("got it", "ok").
    Ack,
    /// Laughing.
    Laugh,
    /// Tired, low energy.
    Tired,
    /// Apologetic.
    Sorry,
    /// Thanks and praise.
    Thanks,
    /// Celebration.
    Cheer,
    /// Speechless, resigned.
    Speechless,
    /// On the way.
    OnMyWay,
}

pub const ACK_POOL: &[&str] = &[
    "收到", "好的", "OK", "明白", "行", "可以", "没问题", "知道了", "在的", "好嘞", "收到啦",
    "安排", "懂了", "马上", "确认", "稳",
];
pub const LAUGH_POOL: &[&str] = &[
    "哈哈哈哈", "笑死", "绷不住了", "确实", "有点东西", "我懂", "对对对", "离谱", "太真实了",
    "我也是", "服了哈哈",
];
pub const TIRED_POOL: &[&str] = &["累了", "摆了", "先这样吧", "不想动", "有点困", "缓缓"];
pub const SORRY_POOL: &[&str] = &["怪我", "我不行", "下次一定", "我错了", "失误了"];
pub const THANKS_POOL: &[&str] = &[
    "谢谢啦", "辛苦了", "爱了", "抱抱", "给你点赞", "太棒了", "牛的", "靠谱", "respect", "nice",
];
pub const CHEER_POOL: &[&str] = &["好耶", "成了", "稳了", "开心", "搞定"];
pub const SPEECHLESS_POOL: &[&str] = &["麻了", "无语", "我服了", "算了"];
pub const ON_MY_WAY_POOL: &[&str] = &["在路上", "马上到", "等我一下", "出发了", "快到了", "我来了"];

impl StickerState {
    /// The caption pool captions of this state are drawn from.
    pub fn pool(&self) -> &'static [&'static str] {
        match self {
            StickerState::Ack => ACK_POOL,
            StickerState::Laugh => LAUGH_POOL,
            StickerState::Tired => TIRED_POOL,
            StickerState::Sorry => SORRY_POOL,
            StickerState::Thanks => THANKS_POOL,
            StickerState::Cheer => CHEER_POOL,
            StickerState::Speechless => SPEECHLESS_POOL,
            StickerState::OnMyWay => ON_MY_WAY_POOL,
        }
    }
}

/// One slot assignment of the daily batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySlot {
    pub index: usize,
    pub state: StickerState,
    pub action: &'static str,
}

/// The 12 fixed slot assignments of the daily theme, in batch order.
pub const DAILY_SLOTS: [DailySlot; 12] = [
    DailySlot { index: 0, state: StickerState::Ack, action: "微笑点头，双手自然放在身体前" },
    DailySlot { index: 1, state: StickerState::Ack, action: "单手 OK 手势，表情轻松" },
    DailySlot { index: 2, state: StickerState::Ack, action: "轻挥手示意'收到'" },
    DailySlot { index: 3, state: StickerState::Laugh, action: "张嘴大笑，身体前倾" },
    DailySlot { index: 4, state: StickerState::Laugh, action: "捂嘴偷笑" },
    DailySlot { index: 5, state: StickerState::Thanks, action: "双手比心" },
    DailySlot { index: 6, state: StickerState::Thanks, action: "竖起大拇指点赞" },
    DailySlot { index: 7, state: StickerState::OnMyWay, action: "小跑姿态（在路上）" },
    DailySlot { index: 8, state: StickerState::Tired, action: "微微瘫着，疲惫但不丧" },
    DailySlot { index: 9, state: StickerState::Sorry, action: "挠头苦笑" },
    DailySlot { index: 10, state: StickerState::Cheer, action: "双手举起开心跳" },
    DailySlot { index: 11, state: StickerState::Speechless, action: "双手摊开无语叹气" },
];

/// Long-form new-year greetings (9 are drawn per horse batch).
pub const HORSE_LONG_POOL: &[&str] = &[
    "马上发财", "马上加薪", "马上暴富", "马上有钱", "马上好运", "马到成功", "新年快乐",
    "恭喜发财", "好运连连", "财运亨通", "福气满满", "今年稳赢", "马上成功", "喜气洋洋",
    "福到财到", "一路发财", "红红火火", "升职加薪", "红包多多", "稳稳发财",
];

/// Short-form new-year greetings (3 are drawn per horse batch).
pub const HORSE_SHORT_POOL: &[&str] = &[
    "马上发", "马上富", "马上顺", "马上赢", "马上稳", "马上红", "马上乐", "马上财", "马上喜",
    "马上爽",
];

/// Pose descriptor shared by every horse-theme sticker.
pub const HORSE_ACTION: &str = "与小马互动";

/// Content theme of a sticker batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Everyday reply stickers with per-slot behavioral states.
    #[default]
    Daily,
    /// Year-of-the-horse greetings, uniform state.
    Horse,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Daily => "日常版",
            Theme::Horse => "马年限定版",
        }
    }
}
