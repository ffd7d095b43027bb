//! The fixed style catalog.
//!
//! Four styles, defined at process start and never mutated. Each entry
//! carries the synthesis prompt template the preview generation is driven
//! by.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Identifier of a catalog style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleId {
    Line,
    ThreeD,
    Crayon,
    Perler,
}

impl StyleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::Line => "line",
            StyleId::ThreeD => "3d",
            StyleId::Crayon => "crayon",
            StyleId::Perler => "perler",
        }
    }
}

/// One immutable style catalog entry. Serialize-only: the catalog is
/// compiled in, never read back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyleOption {
    pub id: StyleId,
    pub name: &'static str,
    pub emoji: &'static str,
    pub prompt: &'static str,
}

/// The full catalog, in display order.
pub static STYLES: Lazy<[StyleOption; 4]> = Lazy::new(|| {
    [
        StyleOption {
            id: StyleId::Line,
            name: "Line 风",
            emoji: "🎨",
            prompt: "Q版 LINE sticker风格，矢量图，白色纯背景#FFFFFF，模切风格（Die-cut），严格保留参考图中的发型和眼镜等头部特征，2x2网格布局的贴纸合集，包含开心、疑惑、大哭、点赞四种情绪，无贴纸效果，无背胶质感，无贴纸白边，人物比例协调萌系，单格形象独立完整，整体画面简洁干净，矢量图清晰无锯齿，干净边缘，生成一张高质量图片",
        },
        StyleOption {
            id: StyleId::ThreeD,
            name: "3D 卡通",
            emoji: "🎭",
            prompt: "以上传的图片肖像为蓝本创作 Q版 3D卡通风格矢量图，白色纯背景#FFFFFF，2x2网格构图，画面包含四个独立形象分别对应开心、疑惑、大哭、点赞四种情绪，严格保留参考图中的头部特征，3D卡通质感柔和，矢量图清晰无锯齿，干净边缘，无贴纸效果，无背胶质感，无贴纸白边，人物比例协调萌系，单格形象独立完整，整体画面简洁干净，生成一张高质量图片",
        },
        StyleOption {
            id: StyleId::Crayon,
            name: "蜡笔手绘",
            emoji: "🖍️",
            prompt: "以上传的图片肖像为蓝本创作 蜡笔手绘风格矢量图，白色纯背景#FFFFFF，2x2网格构图，画面包含四个独立形象分别对应开心、疑惑、大哭、点赞四种情绪，严格保留参考图中的头部特征，蜡笔手绘风格柔和，矢量图清晰无锯齿，干净边缘，无贴纸效果，无背胶质感，无贴纸白边，人物比例协调萌系，单格形象独立完整，整体画面简洁干净，生成一张高质量图片",
        },
        StyleOption {
            id: StyleId::Perler,
            name: "拼豆风",
            emoji: "🔷",
            prompt: "以上传的图片肖像为蓝本创作 Q版 拼豆风格矢量图，白色纯背景#FFFFFF，2x2网格构图，画面包含四个独立形象分别对应开心、疑惑、大哭、点赞四种情绪，严格保留参考图中的头部特征，拼豆风格柔和，矢量图清晰无锯齿，干净边缘，无贴纸效果，无背胶质感，无贴纸白边，人物比例协调萌系，单格形象独立完整，整体画面简洁干净，生成一张高质量图片",
        },
    ]
});

/// Looks up a catalog entry by id.
pub fn style_option(id: StyleId) -> &'static StyleOption {
    STYLES
        .iter()
        .find(|style| style.id == id)
        .expect("catalog covers every StyleId")
}
