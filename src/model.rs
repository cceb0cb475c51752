//! 定义了本库对外暴露的核心数据模型。
//!
//! 这些结构体（`Artist`, `Song`, `Album`）是酷我各接口返回的原始记录
//! 经过校验和构造之后的目标格式。它们都是纯值对象：只由响应映射层
//! 创建，一经构造便不再修改，彼此之间按值嵌套而不共享身份。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 代表一位艺术家的值对象。
///
/// 艺术家只作为歌曲/专辑的嵌套值出现；歌手详情接口的返回
/// 不做映射，以原始 JSON 交给调用方。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// 艺术家在酷我平台的数字 ID。
    pub id: i64,
    /// 艺术家姓名。
    pub name: String,
}

/// 代表一首歌曲。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// 歌曲在酷我平台的数字 ID（接口中的 `rid`）。
    pub id: i64,
    /// 歌曲名。
    pub name: String,
    /// 演唱者列表，保持服务端顺序，可能为空。
    pub artists: Vec<Artist>,
    /// 歌曲时长。服务端以秒为单位下发，这里保存为毫秒精度。
    pub duration: Duration,
    /// 歌曲所属专辑；无专辑归属时为 `None`，而不是空的占位对象。
    pub album: Option<Album>,
    /// 是否存在无损音源。
    pub lossless: bool,
    /// MV 标志位，`0` 表示没有 MV。
    pub mv_flag: i64,
}

/// 代表一张专辑。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// 专辑在酷我平台的数字 ID。
    pub id: i64,
    /// 专辑名。
    pub name: String,
    /// 专辑封面图片 URL。
    ///
    /// 作为歌曲的嵌套专辑时总是 `Some`（服务端未下发则为空字符串）；
    /// 由专辑详情接口映射时，服务端未下发则为 `None`。
    pub cover: Option<String>,
    /// 专辑的艺术家列表。专辑详情记录总是恰好带有一位署名艺术家；
    /// 歌曲的嵌套专辑不携带艺术家信息。
    pub artists: Vec<Artist>,
    /// 专辑描述；只有专辑详情映射会填充该字段。
    pub description: Option<String>,
}
