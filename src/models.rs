//! 此模块定义了用于反序列化酷我 API 响应的数据结构，
//! 以及把原始记录构造成领域模型的转换逻辑。
//!
//! 转换分两步走：serde 先把 JSON 解码成全 `Option` 字段的中间记录，
//! 再由显式的构造函数校验必需字段并套用派生规则。字段"缺失"与
//! 字段"显式为假值"不做区分，统一落到文档化的默认值上；服务端
//! 新增的未知字段一律忽略。

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::{KuwoApiError, Result},
    model::{Album, Artist, Song},
};

// =================================================================
// 酷我 `www` 接口统一的响应外壳
// =================================================================

/// `www.kuwo.cn/api/www` 下所有接口共用的响应外壳。
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// 业务状态码，`200` 表示成功。
    pub code: i64,
    /// 错误信息，成功时一般缺省。
    #[serde(default)]
    pub msg: Option<String>,
    /// 实际负载；出错时缺省。
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// 校验业务状态码并取出负载。
    ///
    /// 非 200 状态码、或成功码下缺少负载，都按 [`KuwoApiError::Api`]
    /// 上抛并带上接口路径，便于定位。
    pub fn into_data(self, endpoint: &'static str) -> Result<T> {
        match self {
            Self {
                code: 200,
                data: Some(data),
                ..
            } => Ok(data),
            Self { code, .. } => Err(KuwoApiError::Api { endpoint, code }),
        }
    }
}

// =================================================================
// 歌曲记录 (`music/musicInfo`、搜索结果与专辑曲目列表共用)
// =================================================================

/// 歌曲记录的原始字段集。
///
/// 必需字段：`rid`、`duration`、`name`、`artist`、`artistid`；
/// 其余字段缺省时采用文档化的默认值。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongRecord {
    /// 歌曲 ID，必需。
    pub rid: Option<i64>,
    /// 歌曲时长（秒），必需。
    pub duration: Option<u64>,
    /// 歌曲名，必需。
    pub name: Option<String>,
    /// 艺术家名，必需。
    pub artist: Option<String>,
    /// 艺术家 ID，必需；`0` 表示没有署名艺术家。
    pub artistid: Option<i64>,
    /// 专辑名，缺省为空字符串。
    #[serde(default)]
    pub album: Option<String>,
    /// 专辑 ID；`0` 与缺失都视为没有专辑归属。
    #[serde(default)]
    pub albumid: Option<i64>,
    /// 专辑封面 URL，缺省为空字符串。
    #[serde(default)]
    pub albumpic: Option<String>,
    /// 是否有无损音源，缺省为 `false`。
    #[serde(rename = "hasLossless", default)]
    pub has_lossless: Option<bool>,
    /// MV 标志位，缺省为 `0`。
    #[serde(default)]
    pub hasmv: Option<i64>,
}

impl TryFrom<SongRecord> for Song {
    type Error = KuwoApiError;

    fn try_from(record: SongRecord) -> Result<Self> {
        let mut missing = Vec::new();
        let rid = required(record.rid, "rid", &mut missing);
        let duration = required(record.duration, "duration", &mut missing);
        let name = required(record.name, "name", &mut missing);
        let artist = required(record.artist, "artist", &mut missing);
        let artistid = required(record.artistid, "artistid", &mut missing);

        let (Some(rid), Some(duration), Some(name), Some(artist), Some(artistid)) =
            (rid, duration, name, artist, artistid)
        else {
            return Err(KuwoApiError::Validation {
                entity: "song",
                missing,
            });
        };

        Ok(Song {
            id: rid,
            name,
            artists: nested_artists(artistid, &artist),
            duration: duration_from_secs(duration),
            album: nested_album(record.albumid, record.album, record.albumpic),
            lossless: record.has_lossless.unwrap_or(false),
            mv_flag: record.hasmv.unwrap_or(0),
        })
    }
}

/// 将列表响应中的歌曲记录逐条映射为 [`Song`]，保持服务端顺序。
///
/// 采用严格模式：任何一条记录校验失败都会使整批映射失败，以便
/// 及时暴露服务端的字段变更，而不是静默丢弃记录。需要宽松语义的
/// 调用方可以自行逐条调用 `Song::try_from` 并跳过失败项。
pub fn map_song_list(records: Vec<SongRecord>) -> Result<Vec<Song>> {
    records.into_iter().map(Song::try_from).collect()
}

// =================================================================
// 专辑记录 (`album/albumInfo`)
// =================================================================

/// 专辑详情记录的原始字段集。
///
/// 必需字段：`albumid`、`album`、`artist`、`artistid`。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumRecord {
    /// 专辑 ID，必需。
    pub albumid: Option<i64>,
    /// 专辑名，必需。
    pub album: Option<String>,
    /// 署名艺术家名，必需。专辑记录总是恰好带有一位署名艺术家。
    pub artist: Option<String>,
    /// 署名艺术家 ID，必需。
    pub artistid: Option<i64>,
    /// 专辑封面 URL。
    #[serde(default)]
    pub pic: Option<String>,
    /// 专辑介绍，缺省为空字符串。
    #[serde(default)]
    pub albuminfo: Option<String>,
    /// 专辑内的曲目列表，随专辑详情一并下发。
    #[serde(rename = "musicList", default)]
    pub music_list: Vec<SongRecord>,
}

impl TryFrom<AlbumRecord> for Album {
    type Error = KuwoApiError;

    fn try_from(record: AlbumRecord) -> Result<Self> {
        let mut missing = Vec::new();
        let albumid = required(record.albumid, "albumid", &mut missing);
        let album = required(record.album, "album", &mut missing);
        let artist = required(record.artist, "artist", &mut missing);
        let artistid = required(record.artistid, "artistid", &mut missing);

        let (Some(albumid), Some(album), Some(artist), Some(artistid)) =
            (albumid, album, artist, artistid)
        else {
            return Err(KuwoApiError::Validation {
                entity: "album",
                missing,
            });
        };

        Ok(Album {
            id: albumid,
            name: album,
            cover: record.pic,
            artists: vec![Artist {
                id: artistid,
                name: artist,
            }],
            description: Some(record.albuminfo.unwrap_or_default()),
        })
    }
}

// =================================================================
// 派生规则
// =================================================================

/// 取出必需字段；字段缺失时把名字记入 `missing`。
fn required<T>(value: Option<T>, field: &'static str, missing: &mut Vec<&'static str>) -> Option<T> {
    if value.is_none() {
        missing.push(field);
    }
    value
}

/// 把服务端下发的秒数换算为毫秒精度的时长。
fn duration_from_secs(seconds: u64) -> Duration {
    Duration::from_millis(seconds.saturating_mul(1000))
}

/// 仅当艺术家 ID 为非零值时才构造歌曲的艺术家列表。
fn nested_artists(artistid: i64, artist: &str) -> Vec<Artist> {
    if artistid != 0 {
        vec![Artist {
            id: artistid,
            name: artist.to_string(),
        }]
    } else {
        Vec::new()
    }
}

/// 仅当专辑 ID 存在且非零时才构造歌曲的专辑归属。
///
/// 嵌套专辑的名字与封面在缺省时都落到空字符串。
fn nested_album(
    albumid: Option<i64>,
    album: Option<String>,
    albumpic: Option<String>,
) -> Option<Album> {
    let albumid = albumid.filter(|&id| id != 0)?;
    Some(Album {
        id: albumid,
        name: album.unwrap_or_default(),
        cover: Some(albumpic.unwrap_or_default()),
        artists: Vec::new(),
        description: None,
    })
}
