//! 酷我音乐的客户端实现。
//!
//! 所有目录类操作共用同一条鉴权请求管线：惰性完成一次会话握手，
//! 之后每个请求都带上 `csrf` 令牌头与握手 Cookie，再按 JSON 解码。
//! 唯一的例外是移动网关的音质查询，它不走会话，而是把查询参数
//! 经过 [`crate::crypto`] 编码后直接请求移动网关。

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use reqwest::{
    Client,
    header::{
        ACCEPT, ACCEPT_LANGUAGE, COOKIE, HOST, HeaderMap, HeaderValue, REFERER, USER_AGENT,
    },
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    crypto,
    error::{KuwoApiError, Result},
    model::{Album, Song},
    models::{AlbumRecord, ApiEnvelope, SongRecord, map_song_list},
    session::SessionManager,
};

const API_BASE: &str = "http://www.kuwo.cn/api/www";
const HTTP_HOST: &str = "http://kuwo.cn";
const MOBI_HOST: &str = "http://mobi.kuwo.cn";
const M_HOST: &str = "http://m.kuwo.cn";

/// 单次请求的固定超时时间，超过即失败，是否重试由调用方决定。
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 主站请求使用的桌面浏览器 User-Agent。
const WEB_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/81.0.4044.138 Safari/537.36";

/// 移动网关要求的精简 User-Agent。
const MOBI_USER_AGENT: &str = "okhttp/3.10.0";

/// 播放音质档位。
///
/// 与服务端音质键的对应关系：`shq` 无损、`hq` 320kbps、
/// `sq` 192kbps、`lq` 128kbps。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongQuality {
    /// 无损 (`shq`)。
    Lossless,
    /// 高音质 320kbps (`hq`)。
    High,
    /// 标准音质 192kbps (`sq`)。
    Standard,
    /// 流畅音质 128kbps (`lq`)。
    Low,
}

impl SongQuality {
    /// 服务端使用的音质键名。
    pub const fn key(self) -> &'static str {
        match self {
            Self::Lossless => "shq",
            Self::High => "hq",
            Self::Standard => "sq",
            Self::Low => "lq",
        }
    }

    /// 档位对应的码率（bit/s）。
    pub const fn bitrate(self) -> u32 {
        match self {
            Self::Lossless => 2_000_000,
            Self::High => 320_000,
            Self::Standard => 192_000,
            Self::Low => 128_000,
        }
    }

    /// 网页端 `url` 接口使用的 `br` 参数。
    pub const fn br(self) -> &'static str {
        match self {
            Self::Lossless => "2000kflac",
            Self::High => "320kmp3",
            Self::Standard => "192kmp3",
            Self::Low => "128kmp3",
        }
    }

    /// 移动端接口使用的格式标签。
    pub const fn format_tag(self) -> &'static str {
        match self {
            Self::Lossless => "AL",
            Self::High => "MP3H",
            Self::Standard => "MP3192",
            Self::Low => "MP3128",
        }
    }

    /// 移动网关查询的候选封装格式集合。
    const fn formats(self) -> &'static str {
        match self {
            Self::Lossless => "ape|flac|mp3|aac",
            _ => "mp3|aac",
        }
    }
}

/// 构造移动网关音质查询的明文参数串，编码前的形态。
fn mobi_payload(rid: i64, quality: SongQuality) -> String {
    format!(
        "corp=kuwo&p2p=1&type=convert_url2&sig=0&format={}&rid={rid}",
        quality.formats()
    )
}

/// 获取当前的毫秒级时间戳，作为 `url` 接口要求的 `t` 参数。
fn current_millis() -> Result<u128> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| KuwoApiError::Internal(format!("系统时间早于 UNIX 纪元: {e}")))
}

/// 酷我音乐的客户端。
///
/// 持有共享的 HTTP 连接池与会话状态。`Clone` 出的副本共享同一份
/// 会话，因此进程内构造一次、到处克隆即可；并发使用是安全的。
#[derive(Debug, Clone)]
pub struct KuwoClient {
    http_client: Client,
    mobi_client: Client,
    session: Arc<SessionManager>,
}

impl KuwoClient {
    /// 创建一个新的客户端实例。
    ///
    /// 只做本地初始化，不发出网络请求；会话握手推迟到第一个
    /// 鉴权请求发生时。
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        // Accept-Encoding 由 reqwest 按启用的压缩特性自动携带并解压
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.8,gl;q=0.6,zh-TW;q=0.4"),
        );
        headers.insert(REFERER, HeaderValue::from_static(HTTP_HOST));
        headers.insert(USER_AGENT, HeaderValue::from_static(WEB_USER_AGENT));
        headers.insert(HOST, HeaderValue::from_static("kuwo.cn"));

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut mobi_headers = HeaderMap::new();
        mobi_headers.insert(USER_AGENT, HeaderValue::from_static(MOBI_USER_AGENT));
        let mobi_client = Client::builder()
            .default_headers(mobi_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            mobi_client,
            session: Arc::new(SessionManager::new()),
        })
    }

    /// 返回共享的会话管理器，可用于读取令牌或提前触发握手。
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // =================================================================
    // 搜索接口：返回服务端的分页原始结构
    // =================================================================

    /// 按关键词搜索歌曲，返回服务端的分页原始结构。
    ///
    /// 分页外壳不做映射，由调用方按需处理；列表里的每个歌曲元素
    /// 都可以反序列化为 [`SongRecord`] 再转换为 [`Song`]。
    pub async fn search_songs(&self, keyword: &str, page: u32, limit: u32) -> Result<Value> {
        let url = format!(
            "{API_BASE}/search/searchMusicBykeyWord?key={}&pn={page}&rn={limit}",
            urlencoding::encode(keyword)
        );
        self.get_json("search/searchMusicBykeyWord", &url).await
    }

    /// 按关键词搜索专辑，返回服务端的分页原始结构。
    pub async fn search_albums(&self, keyword: &str, page: u32, limit: u32) -> Result<Value> {
        let url = format!(
            "{API_BASE}/search/searchAlbumBykeyWord?key={}&pn={page}&rn={limit}",
            urlencoding::encode(keyword)
        );
        self.get_json("search/searchAlbumBykeyWord", &url).await
    }

    /// 按关键词搜索歌手，返回服务端的分页原始结构。
    pub async fn search_artists(&self, keyword: &str, page: u32, limit: u32) -> Result<Value> {
        let url = format!(
            "{API_BASE}/search/searchArtistBykeyWord?key={}&pn={page}&rn={limit}",
            urlencoding::encode(keyword)
        );
        self.get_json("search/searchArtistBykeyWord", &url).await
    }

    /// 按关键词搜索歌单，返回服务端的分页原始结构。
    pub async fn search_playlists(&self, keyword: &str, page: u32, limit: u32) -> Result<Value> {
        let url = format!(
            "{API_BASE}/search/searchPlayListBykeyWord?key={}&pn={page}&rn={limit}",
            urlencoding::encode(keyword)
        );
        self.get_json("search/searchPlayListBykeyWord", &url).await
    }

    // =================================================================
    // 详情接口
    // =================================================================

    /// 获取单曲详情并映射为 [`Song`]。
    pub async fn get_song_detail(&self, rid: i64) -> Result<Song> {
        let url = format!("{API_BASE}/music/musicInfo?mid={rid}");
        let envelope: ApiEnvelope<SongRecord> = self.get_json("music/musicInfo", &url).await?;
        envelope.into_data("music/musicInfo")?.try_into()
    }

    /// 获取专辑详情并映射为 [`Album`]。
    pub async fn get_album_info(&self, album_id: i64, page: u32, limit: u32) -> Result<Album> {
        let url = format!("{API_BASE}/album/albumInfo?albumId={album_id}&pn={page}&rn={limit}");
        let envelope: ApiEnvelope<AlbumRecord> = self.get_json("album/albumInfo", &url).await?;
        envelope.into_data("album/albumInfo")?.try_into()
    }

    /// 获取专辑内的曲目并逐条映射为 [`Song`]。
    ///
    /// 列表映射是严格的，见 [`map_song_list`]。
    pub async fn get_album_songs(&self, album_id: i64, page: u32, limit: u32) -> Result<Vec<Song>> {
        let url = format!("{API_BASE}/album/albumInfo?albumId={album_id}&pn={page}&rn={limit}");
        let envelope: ApiEnvelope<AlbumRecord> = self.get_json("album/albumInfo", &url).await?;
        map_song_list(envelope.into_data("album/albumInfo")?.music_list)
    }

    /// 获取歌手详情。歌手记录不做映射，返回原始 JSON。
    pub async fn get_artist_info(&self, artist_id: i64, page: u32, limit: u32) -> Result<Value> {
        let url = format!("{API_BASE}/artist/artist?artistid={artist_id}&pn={page}&rn={limit}");
        self.get_json("artist/artist", &url).await
    }

    /// 获取歌手的歌曲列表，返回服务端的分页原始结构。
    pub async fn get_artist_songs(&self, artist_id: i64, page: u32, limit: u32) -> Result<Value> {
        let url =
            format!("{API_BASE}/artist/artistMusic?artistid={artist_id}&pn={page}&rn={limit}");
        self.get_json("artist/artistMusic", &url).await
    }

    /// 获取歌手的专辑列表，返回服务端的分页原始结构。
    pub async fn get_artist_albums(&self, artist_id: i64, page: u32, limit: u32) -> Result<Value> {
        let url =
            format!("{API_BASE}/artist/artistAlbum?artistid={artist_id}&pn={page}&rn={limit}");
        self.get_json("artist/artistAlbum", &url).await
    }

    /// 获取歌单详情，返回服务端的分页原始结构。
    pub async fn get_playlist_info(&self, playlist_id: i64, page: u32, limit: u32) -> Result<Value> {
        let url =
            format!("{API_BASE}/playlist/playListInfo?pid={playlist_id}&pn={page}&rn={limit}");
        self.get_json("playlist/playListInfo", &url).await
    }

    // =================================================================
    // 播放地址与歌词
    // =================================================================

    /// 获取网页端的播放链接信息。
    pub async fn get_song_url(&self, rid: i64, quality: SongQuality) -> Result<Value> {
        let t = current_millis()?;
        let url = format!(
            "{HTTP_HOST}/url?format=mp3&rid={rid}&response=url&type=convert_url3&br={}&from=web&t={t}",
            quality.br()
        );
        self.get_json("url", &url).await
    }

    /// 获取歌词与歌曲信息。
    pub async fn get_song_lyrics(&self, rid: i64) -> Result<Value> {
        let url = format!("{M_HOST}/newh5/singles/songinfoandlrc?musicId={rid}");
        self.get_json("newh5/singles/songinfoandlrc", &url).await
    }

    /// 获取 MV 播放地址，返回原始响应体。
    pub async fn get_song_mv(&self, rid: i64) -> Result<String> {
        let t = current_millis()?;
        let url = format!(
            "{HTTP_HOST}/url?rid={rid}&response=url&format=mp4%7Cmkv&type=convert_url&t={t}"
        );
        self.get_text(&url).await
    }

    /// 通过移动网关查询指定音质的播放地址，返回原始响应体。
    ///
    /// 这是唯一不走会话鉴权的操作：明文参数串经过编码后作为 `q`
    /// 查询参数直接发给移动网关，由调用方自行解析返回内容。
    pub async fn get_mobi_song_url(&self, rid: i64, quality: SongQuality) -> Result<String> {
        info!(rid, quality = quality.key(), "查询移动网关播放地址");

        let token = crypto::encrypt_base64(&mobi_payload(rid, quality))?;
        let url = format!("{MOBI_HOST}/mobi.s?f=kuwo&q={token}");

        let text = self.mobi_client.get(url).send().await?.text().await?;
        Ok(text)
    }

    // =================================================================
    // 鉴权请求管线
    // =================================================================

    /// 鉴权 GET 并按 JSON 解码的通用原语。
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: &str) -> Result<T> {
        let text = self.get_authenticated(url).await?;
        serde_json::from_str(&text).map_err(|source| KuwoApiError::Protocol { endpoint, source })
    }

    /// 鉴权 GET 并返回原始响应体。
    async fn get_text(&self, url: &str) -> Result<String> {
        self.get_authenticated(url).await
    }

    /// 确保会话已激活，然后带上令牌头与 Cookie 发出一次 GET。
    async fn get_authenticated(&self, url: &str) -> Result<String> {
        let session = self.session.ensure(&self.http_client).await?;

        let csrf = HeaderValue::from_str(session.token())
            .map_err(|e| KuwoApiError::Header(format!("无法把令牌放入 csrf 请求头: {e}")))?;
        let cookie = HeaderValue::from_str(&session.cookie_header())
            .map_err(|e| KuwoApiError::Header(format!("无法构造 Cookie 请求头: {e}")))?;

        debug!(url, "发起鉴权请求");

        let text = self
            .http_client
            .get(url)
            .header("csrf", csrf)
            .header(COOKIE, cookie)
            .send()
            .await?
            .text()
            .await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SONG_RID: i64 = 76_323_299;
    const TEST_ALBUM_ID: i64 = 16_069;
    const TEST_KEYWORD: &str = "晴天";

    #[test]
    fn test_mobi_payload_lossless() {
        assert_eq!(
            mobi_payload(12345, SongQuality::Lossless),
            "corp=kuwo&p2p=1&type=convert_url2&sig=0&format=ape|flac|mp3|aac&rid=12345"
        );
    }

    #[test]
    fn test_mobi_payload_lossy_tiers_share_formats() {
        for quality in [SongQuality::High, SongQuality::Standard, SongQuality::Low] {
            assert_eq!(
                mobi_payload(12345, quality),
                "corp=kuwo&p2p=1&type=convert_url2&sig=0&format=mp3|aac&rid=12345"
            );
        }
    }

    #[test]
    fn test_quality_tables() {
        assert_eq!(SongQuality::Lossless.key(), "shq");
        assert_eq!(SongQuality::High.key(), "hq");
        assert_eq!(SongQuality::Standard.key(), "sq");
        assert_eq!(SongQuality::Low.key(), "lq");

        assert_eq!(SongQuality::Lossless.bitrate(), 2_000_000);
        assert_eq!(SongQuality::High.bitrate(), 320_000);
        assert_eq!(SongQuality::Standard.bitrate(), 192_000);
        assert_eq!(SongQuality::Low.bitrate(), 128_000);

        assert_eq!(SongQuality::Lossless.br(), "2000kflac");
        assert_eq!(SongQuality::High.br(), "320kmp3");
        assert_eq!(SongQuality::Standard.br(), "192kmp3");
        assert_eq!(SongQuality::Low.br(), "128kmp3");

        assert_eq!(SongQuality::Lossless.format_tag(), "AL");
        assert_eq!(SongQuality::High.format_tag(), "MP3H");
        assert_eq!(SongQuality::Standard.format_tag(), "MP3192");
        assert_eq!(SongQuality::Low.format_tag(), "MP3128");
    }

    #[test]
    fn test_search_keyword_is_url_encoded() {
        assert_eq!(urlencoding::encode("晴天 周杰伦"), "%E6%99%B4%E5%A4%A9%20%E5%91%A8%E6%9D%B0%E4%BC%A6");
    }

    #[tokio::test]
    #[ignore]
    async fn test_search_songs() {
        let client = KuwoClient::new().unwrap();
        let envelope = client.search_songs(TEST_KEYWORD, 1, 20).await.unwrap();

        assert_eq!(envelope["code"], 200);
        let list = envelope["data"]["list"].as_array().expect("搜索结果应为列表");
        assert!(!list.is_empty(), "搜索结果不应为空");
        println!("✅ 为 '{TEST_KEYWORD}' 找到 {} 首歌曲", list.len());
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_song_detail() {
        let client = KuwoClient::new().unwrap();
        let song = client.get_song_detail(TEST_SONG_RID).await.unwrap();

        assert_eq!(song.id, TEST_SONG_RID);
        assert!(!song.name.is_empty());
        println!("✅ 歌曲为 '{}'", song.name);
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_album_info() {
        let client = KuwoClient::new().unwrap();
        let album = client.get_album_info(TEST_ALBUM_ID, 1, 20).await.unwrap();

        assert_eq!(album.id, TEST_ALBUM_ID);
        assert_eq!(album.artists.len(), 1, "专辑应恰好带有一位署名艺术家");
        println!("✅ 专辑为 '{}'", album.name);
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_mobi_song_url() {
        let client = KuwoClient::new().unwrap();
        let body = client
            .get_mobi_song_url(TEST_SONG_RID, SongQuality::Standard)
            .await
            .unwrap();

        assert!(!body.is_empty(), "移动网关应返回非空响应体");
        println!("✅ 移动网关返回: {body}");
    }
}
