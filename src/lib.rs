#![warn(missing_docs)]

//! # Kuwo API RS
//!
//! 酷我音乐 API 的异步 Rust 客户端库：搜索歌曲/专辑/歌手/歌单、
//! 获取详情与歌词，并解析各音质档位的播放地址。
//!
//! 客户端在第一个鉴权请求前自动完成一次会话握手（获取 `kw_token`
//! 反伪造令牌与配套 Cookie），之后所有请求共享这份会话状态；
//! 移动网关的音质查询则使用可逆的 DES + Base64 参数编码，不走会话。
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use kuwo_api_rs::{KuwoClient, SongQuality};
//!
//! async {
//!     let client = KuwoClient::new().unwrap();
//!
//!     // 第一个请求会自动完成会话握手
//!     let song = client.get_song_detail(76323299).await.unwrap();
//!     println!("{} ({} 毫秒)", song.name, song.duration.as_millis());
//!
//!     let body = client
//!         .get_mobi_song_url(song.id, SongQuality::Lossless)
//!         .await
//!         .unwrap();
//!     println!("{body}");
//! };
//! ```

pub mod client;
pub mod crypto;
pub mod error;
pub mod model;
pub mod models;
pub mod session;

pub use crate::{
    client::{KuwoClient, SongQuality},
    error::{KuwoApiError, Result},
    model::{Album, Artist, Song},
    session::{Session, SessionCookie, SessionManager},
};
