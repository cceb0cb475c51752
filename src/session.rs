//! 会话管理：通过一次握手获取反伪造令牌 (`kw_token`) 与配套 Cookie。
//!
//! 会话只有两个状态：未初始化 → 已激活，没有自动续期。握手有成本
//! 且存在限流风险，因此令牌与 Cookie 在进程内只获取一次，所有
//! 鉴权请求共享同一份会话状态。

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{KuwoApiError, Result};

/// 握手地址。服务端会在响应的 `Set-Cookie` 中带回 `kw_token`。
const HANDSHAKE_URL: &str = "http://kuwo.cn/search/list?key=hello";

/// 反伪造令牌所在的 Cookie 名。
const TOKEN_COOKIE: &str = "kw_token";

/// 握手响应带回的单个 Cookie。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie 名。
    pub name: String,
    /// Cookie 值。
    pub value: String,
    /// Cookie 的作用域域名；服务端未指定时为 `None`。
    pub domain: Option<String>,
}

/// 一次握手得到的完整会话状态，获取后不可变。
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    cookies: Vec<SessionCookie>,
}

impl Session {
    /// 反伪造令牌，随每个鉴权请求放入 `csrf` 请求头。
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 握手响应带回的全部 Cookie。
    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// 构造 `Cookie` 请求头的值。
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// 管理会话的生命周期。
///
/// 内部使用 [`OnceCell`] 做一次性初始化：即使多个调用方并发触发
/// 握手，请求也只会发出一次，所有调用方观察到同一份令牌，不会
/// 出现两份会话，也不会读到写了一半的令牌状态。
#[derive(Debug, Default)]
pub struct SessionManager {
    cell: OnceCell<Session>,
}

impl SessionManager {
    /// 创建一个尚未初始化的管理器。
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 返回已激活的会话；必要时先执行一次握手。
    ///
    /// 握手失败（网络错误或响应中没有 `kw_token`）时错误直接上抛，
    /// 不做内部重试；此时管理器仍处于未初始化状态，后续调用可以
    /// 再次尝试握手。
    pub async fn ensure(&self, http_client: &Client) -> Result<&Session> {
        self.cell.get_or_try_init(|| acquire(http_client)).await
    }

    /// 读取反伪造令牌。
    ///
    /// 在第一次成功握手之前返回 [`KuwoApiError::NotInitialized`]。
    pub fn token(&self) -> Result<&str> {
        self.session().map(Session::token)
    }

    /// 读取握手得到的 Cookie 集合。
    ///
    /// 在第一次成功握手之前返回 [`KuwoApiError::NotInitialized`]。
    pub fn cookies(&self) -> Result<&[SessionCookie]> {
        self.session().map(Session::cookies)
    }

    /// 读取完整会话。
    ///
    /// 在第一次成功握手之前返回 [`KuwoApiError::NotInitialized`]。
    pub fn session(&self) -> Result<&Session> {
        self.cell.get().ok_or(KuwoApiError::NotInitialized)
    }
}

/// 执行握手 GET 并提取令牌与 Cookie。
async fn acquire(http_client: &Client) -> Result<Session> {
    let response = http_client.get(HANDSHAKE_URL).send().await?;

    let cookies: Vec<SessionCookie> = response
        .cookies()
        .map(|c| SessionCookie {
            name: c.name().to_string(),
            value: c.value().to_string(),
            domain: c.domain().map(str::to_string),
        })
        .collect();

    let token = cookies
        .iter()
        .find(|c| c.name == TOKEN_COOKIE)
        .map(|c| c.value.clone())
        .ok_or_else(|| KuwoApiError::Auth(format!("握手响应中没有 `{TOKEN_COOKIE}` Cookie")))?;

    info!("会话握手完成，共获得 {} 个 Cookie", cookies.len());

    Ok(Session { token, cookies })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_accessors_fail_before_handshake() {
        let manager = SessionManager::new();

        assert!(matches!(
            manager.token(),
            Err(KuwoApiError::NotInitialized)
        ));
        assert!(matches!(
            manager.cookies(),
            Err(KuwoApiError::NotInitialized)
        ));
        assert!(matches!(
            manager.session(),
            Err(KuwoApiError::NotInitialized)
        ));
    }

    #[test]
    fn test_cookie_header() {
        let session = Session {
            token: "abc".to_string(),
            cookies: vec![
                SessionCookie {
                    name: "kw_token".to_string(),
                    value: "abc".to_string(),
                    domain: Some("kuwo.cn".to_string()),
                },
                SessionCookie {
                    name: "Hm_lvt".to_string(),
                    value: "1".to_string(),
                    domain: None,
                },
            ],
        };

        assert_eq!(session.cookie_header(), "kw_token=abc; Hm_lvt=1");
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_ensure_runs_exactly_one_handshake() {
        let manager = Arc::new(SessionManager::new());
        let http_client = reqwest::Client::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let http_client = http_client.clone();
                tokio::spawn(async move {
                    manager
                        .ensure(&http_client)
                        .await
                        .map(|s| s.token().to_string())
                })
            })
            .collect();

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap());
        }

        // 所有并发调用方必须观察到同一个令牌
        assert!(tokens.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(manager.token().unwrap(), tokens[0]);
    }
}
