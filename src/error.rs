//! 定义了整个 `kuwo-api` 库的错误类型 `KuwoApiError`。

use thiserror::Error;

/// `kuwo-api` 库的通用错误枚举。
///
/// 所有失败都以带类型的错误直接上抛，库内部不做任何自动重试。
#[derive(Error, Debug)]
pub enum KuwoApiError {
    /// 会话握手没有返回预期的反伪造令牌
    #[error("会话握手失败: {0}")]
    Auth(String),

    /// 在第一次成功握手之前使用了会话访问器
    #[error("会话尚未初始化")]
    NotInitialized,

    /// 接口返回了无法按 JSON 解析的响应体
    #[error("接口 `{endpoint}` 返回了无法解析的响应: {source}")]
    Protocol {
        /// 产生该响应的接口路径
        endpoint: &'static str,
        /// 底层 JSON 解析错误
        #[source]
        source: serde_json::Error,
    },

    /// 服务端记录缺少必需字段
    #[error("`{entity}` 记录缺少必需字段 {missing:?}")]
    Validation {
        /// 正在构造的实体类型，例如 `"song"`
        entity: &'static str,
        /// 缺失的全部字段名
        missing: Vec<&'static str>,
    },

    /// 接口外壳返回了非 200 的业务状态码，或成功码下缺少负载
    #[error("接口 `{endpoint}` 返回了错误码 {code}")]
    Api {
        /// 产生该响应的接口路径
        endpoint: &'static str,
        /// 服务端下发的业务状态码
        code: i64,
    },

    /// 请求超过固定的单次超时时间
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 其余的网络传输失败
    #[error("网络请求失败: {0}")]
    Network(#[source] reqwest::Error),

    /// 加密失败
    #[error("加密失败: {0}")]
    Encryption(String),

    /// 解密失败
    #[error("解密失败: {0}")]
    Decryption(String),

    /// Base64 解码失败 (源自 `base64::DecodeError`)
    #[error("Base64 解码失败: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// 无法把会话状态放入请求头
    #[error("无法构造请求头: {0}")]
    Header(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// `KuwoApiError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, KuwoApiError>;

impl From<reqwest::Error> for KuwoApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}
