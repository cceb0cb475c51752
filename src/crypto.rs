//! 本模块实现酷我移动网关 (`mobi.kuwo.cn`) 要求的查询参数编码。
//!
//! 编码方式为固定密钥的 DES-ECB 加零填充，再做标准 Base64，
//! 是服务端公开约定的对称变换。本实现仅用于构造移动网关请求，
//! 不应用于实际安全目的。

use base64::{Engine, prelude::BASE64_STANDARD};
use block_padding::ZeroPadding;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, generic_array::GenericArray};
use des::Des;
use ecb::{Decryptor as EcbModeDecryptor, Encryptor as EcbModeEncryptor};

use crate::error::{KuwoApiError, Result};

/// 服务端约定的固定 DES 密钥。
const SECRET_KEY: &[u8; 8] = b"ylzsxkwm";

const DES_BLOCK_SIZE: usize = 8;

/// 加密明文参数串，返回可以直接拼进 URL 查询的 Base64 令牌。
///
/// 纯函数：相同输入总是产生相同输出，无任何共享状态。
pub fn encrypt_base64(plaintext: &str) -> Result<String> {
    let key_ga = GenericArray::from_slice(SECRET_KEY);
    let cipher = EcbModeEncryptor::<Des>::new(key_ga);

    let msg_len = plaintext.len();
    let padded_len = msg_len.div_ceil(DES_BLOCK_SIZE) * DES_BLOCK_SIZE;
    let mut buffer = plaintext.as_bytes().to_vec();
    buffer.resize(padded_len, 0);

    let ciphertext = cipher
        .encrypt_padded_mut::<ZeroPadding>(&mut buffer, msg_len)
        .map_err(|e| KuwoApiError::Encryption(format!("DES ECB 加密失败: {e:?}")))?;

    Ok(BASE64_STANDARD.encode(ciphertext))
}

/// 解密 [`encrypt_base64`] 产生的令牌，返回原始参数串。
///
/// 解密后会剥除零填充，因此明文末尾不能是 NUL 字节；
/// 接口参数串均为 ASCII，天然满足该约束。
pub fn decrypt_base64(token: &str) -> Result<String> {
    let mut buffer = BASE64_STANDARD.decode(token)?;
    if !buffer.len().is_multiple_of(DES_BLOCK_SIZE) {
        return Err(KuwoApiError::Decryption(format!(
            "密文长度不是 {DES_BLOCK_SIZE} 的倍数"
        )));
    }

    let key_ga = GenericArray::from_slice(SECRET_KEY);
    let cipher = EcbModeDecryptor::<Des>::new(key_ga);

    let plaintext = cipher
        .decrypt_padded_mut::<ZeroPadding>(&mut buffer)
        .map_err(|e| KuwoApiError::Decryption(format!("DES ECB 解密失败: {e:?}")))?;

    String::from_utf8(plaintext.to_vec())
        .map_err(|e| KuwoApiError::Decryption(format!("UTF-8 编码转换失败: {e}")))
}
