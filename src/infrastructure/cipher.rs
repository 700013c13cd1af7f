//! 登录凭据加密
//!
//! 手机号和密码在提交前需要用 AES-128-CBC 加密（密钥与 IV 相同，PKCS#7 填充），
//! 再做 base64 编码。

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// 平台登录页使用的固定密钥
pub const DEFAULT_KEY: &[u8; 16] = b"u2oh6Vu^HWe4_AES";

/// 凭据加密器
#[derive(Clone)]
pub struct CredentialCipher {
    key: [u8; 16],
}

impl CredentialCipher {
    /// 使用指定密钥创建
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    /// 加密并编码为 base64
    pub fn encrypt(&self, message: &str) -> String {
        let encrypted = Aes128CbcEnc::new(&self.key.into(), &self.key.into())
            .encrypt_padded_vec_mut::<Pkcs7>(message.as_bytes());
        STANDARD.encode(encrypted)
    }

    /// 解码并解密，失败返回 None
    pub fn decrypt(&self, encoded: &str) -> Option<String> {
        let bytes = STANDARD.decode(encoded).ok()?;
        let decrypted = Aes128CbcDec::new(&self.key.into(), &self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .ok()?;
        String::from_utf8(decrypted).ok()
    }
}

impl Default for CredentialCipher {
    fn default() -> Self {
        Self::new(*DEFAULT_KEY)
    }
}
