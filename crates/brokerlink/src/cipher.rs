use brokerlink_session::Cipher;

/// Identity transform for servers that accept plaintext handshake fields.
///
/// The production obfuscation algorithm is distributed with site access
/// codes and is implemented by embedding applications; the CLI targets
/// development servers, which run with obfuscation disabled.
pub struct PassthroughCipher;

impl Cipher for PassthroughCipher {
    fn encode(&self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.to_vec()
    }

    fn decode(&self, ciphertext: &[u8]) -> Vec<u8> {
        ciphertext.to_vec()
    }
}
