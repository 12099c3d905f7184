/// Byte transform used to obscure credential fields during the handshake.
///
/// The concrete algorithm is a site secret distributed with server access
/// codes; this crate defines only the capability and fails fast at session
/// construction when the handshake needs one and none was supplied.
/// Implementations must be symmetric: `decode(encode(x)) == x`.
pub trait Cipher: Send + Sync {
    /// Obscure a plaintext credential field for transmission.
    fn encode(&self, plaintext: &[u8]) -> Vec<u8>;

    /// Invert [`Cipher::encode`].
    fn decode(&self, ciphertext: &[u8]) -> Vec<u8>;
}

/// Involutive XOR transform standing in for a site cipher in tests.
#[cfg(test)]
pub(crate) struct XorCipher(pub u8);

#[cfg(test)]
impl Cipher for XorCipher {
    fn encode(&self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.iter().map(|b| b ^ self.0).collect()
    }

    fn decode(&self, ciphertext: &[u8]) -> Vec<u8> {
        self.encode(ciphertext)
    }
}
