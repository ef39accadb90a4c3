//! Key derivation using HKDF

use encrypten_core::{EncryptenError, EncryptenResult};
use hkdf::Hkdf;
use sha2::Sha256;

/// Derive a key using HKDF-SHA256
pub fn derive_key(
    input_key_material: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output_length: usize,
) -> EncryptenResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(salt, input_key_material);
    let mut output = vec![0u8; output_length];

    hk.expand(info, &mut output)
        .map_err(|e| EncryptenError::KeyDerivationFailed(e.to_string()))?;

    Ok(output)
}

/// Derive a 32-byte key
pub fn derive_key_32(
    input_key_material: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
) -> EncryptenResult<[u8; 32]> {
    let key = derive_key(input_key_material, salt, info, 32)?;
    let mut result = [0u8; 32];
    result.copy_from_slice(&key);
    Ok(result)
}
