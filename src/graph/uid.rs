//! Deterministic synthetic identifiers.

use std::fmt::Display;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Derive a stable identifier from an ordered list of parameters.
///
/// The parameters are stringified, joined with `-` and hashed. The first
/// 16 bytes of the digest are formatted in the 8-4-4-4-12 hyphenated
/// shape. Equal parameter lists always give the same identifier, across
/// runs and processes.
pub fn to_uid(params: &[&dyn Display]) -> String {
    let input = params
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("-");

    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);

    Uuid::from_bytes(bytes).hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_is_deterministic() {
        let a = to_uid(&[&"prod", &"shop", &"ConfigMap", &"settings"]);
        let b = to_uid(&[&"prod", &"shop", &"ConfigMap", &"settings"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_uid_shape() {
        let uid = to_uid(&[&"x"]);
        let groups: Vec<usize> = uid.split('-').map(str::len).collect();
        assert_eq!(groups, vec![8, 4, 4, 4, 12]);
        assert!(uid.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_uid_depends_on_order() {
        let a = to_uid(&[&"a", &"b"]);
        let b = to_uid(&[&"b", &"a"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_uid_mixed_parameter_types() {
        let a = to_uid(&[&"Node", &42u32, &true]);
        let b = to_uid(&[&"Node", &"42", &"true"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_uid_known_value_is_stable() {
        // Pinned so an accidental change to the hashing scheme shows up here.
        let expected = {
            let digest = Sha256::digest(b"a-b");
            let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
            format!(
                "{}-{}-{}-{}-{}",
                &hex[..8],
                &hex[8..12],
                &hex[12..16],
                &hex[16..20],
                &hex[20..]
            )
        };
        assert_eq!(to_uid(&[&"a", &"b"]), expected);
    }
}
