//! Deterministic identifiers for generated project files
//!
//! Visual Studio GUIDs are the MD5 of a seed string; Xcode object ids are the first
//! 24 hex digits of SHA-256 over `"{seed}_{counter}"`. Neither depends on process
//! randomness, so regenerating unchanged inputs yields identical files.

use sha2::{Digest, Sha256};

/// `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` in upper case.
pub fn vs_guid(seed: &str) -> String {
    let hex = format!("{:X}", md5::compute(seed.as_bytes()));
    format!(
        "{{{}-{}-{}-{}-{}}}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Solution folder GUID for one level of a group path.
pub fn folder_guid(folder: &str) -> String {
    vs_guid(&format!("Folder_{}", folder))
}

/// Sequential Xcode object ids for one project.
#[derive(Debug)]
pub struct XcodeIds {
    seed: String,
    counter: u32,
}

impl XcodeIds {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        let digest = Sha256::digest(format!("{}_{}", self.seed, self.counter).as_bytes());
        self.counter += 1;
        hex::encode(digest)[..24].to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vs_guid_shape_and_stability() {
        let guid = vs_guid("PlayerService");
        assert_eq!(guid.len(), 38);
        assert!(guid.starts_with('{') && guid.ends_with('}'));
        assert_eq!(guid.matches('-').count(), 4);
        assert_eq!(guid, vs_guid("PlayerService"));
        assert_ne!(guid, vs_guid("ChatService"));
        assert_eq!(guid, guid.to_uppercase());
    }

    #[test]
    fn test_vs_guid_is_md5_of_seed() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(vs_guid(""), "{D41D8CD9-8F00-B204-E980-0998ECF8427E}");
    }

    #[test]
    fn test_folder_guid_uses_prefixed_seed() {
        assert_eq!(folder_guid("Runtime"), vs_guid("Folder_Runtime"));
    }

    #[test]
    fn test_xcode_ids_are_sequential_and_reproducible() {
        let mut first = XcodeIds::new("Svc");
        let mut second = XcodeIds::new("Svc");
        let a: Vec<String> = (0..3).map(|_| first.next_id()).collect();
        let b: Vec<String> = (0..3).map(|_| second.next_id()).collect();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
        assert!(a.iter().all(|id| id.len() == 24));
        assert!(a
            .iter()
            .all(|id| id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())));
    }
}
