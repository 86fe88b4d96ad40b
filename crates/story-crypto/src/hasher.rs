use sha2::{Digest, Sha256};
use story_types::TitleSeed;

/// Eight-byte type tag prefixed to account data and instruction data.
pub type Discriminator = [u8; 8];

/// SHA-256 of the title's UTF-8 bytes.
///
/// This is the only well-formed `title_seed` argument for a node with the
/// given title.
pub fn title_seed(title: &str) -> TitleSeed {
    TitleSeed::new(Sha256::digest(title.as_bytes()).into())
}

/// Check that `seed` is the SHA-256 digest of `title`.
pub fn verify_title_seed(title: &str, seed: &TitleSeed) -> bool {
    title_seed(title) == *seed
}

/// Discriminator for an account type: `SHA-256("account:<Name>")[..8]`.
pub fn account_discriminator(type_name: &str) -> Discriminator {
    prefixed_discriminator("account", type_name)
}

/// Discriminator for an instruction: `SHA-256("global:<name>")[..8]`.
pub fn instruction_discriminator(name: &str) -> Discriminator {
    prefixed_discriminator("global", name)
}

fn prefixed_discriminator(namespace: &str, name: &str) -> Discriminator {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_seed_is_sha256() {
        let seed = title_seed("The Dark Forest");
        assert_eq!(
            seed.to_hex(),
            "68a332f6592b9e05286dcd25cf1a350dc788b5b9aced66989ec495d51ba569dd"
        );
    }

    #[test]
    fn empty_title_hashes_to_empty_digest() {
        assert_eq!(
            title_seed("").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_detects_mismatch() {
        let seed = title_seed("Take the left path");
        assert!(verify_title_seed("Take the left path", &seed));
        assert!(!verify_title_seed("Take the right path", &seed));
    }

    #[test]
    fn story_node_account_discriminator() {
        assert_eq!(
            account_discriminator("StoryNode"),
            [81, 76, 245, 170, 43, 108, 134, 24]
        );
    }

    #[test]
    fn instruction_discriminators() {
        assert_eq!(
            instruction_discriminator("create_root"),
            [115, 195, 96, 208, 249, 205, 56, 27]
        );
        assert_eq!(
            instruction_discriminator("create_branch"),
            [78, 225, 107, 25, 194, 2, 140, 244]
        );
    }
}
