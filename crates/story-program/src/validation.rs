//! Field checks shared by root and branch creation.
//!
//! Lengths are measured in UTF-8 bytes, matching the account layout.

use story_crypto::verify_title_seed;

use crate::error::StoryError;
use crate::instruction::NodeArgs;

/// Longest accepted title, in bytes.
pub const MAX_TITLE_LEN: usize = 64;

/// Longest accepted content or image URI, in bytes.
pub const MAX_URI_LEN: usize = 200;

/// Run the field checks in their fixed order; the first failure wins.
pub fn validate_node_args(args: &NodeArgs) -> Result<(), StoryError> {
    if !verify_title_seed(&args.title, &args.title_seed) {
        return Err(StoryError::InvalidTitleSeed);
    }
    if args.title.is_empty() || args.title.len() > MAX_TITLE_LEN {
        return Err(StoryError::TitleTooLong);
    }
    if args.content_uri.is_empty() {
        return Err(StoryError::EmptyUri);
    }
    if args.content_uri.len() > MAX_URI_LEN || args.image_uri.len() > MAX_URI_LEN {
        return Err(StoryError::UriTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use story_types::TitleSeed;

    fn args(title: &str, content: &str, image: &str) -> NodeArgs {
        NodeArgs::new(title, content, image)
    }

    #[test]
    fn accepts_well_formed_args() {
        assert_eq!(validate_node_args(&args("The Dark Forest", "arweave://x", "")), Ok(()));
    }

    #[test]
    fn seed_mismatch_wins_over_every_other_failure() {
        let mut bad = args("", "", &"i".repeat(300));
        bad.title_seed = TitleSeed::new([9; 32]);
        assert_eq!(validate_node_args(&bad), Err(StoryError::InvalidTitleSeed));
    }

    #[test]
    fn empty_title_reports_title_too_long() {
        assert_eq!(
            validate_node_args(&args("", "ipfs://x", "")),
            Err(StoryError::TitleTooLong)
        );
    }

    #[test]
    fn title_checked_before_uris() {
        assert_eq!(
            validate_node_args(&args(&"t".repeat(65), "", "")),
            Err(StoryError::TitleTooLong)
        );
    }

    #[test]
    fn empty_content_checked_before_long_image() {
        assert_eq!(
            validate_node_args(&args("t", "", &"i".repeat(201))),
            Err(StoryError::EmptyUri)
        );
    }

    #[test]
    fn uri_bounds() {
        let at_limit = "u".repeat(MAX_URI_LEN);
        let over = "u".repeat(MAX_URI_LEN + 1);
        assert_eq!(validate_node_args(&args("t", &at_limit, &at_limit)), Ok(()));
        assert_eq!(
            validate_node_args(&args("t", &over, "")),
            Err(StoryError::UriTooLong)
        );
        assert_eq!(
            validate_node_args(&args("t", "c", &over)),
            Err(StoryError::UriTooLong)
        );
    }

    #[test]
    fn title_length_counts_bytes() {
        // 16 four-byte scalars = 64 bytes; one more pushes it over.
        let ok = "\u{1F332}".repeat(16);
        let over = "\u{1F332}".repeat(17);
        assert_eq!(validate_node_args(&args(&ok, "c", "")), Ok(()));
        assert_eq!(
            validate_node_args(&args(&over, "c", "")),
            Err(StoryError::TitleTooLong)
        );
    }

    proptest! {
        #[test]
        fn title_bound_is_exact(len in 1usize..=80) {
            let title = "a".repeat(len);
            let result = validate_node_args(&args(&title, "c", ""));
            if len <= MAX_TITLE_LEN {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(StoryError::TitleTooLong));
            }
        }

        #[test]
        fn foreign_seed_always_rejected(title in "[a-z ]{1,64}", seed in any::<[u8; 32]>()) {
            let mut a = args(&title, "c", "");
            prop_assume!(seed != *a.title_seed.as_bytes());
            a.title_seed = TitleSeed::new(seed);
            prop_assert_eq!(validate_node_args(&a), Err(StoryError::InvalidTitleSeed));
        }
    }
}
