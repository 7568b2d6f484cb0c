//! Built-in sample images and provenance labels.

/// Label for images picked from [`SAMPLE_IMAGES`].
pub const SAMPLE_GALLERY: &str = "Sample Gallery";

/// Label for URLs pasted by the user.
pub const DIRECT_LINK: &str = "Direct Link";

/// Sample images that are known to allow direct fetching.
pub const SAMPLE_IMAGES: [&str; 3] = [
    "https://images.unsplash.com/photo-1506744038136-46273834b3fb?w=800&q=80",
    "https://images.unsplash.com/photo-1472214103451-9374bd1c798e?w=800&q=80",
    "https://images.unsplash.com/photo-1579783902614-a3fb3927b6a5?w=800&q=80",
];

/// Returns sample `n` (zero-based), if it exists.
pub fn sample(n: usize) -> Option<&'static str> {
    SAMPLE_IMAGES.get(n).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_policy;

    #[test]
    fn test_samples_pass_url_policy() {
        for url in SAMPLE_IMAGES {
            assert!(url_policy::check(url).is_ok(), "{url}");
        }
    }

    #[test]
    fn test_sample_lookup() {
        assert_eq!(sample(0), Some(SAMPLE_IMAGES[0]));
        assert_eq!(sample(3), None);
    }
}
