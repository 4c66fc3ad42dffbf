//! Property-based tests for request building
//!
//! These tests verify invariants that should hold for all inputs to the
//! aspect ratio resolver and the multipart assembler.

use mediarelay_core::http::builder::{nearest_aspect_ratio, ASPECT_RATIOS};
use mediarelay_core::http::{FilePart, MultipartBuilder};
use proptest::prelude::*;

fn catalog_labels() -> Vec<&'static str> {
    ASPECT_RATIOS.iter().map(|(label, _)| *label).collect()
}

/// Strategy for multipart text fields
fn field_strategy() -> impl Strategy<Value = (String, String)> {
    ("[a-z_]{1,12}", "[a-zA-Z0-9 .,!?]{0,64}")
}

proptest! {
    #[test]
    fn prop_any_dimensions_map_into_catalog(width in -10_000i64..20_000, height in -10_000i64..20_000) {
        let label = nearest_aspect_ratio(width, height);
        prop_assert!(catalog_labels().contains(&label));
    }

    #[test]
    fn prop_exact_catalog_multiples_resolve_to_themselves(scale in 1i64..500, index in 0usize..ASPECT_RATIOS.len()) {
        let (label, _) = ASPECT_RATIOS[index];
        let (w, h) = label.split_once(':').unwrap();
        let width = w.parse::<i64>().unwrap() * scale;
        let height = h.parse::<i64>().unwrap() * scale;
        prop_assert_eq!(nearest_aspect_ratio(width, height), label);
    }

    #[test]
    fn prop_multipart_length_is_exact(
        fields in proptest::collection::vec(field_strategy(), 0..6),
        data in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let body = MultipartBuilder::new()
            .texts(fields.clone())
            .attachment(FilePart {
                field_name: "source".to_string(),
                file_name: "upload.bin".to_string(),
                content_type: "application/octet-stream".to_string(),
                data,
            })
            .build()
            .unwrap();

        prop_assert_eq!(body.content_length(), body.as_bytes().len() as u64);

        let opener = format!("--{}\r\n", body.boundary());
        let count = body
            .as_bytes()
            .windows(opener.len())
            .filter(|w| *w == opener.as_bytes())
            .count();
        // one opener per text field plus the attachment
        prop_assert!(count >= fields.len() + 1);
        let closer = format!("--{}--\r\n", body.boundary());
        prop_assert!(body.as_bytes().ends_with(closer.as_bytes()));
    }
}
