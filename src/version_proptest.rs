//! Property-based tests for version parsing and overlay identity.
//!
//! These tests use proptest to generate random version tokens and verify
//! that ordering invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::overlay::Overlay;
    use crate::version::Version;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    /// Version tokens within the filename alphabet, PEP 440 or legacy.
    fn version_token() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}",
            "[0-9]{1,3}\\.[0-9]{1,3}(a|b|rc|c|alpha|beta|pre|preview)[0-9]{0,2}",
            "[0-9]{1,3}\\.[0-9]{1,3}(\\.post[0-9]{1,2})?(\\.dev[0-9]{1,2})?",
            "[0-9][0-9a-z.]{0,10}",
            "[0-9]{15,30}(\\.[0-9]{1,25})?",
        ]
    }

    // ============================================================================
    // Ordering properties
    // ============================================================================

    proptest! {
        /// Property: parsing any token from the filename alphabet succeeds
        #[test]
        fn parse_accepts_permitted_alphabet(token in prop_oneof![
            "[0-9][0-9a-z.]{0,40}",
            "[0-9]{15,30}(\\.[0-9]{1,25})?",
            "[0-9]{1,3}\\.[0-9]{1,3}(a|b|rc|post|dev)[0-9]{20,30}",
        ]) {
            prop_assert!(Version::parse(&token).is_ok(), "rejected '{}'", token);
        }

        /// Property: long numeric runs compare by value, like short ones
        #[test]
        fn long_numbers_compare_by_value(
            prefix in "[1-9][0-9]{19,29}",
            low in 0u8..9,
        ) {
            let lower = Version::parse(&format!("1.{prefix}{low}")).unwrap();
            let higher = Version::parse(&format!("1.{prefix}{}", low + 1)).unwrap();
            let padded = Version::parse(&format!("1.000{prefix}{low}")).unwrap();
            prop_assert!(lower < higher);
            prop_assert_eq!(lower, padded);
        }

        /// Property: a version compares equal to itself and round-trips its text
        #[test]
        fn parse_is_reflexive(token in version_token()) {
            let v = Version::parse(&token).unwrap();
            prop_assert_eq!(v.cmp(&v), Ordering::Equal);
            prop_assert_eq!(v.as_str(), token.as_str());
        }

        /// Property: comparison is antisymmetric
        #[test]
        fn ordering_is_antisymmetric(a in version_token(), b in version_token()) {
            let va = Version::parse(&a).unwrap();
            let vb = Version::parse(&b).unwrap();
            prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
            prop_assert_eq!(va == vb, va.cmp(&vb) == Ordering::Equal);
        }

        /// Property: comparison is transitive
        #[test]
        fn ordering_is_transitive(
            a in version_token(),
            b in version_token(),
            c in version_token(),
        ) {
            let mut versions = [
                Version::parse(&a).unwrap(),
                Version::parse(&b).unwrap(),
                Version::parse(&c).unwrap(),
            ];
            versions.sort();
            prop_assert!(versions[0] <= versions[1]);
            prop_assert!(versions[1] <= versions[2]);
            prop_assert!(versions[0] <= versions[2]);
        }

        /// Property: pre-release indices compare numerically
        #[test]
        fn prerelease_numbers_compare_numerically(
            major in 0u32..100,
            marker in "(a|b|rc)",
            low in 0u32..1000,
            delta in 1u32..1000,
        ) {
            let lower = Version::parse(&format!("{major}.0{marker}{low}")).unwrap();
            let higher = Version::parse(&format!("{major}.0{marker}{}", low + delta)).unwrap();
            prop_assert!(lower < higher);
        }

        /// Property: every pre-release sorts below its final release
        #[test]
        fn prerelease_precedes_release(
            major in 0u32..100,
            minor in 0u32..100,
            marker in "(a|b|c|rc|alpha|beta|pre|preview)",
            n in 0u32..100,
        ) {
            let pre = Version::parse(&format!("{major}.{minor}{marker}{n}")).unwrap();
            let release = Version::parse(&format!("{major}.{minor}")).unwrap();
            prop_assert!(pre.is_prerelease());
            prop_assert!(pre < release);
        }

        /// Property: trailing zero segments do not change a version
        #[test]
        fn trailing_zeros_are_insignificant(release in "[1-9][0-9]{0,2}(\\.[0-9]{1,2}){0,2}", zeros in 1usize..4) {
            let padded = format!("{release}{}", ".0".repeat(zeros));
            prop_assert_eq!(Version::parse(&release).unwrap(), Version::parse(&padded).unwrap());
        }
    }

    // ============================================================================
    // Overlay identity properties
    // ============================================================================

    proptest! {
        /// Property: name and version survive a filename round trip
        #[test]
        fn overlay_filename_round_trip(name in "[A-Za-z0-9]{1,16}", version in version_token()) {
            let filename = format!("overlay-{name}-{version}.sqfs");
            let overlay = Overlay::from_path(format!("/stash/{filename}")).unwrap();
            prop_assert_eq!(overlay.name(), name.as_str());
            prop_assert_eq!(overlay.version().as_str(), version.as_str());
            prop_assert_eq!(overlay.filename(), filename.as_str());
        }

        /// Property: overlays of different names are never ordered
        #[test]
        fn overlays_of_different_names_are_unordered(
            a in "[a-m]{1,8}",
            b in "[n-z]{1,8}",
            va in version_token(),
            vb in version_token(),
        ) {
            let x = Overlay::from_path(format!("overlay-{a}-{va}.sqfs")).unwrap();
            let y = Overlay::from_path(format!("overlay-{b}-{vb}.sqfs")).unwrap();
            prop_assert!(!x.is_less_than(Some(&y)));
            prop_assert!(!x.is_greater_than(Some(&y)));
            prop_assert!(!x.equals(Some(&y)));
        }
    }
}
