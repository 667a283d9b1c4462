//! Classifier behavior against realistic sdkmanager output lines.

#![cfg(test)]

use sdkbridge::parser::{Classified, Phase, classify};

#[test]
/// What: Real listing header/divider furniture never classifies as rows
///
/// - Input: The exact header and divider shapes sdkmanager prints
/// - Output: Chatter for both, in both table phases
fn classify_listing_furniture_is_chatter() {
    for phase in [Phase::Installed, Phase::Available] {
        assert!(matches!(
            classify("  Path                 | Version | Description", phase),
            Classified::Chatter(_)
        ));
        assert!(matches!(
            classify("  -------              | ------- | -------", phase),
            Classified::Chatter(_)
        ));
    }
}

#[test]
/// What: Phase persists across unrelated lines until the next header
///
/// - Input: Rows classified with an explicitly threaded phase value
/// - Output: The same line splits as 4 fields outside Available and 3 inside
fn classify_field_count_follows_threaded_phase() {
    let four = "build-tools;29.0.2 | 29.0.2 | /sdk/build-tools | Android SDK Build-Tools";
    assert!(matches!(
        classify(four, Phase::Installed),
        Classified::Row { .. }
    ));
    // The same text inside the Available phase expects 3 fields and degrades.
    assert!(matches!(
        classify(four, Phase::Available),
        Classified::Chatter(_)
    ));

    let three = "build-tools;30.0.0 | 30.0.0 | Android SDK Build-Tools";
    assert!(matches!(
        classify(three, Phase::Available),
        Classified::Row { .. }
    ));
    assert!(matches!(
        classify(three, Phase::None),
        Classified::Chatter(_)
    ));
}

#[test]
/// What: Semicolon-flavored package ids survive splitting untouched
///
/// - Input: A row whose id carries the sdkmanager path;version syntax
/// - Output: Id and version fields preserved verbatim after trimming
fn classify_row_preserves_semicolon_ids() {
    let line = "  platforms;android-29 | 4 | /sdk/platforms/android-29 | Android SDK Platform 29";
    match classify(line, Phase::Installed) {
        Classified::Row { id, version, name } => {
            assert_eq!(id, "platforms;android-29");
            assert_eq!(version, "4");
            assert_eq!(name, "Android SDK Platform 29");
        }
        other => panic!("expected a row, got {other:?}"),
    }
}

#[test]
/// What: A line with both a bracket and a header keyword is tried as progress only
///
/// - Input: Bracketed line containing the word "Installed"
/// - Output: Chatter when the progress pattern fails; never a phase switch
fn classify_bracket_takes_priority_over_headers() {
    assert!(matches!(
        classify("[warn] Installed packages may be stale", Phase::None),
        Classified::Chatter(_)
    ));
    assert!(matches!(
        classify("[ 10% ] Installing platform-tools", Phase::None),
        Classified::Progress { percent: 10, .. }
    ));
}
