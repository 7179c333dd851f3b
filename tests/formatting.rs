//! End-to-end fixture tests: formatting, stability, and check coherence.

use prettyxml::{check, format, format_to_string, FormatOptions};
use rstest::rstest;

#[rstest]
#[case::nesting(
    include_str!("fixtures/test1.in.xml"),
    include_str!("fixtures/test1.out.xml")
)]
#[case::blank_lines(
    include_str!("fixtures/test2.in.xml"),
    include_str!("fixtures/test2.out.xml")
)]
#[case::prolog(
    include_str!("fixtures/test3.in.xml"),
    include_str!("fixtures/test3.out.xml")
)]
#[case::attribute_wrap(
    include_str!("fixtures/test4.in.xml"),
    include_str!("fixtures/test4.out.xml")
)]
#[case::inline_text(
    include_str!("fixtures/test5.in.xml"),
    include_str!("fixtures/test5.out.xml")
)]
#[case::entities(
    include_str!("fixtures/test6.in.xml"),
    include_str!("fixtures/test6.out.xml")
)]
#[case::deferred_empty_margin(
    include_str!("fixtures/test7.in.xml"),
    include_str!("fixtures/test7.out.xml")
)]
fn test_fixture(#[case] input: &str, #[case] expected: &str) {
    let options = FormatOptions::default();

    // formatting produces the expected text
    assert_eq!(format_to_string(input, &options).unwrap(), expected);

    // formatted output is a fixed point
    assert_eq!(format_to_string(expected, &options).unwrap(), expected);

    // check agrees on both sides
    assert!(check(expected, &options).unwrap());
    if input != expected {
        assert!(!check(input, &options).unwrap());
    }
}

#[rstest]
#[case(include_str!("fixtures/test1.in.xml"))]
#[case(include_str!("fixtures/test2.in.xml"))]
#[case(include_str!("fixtures/test3.in.xml"))]
#[case(include_str!("fixtures/test4.in.xml"))]
#[case(include_str!("fixtures/test5.in.xml"))]
#[case(include_str!("fixtures/test6.in.xml"))]
#[case(include_str!("fixtures/test7.in.xml"))]
fn test_format_writes_through_io(#[case] input: &str) {
    let options = FormatOptions::default();

    let mut out = Vec::new();
    format(input, &mut out, &options).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format_to_string(input, &options).unwrap()
    );
}
