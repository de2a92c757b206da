use rstest::rstest;

use super::*;

#[test]
fn default_request_is_first_page_of_fifty() {
    let request = PageRequest::default();
    assert_eq!(request, PageRequest::new(1, 50));
    assert_eq!(request.offset(), 0);
}

#[rstest]
#[case(0, 0, 1, 1)]
#[case(3, 20, 3, 20)]
#[case(1, 10_000, 1, MAX_PER_PAGE)]
fn new_clamps_page_and_size(
    #[case] page: u32,
    #[case] per_page: u32,
    #[case] expected_page: u32,
    #[case] expected_size: u32,
) {
    let request = PageRequest::new(page, per_page);
    assert_eq!(request.page, expected_page);
    assert_eq!(request.per_page, expected_size);
}

#[test]
fn offset_walks_forward_with_next() {
    let first = PageRequest::first(25);
    let third = first.next().next();
    assert_eq!(first.offset(), 0);
    assert_eq!(third.page, 3);
    assert_eq!(third.offset(), 50);
    assert_eq!(third.limit(), 25);
}

#[test]
fn offset_does_not_overflow_on_large_pages() {
    let request = PageRequest::new(u32::MAX, MAX_PER_PAGE);
    assert_eq!(
        request.offset(),
        u64::from(u32::MAX - 1) * u64::from(MAX_PER_PAGE)
    );
}

#[rstest]
#[case(0, 1)]
#[case(3, 1)]
#[case(20, 2)]
#[case(25, 3)]
fn total_pages_rounds_up(#[case] total: u64, #[case] pages: u32) {
    let response: PageResponse<u32> = PageResponse::new(vec![], &PageRequest::first(10), total);
    assert_eq!(response.meta.total_pages, pages);
}

#[test]
fn has_more_until_last_page() {
    let request = PageRequest::first(10);
    let first: PageResponse<u32> = PageResponse::new(vec![], &request, 15);
    let last: PageResponse<u32> = PageResponse::new(vec![], &request.next(), 15);
    assert!(first.meta.has_more());
    assert!(!last.meta.has_more());
}

#[test]
fn map_keeps_position() {
    let response = PageResponse::new(vec![1, 2, 3], &PageRequest::new(2, 3), 9);
    let mapped = response.map(|n| n * 10);
    assert_eq!(mapped.data, vec![10, 20, 30]);
    assert_eq!(mapped.meta.page, 2);
    assert_eq!(mapped.meta.total, 9);
}

#[test]
fn deserializes_with_defaults_and_clamps() {
    let request: PageRequest = serde_json::from_str(r#"{"per_page": 9000}"#).unwrap();
    assert_eq!(request, PageRequest::new(1, MAX_PER_PAGE));

    let request: PageRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(request, PageRequest::default());
}
