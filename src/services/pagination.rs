//! Page requests and the page envelope returned by catalog listings

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Zero-based page number and page size, already normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Lenient parsing of raw query values.
    ///
    /// Missing, unparsable or negative pages become 0. Missing, unparsable or
    /// non-positive sizes become the default; sizes above the cap are clamped.
    pub fn parse(page: Option<&str>, size: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 0)
            .unwrap_or(0);
        let size = size
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s > 0)
            .map(|s| s.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: i64,
    pub page_size: i64,
    pub offset: i64,
}

/// Page envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub pageable: Pageable,
    pub total_pages: i64,
    pub total_elements: i64,
    pub last: bool,
    pub size: i64,
    pub number: i64,
    pub number_of_elements: i64,
    pub first: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + request.size - 1) / request.size
        };
        let number_of_elements = content.len() as i64;

        Self {
            pageable: Pageable {
                page_number: request.page,
                page_size: request.size,
                offset: request.offset(),
            },
            total_pages,
            total_elements,
            last: request.page >= total_pages - 1,
            size: request.size,
            number: request.page,
            number_of_elements,
            first: request.page == 0,
            empty: content.is_empty(),
            content,
        }
    }

    /// Transform the items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            total_pages: self.total_pages,
            total_elements: self.total_elements,
            last: self.last,
            size: self.size,
            number: self.number,
            number_of_elements: self.number_of_elements,
            first: self.first,
            empty: self.empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_defaults_and_clamping() {
        assert_eq!(PageRequest::parse(None, None), PageRequest { page: 0, size: 10 });
        assert_eq!(PageRequest::parse(Some("2"), Some("5")), PageRequest { page: 2, size: 5 });
        assert_eq!(PageRequest::parse(Some("-1"), Some("0")), PageRequest { page: 0, size: 10 });
        assert_eq!(PageRequest::parse(Some("abc"), Some("-3")), PageRequest { page: 0, size: 10 });
        assert_eq!(PageRequest::parse(Some("0"), Some("5000")), PageRequest { page: 0, size: 100 });
        assert_eq!(PageRequest { page: 3, size: 7 }.offset(), 21);
    }

    #[test]
    fn test_envelope_fields() {
        let page = Page::new(vec![1, 2], PageRequest { page: 1, size: 2 }, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number_of_elements, 2);
        assert!(!page.first);
        assert!(!page.last);
        assert!(!page.empty);
        assert_eq!(page.pageable.offset, 2);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 5);
        assert_eq!(json["pageable"]["pageNumber"], 1);
        assert_eq!(json["numberOfElements"], 2);
    }

    #[test]
    fn test_empty_result() {
        let page: Page<i32> = Page::new(Vec::new(), PageRequest::default(), 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
        assert!(page.empty);
    }

    #[test]
    fn test_invariants_hold_for_any_page_and_size() {
        for total in [0_i64, 1, 7, 10, 23] {
            for size in 1..=12 {
                for page in 0..6 {
                    let request = PageRequest { page, size };
                    let start = request.offset().min(total);
                    let end = (request.offset() + size).min(total);
                    let items: Vec<i64> = (start..end).collect();
                    let envelope = Page::new(items, request, total);

                    assert!(envelope.number_of_elements <= envelope.size);
                    assert_eq!(envelope.first, page == 0);
                    assert_eq!(envelope.last, page >= envelope.total_pages - 1);
                    assert_eq!(envelope.total_pages, (total + size - 1) / size);
                }
            }
        }
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], PageRequest { page: 0, size: 3 }, 9);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.content, vec![10, 20, 30]);
        assert_eq!(mapped.total_pages, 3);
        assert!(mapped.first);
    }
}
