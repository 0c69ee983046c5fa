use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Нормализует параметры пагинации: (limit, offset)
pub fn page_window(page: Option<i64>, size: Option<i64>) -> (i64, i64) {
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(0).max(0);
    (size, page * size)
}

/// Страница результатов с общим количеством
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: Option<i64>, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        Self {
            content,
            page: page.unwrap_or(0).max(0),
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (10, 0));
        assert_eq!(page_window(Some(2), Some(20)), (20, 40));
    }

    #[test]
    fn test_page_window_clamps() {
        assert_eq!(page_window(Some(-1), Some(1000)), (100, 0));
        assert_eq!(page_window(Some(0), Some(0)), (1, 0));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = PageResponse::new(vec![1, 2, 3], Some(0), 10, 21);
        assert_eq!(page.total_pages, 3);
        let empty: PageResponse<i32> = PageResponse::new(vec![], Some(0), 10, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
