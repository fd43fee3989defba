use std::collections::HashSet;

use crate::models::email::{Category, Email};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Above this many pages the page strip collapses with ellipses.
const MAX_VISIBLE_PAGES: usize = 5;

/// Search, category filter and page selection over the email history.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub search: String,
    pub categories: HashSet<Category>,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            categories: HashSet::new(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl HistoryQuery {
    pub fn has_filters(&self) -> bool {
        !self.search.trim().is_empty() || !self.categories.is_empty()
    }

    /// Toggling a category goes back to the first page.
    pub fn toggle_category(&mut self, category: Category) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
        self.page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.categories.clear();
        self.page = 1;
    }

    fn matches(&self, email: &Email) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || email.subject.to_lowercase().contains(&needle)
            || email.sender.to_lowercase().contains(&needle);

        let category_ok = self.categories.is_empty()
            || email
                .category()
                .is_some_and(|category| self.categories.contains(&category));

        search_ok && category_ok
    }
}

/// One page of filtered history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage<'a> {
    pub emails: Vec<&'a Email>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Filter `emails` and cut out the requested page. Out-of-range pages are
/// clamped to the last one.
pub fn paginate<'a>(emails: &'a [Email], query: &HistoryQuery) -> HistoryPage<'a> {
    let per_page = query.per_page.max(1);
    let matching: Vec<&Email> = emails.iter().filter(|email| query.matches(email)).collect();
    let total = matching.len();
    let total_pages = total.div_ceil(per_page);
    let page = query.page.clamp(1, total_pages.max(1));

    let emails = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    HistoryPage {
        emails,
        total,
        page,
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: usize, active: bool },
    Ellipsis,
}

/// Page strip: every page when there are few, otherwise first, a window
/// around the current page, and last, with ellipses for the gaps.
pub fn page_items(current: usize, total_pages: usize) -> Vec<PageItem> {
    let page = |number: usize| PageItem::Page {
        number,
        active: number == current,
    };

    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(page).collect();
    }

    let mut items = vec![page(1)];
    if current > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total_pages - 1);
    items.extend((start..=end).map(page));

    if current + 2 < total_pages {
        items.push(PageItem::Ellipsis);
    }
    items.push(page(total_pages));
    items
}
