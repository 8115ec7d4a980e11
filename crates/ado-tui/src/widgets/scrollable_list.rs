//! Generic scrollable list with a text filter.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub filtered_indices: Vec<usize>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub filter: String,
    filter_fn: Box<dyn Fn(&T, &str) -> bool + Send + Sync>,
}

impl<T> ScrollableList<T> {
    pub fn new(filter_fn: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            items: Vec::new(),
            filtered_indices: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            filter: String::new(),
            filter_fn: Box::new(filter_fn),
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.rebuild_filter();
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
        let old_idx = self.filtered_indices.get(self.selected).copied();
        self.rebuild_filter();
        self.selected = old_idx
            .and_then(|prev| self.filtered_indices.iter().position(|&i| i == prev))
            .unwrap_or(0);
        self.scroll_offset = 0;
    }

    fn rebuild_filter(&mut self) {
        self.filtered_indices = if self.filter.is_empty() {
            (0..self.items.len()).collect()
        } else {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, item)| (self.filter_fn)(item, &self.filter))
                .map(|(i, _)| i)
                .collect()
        };
        if self.selected >= self.filtered_indices.len() {
            self.selected = self.filtered_indices.len().saturating_sub(1);
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.filtered_indices.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.filtered_indices.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.filtered_indices.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        let idx = self.filtered_indices.get(self.selected)?;
        self.items.get(*idx)
    }

    /// `(is_selected, &item)` pairs visible in `height` rows.
    /// Call `ensure_visible` first to update `scroll_offset`.
    pub fn visible_items(&self, height: usize) -> Vec<(bool, &T)> {
        if height == 0 || self.filtered_indices.is_empty() {
            return Vec::new();
        }
        let end = (self.scroll_offset + height).min(self.filtered_indices.len());
        (self.scroll_offset..end)
            .map(|pos| (pos == self.selected, &self.items[self.filtered_indices[pos]]))
            .collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// Select the row clicked at `row` of the rendered area.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.filtered_indices.len() {
            self.selected = target;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.filtered_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_indices.is_empty()
    }

    /// Move the selection to the first visible item matching `pred`.
    pub fn select_where(&mut self, pred: impl Fn(&T) -> bool) -> bool {
        match self.filtered_indices.iter().position(|&i| pred(&self.items[i])) {
            Some(pos) => {
                self.selected = pos;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> ScrollableList<String> {
        let mut l = ScrollableList::new(|s: &String, q: &str| s.to_lowercase().contains(&q.to_lowercase()));
        l.set_items(items.iter().map(|s| s.to_string()).collect());
        l
    }

    #[test]
    fn test_filter_keeps_selected_item() {
        let mut l = list(&["Blue Moon", "Red Sky", "Blue Hour"]);
        l.select_last();
        l.set_filter("blue");
        assert_eq!(l.len(), 2);
        assert_eq!(l.selected_item().map(String::as_str), Some("Blue Hour"));

        l.set_filter("sky");
        assert_eq!(l.selected_item().map(String::as_str), Some("Red Sky"));
    }

    #[test]
    fn test_scrolls_to_keep_selection_visible() {
        let mut l = list(&["a", "b", "c", "d", "e"]);
        l.select_down(4);
        l.ensure_visible(2);
        assert_eq!(l.scroll_offset, 3);
        let rows = l.visible_items(2);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].0);
        l.select_up(10);
        l.ensure_visible(2);
        assert_eq!(l.scroll_offset, 0);
    }

    #[test]
    fn test_click_and_select_where() {
        let mut l = list(&["a", "b", "c"]);
        assert!(l.handle_click(2));
        assert_eq!(l.selected, 2);
        assert!(!l.handle_click(5));
        assert!(l.select_where(|s| s == "b"));
        assert_eq!(l.selected, 1);
        assert!(!l.select_where(|s| s == "z"));
    }

    #[test]
    fn test_empty_list_is_safe() {
        let mut l = list(&[]);
        l.select_down(3);
        l.select_up(3);
        assert!(l.is_empty());
        assert!(l.selected_item().is_none());
        assert!(l.visible_items(10).is_empty());
    }
}
