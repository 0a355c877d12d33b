use std::collections::HashSet;

use carttotal_core_types::limits::WINDOW_MAX_CHARS;
use carttotal_core_types::{Candidate, OriginalMap, SimplifiedCandidate, Window};
use tracing::{debug, info};

/// What the analyzer should run: one call, or a sequence of windows.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisPlan {
    Single(Window),
    Windows(Vec<Window>),
}

impl AnalysisPlan {
    pub fn window_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Windows(windows) => windows.len(),
        }
    }

    /// Windows in analysis order.
    pub fn windows(&self) -> &[Window] {
        match self {
            Self::Single(window) => std::slice::from_ref(window),
            Self::Windows(windows) => windows,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Preprocessed {
    /// Deduplicated items, shortest text first.
    pub items: Vec<SimplifiedCandidate>,
    pub plan: AnalysisPlan,
    pub original_map: OriginalMap,
}

impl Preprocessed {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Dedup, rank and pack candidates into model-sized windows.
#[derive(Clone, Copy, Debug)]
pub struct Preprocessor {
    max_chars: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(WINDOW_MAX_CHARS)
    }
}

impl Preprocessor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn preprocess(&self, candidates: &[Candidate]) -> Preprocessed {
        let simplified: Vec<SimplifiedCandidate> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| SimplifiedCandidate::new(index, candidate.text.clone()))
            .collect();
        let items = self.simplify(simplified);

        let mut original_map = OriginalMap::new();
        for item in &items {
            if let Some(candidate) = candidates.get(item.index) {
                original_map.insert(item.index, candidate.clone());
            }
        }

        let plan = if self.fits_in_limit(&items) {
            AnalysisPlan::Single(Window::new(items.clone()))
        } else {
            AnalysisPlan::Windows(self.create_windows(&items))
        };

        info!(
            candidates = candidates.len(),
            unique = items.len(),
            windows = plan.window_count(),
            "preprocessed price candidates"
        );
        Preprocessed {
            items,
            plan,
            original_map,
        }
    }

    /// Drops repeated texts (first occurrence wins) and sorts by text length.
    ///
    /// The sort is stable, so equal-length items keep their relative order.
    pub fn simplify(&self, items: Vec<SimplifiedCandidate>) -> Vec<SimplifiedCandidate> {
        let mut seen = HashSet::new();
        let mut unique: Vec<SimplifiedCandidate> = items
            .into_iter()
            .filter(|item| seen.insert(item.text.trim().to_lowercase()))
            .collect();
        unique.sort_by_key(|item| item.text.chars().count());
        unique
    }

    pub fn fits_in_limit(&self, items: &[SimplifiedCandidate]) -> bool {
        serialized_array_len(items) <= self.max_chars
    }

    /// Greedy packing that keeps every window's serialized array within budget.
    ///
    /// An item too large for any window still gets a window of its own.
    pub fn create_windows(&self, items: &[SimplifiedCandidate]) -> Vec<Window> {
        let mut windows = Vec::new();
        let mut current: Vec<SimplifiedCandidate> = Vec::new();
        let mut current_size = 0usize;

        for item in items {
            let item_size = serialized_len(item);
            if !current.is_empty() && current_size + item_size + 1 > self.max_chars {
                windows.push(Window::new(std::mem::take(&mut current)));
                current_size = 0;
            }
            // Brackets for a fresh window, a comma separator otherwise.
            current_size += if current.is_empty() { item_size + 2 } else { item_size + 1 };
            current.push(item.clone());
        }
        if !current.is_empty() {
            windows.push(Window::new(current));
        }

        debug!(windows = windows.len(), max_chars = self.max_chars, "created windows");
        windows
    }
}

/// Length in characters of the compact JSON form of one item.
pub fn serialized_len(item: &SimplifiedCandidate) -> usize {
    serde_json::to_string(item)
        .map(|json| json.chars().count())
        .unwrap_or_else(|_| item.text.chars().count())
}

fn serialized_array_len(items: &[SimplifiedCandidate]) -> usize {
    let separators = items.len().saturating_sub(1);
    2 + separators + items.iter().map(serialized_len).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carttotal_core_types::Selector;

    fn candidate(text: &str) -> Candidate {
        Candidate::from_locator(Selector::new("div", "div"), text)
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let candidates = vec![
            candidate("Order Total $28.34"),
            candidate("Tax $2.00"),
            candidate("  order total $28.34 "),
        ];
        let out = Preprocessor::default().preprocess(&candidates);
        let indexes: Vec<usize> = out.items.iter().map(|item| item.index).collect();
        assert_eq!(indexes, vec![1, 0]);
        assert!(!out.original_map.contains(2));
    }

    #[test]
    fn serialized_len_matches_json() {
        let item = SimplifiedCandidate::new(12, "Total $5.00");
        assert_eq!(serialized_len(&item), r#"{"index":12,"text":"Total $5.00"}"#.len());
    }

    #[test]
    fn small_lists_stay_in_a_single_window() {
        let candidates = vec![candidate("Subtotal $40.00"), candidate("Tax $3.00")];
        let out = Preprocessor::default().preprocess(&candidates);
        assert!(matches!(out.plan, AnalysisPlan::Single(ref window) if window.len() == 2));
    }

    #[test]
    fn oversized_item_gets_its_own_window() {
        let pre = Preprocessor::new(40);
        let items = vec![
            SimplifiedCandidate::new(0, "a"),
            SimplifiedCandidate::new(1, "x".repeat(60)),
            SimplifiedCandidate::new(2, "b"),
        ];
        let windows = pre.create_windows(&items);
        let shape: Vec<Vec<usize>> = windows
            .iter()
            .map(|w| w.iter().map(|item| item.index).collect())
            .collect();
        assert_eq!(shape, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn empty_input_is_empty() {
        let out = Preprocessor::default().preprocess(&[]);
        assert!(out.is_empty());
        assert!(out.original_map.is_empty());
    }
}
