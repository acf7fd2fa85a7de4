// Circular slice selection for the daily category/location rotation.
// Wrapping is explicit modulo arithmetic so the slice never runs short near
// the end of the list; full rotation coverage needs no external state.

pub fn rotate<T: Clone>(list: &[T], start: usize, count: usize) -> Vec<T> {
    if list.is_empty() || count == 0 {
        return Vec::new();
    }

    let take = count.min(list.len());
    (0..take)
        .map(|i| list[(start + i) % list.len()].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<&'static str> {
        vec!["a", "b", "c", "d", "e"]
    }

    #[test]
    fn plain_slice_inside_bounds() {
        assert_eq!(rotate(&items(), 1, 2), vec!["b", "c"]);
    }

    #[test]
    fn slice_wraps_around_the_end() {
        assert_eq!(rotate(&items(), 4, 3), vec!["e", "a", "b"]);
    }

    #[test]
    fn start_beyond_len_wraps_via_modulo() {
        assert_eq!(rotate(&items(), 7, 2), vec!["c", "d"]);
    }

    #[test]
    fn count_is_capped_at_list_length() {
        assert_eq!(rotate(&items(), 2, 99), vec!["c", "d", "e", "a", "b"]);
    }

    #[test]
    fn empty_inputs_yield_empty_selection() {
        assert_eq!(rotate::<&str>(&[], 3, 2), Vec::<&str>::new());
        assert_eq!(rotate(&items(), 3, 0), Vec::<&str>::new());
    }

    #[test]
    fn selection_is_deterministic() {
        assert_eq!(rotate(&items(), 123, 3), rotate(&items(), 123, 3));
    }
}
