use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Two values in `[-1, 1]` derived from a hash of `id`.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn format_similarity(similarity: Option<f32>) -> String {
    match similarity {
        Some(value) if value.is_finite() => {
            let text = format!("{value:.3}");
            let text = text.trim_end_matches('0').trim_end_matches('.');
            if text.is_empty() || text == "-" {
                "0".to_owned()
            } else {
                text.to_owned()
            }
        }
        _ => "n/a".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_bounded_and_deterministic() {
        for id in ["a", "CCMSLIB00000001547", "42", ""] {
            let (x, y) = stable_pair(id);
            assert!((-1.0..=1.0).contains(&x));
            assert!((-1.0..=1.0).contains(&y));
            assert_eq!(stable_pair(id), (x, y));
        }
    }

    #[test]
    fn similarity_labels_drop_trailing_zeros() {
        assert_eq!(format_similarity(Some(0.5)), "0.5");
        assert_eq!(format_similarity(Some(0.125)), "0.125");
        assert_eq!(format_similarity(Some(1.0)), "1");
        assert_eq!(format_similarity(Some(0.0)), "0");
        assert_eq!(format_similarity(None), "n/a");
        assert_eq!(format_similarity(Some(f32::NAN)), "n/a");
    }
}
