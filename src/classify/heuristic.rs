//! Rule-based header size selection.
//!
//! Every size strictly larger than the body is a header candidate. Larger
//! sizes rank first; between equal sizes the rarer one ranks first.

use super::HeaderSizeSet;
use crate::profile::{FontProfile, SizeKey};

/// Select header sizes from the profile alone.
pub fn heuristic_sizes(profile: &FontProfile, body_size: f32) -> HeaderSizeSet {
    let body = SizeKey::from_points(body_size);

    let mut ranked: Vec<(SizeKey, usize)> = profile
        .iter()
        .filter(|(size, _)| *size > body)
        .map(|(size, stats)| (size, stats.count))
        .collect();
    ranked.sort_by(|(sa, ca), (sb, cb)| sb.cmp(sa).then(ca.cmp(cb)));

    HeaderSizeSet::from_keys(ranked.into_iter().map(|(size, _)| size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Line, Word};

    fn line(size: f32) -> Line {
        Line {
            words: vec![Word::new("t", size, 100.0)],
            text: "t".to_string(),
            size,
            top: 100.0,
            page_height: 800.0,
            page: 0,
        }
    }

    fn profile(sizes: &[f32]) -> FontProfile {
        let lines: Vec<Line> = sizes.iter().map(|s| line(*s)).collect();
        FontProfile::from_lines(&lines, 3, 100)
    }

    #[test]
    fn selects_sizes_above_body_largest_first() {
        let profile = profile(&[8.0, 11.0, 11.0, 11.0, 14.0, 14.0, 24.0]);
        let set = heuristic_sizes(&profile, profile.body_size());
        assert_eq!(set.points(), vec![24.0, 14.0]);
    }

    #[test]
    fn nothing_above_body_yields_empty_set() {
        let profile = profile(&[9.0, 12.0, 12.0]);
        assert!(heuristic_sizes(&profile, 12.0).is_empty());
    }

    #[test]
    fn empty_profile_yields_empty_set() {
        let profile = FontProfile::default();
        assert!(heuristic_sizes(&profile, profile.body_size()).is_empty());
    }
}
