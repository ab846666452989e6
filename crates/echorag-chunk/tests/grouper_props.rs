use echorag_chunk::{group, group_ranges, segment, GroupParams};
use proptest::prelude::*;

fn sentences() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,30}[.!?]", 1..60)
}

proptest! {
    #[test]
    fn groups_respect_max_unless_single_sentence(sents in sentences(), max in 40usize..900, overlap in 0usize..3) {
        let refs: Vec<&str> = sents.iter().map(String::as_str).collect();
        let params = GroupParams::new(max / 2, max, overlap);
        for g in group(&refs, &params) {
            let len = g.chars().count();
            prop_assert!(len <= max || refs.contains(&g.as_str()), "group of {} chars over {}", len, max);
        }
    }

    #[test]
    fn groups_are_whole_sentences_covering_input(sents in sentences(), max in 40usize..900, overlap in 0usize..3) {
        let text = sents.join(" ");
        let segmented = segment(&text);
        prop_assert_eq!(&segmented, &sents.iter().map(String::as_str).collect::<Vec<_>>());

        let params = GroupParams::new(max / 2, max, overlap);
        let groups = group(&segmented, &params);
        let mut seen = std::collections::HashSet::new();
        for g in &groups {
            for s in segment(g) {
                prop_assert!(segmented.contains(&s));
                seen.insert(s);
            }
        }
        prop_assert_eq!(seen.len(), segmented.iter().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn every_group_adds_new_sentences(lens in prop::collection::vec(1usize..800, 1..40), overlap in 0usize..4) {
        let sents: Vec<String> = lens.iter().map(|&n| "w".repeat(n)).collect();
        let refs: Vec<&str> = sents.iter().map(String::as_str).collect();
        let groups = group_ranges(&refs, &GroupParams::new(400, 700, overlap));
        prop_assert_eq!(groups.first().map(|g| g.start), Some(0));
        prop_assert_eq!(groups.last().map(|g| g.end), Some(refs.len()));
        for w in groups.windows(2) {
            prop_assert!(w[1].end > w[0].end, "{:?} repeats {:?}", w[1], w[0]);
            prop_assert!(w[1].start <= w[0].end);
        }
    }

    #[test]
    fn sensitive_bounds_hold_for_free_text(text in "[A-Za-z ,]{0,80}([.!?] [A-Za-z ,]{1,80}){0,40}") {
        let params = GroupParams::new(225, 450, 0);
        let sentences = segment(&text);
        for g in group(&sentences, &params) {
            prop_assert!(g.chars().count() <= 450 || sentences.contains(&g.as_str()));
        }
    }
}
