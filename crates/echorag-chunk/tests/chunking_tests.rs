use echorag_chunk::strategies::{build_parents, split_faq_blocks, split_sections, LONG_FORM_CHILD};
use echorag_chunk::{
    chunk_document, chunk_document_as, classify_document, group, heading_rows, normalize_extracted_text,
    sanitize, segment,
};
use echorag_core::{DocType, SensitivityLevel};

fn sentence(p: usize, i: usize) -> String {
    format!("Paragraph {p} sentence {i} walks through the harbor ledger and notes each arriving vessel.")
}

/// 7 paragraphs (6 breaks), roughly 10,400 chars, no headings.
fn synthetic_article() -> String {
    (0..7)
        .map(|p| (0..17).map(|i| sentence(p, i)).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn empty_input_produces_no_chunks() {
    assert!(chunk_document("", "doc_a").is_empty());
    assert!(chunk_document("   \n\n\t ", "doc_a").is_empty());
    assert_eq!(classify_document("  "), DocType::Default);
}

#[test]
fn sanitization_redacts_email_and_phone() {
    let out = sanitize("Contact john@x.com or 555-123-4567");
    assert!(!out.text.contains("john@x.com"));
    assert!(!out.text.contains("555-123-4567"));
    assert!(out.text.contains("[REDACTED_EMAIL]"));
    assert!(out.text.contains("[REDACTED_PHONE]"));
    assert!(out.redacted);
    assert_eq!(out.level, SensitivityLevel::High);
}

#[test]
fn clean_text_is_low_sensitivity() {
    let out = sanitize("The harbor opens at nine.");
    assert_eq!(out.text, "The harbor opens at nine.");
    assert!(!out.redacted);
    assert_eq!(out.level, SensitivityLevel::Low);
}

#[test]
fn pii_heavy_text_classifies_sensitive_and_chunks_redacted() {
    let text = "Call 555-123-4567 today. Mail jane.doe@example.org for the form. SSN 123-45-6789 is on file.";
    assert_eq!(classify_document(text), DocType::Sensitive);

    let chunks = chunk_document(text, "doc_s");
    assert!(!chunks.is_empty());
    for c in &chunks {
        assert_eq!(c.doc_type, DocType::Sensitive);
        assert!(c.redacted);
        assert_eq!(c.sensitivity_level, SensitivityLevel::High);
        assert!(!c.text.contains("123-45-6789"));
        assert!(c.text.chars().count() <= 450);
    }
}

#[test]
fn faq_detected_by_marker_and_split_per_question() {
    let text = "Frequently Asked Questions\n\n\
        Q: How do I reset my password?\nA: Open settings and choose reset.\n\n\
        Q: Where do I find invoices?\nA: Invoices live under billing.\nThey are monthly.\n\n\
        Q: Can I export data?\nA: Yes, as CSV.";
    assert_eq!(classify_document(text), DocType::Faq);

    let chunks = chunk_document(text, "doc_faq");
    let questions: Vec<_> = chunks.iter().filter(|c| c.text.starts_with("Q:")).collect();
    assert_eq!(questions.len(), 3);
    assert!(questions[0].text.contains("Open settings and choose reset."));
    assert!(questions[1].text.contains("They are monthly."));
    assert!(questions[2].text.ends_with("Yes, as CSV."));
    assert!(chunks.iter().all(|c| c.doc_type == DocType::Faq && !c.is_parent));
}

#[test]
fn faq_without_markers_splits_on_question_lines() {
    let text = "What is the plan?\nWe ship in May.\nWho owns it?\nThe platform team.";
    let blocks = split_faq_blocks(text);
    assert_eq!(blocks, vec!["What is the plan?\nWe ship in May.", "Who owns it?\nThe platform team."]);
}

#[test]
fn few_questions_without_marker_stay_default() {
    let text = "Why now? Because the season is short.\nIs it hard?\nNot really.\nThe rest of this note covers logistics.\nMore lines.\nEven more.\nAnd more.\nLast line here.\nOne more.\nFinal.\nEnd.";
    assert_eq!(classify_document(text), DocType::Default);
}

#[test]
fn long_form_requires_headings_or_scale() {
    let article = synthetic_article();
    assert!(article.chars().count() >= 10_000);
    // six breaks and no headings do not meet the long-form rule on their own
    assert_eq!(classify_document(&article), DocType::Default);

    let with_chapters = article.replacen("Paragraph 0", "Chapter 1 Arrival\n\nParagraph 0", 1).replacen(
        "Paragraph 4 sentence 0",
        "Chapter 2 Departure\n\nParagraph 4 sentence 0",
        1,
    );
    assert_eq!(classify_document(&with_chapters), DocType::LongForm);
}

#[test]
fn long_form_article_builds_parents_and_overlapping_children() {
    let article = synthetic_article();
    let chunks = chunk_document_as(&article, "doc_article", DocType::LongForm);

    let parents: Vec<_> = chunks.iter().filter(|c| c.is_parent).collect();
    assert!(parents.len() >= 2, "got {} parents", parents.len());
    assert!(chunks[0].is_parent, "a parent is emitted before its children");

    for parent in &parents {
        let children: Vec<_> = chunks
            .iter()
            .filter(|c| c.parent_chunk_id.as_deref() == Some(parent.chunk_id.as_str()))
            .collect();
        assert!(!children.is_empty());
        assert!(parent.text.chars().count() <= 3500);

        for (i, child) in children.iter().enumerate() {
            let len = child.text.chars().count();
            assert!(len <= 700, "child too long: {len}");
            if i + 1 < children.len() {
                assert!(len >= 400, "inner child too short: {len}");
            }
            // children immediately follow their parent in emission order
            assert_eq!(child.chunk_index, parent.chunk_index + 1 + i);
        }
        for pair in children.windows(2) {
            let prev = segment(&pair[0].text);
            let next = segment(&pair[1].text);
            assert_eq!(&prev[prev.len() - 2..], &next[..2], "consecutive children share two sentences");
        }
    }
}

#[test]
fn embeddable_subset_matches_grouped_children() {
    let article = synthetic_article();
    let chunks = chunk_document_as(&article, "doc_article", DocType::LongForm);

    let expected: usize = chunks
        .iter()
        .filter(|c| c.is_parent)
        .map(|p| group(&segment(&p.text), &LONG_FORM_CHILD).len())
        .sum();
    let embeddable = chunks.iter().filter(|c| !c.is_parent).count();
    assert_eq!(embeddable, expected);
    assert!(chunks.iter().filter(|c| !c.is_parent).all(|c| c.parent_chunk_id.is_some()));
}

#[test]
fn long_form_sections_label_parents_and_children() {
    let body = |tag: &str| (0..20).map(|i| format!("{tag} line {i} keeps the story moving forward.")).collect::<Vec<_>>().join(" ");
    let text = format!("Chapter 1 Arrival\n\n{}\n\nChapter 2 Departure\n\n{}", body("Arrival"), body("Departure"));

    let sections = split_sections(&text);
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].title.as_deref(), Some("Chapter 1 Arrival"));

    let chunks = chunk_document_as(&text, "doc_book", DocType::LongForm);
    let first_departure = chunks.iter().position(|c| c.text.contains("Departure line 0")).unwrap();
    assert!(chunks[..first_departure].iter().all(|c| c.section.as_deref() == Some("Chapter 1 Arrival")));
    assert_eq!(chunks.last().unwrap().section.as_deref(), Some("Chapter 2 Departure"));
}

#[test]
fn parents_seed_with_previous_paragraph() {
    let a = "a".repeat(1500);
    let b = "b".repeat(1500);
    let c = "c".repeat(1500);
    let parents = build_parents(&[&a, &b, &c], 3500);
    assert_eq!(parents, vec![format!("{a}\n\n{b}"), format!("{b}\n\n{c}")]);

    let huge = "h".repeat(4000);
    let parents = build_parents(&[&a, &huge], 3500);
    assert_eq!(parents, vec![a.clone(), huge.clone()]);
}

#[test]
fn chunking_is_deterministic() {
    let article = synthetic_article();
    let first = chunk_document(&article, "doc_same");
    let second = chunk_document(&article, "doc_same");
    assert_eq!(first, second);

    let other = chunk_document(&article, "doc_other");
    let texts = |cs: &[echorag_core::Chunk]| cs.iter().map(|c| (c.chunk_index, c.text.clone())).collect::<Vec<_>>();
    assert_eq!(texts(&first), texts(&other));
    assert_ne!(first[0].chunk_id, other[0].chunk_id);
}

#[test]
fn default_chunks_are_whole_sentences_with_one_sentence_overlap() {
    let text = (0..30).map(|i| format!("Note {i} records a small detail about the garden beds.")).collect::<Vec<_>>().join(" ");
    let chunks = chunk_document(&text, "doc_d");
    assert!(chunks.len() > 1);
    for c in &chunks {
        assert_eq!(c.doc_type, DocType::Default);
        assert!(c.text.chars().count() <= 800);
        assert!(c.text.ends_with('.'));
    }
    let first = segment(&chunks[0].text);
    let second = segment(&chunks[1].text);
    assert_eq!(first.last(), second.first());
}

#[test]
fn segment_splits_on_punctuation_and_blank_lines() {
    let s = segment("One. Two!  Three? Four\n\nFive\nstill five. e.g.x stays");
    assert_eq!(s, vec!["One.", "Two!", "Three?", "Four", "Five\nstill five.", "e.g.x stays"]);
}

#[test]
fn oversized_sentence_is_its_own_group() {
    let long = "x".repeat(900);
    let sentences = vec!["Short one.", long.as_str(), "Short two."];
    let groups = group(&sentences, &echorag_chunk::GroupParams::new(10, 100, 1));
    assert_eq!(groups, vec!["Short one.".to_string(), long.clone(), "Short two.".to_string()]);
}

#[test]
fn headings_are_indexed_in_document_order() {
    let text = "CONTENTS\nChapter 1: Arrival\nChapter 2: Departure\nThis line is an ordinary sentence, not a heading.";
    let chunks = chunk_document_as(text, "doc_toc", DocType::Default);
    let rows = heading_rows("doc_toc", &chunks);
    let texts: Vec<_> = rows.iter().map(|r| r.heading_text.as_str()).collect();
    assert_eq!(texts, vec!["CONTENTS", "Chapter 1: Arrival", "Chapter 2: Departure"]);
    assert_eq!(rows[0].idx, 0);
    assert_eq!(rows[2].idx, 2);
}

#[test]
fn normalization_repairs_extracted_text() {
    assert_eq!(normalize_extracted_text(""), "");
    assert_eq!(normalize_extracted_text("  "), "");
    let out = normalize_extracted_text("C H A P T E R  One\n\nThe  Mat-\nthew  Effect");
    assert_eq!(out, "CHAPTER One\n\nThe Matthew Effect");
}

#[test]
fn normalization_helpers_match_examples() {
    use echorag_chunk::normalize::{collapse_spaced_letters, dehyphenate, normalize_whitespace};

    assert_eq!(dehyphenate("pat-\ntern"), "pattern");
    assert_eq!(dehyphenate("some-\n  thing"), "something");
    assert_eq!(dehyphenate("end-\n"), "end");
    assert_eq!(dehyphenate("no hyphen here"), "no hyphen here");

    assert_eq!(collapse_spaced_letters("O u t l i e r s"), "Outliers");
    assert_eq!(collapse_spaced_letters("CHAPTER ONE  The Matthew Effect"), "CHAPTER ONE  The Matthew Effect");
    assert_eq!(collapse_spaced_letters("normal text"), "normal text");

    assert_eq!(normalize_whitespace("a   b\t\nc"), "a b c");
    assert_eq!(normalize_whitespace("  \n\n  x  \n\n  y  "), "x\n\ny");
}
