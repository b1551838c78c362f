use serde_json::json;
use sitesearch_core::SearchIndex;

/// Two documents; "glacier" occurs in both, "mass" only in the second.
fn two_doc_payload() -> String {
    json!({
        "docnames": ["intro", "advanced"],
        "filenames": ["intro.md", "advanced.md"],
        "titles": ["Intro", "Advanced"],
        "terms": {"glacier": [0, 1], "mass": 1}
    })
    .to_string()
}

#[test]
fn empty_query_returns_nothing() {
    let index = SearchIndex::load(&two_doc_payload()).unwrap();
    assert!(index.search("").is_empty());
    assert!(index.search("   ").is_empty());
}

#[test]
fn single_term_ranks_by_identifier_on_equal_weight() {
    let index = SearchIndex::load(&two_doc_payload()).unwrap();
    let hits = index.search("glacier");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Intro");
    assert_eq!(hits[0].doc_id, 0);
    assert_eq!(hits[1].title, "Advanced");
    assert_eq!(hits[1].doc_id, 1);
}

#[test]
fn multi_term_query_prefers_conjunction() {
    let index = SearchIndex::load(&two_doc_payload()).unwrap();
    let hits = index.search("glacier mass");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Advanced");
    assert_eq!(hits[0].doc_id, 1);
    assert_eq!(hits[0].terms_matched, 2);
}

#[test]
fn disjoint_terms_fall_back_to_union() {
    let payload = json!({
        "docnames": ["a", "b"],
        "filenames": ["a.md", "b.md"],
        "titles": ["A", "B"],
        "terms": {"alpha": 0, "beta": 1}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    let hits = index.search("alpha beta");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.terms_matched == 1));
    assert_eq!(hits[0].doc_id, 0);
    assert_eq!(hits[1].doc_id, 1);
}

#[test]
fn unknown_terms_contribute_nothing() {
    let index = SearchIndex::load(&two_doc_payload()).unwrap();
    // "zzz" is not in the vocabulary: partial matches still come back.
    let hits = index.search("glacier zzz");
    assert_eq!(hits.len(), 2);
    assert!(index.search("zzz").is_empty());
}

#[test]
fn match_count_outranks_weight() {
    let payload = json!({
        "docnames": ["a", "b"],
        "filenames": ["a.md", "b.md"],
        "titles": ["A", "B"],
        "terms": {"alpha": [0, 1], "beta": 1}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    // "zzz" has no postings, so the union path ranks by terms matched.
    let hits = index.search("alpha beta zzz");
    assert_eq!(hits[0].doc_id, 1);
    assert_eq!(hits[0].terms_matched, 2);
    assert_eq!(hits[1].doc_id, 0);
    assert_eq!(hits[1].terms_matched, 1);
}

#[test]
fn title_matches_outweigh_body_matches() {
    let payload = json!({
        "docnames": ["a", "b"],
        "filenames": ["a.md", "b.md"],
        "titles": ["A", "B"],
        "terms": {"guide": 0},
        "titleterms": {"guide": 1}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    let hits = index.search("guide");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, 1);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn payload_term_case_is_folded() {
    let payload = json!({
        "docnames": ["a", "b"],
        "filenames": ["a.md", "b.md"],
        "titles": ["A", "B"],
        "terms": {"The": 1, "the": 0}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    assert_eq!(index.num_terms(), 1);
    let hits = index.search("the");
    assert_eq!(hits.len(), 2);
}

#[test]
fn stemmed_vocabulary_matches_inflected_query() {
    let payload = json!({
        "docnames": ["a"],
        "filenames": ["a.md"],
        "titles": ["A"],
        "terms": {"run": 0}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    assert_eq!(index.search("running").len(), 1);
}

#[test]
fn section_hits_carry_anchor_and_title() {
    let payload = json!({
        "docnames": ["primer"],
        "filenames": ["primer.ipynb"],
        "titles": ["Python primer"],
        "terms": {"python": 0},
        "alltitles": {
            "Python primer": [[0, null]],
            "Plotting basics": [[0, "plotting-basics"]]
        }
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();

    let hits = index.search("plotting");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].anchor.as_deref(), Some("plotting-basics"));
    assert_eq!(hits[0].section_title.as_deref(), Some("Plotting basics"));

    // Document-level match: no anchor, no section title.
    let hits = index.search("python");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].anchor, None);
    assert_eq!(hits[0].section_title, None);
}

#[test]
fn repeated_searches_are_deterministic() {
    let payload = json!({
        "docnames": ["a", "b", "c"],
        "filenames": ["a.md", "b.md", "c.md"],
        "titles": ["A", "B", "C"],
        "terms": {"ice": [0, 1, 2], "flow": [1, 2]},
        "titleterms": {"flow": 2}
    })
    .to_string();
    let index = SearchIndex::load(&payload).unwrap();
    let first = index.search("ice flow");
    for _ in 0..5 {
        assert_eq!(index.search("ice flow"), first);
    }
}

#[test]
fn js_wrapper_is_accepted() {
    let wrapped = format!("Search.setIndex({});", two_doc_payload());
    let index = SearchIndex::load(&wrapped).unwrap();
    assert_eq!(index.num_docs(), 2);
}

#[test]
fn out_of_range_posting_is_rejected() {
    let docnames: Vec<String> = (0..10).map(|i| format!("doc{i}")).collect();
    let filenames: Vec<String> = (0..10).map(|i| format!("doc{i}.md")).collect();
    let titles: Vec<String> = (0..10).map(|i| format!("Doc {i}")).collect();
    let payload = json!({
        "docnames": docnames,
        "filenames": filenames,
        "titles": titles,
        "terms": {"glacier": [0, 99]}
    })
    .to_string();
    let err = SearchIndex::load(&payload).unwrap_err();
    assert!(err.to_string().contains("99"));
}

#[test]
fn duplicate_docname_is_rejected() {
    let payload = json!({
        "docnames": ["a", "a"],
        "filenames": ["a.md", "a2.md"],
        "titles": ["A", "A again"],
        "terms": {}
    })
    .to_string();
    assert!(SearchIndex::load(&payload).is_err());
}

#[test]
fn length_mismatch_is_rejected() {
    let payload = json!({
        "docnames": ["a", "b"],
        "filenames": ["a.md", "b.md"],
        "titles": ["A"],
        "terms": {}
    })
    .to_string();
    assert!(SearchIndex::load(&payload).is_err());
}

#[test]
fn duplicate_anchor_is_rejected() {
    let payload = json!({
        "docnames": ["a"],
        "filenames": ["a.md"],
        "titles": ["A"],
        "terms": {},
        "alltitles": {
            "First": [[0, "same-anchor"]],
            "Second": [[0, "same-anchor"]]
        }
    })
    .to_string();
    assert!(SearchIndex::load(&payload).is_err());
}

#[test]
fn missing_required_field_is_rejected() {
    let payload = json!({
        "docnames": ["a"],
        "filenames": ["a.md"],
        "titles": ["A"]
    })
    .to_string();
    assert!(SearchIndex::load(&payload).is_err());
}

#[test]
fn dangling_section_reference_is_rejected() {
    let payload = json!({
        "docnames": ["a"],
        "filenames": ["a.md"],
        "titles": ["A"],
        "terms": {},
        "alltitles": {"Ghost": [[3, "ghost"]]}
    })
    .to_string();
    assert!(SearchIndex::load(&payload).is_err());
}
