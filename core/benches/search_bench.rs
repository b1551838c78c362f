use criterion::{criterion_group, criterion_main, Criterion};
use sitesearch_core::SearchIndex;

static PAYLOAD: &str = r#"{
    "docnames": ["getting_started", "primer", "welcome"],
    "filenames": ["getting_started.ipynb", "primer.ipynb", "welcome.md"],
    "titles": ["Getting started", "Python primer", "Welcome"],
    "terms": {
        "glacier": [0, 1, 2],
        "mass": [1, 2],
        "balanc": 1,
        "notebook": [0, 1],
        "python": 1,
        "jupyt": [0, 1],
        "climat": [0, 2]
    },
    "titleterms": {"python": 1, "welcom": 2, "start": 0},
    "alltitles": {
        "Plotting": [[1, "plotting"]],
        "First steps": [[1, "first-steps"]],
        "Grading": [[2, "grading"]]
    }
}"#;

fn bench_search(c: &mut Criterion) {
    let index = SearchIndex::load(PAYLOAD).expect("valid payload");
    c.bench_function("search_two_terms", |b| b.iter(|| index.search("glacier mass balance")));
    c.bench_function("load_payload", |b| b.iter(|| SearchIndex::load(PAYLOAD).unwrap()));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
