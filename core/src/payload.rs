//! Loading and validation of the serialized search-index payload.
//!
//! The payload is the `searchindex.js` artifact a static documentation
//! builder emits next to its HTML output: parallel `docnames`/`filenames`/
//! `titles` arrays, `terms` and `titleterms` maps whose values are either a
//! bare document index or a list of indices, and `alltitles`/`indexentries`
//! maps whose values are `[doc_index, anchor-or-null]` pairs. Everything is
//! validated and normalized here, once; queries trust the result.

use crate::index::{DocId, DocMeta, Posting, SearchIndex, TERM_WEIGHT, TITLE_WEIGHT};
use crate::tokenizer::tokenize;
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Structural corruption detected while loading an index payload. A load
/// that fails this way must be discarded; there is no partially usable index.
#[derive(Debug, Error)]
#[error("malformed index: {reason}")]
pub struct MalformedIndex {
    reason: String,
}

impl MalformedIndex {
    fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl From<serde_json::Error> for MalformedIndex {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("unparseable payload: {err}"))
    }
}

#[derive(Deserialize)]
struct RawPayload {
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
    terms: BTreeMap<String, DocRefs>,
    #[serde(default)]
    titleterms: BTreeMap<String, DocRefs>,
    #[serde(default)]
    alltitles: BTreeMap<String, Vec<SectionRef>>,
    #[serde(default)]
    indexentries: BTreeMap<String, Vec<SectionRef>>,
}

/// Term values come in two shapes: a bare index for single-document terms,
/// a list of indices otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocRefs {
    One(u32),
    Many(Vec<u32>),
}

impl DocRefs {
    fn as_slice(&self) -> &[u32] {
        match self {
            DocRefs::One(d) => std::slice::from_ref(d),
            DocRefs::Many(ds) => ds,
        }
    }
}

/// A `[doc_index, anchor]` pair; the anchor is null when the entry addresses
/// the document root.
#[derive(Deserialize)]
struct SectionRef(u32, Option<String>);

impl SearchIndex {
    /// Parse and validate a serialized index payload.
    ///
    /// Accepts bare JSON or the `Search.setIndex({...})` wrapper form the
    /// site generator writes. This is the only point where the data is
    /// validated; see [`MalformedIndex`] for what gets rejected.
    pub fn load(payload: &str) -> Result<Self, MalformedIndex> {
        let raw: RawPayload = serde_json::from_str(strip_js_wrapper(payload))?;
        build(raw)
    }

    /// Read a payload file (`searchindex.js` or bare `.json`) and load it.
    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)
            .with_context(|| format!("reading index payload {}", path.display()))?;
        Ok(Self::load(&payload)?)
    }
}

fn strip_js_wrapper(payload: &str) -> &str {
    let trimmed = payload.trim();
    match trimmed.strip_prefix("Search.setIndex(") {
        Some(rest) => {
            let rest = rest.trim_end();
            let rest = rest.strip_suffix(';').unwrap_or(rest).trim_end();
            rest.strip_suffix(')').unwrap_or(rest)
        }
        None => trimmed,
    }
}

fn build(raw: RawPayload) -> Result<SearchIndex, MalformedIndex> {
    let num_docs = raw.docnames.len();
    if raw.titles.len() != num_docs {
        return Err(MalformedIndex::new(format!(
            "titles has {} entries for {} docnames",
            raw.titles.len(),
            num_docs
        )));
    }
    if raw.filenames.len() != num_docs {
        return Err(MalformedIndex::new(format!(
            "filenames has {} entries for {} docnames",
            raw.filenames.len(),
            num_docs
        )));
    }
    let mut seen = HashSet::new();
    for name in &raw.docnames {
        if !seen.insert(name.as_str()) {
            return Err(MalformedIndex::new(format!("duplicate docname {name:?}")));
        }
    }

    let docs: Vec<DocMeta> = (0..num_docs)
        .map(|i| DocMeta {
            docname: raw.docnames[i].clone(),
            filename: raw.filenames[i].clone(),
            title: raw.titles[i].clone(),
        })
        .collect();

    let mut builder = PostingsBuilder::new(num_docs);

    for (term, refs) in &raw.terms {
        for &d in refs.as_slice() {
            builder.add("terms", term, d, None, TERM_WEIGHT)?;
        }
    }
    for (term, refs) in &raw.titleterms {
        for &d in refs.as_slice() {
            builder.add("titleterms", term, d, None, TITLE_WEIGHT)?;
        }
    }

    let mut sections: HashMap<DocId, BTreeMap<String, String>> = HashMap::new();
    for (section_title, refs) in &raw.alltitles {
        for SectionRef(d, anchor) in refs {
            builder.check_doc(*d, "alltitles")?;
            let Some(anchor) = anchor else { continue };
            let per_doc = sections.entry(*d).or_default();
            if per_doc.insert(anchor.clone(), section_title.clone()).is_some() {
                return Err(MalformedIndex::new(format!(
                    "duplicate anchor {anchor:?} in document {d}"
                )));
            }
            for token in tokenize(section_title) {
                builder.add("alltitles", &token, *d, Some(anchor.clone()), TITLE_WEIGHT)?;
            }
        }
    }

    for (entry, refs) in &raw.indexentries {
        for SectionRef(d, anchor) in refs {
            builder.check_doc(*d, "indexentries")?;
            for token in tokenize(entry) {
                builder.add("indexentries", &token, *d, anchor.clone(), TERM_WEIGHT)?;
            }
        }
    }

    let postings = builder.finish();
    tracing::debug!(
        num_docs,
        num_terms = postings.len(),
        num_sections = sections.values().map(|m| m.len()).sum::<usize>(),
        "search index loaded"
    );
    Ok(SearchIndex { docs, postings, sections })
}

struct PostingsBuilder {
    num_docs: usize,
    postings: HashMap<String, Vec<Posting>>,
}

impl PostingsBuilder {
    fn new(num_docs: usize) -> Self {
        Self { num_docs, postings: HashMap::new() }
    }

    fn check_doc(&self, doc: u32, map: &str) -> Result<(), MalformedIndex> {
        if (doc as usize) < self.num_docs {
            Ok(())
        } else {
            Err(MalformedIndex::new(format!(
                "{map} references document index {doc} but only {} documents exist",
                self.num_docs
            )))
        }
    }

    /// Record one posting. Terms are case-folded here so payload keys that
    /// differ only in case merge into a single posting list.
    fn add(
        &mut self,
        map: &str,
        term: &str,
        doc: u32,
        anchor: Option<String>,
        weight: f32,
    ) -> Result<(), MalformedIndex> {
        self.check_doc(doc, map)?;
        self.postings
            .entry(term.to_lowercase())
            .or_default()
            .push(Posting { doc_id: doc, anchor, weight });
        Ok(())
    }

    /// Sort each posting list by (doc_id, anchor) and collapse duplicates,
    /// keeping the highest weight.
    fn finish(self) -> HashMap<String, Vec<Posting>> {
        let mut postings = self.postings;
        for list in postings.values_mut() {
            list.sort_by(|a, b| (a.doc_id, &a.anchor).cmp(&(b.doc_id, &b.anchor)));
            list.dedup_by(|cur, prev| {
                if cur.doc_id == prev.doc_id && cur.anchor == prev.anchor {
                    prev.weight = prev.weight.max(cur.weight);
                    true
                } else {
                    false
                }
            });
        }
        postings
    }
}
