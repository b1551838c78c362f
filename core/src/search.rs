//! Query evaluation and ranking over a loaded [`SearchIndex`].

use crate::index::{DocId, Posting, SearchIndex};
use crate::tokenizer::{tokenize_query, QueryTerm};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub docname: String,
    pub title: String,
    /// Anchor of the best-matching section, when the match is section-level.
    pub anchor: Option<String>,
    pub section_title: Option<String>,
    /// Summed posting weight across all matched query terms.
    pub score: f32,
    /// Number of distinct query terms that matched this document.
    pub terms_matched: u32,
}

#[derive(Default)]
struct DocScore {
    score: f32,
    terms_matched: u32,
    best_section: Option<(f32, String)>,
}

impl SearchIndex {
    /// Answer a free-text query with a ranked result list.
    ///
    /// Multi-term queries are conjunctive-preferred: when every term has
    /// postings, only documents matching all terms are returned; when that
    /// intersection is empty (or a term matched nothing at all) the union of
    /// per-term matches is returned instead, so partial matches are never
    /// silently dropped. Ranking is by distinct terms matched, then summed
    /// posting weight, then ascending document id. An empty or unmatched
    /// query yields an empty list; `search` never fails.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let terms = tokenize_query(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let per_term: Vec<Vec<&Posting>> =
            terms.iter().map(|t| self.candidates(t)).collect();
        let doc_sets: Vec<BTreeSet<DocId>> = per_term
            .iter()
            .map(|ps| ps.iter().map(|p| p.doc_id).collect())
            .collect();

        let union: BTreeSet<DocId> = doc_sets.iter().flatten().copied().collect();
        let selected = if doc_sets.iter().all(|s| !s.is_empty()) {
            let mut inter = doc_sets[0].clone();
            for s in &doc_sets[1..] {
                inter = inter.intersection(s).copied().collect();
            }
            if inter.is_empty() { union } else { inter }
        } else {
            union
        };
        if selected.is_empty() {
            return Vec::new();
        }

        let mut agg: BTreeMap<DocId, DocScore> = BTreeMap::new();
        for postings in &per_term {
            let mut matched: BTreeSet<DocId> = BTreeSet::new();
            for p in postings {
                if !selected.contains(&p.doc_id) {
                    continue;
                }
                let entry = agg.entry(p.doc_id).or_default();
                entry.score += p.weight;
                if matched.insert(p.doc_id) {
                    entry.terms_matched += 1;
                }
                if let Some(anchor) = &p.anchor {
                    let better = match &entry.best_section {
                        None => true,
                        Some((w, a)) => p.weight > *w || (p.weight == *w && anchor < a),
                    };
                    if better {
                        entry.best_section = Some((p.weight, anchor.clone()));
                    }
                }
            }
        }

        let mut hits: Vec<SearchHit> = agg
            .into_iter()
            .map(|(doc_id, ds)| {
                let meta = &self.docs[doc_id as usize];
                let anchor = ds.best_section.map(|(_, a)| a);
                let section_title = anchor
                    .as_deref()
                    .and_then(|a| self.section_title(doc_id, a))
                    .map(str::to_string);
                SearchHit {
                    doc_id,
                    docname: meta.docname.clone(),
                    title: meta.title.clone(),
                    anchor,
                    section_title,
                    score: ds.score,
                    terms_matched: ds.terms_matched,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.terms_matched
                .cmp(&a.terms_matched)
                .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
                .then(a.doc_id.cmp(&b.doc_id))
        });
        hits
    }

    /// Postings for one query term: verbatim vocabulary hits plus stemmed
    /// hits, deduplicated by (doc, anchor). Unknown terms yield nothing.
    fn candidates(&self, term: &QueryTerm) -> Vec<&Posting> {
        let mut out: Vec<&Posting> = Vec::new();
        if let Some(ps) = self.postings_for(&term.raw) {
            out.extend(ps);
        }
        if term.stem != term.raw {
            if let Some(ps) = self.postings_for(&term.stem) {
                out.extend(ps);
            }
        }
        out.sort_by(|a, b| (a.doc_id, &a.anchor).cmp(&(b.doc_id, &b.anchor)));
        out.dedup_by(|cur, prev| cur.doc_id == prev.doc_id && cur.anchor == prev.anchor);
        out
    }
}
