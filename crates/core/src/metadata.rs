//! Metadata-only analysis, used whenever no transcript is obtained.
//!
//! Keywords come from weighted token frequencies over the tags and (when long
//! enough to stand in for a transcript) the description; title tokens add
//! weight to keywords found there but never introduce new ones. Tags are grouped
//! into clusters when they share a meaningful token, transitively. Every
//! collection is ordered explicitly so identical input gives identical output.

use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use crate::{
    config::AnalyzerConfig,
    types::{MetadataAnalysis, TagCluster, VideoCandidate},
};

#[derive(Debug, Clone)]
pub struct MetadataAnalyzer {
    config: AnalyzerConfig,
}

impl MetadataAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, video: &VideoCandidate) -> MetadataAnalysis {
        let has_substantial_description =
            video.description.chars().count() > self.config.substantial_description_chars;
        let tags = normalize_tags(&video.tags);

        let mut weights: BTreeMap<String, u32> = BTreeMap::new();
        let mut add = |text: &str, weight: u32| {
            for token in self.tokens(text) {
                *weights.entry(token).or_default() += weight;
            }
        };
        for tag in &tags {
            add(tag, self.config.tag_weight);
        }
        if has_substantial_description {
            add(&video.description, self.config.description_weight);
        }
        // The title only reinforces what tags or description already carry.
        for token in self.tokens(&video.title) {
            if let Some(weight) = weights.get_mut(&token) {
                *weight += self.config.title_weight;
            }
        }

        let mut ranked: Vec<(String, u32)> = weights.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let keywords = ranked
            .into_iter()
            .take(self.config.max_keywords)
            .map(|(token, _)| token)
            .collect();

        MetadataAnalysis {
            video_id: video.id.clone(),
            keywords,
            tag_clusters: self.cluster_tags(&tags),
            has_substantial_description,
        }
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|t| t.chars().count() >= self.config.min_keyword_len)
            .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
            .filter(|t| !self.config.stop_words.contains_word(t))
            .collect()
    }

    fn cluster_tags(&self, tags: &[String]) -> Vec<TagCluster> {
        let token_sets: Vec<BTreeSet<String>> = tags
            .iter()
            .map(|tag| self.tokens(tag).into_iter().collect())
            .collect();

        let mut groups = DisjointSet::new(tags.len());
        let mut first_owner: BTreeMap<&str, usize> = BTreeMap::new();
        for (index, tokens) in token_sets.iter().enumerate() {
            for token in tokens {
                match first_owner.entry(token.as_str()) {
                    Entry::Occupied(owner) => groups.union(*owner.get(), index),
                    Entry::Vacant(slot) => {
                        slot.insert(index);
                    }
                }
            }
        }

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for index in 0..tags.len() {
            members.entry(groups.find(index)).or_default().push(index);
        }

        let mut clusters: Vec<TagCluster> = members
            .into_values()
            .filter(|indices| indices.len() >= self.config.min_cluster_size)
            .map(|indices| {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for &i in &indices {
                    for token in &token_sets[i] {
                        *counts.entry(token.as_str()).or_default() += 1;
                    }
                }
                let mut cluster_tags: Vec<String> =
                    indices.iter().map(|&i| tags[i].clone()).collect();
                cluster_tags.sort();

                // BTreeMap iterates alphabetically, so max_by keeps the last of equal
                // counts; compare with reversed token order to prefer the first.
                let label = counts
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                    .map(|(token, _)| token.to_string())
                    .unwrap_or_else(|| cluster_tags[0].clone());

                TagCluster {
                    label,
                    tags: cluster_tags,
                }
            })
            .collect();

        clusters.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.tags.cmp(&b.tags)));
        clusters
    }
}

impl Default for MetadataAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

fn normalize_tags(tags: &BTreeSet<String>) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index stays root so grouping order is stable.
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}
