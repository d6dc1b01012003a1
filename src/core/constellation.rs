// File: src/core/constellation.rs
//! Groups the vocabulary into constellations: the connected components of
//! the undirected synonym graph.
//!
//! Word order is the order of first appearance while scanning the dataset,
//! each entry's own word before its synonyms. Components are discovered in
//! that order and walked depth-first, neighbours visited in the order their
//! edges were first seen.
//!
//! The main star of a component is the member that sorts first by:
//! 1. having a real dataset entry with at least one synonym,
//! 2. higher degree,
//! 3. earlier position in the depth-first walk.
use crate::core::dataset::VocabularyDataset;
use crate::core::types::{RelationshipKey, WordEntry};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constellation {
    pub id: String,
    pub main_star: WordEntry,
    /// Main star first, then the rest in walk order.
    pub stars: Vec<WordEntry>,
    pub edges: Vec<RelationshipKey>,
}

impl Constellation {
    pub fn contains(&self, word: &str) -> bool {
        self.stars.iter().any(|star| star.word == word)
    }
}

struct Node {
    entry: WordEntry,
    genuine: bool,
    neighbours: Vec<usize>,
}

struct WordGraph {
    nodes: Vec<Node>,
    ids: HashMap<String, usize>,
}

impl WordGraph {
    fn from_dataset(dataset: &VocabularyDataset) -> Self {
        let mut graph = Self { nodes: Vec::new(), ids: HashMap::new() };

        for entry in dataset.entries() {
            let id = graph.intern(&entry.word);
            graph.nodes[id].entry = entry.clone();
            graph.nodes[id].genuine = !entry.synonyms.is_empty();
            for synonym in &entry.synonyms {
                graph.intern(synonym);
            }
        }

        for entry in dataset.entries() {
            let from = graph.ids[&entry.word];
            for synonym in &entry.synonyms {
                let to = graph.ids[synonym];
                graph.link(from, to);
            }
        }
        graph
    }

    fn intern(&mut self, word: &str) -> usize {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            entry: WordEntry::placeholder(word),
            genuine: false,
            neighbours: Vec::new(),
        });
        self.ids.insert(word.to_string(), id);
        id
    }

    fn link(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        if !self.nodes[a].neighbours.contains(&b) {
            self.nodes[a].neighbours.push(b);
        }
        if !self.nodes[b].neighbours.contains(&a) {
            self.nodes[b].neighbours.push(a);
        }
    }

    /// Depth-first walk in preorder, returning node ids in visit order.
    fn walk(&self, start: usize, visited: &mut [bool]) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if visited[id] {
                continue;
            }
            visited[id] = true;
            order.push(id);
            for &next in self.nodes[id].neighbours.iter().rev() {
                if !visited[next] {
                    stack.push(next);
                }
            }
        }
        order
    }
}

/// Builds every constellation of the dataset. Pure and deterministic for a
/// given dataset order.
pub fn build_constellations(dataset: &VocabularyDataset) -> Vec<Constellation> {
    let graph = WordGraph::from_dataset(dataset);
    let mut visited = vec![false; graph.nodes.len()];
    let mut constellations = Vec::new();

    for start in 0..graph.nodes.len() {
        if visited[start] {
            continue;
        }
        let members = graph.walk(start, &mut visited);
        let id = format!("constellation-{}", constellations.len());
        constellations.push(assemble(&graph, id, &members));
    }

    tracing::debug!(
        words = graph.nodes.len(),
        constellations = constellations.len(),
        "built constellations"
    );
    constellations
}

fn assemble(graph: &WordGraph, id: String, members: &[usize]) -> Constellation {
    let main = members
        .iter()
        .enumerate()
        .min_by_key(|&(pos, &node)| {
            let n = &graph.nodes[node];
            (!n.genuine, std::cmp::Reverse(n.neighbours.len()), pos)
        })
        .map(|(_, &node)| node)
        .unwrap_or(members[0]);

    let main_star = graph.nodes[main].entry.clone();
    let mut stars = Vec::with_capacity(members.len());
    stars.push(main_star.clone());
    stars.extend(
        members
            .iter()
            .filter(|&&node| node != main)
            .map(|&node| graph.nodes[node].entry.clone()),
    );

    let in_component: HashSet<usize> = members.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for &node in members {
        for &next in &graph.nodes[node].neighbours {
            if !in_component.contains(&next) {
                continue;
            }
            let key = RelationshipKey::new(&graph.nodes[node].entry.word, &graph.nodes[next].entry.word);
            if seen.insert(key.clone()) {
                edges.push(key);
            }
        }
    }

    // Unreachable: adjacency is undirected and components come from walking
    // it, so a multi-star component always has an edge.
    if edges.is_empty() && stars.len() > 1 {
        edges = stars[1..]
            .iter()
            .map(|star| RelationshipKey::new(&main_star.word, &star.word))
            .collect();
    }

    Constellation { id, main_star, stars, edges }
}
