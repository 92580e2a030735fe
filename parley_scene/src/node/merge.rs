// Copyright 2026 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use super::{ClipId, IndexedRun, RunContent, SelectionState};
use crate::{FontId, Glyph};

/// Runs after batching.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedRuns {
    /// Glyph batches, in order of their first run.
    pub glyphs: Vec<IndexedRun>,
    /// Image runs, never merged.
    pub images: Vec<IndexedRun>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct MergeKey {
    font: FontId,
    clip: Option<ClipId>,
    color: [u32; 4],
    selection: SelectionState,
}

/// Batches glyph runs that share a font, clip, color and selection state.
///
/// The first run of every key becomes the batch. Glyphs of later runs are appended with their
/// positions rebased onto the batch origin, and their text ranges are recorded so that the
/// batch knows which text it draws. Empty glyph runs are dropped.
pub fn merge_runs(runs: impl IntoIterator<Item = IndexedRun>) -> MergedRuns {
    let mut merged = MergedRuns::default();
    let mut batches: HashMap<MergeKey, usize> = HashMap::new();
    for run in runs {
        let font = match &run.content {
            RunContent::Image(_) => {
                merged.images.push(run);
                continue;
            }
            RunContent::Glyphs(glyphs) if glyphs.is_empty() => continue,
            RunContent::Glyphs(glyphs) => glyphs.font.id,
        };
        let key = MergeKey {
            font,
            clip: run.clip,
            color: run.color.components.map(f32::to_bits),
            selection: run.selection,
        };
        match batches.entry(key) {
            Entry::Occupied(entry) => append(&mut merged.glyphs[*entry.get()], run),
            Entry::Vacant(entry) => {
                entry.insert(merged.glyphs.len());
                merged.glyphs.push(run);
            }
        }
    }
    merged
}

fn append(batch: &mut IndexedRun, other: IndexedRun) {
    let delta = other.position - batch.position;
    if let (RunContent::Glyphs(target), RunContent::Glyphs(source)) =
        (&mut batch.content, other.content)
    {
        target.glyphs.extend(source.glyphs.into_iter().map(|glyph| Glyph {
            x: glyph.x + delta.x,
            y: glyph.y + delta.y,
            ..glyph
        }));
        target.bounds = target.bounds.union(source.bounds + delta);
    }
    batch.ranges.extend(other.ranges);
    batch.bounds = batch.bounds.union(other.bounds);
}
