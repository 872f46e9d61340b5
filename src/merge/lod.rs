//! LOD grouping and superhigh promotion.
//!
//! Only the superhigh tier's markers are used downstream, so every
//! permutation must expose a superhigh mesh even when the artist only
//! authored lower tiers.

use crate::error::MergeIssue;
use crate::mesh::MeshAsset;
use crate::types::LodLevel;
use serde::{Deserialize, Serialize};

/// Anything that can sit in a LOD ladder.
pub trait LodMember {
    fn name(&self) -> &str;
    fn permutation_name(&self) -> &str;
    fn lod_level(&self) -> LodLevel;
    fn set_lod_level(&mut self, lod: LodLevel);
}

impl LodMember for MeshAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn permutation_name(&self) -> &str {
        &self.permutation_name
    }

    fn lod_level(&self) -> LodLevel {
        self.lod_level
    }

    fn set_lod_level(&mut self, lod: LodLevel) {
        self.lod_level = lod;
    }
}

/// Five LOD slots, superhigh first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodLadder<T> {
    slots: [Option<T>; 5],
}

impl<T> Default for LodLadder<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> LodLadder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lod: LodLevel) -> Option<&T> {
        self.slots[lod.index()].as_ref()
    }

    pub fn get_mut(&mut self, lod: LodLevel) -> Option<&mut T> {
        self.slots[lod.index()].as_mut()
    }

    pub fn is_occupied(&self, lod: LodLevel) -> bool {
        self.slots[lod.index()].is_some()
    }

    /// Put `item` in a slot, returning whatever was there.
    pub fn replace(&mut self, lod: LodLevel, item: T) -> Option<T> {
        self.slots[lod.index()].replace(item)
    }

    pub fn take(&mut self, lod: LodLevel) -> Option<T> {
        self.slots[lod.index()].take()
    }

    /// The most detailed occupied tier.
    pub fn highest(&self) -> Option<LodLevel> {
        LodLevel::ALL.into_iter().find(|lod| self.is_occupied(*lod))
    }

    /// Occupied slots, most detailed first.
    pub fn iter(&self) -> impl Iterator<Item = (LodLevel, &T)> {
        LodLevel::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(lod, slot)| slot.as_ref().map(|item| (lod, item)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.slots.into_iter().flatten()
    }
}

/// All LODs of one permutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationGroup<T = MeshAsset> {
    pub name: String,
    pub ladder: LodLadder<T>,
}

/// Group meshes by permutation name, keeping first-seen permutation order.
///
/// A mesh landing in an occupied (permutation, lod) slot is dropped and
/// reported; the first one wins.
pub fn group_by_permutation<T: LodMember>(
    meshes: impl IntoIterator<Item = T>,
) -> (Vec<PermutationGroup<T>>, Vec<MergeIssue>) {
    let mut groups: Vec<PermutationGroup<T>> = Vec::new();
    let mut issues = Vec::new();

    for mesh in meshes {
        let position = match groups
            .iter()
            .position(|g| g.name == mesh.permutation_name())
        {
            Some(position) => position,
            None => {
                groups.push(PermutationGroup {
                    name: mesh.permutation_name().to_string(),
                    ladder: LodLadder::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[position];
        let lod = mesh.lod_level();
        if group.ladder.is_occupied(lod) {
            issues.push(MergeIssue::DuplicateLod {
                mesh: mesh.name().to_string(),
                permutation: group.name.clone(),
                lod,
            });
        } else {
            group.ladder.replace(lod, mesh);
        }
    }

    (groups, issues)
}

/// Move the most detailed mesh of a group into the superhigh slot.
///
/// Returns the tier it was promoted from, or `None` if superhigh was
/// already authored. Lower slots are left as they are.
pub fn promote<T: LodMember>(group: &mut PermutationGroup<T>) -> Result<Option<LodLevel>, MergeIssue> {
    let highest = group
        .ladder
        .highest()
        .ok_or_else(|| MergeIssue::EmptyPermutation(group.name.clone()))?;

    if highest == LodLevel::Superhigh {
        return Ok(None);
    }

    if let Some(mut mesh) = group.ladder.take(highest) {
        mesh.set_lod_level(LodLevel::Superhigh);
        group.ladder.replace(LodLevel::Superhigh, mesh);
    }
    Ok(Some(highest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(name: &str) -> MeshAsset {
        MeshAsset::new(name)
    }

    #[test]
    fn test_group_keeps_first_seen_order() {
        let (groups, issues) =
            group_by_permutation(vec![mesh("lid low"), mesh("base high"), mesh("lid superhigh")]);

        assert!(issues.is_empty());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "lid");
        assert_eq!(groups[0].ladder.len(), 2);
        assert_eq!(groups[1].name, "base");
        assert!(groups[1].ladder.is_occupied(LodLevel::High));
    }

    #[test]
    fn test_duplicate_lod_first_wins() {
        let mut first = mesh("lid high");
        first.node_list_checksum = 1;
        let (groups, issues) = group_by_permutation(vec![first, mesh("lid_high")]);

        assert_eq!(
            issues,
            vec![MergeIssue::DuplicateLod {
                mesh: "lid_high".into(),
                permutation: "lid".into(),
                lod: LodLevel::High,
            }]
        );
        assert_eq!(groups[0].ladder.get(LodLevel::High).unwrap().node_list_checksum, 1);
    }

    #[test]
    fn test_promote_high_over_low() {
        let (mut groups, _) = group_by_permutation(vec![mesh("crate low"), mesh("crate high")]);
        let promoted = promote(&mut groups[0]).unwrap();

        assert_eq!(promoted, Some(LodLevel::High));
        let ladder = &groups[0].ladder;
        let superhigh = ladder.get(LodLevel::Superhigh).unwrap();
        assert_eq!(superhigh.name, "crate high");
        assert_eq!(superhigh.lod_level, LodLevel::Superhigh);
        assert!(!ladder.is_occupied(LodLevel::High));
        assert_eq!(ladder.get(LodLevel::Low).unwrap().name, "crate low");
        assert_eq!(ladder.get(LodLevel::Low).unwrap().lod_level, LodLevel::Low);
        assert!(!ladder.is_occupied(LodLevel::Medium));
        assert!(!ladder.is_occupied(LodLevel::Superlow));
    }

    #[test]
    fn test_promote_keeps_authored_superhigh() {
        let (mut groups, _) = group_by_permutation(vec![mesh("crate medium"), mesh("crate")]);
        assert_eq!(promote(&mut groups[0]).unwrap(), None);
        assert_eq!(groups[0].ladder.len(), 2);
        assert!(groups[0].ladder.is_occupied(LodLevel::Medium));
    }

    #[test]
    fn test_promote_empty_group() {
        let mut group: PermutationGroup = PermutationGroup {
            name: "ghost".into(),
            ladder: LodLadder::new(),
        };
        assert_eq!(
            promote(&mut group),
            Err(MergeIssue::EmptyPermutation("ghost".into()))
        );
    }

    #[test]
    fn test_ladder_iter_order() {
        let mut ladder = LodLadder::new();
        ladder.replace(LodLevel::Superlow, "d");
        ladder.replace(LodLevel::High, "b");
        let tiers: Vec<_> = ladder.iter().map(|(lod, item)| (lod, *item)).collect();
        assert_eq!(tiers, vec![(LodLevel::High, "b"), (LodLevel::Superlow, "d")]);
        assert_eq!(ladder.highest(), Some(LodLevel::High));
    }
}
