//! Grouping of sections into connected compounds.

use super::section::{Section, SectionId};

/// Splits `sections` into groups of touching sections (8-connectivity on
/// bounding boxes).
///
/// Groups come out in order of their first member in `sections`, and each
/// group keeps the input order of its members.
pub fn build_compounds(sections: &[&Section]) -> Vec<Vec<SectionId>> {
    let n = sections.len();
    let mut parent: Vec<usize> = (0..n).collect();
    let boxes: Vec<_> = sections.iter().map(|s| s.bounds()).collect();

    for i in 0..n {
        let grown = boxes[i].grown(1, 1);
        for j in i + 1..n {
            if grown.intersects(&boxes[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri.max(rj)] = ri.min(rj);
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<SectionId>)> = Vec::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(sections[i].id),
            None => groups.push((root, vec![sections[i].id])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::section::{Orientation, Run};

    fn column(id: u32, x: i32, y: i32, len: i32) -> Section {
        Section::new(SectionId(id), Orientation::Vertical, x, vec![Run::new(y, len)])
    }

    #[test]
    fn touching_sections_share_a_compound() {
        let a = column(1, 10, 0, 10);
        let b = column(2, 11, 8, 10);
        let c = column(3, 30, 0, 10);
        // Diagonal neighbour of b.
        let d = column(4, 12, 18, 5);
        let groups = build_compounds(&[&a, &b, &c, &d]);
        assert_eq!(
            groups,
            vec![
                vec![SectionId(1), SectionId(2), SectionId(4)],
                vec![SectionId(3)]
            ]
        );
    }
}
