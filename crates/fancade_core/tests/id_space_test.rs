//! Integration tests for the prefab list ID space.

use fancade_core::{Byte3, Int3, Prefab, PrefabError, PrefabList, PrefabSegment, SegmentMap};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn seg(x: u8, y: u8, z: u8) -> PrefabSegment {
    PrefabSegment::new(Byte3::new(x, y, z), None).unwrap()
}

fn cell(list: &PrefabList, prefab: u16, pos: Int3) -> u16 {
    list.prefab(prefab).unwrap().blocks.get_block_or_default(pos)
}

/// Consecutive IDs, matching back-references and no dangling grid cells.
fn assert_consistent(list: &PrefabList) {
    let mut expected = list.id_offset();
    let mut total = 0;
    for prefab in list.prefabs() {
        assert_eq!(prefab.id(), expected, "prefab ids must be consecutive");
        for (_, segment) in prefab.enumerate_with_id() {
            assert_eq!(segment.prefab_id(), prefab.id());
        }
        expected += prefab.segment_count() as u16;
        total += prefab.segment_count();
    }
    assert_eq!(total, list.segment_count());
    assert_eq!(expected, list.next_id());

    for prefab in list.prefabs() {
        for (pos, value) in prefab.blocks.iter_occupied() {
            assert!(
                value < list.id_offset() || list.segment(value).is_some(),
                "prefab {} holds dangling id {} at {}",
                prefab.id(),
                value,
                pos
            );
        }
    }
}

#[test]
fn test_insert_shifts_placed_reference() {
    let mut list = PrefabList::new(600);
    let old = list.add_prefab(Prefab::single("Old", None)).unwrap();
    let host = list.add_prefab(Prefab::single("A", None)).unwrap();
    assert_eq!((old, host), (600, 601));
    list.place_prefab(host, Int3::new(2, 0, 0), old, false, None).unwrap();

    let new = Prefab::with_segments("New", vec![seg(0, 0, 0), seg(1, 0, 0)]).unwrap();
    list.insert_prefab(600, new).unwrap();

    assert_eq!(list.prefab(602).unwrap().name, "Old");
    assert_eq!(list.prefab(603).unwrap().name, "A");
    assert_eq!(cell(&list, 603, Int3::new(2, 0, 0)), 602);
    assert_eq!(list.prefab(600).unwrap().name, "New");
    assert_eq!(list.segment(601).unwrap().prefab_id(), 600);
    assert_consistent(&list);
}

#[test]
fn test_random_edits_keep_ids_consistent() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let mut list = PrefabList::new(600);
    for i in 0..4 {
        list.add_prefab(Prefab::single(format!("Seed {i}"), None)).unwrap();
    }

    for step in 0..400 {
        let ids: Vec<u16> = list.prefabs().map(Prefab::id).collect();
        let pick = |rng: &mut ChaCha8Rng| ids[rng.gen_range(0..ids.len())];
        let before = list.clone();

        let failed = match rng.gen_range(0..8) {
            0 => {
                let count = rng.gen_range(1..=3u8);
                let prefab = Prefab::with_segments(format!("P{step}"), (0..count).map(|y| seg(0, y, 0))).unwrap();
                list.add_prefab(prefab).is_err()
            }
            1 => {
                let prefab = Prefab::with_segments(format!("I{step}"), vec![seg(0, 0, 0), seg(0, 0, 1)]).unwrap();
                list.insert_prefab(pick(&mut rng), prefab).is_err()
            }
            2 if ids.len() > 3 => list.remove_prefab(pick(&mut rng), None).is_err(),
            3 => {
                let pos = seg(rng.gen_range(0..4), rng.gen_range(0..4), rng.gen_range(0..4));
                list.add_segment_to_prefab(pick(&mut rng), pos, false, None).is_err()
            }
            4 => {
                let id = pick(&mut rng);
                let segments: Vec<Byte3> = list
                    .prefab(id)
                    .unwrap()
                    .ordered_segments()
                    .map(PrefabSegment::pos_in_prefab)
                    .collect();
                let pos = segments[rng.gen_range(0..segments.len())];
                list.remove_segment_from_prefab(id, pos, rng.gen_bool(0.5), None).is_err()
            }
            5 => {
                // a reference outside any placed instance
                let target = pick(&mut rng);
                let value = rng.gen_range(list.id_offset()..list.next_id());
                let pos = Int3::new(rng.gen_range(0..12), rng.gen_range(0..12), rng.gen_range(0..12));
                list.prefab_mut(target).unwrap().blocks_mut().set_block(pos, value).unwrap();
                false
            }
            6 => {
                let id = pick(&mut rng);
                let count = rng.gen_range(1..=3u8);
                let prefab = Prefab::with_segments(format!("U{step}"), (0..count).map(|x| seg(x, 0, 0))).unwrap();
                list.update_prefab(id, prefab, rng.gen_bool(0.3), None).is_err()
            }
            _ => {
                let origin = Int3::new(rng.gen_range(0..12), rng.gen_range(0..12), rng.gen_range(0..12));
                list.place_prefab(pick(&mut rng), origin, pick(&mut rng), false, None).is_err()
            }
        };

        if failed {
            assert_eq!(list, before, "failed edit at step {step} changed the list");
        }
        assert_consistent(&list);
    }
}

#[test]
fn test_obstruction_is_exact() {
    let mut list = PrefabList::new(600);
    let bar = list
        .add_prefab(Prefab::with_segments("Bar", vec![seg(0, 0, 0), seg(1, 0, 0)]).unwrap())
        .unwrap();
    let host = list.add_prefab(Prefab::single("Host", None)).unwrap();
    list.place_prefab(host, Int3::ZERO, bar, false, None).unwrap();
    let before = list.clone();

    assert_eq!(
        list.place_prefab(host, Int3::new(1, 0, 0), bar, false, None),
        Err(PrefabError::Obstructed {
            prefab_id: host,
            prefab_name: "Host".to_owned(),
            source_pos: Int3::new(1, 0, 0),
            obstructed_pos: Int3::new(1, 0, 0),
        })
    );
    assert!(!list.try_place_prefab(host, Int3::new(1, 0, 0), bar, false, None));
    assert_eq!(list, before);

    assert!(list.try_place_prefab(host, Int3::new(2, 0, 0), bar, false, None));
    assert_consistent(&list);
}

#[test]
fn test_segment_growth_obstruction_is_exact() {
    let build = |gap: i32| {
        let mut list = PrefabList::new(600);
        let bar = list
            .add_prefab(Prefab::with_segments("Bar", vec![seg(0, 0, 0), seg(1, 0, 0)]).unwrap())
            .unwrap();
        let host = list.add_prefab(Prefab::single("Host", None)).unwrap();
        list.place_prefab(host, Int3::ZERO, bar, false, None).unwrap();
        list.place_prefab(host, Int3::new(0, gap, 0), bar, false, None).unwrap();
        list
    };

    let mut touching = build(1);
    let before = touching.clone();
    assert_eq!(
        touching.add_segment_to_prefab(600, seg(0, 1, 0), false, None),
        Err(PrefabError::Obstructed {
            prefab_id: 602,
            prefab_name: "Host".to_owned(),
            source_pos: Int3::ZERO,
            obstructed_pos: Int3::new(0, 1, 0),
        })
    );
    assert!(!touching.try_add_segment_to_prefab(600, seg(0, 1, 0), false, None));
    assert_eq!(touching, before);

    let mut apart = build(2);
    assert_eq!(apart.add_segment_to_prefab(600, seg(0, 1, 0), false, None), Ok(602));
    assert_eq!(cell(&apart, 603, Int3::new(0, 3, 0)), 602);
    assert_consistent(&apart);
}

#[test]
fn test_keep_in_place_preserves_footprint() {
    let mut list = PrefabList::new(600);
    let hook = list
        .add_prefab(Prefab::with_segments("Hook", vec![seg(0, 0, 0), seg(1, 0, 0), seg(1, 1, 0)]).unwrap())
        .unwrap();
    let host = list.add_prefab(Prefab::single("Host", None)).unwrap();
    list.place_prefab(host, Int3::new(4, 4, 4), hook, false, None).unwrap();

    list.remove_segment_from_prefab(hook, Byte3::ZERO, true, None).unwrap();

    let positions: Vec<Byte3> = list
        .prefab(hook)
        .unwrap()
        .ordered_segments()
        .map(PrefabSegment::pos_in_prefab)
        .collect();
    assert_eq!(positions, vec![Byte3::new(0, 0, 0), Byte3::new(0, 1, 0)]);

    let host = list.prefab(602).unwrap();
    assert_eq!(host.blocks.get_block_or_default(Int3::new(4, 4, 4)), 0);
    assert_eq!(host.blocks.get_block_or_default(Int3::new(5, 4, 4)), 600);
    assert_eq!(host.blocks.get_block_or_default(Int3::new(5, 5, 4)), 601);
    assert_consistent(&list);
}

#[test]
fn test_compaction_moves_footprint_without_keep_in_place() {
    let mut list = PrefabList::new(600);
    let hook = list
        .add_prefab(Prefab::with_segments("Hook", vec![seg(0, 0, 0), seg(1, 0, 0), seg(1, 1, 0)]).unwrap())
        .unwrap();
    let host = list.add_prefab(Prefab::single("Host", None)).unwrap();
    list.place_prefab(host, Int3::new(4, 4, 4), hook, false, None).unwrap();

    list.remove_segment_from_prefab(hook, Byte3::ZERO, false, None).unwrap();

    let host = list.prefab(602).unwrap();
    assert_eq!(host.blocks.get_block_or_default(Int3::new(4, 4, 4)), 600);
    assert_eq!(host.blocks.get_block_or_default(Int3::new(4, 5, 4)), 601);
    assert_eq!(host.blocks.get_block_or_default(Int3::new(5, 4, 4)), 0);
    assert_consistent(&list);
}
