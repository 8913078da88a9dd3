use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use bytes::Bytes;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rskiplist::{BitWiseComparator, Comparator, DBIterator, OrdComparator, SkipList};
use test_log::test;

const WRITES: usize = 20_000;
const READERS: usize = 4;

#[test]
fn one_writer_many_readers() {
    let mut rnd = StdRng::seed_from_u64(2024);
    let mut keys: Vec<u64> = (0..WRITES as u64).map(|k| k * 2).collect();
    keys.shuffle(&mut rnd);

    let list = SkipList::new(OrdComparator {});
    // number of entries of `keys` that are fully inserted
    let published = AtomicUsize::new(0);
    let done = AtomicBool::new(false);

    crossbeam::scope(|s| {
        s.spawn(|_| {
            for (i, key) in keys.iter().enumerate() {
                list.insert(*key);
                published.store(i + 1, Ordering::Release);
            }
            done.store(true, Ordering::Release);
        });

        for seed in 0..READERS as u64 {
            let (list, keys, published, done) = (&list, &keys, &published, &done);
            s.spawn(move |_| {
                let mut rnd = StdRng::seed_from_u64(seed);
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let visible = published.load(Ordering::Acquire);

                    // everything published before the scan must be found
                    if visible > 0 {
                        let key = keys[rnd.gen_range(0..visible)];
                        assert!(list.contains(&key), "{}", key);
                    }
                    // odd keys are never inserted
                    assert!(!list.contains(&(rnd.gen_range(0..WRITES as u64) * 2 + 1)));

                    let mut iter = list.iter();
                    iter.seek_to_first();
                    let mut count = 0;
                    let mut last: Option<u64> = None;
                    while iter.valid() {
                        let key = *iter.key();
                        if let Some(last) = last {
                            assert!(last < key, "{} before {}", last, key);
                        }
                        last = Some(key);
                        count += 1;
                        iter.next();
                    }
                    assert!(count >= visible);

                    if finished {
                        assert_eq!(count, WRITES);
                        break;
                    }
                }
            });
        }
    })
    .unwrap();

    assert_eq!(list.len(), WRITES);
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert!(list.keys().eq(sorted.iter()));
}

#[test]
fn shared_across_threads() {
    let list = Arc::new(SkipList::new(BitWiseComparator {}));

    let writer = {
        let list = list.clone();
        std::thread::spawn(move || {
            for i in 0..1000u32 {
                list.insert(Bytes::from(format!("key{:05}", i)));
            }
        })
    };
    writer.join().unwrap();

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let list = list.clone();
            std::thread::spawn(move || {
                let mut iter = list.iter();
                iter.seek(&Bytes::from_static(b"key00500"));
                assert_eq!(&iter.key()[..], &b"key00500"[..]);
                iter.prev();
                assert_eq!(&iter.key()[..], &b"key00499"[..]);
                list.keys().count()
            })
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), 1000);
    }
}

#[test]
fn shared_comparator() {
    let comparator: Arc<dyn Comparator<Bytes> + Send + Sync> = Arc::new(BitWiseComparator {});
    let list = SkipList::new(comparator);
    for key in ["delta", "alpha", "charlie", "bravo"] {
        list.insert(Bytes::from_static(key.as_bytes()));
    }
    let keys: Vec<&[u8]> = list.keys().map(|k| &k[..]).collect();
    assert_eq!(keys, vec![&b"alpha"[..], b"bravo", b"charlie", b"delta"]);
    assert_eq!(list.comparator().name(), "leveldb.BytewiseComparator");
}

#[test]
fn cursors_move_between_threads() {
    let list = SkipList::new(OrdComparator {});
    for key in (0..100u64).rev() {
        list.insert(key);
    }

    let mut iter = list.iter();
    iter.seek(&40);
    let keys = list.keys();

    crossbeam::scope(|s| {
        let forward = s.spawn(move |_| {
            let mut seen = Vec::new();
            while iter.valid() && seen.len() < 3 {
                seen.push(*iter.key());
                iter.next();
            }
            seen
        });
        let total = s.spawn(move |_| keys.count());

        assert_eq!(forward.join().unwrap(), vec![40, 41, 42]);
        assert_eq!(total.join().unwrap(), 100);
    })
    .unwrap();
}
